//! Edits driven through the editor the way a host application drives them.
use proptest::prelude::*;
use timeline::*;

fn media(name: &str) -> Clip {
    Clip::new(
        name,
        MediaSource::File {
            path: format!("/media/{}.mov", name),
            ttl: None,
        },
        Some(1000),
    )
}

/// (is blank, length, clip in, clip out) for every entry of every track.
fn layout(seq: &Sequence) -> Vec<Vec<(bool, Frame, Frame, Frame)>> {
    seq.tracks()
        .iter()
        .map(|t| {
            t.items()
                .iter()
                .map(|item| (item.is_blank(), item.length(), item.clip_in(), item.clip_out()))
                .collect()
        })
        .collect()
}

fn lengths(seq: &Sequence, track: usize) -> Vec<Frame> {
    seq.track(TrackId(track))
        .unwrap()
        .items()
        .iter()
        .map(TrackItem::length)
        .collect()
}

#[test]
fn test_cut_in_middle_and_undo() {
    let mut seq = Sequence::new("cut");
    let v1 = seq.add_track("V1", TrackKind::Video);
    seq.append(v1, media("a").with_range(0, 99).into()).unwrap();
    let mut editor = Editor::headless(seq, EditorConfig::default());
    let before = layout(editor.sequence());

    editor
        .do_edit(edits::cut(editor.sequence(), v1, 40).unwrap())
        .unwrap();
    let track = editor.sequence().track(v1).unwrap();
    assert_eq!(track.count(), 2);
    assert_eq!((track.clip(0).unwrap().clip_in, track.clip(0).unwrap().clip_out), (0, 39));
    assert_eq!((track.clip(1).unwrap().clip_in, track.clip(1).unwrap().clip_out), (40, 99));
    assert_eq!(track.clip_start(1), 40);

    // already a cut
    assert!(edits::cut(editor.sequence(), v1, 40).is_err());

    editor.undo().unwrap();
    assert_eq!(layout(editor.sequence()), before);
}

#[test]
fn test_overwrite_spanning_two_clips() {
    let mut seq = Sequence::new("overwrite");
    let v1 = seq.add_track("V1", TrackKind::Video);
    seq.append(v1, media("a").with_range(0, 49).into()).unwrap();
    seq.append(v1, media("b").with_range(0, 49).into()).unwrap();
    let mut editor = Editor::headless(seq, EditorConfig::default());
    let before = layout(editor.sequence());

    let action = edits::overwrite(editor.sequence(), v1, media("c"), 0, 29, 35).unwrap();
    editor.do_edit(action).unwrap();
    assert_eq!(lengths(editor.sequence(), 0), vec![35, 30, 35]);
    let track = editor.sequence().track(v1).unwrap();
    assert_eq!(track.clip(1).unwrap().name, "c");
    assert_eq!(track.clip(2).unwrap().clip_in, 15);
    assert_eq!(editor.sequence().length(), 100);

    editor.undo().unwrap();
    assert_eq!(layout(editor.sequence()), before);
    editor.redo().unwrap();
    assert_eq!(lengths(editor.sequence(), 0), vec![35, 30, 35]);
}

#[test]
fn test_overwrite_of_frames_30_to_69() {
    let mut seq = Sequence::new("overwrite");
    let v1 = seq.add_track("V1", TrackKind::Video);
    seq.append(v1, media("a").with_range(0, 49).into()).unwrap();
    seq.append(v1, media("b").with_range(0, 49).into()).unwrap();
    let mut editor = Editor::headless(seq, EditorConfig::default());
    let before = editor.sequence().clone();

    let action = edits::overwrite(editor.sequence(), v1, media("c"), 0, 39, 30).unwrap();
    editor.do_edit(action).unwrap();
    assert_eq!(lengths(editor.sequence(), 0), vec![30, 40, 30]);
    let track = editor.sequence().track(v1).unwrap();
    assert_eq!((track.clip(0).unwrap().clip_in, track.clip(0).unwrap().clip_out), (0, 29));
    assert_eq!((track.clip(1).unwrap().clip_in, track.clip(1).unwrap().clip_out), (0, 39));
    assert_eq!(track.clip(2).unwrap().name, "b");
    assert_eq!(track.clip(2).unwrap().clip_in, 20);
    assert_eq!(track.clip_start(1), 30);

    editor.undo().unwrap();
    assert_eq!(editor.sequence().tracks(), before.tracks());
}

/// V1: [50][30]
/// V2: [30][blank 20][10]
/// V3: [20]
fn ripple_sequence() -> Sequence {
    let mut seq = Sequence::new("ripple");
    let v1 = seq.add_track("V1", TrackKind::Video);
    let v2 = seq.add_track("V2", TrackKind::Video);
    let v3 = seq.add_track("V3", TrackKind::Video);
    seq.append(v1, media("a").with_range(100, 149).into()).unwrap();
    seq.append(v1, media("b").with_range(100, 129).into()).unwrap();
    seq.append(v2, media("c").with_range(100, 129).into()).unwrap();
    seq.append(v2, TrackItem::blank(20)).unwrap();
    seq.append(v2, media("d").with_range(100, 109).into()).unwrap();
    seq.append(v3, media("e").with_range(100, 119).into()).unwrap();
    seq
}

#[test]
fn test_ripple_trim_resizes_partner_blank() {
    let mut editor = Editor::headless(ripple_sequence(), EditorConfig::default());
    let before = layout(editor.sequence());

    let action = edits::ripple_trim_end(editor.sequence(), TrackId(0), 0, -10).unwrap();
    editor.do_edit(action).unwrap();
    assert_eq!(lengths(editor.sequence(), 0), vec![40, 30]);
    assert_eq!(lengths(editor.sequence(), 1), vec![30, 10, 10]);
    assert_eq!(lengths(editor.sequence(), 2), vec![20]);

    // would need more blank on V2 than there is
    assert!(edits::ripple_trim_end(editor.sequence(), TrackId(0), 0, -11).is_err());

    editor.undo().unwrap();
    assert_eq!(layout(editor.sequence()), before);
    assert_eq!(lengths(editor.sequence(), 1), vec![30, 20, 10]);
}

#[test]
fn test_sync_drift_and_resync() {
    let mut seq = Sequence::new("sync");
    let v1 = seq.add_track("V1", TrackKind::Video);
    let a1 = seq.add_track("A1", TrackKind::Audio);
    let master = media("master").with_range(0, 49);
    let child = media("child").with_range(0, 29);
    let (master_id, child_id) = (master.id, child.id);
    seq.append(v1, TrackItem::blank(10)).unwrap();
    seq.append(v1, master.into()).unwrap();
    seq.append(a1, TrackItem::blank(15)).unwrap();
    seq.append(a1, child.into()).unwrap();
    let mut editor = Editor::headless(seq, EditorConfig::default());

    editor
        .do_edit(edits::set_sync(editor.sequence(), child_id, master_id).unwrap())
        .unwrap();
    assert_eq!(editor.sequence().sync_state(child_id), Some(SyncState::Correct));

    // master moves 20 frames later
    let action = edits::overwrite_move(editor.sequence(), v1, 1, 1, 30).unwrap();
    editor.do_edit(action).unwrap();
    assert_eq!(editor.sequence().sync_state(child_id), Some(SyncState::Dirty));

    editor
        .do_edit(edits::resync_clip(editor.sequence(), child_id).unwrap())
        .unwrap();
    let (track, index) = editor.sequence().find_clip(child_id).unwrap();
    assert_eq!(track, a1);
    assert_eq!(editor.sequence().track(a1).unwrap().clip_start(index), 35);
    assert_eq!(editor.sequence().sync_state(child_id), Some(SyncState::Correct));

    // in sync already, so doing it again changes nothing
    let settled = layout(editor.sequence());
    editor
        .do_edit(edits::resync_clip(editor.sequence(), child_id).unwrap())
        .unwrap();
    assert_eq!(layout(editor.sequence()), settled);
    editor.undo().unwrap();
    assert_eq!(layout(editor.sequence()), settled);

    editor.undo().unwrap();
    assert_eq!(editor.sequence().sync_state(child_id), Some(SyncState::Dirty));
}

#[test]
fn test_consolidate_all_blanks_is_idempotent() {
    let mut seq = Sequence::new("blanks");
    let v1 = seq.add_track("V1", TrackKind::Video);
    seq.append(v1, media("a").with_range(0, 9).into()).unwrap();
    seq.append(v1, TrackItem::blank(5)).unwrap();
    seq.append(v1, TrackItem::blank(7)).unwrap();
    seq.append(v1, media("b").with_range(0, 9).into()).unwrap();
    let mut editor = Editor::headless(seq, EditorConfig::default());

    editor
        .do_edit(edits::consolidate_all_blanks(editor.sequence()).unwrap())
        .unwrap();
    let once = layout(editor.sequence());
    assert_eq!(lengths(editor.sequence(), 0), vec![10, 12, 10]);

    editor
        .do_edit(edits::consolidate_all_blanks(editor.sequence()).unwrap())
        .unwrap();
    assert_eq!(layout(editor.sequence()), once);
}

#[test]
fn test_commands_from_json() {
    let seq = Sequence::from_json_str(
        r#"{
            "name": "json",
            "tracks": [
                { "id": 0, "name": "V1", "kind": "video", "items": [
                    { "kind": "clip", "name": "a", "source": { "type": "file", "path": "a.mov" },
                      "media_length": 200, "clip_in": 0, "clip_out": 99 }
                ] }
            ]
        }"#,
    )
    .unwrap();
    let mut editor = Editor::headless(seq, EditorConfig::default());
    let commands: Vec<EditCommand> = serde_json::from_str(
        r#"[
            { "command": "cut", "track": 0, "frame": 50 },
            { "command": "trim_end", "track": 0, "index": 0, "delta": -10 },
            { "command": "append", "track": 0, "clip_in": 10, "clip_out": 19,
              "clip": { "name": "b", "source": { "type": "file", "path": "b.mov" }, "media_length": 50 } }
        ]"#,
    )
    .unwrap();
    for command in commands {
        apply_command(&mut editor, command).unwrap();
    }
    assert_eq!(lengths(editor.sequence(), 0), vec![40, 50, 10]);
    assert_eq!(editor.history().len(), 3);
    editor.sequence().check_invariants().unwrap();
}

#[derive(Debug, Clone)]
enum Op {
    Append { track: usize, length: Frame },
    Cut { track: usize, frame: Frame },
    TrimEnd { track: usize, index: usize, delta: Frame },
    Lift { track: usize, index: usize },
    RangeDelete { tracks: Vec<usize>, mark_in: Frame, length: Frame },
    BoxLift { selections: Vec<(usize, usize, usize)> },
    BoxSpliceOut { selections: Vec<(usize, usize, usize)> },
    OverwriteMove { track: usize, from: usize, to: usize, over_in: Frame },
    RippleTrimEnd { track: usize, index: usize, delta: Frame },
    SlideTrim { track: usize, index: usize, delta: Frame },
}

impl Op {
    /// Tracks named more than once in one multi-track edit.
    fn repeats_a_track(&self) -> bool {
        let mut tracks: Vec<usize> = match self {
            Op::RangeDelete { tracks, .. } => tracks.clone(),
            Op::BoxLift { selections } | Op::BoxSpliceOut { selections } => {
                selections.iter().map(|s| s.0).collect()
            }
            _ => return false,
        };
        let count = tracks.len();
        tracks.sort_unstable();
        tracks.dedup();
        tracks.len() != count
    }
}

fn selections_strategy() -> impl Strategy<Value = Vec<(usize, usize, usize)>> {
    prop::collection::vec(
        (0..2usize, 0..4usize, 0..2usize).prop_map(|(track, from, extra)| (track, from, from + extra)),
        1..3,
    )
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..2usize, 1..40i64).prop_map(|(track, length)| Op::Append { track, length }),
        (0..2usize, 0..120i64).prop_map(|(track, frame)| Op::Cut { track, frame }),
        (0..2usize, 0..4usize, -20..20i64)
            .prop_map(|(track, index, delta)| Op::TrimEnd { track, index, delta }),
        (0..2usize, 0..4usize).prop_map(|(track, index)| Op::Lift { track, index }),
        (prop::collection::vec(0..2usize, 1..3), 0..100i64, 1..30i64)
            .prop_map(|(tracks, mark_in, length)| Op::RangeDelete { tracks, mark_in, length }),
        selections_strategy().prop_map(|selections| Op::BoxLift { selections }),
        selections_strategy().prop_map(|selections| Op::BoxSpliceOut { selections }),
        (0..2usize, 0..4usize, 0..2usize, 0..150i64).prop_map(|(track, from, extra, over_in)| {
            Op::OverwriteMove { track, from, to: from + extra, over_in }
        }),
        (0..2usize, 0..4usize, -20..20i64)
            .prop_map(|(track, index, delta)| Op::RippleTrimEnd { track, index, delta }),
        (0..2usize, 0..4usize, -20..20i64)
            .prop_map(|(track, index, delta)| Op::SlideTrim { track, index, delta }),
    ]
}

fn box_selections(selections: &[(usize, usize, usize)]) -> Vec<edits::BoxTrackSelection> {
    selections
        .iter()
        .map(|&(track, from, to)| edits::BoxTrackSelection {
            track: TrackId(track),
            selected_range_in: from,
            selected_range_out: to,
        })
        .collect()
}

fn build(seq: &Sequence, op: &Op) -> Result<EditAction> {
    match op {
        Op::Append { track, length } => edits::append(seq, TrackId(*track), media("p"), 0, length - 1),
        Op::Cut { track, frame } => edits::cut(seq, TrackId(*track), *frame),
        Op::TrimEnd { track, index, delta } => edits::trim_end(seq, TrackId(*track), *index, *delta),
        Op::Lift { track, index } => edits::lift_multiple(seq, TrackId(*track), *index, *index),
        Op::RangeDelete {
            tracks,
            mark_in,
            length,
        } => edits::range_delete(
            seq,
            tracks.iter().copied().map(TrackId).collect(),
            *mark_in,
            mark_in + length - 1,
        ),
        Op::BoxLift { selections } => edits::box_lift(seq, box_selections(selections)),
        Op::BoxSpliceOut { selections } => edits::box_splice_out(seq, box_selections(selections)),
        Op::OverwriteMove {
            track,
            from,
            to,
            over_in,
        } => edits::overwrite_move(seq, TrackId(*track), *from, *to, *over_in),
        Op::RippleTrimEnd { track, index, delta } => {
            edits::ripple_trim_end(seq, TrackId(*track), *index, *delta)
        }
        Op::SlideTrim { track, index, delta } => edits::slide_trim(seq, TrackId(*track), *index, *delta),
    }
}

proptest! {
    #[test]
    fn prop_tracks_stay_contiguous_through_undo_and_redo(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let mut seq = Sequence::new("prop");
        let v1 = seq.add_track("V1", TrackKind::Video);
        seq.add_track("V2", TrackKind::Video);
        seq.append(v1, media("base").with_range(0, 59).into()).unwrap();
        let mut editor = Editor::headless(seq, EditorConfig::default());
        let initial = layout(editor.sequence());

        let mut snapshots = vec![initial.clone()];
        for op in &ops {
            if op.repeats_a_track() {
                prop_assert!(build(editor.sequence(), op).is_err());
                continue;
            }
            let Ok(action) = build(editor.sequence(), op) else {
                continue;
            };
            editor.do_edit(action).unwrap();
            prop_assert!(editor.sequence().check_invariants().is_ok());
            snapshots.push(layout(editor.sequence()));
        }

        while editor.can_undo() {
            editor.undo().unwrap();
            prop_assert!(editor.sequence().check_invariants().is_ok());
        }
        prop_assert_eq!(layout(editor.sequence()), initial);

        let mut step = 0;
        while editor.can_redo() {
            editor.redo().unwrap();
            step += 1;
            prop_assert_eq!(&layout(editor.sequence()), &snapshots[step]);
        }
        prop_assert_eq!(step, snapshots.len() - 1);
    }
}
