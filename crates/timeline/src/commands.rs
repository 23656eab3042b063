use serde::{Deserialize, Serialize};

use crate::edits::{self, BoxTrackSelection};
use crate::{
    Clip, ClipId, ConsolidatedEditAction, DestroyId, EditAction, Editor, Filter, FilterInfo, Frame,
    HistoryEntry, Result, Sequence, TimelineError, TrackId, TrackItem,
};

/// Serializable edit request. Building the action validates it against the
/// sequence it will run on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditCommand {
    Append {
        track: TrackId,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    },
    AppendMultiple {
        track: TrackId,
        items: Vec<TrackItem>,
    },
    Insert {
        track: TrackId,
        index: usize,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    },
    InsertMultiple {
        track: TrackId,
        index: usize,
        items: Vec<TrackItem>,
    },
    InsertMultipleAfterEnd {
        track: TrackId,
        blank_length: Frame,
        items: Vec<TrackItem>,
    },
    InsertMultipleOnBlank {
        track: TrackId,
        index: usize,
        blank_cut_frame: Frame,
        items: Vec<TrackItem>,
    },
    RemoveMultiple {
        track: TrackId,
        from_index: usize,
        to_index: usize,
    },
    LiftMultiple {
        track: TrackId,
        from_index: usize,
        to_index: usize,
    },
    ThreePointOverwrite {
        track: TrackId,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
        in_index: usize,
        out_index: usize,
    },
    Overwrite {
        track: TrackId,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
        frame: Frame,
    },
    RangeOverwrite {
        track: TrackId,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
        mark_in: Frame,
        mark_out: Frame,
    },
    RangeDelete {
        tracks: Vec<TrackId>,
        mark_in: Frame,
        mark_out: Frame,
    },
    ClipReplace {
        track: TrackId,
        index: usize,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    },
    ReloadReplace {
        track: TrackId,
        index: usize,
        clip: Clip,
    },
    Cut {
        track: TrackId,
        frame: Frame,
    },
    CutAll {
        frame: Frame,
    },
    TrimStart {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    TrimEnd {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    TrimLastClipEnd {
        track: TrackId,
        delta: Frame,
    },
    SetClipLength {
        track: TrackId,
        index: usize,
        length: Frame,
    },
    TworollTrim {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    SlideTrim {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    ClipEndDragOnBlank {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    ClipEndDragReplaceBlank {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    ClipStartDragOnBlank {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    ClipStartDragReplaceBlank {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    TrimEndOverBlanks {
        track: TrackId,
        clip_index: usize,
    },
    TrimStartOverBlanks {
        track: TrackId,
        blank_index: usize,
    },
    TrimImageEndBeyondMaxLength {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    InsertMove {
        track: TrackId,
        #[serde(default)]
        to_track: Option<TrackId>,
        insert_index: usize,
        selected_range_in: usize,
        selected_range_out: usize,
    },
    OverwriteMove {
        track: TrackId,
        #[serde(default)]
        to_track: Option<TrackId>,
        selected_range_in: usize,
        selected_range_out: usize,
        over_in: Frame,
    },
    BoxOverwriteMove {
        selections: Vec<BoxTrackSelection>,
        #[serde(default)]
        compositors: Vec<DestroyId>,
        delta: Frame,
    },
    BoxSpliceOut {
        selections: Vec<BoxTrackSelection>,
    },
    BoxLift {
        selections: Vec<BoxTrackSelection>,
    },
    MultiMove {
        first_moved_frame: Frame,
        delta: Frame,
    },
    RippleTrimEnd {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    RippleTrimStart {
        track: TrackId,
        index: usize,
        delta: Frame,
    },
    RippleTrimLastClipEnd {
        track: TrackId,
        delta: Frame,
    },
    RippleDelete {
        track: TrackId,
        from_index: usize,
        to_index: usize,
    },
    GapAppend {
        track: TrackId,
        frame: Frame,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    },
    DndAfterTrackEnd {
        track: TrackId,
        frame: Frame,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    },
    DndOnBlankStart {
        track: TrackId,
        index: usize,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    },
    DndOnBlankEnd {
        track: TrackId,
        index: usize,
        kept: Frame,
        clip: Clip,
        clip_in: Frame,
    },
    DndOnBlankMiddle {
        track: TrackId,
        index: usize,
        offset: Frame,
        clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    },
    DndOnBlankReplace {
        track: TrackId,
        index: usize,
        clip: Clip,
        clip_in: Frame,
    },
    ConsolidateSelectedBlanks {
        track: TrackId,
        index: usize,
    },
    ConsolidateAllBlanks,
    AddFilter {
        clip: ClipId,
        filter: FilterInfo,
    },
    AddFilterMulti {
        clip: ClipId,
        index: usize,
        filters: Vec<FilterInfo>,
    },
    AddTwoFilters {
        clip: ClipId,
        index_1: usize,
        filter_1: FilterInfo,
        index_2: usize,
        filter_2: FilterInfo,
    },
    AddMultipartFilter {
        clip: ClipId,
        filter: FilterInfo,
    },
    RemoveFilter {
        clip: ClipId,
        index: usize,
    },
    RemoveTwoFilters {
        clip: ClipId,
        index_1: usize,
        index_2: usize,
    },
    MoveFilter {
        clip: ClipId,
        from_index: usize,
        to_index: usize,
    },
    RemoveMultipleFilters {
        clips: Vec<ClipId>,
    },
    CloneFilters {
        clip: ClipId,
        source_clip: ClipId,
    },
    PasteFilters {
        clips: Vec<ClipId>,
        filters: Vec<Filter>,
    },
    MuteClip {
        clip: ClipId,
    },
    UnmuteClip {
        clip: ClipId,
    },
    AddCompositor {
        type_id: String,
        a_track: TrackId,
        b_track: TrackId,
        clip_in: Frame,
        clip_out: Frame,
        #[serde(default)]
        origin_clip_id: Option<ClipId>,
    },
    DeleteCompositor {
        destroy_id: DestroyId,
    },
    MoveCompositor {
        destroy_id: DestroyId,
        clip_in: Frame,
        clip_out: Frame,
    },
    SetSync {
        child: ClipId,
        master: ClipId,
    },
    ClearSync {
        child: ClipId,
    },
    SetTrackSync {
        track: TrackId,
        parent_track: TrackId,
    },
    ClearTrackSync {
        track: TrackId,
    },
    SetBoxSelectionSync {
        selections: Vec<BoxTrackSelection>,
        parent_track: TrackId,
    },
    ResyncClip {
        clip: ClipId,
    },
    ResyncTrack {
        track: TrackId,
    },
    AudioSplice {
        parent: ClipId,
        to_track: TrackId,
        #[serde(default)]
        synched: bool,
    },
    /// Commands done and undone as one step. Each member is built from the
    /// sequence left by the ones before it.
    Group {
        commands: Vec<EditCommand>,
    },
}

impl EditCommand {
    pub fn into_action(self, seq: &Sequence) -> Result<EditAction> {
        match self {
            EditCommand::Append {
                track,
                clip,
                clip_in,
                clip_out,
            } => edits::append(seq, track, clip, clip_in, clip_out),
            EditCommand::AppendMultiple { track, items } => edits::append_multiple(seq, track, items),
            EditCommand::Insert {
                track,
                index,
                clip,
                clip_in,
                clip_out,
            } => edits::insert(seq, track, index, clip, clip_in, clip_out),
            EditCommand::InsertMultiple { track, index, items } => {
                edits::insert_multiple(seq, track, index, items)
            }
            EditCommand::InsertMultipleAfterEnd {
                track,
                blank_length,
                items,
            } => edits::insert_multiple_after_end(seq, track, blank_length, items),
            EditCommand::InsertMultipleOnBlank {
                track,
                index,
                blank_cut_frame,
                items,
            } => edits::insert_multiple_on_blank(seq, track, index, blank_cut_frame, items),
            EditCommand::RemoveMultiple {
                track,
                from_index,
                to_index,
            } => edits::remove_multiple(seq, track, from_index, to_index),
            EditCommand::LiftMultiple {
                track,
                from_index,
                to_index,
            } => edits::lift_multiple(seq, track, from_index, to_index),
            EditCommand::ThreePointOverwrite {
                track,
                clip,
                clip_in,
                clip_out,
                in_index,
                out_index,
            } => edits::three_point_overwrite(seq, track, clip, clip_in, clip_out, in_index, out_index),
            EditCommand::Overwrite {
                track,
                clip,
                clip_in,
                clip_out,
                frame,
            } => edits::overwrite(seq, track, clip, clip_in, clip_out, frame),
            EditCommand::RangeOverwrite {
                track,
                clip,
                clip_in,
                clip_out,
                mark_in,
                mark_out,
            } => edits::range_overwrite(seq, track, clip, clip_in, clip_out, mark_in, mark_out),
            EditCommand::RangeDelete {
                tracks,
                mark_in,
                mark_out,
            } => edits::range_delete(seq, tracks, mark_in, mark_out),
            EditCommand::ClipReplace {
                track,
                index,
                clip,
                clip_in,
                clip_out,
            } => edits::clip_replace(seq, track, index, clip, clip_in, clip_out),
            EditCommand::ReloadReplace { track, index, clip } => {
                edits::reload_replace(seq, track, index, clip)
            }
            EditCommand::Cut { track, frame } => edits::cut(seq, track, frame),
            EditCommand::CutAll { frame } => edits::cut_all(seq, frame),
            EditCommand::TrimStart { track, index, delta } => edits::trim_start(seq, track, index, delta),
            EditCommand::TrimEnd { track, index, delta } => edits::trim_end(seq, track, index, delta),
            EditCommand::TrimLastClipEnd { track, delta } => edits::trim_last_clip_end(seq, track, delta),
            EditCommand::SetClipLength { track, index, length } => {
                edits::set_clip_length(seq, track, index, length)
            }
            EditCommand::TworollTrim { track, index, delta } => {
                edits::tworoll_trim(seq, track, index, delta)
            }
            EditCommand::SlideTrim { track, index, delta } => edits::slide_trim(seq, track, index, delta),
            EditCommand::ClipEndDragOnBlank { track, index, delta } => {
                edits::clip_end_drag_on_blank(seq, track, index, delta)
            }
            EditCommand::ClipEndDragReplaceBlank { track, index, delta } => {
                edits::clip_end_drag_replace_blank(seq, track, index, delta)
            }
            EditCommand::ClipStartDragOnBlank { track, index, delta } => {
                edits::clip_start_drag_on_blank(seq, track, index, delta)
            }
            EditCommand::ClipStartDragReplaceBlank { track, index, delta } => {
                edits::clip_start_drag_replace_blank(seq, track, index, delta)
            }
            EditCommand::TrimEndOverBlanks { track, clip_index } => {
                edits::trim_end_over_blanks(seq, track, clip_index)
            }
            EditCommand::TrimStartOverBlanks { track, blank_index } => {
                edits::trim_start_over_blanks(seq, track, blank_index)
            }
            EditCommand::TrimImageEndBeyondMaxLength { track, index, delta } => {
                edits::trim_image_end_beyond_max_length(seq, track, index, delta)
            }
            EditCommand::InsertMove {
                track,
                to_track,
                insert_index,
                selected_range_in,
                selected_range_out,
            } => match to_track {
                Some(to_track) => edits::multitrack_insert_move(
                    seq,
                    track,
                    to_track,
                    insert_index,
                    selected_range_in,
                    selected_range_out,
                ),
                None => edits::insert_move(seq, track, insert_index, selected_range_in, selected_range_out),
            },
            EditCommand::OverwriteMove {
                track,
                to_track,
                selected_range_in,
                selected_range_out,
                over_in,
            } => match to_track {
                Some(to_track) => edits::multitrack_overwrite_move(
                    seq,
                    track,
                    to_track,
                    selected_range_in,
                    selected_range_out,
                    over_in,
                ),
                None => edits::overwrite_move(seq, track, selected_range_in, selected_range_out, over_in),
            },
            EditCommand::BoxOverwriteMove {
                selections,
                compositors,
                delta,
            } => edits::box_overwrite_move(seq, selections, compositors, delta),
            EditCommand::BoxSpliceOut { selections } => edits::box_splice_out(seq, selections),
            EditCommand::BoxLift { selections } => edits::box_lift(seq, selections),
            EditCommand::MultiMove {
                first_moved_frame,
                delta,
            } => edits::multi_move(seq, first_moved_frame, delta),
            EditCommand::RippleTrimEnd { track, index, delta } => {
                edits::ripple_trim_end(seq, track, index, delta)
            }
            EditCommand::RippleTrimStart { track, index, delta } => {
                edits::ripple_trim_start(seq, track, index, delta)
            }
            EditCommand::RippleTrimLastClipEnd { track, delta } => {
                edits::ripple_trim_last_clip_end(seq, track, delta)
            }
            EditCommand::RippleDelete {
                track,
                from_index,
                to_index,
            } => edits::ripple_delete(seq, track, from_index, to_index),
            EditCommand::GapAppend {
                track,
                frame,
                clip,
                clip_in,
                clip_out,
            } => edits::gap_append(seq, track, frame, clip, clip_in, clip_out),
            EditCommand::DndAfterTrackEnd {
                track,
                frame,
                clip,
                clip_in,
                clip_out,
            } => edits::dnd_after_track_end(seq, track, frame, clip, clip_in, clip_out),
            EditCommand::DndOnBlankStart {
                track,
                index,
                clip,
                clip_in,
                clip_out,
            } => edits::dnd_on_blank_start(seq, track, index, clip, clip_in, clip_out),
            EditCommand::DndOnBlankEnd {
                track,
                index,
                kept,
                clip,
                clip_in,
            } => edits::dnd_on_blank_end(seq, track, index, kept, clip, clip_in),
            EditCommand::DndOnBlankMiddle {
                track,
                index,
                offset,
                clip,
                clip_in,
                clip_out,
            } => edits::dnd_on_blank_middle(seq, track, index, offset, clip, clip_in, clip_out),
            EditCommand::DndOnBlankReplace {
                track,
                index,
                clip,
                clip_in,
            } => edits::dnd_on_blank_replace(seq, track, index, clip, clip_in),
            EditCommand::ConsolidateSelectedBlanks { track, index } => {
                edits::consolidate_selected_blanks(seq, track, index)
            }
            EditCommand::ConsolidateAllBlanks => edits::consolidate_all_blanks(seq),
            EditCommand::AddFilter { clip, filter } => edits::add_filter(seq, clip, filter),
            EditCommand::AddFilterMulti { clip, index, filters } => {
                edits::add_filter_multi(seq, clip, index, filters)
            }
            EditCommand::AddTwoFilters {
                clip,
                index_1,
                filter_1,
                index_2,
                filter_2,
            } => edits::add_two_filters(seq, clip, index_1, filter_1, index_2, filter_2),
            EditCommand::AddMultipartFilter { clip, filter } => {
                edits::add_multipart_filter(seq, clip, filter)
            }
            EditCommand::RemoveFilter { clip, index } => edits::remove_filter(seq, clip, index),
            EditCommand::RemoveTwoFilters {
                clip,
                index_1,
                index_2,
            } => edits::remove_two_filters(seq, clip, index_1, index_2),
            EditCommand::MoveFilter {
                clip,
                from_index,
                to_index,
            } => edits::move_filter(seq, clip, from_index, to_index),
            EditCommand::RemoveMultipleFilters { clips } => edits::remove_multiple_filters(seq, clips),
            EditCommand::CloneFilters { clip, source_clip } => edits::clone_filters(seq, clip, source_clip),
            EditCommand::PasteFilters { clips, filters } => edits::paste_filters(seq, clips, filters),
            EditCommand::MuteClip { clip } => edits::mute_clip(seq, clip),
            EditCommand::UnmuteClip { clip } => edits::unmute_clip(seq, clip),
            EditCommand::AddCompositor {
                type_id,
                a_track,
                b_track,
                clip_in,
                clip_out,
                origin_clip_id,
            } => edits::add_compositor(seq, type_id, a_track, b_track, clip_in, clip_out, origin_clip_id),
            EditCommand::DeleteCompositor { destroy_id } => edits::delete_compositor(seq, destroy_id),
            EditCommand::MoveCompositor {
                destroy_id,
                clip_in,
                clip_out,
            } => edits::move_compositor(seq, destroy_id, clip_in, clip_out),
            EditCommand::SetSync { child, master } => edits::set_sync(seq, child, master),
            EditCommand::ClearSync { child } => edits::clear_sync(seq, child),
            EditCommand::SetTrackSync { track, parent_track } => {
                edits::set_track_sync(seq, track, parent_track)
            }
            EditCommand::ClearTrackSync { track } => edits::clear_track_sync(seq, track),
            EditCommand::SetBoxSelectionSync {
                selections,
                parent_track,
            } => edits::set_box_selection_sync(seq, selections, parent_track),
            EditCommand::ResyncClip { clip } => edits::resync_clip(seq, clip),
            EditCommand::ResyncTrack { track } => edits::resync_track(seq, track),
            EditCommand::AudioSplice {
                parent,
                to_track,
                synched,
            } => {
                if synched {
                    edits::audio_synched_splice(seq, parent, to_track)
                } else {
                    edits::audio_splice(seq, parent, to_track)
                }
            }
            EditCommand::Group { .. } => Err(TimelineError::InvalidOp(
                "groups cannot be nested".to_string(),
            )),
        }
    }

    pub fn into_entry(self, seq: &Sequence) -> Result<HistoryEntry> {
        match self {
            EditCommand::Group { commands } => {
                let mut group = ConsolidatedEditAction::new(Vec::new());
                for command in commands {
                    group.push_deferred(move |seq| command.into_action(seq));
                }
                Ok(HistoryEntry::Group(group))
            }
            command => Ok(HistoryEntry::Single(command.into_action(seq)?)),
        }
    }
}

/// Builds the command against the editor's sequence and does it.
pub fn apply_command(editor: &mut Editor, command: EditCommand) -> Result<()> {
    match command.into_entry(editor.sequence())? {
        HistoryEntry::Single(action) => editor.do_edit(action),
        HistoryEntry::Group(group) => editor.do_group(group),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditorConfig, TrackKind};

    fn sequence() -> Sequence {
        let json = r#"{
            "name": "s",
            "tracks": [
                {
                    "id": 0,
                    "name": "V1",
                    "kind": "video",
                    "items": [
                        { "kind": "clip", "name": "a", "source": { "type": "file", "path": "a.mov" },
                          "media_length": 100, "clip_in": 0, "clip_out": 59 }
                    ]
                },
                { "id": 1, "name": "V2", "kind": "video" }
            ]
        }"#;
        Sequence::from_json_str(json).unwrap()
    }

    #[test]
    fn test_command_json_shape() {
        let command: EditCommand =
            serde_json::from_str(r#"{ "command": "cut", "track": 0, "frame": 30 }"#).unwrap();
        assert_eq!(
            command,
            EditCommand::Cut {
                track: TrackId(0),
                frame: 30
            }
        );
        let command: EditCommand = serde_json::from_str(
            r#"{ "command": "overwrite_move", "track": 0, "selected_range_in": 0,
                 "selected_range_out": 0, "over_in": 10 }"#,
        )
        .unwrap();
        assert!(matches!(command, EditCommand::OverwriteMove { to_track: None, .. }));
        assert!(serde_json::from_str::<EditCommand>(r#"{ "command": "explode" }"#).is_err());
    }

    #[test]
    fn test_group_runs_as_one_history_entry() {
        let mut editor = Editor::headless(sequence(), EditorConfig::default());
        let group: EditCommand = serde_json::from_str(
            r#"{ "command": "group", "commands": [
                { "command": "cut", "track": 0, "frame": 20 },
                { "command": "cut", "track": 0, "frame": 40 },
                { "command": "lift_multiple", "track": 0, "from_index": 1, "to_index": 1 }
            ] }"#,
        )
        .unwrap();
        apply_command(&mut editor, group).unwrap();
        assert_eq!(editor.history().len(), 1);
        let layout: Vec<bool> = editor
            .sequence()
            .track(TrackId(0))
            .unwrap()
            .items()
            .iter()
            .map(TrackItem::is_blank)
            .collect();
        assert_eq!(layout, vec![false, true, false]);

        editor.undo().unwrap();
        assert_eq!(editor.sequence().track(TrackId(0)).unwrap().count(), 1);
        assert_eq!(editor.sequence().tracks()[1].kind, TrackKind::Video);
    }

    #[test]
    fn test_replace_and_gap_append_commands() {
        let before = sequence();
        let mut editor = Editor::headless(before.clone(), EditorConfig::default());
        let commands: Vec<EditCommand> = serde_json::from_str(
            r#"[
                { "command": "gap_append", "track": 0, "frame": 70,
                  "clip": { "name": "b", "source": { "type": "file", "path": "b.mov" }, "media_length": 50 },
                  "clip_in": 0, "clip_out": 9 },
                { "command": "reload_replace", "track": 0, "index": 0,
                  "clip": { "name": "a2", "source": { "type": "file", "path": "a.mov" }, "media_length": 100 } },
                { "command": "ripple_trim_last_clip_end", "track": 0, "delta": 5 }
            ]"#,
        )
        .unwrap();
        for command in commands {
            apply_command(&mut editor, command).unwrap();
        }
        let lengths: Vec<Frame> = editor
            .sequence()
            .track(TrackId(0))
            .unwrap()
            .items()
            .iter()
            .map(TrackItem::length)
            .collect();
        assert_eq!(lengths, vec![60, 10, 15]);
        assert_eq!(editor.sequence().track(TrackId(0)).unwrap().clip(0).unwrap().name, "a2");

        while editor.can_undo() {
            editor.undo().unwrap();
        }
        assert_eq!(editor.sequence().tracks(), before.tracks());
    }

    #[test]
    fn test_invalid_command_is_rejected_before_doing() {
        let mut editor = Editor::headless(sequence(), EditorConfig::default());
        let result = apply_command(
            &mut editor,
            EditCommand::TrimEnd {
                track: TrackId(1),
                index: 0,
                delta: 5,
            },
        );
        assert!(result.is_err());
        assert!(!editor.can_undo());
    }
}
