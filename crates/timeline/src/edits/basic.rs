//! Appends, inserts, removals and the overwrite edits that do not move
//! existing clips.

use crate::splice::{self, RangeExtract};
use crate::{Clip, EditAction, EditContext, EditOp, Frame, Result, Sequence, TimelineError, TrackId, TrackItem};

use super::{
    check_clip_range, check_distinct, check_index_span, check_items, insert_span, remove_span, stashed,
    unlocked_track, Reversible,
};

#[derive(Debug, Clone)]
pub struct Append {
    pub track: TrackId,
    clip: Option<Clip>,
    pub clip_in: Frame,
    pub clip_out: Frame,
    index: usize,
}

impl Reversible for Append {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = stashed(&mut self.clip, "append")?;
        self.index = cx.seq.track(self.track)?.count();
        cx.seq
            .insert_clip(self.track, self.index, clip, self.clip_in, self.clip_out)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let item = cx.seq.remove_item(self.track, self.index)?;
        self.clip = item.as_clip().cloned();
        Ok(())
    }
}

pub fn append(
    seq: &Sequence,
    track: TrackId,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    unlocked_track(seq, track)?;
    check_clip_range(&clip, clip_in, clip_out)?;
    Ok(EditAction::new(EditOp::Append(Append {
        track,
        clip: Some(clip),
        clip_in,
        clip_out,
        index: 0,
    })))
}

#[derive(Debug, Clone)]
pub struct AppendMultiple {
    pub track: TrackId,
    items: Vec<TrackItem>,
    append_index: usize,
    count: usize,
}

impl Reversible for AppendMultiple {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.append_index = cx.seq.track(self.track)?.count();
        let items = std::mem::take(&mut self.items);
        self.count = items.len();
        insert_span(cx.seq, self.track, self.append_index, items)?;
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.items = remove_span(cx.seq, self.track, self.append_index, self.count)?;
        Ok(())
    }
}

pub fn append_multiple(seq: &Sequence, track: TrackId, items: Vec<TrackItem>) -> Result<EditAction> {
    unlocked_track(seq, track)?;
    check_items(&items)?;
    Ok(EditAction::new(EditOp::AppendMultiple(AppendMultiple {
        track,
        items,
        append_index: 0,
        count: 0,
    })))
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub track: TrackId,
    pub index: usize,
    clip: Option<Clip>,
    pub clip_in: Frame,
    pub clip_out: Frame,
}

impl Reversible for Insert {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = stashed(&mut self.clip, "insert")?;
        cx.seq
            .insert_clip(self.track, self.index, clip, self.clip_in, self.clip_out)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.clip = cx.seq.remove_item(self.track, self.index)?.as_clip().cloned();
        Ok(())
    }
}

pub fn insert(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    if index > t.count() {
        return Err(TimelineError::IndexOutOfBounds {
            track,
            index,
            count: t.count(),
        });
    }
    check_clip_range(&clip, clip_in, clip_out)?;
    Ok(EditAction::new(EditOp::Insert(Insert {
        track,
        index,
        clip: Some(clip),
        clip_in,
        clip_out,
    })))
}

#[derive(Debug, Clone)]
pub struct InsertMultiple {
    pub track: TrackId,
    pub index: usize,
    items: Vec<TrackItem>,
    count: usize,
}

impl Reversible for InsertMultiple {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let items = std::mem::take(&mut self.items);
        self.count = items.len();
        insert_span(cx.seq, self.track, self.index, items)?;
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.items = remove_span(cx.seq, self.track, self.index, self.count)?;
        Ok(())
    }
}

pub fn insert_multiple(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    items: Vec<TrackItem>,
) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    if index > t.count() {
        return Err(TimelineError::IndexOutOfBounds {
            track,
            index,
            count: t.count(),
        });
    }
    check_items(&items)?;
    Ok(EditAction::new(EditOp::InsertMultiple(InsertMultiple {
        track,
        index,
        items,
        count: 0,
    })))
}

/// Appends a gap blank followed by `items`.
#[derive(Debug, Clone)]
pub struct InsertMultipleAfterEnd {
    pub track: TrackId,
    pub blank_length: Frame,
    items: Vec<TrackItem>,
    index: usize,
    count: usize,
}

impl Reversible for InsertMultipleAfterEnd {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.index = cx.seq.track(self.track)?.count();
        cx.seq.insert_blank(self.track, self.index, self.blank_length)?;
        let items = std::mem::take(&mut self.items);
        self.count = items.len();
        insert_span(cx.seq, self.track, self.index + 1, items)?;
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.items = remove_span(cx.seq, self.track, self.index + 1, self.count)?;
        cx.seq.remove_item(self.track, self.index)?;
        Ok(())
    }
}

pub fn insert_multiple_after_end(
    seq: &Sequence,
    track: TrackId,
    blank_length: Frame,
    items: Vec<TrackItem>,
) -> Result<EditAction> {
    unlocked_track(seq, track)?;
    if blank_length < 1 {
        return Err(TimelineError::InvalidOp(format!(
            "gap of {} frames before appended clips",
            blank_length
        )));
    }
    check_items(&items)?;
    Ok(EditAction::new(EditOp::InsertMultipleAfterEnd(
        InsertMultipleAfterEnd {
            track,
            blank_length,
            items,
            index: 0,
            count: 0,
        },
    )))
}

/// Cuts the blank at `index` and inserts `items` between the halves.
#[derive(Debug, Clone)]
pub struct InsertMultipleOnBlank {
    pub track: TrackId,
    pub index: usize,
    pub blank_cut_frame: Frame,
    items: Vec<TrackItem>,
    orig_blank_length: Frame,
    count: usize,
}

impl Reversible for InsertMultipleOnBlank {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.orig_blank_length = cx.seq.track(self.track)?.blank_length(self.index)?;
        splice::cut_blank_at(cx.seq, self.track, self.index, self.blank_cut_frame)?;
        let items = std::mem::take(&mut self.items);
        self.count = items.len();
        insert_span(cx.seq, self.track, self.index + 1, items)?;
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.items = remove_span(cx.seq, self.track, self.index + 1, self.count)?;
        cx.seq.remove_item(self.track, self.index)?;
        cx.seq.remove_item(self.track, self.index)?;
        cx.seq
            .insert_blank(self.track, self.index, self.orig_blank_length)
    }
}

pub fn insert_multiple_on_blank(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    blank_cut_frame: Frame,
    items: Vec<TrackItem>,
) -> Result<EditAction> {
    let length = unlocked_track(seq, track)?.blank_length(index)?;
    if blank_cut_frame < 1 || blank_cut_frame >= length {
        return Err(TimelineError::InvalidOp(format!(
            "cut frame {} is not inside blank of length {}",
            blank_cut_frame, length
        )));
    }
    check_items(&items)?;
    Ok(EditAction::new(EditOp::InsertMultipleOnBlank(
        InsertMultipleOnBlank {
            track,
            index,
            blank_cut_frame,
            items,
            orig_blank_length: length,
            count: 0,
        },
    )))
}

/// Splices out entries `from..=to`; later entries close the gap.
#[derive(Debug, Clone)]
pub struct RemoveMultiple {
    pub track: TrackId,
    pub from_index: usize,
    pub to_index: usize,
    removed: Vec<TrackItem>,
}

impl Reversible for RemoveMultiple {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let count = self.to_index + 1 - self.from_index;
        self.removed = remove_span(cx.seq, self.track, self.from_index, count)?;
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let removed = std::mem::take(&mut self.removed);
        insert_span(cx.seq, self.track, self.from_index, removed)?;
        Ok(())
    }
}

pub fn remove_multiple(seq: &Sequence, track: TrackId, from_index: usize, to_index: usize) -> Result<EditAction> {
    check_index_span(unlocked_track(seq, track)?, from_index, to_index)?;
    Ok(EditAction::new(EditOp::RemoveMultiple(RemoveMultiple {
        track,
        from_index,
        to_index,
        removed: Vec::new(),
    })))
}

/// Removes entries `from..=to` leaving one blank of their total length.
#[derive(Debug, Clone)]
pub struct LiftMultiple {
    pub track: TrackId,
    pub from_index: usize,
    pub to_index: usize,
    removed: Vec<TrackItem>,
}

impl LiftMultiple {
    pub(crate) fn new(track: TrackId, from_index: usize, to_index: usize) -> Self {
        Self {
            track,
            from_index,
            to_index,
            removed: Vec::new(),
        }
    }
}

impl Reversible for LiftMultiple {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let count = self.to_index + 1 - self.from_index;
        self.removed = remove_span(cx.seq, self.track, self.from_index, count)?;
        let length = self.removed.iter().map(TrackItem::length).sum();
        cx.seq.insert_blank(self.track, self.from_index, length)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        cx.seq.remove_item(self.track, self.from_index)?;
        let removed = std::mem::take(&mut self.removed);
        insert_span(cx.seq, self.track, self.from_index, removed)?;
        Ok(())
    }
}

pub fn lift_multiple(seq: &Sequence, track: TrackId, from_index: usize, to_index: usize) -> Result<EditAction> {
    check_index_span(unlocked_track(seq, track)?, from_index, to_index)?;
    Ok(EditAction::new(EditOp::LiftMultiple(LiftMultiple::new(
        track, from_index, to_index,
    ))))
}

/// Replaces entries `in_index..=out_index` with one clip.
#[derive(Debug, Clone)]
pub struct ThreePointOverwrite {
    pub track: TrackId,
    clip: Option<Clip>,
    pub clip_in: Frame,
    pub clip_out: Frame,
    pub in_index: usize,
    pub out_index: usize,
    removed: Vec<TrackItem>,
}

impl Reversible for ThreePointOverwrite {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = stashed(&mut self.clip, "three point overwrite")?;
        let count = self.out_index + 1 - self.in_index;
        self.removed = remove_span(cx.seq, self.track, self.in_index, count)?;
        cx.seq
            .insert_clip(self.track, self.in_index, clip, self.clip_in, self.clip_out)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.clip = cx.seq.remove_item(self.track, self.in_index)?.as_clip().cloned();
        let removed = std::mem::take(&mut self.removed);
        insert_span(cx.seq, self.track, self.in_index, removed)?;
        Ok(())
    }
}

pub fn three_point_overwrite(
    seq: &Sequence,
    track: TrackId,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
    in_index: usize,
    out_index: usize,
) -> Result<EditAction> {
    check_index_span(unlocked_track(seq, track)?, in_index, out_index)?;
    check_clip_range(&clip, clip_in, clip_out)?;
    Ok(EditAction::new(EditOp::ThreePointOverwrite(
        ThreePointOverwrite {
            track,
            clip: Some(clip),
            clip_in,
            clip_out,
            in_index,
            out_index,
            removed: Vec::new(),
        },
    )))
}

/// Overwrites the half-open range `[over_in, over_out)` with one clip.
#[derive(Debug, Clone)]
pub struct RangeOverwriteState {
    pub track: TrackId,
    clip: Option<Clip>,
    pub clip_in: Frame,
    pub clip_out: Frame,
    pub over_in: Frame,
    pub over_out: Frame,
    extract: Option<RangeExtract>,
}

impl RangeOverwriteState {
    fn new(track: TrackId, clip: Clip, clip_in: Frame, clip_out: Frame, over_in: Frame) -> Self {
        Self {
            track,
            clip: Some(clip),
            clip_in,
            clip_out,
            over_in,
            over_out: over_in + clip_out - clip_in + 1,
            extract: None,
        }
    }
}

impl Reversible for RangeOverwriteState {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = stashed(&mut self.clip, "overwrite")?;
        let extract = splice::extract_range(cx, self.track, self.over_in, self.over_out)?;
        cx.seq
            .insert_clip(self.track, extract.in_index, clip, self.clip_in, self.clip_out)?;
        self.extract = Some(extract);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let extract = stashed(&mut self.extract, "overwrite")?;
        self.clip = cx.seq.remove_item(self.track, extract.in_index)?.as_clip().cloned();
        splice::put_back_range(cx.seq, extract)
    }
}

/// Overwrites the track starting at track frame `frame` with the clip range.
pub fn overwrite(
    seq: &Sequence,
    track: TrackId,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
    frame: Frame,
) -> Result<EditAction> {
    unlocked_track(seq, track)?;
    check_clip_range(&clip, clip_in, clip_out)?;
    if frame < 0 {
        return Err(TimelineError::InvalidOp(format!("overwrite at frame {}", frame)));
    }
    Ok(EditAction::new(EditOp::SyncOverwrite(RangeOverwriteState::new(
        track, clip, clip_in, clip_out, frame,
    ))))
}

/// Overwrites the marked range `mark_in..=mark_out` with the clip range,
/// which must be exactly as long as the marked range.
pub fn range_overwrite(
    seq: &Sequence,
    track: TrackId,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
    mark_in: Frame,
    mark_out: Frame,
) -> Result<EditAction> {
    unlocked_track(seq, track)?;
    check_clip_range(&clip, clip_in, clip_out)?;
    if mark_in < 0 || mark_out < mark_in {
        return Err(TimelineError::InvalidOp(format!(
            "marks {}..={} do not form a range",
            mark_in, mark_out
        )));
    }
    if mark_out - mark_in != clip_out - clip_in {
        return Err(TimelineError::InvalidOp(format!(
            "clip range of {} frames does not fill marked range of {} frames",
            clip_out - clip_in + 1,
            mark_out - mark_in + 1
        )));
    }
    Ok(EditAction::new(EditOp::RangeOverwrite(RangeOverwriteState::new(
        track, clip, clip_in, clip_out, mark_in,
    ))))
}

/// Splices the marked range out of several tracks.
#[derive(Debug, Clone)]
pub struct RangeDelete {
    pub tracks: Vec<TrackId>,
    pub mark_in: Frame,
    pub mark_out: Frame,
    extracts: Vec<RangeExtract>,
}

impl Reversible for RangeDelete {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.extracts.clear();
        for track in &self.tracks {
            let extract = splice::extract_range(cx, *track, self.mark_in, self.mark_out + 1)?;
            self.extracts.push(extract);
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        for extract in std::mem::take(&mut self.extracts).into_iter().rev() {
            splice::put_back_range(cx.seq, extract)?;
        }
        Ok(())
    }
}

pub fn range_delete(seq: &Sequence, tracks: Vec<TrackId>, mark_in: Frame, mark_out: Frame) -> Result<EditAction> {
    if mark_in < 0 || mark_out < mark_in {
        return Err(TimelineError::InvalidOp(format!(
            "marks {}..={} do not form a range",
            mark_in, mark_out
        )));
    }
    check_distinct(tracks.iter().copied(), "track")?;
    let mut edited = Vec::with_capacity(tracks.len());
    for track in tracks {
        let t = seq.track(track)?;
        if !t.locked && t.length() > mark_in {
            edited.push(track);
        }
    }
    if edited.is_empty() {
        return Err(TimelineError::InvalidOp(
            "no unlocked track has content in the marked range".to_string(),
        ));
    }
    Ok(EditAction::new(EditOp::RangeDelete(RangeDelete {
        tracks: edited,
        mark_in,
        mark_out,
        extracts: Vec::new(),
    })))
}

/// Puts another clip in the place of the clip at `index`.
#[derive(Debug, Clone)]
pub struct ClipReplace {
    pub track: TrackId,
    pub index: usize,
    pub clip_in: Frame,
    pub clip_out: Frame,
    new_clip: Option<Clip>,
    old_clip: Option<Clip>,
}

impl Reversible for ClipReplace {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        cx.seq.track(self.track)?.clip(self.index)?;
        let clip = stashed(&mut self.new_clip, "clip replace")?;
        self.old_clip = cx.seq.remove_item(self.track, self.index)?.as_clip().cloned();
        cx.seq
            .insert_clip(self.track, self.index, clip, self.clip_in, self.clip_out)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let old = stashed(&mut self.old_clip, "clip replace")?;
        self.new_clip = cx.seq.remove_item(self.track, self.index)?.as_clip().cloned();
        let (clip_in, clip_out) = (old.clip_in, old.clip_out);
        cx.seq.insert_clip(self.track, self.index, old, clip_in, clip_out)
    }
}

fn clip_replace_state(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    clip: Clip,
    range: Option<(Frame, Frame)>,
) -> Result<ClipReplace> {
    let old = unlocked_track(seq, track)?.clip(index)?;
    let (clip_in, clip_out) = range.unwrap_or((old.clip_in, old.clip_out));
    check_clip_range(&clip, clip_in, clip_out)?;
    Ok(ClipReplace {
        track,
        index,
        clip_in,
        clip_out,
        new_clip: Some(clip),
        old_clip: None,
    })
}

/// Replaces a clip with `clip` cut to `[clip_in, clip_out]`.
pub fn clip_replace(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    let state = clip_replace_state(seq, track, index, clip, Some((clip_in, clip_out)))?;
    Ok(EditAction::new(EditOp::ClipReplace(state)))
}

/// Replaces a clip with a freshly loaded clip of its media, keeping the range.
pub fn reload_replace(seq: &Sequence, track: TrackId, index: usize, clip: Clip) -> Result<EditAction> {
    let state = clip_replace_state(seq, track, index, clip, None)?;
    Ok(EditAction::new(EditOp::ReloadReplace(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryBackend, MediaSource, NullHost, Refresh, TrackKind};

    fn media(name: &str) -> Clip {
        Clip::new(
            name,
            MediaSource::File {
                path: format!("{}.mov", name),
                ttl: None,
            },
            Some(1000),
        )
    }

    fn layout(seq: &Sequence, t: TrackId) -> Vec<(bool, Frame, Frame)> {
        seq.track(t)
            .unwrap()
            .items()
            .iter()
            .map(|i| (i.is_blank(), i.clip_in(), i.clip_out()))
            .collect()
    }

    /// [a 0..=49][blank 10][b 100..=139]
    fn sequence() -> (Sequence, TrackId) {
        let mut seq = Sequence::new("s");
        let t = seq.add_track("V1", TrackKind::Video);
        seq.insert_clip(t, 0, media("a"), 0, 49).unwrap();
        seq.insert_blank(t, 1, 10).unwrap();
        seq.insert_clip(t, 2, media("b"), 100, 139).unwrap();
        (seq, t)
    }

    fn check(seq: &mut Sequence, t: TrackId, mut action: EditAction, expected: Vec<(bool, Frame, Frame)>) {
        let before = seq.track(t).unwrap().clone();
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        let mut cx = EditContext::new(seq, &mut backend, &mut host);
        action.redo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(layout(cx.seq, t), expected);
        action.undo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(cx.seq.track(t).unwrap(), &before);
        action.redo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(layout(cx.seq, t), expected);
        action.undo(&mut cx, Refresh::Immediate).unwrap();
    }

    #[test]
    fn test_append_and_insert() {
        let (mut seq, t) = sequence();
        let action = append(&seq, t, media("c"), 5, 14).unwrap();
        check(
            &mut seq,
            t,
            action,
            vec![(false, 0, 49), (true, 0, 9), (false, 100, 139), (false, 5, 14)],
        );
        let action = insert(&seq, t, 1, media("c"), 0, 4).unwrap();
        check(
            &mut seq,
            t,
            action,
            vec![(false, 0, 49), (false, 0, 4), (true, 0, 9), (false, 100, 139)],
        );
        assert!(insert(&seq, t, 4, media("c"), 0, 4).is_err());
        assert!(append(&seq, t, media("c"), 990, 1000).is_err());
    }

    #[test]
    fn test_multiple_inserts() {
        let (mut seq, t) = sequence();
        let items = vec![media("c").with_range(0, 9).into(), media("d").with_range(0, 4).into()];
        let action = insert_multiple_on_blank(&seq, t, 1, 3, items.clone()).unwrap();
        check(
            &mut seq,
            t,
            action,
            vec![
                (false, 0, 49),
                (true, 0, 2),
                (false, 0, 9),
                (false, 0, 4),
                (true, 0, 6),
                (false, 100, 139),
            ],
        );
        let action = insert_multiple_after_end(&seq, t, 20, items.clone()).unwrap();
        check(
            &mut seq,
            t,
            action,
            vec![
                (false, 0, 49),
                (true, 0, 9),
                (false, 100, 139),
                (true, 0, 19),
                (false, 0, 9),
                (false, 0, 4),
            ],
        );
        assert!(insert_multiple_on_blank(&seq, t, 1, 10, items).is_err());
    }

    #[test]
    fn test_lift_and_remove() {
        let (mut seq, t) = sequence();
        let action = lift_multiple(&seq, t, 0, 0).unwrap();
        // lifted blank merges with the following blank
        check(&mut seq, t, action, vec![(true, 0, 59), (false, 100, 139)]);
        let action = remove_multiple(&seq, t, 0, 1).unwrap();
        check(&mut seq, t, action, vec![(false, 100, 139)]);
        let action = lift_multiple(&seq, t, 2, 2).unwrap();
        check(&mut seq, t, action, vec![(false, 0, 49)]);
    }

    #[test]
    fn test_three_point_overwrite() {
        let (mut seq, t) = sequence();
        let action = three_point_overwrite(&seq, t, media("c"), 0, 29, 1, 2).unwrap();
        check(&mut seq, t, action, vec![(false, 0, 49), (false, 0, 29)]);
    }

    #[test]
    fn test_overwrite_spanning_two_clips() {
        let (mut seq, t) = sequence();
        let action = overwrite(&seq, t, media("c"), 500, 519, 40).unwrap();
        check(
            &mut seq,
            t,
            action,
            vec![(false, 0, 39), (false, 500, 519), (false, 100, 139)],
        );
        let action = overwrite(&seq, t, media("c"), 500, 529, 45).unwrap();
        check(
            &mut seq,
            t,
            action,
            vec![(false, 0, 44), (false, 500, 529), (false, 115, 139)],
        );
    }

    #[test]
    fn test_range_overwrite_needs_matching_length() {
        let (mut seq, t) = sequence();
        assert!(range_overwrite(&seq, t, media("c"), 0, 9, 10, 30).is_err());
        let action = range_overwrite(&seq, t, media("c"), 0, 9, 55, 64).unwrap();
        check(
            &mut seq,
            t,
            action,
            vec![(false, 0, 49), (true, 0, 4), (false, 0, 9), (false, 105, 139)],
        );
    }

    #[test]
    fn test_range_delete_on_two_tracks() {
        let (mut seq, t) = sequence();
        let v2 = seq.add_track("V2", TrackKind::Video);
        seq.insert_clip(v2, 0, media("d"), 0, 99).unwrap();
        let before = seq.clone();

        let mut action = range_delete(&seq, vec![t, v2], 40, 59).unwrap();
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        let mut cx = EditContext::new(&mut seq, &mut backend, &mut host);
        action.redo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(layout(cx.seq, t), vec![(false, 0, 39), (false, 100, 139)]);
        assert_eq!(layout(cx.seq, v2), vec![(false, 0, 39), (false, 60, 99)]);
        action.undo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(seq.tracks(), before.tracks());
    }

    #[test]
    fn test_clip_replace_and_reload() {
        let (mut seq, t) = sequence();
        let action = clip_replace(&seq, t, 2, media("c"), 10, 19).unwrap();
        check(&mut seq, t, action, vec![(false, 0, 49), (true, 0, 9), (false, 10, 19)]);

        let reloaded = media("b");
        let reloaded_id = reloaded.id;
        let mut action = reload_replace(&seq, t, 2, reloaded).unwrap();
        assert_eq!(action.name(), "reload_replace");
        let old_id = seq.track(t).unwrap().clip(2).unwrap().id;
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        let mut cx = EditContext::new(&mut seq, &mut backend, &mut host);
        action.redo(&mut cx, Refresh::Immediate).unwrap();
        let clip = cx.seq.track(t).unwrap().clip(2).unwrap();
        assert_eq!((clip.id, clip.clip_in, clip.clip_out), (reloaded_id, 100, 139));
        action.undo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(seq.track(t).unwrap().clip(2).unwrap().id, old_id);

        assert!(clip_replace(&seq, t, 1, media("c"), 0, 9).is_err());
        assert!(clip_replace(&seq, t, 0, media("c"), 990, 1009).is_err());
        let short = Clip::new(
            "short",
            MediaSource::File {
                path: "short.mov".to_string(),
                ttl: None,
            },
            Some(120),
        );
        assert!(reload_replace(&seq, t, 2, short).is_err());
    }

    #[test]
    fn test_range_delete_rejects_repeated_track() {
        let (seq, t) = sequence();
        assert!(range_delete(&seq, vec![t, t], 10, 19).is_err());
    }
}
