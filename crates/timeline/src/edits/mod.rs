//! The edit catalog.
//!
//! Every edit is a state struct implementing [`Reversible`] wrapped in one
//! [`EditOp`] variant. Factory functions validate their inputs against the
//! current sequence and return a ready [`EditAction`](crate::EditAction).

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use crate::{
    Clip, EditContext, EditPolicy, Frame, Result, Sequence, TimelineError, Track, TrackId,
    TrackItem,
};

mod basic;
mod blanks;
mod compositors;
mod cut;
mod dnd;
mod filters;
mod moves;
mod ripple;
mod sync;
mod trim;

pub use basic::*;
pub use blanks::*;
pub use compositors::*;
pub use cut::*;
pub use dnd::*;
pub use filters::*;
pub use moves::*;
pub use ripple::*;
pub use sync::*;
pub use trim::*;

/// The do/undo pair of one edit. `undo` is only called after a successful
/// `redo` and must leave the sequence exactly as `redo` found it.
pub(crate) trait Reversible {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()>;
    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub enum EditOp {
    Noop,
    // basic
    Append(Append),
    AppendMultiple(AppendMultiple),
    Insert(Insert),
    InsertMultiple(InsertMultiple),
    InsertMultipleAfterEnd(InsertMultipleAfterEnd),
    InsertMultipleOnBlank(InsertMultipleOnBlank),
    RemoveMultiple(RemoveMultiple),
    LiftMultiple(LiftMultiple),
    ThreePointOverwrite(ThreePointOverwrite),
    SyncOverwrite(RangeOverwriteState),
    RangeOverwrite(RangeOverwriteState),
    RangeDelete(RangeDelete),
    ClipReplace(ClipReplace),
    ReloadReplace(ClipReplace),
    // cut
    Cut(Cut),
    CutAll(CutAll),
    // trim
    TrimStart(ClipRangeTrim),
    TrimEnd(ClipRangeTrim),
    TrimLastClipEnd(ClipRangeTrim),
    SetClipLength(ClipRangeTrim),
    TworollTrim(TworollTrim),
    SlideTrim(ClipRangeTrim),
    ClipEndDragOnBlank(ClipEndDragOnBlank),
    ClipEndDragReplaceBlank(ClipEndDragReplaceBlank),
    ClipStartDragOnBlank(ClipStartDragOnBlank),
    ClipStartDragReplaceBlank(ClipStartDragReplaceBlank),
    TrimEndOverBlanks(TrimEndOverBlanks),
    TrimStartOverBlanks(TrimStartOverBlanks),
    TrimImageEndBeyondMaxLength(ImageEndExtend),
    // move
    InsertMove(InsertMove),
    MultitrackInsertMove(MultitrackInsertMove),
    OverwriteMove(OverwriteMove),
    MultitrackOverwriteMove(OverwriteMove),
    BoxOverwriteMove(BoxOverwriteMove),
    BoxSpliceOut(BoxSpliceOut),
    BoxLift(BoxLift),
    // ripple
    MultiMove(MultiMove),
    RippleTrimEnd(RippleTrim),
    RippleTrimStart(RippleTrim),
    RippleTrimLastClipEnd(RippleTrim),
    RippleDelete(RippleDelete),
    // drop
    DndAfterTrackEnd(DndDrop),
    DndOnBlankStart(DndDrop),
    DndOnBlankEnd(DndDrop),
    DndOnBlankMiddle(DndDrop),
    DndOnBlankReplace(DndDrop),
    GapAppend(DndDrop),
    // blanks
    ConsolidateSelectedBlanks(ConsolidateBlanks),
    ConsolidateAllBlanks(ConsolidateBlanks),
    // filters
    AddFilter(AddFilter),
    AddFilterMulti(AddFilterMulti),
    AddTwoFilters(AddTwoFilters),
    AddMultipartFilter(AddFilter),
    RemoveFilter(RemoveFilter),
    RemoveTwoFilters(RemoveTwoFilters),
    MoveFilter(MoveFilter),
    RemoveMultipleFilters(RemoveMultipleFilters),
    CloneFilters(CloneFilters),
    PasteFilters(PasteFilters),
    MuteClip(MuteClip),
    UnmuteClip(MuteClip),
    // compositors
    AddCompositor(AddCompositor),
    DeleteCompositor(DeleteCompositor),
    MoveCompositor(MoveCompositor),
    // sync
    SetSync(SetSync),
    ClearSync(ClearSync),
    SetTrackSync(SetTrackSync),
    ClearTrackSync(ClearTrackSync),
    SetBoxSelectionSync(SetBoxSelectionSync),
    ResyncClip(ResyncClip),
    ResyncTrack(ResyncTrack),
    AudioSplice(AudioSplice),
    AudioSynchedSplice(AudioSplice),
}

impl EditOp {
    pub fn name(&self) -> &'static str {
        match self {
            EditOp::Noop => "noop",
            EditOp::Append(_) => "append",
            EditOp::AppendMultiple(_) => "append_multiple",
            EditOp::Insert(_) => "insert",
            EditOp::InsertMultiple(_) => "insert_multiple",
            EditOp::InsertMultipleAfterEnd(_) => "insert_multiple_after_end",
            EditOp::InsertMultipleOnBlank(_) => "insert_multiple_on_blank",
            EditOp::RemoveMultiple(_) => "remove_multiple",
            EditOp::LiftMultiple(_) => "lift_multiple",
            EditOp::ThreePointOverwrite(_) => "three_point_overwrite",
            EditOp::SyncOverwrite(_) => "overwrite",
            EditOp::RangeOverwrite(_) => "range_overwrite",
            EditOp::RangeDelete(_) => "range_delete",
            EditOp::ClipReplace(_) => "clip_replace",
            EditOp::ReloadReplace(_) => "reload_replace",
            EditOp::Cut(_) => "cut",
            EditOp::CutAll(_) => "cut_all",
            EditOp::TrimStart(_) => "trim_start",
            EditOp::TrimEnd(_) => "trim_end",
            EditOp::TrimLastClipEnd(_) => "trim_last_clip_end",
            EditOp::SetClipLength(_) => "set_clip_length",
            EditOp::TworollTrim(_) => "tworoll_trim",
            EditOp::SlideTrim(_) => "slide_trim",
            EditOp::ClipEndDragOnBlank(_) => "clip_end_drag_on_blank",
            EditOp::ClipEndDragReplaceBlank(_) => "clip_end_drag_replace_blank",
            EditOp::ClipStartDragOnBlank(_) => "clip_start_drag_on_blank",
            EditOp::ClipStartDragReplaceBlank(_) => "clip_start_drag_replace_blank",
            EditOp::TrimEndOverBlanks(_) => "trim_end_over_blanks",
            EditOp::TrimStartOverBlanks(_) => "trim_start_over_blanks",
            EditOp::TrimImageEndBeyondMaxLength(_) => "trim_image_end_beyond_max_length",
            EditOp::InsertMove(_) => "insert_move",
            EditOp::MultitrackInsertMove(_) => "multitrack_insert_move",
            EditOp::OverwriteMove(_) => "overwrite_move",
            EditOp::MultitrackOverwriteMove(_) => "multitrack_overwrite_move",
            EditOp::BoxOverwriteMove(_) => "box_overwrite_move",
            EditOp::BoxSpliceOut(_) => "box_splice_out",
            EditOp::BoxLift(_) => "box_lift",
            EditOp::MultiMove(_) => "multi_move",
            EditOp::RippleTrimEnd(_) => "ripple_trim_end",
            EditOp::RippleTrimStart(_) => "ripple_trim_start",
            EditOp::RippleTrimLastClipEnd(_) => "ripple_trim_last_clip_end",
            EditOp::RippleDelete(_) => "ripple_delete",
            EditOp::DndAfterTrackEnd(_) => "dnd_after_track_end",
            EditOp::DndOnBlankStart(_) => "dnd_on_blank_start",
            EditOp::DndOnBlankEnd(_) => "dnd_on_blank_end",
            EditOp::DndOnBlankMiddle(_) => "dnd_on_blank_middle",
            EditOp::DndOnBlankReplace(_) => "dnd_on_blank_replace",
            EditOp::GapAppend(_) => "gap_append",
            EditOp::ConsolidateSelectedBlanks(_) => "consolidate_selected_blanks",
            EditOp::ConsolidateAllBlanks(_) => "consolidate_all_blanks",
            EditOp::AddFilter(_) => "add_filter",
            EditOp::AddFilterMulti(_) => "add_filter_multi",
            EditOp::AddTwoFilters(_) => "add_two_filters",
            EditOp::AddMultipartFilter(_) => "add_multipart_filter",
            EditOp::RemoveFilter(_) => "remove_filter",
            EditOp::RemoveTwoFilters(_) => "remove_two_filters",
            EditOp::MoveFilter(_) => "move_filter",
            EditOp::RemoveMultipleFilters(_) => "remove_multiple_filters",
            EditOp::CloneFilters(_) => "clone_filters",
            EditOp::PasteFilters(_) => "paste_filters",
            EditOp::MuteClip(_) => "mute_clip",
            EditOp::UnmuteClip(_) => "unmute_clip",
            EditOp::AddCompositor(_) => "add_compositor",
            EditOp::DeleteCompositor(_) => "delete_compositor",
            EditOp::MoveCompositor(_) => "move_compositor",
            EditOp::SetSync(_) => "set_sync",
            EditOp::ClearSync(_) => "clear_sync",
            EditOp::SetTrackSync(_) => "set_track_sync",
            EditOp::ClearTrackSync(_) => "clear_track_sync",
            EditOp::SetBoxSelectionSync(_) => "set_box_selection_sync",
            EditOp::ResyncClip(_) => "resync_clip",
            EditOp::ResyncTrack(_) => "resync_track",
            EditOp::AudioSplice(_) => "audio_splice",
            EditOp::AudioSynchedSplice(_) => "audio_synched_splice",
        }
    }

    pub fn default_policy(&self) -> EditPolicy {
        let mut policy = EditPolicy::default();
        match self {
            EditOp::TrimStart(_)
            | EditOp::TrimEnd(_)
            | EditOp::TrimLastClipEnd(_)
            | EditOp::TworollTrim(_)
            | EditOp::SlideTrim(_)
            | EditOp::ClipEndDragOnBlank(_)
            | EditOp::ClipEndDragReplaceBlank(_)
            | EditOp::ClipStartDragOnBlank(_)
            | EditOp::ClipStartDragReplaceBlank(_)
            | EditOp::TrimEndOverBlanks(_)
            | EditOp::TrimStartOverBlanks(_)
            | EditOp::TrimImageEndBeyondMaxLength(_)
            | EditOp::RippleTrimEnd(_)
            | EditOp::RippleTrimStart(_)
            | EditOp::RippleTrimLastClipEnd(_) => policy.exit_active_trim_mode = false,
            EditOp::SyncOverwrite(_)
            | EditOp::RangeOverwrite(_)
            | EditOp::RangeDelete(_)
            | EditOp::OverwriteMove(_)
            | EditOp::BoxOverwriteMove(_)
            | EditOp::BoxSpliceOut(_)
            | EditOp::BoxLift(_)
            | EditOp::RippleDelete(_)
            | EditOp::ResyncTrack(_) => policy.stop_for_edit = true,
            EditOp::MultitrackInsertMove(_) | EditOp::MultitrackOverwriteMove(_) => {
                policy.stop_for_edit = true;
                policy.clear_editor_for_multitrack = true;
            }
            EditOp::PasteFilters(_) => policy.force_effects_editor_update = true,
            _ => {}
        }
        policy
    }

    /// Whether the edit itself adds, removes or moves compositors.
    pub fn touches_compositors(&self) -> bool {
        matches!(
            self,
            EditOp::AddCompositor(_)
                | EditOp::DeleteCompositor(_)
                | EditOp::MoveCompositor(_)
                | EditOp::BoxOverwriteMove(_)
                | EditOp::MultiMove(_)
                | EditOp::RippleTrimEnd(_)
                | EditOp::RippleTrimStart(_)
                | EditOp::RippleTrimLastClipEnd(_)
                | EditOp::RippleDelete(_)
        )
    }

    fn step(&mut self) -> Option<&mut dyn Reversible> {
        let step: &mut dyn Reversible = match self {
            EditOp::Noop => return None,
            EditOp::Append(s) => s,
            EditOp::AppendMultiple(s) => s,
            EditOp::Insert(s) => s,
            EditOp::InsertMultiple(s) => s,
            EditOp::InsertMultipleAfterEnd(s) => s,
            EditOp::InsertMultipleOnBlank(s) => s,
            EditOp::RemoveMultiple(s) => s,
            EditOp::LiftMultiple(s) => s,
            EditOp::ThreePointOverwrite(s) => s,
            EditOp::SyncOverwrite(s) | EditOp::RangeOverwrite(s) => s,
            EditOp::RangeDelete(s) => s,
            EditOp::ClipReplace(s) | EditOp::ReloadReplace(s) => s,
            EditOp::Cut(s) => s,
            EditOp::CutAll(s) => s,
            EditOp::TrimStart(s)
            | EditOp::TrimEnd(s)
            | EditOp::TrimLastClipEnd(s)
            | EditOp::SetClipLength(s)
            | EditOp::SlideTrim(s) => s,
            EditOp::TworollTrim(s) => s,
            EditOp::ClipEndDragOnBlank(s) => s,
            EditOp::ClipEndDragReplaceBlank(s) => s,
            EditOp::ClipStartDragOnBlank(s) => s,
            EditOp::ClipStartDragReplaceBlank(s) => s,
            EditOp::TrimEndOverBlanks(s) => s,
            EditOp::TrimStartOverBlanks(s) => s,
            EditOp::TrimImageEndBeyondMaxLength(s) => s,
            EditOp::InsertMove(s) => s,
            EditOp::MultitrackInsertMove(s) => s,
            EditOp::OverwriteMove(s) | EditOp::MultitrackOverwriteMove(s) => s,
            EditOp::BoxOverwriteMove(s) => s,
            EditOp::BoxSpliceOut(s) => s,
            EditOp::BoxLift(s) => s,
            EditOp::MultiMove(s) => s,
            EditOp::RippleTrimEnd(s)
            | EditOp::RippleTrimStart(s)
            | EditOp::RippleTrimLastClipEnd(s) => s,
            EditOp::RippleDelete(s) => s,
            EditOp::DndAfterTrackEnd(s)
            | EditOp::DndOnBlankStart(s)
            | EditOp::DndOnBlankEnd(s)
            | EditOp::DndOnBlankMiddle(s)
            | EditOp::DndOnBlankReplace(s)
            | EditOp::GapAppend(s) => s,
            EditOp::ConsolidateSelectedBlanks(s) | EditOp::ConsolidateAllBlanks(s) => s,
            EditOp::AddFilter(s) | EditOp::AddMultipartFilter(s) => s,
            EditOp::AddFilterMulti(s) => s,
            EditOp::AddTwoFilters(s) => s,
            EditOp::RemoveFilter(s) => s,
            EditOp::RemoveTwoFilters(s) => s,
            EditOp::MoveFilter(s) => s,
            EditOp::RemoveMultipleFilters(s) => s,
            EditOp::CloneFilters(s) => s,
            EditOp::PasteFilters(s) => s,
            EditOp::MuteClip(s) | EditOp::UnmuteClip(s) => s,
            EditOp::AddCompositor(s) => s,
            EditOp::DeleteCompositor(s) => s,
            EditOp::MoveCompositor(s) => s,
            EditOp::SetSync(s) => s,
            EditOp::ClearSync(s) => s,
            EditOp::SetTrackSync(s) => s,
            EditOp::ClearTrackSync(s) => s,
            EditOp::SetBoxSelectionSync(s) => s,
            EditOp::ResyncClip(s) => s,
            EditOp::ResyncTrack(s) => s,
            EditOp::AudioSplice(s) | EditOp::AudioSynchedSplice(s) => s,
        };
        Some(step)
    }

    pub(crate) fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        match self.step() {
            Some(step) => step.redo(cx),
            None => Ok(()),
        }
    }

    pub(crate) fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        match self.step() {
            Some(step) => step.undo(cx),
            None => Ok(()),
        }
    }
}

/// Takes a value an op parked between runs; missing means the op ran out of
/// order.
pub(crate) fn stashed<T>(slot: &mut Option<T>, op: &str) -> Result<T> {
    slot.take()
        .ok_or_else(|| TimelineError::InvalidOp(format!("{}: no state recorded for this run", op)))
}

pub(crate) fn remove_span(
    seq: &mut Sequence,
    track: TrackId,
    index: usize,
    count: usize,
) -> Result<Vec<TrackItem>> {
    (0..count).map(|_| seq.remove_item(track, index)).collect()
}

pub(crate) fn insert_span(
    seq: &mut Sequence,
    track: TrackId,
    index: usize,
    items: Vec<TrackItem>,
) -> Result<()> {
    for (offset, item) in items.into_iter().enumerate() {
        seq.insert_item(track, index + offset, item)?;
    }
    Ok(())
}

pub(crate) fn unlocked_track(seq: &Sequence, track: TrackId) -> Result<&Track> {
    let t = seq.track(track)?;
    if t.locked {
        return Err(TimelineError::InvalidOp(format!("track {} is locked", track)));
    }
    Ok(t)
}

pub(crate) fn check_clip_range(clip: &Clip, clip_in: Frame, clip_out: Frame) -> Result<()> {
    if !clip.accepts_range(clip_in, clip_out) {
        return Err(TimelineError::InvalidOp(format!(
            "range {}..={} is outside the media of '{}'",
            clip_in, clip_out, clip.name
        )));
    }
    Ok(())
}

pub(crate) fn check_index_span(track: &Track, from: usize, to: usize) -> Result<()> {
    if from > to || to >= track.count() {
        return Err(TimelineError::IndexOutOfBounds {
            track: track.id,
            index: to.max(from),
            count: track.count(),
        });
    }
    Ok(())
}

pub(crate) fn check_items(items: &[TrackItem]) -> Result<()> {
    if items.is_empty() {
        return Err(TimelineError::InvalidOp("no items given".to_string()));
    }
    for item in items {
        match item {
            TrackItem::Blank { length } if *length < 1 => {
                return Err(TimelineError::InvalidOp(format!("blank of length {}", length)));
            }
            TrackItem::Clip(clip) => check_clip_range(clip, clip.clip_in, clip.clip_out)?,
            TrackItem::Blank { .. } => {}
        }
    }
    Ok(())
}

/// Rejects a list naming the same track or clip twice. Multi-target edits
/// address their targets by position, so a repeated target would be edited
/// twice by one run.
pub(crate) fn check_distinct<T>(ids: impl IntoIterator<Item = T>, what: &str) -> Result<()>
where
    T: Copy + Eq + Hash + fmt::Display,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(TimelineError::InvalidOp(format!("{} {} given twice", what, id)));
        }
    }
    Ok(())
}

pub(crate) fn check_delta_nonzero(delta: Frame) -> Result<()> {
    if delta == 0 {
        return Err(TimelineError::InvalidOp("zero length edit".to_string()));
    }
    Ok(())
}
