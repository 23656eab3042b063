//! Moving selected entries within a track, between tracks and as a box
//! spanning several tracks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::splice::{self, RangeExtract};
use crate::{
    DestroyId, EditAction, EditContext, EditOp, Frame, Result, Sequence, TimelineError, Track,
    TrackId, TrackItem,
};

use super::{check_distinct, check_index_span, insert_span, remove_span, stashed, unlocked_track, Reversible};

/// Splices entries `selected_range_in..=selected_range_out` out and back in
/// at `insert_index`, an index of the track before the move.
#[derive(Debug, Clone)]
pub struct InsertMove {
    pub track: TrackId,
    pub insert_index: usize,
    pub selected_range_in: usize,
    pub selected_range_out: usize,
    real_insert_index: usize,
}

impl Reversible for InsertMove {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let count = self.selected_range_out - self.selected_range_in + 1;
        self.real_insert_index = if self.insert_index > self.selected_range_out {
            self.insert_index - count
        } else {
            self.insert_index
        };
        let moved = remove_span(cx.seq, self.track, self.selected_range_in, count)?;
        insert_span(cx.seq, self.track, self.real_insert_index, moved)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let count = self.selected_range_out - self.selected_range_in + 1;
        let moved = remove_span(cx.seq, self.track, self.real_insert_index, count)?;
        insert_span(cx.seq, self.track, self.selected_range_in, moved)
    }
}

pub fn insert_move(
    seq: &Sequence,
    track: TrackId,
    insert_index: usize,
    selected_range_in: usize,
    selected_range_out: usize,
) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    check_index_span(t, selected_range_in, selected_range_out)?;
    if insert_index > t.count() {
        return Err(TimelineError::IndexOutOfBounds {
            track,
            index: insert_index,
            count: t.count(),
        });
    }
    if insert_index > selected_range_in && insert_index <= selected_range_out {
        return Err(TimelineError::InvalidOp(format!(
            "insert index {} is inside the moved range {}..={}",
            insert_index, selected_range_in, selected_range_out
        )));
    }
    Ok(EditAction::new(EditOp::InsertMove(InsertMove {
        track,
        insert_index,
        selected_range_in,
        selected_range_out,
        real_insert_index: insert_index,
    })))
}

/// Splices a range out of one track and into another at `insert_index`.
#[derive(Debug, Clone)]
pub struct MultitrackInsertMove {
    pub track: TrackId,
    pub to_track: TrackId,
    pub insert_index: usize,
    pub selected_range_in: usize,
    pub selected_range_out: usize,
}

impl Reversible for MultitrackInsertMove {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let count = self.selected_range_out - self.selected_range_in + 1;
        let moved = remove_span(cx.seq, self.track, self.selected_range_in, count)?;
        insert_span(cx.seq, self.to_track, self.insert_index, moved)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let count = self.selected_range_out - self.selected_range_in + 1;
        let moved = remove_span(cx.seq, self.to_track, self.insert_index, count)?;
        insert_span(cx.seq, self.track, self.selected_range_in, moved)
    }
}

pub fn multitrack_insert_move(
    seq: &Sequence,
    track: TrackId,
    to_track: TrackId,
    insert_index: usize,
    selected_range_in: usize,
    selected_range_out: usize,
) -> Result<EditAction> {
    if track == to_track {
        return insert_move(seq, track, insert_index, selected_range_in, selected_range_out);
    }
    check_index_span(unlocked_track(seq, track)?, selected_range_in, selected_range_out)?;
    let to = unlocked_track(seq, to_track)?;
    if insert_index > to.count() {
        return Err(TimelineError::IndexOutOfBounds {
            track: to_track,
            index: insert_index,
            count: to.count(),
        });
    }
    Ok(EditAction::new(EditOp::MultitrackInsertMove(
        MultitrackInsertMove {
            track,
            to_track,
            insert_index,
            selected_range_in,
            selected_range_out,
        },
    )))
}

/// Lifts a range of entries, leaving a blank, and overwrites
/// `[over_in, over_out)` of `to_track` with them.
#[derive(Debug, Clone)]
pub struct OverwriteMove {
    pub track: TrackId,
    pub to_track: TrackId,
    pub over_in: Frame,
    pub over_out: Frame,
    pub selected_range_in: usize,
    pub selected_range_out: usize,
    moved_count: usize,
    extract: Option<RangeExtract>,
}

impl OverwriteMove {
    pub(crate) fn new(
        track: TrackId,
        to_track: TrackId,
        selected_range_in: usize,
        selected_range_out: usize,
        over_in: Frame,
        over_out: Frame,
    ) -> Self {
        Self {
            track,
            to_track,
            over_in,
            over_out,
            selected_range_in,
            selected_range_out,
            moved_count: 0,
            extract: None,
        }
    }
}

impl Reversible for OverwriteMove {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let count = self.selected_range_out - self.selected_range_in + 1;
        let moved = remove_span(cx.seq, self.track, self.selected_range_in, count)?;
        cx.seq
            .insert_blank(self.track, self.selected_range_in, self.over_out - self.over_in)?;

        let extract = splice::extract_range(cx, self.to_track, self.over_in, self.over_out)?;
        self.moved_count = moved.len();
        insert_span(cx.seq, self.to_track, extract.in_index, moved)?;
        self.extract = Some(extract);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let extract = stashed(&mut self.extract, "overwrite move")?;
        let moved = remove_span(cx.seq, self.to_track, extract.in_index, self.moved_count)?;
        splice::put_back_range(cx.seq, extract)?;

        if self.selected_range_in < cx.seq.track(self.track)?.count() {
            cx.seq.remove_item(self.track, self.selected_range_in)?;
        } else {
            debug!(track = %self.track, index = self.selected_range_in, "lift blank already gone");
        }
        insert_span(cx.seq, self.track, self.selected_range_in, moved)
    }
}

fn span_length(track: &Track, from: usize, to: usize) -> Frame {
    track.items()[from..=to].iter().map(TrackItem::length).sum()
}

pub fn overwrite_move(
    seq: &Sequence,
    track: TrackId,
    selected_range_in: usize,
    selected_range_out: usize,
    over_in: Frame,
) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    check_index_span(t, selected_range_in, selected_range_out)?;
    if over_in < 0 {
        return Err(TimelineError::InvalidOp(format!("move to frame {}", over_in)));
    }
    let over_out = over_in + span_length(t, selected_range_in, selected_range_out);
    Ok(EditAction::new(EditOp::OverwriteMove(OverwriteMove::new(
        track,
        track,
        selected_range_in,
        selected_range_out,
        over_in,
        over_out,
    ))))
}

pub fn multitrack_overwrite_move(
    seq: &Sequence,
    track: TrackId,
    to_track: TrackId,
    selected_range_in: usize,
    selected_range_out: usize,
    over_in: Frame,
) -> Result<EditAction> {
    if track == to_track {
        return overwrite_move(seq, track, selected_range_in, selected_range_out, over_in);
    }
    let t = unlocked_track(seq, track)?;
    check_index_span(t, selected_range_in, selected_range_out)?;
    unlocked_track(seq, to_track)?;
    if over_in < 0 {
        return Err(TimelineError::InvalidOp(format!("move to frame {}", over_in)));
    }
    let over_out = over_in + span_length(t, selected_range_in, selected_range_out);
    Ok(EditAction::new(EditOp::MultitrackOverwriteMove(
        OverwriteMove::new(
            track,
            to_track,
            selected_range_in,
            selected_range_out,
            over_in,
            over_out,
        ),
    )))
}

/// Selected entries of one track inside a box selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoxTrackSelection {
    pub track: TrackId,
    pub selected_range_in: usize,
    pub selected_range_out: usize,
}

fn check_box(seq: &Sequence, selections: &[BoxTrackSelection]) -> Result<()> {
    if selections.is_empty() {
        return Err(TimelineError::InvalidOp("empty box selection".to_string()));
    }
    check_distinct(selections.iter().map(|s| s.track), "track")?;
    for s in selections {
        check_index_span(
            unlocked_track(seq, s.track)?,
            s.selected_range_in,
            s.selected_range_out,
        )?;
    }
    Ok(())
}

/// Overwrite moves every track selection of a box by `delta` frames and
/// moves the selected compositors with them.
#[derive(Debug, Clone)]
pub struct BoxOverwriteMove {
    pub delta: Frame,
    moves: Vec<OverwriteMove>,
    pub compositors: Vec<DestroyId>,
}

impl Reversible for BoxOverwriteMove {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        for m in &mut self.moves {
            m.redo(cx)?;
        }
        cx.seq.compositors.move_all(&self.compositors, self.delta)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        for m in self.moves.iter_mut().rev() {
            m.undo(cx)?;
        }
        cx.seq.compositors.move_all(&self.compositors, -self.delta)
    }
}

pub fn box_overwrite_move(
    seq: &Sequence,
    selections: Vec<BoxTrackSelection>,
    compositors: Vec<DestroyId>,
    delta: Frame,
) -> Result<EditAction> {
    check_box(seq, &selections)?;
    if delta == 0 {
        return Err(TimelineError::InvalidOp("zero length move".to_string()));
    }
    check_distinct(compositors.iter().copied(), "compositor")?;
    for id in &compositors {
        seq.compositors
            .get(*id)
            .ok_or(TimelineError::CompositorNotFound(*id))?;
    }
    let mut moves = Vec::with_capacity(selections.len());
    for s in &selections {
        let t = seq.track(s.track)?;
        let range_in = t.clip_start(s.selected_range_in);
        let range_out = range_in + span_length(t, s.selected_range_in, s.selected_range_out);
        if range_in + delta < 0 {
            return Err(TimelineError::InvalidOp(format!(
                "box move of {} goes before the start of track {}",
                delta, s.track
            )));
        }
        moves.push(OverwriteMove::new(
            s.track,
            s.track,
            s.selected_range_in,
            s.selected_range_out,
            range_in + delta,
            range_out + delta,
        ));
    }
    Ok(EditAction::new(EditOp::BoxOverwriteMove(BoxOverwriteMove {
        delta,
        moves,
        compositors,
    })))
}

/// Splices the selected entries out of every track of a box.
#[derive(Debug, Clone)]
pub struct BoxSpliceOut {
    pub selections: Vec<BoxTrackSelection>,
    removed: Vec<Vec<TrackItem>>,
}

impl Reversible for BoxSpliceOut {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.removed.clear();
        for s in &self.selections {
            let count = s.selected_range_out - s.selected_range_in + 1;
            self.removed
                .push(remove_span(cx.seq, s.track, s.selected_range_in, count)?);
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let removed = std::mem::take(&mut self.removed);
        for (s, items) in self.selections.iter().zip(removed).rev() {
            insert_span(cx.seq, s.track, s.selected_range_in, items)?;
        }
        Ok(())
    }
}

pub fn box_splice_out(seq: &Sequence, selections: Vec<BoxTrackSelection>) -> Result<EditAction> {
    check_box(seq, &selections)?;
    Ok(EditAction::new(EditOp::BoxSpliceOut(BoxSpliceOut {
        selections,
        removed: Vec::new(),
    })))
}

/// Lifts the selected entries of every track of a box, leaving blanks.
#[derive(Debug, Clone)]
pub struct BoxLift {
    pub selections: Vec<BoxTrackSelection>,
    removed: Vec<Vec<TrackItem>>,
}

impl Reversible for BoxLift {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.removed.clear();
        for s in &self.selections {
            let count = s.selected_range_out - s.selected_range_in + 1;
            let items = remove_span(cx.seq, s.track, s.selected_range_in, count)?;
            let length = items.iter().map(TrackItem::length).sum();
            cx.seq.insert_blank(s.track, s.selected_range_in, length)?;
            self.removed.push(items);
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let removed = std::mem::take(&mut self.removed);
        for (s, items) in self.selections.iter().zip(removed).rev() {
            cx.seq.remove_item(s.track, s.selected_range_in)?;
            insert_span(cx.seq, s.track, s.selected_range_in, items)?;
        }
        Ok(())
    }
}

pub fn box_lift(seq: &Sequence, selections: Vec<BoxTrackSelection>) -> Result<EditAction> {
    check_box(seq, &selections)?;
    Ok(EditAction::new(EditOp::BoxLift(BoxLift {
        selections,
        removed: Vec::new(),
    })))
}
