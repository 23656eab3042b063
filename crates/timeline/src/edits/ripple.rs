//! Edits that keep tracks in sync by moving the content of every track.

use crate::{
    EditAction, EditContext, EditOp, Frame, MultiTrackData, Result, Sequence, TimelineError,
    TrackId, TrackItem,
};

use super::{check_clip_range, check_index_span, stashed, unlocked_track, LiftMultiple, Reversible};

fn check_unlocked_moves(seq: &Sequence, data: &MultiTrackData) -> Result<()> {
    for m in data.affected_tracks() {
        unlocked_track(seq, m.track)?;
    }
    Ok(())
}

/// Moves everything at or after `first_moved_frame` on all tracks.
#[derive(Debug, Clone)]
pub struct MultiMove {
    pub data: MultiTrackData,
    pub delta: Frame,
    trim_removed: Option<Vec<(TrackId, Frame)>>,
}

impl Reversible for MultiMove {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.trim_removed = Some(self.data.apply(cx.seq, self.delta)?);
        cx.seq
            .compositors
            .move_all(&self.data.moved_compositors, self.delta)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let trim_removed = stashed(&mut self.trim_removed, "multi move")?;
        cx.seq
            .compositors
            .move_all(&self.data.moved_compositors, -self.delta)?;
        self.data.revert(cx.seq, self.delta, &trim_removed)
    }
}

pub fn multi_move(seq: &Sequence, first_moved_frame: Frame, delta: Frame) -> Result<EditAction> {
    let data = MultiTrackData::for_multi_move(seq, first_moved_frame);
    if data.affected_tracks().next().is_none() {
        return Err(TimelineError::InvalidOp(format!(
            "nothing to move at or after frame {}",
            first_moved_frame
        )));
    }
    data.check_delta(delta)?;
    check_unlocked_moves(seq, &data)?;
    Ok(EditAction::new(EditOp::MultiMove(MultiMove {
        data,
        delta,
        trim_removed: None,
    })))
}

/// Trims one end of a clip and moves the other tracks with the change.
#[derive(Debug, Clone)]
pub struct RippleTrim {
    pub track: TrackId,
    pub index: usize,
    pub delta: Frame,
    /// Start trims shorten the clip for a positive delta, so the other
    /// tracks move by `-delta`.
    pub trims_start: bool,
    pub data: MultiTrackData,
    trim_removed: Option<Vec<(TrackId, Frame)>>,
}

impl RippleTrim {
    fn applied_delta(&self) -> Frame {
        if self.trims_start {
            -self.delta
        } else {
            self.delta
        }
    }
}

impl Reversible for RippleTrim {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = cx.seq.track(self.track)?.clip(self.index)?;
        let (clip_in, clip_out) = if self.trims_start {
            (clip.clip_in + self.delta, clip.clip_out)
        } else {
            (clip.clip_in, clip.clip_out + self.delta)
        };
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)?;

        let applied = self.applied_delta();
        self.trim_removed = Some(self.data.apply(cx.seq, applied)?);
        cx.seq
            .compositors
            .move_all(&self.data.moved_compositors, applied)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let trim_removed = stashed(&mut self.trim_removed, "ripple trim")?;
        let applied = self.applied_delta();
        cx.seq
            .compositors
            .move_all(&self.data.moved_compositors, -applied)?;
        self.data.revert(cx.seq, applied, &trim_removed)?;

        let clip = cx.seq.track(self.track)?.clip(self.index)?;
        let (clip_in, clip_out) = if self.trims_start {
            (clip.clip_in - self.delta, clip.clip_out)
        } else {
            (clip.clip_in, clip.clip_out - self.delta)
        };
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)
    }
}

fn ripple_trim(seq: &Sequence, track: TrackId, index: usize, delta: Frame, trims_start: bool) -> Result<RippleTrim> {
    if delta == 0 {
        return Err(TimelineError::InvalidOp("zero length trim".to_string()));
    }
    let t = unlocked_track(seq, track)?;
    let clip = t.clip(index)?;
    let start = t.clip_start(index);
    let (frame, clip_in, clip_out) = if trims_start {
        (start, clip.clip_in + delta, clip.clip_out)
    } else {
        (start + clip.length(), clip.clip_in, clip.clip_out + delta)
    };
    check_clip_range(clip, clip_in, clip_out)?;

    let data = MultiTrackData::for_ripple(seq, track, frame);
    let trim = RippleTrim {
        track,
        index,
        delta,
        trims_start,
        data,
        trim_removed: None,
    };
    trim.data.check_delta(trim.applied_delta())?;
    check_unlocked_moves(seq, &trim.data)?;
    Ok(trim)
}

pub fn ripple_trim_end(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    let trim = ripple_trim(seq, track, index, delta, false)?;
    Ok(EditAction::new(EditOp::RippleTrimEnd(trim)))
}

pub fn ripple_trim_start(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    let trim = ripple_trim(seq, track, index, delta, true)?;
    Ok(EditAction::new(EditOp::RippleTrimStart(trim)))
}

/// Ripple trims the end of the last clip of a track. Content the other
/// tracks have after the old track end moves with the trim.
pub fn ripple_trim_last_clip_end(seq: &Sequence, track: TrackId, delta: Frame) -> Result<EditAction> {
    let count = seq.track(track)?.count();
    let index = count.checked_sub(1).ok_or_else(|| {
        TimelineError::InvalidOp(format!("track {} has no last clip", track))
    })?;
    let trim = ripple_trim(seq, track, index, delta, false)?;
    Ok(EditAction::new(EditOp::RippleTrimLastClipEnd(trim)))
}

/// Lifts a range of entries and closes the gap on every track.
#[derive(Debug, Clone)]
pub struct RippleDelete {
    lift: LiftMultiple,
    pub data: MultiTrackData,
    pub delta: Frame,
    trim_removed: Option<Vec<(TrackId, Frame)>>,
}

impl Reversible for RippleDelete {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.lift.redo(cx)?;
        self.trim_removed = Some(self.data.apply(cx.seq, self.delta)?);
        cx.seq
            .compositors
            .move_all(&self.data.moved_compositors, self.delta)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let trim_removed = stashed(&mut self.trim_removed, "ripple delete")?;
        cx.seq
            .compositors
            .move_all(&self.data.moved_compositors, -self.delta)?;
        self.data.revert(cx.seq, self.delta, &trim_removed)?;
        self.lift.undo(cx)
    }
}

/// Removes entries `from_index..=to_index` and pulls everything after them
/// back on all tracks. Fails when some track cannot absorb the move.
pub fn ripple_delete(seq: &Sequence, track: TrackId, from_index: usize, to_index: usize) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    check_index_span(t, from_index, to_index)?;
    let start = t.clip_start(from_index);
    let length: Frame = t.items()[from_index..=to_index]
        .iter()
        .map(TrackItem::length)
        .sum();

    // Plan the move on the sequence as it is after the lift.
    let mut lifted = seq.clone();
    for _ in from_index..=to_index {
        lifted.remove_item(track, from_index)?;
    }
    lifted.insert_blank(track, from_index, length)?;
    let data = MultiTrackData::for_multi_move(&lifted, start + length);
    data.check_delta(-length)?;
    check_unlocked_moves(seq, &data)?;
    Ok(EditAction::new(EditOp::RippleDelete(RippleDelete {
        lift: LiftMultiple::new(track, from_index, to_index),
        data,
        delta: -length,
        trim_removed: None,
    })))
}
