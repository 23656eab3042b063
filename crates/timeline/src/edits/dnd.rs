use crate::{Clip, EditAction, EditContext, EditOp, Frame, Result, Sequence, TimelineError, TrackId, TrackItem};

use super::{check_clip_range, insert_span, remove_span, stashed, unlocked_track, Reversible};

/// Where a dropped clip lands relative to the blank it was dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPlacement {
    /// Past the end of the track, after a new blank of `gap` frames.
    AfterTrackEnd { gap: Frame },
    /// At the start of the blank; the rest of the blank stays after it.
    BlankStart,
    /// At the end of the blank; the first `kept` frames stay blank and the
    /// clip is cut to fill the rest.
    BlankEnd { kept: Frame },
    /// `offset` frames into the blank with blank on both sides.
    BlankMiddle { offset: Frame },
    /// Fills the whole blank; the clip is cut to the blank length.
    BlankReplace,
}

/// A clip dropped onto a blank or past the end of a track.
#[derive(Debug, Clone)]
pub struct DndDrop {
    pub track: TrackId,
    pub index: usize,
    pub placement: DropPlacement,
    pub clip_in: Frame,
    pub clip_out: Frame,
    /// Length of the blank at `index` before the drop, 0 after the track end.
    pub blank_length: Frame,
    clip: Option<Clip>,
}

impl DndDrop {
    fn clip_length(&self) -> Frame {
        self.clip_out - self.clip_in + 1
    }

    fn layout(&self, clip: Clip) -> Vec<TrackItem> {
        let clip = TrackItem::Clip(Clip {
            clip_in: self.clip_in,
            clip_out: self.clip_out,
            ..clip
        });
        match self.placement {
            DropPlacement::AfterTrackEnd { gap: 0 } => vec![clip],
            DropPlacement::AfterTrackEnd { gap } => vec![TrackItem::blank(gap), clip],
            DropPlacement::BlankStart => {
                vec![clip, TrackItem::blank(self.blank_length - self.clip_length())]
            }
            DropPlacement::BlankEnd { kept } => vec![TrackItem::blank(kept), clip],
            DropPlacement::BlankMiddle { offset } => vec![
                TrackItem::blank(offset),
                clip,
                TrackItem::blank(self.blank_length - offset - self.clip_length()),
            ],
            DropPlacement::BlankReplace => vec![clip],
        }
    }

    fn item_count(&self) -> usize {
        match self.placement {
            DropPlacement::BlankReplace | DropPlacement::AfterTrackEnd { gap: 0 } => 1,
            DropPlacement::BlankMiddle { .. } => 3,
            _ => 2,
        }
    }

    fn replaces_blank(&self) -> bool {
        !matches!(self.placement, DropPlacement::AfterTrackEnd { .. })
    }
}

impl Reversible for DndDrop {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = stashed(&mut self.clip, "drop")?;
        if self.replaces_blank() {
            cx.seq.remove_item(self.track, self.index)?;
        }
        let items = self.layout(clip);
        insert_span(cx.seq, self.track, self.index, items)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let removed = remove_span(cx.seq, self.track, self.index, self.item_count())?;
        self.clip = removed.into_iter().find_map(|item| match item {
            TrackItem::Clip(clip) => Some(clip),
            TrackItem::Blank { .. } => None,
        });
        if self.replaces_blank() {
            cx.seq.insert_blank(self.track, self.index, self.blank_length)?;
        }
        Ok(())
    }
}

fn drop_on_blank(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
    placement: DropPlacement,
) -> Result<DndDrop> {
    let blank_length = unlocked_track(seq, track)?.blank_length(index)?;
    check_clip_range(&clip, clip_in, clip_out)?;
    let drop = DndDrop {
        track,
        index,
        placement,
        clip_in,
        clip_out,
        blank_length,
        clip: Some(clip),
    };
    let room = match placement {
        DropPlacement::BlankStart => blank_length - drop.clip_length(),
        DropPlacement::BlankMiddle { offset } if offset > 0 => {
            blank_length - offset - drop.clip_length()
        }
        DropPlacement::BlankEnd { kept } if kept > 0 && kept < blank_length => {
            blank_length - kept - drop.clip_length() + 1
        }
        DropPlacement::BlankReplace => blank_length - drop.clip_length() + 1,
        _ => 0,
    };
    if room < 1 {
        return Err(TimelineError::InvalidOp(format!(
            "clip of {} frames does not fit {:?} on a blank of {}",
            drop.clip_length(),
            placement,
            blank_length
        )));
    }
    Ok(drop)
}

/// Drops a clip at `frame` past the end of a track.
pub fn dnd_after_track_end(
    seq: &Sequence,
    track: TrackId,
    frame: Frame,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    let gap = frame - t.length();
    if gap < 1 {
        return Err(TimelineError::InvalidOp(format!(
            "frame {} is not after the end of track {}",
            frame, track
        )));
    }
    check_clip_range(&clip, clip_in, clip_out)?;
    Ok(EditAction::new(EditOp::DndAfterTrackEnd(DndDrop {
        track,
        index: t.count(),
        placement: DropPlacement::AfterTrackEnd { gap },
        clip_in,
        clip_out,
        blank_length: 0,
        clip: Some(clip),
    })))
}

/// Appends a clip so that it starts at `frame`, which may be the track end
/// itself or any frame after it.
pub fn gap_append(
    seq: &Sequence,
    track: TrackId,
    frame: Frame,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    let gap = frame - t.length();
    if gap < 0 {
        return Err(TimelineError::InvalidOp(format!(
            "frame {} is before the end of track {}",
            frame, track
        )));
    }
    check_clip_range(&clip, clip_in, clip_out)?;
    Ok(EditAction::new(EditOp::GapAppend(DndDrop {
        track,
        index: t.count(),
        placement: DropPlacement::AfterTrackEnd { gap },
        clip_in,
        clip_out,
        blank_length: 0,
        clip: Some(clip),
    })))
}

/// Drops a clip shorter than the blank at its start.
pub fn dnd_on_blank_start(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    let drop = drop_on_blank(seq, track, index, clip, clip_in, clip_out, DropPlacement::BlankStart)?;
    Ok(EditAction::new(EditOp::DndOnBlankStart(drop)))
}

/// Drops a clip at the end of a blank. The clip is cut to fill the blank
/// after its first `kept` frames.
pub fn dnd_on_blank_end(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    kept: Frame,
    clip: Clip,
    clip_in: Frame,
) -> Result<EditAction> {
    let blank_length = seq.track(track)?.blank_length(index)?;
    let clip_out = clip_in + (blank_length - kept - 1);
    let drop = drop_on_blank(
        seq,
        track,
        index,
        clip,
        clip_in,
        clip_out,
        DropPlacement::BlankEnd { kept },
    )?;
    Ok(EditAction::new(EditOp::DndOnBlankEnd(drop)))
}

pub fn dnd_on_blank_middle(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    offset: Frame,
    clip: Clip,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    let drop = drop_on_blank(
        seq,
        track,
        index,
        clip,
        clip_in,
        clip_out,
        DropPlacement::BlankMiddle { offset },
    )?;
    Ok(EditAction::new(EditOp::DndOnBlankMiddle(drop)))
}

/// Replaces a blank with a clip cut to the blank's length.
pub fn dnd_on_blank_replace(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    clip: Clip,
    clip_in: Frame,
) -> Result<EditAction> {
    let blank_length = seq.track(track)?.blank_length(index)?;
    let clip_out = clip_in + blank_length - 1;
    let drop = drop_on_blank(seq, track, index, clip, clip_in, clip_out, DropPlacement::BlankReplace)?;
    Ok(EditAction::new(EditOp::DndOnBlankReplace(drop)))
}
