use tracing::debug;

use crate::splice::{self, CutRecord};
use crate::{EditAction, EditContext, EditOp, Frame, Result, Sequence, TimelineError, TrackId};

use super::{unlocked_track, Reversible};

#[derive(Debug, Clone, PartialEq)]
struct TrackCut {
    track: TrackId,
    index: usize,
    record: CutRecord,
}

fn cut_track(cx: &mut EditContext<'_>, track: TrackId, frame: Frame) -> Result<Option<TrackCut>> {
    let index = cx.seq.track(track)?.clip_index_at(frame);
    Ok(splice::overwrite_cut_track(cx, track, frame, true)?.map(|record| TrackCut {
        track,
        index,
        record,
    }))
}

fn join_cut(cx: &mut EditContext<'_>, cut: &TrackCut) -> Result<()> {
    cx.seq.remove_item(cut.track, cut.index + 1)?;
    if cx.seq.track(cut.track)?.is_blank_at(cut.index) {
        cx.seq.remove_item(cut.track, cut.index)?;
        cx.seq
            .insert_blank(cut.track, cut.index, cut.record.length())
    } else {
        cx.seq
            .set_clip_range(cut.track, cut.index, cut.record.orig_in, cut.record.orig_out)
    }
}

/// Splits the clip under a track frame in two.
#[derive(Debug, Clone)]
pub struct Cut {
    pub track: TrackId,
    pub frame: Frame,
    done: Option<TrackCut>,
}

impl Reversible for Cut {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.done = cut_track(cx, self.track, self.frame)?;
        if self.done.is_none() {
            debug!(track = %self.track, frame = self.frame, "cut frame is on a boundary");
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        if let Some(cut) = self.done.take() {
            join_cut(cx, &cut)?;
        }
        Ok(())
    }
}

pub fn cut(seq: &Sequence, track: TrackId, frame: Frame) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    let index = t.clip_index_at(frame);
    let clip = t.clip(index)?;
    let clip_frame = frame - t.clip_start(index) + clip.clip_in;
    if clip.frame_on_cut(clip_frame) {
        return Err(TimelineError::InvalidOp(format!(
            "frame {} is already a cut on track {}",
            frame, track
        )));
    }
    Ok(EditAction::new(EditOp::Cut(Cut {
        track,
        frame,
        done: None,
    })))
}

/// Cuts every unlocked track at a frame.
#[derive(Debug, Clone)]
pub struct CutAll {
    pub frame: Frame,
    tracks: Vec<TrackId>,
    done: Vec<TrackCut>,
}

impl Reversible for CutAll {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.done.clear();
        for track in &self.tracks {
            if let Some(cut) = cut_track(cx, *track, self.frame)? {
                self.done.push(cut);
            }
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        for cut in std::mem::take(&mut self.done).iter().rev() {
            join_cut(cx, cut)?;
        }
        Ok(())
    }
}

pub fn cut_all(seq: &Sequence, frame: Frame) -> Result<EditAction> {
    let tracks: Vec<TrackId> = seq
        .tracks()
        .iter()
        .filter(|t| !t.locked && frame > 0 && frame < t.length())
        .map(|t| t.id)
        .collect();
    if tracks.is_empty() {
        return Err(TimelineError::InvalidOp(format!(
            "no unlocked track to cut at frame {}",
            frame
        )));
    }
    Ok(EditAction::new(EditOp::CutAll(CutAll {
        frame,
        tracks,
        done: Vec::new(),
    })))
}
