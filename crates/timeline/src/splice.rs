//! Cut-at-frame and range extract / put back primitives shared by the
//! overwrite family of edits.

use tracing::debug;

use crate::{Clip, EditContext, Frame, Result, Sequence, TimelineError, TrackId, TrackItem};

/// Media range of an entry before it was cut in two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutRecord {
    pub orig_in: Frame,
    pub orig_out: Frame,
}

impl CutRecord {
    pub fn length(&self) -> Frame {
        self.orig_out - self.orig_in + 1
    }
}

/// Replaces the clip at `index` with itself truncated to `[in, cut_frame - 1]`
/// followed by `tail` playing `[cut_frame, out]`. `cut_frame` is a media frame.
pub fn cut_clip_at(
    seq: &mut Sequence,
    track: TrackId,
    index: usize,
    cut_frame: Frame,
    tail: Clip,
) -> Result<()> {
    let item = seq.remove_item(track, index)?;
    let clip = match item {
        TrackItem::Clip(clip) => clip,
        blank @ TrackItem::Blank { .. } => {
            seq.insert_item(track, index, blank)?;
            return Err(TimelineError::NotAClip { track, index });
        }
    };
    let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
    seq.insert_clip(track, index, clip, clip_in, cut_frame - 1)?;
    seq.insert_clip(track, index + 1, tail, cut_frame, clip_out)
}

/// Splits the blank at `index` into `[0, cut_frame)` and `[cut_frame, length)`.
pub fn cut_blank_at(seq: &mut Sequence, track: TrackId, index: usize, cut_frame: Frame) -> Result<()> {
    let length = seq.track(track)?.blank_length(index)?;
    seq.remove_item(track, index)?;
    seq.insert_blank(track, index, cut_frame)?;
    seq.insert_blank(track, index + 1, length - cut_frame)
}

/// Cuts the entry containing track frame `frame` in two.
///
/// Returns `None` and leaves the track untouched when `frame` is already an
/// entry boundary or at or after the track end.
pub fn overwrite_cut_track(
    cx: &mut EditContext<'_>,
    track: TrackId,
    frame: Frame,
    clone_filters: bool,
) -> Result<Option<CutRecord>> {
    let t = cx.seq.track(track)?;
    let index = t.clip_index_at(frame);
    if index >= t.count() {
        return Ok(None);
    }
    let item = t.item(index)?;
    let (orig_in, orig_out) = (item.clip_in(), item.clip_out());
    let clip_frame = frame - t.clip_start(index) + orig_in;
    if clip_frame == orig_in || clip_frame == orig_out + 1 {
        return Ok(None);
    }

    match item.as_clip().cloned() {
        None => cut_blank_at(cx.seq, track, index, clip_frame)?,
        Some(clip) => {
            let mut tail = cx.backend.clone_clip(&clip)?;
            if clone_filters {
                tail.filters = cx.backend.clone_filters(&clip);
            }
            cut_clip_at(cx.seq, track, index, clip_frame, tail)?;
        }
    }
    Ok(Some(CutRecord { orig_in, orig_out }))
}

/// What `extract_range` did to a track, enough to put the range back.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExtract {
    pub track: TrackId,
    pub starts_after_end: bool,
    pub in_cut: Option<CutRecord>,
    pub out_cut: Option<CutRecord>,
    /// Index of the first removed entry, where callers insert their content.
    pub in_index: usize,
    pub removed: Vec<TrackItem>,
}

/// Removes everything in the half-open range `[over_in, over_out)` of a track,
/// cutting entries that straddle either end.
pub fn extract_range(
    cx: &mut EditContext<'_>,
    track: TrackId,
    over_in: Frame,
    over_out: Frame,
) -> Result<RangeExtract> {
    if over_out <= over_in {
        return Err(TimelineError::InvalidOp(format!(
            "empty range {}..{}",
            over_in, over_out
        )));
    }
    let length = cx.seq.track(track)?.length();
    let starts_after_end = over_in >= length;
    if starts_after_end {
        let count = cx.seq.track(track)?.count();
        cx.seq.insert_blank(track, count, over_out - length)?;
    }

    let in_cut = overwrite_cut_track(cx, track, over_in, false)?;
    let out_cut = if cx.seq.track(track)?.length() > over_out {
        overwrite_cut_track(cx, track, over_out, true)?
    } else {
        None
    };

    let t = cx.seq.track(track)?;
    let in_index = t.clip_index_at(over_in);
    let out_index = t.clip_index_at(over_out);
    let mut removed = Vec::with_capacity(out_index - in_index);
    for _ in in_index..out_index {
        removed.push(cx.seq.remove_item(track, in_index)?);
    }

    Ok(RangeExtract {
        track,
        starts_after_end,
        in_cut,
        out_cut,
        in_index,
        removed,
    })
}

/// Restores a range removed by `extract_range`. The caller must already have
/// removed whatever it inserted at `in_index`.
pub fn put_back_range(seq: &mut Sequence, data: RangeExtract) -> Result<()> {
    let RangeExtract {
        track,
        in_cut,
        out_cut,
        in_index,
        mut removed,
        ..
    } = data;

    if let Some(cut) = in_cut {
        let head_index = in_index - 1;
        match seq.remove_item(track, head_index)? {
            TrackItem::Clip(clip) => {
                let clip_in = clip.clip_in;
                seq.insert_clip(track, head_index, clip, clip_in, cut.orig_out)?;
            }
            TrackItem::Blank { .. } => seq.insert_blank(track, head_index, cut.length())?,
        }
        if !removed.is_empty() {
            removed.remove(0);
        }
    }

    if let Some(cut) = out_cut {
        if in_index < seq.track(track)?.count() {
            let tail = seq.remove_item(track, in_index)?;
            // An overwrite inside a single entry is already whole again.
            if let Some(last) = removed.pop() {
                match last {
                    TrackItem::Clip(clip) => {
                        seq.insert_clip(track, in_index, clip, cut.orig_in, tail.clip_out())?
                    }
                    TrackItem::Blank { .. } => seq.insert_blank(track, in_index, cut.length())?,
                }
            }
        } else {
            debug!(track = %track, in_index, "no out cut tail to restore");
        }
    }

    for (offset, item) in removed.into_iter().enumerate() {
        seq.insert_item(track, in_index + offset, item)?;
    }
    Ok(())
}
