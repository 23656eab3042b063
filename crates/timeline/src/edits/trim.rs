//! One-track trims. None of these move content on other tracks.

use crate::{EditAction, EditContext, EditOp, Frame, Result, Sequence, TimelineError, TrackId, TrackItem};

use super::{check_clip_range, check_delta_nonzero, stashed, unlocked_track, Reversible};

/// Sets a clip's media range in place; the rest of the track shifts.
#[derive(Debug, Clone)]
pub struct ClipRangeTrim {
    pub track: TrackId,
    pub index: usize,
    pub new_in: Frame,
    pub new_out: Frame,
    orig: Option<(Frame, Frame)>,
}

impl Reversible for ClipRangeTrim {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = cx.seq.track(self.track)?.clip(self.index)?;
        self.orig = Some((clip.clip_in, clip.clip_out));
        cx.seq
            .set_clip_range(self.track, self.index, self.new_in, self.new_out)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (clip_in, clip_out) = stashed(&mut self.orig, "trim")?;
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)
    }
}

fn range_trim(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    range: impl FnOnce(Frame, Frame) -> (Frame, Frame),
) -> Result<ClipRangeTrim> {
    let clip = unlocked_track(seq, track)?.clip(index)?;
    let (new_in, new_out) = range(clip.clip_in, clip.clip_out);
    check_clip_range(clip, new_in, new_out)?;
    Ok(ClipRangeTrim {
        track,
        index,
        new_in,
        new_out,
        orig: None,
    })
}

pub fn trim_start(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let trim = range_trim(seq, track, index, |i, o| (i + delta, o))?;
    Ok(EditAction::new(EditOp::TrimStart(trim)))
}

pub fn trim_end(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let trim = range_trim(seq, track, index, |i, o| (i, o + delta))?;
    Ok(EditAction::new(EditOp::TrimEnd(trim)))
}

/// Trims the end of the last clip of a track, which has nothing after it.
pub fn trim_last_clip_end(seq: &Sequence, track: TrackId, delta: Frame) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let count = seq.track(track)?.count();
    let index = count.checked_sub(1).ok_or_else(|| {
        TimelineError::InvalidOp(format!("track {} has no last clip", track))
    })?;
    let trim = range_trim(seq, track, index, |i, o| (i, o + delta))?;
    Ok(EditAction::new(EditOp::TrimLastClipEnd(trim)))
}

pub fn set_clip_length(seq: &Sequence, track: TrackId, index: usize, length: Frame) -> Result<EditAction> {
    if length < 1 {
        return Err(TimelineError::InvalidOp(format!("clip length {}", length)));
    }
    let trim = range_trim(seq, track, index, |i, _| (i, i + length - 1))?;
    Ok(EditAction::new(EditOp::SetClipLength(trim)))
}

/// Slips the media under a clip without changing its position or length.
pub fn slide_trim(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let trim = range_trim(seq, track, index, |i, o| (i + delta, o + delta))?;
    Ok(EditAction::new(EditOp::SlideTrim(trim)))
}

/// Extends the end of a still image clip past the length its media was
/// given, growing the media length with it.
#[derive(Debug, Clone)]
pub struct ImageEndExtend {
    pub track: TrackId,
    pub index: usize,
    pub delta: Frame,
    old_media_length: Option<Option<Frame>>,
}

impl Reversible for ImageEndExtend {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = cx.seq.track(self.track)?.clip(self.index)?;
        let (id, clip_in, clip_out) = (clip.id, clip.clip_in, clip.clip_out + self.delta);
        let media = cx.seq.clip_by_id_mut(id)?;
        self.old_media_length = Some(media.media_length.replace(clip_out + 1));
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let old = stashed(&mut self.old_media_length, "trim image end")?;
        let clip = cx.seq.track(self.track)?.clip(self.index)?;
        let (id, clip_in, clip_out) = (clip.id, clip.clip_in, clip.clip_out - self.delta);
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)?;
        cx.seq.clip_by_id_mut(id)?.media_length = old;
        Ok(())
    }
}

/// Trims the end of a still image clip to beyond its media length.
pub fn trim_image_end_beyond_max_length(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    delta: Frame,
) -> Result<EditAction> {
    let clip = unlocked_track(seq, track)?.clip(index)?;
    if !clip.is_still_image() {
        return Err(TimelineError::InvalidOp(format!(
            "clip '{}' is not a still image",
            clip.name
        )));
    }
    let media_length = clip.media_length.ok_or_else(|| {
        TimelineError::InvalidOp(format!("clip '{}' has no media length to extend", clip.name))
    })?;
    if clip.clip_out + delta < media_length {
        return Err(TimelineError::InvalidOp(format!(
            "trim of {} stays inside the {} frames of '{}'",
            delta, media_length, clip.name
        )));
    }
    Ok(EditAction::new(EditOp::TrimImageEndBeyondMaxLength(ImageEndExtend {
        track,
        index,
        delta,
        old_media_length: None,
    })))
}

fn rolled_from(item: &TrackItem, delta: Frame) -> TrackItem {
    match item {
        TrackItem::Blank { length } => TrackItem::blank(length + delta),
        TrackItem::Clip(clip) => {
            let (clip_in, clip_out) = (clip.clip_in, clip.clip_out + delta);
            TrackItem::Clip(clip.clone().with_range(clip_in, clip_out))
        }
    }
}

fn rolled_to(item: &TrackItem, delta: Frame) -> TrackItem {
    match item {
        TrackItem::Blank { length } => TrackItem::blank(length - delta),
        TrackItem::Clip(clip) => {
            let (clip_in, clip_out) = (clip.clip_in + delta, clip.clip_out);
            TrackItem::Clip(clip.clone().with_range(clip_in, clip_out))
        }
    }
}

fn check_rolled(item: &TrackItem) -> Result<()> {
    match item {
        TrackItem::Blank { length } if *length < 1 => Err(TimelineError::InvalidOp(
            "two roll trim would empty a blank".to_string(),
        )),
        TrackItem::Blank { .. } => Ok(()),
        TrackItem::Clip(clip) => check_clip_range(clip, clip.clip_in, clip.clip_out),
    }
}

/// Moves the cut between entries `index - 1` and `index` by `delta`.
#[derive(Debug, Clone)]
pub struct TworollTrim {
    pub track: TrackId,
    pub index: usize,
    pub delta: Frame,
    orig: Option<(TrackItem, TrackItem)>,
}

impl Reversible for TworollTrim {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let to = cx.seq.remove_item(self.track, self.index)?;
        let from = cx.seq.remove_item(self.track, self.index - 1)?;
        cx.seq
            .insert_item(self.track, self.index - 1, rolled_from(&from, self.delta))?;
        cx.seq
            .insert_item(self.track, self.index, rolled_to(&to, self.delta))?;
        self.orig = Some((from, to));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (from, to) = stashed(&mut self.orig, "tworoll trim")?;
        cx.seq.remove_item(self.track, self.index)?;
        cx.seq.remove_item(self.track, self.index - 1)?;
        cx.seq.insert_item(self.track, self.index - 1, from)?;
        cx.seq.insert_item(self.track, self.index, to)
    }
}

pub fn tworoll_trim(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let t = unlocked_track(seq, track)?;
    if index == 0 || index >= t.count() {
        return Err(TimelineError::IndexOutOfBounds {
            track,
            index,
            count: t.count(),
        });
    }
    let (from, to) = (t.item(index - 1)?, t.item(index)?);
    if from.is_blank() && to.is_blank() {
        return Err(TimelineError::InvalidOp(
            "two roll trim between two blanks".to_string(),
        ));
    }
    check_rolled(&rolled_from(from, delta))?;
    check_rolled(&rolled_to(to, delta))?;
    Ok(EditAction::new(EditOp::TworollTrim(TworollTrim {
        track,
        index,
        delta,
        orig: None,
    })))
}

/// Drags a clip's end into (or back out of) the blank after it.
#[derive(Debug, Clone)]
pub struct ClipEndDragOnBlank {
    pub track: TrackId,
    pub index: usize,
    pub delta: Frame,
    orig: Option<(Frame, Frame)>,
}

impl Reversible for ClipEndDragOnBlank {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let t = cx.seq.track(self.track)?;
        let blank_length = t.blank_length(self.index + 1)?;
        let clip = t.clip(self.index)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq
            .set_clip_range(self.track, self.index, clip_in, clip_out + self.delta)?;
        cx.seq.remove_item(self.track, self.index + 1)?;
        cx.seq
            .insert_blank(self.track, self.index + 1, blank_length - self.delta)?;
        self.orig = Some((clip_out, blank_length));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (clip_out, blank_length) = stashed(&mut self.orig, "clip end drag")?;
        cx.seq.remove_item(self.track, self.index + 1)?;
        cx.seq.insert_blank(self.track, self.index + 1, blank_length)?;
        let clip_in = cx.seq.track(self.track)?.clip(self.index)?.clip_in;
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)
    }
}

pub fn clip_end_drag_on_blank(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let t = unlocked_track(seq, track)?;
    let blank_length = t.blank_length(index + 1)?;
    let clip = t.clip(index)?;
    check_clip_range(clip, clip.clip_in, clip.clip_out + delta)?;
    if blank_length - delta < 1 {
        return Err(TimelineError::InvalidOp(format!(
            "drag of {} does not leave any of blank of length {}",
            delta, blank_length
        )));
    }
    Ok(EditAction::new(EditOp::ClipEndDragOnBlank(ClipEndDragOnBlank {
        track,
        index,
        delta,
        orig: None,
    })))
}

/// Drags a clip's end over the whole blank after it, removing the blank.
#[derive(Debug, Clone)]
pub struct ClipEndDragReplaceBlank {
    pub track: TrackId,
    pub index: usize,
    pub delta: Frame,
    orig: Option<(Frame, Frame)>,
}

impl Reversible for ClipEndDragReplaceBlank {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let blank_length = cx.seq.track(self.track)?.blank_length(self.index + 1)?;
        cx.seq.remove_item(self.track, self.index + 1)?;
        let clip = cx.seq.track(self.track)?.clip(self.index)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq
            .set_clip_range(self.track, self.index, clip_in, clip_out + self.delta)?;
        self.orig = Some((clip_out, blank_length));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (clip_out, blank_length) = stashed(&mut self.orig, "clip end drag")?;
        let clip_in = cx.seq.track(self.track)?.clip(self.index)?.clip_in;
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)?;
        cx.seq.insert_blank(self.track, self.index + 1, blank_length)
    }
}

pub fn clip_end_drag_replace_blank(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    delta: Frame,
) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let t = unlocked_track(seq, track)?;
    t.blank_length(index + 1)?;
    let clip = t.clip(index)?;
    check_clip_range(clip, clip.clip_in, clip.clip_out + delta)?;
    Ok(EditAction::new(EditOp::ClipEndDragReplaceBlank(
        ClipEndDragReplaceBlank {
            track,
            index,
            delta,
            orig: None,
        },
    )))
}

/// Drags a clip's start within the blank before it. A positive delta moves
/// the start later and grows the blank.
#[derive(Debug, Clone)]
pub struct ClipStartDragOnBlank {
    pub track: TrackId,
    pub index: usize,
    pub delta: Frame,
    orig: Option<(Frame, Frame)>,
}

impl Reversible for ClipStartDragOnBlank {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let t = cx.seq.track(self.track)?;
        let blank_length = t.blank_length(self.index - 1)?;
        let clip = t.clip(self.index)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq.remove_item(self.track, self.index - 1)?;
        cx.seq
            .insert_blank(self.track, self.index - 1, blank_length + self.delta)?;
        cx.seq
            .set_clip_range(self.track, self.index, clip_in + self.delta, clip_out)?;
        self.orig = Some((clip_in, blank_length));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (clip_in, blank_length) = stashed(&mut self.orig, "clip start drag")?;
        cx.seq.remove_item(self.track, self.index - 1)?;
        cx.seq.insert_blank(self.track, self.index - 1, blank_length)?;
        let clip_out = cx.seq.track(self.track)?.clip(self.index)?.clip_out;
        cx.seq.set_clip_range(self.track, self.index, clip_in, clip_out)
    }
}

pub fn clip_start_drag_on_blank(seq: &Sequence, track: TrackId, index: usize, delta: Frame) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let t = unlocked_track(seq, track)?;
    let blank_index = index.checked_sub(1).ok_or_else(|| {
        TimelineError::InvalidOp("clip start drag needs a blank before the clip".to_string())
    })?;
    let blank_length = t.blank_length(blank_index)?;
    let clip = t.clip(index)?;
    check_clip_range(clip, clip.clip_in + delta, clip.clip_out)?;
    if blank_length + delta < 1 {
        return Err(TimelineError::InvalidOp(format!(
            "drag of {} does not leave any of blank of length {}",
            delta, blank_length
        )));
    }
    Ok(EditAction::new(EditOp::ClipStartDragOnBlank(
        ClipStartDragOnBlank {
            track,
            index,
            delta,
            orig: None,
        },
    )))
}

/// Drags a clip's start over the whole blank before it; the clip ends up
/// at `index - 1`.
#[derive(Debug, Clone)]
pub struct ClipStartDragReplaceBlank {
    pub track: TrackId,
    pub index: usize,
    pub delta: Frame,
    orig: Option<(Frame, Frame)>,
}

impl Reversible for ClipStartDragReplaceBlank {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let blank_length = cx.seq.track(self.track)?.blank_length(self.index - 1)?;
        cx.seq.remove_item(self.track, self.index - 1)?;
        let clip = cx.seq.track(self.track)?.clip(self.index - 1)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq
            .set_clip_range(self.track, self.index - 1, clip_in + self.delta, clip_out)?;
        self.orig = Some((clip_in, blank_length));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (clip_in, blank_length) = stashed(&mut self.orig, "clip start drag")?;
        let clip_out = cx.seq.track(self.track)?.clip(self.index - 1)?.clip_out;
        cx.seq
            .set_clip_range(self.track, self.index - 1, clip_in, clip_out)?;
        cx.seq.insert_blank(self.track, self.index - 1, blank_length)
    }
}

pub fn clip_start_drag_replace_blank(
    seq: &Sequence,
    track: TrackId,
    index: usize,
    delta: Frame,
) -> Result<EditAction> {
    check_delta_nonzero(delta)?;
    let t = unlocked_track(seq, track)?;
    let blank_index = index.checked_sub(1).ok_or_else(|| {
        TimelineError::InvalidOp("clip start drag needs a blank before the clip".to_string())
    })?;
    t.blank_length(blank_index)?;
    let clip = t.clip(index)?;
    check_clip_range(clip, clip.clip_in + delta, clip.clip_out)?;
    Ok(EditAction::new(EditOp::ClipStartDragReplaceBlank(
        ClipStartDragReplaceBlank {
            track,
            index,
            delta,
            orig: None,
        },
    )))
}

fn remove_consecutive_blanks(cx: &mut EditContext<'_>, track: TrackId, index: usize) -> Result<Vec<Frame>> {
    let mut lengths = Vec::new();
    while cx.seq.track(track)?.is_blank_at(index) {
        lengths.push(cx.seq.remove_item(track, index)?.length());
    }
    Ok(lengths)
}

fn consecutive_blank_length(seq: &Sequence, track: TrackId, index: usize) -> Result<Frame> {
    let t = seq.track(track)?;
    Ok(t.items()
        .iter()
        .skip(index)
        .take_while(|item| item.is_blank())
        .map(TrackItem::length)
        .sum())
}

/// Extends a clip's end over all blanks directly after it.
#[derive(Debug, Clone)]
pub struct TrimEndOverBlanks {
    pub track: TrackId,
    pub clip_index: usize,
    removed_lengths: Vec<Frame>,
}

impl Reversible for TrimEndOverBlanks {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.removed_lengths = remove_consecutive_blanks(cx, self.track, self.clip_index + 1)?;
        let total: Frame = self.removed_lengths.iter().sum();
        let clip = cx.seq.track(self.track)?.clip(self.clip_index)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq
            .set_clip_range(self.track, self.clip_index, clip_in, clip_out + total)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let lengths = std::mem::take(&mut self.removed_lengths);
        let total: Frame = lengths.iter().sum();
        let clip = cx.seq.track(self.track)?.clip(self.clip_index)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq
            .set_clip_range(self.track, self.clip_index, clip_in, clip_out - total)?;
        for (offset, length) in lengths.into_iter().enumerate() {
            cx.seq
                .insert_blank(self.track, self.clip_index + 1 + offset, length)?;
        }
        Ok(())
    }
}

pub fn trim_end_over_blanks(seq: &Sequence, track: TrackId, clip_index: usize) -> Result<EditAction> {
    let clip = unlocked_track(seq, track)?.clip(clip_index)?;
    let total = consecutive_blank_length(seq, track, clip_index + 1)?;
    if total == 0 {
        return Err(TimelineError::NotABlank {
            track,
            index: clip_index + 1,
        });
    }
    check_clip_range(clip, clip.clip_in, clip.clip_out + total)?;
    Ok(EditAction::new(EditOp::TrimEndOverBlanks(TrimEndOverBlanks {
        track,
        clip_index,
        removed_lengths: Vec::new(),
    })))
}

/// Extends a clip's start back over all blanks starting at `blank_index`.
#[derive(Debug, Clone)]
pub struct TrimStartOverBlanks {
    pub track: TrackId,
    pub blank_index: usize,
    removed_lengths: Vec<Frame>,
}

impl Reversible for TrimStartOverBlanks {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.removed_lengths = remove_consecutive_blanks(cx, self.track, self.blank_index)?;
        let total: Frame = self.removed_lengths.iter().sum();
        let clip = cx.seq.track(self.track)?.clip(self.blank_index)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq
            .set_clip_range(self.track, self.blank_index, clip_in - total, clip_out)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let lengths = std::mem::take(&mut self.removed_lengths);
        let total: Frame = lengths.iter().sum();
        let clip = cx.seq.track(self.track)?.clip(self.blank_index)?;
        let (clip_in, clip_out) = (clip.clip_in, clip.clip_out);
        cx.seq
            .set_clip_range(self.track, self.blank_index, clip_in + total, clip_out)?;
        for (offset, length) in lengths.into_iter().enumerate() {
            cx.seq
                .insert_blank(self.track, self.blank_index + offset, length)?;
        }
        Ok(())
    }
}

pub fn trim_start_over_blanks(seq: &Sequence, track: TrackId, blank_index: usize) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    let total = consecutive_blank_length(seq, track, blank_index)?;
    if total == 0 {
        return Err(TimelineError::NotABlank {
            track,
            index: blank_index,
        });
    }
    let clip_index = t.items()[blank_index..]
        .iter()
        .position(|item| !item.is_blank())
        .map(|offset| blank_index + offset)
        .ok_or(TimelineError::NotAClip {
            track,
            index: t.count(),
        })?;
    let clip = t.clip(clip_index)?;
    check_clip_range(clip, clip.clip_in - total, clip.clip_out)?;
    Ok(EditAction::new(EditOp::TrimStartOverBlanks(
        TrimStartOverBlanks {
            track,
            blank_index,
            removed_lengths: Vec::new(),
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Clip, InMemoryBackend, MediaSource, NullHost, Refresh, TrackKind};

    fn clip(clip_in: Frame, clip_out: Frame) -> TrackItem {
        Clip::new(
            "c",
            MediaSource::File {
                path: "c.mov".to_string(),
                ttl: None,
            },
            Some(1000),
        )
        .with_range(clip_in, clip_out)
        .into()
    }

    /// [A 100..=149][blank 20][B 300..=349]
    fn sequence() -> (Sequence, TrackId) {
        let mut seq = Sequence::new("s");
        let t = seq.add_track("V1", TrackKind::Video);
        seq.append(t, clip(100, 149)).unwrap();
        seq.append(t, TrackItem::blank(20)).unwrap();
        seq.append(t, clip(300, 349)).unwrap();
        (seq, t)
    }

    fn layout(seq: &Sequence, t: TrackId) -> Vec<(bool, Frame, Frame)> {
        seq.track(t)
            .unwrap()
            .items()
            .iter()
            .map(|i| (i.is_blank(), i.clip_in(), i.clip_out()))
            .collect()
    }

    fn run_and_undo(
        seq: &mut Sequence,
        t: TrackId,
        mut action: EditAction,
        expected: Vec<(bool, Frame, Frame)>,
    ) {
        let before = seq.track(t).unwrap().clone();
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        let mut cx = EditContext::new(seq, &mut backend, &mut host);
        action.redo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(layout(cx.seq, t), expected);
        action.undo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(cx.seq.track(t).unwrap(), &before);
    }

    #[test]
    fn test_trim_start_and_end() {
        let (mut seq, t) = sequence();
        let action = trim_start(&seq, t, 0, 10).unwrap();
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 110, 149), (true, 0, 19), (false, 300, 349)],
        );
        let action = trim_end(&seq, t, 2, -20).unwrap();
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 100, 149), (true, 0, 19), (false, 300, 329)],
        );
    }

    #[test]
    fn test_trim_rejects_range_outside_media() {
        let (seq, t) = sequence();
        assert!(trim_start(&seq, t, 0, -101).is_err());
        assert!(trim_end(&seq, t, 0, -60).is_err());
        assert!(trim_start(&seq, t, 1, 5).is_err());
    }

    #[test]
    fn test_tworoll_into_blank() {
        let (mut seq, t) = sequence();
        let action = tworoll_trim(&seq, t, 1, 5).unwrap();
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 100, 154), (true, 0, 14), (false, 300, 349)],
        );
        assert!(tworoll_trim(&seq, t, 1, 20).is_err());
    }

    #[test]
    fn test_slide_and_set_length() {
        let (mut seq, t) = sequence();
        let action = slide_trim(&seq, t, 2, -50).unwrap();
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 100, 149), (true, 0, 19), (false, 250, 299)],
        );
        let action = set_clip_length(&seq, t, 0, 10).unwrap();
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 100, 109), (true, 0, 19), (false, 300, 349)],
        );
    }

    #[test]
    fn test_drags_on_blank() {
        let (mut seq, t) = sequence();
        let action = clip_end_drag_on_blank(&seq, t, 0, 8).unwrap();
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 100, 157), (true, 0, 11), (false, 300, 349)],
        );
        let action = clip_start_drag_on_blank(&seq, t, 2, -8).unwrap();
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 100, 149), (true, 0, 11), (false, 292, 349)],
        );
        assert!(clip_end_drag_on_blank(&seq, t, 0, 20).is_err());
    }

    #[test]
    fn test_drags_replacing_blank() {
        let (mut seq, t) = sequence();
        let action = clip_end_drag_replace_blank(&seq, t, 0, 20).unwrap();
        run_and_undo(&mut seq, t, action, vec![(false, 100, 169), (false, 300, 349)]);
        let action = clip_start_drag_replace_blank(&seq, t, 2, -20).unwrap();
        run_and_undo(&mut seq, t, action, vec![(false, 100, 149), (false, 280, 349)]);
    }

    #[test]
    fn test_trims_over_blanks() {
        let (mut seq, t) = sequence();
        let action = trim_end_over_blanks(&seq, t, 0).unwrap();
        run_and_undo(&mut seq, t, action, vec![(false, 100, 169), (false, 300, 349)]);
        let action = trim_start_over_blanks(&seq, t, 1).unwrap();
        run_and_undo(&mut seq, t, action, vec![(false, 100, 149), (false, 280, 349)]);
        assert!(trim_end_over_blanks(&seq, t, 2).is_err());
    }

    #[test]
    fn test_trim_image_end_grows_media_length() {
        let (mut seq, t) = sequence();
        let image = Clip::new(
            "title",
            MediaSource::File {
                path: "title.png".to_string(),
                ttl: None,
            },
            Some(100),
        )
        .with_range(60, 99);
        seq.append(t, image.into()).unwrap();
        assert!(trim_end(&seq, t, 3, 10).is_err());
        assert!(trim_image_end_beyond_max_length(&seq, t, 3, -5).is_err());
        assert!(trim_image_end_beyond_max_length(&seq, t, 0, 900).is_err());

        let mut action = trim_image_end_beyond_max_length(&seq, t, 3, 25).unwrap();
        assert!(!action.policy.exit_active_trim_mode);
        let before = seq.clone();
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        let mut cx = EditContext::new(&mut seq, &mut backend, &mut host);
        action.redo(&mut cx, Refresh::Immediate).unwrap();
        let clip = cx.seq.track(t).unwrap().clip(3).unwrap();
        assert_eq!((clip.clip_in, clip.clip_out), (60, 124));
        assert_eq!(clip.media_length, Some(125));
        action.undo(&mut cx, Refresh::Immediate).unwrap();
        assert_eq!(seq.tracks(), before.tracks());
    }

    #[test]
    fn test_trim_last_clip_end() {
        let (mut seq, t) = sequence();
        let action = trim_last_clip_end(&seq, t, 30).unwrap();
        assert_eq!(action.name(), "trim_last_clip_end");
        assert!(!action.policy.exit_active_trim_mode);
        run_and_undo(
            &mut seq,
            t,
            action,
            vec![(false, 100, 149), (true, 0, 19), (false, 300, 379)],
        );
    }
}
