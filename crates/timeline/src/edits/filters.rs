//! Filter stack edits. Clips are addressed by id and looked up when the edit
//! runs, so these edits survive structural edits done in between.

use crate::{
    ClipId, EditAction, EditContext, EditOp, Filter, FilterInfo, Result, Sequence, TimelineError,
};

use super::{check_distinct, stashed, Reversible};

fn check_filter_index(index: usize, count: usize) -> Result<()> {
    if index >= count {
        return Err(TimelineError::FilterIndex { index, count });
    }
    Ok(())
}

fn check_clips(seq: &Sequence, clips: &[ClipId]) -> Result<()> {
    if clips.is_empty() {
        return Err(TimelineError::InvalidOp("no clips given".to_string()));
    }
    check_distinct(clips.iter().copied(), "clip")?;
    for id in clips {
        seq.clip_by_id(*id)?;
    }
    Ok(())
}

/// Appends one filter to a clip's stack.
#[derive(Debug, Clone)]
pub struct AddFilter {
    pub clip: ClipId,
    pub info: FilterInfo,
    /// Build a multipart filter sized to the clip instead of a plain one.
    pub multipart: bool,
    index: Option<usize>,
    /// The filter taken off by undo, attached again on redo.
    filter: Option<Filter>,
}

impl Reversible for AddFilter {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let filter = match self.filter.take() {
            Some(filter) => filter,
            None if self.multipart => {
                let clip = cx.seq.clip_by_id(self.clip)?;
                cx.backend.create_multipart_filter(&self.info, clip)?
            }
            None => cx.backend.create_filter(&self.info)?,
        };
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        let index = clip.filters.len();
        cx.backend.attach_filter(clip, index, filter)?;
        self.index = Some(index);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let index = stashed(&mut self.index, "add filter")?;
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        self.filter = Some(cx.backend.detach_filter(clip, index)?);
        Ok(())
    }
}

pub fn add_filter(seq: &Sequence, clip: ClipId, info: FilterInfo) -> Result<EditAction> {
    seq.clip_by_id(clip)?;
    Ok(EditAction::new(EditOp::AddFilter(AddFilter {
        clip,
        info,
        multipart: false,
        index: None,
        filter: None,
    })))
}

/// Appends a multipart filter covering the clip's range.
pub fn add_multipart_filter(seq: &Sequence, clip: ClipId, info: FilterInfo) -> Result<EditAction> {
    seq.clip_by_id(clip)?;
    Ok(EditAction::new(EditOp::AddMultipartFilter(AddFilter {
        clip,
        info,
        multipart: true,
        index: None,
        filter: None,
    })))
}

/// Inserts two filters; `index_2` is the second filter's index after the
/// first one went in.
#[derive(Debug, Clone)]
pub struct AddTwoFilters {
    pub clip: ClipId,
    pub index_1: usize,
    pub info_1: FilterInfo,
    pub index_2: usize,
    pub info_2: FilterInfo,
    filters: Option<(Filter, Filter)>,
}

impl Reversible for AddTwoFilters {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (first, second) = match self.filters.take() {
            Some(pair) => pair,
            None => (
                cx.backend.create_filter(&self.info_1)?,
                cx.backend.create_filter(&self.info_2)?,
            ),
        };
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        cx.backend.attach_filter(clip, self.index_1, first)?;
        cx.backend.attach_filter(clip, self.index_2, second)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        let second = cx.backend.detach_filter(clip, self.index_2)?;
        let first = cx.backend.detach_filter(clip, self.index_1)?;
        self.filters = Some((first, second));
        Ok(())
    }
}

pub fn add_two_filters(
    seq: &Sequence,
    clip: ClipId,
    index_1: usize,
    info_1: FilterInfo,
    index_2: usize,
    info_2: FilterInfo,
) -> Result<EditAction> {
    let count = seq.clip_by_id(clip)?.filters.len();
    if index_1 > count {
        return Err(TimelineError::FilterIndex { index: index_1, count });
    }
    if index_2 <= index_1 || index_2 > count + 1 {
        return Err(TimelineError::FilterIndex {
            index: index_2,
            count: count + 1,
        });
    }
    Ok(EditAction::new(EditOp::AddTwoFilters(AddTwoFilters {
        clip,
        index_1,
        info_1,
        index_2,
        info_2,
        filters: None,
    })))
}

/// Adds the filters of a multipart effect as one consecutive group.
#[derive(Debug, Clone)]
pub struct AddFilterMulti {
    pub clip: ClipId,
    pub infos: Vec<FilterInfo>,
    pub index: usize,
    filters: Vec<Filter>,
}

impl Reversible for AddFilterMulti {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let mut filters = std::mem::take(&mut self.filters);
        if filters.is_empty() {
            for info in &self.infos {
                filters.push(cx.backend.create_filter(info)?);
            }
        }
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        for (offset, filter) in filters.into_iter().enumerate() {
            cx.backend.attach_filter(clip, self.index + offset, filter)?;
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        for _ in &self.infos {
            let filter = cx.backend.detach_filter(clip, self.index)?;
            self.filters.push(filter);
        }
        Ok(())
    }
}

pub fn add_filter_multi(
    seq: &Sequence,
    clip: ClipId,
    index: usize,
    infos: Vec<FilterInfo>,
) -> Result<EditAction> {
    let count = seq.clip_by_id(clip)?.filters.len();
    if index > count {
        return Err(TimelineError::FilterIndex { index, count });
    }
    if infos.is_empty() {
        return Err(TimelineError::InvalidOp("no filters given".to_string()));
    }
    Ok(EditAction::new(EditOp::AddFilterMulti(AddFilterMulti {
        clip,
        infos,
        index,
        filters: Vec::new(),
    })))
}

#[derive(Debug, Clone)]
pub struct RemoveFilter {
    pub clip: ClipId,
    pub index: usize,
    removed: Option<Filter>,
}

impl Reversible for RemoveFilter {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        self.removed = Some(cx.backend.detach_filter(clip, self.index)?);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let filter = stashed(&mut self.removed, "remove filter")?;
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        cx.backend.attach_filter(clip, self.index, filter)
    }
}

pub fn remove_filter(seq: &Sequence, clip: ClipId, index: usize) -> Result<EditAction> {
    check_filter_index(index, seq.clip_by_id(clip)?.filters.len())?;
    Ok(EditAction::new(EditOp::RemoveFilter(RemoveFilter {
        clip,
        index,
        removed: None,
    })))
}

/// Removes the filters at `index_1` and `index_2`, `index_1 < index_2`.
#[derive(Debug, Clone)]
pub struct RemoveTwoFilters {
    pub clip: ClipId,
    pub index_1: usize,
    pub index_2: usize,
    removed: Option<(Filter, Filter)>,
}

impl Reversible for RemoveTwoFilters {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        let second = cx.backend.detach_filter(clip, self.index_2)?;
        let first = cx.backend.detach_filter(clip, self.index_1)?;
        self.removed = Some((first, second));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (first, second) = stashed(&mut self.removed, "remove two filters")?;
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        cx.backend.attach_filter(clip, self.index_1, first)?;
        cx.backend.attach_filter(clip, self.index_2, second)
    }
}

pub fn remove_two_filters(seq: &Sequence, clip: ClipId, index_1: usize, index_2: usize) -> Result<EditAction> {
    let count = seq.clip_by_id(clip)?.filters.len();
    check_filter_index(index_2, count)?;
    if index_1 >= index_2 {
        return Err(TimelineError::InvalidOp(format!(
            "filter {} is not before filter {}",
            index_1, index_2
        )));
    }
    Ok(EditAction::new(EditOp::RemoveTwoFilters(RemoveTwoFilters {
        clip,
        index_1,
        index_2,
        removed: None,
    })))
}

/// Moves a filter so that it ends up at `to_index` in the stack.
#[derive(Debug, Clone)]
pub struct MoveFilter {
    pub clip: ClipId,
    pub from_index: usize,
    pub to_index: usize,
}

impl MoveFilter {
    fn shift(cx: &mut EditContext<'_>, clip: ClipId, from: usize, to: usize) -> Result<()> {
        let clip = cx.seq.clip_by_id_mut(clip)?;
        let filter = cx.backend.detach_filter(clip, from)?;
        cx.backend.attach_filter(clip, to, filter)
    }
}

impl Reversible for MoveFilter {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        Self::shift(cx, self.clip, self.from_index, self.to_index)
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        Self::shift(cx, self.clip, self.to_index, self.from_index)
    }
}

pub fn move_filter(seq: &Sequence, clip: ClipId, from_index: usize, to_index: usize) -> Result<EditAction> {
    let count = seq.clip_by_id(clip)?.filters.len();
    check_filter_index(from_index, count)?;
    check_filter_index(to_index, count)?;
    if from_index == to_index {
        return Err(TimelineError::InvalidOp(format!(
            "filter {} moved onto itself",
            from_index
        )));
    }
    Ok(EditAction::new(EditOp::MoveFilter(MoveFilter {
        clip,
        from_index,
        to_index,
    })))
}

/// Clears the filter stacks of several clips.
#[derive(Debug, Clone)]
pub struct RemoveMultipleFilters {
    pub clips: Vec<ClipId>,
    removed: Vec<Vec<Filter>>,
}

impl Reversible for RemoveMultipleFilters {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.removed.clear();
        for id in &self.clips {
            let clip = cx.seq.clip_by_id_mut(*id)?;
            self.removed.push(std::mem::take(&mut clip.filters));
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        for (id, filters) in self.clips.iter().zip(std::mem::take(&mut self.removed)) {
            cx.seq.clip_by_id_mut(*id)?.filters = filters;
        }
        Ok(())
    }
}

pub fn remove_multiple_filters(seq: &Sequence, clips: Vec<ClipId>) -> Result<EditAction> {
    check_clips(seq, &clips)?;
    Ok(EditAction::new(EditOp::RemoveMultipleFilters(RemoveMultipleFilters {
        clips,
        removed: Vec::new(),
    })))
}

/// Replaces a clip's filter stack with duplicates of another clip's.
#[derive(Debug, Clone)]
pub struct CloneFilters {
    pub clip: ClipId,
    pub source_clip: ClipId,
    replaced: Option<Vec<Filter>>,
}

impl Reversible for CloneFilters {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let filters = {
            let source = cx.seq.clip_by_id(self.source_clip)?;
            cx.backend.clone_filters(source)
        };
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        self.replaced = Some(std::mem::replace(&mut clip.filters, filters));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let filters = stashed(&mut self.replaced, "clone filters")?;
        cx.seq.clip_by_id_mut(self.clip)?.filters = filters;
        Ok(())
    }
}

pub fn clone_filters(seq: &Sequence, clip: ClipId, source_clip: ClipId) -> Result<EditAction> {
    if clip == source_clip {
        return Err(TimelineError::InvalidOp("clip cloned onto itself".to_string()));
    }
    check_clips(seq, &[clip, source_clip])?;
    Ok(EditAction::new(EditOp::CloneFilters(CloneFilters {
        clip,
        source_clip,
        replaced: None,
    })))
}

/// Appends copies of copied filters to every target clip.
#[derive(Debug, Clone)]
pub struct PasteFilters {
    pub clips: Vec<ClipId>,
    pub filters: Vec<Filter>,
    stack_lengths: Vec<usize>,
}

impl Reversible for PasteFilters {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.stack_lengths.clear();
        for id in &self.clips {
            let clip = cx.seq.clip_by_id_mut(*id)?;
            self.stack_lengths.push(clip.filters.len());
            for filter in &self.filters {
                let index = clip.filters.len();
                cx.backend.attach_filter(clip, index, filter.duplicate())?;
            }
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        for (id, len) in self.clips.iter().zip(std::mem::take(&mut self.stack_lengths)) {
            cx.seq.clip_by_id_mut(*id)?.filters.truncate(len);
        }
        Ok(())
    }
}

pub fn paste_filters(seq: &Sequence, clips: Vec<ClipId>, filters: Vec<Filter>) -> Result<EditAction> {
    check_clips(seq, &clips)?;
    if filters.is_empty() {
        return Err(TimelineError::InvalidOp("nothing to paste".to_string()));
    }
    Ok(EditAction::new(EditOp::PasteFilters(PasteFilters {
        clips,
        filters,
        stack_lengths: Vec::new(),
    })))
}

/// Sets or clears the mute filter of a clip.
#[derive(Debug, Clone)]
pub struct MuteClip {
    pub clip: ClipId,
    pub mute: bool,
    swapped: Option<Option<Filter>>,
}

impl Reversible for MuteClip {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let filter = if self.mute {
            Some(cx.backend.create_mute_filter())
        } else {
            None
        };
        let clip = cx.seq.clip_by_id_mut(self.clip)?;
        self.swapped = Some(std::mem::replace(&mut clip.mute_filter, filter));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let filter = stashed(&mut self.swapped, "mute clip")?;
        cx.seq.clip_by_id_mut(self.clip)?.mute_filter = filter;
        Ok(())
    }
}

fn mute_state(seq: &Sequence, clip: ClipId, mute: bool) -> Result<MuteClip> {
    if seq.clip_by_id(clip)?.is_muted() == mute {
        return Err(TimelineError::InvalidOp(format!(
            "clip {} is already {}",
            clip,
            if mute { "muted" } else { "unmuted" }
        )));
    }
    Ok(MuteClip {
        clip,
        mute,
        swapped: None,
    })
}

pub fn mute_clip(seq: &Sequence, clip: ClipId) -> Result<EditAction> {
    Ok(EditAction::new(EditOp::MuteClip(mute_state(seq, clip, true)?)))
}

pub fn unmute_clip(seq: &Sequence, clip: ClipId) -> Result<EditAction> {
    Ok(EditAction::new(EditOp::UnmuteClip(mute_state(seq, clip, false)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Clip, InMemoryBackend, MediaSource, NullHost, Refresh, TrackKind};

    fn sequence() -> (Sequence, ClipId, ClipId) {
        let mut seq = Sequence::new("s");
        let t = seq.add_track("V1", TrackKind::Video);
        let media = MediaSource::File {
            path: "c.mov".to_string(),
            ttl: None,
        };
        let mut a = Clip::new("a", media.clone(), Some(100)).with_range(0, 9);
        a.filters.push(Filter::from_info(&FilterInfo::new("blur", "Blur")));
        a.filters.push(Filter::from_info(&FilterInfo::new("sharpen", "Sharpen")));
        let b = Clip::new("b", media, Some(100)).with_range(0, 9);
        let (a_id, b_id) = (a.id, b.id);
        seq.append(t, a.into()).unwrap();
        seq.append(t, b.into()).unwrap();
        (seq, a_id, b_id)
    }

    fn services(seq: &Sequence, clip: ClipId) -> Vec<String> {
        seq.clip_by_id(clip)
            .unwrap()
            .filters
            .iter()
            .map(|f| f.service.clone())
            .collect()
    }

    fn run(seq: &mut Sequence, action: &mut EditAction) {
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        let mut cx = EditContext::new(seq, &mut backend, &mut host);
        action.redo(&mut cx, Refresh::Immediate).unwrap();
    }

    fn undo(seq: &mut Sequence, action: &mut EditAction) {
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        let mut cx = EditContext::new(seq, &mut backend, &mut host);
        action.undo(&mut cx, Refresh::Immediate).unwrap();
    }

    #[test]
    fn test_add_filter_keeps_identity_across_redo() {
        let (mut seq, a, _) = sequence();
        let mut action = add_filter(&seq, a, FilterInfo::new("brightness", "Brightness")).unwrap();
        run(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["blur", "sharpen", "brightness"]);
        let added = seq.clip_by_id(a).unwrap().filters[2].id;
        undo(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["blur", "sharpen"]);
        run(&mut seq, &mut action);
        assert_eq!(seq.clip_by_id(a).unwrap().filters[2].id, added);
    }

    #[test]
    fn test_add_filter_multi_and_remove() {
        let (mut seq, a, _) = sequence();
        let infos = vec![FilterInfo::new("crop", "Crop"), FilterInfo::new("pad", "Pad")];
        let mut action = add_filter_multi(&seq, a, 1, infos).unwrap();
        run(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["blur", "crop", "pad", "sharpen"]);
        undo(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["blur", "sharpen"]);

        let before = seq.clone();
        let mut action = remove_filter(&seq, a, 0).unwrap();
        run(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["sharpen"]);
        undo(&mut seq, &mut action);
        assert_eq!(seq.tracks(), before.tracks());
        assert!(matches!(
            remove_filter(&seq, a, 2),
            Err(TimelineError::FilterIndex { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_add_and_remove_two_filters() {
        let (mut seq, a, _) = sequence();
        let mut action = add_two_filters(
            &seq,
            a,
            0,
            FilterInfo::new("crop", "Crop"),
            2,
            FilterInfo::new("pad", "Pad"),
        )
        .unwrap();
        run(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["crop", "blur", "pad", "sharpen"]);
        let ids: Vec<_> = seq.clip_by_id(a).unwrap().filters.iter().map(|f| f.id).collect();
        undo(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["blur", "sharpen"]);
        run(&mut seq, &mut action);
        let again: Vec<_> = seq.clip_by_id(a).unwrap().filters.iter().map(|f| f.id).collect();
        assert_eq!(again, ids);
        undo(&mut seq, &mut action);

        let before = seq.clone();
        let mut action = remove_two_filters(&seq, a, 0, 1).unwrap();
        run(&mut seq, &mut action);
        assert!(services(&seq, a).is_empty());
        undo(&mut seq, &mut action);
        assert_eq!(seq.tracks(), before.tracks());

        assert!(remove_two_filters(&seq, a, 1, 1).is_err());
        assert!(remove_two_filters(&seq, a, 0, 2).is_err());
        let info = || FilterInfo::new("crop", "Crop");
        assert!(add_two_filters(&seq, a, 1, info(), 1, info()).is_err());
        assert!(add_two_filters(&seq, a, 0, info(), 4, info()).is_err());
    }

    #[test]
    fn test_multipart_filter_spans_clip() {
        let (mut seq, _, b) = sequence();
        let mut action = add_multipart_filter(&seq, b, FilterInfo::new("affine", "Multipart")).unwrap();
        assert_eq!(action.name(), "add_multipart_filter");
        run(&mut seq, &mut action);
        let filter = seq.clip_by_id(b).unwrap().filters[0].clone();
        assert_eq!(filter.properties.get("in").map(String::as_str), Some("0"));
        assert_eq!(filter.properties.get("out").map(String::as_str), Some("9"));
        undo(&mut seq, &mut action);
        assert!(services(&seq, b).is_empty());
        run(&mut seq, &mut action);
        assert_eq!(seq.clip_by_id(b).unwrap().filters[0].id, filter.id);
    }

    #[test]
    fn test_move_filter() {
        let (mut seq, a, _) = sequence();
        let mut action = move_filter(&seq, a, 0, 1).unwrap();
        run(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["sharpen", "blur"]);
        undo(&mut seq, &mut action);
        assert_eq!(services(&seq, a), vec!["blur", "sharpen"]);
        assert!(move_filter(&seq, a, 1, 1).is_err());
    }

    #[test]
    fn test_clone_paste_and_clear_filters() {
        let (mut seq, a, b) = sequence();
        let before = seq.clone();

        let mut action = clone_filters(&seq, b, a).unwrap();
        run(&mut seq, &mut action);
        assert_eq!(services(&seq, b), vec!["blur", "sharpen"]);
        assert_ne!(
            seq.clip_by_id(b).unwrap().filters[0].id,
            seq.clip_by_id(a).unwrap().filters[0].id
        );
        undo(&mut seq, &mut action);
        assert_eq!(seq.tracks(), before.tracks());

        let copied = seq.clip_by_id(a).unwrap().filters.clone();
        let mut action = paste_filters(&seq, vec![a, b], copied).unwrap();
        run(&mut seq, &mut action);
        assert_eq!(services(&seq, a).len(), 4);
        assert_eq!(services(&seq, b), vec!["blur", "sharpen"]);
        undo(&mut seq, &mut action);
        assert_eq!(seq.tracks(), before.tracks());

        let mut action = remove_multiple_filters(&seq, vec![a, b]).unwrap();
        run(&mut seq, &mut action);
        assert!(services(&seq, a).is_empty());
        undo(&mut seq, &mut action);
        assert_eq!(seq.tracks(), before.tracks());
    }

    #[test]
    fn test_repeated_clip_is_rejected() {
        let (seq, a, b) = sequence();
        let copied = seq.clip_by_id(a).unwrap().filters.clone();
        assert!(paste_filters(&seq, vec![b, a, b], copied).is_err());
        assert!(remove_multiple_filters(&seq, vec![a, a]).is_err());
        assert!(clone_filters(&seq, a, a).is_err());
    }

    #[test]
    fn test_mute_and_unmute() {
        let (mut seq, a, _) = sequence();
        assert!(unmute_clip(&seq, a).is_err());
        let mut action = mute_clip(&seq, a).unwrap();
        run(&mut seq, &mut action);
        assert!(seq.clip_by_id(a).unwrap().is_muted());

        let mut unmute = unmute_clip(&seq, a).unwrap();
        run(&mut seq, &mut unmute);
        assert!(!seq.clip_by_id(a).unwrap().is_muted());
        undo(&mut seq, &mut unmute);
        undo(&mut seq, &mut action);
        assert!(!seq.clip_by_id(a).unwrap().is_muted());
    }
}
