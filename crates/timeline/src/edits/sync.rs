//! Edits on clip sync relations, and the resync edits that move drifted
//! children back to their offset.

use tracing::debug;

use crate::splice::{self, RangeExtract};
use crate::{
    ClipId, EditAction, EditContext, EditOp, Filter, Frame, Result, Sequence, SyncData,
    TimelineError, TrackId, TrackItem,
};

use super::{check_distinct, check_index_span, stashed, unlocked_track, BoxTrackSelection, OverwriteMove, Reversible};

/// Sync data pairing `child` with `master` at their current distance.
fn sync_at_current_offset(seq: &Sequence, child: ClipId, master: ClipId) -> Result<SyncData> {
    let (master_track, _) = seq.find_clip(master).ok_or(TimelineError::ClipNotFound(master))?;
    let child_zero = seq.media_zero(child).ok_or(TimelineError::ClipNotFound(child))?;
    let master_zero = seq.media_zero(master).ok_or(TimelineError::ClipNotFound(master))?;
    Ok(SyncData::new(child_zero - master_zero, master, master_track))
}

fn check_pair(seq: &Sequence, child: ClipId, master: ClipId) -> Result<()> {
    let (child_track, _) = seq.find_clip(child).ok_or(TimelineError::ClipNotFound(child))?;
    let (master_track, _) = seq.find_clip(master).ok_or(TimelineError::ClipNotFound(master))?;
    if child_track == master_track {
        return Err(TimelineError::InvalidOp(format!(
            "clip {} and its master are both on track {}",
            child, child_track
        )));
    }
    Ok(())
}

/// Old sync data of clips whose sync an edit replaced, restored in reverse.
fn restore_sync(seq: &mut Sequence, replaced: Vec<(ClipId, Option<SyncData>)>) -> Result<()> {
    for (clip, old) in replaced.into_iter().rev() {
        seq.set_sync_data(clip, old)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SetSync {
    pub child: ClipId,
    pub master: ClipId,
    replaced: Option<Option<SyncData>>,
}

impl Reversible for SetSync {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let data = sync_at_current_offset(cx.seq, self.child, self.master)?;
        self.replaced = Some(cx.seq.set_sync_data(self.child, Some(data))?);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let old = stashed(&mut self.replaced, "set sync")?;
        cx.seq.set_sync_data(self.child, old)?;
        Ok(())
    }
}

/// Syncs `child` to `master` at the distance they have now.
pub fn set_sync(seq: &Sequence, child: ClipId, master: ClipId) -> Result<EditAction> {
    check_pair(seq, child, master)?;
    Ok(EditAction::new(EditOp::SetSync(SetSync {
        child,
        master,
        replaced: None,
    })))
}

#[derive(Debug, Clone)]
pub struct ClearSync {
    pub child: ClipId,
    replaced: Option<Option<SyncData>>,
}

impl Reversible for ClearSync {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.replaced = Some(cx.seq.set_sync_data(self.child, None)?);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let old = stashed(&mut self.replaced, "clear sync")?;
        cx.seq.set_sync_data(self.child, old)?;
        Ok(())
    }
}

pub fn clear_sync(seq: &Sequence, child: ClipId) -> Result<EditAction> {
    if seq.clip_by_id(child)?.sync_data.is_none() {
        return Err(TimelineError::InvalidOp(format!("clip {} is not synced", child)));
    }
    Ok(EditAction::new(EditOp::ClearSync(ClearSync {
        child,
        replaced: None,
    })))
}

/// Makes `parent_track` the sync parent of `track` and syncs every clip on
/// `track` to the parent clip under its start frame.
#[derive(Debug, Clone)]
pub struct SetTrackSync {
    pub track: TrackId,
    pub parent_track: TrackId,
    pub pairs: Vec<(ClipId, ClipId)>,
    old_parent: Option<Option<TrackId>>,
    replaced: Vec<(ClipId, Option<SyncData>)>,
}

impl Reversible for SetTrackSync {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.old_parent = Some(cx.seq.set_parent_track(self.track, Some(self.parent_track))?);
        self.replaced.clear();
        for (child, master) in &self.pairs {
            let data = sync_at_current_offset(cx.seq, *child, *master)?;
            let old = cx.seq.set_sync_data(*child, Some(data))?;
            self.replaced.push((*child, old));
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        restore_sync(cx.seq, std::mem::take(&mut self.replaced))?;
        let parent = stashed(&mut self.old_parent, "set track sync")?;
        cx.seq.set_parent_track(self.track, parent)?;
        Ok(())
    }
}

pub fn set_track_sync(seq: &Sequence, track: TrackId, parent_track: TrackId) -> Result<EditAction> {
    if track == parent_track {
        return Err(TimelineError::InvalidOp(format!(
            "track {} cannot be its own sync parent",
            track
        )));
    }
    let t = unlocked_track(seq, track)?;
    let parent = seq.track(parent_track)?;
    let pairs = t
        .items()
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let child = item.as_clip()?;
            let start = t.clip_start(index);
            let master = parent.get(parent.clip_index_at(start))?.as_clip()?;
            Some((child.id, master.id))
        })
        .collect();
    Ok(EditAction::new(EditOp::SetTrackSync(SetTrackSync {
        track,
        parent_track,
        pairs,
        old_parent: None,
        replaced: Vec::new(),
    })))
}

/// Syncs every clip of a box selection to the clip of `parent_track` under
/// its start frame. Clips with nothing under them keep their sync.
#[derive(Debug, Clone)]
pub struct SetBoxSelectionSync {
    pub parent_track: TrackId,
    pub pairs: Vec<(ClipId, ClipId)>,
    replaced: Vec<(ClipId, Option<SyncData>)>,
}

impl Reversible for SetBoxSelectionSync {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.replaced.clear();
        for (child, master) in &self.pairs {
            let data = sync_at_current_offset(cx.seq, *child, *master)?;
            let old = cx.seq.set_sync_data(*child, Some(data))?;
            self.replaced.push((*child, old));
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        restore_sync(cx.seq, std::mem::take(&mut self.replaced))
    }
}

pub fn set_box_selection_sync(
    seq: &Sequence,
    selections: Vec<BoxTrackSelection>,
    parent_track: TrackId,
) -> Result<EditAction> {
    check_distinct(selections.iter().map(|s| s.track), "track")?;
    let parent = seq.track(parent_track)?;
    let mut pairs = Vec::new();
    for s in &selections {
        if s.track == parent_track {
            return Err(TimelineError::InvalidOp(format!(
                "track {} cannot sync to itself",
                parent_track
            )));
        }
        let t = unlocked_track(seq, s.track)?;
        check_index_span(t, s.selected_range_in, s.selected_range_out)?;
        for index in s.selected_range_in..=s.selected_range_out {
            let Some(child) = t.get(index).and_then(TrackItem::as_clip) else {
                continue;
            };
            let start = t.clip_start(index);
            if let Some(master) = parent.get(parent.clip_index_at(start)).and_then(TrackItem::as_clip) {
                pairs.push((child.id, master.id));
            }
        }
    }
    if pairs.is_empty() {
        return Err(TimelineError::InvalidOp(
            "no selected clip has a parent clip under it".to_string(),
        ));
    }
    debug!(pairs = pairs.len(), "box selection sync");
    Ok(EditAction::new(EditOp::SetBoxSelectionSync(SetBoxSelectionSync {
        parent_track,
        pairs,
        replaced: Vec::new(),
    })))
}

/// Clears every sync relation of the clips on a track and its parent.
#[derive(Debug, Clone)]
pub struct ClearTrackSync {
    pub track: TrackId,
    old_parent: Option<Option<TrackId>>,
    replaced: Vec<(ClipId, Option<SyncData>)>,
}

impl Reversible for ClearTrackSync {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let synced: Vec<ClipId> = cx
            .seq
            .track(self.track)?
            .items()
            .iter()
            .filter_map(TrackItem::as_clip)
            .filter(|c| c.sync_data.is_some())
            .map(|c| c.id)
            .collect();
        self.replaced.clear();
        for clip in synced {
            let old = cx.seq.set_sync_data(clip, None)?;
            self.replaced.push((clip, old));
        }
        self.old_parent = Some(cx.seq.set_parent_track(self.track, None)?);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let parent = stashed(&mut self.old_parent, "clear track sync")?;
        cx.seq.set_parent_track(self.track, parent)?;
        restore_sync(cx.seq, std::mem::take(&mut self.replaced))
    }
}

pub fn clear_track_sync(seq: &Sequence, track: TrackId) -> Result<EditAction> {
    unlocked_track(seq, track)?;
    Ok(EditAction::new(EditOp::ClearTrackSync(ClearTrackSync {
        track,
        old_parent: None,
        replaced: Vec::new(),
    })))
}

/// Frame a synced clip has to start at to be back at its offset, or `None`
/// when it already is. Errors when the master is off the timeline.
fn resynced_start(seq: &Sequence, child: ClipId) -> Result<Option<(TrackId, usize, Frame)>> {
    let clip = seq.clip_by_id(child)?;
    let sync = clip
        .sync_data
        .as_ref()
        .ok_or_else(|| TimelineError::InvalidOp(format!("clip {} is not synced", child)))?;
    let current = seq.current_sync_offset(child).ok_or_else(|| {
        TimelineError::InvalidOp(format!("master of clip {} is not on the timeline", child))
    })?;
    if current == sync.pos_offset {
        return Ok(None);
    }
    let (track, index) = seq.find_clip(child).ok_or(TimelineError::ClipNotFound(child))?;
    let start = seq.track(track)?.clip_start(index) - (current - sync.pos_offset);
    if start < 0 {
        return Err(TimelineError::InvalidOp(format!(
            "clip {} would have to start at frame {}",
            child, start
        )));
    }
    Ok(Some((track, index, start)))
}

#[derive(Debug, Clone)]
pub enum ResyncPlan {
    /// The clip was in sync when the edit was built; doing and undoing it
    /// changes nothing.
    InSync,
    Move(OverwriteMove),
}

/// Overwrite-moves a drifted child clip back to its sync offset.
#[derive(Debug, Clone)]
pub struct ResyncClip {
    pub clip: ClipId,
    pub plan: ResyncPlan,
}

impl Reversible for ResyncClip {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        match &mut self.plan {
            ResyncPlan::InSync => {
                debug!(clip = %self.clip, "already in sync");
                Ok(())
            }
            ResyncPlan::Move(step) => step.redo(cx),
        }
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        match &mut self.plan {
            ResyncPlan::InSync => Ok(()),
            ResyncPlan::Move(step) => step.undo(cx),
        }
    }
}

pub fn resync_clip(seq: &Sequence, clip: ClipId) -> Result<EditAction> {
    let plan = match resynced_start(seq, clip)? {
        None => ResyncPlan::InSync,
        Some((track, index, over_in)) => {
            unlocked_track(seq, track)?;
            let length = seq.track(track)?.clip(index)?.length();
            ResyncPlan::Move(OverwriteMove::new(
                track,
                track,
                index,
                index,
                over_in,
                over_in + length,
            ))
        }
    };
    Ok(EditAction::new(EditOp::ResyncClip(ResyncClip { clip, plan })))
}

/// Resyncs every drifted child on a track. The first run lifts all of them
/// and overwrites them at their synced positions; later runs swap whole
/// track snapshots.
#[derive(Debug, Clone)]
pub struct ResyncTrack {
    pub track: TrackId,
    before: Option<Vec<TrackItem>>,
    after: Option<Vec<TrackItem>>,
}

impl ResyncTrack {
    fn resync(cx: &mut EditContext<'_>, track: TrackId) -> Result<()> {
        let children: Vec<ClipId> = cx
            .seq
            .track(track)?
            .items()
            .iter()
            .filter_map(TrackItem::as_clip)
            .filter(|c| c.sync_data.is_some())
            .map(|c| c.id)
            .collect();
        let mut targets = Vec::new();
        for child in children {
            match resynced_start(cx.seq, child) {
                Ok(Some((_, _, start))) => targets.push((child, start)),
                Ok(None) => {}
                Err(e) => debug!(clip = %child, error = %e, "clip not resynced"),
            }
        }

        let mut lifted = Vec::with_capacity(targets.len());
        for (child, start) in targets {
            let index = cx
                .seq
                .track(track)?
                .position_of(child)
                .ok_or(TimelineError::ClipNotFound(child))?;
            let item = cx.seq.remove_item(track, index)?;
            cx.seq.insert_blank(track, index, item.length())?;
            lifted.push((item, start));
        }
        for (item, start) in lifted {
            let extract: RangeExtract =
                splice::extract_range(cx, track, start, start + item.length())?;
            cx.seq.insert_item(track, extract.in_index, item)?;
        }
        Ok(())
    }
}

impl Reversible for ResyncTrack {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        match self.after.take() {
            Some(after) => {
                self.before = Some(cx.seq.replace_track_items(self.track, after)?);
            }
            None => {
                self.before = Some(cx.seq.track(self.track)?.items().to_vec());
                Self::resync(cx, self.track)?;
            }
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let before = stashed(&mut self.before, "resync track")?;
        self.after = Some(cx.seq.replace_track_items(self.track, before)?);
        Ok(())
    }
}

pub fn resync_track(seq: &Sequence, track: TrackId) -> Result<EditAction> {
    unlocked_track(seq, track)?;
    Ok(EditAction::new(EditOp::ResyncTrack(ResyncTrack {
        track,
        before: None,
        after: None,
    })))
}

/// Overwrites a copy of a clip onto another track at the same position and
/// mutes the original. The synched variant also syncs the copy to it.
#[derive(Debug, Clone)]
pub struct AudioSplice {
    pub parent: ClipId,
    pub to_track: TrackId,
    pub synched: bool,
    /// Clip taken back off the target track by undo.
    spliced: Option<TrackItem>,
    extract: Option<RangeExtract>,
    replaced_mute: Option<Option<Filter>>,
}

impl Reversible for AudioSplice {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (parent_track, index) = cx
            .seq
            .find_clip(self.parent)
            .ok_or(TimelineError::ClipNotFound(self.parent))?;
        let start = cx.seq.track(parent_track)?.clip_start(index);
        let item = match self.spliced.take() {
            Some(item) => item,
            None => {
                let parent = cx.seq.clip_by_id(self.parent)?;
                let mut copy = cx.backend.clone_clip(parent)?;
                copy.mute_filter = None;
                copy.sync_data = self
                    .synched
                    .then(|| SyncData::new(0, self.parent, parent_track));
                TrackItem::Clip(copy)
            }
        };

        let extract = splice::extract_range(cx, self.to_track, start, start + item.length())?;
        cx.seq.insert_item(self.to_track, extract.in_index, item)?;
        self.extract = Some(extract);

        let mute = cx.backend.create_mute_filter();
        let parent = cx.seq.clip_by_id_mut(self.parent)?;
        self.replaced_mute = Some(parent.mute_filter.replace(mute));
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let old_mute = stashed(&mut self.replaced_mute, "audio splice")?;
        cx.seq.clip_by_id_mut(self.parent)?.mute_filter = old_mute;

        let extract = stashed(&mut self.extract, "audio splice")?;
        self.spliced = Some(cx.seq.remove_item(self.to_track, extract.in_index)?);
        splice::put_back_range(cx.seq, extract)
    }
}

fn audio_splice_state(seq: &Sequence, parent: ClipId, to_track: TrackId, synched: bool) -> Result<AudioSplice> {
    let (parent_track, _) = seq.find_clip(parent).ok_or(TimelineError::ClipNotFound(parent))?;
    if parent_track == to_track {
        return Err(TimelineError::InvalidOp(format!(
            "clip {} is already on track {}",
            parent, to_track
        )));
    }
    unlocked_track(seq, to_track)?;
    Ok(AudioSplice {
        parent,
        to_track,
        synched,
        spliced: None,
        extract: None,
        replaced_mute: None,
    })
}

pub fn audio_splice(seq: &Sequence, parent: ClipId, to_track: TrackId) -> Result<EditAction> {
    let state = audio_splice_state(seq, parent, to_track, false)?;
    Ok(EditAction::new(EditOp::AudioSplice(state)))
}

pub fn audio_synched_splice(seq: &Sequence, parent: ClipId, to_track: TrackId) -> Result<EditAction> {
    let state = audio_splice_state(seq, parent, to_track, true)?;
    Ok(EditAction::new(EditOp::AudioSynchedSplice(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Clip, InMemoryBackend, MediaSource, NullHost, Refresh, SyncState, TrackKind};

    fn media(name: &str) -> Clip {
        Clip::new(
            name,
            MediaSource::File {
                path: format!("{}.mov", name),
                ttl: None,
            },
            Some(500),
        )
    }

    /// V1: [blank 10][master 0..=49]
    /// A1: [blank 15][child 0..=29]
    fn sequence() -> (Sequence, ClipId, ClipId) {
        let mut seq = Sequence::new("s");
        let v1 = seq.add_track("V1", TrackKind::Video);
        let a1 = seq.add_track("A1", TrackKind::Audio);
        let master = media("master").with_range(0, 49);
        let child = media("child").with_range(0, 29);
        let ids = (master.id, child.id);
        seq.append(v1, TrackItem::blank(10)).unwrap();
        seq.append(v1, master.into()).unwrap();
        seq.append(a1, TrackItem::blank(15)).unwrap();
        seq.append(a1, child.into()).unwrap();
        (seq, ids.0, ids.1)
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

    fn start_of(seq: &Sequence, clip: ClipId) -> Frame {
        let (track, index) = seq.find_clip(clip).unwrap();
        seq.track(track).unwrap().clip_start(index)
    }

    #[test]
    fn test_set_and_clear_sync() {
        let (mut seq, master, child) = sequence();
        let mut action = set_sync(&seq, child, master).unwrap();
        run(&mut seq, &mut action);
        let sync = seq.clip_by_id(child).unwrap().sync_data.clone().unwrap();
        assert_eq!(sync.pos_offset, 5);
        assert_eq!(sync.master_track, TrackId(0));
        assert_eq!(seq.sync_state(child), Some(SyncState::Correct));

        let mut clear = clear_sync(&seq, child).unwrap();
        run(&mut seq, &mut clear);
        assert_eq!(seq.sync_state(child), None);
        undo(&mut seq, &mut clear);
        undo(&mut seq, &mut action);
        assert!(seq.clip_by_id(child).unwrap().sync_data.is_none());
        assert!(set_sync(&seq, master, master).is_err());
    }

    #[test]
    fn test_resync_moves_drifted_child() {
        let (mut seq, master, child) = sequence();
        let mut sync = set_sync(&seq, child, master).unwrap();
        run(&mut seq, &mut sync);

        // master moves 20 frames later
        seq.remove_item(TrackId(0), 0).unwrap();
        seq.insert_blank(TrackId(0), 0, 30).unwrap();
        seq.refresh_sync_states();
        assert_eq!(seq.sync_state(child), Some(SyncState::Dirty));

        let before = seq.clone();
        let mut resync = resync_clip(&seq, child).unwrap();
        run(&mut seq, &mut resync);
        assert_eq!(start_of(&seq, child), 35);
        assert_eq!(seq.sync_state(child), Some(SyncState::Correct));

        let mut again = resync_clip(&seq, child).unwrap();
        assert!(matches!(
            again.op(),
            EditOp::ResyncClip(ResyncClip {
                plan: ResyncPlan::InSync,
                ..
            })
        ));
        let after = seq.clone();
        run(&mut seq, &mut again);
        assert_eq!(seq.tracks(), after.tracks());
        undo(&mut seq, &mut again);
        assert_eq!(seq.tracks(), after.tracks());

        undo(&mut seq, &mut resync);
        assert_eq!(seq.tracks(), before.tracks());
    }

    #[test]
    fn test_track_sync_and_resync_track() {
        let (mut seq, master, child) = sequence();
        let mut action = set_track_sync(&seq, TrackId(1), TrackId(0)).unwrap();
        run(&mut seq, &mut action);
        assert_eq!(seq.track(TrackId(1)).unwrap().parent_track, Some(TrackId(0)));
        assert_eq!(
            seq.clip_by_id(child).unwrap().sync_data.as_ref().unwrap().master_clip,
            master
        );

        seq.remove_item(TrackId(0), 0).unwrap();
        seq.insert_blank(TrackId(0), 0, 12).unwrap();
        let before = seq.clone();
        let mut resync = resync_track(&seq, TrackId(1)).unwrap();
        run(&mut seq, &mut resync);
        assert_eq!(start_of(&seq, child), 17);
        let after = seq.clone();
        undo(&mut seq, &mut resync);
        assert_eq!(seq.tracks(), before.tracks());
        run(&mut seq, &mut resync);
        assert_eq!(seq.tracks(), after.tracks());

        let mut clear = clear_track_sync(&seq, TrackId(1)).unwrap();
        run(&mut seq, &mut clear);
        assert_eq!(seq.track(TrackId(1)).unwrap().parent_track, None);
        assert!(seq.clip_by_id(child).unwrap().sync_data.is_none());
        undo(&mut seq, &mut clear);
        assert_eq!(seq.tracks(), after.tracks());
    }

    #[test]
    fn test_box_selection_sync() {
        let (mut seq, master, child) = sequence();
        let selection = |track| BoxTrackSelection {
            track,
            selected_range_in: 0,
            selected_range_out: 1,
        };
        let before = seq.clone();
        let mut action = set_box_selection_sync(&seq, vec![selection(TrackId(1))], TrackId(0)).unwrap();
        run(&mut seq, &mut action);
        let sync = seq.clip_by_id(child).unwrap().sync_data.clone().unwrap();
        assert_eq!(sync.master_clip, master);
        assert_eq!(sync.pos_offset, 5);
        assert_eq!(seq.track(TrackId(1)).unwrap().parent_track, None);
        undo(&mut seq, &mut action);
        assert_eq!(seq.tracks(), before.tracks());

        let twice = vec![selection(TrackId(1)), selection(TrackId(1))];
        assert!(set_box_selection_sync(&seq, twice, TrackId(0)).is_err());
        assert!(set_box_selection_sync(&seq, vec![selection(TrackId(0))], TrackId(0)).is_err());
    }

    #[test]
    fn test_audio_synched_splice() {
        let (mut seq, master, _) = sequence();
        let before = seq.clone();
        let mut action = audio_synched_splice(&seq, master, TrackId(1)).unwrap();
        run(&mut seq, &mut action);

        assert!(seq.clip_by_id(master).unwrap().is_muted());
        let a1 = seq.track(TrackId(1)).unwrap();
        let index = a1.clip_index_at(10);
        let copy = a1.clip(index).unwrap();
        assert_eq!(a1.clip_start(index), 10);
        assert_eq!((copy.clip_in, copy.clip_out), (0, 49));
        assert_eq!(copy.sync_data.as_ref().unwrap().master_clip, master);
        let copy_id = copy.id;
        assert_eq!(seq.sync_state(copy_id), Some(SyncState::Correct));

        undo(&mut seq, &mut action);
        assert_eq!(seq.tracks(), before.tracks());
        run(&mut seq, &mut action);
        assert!(seq.clip_by_id(copy_id).is_ok());
        assert!(audio_splice(&seq, master, TrackId(0)).is_err());
    }
}
