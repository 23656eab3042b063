use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::trace;

use crate::{
    find_master_cycle, Clip, ClipId, CompositingMode, CompositorRegistry, Frame, Result,
    SyncData, SyncState, SyncTracker, TimelineError, Track, TrackId, TrackItem, TrackKind,
};

/// Tracks, compositors and the sync index of one timeline.
///
/// Structural mutations that can add or remove clips go through the methods
/// here so that the sync index and sync states stay current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    tracks: Vec<Track>,
    #[serde(default)]
    pub compositors: CompositorRegistry,
    #[serde(default)]
    pub compositing_mode: CompositingMode,
    #[serde(skip)]
    sync: SyncTracker,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
            compositors: CompositorRegistry::default(),
            compositing_mode: CompositingMode::default(),
            sync: SyncTracker::default(),
        }
    }

    pub fn add_track(&mut self, name: impl Into<String>, kind: TrackKind) -> TrackId {
        let id = TrackId(self.tracks.len());
        self.tracks.push(Track::new(id, name, kind));
        id
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut seq: Sequence = serde_json::from_str(json)?;
        seq.check_invariants()?;
        seq.rebuild_sync_index();
        seq.refresh_sync_states();
        Ok(seq)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.tracks.get(id.0).ok_or(TimelineError::TrackNotFound(id))
    }

    pub(crate) fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .get_mut(id.0)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    pub fn set_track_locked(&mut self, id: TrackId, locked: bool) -> Result<()> {
        self.track_mut(id)?.locked = locked;
        Ok(())
    }

    pub fn tracks_clip_counts(&self) -> Vec<usize> {
        self.tracks.iter().map(Track::clip_count).collect()
    }

    /// Length of the longest track.
    pub fn length(&self) -> Frame {
        self.tracks.iter().map(Track::length).max().unwrap_or(0)
    }

    pub fn find_clip(&self, id: ClipId) -> Option<(TrackId, usize)> {
        self.tracks
            .iter()
            .find_map(|t| t.position_of(id).map(|index| (t.id, index)))
    }

    pub fn clip_by_id(&self, id: ClipId) -> Result<&Clip> {
        let (track, index) = self.find_clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        self.track(track)?.clip(index)
    }

    /// Mutable clip access for edits that leave position and sync untouched
    /// (filters, markers, mute state).
    pub(crate) fn clip_by_id_mut(&mut self, id: ClipId) -> Result<&mut Clip> {
        let (track, index) = self.find_clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        self.track_mut(track)?.clip_mut(index)
    }

    pub fn insert_item(&mut self, track: TrackId, index: usize, item: TrackItem) -> Result<()> {
        trace!(track = %track, index, length = item.length(), "insert");
        let added = item.as_clip().cloned();
        self.track_mut(track)?.insert(index, item)?;
        if let Some(clip) = added {
            self.sync.clip_added(&clip, track);
            self.refresh_related(clip.id);
        }
        Ok(())
    }

    pub fn insert_clip(
        &mut self,
        track: TrackId,
        index: usize,
        mut clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    ) -> Result<()> {
        clip.clip_in = clip_in;
        clip.clip_out = clip_out;
        self.insert_item(track, index, TrackItem::Clip(clip))
    }

    pub fn insert_blank(&mut self, track: TrackId, index: usize, length: Frame) -> Result<()> {
        self.insert_item(track, index, TrackItem::blank(length))
    }

    pub fn append(&mut self, track: TrackId, item: TrackItem) -> Result<()> {
        let index = self.track(track)?.count();
        self.insert_item(track, index, item)
    }

    pub fn remove_item(&mut self, track: TrackId, index: usize) -> Result<TrackItem> {
        let item = self.track_mut(track)?.remove(index)?;
        trace!(track = %track, index, length = item.length(), "remove");
        if let TrackItem::Clip(clip) = &item {
            self.sync.clip_removed(clip);
            self.refresh_related(clip.id);
        }
        Ok(item)
    }

    /// Resizes the clip at `index` in place.
    pub fn set_clip_range(
        &mut self,
        track: TrackId,
        index: usize,
        clip_in: Frame,
        clip_out: Frame,
    ) -> Result<()> {
        if clip_out < clip_in {
            return Err(TimelineError::InvalidOp(format!(
                "clip range {}..={} is empty",
                clip_in, clip_out
            )));
        }
        let clip = self.track_mut(track)?.clip_mut(index)?;
        clip.clip_in = clip_in;
        clip.clip_out = clip_out;
        let id = clip.id;
        self.refresh_related(id);
        Ok(())
    }

    /// Replaces the sync data of a clip on the timeline and returns the old value.
    pub fn set_sync_data(&mut self, id: ClipId, data: Option<SyncData>) -> Result<Option<SyncData>> {
        let (track, index) = self.find_clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        let clip = self.track_mut(track)?.clip_mut(index)?;
        let old = std::mem::replace(&mut clip.sync_data, data);
        let clip = clip.clone();
        self.sync.clip_sync_cleared(id);
        self.sync.clip_added(&clip, track);
        self.refresh_sync_state(id);
        Ok(old)
    }

    /// Swaps the whole entry list of a track.
    pub fn replace_track_items(
        &mut self,
        track: TrackId,
        items: Vec<TrackItem>,
    ) -> Result<Vec<TrackItem>> {
        let old = self.track_mut(track)?.replace_items(items);
        for clip in old.iter().filter_map(TrackItem::as_clip) {
            self.sync.clip_removed(clip);
        }
        let added: Vec<Clip> = self
            .track(track)?
            .items()
            .iter()
            .filter_map(TrackItem::as_clip)
            .cloned()
            .collect();
        for clip in &added {
            self.sync.clip_added(clip, track);
        }
        self.refresh_sync_states();
        Ok(old)
    }

    pub fn set_parent_track(&mut self, track: TrackId, parent: Option<TrackId>) -> Result<Option<TrackId>> {
        let track = self.track_mut(track)?;
        Ok(std::mem::replace(&mut track.parent_track, parent))
    }

    pub fn rebuild_sync_index(&mut self) {
        self.sync.clear();
        for track in &self.tracks {
            for clip in track.items().iter().filter_map(TrackItem::as_clip) {
                self.sync.clip_added(clip, track.id);
            }
        }
    }

    pub fn sync_tracker(&self) -> &SyncTracker {
        &self.sync
    }

    /// Track frame at which media frame 0 of the clip would play.
    pub fn media_zero(&self, id: ClipId) -> Option<Frame> {
        let (track, index) = self.find_clip(id)?;
        let track = self.track(track).ok()?;
        let clip = track.clip(index).ok()?;
        Some(track.clip_start(index) - clip.clip_in)
    }

    /// `child_zero - master_zero`, or `None` when either clip is off the
    /// timeline or the child is not synced.
    pub fn current_sync_offset(&self, child: ClipId) -> Option<Frame> {
        let clip = self.clip_by_id(child).ok()?;
        let master = clip.sync_data.as_ref()?.master_clip;
        Some(self.media_zero(child)? - self.media_zero(master)?)
    }

    fn refresh_sync_state(&mut self, id: ClipId) {
        let offset = self.current_sync_offset(id);
        if let Ok(clip) = self.clip_by_id_mut(id) {
            if let Some(sync) = clip.sync_data.as_mut() {
                sync.sync_state = sync.state_for_offset(offset);
            }
        }
    }

    fn refresh_related(&mut self, id: ClipId) {
        self.refresh_sync_state(id);
        for child in self.sync.children_of(id) {
            self.refresh_sync_state(child);
        }
    }

    pub fn refresh_sync_states(&mut self) {
        for (child, _) in self.sync.synced_children() {
            self.refresh_sync_state(child);
        }
    }

    pub fn sync_state(&self, id: ClipId) -> Option<SyncState> {
        self.clip_by_id(id)
            .ok()
            .and_then(|c| c.sync_data.as_ref())
            .map(|s| s.sync_state)
    }

    /// A clip on a child -> master chain that leads back to itself.
    pub fn find_sync_cycle(&self) -> Option<ClipId> {
        let edges: HashMap<ClipId, ClipId> = self
            .tracks
            .iter()
            .flat_map(|t| t.items().iter().filter_map(TrackItem::as_clip))
            .filter_map(|c| c.sync_data.as_ref().map(|s| (c.id, s.master_clip)))
            .collect();
        find_master_cycle(&edges)
    }

    pub fn check_invariants(&self) -> Result<()> {
        for (index, track) in self.tracks.iter().enumerate() {
            if track.id.0 != index {
                return Err(TimelineError::InvalidOp(format!(
                    "track {} stored at index {}",
                    track.id, index
                )));
            }
            track.check_invariants()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaSource;

    fn clip(name: &str, len: Frame) -> Clip {
        Clip::new(
            name,
            MediaSource::File {
                path: format!("{}.mp4", name),
                ttl: None,
            },
            Some(len),
        )
    }

    fn two_track_sequence() -> (Sequence, TrackId, TrackId) {
        let mut seq = Sequence::new("seq");
        let v1 = seq.add_track("V1", TrackKind::Video);
        let a1 = seq.add_track("A1", TrackKind::Audio);
        (seq, v1, a1)
    }

    #[test]
    fn test_insert_and_find_clip() {
        let (mut seq, v1, _) = two_track_sequence();
        let c = clip("a", 100);
        let id = c.id;
        seq.insert_clip(v1, 0, c, 10, 29).unwrap();
        assert_eq!(seq.find_clip(id), Some((v1, 0)));
        assert_eq!(seq.clip_by_id(id).unwrap().length(), 20);
        assert_eq!(seq.length(), 20);
        assert_eq!(seq.tracks_clip_counts(), vec![1, 0]);
    }

    #[test]
    fn test_sync_states_follow_positions() {
        let (mut seq, v1, a1) = two_track_sequence();
        let master = clip("video", 100);
        let master_id = master.id;
        seq.insert_clip(v1, 0, master, 0, 49).unwrap();

        let mut child = clip("audio", 100);
        child.sync_data = Some(SyncData::new(0, master_id, v1));
        let child_id = child.id;
        seq.insert_clip(a1, 0, child, 0, 49).unwrap();
        assert_eq!(seq.sync_state(child_id), Some(SyncState::Correct));

        seq.insert_blank(a1, 0, 20).unwrap();
        assert_eq!(seq.current_sync_offset(child_id), Some(20));
        assert_eq!(seq.sync_state(child_id), Some(SyncState::Dirty));

        let removed = seq.remove_item(v1, 0).unwrap();
        assert!(!removed.is_blank());
        assert_eq!(seq.sync_state(child_id), Some(SyncState::Undefined));
    }

    #[test]
    fn test_set_clip_range_rejects_empty_range() {
        let (mut seq, v1, _) = two_track_sequence();
        seq.insert_clip(v1, 0, clip("a", 100), 0, 9).unwrap();
        assert!(seq.set_clip_range(v1, 0, 10, 9).is_err());
        seq.set_clip_range(v1, 0, 5, 9).unwrap();
        assert_eq!(seq.track(v1).unwrap().length(), 5);
    }

    #[test]
    fn test_find_sync_cycle() {
        let (mut seq, v1, a1) = two_track_sequence();
        let a = clip("a", 10);
        let b = clip("b", 10);
        let (a_id, b_id) = (a.id, b.id);
        seq.insert_clip(v1, 0, a, 0, 9).unwrap();
        seq.insert_clip(a1, 0, b, 0, 9).unwrap();
        seq.set_sync_data(b_id, Some(SyncData::new(0, a_id, v1))).unwrap();
        assert_eq!(seq.find_sync_cycle(), None);

        seq.set_sync_data(a_id, Some(SyncData::new(0, b_id, a1))).unwrap();
        assert!(seq.find_sync_cycle().is_some());
    }

    #[test]
    fn test_json_round_trip_rebuilds_sync_index() {
        let (mut seq, v1, a1) = two_track_sequence();
        let master = clip("video", 100);
        let master_id = master.id;
        seq.insert_clip(v1, 0, master, 0, 49).unwrap();
        let mut child = clip("audio", 100);
        child.sync_data = Some(SyncData::new(0, master_id, v1));
        seq.insert_clip(a1, 0, child, 0, 49).unwrap();

        let loaded = Sequence::from_json_str(&seq.to_json().unwrap()).unwrap();
        assert_eq!(loaded.sync_tracker().len(), 1);
        assert_eq!(loaded.sync_tracker().children_of(master_id).len(), 1);
    }

    #[test]
    fn test_misnumbered_track_is_rejected_on_load() {
        let (seq, _, _) = two_track_sequence();
        let mut value: serde_json::Value = serde_json::from_str(&seq.to_json().unwrap()).unwrap();
        value["tracks"][1]["id"] = serde_json::json!(5);

        let json = value.to_string();
        assert!(Sequence::from_json_str(&json).is_err());

        let loose: Sequence = serde_json::from_str(&json).unwrap();
        assert!(loose.check_invariants().is_err());
    }

    #[test]
    fn test_unknown_track_is_error() {
        let (seq, _, _) = two_track_sequence();
        assert!(matches!(
            seq.track(TrackId(7)),
            Err(TimelineError::TrackNotFound(TrackId(7)))
        ));
    }
}
