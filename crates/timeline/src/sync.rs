use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::{Clip, ClipId, Frame, TrackId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Correct,
    Dirty,
    /// Master clip is not on the timeline.
    Undefined,
}

/// A child clip's position relative to its master.
///
/// The child is in sync when `child_zero - master_zero == pos_offset`, where
/// a clip's zero is the track frame its media frame 0 would play at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncData {
    pub pos_offset: Frame,
    pub master_clip: ClipId,
    pub master_track: TrackId,
    #[serde(default)]
    pub sync_state: SyncState,
}

impl SyncData {
    pub fn new(pos_offset: Frame, master_clip: ClipId, master_track: TrackId) -> Self {
        Self {
            pos_offset,
            master_clip,
            master_track,
            sync_state: SyncState::Correct,
        }
    }

    pub fn state_for_offset(&self, current_offset: Option<Frame>) -> SyncState {
        match current_offset {
            Some(offset) if offset == self.pos_offset => SyncState::Correct,
            Some(_) => SyncState::Dirty,
            None => SyncState::Undefined,
        }
    }
}

/// Index of synced clips currently on the timeline.
#[derive(Debug, Clone, Default)]
pub struct SyncTracker {
    children: HashMap<ClipId, TrackId>,
    masters: HashMap<ClipId, HashSet<ClipId>>,
}

impl SyncTracker {
    pub fn clip_added(&mut self, clip: &Clip, track: TrackId) {
        if let Some(sync) = &clip.sync_data {
            self.forget(clip.id);
            self.children.insert(clip.id, track);
            self.masters
                .entry(sync.master_clip)
                .or_default()
                .insert(clip.id);
        }
    }

    pub fn clip_removed(&mut self, clip: &Clip) {
        self.forget(clip.id);
    }

    pub fn clip_sync_cleared(&mut self, clip: ClipId) {
        self.forget(clip);
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.masters.clear();
    }

    fn forget(&mut self, clip: ClipId) {
        if self.children.remove(&clip).is_some() {
            self.masters.retain(|_, children| {
                children.remove(&clip);
                !children.is_empty()
            });
        }
    }

    pub fn child_track(&self, clip: ClipId) -> Option<TrackId> {
        self.children.get(&clip).copied()
    }

    pub fn children_of(&self, master: ClipId) -> Vec<ClipId> {
        self.masters
            .get(&master)
            .map(|children| children.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn synced_children(&self) -> Vec<(ClipId, TrackId)> {
        self.children.iter().map(|(c, t)| (*c, *t)).collect()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Finds a cycle in child -> master edges. Every clip has at most one
/// master, so following the chain from each node is enough.
pub fn find_master_cycle(edges: &HashMap<ClipId, ClipId>) -> Option<ClipId> {
    let mut cleared: HashSet<ClipId> = HashSet::new();
    for start in edges.keys() {
        let mut path: HashSet<ClipId> = HashSet::new();
        let mut current = *start;
        loop {
            if cleared.contains(&current) {
                break;
            }
            if !path.insert(current) {
                return Some(current);
            }
            match edges.get(&current) {
                Some(master) => current = *master,
                None => break,
            }
        }
        cleared.extend(path);
    }
    None
}
