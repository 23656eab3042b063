use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ClipId, DestroyId, Frame, Result, Sequence, TimelineError, TrackId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompositingMode {
    #[default]
    TopDownFreeMove,
    TopDownAutoFollow,
    /// Auto-follow that also deletes compositors whose origin clip is gone.
    StandardAutoFollow,
}

impl CompositingMode {
    pub fn follows_origin_clips(self) -> bool {
        matches!(
            self,
            CompositingMode::TopDownAutoFollow | CompositingMode::StandardAutoFollow
        )
    }

    pub fn deletes_orphans(self) -> bool {
        self == CompositingMode::StandardAutoFollow
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Compositor {
    #[serde(default)]
    pub destroy_id: DestroyId,
    pub type_id: String,
    pub a_track: TrackId,
    pub b_track: TrackId,
    pub clip_in: Frame,
    pub clip_out: Frame,
    #[serde(default)]
    pub origin_clip_id: Option<ClipId>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(skip)]
    incarnation: u64,
}

impl Compositor {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            destroy_id: DestroyId::new(),
            type_id: type_id.into(),
            a_track: TrackId(0),
            b_track: TrackId(0),
            clip_in: 0,
            clip_out: 0,
            origin_clip_id: None,
            properties: BTreeMap::new(),
            incarnation: 0,
        }
    }

    pub fn set_tracks(&mut self, a_track: TrackId, b_track: TrackId) {
        self.a_track = a_track;
        self.b_track = b_track;
    }

    pub fn set_in_and_out(&mut self, clip_in: Frame, clip_out: Frame) {
        self.clip_in = clip_in;
        self.clip_out = clip_out;
    }

    pub fn move_by(&mut self, delta: Frame) {
        self.clip_in += delta;
        self.clip_out += delta;
    }

    /// Copies identity and property values from an earlier incarnation.
    pub fn clone_properties(&mut self, other: &Compositor) {
        self.destroy_id = other.destroy_id;
        self.properties = other.properties.clone();
        self.origin_clip_id = other.origin_clip_id;
    }

    pub fn incarnation(&self) -> u64 {
        self.incarnation
    }
}

/// All compositors of a sequence, addressed by `DestroyId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompositorRegistry {
    compositors: Vec<Compositor>,
    #[serde(skip)]
    generation: u64,
}

impl CompositorRegistry {
    pub fn add(&mut self, compositor: Compositor) {
        self.compositors.push(compositor);
    }

    pub fn remove(&mut self, id: DestroyId) -> Result<Compositor> {
        let index = self
            .compositors
            .iter()
            .position(|c| c.destroy_id == id)
            .ok_or(TimelineError::CompositorNotFound(id))?;
        Ok(self.compositors.remove(index))
    }

    pub fn get(&self, id: DestroyId) -> Option<&Compositor> {
        self.compositors.iter().find(|c| c.destroy_id == id)
    }

    pub fn get_mut(&mut self, id: DestroyId) -> Result<&mut Compositor> {
        self.compositors
            .iter_mut()
            .find(|c| c.destroy_id == id)
            .ok_or(TimelineError::CompositorNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Compositor> {
        self.compositors.iter()
    }

    pub fn len(&self) -> usize {
        self.compositors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compositors.is_empty()
    }

    /// Recreates every compositor in stacking order. References held across
    /// a restack are stale; only `DestroyId`s stay valid.
    pub fn restack(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let mut restacked: Vec<Compositor> = self
            .compositors
            .drain(..)
            .map(|mut c| {
                c.incarnation = generation;
                c
            })
            .collect();
        restacked.sort_by_key(|c| (c.b_track, c.clip_in));
        self.compositors = restacked;
    }

    /// Compositors on `tracks` (by `b_track`) starting at or after `frame`.
    pub fn ids_on_tracks_from(&self, tracks: &[TrackId], frame: Frame) -> Vec<DestroyId> {
        self.compositors
            .iter()
            .filter(|c| tracks.contains(&c.b_track) && c.clip_in >= frame)
            .map(|c| c.destroy_id)
            .collect()
    }

    pub fn move_all(&mut self, ids: &[DestroyId], delta: Frame) -> Result<()> {
        for id in ids {
            self.get_mut(*id)?.move_by(delta);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositorFollow {
    pub destroy_id: DestroyId,
    pub orig_in: Frame,
    pub orig_out: Frame,
    pub new_in: Frame,
    pub new_out: Frame,
}

/// Compositor changes caused by origin clips moving during one edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositorFollowData {
    pub moves: Vec<CompositorFollow>,
    pub orphans: Vec<Compositor>,
}

impl CompositorFollowData {
    /// Moves every compositor with an origin clip onto that clip's current
    /// span. Compositors whose origin clip is gone are orphans when the
    /// sequence's mode deletes them.
    pub fn compute(seq: &Sequence) -> Self {
        let mut data = Self::default();
        if !seq.compositing_mode.follows_origin_clips() {
            return data;
        }
        for compositor in seq.compositors.iter() {
            let Some(origin) = compositor.origin_clip_id else {
                continue;
            };
            match seq.find_clip(origin) {
                Some((track, index)) => {
                    let Ok(t) = seq.track(track) else { continue };
                    let Some(item) = t.get(index) else { continue };
                    let new_in = t.clip_start(index);
                    let new_out = new_in + item.length() - 1;
                    if new_in != compositor.clip_in || new_out != compositor.clip_out {
                        data.moves.push(CompositorFollow {
                            destroy_id: compositor.destroy_id,
                            orig_in: compositor.clip_in,
                            orig_out: compositor.clip_out,
                            new_in,
                            new_out,
                        });
                    }
                }
                None if seq.compositing_mode.deletes_orphans() => {
                    data.orphans.push(compositor.clone());
                }
                None => {}
            }
        }
        data
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.orphans.is_empty()
    }

    pub fn apply(&self, registry: &mut CompositorRegistry) -> Result<()> {
        for orphan in &self.orphans {
            registry.remove(orphan.destroy_id)?;
        }
        for follow in &self.moves {
            registry
                .get_mut(follow.destroy_id)?
                .set_in_and_out(follow.new_in, follow.new_out);
        }
        Ok(())
    }

    pub fn revert(&self, registry: &mut CompositorRegistry) -> Result<()> {
        for follow in &self.moves {
            registry
                .get_mut(follow.destroy_id)?
                .set_in_and_out(follow.orig_in, follow.orig_out);
        }
        for orphan in &self.orphans {
            registry.add(orphan.clone());
        }
        Ok(())
    }
}
