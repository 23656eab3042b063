use serde::{Deserialize, Serialize};

use crate::{Clip, ClipId, Frame, Result, TimelineError, TrackId, TrackItem};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Ordered, contiguous list of clips and blanks.
///
/// Entry positions are derived from the lengths of the preceding entries, so
/// entries can never overlap or leave holes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub parent_track: Option<TrackId>,
    #[serde(default)]
    items: Vec<TrackItem>,
}

impl Track {
    pub fn new(id: TrackId, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            locked: false,
            parent_track: None,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[TrackItem] {
        &self.items
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackItem> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TrackItem> {
        self.items.get_mut(index)
    }

    pub fn item(&self, index: usize) -> Result<&TrackItem> {
        self.items.get(index).ok_or(TimelineError::IndexOutOfBounds {
            track: self.id,
            index,
            count: self.items.len(),
        })
    }

    pub fn clip(&self, index: usize) -> Result<&Clip> {
        self.item(index)?
            .as_clip()
            .ok_or(TimelineError::NotAClip {
                track: self.id,
                index,
            })
    }

    pub fn clip_mut(&mut self, index: usize) -> Result<&mut Clip> {
        let (track, count) = (self.id, self.items.len());
        match self.items.get_mut(index) {
            Some(TrackItem::Clip(clip)) => Ok(clip),
            Some(TrackItem::Blank { .. }) => Err(TimelineError::NotAClip { track, index }),
            None => Err(TimelineError::IndexOutOfBounds {
                track,
                index,
                count,
            }),
        }
    }

    /// Length of the blank at `index`.
    pub fn blank_length(&self, index: usize) -> Result<Frame> {
        match self.item(index)? {
            TrackItem::Blank { length } => Ok(*length),
            TrackItem::Clip(_) => Err(TimelineError::NotABlank {
                track: self.id,
                index,
            }),
        }
    }

    pub fn is_blank_at(&self, index: usize) -> bool {
        self.items.get(index).map_or(false, TrackItem::is_blank)
    }

    pub fn length(&self) -> Frame {
        self.items.iter().map(TrackItem::length).sum()
    }

    /// Track frame where the entry at `index` starts. `count()` gives the
    /// track length.
    pub fn clip_start(&self, index: usize) -> Frame {
        self.items.iter().take(index).map(TrackItem::length).sum()
    }

    /// Index of the entry containing `frame`, or `count()` when the frame is
    /// at or after the track end.
    pub fn clip_index_at(&self, frame: Frame) -> usize {
        let mut start = 0;
        for (index, item) in self.items.iter().enumerate() {
            let end = start + item.length();
            if frame < end {
                return index;
            }
            start = end;
        }
        self.items.len()
    }

    pub fn position_of(&self, id: ClipId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.as_clip().map_or(false, |c| c.id == id))
    }

    pub fn clip_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_blank()).count()
    }

    pub fn insert(&mut self, index: usize, item: TrackItem) -> Result<()> {
        if index > self.items.len() {
            return Err(TimelineError::IndexOutOfBounds {
                track: self.id,
                index,
                count: self.items.len(),
            });
        }
        if item.length() < 1 {
            return Err(TimelineError::InvalidOp(format!(
                "entry of length {} on track {}",
                item.length(),
                self.id
            )));
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Inserts `clip` so that it plays `[clip_in, clip_out]` of its media.
    pub fn insert_clip(
        &mut self,
        index: usize,
        mut clip: Clip,
        clip_in: Frame,
        clip_out: Frame,
    ) -> Result<()> {
        clip.clip_in = clip_in;
        clip.clip_out = clip_out;
        self.insert(index, TrackItem::Clip(clip))
    }

    pub fn insert_blank(&mut self, index: usize, length: Frame) -> Result<()> {
        self.insert(index, TrackItem::blank(length))
    }

    pub fn append(&mut self, item: TrackItem) -> Result<()> {
        self.insert(self.items.len(), item)
    }

    pub fn remove(&mut self, index: usize) -> Result<TrackItem> {
        self.try_remove(index).ok_or(TimelineError::IndexOutOfBounds {
            track: self.id,
            index,
            count: self.items.len(),
        })
    }

    pub fn try_remove(&mut self, index: usize) -> Option<TrackItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub(crate) fn replace_items(&mut self, items: Vec<TrackItem>) -> Vec<TrackItem> {
        std::mem::replace(&mut self.items, items)
    }

    /// `(start, end)` pairs of every entry, end exclusive.
    pub fn ranges(&self) -> Vec<(Frame, Frame)> {
        let mut start = 0;
        self.items
            .iter()
            .map(|item| {
                let range = (start, start + item.length());
                start = range.1;
                range
            })
            .collect()
    }

    pub fn check_invariants(&self) -> Result<()> {
        for (index, item) in self.items.iter().enumerate() {
            if item.length() < 1 {
                return Err(TimelineError::InvalidOp(format!(
                    "entry {} on track {} has length {}",
                    index,
                    self.id,
                    item.length()
                )));
            }
            if let TrackItem::Clip(clip) = item {
                if clip.clip_in < 0 {
                    return Err(TimelineError::InvalidOp(format!(
                        "clip {} on track {} starts at negative media frame {}",
                        index, self.id, clip.clip_in
                    )));
                }
            }
        }
        Ok(())
    }
}
