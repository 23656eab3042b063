use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ClipId, FilterId, Frame, Result, SyncData, TimelineError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    File {
        path: String,
        /// Frames each image is shown for in an image sequence.
        #[serde(default)]
        ttl: Option<u32>,
    },
    Pattern {
        generator: String,
        #[serde(default)]
        params: serde_json::Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterInfo {
    pub service: String,
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl FilterInfo {
    pub fn new(service: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filter {
    #[serde(default)]
    pub id: FilterId,
    pub service: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_active() -> bool {
    true
}

/// Property values of a filter detached from the filter object, used for
/// copy/paste of filter settings between clips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedFilterValues {
    pub service: String,
    pub properties: BTreeMap<String, String>,
}

impl Filter {
    pub fn from_info(info: &FilterInfo) -> Self {
        Self {
            id: FilterId::new(),
            service: info.service.clone(),
            name: info.name.clone(),
            active: true,
            properties: info.properties.clone(),
        }
    }

    /// Same service and values under a fresh identity.
    pub fn duplicate(&self) -> Self {
        Self {
            id: FilterId::new(),
            ..self.clone()
        }
    }

    pub fn saved_values(&self) -> SavedFilterValues {
        SavedFilterValues {
            service: self.service.clone(),
            properties: self.properties.clone(),
        }
    }

    pub fn load_values(&mut self, saved: &SavedFilterValues) -> Result<()> {
        if saved.service != self.service {
            return Err(TimelineError::IncompatibleFilterValues {
                saved: saved.service.clone(),
                target: self.service.clone(),
            });
        }
        self.properties = saved.properties.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipMarker {
    pub frame: Frame,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerData {
    pub program: String,
    #[serde(default)]
    pub rendered_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    #[serde(default)]
    pub id: ClipId,
    pub name: String,
    pub source: MediaSource,
    /// Frames available in the source, `None` for generators and stills.
    #[serde(default)]
    pub media_length: Option<Frame>,
    #[serde(default)]
    pub clip_in: Frame,
    #[serde(default)]
    pub clip_out: Frame,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub mute_filter: Option<Filter>,
    #[serde(default)]
    pub sync_data: Option<SyncData>,
    #[serde(default)]
    pub markers: Vec<ClipMarker>,
    #[serde(default)]
    pub container: Option<ContainerData>,
}

impl Clip {
    pub fn new(name: impl Into<String>, source: MediaSource, media_length: Option<Frame>) -> Self {
        let clip_out = media_length.map(|len| len - 1).unwrap_or(0);
        Self {
            id: ClipId::new(),
            name: name.into(),
            source,
            media_length,
            clip_in: 0,
            clip_out,
            filters: Vec::new(),
            mute_filter: None,
            sync_data: None,
            markers: Vec::new(),
            container: None,
        }
    }

    pub fn with_range(mut self, clip_in: Frame, clip_out: Frame) -> Self {
        self.clip_in = clip_in;
        self.clip_out = clip_out;
        self
    }

    pub fn length(&self) -> Frame {
        self.clip_out - self.clip_in + 1
    }

    /// A single picture file. Its media length is the length it was given
    /// on import and may be extended.
    pub fn is_still_image(&self) -> bool {
        const EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];
        match &self.source {
            MediaSource::File { path, ttl: None } => std::path::Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| {
                    EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
                }),
            _ => false,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.mute_filter.is_some()
    }

    /// Whether `[clip_in, clip_out]` is a legal range of this clip's media.
    pub fn accepts_range(&self, clip_in: Frame, clip_out: Frame) -> bool {
        clip_in >= 0
            && clip_in <= clip_out
            && self.media_length.map_or(true, |len| clip_out < len)
    }

    /// True if `clip_frame` (a media frame) is on one of the clip's edges.
    pub fn frame_on_cut(&self, clip_frame: Frame) -> bool {
        clip_frame == self.clip_in || clip_frame == self.clip_out + 1
    }

    pub fn filter_index(&self, id: FilterId) -> Option<usize> {
        self.filters.iter().position(|f| f.id == id)
    }
}

/// One entry of an interval track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackItem {
    Blank { length: Frame },
    Clip(Clip),
}

impl TrackItem {
    pub fn blank(length: Frame) -> Self {
        TrackItem::Blank { length }
    }

    pub fn length(&self) -> Frame {
        match self {
            TrackItem::Blank { length } => *length,
            TrackItem::Clip(clip) => clip.length(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, TrackItem::Blank { .. })
    }

    pub fn clip_in(&self) -> Frame {
        match self {
            TrackItem::Blank { .. } => 0,
            TrackItem::Clip(clip) => clip.clip_in,
        }
    }

    pub fn clip_out(&self) -> Frame {
        match self {
            TrackItem::Blank { length } => length - 1,
            TrackItem::Clip(clip) => clip.clip_out,
        }
    }

    pub fn as_clip(&self) -> Option<&Clip> {
        match self {
            TrackItem::Clip(clip) => Some(clip),
            TrackItem::Blank { .. } => None,
        }
    }

    pub fn as_clip_mut(&mut self) -> Option<&mut Clip> {
        match self {
            TrackItem::Clip(clip) => Some(clip),
            TrackItem::Blank { .. } => None,
        }
    }
}

impl From<Clip> for TrackItem {
    fn from(clip: Clip) -> Self {
        TrackItem::Clip(clip)
    }
}
