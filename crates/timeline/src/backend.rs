use std::collections::HashSet;

use crate::{
    Clip, ClipId, Compositor, Filter, FilterInfo, Frame, MediaSource, Result, TimelineError,
};

/// Producer side of the media engine: everything that creates clip, filter
/// or compositor objects goes through this trait.
pub trait MediaBackend {
    /// Create a clip spanning all of its media.
    fn create_clip(
        &mut self,
        source: MediaSource,
        name: &str,
        media_length: Option<Frame>,
    ) -> Result<Clip>;

    /// New clip on the same media with a fresh id. Range, markers, mute state
    /// and sync data are copied; filters are not.
    fn clone_clip(&mut self, clip: &Clip) -> Result<Clip>;

    /// Duplicates of the clip's filters with fresh ids.
    fn clone_filters(&mut self, clip: &Clip) -> Vec<Filter> {
        clip.filters.iter().map(Filter::duplicate).collect()
    }

    fn create_filter(&mut self, info: &FilterInfo) -> Result<Filter>;

    /// Filter whose parts span the clip's current media range.
    fn create_multipart_filter(&mut self, info: &FilterInfo, clip: &Clip) -> Result<Filter> {
        let mut filter = self.create_filter(info)?;
        filter.properties.insert("in".to_string(), clip.clip_in.to_string());
        filter.properties.insert("out".to_string(), clip.clip_out.to_string());
        Ok(filter)
    }

    /// Volume filter used to mute a clip.
    fn create_mute_filter(&mut self) -> Filter;

    fn create_compositor(&mut self, type_id: &str) -> Result<Compositor>;

    fn attach_filter(&mut self, clip: &mut Clip, index: usize, filter: Filter) -> Result<()> {
        if index > clip.filters.len() {
            return Err(TimelineError::FilterIndex {
                index,
                count: clip.filters.len(),
            });
        }
        clip.filters.insert(index, filter);
        Ok(())
    }

    fn detach_filter(&mut self, clip: &mut Clip, index: usize) -> Result<Filter> {
        if index >= clip.filters.len() {
            return Err(TimelineError::FilterIndex {
                index,
                count: clip.filters.len(),
            });
        }
        Ok(clip.filters.remove(index))
    }
}

/// Backend that only builds the data model. Used headless and in tests.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    /// Services `create_filter` accepts; empty accepts everything.
    pub known_filters: HashSet<String>,
    /// Compositor types `create_compositor` accepts; empty accepts everything.
    pub known_compositors: HashSet<String>,
    created_clips: usize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_clips(&self) -> usize {
        self.created_clips
    }
}

impl MediaBackend for InMemoryBackend {
    fn create_clip(
        &mut self,
        source: MediaSource,
        name: &str,
        media_length: Option<Frame>,
    ) -> Result<Clip> {
        if let Some(len) = media_length {
            if len < 1 {
                return Err(TimelineError::InvalidOp(format!(
                    "media '{}' has length {}",
                    name, len
                )));
            }
        }
        self.created_clips += 1;
        Ok(Clip::new(name, source, media_length))
    }

    fn clone_clip(&mut self, clip: &Clip) -> Result<Clip> {
        self.created_clips += 1;
        Ok(Clip {
            id: ClipId::new(),
            filters: Vec::new(),
            mute_filter: clip.mute_filter.as_ref().map(Filter::duplicate),
            ..clip.clone()
        })
    }

    fn create_filter(&mut self, info: &FilterInfo) -> Result<Filter> {
        if !self.known_filters.is_empty() && !self.known_filters.contains(&info.service) {
            return Err(TimelineError::InvalidOp(format!(
                "unknown filter service '{}'",
                info.service
            )));
        }
        Ok(Filter::from_info(info))
    }

    fn create_mute_filter(&mut self) -> Filter {
        let mut info = FilterInfo::new("volume", "Mute");
        info.properties.insert("gain".to_string(), "0".to_string());
        Filter::from_info(&info)
    }

    fn create_compositor(&mut self, type_id: &str) -> Result<Compositor> {
        if !self.known_compositors.is_empty() && !self.known_compositors.contains(type_id) {
            return Err(TimelineError::InvalidOp(format!(
                "unknown compositor type '{}'",
                type_id
            )));
        }
        Ok(Compositor::new(type_id))
    }
}
