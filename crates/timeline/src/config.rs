use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{CompositingMode, Result};

/// Editor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo history length
    pub max_undos: usize,

    /// Ask the host to grow track heights when an edit adds clips to a track
    pub auto_expand_tracks: bool,

    /// Compositor behaviour applied to the edited sequence
    pub compositing_mode: CompositingMode,

    /// Undo an edit that leaves a clip synced to itself through other clips
    pub revert_cyclic_sync: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undos: 50,
            auto_expand_tracks: true,
            compositing_mode: CompositingMode::TopDownFreeMove,
            revert_cyclic_sync: true,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "max_undos": 5 }"#).unwrap();
        assert_eq!(config.max_undos, 5);
        assert!(config.auto_expand_tracks);
        assert!(config.revert_cyclic_sync);
        assert_eq!(config.compositing_mode, CompositingMode::TopDownFreeMove);

        let config =
            EditorConfig::from_json_str(r#"{ "compositing_mode": "standard_auto_follow" }"#).unwrap();
        assert!(config.compositing_mode.deletes_orphans());
        assert!(EditorConfig::from_json_str("[]").is_err());
    }
}
