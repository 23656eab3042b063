use thiserror::Error;

mod ids;
pub use ids::*;
mod clip;
pub use clip::*;
mod track;
pub use track::*;
mod sync;
pub use sync::*;
mod compositor;
pub use compositor::*;
mod sequence;
pub use sequence::*;
mod backend;
pub use backend::*;
mod host;
pub use host::*;
pub mod blanks;
pub mod splice;
mod ripple;
pub use ripple::*;
mod action;
pub use action::*;
mod consolidated;
pub use consolidated::*;
pub mod edits;
pub use edits::EditOp;
mod history;
pub use history::*;
mod config;
pub use config::*;
mod editor;
pub use editor::*;
mod commands;
pub use commands::*;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("index {index} out of bounds for track {track} ({count} items)")]
    IndexOutOfBounds {
        track: TrackId,
        index: usize,
        count: usize,
    },
    #[error("item {index} on track {track} is not a clip")]
    NotAClip { track: TrackId, index: usize },
    #[error("item {index} on track {track} is not a blank")]
    NotABlank { track: TrackId, index: usize },
    #[error("clip not found: {0}")]
    ClipNotFound(ClipId),
    #[error("compositor not found: {0}")]
    CompositorNotFound(DestroyId),
    #[error("filter index {index} out of bounds ({count} filters)")]
    FilterIndex { index: usize, count: usize },
    #[error("saved values for '{saved}' cannot be loaded into a '{target}' filter")]
    IncompatibleFilterValues { saved: String, target: String },
    #[error("edit introduced a sync cycle through clip {0}")]
    CyclicSync(ClipId),
    #[error("history empty: {0}")]
    HistoryEmpty(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

pub type Frame = i64; // 0-based frame position or media frame
