/// What changed in one top-level edit, for the GUI to redraw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshHints {
    /// Per-track clip counts changed.
    pub tracks_changed: bool,
    pub compositors_changed: bool,
    pub update_effects_editor: bool,
}

/// Editor-side collaborators of the edit engine. Every method defaults to a
/// no-op so headless hosts implement only what they need.
pub trait EditorHost {
    fn stop_playback(&mut self) {}

    fn clear_selection(&mut self) {}

    fn exit_trim_mode(&mut self) {}

    /// Called after an edit with per-track clip counts before and after it.
    fn auto_expand_tracks(&mut self, _before: &[usize], _after: &[usize]) {}

    fn refresh(&mut self, _hints: RefreshHints) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl EditorHost for NullHost {}
