use tracing::{debug, warn};

use crate::{
    ConsolidatedEditAction, EditAction, EditContext, EditorConfig, EditorHost, HistoryEntry,
    InMemoryBackend, MediaBackend, NullHost, Refresh, Result, Sequence, TimelineError, UndoStack,
};

/// Owns a sequence and everything edits on it need: the media backend, the
/// host, the undo history and the settings.
pub struct Editor {
    seq: Sequence,
    backend: Box<dyn MediaBackend>,
    host: Box<dyn EditorHost>,
    history: UndoStack,
    config: EditorConfig,
    edit_done_since_last_save: bool,
}

impl Editor {
    pub fn new(
        mut seq: Sequence,
        backend: Box<dyn MediaBackend>,
        host: Box<dyn EditorHost>,
        config: EditorConfig,
    ) -> Self {
        seq.compositing_mode = config.compositing_mode;
        Self {
            seq,
            backend,
            host,
            history: UndoStack::new(config.max_undos),
            config,
            edit_done_since_last_save: false,
        }
    }

    /// Editor with an in-memory backend and no host.
    pub fn headless(seq: Sequence, config: EditorConfig) -> Self {
        Self::new(seq, Box::new(InMemoryBackend::new()), Box::new(NullHost), config)
    }

    pub fn sequence(&self) -> &Sequence {
        &self.seq
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn edit_done_since_last_save(&self) -> bool {
        self.edit_done_since_last_save
    }

    pub fn mark_saved(&mut self) {
        self.edit_done_since_last_save = false;
    }

    pub fn do_edit(&mut self, action: EditAction) -> Result<()> {
        self.do_entry(HistoryEntry::Single(action))
    }

    pub fn do_group(&mut self, group: ConsolidatedEditAction) -> Result<()> {
        if group.is_empty() {
            return Err(TimelineError::InvalidOp("empty edit group".to_string()));
        }
        self.do_entry(HistoryEntry::Group(group))
    }

    fn do_entry(&mut self, mut entry: HistoryEntry) -> Result<()> {
        let policy = entry.policy();
        if policy.exit_active_trim_mode {
            self.host.exit_trim_mode();
        }
        if policy.stop_for_edit {
            self.host.stop_playback();
        }
        if policy.clear_editor_for_multitrack {
            self.host.clear_selection();
        }

        let counts_before = self.seq.tracks_clip_counts();
        let snapshot = self.seq.clone();
        let result = {
            let mut cx = EditContext::new(&mut self.seq, self.backend.as_mut(), self.host.as_mut());
            entry.redo(&mut cx, Refresh::Immediate)
        };
        if let Err(e) = result {
            // failed edits are not registered, so the sequence goes back as it was
            warn!(action = entry.name(), error = %e, "edit failed, restoring sequence");
            self.seq = snapshot;
            return Err(e);
        }
        debug!(action = entry.name(), "edit done");
        self.history.register(entry);
        self.edit_done_since_last_save = true;

        if self.config.auto_expand_tracks {
            let counts_after = self.seq.tracks_clip_counts();
            self.host.auto_expand_tracks(&counts_before, &counts_after);
        }
        self.revert_if_cyclic()
    }

    /// Undoes and forgets the last edit when it left a sync cycle behind.
    fn revert_if_cyclic(&mut self) -> Result<()> {
        if !self.config.revert_cyclic_sync {
            return Ok(());
        }
        let Some(clip) = self.seq.find_sync_cycle() else {
            return Ok(());
        };
        warn!(clip = %clip, "edit created a sync cycle, reverting");
        {
            let mut cx = EditContext::new(&mut self.seq, self.backend.as_mut(), self.host.as_mut());
            self.history.undo(&mut cx)?;
        }
        self.history.truncate_redo();
        Err(TimelineError::CyclicSync(clip))
    }

    pub fn undo(&mut self) -> Result<&'static str> {
        let mut cx = EditContext::new(&mut self.seq, self.backend.as_mut(), self.host.as_mut());
        let name = self.history.undo(&mut cx)?;
        self.edit_done_since_last_save = true;
        Ok(name)
    }

    pub fn redo(&mut self) -> Result<&'static str> {
        let mut cx = EditContext::new(&mut self.seq, self.backend.as_mut(), self.host.as_mut());
        let name = self.history.redo(&mut cx)?;
        self.edit_done_since_last_save = true;
        Ok(name)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drops the history, e.g. after loading another sequence state.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn into_sequence(self) -> Sequence {
        self.seq
    }
}
