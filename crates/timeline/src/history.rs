use tracing::debug;

use crate::{
    ActionState, ConsolidatedEditAction, EditAction, EditContext, EditPolicy, Refresh, Result,
    TimelineError,
};

/// One undoable step: a single action or a group done as one.
#[derive(Debug)]
pub enum HistoryEntry {
    Single(EditAction),
    Group(ConsolidatedEditAction),
}

impl HistoryEntry {
    pub fn name(&self) -> &'static str {
        match self {
            HistoryEntry::Single(action) => action.name(),
            HistoryEntry::Group(_) => "group",
        }
    }

    pub fn policy(&self) -> EditPolicy {
        match self {
            HistoryEntry::Single(action) => action.policy,
            HistoryEntry::Group(group) => group.policy(),
        }
    }

    pub fn state(&self) -> ActionState {
        match self {
            HistoryEntry::Single(action) => action.state(),
            HistoryEntry::Group(group) => group.state(),
        }
    }

    pub fn redo(&mut self, cx: &mut EditContext<'_>, refresh: Refresh) -> Result<()> {
        match self {
            HistoryEntry::Single(action) => action.redo(cx, refresh),
            HistoryEntry::Group(group) => group.redo(cx, refresh),
        }
    }

    pub fn undo(&mut self, cx: &mut EditContext<'_>, refresh: Refresh) -> Result<()> {
        match self {
            HistoryEntry::Single(action) => action.undo(cx, refresh),
            HistoryEntry::Group(group) => group.undo(cx, refresh),
        }
    }
}

impl From<EditAction> for HistoryEntry {
    fn from(action: EditAction) -> Self {
        HistoryEntry::Single(action)
    }
}

impl From<ConsolidatedEditAction> for HistoryEntry {
    fn from(group: ConsolidatedEditAction) -> Self {
        HistoryEntry::Group(group)
    }
}

/// Bounded undo history with a cursor. Entries before the cursor are done,
/// entries at and after it are undone and can be redone.
#[derive(Debug)]
pub struct UndoStack {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    max_undos: usize,
}

impl UndoStack {
    pub fn new(max_undos: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_undos: max_undos.max(1),
        }
    }

    /// Adds an executed entry, dropping the redo tail and the oldest entry
    /// when the stack is full.
    pub fn register(&mut self, entry: HistoryEntry) {
        self.truncate_redo();
        self.entries.push(entry);
        if self.entries.len() > self.max_undos {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len();
    }

    pub fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<&'static str> {
        if !self.can_undo() {
            return Err(TimelineError::HistoryEmpty("undo stack"));
        }
        let entry = &mut self.entries[self.cursor - 1];
        entry.undo(cx, Refresh::Immediate)?;
        self.cursor -= 1;
        debug!(action = entry.name(), cursor = self.cursor, "undone");
        Ok(entry.name())
    }

    pub fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<&'static str> {
        if !self.can_redo() {
            return Err(TimelineError::HistoryEmpty("redo stack"));
        }
        let entry = &mut self.entries[self.cursor];
        entry.redo(cx, Refresh::Immediate)?;
        self.cursor += 1;
        debug!(action = entry.name(), cursor = self.cursor, "redone");
        Ok(entry.name())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries currently done.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_undos(&self) -> usize {
        self.max_undos
    }

    pub fn truncate_redo(&mut self) {
        self.entries.truncate(self.cursor);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(crate::EditorConfig::default().max_undos)
    }
}
