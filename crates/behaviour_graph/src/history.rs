use tracing::{debug, warn};

use crate::actions::EditorAction;
use crate::schema::ContainerSchema;
use crate::Result;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
struct Entry {
    revision: u64,
    action: EditorAction,
}

/// Linear undo/redo history.
///
/// Every executed action gets a revision number. [`History::revision`] names the
/// state the schema is in, so callers can compare it against a save point.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    limit: usize,
    next_revision: u64,
    /// Revision of the newest entry dropped by the limit.
    floor: u64,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
            next_revision: 1,
            floor: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Apply an action and record it. A failed action is not recorded and leaves
    /// the redo stack alone.
    pub fn execute(
        &mut self,
        action: impl Into<EditorAction>,
        schema: &mut ContainerSchema,
    ) -> Result<()> {
        let mut action = action.into();
        action.redo(schema)?;
        debug!(action = action.label(), "Action executed");

        self.undo_stack.push(Entry {
            revision: self.next_revision,
            action,
        });
        self.next_revision += 1;
        self.redo_stack.clear();

        if self.undo_stack.len() > self.limit {
            let overflow = self.undo_stack.len() - self.limit;
            let dropped: Vec<Entry> = self.undo_stack.drain(..overflow).collect();
            if let Some(last) = dropped.last() {
                self.floor = last.revision;
            }
            warn!(dropped = overflow, limit = self.limit, "History limit reached, oldest entries dropped");
        }

        Ok(())
    }

    /// Undo the most recent action. Returns false when there is nothing to undo.
    pub fn undo(&mut self, schema: &mut ContainerSchema) -> Result<bool> {
        let Some(mut entry) = self.undo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = entry.action.undo(schema) {
            self.undo_stack.push(entry);
            return Err(err);
        }
        debug!(action = entry.action.label(), "Action undone");

        self.redo_stack.push(entry);
        Ok(true)
    }

    /// Redo the most recently undone action. Returns false when there is nothing to redo.
    pub fn redo(&mut self, schema: &mut ContainerSchema) -> Result<bool> {
        let Some(mut entry) = self.redo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = entry.action.redo(schema) {
            self.redo_stack.push(entry);
            return Err(err);
        }
        debug!(action = entry.action.label(), "Action redone");

        self.undo_stack.push(entry);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&'static str> {
        self.undo_stack.last().map(|entry| entry.action.label())
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|entry| entry.action.label())
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Identifies the current point in history. Equal revisions mean the same
    /// sequence of applied actions.
    pub fn revision(&self) -> u64 {
        self.undo_stack
            .last()
            .map_or(self.floor, |entry| entry.revision)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.floor = self.next_revision;
        self.next_revision += 1;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
