//! # History Manager
//!
//! Action log with a cursor, a debounce slot for high-frequency edits, and a
//! base snapshot that absorbs actions falling off the end of the log.
//!
//! ## Design
//!
//! - Each committed action carries its own inverse data
//! - Undo inverts the action under the cursor and steps back
//! - Redo reapplies the next action and steps forward
//! - A new commit truncates everything past the cursor
//! - Past `max_size` entries, the oldest actions are applied onto the base
//!   snapshot and dropped, so memory stays bounded by the log length
//! - A `FullSnapshot` under the cursor is a hard stop for undo
//!
//! ## Debounced commits
//!
//! A debounced action waits in the slot until a quiet period passes. A
//! later debounced edit of the same field merges into it; any other
//! debounced edit pushes it into the log first. Immediate commits, undo and
//! redo take the waiting action out and commit it ahead of themselves, so
//! it can never land after something the user did later.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryManager::new();
//!
//! history.record(action, true, clock.now())?;
//!
//! if let Some(step) = history.undo(&document)? {
//!     document = step.document;
//! }
//! ```

use std::time::{Duration, Instant};

use pagecraft_schema::Document;
use tracing::{debug, trace};

use crate::debounce::Debouncer;
use crate::{HistoryAction, HistoryConfig, HistoryError};

/// Document produced by an undo or redo, with the action that produced it
/// (the inverse, for undo)
#[derive(Debug, Clone)]
pub struct HistoryStep {
    pub document: Document,
    pub action: HistoryAction,
}

#[derive(Debug)]
pub struct HistoryManager {
    /// Committed actions, oldest first
    log: Vec<HistoryAction>,

    /// Number of log entries currently applied; the cursor is `applied - 1`
    applied: usize,

    /// Document state before `log[0]`
    base: Option<Document>,

    /// Maximum number of retained actions (0 = unlimited)
    max_size: usize,

    debounce: Debouncer<HistoryAction>,
}

impl HistoryManager {
    pub const DEFAULT_MAX_SIZE: usize = 100;
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

    /// Create a history manager with default limits
    pub fn new() -> Self {
        Self::with_limits(Self::DEFAULT_MAX_SIZE, Self::DEFAULT_DEBOUNCE)
    }

    pub fn with_limits(max_size: usize, debounce: Duration) -> Self {
        Self {
            log: Vec::new(),
            applied: 0,
            base: None,
            max_size,
            debounce: Debouncer::new(debounce),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::with_limits(config.max_size, config.debounce())
    }

    /// Drop all history and start over from `base`
    pub fn reset(&mut self, base: Option<Document>) {
        self.log.clear();
        self.applied = 0;
        self.base = base;
        self.debounce.cancel();
    }

    /// Record an action that has already been applied to the live document.
    pub fn record(
        &mut self,
        action: HistoryAction,
        immediate: bool,
        now: Instant,
    ) -> Result<(), HistoryError> {
        if immediate {
            self.flush()?;
            return self.commit(action);
        }

        let merged = self
            .debounce
            .pending_mut()
            .is_some_and(|pending| pending.coalesce(&action));

        if merged {
            trace!(action = action.name(), "Coalesced into pending action");
            self.debounce.restart(now);
            return Ok(());
        }

        if let Some(displaced) = self.debounce.schedule(action, now) {
            self.commit(displaced)?;
        }
        Ok(())
    }

    /// Commit the pending debounced action if its quiet period is over
    pub fn poll(&mut self, now: Instant) -> Result<bool, HistoryError> {
        match self.debounce.poll(now) {
            Some(action) => {
                self.commit(action)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Commit the pending debounced action right away
    pub fn flush(&mut self) -> Result<bool, HistoryError> {
        match self.debounce.cancel() {
            Some(action) => {
                self.commit(action)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn commit(&mut self, action: HistoryAction) -> Result<(), HistoryError> {
        // New action invalidates the redo tail
        self.log.truncate(self.applied);

        debug!(action = action.name(), index = self.log.len(), "Committing history action");
        self.log.push(action);
        self.applied = self.log.len();

        self.fold_excess()
    }

    /// Apply the oldest actions onto the base snapshot until the log fits
    fn fold_excess(&mut self) -> Result<(), HistoryError> {
        if self.max_size == 0 || self.log.len() <= self.max_size {
            return Ok(());
        }

        // Nothing changes unless every folded action applies
        let excess = self.log.len() - self.max_size;
        let mut base = self.base.clone().unwrap_or_default();
        for action in &self.log[..excess] {
            base = action.apply(&base)?;
        }

        self.log.drain(..excess);
        self.base = Some(base);
        self.applied -= excess;

        debug!(folded = excess, "Folded history into base snapshot");
        Ok(())
    }

    /// Undo the action under the cursor, starting from `current`
    pub fn undo(&mut self, current: &Document) -> Result<Option<HistoryStep>, HistoryError> {
        self.flush()?;
        if !self.can_undo() {
            return Ok(None);
        }

        let action = self.log[self.applied - 1].to_inverse()?;
        let document = action.apply(current)?;
        self.applied -= 1;

        debug!(action = action.name(), index = ?self.index(), "Undo");
        Ok(Some(HistoryStep { document, action }))
    }

    /// Reapply the action after the cursor, starting from `current`
    pub fn redo(&mut self, current: &Document) -> Result<Option<HistoryStep>, HistoryError> {
        self.flush()?;
        if !self.can_redo() {
            return Ok(None);
        }

        let action = self.log[self.applied].clone();
        let document = action.apply(current)?;
        self.applied += 1;

        debug!(action = action.name(), index = ?self.index(), "Redo");
        Ok(Some(HistoryStep { document, action }))
    }

    /// Check if undo is available. A pending debounced action counts.
    pub fn can_undo(&self) -> bool {
        if self.debounce.is_pending() {
            return true;
        }
        self.applied > 0 && !self.log[self.applied - 1].is_snapshot()
    }

    /// Check if redo is available. Committing a pending debounced action
    /// would truncate the redo tail, so nothing is redoable while one waits.
    pub fn can_redo(&self) -> bool {
        !self.debounce.is_pending() && self.applied < self.log.len()
    }

    /// Cursor position: index of the last applied action
    pub fn index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn actions(&self) -> &[HistoryAction] {
        &self.log
    }

    pub fn has_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn base_snapshot(&self) -> Option<&Document> {
        self.base.as_ref()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Get the name of the next undo operation
    pub fn undo_name(&self) -> Option<&'static str> {
        self.index().map(|i| self.log[i].name())
    }

    /// Get the name of the next redo operation
    pub fn redo_name(&self) -> Option<&'static str> {
        self.log.get(self.applied).map(HistoryAction::name)
    }

    /// Rebuild the document at the cursor from the base snapshot and the
    /// applied part of the log
    pub fn replay(&self) -> Result<Document, HistoryError> {
        let mut doc = self.base.clone().unwrap_or_default();
        for action in &self.log[..self.applied] {
            doc = action.apply(&doc)?;
        }
        Ok(doc)
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}
