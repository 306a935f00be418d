//! In-memory undo/redo log over the card and sale stores.
//!
//! Operations are a typed sum over the six reversible actions, each carrying
//! its entity snapshots. The log is session-scoped and never persisted:
//! `record` pushes onto the undo stack and clears the redo stack (linear
//! model, no branching). Applying an inverse goes through the same store
//! contracts as the original action, so a conflict with an out-of-band edit
//! surfaces as a normal error and is never retried here.

use crate::error::AppResult;
use crate::models::{Card, Sale};
use crate::store::{cards, sales};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// A reversible action with the snapshots needed to invert or replay it.
///
/// Update variants carry both sides: `previous` for the rollback fields and
/// `current` for the replay fields. The `record` contract for updates is to
/// pass the pre-edit snapshot and the card/sale returned by the store, so
/// `current` starts out holding the live version token.
#[derive(Debug, Clone)]
pub enum Operation {
    AddCard(Card),
    UpdateCard { previous: Card, current: Card },
    DeleteCard(Card),
    AddSale(Sale),
    UpdateSale { previous: Sale, current: Sale },
    DeleteSale(Sale),
}

impl Operation {
    /// Human-readable preview, shown next to the undo/redo actions.
    pub fn describe(&self) -> String {
        match self {
            Operation::AddCard(c) => format!("Add card: {}", c.name),
            Operation::UpdateCard { current, .. } => format!("Edit card: {}", current.name),
            Operation::DeleteCard(c) => format!("Delete card: {}", c.name),
            Operation::AddSale(s) => format!("Record sale #{}", s.id),
            Operation::UpdateSale { current, .. } => format!("Edit sale #{}", current.id),
            Operation::DeleteSale(s) => format!("Delete sale #{}", s.id),
        }
    }
}

struct Entry {
    op: Operation,
    recorded_at: DateTime<Utc>,
}

/// Two ordered stacks of reversible operations, scoped to the session.
#[derive(Default)]
pub struct UndoRedoLog {
    undo: Vec<Entry>,
    redo: Vec<Entry>,
}

impl UndoRedoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Records a completed operation; new actions invalidate the redo history.
    pub fn record(&mut self, op: Operation) {
        log::debug!("Recorded operation: {}", op.describe());
        self.undo.push(Entry {
            op,
            recorded_at: Utc::now(),
        });
        self.redo.clear();
    }

    /// Undoes the most recent operation through the stores.
    ///
    /// Returns the description of what was undone, or `None` when the stack
    /// is empty. On failure the operation stays on the undo stack (treated
    /// as not-yet-undone) and the error propagates.
    pub fn undo(&mut self, conn: &mut Connection) -> AppResult<Option<String>> {
        let Some(mut entry) = self.undo.pop() else {
            return Ok(None);
        };
        log::info!("Undoing operation: {}", entry.op.describe());
        match apply_inverse(conn, &mut entry.op) {
            Ok(()) => {
                let desc = entry.op.describe();
                self.redo.push(entry);
                Ok(Some(desc))
            }
            Err(e) => {
                log::warn!("Undo failed: {}", e);
                self.undo.push(entry);
                Err(e)
            }
        }
    }

    /// Re-applies the most recently undone operation; symmetric to [`undo`].
    ///
    /// [`undo`]: UndoRedoLog::undo
    pub fn redo(&mut self, conn: &mut Connection) -> AppResult<Option<String>> {
        let Some(mut entry) = self.redo.pop() else {
            return Ok(None);
        };
        log::info!("Redoing operation: {}", entry.op.describe());
        match apply_forward(conn, &mut entry.op) {
            Ok(()) => {
                let desc = entry.op.describe();
                self.undo.push(entry);
                Ok(Some(desc))
            }
            Err(e) => {
                log::warn!("Redo failed: {}", e);
                self.redo.push(entry);
                Err(e)
            }
        }
    }

    /// Empties both stacks; no durability implication, the log is in-memory.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        log::debug!("Undo/redo stacks cleared");
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo.last().map(|e| e.op.describe())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo.last().map(|e| e.op.describe())
    }

    /// Timestamp of the pending undo operation, newest first.
    pub fn last_recorded_at(&self) -> Option<DateTime<Utc>> {
        self.undo.last().map(|e| e.recorded_at)
    }
}

/// Applies the semantic inverse of `op` and refreshes its version tokens so
/// a following redo presents the token the store now holds.
fn apply_inverse(conn: &mut Connection, op: &mut Operation) -> AppResult<()> {
    match op {
        Operation::AddCard(card) => {
            cards::delete_card(conn, card.id)?;
        }
        Operation::UpdateCard { previous, current } => {
            let rollback = Card {
                id: current.id,
                version: current.version,
                ..previous.clone()
            };
            let stored = cards::update_card(conn, &rollback)?;
            previous.version = stored.version;
            current.version = stored.version;
        }
        Operation::DeleteCard(card) => {
            let restored = cards::add_card(conn, card)?;
            *card = restored;
        }
        Operation::AddSale(sale) => {
            sales::delete_sale(conn, sale.id)?;
        }
        Operation::UpdateSale { previous, current } => {
            let rollback = Sale {
                id: current.id,
                version: current.version,
                ..previous.clone()
            };
            let stored = sales::update_sale(conn, &rollback)?;
            previous.version = stored.version;
            current.version = stored.version;
        }
        Operation::DeleteSale(sale) => {
            let restored = sales::add_sale(conn, sale)?;
            *sale = restored;
        }
    }
    Ok(())
}

/// Re-applies `op` forward, refreshing version tokens as [`apply_inverse`] does.
fn apply_forward(conn: &mut Connection, op: &mut Operation) -> AppResult<()> {
    match op {
        Operation::AddCard(card) => {
            let restored = cards::add_card(conn, card)?;
            *card = restored;
        }
        Operation::UpdateCard { previous, current } => {
            let replay = Card {
                version: previous.version,
                ..current.clone()
            };
            let stored = cards::update_card(conn, &replay)?;
            previous.version = stored.version;
            current.version = stored.version;
        }
        Operation::DeleteCard(card) => {
            cards::delete_card(conn, card.id)?;
        }
        Operation::AddSale(sale) => {
            let restored = sales::add_sale(conn, sale)?;
            *sale = restored;
        }
        Operation::UpdateSale { previous, current } => {
            let replay = Sale {
                version: previous.version,
                ..current.clone()
            };
            let stored = sales::update_sale(conn, &replay)?;
            previous.version = stored.version;
            current.version = stored.version;
        }
        Operation::DeleteSale(sale) => {
            sales::delete_sale(conn, sale.id)?;
        }
    }
    Ok(())
}
