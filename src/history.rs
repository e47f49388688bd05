//! Undo/redo history over patch batches.
//!
//! The op log is authoritative: replaying `past` in order from the initial
//! tree always reproduces the current tree. Undo exploits that directly. It
//! drops the last batch and rebuilds the tree from scratch by replay, which
//! costs O(history) per undo but needs no inverse for any op. Shallow
//! `remove` has no lossless inverse anyway, so this is kept deliberately.
//!
//! Redo is incremental: the redone batch is applied on top of the current
//! tree. A new batch after an undo discards `future` for good.

use im::Vector;
use tracing::debug;

use crate::ast::Tree;
use crate::patch::{apply_all, PatchBatch};

/// Current tree plus the applied (`past`) and undone (`future`) batches.
///
/// Every transition returns a new `History`; the receiver is never modified.
/// `future[0]` is the batch the next redo will re-apply.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    initial: Tree,
    current: Tree,
    past: Vector<PatchBatch>,
    future: Vector<PatchBatch>,
}

impl History {
    /// An empty history positioned at `initial`.
    pub fn new(initial: Tree) -> Self {
        Self {
            current: initial.clone(),
            initial,
            past: Vector::new(),
            future: Vector::new(),
        }
    }

    /// Reassembles a history from persisted parts without replaying.
    pub fn from_parts(
        initial: Tree,
        current: Tree,
        past: Vector<PatchBatch>,
        future: Vector<PatchBatch>,
    ) -> Self {
        Self {
            initial,
            current,
            past,
            future,
        }
    }

    /// Folds every op of every batch, in order, over `initial`.
    pub fn replay<'a, I>(initial: &Tree, batches: I) -> Tree
    where
        I: IntoIterator<Item = &'a PatchBatch>,
    {
        batches
            .into_iter()
            .fold(initial.clone(), |tree, batch| apply_all(&tree, &batch.ops))
    }

    pub fn current(&self) -> &Tree {
        &self.current
    }

    pub fn initial(&self) -> &Tree {
        &self.initial
    }

    pub fn past(&self) -> &Vector<PatchBatch> {
        &self.past
    }

    pub fn future(&self) -> &Vector<PatchBatch> {
        &self.future
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// True when replaying `past` from the initial tree yields the current tree.
    pub fn is_consistent(&self) -> bool {
        Self::replay(&self.initial, self.past.iter()) == self.current
    }

    /// Applies `batch` to the current tree, records it and clears `future`.
    pub fn apply_batch(&self, batch: PatchBatch) -> Self {
        let current = apply_all(&self.current, &batch.ops);
        debug!(
            batch = %batch.id,
            author = batch.author.as_str(),
            ops = batch.ops.len(),
            dropped_future = self.future.len(),
            "batch applied"
        );
        let mut past = self.past.clone();
        past.push_back(batch);
        Self {
            initial: self.initial.clone(),
            current,
            past,
            future: Vector::new(),
        }
    }

    /// Undoes the most recent batch; a no-op when there is nothing to undo.
    pub fn undo(&self) -> Self {
        let mut past = self.past.clone();
        let Some(batch) = past.pop_back() else {
            return self.clone();
        };
        let current = Self::replay(&self.initial, past.iter());
        debug!(batch = %batch.id, replayed = past.len(), "batch undone");
        let mut future = self.future.clone();
        future.push_front(batch);
        Self {
            initial: self.initial.clone(),
            current,
            past,
            future,
        }
    }

    /// Re-applies the most recently undone batch; a no-op when `future` is empty.
    pub fn redo(&self) -> Self {
        let mut future = self.future.clone();
        let Some(batch) = future.pop_front() else {
            return self.clone();
        };
        let current = apply_all(&self.current, &batch.ops);
        debug!(batch = %batch.id, remaining = future.len(), "batch redone");
        let mut past = self.past.clone();
        past.push_back(batch);
        Self {
            initial: self.initial.clone(),
            current,
            past,
            future,
        }
    }

    /// Tree as it was before the most recent batch in `past`.
    pub fn before_last(&self) -> Tree {
        let keep = self.past.len().saturating_sub(1);
        Self::replay(&self.initial, self.past.iter().take(keep))
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Tree::initial())
    }
}
