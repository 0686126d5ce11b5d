//! Hint-penalty ledger for the current selection: the score still available
//! and which hint indices have been revealed.
//!
//! The at-most-once charge guarantee lives here: `charge` refuses a second
//! deduction for an index that is already revealed.

use std::collections::BTreeSet;

/// Per-selection ledger. Reset wholesale on every challenge switch; the
/// available score only ever decreases within one selection.
#[derive(Clone, Debug, Default)]
pub struct HintLedger {
    available: u32,
    revealed: BTreeSet<usize>,
}

impl HintLedger {
    /// Start a fresh ledger at the challenge's full reward.
    pub fn reset(&mut self, score: u32) {
        self.available = score;
        self.revealed.clear();
    }

    pub fn available_score(&self) -> u32 {
        self.available
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.contains(&index)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    /// Apply the penalty for revealing `index`. Returns the new available
    /// score, or `None` when the index was already revealed (no deduction).
    /// The score saturates at zero.
    pub fn charge(&mut self, index: usize, penalty: u32) -> Option<u32> {
        if !self.revealed.insert(index) {
            return None;
        }
        self.available = self.available.saturating_sub(penalty);
        Some(self.available)
    }

    /// Zero the available score after a confirmed successful submission.
    /// Cosmetic only; the server response is the authoritative record.
    pub fn zero(&mut self) {
        self.available = 0;
    }
}
