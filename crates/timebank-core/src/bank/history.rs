//! History log and undo stack.
//!
//! Every accepted mutation appends one [`HistoryEntry`] to the history and
//! pushes the same entry onto the undo stack. Undo pops the stack and removes
//! the entry from the history by its sequence id, so entries with identical
//! field values never get confused with each other.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "sub")]
    Subtract,
    #[serde(rename = "countdown")]
    CountdownConsumed,
}

impl EntryKind {
    pub fn tag(self) -> &'static str {
        match self {
            EntryKind::Add => "add",
            EntryKind::Subtract => "sub",
            EntryKind::CountdownConsumed => "countdown",
        }
    }

    /// Display sign; countdown consumption carries none.
    pub fn sign(self) -> &'static str {
        match self {
            EntryKind::Add => "+",
            EntryKind::Subtract => "\u{2212}",
            EntryKind::CountdownConsumed => "",
        }
    }

    /// Whether the entry took time out of the balance.
    pub fn is_debit(self) -> bool {
        !matches!(self, EntryKind::Add)
    }
}

/// Immutable record of one past mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonic sequence number; zero only in records written before ids existed.
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Requested amount in balance units, always > 0.
    #[serde(alias = "seconds")]
    pub amount: u64,
    /// Amount actually moved when the balance was clamped; `None` means `amount`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied: Option<u64>,
    #[serde(rename = "timestamp")]
    pub occurred_at_ms: u64,
}

impl HistoryEntry {
    /// Balance delta to reverse on undo.
    pub fn applied_amount(&self) -> u64 {
        self.applied.unwrap_or(self.amount)
    }

    /// Apply the inverse of this entry to `balance`, clamped at zero.
    pub fn revert(&self, balance: u64) -> u64 {
        let delta = self.applied_amount();
        if self.kind.is_debit() {
            balance.saturating_add(delta)
        } else {
            balance.saturating_sub(delta)
        }
    }
}

/// History plus undo stack, kept consistent with each other.
///
/// Serialize-only: persisted ledgers come back through [`Ledger::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ledger {
    history: Vec<HistoryEntry>,
    undo_stack: Vec<HistoryEntry>,
    next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            undo_stack: Vec::new(),
            next_id: first_id(),
        }
    }

    /// Rebuild a ledger from persisted lists.
    ///
    /// Entries without an id get fresh ones; undo entries are matched to the
    /// most recent unmatched history entry with equal fields. Undo entries with
    /// no history counterpart are dropped so the stack stays a subset of the
    /// history. `next_id` is never allowed to fall back onto a live id.
    ///
    /// Ids too large to leave room for new entries are treated as corrupt: the
    /// whole ledger is renumbered from 1.
    pub fn from_parts(
        mut history: Vec<HistoryEntry>,
        mut undo_stack: Vec<HistoryEntry>,
        next_id: Option<u64>,
    ) -> Self {
        let legacy_count = history.iter().filter(|e| e.id == 0).count() as u64;
        let live_max = history
            .iter()
            .chain(undo_stack.iter())
            .map(|e| e.id)
            .max()
            .unwrap_or(0);
        let fits = |start: u64| start.checked_add(legacy_count).is_some();
        let mut next_id = match live_max.checked_add(1) {
            Some(free) if fits(free) => {
                let hinted = next_id.unwrap_or(0).max(free);
                if fits(hinted) {
                    hinted
                } else {
                    warn!(next_id = hinted, "ignoring unusable persisted next id");
                    free
                }
            }
            _ => {
                warn!(live_max, "persisted ids out of range; renumbering ledger");
                for entry in history.iter_mut().chain(undo_stack.iter_mut()) {
                    entry.id = 0;
                }
                first_id()
            }
        };

        let mut legacy: Vec<usize> = Vec::new();
        for (idx, entry) in history.iter_mut().enumerate() {
            if entry.id == 0 {
                entry.id = next_id;
                next_id += 1;
                legacy.push(idx);
            }
        }

        let mut matched: Vec<u64> = Vec::new();
        let mut stack = Vec::with_capacity(undo_stack.len());
        for mut entry in undo_stack {
            if entry.id == 0 {
                let found = legacy.iter().rev().copied().find(|&idx| {
                    let h = &history[idx];
                    !matched.contains(&h.id)
                        && h.kind == entry.kind
                        && h.amount == entry.amount
                        && h.occurred_at_ms == entry.occurred_at_ms
                });
                match found {
                    Some(idx) => entry.id = history[idx].id,
                    None => continue,
                }
            } else if !history.iter().any(|h| h.id == entry.id) {
                continue;
            }
            matched.push(entry.id);
            stack.push(entry);
        }

        Self {
            history,
            undo_stack: stack,
            next_id,
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn undo_stack(&self) -> &[HistoryEntry] {
        &self.undo_stack
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Append a new entry to history and undo stack.
    pub fn record(
        &mut self,
        kind: EntryKind,
        amount: u64,
        applied: u64,
        occurred_at_ms: u64,
    ) -> HistoryEntry {
        if self.next_id == u64::MAX {
            self.renumber();
        }
        let entry = HistoryEntry {
            id: self.next_id,
            kind,
            amount,
            applied: (applied != amount).then_some(applied),
            occurred_at_ms,
        };
        self.next_id += 1;
        self.history.push(entry.clone());
        self.undo_stack.push(entry.clone());
        entry
    }

    /// Reassign ids 1..=n in history order, carrying undo entries along.
    fn renumber(&mut self) {
        warn!(entries = self.history.len(), "sequence ids exhausted; renumbering ledger");
        let ids: Vec<(u64, u64)> = self
            .history
            .iter_mut()
            .zip(first_id()..)
            .map(|(entry, new)| (std::mem::replace(&mut entry.id, new), new))
            .collect();
        for entry in &mut self.undo_stack {
            if let Some(&(_, new)) = ids.iter().find(|(old, _)| *old == entry.id) {
                entry.id = new;
            }
        }
        self.next_id = ids.len() as u64 + first_id();
    }

    /// Pop the most recent undoable entry and drop it from the history.
    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.history.retain(|e| e.id != entry.id);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_assigns_increasing_ids() {
        let mut ledger = Ledger::new();
        let a = ledger.record(EntryKind::Add, 60, 60, 1_000);
        let b = ledger.record(EntryKind::Add, 60, 60, 1_000);
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(ledger.history().len(), 2);
        assert_eq!(ledger.undo_stack().len(), 2);
    }

    #[test]
    fn pop_undo_removes_matching_id_only() {
        let mut ledger = Ledger::new();
        ledger.record(EntryKind::Add, 60, 60, 1_000);
        ledger.record(EntryKind::Add, 60, 60, 1_000);
        let popped = ledger.pop_undo().unwrap();
        assert_eq!(popped.id, 2);
        assert_eq!(ledger.history().len(), 1);
        assert_eq!(ledger.history()[0].id, 1);
    }

    #[test]
    fn pop_undo_on_empty_stack() {
        let mut ledger = Ledger::new();
        assert!(ledger.pop_undo().is_none());
    }

    #[test]
    fn revert_clamps_at_zero() {
        let entry = HistoryEntry {
            id: 1,
            kind: EntryKind::Add,
            amount: 100,
            applied: None,
            occurred_at_ms: 0,
        };
        assert_eq!(entry.revert(40), 0);
    }

    #[test]
    fn revert_uses_applied_amount() {
        let entry = HistoryEntry {
            id: 1,
            kind: EntryKind::Subtract,
            amount: 100,
            applied: Some(30),
            occurred_at_ms: 0,
        };
        assert_eq!(entry.revert(0), 30);
    }

    #[test]
    fn from_parts_assigns_ids_to_legacy_entries() {
        let legacy = |ts| HistoryEntry {
            id: 0,
            kind: EntryKind::Add,
            amount: 60,
            applied: None,
            occurred_at_ms: ts,
        };
        let history = vec![legacy(1), legacy(1), legacy(2)];
        let undo = vec![legacy(1), legacy(2)];
        let ledger = Ledger::from_parts(history, undo, None);

        let ids: Vec<u64> = ledger.history().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let undo_ids: Vec<u64> = ledger.undo_stack().iter().map(|e| e.id).collect();
        assert_eq!(undo_ids, vec![2, 3]);
        assert_eq!(ledger.next_id(), 4);
    }

    #[test]
    fn from_parts_drops_orphan_undo_entries() {
        let entry = HistoryEntry {
            id: 7,
            kind: EntryKind::Subtract,
            amount: 5,
            applied: None,
            occurred_at_ms: 0,
        };
        let ledger = Ledger::from_parts(Vec::new(), vec![entry], Some(3));
        assert!(!ledger.can_undo());
        assert_eq!(ledger.next_id(), 8);
    }

    #[test]
    fn from_parts_renumbers_when_ids_are_exhausted() {
        let entry = HistoryEntry {
            id: u64::MAX,
            kind: EntryKind::Add,
            amount: 60,
            applied: None,
            occurred_at_ms: 1,
        };
        let mut ledger = Ledger::from_parts(vec![entry.clone()], vec![entry], None);
        assert_eq!(ledger.history()[0].id, 1);
        assert_eq!(ledger.undo_stack()[0].id, 1);
        assert_eq!(ledger.next_id(), 2);

        let next = ledger.record(EntryKind::Subtract, 5, 5, 2);
        assert_eq!(next.id, 2);
        assert_eq!(ledger.pop_undo().unwrap().id, 2);
        assert_eq!(ledger.pop_undo().unwrap().id, 1);
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn from_parts_ignores_next_id_with_no_room_for_legacy_entries() {
        let legacy = HistoryEntry {
            id: 0,
            kind: EntryKind::Add,
            amount: 60,
            applied: None,
            occurred_at_ms: 1,
        };
        let ledger = Ledger::from_parts(vec![legacy], Vec::new(), Some(u64::MAX));
        assert_eq!(ledger.history()[0].id, 1);
        assert_eq!(ledger.next_id(), 2);
    }

    #[test]
    fn record_renumbers_after_max_next_id() {
        let entry = HistoryEntry {
            id: 5,
            kind: EntryKind::Add,
            amount: 60,
            applied: None,
            occurred_at_ms: 1,
        };
        let mut ledger = Ledger::from_parts(vec![entry.clone()], vec![entry], Some(u64::MAX));
        assert_eq!(ledger.next_id(), u64::MAX);

        let added = ledger.record(EntryKind::Add, 5, 5, 2);
        assert_eq!(added.id, 2);
        let ids: Vec<u64> = ledger.history().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
        let undo_ids: Vec<u64> = ledger.undo_stack().iter().map(|e| e.id).collect();
        assert_eq!(undo_ids, vec![1, 2]);
        assert_eq!(ledger.next_id(), 3);
    }

    #[test]
    fn entry_reads_legacy_field_names() {
        let json = r#"{"type":"sub","seconds":300,"timestamp":1700000000000}"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, EntryKind::Subtract);
        assert_eq!(entry.amount, 300);
        assert_eq!(entry.id, 0);
    }
}
