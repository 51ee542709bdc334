//! The reader registry: parallel reader state and connection slots,
//! indexed identically, rebuilt wholesale when the reader set changes.

use crate::types::{CardPresence, ConnHandle, StatusSlot};
use cardbridge_core::Protocol;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Connection {
    pub handle: Option<ConnHandle>,
    pub protocol: Protocol,
    /// Absorbs the spurious status-change notification PC/SC raises
    /// right after `connect` — see the dispatcher's `CONNECT` handler.
    pub suppression_counter: u32,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            handle: None,
            protocol: Protocol::Undefined,
            suppression_counter: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReaderEntry {
    pub name: String,
    pub presence: CardPresence,
    pub atr: Vec<u8>,
    pub connection: Connection,
}

impl ReaderEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            presence: CardPresence::Empty,
            atr: Vec::new(),
            connection: Connection::default(),
        }
    }
}

/// Result of a `rebuild` call: which reader names appeared or
/// disappeared, and which live handles need an explicit disconnect
/// now that their slot is gone.
#[derive(Debug, Default)]
pub struct RebuildDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub closed_handles: Vec<ConnHandle>,
}

impl RebuildDiff {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<ReaderEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReaderEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ReaderEntry> {
        self.entries.get_mut(index)
    }

    /// Name and last-known ATR for every reader, in registry order —
    /// what `LIST_READERS` reports.
    pub fn name_atr_pairs(&self) -> Vec<(&str, &[u8])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.atr.as_slice()))
            .collect()
    }

    pub fn status_slots(&self) -> Vec<StatusSlot> {
        self.entries
            .iter()
            .map(|e| StatusSlot {
                reader_name: e.name.clone(),
                known_presence: e.presence,
            })
            .collect()
    }

    /// Replace the registry's contents if, and only if, the new name
    /// set differs from the current one. Detects additions and
    /// removals by name, not just by count, so a simultaneous
    /// unplug-and-plug between two ticks is no longer invisible.
    pub fn rebuild(&mut self, new_names: Vec<String>) -> RebuildDiff {
        // A reader with no name is not a reader PC/SC can address; drop
        // it before it ever becomes a slot.
        let new_names: Vec<String> = new_names.into_iter().filter(|n| !n.is_empty()).collect();

        let old_set: HashSet<&str> = self.entries.iter().map(|e| e.name.as_str()).collect();
        let new_set: HashSet<&str> = new_names.iter().map(String::as_str).collect();

        let added: Vec<String> = new_names
            .iter()
            .filter(|n| !old_set.contains(n.as_str()))
            .cloned()
            .collect();
        let removed: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !new_set.contains(e.name.as_str()))
            .map(|e| e.name.clone())
            .collect();

        let mut diff = RebuildDiff {
            added,
            removed,
            closed_handles: Vec::new(),
        };
        if !diff.changed() {
            return diff;
        }

        diff.closed_handles = self
            .entries
            .iter()
            .filter_map(|e| e.connection.handle)
            .collect();

        self.entries = new_names.into_iter().map(ReaderEntry::new).collect();
        diff
    }
}
