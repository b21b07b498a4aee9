//! Selection bookkeeping for the kiosk grid.
//!
//! Visitors pick up to three items; each pick is bound to one of three fixed
//! display slots. Slot indices are assigned lowest-free-first and freed when
//! a pick is toggled off, so slot 0 is always reused before slot 1.

/// Number of fixed display slots (and the selection capacity).
pub const SLOT_COUNT: usize = 3;

/// One chosen item bound to a display slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub key: String,
    pub slot: usize,
}

/// Ordered set of selected items, capacity [`SLOT_COUNT`], keys unique.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    entries: Vec<SelectionEntry>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle an item by key: remove it if selected (freeing its slot),
    /// otherwise add it to the lowest unused slot. A fourth distinct pick is
    /// rejected silently.
    ///
    /// Returns true if the set changed.
    pub fn toggle_item(&mut self, key: &str) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.key == key) {
            self.entries.remove(pos);
            return true;
        }

        if self.entries.len() >= SLOT_COUNT {
            return false;
        }

        // Capacity check above guarantees a free slot exists
        if let Some(slot) = (0..SLOT_COUNT).find(|s| self.slot_key(*s).is_none()) {
            self.entries.push(SelectionEntry {
                key: key.to_string(),
                slot,
            });
            return true;
        }

        false
    }

    /// Clear the given slot if occupied, returning the removed key.
    /// Slots can only be cleared this way, never filled.
    pub fn toggle_slot(&mut self, slot: usize) -> Option<String> {
        let pos = self.entries.iter().position(|e| e.slot == slot)?;
        Some(self.entries.remove(pos).key)
    }

    /// True iff all three slots are taken; gates the submit action.
    pub fn is_full(&self) -> bool {
        self.entries.len() == SLOT_COUNT
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Key occupying the given slot, if any.
    pub fn slot_key(&self, slot: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.slot == slot)
            .map(|e| e.key.as_str())
    }

    /// The three selected keys in slot order, only when the set is full.
    pub fn keys(&self) -> Option<[String; 3]> {
        if !self.is_full() {
            return None;
        }
        let mut keys: [String; 3] = Default::default();
        for entry in &self.entries {
            keys[entry.slot] = entry.key.clone();
        }
        Some(keys)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
