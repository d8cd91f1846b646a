//! Status board implementations for hosts without a dashboard.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use autoshoot_traits::StatusBoard;

/// Discards writes and reads back nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusBoard;

impl StatusBoard for NullStatusBoard {
    fn set_status(&mut self, _key: &str, _value: &str) {}

    fn get_status(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Shared in-memory key/value board. Clones see the same entries, so one
/// handle can go into the controller while another is inspected or written
/// by some other party.
#[derive(Debug, Default, Clone)]
pub struct MemoryStatusBoard {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut v: Vec<_> = self
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        v.sort();
        v
    }
}

impl StatusBoard for MemoryStatusBoard {
    fn set_status(&mut self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn get_status(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}
