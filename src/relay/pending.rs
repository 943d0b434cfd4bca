//! Coalescing buffer drained by the batch scheduler

use std::collections::HashMap;

/// Latest args per address, kept in first-seen order
#[derive(Debug, Default)]
pub struct PendingBuffer {
    index: HashMap<String, usize>,
    entries: Vec<(String, Vec<f64>)>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `args` for `address`, overwriting an earlier unflushed value
    pub fn insert(&mut self, address: &str, args: Vec<f64>) {
        match self.index.get(address) {
            Some(&slot) => self.entries[slot].1 = args,
            None => {
                self.index.insert(address.to_string(), self.entries.len());
                self.entries.push((address.to_string(), args));
            }
        }
    }

    /// Take every entry, leaving the buffer empty
    pub fn take(&mut self) -> Vec<(String, Vec<f64>)> {
        self.index.clear();
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
