//! Bounded message history used to backfill new WebSocket clients

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::types::ControlMessage;

/// Fixed-capacity FIFO of the most recent broadcast messages
pub struct MessageHistory {
    capacity: usize,
    messages: Mutex<VecDeque<ControlMessage>>,
}

impl MessageHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append to the tail, evicting from the head once full
    pub fn append(&self, msg: ControlMessage) {
        if self.capacity == 0 {
            return;
        }
        let mut messages = self.messages.lock();
        while messages.len() >= self.capacity {
            messages.pop_front();
        }
        messages.push_back(msg);
    }

    /// Copy of the current contents in insertion order
    pub fn snapshot(&self) -> Vec<ControlMessage> {
        self.messages.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
