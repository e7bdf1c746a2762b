//! In-memory address bar with a session-entry stack
//!
//! Mirrors how a browser treats the fragment: assigning a hash creates an
//! entry, replacing rewrites the current one, `go` moves through entries, and
//! a hash-change signal is raised only when the visible hash actually changes.
//! Signals are queued and delivered by [`MemoryHashPlatform::flush_events`],
//! never from inside the call that caused them.

use hash_history_domain::{HashChangeHandler, HashPlatform, SubscriptionId};
use std::cell::{Cell, RefCell};
use tracing::trace;

pub struct MemoryHashPlatform {
    entries: RefCell<Vec<String>>,
    index: Cell<usize>,
    pending: Cell<usize>,
    handlers: RefCell<Vec<(SubscriptionId, HashChangeHandler)>>,
    next_id: Cell<u64>,
}

impl MemoryHashPlatform {
    /// Start a session on `initial` (a leading `#` is ignored)
    pub fn new(initial: &str) -> Self {
        Self {
            entries: RefCell::new(vec![strip_hash_prefix(initial).to_string()]),
            index: Cell::new(0),
            pending: Cell::new(0),
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Simulate the user typing a new hash into the address bar
    pub fn set_hash(&self, hash: &str) {
        self.push_hash_path(strip_hash_prefix(hash));
    }

    pub fn back(&self) {
        self.go(-1);
    }

    pub fn forward(&self) {
        self.go(1);
    }

    /// Session entries, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn index(&self) -> usize {
        self.index.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn pending_events(&self) -> usize {
        self.pending.get()
    }

    /// Deliver queued hash-change signals, including any raised while
    /// delivering. Returns the number of signals processed.
    pub fn flush_events(&self) -> usize {
        let mut delivered = 0;

        while self.pending.get() > 0 {
            self.pending.set(self.pending.get() - 1);
            delivered += 1;

            let handlers: Vec<HashChangeHandler> = self
                .handlers
                .borrow()
                .iter()
                .map(|(_, handler)| handler.clone())
                .collect();

            trace!(hash = %self.hash_path(), handlers = handlers.len(), "Delivering hashchange");

            for handler in handlers {
                handler();
            }
        }

        delivered
    }

    fn queue_if_changed(&self, previous: &str) {
        if previous != self.hash_path() {
            self.pending.set(self.pending.get() + 1);
        }
    }
}

impl Default for MemoryHashPlatform {
    fn default() -> Self {
        Self::new("")
    }
}

fn strip_hash_prefix(hash: &str) -> &str {
    hash.strip_prefix('#').unwrap_or(hash)
}

impl HashPlatform for MemoryHashPlatform {
    fn hash_path(&self) -> String {
        self.entries.borrow()[self.index.get()].clone()
    }

    fn push_hash_path(&self, path: &str) {
        let previous = self.hash_path();

        // Assigning the current hash again does not create an entry
        if previous == path {
            return;
        }

        let mut entries = self.entries.borrow_mut();
        let index = self.index.get();
        entries.truncate(index + 1);
        entries.push(path.to_string());
        self.index.set(index + 1);
        drop(entries);

        self.queue_if_changed(&previous);
    }

    fn replace_hash_path(&self, path: &str) {
        let previous = self.hash_path();
        self.entries.borrow_mut()[self.index.get()] = path.to_string();
        self.queue_if_changed(&previous);
    }

    fn go(&self, n: i32) {
        let previous = self.hash_path();
        let last = self.entries.borrow().len() - 1;
        let target = (self.index.get() as i64 + n as i64).clamp(0, last as i64) as usize;

        self.index.set(target);
        self.queue_if_changed(&previous);
    }

    fn subscribe(&self, handler: HashChangeHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers
            .borrow_mut()
            .retain(|(existing, _)| *existing != id);
    }
}
