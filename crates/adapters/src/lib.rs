//! hash-history adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `platform`: In-memory address bar with session entries and queued signals
//! - `state`: In-memory and JSON-file keyed state stores
//! - `controller`: A basic history controller for driving the hash history

pub mod controller;
pub mod platform;
mod state_file;
mod state_memory;

/// Re-exports for keyed state adapters
pub mod state {
    pub use crate::state_file::JsonFileStateStore;
    pub use crate::state_memory::InMemoryStateStore;
}

pub use controller::BasicHistoryController;
pub use platform::MemoryHashPlatform;
