//! Application use cases / business logic

pub mod factory;
pub mod hash_history;

pub use factory::{HashHistory, ListenerHandle, create_hash_history};
pub use hash_history::HashHistoryCore;
