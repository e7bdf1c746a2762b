//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the hash-history core and the
//! hosting platform, the keyed-state storage medium, and the generic history
//! controller. Everything here is single-threaded: handlers are `Rc` closures
//! and calls run to completion before the next event is delivered.

use serde_json::Value;
use std::rc::Rc;
use thiserror::Error;

use crate::model::Location;

/// Callback invoked when the platform reports a hash change
pub type HashChangeHandler = Rc<dyn Fn()>;

/// Identifies one hash-change subscription on a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Port for the address bar and session navigation primitives
pub trait HashPlatform {
    /// Current fragment content, without the leading `#`
    fn hash_path(&self) -> String;

    /// Assign the hash, creating a new session entry
    fn push_hash_path(&self, path: &str);

    /// Rewrite the hash without creating a session entry
    fn replace_hash_path(&self, path: &str);

    /// Move the session position by a relative offset
    fn go(&self, n: i32);

    /// Subscribe to hash-change signals
    fn subscribe(&self, handler: HashChangeHandler) -> SubscriptionId;

    /// Drop a hash-change subscription
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Error type for keyed state store operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Port for persisting opaque state under a short key
pub trait KeyedStateStore {
    /// Read the state stored under `key`
    fn read_state(&self, key: &str) -> Result<Option<Value>, StateError>;

    /// Store `state` under `key`; `None` removes the entry
    fn save_state(&self, key: &str, state: Option<&Value>) -> Result<(), StateError>;
}

/// Collaborators the hash history injects into the history controller
pub trait HistoryBackend {
    /// Derive a location from the current hash
    fn get_current_location(&self) -> Location;

    /// Reflect an accepted transition in the hash
    fn finish_transition(&self, location: &Location);

    /// Undo the effects of a rejected transition
    fn cancel_transition(&self, location: &Location);
}

/// Callback notified with each new location
pub type LocationListener = Rc<dyn Fn(&Location)>;

/// Removes a listener registered on a [`HistoryController`]
pub type Unlisten = Box<dyn FnOnce()>;

/// Port for the generic history controller (transition sequencing and fan-out)
pub trait HistoryController {
    /// Begin a transition to `location`
    fn transition_to(&self, location: Location);

    /// Register a listener for location changes
    fn listen(&self, listener: LocationListener) -> Unlisten;
}

/// Offset that undoes a rejected POP transition
///
/// Returning `0` leaves the address bar where the platform put it.
pub trait PopRecovery {
    fn offset_for(&self, location: &Location) -> i32;
}

/// Recovery that never moves the session position
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPopRecovery;

impl PopRecovery for NoPopRecovery {
    fn offset_for(&self, _location: &Location) -> i32 {
        0
    }
}
