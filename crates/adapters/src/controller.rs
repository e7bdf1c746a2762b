//! Basic history controller
//!
//! Sequences PUSH/REPLACE/POP transitions against a [`HistoryBackend`], asks an
//! optional confirmation hook before accepting them, and fans each accepted
//! location out to every registered listener.

use hash_history_domain::{
    Action, HashHistoryOptions, HashPlatform, HistoryBackend, HistoryController, Location,
    LocationListener, Unlisten,
};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;
use uuid::Uuid;

/// Length of generated state keys
pub const KEY_LENGTH: usize = 6;

/// Decides whether a pending transition may proceed
pub type TransitionConfirmation = Rc<dyn Fn(&Location) -> bool>;

type Listeners = Rc<RefCell<Vec<(u64, LocationListener)>>>;

/// Generate a short lowercase alphanumeric state key
pub fn create_key() -> String {
    Uuid::new_v4().simple().to_string()[..KEY_LENGTH].to_string()
}

pub struct BasicHistoryController<P>
where
    P: HashPlatform + ?Sized,
{
    backend: Rc<dyn HistoryBackend>,
    platform: Rc<P>,
    keyed: bool,
    location: RefCell<Option<Location>>,
    listeners: Listeners,
    next_listener_id: Cell<u64>,
    confirmation: RefCell<Option<TransitionConfirmation>>,
}

impl<P> BasicHistoryController<P>
where
    P: HashPlatform + ?Sized,
{
    pub fn new(
        backend: Rc<dyn HistoryBackend>,
        platform: Rc<P>,
        options: &HashHistoryOptions,
    ) -> Self {
        Self {
            backend,
            platform,
            keyed: options.query_key().is_some(),
            location: RefCell::new(None),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener_id: Cell::new(0),
            confirmation: RefCell::new(None),
        }
    }

    /// Last accepted location, if any transition or listener has run yet
    pub fn location(&self) -> Option<Location> {
        self.location.borrow().clone()
    }

    pub fn push(&self, path: &str, state: Option<Value>) {
        self.transition_to(self.create_location(path, state, Action::Push));
    }

    pub fn replace(&self, path: &str, state: Option<Value>) {
        self.transition_to(self.create_location(path, state, Action::Replace));
    }

    pub fn go(&self, n: i32) {
        self.platform.go(n);
    }

    pub fn go_back(&self) {
        self.go(-1);
    }

    pub fn go_forward(&self) {
        self.go(1);
    }

    /// Require `confirmation` to approve every subsequent transition
    pub fn block(&self, confirmation: TransitionConfirmation) {
        *self.confirmation.borrow_mut() = Some(confirmation);
    }

    pub fn unblock(&self) {
        *self.confirmation.borrow_mut() = None;
    }

    fn create_location(&self, path: &str, state: Option<Value>, action: Action) -> Location {
        let key = self.keyed.then(create_key);
        Location::from_path(path, state, action, key)
    }

    fn confirm(&self, location: &Location) -> bool {
        // The hook may block/unblock, so it runs without the borrow held
        let confirmation = self.confirmation.borrow().clone();
        match confirmation {
            Some(confirmation) => confirmation(location),
            None => true,
        }
    }

    fn update_location(&self, location: Location) {
        *self.location.borrow_mut() = Some(location.clone());

        let listeners: Vec<LocationListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&location);
        }
    }
}

impl<P> HistoryController for BasicHistoryController<P>
where
    P: HashPlatform + ?Sized,
{
    fn transition_to(&self, location: Location) {
        if !self.confirm(&location) {
            debug!(action = %location.action, path = %location.path(), "Transition rejected");
            self.backend.cancel_transition(&location);
            return;
        }

        self.backend.finish_transition(&location);
        self.update_location(location);
    }

    fn listen(&self, listener: LocationListener) -> Unlisten {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener.clone()));

        let current = self.location.borrow().clone();
        let current = current.unwrap_or_else(|| {
            let location = self.backend.get_current_location();
            *self.location.borrow_mut() = Some(location.clone());
            location
        });
        listener(&current);

        let listeners = self.listeners.clone();
        Box::new(move || {
            listeners
                .borrow_mut()
                .retain(|(existing, _)| *existing != id);
        })
    }
}
