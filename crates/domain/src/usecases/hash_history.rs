//! Hash history core - keeps the hash fragment and the application location in sync
//!
//! The core reads locations out of the hash, writes accepted transitions back
//! into it, and filters hash-change signals so that only external changes
//! (back/forward, manual edits) are forwarded to the history controller.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    codec::QueryKeyMode,
    model::{Action, FinishOutcome, HashHistoryOptions, Location},
    ports::{
        HashChangeHandler, HashPlatform, HistoryBackend, HistoryController, KeyedStateStore,
        NoPopRecovery, PopRecovery, SubscriptionId,
    },
};

fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/')
}

/// Hash codec, change detection and self-notification suppression for one history
pub struct HashHistoryCore<P, S>
where
    P: HashPlatform + ?Sized,
    S: KeyedStateStore + ?Sized,
{
    platform: Rc<P>,
    store: Rc<S>,
    mode: QueryKeyMode,
    recovery: Box<dyn PopRecovery>,
    ignore_next_hash_change: Cell<bool>,
    last_hash_path: RefCell<Option<String>>,
}

impl<P, S> HashHistoryCore<P, S>
where
    P: HashPlatform + ?Sized,
    S: KeyedStateStore + ?Sized,
{
    pub fn new(platform: Rc<P>, store: Rc<S>, options: &HashHistoryOptions) -> Self {
        Self {
            platform,
            store,
            mode: QueryKeyMode::from_options(options),
            recovery: Box::new(NoPopRecovery),
            ignore_next_hash_change: Cell::new(false),
            last_hash_path: RefCell::new(None),
        }
    }

    /// Replace the offset computation used when a POP transition is rejected
    pub fn with_recovery(mut self, recovery: impl PopRecovery + 'static) -> Self {
        self.recovery = Box::new(recovery);
        self
    }

    /// Make sure the hash path starts with `/`
    ///
    /// Returns `false` when the hash had to be rewritten. The rewrite raises its
    /// own hash-change signal, so callers must not treat the current one as a
    /// transition.
    pub fn ensure_slash(&self) -> bool {
        let path = self.platform.hash_path();

        if is_absolute_path(&path) {
            return true;
        }

        debug!(path = %path, "Normalizing hash path");
        self.platform.replace_hash_path(&format!("/{}", path));

        false
    }

    /// Build a location from the current hash
    pub fn get_current_location(&self) -> Location {
        let path = self.platform.hash_path();

        match self.mode.codec() {
            Some(codec) => {
                let key = codec.extract(&path);
                let path = codec.strip(&path);
                let state = key.as_deref().and_then(|key| self.read_state(key));
                Location::from_path(&path, state, Action::Pop, key)
            }
            None => Location::from_path(&path, None, Action::Pop, None),
        }
    }

    fn read_state(&self, key: &str) -> Option<Value> {
        match self.store.read_state(key) {
            Ok(state) => state,
            Err(error) => {
                warn!(key = %key, error = %error, "Failed to read keyed state");
                None
            }
        }
    }

    /// Process one hash-change signal
    ///
    /// Returns the location to forward to the controller, or `None` when the
    /// signal was a normalization, a duplicate, or caused by our own write.
    pub fn handle_hash_change(&self) -> Option<Location> {
        if !self.ensure_slash() {
            return None;
        }

        let hash_path = self.platform.hash_path();
        if self.last_hash_path.borrow().as_deref() == Some(hash_path.as_str()) {
            debug!(path = %hash_path, "Ignoring unchanged hash");
            return None;
        }

        *self.last_hash_path.borrow_mut() = Some(hash_path);

        if self.ignore_next_hash_change.replace(false) {
            debug!("Ignoring self-inflicted hash change");
            return None;
        }

        Some(self.get_current_location())
    }

    /// Write an accepted transition into the hash
    pub fn finish_transition(&self, location: &Location) -> FinishOutcome {
        let action = location.action;

        if action == Action::Pop {
            return FinishOutcome::Ignored;
        }

        let mut path = location.path();

        let keyed = self.mode.codec().zip(location.key.as_deref());
        if let Some((codec, key)) = keyed {
            path = codec.append(&path, key);
        }

        if path == self.platform.hash_path() {
            warn!(
                action = %action,
                path = %path,
                "You cannot {} the same path using hash history",
                action
            );
            return FinishOutcome::Unchanged { action };
        }

        self.ignore_next_hash_change.set(true);

        if let Some((_, key)) = keyed {
            if let Err(error) = self.store.save_state(key, location.state.as_ref()) {
                warn!(key = %key, error = %error, "Failed to save keyed state");
            }
        }

        match action {
            Action::Push => self.platform.push_hash_path(&path),
            _ => self.platform.replace_hash_path(&path),
        }

        FinishOutcome::Written { action, path }
    }

    /// Try to restore the address bar after a rejected POP transition
    pub fn cancel_transition(&self, location: &Location) {
        if location.action != Action::Pop {
            return;
        }

        let n = self.recovery.offset_for(location);

        if n != 0 {
            self.ignore_next_hash_change.set(true);
            self.platform.go(n);
        }
    }
}

impl<P, S> HashHistoryCore<P, S>
where
    P: HashPlatform + ?Sized + 'static,
    S: KeyedStateStore + ?Sized + 'static,
{
    /// Normalize the initial hash and subscribe to hash-change signals
    ///
    /// Genuine external changes are forwarded to `controller.transition_to`.
    pub fn start_hash_change_listener<C>(self: &Rc<Self>, controller: &Rc<C>) -> SubscriptionId
    where
        C: HistoryController + ?Sized + 'static,
    {
        let core = Rc::downgrade(self);
        let controller = Rc::downgrade(controller);

        let handler: HashChangeHandler = Rc::new(move || {
            let (Some(core), Some(controller)) = (core.upgrade(), controller.upgrade()) else {
                return;
            };

            if let Some(location) = core.handle_hash_change() {
                controller.transition_to(location);
            }
        });

        self.ensure_slash();
        self.platform.subscribe(handler)
    }

    pub fn stop_hash_change_listener(&self, id: SubscriptionId) {
        self.platform.unsubscribe(id);
    }
}

impl<P, S> HistoryBackend for HashHistoryCore<P, S>
where
    P: HashPlatform + ?Sized,
    S: KeyedStateStore + ?Sized,
{
    fn get_current_location(&self) -> Location {
        HashHistoryCore::get_current_location(self)
    }

    fn finish_transition(&self, location: &Location) {
        HashHistoryCore::finish_transition(self, location);
    }

    fn cancel_transition(&self, location: &Location) {
        HashHistoryCore::cancel_transition(self, location);
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::{FakePlatform, FakeStore, RecordingController};
    use super::*;
    use serde_json::json;

    fn core_with(
        hash: &str,
        options: HashHistoryOptions,
    ) -> (Rc<FakePlatform>, Rc<FakeStore>, Rc<HashHistoryCore<FakePlatform, FakeStore>>) {
        let platform = FakePlatform::with_hash(hash);
        let store = Rc::new(FakeStore::default());
        let core = Rc::new(HashHistoryCore::new(platform.clone(), store.clone(), &options));
        (platform, store, core)
    }

    fn push(path: &str, key: Option<&str>, state: Option<Value>) -> Location {
        Location::from_path(path, state, Action::Push, key.map(str::to_string))
    }

    #[test]
    fn test_ensure_slash_prefixes_relative_path() {
        let (platform, _, core) = core_with("users", HashHistoryOptions::keyless());

        assert!(!core.ensure_slash());
        assert_eq!(platform.hash_path(), "/users");
        assert_eq!(*platform.replaces.borrow(), vec!["/users".to_string()]);
    }

    #[test]
    fn test_ensure_slash_handles_empty_hash() {
        let (platform, _, core) = core_with("", HashHistoryOptions::keyless());

        assert!(!core.ensure_slash());
        assert_eq!(platform.hash_path(), "/");
    }

    #[test]
    fn test_ensure_slash_is_noop_for_absolute_path() {
        let (platform, _, core) = core_with("/users", HashHistoryOptions::keyless());

        assert!(core.ensure_slash());
        assert!(platform.replaces.borrow().is_empty());
    }

    #[test]
    fn test_location_without_keying() {
        let (_, _, core) = core_with("/users/42", HashHistoryOptions::keyless());

        let location = core.get_current_location();
        assert_eq!(location.pathname, "/users/42");
        assert_eq!(location.search, "");
        assert_eq!(location.state, None);
        assert_eq!(location.key, None);
        assert_eq!(location.action, Action::Pop);
    }

    #[test]
    fn test_keyless_mode_keeps_query_parameter() {
        let (_, _, core) = core_with("/users/42?_k=ab12", HashHistoryOptions::keyless());

        let location = core.get_current_location();
        assert_eq!(location.search, "?_k=ab12");
        assert_eq!(location.key, None);
    }

    #[test]
    fn test_location_with_keyed_state() {
        let (_, store, core) = core_with("/users/42?_k=ab12", HashHistoryOptions::default());
        store
            .entries
            .borrow_mut()
            .insert("ab12".to_string(), json!({ "name": "x" }));

        let location = core.get_current_location();
        assert_eq!(location.pathname, "/users/42");
        assert_eq!(location.search, "");
        assert_eq!(location.state, Some(json!({ "name": "x" })));
        assert_eq!(location.key, Some("ab12".to_string()));
    }

    #[test]
    fn test_location_with_key_but_missing_state() {
        let (_, _, core) = core_with("/a?q=1&_k=zz", HashHistoryOptions::default());

        let location = core.get_current_location();
        assert_eq!(location.search, "?q=1");
        assert_eq!(location.key, Some("zz".to_string()));
        assert_eq!(location.state, None);
    }

    #[test]
    fn test_store_read_failure_is_a_miss() {
        let (_, store, core) = core_with("/a?_k=zz", HashHistoryOptions::default());
        store.fail_reads.set(true);

        let location = core.get_current_location();
        assert_eq!(location.key, Some("zz".to_string()));
        assert_eq!(location.state, None);
    }

    #[test]
    fn test_hash_change_forwards_external_change() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        platform.set_external("/b");
        let location = core.handle_hash_change().expect("forwarded");
        assert_eq!(location.pathname, "/b");
        assert_eq!(location.action, Action::Pop);
    }

    #[test]
    fn test_duplicate_hash_change_is_forwarded_once() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        platform.set_external("/b");
        assert!(core.handle_hash_change().is_some());
        assert!(core.handle_hash_change().is_none());
    }

    #[test]
    fn test_hash_change_needing_slash_is_not_forwarded() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        platform.set_external("b");
        assert!(core.handle_hash_change().is_none());
        assert_eq!(platform.hash_path(), "/b");

        // The rewrite raises a second signal, which is the real one
        let location = core.handle_hash_change().expect("forwarded");
        assert_eq!(location.pathname, "/b");
    }

    #[test]
    fn test_push_writes_hash_and_saves_state() {
        let (platform, store, core) = core_with("/a", HashHistoryOptions::default());

        let outcome = core.finish_transition(&push("/b?x=1", Some("k1"), Some(json!(7))));

        assert_eq!(
            outcome,
            FinishOutcome::Written {
                action: Action::Push,
                path: "/b?x=1&_k=k1".to_string()
            }
        );
        assert_eq!(*platform.pushes.borrow(), vec!["/b?x=1&_k=k1".to_string()]);
        assert_eq!(store.entries.borrow().get("k1"), Some(&json!(7)));
    }

    #[test]
    fn test_replace_rewrites_hash_without_entry() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        let location = Location::from_path("/c", None, Action::Replace, None);
        core.finish_transition(&location);

        assert!(platform.pushes.borrow().is_empty());
        assert_eq!(*platform.replaces.borrow(), vec!["/c".to_string()]);
    }

    #[test]
    fn test_pop_transition_is_not_written() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        let location = Location::from_path("/b", None, Action::Pop, None);
        assert_eq!(core.finish_transition(&location), FinishOutcome::Ignored);
        assert_eq!(platform.hash_path(), "/a");
    }

    #[test]
    fn test_same_path_push_is_skipped() {
        let (platform, store, core) = core_with("/a?_k=k1", HashHistoryOptions::default());

        let outcome = core.finish_transition(&push("/a", Some("k1"), Some(json!("s"))));

        assert_eq!(outcome, FinishOutcome::Unchanged { action: Action::Push });
        assert_eq!(platform.hash_path(), "/a?_k=k1");
        assert!(platform.pushes.borrow().is_empty());
        assert!(store.entries.borrow().is_empty());

        // No suppression was armed, so the next external change is forwarded
        platform.set_external("/z");
        assert!(core.handle_hash_change().is_some());
    }

    #[test]
    fn test_self_write_is_suppressed_once() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        core.finish_transition(&push("/b", None, None));
        assert!(core.handle_hash_change().is_none());

        platform.set_external("/c");
        let location = core.handle_hash_change().expect("forwarded");
        assert_eq!(location.pathname, "/c");
    }

    #[test]
    fn test_self_write_needing_slash_is_suppressed_once() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        core.finish_transition(&push("b", None, None));
        assert_eq!(platform.hash_path(), "b");

        // First signal rewrites to "/b", the second is our own write
        assert!(core.handle_hash_change().is_none());
        assert_eq!(platform.hash_path(), "/b");
        assert!(core.handle_hash_change().is_none());

        platform.set_external("/c");
        let location = core.handle_hash_change().expect("forwarded");
        assert_eq!(location.pathname, "/c");
    }

    #[test]
    fn test_cancel_transition_without_recovery_does_nothing() {
        let (platform, _, core) = core_with("/a", HashHistoryOptions::keyless());

        core.cancel_transition(&Location::from_path("/a", None, Action::Pop, None));
        assert!(platform.gos.borrow().is_empty());

        // Suppression stays disarmed
        platform.set_external("/b");
        assert!(core.handle_hash_change().is_some());
    }

    struct FixedRecovery(i32);

    impl PopRecovery for FixedRecovery {
        fn offset_for(&self, _location: &Location) -> i32 {
            self.0
        }
    }

    #[test]
    fn test_cancel_transition_uses_recovery_offset() {
        let platform = FakePlatform::with_hash("/a");
        let core = HashHistoryCore::new(
            platform.clone(),
            Rc::new(FakeStore::default()),
            &HashHistoryOptions::keyless(),
        )
        .with_recovery(FixedRecovery(1));

        core.cancel_transition(&Location::from_path("/a", None, Action::Push, None));
        assert!(platform.gos.borrow().is_empty());

        core.cancel_transition(&Location::from_path("/a", None, Action::Pop, None));
        assert_eq!(*platform.gos.borrow(), vec![1]);
    }

    #[test]
    fn test_listener_subscription_forwards_through_controller() {
        let (platform, _, core) = core_with("start", HashHistoryOptions::keyless());
        let controller = Rc::new(RecordingController::default());

        let id = core.start_hash_change_listener(&controller);
        assert_eq!(platform.hash_path(), "/start");

        // The normalization signal is the first observed hash, so it is forwarded
        platform.flush();
        platform.set_external("/next");
        platform.flush();

        let paths: Vec<_> = controller
            .transitions
            .borrow()
            .iter()
            .map(|location| location.pathname.clone())
            .collect();
        assert_eq!(paths, vec!["/start".to_string(), "/next".to_string()]);

        core.stop_hash_change_listener(id);
        assert_eq!(platform.handler_count(), 0);
    }
}
