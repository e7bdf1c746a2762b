//! Hash history factory - wires the core into a history controller
//!
//! The hash-change subscription is reference counted: it is attached while at
//! least one listener is registered and detached when the last one leaves.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::{
    model::{HashHistoryOptions, Location},
    ports::{
        HashPlatform, HistoryBackend, HistoryController, KeyedStateStore, LocationListener,
        SubscriptionId, Unlisten,
    },
    usecases::hash_history::HashHistoryCore,
};

/// Build a hash history around the controller produced by `build_controller`
///
/// The controller receives the core as its [`HistoryBackend`].
pub fn create_hash_history<P, S, C, F>(
    platform: Rc<P>,
    store: Rc<S>,
    options: &HashHistoryOptions,
    build_controller: F,
) -> HashHistory<C, P, S>
where
    P: HashPlatform + ?Sized + 'static,
    S: KeyedStateStore + ?Sized + 'static,
    C: HistoryController + 'static,
    F: FnOnce(Rc<dyn HistoryBackend>) -> C,
{
    HashHistory::new(HashHistoryCore::new(platform, store, options), build_controller)
}

struct ListenerRegistry {
    count: Cell<usize>,
    subscription: Cell<Option<SubscriptionId>>,
    detach: Box<dyn Fn(SubscriptionId)>,
}

impl ListenerRegistry {
    fn release(&self) {
        let count = self.count.get().saturating_sub(1);
        self.count.set(count);

        if count == 0 {
            if let Some(id) = self.subscription.take() {
                debug!("Detaching hash change listener");
                (self.detach)(id);
            }
        }
    }
}

/// Hash-backed history handed to application code
pub struct HashHistory<C, P, S>
where
    C: HistoryController,
    P: HashPlatform + ?Sized,
    S: KeyedStateStore + ?Sized,
{
    core: Rc<HashHistoryCore<P, S>>,
    controller: Rc<C>,
    registry: Rc<ListenerRegistry>,
}

impl<C, P, S> HashHistory<C, P, S>
where
    C: HistoryController + 'static,
    P: HashPlatform + ?Sized + 'static,
    S: KeyedStateStore + ?Sized + 'static,
{
    pub fn new<F>(core: HashHistoryCore<P, S>, build_controller: F) -> Self
    where
        F: FnOnce(Rc<dyn HistoryBackend>) -> C,
    {
        let core = Rc::new(core);
        let backend: Rc<dyn HistoryBackend> = core.clone();
        let controller = Rc::new(build_controller(backend));

        let detach_core = core.clone();
        let registry = Rc::new(ListenerRegistry {
            count: Cell::new(0),
            subscription: Cell::new(None),
            detach: Box::new(move |id| detach_core.stop_hash_change_listener(id)),
        });

        Self {
            core,
            controller,
            registry,
        }
    }

    /// Register a location listener
    ///
    /// The first listener attaches the hash-change subscription. Dropping (or
    /// calling [`ListenerHandle::unlisten`] on) the last handle detaches it.
    pub fn listen(&self, listener: LocationListener) -> ListenerHandle {
        let count = self.registry.count.get() + 1;
        self.registry.count.set(count);

        if count == 1 {
            debug!("Attaching hash change listener");
            let id = self.core.start_hash_change_listener(&self.controller);
            self.registry.subscription.set(Some(id));
        }

        let unlisten = self.controller.listen(listener);

        ListenerHandle {
            unlisten: Some(unlisten),
            registry: self.registry.clone(),
        }
    }

    pub fn controller(&self) -> &Rc<C> {
        &self.controller
    }

    pub fn get_current_location(&self) -> Location {
        self.core.get_current_location()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.count.get()
    }

    /// Whether the hash-change subscription is attached
    pub fn is_listening(&self) -> bool {
        self.registry.subscription.get().is_some()
    }
}

/// Keeps a listener registered until unlistened or dropped
#[must_use = "dropping the handle removes the listener"]
pub struct ListenerHandle {
    unlisten: Option<Unlisten>,
    registry: Rc<ListenerRegistry>,
}

impl ListenerHandle {
    pub fn unlisten(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unlisten) = self.unlisten.take() {
            unlisten();
            self.registry.release();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.release();
    }
}
