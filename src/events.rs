//! Change notification for mutating drive operations
//!
//! One channel per drive, many subscribers. Delivery is synchronous and in
//! registration order; each listener runs isolated so a panicking observer
//! cannot keep later ones from seeing the event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::types::ContentModel;

/// A completed mutating operation and its before/after state
///
/// Emitted once per successful mutation, never for reads, and only after the
/// server's response body passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// An entry was created (`new_untitled` or `copy`)
    New { model: ContentModel },

    /// An entry was deleted; only its old path survives
    Delete { path: String },

    /// An entry moved from `old_path` to the path in `model`
    Rename {
        old_path: String,
        model: ContentModel,
    },

    /// An entry's content was written
    Save { model: ContentModel },
}

impl ChangeEvent {
    /// Tag of the variant, for logging and filtering
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::New { .. } => "new",
            ChangeEvent::Delete { .. } => "delete",
            ChangeEvent::Rename { .. } => "rename",
            ChangeEvent::Save { .. } => "save",
        }
    }
}

/// Handle identifying one subscribed listener
pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Observer list backing a drive's change channel
///
/// Fire-and-forget: emitting walks the current subscribers and returns; no
/// bookkeeping of what any listener did with the event.
#[derive(Default)]
pub struct ChangeListeners {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns the id to unsubscribe with
    pub fn subscribe(&self, listener: Box<dyn Fn(&ChangeEvent) + Send + Sync>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap()
            .push((id, Arc::from(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was unknown.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Deliver an event to every subscriber, in registration order
    ///
    /// The listener list is snapshotted before delivery, so a listener that
    /// subscribes or unsubscribes re-entrantly affects the next emission,
    /// not this one.
    pub fn emit(&self, event: &ChangeEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(kind = event.kind(), "change listener panicked");
            }
        }
    }

    /// Drop all subscribers
    pub fn clear(&self) {
        self.listeners.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
