//! Store change notification
//!
//! Stores publish a [`StoreEvent`] after every successful mutation. Delivery is
//! isolated per observer: an observer that returns an error or panics is logged
//! and skipped, and never affects the mutation or the remaining observers.

use parking_lot::RwLock;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::Item;

/// Error an observer may report back; it is logged and dropped
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// A mutation that already happened, with its payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    ItemAdded { item: Item, evicted: Vec<String> },
    ItemDeleted { id: String },
    Cleared { removed: usize },
    HistoryLoaded { count: usize },
    FolderCreated { folder: String },
    SnippetAdded { folder: String, item: Item },
    SnippetUpdated { folder: String, item: Item },
    SnippetDeleted { folder: String, id: String },
    SnippetMoved { from: String, to: String, id: String },
    FolderRenamed { from: String, to: String },
    FolderDeleted { folder: String, removed: Vec<String> },
    SnippetsLoaded { folders: usize },
}

impl StoreEvent {
    /// Stable event name, e.g. `item_added`
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::ItemAdded { .. } => "item_added",
            StoreEvent::ItemDeleted { .. } => "item_deleted",
            StoreEvent::Cleared { .. } => "cleared",
            StoreEvent::HistoryLoaded { .. } => "history_loaded",
            StoreEvent::FolderCreated { .. } => "folder_created",
            StoreEvent::SnippetAdded { .. } => "snippet_added",
            StoreEvent::SnippetUpdated { .. } => "snippet_updated",
            StoreEvent::SnippetDeleted { .. } => "snippet_deleted",
            StoreEvent::SnippetMoved { .. } => "snippet_moved",
            StoreEvent::FolderRenamed { .. } => "folder_renamed",
            StoreEvent::FolderDeleted { .. } => "folder_deleted",
            StoreEvent::SnippetsLoaded { .. } => "snippets_loaded",
        }
    }
}

/// Receiver of store events
pub trait Observer: Send + Sync {
    fn notify(&self, event: &StoreEvent) -> Result<(), ObserverError>;
}

impl<F> Observer for F
where
    F: Fn(&StoreEvent) -> Result<(), ObserverError> + Send + Sync,
{
    fn notify(&self, event: &StoreEvent) -> Result<(), ObserverError> {
        self(event)
    }
}

/// Returned on registration; pass it back to remove the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

/// Registered observers of one store
#[derive(Default)]
pub struct ObserverRegistry {
    next_handle: AtomicU64,
    observers: RwLock<Vec<(ObserverHandle, Arc<dyn Observer>)>>,
}

impl ObserverRegistry {
    pub fn register<O: Observer + 'static>(&self, observer: O) -> ObserverHandle {
        let handle = ObserverHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((handle, Arc::new(observer)));
        handle
    }

    /// Returns false if the handle was not registered
    pub fn remove(&self, handle: ObserverHandle) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(h, _)| *h != handle);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every observer. Must be called without holding the
    /// store lock so observers may read the store.
    pub fn notify(&self, source: &'static str, event: &StoreEvent) {
        let observers: Vec<(ObserverHandle, Arc<dyn Observer>)> = self
            .observers
            .read()
            .iter()
            .map(|(handle, observer)| (*handle, Arc::clone(observer)))
            .collect();

        for (handle, observer) in observers {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.notify(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!(
                    "{} observer {:?} failed on {}: {}",
                    source,
                    handle,
                    event.name(),
                    e
                ),
                Err(payload) => log::error!(
                    "{} observer {:?} panicked on {}: {}",
                    source,
                    handle,
                    event.name(),
                    panic_message(payload.as_ref())
                ),
            }
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
