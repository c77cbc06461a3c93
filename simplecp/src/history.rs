//! Bounded clipboard history
//!
//! Most recent first. The store never exceeds `max_items` and never holds two
//! adjacent entries with the same content.
//!
//! Concurrency Model:
//! - All state sits behind one `parking_lot::Mutex`
//! - Observers are notified after the lock is released
//! - Readers get clones, never references into the store

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::interface::{DisplayFolder, SimpleCpError, SimpleCpResult};
use crate::models::Item;
use crate::observer::{Observer, ObserverHandle, ObserverRegistry, StoreEvent};

/// Persisted form of the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub max_items: usize,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug)]
struct HistoryState {
    items: VecDeque<Item>,
    max_items: usize,
    display_count: usize,
}

impl HistoryState {
    /// Drop tail entries beyond capacity, returning their ids
    fn evict_overflow(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.items.len() > self.max_items {
            if let Some(item) = self.items.pop_back() {
                evicted.push(item.id().to_string());
            }
        }
        evicted
    }
}

#[derive(Debug)]
pub struct HistoryStore {
    state: Mutex<HistoryState>,
    observers: ObserverRegistry,
}

impl HistoryStore {
    /// `max_items` is at least 1; `display_count` is clamped into `1..=max_items`
    pub fn new(max_items: usize, display_count: usize) -> Self {
        let max_items = max_items.max(1);
        Self {
            state: Mutex::new(HistoryState {
                items: VecDeque::with_capacity(max_items.min(1024)),
                max_items,
                display_count: display_count.clamp(1, max_items),
            }),
            observers: ObserverRegistry::default(),
        }
    }

    pub fn from_document(document: HistoryDocument, display_count: usize) -> Self {
        let store = Self::new(document.max_items, display_count);
        {
            let mut state = store.state.lock();
            state.items = normalize_items(document.items);
            state.evict_overflow();
        }
        store
    }

    pub fn to_document(&self) -> HistoryDocument {
        let state = self.state.lock();
        HistoryDocument {
            max_items: state.max_items,
            items: state.items.iter().cloned().collect(),
        }
    }

    /// Replace the contents with a loaded document, keeping this store's
    /// capacity and observers
    pub fn load_document(&self, document: HistoryDocument) {
        let count = {
            let mut state = self.state.lock();
            state.items = normalize_items(document.items);
            state.evict_overflow();
            state.items.len()
        };
        log::debug!("History loaded with {} items", count);
        self.observers
            .notify("history", &StoreEvent::HistoryLoaded { count });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn add_observer<O: Observer + 'static>(&self, observer: O) -> ObserverHandle {
        self.observers.register(observer)
    }

    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        self.observers.remove(handle)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert at the head. Returns false when the item was blank or repeats
    /// the current head's content.
    pub fn add(&self, item: Item) -> bool {
        if item.is_blank() {
            return false;
        }

        let event = {
            let mut state = self.state.lock();
            if state
                .items
                .front()
                .is_some_and(|head| head.content() == item.content())
            {
                log::debug!("Skipping duplicate of most recent clip");
                return false;
            }
            state.items.push_front(item.clone());
            let evicted = state.evict_overflow();
            StoreEvent::ItemAdded { item, evicted }
        };

        self.observers.notify("history", &event);
        true
    }

    /// Remove by id; false if the id is unknown
    pub fn delete(&self, id: &str) -> bool {
        let removed = {
            let mut state = self.state.lock();
            match state.items.iter().position(|item| item.id() == id) {
                Some(index) => state.items.remove(index).is_some(),
                None => false,
            }
        };

        if removed {
            self.observers
                .notify("history", &StoreEvent::ItemDeleted { id: id.to_string() });
        }
        removed
    }

    pub fn clear(&self) {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.items.len();
            state.items.clear();
            removed
        };
        self.observers
            .notify("history", &StoreEvent::Cleared { removed });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// 0 is the most recent item
    pub fn get(&self, index: usize) -> SimpleCpResult<Item> {
        let state = self.state.lock();
        state
            .items
            .get(index)
            .cloned()
            .ok_or(SimpleCpError::IndexOutOfRange {
                index,
                len: state.items.len(),
            })
    }

    pub fn get_by_id(&self, id: &str) -> Option<Item> {
        self.state
            .lock()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Most recent first, optionally capped at `limit`
    pub fn all(&self, limit: Option<usize>) -> Vec<Item> {
        let state = self.state.lock();
        let take = limit.unwrap_or(state.items.len());
        state.items.iter().take(take).cloned().collect()
    }

    /// The first `display_count` items
    pub fn recent(&self) -> Vec<Item> {
        let state = self.state.lock();
        state.items.iter().take(state.display_count).cloned().collect()
    }

    /// Split the whole history into pages of `display_count` items
    pub fn display_folders(&self) -> Vec<DisplayFolder> {
        let state = self.state.lock();
        let page = state.display_count;
        let items: Vec<&Item> = state.items.iter().collect();

        items
            .chunks(page)
            .enumerate()
            .map(|(i, chunk)| {
                let start_index = i * page;
                let end_index = start_index + chunk.len();
                DisplayFolder {
                    name: format!("{}-{}", start_index + 1, end_index),
                    start_index,
                    end_index,
                    count: chunk.len(),
                    items: chunk.iter().map(|item| (*item).clone()).collect(),
                }
            })
            .collect()
    }

    /// Case-insensitive substring match on content, in store order
    pub fn search(&self, query: &str) -> Vec<Item> {
        let needle = query.to_lowercase();
        self.state
            .lock()
            .items
            .iter()
            .filter(|item| item.content_contains(&needle))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_items(&self) -> usize {
        self.state.lock().max_items
    }

    pub fn display_count(&self) -> usize {
        self.state.lock().display_count
    }
}

/// Apply the `add` rules to loaded items: drop blank entries and any entry
/// repeating the content of the one kept before it
fn normalize_items(items: Vec<Item>) -> VecDeque<Item> {
    let total = items.len();
    let mut kept: VecDeque<Item> = VecDeque::with_capacity(total);
    for item in items {
        if item.is_blank() {
            continue;
        }
        if kept.back().is_some_and(|prev| prev.content() == item.content()) {
            continue;
        }
        kept.push_back(item);
    }
    if kept.len() != total {
        log::warn!(
            "Dropped {} blank or repeated history entries while loading",
            total - kept.len()
        );
    }
    kept
}
