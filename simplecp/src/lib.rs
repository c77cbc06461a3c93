//! SimpleCP Core - clipboard history and snippet engine
//!
//! A bounded, most-recent-first clipboard history, folders of named snippets,
//! content-type classification, and JSON persistence. Front ends drive
//! everything through [`Manager`]; [`ClipboardPoller`] feeds it in the background.

pub mod clipboard;
pub mod config;
pub mod content_detection;
pub mod history;
pub mod interface;
mod manager;
pub mod models;
pub mod observer;
pub mod persistence;
mod poller;
pub mod snippets;

pub use clipboard::{ClipboardAccess, ClipboardError, MemoryClipboard};
#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;
pub use config::Config;
pub use history::{HistoryDocument, HistoryStore};
pub use interface::*;
pub use manager::Manager;
pub use models::Item;
pub use observer::{Observer, ObserverError, ObserverHandle, StoreEvent};
pub use poller::{watch_until, ClipboardPoller};
pub use snippets::{SnippetDocument, SnippetFolder, SnippetStore};
