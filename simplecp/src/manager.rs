//! Manager - entry point tying the clipboard, both stores and the data files together
//!
//! Front ends (the CLI, a routing layer) talk to the manager only. It owns the
//! debounce state for polling, cross-store queries, and persistence.
//!
//! Concurrency Model:
//! - Each store guards itself; no manager call holds both store locks at once
//! - `last_observed` has its own lock, taken only around the compare-and-record
//! - Saves snapshot a store under its lock and write the copy afterwards

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::clipboard::{ClipboardAccess, ClipboardError};
use crate::config::Config;
use crate::history::{HistoryDocument, HistoryStore};
use crate::interface::{
    DisplayFolder, RenameResult, SearchResults, SimpleCpResult, SnippetError, SnippetUpdate,
    Stats, Status,
};
use crate::models::Item;
use crate::persistence::{read_json, write_json_atomic};
use crate::snippets::{SnippetDocument, SnippetFolder, SnippetStore};

pub struct Manager {
    config: Config,
    history: HistoryStore,
    snippets: SnippetStore,
    clipboard: Arc<dyn ClipboardAccess>,
    /// Last clipboard value seen by the polling path
    last_observed: Mutex<Option<String>>,
    last_check: Mutex<Option<DateTime<Utc>>>,
}

impl Manager {
    /// Build a manager with empty stores
    pub fn new(config: Config, clipboard: Arc<dyn ClipboardAccess>) -> SimpleCpResult<Self> {
        config.validate()?;
        Ok(Self {
            history: HistoryStore::new(config.max_history, config.display_count),
            snippets: SnippetStore::new(config.folder_names),
            config,
            clipboard,
            last_observed: Mutex::new(None),
            last_check: Mutex::new(None),
        })
    }

    /// Build a manager and load both stores from the configured data files
    pub fn open(config: Config, clipboard: Arc<dyn ClipboardAccess>) -> SimpleCpResult<Self> {
        let manager = Self::new(config, clipboard)?;
        manager.load_stores()?;
        Ok(manager)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn snippets(&self) -> &SnippetStore {
        &self.snippets
    }

    /// One-line preview at the configured width
    pub fn preview(&self, item: &Item) -> String {
        item.display(self.config.display_length)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Clipboard
    // ═══════════════════════════════════════════════════════════════════════════

    /// Poll the clipboard once. Returns the new history item if the clipboard
    /// changed since the last poll and the value was inserted.
    pub fn try_check(&self) -> Result<Option<Item>, ClipboardError> {
        let text = self.clipboard.read()?;
        *self.last_check.lock() = Some(Utc::now());

        {
            let mut last = self.last_observed.lock();
            if last.as_deref() == Some(text.as_str()) {
                return Ok(None);
            }
            *last = Some(text.clone());
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        let item = Item::new(text);
        if self.history.add(item.clone()) {
            log::debug!("Captured clip {} ({})", item.id(), item.content_type());
            Ok(Some(item))
        } else {
            Ok(None)
        }
    }

    /// Like [`Manager::try_check`], with clipboard failures logged and dropped
    pub fn check(&self) -> Option<Item> {
        match self.try_check() {
            Ok(item) => item,
            Err(e) => {
                log::warn!("Clipboard check failed: {}", e);
                None
            }
        }
    }

    /// Insert text into history directly, skipping the polling debounce.
    /// Returns `None` for blank text or a repeat of the most recent clip.
    pub fn add_clip(&self, content: &str) -> Option<Item> {
        if content.trim().is_empty() {
            return None;
        }
        let item = Item::new(content);
        self.history.add(item.clone()).then_some(item)
    }

    /// Write a history item or snippet back to the clipboard.
    /// Returns `Ok(false)` when no item has that id.
    pub fn copy_to_clipboard(&self, id: &str) -> Result<bool, ClipboardError> {
        let content = match self.history.get_by_id(id) {
            Some(item) => item.content().to_string(),
            None => match self.snippets.find_by_id(id) {
                Some(hit) => hit.item.content().to_string(),
                None => return Ok(false),
            },
        };

        self.clipboard.write(&content)?;
        // Our own write must not come back as a new clip on the next poll
        *self.last_observed.lock() = Some(content);
        Ok(true)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Snippets
    // ═══════════════════════════════════════════════════════════════════════════

    /// Copy a history item into a folder as a new named snippet.
    /// `Ok(None)` when the history item does not exist; history is untouched.
    pub fn save_as_snippet(
        &self,
        clip_id: &str,
        name: &str,
        folder: &str,
        tags: Vec<String>,
    ) -> Result<Option<Item>, SnippetError> {
        let Some(clip) = self.history.get_by_id(clip_id) else {
            return Ok(None);
        };
        let snippet = clip.to_snippet(name, tags);
        self.snippets.add_snippet(folder, snippet.clone())?;
        Ok(Some(snippet))
    }

    pub fn create_snippet(
        &self,
        content: &str,
        folder: &str,
        name: &str,
        tags: Vec<String>,
    ) -> Result<Item, SnippetError> {
        if content.trim().is_empty() {
            return Err(SnippetError::EmptyContent);
        }
        let snippet = Item::new(content).with_name(name).with_tags(tags);
        self.snippets.add_snippet(folder, snippet.clone())?;
        Ok(snippet)
    }

    pub fn update_snippet(
        &self,
        folder: &str,
        id: &str,
        update: SnippetUpdate,
    ) -> Result<Item, SnippetError> {
        self.snippets.update_snippet(folder, id, update)
    }

    pub fn delete_snippet(&self, folder: &str, id: &str) -> bool {
        self.snippets.delete_snippet(folder, id)
    }

    pub fn move_snippet(&self, from_folder: &str, to_folder: &str, id: &str) -> Result<(), SnippetError> {
        self.snippets.move_snippet(from_folder, to_folder, id)
    }

    pub fn create_folder(&self, name: &str) -> Result<(), SnippetError> {
        self.snippets.create_folder(name)
    }

    pub fn rename_folder(&self, old_name: &str, new_name: &str) -> RenameResult {
        self.snippets.rename_folder(old_name, new_name)
    }

    pub fn delete_folder(&self, name: &str) -> bool {
        self.snippets.delete_folder(name)
    }

    pub fn folder_names(&self) -> Vec<String> {
        self.snippets.folder_names()
    }

    pub fn folder(&self, name: &str) -> Vec<Item> {
        self.snippets.folder(name)
    }

    pub fn all_snippets(&self) -> Vec<SnippetFolder> {
        self.snippets.all_snippets()
    }

    /// Every folder with its snippets, in the persisted document shape
    pub fn export_snippets(&self) -> SnippetDocument {
        self.snippets.to_document()
    }

    /// Merge a document into the existing folders and return how many
    /// snippets were added. Snippets whose id is already stored are skipped,
    /// so importing the same export twice adds nothing the second time.
    ///
    /// The whole document is checked first; a blank folder name or blank
    /// snippet content rejects it without changing anything.
    pub fn import_snippets(&self, document: SnippetDocument) -> Result<usize, SnippetError> {
        for folder in &document.folders {
            if folder.name.trim().is_empty() {
                return Err(SnippetError::EmptyFolderName);
            }
            if folder.items.iter().any(Item::is_blank) {
                return Err(SnippetError::EmptyContent);
            }
        }

        let mut imported = 0;
        for folder in document.folders {
            if folder.items.is_empty() {
                match self.snippets.create_folder(&folder.name) {
                    Ok(()) | Err(SnippetError::FolderExists(_)) => {}
                    Err(e) => return Err(e),
                }
                continue;
            }
            for item in folder.items {
                match self.snippets.add_snippet(&folder.name, item) {
                    Ok(()) => imported += 1,
                    Err(SnippetError::DuplicateId(id)) => {
                        log::debug!("Skipping snippet {} already present", id)
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        log::info!("Imported {} snippets", imported);
        Ok(imported)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // History
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn history_items(&self, limit: Option<usize>) -> Vec<Item> {
        self.history.all(limit)
    }

    pub fn recent_history(&self) -> Vec<Item> {
        self.history.recent()
    }

    pub fn history_folders(&self) -> Vec<DisplayFolder> {
        self.history.display_folders()
    }

    pub fn delete_history_item(&self, id: &str) -> bool {
        self.history.delete(id)
    }

    pub fn clear_history(&self) {
        self.history.clear()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn search_all(&self, query: &str) -> SearchResults {
        SearchResults {
            history: self.history.search(query),
            snippets: self.snippets.search(query),
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            history_count: self.history.len(),
            snippet_count: self.snippets.len(),
            folder_count: self.snippets.folder_count(),
            max_history: self.history.max_items(),
        }
    }

    pub fn status(&self) -> Status {
        Status {
            stats: self.stats(),
            data_dir: self.config.data_dir.clone(),
            check_interval_ms: self.config.check_interval_ms,
            last_check: *self.last_check.lock(),
            last_capture: self.history.all(Some(1)).first().map(Item::timestamp),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Persistence
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn save_history(&self) -> SimpleCpResult<()> {
        let document = self.history.to_document();
        let path = self.config.history_path();
        write_json_atomic(&path, &document)?;
        log::info!("Saved {} history items to {}", document.items.len(), path.display());
        Ok(())
    }

    pub fn save_snippets(&self) -> SimpleCpResult<()> {
        let document = self.snippets.to_document();
        let path = self.config.snippets_path();
        write_json_atomic(&path, &document)?;
        log::info!("Saved {} snippet folders to {}", document.folders.len(), path.display());
        Ok(())
    }

    /// Write both documents. Each file is replaced atomically; the two are
    /// independent, so a failure on the second leaves the first saved.
    pub fn save_stores(&self) -> SimpleCpResult<()> {
        self.save_history()?;
        self.save_snippets()
    }

    /// Replace both stores with the data files. Missing files leave a store
    /// empty; a malformed file is an error and leaves that store untouched.
    pub fn load_stores(&self) -> SimpleCpResult<()> {
        let history_path = self.config.history_path();
        match read_json::<HistoryDocument>(&history_path)? {
            Some(document) => {
                log::info!("Loaded {} history items from {}", document.items.len(), history_path.display());
                self.history.load_document(document);
            }
            None => {
                log::info!("No history at {}, starting empty", history_path.display());
                self.history.load_document(HistoryDocument {
                    max_items: self.history.max_items(),
                    items: Vec::new(),
                });
            }
        }

        let snippets_path = self.config.snippets_path();
        match read_json::<SnippetDocument>(&snippets_path)? {
            Some(document) => {
                log::info!("Loaded {} snippet folders from {}", document.folders.len(), snippets_path.display());
                self.snippets.load_document(document);
            }
            None => {
                log::info!("No snippets at {}, starting empty", snippets_path.display());
                self.snippets.load_document(SnippetDocument::default());
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("config", &self.config)
            .field("history", &self.history.len())
            .field("snippets", &self.snippets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::interface::ContentType;

    fn manager_with(clipboard: Arc<MemoryClipboard>) -> Manager {
        Manager::new(Config::default(), clipboard).unwrap()
    }

    #[test]
    fn test_check_captures_changes_once() {
        let clipboard = Arc::new(MemoryClipboard::with_text("first"));
        let manager = manager_with(Arc::clone(&clipboard));

        let item = manager.check().unwrap();
        assert_eq!(item.content(), "first");
        assert!(manager.check().is_none());

        clipboard.set("second");
        assert_eq!(manager.check().unwrap().content(), "second");
        assert_eq!(manager.history().len(), 2);
    }

    #[test]
    fn test_check_ignores_blank_clipboard() {
        let clipboard = Arc::new(MemoryClipboard::with_text("   "));
        let manager = manager_with(clipboard);
        assert!(manager.check().is_none());
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_check_swallows_clipboard_errors() {
        let clipboard = Arc::new(MemoryClipboard::with_text("x"));
        clipboard.set_failing(true);
        let manager = manager_with(Arc::clone(&clipboard));
        assert!(manager.try_check().is_err());
        assert!(manager.check().is_none());

        clipboard.set_failing(false);
        assert!(manager.check().is_some());
    }

    #[test]
    fn test_add_clip_twice_keeps_one() {
        let manager = manager_with(Arc::new(MemoryClipboard::new()));
        assert!(manager.add_clip("A").is_some());
        assert!(manager.add_clip("A").is_none());
        assert_eq!(manager.history().len(), 1);
        assert!(manager.add_clip("  ").is_none());
    }

    #[test]
    fn test_add_clip_bypasses_poll_debounce() {
        let clipboard = Arc::new(MemoryClipboard::with_text("A"));
        let manager = manager_with(clipboard);
        manager.check().unwrap();
        manager.add_clip("B").unwrap();
        // "A" was the last polled value but is no longer at the head
        assert!(manager.add_clip("A").is_some());
        assert_eq!(manager.history().len(), 3);
    }

    #[test]
    fn test_copy_to_clipboard_is_not_recaptured() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let manager = manager_with(Arc::clone(&clipboard));
        let older = manager.add_clip("older").unwrap();
        manager.add_clip("newer").unwrap();

        assert!(manager.copy_to_clipboard(older.id()).unwrap());
        assert_eq!(clipboard.get(), "older");
        assert!(manager.check().is_none());
        assert_eq!(manager.history().len(), 2);

        assert!(!manager.copy_to_clipboard("missing").unwrap());
    }

    #[test]
    fn test_copy_snippet_to_clipboard() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let manager = manager_with(Arc::clone(&clipboard));
        let snippet = manager
            .create_snippet("SELECT 1", "SQL", "ping", vec![])
            .unwrap();
        assert!(manager.copy_to_clipboard(snippet.id()).unwrap());
        assert_eq!(clipboard.get(), "SELECT 1");
    }

    #[test]
    fn test_copy_to_clipboard_reports_write_failure() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let manager = manager_with(Arc::clone(&clipboard));
        let item = manager.add_clip("x").unwrap();
        clipboard.set_failing(true);
        assert!(manager.copy_to_clipboard(item.id()).is_err());
    }

    #[test]
    fn test_save_as_snippet_copies_without_touching_history() {
        let manager = manager_with(Arc::new(MemoryClipboard::new()));
        let clip = manager.add_clip("https://example.com").unwrap();

        let snippet = manager
            .save_as_snippet(clip.id(), "Example", "Links", vec!["web".to_string()])
            .unwrap()
            .unwrap();
        assert_ne!(snippet.id(), clip.id());
        assert_eq!(snippet.name(), Some("Example"));
        assert_eq!(snippet.content_type(), ContentType::Url);
        assert_eq!(manager.history().len(), 1);
        assert_eq!(manager.history().get(0).unwrap().name(), None);
        assert_eq!(manager.folder("Links").len(), 1);

        assert_eq!(manager.save_as_snippet("missing", "n", "Links", vec![]), Ok(None));
        assert_eq!(
            manager.save_as_snippet(clip.id(), "n", " ", vec![]),
            Err(SnippetError::EmptyFolderName)
        );
    }

    #[test]
    fn test_create_snippet_rejects_blank_content() {
        let manager = manager_with(Arc::new(MemoryClipboard::new()));
        assert_eq!(
            manager.create_snippet(" ", "Folder", "name", vec![]),
            Err(SnippetError::EmptyContent)
        );
        assert_eq!(manager.stats().folder_count, 0);
    }

    #[test]
    fn test_search_all_and_stats() {
        let manager = manager_with(Arc::new(MemoryClipboard::new()));
        manager.add_clip("def python_function():").unwrap();
        manager.add_clip("plain text").unwrap();
        manager
            .create_snippet("print('hi')", "Python", "Python hello", vec![])
            .unwrap();
        manager.create_folder("Empty").unwrap();

        let results = manager.search_all("python");
        assert_eq!(results.history.len(), 1);
        assert_eq!(results.snippets.len(), 1);
        assert_eq!(results.snippets[0].folder, "Python");

        assert_eq!(
            manager.stats(),
            Stats {
                history_count: 2,
                snippet_count: 1,
                folder_count: 2,
                max_history: 50,
            }
        );
    }

    #[test]
    fn test_import_merges_into_existing_folders() {
        let manager = manager_with(Arc::new(MemoryClipboard::new()));
        let existing = manager.create_snippet("kept", "Work", "kept", vec![]).unwrap();

        let document: SnippetDocument = serde_json::from_str(
            r#"{"folders": [
                {"name": " Work ", "items": [{"content": "new work", "name": "w"}]},
                {"name": "Home", "items": [{"content": "home", "name": "h"}]},
                {"name": "Empty", "items": []}
            ]}"#,
        )
        .unwrap();
        assert_eq!(manager.import_snippets(document), Ok(2));

        assert_eq!(manager.folder_names(), vec!["Work", "Home", "Empty"]);
        let work = manager.folder("Work");
        assert_eq!(work.len(), 2);
        assert_eq!(work[0].id(), existing.id());
        assert_eq!(work[1].content(), "new work");
    }

    #[test]
    fn test_import_of_own_export_adds_nothing() {
        let manager = manager_with(Arc::new(MemoryClipboard::new()));
        manager.create_snippet("a", "F", "a", vec![]).unwrap();
        let exported = manager.export_snippets();
        assert_eq!(manager.import_snippets(exported), Ok(0));
        assert_eq!(manager.stats().snippet_count, 1);
    }

    #[test]
    fn test_import_rejects_blank_folder_names_without_changes() {
        let manager = manager_with(Arc::new(MemoryClipboard::new()));
        manager.create_snippet("a", "F", "a", vec![]).unwrap();
        let before = manager.export_snippets();

        let document: SnippetDocument = serde_json::from_str(
            r#"{"folders": [
                {"name": "Fine", "items": [{"content": "x"}]},
                {"name": "   ", "items": [{"content": "y"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(manager.import_snippets(document), Err(SnippetError::EmptyFolderName));

        let blank_content: SnippetDocument =
            serde_json::from_str(r#"{"folders": [{"name": "F", "items": [{"content": " "}]}]}"#).unwrap();
        assert_eq!(manager.import_snippets(blank_content), Err(SnippetError::EmptyContent));

        assert_eq!(manager.export_snippets(), before);
        assert_eq!(manager.folder_names(), vec!["F"]);
    }

    #[test]
    fn test_status_reports_checks_and_captures() {
        let clipboard = Arc::new(MemoryClipboard::with_text("hello"));
        let manager = manager_with(Arc::clone(&clipboard));
        let status = manager.status();
        assert!(status.last_check.is_none());
        assert!(status.last_capture.is_none());
        assert_eq!(status.check_interval_ms, 1000);

        let item = manager.check().unwrap();
        let status = manager.status();
        assert!(status.last_check.is_some());
        assert_eq!(status.last_capture, Some(item.timestamp()));
        assert_eq!(status.stats.history_count, 1);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = Config {
            display_count: 0,
            ..Config::default()
        };
        assert!(Manager::new(config, Arc::new(MemoryClipboard::new())).is_err());
    }

    #[test]
    fn test_preview_uses_configured_width() {
        let config = Config {
            display_length: 10,
            ..Config::default()
        };
        let manager = Manager::new(config, Arc::new(MemoryClipboard::new())).unwrap();
        let item = manager.add_clip("a fairly long line of text").unwrap();
        assert_eq!(manager.preview(&item).chars().count(), 10);
    }
}
