//! Snippet folders
//!
//! An ordered list of uniquely named folders, each holding an ordered list of
//! snippets. Folder names come from untrusted input, so every expected failure
//! is returned as data: `Result<_, SnippetError>`, `bool`, or [`RenameResult`].
//! Nothing in here panics on bad input.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::interface::{
    FolderNameMatching, RenameOutcome, RenameResult, SnippetError, SnippetMatch, SnippetUpdate,
};
use crate::models::Item;
use crate::observer::{Observer, ObserverHandle, ObserverRegistry, StoreEvent};

/// A named folder with its snippets, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetFolder {
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Persisted form of all snippet folders
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnippetDocument {
    #[serde(default)]
    pub folders: Vec<SnippetFolder>,
}

#[derive(Debug, Default)]
struct SnippetState {
    folders: Vec<SnippetFolder>,
}

impl SnippetState {
    fn position(&self, name: &str, matching: FolderNameMatching) -> Option<usize> {
        let name = name.trim();
        self.folders.iter().position(|f| matching.same(&f.name, name))
    }

    fn contains_id(&self, id: &str) -> bool {
        self.folders
            .iter()
            .any(|f| f.items.iter().any(|item| item.id() == id))
    }

    /// Index of the folder, creating it at the end if missing.
    /// `name` must already be trimmed and non-empty.
    fn position_or_create(&mut self, name: &str, matching: FolderNameMatching) -> (usize, bool) {
        match self.position(name, matching) {
            Some(index) => (index, false),
            None => {
                self.folders.push(SnippetFolder {
                    name: name.to_string(),
                    items: Vec::new(),
                });
                (self.folders.len() - 1, true)
            }
        }
    }
}

#[derive(Debug)]
pub struct SnippetStore {
    state: Mutex<SnippetState>,
    observers: ObserverRegistry,
    matching: FolderNameMatching,
}

impl Default for SnippetStore {
    fn default() -> Self {
        Self::new(FolderNameMatching::default())
    }
}

impl SnippetStore {
    pub fn new(matching: FolderNameMatching) -> Self {
        Self {
            state: Mutex::new(SnippetState::default()),
            observers: ObserverRegistry::default(),
            matching,
        }
    }

    pub fn from_document(document: SnippetDocument, matching: FolderNameMatching) -> Self {
        let store = Self::new(matching);
        store.state.lock().folders = normalize_folders(document.folders, matching);
        store
    }

    pub fn to_document(&self) -> SnippetDocument {
        SnippetDocument {
            folders: self.state.lock().folders.clone(),
        }
    }

    /// Replace all folders with a loaded document, keeping observers
    pub fn load_document(&self, document: SnippetDocument) {
        let folders = normalize_folders(document.folders, self.matching);
        let count = folders.len();
        self.state.lock().folders = folders;
        log::debug!("Snippets loaded with {} folders", count);
        self.observers
            .notify("snippets", &StoreEvent::SnippetsLoaded { folders: count });
    }

    pub fn add_observer<O: Observer + 'static>(&self, observer: O) -> ObserverHandle {
        self.observers.register(observer)
    }

    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        self.observers.remove(handle)
    }

    pub fn folder_name_matching(&self) -> FolderNameMatching {
        self.matching
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Folder Operations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_folder(&self, name: &str) -> Result<(), SnippetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SnippetError::EmptyFolderName);
        }

        {
            let mut state = self.state.lock();
            if state.position(name, self.matching).is_some() {
                return Err(SnippetError::FolderExists(name.to_string()));
            }
            state.folders.push(SnippetFolder {
                name: name.to_string(),
                items: Vec::new(),
            });
        }

        log::debug!("Created snippet folder '{}'", name);
        self.observers.notify(
            "snippets",
            &StoreEvent::FolderCreated {
                folder: name.to_string(),
            },
        );
        Ok(())
    }

    /// Rename a folder in place, keeping its position and item order.
    ///
    /// Checks run in order: source exists, target not blank, target differs
    /// from source, target not taken.
    pub fn rename_folder(&self, old_name: &str, new_name: &str) -> RenameResult {
        let new_name = new_name.trim();

        let from = {
            let mut state = self.state.lock();
            let Some(index) = state.position(old_name, self.matching) else {
                return RenameResult::new(
                    RenameOutcome::SourceNotFound,
                    format!("Folder '{}' not found", old_name),
                );
            };
            if new_name.is_empty() {
                return RenameResult::new(
                    RenameOutcome::TargetEmpty,
                    "New folder name cannot be empty",
                );
            }
            if state.folders[index].name == new_name {
                return RenameResult::new(
                    RenameOutcome::SameName,
                    format!("Folder is already named '{}'", new_name),
                );
            }
            let taken = state
                .folders
                .iter()
                .enumerate()
                .any(|(i, f)| i != index && self.matching.same(&f.name, new_name));
            if taken {
                return RenameResult::new(
                    RenameOutcome::TargetExists,
                    format!("Folder '{}' already exists", new_name),
                );
            }
            std::mem::replace(&mut state.folders[index].name, new_name.to_string())
        };

        log::debug!("Renamed snippet folder '{}' to '{}'", from, new_name);
        let message = format!("Renamed folder '{}' to '{}'", from, new_name);
        self.observers.notify(
            "snippets",
            &StoreEvent::FolderRenamed {
                from,
                to: new_name.to_string(),
            },
        );
        RenameResult::new(RenameOutcome::Success, message)
    }

    /// Remove a folder and every snippet in it; false if it does not exist
    pub fn delete_folder(&self, name: &str) -> bool {
        let removed = {
            let mut state = self.state.lock();
            match state.position(name, self.matching) {
                Some(index) => state.folders.remove(index),
                None => return false,
            }
        };

        let removed_ids = removed.items.iter().map(|i| i.id().to_string()).collect();
        self.observers.notify(
            "snippets",
            &StoreEvent::FolderDeleted {
                folder: removed.name,
                removed: removed_ids,
            },
        );
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snippet Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append to a folder, creating the folder if needed.
    /// An id may live in only one folder, once.
    pub fn add_snippet(&self, folder: &str, item: Item) -> Result<(), SnippetError> {
        let folder = folder.trim();
        if folder.is_empty() {
            return Err(SnippetError::EmptyFolderName);
        }
        let (folder, created) = {
            let mut state = self.state.lock();
            if state.contains_id(item.id()) {
                return Err(SnippetError::DuplicateId(item.id().to_string()));
            }
            let (index, created) = state.position_or_create(folder, self.matching);
            state.folders[index].items.push(item.clone());
            (state.folders[index].name.clone(), created)
        };

        if created {
            self.observers.notify(
                "snippets",
                &StoreEvent::FolderCreated {
                    folder: folder.clone(),
                },
            );
        }
        self.observers
            .notify("snippets", &StoreEvent::SnippetAdded { folder, item });
        Ok(())
    }

    /// Partial update by id; `id` and `timestamp` never change
    pub fn update_snippet(
        &self,
        folder: &str,
        id: &str,
        update: SnippetUpdate,
    ) -> Result<Item, SnippetError> {
        if update.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(SnippetError::EmptyContent);
        }

        let (folder, item) = {
            let mut state = self.state.lock();
            let index = state
                .position(folder, self.matching)
                .ok_or_else(|| SnippetError::FolderNotFound(folder.to_string()))?;
            let target = &mut state.folders[index];
            let item = target
                .items
                .iter_mut()
                .find(|item| item.id() == id)
                .ok_or_else(|| SnippetError::SnippetNotFound {
                    folder: folder.to_string(),
                    id: id.to_string(),
                })?;
            item.apply_update(update);
            (target.name.clone(), item.clone())
        };

        self.observers.notify(
            "snippets",
            &StoreEvent::SnippetUpdated {
                folder,
                item: item.clone(),
            },
        );
        Ok(item)
    }

    /// Remove a snippet; false if the folder or id is unknown
    pub fn delete_snippet(&self, folder: &str, id: &str) -> bool {
        let folder = {
            let mut state = self.state.lock();
            let Some(index) = state.position(folder, self.matching) else {
                return false;
            };
            let target = &mut state.folders[index];
            let Some(pos) = target.items.iter().position(|item| item.id() == id) else {
                return false;
            };
            target.items.remove(pos);
            target.name.clone()
        };

        self.observers.notify(
            "snippets",
            &StoreEvent::SnippetDeleted {
                folder,
                id: id.to_string(),
            },
        );
        true
    }

    /// Move a snippet to the end of another folder, creating it if needed.
    /// On any error nothing is changed.
    pub fn move_snippet(&self, from_folder: &str, to_folder: &str, id: &str) -> Result<(), SnippetError> {
        let to_folder = to_folder.trim();

        let (from, to, created) = {
            let mut state = self.state.lock();
            let from_index = state
                .position(from_folder, self.matching)
                .ok_or_else(|| SnippetError::FolderNotFound(from_folder.to_string()))?;
            let item_index = state.folders[from_index]
                .items
                .iter()
                .position(|item| item.id() == id)
                .ok_or_else(|| SnippetError::SnippetNotFound {
                    folder: from_folder.to_string(),
                    id: id.to_string(),
                })?;
            if to_folder.is_empty() {
                return Err(SnippetError::EmptyFolderName);
            }

            // New folders are appended, so from_index stays valid
            let (to_index, created) = state.position_or_create(to_folder, self.matching);
            let item = state.folders[from_index].items.remove(item_index);
            state.folders[to_index].items.push(item);
            (
                state.folders[from_index].name.clone(),
                state.folders[to_index].name.clone(),
                created,
            )
        };

        if created {
            self.observers.notify(
                "snippets",
                &StoreEvent::FolderCreated { folder: to.clone() },
            );
        }
        self.observers.notify(
            "snippets",
            &StoreEvent::SnippetMoved {
                from,
                to,
                id: id.to_string(),
            },
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Every folder with its snippets, in creation order
    pub fn all_snippets(&self) -> Vec<SnippetFolder> {
        self.state.lock().folders.clone()
    }

    pub fn folder_names(&self) -> Vec<String> {
        self.state
            .lock()
            .folders
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    /// Snippets in a folder; empty if the folder does not exist
    pub fn folder(&self, name: &str) -> Vec<Item> {
        let state = self.state.lock();
        state
            .position(name, self.matching)
            .map(|index| state.folders[index].items.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, folder: &str, id: &str) -> Option<Item> {
        let state = self.state.lock();
        let index = state.position(folder, self.matching)?;
        state.folders[index]
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Look an id up across all folders
    pub fn find_by_id(&self, id: &str) -> Option<SnippetMatch> {
        self.state.lock().folders.iter().find_map(|f| {
            f.items.iter().find(|item| item.id() == id).map(|item| SnippetMatch {
                folder: f.name.clone(),
                item: item.clone(),
            })
        })
    }

    /// Case-insensitive substring match on content or name, folder by folder
    pub fn search(&self, query: &str) -> Vec<SnippetMatch> {
        let needle = query.to_lowercase();
        let state = self.state.lock();
        state
            .folders
            .iter()
            .flat_map(|f| {
                f.items
                    .iter()
                    .filter(|item| item.content_contains(&needle) || item.name_contains(&needle))
                    .map(|item| SnippetMatch {
                        folder: f.name.clone(),
                        item: item.clone(),
                    })
            })
            .collect()
    }

    /// Total number of snippets across folders
    pub fn len(&self) -> usize {
        self.state.lock().folders.iter().map(|f| f.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn folder_count(&self) -> usize {
        self.state.lock().folders.len()
    }
}

/// Trim names, drop blank-named folders, merge duplicates into the first
/// occurrence and keep only the first copy of each snippet id
fn normalize_folders(folders: Vec<SnippetFolder>, matching: FolderNameMatching) -> Vec<SnippetFolder> {
    let mut normalized: Vec<SnippetFolder> = Vec::with_capacity(folders.len());
    let mut seen_ids = HashSet::new();
    for mut folder in folders {
        folder.items.retain(|item| {
            let first = seen_ids.insert(item.id().to_string());
            if !first {
                log::warn!("Dropping repeated snippet id '{}'", item.id());
            }
            first
        });
        let name = folder.name.trim();
        if name.is_empty() {
            log::warn!(
                "Dropping snippet folder with blank name ({} items)",
                folder.items.len()
            );
            continue;
        }
        match normalized.iter_mut().find(|f| matching.same(&f.name, name)) {
            Some(existing) => {
                log::warn!("Merging duplicate snippet folder '{}'", name);
                existing.items.extend(folder.items);
            }
            None => normalized.push(SnippetFolder {
                name: name.to_string(),
                items: folder.items,
            }),
        }
    }
    normalized
}
