//! SimpleCP Interface Definition
//!
//! This file defines the plain-data types handed across the boundary to the
//! routing layer and the CLI. It acts as the source of truth for shared types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::clipboard::ClipboardError;
use crate::models::Item;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Content category assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Url,
    Code,
    Json,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Url => "url",
            ContentType::Code => "code",
            ContentType::Json => "json",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How folder names are compared when checking for collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderNameMatching {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl FolderNameMatching {
    pub fn same(&self, a: &str, b: &str) -> bool {
        match self {
            FolderNameMatching::CaseSensitive => a == b,
            FolderNameMatching::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

/// Outcome tag of a folder rename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameOutcome {
    Success,
    SourceNotFound,
    /// New name is empty or whitespace only
    TargetEmpty,
    SameName,
    TargetExists,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// Structured result of `SnippetStore::rename_folder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResult {
    pub outcome: RenameOutcome,
    pub message: String,
}

impl RenameResult {
    pub(crate) fn new(outcome: RenameOutcome, message: impl Into<String>) -> Self {
        Self {
            outcome,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == RenameOutcome::Success
    }
}

/// A virtual page of history used only for presentation
///
/// `end_index` is exclusive; `name` is the 1-based inclusive range ("1-10").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFolder {
    pub name: String,
    pub start_index: usize,
    pub end_index: usize,
    pub count: usize,
    pub items: Vec<Item>,
}

/// A snippet search hit with the folder it lives in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnippetMatch {
    pub folder: String,
    pub item: Item,
}

/// Combined result of searching history and snippets
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResults {
    pub history: Vec<Item>,
    pub snippets: Vec<SnippetMatch>,
}

/// Aggregate counts across both stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub history_count: usize,
    pub snippet_count: usize,
    pub folder_count: usize,
    pub max_history: usize,
}

/// Running state of a manager, for health and status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub stats: Stats,
    pub data_dir: PathBuf,
    pub check_interval_ms: u64,
    /// When the clipboard was last read successfully
    pub last_check: Option<DateTime<Utc>>,
    /// Timestamp of the most recent history item
    pub last_capture: Option<DateTime<Utc>>,
}

/// Partial update applied to a snippet; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SnippetUpdate {
    pub content: Option<String>,
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Expected failures of snippet operations, reported as data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnippetError {
    #[error("Folder name cannot be empty")]
    EmptyFolderName,
    #[error("Folder '{0}' already exists")]
    FolderExists(String),
    #[error("Folder '{0}' not found")]
    FolderNotFound(String),
    #[error("Snippet '{id}' not found in folder '{folder}'")]
    SnippetNotFound { folder: String, id: String },
    #[error("Snippet content cannot be empty")]
    EmptyContent,
    #[error("A snippet with id '{0}' already exists")]
    DuplicateId(String),
}

/// Error type for SimpleCP operations that can fail hard
#[derive(Debug, Error)]
pub enum SimpleCpError {
    #[error("Failed to {operation} {}: {source}", .path.display())]
    Persistence {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed document {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimpleCpResult<T> = Result<T, SimpleCpError>;
