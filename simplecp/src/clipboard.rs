//! System clipboard access
//!
//! The manager only talks to [`ClipboardAccess`], so tests and headless
//! environments can swap in [`MemoryClipboard`].

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Clipboard access failed: {0}")]
    Access(String),
}

/// Read and write plain text on a clipboard
pub trait ClipboardAccess: Send + Sync {
    /// Current text; an empty or non-text clipboard reads as `""`
    fn read(&self) -> Result<String, ClipboardError>;

    fn write(&self, text: &str) -> Result<(), ClipboardError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// System clipboard (arboard)
// ─────────────────────────────────────────────────────────────────────────────

/// The OS clipboard
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard {
    ctx: Mutex<arboard::Clipboard>,
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let ctx = arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self {
            ctx: Mutex::new(ctx),
        })
    }
}

#[cfg(feature = "system-clipboard")]
impl ClipboardAccess for SystemClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        match self.ctx.lock().get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(ClipboardError::Access(e.to_string())),
        }
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        self.ctx
            .lock()
            .set_text(text)
            .map_err(|e| ClipboardError::Access(e.to_string()))
    }
}

#[cfg(feature = "system-clipboard")]
impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SystemClipboard")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory clipboard
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local clipboard for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<String>,
    failing: Mutex<bool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            failing: Mutex::new(false),
        }
    }

    /// Simulate another application writing to the clipboard
    pub fn set(&self, text: impl Into<String>) {
        *self.text.lock() = text.into();
    }

    pub fn get(&self) -> String {
        self.text.lock().clone()
    }

    /// Make every read and write fail until switched back
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    fn check_available(&self) -> Result<(), ClipboardError> {
        if *self.failing.lock() {
            Err(ClipboardError::Access("simulated clipboard failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ClipboardAccess for MemoryClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        self.check_available()?;
        Ok(self.get())
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        self.check_available()?;
        self.set(text);
        Ok(())
    }
}

/// Open the OS clipboard, or fall back to an in-memory one when there is none
/// (no display server, or built without `system-clipboard`)
pub fn default_clipboard() -> std::sync::Arc<dyn ClipboardAccess> {
    #[cfg(feature = "system-clipboard")]
    {
        match SystemClipboard::new() {
            Ok(clipboard) => return std::sync::Arc::new(clipboard),
            Err(e) => log::warn!("{}, using in-memory clipboard", e),
        }
    }
    std::sync::Arc::new(MemoryClipboard::new())
}
