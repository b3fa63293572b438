// Chunk: docs/chunks/clipboard_operations - Copy and paste through the system clipboard
//!
//! System clipboard access via `arboard`.
//!
//! This module is a thin wrapper ("humble object"): all decisions about what
//! to copy and how to normalise pasted text live in the editor. The
//! clipboard is opened lazily and reopened after a failure, since it can be
//! unavailable in headless sessions or while another program holds it.

use arboard::Clipboard;
use tracing::warn;

use crate::error::EditorError;

#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&mut self) -> Result<&mut Clipboard, EditorError> {
        if self.inner.is_none() {
            let clipboard = Clipboard::new().map_err(|e| EditorError::Clipboard(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| EditorError::Clipboard("clipboard not open".to_string()))
    }

    /// Reads plain text from the clipboard.
    ///
    /// Returns `None` if the clipboard is unavailable or holds no text.
    pub fn paste_text(&mut self) -> Option<String> {
        let clipboard = match self.open() {
            Ok(clipboard) => clipboard,
            Err(e) => {
                warn!(error = %e, "paste failed");
                return None;
            }
        };
        match clipboard.get_text() {
            Ok(text) => Some(text),
            Err(arboard::Error::ContentNotAvailable) => None,
            Err(e) => {
                warn!(error = %e, "paste failed");
                self.inner = None;
                None
            }
        }
    }

    /// Writes an HTML rendering with a plain-text alternative.
    pub fn copy_text_and_html(&mut self, text: &str, html: &str) -> Result<(), EditorError> {
        let result = self
            .open()?
            .set_html(html, Some(text))
            .map_err(|e| EditorError::Clipboard(e.to_string()));
        if let Err(e) = &result {
            warn!(error = %e, "copy failed");
            self.inner = None;
        }
        result
    }
}
