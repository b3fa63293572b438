// Chunk: docs/chunks/line_editor - Console line editor
//! Editor configuration.
//!
//! Two knobs are read from the environment once, when the editor is built:
//!
//! - `suggestion_delay_ms`: idle time before an inline suggestion is
//!   computed. `0` disables suggestions.
//! - `suggestion_min_chars`: how long the argument under the cursor must be
//!   before a suggestion is offered.
//!
//! The rest of the editor's timing is fixed.

use std::env;
use std::time::Duration;

/// Maximum number of console events handled per loop iteration.
pub const EVENT_BATCH: usize = 20;

/// Interval between auto-scroll steps while a drag is outside the window.
pub const SCROLL_TICK: Duration = Duration::from_millis(250);

/// Inactivity before the restart-state hook runs.
pub const RESTART_IDLE: Duration = Duration::from_secs(30);

/// Wheel delta units per line of viewport scroll.
pub const WHEEL_UNITS_PER_LINE: i32 = 32;

const DEFAULT_SUGGESTION_DELAY_MS: u64 = 400;
const DEFAULT_SUGGESTION_MIN_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// Idle delay before suggesting, in milliseconds. `0` disables suggestions.
    pub suggestion_delay_ms: u64,
    /// Minimum argument length before suggesting.
    pub suggestion_min_chars: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            suggestion_delay_ms: DEFAULT_SUGGESTION_DELAY_MS,
            suggestion_min_chars: DEFAULT_SUGGESTION_MIN_CHARS,
        }
    }
}

impl EditorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Missing or
    /// non-numeric values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(name))
                .and_then(|v| v.trim().parse::<u64>().ok())
        };

        Self {
            suggestion_delay_ms: read(&["suggestion_delay_ms", "SUGGESTION_DELAY_MS"])
                .unwrap_or(DEFAULT_SUGGESTION_DELAY_MS),
            suggestion_min_chars: read(&["suggestion_min_chars", "SUGGESTION_MIN_CHARS"])
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_SUGGESTION_MIN_CHARS),
        }
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.suggestion_delay_ms > 0
    }

    pub fn suggestion_delay(&self) -> Duration {
        Duration::from_millis(self.suggestion_delay_ms)
    }
}
