// Chunk: docs/chunks/hotkey_aliases - Function-key alias expansion
//!
//! Hotkey alias lookup.
//!
//! Pressing F1-F12 (optionally with Ctrl and/or Shift) looks up an alias
//! named after the key, such as `F3` or `CtrlF5`. If one exists its
//! expansion replaces the line and is submitted immediately.

use std::collections::HashMap;

use conline_input::{ControlKeyState, Key};

/// Resolves alias names to their expansions.
pub trait AliasTable {
    fn expand(&self, name: &str) -> Option<String>;
}

/// Case-insensitive alias map.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, expansion: &str) {
        self.aliases
            .insert(name.to_ascii_lowercase(), expansion.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.aliases.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl AliasTable for AliasMap {
    fn expand(&self, name: &str) -> Option<String> {
        self.aliases.get(&name.to_ascii_lowercase()).cloned()
    }
}

/// Builds the alias name for a function key: `F3`, `CtrlF5`, `ShiftF1` or
/// `CtrlShiftF12`. Returns `None` for other keys or when Alt is held.
pub fn hotkey_name(key: &Key, modifiers: ControlKeyState) -> Option<String> {
    let n = key.function_number()?;
    if modifiers.alt() {
        return None;
    }
    let mut name = String::new();
    if modifiers.ctrl() {
        name.push_str("Ctrl");
    }
    if modifiers.shift() {
        name.push_str("Shift");
    }
    name.push_str(&format!("F{n}"));
    Some(name)
}
