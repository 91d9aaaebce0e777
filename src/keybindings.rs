//! Customizable keybindings for the editor shortcuts.
//!
//! Each editor action owns a list of chords; the first matching chord wins.
//! Bindings are part of [`crate::config::EngineConfig`] and persist with it.

use serde::{Deserialize, Serialize};

/// A key the engine cares about. Letters are stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Char(char),
    Delete,
    Backspace,
    Escape,
    Enter,
    Tab,
}

impl Key {
    /// Parse a DOM-style key name (`"z"`, `"Delete"`, `"Escape"`).
    pub fn from_name(name: &str) -> Option<Key> {
        match name {
            "Delete" | "Del" => Some(Key::Delete),
            "Backspace" => Some(Key::Backspace),
            "Escape" | "Esc" => Some(Key::Escape),
            "Enter" => Some(Key::Enter),
            "Tab" => Some(Key::Tab),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c.to_ascii_uppercase())),
                    _ => None,
                }
            }
        }
    }
}

/// A key plus the modifiers held with it.
///
/// `ctrl` stands for the platform command modifier; hosts on macOS map Cmd
/// onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(Key::Char(c.to_ascii_uppercase()))
        }
    }

    pub fn ctrl_shift(c: char) -> Self {
        Self {
            shift: true,
            ..Self::ctrl(c)
        }
    }

    /// Normalize letter case so `z` and `Z` compare equal.
    fn normalized(self) -> Self {
        match self.key {
            Key::Char(c) => Self {
                key: Key::Char(c.to_ascii_uppercase()),
                ..self
            },
            _ => self,
        }
    }
}

/// What a bound chord asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorAction {
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
    Delete,
    Escape,
}

impl EditorAction {
    pub fn name(&self) -> &'static str {
        match self {
            EditorAction::Copy => "Copy",
            EditorAction::Cut => "Cut",
            EditorAction::Paste => "Paste",
            EditorAction::Undo => "Undo",
            EditorAction::Redo => "Redo",
            EditorAction::Delete => "Delete",
            EditorAction::Escape => "Escape",
        }
    }

    pub fn all() -> &'static [EditorAction] {
        &[
            EditorAction::Copy,
            EditorAction::Cut,
            EditorAction::Paste,
            EditorAction::Undo,
            EditorAction::Redo,
            EditorAction::Delete,
            EditorAction::Escape,
        ]
    }
}

/// Keybinding configuration for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub copy: Vec<KeyChord>,
    pub cut: Vec<KeyChord>,
    pub paste: Vec<KeyChord>,
    pub undo: Vec<KeyChord>,
    pub redo: Vec<KeyChord>,
    pub delete: Vec<KeyChord>,
    pub escape: Vec<KeyChord>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            copy: vec![KeyChord::ctrl('c')],
            cut: vec![KeyChord::ctrl('x')],
            paste: vec![KeyChord::ctrl('v')],
            undo: vec![KeyChord::ctrl('z')],
            redo: vec![KeyChord::ctrl_shift('z'), KeyChord::ctrl('y')],
            delete: vec![
                KeyChord::plain(Key::Delete),
                KeyChord::plain(Key::Backspace),
            ],
            escape: vec![KeyChord::plain(Key::Escape)],
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chords bound to `action`.
    pub fn chords_for(&self, action: EditorAction) -> &[KeyChord] {
        match action {
            EditorAction::Copy => &self.copy,
            EditorAction::Cut => &self.cut,
            EditorAction::Paste => &self.paste,
            EditorAction::Undo => &self.undo,
            EditorAction::Redo => &self.redo,
            EditorAction::Delete => &self.delete,
            EditorAction::Escape => &self.escape,
        }
    }

    fn chords_for_mut(&mut self, action: EditorAction) -> &mut Vec<KeyChord> {
        match action {
            EditorAction::Copy => &mut self.copy,
            EditorAction::Cut => &mut self.cut,
            EditorAction::Paste => &mut self.paste,
            EditorAction::Undo => &mut self.undo,
            EditorAction::Redo => &mut self.redo,
            EditorAction::Delete => &mut self.delete,
            EditorAction::Escape => &mut self.escape,
        }
    }

    /// The action bound to a key press, if any.
    pub fn action_for(&self, chord: KeyChord) -> Option<EditorAction> {
        let chord = chord.normalized();
        EditorAction::all()
            .iter()
            .copied()
            .find(|action| self.chords_for(*action).contains(&chord))
    }

    /// Replace the chords of `action`.
    pub fn set_chords(&mut self, action: EditorAction, chords: Vec<KeyChord>) {
        *self.chords_for_mut(action) = chords.into_iter().map(KeyChord::normalized).collect();
    }

    /// Which other action already uses `chord`, if any.
    pub fn key_conflict(&self, chord: KeyChord, exclude: Option<EditorAction>) -> Option<EditorAction> {
        let chord = chord.normalized();
        EditorAction::all()
            .iter()
            .copied()
            .filter(|action| Some(*action) != exclude)
            .find(|action| self.chords_for(*action).contains(&chord))
    }
}

/// Display string for a chord, e.g. `Ctrl+Shift+Z`.
pub fn chord_to_string(chord: &KeyChord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if chord.ctrl {
        parts.push("Ctrl".to_string());
    }
    if chord.alt {
        parts.push("Alt".to_string());
    }
    if chord.shift {
        parts.push("Shift".to_string());
    }
    parts.push(match chord.key {
        Key::Char(c) => c.to_ascii_uppercase().to_string(),
        Key::Delete => "Delete".to_string(),
        Key::Backspace => "Backspace".to_string(),
        Key::Escape => "Escape".to_string(),
        Key::Enter => "Enter".to_string(),
        Key::Tab => "Tab".to_string(),
    });
    parts.join("+")
}
