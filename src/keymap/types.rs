//! Core types for the keymap system: Modifiers, NormalizedKey, KeyboardEvent

use std::fmt;
use std::hash::{Hash, Hasher};

/// Modifier keys as a bitfield for efficient storage and comparison
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0b00001);
    pub const SHIFT: Modifiers = Modifiers(0b00010);
    pub const ALT: Modifiers = Modifiers(0b00100);
    pub const META: Modifiers = Modifiers(0b01000);
    pub const SUPER: Modifiers = Modifiers(0b10000); // Cmd on macOS, Win on Windows

    /// Create modifiers from individual flags
    pub const fn new(ctrl: bool, shift: bool, alt: bool, meta: bool, sup: bool) -> Self {
        let mut bits = 0u8;
        if ctrl {
            bits |= Self::CTRL.0;
        }
        if shift {
            bits |= Self::SHIFT.0;
        }
        if alt {
            bits |= Self::ALT.0;
        }
        if meta {
            bits |= Self::META.0;
        }
        if sup {
            bits |= Self::SUPER.0;
        }
        Modifiers(bits)
    }

    /// Check if ctrl is held
    #[inline]
    pub const fn ctrl(self) -> bool {
        self.0 & Self::CTRL.0 != 0
    }

    /// Check if shift is held
    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & Self::SHIFT.0 != 0
    }

    /// Check if alt/option is held
    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & Self::ALT.0 != 0
    }

    /// Check if meta is held (vim `T-`, distinct from alt)
    #[inline]
    pub const fn meta(self) -> bool {
        self.0 & Self::META.0 != 0
    }

    /// Check if super (cmd/win, vim `D-`) is held
    #[inline]
    pub const fn super_key(self) -> bool {
        self.0 & Self::SUPER.0 != 0
    }

    /// Check if no modifiers are held
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine two modifier sets
    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Remove the modifiers in other from this set
    #[inline]
    pub const fn difference(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    /// Check if this contains all modifiers in other
    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Vim-style prefix string, in the fixed order `C- M- S- D- T-`
impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl() {
            f.write_str("C-")?;
        }
        if self.alt() {
            f.write_str("M-")?;
        }
        if self.shift() {
            f.write_str("S-")?;
        }
        if self.super_key() {
            f.write_str("D-")?;
        }
        if self.meta() {
            f.write_str("T-")?;
        }
        Ok(())
    }
}

/// A single key press in canonical form
///
/// `key` is lowercase except for function keys (`F1`..`F24`). `as_str()` is
/// the canonical string used as a trie edge, e.g. `C-a`, `S-/`, `<Enter>`.
/// Equality only looks at the key and the modifier set.
#[derive(Clone, Debug)]
pub struct NormalizedKey {
    key: String,
    modifiers: Modifiers,
    string: String,
}

impl NormalizedKey {
    /// Create a key, deriving the canonical string
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        let key = key.into();
        let string = super::notation::key_to_string(&key, modifiers);
        Self {
            key,
            modifiers,
            string,
        }
    }

    /// Create a key with no modifiers
    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// The canonical key name without modifiers
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Canonical display form, used as the trie edge label
    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// Notation that parses back to this key (`<C-a>`, `<Esc>`, `a`)
    pub fn notation(&self) -> String {
        let name = super::notation::key_name(&self.key);
        if self.modifiers.is_empty() {
            match name {
                Some(name) => format!("<{}>", name),
                None => self.key.clone(),
            }
        } else {
            let key = name.map(|n| n.into_owned()).unwrap_or_else(|| self.key.clone());
            format!("<{}{}>", self.modifiers, key)
        }
    }
}

impl PartialEq for NormalizedKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.modifiers == other.modifiers
    }
}

impl Eq for NormalizedKey {}

impl Hash for NormalizedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.modifiers.hash(state);
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string)
    }
}

/// A keydown/keyup as delivered by the host environment
///
/// `key` follows the DOM `KeyboardEvent.key` naming (`"a"`, `"A"`,
/// `"ArrowUp"`, `"F5"`, `"Escape"`, `" "`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: String,
    pub ctrl_key: bool,
    pub alt_key: bool,
    pub shift_key: bool,
    /// The platform meta key (cmd/win)
    pub meta_key: bool,
    /// Set for OS auto-repeat keydowns while a key is held
    pub repeat: bool,
}

impl KeyboardEvent {
    /// Create an event with no modifiers held
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Builder: set ctrl
    pub fn ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    /// Builder: set alt
    pub fn alt(mut self) -> Self {
        self.alt_key = true;
        self
    }

    /// Builder: set shift
    pub fn shift(mut self) -> Self {
        self.shift_key = true;
        self
    }

    /// Builder: set the platform meta key
    pub fn meta(mut self) -> Self {
        self.meta_key = true;
        self
    }

    /// Builder: mark as an auto-repeat keydown
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }
}
