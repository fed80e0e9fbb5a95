//! Vim-style key notation parsing
//!
//! Converts notation like `"<C-a>"`, `"gg"`, `"<leader>w"` or `"?"` and live
//! keyboard events into [`NormalizedKey`]s. Both paths produce the same
//! canonical string for the same physical key press, which is what the trie is
//! keyed on.
//!
//! # Modifier prefixes
//!
//! ```text
//! ctrl-  control-  c-   → ctrl      (C-)
//! alt-   a-        m-   → alt       (M-)
//! shift- s-             → shift     (S-)
//! super- cmd- command- d- → super   (D-)
//! meta-  t-             → meta      (T-)
//! ```
//!
//! Patterns are matched longest first, so `meta-` wins over `m-`.

use std::borrow::Cow;
use std::collections::HashMap;

use super::types::{KeyboardEvent, Modifiers, NormalizedKey};

/// Guards against placeholder cycles like `<a> → <b> → <a>`
const MAX_PLACEHOLDER_DEPTH: usize = 16;

/// Named keys accepted in notation, mapped to their canonical key
const SPECIAL_KEYS: &[(&str, &str)] = &[
    ("esc", "escape"),
    ("escape", "escape"),
    ("cr", "enter"),
    ("enter", "enter"),
    ("return", "enter"),
    ("space", " "),
    ("tab", "tab"),
    ("bs", "backspace"),
    ("backspace", "backspace"),
    ("del", "delete"),
    ("delete", "delete"),
    ("up", "up"),
    ("down", "down"),
    ("left", "left"),
    ("right", "right"),
    ("home", "home"),
    ("end", "end"),
    ("pageup", "pageup"),
    ("pagedown", "pagedown"),
    ("insert", "insert"),
    ("bar", "|"),
    ("bslash", "\\"),
    ("lt", "<"),
];

/// Canonical key → bracketed display name
const KEY_NAMES: &[(&str, &str)] = &[
    ("escape", "Esc"),
    ("enter", "Enter"),
    (" ", "Space"),
    ("tab", "Tab"),
    ("backspace", "BS"),
    ("delete", "Del"),
    ("up", "Up"),
    ("down", "Down"),
    ("left", "Left"),
    ("right", "Right"),
    ("home", "Home"),
    ("end", "End"),
    ("pageup", "PageUp"),
    ("pagedown", "PageDown"),
    ("insert", "Insert"),
    ("|", "Bar"),
    ("\\", "Bslash"),
    ("<", "lt"),
];

/// Characters macOS produces for Option+key, mapped back to the key
const OPTION_SYMBOLS: &[(char, char)] = &[
    ('¡', '1'),
    ('™', '2'),
    ('€', '2'),
    ('£', '3'),
    ('¢', '4'),
    ('∞', '5'),
    ('§', '6'),
    ('¶', '7'),
    ('•', '8'),
    ('ª', '9'),
    ('º', '0'),
    ('å', 'a'),
    ('∫', 'b'),
    ('ç', 'c'),
    ('∂', 'd'),
    ('ƒ', 'f'),
    ('©', 'g'),
    ('˙', 'h'),
    ('∆', 'j'),
    ('˚', 'k'),
    ('¬', 'l'),
    ('µ', 'm'),
    ('ø', 'o'),
    ('π', 'p'),
    ('œ', 'q'),
    ('®', 'r'),
    ('ß', 's'),
    ('†', 't'),
    ('√', 'v'),
    ('∑', 'w'),
    ('≈', 'x'),
    ('¥', 'y'),
    ('Ω', 'z'),
];

const DEFAULT_MODIFIERS: &[(&str, Modifiers)] = &[
    ("control-", Modifiers::CTRL),
    ("ctrl-", Modifiers::CTRL),
    ("c-", Modifiers::CTRL),
    ("alt-", Modifiers::ALT),
    ("a-", Modifiers::ALT),
    ("m-", Modifiers::ALT),
    ("shift-", Modifiers::SHIFT),
    ("s-", Modifiers::SHIFT),
    ("command-", Modifiers::SUPER),
    ("super-", Modifiers::SUPER),
    ("cmd-", Modifiers::SUPER),
    ("d-", Modifiers::SUPER),
    ("meta-", Modifiers::META),
    ("t-", Modifiers::META),
];

/// Key names that are pure modifier presses and never start a sequence
const MODIFIER_KEY_NAMES: &[&str] = &[
    "Shift", "Control", "Alt", "AltGraph", "Meta", "OS", "Super", "Hyper", "CapsLock", "Fn",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModifierPattern {
    prefix: String,
    modifiers: Modifiers,
}

/// Parser state: registered placeholders and modifier prefixes
///
/// Each processor owns one parser, so registrations never leak between
/// processors (or tests).
#[derive(Debug, Clone)]
pub struct KeyParser {
    placeholders: HashMap<String, String>,
    modifier_patterns: Vec<ModifierPattern>,
}

impl Default for KeyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyParser {
    /// Create a parser with the default modifier prefixes and no placeholders
    pub fn new() -> Self {
        let mut parser = Self {
            placeholders: HashMap::new(),
            modifier_patterns: Vec::with_capacity(DEFAULT_MODIFIERS.len()),
        };
        for (prefix, modifiers) in DEFAULT_MODIFIERS {
            parser.register_modifier(prefix, *modifiers);
        }
        parser
    }

    /// Register a placeholder such as `<leader>` that expands to other notation
    ///
    /// `name` may be given with or without angle brackets and is
    /// case-insensitive.
    pub fn register_placeholder(&mut self, name: &str, value: impl Into<String>) {
        self.placeholders
            .insert(placeholder_key(name), value.into());
    }

    /// Look up the raw value of a placeholder
    pub fn placeholder(&self, name: &str) -> Option<&str> {
        self.placeholders.get(&placeholder_key(name)).map(String::as_str)
    }

    /// Register a modifier prefix (e.g. `"hyper-"`) standing for one or more modifiers
    ///
    /// A prefix that is already registered is replaced. Patterns are kept
    /// sorted longest first so longer aliases win over their own prefixes,
    /// with equal lengths in alphabetical order.
    pub fn register_modifier(&mut self, prefix: &str, modifiers: Modifiers) {
        let mut prefix = prefix.to_lowercase();
        if !prefix.ends_with('-') {
            prefix.push('-');
        }

        self.modifier_patterns.retain(|p| p.prefix != prefix);
        self.modifier_patterns.push(ModifierPattern { prefix, modifiers });
        self.modifier_patterns.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });
    }

    /// Registered modifier prefixes in match order
    pub fn modifier_prefixes(&self) -> impl Iterator<Item = &str> {
        self.modifier_patterns.iter().map(|p| p.prefix.as_str())
    }

    /// Parse a single notation token (`"a"`, `"A"`, `"<C-a>"`, `"<leader>"`)
    ///
    /// Unknown names and unregistered placeholders come back as literal keys.
    pub fn parse_key(&self, token: &str) -> NormalizedKey {
        let resolved = self.resolve_placeholder(token);

        let Some(inner) = strip_brackets(&resolved) else {
            return parse_bare(&resolved);
        };

        let lower = inner.to_lowercase();
        let mut rest = lower.as_str();
        let mut modifiers = Modifiers::NONE;

        'strip: loop {
            for pattern in &self.modifier_patterns {
                if rest.len() > pattern.prefix.len() && rest.starts_with(pattern.prefix.as_str()) {
                    modifiers |= pattern.modifiers;
                    rest = &rest[pattern.prefix.len()..];
                    continue 'strip;
                }
            }
            break;
        }

        let (key, implied) = resolve_key_name(rest);
        NormalizedKey::new(key, modifiers | implied)
    }

    /// Parse a whole notation string into keys
    ///
    /// `<...>` spans are single tokens, every other character is its own key.
    /// Placeholders may expand to several keys (`<leader>` → `,a`).
    pub fn parse_key_sequence(&self, notation: &str) -> Vec<NormalizedKey> {
        let mut keys = Vec::new();
        self.expand_into(notation, 0, &mut keys);
        keys
    }

    fn expand_into(&self, notation: &str, depth: usize, out: &mut Vec<NormalizedKey>) {
        for token in tokenize(notation) {
            match self.placeholders.get(&token.to_lowercase()) {
                Some(value) if depth < MAX_PLACEHOLDER_DEPTH => {
                    self.expand_into(value, depth + 1, out)
                }
                _ => out.push(self.parse_key(token)),
            }
        }
    }

    /// Normalize a live keyboard event
    ///
    /// The platform meta key is reported as super (vim `D-`). The remaining
    /// normalization is an ordered list of rules, first match wins.
    pub fn event_to_key(&self, event: &KeyboardEvent) -> NormalizedKey {
        let modifiers = Modifiers::new(
            event.ctrl_key,
            event.shift_key,
            event.alt_key,
            false,
            event.meta_key,
        );
        let raw = remap_option_symbol(&event.key);

        let (key, modifiers) = EVENT_RULES
            .iter()
            .find_map(|rule| rule(&raw, modifiers))
            .unwrap_or_else(|| (raw.to_lowercase(), modifiers));

        NormalizedKey::new(key, modifiers)
    }

    fn resolve_placeholder<'a>(&self, token: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(token);
        for _ in 0..MAX_PLACEHOLDER_DEPTH {
            match self.placeholders.get(&current.to_lowercase()) {
                Some(value) => current = Cow::Owned(value.clone()),
                None => return current,
            }
        }
        tracing::warn!("Placeholder {} does not resolve, treating it as literal", token);
        Cow::Borrowed(token)
    }
}

type EventRule = fn(&str, Modifiers) -> Option<(String, Modifiers)>;

const EVENT_RULES: &[EventRule] = &[
    // ArrowUp → up
    |key, mods| key.strip_prefix("Arrow").map(|rest| (rest.to_lowercase(), mods)),
    // f5 / F5 → F5
    |key, mods| function_key(key).map(|f| (f, mods)),
    // A → a + shift
    |key, mods| {
        let c = single_char(key)?;
        if !c.is_alphabetic() {
            return None;
        }
        if c.is_uppercase() {
            Some((c.to_lowercase().collect(), mods | Modifiers::SHIFT))
        } else {
            Some((c.to_string(), mods))
        }
    },
    // ? → S-/
    |key, mods| (key == "?").then(|| ("/".to_string(), mods | Modifiers::SHIFT)),
    // ! → ! (the shifted character already carries the shift)
    |key, mods| {
        let c = single_char(key)?;
        (c.is_ascii_punctuation() || c.is_ascii_digit())
            .then(|| (c.to_string(), mods.difference(Modifiers::SHIFT)))
    },
    |key, mods| Some((key.to_lowercase(), mods)),
];

/// Split notation into tokens: `<...>` spans are atomic, other chars stand alone
pub fn tokenize(notation: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = notation;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(offset) = rest[1..].find('>') {
                let end = offset + 1;
                if end > 1 && !rest[1..end].contains('<') {
                    tokens.push(&rest[..=end]);
                    rest = &rest[end + 1..];
                    continue;
                }
            }
        }

        let len = c.len_utf8();
        tokens.push(&rest[..len]);
        rest = &rest[len..];
    }

    tokens
}

/// Canonical string for a key: modifier prefixes then the key
///
/// Special keys are rendered in bracketed vim notation (`<Esc>`, `<F5>`),
/// everything else bare: `C-a`, `S-/`, `C-<Enter>`.
pub fn key_to_string(key: &str, modifiers: Modifiers) -> String {
    match key_name(key) {
        Some(name) => format!("{}<{}>", modifiers, name),
        None => format!("{}{}", modifiers, key),
    }
}

/// Structural equality over key and all five modifier flags
pub fn keys_match(a: &NormalizedKey, b: &NormalizedKey) -> bool {
    a.key() == b.key() && a.modifiers() == b.modifiers()
}

/// Check if a key name is a pure modifier press (`Shift`, `Control`, ...)
pub fn is_modifier_key(key: &str) -> bool {
    MODIFIER_KEY_NAMES.contains(&key)
}

/// Bracketed display name of a canonical key, if it has one
pub(crate) fn key_name(key: &str) -> Option<Cow<'static, str>> {
    if let Some((_, name)) = KEY_NAMES.iter().find(|(k, _)| *k == key) {
        return Some(Cow::Borrowed(name));
    }
    if key.starts_with('F') && function_key(key).is_some() {
        return Some(Cow::Owned(key.to_string()));
    }
    None
}

fn placeholder_key(name: &str) -> String {
    let name = name.to_lowercase();
    if strip_brackets(&name).is_some() {
        name
    } else {
        format!("<{}>", name)
    }
}

fn strip_brackets(token: &str) -> Option<&str> {
    token
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .filter(|inner| !inner.is_empty())
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// `f1`..`f24` in any case → `F1`..`F24`
fn function_key(name: &str) -> Option<String> {
    let digits = name.strip_prefix('f').or_else(|| name.strip_prefix('F'))?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n: u8 = digits.parse().ok()?;
    (1..=24).contains(&n).then(|| format!("F{}", n))
}

fn option_symbol(c: char) -> Option<char> {
    OPTION_SYMBOLS
        .iter()
        .find(|(symbol, _)| *symbol == c)
        .map(|(_, base)| *base)
}

fn remap_option_symbol(key: &str) -> Cow<'_, str> {
    match single_char(key).and_then(option_symbol) {
        Some(base) => Cow::Owned(base.to_string()),
        None => Cow::Borrowed(key),
    }
}

/// Resolve the (lowercased) key part of bracketed notation
fn resolve_key_name(name: &str) -> (String, Modifiers) {
    if name == "?" {
        return ("/".to_string(), Modifiers::SHIFT);
    }
    if let Some((_, canonical)) = SPECIAL_KEYS.iter().find(|(n, _)| *n == name) {
        return (canonical.to_string(), Modifiers::NONE);
    }
    if let Some(f) = function_key(name) {
        return (f, Modifiers::NONE);
    }
    if let Some(base) = single_char(name).and_then(option_symbol) {
        return (base.to_string(), Modifiers::NONE);
    }
    (name.to_string(), Modifiers::NONE)
}

/// Parse a token written without angle brackets
fn parse_bare(token: &str) -> NormalizedKey {
    let Some(c) = single_char(token) else {
        let (key, implied) = resolve_key_name(&token.to_lowercase());
        return NormalizedKey::new(key, implied);
    };

    if c == '?' {
        return NormalizedKey::new("/", Modifiers::SHIFT);
    }
    if let Some(base) = option_symbol(c) {
        return NormalizedKey::plain(base.to_string());
    }
    if c.is_alphabetic() && c.is_uppercase() {
        return NormalizedKey::new(c.to_lowercase().collect::<String>(), Modifiers::SHIFT);
    }
    NormalizedKey::plain(c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(keys: &[NormalizedKey]) -> Vec<&str> {
        keys.iter().map(NormalizedKey::as_str).collect()
    }

    #[test]
    fn test_parse_single_char() {
        let parser = KeyParser::new();
        let key = parser.parse_key("a");
        assert_eq!(key.key(), "a");
        assert!(key.modifiers().is_empty());
        assert_eq!(key.as_str(), "a");
    }

    #[test]
    fn test_uppercase_implies_shift() {
        let parser = KeyParser::new();
        let upper = parser.parse_key("A");
        assert_eq!(upper.key(), "a");
        assert!(upper.modifiers().shift());
        assert!(keys_match(&upper, &parser.parse_key("<S-a>")));
        assert_eq!(upper.as_str(), "S-a");
    }

    #[test]
    fn test_bracketed_uppercase_has_no_implicit_shift() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("<C-A>").as_str(), "C-a");
    }

    #[test]
    fn test_parse_control_round_trip() {
        let parser = KeyParser::new();
        let key = parser.parse_key("<C-a>");
        assert!(key.modifiers().ctrl());
        assert_eq!(key_to_string(key.key(), key.modifiers()), "C-a");
    }

    #[test]
    fn test_modifier_aliases() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("<ctrl-x>").as_str(), "C-x");
        assert_eq!(parser.parse_key("<Control-x>").as_str(), "C-x");
        assert_eq!(parser.parse_key("<A-x>").as_str(), "M-x");
        assert_eq!(parser.parse_key("<M-x>").as_str(), "M-x");
        assert_eq!(parser.parse_key("<D-x>").as_str(), "D-x");
        assert_eq!(parser.parse_key("<cmd-x>").as_str(), "D-x");
        assert_eq!(parser.parse_key("<T-x>").as_str(), "T-x");
    }

    #[test]
    fn test_meta_prefix_wins_over_m() {
        let parser = KeyParser::new();
        let key = parser.parse_key("<meta-x>");
        assert!(key.modifiers().meta());
        assert!(!key.modifiers().alt());
        assert_eq!(key.key(), "x");
    }

    #[test]
    fn test_stacked_modifiers_in_fixed_order() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("<S-C-M-a>").as_str(), "C-M-S-a");
        assert_eq!(parser.parse_key("<T-D-S-M-C-a>").as_str(), "C-M-S-D-T-a");
    }

    #[test]
    fn test_dash_key_after_modifier() {
        let parser = KeyParser::new();
        let key = parser.parse_key("<C-->");
        assert_eq!(key.key(), "-");
        assert!(key.modifiers().ctrl());
    }

    #[test]
    fn test_special_keys() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("<Esc>").key(), "escape");
        assert_eq!(parser.parse_key("<CR>").key(), "enter");
        assert_eq!(parser.parse_key("<Enter>").as_str(), "<Enter>");
        assert_eq!(parser.parse_key("<Space>").key(), " ");
        assert_eq!(parser.parse_key("<Bar>").key(), "|");
        assert_eq!(parser.parse_key("<Bslash>").key(), "\\");
        assert_eq!(parser.parse_key("<lt>").key(), "<");
        assert_eq!(parser.parse_key("<PageDown>").as_str(), "<PageDown>");
        assert_eq!(parser.parse_key("<C-Esc>").as_str(), "C-<Esc>");
    }

    #[test]
    fn test_function_keys_stay_uppercase() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("<f1>").key(), "F1");
        assert_eq!(parser.parse_key("<F12>").as_str(), "<F12>");
        assert_eq!(parser.parse_key("<S-F5>").as_str(), "S-<F5>");
    }

    #[test]
    fn test_bare_special_names() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("esc").key(), "escape");
        assert_eq!(parser.parse_key("enter").key(), "enter");
    }

    #[test]
    fn test_question_mark_is_shift_slash() {
        let parser = KeyParser::new();
        let bare = parser.parse_key("?");
        let bracketed = parser.parse_key("<?>");
        assert_eq!(bare.key(), "/");
        assert!(bare.modifiers().shift());
        assert_eq!(bare, bracketed);
    }

    #[test]
    fn test_option_symbols() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("€").key(), "2");
        assert_eq!(parser.parse_key("¡").key(), "1");
        assert_eq!(parser.parse_key("<M-å>").as_str(), "M-a");
    }

    #[test]
    fn test_unknown_tokens_are_literal() {
        let parser = KeyParser::new();
        assert_eq!(parser.parse_key("<leader>").key(), "leader");
        assert_eq!(parser.parse_key("<nope>").as_str(), "nope");
    }

    #[test]
    fn test_placeholder_resolves_recursively() {
        let mut parser = KeyParser::new();
        parser.register_placeholder("leader", "<localleader>");
        parser.register_placeholder("<LocalLeader>", "<Space>");

        assert_eq!(parser.parse_key("<leader>").key(), " ");
        assert_eq!(parser.placeholder("<LEADER>"), Some("<localleader>"));
    }

    #[test]
    fn test_placeholder_cycle_is_literal() {
        let mut parser = KeyParser::new();
        parser.register_placeholder("a", "<b>");
        parser.register_placeholder("b", "<a>");

        assert_eq!(parser.parse_key("<a>").key(), "a");
        assert_eq!(parser.parse_key_sequence("<a>").len(), 1);
    }

    #[test]
    fn test_parse_sequence() {
        let parser = KeyParser::new();
        let keys = parser.parse_key_sequence("gg<C-w>j?");
        assert_eq!(strings(&keys), vec!["g", "g", "C-w", "j", "S-/"]);
    }

    #[test]
    fn test_parse_sequence_expands_multi_key_placeholder() {
        let mut parser = KeyParser::new();
        parser.register_placeholder("leader", ",a");
        let keys = parser.parse_key_sequence("<leader>w");
        assert_eq!(strings(&keys), vec![",", "a", "w"]);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("ab"), vec!["a", "b"]);
        assert_eq!(tokenize("<C-a>b"), vec!["<C-a>", "b"]);
        assert_eq!(tokenize("<>"), vec!["<", ">"]);
        assert_eq!(tokenize("a<b"), vec!["a", "<", "b"]);
        assert_eq!(tokenize("<<a>"), vec!["<", "<a>"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_register_modifier_multi_flag() {
        let mut parser = KeyParser::new();
        parser.register_modifier(
            "hyper",
            Modifiers::SUPER | Modifiers::SHIFT | Modifiers::ALT | Modifiers::CTRL,
        );
        let key = parser.parse_key("<hyper-k>");
        assert_eq!(key.as_str(), "C-M-S-D-k");

        let prefixes: Vec<&str> = parser.modifier_prefixes().collect();
        let hyper = prefixes.iter().position(|p| *p == "hyper-").unwrap();
        assert!(prefixes[..hyper].iter().all(|p| p.len() >= "hyper-".len()));
        assert!(prefixes[hyper + 1..].iter().all(|p| p.len() <= "hyper-".len()));
    }

    #[test]
    fn test_register_modifier_replaces_existing() {
        let mut parser = KeyParser::new();
        let before = parser.modifier_prefixes().count();
        parser.register_modifier("m-", Modifiers::META);

        assert_eq!(parser.modifier_prefixes().count(), before);
        assert!(parser.parse_key("<M-x>").modifiers().meta());
    }

    #[test]
    fn test_modifier_prefixes_sorted_longest_first() {
        let parser = KeyParser::new();
        let prefixes: Vec<&str> = parser.modifier_prefixes().collect();
        assert!(prefixes
            .windows(2)
            .all(|w| w[0].len() > w[1].len() || (w[0].len() == w[1].len() && w[0] < w[1])));
    }

    #[test]
    fn test_event_letters() {
        let parser = KeyParser::new();
        assert_eq!(parser.event_to_key(&KeyboardEvent::new("a")).as_str(), "a");
        let upper = parser.event_to_key(&KeyboardEvent::new("A").shift());
        assert_eq!(upper, parser.parse_key("A"));
    }

    #[test]
    fn test_event_meta_is_super() {
        let parser = KeyParser::new();
        let key = parser.event_to_key(&KeyboardEvent::new("c").meta());
        assert!(key.modifiers().super_key());
        assert!(!key.modifiers().meta());
        assert_eq!(key, parser.parse_key("<D-c>"));
    }

    #[test]
    fn test_event_arrows_and_function_keys() {
        let parser = KeyParser::new();
        assert_eq!(
            parser.event_to_key(&KeyboardEvent::new("ArrowUp")),
            parser.parse_key("<Up>")
        );
        assert_eq!(parser.event_to_key(&KeyboardEvent::new("f5")).key(), "F5");
        assert_eq!(
            parser.event_to_key(&KeyboardEvent::new("F5").ctrl()),
            parser.parse_key("<C-F5>")
        );
    }

    #[test]
    fn test_event_named_keys_match_notation() {
        let parser = KeyParser::new();
        for (event, notation) in [
            ("Escape", "<Esc>"),
            ("Enter", "<CR>"),
            (" ", "<Space>"),
            ("Tab", "<Tab>"),
            ("Backspace", "<BS>"),
            ("Delete", "<Del>"),
            ("PageUp", "<PageUp>"),
        ] {
            assert_eq!(
                parser.event_to_key(&KeyboardEvent::new(event)),
                parser.parse_key(notation),
                "{} should match {}",
                event,
                notation
            );
        }
    }

    #[test]
    fn test_event_shifted_symbols() {
        let parser = KeyParser::new();
        assert_eq!(
            parser.event_to_key(&KeyboardEvent::new("?").shift()),
            parser.parse_key("?")
        );
        assert_eq!(
            parser.event_to_key(&KeyboardEvent::new("!").shift()),
            parser.parse_key("!")
        );
    }

    #[test]
    fn test_event_option_symbol() {
        let parser = KeyParser::new();
        let key = parser.event_to_key(&KeyboardEvent::new("å").alt());
        assert_eq!(key.as_str(), "M-a");
    }

    #[test]
    fn test_is_modifier_key() {
        assert!(is_modifier_key("Shift"));
        assert!(is_modifier_key("Meta"));
        assert!(!is_modifier_key("a"));
        assert!(!is_modifier_key("Escape"));
    }
}
