//! Adapter to convert winit key events into [`KeyboardEvent`]s
//!
//! Only compiled with the `winit` feature.

use winit::event::KeyEvent;
use winit::keyboard::{Key, ModifiersState, NamedKey};

use super::types::KeyboardEvent;

const FUNCTION_KEYS: [NamedKey; 24] = [
    NamedKey::F1,
    NamedKey::F2,
    NamedKey::F3,
    NamedKey::F4,
    NamedKey::F5,
    NamedKey::F6,
    NamedKey::F7,
    NamedKey::F8,
    NamedKey::F9,
    NamedKey::F10,
    NamedKey::F11,
    NamedKey::F12,
    NamedKey::F13,
    NamedKey::F14,
    NamedKey::F15,
    NamedKey::F16,
    NamedKey::F17,
    NamedKey::F18,
    NamedKey::F19,
    NamedKey::F20,
    NamedKey::F21,
    NamedKey::F22,
    NamedKey::F23,
    NamedKey::F24,
];

/// Convert winit key data into a host-neutral keyboard event
///
/// Returns None if the key cannot be mapped (e.g., unidentified or dead keys)
pub fn event_from_winit(
    logical_key: &Key,
    ctrl: bool,
    shift: bool,
    alt: bool,
    logo: bool, // logo = cmd on macOS, win elsewhere
    repeat: bool,
) -> Option<KeyboardEvent> {
    let key = match logical_key {
        Key::Named(named) => named_key(*named)?,
        Key::Character(s) => {
            if s.is_empty() {
                return None;
            }
            s.to_string()
        }
        _ => return None,
    };

    Some(KeyboardEvent {
        key,
        ctrl_key: ctrl,
        alt_key: alt,
        shift_key: shift,
        meta_key: logo,
        repeat,
    })
}

/// Convert a winit `KeyEvent` with the window's current modifier state
pub fn event_from_key_event(event: &KeyEvent, modifiers: ModifiersState) -> Option<KeyboardEvent> {
    event_from_winit(
        &event.logical_key,
        modifiers.control_key(),
        modifiers.shift_key(),
        modifiers.alt_key(),
        modifiers.super_key(),
        event.repeat,
    )
}

/// DOM-style name of a winit named key
fn named_key(named: NamedKey) -> Option<String> {
    let name = match named {
        NamedKey::Enter => "Enter",
        NamedKey::Escape => "Escape",
        NamedKey::Tab => "Tab",
        NamedKey::Backspace => "Backspace",
        NamedKey::Delete => "Delete",
        NamedKey::Space => " ",

        // Arrows
        NamedKey::ArrowUp => "ArrowUp",
        NamedKey::ArrowDown => "ArrowDown",
        NamedKey::ArrowLeft => "ArrowLeft",
        NamedKey::ArrowRight => "ArrowRight",

        // Navigation
        NamedKey::Home => "Home",
        NamedKey::End => "End",
        NamedKey::PageUp => "PageUp",
        NamedKey::PageDown => "PageDown",
        NamedKey::Insert => "Insert",

        // Pure modifiers, filtered by the processor
        NamedKey::Shift => "Shift",
        NamedKey::Control => "Control",
        NamedKey::Alt => "Alt",
        NamedKey::AltGraph => "AltGraph",
        NamedKey::Super => "Super",
        NamedKey::Meta => "Meta",
        NamedKey::Hyper => "Hyper",
        NamedKey::CapsLock => "CapsLock",
        NamedKey::Fn => "Fn",

        other => {
            let n = FUNCTION_KEYS.iter().position(|f| *f == other)?;
            return Some(format!("F{}", n + 1));
        }
    };
    Some(name.to_string())
}
