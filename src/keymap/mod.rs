//! Modal key-sequence processing
//!
//! This module turns a stream of keyboard events into actions:
//! - Vim-style notation for bindings (`<C-w>j`, `gg`, `<leader>ff`)
//! - Per-mode tries with multi-key sequences and ambiguous prefixes
//! - Sequence and ambiguity timeouts, force-execute keys
//! - Held-key repeat at a fixed interval
//! - Lifecycle hooks per node and per processor
//! - User customization via layered YAML keymaps
//!
//! # Architecture
//!
//! ```text
//! KeyboardEvent → KeyParser::event_to_key() → NormalizedKey
//!              → KeyProcessor (mode trie walk, timers) → Dispatch<A>
//! ```
//!
//! # Loading Keymaps
//!
//! ```ignore
//! // Embedded defaults + ./keymap.yaml + user keymap
//! let mut processor = load_default_keymap();
//!
//! // Or build one by hand
//! let mut processor = KeyProcessor::new(ProcessorConfig::default());
//! processor.set("gg", "scroll_top", BindingOptions::default());
//! ```

mod config;
mod context;
mod defaults;
mod notation;
mod processor;
mod trie;
mod types;
#[cfg(feature = "winit")]
mod winit_adapter;

pub use config::{
    apply_keymap, get_current_platform, load_keymap_file, parse_keymap_yaml, BindingConfig,
    KeymapConfig, KeymapError, ModifierConfig, SettingsConfig, UNBOUND,
};
pub use context::{KeyContext, TimeoutKind};
pub use defaults::{
    build_processor, default_layers, get_default_keymap_yaml, get_user_config_path,
    load_default_keymap,
};
pub use notation::{is_modifier_key, key_to_string, keys_match, tokenize, KeyParser};
pub use processor::{
    Dispatch, KeyOutcome, KeyProcessor, ProcessorConfig, ProcessorHooks, ProcessorState, Timer,
};
pub use trie::{BindingOptions, NodeHooks, NodeMetadata, Repeat, Trie, TrieNode};
pub use types::{KeyboardEvent, Modifiers, NormalizedKey};
#[cfg(feature = "winit")]
pub use winit_adapter::{event_from_key_event, event_from_winit};

#[cfg(test)]
mod tests;
