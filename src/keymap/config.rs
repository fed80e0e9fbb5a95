//! YAML configuration parsing for keymaps
//!
//! A keymap file carries processor settings, placeholders, extra modifier
//! prefixes and per-mode bindings. Files are applied to a processor in
//! layers; see [`super::defaults::load_default_keymap`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::processor::{KeyProcessor, ProcessorConfig, Timer};
use super::trie::{BindingOptions, Repeat};
use super::types::Modifiers;
use crate::scheduler::Scheduler;

/// Action name that removes a binding defined by an earlier layer
pub const UNBOUND: &str = "Unbound";

/// Root structure of a keymap YAML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeymapConfig {
    pub settings: SettingsConfig,
    pub placeholders: BTreeMap<String, String>,
    pub modifiers: Vec<ModifierConfig>,
    pub modes: BTreeMap<String, Vec<BindingConfig>>,
}

/// Processor settings; fields left out keep the previous layer's value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    pub key_timeout_ms: Option<u64>,
    pub ambiguity_timeout_ms: Option<u64>,
    pub repeat_interval_ms: Option<u64>,
    pub force_execute_keys: Option<Vec<String>>,
    pub default_mode: Option<String>,
    pub forward_unmatched: Option<bool>,
    /// Merged key by key into the ambient context
    pub context: Map<String, Value>,
}

/// An extra modifier prefix, e.g. `hyper-` → ctrl+alt+shift+super
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModifierConfig {
    pub prefix: String,
    pub flags: Vec<String>,
}

/// A single binding entry from YAML
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    pub keys: String,
    pub action: String,
    #[serde(default)]
    pub repeat: Option<Repeat>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SettingsConfig {
    /// Overlay the fields present in this layer onto `config`
    pub fn apply(&self, config: &mut ProcessorConfig) {
        if let Some(ms) = self.key_timeout_ms {
            config.key_timeout_ms = ms;
        }
        if let Some(ms) = self.ambiguity_timeout_ms {
            config.ambiguity_timeout_ms = ms;
        }
        if let Some(ms) = self.repeat_interval_ms {
            config.repeat_interval_ms = ms;
        }
        if let Some(keys) = &self.force_execute_keys {
            config.force_execute_keys = keys.clone();
        }
        if let Some(mode) = &self.default_mode {
            config.default_mode = mode.clone();
        }
        if let Some(forward) = self.forward_unmatched {
            config.forward_unmatched = forward;
        }
        config
            .context
            .extend(self.context.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl ModifierConfig {
    pub fn modifiers(&self) -> Result<Modifiers, KeymapError> {
        self.flags
            .iter()
            .try_fold(Modifiers::NONE, |mods, flag| Ok(mods | parse_modifier_flag(flag)?))
    }
}

impl BindingConfig {
    pub fn is_unbound(&self) -> bool {
        self.action == UNBOUND
    }

    /// Check the `platform:` filter against the running platform
    pub fn applies_to_current_platform(&self) -> bool {
        self.platform
            .as_deref()
            .map_or(true, |platform| platform.eq_ignore_ascii_case(get_current_platform()))
    }

    pub fn options(&self) -> BindingOptions {
        BindingOptions {
            repeat: self.repeat,
            metadata: self.metadata.clone(),
        }
    }
}

/// Load a keymap from a YAML file
pub fn load_keymap_file(path: &Path) -> Result<KeymapConfig, KeymapError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| KeymapError::IoError(format!("{}: {}", path.display(), e)))?;

    parse_keymap_yaml(&content)
}

/// Parse and validate a keymap from a YAML string
pub fn parse_keymap_yaml(yaml: &str) -> Result<KeymapConfig, KeymapError> {
    let config: KeymapConfig =
        serde_yaml::from_str(yaml).map_err(|e| KeymapError::ParseError(e.to_string()))?;

    for modifier in &config.modifiers {
        if modifier.prefix.trim_end_matches('-').is_empty() {
            return Err(KeymapError::InvalidModifier(format!(
                "empty prefix in {:?}",
                modifier.prefix
            )));
        }
        modifier.modifiers()?;
    }

    for (mode, bindings) in &config.modes {
        if mode.is_empty() {
            return Err(KeymapError::InvalidMode(mode.clone()));
        }
        if let Some(binding) = bindings.iter().find(|b| b.keys.is_empty()) {
            return Err(KeymapError::InvalidKey(format!(
                "empty key sequence for action {} in mode {}",
                binding.action, mode
            )));
        }
    }

    Ok(config)
}

/// Apply one keymap layer to a processor
///
/// Settings are overlaid first, then modifier prefixes and placeholders are
/// registered, then bindings are added in file order. `action: Unbound`
/// removes a binding from an earlier layer. Returns the number of bindings
/// added.
pub fn apply_keymap<S: Scheduler<Timer>>(
    processor: &mut KeyProcessor<String, S>,
    config: &KeymapConfig,
) -> Result<usize, KeymapError> {
    let mut settings = processor.config().clone();
    config.settings.apply(&mut settings);
    if settings != *processor.config() {
        processor.configure(settings);
    }

    for modifier in &config.modifiers {
        processor
            .parser_mut()
            .register_modifier(&modifier.prefix, modifier.modifiers()?);
    }
    for (name, value) in &config.placeholders {
        processor.parser_mut().register_placeholder(name, value.clone());
    }

    let mut added = 0;
    for (mode, bindings) in &config.modes {
        processor.init_mode(mode);
        for binding in bindings {
            if !binding.applies_to_current_platform() {
                tracing::trace!("Skipping {} for platform {:?}", binding.keys, binding.platform);
                continue;
            }
            if binding.is_unbound() {
                if !processor.unset_in_mode(mode, &binding.keys) {
                    tracing::debug!("Unbound {} was not bound in mode {}", binding.keys, mode);
                }
                continue;
            }
            processor.set_in_mode(mode, &binding.keys, binding.action.clone(), binding.options());
            added += 1;
        }
    }

    Ok(added)
}

fn parse_modifier_flag(flag: &str) -> Result<Modifiers, KeymapError> {
    match flag.to_lowercase().as_str() {
        "ctrl" | "control" => Ok(Modifiers::CTRL),
        "alt" | "option" | "opt" => Ok(Modifiers::ALT),
        "shift" => Ok(Modifiers::SHIFT),
        "meta" => Ok(Modifiers::META),
        "super" | "cmd" | "command" | "win" => Ok(Modifiers::SUPER),
        _ => Err(KeymapError::InvalidModifier(flag.to_string())),
    }
}

/// Get the current platform identifier
pub fn get_current_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        "linux"
    }
}

/// Errors that can occur when loading keymaps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeymapError {
    IoError(String),
    ParseError(String),
    InvalidKey(String),
    InvalidModifier(String),
    InvalidMode(String),
}

impl std::fmt::Display for KeymapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeymapError::IoError(e) => write!(f, "IO error: {}", e),
            KeymapError::ParseError(e) => write!(f, "Parse error: {}", e),
            KeymapError::InvalidKey(k) => write!(f, "Invalid key: {}", k),
            KeymapError::InvalidModifier(m) => write!(f, "Invalid modifier: {}", m),
            KeymapError::InvalidMode(m) => write!(f, "Invalid mode name: {:?}", m),
        }
    }
}

impl std::error::Error for KeymapError {}
