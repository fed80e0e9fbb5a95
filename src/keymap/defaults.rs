//! Default keymap and layered loading
//!
//! The default keymap ships embedded in the binary. Project-local and user
//! keymaps are layered on top of it.

use std::path::{Path, PathBuf};

use super::config::{apply_keymap, load_keymap_file, parse_keymap_yaml, KeymapConfig, KeymapError};
use super::processor::{KeyProcessor, ProcessorConfig, Timer};
use crate::scheduler::{Scheduler, VirtualClock};

/// Default keymap YAML embedded at compile time
const DEFAULT_KEYMAP_YAML: &str = include_str!("../../keymap.yaml");

/// The embedded default keymap source
pub fn get_default_keymap_yaml() -> &'static str {
    DEFAULT_KEYMAP_YAML
}

/// Get the user's keymap configuration path
///
/// Returns `~/.config/keyseq/keymap.yaml` on Unix
/// Returns `%APPDATA%\keyseq\keymap.yaml` on Windows
pub fn get_user_config_path() -> Option<PathBuf> {
    crate::config_paths::keymap_file()
}

/// Collect the keymap layers in loading order
///
/// 1. Embedded default keymap (compiled into binary)
/// 2. keymap.yaml in current directory (project-local overrides)
/// 3. User config at ~/.config/keyseq/keymap.yaml
///
/// A broken optional layer is logged and skipped.
pub fn default_layers() -> Vec<KeymapConfig> {
    let mut layers = Vec::with_capacity(3);

    match parse_keymap_yaml(DEFAULT_KEYMAP_YAML) {
        Ok(config) => {
            tracing::info!("Loaded embedded default keymap");
            layers.push(config);
        }
        Err(e) => tracing::warn!("Failed to parse embedded keymap: {}", e),
    }

    let local = Path::new("keymap.yaml");
    if local.exists() {
        match load_keymap_file(local) {
            Ok(config) => {
                tracing::info!("Merging project keymap.yaml");
                layers.push(config);
            }
            Err(e) => tracing::warn!("Failed to load project keymap.yaml: {}", e),
        }
    }

    if let Some(user_path) = get_user_config_path() {
        if user_path.exists() {
            match load_keymap_file(&user_path) {
                Ok(config) => {
                    tracing::info!("Merging user keymap from {}", user_path.display());
                    layers.push(config);
                }
                Err(e) => {
                    tracing::warn!("Failed to load user keymap from {}: {}", user_path.display(), e);
                }
            }
        }
    }

    layers
}

/// Build a processor from keymap layers, each overriding the previous
///
/// The processor starts in the resulting default mode.
pub fn build_processor<S: Scheduler<Timer>>(
    layers: &[KeymapConfig],
    scheduler: S,
) -> Result<KeyProcessor<String, S>, KeymapError> {
    let mut processor = KeyProcessor::with_scheduler(ProcessorConfig::default(), scheduler);

    for layer in layers {
        let added = apply_keymap(&mut processor, layer)?;
        tracing::debug!("Applied keymap layer ({} bindings)", added);
    }

    let default_mode = processor.config().default_mode.clone();
    processor.set_mode(&default_mode);
    Ok(processor)
}

/// Load defaults + project + user keymaps into a processor
///
/// Never fails: if a layer cannot be applied the processor falls back to the
/// layers before it.
pub fn load_default_keymap() -> KeyProcessor<String> {
    let layers = default_layers();

    for end in (0..=layers.len()).rev() {
        match build_processor(&layers[..end], VirtualClock::new()) {
            Ok(processor) => return processor,
            Err(e) => tracing::warn!("Dropping keymap layer {}: {}", end, e),
        }
    }

    KeyProcessor::new(ProcessorConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded() -> KeyProcessor<String> {
        let config = parse_keymap_yaml(DEFAULT_KEYMAP_YAML).unwrap();
        build_processor(&[config], VirtualClock::new()).unwrap()
    }

    fn action_for(processor: &KeyProcessor<String>, mode: &str, sequence: &[&str]) -> Option<String> {
        processor
            .bindings(mode)
            .into_iter()
            .find(|(seq, _)| seq == sequence)
            .map(|(_, action)| action.clone())
    }

    #[test]
    fn test_embedded_keymap_parses() {
        let config = parse_keymap_yaml(get_default_keymap_yaml()).unwrap();
        assert!(config.modes.contains_key("normal"));
        assert!(config.modes.contains_key("insert"));
    }

    #[test]
    fn test_embedded_keymap_bindings() {
        let processor = embedded();
        assert_eq!(processor.mode(), "normal");
        assert_eq!(action_for(&processor, "normal", &["g", "g"]).as_deref(), Some("scroll_top"));
        assert_eq!(action_for(&processor, "normal", &["S-g"]).as_deref(), Some("scroll_bottom"));
        assert_eq!(action_for(&processor, "normal", &["S-/"]).as_deref(), Some("show_help"));
        assert_eq!(
            action_for(&processor, "normal", &["<Space>", "f", "f"]).as_deref(),
            Some("find_files")
        );
        assert_eq!(action_for(&processor, "insert", &["<Esc>"]).as_deref(), Some("leave_insert"));
    }

    #[test]
    fn test_platform_specific_reload() {
        let processor = embedded();
        let reloads = processor
            .bindings("normal")
            .into_iter()
            .filter(|(_, action)| action.as_str() == "reload")
            .count();
        assert_eq!(reloads, 1);
    }

    #[test]
    fn test_later_layer_overrides() {
        let base = parse_keymap_yaml(DEFAULT_KEYMAP_YAML).unwrap();
        let user = parse_keymap_yaml(
            r#"
settings:
  ambiguity_timeout_ms: 200
placeholders:
  leader: ","
modes:
  normal:
    - keys: "gg"
      action: Unbound
    - keys: "j"
      action: next_item
    - keys: "<leader>q"
      action: quit
"#,
        )
        .unwrap();

        let processor = build_processor(&[base, user], VirtualClock::new()).unwrap();
        assert_eq!(processor.config().ambiguity_timeout_ms, 200);
        assert_eq!(processor.config().key_timeout_ms, 1000);
        assert_eq!(action_for(&processor, "normal", &["g", "g"]), None);
        assert_eq!(action_for(&processor, "normal", &["j"]).as_deref(), Some("next_item"));
        assert_eq!(action_for(&processor, "normal", &[",", "q"]).as_deref(), Some("quit"));
        // Bindings parsed before the placeholder changed keep their keys
        assert_eq!(
            action_for(&processor, "normal", &["<Space>", "y"]).as_deref(),
            Some("copy_url")
        );
    }

    #[test]
    fn test_build_starts_in_default_mode() {
        let config = parse_keymap_yaml("settings:\n  default_mode: insert\n").unwrap();
        let processor = build_processor(&[config], VirtualClock::new()).unwrap();
        assert_eq!(processor.mode(), "insert");
    }

    #[test]
    fn test_get_user_config_path_ends_with_keymap() {
        if let Some(path) = get_user_config_path() {
            assert!(path.ends_with("keyseq/keymap.yaml"));
        }
    }
}
