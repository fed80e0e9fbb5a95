//! Integration tests for the keymap system

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::*;
use crate::scheduler::VirtualClock;

/// Embedded default keymap YAML for testing
const DEFAULT_KEYMAP_YAML: &str = include_str!("../../keymap.yaml");

fn default_processor() -> KeyProcessor<String> {
    let config = parse_keymap_yaml(DEFAULT_KEYMAP_YAML)
        .expect("Embedded keymap.yaml should parse successfully");
    build_processor(&[config], VirtualClock::new()).expect("Embedded keymap should apply")
}

fn type_keys(processor: &mut KeyProcessor<String>, notation: &str) -> Vec<String> {
    let keys = processor.parser().parse_key_sequence(notation);
    keys.into_iter()
        .filter_map(|key| processor.process_key(key).dispatch)
        .map(|dispatch| dispatch.action)
        .collect()
}

fn event(processor: &mut KeyProcessor<String>, event: KeyboardEvent) -> Option<String> {
    processor.process_key_event(&event).dispatch.map(|d| d.action)
}

#[test]
fn test_embedded_yaml_has_essential_bindings() {
    let processor = default_processor();
    let actions: Vec<String> = processor
        .bindings("normal")
        .into_iter()
        .map(|(_, action)| action.clone())
        .collect();

    for expected in ["scroll_down", "scroll_top", "enter_insert", "show_help"] {
        assert!(
            actions.iter().any(|a| a == expected),
            "Should have {} binding",
            expected
        );
    }
}

#[test]
fn test_typing_sequences() {
    let mut processor = default_processor();
    assert_eq!(type_keys(&mut processor, "gg"), vec!["scroll_top"]);
    assert_eq!(type_keys(&mut processor, "G"), vec!["scroll_bottom"]);
    assert_eq!(type_keys(&mut processor, "gT"), vec!["previous_tab"]);
    assert_eq!(type_keys(&mut processor, "<Space>ff"), vec!["find_files"]);
}

#[test]
fn test_browser_events_match_notation() {
    let mut processor = default_processor();

    assert_eq!(
        event(&mut processor, KeyboardEvent::new("G").shift()).as_deref(),
        Some("scroll_bottom")
    );
    assert_eq!(
        event(&mut processor, KeyboardEvent::new("?").shift()).as_deref(),
        Some("show_help")
    );
    assert_eq!(
        event(&mut processor, KeyboardEvent::new("d").ctrl()).as_deref(),
        Some("half_page_down")
    );
    assert_eq!(
        event(&mut processor, KeyboardEvent::new("/")).as_deref(),
        Some("enter_search")
    );
}

#[test]
fn test_ambiguous_close_tab() {
    let mut processor = default_processor();

    assert!(type_keys(&mut processor, "d").is_empty());
    assert_eq!(processor.state(), ProcessorState::Ambiguous);

    let fired = processor.advance(Duration::from_millis(500));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].action, "close_tab");

    assert_eq!(type_keys(&mut processor, "dd"), vec!["close_other_tabs"]);
}

#[test]
fn test_mode_switch_from_dispatch() {
    let mut processor = default_processor();

    let actions = type_keys(&mut processor, "i");
    assert_eq!(actions, vec!["enter_insert"]);
    processor.set_mode("insert");

    // Unbound keys in insert mode pass through to the page
    let outcome = processor.process_key_event(&KeyboardEvent::new("x"));
    assert!(!outcome.consumed);

    assert_eq!(type_keys(&mut processor, "jk"), vec!["leave_insert"]);
    processor.set_mode("normal");
    assert_eq!(processor.mode(), "normal");
}

#[test]
fn test_held_scroll_repeats() {
    let mut processor = default_processor();

    assert_eq!(
        event(&mut processor, KeyboardEvent::new("j")).as_deref(),
        Some("scroll_down")
    );
    // OS auto-repeat is absorbed while our own repeat runs
    assert!(processor
        .process_key_event(&KeyboardEvent::new("j").repeated())
        .consumed);

    let ticks = processor.advance(Duration::from_millis(250));
    assert_eq!(ticks.len(), 2);
    assert!(ticks.iter().all(|d| d.repeat && d.action == "scroll_down"));

    processor.handle_key_up(&KeyboardEvent::new("j"));
    assert!(processor.advance(Duration::from_millis(500)).is_empty());
}

#[test]
fn test_hooks_observe_default_keymap() {
    let mut processor = default_processor();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&seen);
    processor.hooks().on_node_matched.register(move |ctx| {
        log.borrow_mut().push(ctx.sequence.join(" "));
        Ok(())
    });

    type_keys(&mut processor, "<Space>fb");
    assert_eq!(
        *seen.borrow(),
        vec!["<Space>", "<Space> f", "<Space> f b"]
    );
}

#[test]
fn test_user_layer_adds_modifier_prefix() {
    let base = parse_keymap_yaml(DEFAULT_KEYMAP_YAML).unwrap();
    let user = parse_keymap_yaml(
        "modes:\n  normal:\n    - keys: \"<hyper-k>\"\n      action: kill_all\n",
    )
    .unwrap();

    let mut processor = build_processor(&[base, user], VirtualClock::new()).unwrap();
    let key = KeyboardEvent::new("k").ctrl().alt().shift().meta();
    assert_eq!(event(&mut processor, key).as_deref(), Some("kill_all"));
}
