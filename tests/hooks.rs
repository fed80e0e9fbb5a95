//! Hook registry tests

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{event_log, feed, record, test_processor};
use keyseq::Hook;

#[test]
fn test_failing_listener_is_isolated() {
    let hook: Hook<u32, u32> = Hook::new();
    hook.register(|_| Err(anyhow::anyhow!("boom")));
    hook.register(|x| Ok(x * 2));

    assert_eq!(hook.trigger(&21), vec![None, Some(42)]);
}

#[test]
fn test_error_handler_receives_failure() {
    let hook: Hook<(), ()> = Hook::new();
    let errors = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&errors);
    hook.register_with_error(
        |_| Err(anyhow::anyhow!("listener broke")),
        move |e| sink.borrow_mut().push(e.to_string()),
    );

    hook.trigger(&());
    assert_eq!(*errors.borrow(), vec!["listener broke"]);
}

#[test]
fn test_unregister_stops_delivery() {
    let mut processor = test_processor();
    let log = event_log();

    let handle = processor.hooks().on_complete.register(record(&log, "complete"));
    feed(&mut processor, "G");
    handle.unregister();
    feed(&mut processor, "G");

    assert_eq!(*log.borrow(), vec!["complete:S-g"]);
}

#[test]
fn test_node_hooks_along_path() {
    let mut processor = test_processor();
    let log = event_log();

    processor.set("<C-w>j", "window_down", Default::default());
    let prefix = processor.node_hooks("<C-w>").unwrap();
    prefix.on_match.register(record(&log, "prefix-match"));
    prefix.on_complete.register(record(&log, "prefix-complete"));
    prefix.on_branch_failed.register(record(&log, "prefix-failed"));

    let leaf = processor.node_hooks("<C-w>j").unwrap();
    leaf.on_match.register(record(&log, "leaf-match"));
    leaf.on_complete.register(record(&log, "leaf-complete"));

    assert_eq!(feed(&mut processor, "<C-w>j"), vec!["window_down"]);
    assert_eq!(
        *log.borrow(),
        vec![
            "prefix-match:C-w",
            "leaf-match:C-w j",
            "prefix-complete:C-w j",
            "leaf-complete:C-w j",
        ]
    );

    log.borrow_mut().clear();
    assert!(feed(&mut processor, "<C-w>x").is_empty());
    assert_eq!(*log.borrow(), vec!["prefix-match:C-w", "prefix-failed:C-w"]);
}
