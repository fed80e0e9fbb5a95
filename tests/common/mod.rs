//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use keyseq::keymap::{BindingOptions, KeyContext, KeyProcessor, ProcessorConfig};

/// Processor with a small vim-like normal mode
///
/// - `gg` top, `G` bottom
/// - `d` / `dd` ambiguous pair
/// - `<C-w>` + hjkl window moves
/// - `j` repeating scroll
pub fn test_processor() -> KeyProcessor<&'static str> {
    let mut processor = KeyProcessor::new(ProcessorConfig::default());
    processor.set("gg", "top", BindingOptions::default());
    processor.set("G", "bottom", BindingOptions::default());
    processor.set("d", "delete", BindingOptions::default());
    processor.set("dd", "delete_line", BindingOptions::default());
    processor.set("<C-w>h", "window_left", BindingOptions::default());
    processor.set("<C-w>l", "window_right", BindingOptions::default());
    processor.set("j", "scroll_down", BindingOptions::repeating());
    processor
}

/// Feed every key of a notation string, collecting dispatched actions
pub fn feed<A: Clone>(processor: &mut KeyProcessor<A>, notation: &str) -> Vec<A> {
    processor
        .parser()
        .parse_key_sequence(notation)
        .into_iter()
        .filter_map(|key| processor.process_key(key).dispatch)
        .map(|dispatch| dispatch.action)
        .collect()
}

/// Shared log for hook listeners
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Listener that appends `label:sequence` to the log
pub fn record(
    log: &EventLog,
    label: &'static str,
) -> impl FnMut(&KeyContext) -> anyhow::Result<()> + 'static {
    let log = Rc::clone(log);
    move |ctx| {
        log.borrow_mut()
            .push(format!("{}:{}", label, ctx.sequence.join(" ")));
        Ok(())
    }
}
