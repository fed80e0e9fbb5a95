//! keyseq - modal key-sequence processing
//!
//! This crate maps keyboard events to actions through vim-style key
//! sequences, with per-mode bindings, timeouts, held-key repeat and
//! lifecycle hooks.

pub mod cli;
pub mod config_paths;
pub mod hook;
pub mod keymap;
pub mod replay;
pub mod scheduler;
pub mod tracing;

// Re-export commonly used types
pub use hook::{Hook, Unregister};
pub use keymap::{
    BindingOptions, Dispatch, KeyOutcome, KeyParser, KeyProcessor, KeyboardEvent, NormalizedKey,
    ProcessorConfig,
};
pub use scheduler::{Scheduler, SystemClock, TimerId, VirtualClock};
