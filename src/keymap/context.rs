//! Context snapshots handed to hook listeners
//!
//! Every hook call receives a fresh [`KeyContext`] describing where the
//! processor is in the current attempt. Listeners cannot reach the processor
//! itself; the only ways to influence flow are the `on_key` vote and
//! [`KeyContext::reset_timeout`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use super::types::NormalizedKey;

/// The two mutually exclusive sequence-resolution timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// Waiting for the next key of an incomplete sequence
    Sequence,
    /// Waiting to see whether an ambiguous match gets extended
    Ambiguous,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutKind::Sequence => f.write_str("sequence"),
            TimeoutKind::Ambiguous => f.write_str("ambiguous"),
        }
    }
}

/// Snapshot of the processor state at the time of a hook call
#[derive(Debug, Clone, Default)]
pub struct KeyContext {
    /// The key being processed, `None` for timer-driven calls
    pub key: Option<NormalizedKey>,
    /// Key strings walked from the root, including the current node
    pub sequence: Vec<String>,
    pub mode: String,
    /// Edge label of the current node, `None` at the root
    pub current_key: Option<String>,
    /// Key strings walked before the current node
    pub matched_path: Vec<String>,
    pub force_execute_keys: Vec<String>,
    /// Which timer expired, for `on_timeout` listeners
    pub timeout: Option<TimeoutKind>,
    /// Ambient values set through `ProcessorConfig::context`
    pub context: Map<String, Value>,
    timeout_request: Rc<Cell<Option<TimeoutKind>>>,
}

impl KeyContext {
    pub(crate) fn new(
        key: Option<NormalizedKey>,
        sequence: &[String],
        mode: &str,
        force_execute_keys: &[String],
        context: &Map<String, Value>,
        timeout_request: Rc<Cell<Option<TimeoutKind>>>,
    ) -> Self {
        let (current_key, matched_path) = match sequence.split_last() {
            Some((last, rest)) => (Some(last.clone()), rest.to_vec()),
            None => (None, Vec::new()),
        };

        Self {
            key,
            sequence: sequence.to_vec(),
            mode: mode.to_string(),
            current_key,
            matched_path,
            force_execute_keys: force_execute_keys.to_vec(),
            timeout: None,
            context: context.clone(),
            timeout_request,
        }
    }

    pub(crate) fn with_timeout(mut self, kind: TimeoutKind) -> Self {
        self.timeout = Some(kind);
        self
    }

    /// Ask the processor to (re)start the sequence timer of the given kind
    ///
    /// Honored once the current hook round finishes and only while a
    /// sequence is in progress. During `on_timeout` this extends the
    /// expiring timer instead of resolving it. While an ambiguous match is
    /// pending the restarted timer is always an ambiguity timer.
    pub fn reset_timeout(&self, kind: TimeoutKind) {
        self.timeout_request.set(Some(kind));
    }

    /// Look up an ambient context value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }

    /// Check if the processor is at the root of its trie
    pub fn at_root(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The sequence as one string, e.g. `"gC-w"`
    pub fn sequence_string(&self) -> String {
        self.sequence.concat()
    }
}
