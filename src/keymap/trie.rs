//! Per-mode trie of key sequences
//!
//! Edges are canonical key strings (`NormalizedKey::as_str`). A node is
//! *completable* when a binding ends there; actions themselves live in the
//! processor's action table, the trie only knows about matching.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::KeyContext;
use crate::hook::Hook;

/// Repeat setting for a binding: `true` or `{ interval: 30 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Repeat {
    Enabled(bool),
    Interval { interval: u64 },
}

impl Repeat {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Repeat::Enabled(false))
    }

    /// Per-binding interval override
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Repeat::Interval { interval } => Some(Duration::from_millis(*interval)),
            Repeat::Enabled(_) => None,
        }
    }
}

/// Open metadata bag attached to a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMetadata {
    pub repeat: Option<Repeat>,
    pub extra: Map<String, Value>,
}

/// Options accepted when inserting a sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingOptions {
    pub repeat: Option<Repeat>,
    pub metadata: Map<String, Value>,
}

impl BindingOptions {
    /// Repeat at the processor's default interval while held
    pub fn repeating() -> Self {
        Self {
            repeat: Some(Repeat::Enabled(true)),
            ..Self::default()
        }
    }

    /// Repeat every `interval_ms` while held
    pub fn repeating_every(interval_ms: u64) -> Self {
        Self {
            repeat: Some(Repeat::Interval {
                interval: interval_ms,
            }),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }
}

/// Lifecycle hooks scoped to a single node
#[derive(Debug, Default)]
pub struct NodeHooks {
    /// The processor walked onto this node
    pub on_match: Hook<KeyContext>,
    /// A sequence through this node completed
    pub on_complete: Hook<KeyContext>,
    /// A key arrived at this node that has no child edge
    pub on_no_child_match: Hook<KeyContext>,
    /// A sequence through this node failed to match
    pub on_branch_failed: Hook<KeyContext>,
    /// A sequence or ambiguity timer expired while on this node
    pub on_timeout: Hook<KeyContext>,
    /// The held binding ending at this node repeated
    pub on_repeat: Hook<KeyContext>,
}

#[derive(Debug)]
pub struct TrieNode {
    key: Option<String>,
    children: HashMap<String, TrieNode>,
    completable: bool,
    forward_on_non_match: bool,
    metadata: NodeMetadata,
    hooks: NodeHooks,
}

impl TrieNode {
    fn new(key: Option<String>, forward_on_non_match: bool) -> Self {
        Self {
            key,
            children: HashMap::new(),
            completable: false,
            forward_on_non_match,
            metadata: NodeMetadata::default(),
            hooks: NodeHooks::default(),
        }
    }

    /// Edge label leading here, `None` for the root
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn child(&self, key: &str) -> Option<&TrieNode> {
        self.children.get(key)
    }

    pub fn children(&self) -> impl Iterator<Item = &TrieNode> {
        self.children.values()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// A binding ends at this node
    pub fn is_completable(&self) -> bool {
        self.completable
    }

    /// Completable and also a prefix of a longer binding
    pub fn is_ambiguous(&self) -> bool {
        self.completable && self.has_children()
    }

    /// Whether an unmatched key at this node is passed on to the host
    pub fn forward_on_non_match(&self) -> bool {
        self.forward_on_non_match
    }

    pub fn set_forward_on_non_match(&mut self, forward: bool) {
        self.forward_on_non_match = forward;
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn hooks(&self) -> &NodeHooks {
        &self.hooks
    }

    fn collect_sequences(&self, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        if self.completable {
            out.push(prefix.clone());
        }
        for (key, child) in &self.children {
            prefix.push(key.clone());
            child.collect_sequences(prefix, out);
            prefix.pop();
        }
    }

    /// Returns true if a completable node was unmarked
    fn remove_sequence<S: AsRef<str>>(&mut self, sequence: &[S]) -> bool {
        let Some((first, rest)) = sequence.split_first() else {
            let removed = self.completable;
            self.completable = false;
            self.metadata = NodeMetadata::default();
            return removed;
        };

        let Some(child) = self.children.get_mut(first.as_ref()) else {
            return false;
        };
        let removed = child.remove_sequence(rest);
        if removed && !child.completable && child.children.is_empty() {
            self.children.remove(first.as_ref());
        }
        removed
    }
}

/// A trie of key sequences for one mode
#[derive(Debug)]
pub struct Trie {
    root: TrieNode,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Create a trie whose root forwards unmatched keys
    pub fn new() -> Self {
        Self::with_root_forwarding(true)
    }

    pub fn with_root_forwarding(forward: bool) -> Self {
        Self {
            root: TrieNode::new(None, forward),
        }
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut TrieNode {
        &mut self.root
    }

    /// Insert a sequence, creating missing nodes, and mark its end completable
    ///
    /// Re-inserting a sequence overwrites its repeat setting and merges the
    /// metadata. An empty sequence marks the root itself.
    pub fn insert<S: AsRef<str>>(&mut self, sequence: &[S], options: BindingOptions) -> &mut TrieNode {
        let mut node = &mut self.root;
        for key in sequence {
            let key = key.as_ref();
            node = node
                .children
                .entry(key.to_string())
                .or_insert_with(|| TrieNode::new(Some(key.to_string()), false));
        }

        node.completable = true;
        node.metadata.repeat = options.repeat;
        node.metadata.extra.extend(options.metadata);
        node
    }

    /// Walk the sequence from the root, `None` on the first missing edge
    pub fn find<S: AsRef<str>>(&self, sequence: &[S]) -> Option<&TrieNode> {
        sequence
            .iter()
            .try_fold(&self.root, |node, key| node.children.get(key.as_ref()))
    }

    pub fn find_mut<S: AsRef<str>>(&mut self, sequence: &[S]) -> Option<&mut TrieNode> {
        let mut node = &mut self.root;
        for key in sequence {
            node = node.children.get_mut(key.as_ref())?;
        }
        Some(node)
    }

    /// Unmark a sequence and prune branches left without bindings
    pub fn remove<S: AsRef<str>>(&mut self, sequence: &[S]) -> bool {
        self.root.remove_sequence(sequence)
    }

    /// Every completable sequence, sorted
    pub fn sequences(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        self.root.collect_sequences(&mut Vec::new(), &mut out);
        out.sort();
        out
    }

    pub fn is_empty(&self) -> bool {
        !self.root.completable && self.root.children.is_empty()
    }
}
