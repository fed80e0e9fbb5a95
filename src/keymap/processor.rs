//! Modal key-sequence state machine
//!
//! Keys walk the current mode's trie one edge at a time. A walk ends in a
//! dispatch (completable node), a failure (no matching edge), or a timer
//! expiry. Ambiguous nodes, which are both a binding and a prefix of longer
//! ones, wait for the ambiguity timeout, a force-execute key, or an unrelated
//! key before they dispatch.
//!
//! ```text
//!            key w/ child            completable
//!   Root ───────────────▶ InSequence ───────────▶ dispatch → Root
//!     ▲                      │  ▲
//!     │  no child / timeout  │  │ key w/ child
//!     └──────────────────────┘  ▼
//!                          Ambiguous ── timeout / force key / other key ──▶ dispatch → Root
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::{KeyContext, TimeoutKind};
use super::notation::{is_modifier_key, KeyParser};
use super::trie::{BindingOptions, NodeHooks, Trie, TrieNode};
use super::types::{KeyboardEvent, NormalizedKey};
use crate::hook::Hook;
use crate::scheduler::{Scheduler, TimerId, VirtualClock};

/// Lower bound for every scheduled delay so a zero interval cannot spin
const MIN_DELAY: Duration = Duration::from_millis(1);

/// Processor settings, deserializable from the `settings:` block of a keymap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// How long to wait for the next key of an incomplete sequence
    pub key_timeout_ms: u64,
    /// How long an ambiguous match waits before dispatching
    pub ambiguity_timeout_ms: u64,
    /// Default interval for repeating bindings
    pub repeat_interval_ms: u64,
    /// Keys that resolve an ambiguous match immediately
    pub force_execute_keys: Vec<String>,
    pub default_mode: String,
    /// Whether keys with no binding at the root are passed on to the host
    pub forward_unmatched: bool,
    /// Ambient values copied into every [`KeyContext`]
    pub context: Map<String, Value>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            key_timeout_ms: 1000,
            ambiguity_timeout_ms: 500,
            repeat_interval_ms: 100,
            force_execute_keys: vec!["<Enter>".to_string()],
            default_mode: "normal".to_string(),
            forward_unmatched: true,
            context: Map::new(),
        }
    }
}

impl ProcessorConfig {
    pub fn key_timeout(&self) -> Duration {
        Duration::from_millis(self.key_timeout_ms)
    }

    pub fn ambiguity_timeout(&self) -> Duration {
        Duration::from_millis(self.ambiguity_timeout_ms)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    fn timeout(&self, kind: TimeoutKind) -> Duration {
        match kind {
            TimeoutKind::Sequence => self.key_timeout(),
            TimeoutKind::Ambiguous => self.ambiguity_timeout(),
        }
    }
}

/// Payload of the processor's scheduled timers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timer {
    Timeout(TimeoutKind),
    /// Repeat tick for the held key with this key string
    Repeat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorState {
    /// At the root, no timer running
    Root,
    /// Partway through a sequence, waiting for the next key
    InSequence,
    /// On a node that is both a binding and a prefix
    Ambiguous,
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorState::Root => f.write_str("root"),
            ProcessorState::InSequence => f.write_str("in-sequence"),
            ProcessorState::Ambiguous => f.write_str("ambiguous"),
        }
    }
}

/// A resolved binding, returned to the host for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch<A> {
    pub action: A,
    pub sequence: Vec<String>,
    pub mode: String,
    /// Set for repeat ticks of a held key, not for the first dispatch
    pub repeat: bool,
}

/// Result of feeding one key to the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome<A> {
    /// False means the host should handle the key itself
    pub consumed: bool,
    pub dispatch: Option<Dispatch<A>>,
}

impl<A> KeyOutcome<A> {
    pub fn consumed() -> Self {
        Self {
            consumed: true,
            dispatch: None,
        }
    }

    pub fn forwarded() -> Self {
        Self {
            consumed: false,
            dispatch: None,
        }
    }

    fn new(consumed: bool, dispatch: Option<Dispatch<A>>) -> Self {
        Self { consumed, dispatch }
    }
}

/// Processor-level hooks
#[derive(Debug, Default)]
pub struct ProcessorHooks {
    /// Runs before trie matching. `Some(true)` consumes the key, `Some(false)`
    /// forwards it, `None` abstains.
    pub on_key: Hook<KeyContext, Option<bool>>,
    pub on_node_matched: Hook<KeyContext>,
    pub on_sequence_reset: Hook<KeyContext>,
    pub on_complete: Hook<KeyContext>,
    pub on_timeout: Hook<KeyContext>,
    pub on_repeat: Hook<KeyContext>,
}

struct Mode<A> {
    trie: Trie,
    actions: HashMap<Vec<String>, A>,
}

impl<A> Mode<A> {
    fn new(forward_unmatched: bool) -> Self {
        Self {
            trie: Trie::with_root_forwarding(forward_unmatched),
            actions: HashMap::new(),
        }
    }
}

#[derive(Debug)]
struct HeldKey {
    timer: TimerId,
    /// Key without modifiers, matched against key-up events
    base_key: String,
    sequence: Vec<String>,
    mode: String,
    interval: Duration,
}

/// The key-sequence state machine
///
/// `A` is the action type stored per binding, `S` the timer source.
pub struct KeyProcessor<A, S = VirtualClock<Timer>> {
    config: ProcessorConfig,
    parser: KeyParser,
    force_execute: Vec<NormalizedKey>,
    modes: HashMap<String, Mode<A>>,
    current_mode: String,
    /// Key strings from the root to the current node
    path: Vec<String>,
    pending_ambiguous: Option<Vec<String>>,
    held_keys: HashMap<String, HeldKey>,
    timeout: Option<(TimerId, TimeoutKind)>,
    timeout_request: Rc<Cell<Option<TimeoutKind>>>,
    scheduler: S,
    hooks: ProcessorHooks,
}

impl<A: Clone> KeyProcessor<A> {
    /// Create a processor driven by a [`VirtualClock`]
    pub fn new(config: ProcessorConfig) -> Self {
        Self::with_scheduler(config, VirtualClock::new())
    }
}

impl<A: Clone, S: Scheduler<Timer>> KeyProcessor<A, S> {
    pub fn with_scheduler(config: ProcessorConfig, scheduler: S) -> Self {
        let mut processor = Self {
            current_mode: config.default_mode.clone(),
            config: ProcessorConfig::default(),
            parser: KeyParser::new(),
            force_execute: Vec::new(),
            modes: HashMap::new(),
            path: Vec::new(),
            pending_ambiguous: None,
            held_keys: HashMap::new(),
            timeout: None,
            timeout_request: Rc::new(Cell::new(None)),
            scheduler,
            hooks: ProcessorHooks::default(),
        };
        processor.configure(config);
        processor
    }

    /// Replace the configuration
    ///
    /// Root forwarding of every existing mode follows `forward_unmatched`.
    /// The current mode and bindings are kept.
    pub fn configure(&mut self, config: ProcessorConfig) {
        self.force_execute = config
            .force_execute_keys
            .iter()
            .flat_map(|notation| self.parser.parse_key_sequence(notation))
            .collect();

        for mode in self.modes.values_mut() {
            mode.trie
                .root_mut()
                .set_forward_on_non_match(config.forward_unmatched);
        }

        let default_mode = config.default_mode.clone();
        self.config = config;
        self.init_mode(&default_mode);
        let current = self.current_mode.clone();
        self.init_mode(&current);
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn parser(&self) -> &KeyParser {
        &self.parser
    }

    /// Mutable access for registering placeholders and modifier prefixes
    ///
    /// Registrations only affect notation parsed afterwards.
    pub fn parser_mut(&mut self) -> &mut KeyParser {
        &mut self.parser
    }

    pub fn hooks(&self) -> &ProcessorHooks {
        &self.hooks
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // === Bindings ===

    /// Bind `notation` to `action` in the current mode
    pub fn set(&mut self, notation: &str, action: A, options: BindingOptions) -> &mut TrieNode {
        let mode = self.current_mode.clone();
        self.set_in_mode(&mode, notation, action, options)
    }

    /// Bind `notation` to `action` in `mode`, creating the mode if needed
    pub fn set_in_mode(
        &mut self,
        mode: &str,
        notation: &str,
        action: A,
        options: BindingOptions,
    ) -> &mut TrieNode {
        let sequence = self.parse_sequence(notation);
        tracing::debug!("Binding {:?} in mode {}", sequence, mode);

        let mode = self.mode_entry(mode);
        mode.actions.insert(sequence.clone(), action);
        mode.trie.insert(&sequence, options)
    }

    /// Remove a binding from the current mode
    pub fn unset(&mut self, notation: &str) -> bool {
        let mode = self.current_mode.clone();
        self.unset_in_mode(&mode, notation)
    }

    pub fn unset_in_mode(&mut self, mode: &str, notation: &str) -> bool {
        let sequence = self.parse_sequence(notation);
        let Some(entry) = self.modes.get_mut(mode) else {
            return false;
        };

        entry.actions.remove(&sequence);
        let removed = entry.trie.remove(&sequence);
        if removed {
            tracing::debug!("Unbound {:?} in mode {}", sequence, mode);
            let stale: Vec<String> = self
                .held_keys
                .iter()
                .filter(|(_, held)| held.mode == mode && held.sequence == sequence)
                .map(|(name, _)| name.clone())
                .collect();
            for name in &stale {
                self.stop_repeat(name);
            }
            if mode == self.current_mode && !self.path.is_empty() {
                self.reset();
            }
        }
        removed
    }

    /// All bindings of a mode, sorted by sequence
    pub fn bindings(&self, mode: &str) -> Vec<(Vec<String>, &A)> {
        let Some(mode) = self.modes.get(mode) else {
            return Vec::new();
        };
        mode.trie
            .sequences()
            .into_iter()
            .filter_map(|sequence| {
                let action = mode.actions.get(&sequence)?;
                Some((sequence, action))
            })
            .collect()
    }

    /// Hooks of the node reached by `notation` in the current mode
    pub fn node_hooks(&self, notation: &str) -> Option<&NodeHooks> {
        let sequence = self.parse_sequence(notation);
        self.modes
            .get(&self.current_mode)?
            .trie
            .find(&sequence)
            .map(TrieNode::hooks)
    }

    /// Override whether unmatched keys at the node reached by `notation` are forwarded
    ///
    /// An empty notation addresses the root.
    pub fn set_forwarding(&mut self, notation: &str, forward: bool) -> bool {
        let sequence = self.parse_sequence(notation);
        let Some(mode) = self.modes.get_mut(&self.current_mode) else {
            return false;
        };
        match mode.trie.find_mut(&sequence) {
            Some(node) => {
                node.set_forward_on_non_match(forward);
                true
            }
            None => false,
        }
    }

    fn parse_sequence(&self, notation: &str) -> Vec<String> {
        self.parser
            .parse_key_sequence(notation)
            .iter()
            .map(|key| key.as_str().to_string())
            .collect()
    }

    // === Modes ===

    /// Create an empty mode if it does not exist yet
    pub fn init_mode(&mut self, name: &str) {
        self.mode_entry(name);
    }

    fn mode_entry(&mut self, name: &str) -> &mut Mode<A> {
        let forward = self.config.forward_unmatched;
        self.modes
            .entry(name.to_string())
            .or_insert_with(|| Mode::new(forward))
    }

    /// Switch modes, stopping repeats and returning to the root
    pub fn set_mode(&mut self, name: &str) {
        self.stop_all_repeating();
        self.init_mode(name);
        if self.current_mode != name {
            tracing::debug!("Switching mode {} -> {}", self.current_mode, name);
            self.current_mode = name.to_string();
        }
        self.reset();
    }

    pub fn mode(&self) -> &str {
        &self.current_mode
    }

    /// Names of every initialized mode, sorted
    pub fn mode_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Replace the current mode's bindings with an empty trie
    pub fn clear(&mut self) {
        self.stop_all_repeating();
        let forward = self.config.forward_unmatched;
        self.modes
            .insert(self.current_mode.clone(), Mode::new(forward));
        self.reset();
    }

    /// Drop every mode; only a fresh default mode remains and becomes current
    pub fn clear_all(&mut self) {
        self.stop_all_repeating();
        self.modes.clear();
        self.current_mode = self.config.default_mode.clone();
        let default_mode = self.current_mode.clone();
        self.init_mode(&default_mode);
        self.reset();
    }

    // === State ===

    pub fn state(&self) -> ProcessorState {
        if self.pending_ambiguous.is_some() {
            ProcessorState::Ambiguous
        } else if self.path.is_empty() {
            ProcessorState::Root
        } else {
            ProcessorState::InSequence
        }
    }

    /// Key strings walked so far in the current attempt
    pub fn sequence(&self) -> &[String] {
        &self.path
    }

    /// The active sequence or ambiguity timer
    pub fn active_timeout(&self) -> Option<TimeoutKind> {
        self.timeout.map(|(_, kind)| kind)
    }

    /// Check if a held key (by key string, e.g. `"j"`) is repeating
    pub fn is_repeating(&self, key: &str) -> bool {
        self.held_keys.contains_key(key)
    }

    pub fn repeating_count(&self) -> usize {
        self.held_keys.len()
    }

    /// Deadline of the earliest pending timer on the scheduler's clock
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    fn current_node(&self) -> Option<&TrieNode> {
        self.modes.get(&self.current_mode)?.trie.find(&self.path)
    }

    fn node_at(&self, mode: &str, sequence: &[String]) -> Option<&TrieNode> {
        self.modes.get(mode)?.trie.find(sequence)
    }

    fn snapshot(&self, key: Option<&NormalizedKey>, sequence: &[String], mode: &str) -> KeyContext {
        KeyContext::new(
            key.cloned(),
            sequence,
            mode,
            &self.config.force_execute_keys,
            &self.config.context,
            Rc::clone(&self.timeout_request),
        )
    }

    // === Input ===

    /// Feed a host keydown event
    ///
    /// Pure modifier presses are forwarded untouched. OS auto-repeat keydowns
    /// for a key that is already repeating are consumed, the processor runs
    /// its own repeat timer.
    pub fn process_key_event(&mut self, event: &KeyboardEvent) -> KeyOutcome<A> {
        if is_modifier_key(&event.key) {
            tracing::trace!("Ignoring modifier key {}", event.key);
            return KeyOutcome::forwarded();
        }

        let key = self.parser.event_to_key(event);
        if event.repeat && self.held_keys.contains_key(key.as_str()) {
            return KeyOutcome::consumed();
        }

        self.process_key(key)
    }

    /// Feed a normalized key
    pub fn process_key(&mut self, key: NormalizedKey) -> KeyOutcome<A> {
        tracing::trace!("Key {} in mode {} ({})", key, self.current_mode, self.state());
        self.timeout_request.set(None);

        let ctx = self.snapshot(Some(&key), &self.path, &self.current_mode);
        let votes = self.hooks.on_key.trigger(&ctx);
        if votes.contains(&Some(Some(true))) {
            tracing::trace!("Key {} consumed by listener", key);
            return KeyOutcome::consumed();
        }
        if votes.contains(&Some(Some(false))) {
            tracing::trace!("Key {} forwarded by listener", key);
            self.reset();
            return KeyOutcome::forwarded();
        }

        if self.pending_ambiguous.is_some() && self.force_execute.contains(&key) {
            tracing::debug!("Force-executing {:?} with {}", self.path, key);
            let dispatch = self.resolve_pending();
            return KeyOutcome::new(true, dispatch);
        }

        let key_str = key.as_str().to_string();
        let has_child = self
            .current_node()
            .is_some_and(|node| node.child(&key_str).is_some());

        let outcome = if has_child {
            self.advance_to(key, key_str)
        } else if self.pending_ambiguous.is_some() {
            tracing::debug!("Key {} resolves ambiguous {:?}", key, self.path);
            let dispatch = self.resolve_pending();
            KeyOutcome::new(false, dispatch)
        } else {
            self.fail(&key)
        };

        self.apply_timeout_request();
        outcome
    }

    fn advance_to(&mut self, key: NormalizedKey, key_str: String) -> KeyOutcome<A> {
        self.pending_ambiguous = None;
        self.path.push(key_str);

        let ctx = self.snapshot(Some(&key), &self.path, &self.current_mode);
        if let Some(node) = self.current_node() {
            node.hooks().on_match.trigger(&ctx);
        }
        self.hooks.on_node_matched.trigger(&ctx);

        let Some(node) = self.current_node() else {
            self.reset();
            return KeyOutcome::forwarded();
        };
        let ambiguous = node.is_ambiguous();
        let completable = node.is_completable();
        let repeat = node.metadata().repeat.filter(|r| r.is_enabled());

        if ambiguous {
            tracing::trace!("Ambiguous match {:?}", self.path);
            self.pending_ambiguous = Some(self.path.clone());
            self.start_timeout(TimeoutKind::Ambiguous);
            return KeyOutcome::consumed();
        }

        if completable {
            let sequence = self.path.clone();
            let dispatch = match repeat {
                Some(repeat) => self.start_repeat(&key, sequence, repeat.interval()),
                None => self.dispatch(&sequence, &self.current_mode, false),
            };
            self.complete();
            return KeyOutcome::new(true, dispatch);
        }

        self.start_timeout(TimeoutKind::Sequence);
        KeyOutcome::consumed()
    }

    fn fail(&mut self, key: &NormalizedKey) -> KeyOutcome<A> {
        let ctx = self.snapshot(Some(key), &self.path, &self.current_mode);
        let forward = match self.current_node() {
            Some(node) => {
                node.hooks().on_no_child_match.trigger(&ctx);
                node.forward_on_non_match()
            }
            None => self.config.forward_unmatched,
        };

        for depth in 1..=self.path.len() {
            if let Some(node) = self.node_at(&self.current_mode, &self.path[..depth]) {
                node.hooks().on_branch_failed.trigger(&ctx);
            }
        }

        if !self.path.is_empty() {
            tracing::debug!("No binding for {:?} + {}", self.path, key);
        }
        self.reset();
        KeyOutcome::new(!forward, None)
    }

    /// Feed a host keyup event, stopping repeats of the released key
    pub fn handle_key_up(&mut self, event: &KeyboardEvent) -> bool {
        if is_modifier_key(&event.key) {
            return false;
        }
        let key = self.parser.event_to_key(event);
        self.key_up(&key)
    }

    /// Stop every repeat whose base key matches, whatever modifiers it had
    pub fn key_up(&mut self, key: &NormalizedKey) -> bool {
        let released: Vec<String> = self
            .held_keys
            .iter()
            .filter(|(_, held)| held.base_key == key.key())
            .map(|(name, _)| name.clone())
            .collect();

        for name in &released {
            self.stop_repeat(name);
        }
        !released.is_empty()
    }

    // === Dispatch & reset ===

    fn dispatch(&self, sequence: &[String], mode: &str, repeat: bool) -> Option<Dispatch<A>> {
        let Some(action) = self.modes.get(mode).and_then(|m| m.actions.get(sequence)) else {
            tracing::debug!("No action stored for {:?} in mode {}", sequence, mode);
            return None;
        };
        if !repeat {
            tracing::debug!("Dispatching {:?} in mode {}", sequence, mode);
        }
        Some(Dispatch {
            action: action.clone(),
            sequence: sequence.to_vec(),
            mode: mode.to_string(),
            repeat,
        })
    }

    /// Dispatch the pending ambiguous match, run completion hooks, reset
    fn resolve_pending(&mut self) -> Option<Dispatch<A>> {
        let dispatch = match self.pending_ambiguous.take() {
            Some(sequence) => self.dispatch(&sequence, &self.current_mode, false),
            None => None,
        };
        self.complete();
        dispatch
    }

    /// Completion hooks on every node of the walked path, then reset
    fn complete(&mut self) {
        let ctx = self.snapshot(None, &self.path, &self.current_mode);
        for depth in 1..=self.path.len() {
            if let Some(node) = self.node_at(&self.current_mode, &self.path[..depth]) {
                node.hooks().on_complete.trigger(&ctx);
            }
        }
        self.hooks.on_complete.trigger(&ctx);
        self.reset();
    }

    /// Return to the root: clears path, pending match and timer together
    fn reset(&mut self) {
        let ctx = self.snapshot(None, &self.path, &self.current_mode);
        self.cancel_timeout();
        self.path.clear();
        self.pending_ambiguous = None;
        self.hooks.on_sequence_reset.trigger(&ctx);
    }

    // === Timers ===

    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerId {
        self.scheduler.schedule(delay.max(MIN_DELAY), timer)
    }

    fn start_timeout(&mut self, kind: TimeoutKind) {
        self.cancel_timeout();
        let id = self.schedule(self.config.timeout(kind), Timer::Timeout(kind));
        self.timeout = Some((id, kind));
    }

    fn cancel_timeout(&mut self) {
        if let Some((id, _)) = self.timeout.take() {
            self.scheduler.cancel(id);
        }
    }

    /// Honor a `reset_timeout` request made by a listener
    ///
    /// While an ambiguous match is pending the timer stays an ambiguity
    /// timer, so the match still dispatches when it expires.
    fn apply_timeout_request(&mut self) -> bool {
        let Some(requested) = self.timeout_request.take() else {
            return false;
        };
        if self.path.is_empty() {
            return false;
        }
        let kind = if self.pending_ambiguous.is_some() {
            TimeoutKind::Ambiguous
        } else {
            requested
        };
        tracing::trace!("Listener restarted {} timeout", kind);
        self.start_timeout(kind);
        true
    }

    /// Fire every timer that is due on the scheduler's clock
    pub fn run_due_timers(&mut self) -> Vec<Dispatch<A>> {
        let mut dispatches = Vec::new();

        while let Some((id, timer)) = self.scheduler.pop_expired() {
            let dispatch = match timer {
                Timer::Timeout(kind) => {
                    if self.timeout.map(|(active, _)| active) != Some(id) {
                        continue;
                    }
                    self.timeout = None;
                    self.expire(kind)
                }
                Timer::Repeat(key) => self.fire_repeat(&key, id),
            };
            dispatches.extend(dispatch);
        }

        dispatches
    }

    fn expire(&mut self, kind: TimeoutKind) -> Option<Dispatch<A>> {
        self.timeout_request.set(None);

        let ctx = self
            .snapshot(None, &self.path, &self.current_mode)
            .with_timeout(kind);
        if let Some(node) = self.current_node() {
            node.hooks().on_timeout.trigger(&ctx);
        }
        self.hooks.on_timeout.trigger(&ctx);

        if self.apply_timeout_request() {
            return None;
        }

        match kind {
            TimeoutKind::Ambiguous => {
                tracing::debug!("Ambiguity timeout, dispatching {:?}", self.path);
                self.resolve_pending()
            }
            TimeoutKind::Sequence => {
                tracing::debug!("Sequence {:?} timed out", self.path);
                self.reset();
                None
            }
        }
    }

    // === Repeat ===

    /// Dispatch once now and then every interval until key-up
    fn start_repeat(
        &mut self,
        key: &NormalizedKey,
        sequence: Vec<String>,
        interval: Option<Duration>,
    ) -> Option<Dispatch<A>> {
        let name = key.as_str().to_string();
        self.stop_repeat(&name);

        let interval = interval
            .unwrap_or_else(|| self.config.repeat_interval())
            .max(MIN_DELAY);
        let dispatch = self.dispatch(&sequence, &self.current_mode, false);
        let timer = self.schedule(interval, Timer::Repeat(name.clone()));

        tracing::debug!("Repeating {:?} every {:?}", sequence, interval);
        self.held_keys.insert(
            name,
            HeldKey {
                timer,
                base_key: key.key().to_string(),
                sequence,
                mode: self.current_mode.clone(),
                interval,
            },
        );
        dispatch
    }

    fn fire_repeat(&mut self, name: &str, id: TimerId) -> Option<Dispatch<A>> {
        let held = self.held_keys.get(name)?;
        if held.timer != id {
            return None;
        }
        let sequence = held.sequence.clone();
        let mode = held.mode.clone();
        let interval = held.interval;

        if !self
            .node_at(&mode, &sequence)
            .is_some_and(TrieNode::is_completable)
        {
            tracing::debug!("Binding {:?} is gone, stopping repeat", sequence);
            self.stop_repeat(name);
            return None;
        }

        let ctx = self.snapshot(None, &sequence, &mode);
        if let Some(node) = self.node_at(&mode, &sequence) {
            node.hooks().on_repeat.trigger(&ctx);
        }
        self.hooks.on_repeat.trigger(&ctx);

        // A listener cannot stop the repeat
        let next = self.schedule(interval, Timer::Repeat(name.to_string()));
        if let Some(held) = self.held_keys.get_mut(name) {
            held.timer = next;
        }
        self.dispatch(&sequence, &mode, true)
    }

    fn stop_repeat(&mut self, name: &str) {
        if let Some(held) = self.held_keys.remove(name) {
            tracing::trace!("Stopped repeating {}", name);
            self.scheduler.cancel(held.timer);
        }
    }

    /// Cancel every running repeat
    pub fn stop_all_repeating(&mut self) {
        for (_, held) in self.held_keys.drain() {
            self.scheduler.cancel(held.timer);
        }
    }
}

impl<A: Clone> KeyProcessor<A, VirtualClock<Timer>> {
    /// Move the virtual clock forward, firing timers in deadline order
    ///
    /// Repeat timers re-armed while advancing fire again if they fall within
    /// the window.
    pub fn advance(&mut self, by: Duration) -> Vec<Dispatch<A>> {
        self.advance_timed(by)
            .into_iter()
            .map(|(_, dispatch)| dispatch)
            .collect()
    }

    /// Like [`advance`](Self::advance), pairing each dispatch with the
    /// deadline it fired at
    pub fn advance_timed(&mut self, by: Duration) -> Vec<(Duration, Dispatch<A>)> {
        let target = self.scheduler.now() + by;
        let mut dispatches = Vec::new();

        while let Some(deadline) = self.scheduler.next_deadline() {
            if deadline > target {
                break;
            }
            self.scheduler.set_now(deadline);
            dispatches.extend(
                self.run_due_timers()
                    .into_iter()
                    .map(|dispatch| (deadline, dispatch)),
            );
        }

        self.scheduler.set_now(target);
        dispatches
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }
}
