//! Multi-listener hooks with per-listener error isolation
//!
//! A [`Hook`] is an ordered list of listeners that all receive the same
//! argument when the hook is triggered. The trie and the key processor expose
//! their lifecycle events (matched, completed, timed out, ...) as hooks, so
//! behavior is attached from the outside instead of being hard-wired.
//!
//! ```ignore
//! let hook: Hook<String, usize> = Hook::new();
//! let unregister = hook.register(|s| Ok(s.len()));
//! assert_eq!(hook.trigger(&"abc".to_string()), vec![Some(3)]);
//! unregister.unregister();
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<A, R> = Box<dyn FnMut(&A) -> anyhow::Result<R>>;
type ErrorHandler = Box<dyn FnMut(&anyhow::Error)>;

struct Entry<A, R> {
    id: u64,
    listener: RefCell<Listener<A, R>>,
    on_error: Option<RefCell<ErrorHandler>>,
}

type Entries<A, R> = RefCell<Vec<Rc<Entry<A, R>>>>;

/// An ordered registry of listeners for one event
///
/// Cloning a hook yields a handle to the same listener list.
pub struct Hook<A, R = ()> {
    entries: Rc<Entries<A, R>>,
    next_id: Rc<Cell<u64>>,
}

impl<A: 'static, R: 'static> Hook<A, R> {
    /// Create a hook with no listeners
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            next_id: Rc::new(Cell::new(0)),
        }
    }

    /// Register a listener whose errors are discarded
    pub fn register<F>(&self, listener: F) -> Unregister
    where
        F: FnMut(&A) -> anyhow::Result<R> + 'static,
    {
        self.push(Box::new(listener), None)
    }

    /// Register a listener together with its own error handler
    pub fn register_with_error<F, E>(&self, listener: F, on_error: E) -> Unregister
    where
        F: FnMut(&A) -> anyhow::Result<R> + 'static,
        E: FnMut(&anyhow::Error) + 'static,
    {
        self.push(Box::new(listener), Some(Box::new(on_error)))
    }

    fn push(&self, listener: Listener<A, R>, on_error: Option<ErrorHandler>) -> Unregister {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        self.entries.borrow_mut().push(Rc::new(Entry {
            id,
            listener: RefCell::new(listener),
            on_error: on_error.map(RefCell::new),
        }));

        let entries: Weak<Entries<A, R>> = Rc::downgrade(&self.entries);
        Unregister {
            remove: Box::new(move || {
                if let Some(entries) = entries.upgrade() {
                    entries.borrow_mut().retain(|entry| entry.id != id);
                }
            }),
        }
    }

    /// Invoke every listener in registration order
    ///
    /// Results are collected positionally. A listener that fails contributes
    /// `None` and its error goes to its own handler; the remaining listeners
    /// still run.
    pub fn trigger(&self, args: &A) -> Vec<Option<R>> {
        // Snapshot so listeners can (un)register while we iterate
        let snapshot: Vec<Rc<Entry<A, R>>> = self.entries.borrow().clone();
        let mut results = Vec::with_capacity(snapshot.len());

        for entry in snapshot {
            let Ok(mut listener) = entry.listener.try_borrow_mut() else {
                tracing::trace!("Skipping re-entered hook listener {}", entry.id);
                results.push(None);
                continue;
            };

            match (&mut **listener)(args) {
                Ok(value) => results.push(Some(value)),
                Err(err) => {
                    drop(listener);
                    tracing::debug!("Hook listener {} failed: {:#}", entry.id, err);
                    if let Some(handler) = &entry.on_error {
                        if let Ok(mut handler) = handler.try_borrow_mut() {
                            (&mut **handler)(&err);
                        }
                    }
                    results.push(None);
                }
            }
        }

        results
    }

    /// Drop all listeners
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Number of registered listeners
    pub fn count(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if no listeners are registered
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl<A: 'static, R: 'static> Default for Hook<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> Clone for Hook<A, R> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            next_id: Rc::clone(&self.next_id),
        }
    }
}

impl<A, R> fmt::Debug for Hook<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("listeners", &self.entries.borrow().len())
            .finish()
    }
}

/// Handle returned by [`Hook::register`] that removes the listener again
///
/// Calling [`Unregister::unregister`] more than once is a no-op, as is calling
/// it after the hook itself was dropped.
pub struct Unregister {
    remove: Box<dyn Fn()>,
}

impl Unregister {
    pub fn unregister(&self) {
        (self.remove)();
    }
}

impl fmt::Debug for Unregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unregister")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_in_registration_order() {
        let hook: Hook<u32, u32> = Hook::new();
        hook.register(|x| Ok(x + 1));
        hook.register(|x| Ok(x * 10));

        assert_eq!(hook.trigger(&2), vec![Some(3), Some(20)]);
    }

    #[test]
    fn test_failing_listener_is_isolated() {
        let hook: Hook<u32, &'static str> = Hook::new();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&errors);

        hook.register_with_error(
            |_| Err(anyhow::anyhow!("boom")),
            move |err| seen.borrow_mut().push(err.to_string()),
        );
        hook.register(|_| Ok("second"));

        assert_eq!(hook.trigger(&0), vec![None, Some("second")]);
        assert_eq!(*errors.borrow(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_failing_listener_without_handler() {
        let hook: Hook<()> = Hook::new();
        hook.register(|_| anyhow::bail!("ignored"));
        hook.register(|_| Ok(()));

        assert_eq!(hook.trigger(&()), vec![None, Some(())]);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let hook: Hook<()> = Hook::new();
        let first = hook.register(|_| Ok(()));
        hook.register(|_| Ok(()));
        assert_eq!(hook.count(), 2);

        first.unregister();
        first.unregister();
        assert_eq!(hook.count(), 1);
    }

    #[test]
    fn test_unregister_removes_only_its_listener() {
        let hook: Hook<(), u8> = Hook::new();
        hook.register(|_| Ok(1));
        let second = hook.register(|_| Ok(2));
        hook.register(|_| Ok(3));

        second.unregister();
        assert_eq!(hook.trigger(&()), vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_listener_can_unregister_during_trigger() {
        let hook: Hook<()> = Hook::new();
        let handle: Rc<RefCell<Option<Unregister>>> = Rc::new(RefCell::new(None));
        let inner = Rc::clone(&handle);

        let unregister = hook.register(move |_| {
            if let Some(h) = inner.borrow().as_ref() {
                h.unregister();
            }
            Ok(())
        });
        *handle.borrow_mut() = Some(unregister);

        assert_eq!(hook.trigger(&()).len(), 1);
        assert!(hook.is_empty());
        assert!(hook.trigger(&()).is_empty());
    }

    #[test]
    fn test_clear_and_count() {
        let hook: Hook<()> = Hook::default();
        hook.register(|_| Ok(()));
        hook.register(|_| Ok(()));
        assert_eq!(hook.count(), 2);

        hook.clear();
        assert_eq!(hook.count(), 0);
        assert!(hook.trigger(&()).is_empty());
    }

    #[test]
    fn test_clone_shares_listeners() {
        let hook: Hook<()> = Hook::new();
        let other = hook.clone();
        other.register(|_| Ok(()));
        assert_eq!(hook.count(), 1);
    }

    #[test]
    fn test_unregister_after_hook_dropped() {
        let hook: Hook<()> = Hook::new();
        let unregister = hook.register(|_| Ok(()));
        drop(hook);
        unregister.unregister();
    }
}
