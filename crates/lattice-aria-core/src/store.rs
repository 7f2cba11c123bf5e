//! Writable stores for Lattice ARIA.
//!
//! A [`Store<T>`] couples a value with a change [`Signal`]. It follows the
//! writable-store contract used by component frameworks:
//!
//! - [`Store::get`] returns the current value,
//! - [`Store::set`] replaces it and notifies subscribers if it changed,
//! - [`Store::subscribe`] calls the subscriber with the current value right
//!   away and then after every change.
//!
//! Notification is synchronous and follows subscription order. When a
//! subscriber sets another store, that store's subscribers run to completion
//! before the next subscriber of the outer store (depth-first). The new value
//! is committed before any subscriber runs, so [`Store::get`] inside a
//! subscriber always observes it.
//!
//! `Store<T>` is a cheap handle: clones share the same value and subscribers.
//!
//! # Example
//!
//! ```
//! use lattice_aria_core::Store;
//!
//! let visible = Store::new(false);
//! let id = visible.subscribe(|value| println!("visible: {value}"));
//!
//! assert!(visible.set(true));
//! assert!(!visible.set(true));
//! visible.unsubscribe(id);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logging::targets;
use crate::signal::{ConnectionId, Signal};

struct StoreInner<T> {
    value: RwLock<T>,
    changed: Signal<T>,
}

/// A reactive value with ordered change notification.
pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    /// Create a new store with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                value: RwLock::new(value),
                changed: Signal::new(),
            }),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.value.read())
    }

    /// Subscribe to the store.
    ///
    /// The subscriber is called immediately with the current value, then
    /// after every change, after all previously registered subscribers.
    pub fn subscribe<F>(&self, subscriber: F) -> ConnectionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let current = self.get();
        subscriber(&current);
        self.inner.changed.connect(subscriber)
    }

    /// Register a subscriber without the initial call.
    pub fn connect<F>(&self, subscriber: F) -> ConnectionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.changed.connect(subscriber)
    }

    /// Remove a subscriber. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.inner.changed.disconnect(id)
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.changed.connection_count()
    }

    /// Set the value without notifying subscribers.
    pub fn set_silent(&self, value: T) {
        *self.inner.value.write() = value;
    }

    /// Notify subscribers with the current value, whether or not it changed.
    pub fn notify(&self) {
        let current = self.get();
        self.inner.changed.emit(current);
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Store<T> {
    /// Set the value, returning `true` if it changed.
    ///
    /// Subscribers are notified only when the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        tracing::trace!(target: targets::STORE, subscribers = self.subscriber_count(), "store changed");
        self.inner.changed.emit(value);
        true
    }

    /// Compute a new value from the current one and set it.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let next = self.with(f);
        self.set(next)
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &*self.inner.value.read())
            .field("subscribers", &self.inner.changed.connection_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(Store<Vec<String>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_store_basic() {
        let store = Store::new(42);
        assert_eq!(store.get(), 42);
    }

    #[test]
    fn test_store_set_detects_change() {
        let store = Store::new(10);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let calls_clone = calls.clone();
        store.connect(move |&value| calls_clone.lock().push(value));

        assert!(!store.set(10));
        assert!(store.set(20));
        assert_eq!(store.get(), 20);
        assert_eq!(*calls.lock(), vec![20]);
    }

    #[test]
    fn test_subscribe_calls_immediately() {
        let store = Store::new("hello".to_string());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        store.subscribe(move |value: &String| seen_clone.lock().push(value.clone()));
        store.set("world".to_string());

        assert_eq!(*seen.lock(), vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::new(1);
        let handle = store.clone();
        handle.set(2);
        assert_eq!(store.get(), 2);
    }

    #[test]
    fn test_nested_set_is_depth_first() {
        let a = Store::new(0);
        let b = Store::new(0);
        let log = Arc::new(Mutex::new(Vec::new()));

        let b_clone = b.clone();
        let log_clone = log.clone();
        a.connect(move |&value| {
            log_clone.lock().push(format!("a1:{value}"));
            b_clone.set(value * 10);
        });
        let log_clone = log.clone();
        a.connect(move |&value| log_clone.lock().push(format!("a2:{value}")));
        let log_clone = log.clone();
        let a_clone = a.clone();
        b.connect(move |&value| {
            // The outer value is already committed.
            log_clone.lock().push(format!("b:{value}:{}", a_clone.get()));
        });

        a.set(3);
        assert_eq!(*log.lock(), vec!["a1:3", "b:30:3", "a2:3"]);
    }

    #[test]
    fn test_unsubscribe() {
        let store = Store::new(0);
        let id = store.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 1);
        assert!(store.unsubscribe(id));
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_update_and_silent() {
        let store = Store::new(vec![1, 2]);
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        store.connect(move |_| *count_clone.lock() += 1);

        store.set_silent(vec![1]);
        assert!(store.update(|v| v.iter().map(|n| n + 1).collect()));
        assert_eq!(store.get(), vec![2]);
        store.notify();
        assert_eq!(*count.lock(), 2);
    }

    fn describe<T: fmt::Debug>(store: &Store<T>) -> String {
        format!("{store:?}")
    }

    #[test]
    fn test_debug_needs_only_debug_value() {
        let store = Store::new(vec!["a".to_string()]);
        store.connect(|_| {});
        assert_eq!(describe(&store), r#"Store { value: ["a"], subscribers: 1 }"#);
    }
}
