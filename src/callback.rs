//! Notification hooks registered by the host.
//!
//! A [`Listener`] wraps an optional side-effect closure so the controller can
//! notify unconditionally without checking whether anyone is listening.
//!
//! ```ignore
//! let mut on_change: Listener<LoadState> = Listener::none();
//! on_change.set(|state| log::info!("now {}", state));
//! on_change.emit(LoadState::Loading);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// An optional side-effect callback taking a value.
///
/// Hooks run synchronously inside the controller call that triggered them.
/// A host that needs to read the controller from a hook pushes into a
/// [`Deferred`] queue instead and drains it once the call has returned.
pub struct Listener<T> {
    f: Option<Box<dyn Fn(T)>>,
}

impl<T> Listener<T> {
    /// Create a listener from a function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(T) + 'static,
    {
        Self {
            f: Some(Box::new(f)),
        }
    }

    /// Create an empty listener.
    pub fn none() -> Self {
        Self { f: None }
    }

    /// Replace the registered function.
    pub fn set<F>(&mut self, f: F)
    where
        F: Fn(T) + 'static,
    {
        self.f = Some(Box::new(f));
    }

    /// Remove the registered function.
    pub fn clear(&mut self) {
        self.f = None;
    }

    /// Call the listener with a value, if one is registered.
    pub fn emit(&self, value: T) {
        if let Some(ref f) = self.f {
            f(value);
        }
    }

    pub fn is_some(&self) -> bool {
        self.f.is_some()
    }
}

impl<T> Default for Listener<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("set", &self.is_some())
            .finish()
    }
}

/// An optional mapping hook that may decline to produce a value.
///
/// Used for host overrides of default decisions: `None` from the hook, or no
/// hook at all, means "use the default".
pub struct Override<T, R> {
    f: Option<Box<dyn Fn(&T) -> Option<R>>>,
}

impl<T, R> Override<T, R> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> Option<R> + 'static,
    {
        Self {
            f: Some(Box::new(f)),
        }
    }

    pub fn none() -> Self {
        Self { f: None }
    }

    /// Ask the hook, falling back to `default` when it is unset or declines.
    pub fn resolve(&self, value: &T, default: impl FnOnce(&T) -> R) -> R {
        self.f
            .as_ref()
            .and_then(|f| f(value))
            .unwrap_or_else(|| default(value))
    }
}

impl<T, R> Default for Override<T, R> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T, R> fmt::Debug for Override<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Override")
            .field("set", &self.f.is_some())
            .finish()
    }
}

/// FIFO of notifications raised while their consumer cannot run yet.
///
/// Clones share the same queue.
pub struct Deferred<T> {
    queue: Rc<RefCell<VecDeque<T>>>,
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn push(&self, value: T) {
        self.queue.borrow_mut().push_back(value);
    }

    /// Take the oldest value. The queue is not borrowed once this returns, so
    /// consumers may push more values while handling it.
    pub fn pop(&self) -> Option<T> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_emit() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let listener = Listener::new(move |v: u32| sink.borrow_mut().push(v));
        listener.emit(1);
        listener.emit(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_empty_listener_is_noop() {
        let mut listener: Listener<u32> = Listener::none();
        assert!(!listener.is_some());
        listener.emit(5);
        listener.set(|_| {});
        assert!(listener.is_some());
        listener.clear();
        assert!(!listener.is_some());
    }

    #[test]
    fn test_override_falls_back() {
        let hook: Override<u32, &'static str> =
            Override::new(|v| if *v > 10 { Some("big") } else { None });
        assert_eq!(hook.resolve(&20, |_| "default"), "big");
        assert_eq!(hook.resolve(&3, |_| "default"), "default");
        assert_eq!(Override::none().resolve(&3, |_| "default"), "default");
    }

    #[test]
    fn test_deferred_is_fifo_and_shared() {
        let deferred = Deferred::new();
        let producer = deferred.clone();
        producer.push(1);
        producer.push(2);
        assert_eq!(deferred.len(), 2);
        assert_eq!(deferred.pop(), Some(1));
        // Handling a value may enqueue more.
        producer.push(3);
        assert_eq!(deferred.pop(), Some(2));
        assert_eq!(deferred.pop(), Some(3));
        assert_eq!(deferred.pop(), None);
        assert!(producer.is_empty());
    }
}
