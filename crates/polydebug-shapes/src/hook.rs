//! Change-notification hook shared by all shapes.
//!
//! A [`ChangeHook`] is an ordered registry of callbacks. Shapes call
//! [`ChangeHook::notify`] exactly once per semantically significant
//! mutation; consumers (renderers, caches, host inspectors) subscribe to
//! learn that derived data is stale.
//!
//! Delivery is synchronous and in registration order. Callbacks are trusted
//! host code: if one fails, delivery stops there and the error is handed
//! back to whoever performed the mutation.

use std::fmt;

use crate::ShapeError;

/// Error type a change callback may return.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A registered change callback.
pub type ChangeCallback = Box<dyn FnMut() -> Result<(), ObserverError>>;

// ---------------------------------------------------------------------------
// HookId
// ---------------------------------------------------------------------------

/// Handle returned by [`ChangeHook::subscribe`], used to unsubscribe.
///
/// Ids are unique within one hook and increase with each subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

impl HookId {
    /// Raw numeric value.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ChangeHook
// ---------------------------------------------------------------------------

/// Ordered observer registry fired when a shape's data changes.
#[derive(Default)]
pub struct ChangeHook {
    observers: Vec<(HookId, ChangeCallback)>,
    next_id: u64,
}

impl ChangeHook {
    /// Create an empty hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallible callback. It runs after every callback
    /// registered before it.
    pub fn subscribe<F>(&mut self, callback: F) -> HookId
    where
        F: FnMut() -> Result<(), ObserverError> + 'static,
    {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    /// Register a callback that cannot fail.
    pub fn subscribe_infallible<F>(&mut self, mut callback: F) -> HookId
    where
        F: FnMut() + 'static,
    {
        self.subscribe(move || {
            callback();
            Ok(())
        })
    }

    /// Remove a callback. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: HookId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(registered, _)| *registered != id);
        self.observers.len() != before
    }

    /// Invoke every callback in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Observer`] for the first callback that fails.
    /// Callbacks registered after it are not invoked for this round.
    pub fn notify(&mut self) -> Result<(), ShapeError> {
        for (id, callback) in &mut self.observers {
            callback().map_err(|source| ShapeError::Observer { hook: *id, source })?;
        }
        Ok(())
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Drop every registered callback.
    pub fn clear(&mut self) {
        self.observers.clear();
    }
}

impl fmt::Debug for ChangeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHook")
            .field("observers", &self.observers.len())
            .finish()
    }
}
