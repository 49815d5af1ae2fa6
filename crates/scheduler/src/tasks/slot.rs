use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared output cell a payload writes and its dependents read.
///
/// The scheduler gives payloads no return channel, so producers hand each
/// payload a clone of a slot and read it back once the job is Done.
pub struct Slot<T> {
    inner: Arc<Mutex<SlotState<T>>>,
}

#[derive(Debug)]
enum SlotState<T> {
    Empty,
    Filled(T),
    Failed(String),
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState::Empty)),
        }
    }

    pub fn fill(&self, value: T) {
        *self.lock() = SlotState::Filled(value);
    }

    /// Record that the producing payload failed.
    pub fn fail(&self, message: impl Into<String>) {
        *self.lock() = SlotState::Failed(message.into());
    }

    pub fn is_filled(&self) -> bool {
        matches!(*self.lock(), SlotState::Filled(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(*self.lock(), SlotState::Failed(_))
    }

    pub fn error(&self) -> Option<String> {
        match &*self.lock() {
            SlotState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Borrow the value, if present, for the duration of `f`.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        match &*self.lock() {
            SlotState::Filled(value) => Some(f(value)),
            _ => None,
        }
    }

    /// Move the value out, leaving the slot empty. Errors stay in place.
    pub fn take(&self) -> Option<T> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, SlotState::Empty) {
            SlotState::Filled(value) => Some(value),
            other => {
                *state = other;
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Slot<T> {
    pub fn cloned(&self) -> Option<T> {
        self.with_value(T::clone)
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.lock()).finish()
    }
}
