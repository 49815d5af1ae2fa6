use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One-shot broadcast latch.
///
/// Fires at most once; any number of threads may wait on it, and waiting on a
/// fired signal returns immediately.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal and wake every waiter. Returns `false` if it had
    /// already fired.
    pub fn fire(&self) -> bool {
        let mut fired = self.lock();
        if *fired {
            return false;
        }
        *fired = true;
        drop(fired);
        self.cond.notify_all();
        true
    }

    pub fn is_fired(&self) -> bool {
        *self.lock()
    }

    /// Block until the signal fires.
    pub fn wait(&self) {
        let guard = self.lock();
        let _fired = self
            .cond
            .wait_while(guard, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block for at most `timeout`. Returns whether the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (fired, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *fired
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn fires_once() {
        let signal = CompletionSignal::new();
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(signal.is_fired());
    }

    #[test]
    fn wait_after_fire_returns_immediately() {
        let signal = CompletionSignal::new();
        signal.fire();
        signal.wait();
        assert!(signal.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn wait_timeout_expires_when_never_fired() {
        let signal = CompletionSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn wakes_every_waiter() {
        let signal = Arc::new(CompletionSignal::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        signal.fire();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }
}
