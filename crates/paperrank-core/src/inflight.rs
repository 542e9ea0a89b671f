//! Counter of in-flight crawl batches.
//!
//! A `Mutex + Condvar` pair: the lock is held only for the increment or
//! decrement, and the manager can sleep on the condvar until a worker
//! finishes instead of spinning.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Number of batches currently being processed, bounded by a cap.
pub struct InFlight {
    count: Mutex<usize>,
    cond: Condvar,
}

/// RAII guard for one in-flight batch; decrements the counter on drop.
///
/// Dropping is the only way to release a slot, so the decrement happens
/// exactly once whether the worker commits, rolls back or panics.
pub struct Slot<'a>(&'a InFlight);

impl InFlight {
    pub fn new() -> Self {
        Self {
            count: Mutex::new(0),
            cond: Condvar::new(),
        }
    }

    /// Take a slot if fewer than `cap` batches are in flight.
    pub fn try_acquire(&self, cap: usize) -> Option<Slot<'_>> {
        let mut count = self.count.lock().unwrap();
        if *count >= cap {
            return None;
        }
        *count += 1;
        Some(Slot(self))
    }

    /// Current number of in-flight batches.
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap()
    }

    /// Block until the count differs from `observed` or `timeout` elapses.
    ///
    /// Returns the count seen on wake-up.
    pub fn wait_change(&self, observed: usize, timeout: Duration) -> usize {
        let count = self.count.lock().unwrap();
        let (count, _) = self
            .cond
            .wait_timeout_while(count, timeout, |c| *c == observed)
            .unwrap();
        *count
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let mut count = self.0.count.lock().unwrap();
        *count -= 1;
        self.0.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn acquire_up_to_cap() {
        let inflight = InFlight::new();
        let s1 = inflight.try_acquire(2);
        let s2 = inflight.try_acquire(2);
        assert!(s1.is_some());
        assert!(s2.is_some());
        assert!(inflight.try_acquire(2).is_none());
        assert_eq!(inflight.count(), 2);
        drop(s1);
        assert_eq!(inflight.count(), 1);
        assert!(inflight.try_acquire(2).is_some());
    }

    #[test]
    fn zero_cap_never_acquires() {
        let inflight = InFlight::new();
        assert!(inflight.try_acquire(0).is_none());
        assert_eq!(inflight.count(), 0);
    }

    #[test]
    fn wait_change_times_out_when_idle() {
        let inflight = InFlight::new();
        let start = Instant::now();
        let seen = inflight.wait_change(0, Duration::from_millis(30));
        assert_eq!(seen, 0);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn wait_change_wakes_on_release() {
        let inflight = Arc::new(InFlight::new());

        let worker = inflight.clone();
        let handle = std::thread::spawn(move || {
            let slot = worker.try_acquire(1).unwrap();
            std::thread::sleep(Duration::from_millis(50));
            drop(slot);
        });

        // Wait for the worker to take its slot
        while inflight.count() == 0 {
            std::thread::yield_now();
        }
        let seen = inflight.wait_change(1, Duration::from_secs(5));
        assert_eq!(seen, 0);
        handle.join().unwrap();
    }
}
