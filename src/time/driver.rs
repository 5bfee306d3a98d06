//! Timer drivers.
//!
//! The core requires exactly one primitive from its host environment:
//! [`Timer::schedule`]. It never owns ambient threads of its own; the host
//! picks the driver. Two are provided:
//!
//! - [`ThreadTimer`]: wall-clock driver backed by a dedicated thread,
//!   for production boundaries.
//! - [`VirtualTimer`]: deterministic lab timer where time advances only
//!   when told to, for testing time-dependent code without sleeping.
//!
//! Both fire registrations with equal deadlines in registration order, so
//! schedules are deterministic under either driver.

use crate::tracing_compat::{trace, warn};
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// A scheduled callback.
pub type TimerCallback = Box<dyn FnOnce() + Send>;

/// The single time primitive the core requires from its host.
pub trait Timer: Send + Sync {
    /// Runs `callback` once, after `delay` has elapsed.
    ///
    /// The thread the callback runs on is driver-specific; callbacks must
    /// not block the driver.
    fn schedule(&self, delay: Duration, callback: TimerCallback);
}

// Min-heap entry ordered by (deadline, seq); seq breaks deadline ties in
// registration order.
struct Entry<K: Ord + Copy> {
    due: K,
    seq: u64,
    callback: TimerCallback,
}

impl<K: Ord + Copy> PartialEq for Entry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<K: Ord + Copy> Eq for Entry<K> {}

impl<K: Ord + Copy> PartialOrd for Entry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord + Copy> Ord for Entry<K> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed so BinaryHeap pops the earliest (due, seq) first.
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

struct DriverState {
    queue: BinaryHeap<Entry<Instant>>,
    next_seq: u64,
    shutdown: bool,
}

struct DriverShared {
    state: Mutex<DriverState>,
    cond: Condvar,
}

/// Wall-clock timer driver backed by a dedicated thread.
///
/// Callbacks run on the driver thread in (deadline, registration) order. A
/// panicking callback is caught and logged; it does not take down the
/// driver. Dropping the driver shuts the thread down; registrations still
/// outstanding at that point are abandoned, so the driver must outlive
/// every cell that waits on it.
pub struct ThreadTimer {
    shared: Arc<DriverShared>,
    thread: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    /// Creates the driver and spawns its thread.
    #[must_use]
    pub fn new() -> Self {
        let shared = Arc::new(DriverShared {
            state: Mutex::new(DriverState {
                queue: BinaryHeap::new(),
                next_seq: 0,
                shutdown: false,
            }),
            cond: Condvar::new(),
        });
        let driver = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("settled-timer".into())
            .spawn(move || Self::drive(&driver))
            .expect("failed to spawn timer driver thread");
        Self {
            shared,
            thread: Some(thread),
        }
    }

    fn drive(shared: &DriverShared) {
        let mut state = shared.state.lock();
        loop {
            if state.shutdown {
                return;
            }
            let now = Instant::now();
            match state.queue.peek() {
                Some(entry) if entry.due <= now => {
                    let entry = state.queue.pop().expect("peeked entry must pop");
                    drop(state);
                    if catch_unwind(AssertUnwindSafe(entry.callback)).is_err() {
                        warn!("timer callback panicked; driver continues");
                    }
                    state = shared.state.lock();
                }
                Some(entry) => {
                    let due = entry.due;
                    let _ = shared.cond.wait_until(&mut state, due);
                }
                None => {
                    shared.cond.wait(&mut state);
                }
            }
        }
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for ThreadTimer {
    fn schedule(&self, delay: Duration, callback: TimerCallback) {
        let mut state = self.shared.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        trace!(seq, ?delay, "timer registration");
        state.queue.push(Entry {
            due: Instant::now() + delay,
            seq,
            callback,
        });
        drop(state);
        self.shared.cond.notify_one();
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.cond.notify_one();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct VirtualState {
    queue: BinaryHeap<Entry<Duration>>,
    now: Duration,
    next_seq: u64,
}

/// Deterministic timer for lab testing.
///
/// Time starts at zero and advances only through [`advance`](Self::advance),
/// which fires every registration that falls due, in (deadline,
/// registration) order, stepping the clock to each deadline as it goes.
/// Callbacks scheduling further timers within the advanced window fire in
/// the same call.
///
/// # Example
///
/// ```
/// use settled::{Timer, VirtualTimer};
/// use std::time::Duration;
///
/// let timer = VirtualTimer::new();
/// timer.schedule(Duration::from_millis(10), Box::new(|| println!("due")));
/// assert_eq!(timer.pending(), 1);
///
/// timer.advance(Duration::from_millis(10)); // fires here
/// assert_eq!(timer.pending(), 0);
/// ```
pub struct VirtualTimer {
    state: Mutex<VirtualState>,
}

impl VirtualTimer {
    /// Creates a virtual timer at time zero with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(VirtualState {
                queue: BinaryHeap::new(),
                now: Duration::ZERO,
                next_seq: 0,
            }),
        }
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Returns the number of outstanding registrations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Advances virtual time by `delta`, firing every registration that
    /// falls due.
    ///
    /// Must not be called from within a timer callback; callbacks may only
    /// `schedule`.
    pub fn advance(&self, delta: Duration) {
        let target = {
            let state = self.state.lock();
            state.now + delta
        };
        loop {
            let entry = {
                let mut state = self.state.lock();
                match state.queue.peek() {
                    Some(entry) if entry.due <= target => {
                        let entry = state.queue.pop().expect("peeked entry must pop");
                        state.now = entry.due;
                        entry
                    }
                    _ => break,
                }
            };
            trace!(seq = entry.seq, "virtual timer fired");
            (entry.callback)();
        }
        self.state.lock().now = target;
    }
}

impl Default for VirtualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for VirtualTimer {
    fn schedule(&self, delay: Duration, callback: TimerCallback) {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + delay;
        state.queue.push(Entry { due, seq, callback });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // =========================================================================
    // VirtualTimer Tests
    // =========================================================================

    #[test]
    fn nothing_fires_without_advance() {
        let timer = VirtualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&fired);
        timer.schedule(
            Duration::from_millis(1),
            Box::new(move || {
                counted.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        timer.advance(Duration::from_millis(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn equal_deadlines_fire_in_registration_order() {
        let timer = VirtualTimer::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..4 {
            let order = Arc::clone(&order);
            timer.schedule(
                Duration::from_millis(5),
                Box::new(move || order.lock().push(tag)),
            );
        }
        timer.advance(Duration::from_millis(5));
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn advance_steps_time_to_each_deadline() {
        let timer = Arc::new(VirtualTimer::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        // A callback scheduling a follow-up inside the advanced window: both
        // must fire within one advance call.
        let chained = Arc::clone(&timer);
        let inner_seen = Arc::clone(&seen);
        timer.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                inner_seen.lock().push(chained.now());
                let deep_seen = Arc::clone(&inner_seen);
                let observer = Arc::clone(&chained);
                chained.schedule(
                    Duration::from_millis(10),
                    Box::new(move || deep_seen.lock().push(observer.now())),
                );
            }),
        );

        timer.advance(Duration::from_millis(30));
        assert_eq!(
            *seen.lock(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
        assert_eq!(timer.now(), Duration::from_millis(30));
    }

    #[test]
    fn registrations_beyond_the_window_stay_pending() {
        let timer = VirtualTimer::new();
        timer.schedule(Duration::from_millis(100), Box::new(|| {}));
        timer.advance(Duration::from_millis(99));
        assert_eq!(timer.pending(), 1);
        timer.advance(Duration::from_millis(1));
        assert_eq!(timer.pending(), 0);
    }

    // =========================================================================
    // ThreadTimer Tests
    // =========================================================================

    #[test]
    fn thread_timer_fires_after_delay() {
        let timer = ThreadTimer::new();
        let (tx, rx) = std::sync::mpsc::channel();
        timer.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        rx.recv_timeout(Duration::from_secs(2))
            .expect("callback should fire");
    }

    #[test]
    fn thread_timer_fires_in_deadline_order() {
        let timer = ThreadTimer::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = std::sync::mpsc::channel();

        let late = Arc::clone(&order);
        let late_tx = tx.clone();
        timer.schedule(
            Duration::from_millis(40),
            Box::new(move || {
                late.lock().push("late");
                let _ = late_tx.send(());
            }),
        );
        let early = Arc::clone(&order);
        timer.schedule(
            Duration::from_millis(5),
            Box::new(move || early.lock().push("early")),
        );

        rx.recv_timeout(Duration::from_secs(2)).expect("late fires");
        assert_eq!(*order.lock(), vec!["early", "late"]);
    }

    #[test]
    fn panicking_callback_does_not_kill_the_driver() {
        let timer = ThreadTimer::new();
        timer.schedule(Duration::from_millis(1), Box::new(|| panic!("boom")));

        let (tx, rx) = std::sync::mpsc::channel();
        timer.schedule(
            Duration::from_millis(20),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        rx.recv_timeout(Duration::from_secs(2))
            .expect("driver should survive the panic");
    }
}
