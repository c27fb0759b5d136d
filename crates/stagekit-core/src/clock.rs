//! Injectable time source
//!
//! Every settle interval and poll delay goes through a [`Clock`], so the
//! homing and sequencing logic can be driven in tests without real sleeps.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Source of blocking delays
pub trait Clock: Send + Sync {
    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

type SleepHook = Box<dyn Fn(usize) + Send + Sync>;

/// Clock that never blocks; it records each requested delay instead
#[derive(Default)]
pub struct ManualClock {
    sleeps: Mutex<Vec<Duration>>,
    hook: Mutex<Option<Arc<SleepHook>>>,
}

impl ManualClock {
    /// Create a new manual clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback run after every recorded sleep, with the sleep count
    pub fn on_sleep(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Arc::new(Box::new(hook)));
    }

    /// Every delay requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Sum of all requested delays
    pub fn elapsed(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl std::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClock")
            .field("sleeps", &self.sleeps.lock().len())
            .finish()
    }
}

impl Clock for ManualClock {
    fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self.sleeps.lock();
            sleeps.push(duration);
            sleeps.len()
        };
        // Clone out so the hook may call back into this clock.
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(count);
        }
    }
}
