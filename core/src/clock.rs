use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use web_time::{SystemTime, UNIX_EPOCH};

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall clock that never reports a time earlier than one it already
/// returned; clones share the high-water mark.
#[derive(Clone, Debug, Default)]
pub struct SystemClock {
    high_water_ms: Arc<AtomicU64>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn observe(&self, now_ms: u64) -> u64 {
        let previous = self.high_water_ms.fetch_max(now_ms, Ordering::Relaxed);
        previous.max(now_ms)
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        self.observe(now)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_never_goes_backwards() {
        let clock = SystemClock::new();
        let mut last = clock.now_ms();
        for _ in 0..1000 {
            let next = clock.now_ms();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn system_clock_holds_its_high_water_mark() {
        let clock = SystemClock::new();
        let copy = clock.clone();
        assert_eq!(clock.observe(500), 500);
        assert_eq!(copy.observe(200), 500);
        assert_eq!(SystemClock::new().observe(200), 200);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(10);
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.now_ms(), 15);
        handle.set(3);
        assert_eq!(clock.now_ms(), 3);
    }
}
