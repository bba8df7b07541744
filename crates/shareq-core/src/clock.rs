use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since UNIX epoch.
pub type EpochMs = i64;

pub fn now_ms() -> EpochMs {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_millis() as i64
}

/// Time source for stores. Injectable so expiry behavior is testable
/// without sleeping.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> EpochMs;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> EpochMs {
        now_ms()
    }
}

/// Test clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<EpochMs>,
}

impl ManualClock {
    pub fn new(start: EpochMs) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, t: EpochMs) {
        *self.now.lock().unwrap() = t;
    }

    pub fn advance(&self, delta: EpochMs) {
        *self.now.lock().unwrap() += delta;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> EpochMs {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ms(), 100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }
}
