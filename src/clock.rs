use std::cell::Cell;
use std::rc::Rc;

/// Source of wall-clock time for the render loop.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> f64;
}

/// Reads the host's real-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, time_ms: f64) {
        self.now.set(time_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Seconds elapsed since the loop started, measured on the injected clock.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedClock {
    start_ms: f64,
}

impl ElapsedClock {
    pub fn start(clock: &impl Clock) -> Self {
        Self {
            start_ms: clock.now_ms(),
        }
    }

    pub fn elapsed_seconds(&self, clock: &impl Clock) -> f64 {
        (clock.now_ms() - self.start_ms).max(0.0) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(5.0);
        let handle = clock.clone();
        handle.advance(10.0);
        assert_eq!(clock.now_ms(), 15.0);
    }

    #[test]
    fn elapsed_clock_counts_from_start() {
        let clock = ManualClock::new(2_000.0);
        let elapsed = ElapsedClock::start(&clock);
        clock.set(3_500.0);
        assert_eq!(elapsed.elapsed_seconds(&clock), 1.5);
        clock.set(0.0);
        assert_eq!(elapsed.elapsed_seconds(&clock), 0.0);
    }

    #[test]
    fn system_clock_reports_epoch_milliseconds() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_577_836_800_000.0);
    }
}
