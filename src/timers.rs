//! Stage timing for export statistics.

use std::time::{Duration, Instant};

use tracing::debug;

/// Records how long an export stage took into `slot` when dropped.
///
/// Dropping on every exit path means a stage that fails early still
/// reports the time it spent.
pub struct StageTimer<'a> {
    stage: &'static str,
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> StageTimer<'a> {
    pub fn start(stage: &'static str, slot: &'a mut Duration) -> Self {
        Self {
            stage,
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for StageTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        *self.slot += elapsed;
        debug!(event = "Export", phase = self.stage, elapsed_ms = elapsed.as_millis() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stage_timer_records_on_early_return() {
        fn stage(slot: &mut Duration, fail: bool) -> Result<(), ()> {
            let _timer = StageTimer::start("Test", slot);
            thread::sleep(Duration::from_millis(5));
            if fail {
                return Err(());
            }
            thread::sleep(Duration::from_millis(5));
            Ok(())
        }

        let mut elapsed = Duration::ZERO;
        assert!(stage(&mut elapsed, true).is_err());
        assert!(elapsed >= Duration::from_millis(5));

        let mut elapsed = Duration::ZERO;
        assert!(stage(&mut elapsed, false).is_ok());
        assert!(elapsed >= Duration::from_millis(10));
    }
}
