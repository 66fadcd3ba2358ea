// ABOUTME: Polling cadence for stack monitoring.
// ABOUTME: Fast while the status is moving, backs off once it settles.

use std::time::Duration;

/// Adaptive poll schedule. The caller counts polls since the stack status
/// last changed and resets that counter on every change.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub fast: Duration,
    pub slow: Duration,
    pub threshold: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            fast: Duration::from_secs(2),
            slow: Duration::from_secs(5),
            threshold: 5,
        }
    }
}

impl PollSchedule {
    pub fn interval(&self, polls_since_change: u32) -> Duration {
        if polls_since_change < self.threshold {
            self.fast
        } else {
            self.slow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backs_off_after_five_unchanged_polls() {
        let schedule = PollSchedule::default();
        let intervals: Vec<u64> = (0..7)
            .map(|i| schedule.interval(i).as_secs())
            .collect();
        assert_eq!(intervals, [2, 2, 2, 2, 2, 5, 5]);
    }

    #[test]
    fn status_change_resets_to_fast() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.interval(6), Duration::from_secs(5));
        assert_eq!(schedule.interval(0), Duration::from_secs(2));
    }
}
