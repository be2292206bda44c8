/// Decide whether the device should reset after `idle_secs` without activity.
///
/// A timeout of 0 disables the reset.
pub fn should_reset(idle_secs: u64, timeout_secs: u64) -> bool {
    timeout_secs != 0 && idle_secs >= timeout_secs
}

/// Tracks when the device was last in use.
///
/// Activity is a new connection or any report handed to the transport;
/// the latter is detected from the controller's sent-report counter.
#[derive(Clone, Copy, Debug)]
pub struct ActivityMonitor {
    last_activity_secs: u64,
    reports_seen: u32,
}

impl ActivityMonitor {
    pub const fn new(now_secs: u64) -> Self {
        Self {
            last_activity_secs: now_secs,
            reports_seen: 0,
        }
    }

    /// Record explicit activity (e.g. a host connected).
    pub fn prod(&mut self, now_secs: u64) {
        self.last_activity_secs = now_secs;
    }

    /// Feed the current sent-report count; any change counts as activity.
    pub fn observe_reports(&mut self, now_secs: u64, reports_sent: u32) {
        if reports_sent != self.reports_seen {
            self.reports_seen = reports_sent;
            self.last_activity_secs = now_secs;
        }
    }

    pub fn idle_secs(&self, now_secs: u64) -> u64 {
        now_secs.saturating_sub(self.last_activity_secs)
    }

    pub fn should_reset(&self, now_secs: u64, timeout_secs: u64) -> bool {
        should_reset(self.idle_secs(now_secs), timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_only_after_timeout() {
        assert!(!should_reset(599, 600));
        assert!(should_reset(600, 600));
        assert!(!should_reset(10_000, 0));
    }

    #[test]
    fn reports_keep_device_awake() {
        let mut monitor = ActivityMonitor::new(0);
        monitor.observe_reports(300, 5);
        assert!(!monitor.should_reset(600, 600));
        assert!(monitor.should_reset(900, 600));
    }

    #[test]
    fn unchanged_count_is_not_activity() {
        let mut monitor = ActivityMonitor::new(0);
        monitor.observe_reports(100, 0);
        assert_eq!(monitor.idle_secs(100), 100);
        monitor.observe_reports(200, 1);
        monitor.observe_reports(500, 1);
        assert_eq!(monitor.idle_secs(500), 300);
    }

    #[test]
    fn connection_prods() {
        let mut monitor = ActivityMonitor::new(0);
        monitor.prod(550);
        assert!(!monitor.should_reset(700, 600));
        assert_eq!(monitor.idle_secs(10), 0);
    }
}
