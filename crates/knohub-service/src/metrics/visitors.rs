//! Active visitor counting by client IP.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

const MAX_RETENTION_HOURS: i64 = 24 * 365 * 100;

/// Remembers when each client IP was last seen.
///
/// Entries older than the retention window are swept whenever a visit is
/// recorded or the count is read.
#[derive(Debug)]
pub struct VisitorTracker {
    last_seen: DashMap<String, DateTime<Utc>>,
    retention: Duration,
}

impl VisitorTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            last_seen: DashMap::new(),
            retention,
        }
    }

    /// Tracker keeping visitors for `hours`, capped at a century.
    pub fn with_retention_hours(hours: u64) -> Self {
        let hours = i64::try_from(hours).unwrap_or(i64::MAX).min(MAX_RETENTION_HOURS);
        Self::new(Duration::hours(hours))
    }

    pub fn record(&self, ip: &str) {
        self.record_at(ip, Utc::now());
    }

    /// Record a visit seen at `now`. Blank addresses are ignored.
    pub fn record_at(&self, ip: &str, now: DateTime<Utc>) {
        let ip = ip.trim();
        if ip.is_empty() {
            return;
        }
        self.last_seen.insert(ip.to_string(), now);
        self.sweep(now);
    }

    pub fn active_count(&self) -> usize {
        self.active_count_at(Utc::now())
    }

    /// Number of distinct visitors seen within the retention window.
    pub fn active_count_at(&self, now: DateTime<Utc>) -> usize {
        self.sweep(now);
        self.last_seen.len()
    }

    fn sweep(&self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        let before = self.last_seen.len();
        self.last_seen.retain(|_, seen| *seen >= cutoff);
        let removed = before.saturating_sub(self.last_seen.len());
        if removed > 0 {
            debug!(removed, "Expired visitor entries");
        }
    }
}
