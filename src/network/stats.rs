//! Request statistics
//!
//! Accumulated by every worker, reported once at shutdown.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;

/// Point-in-time copy of the server statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests that were parsed, executed and answered
    pub completed_requests: u64,

    /// Requests answered with `FORMAT ERROR`
    pub rejected_requests: u64,

    /// Sum of arrival-to-dequeue latencies of completed requests
    pub total_waiting_time: Duration,

    /// Sum of dequeue-to-reply latencies of completed requests
    pub total_service_time: Duration,
}

impl StatsSnapshot {
    /// Mean queue wait in nanoseconds, 0 before the first completion
    pub fn average_waiting_nanos(&self) -> u128 {
        average(self.total_waiting_time, self.completed_requests)
    }

    /// Mean service time in nanoseconds, 0 before the first completion
    pub fn average_service_nanos(&self) -> u128 {
        average(self.total_service_time, self.completed_requests)
    }
}

fn average(total: Duration, count: u64) -> u128 {
    match count {
        0 => 0,
        n => total.as_nanos() / n as u128,
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Completed requests: {}", self.completed_requests)?;
        writeln!(f, "Total waiting time (nanosec): {}", self.total_waiting_time.as_nanos())?;
        writeln!(f, "Average waiting time (nanosec): {}", self.average_waiting_nanos())?;
        writeln!(f, "Total service time (nanosec): {}", self.total_service_time.as_nanos())?;
        writeln!(f, "Average service time (nanosec): {}", self.average_service_nanos())?;
        write!(f, "Rejected requests: {}", self.rejected_requests)
    }
}

/// Shared statistics accumulators
///
/// Guarded by a dedicated lock; updates are plain additions, so the order in
/// which workers record does not matter.
#[derive(Default)]
pub struct Statistics {
    inner: Mutex<StatsSnapshot>,
}

impl Statistics {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one completed request
    pub fn record_served(&self, waited: Duration, serviced: Duration) {
        let mut inner = self.inner.lock();
        inner.completed_requests += 1;
        inner.total_waiting_time += waited;
        inner.total_service_time += serviced;
    }

    /// Account one request answered with `FORMAT ERROR`
    pub fn record_rejected(&self) {
        self.inner.lock().rejected_requests += 1;
    }

    /// Copy of the current totals
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock()
    }
}
