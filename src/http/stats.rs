use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

/// Lock-free request counters shared by every clone of a transport
#[derive(Debug, Default)]
pub struct ClientStats {
    request_count: AtomicU64,
    success_count: AtomicU64,
    error_count: AtomicU64,
    active_requests: AtomicI64,
}

/// Point-in-time copy of [`ClientStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub active_requests: i64,
}

impl ClientStats {
    /// Count a request as started; the guard records its end
    pub(crate) fn begin(&self) -> RequestGuard<'_> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        RequestGuard {
            stats: self,
            succeeded: false,
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            request_count: self.request_count.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            active_requests: self.active_requests.load(Ordering::Relaxed),
        }
    }
}

/// Marks one in-flight request. Dropped without [`RequestGuard::succeed`]
/// (error or cancellation) it counts as an error.
pub(crate) struct RequestGuard<'a> {
    stats: &'a ClientStats,
    succeeded: bool,
}

impl RequestGuard<'_> {
    pub fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.stats.active_requests.fetch_sub(1, Ordering::Relaxed);
        let counter = if self.succeeded {
            &self.stats.success_count
        } else {
            &self.stats.error_count
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_active_and_outcome() {
        let stats = ClientStats::default();

        let first = stats.begin();
        let second = stats.begin();
        assert_eq!(stats.snapshot().active_requests, 2);

        first.succeed();
        drop(second);

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                request_count: 2,
                success_count: 1,
                error_count: 1,
                active_requests: 0,
            }
        );
    }
}
