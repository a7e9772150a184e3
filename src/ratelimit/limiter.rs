//! Rate Limiter Module
//!
//! Fixed-window request counter keyed by client identifier.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::ratelimit::{RateLimitDecision, RateLimitEntry};
use crate::tasks::spawn_sweep_task;

// == Window Table ==
/// Lock-protected map of open windows, shared with the sweep task.
#[derive(Debug, Default)]
pub struct WindowTable {
    state: Mutex<TableState>,
}

#[derive(Debug, Default)]
struct TableState {
    entries: HashMap<String, RateLimitEntry>,
    /// Bumped by `halt`; sweeps started under an older epoch stop.
    epoch: u64,
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request for `identifier` at `now_ms`.
    pub fn check(&self, identifier: &str, limit: u64, window_ms: u64, now_ms: u64) -> RateLimitDecision {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(entry) = state.entries.get_mut(identifier) {
            if !entry.is_expired(now_ms) {
                if entry.count >= limit {
                    return RateLimitDecision::denied(entry.reset_at);
                }
                entry.count += 1;
                return RateLimitDecision::allowed(limit - entry.count, entry.reset_at);
            }
        }

        let entry = RateLimitEntry::fresh(now_ms, window_ms);
        state.entries.insert(identifier.to_string(), entry);
        RateLimitDecision::allowed(limit.saturating_sub(1), entry.reset_at)
    }

    /// Drops every window that ended before `now_ms`.
    ///
    /// Returns None without touching the table when `epoch` is stale.
    pub fn sweep(&self, now_ms: u64, epoch: u64) -> Option<usize> {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return None;
        }

        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now_ms));
        Some(before - state.entries.len())
    }

    /// Current epoch, handed to a new sweep task.
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Invalidates running sweeps and forgets every window.
    pub fn halt(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

// == Rate Limiter ==
/// Per-identifier fixed-window rate limiter.
///
/// Each identifier gets `limit` requests per window. The window opens on the
/// first request and is replaced, not extended, once it has ended. Bursts
/// straddling a boundary can therefore admit up to twice the limit.
///
/// Ended windows are also removed by an optional background sweep so that
/// identifiers which never return do not pile up.
#[derive(Debug)]
pub struct RateLimiter {
    table: Arc<WindowTable>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    // == Constructors ==
    /// Creates a limiter on the system clock with no sweep running.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a limiter reading time from `clock` with no sweep running.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Arc::new(WindowTable::new()),
            sweeper: Mutex::new(None),
            clock,
        }
    }

    // == Check ==
    /// Admits or rejects one request from `identifier`.
    ///
    /// A rejection leaves the count untouched. `limit` and `window_ms` must
    /// be positive.
    pub fn check(&self, identifier: &str, limit: u64, window_ms: u64) -> RateLimitDecision {
        debug_assert!(limit > 0, "rate limit must be positive");
        debug_assert!(window_ms > 0, "rate limit window must be positive");

        let now = self.clock.now_ms();
        self.table.check(identifier, limit, window_ms, now)
    }

    // == Sweep ==
    /// Removes ended windows now. Returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let epoch = self.table.epoch();
        self.table.sweep(self.clock.now_ms(), epoch).unwrap_or(0)
    }

    /// Starts the periodic sweep on the current tokio runtime.
    ///
    /// Returns false and leaves the running task alone if a sweep is
    /// already active.
    pub fn start_sweep(&self, interval: Duration) -> bool {
        let mut sweeper = self.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Rate limit sweep already running");
            return false;
        }

        let epoch = self.table.epoch();
        *sweeper = Some(spawn_sweep_task(
            self.table.clone(),
            self.clock.clone(),
            interval,
            epoch,
        ));
        true
    }

    /// Returns true while a sweep task is alive.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Destroy ==
    /// Stops the sweep and clears all windows.
    ///
    /// No sweep touches the table after this returns. The limiter stays
    /// usable and behaves like a new one without a sweep.
    pub fn destroy(&self) {
        self.table.halt();
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        info!("Rate limiter destroyed");
    }

    /// Number of identifiers with a tracked window.
    pub fn tracked(&self) -> usize {
        self.table.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;

    fn limiter_at(start_ms: u64) -> (RateLimiter, ManualClock) {
        let clock = ManualClock::new(start_ms);
        let limiter = RateLimiter::with_clock(Arc::new(clock.clone()));
        (limiter, clock)
    }

    #[test]
    fn test_exact_boundary() {
        let (limiter, _) = limiter_at(0);

        let first = limiter.check("ip1", 3, 60_000);
        let second = limiter.check("ip1", 3, 60_000);
        let third = limiter.check("ip1", 3, 60_000);
        let fourth = limiter.check("ip1", 3, 60_000);

        assert!(first.allowed && second.allowed && third.allowed);
        assert_eq!(
            [first.remaining, second.remaining, third.remaining],
            [2, 1, 0]
        );
        assert_eq!(fourth, RateLimitDecision::denied(first.reset_at));
    }

    #[test]
    fn test_denied_does_not_extend_count() {
        let (limiter, clock) = limiter_at(0);

        limiter.check("ip1", 1, 1_000);
        for _ in 0..10 {
            assert!(!limiter.check("ip1", 1, 1_000).allowed);
        }

        clock.set(1_001);
        assert!(limiter.check("ip1", 1, 1_000).allowed);
    }

    #[test]
    fn test_window_reset() {
        let (limiter, clock) = limiter_at(0);

        for _ in 0..3 {
            limiter.check("ip1", 3, 60_000);
        }
        assert!(!limiter.check("ip1", 3, 60_000).allowed);

        clock.set(60_001);
        let decision = limiter.check("ip1", 3, 60_000);

        assert_eq!(decision, RateLimitDecision::allowed(2, 120_001));
    }

    #[test]
    fn test_window_still_open_at_reset_at() {
        let (limiter, clock) = limiter_at(0);

        limiter.check("ip1", 1, 1_000);
        clock.set(1_000);

        assert!(!limiter.check("ip1", 1, 1_000).allowed);
    }

    #[test]
    fn test_per_identifier_isolation() {
        let (limiter, _) = limiter_at(0);

        for _ in 0..5 {
            limiter.check("ip1", 2, 60_000);
        }
        assert!(!limiter.check("ip1", 2, 60_000).allowed);

        let other = limiter.check("ip2", 2, 60_000);
        assert_eq!(other, RateLimitDecision::allowed(1, 60_000));
    }

    #[test]
    fn test_end_to_end_timeline() {
        let (limiter, clock) = limiter_at(0);

        assert_eq!(limiter.check("a", 2, 1_000), RateLimitDecision::allowed(1, 1_000));

        clock.set(100);
        assert_eq!(limiter.check("a", 2, 1_000), RateLimitDecision::allowed(0, 1_000));

        clock.set(200);
        assert_eq!(limiter.check("a", 2, 1_000), RateLimitDecision::denied(1_000));

        clock.set(1_001);
        assert_eq!(limiter.check("a", 2, 1_000), RateLimitDecision::allowed(1, 2_001));
    }

    #[test]
    fn test_sweep_removes_only_ended_windows() {
        let (limiter, clock) = limiter_at(0);

        limiter.check("short", 5, 1_000);
        limiter.check("long", 5, 60_000);
        clock.set(5_000);

        assert_eq!(limiter.sweep_expired(), 1);
        assert_eq!(limiter.tracked(), 1);

        // "long" kept its count through the sweep.
        assert_eq!(limiter.check("long", 5, 60_000).remaining, 3);
    }

    #[test]
    fn test_sweep_bounds_memory_for_one_off_identifiers() {
        let (limiter, clock) = limiter_at(0);

        for i in 0..10_000 {
            limiter.check(&format!("10.0.{}.{}", i / 256, i % 256), 10, 1_000);
        }
        assert_eq!(limiter.tracked(), 10_000);

        clock.advance(1_001);
        assert_eq!(limiter.sweep_expired(), 10_000);
        assert_eq!(limiter.tracked(), 0);

        let decision = limiter.check("10.0.0.0", 10, 1_000);
        assert_eq!(decision, RateLimitDecision::allowed(9, 2_001));
    }

    #[test]
    fn test_destroy_clears_and_limiter_stays_usable() {
        let (limiter, clock) = limiter_at(0);

        limiter.check("ip1", 1, 60_000);
        limiter.destroy();
        assert_eq!(limiter.tracked(), 0);

        clock.advance(10);
        assert_eq!(
            limiter.check("ip1", 1, 60_000),
            RateLimitDecision::allowed(0, 60_010)
        );
    }

    #[test]
    fn test_stale_epoch_sweep_is_ignored() {
        let table = WindowTable::new();
        let epoch = table.epoch();

        table.check("ip1", 1, 10, 0);
        table.halt();
        table.check("ip1", 1, 10, 0);

        assert_eq!(table.sweep(1_000, epoch), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.sweep(1_000, table.epoch()), Some(1));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_start_sweep_is_idempotent() {
        let (limiter, _) = limiter_at(0);

        assert!(limiter.start_sweep(Duration::from_secs(60)));
        assert!(
            !limiter.start_sweep(Duration::from_secs(60)),
            "Second call must keep the running task"
        );
        assert!(limiter.is_sweeping());

        limiter.destroy();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!limiter.is_sweeping());

        // A destroyed limiter can be given a new sweep.
        assert!(limiter.start_sweep(Duration::from_secs(60)));
        limiter.destroy();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Within one window exactly `limit` of `n` requests pass, with
        // remaining counting down to zero.
        #[test]
        fn prop_admits_exactly_limit(limit in 1u64..50, n in 1usize..120, start in 0u64..1_000_000) {
            let (limiter, _) = limiter_at(start);
            let decisions: Vec<_> = (0..n).map(|_| limiter.check("id", limit, 60_000)).collect();

            let admitted = decisions.iter().filter(|d| d.allowed).count() as u64;
            prop_assert_eq!(admitted, limit.min(n as u64));

            for (i, decision) in decisions.iter().enumerate() {
                let expected = limit.saturating_sub(i as u64 + 1);
                prop_assert_eq!(decision.remaining, expected);
                prop_assert_eq!(decision.reset_at, start + 60_000);
            }
        }
    }
}
