//! Per-client request allowance.
//!
//! Each client address gets a single-slot token bucket that is refilled on a
//! fixed tick of `1 / requests_per_second`. A tick that arrives while the slot
//! is already full is lost, so a client can burst at most one request above
//! the steady rate. A brand-new client starts with a full slot.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug)]
struct Allowance {
    /// Time of the most recent tick accounted for.
    anchor: Instant,
    available: bool,
}

impl Allowance {
    fn new(now: Instant) -> Self {
        Self {
            anchor: now,
            available: true,
        }
    }

    fn try_acquire(&mut self, now: Instant, interval: Duration) -> bool {
        let elapsed = now.saturating_duration_since(self.anchor);
        if elapsed >= interval {
            let into_current_tick = elapsed.as_nanos() % interval.as_nanos();
            let into_current_tick = Duration::from_nanos(into_current_tick as u64);
            self.anchor = now.checked_sub(into_current_tick).unwrap_or(now);
            self.available = true;
        }

        std::mem::replace(&mut self.available, false)
    }
}

#[derive(Debug)]
struct Client {
    allowance: Arc<Mutex<Allowance>>,
    last_seen: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks every client seen recently and decides whether its next request
/// may proceed.
///
/// The map lock is only held to find or create a client and stamp its
/// `last_seen`; the allowance check takes the client's own lock.
#[derive(Debug)]
pub struct RateTracker {
    clients: Mutex<HashMap<IpAddr, Client>>,
    interval: Duration,
    idle_timeout: Duration,
}

impl RateTracker {
    /// The refill interval is `1s / requests_per_second`, never below one
    /// nanosecond; a rate of zero is treated as one.
    pub fn new(requests_per_second: u32, idle_timeout: Duration) -> Self {
        let interval = Duration::from_secs(1) / requests_per_second.max(1);
        Self {
            clients: Mutex::new(HashMap::new()),
            interval: interval.max(Duration::from_nanos(1)),
            idle_timeout,
        }
    }

    /// Returns `true` if a request from `ip` may proceed now.
    pub fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let allowance = {
            let mut clients = lock(&self.clients);
            let client = clients.entry(ip).or_insert_with(|| Client {
                allowance: Arc::new(Mutex::new(Allowance::new(now))),
                last_seen: now,
            });
            client.last_seen = now;
            Arc::clone(&client.allowance)
        };

        lock(&allowance).try_acquire(now, self.interval)
    }

    /// Forgets clients idle for longer than the idle timeout. Returns how
    /// many were removed.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut clients = lock(&self.clients);
        let before = clients.len();
        clients.retain(|_, client| now.saturating_duration_since(client.last_seen) <= self.idle_timeout);
        before - clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        lock(&self.clients).len()
    }

    /// Starts the background sweep that calls [`evict_idle`](Self::evict_idle)
    /// every `every`. The sweep runs until the returned handle is stopped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> Sweeper {
        let tracker = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            loop {
                ticker.tick().await;
                let evicted = tracker.evict_idle();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = tracker.tracked_clients(), "evicted idle clients");
                }
            }
        });
        Sweeper { handle }
    }
}

/// Handle to the idle-client sweep task.
#[derive(Debug)]
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn stop(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const IDLE: Duration = Duration::from_secs(180);

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
    }

    async fn advance_ms(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_three_admits_one_then_refills() {
        let tracker = RateTracker::new(2, IDLE);

        assert!(tracker.allow(ip(1)));
        advance_ms(200).await;
        assert!(!tracker.allow(ip(1)));
        advance_ms(200).await;
        assert!(!tracker.allow(ip(1)));

        advance_ms(600).await;
        assert!(tracker.allow(ip(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_independent() {
        let tracker = RateTracker::new(2, IDLE);
        assert!(tracker.allow(ip(1)));
        assert!(!tracker.allow(ip(1)));
        assert!(tracker.allow(ip(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn missed_ticks_do_not_accumulate() {
        let tracker = RateTracker::new(2, IDLE);
        assert!(tracker.allow(ip(1)));

        // Ten ticks pass, but the slot holds only one.
        advance_ms(5_000).await;
        assert!(tracker.allow(ip(1)));
        assert!(!tracker.allow(ip(1)));

        // The next tick is still on the original 500 ms grid.
        advance_ms(499).await;
        assert!(!tracker.allow(ip(1)));
        advance_ms(1).await;
        assert!(tracker.allow(ip(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_clients_are_evicted_and_start_fresh() {
        let tracker = RateTracker::new(2, IDLE);
        assert!(tracker.allow(ip(1)));
        assert!(!tracker.allow(ip(1)));

        advance_ms(170_000).await;
        assert!(tracker.allow(ip(2)));
        advance_ms(11_000).await;

        assert_eq!(tracker.evict_idle(), 1);
        assert_eq!(tracker.tracked_clients(), 1);
        assert!(tracker.allow(ip(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn rates_beyond_nanosecond_resolution_still_refill() {
        let tracker = RateTracker::new(2_000_000_000, IDLE);
        assert!(tracker.allow(ip(1)));
        advance_ms(1).await;
        assert!(tracker.allow(ip(1)));
        assert!(!tracker.allow(ip(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_on_its_interval_until_stopped() {
        let tracker = Arc::new(RateTracker::new(2, IDLE));
        tracker.allow(ip(1));
        let sweeper = tracker.spawn_sweeper(Duration::from_secs(60));

        // Sweeps at 60 s, 120 s and 180 s find the client not yet idle enough.
        tokio::time::sleep(Duration::from_secs(181)).await;
        assert_eq!(tracker.tracked_clients(), 1);

        // The 240 s sweep evicts it.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(tracker.tracked_clients(), 0);

        sweeper.stop();
        tracker.allow(ip(1));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(tracker.tracked_clients(), 1);
    }
}
