//! Simulation context implementing TwinContext for deterministic replays.

use airtwin_env::TwinContext;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Simulation context backed by a virtual clock.
///
/// - The clock only moves through `advance_time`, `set_time` or `sleep`
/// - `sleep` advances the clock and returns immediately, so a replay of any
///   length completes as fast as the CPU allows
pub struct SimContext {
    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl SimContext {
    /// Creates a new SimContext at virtual time zero.
    pub fn new() -> Self {
        Self::with_epoch(UNIX_EPOCH + Duration::from_secs(1704067200)) // 2024-01-01 00:00:00 UTC
    }

    /// Creates a context whose time zero maps to `epoch`.
    pub fn with_epoch(epoch: SystemTime) -> Self {
        Self {
            virtual_time_ns: Arc::new(Mutex::new(0)),
            epoch,
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = self.virtual_time_ns.lock().unwrap_or_else(PoisonError::into_inner);
        *time = time.saturating_add(duration.as_nanos() as u64);
    }

    /// Sets the virtual time to a specific value.
    pub fn set_time(&self, time_ns: u64) {
        let mut time = self.virtual_time_ns.lock().unwrap_or_else(PoisonError::into_inner);
        *time = time_ns;
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *self.virtual_time_ns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            epoch: self.epoch,
        }
    }
}

#[async_trait]
impl TwinContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance_time(duration);
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.to_string();
        tokio::spawn(async move {
            tracing::debug!(task = %name, "sim task started");
            future.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_context_time() {
        let ctx = SimContext::new();
        assert_eq!(ctx.now(), Duration::ZERO);

        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(ctx.now(), Duration::from_secs(1));

        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(ctx.now(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_sleep_advances_virtual_clock() {
        let ctx = SimContext::new();
        ctx.sleep(Duration::from_secs(3600)).await;
        assert_eq!(ctx.now(), Duration::from_secs(3600));
    }

    #[test]
    fn test_system_time_follows_epoch() {
        let ctx = SimContext::new();
        ctx.set_time(2_000_000_000);
        let since_epoch = ctx.system_time().duration_since(UNIX_EPOCH).unwrap();
        assert_eq!(since_epoch, Duration::from_secs(1704067202));
    }

    #[test]
    fn test_sim_context_clone_shares_time() {
        let ctx1 = SimContext::new();
        let ctx2 = ctx1.clone();

        ctx1.advance_time(Duration::from_secs(5));

        // Both should see the same time
        assert_eq!(ctx1.now(), ctx2.now());
    }
}
