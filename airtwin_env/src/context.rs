//! Core environment context trait for the AirTwin replay loop.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so that the replay loop can run
/// in both production (tokio) and simulation (virtual clock) environments.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: `SimContext` (in `airtwin_sim`) - manually advanced clock
///
/// # Determinism
///
/// For replay tests, every method that would normally introduce
/// non-determinism (time) is controlled by the implementation.
#[async_trait]
pub trait TwinContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Cadence deadlines are expressed on this clock.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time, used to stamp exported runs.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
