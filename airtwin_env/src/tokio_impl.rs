//! Production implementations backed by Tokio.

use crate::{DataSource, EnvError, TwinContext};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Production context backed by Tokio and the system clock.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TwinContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.to_string();
        tokio::spawn(async move {
            tracing::debug!(task = %name, "task started");
            future.await;
        });
    }
}

/// Reads datasets from the local filesystem.
///
/// Relative locations are resolved against `root`; absolute ones are used
/// as given.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a source rooted at the current working directory.
    pub fn cwd() -> Self {
        Self::new(".")
    }

    fn resolve(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }
}

#[async_trait]
impl DataSource for FsSource {
    async fn fetch(&self, location: &str) -> Result<String, EnvError> {
        let path = self.resolve(location);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| EnvError::io(path.display().to_string(), e))
    }

    fn describe(&self) -> String {
        format!("filesystem at {}", self.root.display())
    }
}
