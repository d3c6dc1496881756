//! In-memory dataset source for replays and tests.

use airtwin_env::{DataSource, EnvError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Serves fixed dataset strings by location.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    datasets: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `text` under `location`.
    pub fn with_dataset(mut self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(location, text);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, text: impl Into<String>) {
        self.datasets.insert(location.into(), text.into());
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self, location: &str) -> Result<String, EnvError> {
        self.datasets
            .get(location)
            .cloned()
            .ok_or_else(|| EnvError::not_found(location))
    }

    fn describe(&self) -> String {
        format!("memory ({} datasets)", self.datasets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source_lookup() {
        let source = MemorySource::new().with_dataset("a.csv", "Series;Time;Value");
        assert_eq!(source.fetch("a.csv").await.unwrap(), "Series;Time;Value");
        assert!(matches!(source.fetch("b.csv").await, Err(EnvError::NotFound(_))));
    }
}
