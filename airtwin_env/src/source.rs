//! Dataset source abstraction.

use async_trait::async_trait;
use crate::error::EnvError;

/// Abstraction for fetching raw dataset text.
///
/// # Implementations
///
/// - **Production**: `FsSource`, reads files relative to a root directory
/// - **Simulation**: `MemorySource` (in `airtwin_sim`), serves fixed strings
///
/// # Fetch Flow
///
/// ```text
/// Runner                   DataSource
///   |                          |
///   |-- fetch(location) ------>|
///   |                          |-- [read / lookup]
///   |<----- Ok(text) ----------|
/// ```
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Fetches the full text stored at `location`.
    ///
    /// # Returns
    /// * `Ok(text)` - The raw, unparsed dataset
    /// * `Err(EnvError::NotFound)` - Nothing exists at `location`
    /// * `Err(EnvError::Io)` - The read itself failed
    async fn fetch(&self, location: &str) -> Result<String, EnvError>;

    /// Human-readable description of where data comes from (for logs).
    fn describe(&self) -> String;
}
