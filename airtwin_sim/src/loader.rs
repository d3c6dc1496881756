//! Fetch-then-parse loading of the two replay datasets.

use airtwin_core::{parse_readings, split_environmental, EnvironmentalStreams, ParseError, Reading};
use airtwin_env::{DataSource, EnvError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a dataset could not be installed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: EnvError,
    },

    #[error("failed to parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    pub fn location(&self) -> &str {
        match self {
            LoadError::Fetch { location, .. } | LoadError::Parse { location, .. } => location,
        }
    }
}

async fn fetch_readings<Src>(source: &Src, location: &str) -> Result<Vec<Reading>, LoadError>
where
    Src: DataSource + ?Sized,
{
    let text = source.fetch(location).await.map_err(|source| LoadError::Fetch {
        location: location.to_string(),
        source,
    })?;
    parse_readings(&text).map_err(|source| LoadError::Parse {
        location: location.to_string(),
        source,
    })
}

/// Loads the PM2.5 dataset. Every row is taken as a PM2.5 reading.
pub async fn load_pm25<Src>(source: &Src, location: &str) -> Result<Vec<Reading>, LoadError>
where
    Src: DataSource + ?Sized,
{
    let rows = fetch_readings(source, location).await?;
    info!("PM2.5 data loaded: {} rows from {}", rows.len(), location);
    if rows.is_empty() {
        warn!("PM2.5 dataset {} has no usable rows", location);
    }
    Ok(rows)
}

/// Loads the mixed environmental dataset and splits it per metric.
pub async fn load_environmental<Src>(source: &Src, location: &str) -> Result<EnvironmentalStreams, LoadError>
where
    Src: DataSource + ?Sized,
{
    let rows = fetch_readings(source, location).await?;
    let streams = split_environmental(&rows);
    info!(
        "Loaded environmental data: {} CO2 readings, {} temperature readings, {} humidity readings",
        streams.co2.len(),
        streams.temperature.len(),
        streams.humidity.len()
    );
    debug!("Sample CO2 data: {:?}", streams.co2.iter().take(2).collect::<Vec<_>>());
    if rows.len() > streams.total() {
        debug!("{} rows matched no environmental series", rows.len() - streams.total());
    }
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[tokio::test]
    async fn test_load_pm25() {
        let source = MemorySource::new()
            .with_dataset("pm.csv", "sep=;\nSeries;Time;Value\npm25;t0;12\npm25;t1;oops\npm25;t2;14");
        let rows = load_pm25(&source, "pm.csv").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_load_environmental_splits() {
        let source = MemorySource::new().with_dataset(
            "env.csv",
            "Series;Time;Value\nroom.co2;t0;640\nroom.temperature;t0;21.5\nroom.humidity;t0;44",
        );
        let streams = load_environmental(&source, "env.csv").await.unwrap();
        assert_eq!(streams.co2.len(), 1);
        assert_eq!(streams.temperature.len(), 1);
        assert_eq!(streams.humidity.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_dataset_is_fetch_error() {
        let err = load_pm25(&MemorySource::new(), "absent.csv").await.unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
        assert_eq!(err.location(), "absent.csv");
    }

    #[tokio::test]
    async fn test_missing_column_is_parse_error() {
        let source = MemorySource::new().with_dataset("bad.csv", "Series;Time\nx;t");
        let err = load_environmental(&source, "bad.csv").await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse { source: ParseError::MissingColumn("Value"), .. }
        ));
    }
}
