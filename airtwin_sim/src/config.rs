//! Replay configuration: defaults, optional JSON file, CLI overrides.

use airtwin_core::{RoomBounds, Scenario, ScenarioError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration problems. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid scenario switch `{0}` (expected <seconds>:<scenario>)")]
    InvalidSwitch(String),

    #[error("invalid duration {0}s")]
    InvalidDuration(f64),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// A scripted scenario selection at a fixed point of the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSwitch {
    /// Seconds since the start of the run
    pub at_secs: f64,
    pub scenario: Scenario,
}

impl ScenarioSwitch {
    /// Parses `<seconds>:<scenario>`, e.g. `5:open-window`.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (at, scenario) = spec
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidSwitch(spec.to_string()))?;
        let at_secs: f64 = at
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidSwitch(spec.to_string()))?;
        let switch = Self {
            at_secs,
            scenario: scenario.trim().parse()?,
        };
        switch.at().map(|_| switch)
    }

    /// Offset from the start of the run.
    pub fn at(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.at_secs)
            .map_err(|_| ConfigError::InvalidSwitch(format!("{}:{}", self.at_secs, self.scenario)))
    }
}

/// Configuration for a replay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinConfig {
    /// Directory dataset locations are resolved against
    pub data_root: PathBuf,

    /// PM2.5 dataset location
    pub pm25_dataset: String,

    /// Mixed CO2 / temperature / humidity dataset location
    pub environment_dataset: String,

    /// PM2.5 cadence in milliseconds
    pub pm25_period_ms: u64,

    /// Environmental cadence in milliseconds
    pub environment_period_ms: u64,

    /// Scenario active at startup
    pub scenario: Scenario,

    /// Scripted scenario selections
    pub switches: Vec<ScenarioSwitch>,

    /// Stop after this many seconds (unlimited when absent)
    pub duration_secs: Option<f64>,

    /// Room bounding box for indicator placement in exports
    pub room: RoomBounds,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            pm25_dataset: "data/dataset1.csv".to_string(),
            environment_dataset: "data/dataset2.csv".to_string(),
            pm25_period_ms: 1000,
            environment_period_ms: 1000,
            scenario: Scenario::None,
            switches: Vec::new(),
            duration_secs: None,
            room: RoomBounds::default(),
        }
    }
}

impl TwinConfig {
    /// Parses a JSON config; omitted fields keep their defaults.
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Malformed {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }

    pub fn pm25_period(&self) -> Duration {
        Duration::from_millis(self.pm25_period_ms)
    }

    pub fn environment_period(&self) -> Duration {
        Duration::from_millis(self.environment_period_ms)
    }

    /// Run limit, `None` for an unlimited run.
    pub fn duration(&self) -> Result<Option<Duration>, ConfigError> {
        self.duration_secs
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDuration(secs)))
            .transpose()
    }

    /// Scripted switches, ordered by time.
    pub fn switch_schedule(&self) -> Result<Vec<(Duration, Scenario)>, ConfigError> {
        let mut schedule = self
            .switches
            .iter()
            .map(|s| s.at().map(|at| (at, s.scenario)))
            .collect::<Result<Vec<_>, _>>()?;
        schedule.sort_by_key(|(at, _)| *at);
        Ok(schedule)
    }

    /// Checks everything that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.duration()?;
        self.switch_schedule()?;
        Ok(())
    }
}
