//! AirTwin Replay Harness
//!
//! Runs the indoor air-quality twin against real or simulated surroundings:
//!
//! - **Time**: `TokioContext` for live replays, `SimContext` for a virtual
//!   clock that makes hour-long replays finish instantly and deterministically
//! - **Data**: `FsSource` for dataset files, `MemorySource` for fixed strings
//! - **Output**: log lines, JSON frames for an external scene renderer, or
//!   the terminal dashboard (feature `dashboard`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       TwinRunner                         │
//! │  ┌────────────┐  ┌────────────┐  ┌──────────────────┐    │
//! │  │ dataset    │  │ Scheduler  │  │ commands /       │    │
//! │  │ loads      │  │ (cadences) │  │ scripted switches│    │
//! │  └─────┬──────┘  └─────┬──────┘  └────────┬─────────┘    │
//! │        └───────────────┼──────────────────┘              │
//! │                  ┌─────▼──────┐                          │
//! │                  │ TwinSession│──► DisplaySink           │
//! │                  └────────────┘                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use airtwin_sim::{SimContext, MemorySource, TwinConfig, TwinRunner};
//!
//! let config = TwinConfig { duration_secs: Some(60.0), ..Default::default() };
//! let mut runner = TwinRunner::new(SimContext::shared(), Arc::new(source), &config)?;
//! let mut updates = Vec::new();
//! let summary = runner.run(&mut updates, None).await;
//! ```

mod context;
mod source;
mod loader;
mod sinks;
mod exporter;
pub mod config;
pub mod runner;

pub use context::SimContext;
pub use source::MemorySource;
pub use loader::{load_environmental, load_pm25, LoadError};
pub use sinks::LogSink;
pub use exporter::{FrameRecorder, IndicatorFrame, TwinExport, TwinFrame};
pub use config::{ConfigError, ScenarioSwitch, TwinConfig};
pub use runner::{Command, RunSummary, TwinRunner};
