//! JSON exporter for external scene renderers.
//!
//! Collects indicator state as frames: the updates of one turn (or of
//! consecutive turns at the same instant) under one scenario form a frame.
//! A turn's time is the clock reading stamped by `begin_turn`, so a live
//! clock moving between renders does not split the frame.

use airtwin_core::{
    format_timestamp, DisplaySink, IndicatorLayout, Metric, MetricUpdate, RoomBounds, Scenario,
};
use airtwin_env::TwinContext;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use uuid::Uuid;

use crate::runner::RunSummary;

/// One indicator's state.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorFrame {
    pub metric: Metric,
    pub value: Option<f64>,
    pub timestamp: Option<String>,

    /// Timestamp as displayed
    pub display_time: String,
    pub status: &'static str,

    /// Indicator color, `#rrggbb`
    pub color: String,

    /// Indicator anchor in room coordinates
    pub position: [f64; 3],

    /// Whether the particle cloud takes this color too
    pub tints_particles: bool,
}

/// A single frame of replay data.
#[derive(Debug, Clone, Serialize)]
pub struct TwinFrame {
    /// Clock reading in seconds
    pub time_sec: f64,

    pub scenario: Scenario,

    pub indicators: Vec<IndicatorFrame>,
}

/// Complete replay export.
#[derive(Debug, Clone, Serialize)]
pub struct TwinExport {
    pub run_id: Uuid,

    /// Wall-clock start, seconds since the Unix epoch
    pub started_at: u64,

    /// Scenario at startup
    pub scenario: Scenario,

    pub room: RoomBounds,

    /// Time of the last frame
    pub duration_sec: f64,

    pub frames: Vec<TwinFrame>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl TwinExport {
    /// Creates a new export container.
    pub fn new(scenario: Scenario, room: RoomBounds, started_at: u64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            scenario,
            room,
            duration_sec: 0.0,
            frames: Vec::new(),
            summary: None,
        }
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Display sink that turns updates into export frames.
pub struct FrameRecorder<Ctx> {
    ctx: Arc<Ctx>,
    layout: IndicatorLayout,
    export: TwinExport,
    turn_at: Option<Duration>,
}

impl<Ctx: TwinContext> FrameRecorder<Ctx> {
    pub fn new(ctx: Arc<Ctx>, scenario: Scenario, room: RoomBounds) -> Self {
        let started_at = ctx
            .system_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            ctx,
            layout: IndicatorLayout::from_bounds(&room),
            export: TwinExport::new(scenario, room, started_at),
            turn_at: None,
        }
    }

    pub fn export(&self) -> &TwinExport {
        &self.export
    }

    /// Attaches the run summary and hands back the export.
    pub fn finish(mut self, summary: RunSummary) -> TwinExport {
        self.export.summary = Some(summary);
        self.export
    }

    fn indicator(&self, update: &MetricUpdate) -> IndicatorFrame {
        let class = update.classification();
        let anchor = self.layout.anchor(update.metric);
        IndicatorFrame {
            metric: update.metric,
            value: update.value,
            timestamp: update.timestamp.clone(),
            display_time: format_timestamp(update.timestamp.as_deref()),
            status: class.label,
            color: class.color.to_hex(),
            position: [anchor.x, anchor.y, anchor.z],
            tints_particles: IndicatorLayout::tints_particles(update.metric),
        }
    }
}

impl<Ctx: TwinContext> DisplaySink for FrameRecorder<Ctx> {
    fn begin_turn(&mut self, at: Duration) {
        self.turn_at = Some(at);
    }

    fn render(&mut self, update: &MetricUpdate) {
        // Unstamped updates fall back to the clock.
        let time_sec = self.turn_at.unwrap_or_else(|| self.ctx.now()).as_secs_f64();
        let indicator = self.indicator(update);

        match self.export.frames.last_mut() {
            Some(frame) if frame.time_sec == time_sec && frame.scenario == update.scenario => {
                frame.indicators.retain(|i| i.metric != update.metric);
                frame.indicators.push(indicator);
            }
            _ => self.export.frames.push(TwinFrame {
                time_sec,
                scenario: update.scenario,
                indicators: vec![indicator],
            }),
        }
        self.export.duration_sec = time_sec;
    }
}
