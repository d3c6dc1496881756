//! Replay runner - the cooperative, timer-driven loop.
//!
//! Everything happens on one task. Each `select!` branch body is one
//! run-to-completion turn: a finished dataset load, a scenario command, a
//! scripted switch or a cadence deadline.

use crate::config::{ConfigError, TwinConfig};
use crate::loader::{load_environmental, load_pm25};

use airtwin_core::{DisplaySink, Metric, MetricUpdate, Scenario, Scheduler, TwinSession};
use airtwin_env::{DataSource, TwinContext};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const ENVIRONMENT_METRICS: [Metric; 3] = [Metric::Co2, Metric::Temperature, Metric::Humidity];

/// External input to a running replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select a scenario now
    Select(Scenario),

    /// End the run
    Stop,
}

/// Results from a replay run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Cadence firings
    pub turns: u64,

    /// Updates handed to the sink
    pub updates: u64,

    /// Of which carried no data
    pub no_data_updates: u64,

    /// Scenario selections applied
    pub scenario_changes: u64,

    /// Datasets that failed to load
    pub load_failures: u64,

    /// Clock reading when the run ended
    pub final_time_secs: f64,

    /// Scenario active at the end
    pub final_scenario: Scenario,
}

/// Counts updates on their way to the real sink.
struct Counting<'a, S: ?Sized> {
    inner: &'a mut S,
    updates: u64,
    no_data: u64,
}

impl<S: DisplaySink + ?Sized> DisplaySink for Counting<'_, S> {
    fn begin_turn(&mut self, at: Duration) {
        self.inner.begin_turn(at);
    }

    fn render(&mut self, update: &MetricUpdate) {
        self.updates += 1;
        if !update.has_data() {
            self.no_data += 1;
        }
        self.inner.render(update);
    }
}

async fn sleep_for<Ctx: TwinContext>(ctx: &Ctx, wait: Option<Duration>) {
    match wait {
        Some(duration) => ctx.sleep(duration).await,
        None => std::future::pending().await,
    }
}

async fn next_command(commands: &mut Option<mpsc::Receiver<Command>>) -> Option<Command> {
    match commands {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Drives one replay session.
pub struct TwinRunner<Ctx, Src: ?Sized> {
    ctx: Arc<Ctx>,
    source: Arc<Src>,
    session: TwinSession,
    scheduler: Scheduler,
    pm25_location: String,
    environment_location: String,
    switches: VecDeque<(Duration, Scenario)>,
    duration: Option<Duration>,
    preloaded: bool,
    preloaded_metrics: Vec<Metric>,
    preload_failures: u64,
}

impl<Ctx, Src> TwinRunner<Ctx, Src>
where
    Ctx: TwinContext,
    Src: DataSource + ?Sized,
{
    /// Creates a runner from a validated configuration.
    pub fn new(ctx: Arc<Ctx>, source: Arc<Src>, config: &TwinConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            ctx,
            source,
            session: TwinSession::new().with_scenario(config.scenario),
            scheduler: Scheduler::standard(config.pm25_period(), config.environment_period()),
            pm25_location: config.pm25_dataset.clone(),
            environment_location: config.environment_dataset.clone(),
            switches: config.switch_schedule()?.into(),
            duration: config.duration()?,
            preloaded: false,
            preloaded_metrics: Vec::new(),
            preload_failures: 0,
        })
    }

    /// Loads both datasets before the clock starts.
    ///
    /// Needed under a virtual clock, where sleeping is instant and a run
    /// would otherwise finish before real file reads complete. The loaded
    /// metrics are still cycled once when `run` starts, as after a live load.
    /// Returns the number of datasets that failed.
    pub async fn preload(&mut self) -> u64 {
        let source = Arc::clone(&self.source);
        let (pm25, environment) = tokio::join!(
            load_pm25(&*source, &self.pm25_location),
            load_environmental(&*source, &self.environment_location),
        );

        let mut failures = 0;
        match pm25 {
            Ok(rows) => {
                self.session.load(Metric::Pm25, rows);
                self.preloaded_metrics.push(Metric::Pm25);
            }
            Err(e) => {
                error!("PM2.5 dataset unavailable, showing no data: {}", e);
                failures += 1;
            }
        }
        match environment {
            Ok(streams) => {
                self.session.load_environmental(streams);
                self.preloaded_metrics.extend(ENVIRONMENT_METRICS);
            }
            Err(e) => {
                error!("Environmental dataset unavailable, showing no data: {}", e);
                failures += 1;
            }
        }

        self.preloaded = true;
        self.preload_failures = failures;
        failures
    }

    pub fn session(&self) -> &TwinSession {
        &self.session
    }

    /// Earliest moment something scheduled has to happen.
    fn next_wake(&self) -> Option<Duration> {
        [
            self.scheduler.next_deadline(),
            self.switches.front().map(|(at, _)| *at),
            self.duration,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Applies due scripted switches, then fires due cadences.
    fn fire_due<S: DisplaySink + ?Sized>(&mut self, now: Duration, sink: &mut S, summary: &mut RunSummary) {
        while let Some((at, scenario)) = self.switches.front().copied() {
            if at > now {
                break;
            }
            self.switches.pop_front();
            self.session.select_scenario(scenario, sink);
            summary.scenario_changes += 1;
        }

        for turn in self.scheduler.take_due(now) {
            debug!("t={:.3}s | {} tick", now.as_secs_f64(), turn.cadence);
            self.session.cycle_all(&turn.metrics, sink);
            summary.turns += 1;
        }
    }

    /// Runs until the duration elapses, a `Stop` arrives, or forever.
    ///
    /// Dataset loads proceed concurrently with the cadences; until a load
    /// completes its metrics render as no data. A failed load is logged and
    /// leaves those metrics empty for the rest of the run.
    pub async fn run<S>(&mut self, sink: &mut S, mut commands: Option<mpsc::Receiver<Command>>) -> RunSummary
    where
        S: DisplaySink + ?Sized,
    {
        let ctx = Arc::clone(&self.ctx);
        let source = Arc::clone(&self.source);
        let pm25_location = self.pm25_location.clone();
        let environment_location = self.environment_location.clone();

        let pm25_load = load_pm25(&*source, &pm25_location);
        let environment_load = load_environmental(&*source, &environment_location);
        tokio::pin!(pm25_load);
        tokio::pin!(environment_load);
        let mut pm25_pending = !self.preloaded;
        let mut environment_pending = !self.preloaded;

        let mut sink = Counting {
            inner: sink,
            updates: 0,
            no_data: 0,
        };
        let mut summary = RunSummary {
            load_failures: self.preload_failures,
            ..RunSummary::default()
        };

        info!(
            "Replay started: scenario={} source={}",
            self.session.scenario(),
            source.describe()
        );

        if !self.preloaded_metrics.is_empty() {
            sink.begin_turn(ctx.now());
            let loaded = std::mem::take(&mut self.preloaded_metrics);
            self.session.cycle_all(&loaded, &mut sink);
        }

        loop {
            let now = ctx.now();
            if self.duration.is_some_and(|limit| now >= limit) {
                break;
            }
            let wait = self.next_wake().map(|at| at.saturating_sub(now));

            tokio::select! {
                biased;

                result = &mut pm25_load, if pm25_pending => {
                    pm25_pending = false;
                    sink.begin_turn(ctx.now());
                    match result {
                        Ok(rows) => {
                            self.session.load(Metric::Pm25, rows);
                            self.session.cycle(Metric::Pm25, &mut sink);
                        }
                        Err(e) => {
                            error!("PM2.5 dataset unavailable, showing no data: {}", e);
                            summary.load_failures += 1;
                        }
                    }
                }

                result = &mut environment_load, if environment_pending => {
                    environment_pending = false;
                    sink.begin_turn(ctx.now());
                    match result {
                        Ok(streams) => {
                            self.session.load_environmental(streams);
                            self.session.cycle_all(&ENVIRONMENT_METRICS, &mut sink);
                        }
                        Err(e) => {
                            error!("Environmental dataset unavailable, showing no data: {}", e);
                            summary.load_failures += 1;
                        }
                    }
                }

                command = next_command(&mut commands) => {
                    match command {
                        Some(Command::Select(scenario)) => {
                            sink.begin_turn(ctx.now());
                            self.session.select_scenario(scenario, &mut sink);
                            summary.scenario_changes += 1;
                        }
                        Some(Command::Stop) => {
                            info!("Stop requested");
                            break;
                        }
                        None => commands = None,
                    }
                }

                _ = sleep_for(&*ctx, wait) => {
                    let now = ctx.now();
                    sink.begin_turn(now);
                    self.fire_due(now, &mut sink, &mut summary);
                }
            }
        }

        summary.updates = sink.updates;
        summary.no_data_updates = sink.no_data;
        summary.final_time_secs = ctx.now().as_secs_f64();
        summary.final_scenario = self.session.scenario();
        info!(
            "Replay finished after {:.1}s: {} turns, {} updates ({} without data)",
            summary.final_time_secs, summary.turns, summary.updates, summary.no_data_updates
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioSwitch;
    use crate::context::SimContext;
    use crate::exporter::FrameRecorder;
    use crate::source::MemorySource;

    const PM25: &str = "sep=;\n\"Series\";\"Time\";\"Value\"\npm25;2024-01-01T00:00:00;80\npm25;2024-01-01T00:01:00;120\n";
    const ENV: &str = "sep=;\nSeries;Time;Value\n\
        office.co2;2024-01-01T00:00:00;900\n\
        office.temperature;2024-01-01T00:00:00;22\n\
        office.humidity;2024-01-01T00:00:00;50\n\
        office.co2;2024-01-01T00:01:00;1100\n";

    fn source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new()
                .with_dataset("data/dataset1.csv", PM25)
                .with_dataset("data/dataset2.csv", ENV),
        )
    }

    fn config(duration_secs: f64) -> TwinConfig {
        TwinConfig {
            duration_secs: Some(duration_secs),
            ..TwinConfig::default()
        }
    }

    fn values(updates: &[MetricUpdate], metric: Metric) -> Vec<Option<f64>> {
        updates.iter().filter(|u| u.metric == metric).map(|u| u.value).collect()
    }

    #[tokio::test]
    async fn test_virtual_run_is_deterministic() {
        let ctx = SimContext::shared();
        let mut runner = TwinRunner::new(ctx.clone(), source(), &config(3.0)).unwrap();
        let mut updates: Vec<MetricUpdate> = Vec::new();

        let summary = runner.run(&mut updates, None).await;

        // One load-triggered cycle plus ticks at 1s, 2s and 3s.
        assert_eq!(values(&updates, Metric::Pm25), vec![Some(80.0), Some(120.0), Some(80.0), Some(120.0)]);
        assert_eq!(
            values(&updates, Metric::Co2),
            vec![Some(900.0), Some(1100.0), Some(900.0), Some(1100.0)]
        );
        assert_eq!(summary.turns, 6);
        assert_eq!(summary.updates, 16);
        assert_eq!(summary.no_data_updates, 0);
        assert_eq!(ctx.now(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_scripted_switch_readjusts_then_ticks() {
        let mut cfg = config(2.0);
        cfg.switches = vec![ScenarioSwitch { at_secs: 1.0, scenario: Scenario::AirPurifier }];
        let mut runner = TwinRunner::new(SimContext::shared(), source(), &cfg).unwrap();
        let mut updates: Vec<MetricUpdate> = Vec::new();

        let summary = runner.run(&mut updates, None).await;

        // load: 80 | switch re-renders current (120 * 0.5) | tick 1s: 60 | tick 2s: 40
        assert_eq!(
            values(&updates, Metric::Pm25),
            vec![Some(80.0), Some(60.0), Some(60.0), Some(40.0)]
        );
        assert_eq!(summary.scenario_changes, 1);
        assert_eq!(summary.final_scenario, Scenario::AirPurifier);
        assert_eq!(runner.session().cursor(Metric::Pm25).index(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_shows_no_data() {
        let partial = Arc::new(MemorySource::new().with_dataset("data/dataset1.csv", PM25));
        let mut runner = TwinRunner::new(SimContext::shared(), partial, &config(2.0)).unwrap();
        let mut updates: Vec<MetricUpdate> = Vec::new();

        let summary = runner.run(&mut updates, None).await;

        assert_eq!(summary.load_failures, 1);
        let temperature = values(&updates, Metric::Temperature);
        assert_eq!(temperature, vec![None, None]);
        assert!(updates
            .iter()
            .filter(|u| u.metric == Metric::Humidity)
            .all(|u| u.timestamp.is_none()));
        assert_eq!(summary.no_data_updates, 6);
    }

    #[tokio::test]
    async fn test_commands_select_and_stop() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Command::Select(Scenario::OpenWindow)).await.unwrap();
        tx.send(Command::Stop).await.unwrap();

        let mut runner = TwinRunner::new(SimContext::shared(), source(), &TwinConfig::default()).unwrap();
        let mut updates: Vec<MetricUpdate> = Vec::new();

        let summary = runner.run(&mut updates, Some(rx)).await;

        assert_eq!(summary.final_scenario, Scenario::OpenWindow);
        assert_eq!(summary.scenario_changes, 1);
        assert_eq!(summary.turns, 0);
        // Loads (4 updates) then the re-render of all 4 metrics.
        assert_eq!(updates.len(), 8);
        let co2 = updates.iter().rev().find(|u| u.metric == Metric::Co2).unwrap();
        assert!((co2.value.unwrap() - 660.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_preload_matches_load_path() {
        let mut loading = TwinRunner::new(SimContext::shared(), source(), &config(2.0)).unwrap();
        let mut loaded_live: Vec<MetricUpdate> = Vec::new();
        loading.run(&mut loaded_live, None).await;

        let mut runner = TwinRunner::new(SimContext::shared(), source(), &config(2.0)).unwrap();
        assert_eq!(runner.preload().await, 0);
        assert_eq!(runner.session().cursor(Metric::Co2).len(), 2);

        let mut updates: Vec<MetricUpdate> = Vec::new();
        let summary = runner.run(&mut updates, None).await;

        // First reading at t=0, then ticks at 1s and 2s.
        assert_eq!(values(&updates, Metric::Pm25), vec![Some(80.0), Some(120.0), Some(80.0)]);
        assert_eq!(updates, loaded_live);
        assert_eq!(summary.updates, 12);
        assert_eq!(summary.turns, 4);
    }

    #[tokio::test]
    async fn test_preload_frames_start_at_zero() {
        let ctx = SimContext::shared();
        let mut runner = TwinRunner::new(ctx.clone(), source(), &config(1.0)).unwrap();
        runner.preload().await;

        let mut recorder = FrameRecorder::new(ctx, Scenario::None, Default::default());
        runner.run(&mut recorder, None).await;

        let frames = &recorder.export().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].time_sec, 0.0);
        assert_eq!(frames[0].indicators.len(), 4);
        assert_eq!(frames[1].time_sec, 1.0);
    }

    #[tokio::test]
    async fn test_preload_failure_counted() {
        let mut runner =
            TwinRunner::new(SimContext::shared(), Arc::new(MemorySource::new()), &config(1.0)).unwrap();
        assert_eq!(runner.preload().await, 2);

        let mut updates: Vec<MetricUpdate> = Vec::new();
        let summary = runner.run(&mut updates, None).await;
        assert_eq!(summary.load_failures, 2);
        assert_eq!(summary.no_data_updates, 4);
    }

    #[tokio::test]
    async fn test_closed_command_channel_is_ignored() {
        let (tx, rx) = mpsc::channel::<Command>(1);
        drop(tx);

        let mut runner = TwinRunner::new(SimContext::shared(), source(), &config(1.0)).unwrap();
        let mut updates: Vec<MetricUpdate> = Vec::new();
        let summary = runner.run(&mut updates, Some(rx)).await;

        assert_eq!(summary.turns, 2);
    }
}
