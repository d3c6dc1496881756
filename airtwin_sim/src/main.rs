//! AirTwin replay CLI
//!
//! Replays indoor air-quality datasets and shows them under a mitigation
//! scenario. Scenarios can be switched while running by typing an id
//! (`none`, `air-purifier`, `plants`, `open-window`, `humidifier`) on stdin.

use airtwin_core::{DisplaySink, Scenario, Tee};
use airtwin_env::{FsSource, TokioContext, TwinContext};
use airtwin_sim::{
    Command, FrameRecorder, LogSink, RunSummary, ScenarioSwitch, SimContext, TwinConfig, TwinRunner,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// AirTwin indoor air-quality replay
#[derive(Parser, Debug)]
#[command(name = "airtwin")]
#[command(about = "Replay indoor air-quality datasets under a mitigation scenario", long_about = None)]
struct Args {
    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory dataset locations are relative to
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// PM2.5 dataset
    #[arg(long)]
    pm25: Option<String>,

    /// CO2 / temperature / humidity dataset
    #[arg(long)]
    environment: Option<String>,

    /// Initial scenario (none, air-purifier, plants, open-window, humidifier)
    #[arg(short = 'S', long)]
    scenario: Option<String>,

    /// Scripted switch as <seconds>:<scenario>, repeatable
    #[arg(long = "switch")]
    switches: Vec<String>,

    /// Stop after this many seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Run on a virtual clock (needs a duration)
    #[arg(long)]
    virtual_time: bool,

    /// Export indicator frames to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// JSON summary on stdout instead of log lines
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Terminal dashboard (0-4 switch scenario, q quits)
    #[cfg(feature = "dashboard")]
    #[arg(long)]
    dashboard: bool,
}

impl Args {
    fn dashboard(&self) -> bool {
        #[cfg(feature = "dashboard")]
        {
            self.dashboard
        }
        #[cfg(not(feature = "dashboard"))]
        {
            false
        }
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.dashboard() {
        "off"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Defaults, then the config file, then flags.
fn resolve_config(args: &Args) -> Result<TwinConfig> {
    let mut config = match &args.config {
        Some(path) => TwinConfig::load(path)?,
        None => TwinConfig::default(),
    };

    if let Some(root) = &args.data_root {
        config.data_root = root.clone();
    }
    if let Some(pm25) = &args.pm25 {
        config.pm25_dataset = pm25.clone();
    }
    if let Some(environment) = &args.environment {
        config.environment_dataset = environment.clone();
    }
    if let Some(scenario) = &args.scenario {
        config.scenario = scenario.parse()?;
    }
    for spec in &args.switches {
        config.switches.push(ScenarioSwitch::parse(spec)?);
    }
    if let Some(duration) = args.duration {
        config.duration_secs = Some(duration);
    }

    config.validate()?;
    if args.virtual_time && config.duration_secs.is_none() {
        bail!("--virtual-time needs --duration (or duration_secs in the config)");
    }
    Ok(config)
}

/// Reads scenario ids from stdin on a dedicated thread.
fn spawn_stdin_commands(tx: mpsc::Sender<Command>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "" => continue,
                "q" | "quit" | "exit" => Command::Stop,
                id => match id.parse::<Scenario>() {
                    Ok(scenario) => Command::Select(scenario),
                    Err(e) => {
                        error!("{}", e);
                        continue;
                    }
                },
            };
            if tx.blocking_send(command).is_err() || command == Command::Stop {
                break;
            }
        }
    });
}

async fn execute<Ctx: TwinContext>(
    ctx: Arc<Ctx>,
    config: &TwinConfig,
    args: &Args,
    commands: Option<mpsc::Receiver<Command>>,
    extra: Option<Box<dyn DisplaySink>>,
) -> Result<RunSummary> {
    let source = Arc::new(FsSource::new(config.data_root.clone()));
    let mut runner = TwinRunner::new(Arc::clone(&ctx), source, config)?;
    if args.virtual_time {
        runner.preload().await;
    }

    let mut recorder = args
        .export
        .as_ref()
        .map(|_| FrameRecorder::new(Arc::clone(&ctx), config.scenario, config.room));
    let mut log_sink = (!args.json && !args.dashboard()).then(LogSink::new);
    let mut extra = extra;

    let summary = {
        let mut sink = Tee(Tee(&mut log_sink, &mut recorder), &mut extra);
        runner.run(&mut sink, commands).await
    };

    if let (Some(path), Some(recorder)) = (&args.export, recorder) {
        let export = recorder.finish(summary.clone());
        export
            .write_to_file(path)
            .with_context(|| format!("writing export to {path}"))?;
        info!("Exported {} frames to {}", export.frames.len(), path);
    }

    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = resolve_config(&args)?;

    if !args.json {
        info!("AirTwin replay v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let summary = if args.virtual_time {
        execute(SimContext::shared(), &config, &args, None, None).await?
    } else {
        let ctx = TokioContext::shared();
        let (tx, rx) = mpsc::channel(16);
        #[allow(unused_mut)]
        let mut extra: Option<Box<dyn DisplaySink>> = None;

        #[cfg(feature = "dashboard")]
        if args.dashboard {
            let (sink, mut dashboard) = airtwin_core::dashboard::channel();
            extra = Some(Box::new(sink));
            let tx = tx.clone();
            std::thread::spawn(move || {
                let select_tx = tx.clone();
                if let Err(e) = dashboard.run(|scenario| {
                    let _ = select_tx.blocking_send(Command::Select(scenario));
                }) {
                    error!("Dashboard failed: {}", e);
                }
                let _ = tx.blocking_send(Command::Stop);
            });
        }
        if !args.dashboard() {
            spawn_stdin_commands(tx.clone());
        }

        let stop_tx = tx;
        ctx.spawn("ctrl-c", async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = stop_tx.send(Command::Stop).await;
            }
        });

        execute(ctx, &config, &args, Some(rx), extra).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    if summary.load_failures > 0 {
        error!("{} dataset(s) failed to load; affected metrics showed no data", summary.load_failures);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn resolve(argv: &[&str]) -> Result<TwinConfig> {
        let args = Args::try_parse_from(std::iter::once("airtwin").chain(argv.iter().copied())).unwrap();
        resolve_config(&args)
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = config_file(
            r#"{"pm25_dataset": "rooms/a.csv", "scenario": "plants", "duration_secs": 30,
                "switches": [{"at_secs": 5.0, "scenario": "humidifier"}]}"#,
        );
        let path = file.path().to_str().unwrap();

        let config = resolve(&["--config", path, "-S", "open-window", "--switch", "10:none"]).unwrap();

        assert_eq!(config.pm25_dataset, "rooms/a.csv");
        assert_eq!(config.scenario, Scenario::OpenWindow);
        assert_eq!(config.duration_secs, Some(30.0));
        assert_eq!(config.switches.len(), 2);
        assert_eq!(config.switches[1].scenario, Scenario::None);

        let config = resolve(&["--config", path, "--duration", "4"]).unwrap();
        assert_eq!(config.scenario, Scenario::Plants);
        assert_eq!(config.duration_secs, Some(4.0));
    }

    #[test]
    fn test_virtual_time_needs_duration() {
        assert!(resolve(&["--virtual-time"]).is_err());
        assert!(resolve(&["--virtual-time", "--duration", "2"]).is_ok());

        let file = config_file(r#"{"duration_secs": 10}"#);
        assert!(resolve(&["--virtual-time", "--config", file.path().to_str().unwrap()]).is_ok());
    }

    #[test]
    fn test_invalid_flags_are_fatal() {
        assert!(resolve(&["-S", "fan"]).is_err());
        assert!(resolve(&["--switch", "soon:plants"]).is_err());
        assert!(resolve(&["--duration=-1"]).is_err());
    }
}
