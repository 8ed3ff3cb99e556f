//! Intervals
//!
//! Runs a sequence of countdown timers in the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intervals_core::storage::{ConfigStorage, SnapshotStorage, init_config_dir, init_data_dir};
use intervals_core::{Config, SharedStore, Store, TimerSpec, utils};
use intervals_runner::{TimerEvent, TimerEventType, TimerRunner};
use std::path::PathBuf;
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(name = "intervals")]
#[command(about = "Interval timer - run countdowns back to back", long_about = None)]
struct Args {
    /// Log level (overrides the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Directory holding config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run timers in order, e.g. `run -t Squat=45sx3 -t Rest=15s`
    Run {
        /// Timer as [NAME=]DURATION[xREPEAT]
        #[arg(short, long = "timer", required = true)]
        timers: Vec<TimerSpec>,

        /// Stop after the first timer instead of moving down the list
        #[arg(long)]
        no_advance: bool,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,

        /// Save the final store snapshot, into DIR if given, else the data directory
        #[arg(long, value_name = "DIR", num_args = 0..=1)]
        save: Option<Option<PathBuf>>,
    },
    /// List the popular preset durations
    Presets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = match args.config {
        Some(ref dir) => dir.clone(),
        None => init_config_dir()?,
    };
    let config = ConfigStorage::new(config_dir)
        .load()
        .context("Failed to load config")?;

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.runner.log_level.clone());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_level)
        .init();

    match args.command {
        Command::Run {
            timers,
            no_advance,
            json,
            save,
        } => run(config, timers, no_advance, json, save).await,
        Command::Presets => {
            for seconds in &config.popular {
                println!("{:>6}s  {}", seconds, utils::format_preset_value(*seconds).trim());
            }
            Ok(())
        }
    }
}

async fn run(
    config: Config,
    specs: Vec<TimerSpec>,
    no_advance: bool,
    json: bool,
    save: Option<Option<PathBuf>>,
) -> Result<()> {
    let mut store = Store::from_config(&config);
    let ids = specs
        .iter()
        .map(|spec| store.create_timer(spec))
        .collect::<intervals_core::Result<Vec<u32>>>()?;
    let first = *ids.first().context("No timers given")?;

    let mut runner_config = config.runner.clone();
    if no_advance {
        runner_config.auto_advance = false;
    }

    let store = store.into_shared();
    let runner = TimerRunner::new(store.clone(), runner_config);
    tracing::info!("Running {} timer(s)", ids.len());

    let printer = tokio::spawn(print_events(runner.subscribe(), store.clone(), json));

    let interrupted = tokio::select! {
        result = runner.run(first) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    // The dropped loop leaves its timer active
    if interrupted {
        tracing::info!("Interrupted");
        runner.stop().await?;
    }

    // Closes the event channel so the printer stops even without a final event
    drop(runner);
    if let Err(e) = printer.await {
        tracing::warn!("Event printer failed: {}", e);
    }

    if let Some(dir) = save {
        let dir = match dir {
            Some(dir) => dir,
            None => init_data_dir()?,
        };
        let store = store.read().await;
        SnapshotStorage::new(dir.clone()).save(&store)?;
        tracing::info!("Saved snapshot to {}", dir.display());
    }

    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<TimerEvent>, store: SharedStore, json: bool) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Skipped {} timer events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to encode event: {}", e),
            }
        } else {
            let label = {
                let store = store.read().await;
                store
                    .timer(event.timer_id)
                    .map(|timer| timer.label())
                    .unwrap_or_default()
            };
            if let Some(line) = describe(&label, &event.event_type) {
                println!("{}", line);
            }
        }

        if event.is_terminal() {
            break;
        }
    }
}

fn describe(label: &str, event: &TimerEventType) -> Option<String> {
    let line = match event {
        TimerEventType::Started { seconds, round } => {
            format!("> {} {} (round {})", label, utils::format_clock(*seconds), round)
        }
        TimerEventType::Tick {
            remaining_seconds, ..
        } => format!("  {} {}", label, utils::format_clock(*remaining_seconds)),
        TimerEventType::RoundCompleted { round, of } => {
            format!("  {} round {}/{} done", label, round, of)
        }
        TimerEventType::Completed => format!("* {} done", label),
        TimerEventType::SequenceFinished => "All timers finished".to_string(),
        TimerEventType::Stopped => format!("  {} stopped", label),
        TimerEventType::Paused { .. } | TimerEventType::Resumed | TimerEventType::Advanced { .. } => {
            return None;
        }
    };
    Some(line)
}
