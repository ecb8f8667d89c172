use anyhow::Context;
use clap::Parser;
use generator::scatter::SyntheticConfig;
use gui_bridge::bridge::GuiBridge;
use heatcore::processing::{LoadOutcome, TimeWindow};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::FeederConfig;
use workflow::runner::{FeedSource, Runner};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Crime record loader and heatmap point bridge")]
struct Args {
    /// Load feeder settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Read records from a JSON fixture instead of the store
    #[arg(long)]
    records: Option<PathBuf>,
    /// Generate this many synthetic records instead of querying the store
    #[arg(long)]
    synthetic: Option<usize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    project_id: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    collection: Option<String>,
    /// Document field the time window filters on
    #[arg(long)]
    timestamp_field: Option<String>,
    /// Time window in hours; 0 loads everything
    #[arg(long, default_value_t = 24)]
    hours: u32,
    /// Run a single load and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Append the offline summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the HTTP bridge alive for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    port: Option<u16>,
}

fn build_config(args: &Args) -> anyhow::Result<FeederConfig> {
    let mut config = if let Some(path) = &args.config {
        FeederConfig::load(path)?
    } else {
        FeederConfig::from_args(args.project_id.clone(), args.collection.clone())
    };

    if let Some(project_id) = &args.project_id {
        config.store.project_id = project_id.clone();
    }
    if let Some(collection) = &args.collection {
        config.store.collection = collection.clone();
    }
    if args.api_key.is_some() {
        config.store.api_key = args.api_key.clone();
    }
    if args.timestamp_field.is_some() {
        config.store.timestamp_field = args.timestamp_field.clone();
    }
    if args.records.is_some() {
        config.records = args.records.clone();
    }
    if let Some(count) = args.synthetic {
        config.synthetic = Some(SyntheticConfig {
            count,
            seed: args.seed,
            ..config.synthetic.clone().unwrap_or_default()
        });
    }
    if let Some(port) = args.port {
        config.bridge.port = port;
    }
    Ok(config)
}

fn summarize(window: TimeWindow, outcome: &LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded { points, rejected } => format!(
            "window={} points={} weighted={} rejected={}\n",
            window.hours(),
            points.len(),
            points.weighted_count(),
            rejected
        ),
        LoadOutcome::Empty => format!("window={} empty\n", window.hours()),
        LoadOutcome::Failed { reason } => {
            format!("window={} failed reason={:?}\n", window.hours(), reason)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = build_config(&args)?;
    let window = TimeWindow::from_hours(args.hours);
    let runner = Arc::new(Runner::new(FeedSource::from_config(&config)?));
    log::info!("feeding from {}", runner.describe());

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime")?;

    let bridge = args
        .serve
        .then(|| GuiBridge::spawn(runner.clone(), &config.bridge));

    if args.offline {
        let outcome = runtime.block_on(runner.execute(window));
        println!("Offline run -> {}", outcome.status_message(window));

        if let Some(report_path) = &args.report {
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(report_path)
                .with_context(|| format!("opening report {}", report_path.display()))?;
            file.write_all(summarize(window, &outcome).as_bytes())?;
        }

        if let Some(bridge) = &bridge {
            bridge.publish(window, outcome);
        }
    }

    if let Some(bridge) = &bridge {
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatcore::interface::{GeoPoint, HeatPoint, PointList};

    #[test]
    fn cli_overrides_apply_on_top_of_defaults() {
        let args = Args::parse_from([
            "feeder",
            "--project-id",
            "heatmap-demo",
            "--timestamp-field",
            "timestamp",
            "--synthetic",
            "25",
            "--seed",
            "9",
            "--port",
            "9100",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.store.project_id, "heatmap-demo");
        assert_eq!(config.store.timestamp_field.as_deref(), Some("timestamp"));
        assert_eq!(config.bridge.port, 9100);
        let synthetic = config.synthetic.unwrap();
        assert_eq!((synthetic.count, synthetic.seed), (25, 9));
        assert_eq!(args.hours, 24);
    }

    #[test]
    fn summary_lines_describe_outcome() {
        let points: PointList = vec![HeatPoint::Plain {
            location: GeoPoint::new(1.0, 2.0).unwrap(),
        }]
        .into();
        let window = TimeWindow::from_hours(6);
        assert_eq!(
            summarize(window, &LoadOutcome::Loaded { points, rejected: 2 }),
            "window=6 points=1 weighted=0 rejected=2\n"
        );
        assert_eq!(summarize(window, &LoadOutcome::Empty), "window=6 empty\n");
    }
}
