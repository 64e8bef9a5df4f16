use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File as ConfigFile};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tower_poh::{DelayState, PohService, Sequencer, SequencerConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod version;

use version::{git_commit_hash, POH_NODE_VERSION};

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "poh-node")]
#[command(about = "Tower PoH sequencer node")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sequencer until interrupted
    Run {
        /// Seed string, 64-char hex state, or "random"
        #[arg(long)]
        seed: Option<String>,

        /// Generate hashes as fast as possible
        #[arg(long, conflicts_with = "slot_duration_ms")]
        uncapped: bool,

        /// Target duration of one slot in milliseconds
        #[arg(long)]
        slot_duration_ms: Option<u64>,
    },
    /// Measure raw delay-function throughput
    Bench {
        /// Total benchmark duration in seconds
        #[arg(long, default_value = "60")]
        duration_secs: u64,

        /// Interval between progress reports in milliseconds
        #[arg(long, default_value = "400")]
        report_interval_ms: u64,

        /// Hashes per batch between clock checks
        #[arg(long, default_value = "10000")]
        batch: u64,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct NodeConfig {
    seed: String,
    log_level: String,
    log_format: String,
    metrics_enabled: bool,
    metrics_addr: String,
    sequencer: SequencerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            seed: "genesis".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_addr: "127.0.0.1:9898".to_string(),
            sequencer: SequencerConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load from an optional TOML file, then `POH_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `POH_SEQUENCER__CAPACITY`.
    fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("POH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: NodeConfig = builder
            .build()?
            .try_deserialize()
            .context("invalid node configuration")?;
        config.sequencer.validate()?;
        Ok(config)
    }
}

/// Interpret a seed argument: `random`, a 64-char hex state, or any string.
fn parse_seed(seed: &str) -> DelayState {
    if seed == "random" {
        return DelayState::random();
    }
    DelayState::from_hex(seed).unwrap_or_else(|_| DelayState::from_seed(seed))
}

fn init_logging(config: &NodeConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?;
    }

    Ok(())
}

fn init_metrics(config: &NodeConfig) {
    if !config.metrics_enabled {
        return;
    }

    let addr: SocketAddr = match config.metrics_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            warn!("Invalid metrics address {}: {}", config.metrics_addr, err);
            return;
        }
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            info!("Prometheus metrics exporter listening on {addr}");
            tower_poh::telemetry::describe();
        }
        Err(err) => warn!("Failed to install Prometheus metrics exporter: {}", err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = NodeConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logging(&config)?;

    info!(
        "poh-node {} (commit {})",
        POH_NODE_VERSION,
        git_commit_hash()
    );

    match cli.command {
        Commands::Run {
            seed,
            uncapped,
            slot_duration_ms,
        } => {
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if uncapped {
                config.sequencer.target_slot_duration_ms = 0;
            }
            if let Some(ms) = slot_duration_ms {
                config.sequencer.target_slot_duration_ms = ms;
            }
            init_metrics(&config);
            run_node(config).await
        }
        Commands::Bench {
            duration_secs,
            report_interval_ms,
            batch,
        } => {
            let options = BenchOptions {
                duration: Duration::from_secs(duration_secs),
                report_interval: Duration::from_millis(report_interval_ms),
                batch,
            };
            let report = tokio::task::spawn_blocking(move || run_benchmark(options)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn run_node(config: NodeConfig) -> Result<()> {
    let seed = parse_seed(&config.seed);
    let sequencer = Sequencer::new(seed, config.sequencer.clone())?;
    info!(
        seed = %seed,
        capacity = config.sequencer.capacity,
        hashes_per_slot = config.sequencer.hashes_per_slot,
        max_slots = config.sequencer.max_slots,
        "Initialized PoH sequencer"
    );

    let service = PohService::new(sequencer);
    service.start()?;

    let mut ticker = interval(STATUS_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                let status = service.status();
                info!(
                    sequence = status.sequence,
                    slot = status.slot,
                    lockout_depth = status.lockouts.len(),
                    "PoH status"
                );
            }
        }
    }

    service.shutdown().await?;
    let status = service.status();
    info!("Final PoH status: {}", serde_json::to_string(&status)?);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct BenchOptions {
    duration: Duration,
    report_interval: Duration,
    batch: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
struct BenchReport {
    hashes: u64,
    duration_secs: f64,
    hashes_per_second: f64,
    initial_state: String,
    final_state: String,
}

fn run_benchmark(options: BenchOptions) -> BenchReport {
    let mut state = DelayState::random();
    let initial_state = state.to_hex();
    info!("Starting continuous PoH generation and benchmarking...");
    info!("Initial state: {initial_state}");

    let batch = options.batch.max(1);
    let start = Instant::now();
    let mut last_report = start;
    let mut hashes_since_report = 0u64;
    let mut total = 0u64;

    while start.elapsed() < options.duration {
        state.advance_batch(batch);
        total += batch;
        hashes_since_report += batch;

        let since = last_report.elapsed();
        if since >= options.report_interval {
            info!(
                "Hashes: {}, Duration: {:.2}s, Rate: {:.2} hashes/second",
                hashes_since_report,
                since.as_secs_f64(),
                hashes_since_report as f64 / since.as_secs_f64()
            );
            hashes_since_report = 0;
            last_report = Instant::now();
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 {
        total as f64 / elapsed
    } else {
        0.0
    };
    info!(
        "Hashes: {}, Duration: {:.2}s, Rate: {:.2} hashes/second",
        total, elapsed, rate
    );
    info!("Final state: {state}");

    BenchReport {
        hashes: total,
        duration_secs: elapsed,
        hashes_per_second: rate,
        initial_state,
        final_state: state.to_hex(),
    }
}
