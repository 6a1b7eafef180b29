//! Block Motion CLI
//!
//! Runs the estimation, prediction and residual pipeline over consecutive
//! frames of a synthetic panning source and reports what it found.
//!
//! # Usage
//!
//! ```bash
//! # Four frame pairs with default settings
//! block-motion
//!
//! # Settings from a file, with overrides
//! block-motion --config motion.toml --block-size 8 --strategy diamond --report
//!
//! # Dump Prometheus metrics after the run
//! block-motion --pairs 10 --print-metrics
//! ```

use block_motion::{
    capture::{FileConfig, FrameSource, SyntheticSource},
    estimation::{CostMetric, SearchStrategy},
    metrics::{MetricsError, MetricsRegistry},
    pipeline::{Pipeline, PipelineConfig, PipelineReport},
    prediction::BoundaryPolicy,
    MotionError,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Exhaustive search over the whole window
    Full,
    /// Large/small diamond pattern search
    Diamond,
}

impl From<StrategyArg> for SearchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Full => SearchStrategy::Full,
            StrategyArg::Diamond => SearchStrategy::Diamond,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    /// Sum of absolute differences
    Sad,
    /// Sum of squared differences
    Ssd,
}

impl From<MetricArg> for CostMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Sad => CostMetric::Sad,
            MetricArg::Ssd => CostMetric::Ssd,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Only copy source blocks that lie fully inside the reference
    RejectAtEdge,
    /// Clamp source blocks into the reference and pad with zeros
    ClampAndPad,
}

impl From<PolicyArg> for BoundaryPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::RejectAtEdge => BoundaryPolicy::RejectAtEdge,
            PolicyArg::ClampAndPad => BoundaryPolicy::ClampAndPad,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "block-motion", version)]
#[command(about = "Block-matching motion estimation and compensation", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Block edge length in pixels
    #[arg(short, long)]
    block_size: Option<u32>,

    /// Maximum displacement searched in each direction
    #[arg(short = 'r', long, allow_negative_numbers = true)]
    search_range: Option<i32>,

    /// Search strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Block cost metric
    #[arg(long, value_enum)]
    metric: Option<MetricArg>,

    /// Boundary policy for prediction
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Number of consecutive frame pairs to process
    #[arg(short, long)]
    pairs: Option<u32>,

    /// Seed for the synthetic texture
    #[arg(long)]
    seed: Option<u64>,

    /// Horizontal pan per frame
    #[arg(long, allow_negative_numbers = true)]
    pan_x: Option<i32>,

    /// Vertical pan per frame
    #[arg(long, allow_negative_numbers = true)]
    pan_y: Option<i32>,

    /// Worker threads for estimation (0 = rayon default)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Print a TOML report for every pair
    #[arg(long)]
    report: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    print_metrics: bool,

    /// Serve metrics over HTTP on this port and keep serving until Ctrl-C
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Args {
    fn apply(&self, config: &mut FileConfig) {
        if let Some(width) = self.width {
            config.source.width = width;
        }
        if let Some(height) = self.height {
            config.source.height = height;
        }
        if let Some(seed) = self.seed {
            config.source.seed = seed;
        }
        if let Some(pan_x) = self.pan_x {
            config.source.pan_x = pan_x;
        }
        if let Some(pan_y) = self.pan_y {
            config.source.pan_y = pan_y;
        }
        if let Some(block_size) = self.block_size {
            config.search.block_size = block_size;
        }
        if let Some(search_range) = self.search_range {
            config.search.search_range = search_range;
        }
        if let Some(strategy) = self.strategy {
            config.search.strategy = strategy.into();
        }
        if let Some(metric) = self.metric {
            config.search.metric = metric.into();
        }
        if let Some(threads) = self.threads {
            config.search.threads = threads;
        }
        if let Some(policy) = self.policy {
            config.prediction.policy = policy.into();
        }
        if let Some(pairs) = self.pairs {
            config.output.pairs = pairs;
        }
        if self.report {
            config.output.report = true;
        }
        #[cfg(feature = "metrics")]
        if let Some(port) = self.metrics_port {
            config.output.metrics_port = port;
        }
    }
}

/// Where finished runs are recorded.
///
/// With the `metrics` feature the registry lives in the server state so
/// the HTTP endpoints see every run.
struct Recorder {
    #[cfg(feature = "metrics")]
    state: Arc<tokio::sync::RwLock<block_motion::metrics::MetricsState>>,
    #[cfg(not(feature = "metrics"))]
    registry: MetricsRegistry,
}

impl Recorder {
    fn record(&self, report: &PipelineReport) {
        #[cfg(feature = "metrics")]
        self.state.blocking_write().record(report);
        #[cfg(not(feature = "metrics"))]
        self.registry.record_report(report);
    }

    fn encode(&self) -> Result<String, MetricsError> {
        #[cfg(feature = "metrics")]
        return self.state.blocking_read().registry().encode();
        #[cfg(not(feature = "metrics"))]
        return self.registry.encode();
    }
}

#[cfg(feature = "metrics")]
fn start_recorder(registry: MetricsRegistry, port: u16) -> Recorder {
    use block_motion::metrics::{MetricsServer, MetricsServerConfig};

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();

    if port > 0 {
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to start metrics runtime: {}", e);
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                tracing::error!("Metrics server stopped: {}", e);
            }
        });
    }

    Recorder { state }
}

#[cfg(not(feature = "metrics"))]
fn start_recorder(registry: MetricsRegistry, _port: u16) -> Recorder {
    Recorder { registry }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Block Motion v{}", block_motion::VERSION);

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: Failed to load config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        eprintln!("Error: Invalid configuration: {}", e);
        process::exit(1);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    let registry = match MetricsRegistry::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: Failed to create metrics registry: {}", e);
            process::exit(1);
        }
    };
    let recorder = start_recorder(registry, config.output.metrics_port);

    let mut source = match SyntheticSource::with_config(&config.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Failed to open frame source: {}", e);
            process::exit(1);
        }
    };

    let pipeline = Pipeline::new(PipelineConfig {
        search: config.search.clone(),
        policy: config.prediction.policy,
    })
    .with_cancel_flag(Arc::clone(&cancel));

    info!(
        width = config.source.width,
        height = config.source.height,
        block_size = config.search.block_size,
        search_range = config.search.search_range,
        strategy = %config.search.strategy,
        policy = %config.prediction.policy,
        pairs = config.output.pairs,
        "Processing frame pairs"
    );

    let mut reference = match source.next_frame() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: Frame capture failed: {}", e);
            process::exit(1);
        }
    };

    let mut processed = 0u32;
    let mut inexact = 0u32;

    for _ in 0..config.output.pairs {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let target = match source.next_frame() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: Frame capture failed: {}", e);
                process::exit(1);
            }
        };

        let output = match pipeline.run(&reference, &target) {
            Ok(o) => o,
            Err(MotionError::Cancelled { completed, total }) => {
                warn!(completed, total, "Estimation interrupted");
                break;
            }
            Err(e) => {
                eprintln!("Error: Pipeline failed: {}", e);
                process::exit(1);
            }
        };

        if !output.report.reconstruction_exact {
            inexact += 1;
        }
        if config.output.report {
            match output.report.to_toml() {
                Ok(text) => println!("{}", text),
                Err(e) => warn!("Failed to render report: {}", e),
            }
        }
        recorder.record(&output.report);

        processed += 1;
        reference = target;
    }

    info!(
        "Processed {} of {} pairs, {} inexact reconstructions",
        processed, config.output.pairs, inexact
    );

    if args.print_metrics {
        match recorder.encode() {
            Ok(text) => print!("{}", text),
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }

    if config.output.metrics_port > 0 && cfg!(feature = "metrics") {
        info!(
            port = config.output.metrics_port,
            "Serving metrics until interrupted"
        );
        while !cancel.load(Ordering::Relaxed) {
            std::thread::sleep(std::time::Duration::from_millis(200));
        }
    }

    if inexact > 0 {
        process::exit(1);
    }
}
