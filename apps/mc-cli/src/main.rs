use clap::{Parser, Subcommand};
use mc_app::{AppError, AppResult, IntervalTicker, ManualTicker, TickRecord, build_system};
use mc_config::{ControllerConfig, FeedbackDef};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mc-cli")]
#[command(about = "motorctl CLI - closed-loop motor speed controller", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a controller configuration file
    Validate {
        /// Path to the configuration YAML file
        config_path: PathBuf,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Run the control loop
    Run {
        /// Configuration YAML file (defaults are used when omitted)
        config_path: Option<PathBuf>,
        /// Number of control ticks to run
        #[arg(long, default_value_t = 1000)]
        ticks: u64,
        /// Override the configured setpoint (Hz)
        #[arg(long)]
        setpoint: Option<f64>,
        /// Pace ticks at the configured period instead of running flat out
        #[arg(long)]
        realtime: bool,
        /// Write a per-tick CSV trace
        #[arg(long)]
        trace: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::InitConfig { path, force } => cmd_init_config(&path, force),
        Commands::Run {
            config_path,
            ticks,
            setpoint,
            realtime,
            trace,
        } => cmd_run(
            config_path.as_deref(),
            ticks,
            setpoint,
            realtime,
            trace.as_deref(),
        ),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = mc_config::load_yaml(config_path)?;
    println!("✓ Configuration is valid");
    print_config_summary(&config);
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> AppResult<()> {
    if path.exists() && !force {
        return Err(AppError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    mc_config::save_yaml(path, &ControllerConfig::default())?;
    println!("✓ Wrote default configuration to {}", path.display());
    Ok(())
}

fn cmd_run(
    config_path: Option<&Path>,
    ticks: u64,
    setpoint: Option<f64>,
    realtime: bool,
    trace: Option<&Path>,
) -> AppResult<()> {
    let mut config = match config_path {
        Some(path) => mc_config::load_yaml(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(hz) = setpoint {
        if !hz.is_finite() {
            return Err(AppError::InvalidInput(format!("setpoint {hz} is not finite")));
        }
        config.control.setpoint_hz = hz;
    }
    print_config_summary(&config);

    let mut system = build_system(&config)?;
    tracing::info!(ticks, realtime, "starting run");
    let started = Instant::now();
    let records = if realtime {
        let ticker = IntervalTicker::new(system.control.period());
        system.control.run_for(ticks, ticker)
    } else {
        system.control.run_for(ticks, ManualTicker::new())
    };
    let wall_s = started.elapsed().as_secs_f64();

    if let Some(path) = trace {
        mc_app::write_trace_csv(path, &records, config.control.period_s)?;
        println!("✓ Exported {} ticks to {}", records.len(), path.display());
    }

    print_run_summary(&system.control, records.last(), wall_s);
    Ok(())
}

fn print_config_summary(config: &ControllerConfig) {
    let feedback = match config.feedback {
        FeedbackDef::SyntheticRamp { .. } => "synthetic ramp",
        FeedbackDef::Encoder { .. } => "encoder",
        FeedbackDef::Plant { .. } => "simulated plant",
    };
    println!("Controller: {}", config.name);
    println!(
        "  Loop: {:.1} Hz, setpoint {} Hz, feedback {}",
        1.0 / config.control.period_s,
        config.control.setpoint_hz,
        feedback
    );
    println!(
        "  Carrier: {} Hz x {} ticks",
        config.actuator.carrier_hz, config.actuator.resolution_ticks
    );
    println!(
        "  Envelope: [{}, {}] Hz",
        config.envelope.min_hz, config.envelope.max_hz
    );
}

fn print_run_summary(control: &mc_app::SystemLoop, last: Option<&TickRecord>, wall_s: f64) {
    let stats = control.stats();

    println!("\nRun summary:");
    println!("  Ticks:      {}", control.tick_count());
    println!("  Final mode: {}", control.mode());
    match control.fault_tick() {
        Some(tick) => println!("  Faulted at tick {}", tick),
        None => println!("  No faults"),
    }
    if let Some(last) = last {
        println!(
            "  Last tick:  setpoint {} Hz, measured {:.2} Hz, duty {} ticks",
            last.setpoint_hz, last.measurement_hz, last.duty_ticks
        );
    }

    println!("\nTiming summary:");
    println!(
        "  Compute:  avg {:.2} us, max {:.2} us",
        stats.average_seconds() * 1e6,
        stats.max_seconds() * 1e6
    );
    println!("  Overruns: {}", stats.overruns());
    println!("  Wall:     {:.3}s", wall_s);
}
