//! Desk Pet CLI
//!
//! Runs the pet's activity core headless and inspects its configuration.

use clap::{Parser, Subcommand};
use desk_pet::{
    collector::{check_permission, Collector, CollectorConfig},
    config::{Config, SourceConfig},
    core::{
        create_shared_log, ActivityClassifier, AnimationLibrary, AnimationStateMachine, FrameRef,
        RandomSource, RngSource,
    },
    runtime::{FrameSink, PetRuntime},
    sprite::{load_sheet, SheetLayout},
    stats::create_shared_stats,
    VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "desk-pet")]
#[command(version = VERSION)]
#[command(about = "Animated desktop companion driven by keyboard and mouse activity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pet and follow activity until Ctrl+C
    Run {
        /// Input sources to capture (keyboard, mouse, or all); defaults to the saved config
        #[arg(long)]
        sources: Option<String>,

        /// Seed for animation choices, for reproducible sessions
        #[arg(long)]
        seed: Option<u64>,

        /// PNG sprite sheet in the default 8x10 cat layout; frame counts are
        /// taken from its drawn cells
        #[arg(long)]
        sheet: Option<PathBuf>,
    },

    /// Show saved placement and permission status
    Status,

    /// Show configuration
    Config,

    /// Slice a PNG sprite sheet and print the frame table as JSON
    Slice {
        /// PNG sprite sheet in the default 8x10 cat layout
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sources,
            seed,
            sheet,
        } => cmd_run(sources.as_deref(), seed, sheet.as_deref()),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
        Commands::Slice { input } => cmd_slice(&input),
    }
}

/// Frame sink for headless runs: logs what would be drawn.
struct LogSink;

impl FrameSink for LogSink {
    fn present(&mut self, frame: FrameRef, scale: f64) {
        tracing::trace!(
            state = %frame.state,
            variant = frame.variant_index,
            frame = frame.frame_index,
            scale,
            "frame"
        );
    }
}

fn cmd_run(sources: Option<&str>, seed: Option<u64>, sheet: Option<&Path>) {
    let config_path = Config::config_path();
    let config = Config::load_or_default(&config_path);

    let source_config = sources
        .map(SourceConfig::from_csv)
        .unwrap_or_else(|| config.sources.clone());
    if !source_config.any_enabled() {
        eprintln!("Error: At least one source must be enabled (keyboard or mouse)");
        std::process::exit(1);
    }

    if !check_permission() {
        eprintln!("Error: Input Monitoring permission not granted.");
        eprintln!();
        eprintln!("To grant permission:");
        eprintln!("1. Open System Settings > Privacy & Security > Input Monitoring");
        eprintln!("2. Add this application to the allowed list");
        eprintln!("3. Restart the application");
        std::process::exit(1);
    }

    let library = match load_library(sheet) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let log = create_shared_log(config.retention_minutes);
    let stats = create_shared_stats();

    let mut collector = Collector::new(
        CollectorConfig::from(&source_config),
        log.clone(),
        stats.clone(),
    );
    if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        std::process::exit(1);
    }

    let rng: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_os()),
    };
    let classifier = ActivityClassifier::new(log, config.classifier.clone());
    let machine =
        AnimationStateMachine::new(library, config.cycles.clone(), Box::new(classifier), rng);

    tracing::info!(
        version = VERSION,
        x = config.x,
        y = config.y,
        scale = config.scale,
        "pet started; press Ctrl+C to stop"
    );

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let (mut runtime, _handle) = PetRuntime::new(machine, config, Some(config_path), stats.clone());
    runtime.run(&running, &mut LogSink);

    collector.stop();
    println!();
    println!("{}", stats.report());
}

fn cmd_status() {
    let path = Config::config_path();
    let config = Config::load_or_default(&path);

    println!("Desk Pet Status");
    println!("===============");
    println!();
    println!(
        "Input Monitoring Permission: {}",
        if check_permission() {
            "Granted ✓"
        } else {
            "Not Granted ✗"
        }
    );
    println!();
    println!("Placement:");
    println!("  Position: ({}, {})", config.x, config.y);
    println!(
        "  Scale: {:.1} (range {:.1}-{:.1})",
        config.scale, config.min_scale, config.max_scale
    );
    println!();
    println!("Sources:");
    println!(
        "  Keyboard capture: {}",
        if config.sources.keyboard {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Mouse capture: {}",
        if config.sources.mouse {
            "enabled"
        } else {
            "disabled"
        }
    );
    if !path.exists() {
        println!();
        println!("No saved configuration; using defaults.");
    }
}

fn cmd_config() {
    let config = Config::load_or_default(&Config::config_path());

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Frame counts from the sheet at `path`, or the full default layout when
/// no sheet is given.
fn load_library(path: Option<&Path>) -> Result<AnimationLibrary, String> {
    let layout = SheetLayout::default();
    let Some(path) = path else {
        tracing::info!("no sprite sheet given; assuming every cell is drawn");
        return layout
            .full_library()
            .map_err(|e| format!("invalid sprite layout: {e}"));
    };

    load_sheet(path, &layout)
        .map_err(|e| format!("could not load sprite sheet: {e}"))?
        .library()
        .map_err(|e| format!("sprite sheet cannot drive the pet: {e}"))
}

fn cmd_slice(input: &Path) {
    let sheet = match load_sheet(input, &SheetLayout::default()) {
        Ok(sheet) => sheet,
        Err(e) => {
            eprintln!("Error slicing sheet: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = sheet.library() {
        eprintln!("Warning: sheet cannot drive the pet: {e}");
    }

    match serde_json::to_string_pretty(&sheet) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing frame table: {e}");
            std::process::exit(1);
        }
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        tracing::warn!("could not install Ctrl+C handler: {e}");
    }
}
