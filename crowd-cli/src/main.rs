use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crowd_cli::{
    build_simulation, load_events_file, load_settings_file, run_session, sample_diagram,
    settings_to_config, write_diagram_csv, RunOptions,
};
use crowd_core::Vector2D;
use crowd_shared::SimulationSettings;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless crowd simulation driver", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the crowd and stream JSON tick reports to stdout
    Run {
        /// JSON settings file (N, SPEED_LIMIT, FORCE_GOAL, ...); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(short, long, default_value_t = 300)]
        ticks: u64,

        /// Report every this many ticks
        #[arg(short, long, default_value_t = 10)]
        every: u64,

        /// Initial goal as X,Y (defaults to the area center)
        #[arg(short, long, value_parser = parse_point)]
        goal: Option<Vector2D>,

        /// Recorded pointer events, one JSON object per line
        #[arg(long)]
        events: Option<PathBuf>,

        /// Seed for the initial placement, overrides SEED from the settings
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Print mean speed against density as CSV for several crowd sizes
    Diagram {
        /// JSON settings file; N is replaced by each entry of --counts
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Agent counts to sample
        #[arg(long, value_delimiter = ',', default_value = "10,20,40,80,160")]
        counts: Vec<usize>,

        /// Ticks per crowd size, warmup included
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,

        /// Ticks discarded before averaging
        #[arg(short, long, default_value_t = 300)]
        warmup: u64,

        /// Seed for the initial placement, overrides SEED from the settings
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn parse_point(text: &str) -> Result<Vector2D, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", text))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|e| format!("bad x coordinate: {}", e))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|e| format!("bad y coordinate: {}", e))?;
    let point = Vector2D::new(x, y);
    if !point.is_finite() {
        return Err(format!("goal must be finite, got '{}'", text));
    }
    Ok(point)
}

fn load_settings(config: Option<PathBuf>) -> Result<SimulationSettings> {
    match config {
        Some(path) => {
            log::info!("Loading settings from {}", path.display());
            load_settings_file(&path)
        }
        None => {
            log::info!("Using default settings");
            Ok(SimulationSettings::default())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    match args.command {
        Command::Run {
            config,
            ticks,
            every,
            goal,
            events,
            seed,
        } => {
            let settings = load_settings(config)?;
            let config = settings_to_config(&settings)?;
            let mut simulation = build_simulation(config, seed.or(settings.seed))
                .context("Failed to initialize simulation")?;
            simulation.handle_pointer_move(goal);

            let events = match events {
                Some(path) => load_events_file(&path)?,
                None => Vec::new(),
            };

            log::info!(
                "Simulating {} agents for {} ticks toward {:?} ({} pointer events)",
                config.agent_count,
                ticks,
                simulation.goal(),
                events.len()
            );

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let options = RunOptions { ticks, every };
            run_session(&mut simulation, &events, &options, &mut out)
                .context("Simulation error")?;
            out.flush()?;
        }
        Command::Diagram {
            config,
            counts,
            ticks,
            warmup,
            seed,
        } => {
            let settings = load_settings(config)?;
            let base = settings_to_config(&settings)?;
            log::info!("Sampling crowd sizes {:?}", counts);

            let samples = sample_diagram(&base, &counts, ticks, warmup, seed.or(settings.seed))?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_diagram_csv(&samples, &mut out)?;
        }
    }

    Ok(())
}
