//! Headless driver for the crowd simulation.
//!
//! Loads settings, replays recorded pointer events as goal updates and
//! writes one JSON frame per sampled tick. The binary in `main.rs` is a thin
//! argument layer over these functions.

use anyhow::{bail, Context, Result};
use crowd_core::{metrics, AgentState, Area, Point, Simulation, SimulationConfig, Vector2D};
use crowd_shared::{DiagramSample, GoalUpdate, Position, SimulationSettings, TickReport};
use rand::{rngs::StdRng, SeedableRng};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

pub fn load_settings<R: Read>(reader: R) -> Result<SimulationSettings> {
    serde_json::from_reader(reader).context("Failed to parse simulation settings")
}

pub fn load_settings_file(path: &Path) -> Result<SimulationSettings> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open settings file {}", path.display()))?;
    load_settings(BufReader::new(file))
}

pub fn settings_to_config(settings: &SimulationSettings) -> Result<SimulationConfig> {
    let config = SimulationConfig {
        // negative counts become 0 and fail validation below
        agent_count: usize::try_from(settings.n).unwrap_or(0),
        speed_limit: settings.speed_limit,
        force_goal: settings.force_goal,
        force_repulsion: settings.force_repulsion,
        min_distance: settings.min_distance,
        area: Area::new(settings.area_x, settings.area_y),
    };
    config.validate().context("Invalid simulation settings")?;
    Ok(config)
}

/// Scatters agents over the area, reproducibly when a seed is given.
pub fn build_simulation(config: SimulationConfig, seed: Option<u64>) -> Result<Simulation> {
    let state = match seed {
        Some(seed) => {
            log::debug!("Seeding initial placement with {}", seed);
            AgentState::initialize_with_rng(&config, &mut StdRng::seed_from_u64(seed))?
        }
        None => AgentState::initialize(&config)?,
    };
    Ok(Simulation::with_state(config, state)?)
}

/// Reads pointer events, one JSON object per line, sorted by tick.
pub fn load_events<R: BufRead>(reader: R) -> Result<Vec<GoalUpdate>> {
    let mut events = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read pointer events")?;
        if line.trim().is_empty() {
            continue;
        }
        let event: GoalUpdate = serde_json::from_str(&line)
            .with_context(|| format!("Invalid pointer event on line {}", number + 1))?;
        events.push(event);
    }
    events.sort_by_key(|event| event.tick);
    Ok(events)
}

pub fn load_events_file(path: &Path) -> Result<Vec<GoalUpdate>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open pointer events {}", path.display()))?;
    load_events(BufReader::new(file))
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub ticks: u64,
    /// Write a report every this many ticks.
    pub every: u64,
}

fn to_point(position: Position) -> Point {
    Vector2D::new(position.x, position.y)
}

fn to_position(point: Point) -> Position {
    Position::new(point.x, point.y)
}

pub fn report(simulation: &Simulation) -> TickReport {
    TickReport {
        tick: simulation.tick_count(),
        goal: to_position(simulation.goal()),
        mean_speed: metrics::mean_speed(simulation.state()),
        positions: simulation
            .positions()
            .iter()
            .copied()
            .map(to_position)
            .collect(),
    }
}

/// Runs the simulation for `options.ticks` ticks.
///
/// Events are applied once the simulation reaches their tick. A report is
/// written after every `options.every` ticks and after the final tick.
/// Returns the number of reports written.
pub fn run_session<W: Write>(
    simulation: &mut Simulation,
    events: &[GoalUpdate],
    options: &RunOptions,
    out: &mut W,
) -> Result<usize> {
    if options.every == 0 {
        bail!("Report interval must be at least one tick");
    }

    let mut pending = events.iter().peekable();
    let mut written = 0;

    for remaining in (0..options.ticks).rev() {
        let now = simulation.tick_count();
        while let Some(event) = pending.next_if(|event| event.tick <= now) {
            if simulation.handle_pointer_move(event.position.map(to_point)) {
                log::debug!("Goal moved to {:?} at tick {}", simulation.goal(), event.tick);
            }
        }

        simulation.tick();

        if simulation.tick_count() % options.every == 0 || remaining == 0 {
            serde_json::to_writer(&mut *out, &report(simulation))
                .context("Failed to serialize tick report")?;
            writeln!(out).context("Failed to write tick report")?;
            written += 1;
        }
    }

    let snapshot = metrics::snapshot(simulation);
    log::info!(
        "Finished after {} ticks: mean speed {:.4}, density {:.3}",
        snapshot.tick,
        snapshot.mean_speed,
        snapshot.density
    );

    Ok(written)
}

/// Measures mean speed against density for each agent count.
///
/// Every count gets a fresh simulation seeking the area center. The first
/// `warmup` ticks are discarded and the remaining ones averaged.
pub fn sample_diagram(
    base: &SimulationConfig,
    counts: &[usize],
    ticks: u64,
    warmup: u64,
    seed: Option<u64>,
) -> Result<Vec<DiagramSample>> {
    if ticks <= warmup {
        bail!("Need more ticks ({}) than warmup ticks ({})", ticks, warmup);
    }

    counts
        .iter()
        .map(|&agents| -> Result<DiagramSample> {
            let config = SimulationConfig {
                agent_count: agents,
                ..*base
            };
            let mut simulation = build_simulation(config, seed)
                .with_context(|| format!("Failed to set up {} agents", agents))?;
            simulation.run(warmup);

            let mut density = 0.0;
            let mut mean_speed = 0.0;
            for _ in warmup..ticks {
                simulation.tick();
                let snapshot = metrics::snapshot(&simulation);
                density += snapshot.density;
                mean_speed += snapshot.mean_speed;
            }

            let samples = (ticks - warmup) as f64;
            log::debug!("Sampled {} agents over {} ticks", agents, ticks - warmup);
            Ok(DiagramSample {
                agents,
                density: density / samples,
                mean_speed: mean_speed / samples,
            })
        })
        .collect()
}

pub fn write_diagram_csv<W: Write>(samples: &[DiagramSample], out: &mut W) -> Result<()> {
    writeln!(out, "agents,density,mean_speed")?;
    for sample in samples {
        writeln!(
            out,
            "{},{},{}",
            sample.agents, sample.density, sample.mean_speed
        )?;
    }
    Ok(())
}
