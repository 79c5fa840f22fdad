//! Crowd-level measurements for diagnostics.
//!
//! These are the raw numbers behind a speed/density (fundamental) diagram.
//! Nothing here feeds back into the simulation.

use crate::{AgentState, Area, Point, Simulation, Vector2D};

/// Summary of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub goal: Point,
    pub mean_speed: f64,
    pub density: f64,
}

pub fn mean_speed(state: &AgentState) -> f64 {
    if state.is_empty() {
        return 0.0;
    }
    let total: f64 = state.velocities().iter().map(Vector2D::magnitude).sum();
    total / state.len() as f64
}

pub fn max_speed(state: &AgentState) -> f64 {
    state
        .velocities()
        .iter()
        .map(Vector2D::magnitude)
        .fold(0.0, f64::max)
}

/// Agents inside `area` per unit of area.
pub fn density(state: &AgentState, area: &Area) -> f64 {
    let inside = state
        .positions()
        .iter()
        .filter(|position| area.contains(**position))
        .count();
    inside as f64 / area.size()
}

pub fn centroid(state: &AgentState) -> Point {
    if state.is_empty() {
        return Vector2D::zero();
    }
    let sum = state
        .positions()
        .iter()
        .fold(Vector2D::zero(), |sum, position| sum + *position);
    sum / state.len() as f64
}

pub fn mean_goal_distance(state: &AgentState, goal: Point) -> f64 {
    if state.is_empty() {
        return 0.0;
    }
    let total: f64 = state
        .positions()
        .iter()
        .map(|position| position.distance(&goal))
        .sum();
    total / state.len() as f64
}

pub fn snapshot(simulation: &Simulation) -> Snapshot {
    let state = simulation.state();
    Snapshot {
        tick: simulation.tick_count(),
        goal: simulation.goal(),
        mean_speed: mean_speed(state),
        density: density(state, &simulation.config().area),
    }
}
