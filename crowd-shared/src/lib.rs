#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Represents a 2D position in simulation coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Startup configuration as read from a settings file.
///
/// Keys use the upper-case option names (`N`, `SPEED_LIMIT`, `AREA_X`, ...).
/// Missing keys fall back to the reference values; unknown keys are
/// rejected. Values are not validated here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SimulationSettings {
    /// Signed so that a negative count survives parsing and is reported
    /// as a configuration error.
    pub n: i64,
    pub speed_limit: f64,
    pub force_goal: f64,
    pub force_repulsion: f64,
    pub min_distance: f64,
    pub area_x: (f64, f64),
    pub area_y: (f64, f64),
    /// Seed for the initial placement; random when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            n: 80,
            speed_limit: 0.05,
            force_goal: 0.015,
            force_repulsion: 0.03,
            min_distance: 0.35,
            area_x: (0.0, 10.0),
            area_y: (0.0, 10.0),
            seed: None,
        }
    }
}

#[cfg(feature = "std")]
impl SimulationSettings {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// A recorded pointer event, applied before the given tick runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalUpdate {
    pub tick: u64,
    /// `None` when the pointer left the plot; the goal then stays put.
    pub position: Option<Position>,
}

/// One output frame of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub goal: Position,
    pub mean_speed: f64,
    pub positions: Vec<Position>,
}

/// One point of the speed/density diagram
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DiagramSample {
    pub agents: usize,
    pub density: f64,
    pub mean_speed: f64,
}
