#![cfg_attr(not(feature = "std"), no_std)]

//! Goal-seeking crowd simulation core.
//!
//! A fixed group of point agents is pulled toward a single goal point while
//! pushing each other apart at short range. [`AgentState`] owns the agent
//! arrays, [`engine::step`] advances them by one tick and [`Simulation`] is
//! the driver that threads the current goal through every tick.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

#[cfg(feature = "std")]
use rand::Rng;

use core::fmt;

pub mod metrics;

/// Added to every distance used as a divisor.
pub const EPSILON: f64 = 1e-8;

/// A 2D vector used for position and velocity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

/// Points and vectors share one representation.
pub type Point = Vector2D;

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn magnitude(&self) -> f64 {
        #[cfg(feature = "std")]
        {
            (self.x * self.x + self.y * self.y).sqrt()
        }
        #[cfg(not(feature = "std"))]
        {
            libm::sqrt(self.x * self.x + self.y * self.y)
        }
    }

    pub fn dot(&self, other: &Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
            }
        } else {
            Self::zero()
        }
    }

    /// Rescales the vector to length `max` when it is longer, keeping its
    /// direction. Shorter vectors come back untouched.
    pub fn limit(&self, max: f64) -> Self {
        let mag = self.magnitude();
        if mag > max {
            *self * (max / mag)
        } else {
            *self
        }
    }

    pub fn distance(&self, other: &Vector2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        #[cfg(feature = "std")]
        {
            (dx * dx + dy * dy).sqrt()
        }
        #[cfg(not(feature = "std"))]
        {
            libm::sqrt(dx * dx + dy * dy)
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Neg for Vector2D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl core::ops::Mul<f64> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl core::ops::Div<f64> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl core::ops::SubAssign for Vector2D {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

/// Axis-aligned rectangle agents are scattered into at startup.
///
/// The simulation never confines agents to it; it only seeds initial
/// positions, the default goal and the density diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Area {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self { x, y }
    }

    pub fn width(&self) -> f64 {
        self.x.1 - self.x.0
    }

    pub fn height(&self) -> f64 {
        self.y.1 - self.y.0
    }

    pub fn size(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Vector2D::new((self.x.0 + self.x.1) * 0.5, (self.y.0 + self.y.1) * 0.5)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x.0 && point.x <= self.x.1 && point.y >= self.y.0 && point.y <= self.y.1
    }
}

impl Default for Area {
    fn default() -> Self {
        Self {
            x: (0.0, 10.0),
            y: (0.0, 10.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoAgents,
    InvalidParameter { name: &'static str, value: f64 },
    DegenerateArea { axis: char, min: f64, max: f64 },
    AgentCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoAgents => write!(f, "agent count must be positive"),
            ConfigError::InvalidParameter { name, value } => {
                write!(f, "{name} must be finite and positive, got {value}")
            }
            ConfigError::DegenerateArea { axis, min, max } => write!(
                f,
                "area {axis} range ({min}, {max}) must be finite with min < max"
            ),
            ConfigError::AgentCountMismatch { expected, actual } => {
                write!(f, "got {actual} initial positions for {expected} agents")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Configuration for the crowd simulation, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub agent_count: usize,
    /// Maximum distance an agent covers in one tick.
    pub speed_limit: f64,
    pub force_goal: f64,
    pub force_repulsion: f64,
    /// Repulsion radius.
    pub min_distance: f64,
    pub area: Area,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_count: 80,
            speed_limit: 0.05,
            force_goal: 0.015,
            force_repulsion: 0.03,
            min_distance: 0.35,
            area: Area::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_count == 0 {
            return Err(ConfigError::NoAgents);
        }

        for (name, value) in [
            ("speed_limit", self.speed_limit),
            ("force_goal", self.force_goal),
            ("force_repulsion", self.force_repulsion),
            ("min_distance", self.min_distance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }

        for (axis, (min, max)) in [('x', self.area.x), ('y', self.area.y)] {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(ConfigError::DegenerateArea { axis, min, max });
            }
        }

        Ok(())
    }
}

/// Per-agent arrays of the simulation.
///
/// `positions[i]` and `velocities[i]` always describe the same agent and both
/// arrays keep the configured length for the lifetime of the state. Only
/// [`engine::step`] mutates them.
#[derive(Debug, Clone)]
pub struct AgentState {
    positions: Vec<Point>,
    velocities: Vec<Vector2D>,
    // reused by every step
    forces: Vec<Vector2D>,
}

impl AgentState {
    /// Places agents at the given positions with zero velocity.
    pub fn from_positions(
        config: &SimulationConfig,
        positions: Vec<Point>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if positions.len() != config.agent_count {
            return Err(ConfigError::AgentCountMismatch {
                expected: config.agent_count,
                actual: positions.len(),
            });
        }

        let count = positions.len();
        Ok(Self {
            positions,
            velocities: vec![Vector2D::zero(); count],
            forces: vec![Vector2D::zero(); count],
        })
    }

    /// Scatters agents uniformly over the configured area.
    #[cfg(feature = "std")]
    pub fn initialize(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::initialize_with_rng(config, &mut rand::thread_rng())
    }

    #[cfg(feature = "std")]
    pub fn initialize_with_rng<R: Rng>(
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (x_min, x_max) = config.area.x;
        let (y_min, y_max) = config.area.y;
        let positions = (0..config.agent_count)
            .map(|_| Vector2D::new(rng.gen_range(x_min..x_max), rng.gen_range(y_min..y_max)))
            .collect();

        log::debug!(
            "Placed {} agents in [{}, {}) x [{}, {})",
            config.agent_count,
            x_min,
            x_max,
            y_min,
            y_max
        );

        Self::from_positions(config, positions)
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector2D] {
        &self.velocities
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn agent(&self, index: usize) -> Option<(Point, Vector2D)> {
        Some((*self.positions.get(index)?, *self.velocities.get(index)?))
    }
}

/// Force computation and integration.
///
/// Repulsion compares every agent with every other one, so a step costs
/// O(N²). That is fine for tens to a few hundred agents; there is no spatial
/// index.
pub mod engine {
    use super::*;

    /// Attraction of an agent at `position` toward `goal`.
    ///
    /// An agent sitting exactly on the goal gets the zero vector.
    pub fn goal_force(position: Point, goal: Point, config: &SimulationConfig) -> Vector2D {
        let to_goal = goal - position;
        let distance = to_goal.magnitude();
        to_goal / (distance + EPSILON) * config.force_goal
    }

    /// Push that the agent at `other` exerts on the agent at `agent`.
    ///
    /// Zero outside the repulsion radius and for coincident points, which
    /// covers self-interaction as well.
    pub fn repulsion_between(agent: Point, other: Point, config: &SimulationConfig) -> Vector2D {
        let diff = agent - other;
        let distance = diff.magnitude();
        if distance > 0.0 && distance < config.min_distance {
            diff / (distance + EPSILON) * config.force_repulsion
        } else {
            Vector2D::zero()
        }
    }

    /// Summed repulsion on agent `index` from all other agents.
    ///
    /// Panics if `index` is out of bounds.
    pub fn repulsion_on(index: usize, positions: &[Point], config: &SimulationConfig) -> Vector2D {
        let agent = positions[index];
        positions
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .fold(Vector2D::zero(), |sum, (_, other)| {
                sum + repulsion_between(agent, *other, config)
            })
    }

    pub fn clamp_speed(velocity: Vector2D, limit: f64) -> Vector2D {
        velocity.limit(limit)
    }

    /// Advances every agent by one tick toward `goal`.
    ///
    /// All forces are computed from the pre-step positions before any
    /// velocity or position is written. Agents are free to leave the area.
    /// Non-finite goals must be filtered out by the caller.
    pub fn step(state: &mut AgentState, goal: Point, config: &SimulationConfig) {
        accumulate_forces(&state.positions, &mut state.forces, goal, config);

        for ((position, velocity), force) in state
            .positions
            .iter_mut()
            .zip(state.velocities.iter_mut())
            .zip(state.forces.iter())
        {
            *velocity += *force;
            *velocity = clamp_speed(*velocity, config.speed_limit);
            *position += *velocity;
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn accumulate_forces(
        positions: &[Point],
        forces: &mut [Vector2D],
        goal: Point,
        config: &SimulationConfig,
    ) {
        for (index, force) in forces.iter_mut().enumerate() {
            let pull = goal_force(positions[index], goal, config);
            *force = pull + repulsion_on(index, positions, config);
        }
    }

    #[cfg(feature = "parallel")]
    fn accumulate_forces(
        positions: &[Point],
        forces: &mut [Vector2D],
        goal: Point,
        config: &SimulationConfig,
    ) {
        use rayon::prelude::*;

        forces.par_iter_mut().enumerate().for_each(|(index, force)| {
            let pull = goal_force(positions[index], goal, config);
            *force = pull + repulsion_on(index, positions, config);
        });
    }
}

/// Owns the agents and the current goal, and steps them once per tick.
///
/// Input handlers call [`Simulation::handle_pointer_move`]; the render or
/// timer loop calls [`Simulation::tick`] and then reads
/// [`Simulation::positions`].
#[derive(Debug, Clone)]
pub struct Simulation {
    state: AgentState,
    config: SimulationConfig,
    goal: Point,
    ticks: u64,
}

impl Simulation {
    #[cfg(feature = "std")]
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let state = AgentState::initialize(&config)?;
        Self::with_state(config, state)
    }

    /// Wraps an existing state. The goal starts at the center of the area.
    pub fn with_state(config: SimulationConfig, state: AgentState) -> Result<Self, ConfigError> {
        config.validate()?;
        if state.len() != config.agent_count {
            return Err(ConfigError::AgentCountMismatch {
                expected: config.agent_count,
                actual: state.len(),
            });
        }

        Ok(Self {
            state,
            goal: config.area.center(),
            config,
            ticks: 0,
        })
    }

    /// Moves the goal to the pointer.
    ///
    /// `None` means the pointer is outside the plot. Both that and a
    /// non-finite point keep the previous goal. Returns whether the goal
    /// changed.
    pub fn handle_pointer_move(&mut self, pointer: Option<Point>) -> bool {
        match pointer {
            Some(point) if point.is_finite() => {
                self.goal = point;
                true
            }
            Some(point) => {
                log::warn!("Ignoring non-finite pointer position {:?}", point);
                false
            }
            None => false,
        }
    }

    pub fn tick(&mut self) {
        let goal = self.goal;
        engine::step(&mut self.state, goal, &self.config);
        self.ticks += 1;
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn positions(&self) -> &[Point] {
        self.state.positions()
    }
}

#[cfg(test)]
mod tests {
    use super::engine::*;
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOLERANCE: f64 = 1e-12;

    fn config_with(agent_count: usize) -> SimulationConfig {
        SimulationConfig {
            agent_count,
            ..SimulationConfig::default()
        }
    }

    fn state_at(config: &SimulationConfig, positions: &[Point]) -> AgentState {
        AgentState::from_positions(config, positions.to_vec()).unwrap()
    }

    #[test]
    fn test_vector2d_magnitude() {
        let v = Vector2D::new(3.0, 4.0);
        assert_eq!(v.magnitude(), 5.0);
        assert_eq!(Vector2D::zero().distance(&v), 5.0);
    }

    #[test]
    fn test_vector2d_normalize() {
        let v = Vector2D::new(3.0, 4.0);
        let normalized = v.normalize();
        assert!((normalized.magnitude() - 1.0).abs() < TOLERANCE);
        assert_eq!(Vector2D::zero().normalize(), Vector2D::zero());
    }

    #[test]
    fn test_vector2d_operations() {
        let v1 = Vector2D::new(1.0, 2.0);
        let v2 = Vector2D::new(3.0, 4.0);

        assert_eq!(v1 + v2, Vector2D::new(4.0, 6.0));
        assert_eq!(v2 - v1, Vector2D::new(2.0, 2.0));
        assert_eq!(v1 * 2.0, Vector2D::new(2.0, 4.0));
        assert_eq!(v2 / 2.0, Vector2D::new(1.5, 2.0));
        assert_eq!(-v1, Vector2D::new(-1.0, -2.0));
        assert_eq!(v1.dot(&v2), 11.0);

        let mut v3 = v1;
        v3 += v2;
        v3 -= v1;
        assert_eq!(v3, v2);
    }

    #[test]
    fn test_vector2d_limit() {
        let v = Vector2D::new(30.0, 40.0);
        let limited = v.limit(5.0);
        assert!((limited.magnitude() - 5.0).abs() < TOLERANCE);
        assert!((limited.x - 3.0).abs() < TOLERANCE);

        let short = Vector2D::new(0.1, 0.1);
        assert_eq!(short.limit(5.0), short);
    }

    #[test]
    fn test_area_geometry() {
        let area = Area::new((0.0, 4.0), (2.0, 12.0));
        assert_eq!(area.width(), 4.0);
        assert_eq!(area.height(), 10.0);
        assert_eq!(area.size(), 40.0);
        assert_eq!(area.center(), Vector2D::new(2.0, 7.0));
        assert!(area.contains(Vector2D::new(4.0, 2.0)));
        assert!(!area.contains(Vector2D::new(4.1, 2.0)));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.agent_count, 80);
        assert_eq!(config.min_distance, 0.35);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_config_rejects_zero_agents() {
        assert_eq!(config_with(0).validate(), Err(ConfigError::NoAgents));
    }

    fn rejected_parameter(config: SimulationConfig) -> &'static str {
        match config.validate() {
            Err(ConfigError::InvalidParameter { name, .. }) => name,
            other => panic!("expected an invalid parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_non_positive_parameters() {
        let config = SimulationConfig {
            speed_limit: 0.0,
            ..SimulationConfig::default()
        };
        assert_eq!(rejected_parameter(config), "speed_limit");

        let config = SimulationConfig {
            force_repulsion: -1.0,
            ..SimulationConfig::default()
        };
        assert_eq!(rejected_parameter(config), "force_repulsion");

        let config = SimulationConfig {
            min_distance: f64::NAN,
            ..SimulationConfig::default()
        };
        assert_eq!(rejected_parameter(config), "min_distance");
    }

    #[test]
    fn test_config_rejects_degenerate_area() {
        let config = SimulationConfig {
            area: Area::new((0.0, 10.0), (5.0, 5.0)),
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DegenerateArea {
                axis: 'y',
                min: 5.0,
                max: 5.0
            })
        );

        let inverted = SimulationConfig {
            area: Area::new((10.0, 0.0), (0.0, 10.0)),
            ..SimulationConfig::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::DegenerateArea {
                axis: 'x',
                min: 10.0,
                max: 0.0
            })
        );
    }

    #[test]
    fn test_initialize_places_agents_in_area() {
        let config = SimulationConfig {
            area: Area::new((-3.0, 2.0), (10.0, 11.0)),
            ..SimulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let state = AgentState::initialize_with_rng(&config, &mut rng).unwrap();

        assert_eq!(state.len(), 80);
        assert_eq!(state.velocities().len(), 80);
        for (position, velocity) in state.positions().iter().zip(state.velocities()) {
            assert!(position.x >= -3.0 && position.x < 2.0);
            assert!(position.y >= 10.0 && position.y < 11.0);
            assert_eq!(*velocity, Vector2D::zero());
        }
    }

    #[test]
    fn test_initialize_is_reproducible_with_seed() {
        let config = SimulationConfig::default();
        let a = AgentState::initialize_with_rng(&config, &mut StdRng::seed_from_u64(42));
        let b = AgentState::initialize_with_rng(&config, &mut StdRng::seed_from_u64(42));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_initialize_fails_without_agents() {
        assert_eq!(
            AgentState::initialize(&config_with(0)).unwrap_err(),
            ConfigError::NoAgents
        );
    }

    #[test]
    fn test_from_positions_checks_count() {
        let config = config_with(3);
        let positions = vec![Vector2D::zero(); 2];
        let err = AgentState::from_positions(&config, positions).unwrap_err();
        assert_eq!(
            err,
            ConfigError::AgentCountMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_agent_accessor() {
        let config = config_with(2);
        let state = state_at(&config, &[Vector2D::new(1.0, 2.0), Vector2D::new(3.0, 4.0)]);
        assert_eq!(
            state.agent(1),
            Some((Vector2D::new(3.0, 4.0), Vector2D::zero()))
        );
        assert_eq!(state.agent(2), None);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_goal_force_points_toward_goal() {
        let config = SimulationConfig::default();
        let position = Vector2D::new(1.0, 1.0);
        let goal = Vector2D::new(-2.0, 5.0);

        let force = goal_force(position, goal, &config);
        assert!(force.dot(&(goal - position)) > 0.0);
        assert!((force.magnitude() - config.force_goal).abs() < 1e-9);
    }

    #[test]
    fn test_goal_force_vanishes_on_goal() {
        let config = SimulationConfig::default();
        let point = Vector2D::new(4.0, 4.0);
        assert_eq!(goal_force(point, point, &config), Vector2D::zero());
    }

    #[test]
    fn test_repulsion_is_antisymmetric() {
        let config = SimulationConfig::default();
        let a = Vector2D::new(1.0, 1.0);
        let b = Vector2D::new(1.2, 1.1);

        let on_a = repulsion_between(a, b, &config);
        let on_b = repulsion_between(b, a, &config);
        assert_ne!(on_a, Vector2D::zero());
        assert_eq!(on_a, -on_b);
        assert!((on_a.magnitude() - on_b.magnitude()).abs() < TOLERANCE);
        // pushes a away from b
        assert!(on_a.dot(&(a - b)) > 0.0);
    }

    #[test]
    fn test_repulsion_outside_radius_is_zero() {
        let config = SimulationConfig::default();
        let a = Vector2D::new(0.0, 0.0);
        assert_eq!(
            repulsion_between(a, Vector2D::new(0.35, 0.0), &config),
            Vector2D::zero()
        );
        assert_eq!(
            repulsion_between(a, Vector2D::new(3.0, 0.0), &config),
            Vector2D::zero()
        );
    }

    #[test]
    fn test_no_self_repulsion() {
        let config = SimulationConfig {
            min_distance: 1e6,
            force_repulsion: 1e6,
            ..config_with(1)
        };
        let positions = [Vector2D::new(2.0, 3.0)];
        assert_eq!(repulsion_on(0, &positions, &config), Vector2D::zero());
        assert_eq!(
            repulsion_between(positions[0], positions[0], &config),
            Vector2D::zero()
        );
    }

    #[test]
    fn test_coincident_agents_do_not_repel() {
        let config = config_with(2);
        let positions = [Vector2D::new(1.0, 1.0), Vector2D::new(1.0, 1.0)];
        assert_eq!(repulsion_on(0, &positions, &config), Vector2D::zero());
        assert_eq!(repulsion_on(1, &positions, &config), Vector2D::zero());
    }

    #[test]
    fn test_repulsion_sums_neighbors() {
        let config = config_with(3);
        let positions = [
            Vector2D::new(0.0, 0.0),
            Vector2D::new(0.1, 0.0),
            Vector2D::new(-0.1, 0.0),
        ];
        // symmetric neighbors cancel out
        assert!(repulsion_on(0, &positions, &config).magnitude() < TOLERANCE);
        assert!(repulsion_on(1, &positions, &config).x > 0.0);
    }

    #[test]
    fn test_scenario_goal_on_agent_without_repulsion() {
        let config = config_with(2);
        let first = Vector2D::new(0.0, 0.0);
        let second = Vector2D::new(10.0, 0.0);
        let mut state = state_at(&config, &[first, second]);

        step(&mut state, first, &config);

        assert_eq!(state.velocities()[0], Vector2D::zero());
        assert_eq!(state.positions()[0], first);

        let velocity = state.velocities()[1];
        assert!(velocity.x < 0.0);
        assert_eq!(velocity.y, 0.0);
        assert!(velocity.magnitude() <= config.speed_limit + TOLERANCE);
    }

    #[test]
    fn test_scenario_close_agents_move_apart() {
        let config = config_with(2);
        let first = Vector2D::new(5.0, 5.0);
        let second = Vector2D::new(5.1, 5.0);
        let mut state = state_at(&config, &[first, second]);
        let before = first.distance(&second);

        step(&mut state, first, &config);

        let after = state.positions()[0].distance(&state.positions()[1]);
        assert!(after > before);
    }

    #[test]
    fn test_scenario_speed_clamp_preserves_direction() {
        let config = SimulationConfig {
            force_goal: 1.0,
            ..config_with(1)
        };
        let start = Vector2D::new(1.0, 1.0);
        let goal = Vector2D::new(4.0, 5.0);
        let mut state = state_at(&config, &[start]);

        let pull = goal_force(start, goal, &config);
        let push = repulsion_on(0, state.positions(), &config);
        let unclamped = state.velocities()[0] + pull + push;
        assert!(unclamped.magnitude() > config.speed_limit);

        step(&mut state, goal, &config);

        let velocity = state.velocities()[0];
        assert!((velocity.magnitude() - config.speed_limit).abs() < TOLERANCE);
        let before = unclamped.normalize();
        let after = velocity.normalize();
        assert!((before.x - after.x).abs() < TOLERANCE);
        assert!((before.y - after.y).abs() < TOLERANCE);
        assert_eq!(state.positions()[0], start + velocity);
    }

    #[test]
    fn test_clamp_leaves_slow_agents_alone() {
        let slow = Vector2D::new(0.01, -0.02);
        assert_eq!(clamp_speed(slow, 0.05), slow);
    }

    #[test]
    fn test_speed_bound_and_alignment_hold_over_many_steps() {
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = AgentState::initialize_with_rng(&config, &mut rng).unwrap();

        for tick in 0..400 {
            let goal = if tick < 200 {
                Vector2D::new(2.0, 8.0)
            } else {
                Vector2D::new(9.0, 1.0)
            };
            step(&mut state, goal, &config);

            assert_eq!(state.positions().len(), config.agent_count);
            assert_eq!(state.velocities().len(), config.agent_count);
            for velocity in state.velocities() {
                assert!(velocity.magnitude() <= config.speed_limit + TOLERANCE);
            }
        }
    }

    #[test]
    fn test_agent_on_goal_stays_put() {
        let config = config_with(2);
        let resting = Vector2D::new(1.0, 1.0);
        let mut state = state_at(&config, &[resting, Vector2D::new(8.0, 8.0)]);

        for _ in 0..50 {
            step(&mut state, resting, &config);
            assert_eq!(state.positions()[0], resting);
            assert_eq!(state.velocities()[0], Vector2D::zero());
        }
    }

    #[test]
    fn test_agents_may_leave_area() {
        let config = config_with(1);
        let mut state = state_at(&config, &[Vector2D::new(9.99, 5.0)]);

        for _ in 0..20 {
            step(&mut state, Vector2D::new(50.0, 5.0), &config);
        }

        assert!(state.positions()[0].x > config.area.x.1);
        assert!(!config.area.contains(state.positions()[0]));
    }

    #[test]
    fn test_simulation_starts_at_area_center() {
        let simulation = Simulation::new(config_with(5)).unwrap();
        assert_eq!(simulation.goal(), Vector2D::new(5.0, 5.0));
        assert_eq!(simulation.tick_count(), 0);
        assert_eq!(simulation.positions().len(), 5);
    }

    #[test]
    fn test_simulation_pointer_updates() {
        let mut simulation = Simulation::new(config_with(5)).unwrap();

        assert!(simulation.handle_pointer_move(Some(Vector2D::new(1.0, 2.0))));
        assert_eq!(simulation.goal(), Vector2D::new(1.0, 2.0));

        assert!(!simulation.handle_pointer_move(None));
        assert_eq!(simulation.goal(), Vector2D::new(1.0, 2.0));

        assert!(!simulation.handle_pointer_move(Some(Vector2D::new(f64::NAN, 0.0))));
        assert!(!simulation.handle_pointer_move(Some(Vector2D::new(0.0, f64::INFINITY))));
        assert_eq!(simulation.goal(), Vector2D::new(1.0, 2.0));
    }

    #[test]
    fn test_simulation_tick_moves_toward_goal() {
        let config = config_with(1);
        let state = state_at(&config, &[Vector2D::new(1.0, 1.0)]);
        let mut simulation = Simulation::with_state(config, state).unwrap();
        simulation.handle_pointer_move(Some(Vector2D::new(9.0, 1.0)));

        simulation.run(10);

        assert_eq!(simulation.tick_count(), 10);
        let position = simulation.positions()[0];
        assert!(position.x > 1.0);
        assert!((position.y - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_simulation_rejects_mismatched_state() {
        let positions = [Vector2D::zero(), Vector2D::new(1.0, 0.0)];
        let state = state_at(&config_with(2), &positions);
        let err = Simulation::with_state(config_with(3), state).unwrap_err();
        assert_eq!(
            err,
            ConfigError::AgentCountMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidParameter {
            name: "force_goal",
            value: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "force_goal must be finite and positive, got -1"
        );
    }
}
