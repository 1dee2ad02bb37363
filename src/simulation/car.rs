//! Car kinematics for the traffic signal simulation
//!
//! Each car is a point mass moving along a single axis. Per step it brakes
//! for a non-green signal at its stop line or for a car ahead in its lane,
//! and otherwise accelerates toward its max speed.

use ordered_float::OrderedFloat;

use super::config::SimConfig;
use super::signal::SignalController;
use super::types::{Direction, SignalState};

/// A car is considered stopped below this speed.
const STOP_SPEED_EPSILON: f32 = 1e-3;

/// Positional change below this counts as stationary for wait accounting.
const MOVE_EPSILON: f32 = 1e-3;

/// A single vehicle in the simulation.
#[derive(Debug, Clone)]
pub struct SimCar {
    pub x: f32,
    pub y: f32,
    /// Travel direction. Never changes after spawn.
    pub direction: Direction,
    pub speed: f32,
    /// Current speed ceiling. Restored to the configured max each tick and
    /// may be capped by the incident override before the update runs.
    pub max_speed: f32,
    /// Emergency vehicles never stop for a signal.
    pub is_emergency: bool,
    /// Simulation time at spawn.
    pub spawn_time: f32,
    /// Accumulated seconds spent fully stopped. Never decreases.
    pub waiting_time: f32,
    pub is_stopped: bool,
    /// Simulation time at retirement, set once by the metrics collector.
    pub exit_time: Option<f32>,
}

impl SimCar {
    pub fn new(
        x: f32,
        y: f32,
        direction: Direction,
        is_emergency: bool,
        spawn_time: f32,
        config: &SimConfig,
    ) -> Self {
        Self {
            x,
            y,
            direction,
            speed: 0.0,
            max_speed: config.car_max_speed,
            is_emergency,
            spawn_time,
            waiting_time: 0.0,
            is_stopped: false,
            exit_time: None,
        }
    }

    /// Advance this car by one step against the other live cars.
    ///
    /// `others` must not contain this car itself; the world removes the car
    /// from the set before updating it and reinserts it afterwards, so each
    /// car sees the already-updated positions of cars processed before it.
    pub fn update(
        &mut self,
        others: &[SimCar],
        signal: &SignalController,
        config: &SimConfig,
        dt_sim: f32,
    ) {
        // Kinematic constants are tuned per frame at the nominal fps.
        let step_scale = dt_sim * config.fps;

        let (old_x, old_y) = (self.x, self.y);

        let should_stop = !self.is_emergency && self.should_stop_at_signal(signal, config);
        let blocked = self.gap_to_car_ahead(others, config).is_some();

        if should_stop || blocked {
            // Brake harder than we accelerate to model hard stops.
            self.speed = (self.speed - config.car_acceleration * 2.0 * step_scale).max(0.0);
            self.is_stopped = self.speed <= STOP_SPEED_EPSILON;
        } else {
            self.speed = (self.speed + config.car_acceleration * step_scale).min(self.max_speed);
            self.is_stopped = false;
        }

        let delta = self.speed * step_scale;
        match self.direction {
            Direction::North => self.y -= delta,
            Direction::South => self.y += delta,
            Direction::East => self.x += delta,
            Direction::West => self.x -= delta,
        }

        // Only count waiting while actually stationary, not while braking.
        if self.is_stopped
            && (self.x - old_x).abs() < MOVE_EPSILON
            && (self.y - old_y).abs() < MOVE_EPSILON
        {
            self.waiting_time += dt_sim;
        }
    }

    /// Whether the car is inside the stop-line window of its approach and
    /// the governing road's signal is not green.
    fn should_stop_at_signal(&self, signal: &SignalController, config: &SimConfig) -> bool {
        let (cx, cy) = config.center();
        let half = config.intersection_size / 2.0;

        let (position, stop_line) = match self.direction {
            Direction::North => (self.y, cy + half),
            Direction::South => (self.y, cy - half),
            Direction::East => (self.x, cx - half),
            Direction::West => (self.x, cx + half),
        };

        if (stop_line - config.stop_band) < position && position < (stop_line + config.stop_band) {
            signal.state(self.direction.road()) != SignalState::Green
        } else {
            false
        }
    }

    /// Distance to the nearest car ahead in the same lane, if one is within
    /// the safe-following window.
    fn gap_to_car_ahead(&self, others: &[SimCar], config: &SimConfig) -> Option<f32> {
        others
            .iter()
            .filter(|other| other.direction == self.direction)
            .filter_map(|other| {
                let (gap, lateral) = match self.direction {
                    Direction::North => (self.y - other.y, (other.x - self.x).abs()),
                    Direction::South => (other.y - self.y, (other.x - self.x).abs()),
                    Direction::East => (other.x - self.x, (other.y - self.y).abs()),
                    Direction::West => (self.x - other.x, (other.y - self.y).abs()),
                };
                (lateral < config.lane_width && gap > 0.0 && gap < config.safe_distance)
                    .then_some(gap)
            })
            .min_by_key(|gap| OrderedFloat(*gap))
    }

    /// True once the car has left the simulation area by the retirement
    /// margin on any side.
    pub fn is_off_screen(&self, config: &SimConfig) -> bool {
        let margin = config.offscreen_margin;
        self.x < -margin
            || self.x > config.window_width + margin
            || self.y < -margin
            || self.y > config.window_height + margin
    }
}
