//! Simulation configuration
//!
//! Every tunable constant lives in one immutable struct that is handed to
//! each component at construction. Runs never read hidden global state, so
//! tests can build isolated worlds with their own timing and geometry.

use anyhow::{bail, Result};
use std::path::PathBuf;

/// Immutable configuration shared by the clock, spawner, cars, and
/// signal controller.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Simulation area width in world units (pixels).
    pub window_width: f32,
    /// Simulation area height in world units (pixels).
    pub window_height: f32,
    /// Width of a single lane.
    pub lane_width: f32,
    /// Side length of the square intersection box at the center.
    pub intersection_size: f32,

    /// Nominal frame rate the kinematic constants are tuned against.
    /// Per-frame constants are rescaled by `dt_sim * fps` each step.
    pub fps: f32,
    /// Top speed of a car, in units per frame at the nominal frame rate.
    pub car_max_speed: f32,
    /// Cruising acceleration per frame. Braking applies twice this value.
    pub car_acceleration: f32,
    /// Following distance below which a car brakes for the car ahead.
    pub safe_distance: f32,
    /// Half-width of the stop-line window that triggers signal compliance.
    /// Must cover at least one integration step at max speed.
    pub stop_band: f32,
    /// How far past the window edge a car must travel before retirement.
    pub offscreen_margin: f32,

    /// Baseline spawn probability per frame, converted to a per-second
    /// Poisson rate internally.
    pub base_spawn_rate: f32,
    /// Arrival rate multiplier for the main (north-south) road.
    pub main_road_multiplier: f32,
    /// Arrival rate multiplier for the side (east-west) road.
    pub side_road_multiplier: f32,
    /// Chance that a spawned car is an emergency vehicle while emergency
    /// mode is active.
    pub emergency_probability: f32,

    /// Fixed-mode green duration in seconds.
    pub fixed_green_time: f32,
    /// Yellow duration in seconds, shared by both control modes.
    pub yellow_time: f32,
    /// All-red clearance duration in seconds, shared by both control modes.
    pub all_red_time: f32,

    /// Minimum simulation time between adaptive decisions.
    pub decision_interval: f32,
    /// A green phase may not be cut short of this duration.
    pub min_green_time: f32,
    /// A green phase never exceeds this duration.
    pub max_green_time: f32,
    /// Minimum time between two switches.
    pub cooldown_time: f32,
    /// A road left unserved this long forces a switch.
    pub anti_starvation_time: f32,
    /// Arrival-rate weight in the pressure score.
    pub pressure_alpha: f32,
    /// Wait-time weight in the pressure score.
    pub pressure_beta: f32,
    /// Waiting pressure must beat active pressure by this margin to switch.
    pub hysteresis_margin: f32,

    /// Max-speed cap applied to non-emergency cars inside the incident zone.
    pub incident_speed_cap: f32,

    /// Where the fixed-mode baseline snapshot is persisted.
    pub baseline_path: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            window_width: 1200.0,
            window_height: 800.0,
            lane_width: 40.0,
            intersection_size: 200.0,

            fps: 60.0,
            car_max_speed: 4.0,
            car_acceleration: 0.10,
            safe_distance: 35.0,
            stop_band: 50.0,
            offscreen_margin: 100.0,

            base_spawn_rate: 0.02,
            main_road_multiplier: 1.5,
            side_road_multiplier: 1.0,
            emergency_probability: 0.10,

            fixed_green_time: 20.0,
            yellow_time: 3.0,
            all_red_time: 2.0,

            decision_interval: 2.0,
            min_green_time: 12.0,
            max_green_time: 50.0,
            cooldown_time: 6.0,
            anti_starvation_time: 120.0,
            pressure_alpha: 0.3,
            pressure_beta: 0.4,
            hysteresis_margin: 0.5,

            incident_speed_cap: 1.5,

            baseline_path: PathBuf::from("fixed_metrics.json"),
        }
    }
}

impl SimConfig {
    /// Center of the intersection.
    pub fn center(&self) -> (f32, f32) {
        (self.window_width / 2.0, self.window_height / 2.0)
    }

    /// Length of one full fixed-mode cycle:
    /// green, yellow, and all-red for each of the two roads.
    pub fn fixed_cycle_length(&self) -> f32 {
        2.0 * (self.fixed_green_time + self.yellow_time + self.all_red_time)
    }

    /// Reject configurations that cannot drive a well-formed run.
    /// Called once before a run starts; a failure here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.window_width <= 0.0 || self.window_height <= 0.0 {
            bail!("window dimensions must be positive");
        }
        if self.fps <= 0.0 {
            bail!("nominal fps must be positive");
        }
        if self.car_max_speed <= 0.0 || self.car_acceleration <= 0.0 {
            bail!("car speed and acceleration must be positive");
        }
        if self.fixed_green_time <= 0.0 || self.yellow_time <= 0.0 || self.all_red_time <= 0.0 {
            bail!("signal phase durations must be positive");
        }
        if self.min_green_time <= 0.0 {
            bail!("minimum green time must be positive");
        }
        if self.min_green_time >= self.max_green_time {
            bail!(
                "minimum green time ({}) must be less than maximum green time ({})",
                self.min_green_time,
                self.max_green_time
            );
        }
        if self.decision_interval <= 0.0 {
            bail!("decision interval must be positive");
        }
        if self.cooldown_time < 0.0 || self.anti_starvation_time <= 0.0 {
            bail!("cooldown and anti-starvation times must be non-negative");
        }
        if self.base_spawn_rate < 0.0 {
            bail!("spawn rate must be non-negative");
        }
        if !(0.0..=1.0).contains(&self.emergency_probability) {
            bail!("emergency probability must be within [0, 1]");
        }
        Ok(())
    }
}
