//! Poisson arrival process
//!
//! Spawns cars at the edges of the simulation area on each of the two
//! roads using independent Poisson processes. Spawn probabilities are
//! derived from `dt_sim`, so arrival counts scale exactly with the speed
//! multiplier.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::car::SimCar;
use super::config::SimConfig;
use super::types::{Direction, Road};

/// How far outside the window edge new cars enter.
const SPAWN_OFFSET: f32 = 50.0;

/// Generates new cars on both roads each tick.
#[derive(Debug)]
pub struct CarSpawner {
    /// Seeded RNG for reproducible runs; falls back to the thread RNG.
    rng: Option<StdRng>,
    emergency_mode: bool,
}

impl Default for CarSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl CarSpawner {
    pub fn new() -> Self {
        Self {
            rng: None,
            emergency_mode: false,
        }
    }

    /// Create a spawner with a seeded RNG so arrival sequences reproduce
    /// exactly across runs.
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
            emergency_mode: false,
        }
    }

    /// Whether spawned cars may be flagged as emergency vehicles.
    pub fn emergency_mode(&self) -> bool {
        self.emergency_mode
    }

    pub fn set_emergency_mode(&mut self, enabled: bool) {
        self.emergency_mode = enabled;
    }

    fn random(&mut self) -> f32 {
        match &mut self.rng {
            Some(rng) => rng.random::<f32>(),
            None => rand::rng().random::<f32>(),
        }
    }

    /// Run both roads' arrival draws for one tick. Returns 0 to 2 new cars.
    pub fn spawn(&mut self, dt_sim: f32, sim_time: f32, config: &SimConfig) -> Vec<SimCar> {
        // Per-frame baseline rate converted to cars per second.
        let base_per_sec = config.base_spawn_rate * config.fps;

        let mut spawned = Vec::new();
        for road in [Road::Main, Road::Side] {
            let multiplier = match road {
                Road::Main => config.main_road_multiplier,
                Road::Side => config.side_road_multiplier,
            };
            let rate = base_per_sec * multiplier;

            // Probability of at least one Poisson arrival within dt_sim.
            let p = 1.0 - (-rate * dt_sim).exp();
            if self.random() < p {
                spawned.push(self.spawn_on_road(road, sim_time, config));
            }
        }
        spawned
    }

    fn spawn_on_road(&mut self, road: Road, sim_time: f32, config: &SimConfig) -> SimCar {
        let direction = match (road, self.random() < 0.5) {
            (Road::Main, true) => Direction::North,
            (Road::Main, false) => Direction::South,
            (Road::Side, true) => Direction::East,
            (Road::Side, false) => Direction::West,
        };

        let is_emergency = self.emergency_mode && self.random() < config.emergency_probability;

        let (cx, cy) = config.center();
        let half_lane = config.lane_width / 2.0;
        let (x, y) = match direction {
            Direction::North => (cx - half_lane, config.window_height + SPAWN_OFFSET),
            Direction::South => (cx + half_lane, -SPAWN_OFFSET),
            Direction::East => (-SPAWN_OFFSET, cy - half_lane),
            Direction::West => (config.window_width + SPAWN_OFFSET, cy + half_lane),
        };

        SimCar::new(x, y, direction, is_emergency, sim_time, config)
    }
}
