//! Simulation clock
//!
//! Decouples simulation seconds from the wall-clock stepping rate. Every
//! other component consumes time only through `dt_sim` and `sim_time`, so
//! doubling the speed multiplier exactly doubles arrivals and distances
//! traveled per wall-clock second.

/// Advances a monotonic simulation-time counter from real-time steps
/// scaled by a user-selected speed multiplier.
#[derive(Debug, Clone)]
pub struct SimClock {
    sim_time: f32,
    speed_multiplier: f32,
    dt_sim: f32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            sim_time: 0.0,
            speed_multiplier: 1.0,
            dt_sim: 0.0,
        }
    }

    /// Advance the clock by one real-time step and return the simulation
    /// time elapsed (`dt_real * multiplier`).
    pub fn advance(&mut self, dt_real: f32) -> f32 {
        self.dt_sim = dt_real * self.speed_multiplier;
        self.sim_time += self.dt_sim;
        self.dt_sim
    }

    /// Current simulation time in seconds. Monotonic across runs.
    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// Simulation time elapsed during the most recent step.
    pub fn dt_sim(&self) -> f32 {
        self.dt_sim
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier;
    }

    /// Flip between normal and double speed.
    pub fn toggle_speed(&mut self) {
        self.speed_multiplier = if self.speed_multiplier == 1.0 { 2.0 } else { 1.0 };
    }
}
