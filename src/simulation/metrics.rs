//! Run metrics
//!
//! Tracks spawn and exit counts, cumulative wait time, and a sliding
//! throughput window for the current run. Reset whenever a new run starts.

use std::collections::VecDeque;

use super::car::SimCar;

/// Exit timestamps retained for throughput estimation.
const EXIT_HISTORY_CAP: usize = 400;

/// Window over which throughput is counted, in simulation seconds.
const THROUGHPUT_WINDOW: f32 = 60.0;

/// Collects per-run statistics used to compare control strategies.
#[derive(Debug)]
pub struct MetricsCollector {
    pub total_spawned: u32,
    pub total_exited: u32,
    total_wait_time: f32,
    run_start_time: f32,
    exit_history: VecDeque<f32>,
}

impl MetricsCollector {
    pub fn new(start_sim_time: f32) -> Self {
        Self {
            total_spawned: 0,
            total_exited: 0,
            total_wait_time: 0.0,
            run_start_time: start_sim_time,
            exit_history: VecDeque::with_capacity(EXIT_HISTORY_CAP),
        }
    }

    /// Clear all counters and re-seed the run start time.
    pub fn reset(&mut self, start_sim_time: f32) {
        *self = Self::new(start_sim_time);
    }

    pub fn record_spawn(&mut self) {
        self.total_spawned += 1;
    }

    /// Retire a car: stamp its exit time and fold its final waiting time
    /// into the cumulative total.
    pub fn record_exit(&mut self, car: &mut SimCar, sim_time: f32) {
        self.total_exited += 1;
        self.total_wait_time += car.waiting_time;
        car.exit_time = Some(sim_time);
        if self.exit_history.len() == EXIT_HISTORY_CAP {
            self.exit_history.pop_front();
        }
        self.exit_history.push_back(sim_time);
    }

    /// Mean wait across exited cars; zero before the first exit.
    pub fn average_wait(&self) -> f32 {
        if self.total_exited == 0 {
            0.0
        } else {
            self.total_wait_time / self.total_exited as f32
        }
    }

    /// Cars that exited within the last minute of simulation time.
    pub fn throughput_per_minute(&self, sim_time: f32) -> u32 {
        self.exit_history
            .iter()
            .filter(|&&t| sim_time - t < THROUGHPUT_WINDOW)
            .count() as u32
    }

    /// Simulation time elapsed since the run started.
    pub fn elapsed(&self, sim_time: f32) -> f32 {
        sim_time - self.run_start_time
    }
}
