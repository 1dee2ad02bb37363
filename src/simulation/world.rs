//! Main simulation world that ties everything together
//!
//! Owns the car set, spawner, signal controller, metrics, and clock, and
//! advances them in a fixed order once per tick: clock, arrivals, car
//! updates, retirement, then the controller. The car set is only mutated
//! at tick boundaries.

use anyhow::Result;
use log::info;

use super::baseline::FixedBaseline;
use super::car::SimCar;
use super::clock::SimClock;
use super::config::SimConfig;
use super::metrics::MetricsCollector;
use super::signal::SignalController;
use super::spawner::CarSpawner;
use super::types::{ControlMode, Road, SignalState};

/// Incident zone offset from the intersection center, and its extent.
const INCIDENT_OFFSET_X: f32 = 20.0;
const INCIDENT_OFFSET_Y: f32 = -60.0;
const INCIDENT_WIDTH: f32 = 40.0;
const INCIDENT_HEIGHT: f32 = 30.0;

/// Leniency added around the incident zone when testing containment.
const INCIDENT_EXPAND: f32 = 30.0;

/// Minimum exits before an adaptive run reports improvement vs baseline.
const COMPARISON_MIN_EXITS: u32 = 10;

/// The complete simulation state for one intersection.
pub struct SimWorld {
    pub config: SimConfig,
    clock: SimClock,
    pub cars: Vec<SimCar>,
    spawner: CarSpawner,
    pub signal: SignalController,
    pub metrics: MetricsCollector,
    incident_active: bool,
}

impl SimWorld {
    /// Build a world and start a run in the given mode. Fails if the
    /// configuration cannot drive a well-formed run.
    pub fn new(mode: ControlMode, config: SimConfig) -> Result<Self> {
        Self::new_internal(mode, config, CarSpawner::new())
    }

    /// Build a world with a seeded arrival process so runs reproduce
    /// exactly given the same tick sequence.
    pub fn new_with_seed(mode: ControlMode, config: SimConfig, seed: u64) -> Result<Self> {
        Self::new_internal(mode, config, CarSpawner::new_with_seed(seed))
    }

    fn new_internal(mode: ControlMode, config: SimConfig, spawner: CarSpawner) -> Result<Self> {
        config.validate()?;
        let clock = SimClock::new();
        let signal = SignalController::new(mode, config.clone(), clock.sim_time());
        let metrics = MetricsCollector::new(clock.sim_time());
        Ok(Self {
            config,
            clock,
            cars: Vec::new(),
            spawner,
            signal,
            metrics,
            incident_active: false,
        })
    }

    /// Advance the simulation by one tick of real time.
    pub fn tick(&mut self, dt_real: f32) {
        let dt_sim = self.clock.advance(dt_real);
        let sim_time = self.clock.sim_time();

        for car in self.spawner.spawn(dt_sim, sim_time, &self.config) {
            self.metrics.record_spawn();
            self.signal.record_arrival(car.direction.road(), sim_time);
            self.cars.push(car);
        }

        self.update_cars(dt_sim);
        self.retire_cars(sim_time);

        self.signal.update(&self.cars, dt_sim, sim_time);
    }

    /// Update every car in spawn order. Each car is taken out of the set
    /// while it updates so it sees every other car, including those already
    /// moved this tick, matching sequential in-place stepping.
    fn update_cars(&mut self, dt_sim: f32) {
        for i in 0..self.cars.len() {
            let mut car = self.cars.remove(i);

            // The incident override is applied fresh each tick, before the
            // kinematics run, and restored otherwise.
            car.max_speed = self.config.car_max_speed;
            if self.incident_active && !car.is_emergency && self.in_incident_zone(car.x, car.y) {
                car.max_speed = car.max_speed.min(self.config.incident_speed_cap);
            }

            car.update(&self.cars, &self.signal, &self.config, dt_sim);
            self.cars.insert(i, car);
        }
    }

    /// Retire cars that have left the simulation area into the metrics.
    fn retire_cars(&mut self, sim_time: f32) {
        let mut i = 0;
        while i < self.cars.len() {
            if self.cars[i].is_off_screen(&self.config) {
                let mut car = self.cars.remove(i);
                self.metrics.record_exit(&mut car, sim_time);
            } else {
                i += 1;
            }
        }
    }

    /// Whether a point falls inside the incident slow-down zone,
    /// including its leniency band.
    fn in_incident_zone(&self, x: f32, y: f32) -> bool {
        let (cx, cy) = self.config.center();
        let half = INCIDENT_EXPAND / 2.0;
        let x0 = cx + INCIDENT_OFFSET_X - half;
        let y0 = cy + INCIDENT_OFFSET_Y - half;
        let x1 = cx + INCIDENT_OFFSET_X + INCIDENT_WIDTH + half;
        let y1 = cy + INCIDENT_OFFSET_Y + INCIDENT_HEIGHT + half;
        x >= x0 && x <= x1 && y >= y0 && y <= y1
    }

    /// Begin a fresh run: reset the controller and metrics to the current
    /// simulation time and clear the road.
    pub fn start_run(&mut self, mode: ControlMode) {
        let sim_time = self.clock.sim_time();
        info!("starting {:?} run at t={:.1}s", mode, sim_time);
        self.signal = SignalController::new(mode, self.config.clone(), sim_time);
        self.metrics.reset(sim_time);
        self.cars.clear();
        self.incident_active = false;
        self.spawner.set_emergency_mode(false);
    }

    /// Finish the current run. Fixed-mode results are persisted as the
    /// comparison baseline for later adaptive runs.
    pub fn end_run(&mut self) -> Result<FixedBaseline> {
        let snapshot = self.snapshot();
        if self.signal.mode() == ControlMode::Fixed {
            snapshot.save(&self.config.baseline_path)?;
            info!(
                "saved fixed baseline to {} (avg wait {:.1}s)",
                self.config.baseline_path.display(),
                snapshot.avg_wait_time
            );
        }
        Ok(snapshot)
    }

    /// Snapshot of the current run's headline metrics.
    pub fn snapshot(&self) -> FixedBaseline {
        let sim_time = self.clock.sim_time();
        FixedBaseline {
            avg_wait_time: self.metrics.average_wait(),
            throughput: self.metrics.throughput_per_minute(sim_time),
            total_cars: self.metrics.total_exited,
            simulation_time: self.metrics.elapsed(sim_time),
        }
    }

    /// Improvement of this adaptive run over the persisted fixed baseline,
    /// once enough cars have exited to make the comparison meaningful.
    pub fn improvement_vs_baseline(&self) -> Option<f32> {
        if self.signal.mode() != ControlMode::Adaptive
            || self.metrics.total_exited <= COMPARISON_MIN_EXITS
        {
            return None;
        }
        FixedBaseline::load(&self.config.baseline_path)?
            .improvement_over(self.metrics.average_wait())
    }

    pub fn toggle_speed(&mut self) {
        self.clock.toggle_speed();
        info!("speed multiplier now {:.1}x", self.clock.speed_multiplier());
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.clock.set_speed_multiplier(multiplier);
    }

    pub fn toggle_incident(&mut self) {
        self.incident_active = !self.incident_active;
        info!("incident {}", if self.incident_active { "active" } else { "cleared" });
    }

    pub fn toggle_emergency_mode(&mut self) {
        let enabled = !self.spawner.emergency_mode();
        self.spawner.set_emergency_mode(enabled);
        info!("emergency spawn mode {}", if enabled { "on" } else { "off" });
    }

    pub fn incident_active(&self) -> bool {
        self.incident_active
    }

    pub fn sim_time(&self) -> f32 {
        self.clock.sim_time()
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.clock.speed_multiplier()
    }

    /// One-line run summary for the console printer.
    pub fn summary(&self) -> String {
        let sim_time = self.clock.sim_time();
        let active = match self.signal.active_road() {
            Some(Road::Main) => "main",
            Some(Road::Side) => "side",
            None => "switching",
        };
        let mut line = format!(
            "t={:.1}s | mode {:?} | active {} ({:.1}s) | queues main {} / side {} | \
             avg wait {:.1}s | throughput {}/min | cars {} active, {} exited",
            self.metrics.elapsed(sim_time),
            self.signal.mode(),
            active,
            self.signal.time_remaining(),
            self.signal.queue_length(&self.cars, Road::Main),
            self.signal.queue_length(&self.cars, Road::Side),
            self.metrics.average_wait(),
            self.metrics.throughput_per_minute(sim_time),
            self.cars.len(),
            self.metrics.total_exited,
        );
        if self.clock.speed_multiplier() > 1.0 {
            line.push_str(" | FAST");
        }
        if self.incident_active {
            line.push_str(" | INCIDENT");
        }
        line
    }

    /// Invariant check used by tests: both roads green is forbidden.
    pub fn signals_mutually_exclusive(&self) -> bool {
        !(self.signal.state(Road::Main) == SignalState::Green
            && self.signal.state(Road::Side) == SignalState::Green)
    }
}
