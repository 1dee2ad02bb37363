//! Signal controller state machine
//!
//! Owns the intersection's two signal aspects and runs either a fixed
//! repeating cycle or an adaptive pressure-driven decision loop. Switches
//! always run an uninterruptible yellow, all-red, grant-green sequence, so
//! both roads are never green at the same time.

use std::collections::VecDeque;

use log::debug;

use super::car::SimCar;
use super::config::SimConfig;
use super::types::{ControlMode, Road, SignalState};

/// Arrival timestamps retained per road for rate estimation.
const ARRIVAL_HISTORY_CAP: usize = 200;

/// Window over which the arrival rate is estimated, in simulation seconds.
const ARRIVAL_RATE_WINDOW: f32 = 10.0;

/// Average wait saturates the pressure term at this many seconds.
const WAIT_NORMALIZATION: f32 = 60.0;

/// Sub-phase of an in-flight signal switch.
///
/// Once a switch starts it always runs yellow, then all-red, then grants
/// the new green, regardless of pressure readings arriving mid-sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwitchPhase {
    /// No switch in progress.
    Idle,
    /// The road that held green shows yellow.
    Yellow { started: f32 },
    /// Both roads held red to clear the intersection.
    AllRed { started: f32 },
    /// The waiting road receives green on the next update.
    GrantGreen { started: f32 },
}

/// Traffic signal controller for the single intersection.
#[derive(Debug)]
pub struct SignalController {
    mode: ControlMode,
    config: SimConfig,

    main_signal: SignalState,
    side_signal: SignalState,

    /// Total simulation time since this controller was created.
    signal_timer: f32,
    /// Duration of the present green phase.
    current_green_time: f32,
    last_decision_time: f32,
    last_switch_time: f32,

    main_last_green: f32,
    side_last_green: f32,

    switch_phase: SwitchPhase,

    main_arrivals: VecDeque<f32>,
    side_arrivals: VecDeque<f32>,
}

impl SignalController {
    /// Build a controller seeded to the run's start time. The cooldown is
    /// pre-satisfied so the first adaptive decision is not delayed.
    pub fn new(mode: ControlMode, config: SimConfig, start_time: f32) -> Self {
        Self {
            mode,
            main_signal: SignalState::Green,
            side_signal: SignalState::Red,
            signal_timer: 0.0,
            current_green_time: 0.0,
            last_decision_time: start_time,
            last_switch_time: start_time - config.cooldown_time,
            main_last_green: start_time,
            side_last_green: start_time,
            switch_phase: SwitchPhase::Idle,
            main_arrivals: VecDeque::with_capacity(ARRIVAL_HISTORY_CAP),
            side_arrivals: VecDeque::with_capacity(ARRIVAL_HISTORY_CAP),
            config,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Current aspect shown to the given road.
    pub fn state(&self, road: Road) -> SignalState {
        match road {
            Road::Main => self.main_signal,
            Road::Side => self.side_signal,
        }
    }

    pub fn switch_phase(&self) -> SwitchPhase {
        self.switch_phase
    }

    /// The road currently holding green, if either does.
    pub fn active_road(&self) -> Option<Road> {
        if self.main_signal == SignalState::Green {
            Some(Road::Main)
        } else if self.side_signal == SignalState::Green {
            Some(Road::Side)
        } else {
            None
        }
    }

    /// Record a car arriving on a road. The history is a bounded FIFO.
    pub fn record_arrival(&mut self, road: Road, sim_time: f32) {
        let history = match road {
            Road::Main => &mut self.main_arrivals,
            Road::Side => &mut self.side_arrivals,
        };
        if history.len() == ARRIVAL_HISTORY_CAP {
            history.pop_front();
        }
        history.push_back(sim_time);
    }

    /// Advance the controller by one tick against the current live cars.
    pub fn update(&mut self, cars: &[SimCar], dt_sim: f32, sim_time: f32) {
        self.signal_timer += dt_sim;
        self.current_green_time += dt_sim;

        match self.mode {
            ControlMode::Fixed => self.update_fixed(),
            ControlMode::Adaptive => self.update_adaptive(cars, sim_time),
        }
    }

    /// Fixed mode: the phase is fully determined by the timer position
    /// within the repeating cycle, so the schedule reproduces exactly from
    /// elapsed simulation time alone.
    fn update_fixed(&mut self) {
        let green = self.config.fixed_green_time;
        let yellow = self.config.yellow_time;
        let all_red = self.config.all_red_time;
        let pos = self.signal_timer % self.config.fixed_cycle_length();

        if pos < green {
            self.main_signal = SignalState::Green;
            self.side_signal = SignalState::Red;
        } else if pos < green + yellow {
            self.main_signal = SignalState::Yellow;
            self.side_signal = SignalState::Red;
        } else if pos < green + yellow + all_red {
            self.main_signal = SignalState::AllRed;
            self.side_signal = SignalState::AllRed;
        } else if pos < 2.0 * green + yellow + all_red {
            self.main_signal = SignalState::Red;
            self.side_signal = SignalState::Green;
        } else if pos < 2.0 * green + 2.0 * yellow + all_red {
            self.main_signal = SignalState::Red;
            self.side_signal = SignalState::Yellow;
        } else {
            self.main_signal = SignalState::AllRed;
            self.side_signal = SignalState::AllRed;
        }
    }

    fn update_adaptive(&mut self, cars: &[SimCar], sim_time: f32) {
        // Mid-switch the sub-machine runs exclusively.
        if self.switch_phase != SwitchPhase::Idle {
            self.advance_switch(sim_time);
            return;
        }

        if sim_time - self.last_decision_time >= self.config.decision_interval {
            self.decide(cars, sim_time);
            self.last_decision_time = sim_time;
        }

        // Anti-starvation runs every tick, independent of the decision gate.
        let active = self.active_road().unwrap_or(Road::Main);
        let waiting = active.other();
        let waiting_since = sim_time - self.last_green(waiting);

        if waiting_since > self.config.anti_starvation_time
            && self.current_green_time > self.config.min_green_time
        {
            debug!(
                "anti-starvation: {:?} unserved for {:.1}s, forcing switch",
                waiting, waiting_since
            );
            self.initiate_switch(sim_time);
        }
    }

    /// One pass of the adaptive decision loop: compare the waiting road's
    /// pressure against the active road's, subject to minimum green,
    /// cooldown, and the hysteresis margin; or cut over unconditionally at
    /// the maximum green duration.
    fn decide(&mut self, cars: &[SimCar], sim_time: f32) {
        let main_pressure = self.pressure(cars, Road::Main, sim_time);
        let side_pressure = self.pressure(cars, Road::Side, sim_time);

        let active_is_main = self.main_signal == SignalState::Green;
        let (active_pressure, waiting_pressure) = if active_is_main {
            (main_pressure, side_pressure)
        } else {
            (side_pressure, main_pressure)
        };

        let mut should_switch = false;

        if self.current_green_time >= self.config.min_green_time
            && sim_time - self.last_switch_time >= self.config.cooldown_time
            && waiting_pressure > active_pressure + self.config.hysteresis_margin
        {
            should_switch = true;
        }

        if self.current_green_time >= self.config.max_green_time {
            should_switch = true;
        }

        if should_switch {
            debug!(
                "switching at t={:.1}s (main pressure {:.2}, side pressure {:.2})",
                sim_time, main_pressure, side_pressure
            );
            self.initiate_switch(sim_time);
        }
    }

    /// Begin the switch sequence: stamp the green road's last-green time,
    /// start the cooldown, and enter the yellow phase.
    pub fn initiate_switch(&mut self, sim_time: f32) {
        self.last_switch_time = sim_time;
        match self.active_road() {
            Some(Road::Main) => self.main_last_green = sim_time,
            Some(Road::Side) => self.side_last_green = sim_time,
            None => {}
        }
        self.current_green_time = 0.0;
        self.switch_phase = SwitchPhase::Yellow { started: sim_time };
    }

    fn advance_switch(&mut self, sim_time: f32) {
        match self.switch_phase {
            SwitchPhase::Idle => {}
            SwitchPhase::Yellow { started } => {
                if self.main_signal == SignalState::Green {
                    self.main_signal = SignalState::Yellow;
                } else if self.side_signal == SignalState::Green {
                    self.side_signal = SignalState::Yellow;
                }
                if sim_time - started >= self.config.yellow_time {
                    self.switch_phase = SwitchPhase::AllRed { started: sim_time };
                }
            }
            SwitchPhase::AllRed { started } => {
                self.main_signal = SignalState::AllRed;
                self.side_signal = SignalState::AllRed;
                if sim_time - started >= self.config.all_red_time {
                    self.switch_phase = SwitchPhase::GrantGreen { started: sim_time };
                }
            }
            SwitchPhase::GrantGreen { .. } => {
                // The road that has waited longest since its last green
                // receives the new green.
                if self.side_last_green < self.main_last_green {
                    self.side_signal = SignalState::Green;
                    self.main_signal = SignalState::Red;
                } else {
                    self.main_signal = SignalState::Green;
                    self.side_signal = SignalState::Red;
                }
                self.switch_phase = SwitchPhase::Idle;
                self.current_green_time = 0.0;
            }
        }
    }

    fn last_green(&self, road: Road) -> f32 {
        match road {
            Road::Main => self.main_last_green,
            Road::Side => self.side_last_green,
        }
    }

    /// Heuristic priority score for a road, combining queue length, recent
    /// arrival rate, and normalized average wait. Only relative comparison
    /// against the other road is meaningful.
    pub fn pressure(&self, cars: &[SimCar], road: Road, sim_time: f32) -> f32 {
        let queue = self.queue_length(cars, road) as f32;
        let rate = self.arrival_rate(road, sim_time);
        let wait = (self.average_wait(cars, road) / WAIT_NORMALIZATION).min(1.0);
        queue + self.config.pressure_alpha * rate * 10.0 + self.config.pressure_beta * wait * 10.0
    }

    /// Cars on the road currently stopped near the intersection center.
    pub fn queue_length(&self, cars: &[SimCar], road: Road) -> usize {
        let (cx, cy) = self.config.center();
        let band = self.config.lane_width * 1.5;
        cars.iter()
            .filter(|car| car.direction.road() == road && car.is_stopped)
            .filter(|car| match road {
                Road::Main => (car.x - cx).abs() < band,
                Road::Side => (car.y - cy).abs() < band,
            })
            .count()
    }

    /// Arrivals per second over the recent rate window. Zero until the
    /// history holds at least two entries.
    fn arrival_rate(&self, road: Road, sim_time: f32) -> f32 {
        let history = match road {
            Road::Main => &self.main_arrivals,
            Road::Side => &self.side_arrivals,
        };
        if history.len() < 2 {
            return 0.0;
        }
        let recent = history
            .iter()
            .filter(|&&t| sim_time - t < ARRIVAL_RATE_WINDOW)
            .count();
        recent as f32 / ARRIVAL_RATE_WINDOW
    }

    /// Mean accumulated wait of all the road's cars within the capture
    /// band, stopped or not. Zero when none qualify.
    fn average_wait(&self, cars: &[SimCar], road: Road) -> f32 {
        let (cx, cy) = self.config.center();
        let band = self.config.lane_width * 2.0;
        let waits: Vec<f32> = cars
            .iter()
            .filter(|car| car.direction.road() == road)
            .filter(|car| match road {
                Road::Main => (car.x - cx).abs() < band,
                Road::Side => (car.y - cy).abs() < band,
            })
            .map(|car| car.waiting_time)
            .collect();
        if waits.is_empty() {
            0.0
        } else {
            waits.iter().sum::<f32>() / waits.len() as f32
        }
    }

    /// For the display overlay: in fixed mode, seconds until the next phase
    /// boundary; in adaptive mode, the current green duration.
    pub fn time_remaining(&self) -> f32 {
        match self.mode {
            ControlMode::Adaptive => self.current_green_time,
            ControlMode::Fixed => {
                let green = self.config.fixed_green_time;
                let yellow = self.config.yellow_time;
                let all_red = self.config.all_red_time;
                let cycle = self.config.fixed_cycle_length();
                let pos = self.signal_timer % cycle;

                let boundaries = [
                    green,
                    green + yellow,
                    green + yellow + all_red,
                    2.0 * green + yellow + all_red,
                    2.0 * green + 2.0 * yellow + all_red,
                    cycle,
                ];
                boundaries
                    .iter()
                    .find(|&&b| pos < b)
                    .map(|&b| b - pos)
                    .unwrap_or(0.0)
            }
        }
    }
}
