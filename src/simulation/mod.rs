//! Standalone traffic signal simulation
//!
//! All core logic lives here and runs headless: the clock, car kinematics,
//! Poisson arrivals, the signal controller, and run metrics. A rendering
//! layer only ever reads this state and issues the control intents exposed
//! by [`SimWorld`].

mod baseline;
mod car;
mod clock;
mod config;
mod metrics;
mod signal;
mod spawner;
mod types;
mod world;

pub use baseline::FixedBaseline;
pub use car::SimCar;
pub use clock::SimClock;
pub use config::SimConfig;
pub use metrics::MetricsCollector;
pub use signal::{SignalController, SwitchPhase};
pub use spawner::CarSpawner;
pub use types::{ControlMode, Direction, Road, SignalState};
pub use world::SimWorld;
