//! Core types for the traffic signal simulation
//!
//! These are standalone types with no dependency on any UI layer.

/// Travel direction of a vehicle. Immutable after spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// The logical road this direction travels on.
    pub fn road(self) -> Road {
        match self {
            Direction::North | Direction::South => Road::Main,
            Direction::East | Direction::West => Road::Side,
        }
    }
}

/// One of the two logical roads through the intersection.
///
/// Main runs north-south, side runs east-west. Each road shows a single
/// signal aspect shared by both of its directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Road {
    Main,
    Side,
}

impl Road {
    /// The opposing road at the intersection.
    pub fn other(self) -> Road {
        match self {
            Road::Main => Road::Side,
            Road::Side => Road::Main,
        }
    }
}

/// Signal aspect shown to one road.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Green,
    Yellow,
    Red,
    /// Both roads held red during the clearance interval of a switch.
    AllRed,
}

/// Which strategy drives the signal controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Deterministic repeating cycle built from configured phase durations.
    Fixed,
    /// Pressure-driven decision loop with hysteresis and anti-starvation.
    Adaptive,
}
