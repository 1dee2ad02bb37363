//! Traffic Signal Simulation Library
//!
//! Simulates vehicle flow through a single four-way intersection and compares
//! a fixed-timer signal cycle against an adaptive pressure-based controller.

pub mod simulation;
