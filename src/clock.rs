//! Periodic clock refresh: a fixed-cadence timer that samples a time source
//! and pushes each reading to display subscribers.

pub mod config;
pub mod controller;
pub mod sample;
pub mod simulator;
pub mod source;
pub mod subscriber;

pub use config::{ClockConfig, SimulationConfig};
pub use controller::{ControllerError, ControllerState, Handle, PeriodicDisplayController};
pub use sample::ClockSample;
pub use simulator::SimulatedTimeSource;
pub use source::{SystemTimeSource, TimeSource};
pub use subscriber::{DisplayCell, Subscriber};
