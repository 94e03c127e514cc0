use crate::simulation::{Color, EdgeId, LaneChangeMode, SignalState, VehicleId};
use thiserror::Error;

pub mod memory;

pub use memory::*;

/// Faults reported by the simulator's control interface.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("vehicle `{0}` is not known to the simulator")]
    UnknownVehicle(VehicleId),
    #[error("traffic light `{0}` is not known to the simulator")]
    UnknownSignal(String),
    #[error("simulator command failed: {0}")]
    Command(String),
}

/// Remote-control surface of the external microscopic simulator.
///
/// Location queries return `Ok(None)` when the simulator cannot place the
/// vehicle this step (departed, teleporting); callers treat that as "not
/// observed" rather than as a fault.
pub trait Simulator {
    fn vehicle_ids(&self) -> Result<Vec<VehicleId>, SimError>;
    fn edge(&self, id: &VehicleId) -> Result<Option<EdgeId>, SimError>;
    fn lane(&self, id: &VehicleId) -> Result<Option<usize>, SimError>;
    /// Distance from the start of the vehicle's current edge.
    fn position(&self, id: &VehicleId) -> Result<Option<f64>, SimError>;
    fn lane_change_mode(&self, id: &VehicleId) -> Result<LaneChangeMode, SimError>;
    fn color(&self, id: &VehicleId) -> Result<Color, SimError>;
    fn set_lane_change_mode(&mut self, id: &VehicleId, mode: LaneChangeMode) -> Result<(), SimError>;
    fn set_color(&mut self, id: &VehicleId, color: Color) -> Result<(), SimError>;
    fn set_signal_state(&mut self, signal_id: &str, state: &SignalState) -> Result<(), SimError>;
    /// Simulated seconds per step.
    fn step_length(&self) -> f64;
}
