use super::{SimError, Simulator};
use crate::simulation::{Color, EdgeId, LaneChangeMode, SignalState, VehicleId};
use std::collections::{BTreeMap, HashMap};

/// Lane-change mode a freshly spawned vehicle carries.
pub const DEFAULT_LANE_CHANGE_MODE: LaneChangeMode = LaneChangeMode(1621);
pub const DEFAULT_COLOR: Color = Color::new(255, 255, 0, 255);

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub edge: EdgeId,
    pub lane: usize,
    pub position: f64,
    pub lane_change_mode: LaneChangeMode,
    pub color: Color,
}

/// A write issued through the control interface.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetLaneChangeMode { vehicle: VehicleId, mode: LaneChangeMode },
    SetColor { vehicle: VehicleId, color: Color },
    SetSignalState { signal_id: String, state: SignalState },
}

/// In-process simulator: vehicles are placed by the caller, every write is
/// applied and logged.
#[derive(Debug, Clone)]
pub struct MemorySimulator {
    step_length: f64,
    vehicles: BTreeMap<VehicleId, VehicleState>,
    signals: HashMap<String, SignalState>,
    commands: Vec<Command>,
}

impl MemorySimulator {
    pub fn new(step_length: f64) -> Self {
        Self {
            step_length,
            vehicles: BTreeMap::new(),
            signals: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Registers a traffic light that accepts state writes.
    pub fn with_signal(mut self, signal_id: &str) -> Self {
        self.add_signal(signal_id);
        self
    }

    pub fn add_signal(&mut self, signal_id: &str) {
        self.signals.entry(signal_id.to_string()).or_default();
    }

    pub fn spawn(&mut self, id: &str, edge: &str, lane: usize, position: f64) -> VehicleId {
        let id = VehicleId::from(id);
        self.vehicles.insert(id.clone(), VehicleState {
            edge: EdgeId::from(edge),
            lane,
            position,
            lane_change_mode: DEFAULT_LANE_CHANGE_MODE,
            color: DEFAULT_COLOR,
        });
        id
    }

    /// Moves a vehicle. Returns false if it is not in the simulation.
    pub fn place(&mut self, id: &VehicleId, edge: &str, lane: usize, position: f64) -> bool {
        match self.vehicles.get_mut(id) {
            Some(vehicle) => {
                vehicle.edge = EdgeId::from(edge);
                vehicle.lane = lane;
                vehicle.position = position;
                true
            }
            None => false,
        }
    }

    pub fn remove_vehicle(&mut self, id: &VehicleId) -> Option<VehicleState> {
        self.vehicles.remove(id)
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&VehicleState> {
        self.vehicles.get(id)
    }

    pub fn vehicle_mut(&mut self, id: &VehicleId) -> Option<&mut VehicleState> {
        self.vehicles.get_mut(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = (&VehicleId, &VehicleState)> {
        self.vehicles.iter()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn signal_state(&self, signal_id: &str) -> Option<&SignalState> {
        self.signals.get(signal_id).filter(|state| !state.is_empty())
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of state writes received by the given traffic light.
    pub fn signal_writes(&self, signal_id: &str) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::SetSignalState { signal_id: id, .. } if id == signal_id))
            .count()
    }

    fn vehicle_state(&self, id: &VehicleId) -> Result<&VehicleState, SimError> {
        self.vehicles
            .get(id)
            .ok_or_else(|| SimError::UnknownVehicle(id.clone()))
    }
}

impl Simulator for MemorySimulator {
    fn vehicle_ids(&self) -> Result<Vec<VehicleId>, SimError> {
        Ok(self.vehicles.keys().cloned().collect())
    }

    fn edge(&self, id: &VehicleId) -> Result<Option<EdgeId>, SimError> {
        Ok(self.vehicles.get(id).map(|v| v.edge.clone()))
    }

    fn lane(&self, id: &VehicleId) -> Result<Option<usize>, SimError> {
        Ok(self.vehicles.get(id).map(|v| v.lane))
    }

    fn position(&self, id: &VehicleId) -> Result<Option<f64>, SimError> {
        Ok(self.vehicles.get(id).map(|v| v.position))
    }

    fn lane_change_mode(&self, id: &VehicleId) -> Result<LaneChangeMode, SimError> {
        Ok(self.vehicle_state(id)?.lane_change_mode)
    }

    fn color(&self, id: &VehicleId) -> Result<Color, SimError> {
        Ok(self.vehicle_state(id)?.color)
    }

    fn set_lane_change_mode(&mut self, id: &VehicleId, mode: LaneChangeMode) -> Result<(), SimError> {
        let vehicle = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownVehicle(id.clone()))?;
        vehicle.lane_change_mode = mode;
        self.commands.push(Command::SetLaneChangeMode { vehicle: id.clone(), mode });
        Ok(())
    }

    fn set_color(&mut self, id: &VehicleId, color: Color) -> Result<(), SimError> {
        let vehicle = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownVehicle(id.clone()))?;
        vehicle.color = color;
        self.commands.push(Command::SetColor { vehicle: id.clone(), color });
        Ok(())
    }

    fn set_signal_state(&mut self, signal_id: &str, state: &SignalState) -> Result<(), SimError> {
        let current = self
            .signals
            .get_mut(signal_id)
            .ok_or_else(|| SimError::UnknownSignal(signal_id.to_string()))?;
        *current = state.clone();
        self.commands.push(Command::SetSignalState {
            signal_id: signal_id.to_string(),
            state: state.clone(),
        });
        Ok(())
    }

    fn step_length(&self) -> f64 {
        self.step_length
    }
}
