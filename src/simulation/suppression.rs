use super::{Color, EdgeId, LaneChangeMode, PositionIndex, VehicleId};
use crate::backend::{SimError, Simulator};
use std::collections::BTreeMap;

/// Region in which lane changes are suppressed.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionZone {
    pub entry_edge: EdgeId,
    pub exit_edge: EdgeId,
    /// Lanes `0..lanes` of the entry edge are controlled.
    pub lanes: usize,
    /// Vehicles further than this into the entry edge are locked.
    pub activation_distance: f64,
    pub locked_mode: LaneChangeMode,
    pub highlight: Color,
}

/// What a vehicle looked like before it was locked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedState {
    pub lane_change_mode: LaneChangeMode,
    pub color: Color,
}

/// Locks vehicles entering a zone and hands their own settings back on exit.
#[derive(Debug, Clone)]
pub struct SuppressionManager {
    zone: SuppressionZone,
    records: BTreeMap<VehicleId, SavedState>,
}

impl SuppressionManager {
    pub fn new(zone: SuppressionZone) -> Self {
        Self {
            zone,
            records: BTreeMap::new(),
        }
    }

    /// Restores every locked vehicle now on the exit edge and forgets it.
    ///
    /// A vehicle the simulator can no longer place keeps its record.
    pub fn release<S: Simulator + ?Sized>(&mut self, sim: &mut S) -> Result<Vec<VehicleId>, SimError> {
        let mut released = Vec::new();
        for vehicle in self.records.keys() {
            if sim.edge(vehicle)?.as_ref() == Some(&self.zone.exit_edge) {
                released.push(vehicle.clone());
            }
        }

        for vehicle in &released {
            if let Some(saved) = self.records.remove(vehicle) {
                sim.set_color(vehicle, saved.color)?;
                sim.set_lane_change_mode(vehicle, saved.lane_change_mode)?;
                log::debug!(
                    "Released {} on {} (lane change mode {})",
                    vehicle, self.zone.exit_edge, saved.lane_change_mode.0
                );
            }
        }

        Ok(released)
    }

    /// Locks every unlocked vehicle past the activation distance on the
    /// controlled lanes of the entry edge.
    pub fn acquire<S: Simulator + ?Sized>(
        &mut self,
        index: &PositionIndex,
        sim: &mut S,
    ) -> Result<Vec<VehicleId>, SimError> {
        let mut acquired = Vec::new();

        for lane in 0..self.zone.lanes {
            for car in index.lane(&self.zone.entry_edge, lane) {
                if car.position <= self.zone.activation_distance || self.records.contains_key(&car.vehicle) {
                    continue;
                }

                let saved = SavedState {
                    lane_change_mode: sim.lane_change_mode(&car.vehicle)?,
                    color: sim.color(&car.vehicle)?,
                };
                self.records.insert(car.vehicle.clone(), saved);
                sim.set_lane_change_mode(&car.vehicle, self.zone.locked_mode)?;
                sim.set_color(&car.vehicle, self.zone.highlight)?;

                log::debug!("Locked {} on {} lane {} at {:.1}", car.vehicle, self.zone.entry_edge, lane, car.position);
                acquired.push(car.vehicle.clone());
            }
        }

        Ok(acquired)
    }

    pub fn is_suppressed(&self, vehicle: &VehicleId) -> bool {
        self.records.contains_key(vehicle)
    }

    pub fn saved_state(&self, vehicle: &VehicleId) -> Option<&SavedState> {
        self.records.get(vehicle)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn zone(&self) -> &SuppressionZone {
        &self.zone
    }
}
