use super::{PositionIndex, SuppressionManager, VehicleId};
use crate::backend::{SimError, Simulator};
use crate::config::RampConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RampStepReport {
    pub released: Vec<VehicleId>,
    pub acquired: Vec<VehicleId>,
}

/// Keeps vehicles in their lane while they approach the ramp meters.
#[derive(Debug, Clone)]
pub struct RampMeterController {
    suppression: SuppressionManager,
}

impl RampMeterController {
    pub fn new(config: &RampConfig) -> Self {
        log::info!(
            "Ramp meters on {} -> {} covering {} lanes past {:.1}",
            config.entry_edge, config.exit_edge, config.lanes, config.lock_distance
        );
        Self {
            suppression: SuppressionManager::new(config.zone()),
        }
    }

    pub fn step<S: Simulator + ?Sized>(
        &mut self,
        index: &PositionIndex,
        sim: &mut S,
    ) -> Result<RampStepReport, SimError> {
        let released = self.suppression.release(sim)?;
        let acquired = self.suppression.acquire(index, sim)?;
        Ok(RampStepReport { released, acquired })
    }

    pub fn suppression(&self) -> &SuppressionManager {
        &self.suppression
    }
}
