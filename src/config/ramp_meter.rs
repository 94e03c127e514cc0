use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::{check_distance, check_zone_edges, Validate};
use crate::simulation::{Color, EdgeId, LaneChangeMode, SuppressionZone};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RampConfig {
    pub disabled: bool,
    pub entry_edge: EdgeId,
    pub exit_edge: EdgeId,
    pub lanes: usize,
    pub lock_distance: f64,
    pub locked_lane_change_mode: LaneChangeMode,
    pub highlight: Color,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            entry_edge: EdgeId::from("2"),
            exit_edge: EdgeId::from("3"),
            lanes: 14,
            lock_distance: 80.0,
            locked_lane_change_mode: LaneChangeMode::LOCKED,
            highlight: Color::new(0, 255, 255, 0),
        }
    }
}

impl RampConfig {
    pub fn zone(&self) -> SuppressionZone {
        SuppressionZone {
            entry_edge: self.entry_edge.clone(),
            exit_edge: self.exit_edge.clone(),
            lanes: self.lanes,
            activation_distance: self.lock_distance,
            locked_mode: self.locked_lane_change_mode,
            highlight: self.highlight,
        }
    }
}

impl Validate for RampConfig {
    fn validate(&self) -> Result<()> {
        if self.disabled {
            return Ok(());
        }

        check_zone_edges("Ramp", &self.entry_edge, &self.exit_edge)?;

        if self.lanes == 0 {
            return Err(anyhow!("Ramp lanes must be greater than zero"));
        }

        check_distance("Ramp lock_distance", self.lock_distance)
    }
}
