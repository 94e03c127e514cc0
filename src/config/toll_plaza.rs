use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::{check_distance, check_zone_edges, Validate};
use crate::simulation::{Color, EdgeId, LaneChangeMode, SuppressionZone};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TollConfig {
    pub disabled: bool,
    /// Edge leading into the booths.
    pub entry_edge: EdgeId,
    /// Edge just past the booths.
    pub exit_edge: EdgeId,
    /// Traffic light holding one signal per toll lane.
    pub signal_id: String,
    pub lanes: usize,
    /// How far into the entry edge lane changing is disabled.
    pub lock_distance: f64,
    /// How far into the entry edge the booth signal starts holding vehicles.
    pub metering_distance: f64,
    pub locked_lane_change_mode: LaneChangeMode,
    pub highlight: Color,
    pub service: ServiceConfig,
}

impl Default for TollConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            entry_edge: EdgeId::from("1"),
            exit_edge: EdgeId::from("2"),
            signal_id: "2".to_string(),
            lanes: 16,
            lock_distance: 10.0,
            metering_distance: 50.0,
            locked_lane_change_mode: LaneChangeMode::LOCKED,
            highlight: Color::new(255, 0, 255, 0),
            service: ServiceConfig::default(),
        }
    }
}

impl TollConfig {
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

/// Booth service times, in simulated seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub normal_mean_secs: f64,
    pub fast_track_mean_secs: f64,
    /// Spread of the draw each lane starts with.
    pub initial_std_dev_secs: f64,
    /// Spread of the draw made after each departure.
    pub redraw_std_dev_secs: f64,
    pub fast_track_lanes: LaneRange,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            normal_mean_secs: 15.0,
            fast_track_mean_secs: 3.0,
            initial_std_dev_secs: 4.0,
            redraw_std_dev_secs: 1.0,
            fast_track_lanes: LaneRange { start: 6, end: 11 },
        }
    }
}

/// Half-open range of lane indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LaneRange {
    pub start: usize,
    pub end: usize,
}

impl Validate for TollConfig {
    fn validate(&self) -> Result<()> {
        if self.disabled {
            return Ok(());
        }

        check_zone_edges("Toll", &self.entry_edge, &self.exit_edge)?;

        if self.signal_id.is_empty() {
            return Err(anyhow!("Toll signal id must not be empty"));
        }

        if self.lanes == 0 {
            return Err(anyhow!("Toll lanes must be greater than zero"));
        }

        check_distance("Toll lock_distance", self.lock_distance)?;
        check_distance("Toll metering_distance", self.metering_distance)?;

        self.service.validate()
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        check_distance("normal_mean_secs", self.normal_mean_secs)?;
        check_distance("fast_track_mean_secs", self.fast_track_mean_secs)?;
        check_distance("initial_std_dev_secs", self.initial_std_dev_secs)?;
        check_distance("redraw_std_dev_secs", self.redraw_std_dev_secs)?;

        let range = self.fast_track_lanes;
        if range.start > range.end {
            return Err(anyhow!("Fast track lanes {}..{} are reversed", range.start, range.end));
        }

        Ok(())
    }
}
