use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::simulation::EdgeId;

pub mod toll_plaza;
pub mod ramp_meter;

pub use toll_plaza::*;
pub use ramp_meter::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    pub network: NetworkConfig,
    pub toll: TollConfig,
    pub ramp: RampConfig,
    pub random: RandomConfig,
}

impl ControlConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ControlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ControlConfig {
    fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.toll.validate()?;
        self.ramp.validate()?;

        let max_lanes = self.network.max_lanes;
        if !self.toll.disabled && self.toll.lanes > max_lanes {
            return Err(anyhow!("Toll lanes ({}) exceed network max_lanes ({})", self.toll.lanes, max_lanes));
        }
        if !self.ramp.disabled && self.ramp.lanes > max_lanes {
            return Err(anyhow!("Ramp lanes ({}) exceed network max_lanes ({})", self.ramp.lanes, max_lanes));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Edges whose buckets exist every step even when empty.
    pub edges: Vec<EdgeId>,
    pub max_lanes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            edges: ["1", "2", "3", "4", "5"].into_iter().map(EdgeId::from).collect(),
            max_lanes: 16,
        }
    }
}

impl Validate for NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.max_lanes == 0 {
            return Err(anyhow!("max_lanes must be greater than zero"));
        }

        if self.edges.iter().any(|edge| edge.0.is_empty()) {
            return Err(anyhow!("Edge ids must not be empty"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub(crate) fn check_distance(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!("{} must be finite and non-negative, got {}", name, value));
    }
    Ok(())
}

pub(crate) fn check_zone_edges(name: &str, entry: &EdgeId, exit: &EdgeId) -> Result<()> {
    if entry.0.is_empty() || exit.0.is_empty() {
        return Err(anyhow!("{} entry and exit edges must not be empty", name));
    }
    if entry == exit {
        return Err(anyhow!("{} entry and exit edges must differ, both are '{}'", name, entry));
    }
    Ok(())
}
