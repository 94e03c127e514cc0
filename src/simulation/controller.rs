use super::{EdgeId, PositionIndex, RampMeterController, RampStepReport, TollController, TollStepReport};
use crate::backend::{SimError, Simulator};
use crate::config::ControlConfig;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Zero-based count of steps run by this controller.
    pub step: u64,
    pub vehicles_indexed: usize,
    pub toll: Option<TollStepReport>,
    pub ramp: Option<RampStepReport>,
}

/// Runs the toll plaza and the ramp meters once per simulation step.
pub struct BottleneckController<R: Rng = StdRng> {
    edges: Vec<EdgeId>,
    max_lanes: usize,
    toll: Option<TollController<R>>,
    ramp: Option<RampMeterController>,
    steps: u64,
}

impl BottleneckController<StdRng> {
    /// Seeds the service-time generator from `random.seed`, or from entropy.
    pub fn from_config<S: Simulator + ?Sized>(config: &ControlConfig, sim: &S) -> Result<Self> {
        let rng = if let Some(seed) = config.random.seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };
        Self::new(config, sim, rng)
    }
}

impl<R: Rng> BottleneckController<R> {
    /// Service times are converted to steps using `sim.step_length()`.
    pub fn new<S: Simulator + ?Sized>(config: &ControlConfig, sim: &S, rng: R) -> Result<Self> {
        let toll = if config.toll.disabled {
            log::info!("Toll plaza control disabled");
            None
        } else {
            Some(TollController::new(&config.toll, sim.step_length(), rng)?)
        };

        let ramp = if config.ramp.disabled {
            log::info!("Ramp metering disabled");
            None
        } else {
            Some(RampMeterController::new(&config.ramp))
        };

        Ok(Self {
            edges: config.network.edges.clone(),
            max_lanes: config.network.max_lanes,
            toll,
            ramp,
            steps: 0,
        })
    }

    pub fn step<S: Simulator + ?Sized>(&mut self, sim: &mut S) -> Result<StepReport, SimError> {
        let index = PositionIndex::rebuild(&*sim, &self.edges, self.max_lanes)?;

        let toll = match self.toll.as_mut() {
            Some(toll) => Some(toll.step(&index, sim)?),
            None => None,
        };
        let ramp = match self.ramp.as_mut() {
            Some(ramp) => Some(ramp.step(&index, sim)?),
            None => None,
        };

        let report = StepReport {
            step: self.steps,
            vehicles_indexed: index.len(),
            toll,
            ramp,
        };
        self.steps += 1;
        Ok(report)
    }

    pub fn toll(&self) -> Option<&TollController<R>> {
        self.toll.as_ref()
    }

    pub fn toll_mut(&mut self) -> Option<&mut TollController<R>> {
        self.toll.as_mut()
    }

    pub fn ramp(&self) -> Option<&RampMeterController> {
        self.ramp.as_ref()
    }
}
