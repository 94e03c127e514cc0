use crate::config::ServiceConfig;
use anyhow::{bail, Context, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::ops::Range;

/// Toll service-time distributions, expressed in simulation steps.
#[derive(Debug, Clone)]
pub struct ServiceTimes {
    initial: Normal<f64>,
    normal: Normal<f64>,
    fast_track: Normal<f64>,
    fast_track_lanes: Range<usize>,
}

impl ServiceTimes {
    pub fn new(config: &ServiceConfig, step_length: f64) -> Result<Self> {
        if !(step_length.is_finite() && step_length > 0.0) {
            bail!("Step length must be positive, got {}", step_length);
        }

        let steps = |secs: f64| secs / step_length;
        let initial = Normal::new(steps(config.normal_mean_secs), steps(config.initial_std_dev_secs))
            .context("Invalid initial service-time distribution")?;
        let normal = Normal::new(steps(config.normal_mean_secs), steps(config.redraw_std_dev_secs))
            .context("Invalid service-time distribution")?;
        let fast_track = Normal::new(steps(config.fast_track_mean_secs), steps(config.redraw_std_dev_secs))
            .context("Invalid fast-track service-time distribution")?;

        Ok(Self {
            initial,
            normal,
            fast_track,
            fast_track_lanes: config.fast_track_lanes.start..config.fast_track_lanes.end,
        })
    }

    /// First service time of a lane, drawn before any vehicle arrives.
    pub fn initial<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.initial.sample(rng).abs()
    }

    /// Service time for the next vehicle after one leaves `lane`.
    pub fn redraw<R: Rng + ?Sized>(&self, lane: usize, rng: &mut R) -> f64 {
        let distribution = if self.is_fast_track(lane) {
            &self.fast_track
        } else {
            &self.normal
        };
        distribution.sample(rng).max(0.0)
    }

    pub fn is_fast_track(&self, lane: usize) -> bool {
        self.fast_track_lanes.contains(&lane)
    }

    /// Mean redraw for `lane`, in steps.
    pub fn mean(&self, lane: usize) -> f64 {
        if self.is_fast_track(lane) {
            self.fast_track.mean()
        } else {
            self.normal.mean()
        }
    }
}
