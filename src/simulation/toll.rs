use super::{LightState, PositionIndex, ServiceTimes, SignalState, SuppressionManager, VehicleId};
use crate::backend::{SimError, Simulator};
use crate::config::TollConfig;
use anyhow::Result;
use rand::Rng;

/// Where a toll lane is in its service cycle this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneStatus {
    /// No locked vehicle at the metering line.
    Free,
    /// A vehicle is held while the service timer runs down.
    Queued,
    /// Service time elapsed, the lane is open.
    Releasing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TollStepReport {
    pub released: Vec<VehicleId>,
    pub acquired: Vec<VehicleId>,
    pub signal: SignalState,
    /// Whether `signal` was written to the simulator this step.
    pub signal_pushed: bool,
    pub lanes: Vec<LaneStatus>,
}

/// Meters vehicles through the toll booths with one stochastic server per lane.
pub struct TollController<R: Rng> {
    suppression: SuppressionManager,
    signal_id: String,
    metering_distance: f64,
    service: ServiceTimes,
    timers: Vec<f64>,
    last_signal: SignalState,
    rng: R,
}

impl<R: Rng> TollController<R> {
    pub fn new(config: &TollConfig, step_length: f64, mut rng: R) -> Result<Self> {
        let service = ServiceTimes::new(&config.service, step_length)?;
        let timers = (0..config.lanes).map(|_| service.initial(&mut rng)).collect();

        log::info!(
            "Toll plaza on {} with {} lanes (fast track {}..{}) driving signal {}",
            config.entry_edge,
            config.lanes,
            config.service.fast_track_lanes.start,
            config.service.fast_track_lanes.end,
            config.signal_id
        );

        Ok(Self {
            suppression: SuppressionManager::new(config.zone()),
            signal_id: config.signal_id.clone(),
            metering_distance: config.metering_distance,
            service,
            timers,
            last_signal: SignalState::default(),
            rng,
        })
    }

    pub fn step<S: Simulator + ?Sized>(
        &mut self,
        index: &PositionIndex,
        sim: &mut S,
    ) -> Result<TollStepReport, SimError> {
        let released = self.suppression.release(sim)?;
        for vehicle in &released {
            self.on_departure(vehicle, sim)?;
        }

        let (lights, lanes) = self.meter(index);
        let signal = SignalState::from_lights(&lights);
        let signal_pushed = signal != self.last_signal;
        if signal_pushed {
            sim.set_signal_state(&self.signal_id, &signal)?;
            log::debug!("Signal {} -> {}", self.signal_id, signal);
            self.last_signal = signal.clone();
        }

        let acquired = self.suppression.acquire(index, sim)?;

        Ok(TollStepReport {
            released,
            acquired,
            signal,
            signal_pushed,
            lanes,
        })
    }

    /// Redraws the service time of the lane a departing vehicle left by.
    fn on_departure<S: Simulator + ?Sized>(&mut self, vehicle: &VehicleId, sim: &S) -> Result<(), SimError> {
        match sim.lane(vehicle)? {
            Some(lane) if lane < self.timers.len() => {
                self.timers[lane] = self.service.redraw(lane, &mut self.rng);
                log::debug!("Lane {} next service time {:.1} steps", lane, self.timers[lane]);
            }
            lane => log::debug!("No toll timer to redraw for {} (lane {:?})", vehicle, lane),
        }
        Ok(())
    }

    /// Runs the per-lane servers for vehicles already locked at the line.
    fn meter(&mut self, index: &PositionIndex) -> (Vec<LightState>, Vec<LaneStatus>) {
        let zone = self.suppression.zone();
        let mut lights = vec![LightState::Open; self.timers.len()];
        let mut lanes = vec![LaneStatus::Free; self.timers.len()];

        for (lane, timer) in self.timers.iter_mut().enumerate() {
            for car in index.lane(&zone.entry_edge, lane) {
                let at_line = car.position > zone.activation_distance
                    && car.position > self.metering_distance
                    && self.suppression.is_suppressed(&car.vehicle);
                if !at_line {
                    continue;
                }

                if *timer <= 0.0 {
                    lights[lane] = LightState::Open;
                    lanes[lane] = LaneStatus::Releasing;
                } else {
                    lights[lane] = LightState::Closed;
                    lanes[lane] = LaneStatus::Queued;
                    *timer -= 1.0;
                }
            }
        }

        (lights, lanes)
    }

    /// Remaining service time of `lane`, in steps.
    pub fn timer(&self, lane: usize) -> Option<f64> {
        self.timers.get(lane).copied()
    }

    /// Overrides the remaining service time of `lane`. Returns false for an
    /// unknown lane.
    pub fn set_timer(&mut self, lane: usize, steps: f64) -> bool {
        match self.timers.get_mut(lane) {
            Some(timer) => {
                *timer = steps;
                true
            }
            None => false,
        }
    }

    pub fn lanes(&self) -> usize {
        self.timers.len()
    }

    /// The state last written to the simulator; empty before the first step.
    pub fn signal_state(&self) -> &SignalState {
        &self.last_signal
    }

    pub fn suppression(&self) -> &SuppressionManager {
        &self.suppression
    }
}
