use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

pub mod index;
pub mod suppression;
pub mod service;
pub mod toll;
pub mod ramp;
pub mod controller;

pub use index::*;
pub use suppression::*;
pub use service::*;
pub use toll::*;
pub use ramp::*;
pub use controller::*;

/// Handle the external simulator assigns to a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        VehicleId(id.to_string())
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a directed road segment in the simulated network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        EdgeId(id.to_string())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque lane-change permission bitset understood by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneChangeMode(pub u32);

impl LaneChangeMode {
    /// Lane changes only when required to follow the route.
    pub const LOCKED: LaneChangeMode = LaneChangeMode(512);
}

/// Display color of a vehicle, serialized as `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b, color.a]
    }
}

/// Signal shown to a single toll lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Open,
    Closed,
}

impl LightState {
    pub fn as_char(self) -> char {
        match self {
            LightState::Open => 'G',
            LightState::Closed => 'r',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'G' => Some(LightState::Open),
            'r' => Some(LightState::Closed),
            _ => None,
        }
    }
}

/// Red/green state string for a whole signal controller, one char per lane
/// in lane-index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SignalState(String);

impl SignalState {
    pub fn from_lights(lights: &[LightState]) -> Self {
        SignalState(lights.iter().map(|l| l.as_char()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of lanes covered by this state.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn light(&self, lane: usize) -> Option<LightState> {
        self.0.chars().nth(lane).and_then(LightState::from_char)
    }

    pub fn lights(&self) -> impl Iterator<Item = LightState> + '_ {
        self.0.chars().filter_map(LightState::from_char)
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rolling wall-clock cost of controller steps.
#[derive(Debug)]
pub struct StepTimings {
    samples: Vec<Duration>,
    max_samples: usize,
    current_start: Option<Instant>,
}

impl StepTimings {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            current_start: None,
        }
    }

    pub fn start_step(&mut self) {
        self.current_start = Some(Instant::now());
    }

    pub fn end_step(&mut self) {
        if let Some(start) = self.current_start.take() {
            if self.samples.len() >= self.max_samples {
                self.samples.remove(0);
            }
            self.samples.push(start.elapsed());
        }
    }

    pub fn average_step_time(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
