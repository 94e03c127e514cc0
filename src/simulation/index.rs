use super::{EdgeId, VehicleId};
use crate::backend::{SimError, Simulator};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct LanePosition {
    pub vehicle: VehicleId,
    /// Distance from the start of the edge.
    pub position: f64,
}

/// Per-step snapshot of where every vehicle is, bucketed by edge and lane.
///
/// Buckets keep simulator query order. The index is rebuilt from scratch each
/// step and never updated in place by the controllers.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    max_lanes: usize,
    edges: HashMap<EdgeId, Vec<Vec<LanePosition>>>,
    vehicle_count: usize,
}

impl PositionIndex {
    /// An empty index with `max_lanes` buckets for each known edge.
    pub fn new(known_edges: &[EdgeId], max_lanes: usize) -> Self {
        let edges = known_edges
            .iter()
            .map(|edge| (edge.clone(), vec![Vec::new(); max_lanes]))
            .collect();

        Self {
            max_lanes,
            edges,
            vehicle_count: 0,
        }
    }

    pub fn rebuild<S: Simulator + ?Sized>(
        sim: &S,
        known_edges: &[EdgeId],
        max_lanes: usize,
    ) -> Result<Self, SimError> {
        let mut index = Self::new(known_edges, max_lanes);

        for vehicle in sim.vehicle_ids()? {
            let edge = sim.edge(&vehicle)?;
            let lane = sim.lane(&vehicle)?;
            let position = sim.position(&vehicle)?;

            match (edge, lane, position) {
                (Some(edge), Some(lane), Some(position)) => {
                    if !index.insert(edge, lane, vehicle.clone(), position) {
                        log::trace!("Vehicle {} on lane {} is beyond the indexed lanes", vehicle, lane);
                    }
                }
                _ => log::trace!("Vehicle {} has no resolvable position this step", vehicle),
            }
        }

        Ok(index)
    }

    /// Appends a vehicle to its bucket, allocating buckets for unseen edges.
    /// Returns false if `lane` is not below `max_lanes`.
    pub fn insert(&mut self, edge: EdgeId, lane: usize, vehicle: VehicleId, position: f64) -> bool {
        if lane >= self.max_lanes {
            return false;
        }

        let max_lanes = self.max_lanes;
        let lanes = self
            .edges
            .entry(edge)
            .or_insert_with(|| vec![Vec::new(); max_lanes]);
        lanes[lane].push(LanePosition { vehicle, position });
        self.vehicle_count += 1;
        true
    }

    /// Vehicles on one lane of an edge; empty when the edge or lane is unknown.
    pub fn lane(&self, edge: &EdgeId, lane: usize) -> &[LanePosition] {
        self.edges
            .get(edge)
            .and_then(|lanes| lanes.get(lane))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn lanes(&self, edge: &EdgeId) -> Option<&[Vec<LanePosition>]> {
        self.edges.get(edge).map(Vec::as_slice)
    }

    pub fn contains_edge(&self, edge: &EdgeId) -> bool {
        self.edges.contains_key(edge)
    }

    /// Number of indexed vehicles.
    pub fn len(&self) -> usize {
        self.vehicle_count
    }

    pub fn is_empty(&self) -> bool {
        self.vehicle_count == 0
    }
}
