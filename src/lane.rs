use crate::{LaneId, LinkId, VehicleId, VehicleSet};
use log::debug;
use std::collections::VecDeque;

/// A single line of travel, holding its vehicles in order from front to back.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane ID.
    id: LaneId,
    /// The link the lane belongs to.
    link_id: LinkId,
    /// The length of the lane in m.
    length: f64,
    /// The vehicles in the lane, the head first.
    vehicles: VecDeque<VehicleId>,
}

impl Lane {
    /// Creates a new, empty lane.
    pub(crate) fn new(id: LaneId, link_id: LinkId, length: f64) -> Self {
        Self {
            id,
            link_id,
            length,
            vehicles: VecDeque::new(),
        }
    }

    /// Gets the lane's ID.
    pub fn id(&self) -> LaneId {
        self.id
    }

    /// Gets the ID of the link containing the lane.
    pub fn link_id(&self) -> LinkId {
        self.link_id
    }

    /// Gets the length of the lane in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The number of vehicles in the lane.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the lane has no vehicles.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// The vehicle at the front of the lane.
    pub fn head(&self) -> Option<VehicleId> {
        self.vehicles.front().copied()
    }

    /// The vehicle at the back of the lane.
    pub fn tail(&self) -> Option<VehicleId> {
        self.vehicles.back().copied()
    }

    /// Iterates over the vehicles from front to back, the order in which they are resolved.
    pub fn vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.vehicles.iter().copied()
    }

    /// Appends a vehicle to the back of the lane, so that it follows the current tail.
    pub(crate) fn attach(&mut self, vehicles: &mut VehicleSet, id: VehicleId) {
        let vehicle = &mut vehicles[id];
        vehicle.set_leader(self.tail());
        vehicle.set_lane(Some(self.id));
        self.vehicles.push_back(id);
    }

    /// Removes the vehicle at the front of the lane. Its control signal is handed
    /// to the next vehicle, which becomes the new head of the platoon.
    pub(crate) fn detach_head(&mut self, vehicles: &mut VehicleSet) -> Option<VehicleId> {
        let head_id = self.vehicles.pop_front()?;
        let head = &mut vehicles[head_id];
        let control = head.control();
        head.set_lane(None);

        if let Some(next_id) = self.head() {
            let next = &mut vehicles[next_id];
            next.apply_control(control);
            next.set_leader(None);
            debug!("vehicle {} is now the head of its lane", next.number());
        }
        Some(head_id)
    }

    /// Forgets every vehicle in the lane, returning their IDs.
    pub(crate) fn clear(&mut self) -> Vec<VehicleId> {
        self.vehicles.drain(..).collect()
    }
}
