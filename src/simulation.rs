#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::advisory::{Acceptance, SpeedAdvisory};
use crate::debug::debug_following;
use crate::error::{Error, Result};
use crate::fundamental::FundamentalDiagram;
use crate::link::Link;
use crate::network::Network;
use crate::trajectory::Trajectory;
use crate::vehicle::{Control, Vehicle, VehicleAttributes, VehicleType};
use crate::{LaneId, LinkId, VehicleId, VehicleSet};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
use slotmap::SecondaryMap;

/// A longitudinal traffic simulation.
///
/// Each call to [Simulation::step] advances every vehicle by one time step of
/// the fundamental diagram. Vehicles are resolved link by link and lane by lane
/// in the network's resolution order, and front to back within each lane, so
/// that every vehicle sees its leader's state for the current step.
pub struct Simulation {
    /// The road network.
    network: Network,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The vehicles in order of their sequence number.
    columns: Vec<VehicleId>,
    /// The fundamental diagram shared by all vehicles.
    fd: FundamentalDiagram,
    /// The source of randomness for stochastic car following laws.
    rng: StdRng,
    /// The current frame of simulation.
    frame: usize,
    /// The next vehicle sequence number.
    seq: usize,
    /// The recorded vehicle states.
    trajectory: Trajectory,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation with a random generator seeded from `seed`.
    pub fn new(network: Network, fd: FundamentalDiagram, seed: u64) -> Self {
        Self {
            network,
            vehicles: VehicleSet::with_key(),
            columns: vec![],
            fd,
            rng: StdRng::seed_from_u64(seed),
            frame: 0,
            seq: 0,
            trajectory: Trajectory::default(),
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        }
    }

    /// Removes every vehicle and restarts the simulation from frame zero,
    /// resetting vehicle numbering and reseeding the random generator.
    /// The network topology is kept.
    pub fn reset(&mut self, seed: u64) {
        let lanes = self.network.iter_lanes().map(|lane| lane.id()).collect::<Vec<_>>();
        for lane_id in lanes {
            if let Some(lane) = self.network.lane_mut(lane_id) {
                lane.clear();
            }
        }
        self.vehicles.clear();
        self.columns.clear();
        self.trajectory.clear();
        self.rng = StdRng::seed_from_u64(seed);
        self.frame = 0;
        self.seq = 0;
        info!("simulation reset with seed {}", seed);
    }

    /// Adds a vehicle which is not yet in any lane.
    pub fn add_vehicle(&mut self, attributes: &VehicleAttributes) -> Result<VehicleId> {
        if self.frame > 0 {
            return Err(Error::RunInProgress);
        }
        let number = self.seq;
        self.seq += 1;
        let vehicle_id = self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, number, attributes));
        self.columns.push(vehicle_id);
        Ok(vehicle_id)
    }

    /// Adds a vehicle to the back of a lane.
    pub fn add_vehicle_to_lane(
        &mut self,
        lane_id: LaneId,
        attributes: &VehicleAttributes,
    ) -> Result<VehicleId> {
        if self.network.lane(lane_id).is_none() {
            return Err(Error::UnknownLane(lane_id));
        }
        let vehicle_id = self.add_vehicle(attributes)?;
        self.attach_vehicle(lane_id, vehicle_id)?;
        Ok(vehicle_id)
    }

    /// Appends a vehicle to the back of a lane, where it follows the lane's current tail.
    pub fn attach_vehicle(&mut self, lane_id: LaneId, vehicle_id: VehicleId) -> Result<()> {
        if self.vehicles[vehicle_id].lane_id().is_some() {
            return Err(Error::AlreadyInLane);
        }
        let lane = self.network.lane(lane_id).ok_or(Error::UnknownLane(lane_id))?;
        if self.would_cycle(vehicle_id, lane.tail()) {
            return Err(Error::LeaderCycle);
        }
        if let Some(lane) = self.network.lane_mut(lane_id) {
            lane.attach(&mut self.vehicles, vehicle_id);
        }
        Ok(())
    }

    /// Removes the vehicle at the front of a lane, handing its control signal
    /// to the next vehicle. Returns the removed vehicle's ID.
    pub fn detach_head(&mut self, lane_id: LaneId) -> Option<VehicleId> {
        self.network.lane_mut(lane_id)?.detach_head(&mut self.vehicles)
    }

    /// Sets the leader of a vehicle, or makes it the head of its platoon.
    pub fn set_leader(&mut self, vehicle_id: VehicleId, leader: Option<VehicleId>) -> Result<()> {
        if self.would_cycle(vehicle_id, leader) {
            return Err(Error::LeaderCycle);
        }
        self.vehicles[vehicle_id].set_leader(leader);
        Ok(())
    }

    /// Removes a link from the network. Vehicles in its lanes are kept,
    /// but no longer belong to a lane.
    pub fn remove_link(&mut self, link_id: LinkId) -> Option<Link> {
        let lanes = self.network.link(link_id)?.lane_ids().to_vec();
        for lane_id in lanes {
            let Some(lane) = self.network.lane_mut(lane_id) else {
                continue;
            };
            for vehicle_id in lane.clear() {
                self.vehicles[vehicle_id].set_lane(None);
            }
        }
        self.network.remove_link(link_id)
    }

    /// Sets the external control signal of a vehicle.
    pub fn set_control(&mut self, vehicle_id: VehicleId, control: Control) {
        self.vehicles[vehicle_id].apply_control(control);
    }

    /// Sets the external control signal of every vehicle without a leader.
    pub fn set_boundary_control(&mut self, control: Control) {
        for vehicle in self.vehicles.values_mut() {
            if vehicle.leader().is_none() {
                vehicle.apply_control(control);
            }
        }
    }

    /// Installs a speed advisory on a vehicle.
    /// Returns `false` if the vehicle already had one.
    pub fn register_control_speed(
        &mut self,
        vehicle_id: VehicleId,
        advisory: SpeedAdvisory,
    ) -> bool {
        self.vehicles[vehicle_id].register_control_speed(advisory)
    }

    /// Offers an advisory to every connected vehicle which does not have one yet,
    /// and installs it on those which have reached their acceptance threshold.
    /// Returns the number of vehicles which accepted.
    pub fn broadcast_advisory(
        &mut self,
        acceptance: &Acceptance,
        advisory: &SpeedAdvisory,
    ) -> usize {
        let time = self.time();
        let mut accepted = 0;
        for (vehicle_id, vehicle) in &mut self.vehicles {
            let eligible = vehicle.vehicle_type() == VehicleType::Cav && !vehicle.is_controlled();
            if eligible
                && acceptance.accepts(vehicle_id, vehicle.pos(), time)
                && vehicle.register_control_speed(advisory.clone())
            {
                accepted += 1;
            }
        }
        accepted
    }

    /// Advances the simulation by one time step.
    pub fn step(&mut self) {
        if self.trajectory.num_frames() == 0 {
            self.record();
        }

        for link in self.network.iter_links() {
            link.solve_merges();
        }

        let time = self.time();
        let mut evolved = SecondaryMap::new();
        for vehicle_id in self.resolution_order() {
            // Leaders resolved later in the step still hold their baseline in `curr`
            let leader = self.vehicles[vehicle_id].leader().map(|leader_id| {
                let leader = &self.vehicles[leader_id];
                if evolved.contains_key(leader_id) {
                    *leader.prev_state()
                } else {
                    *leader.state()
                }
            });
            evolved.insert(vehicle_id, ());
            let vehicle = &mut self.vehicles[vehicle_id];
            vehicle.shift_state();
            vehicle.evolve(leader.as_ref(), time, &self.fd, &mut self.rng);
            debug_following(vehicle.number(), vehicle.gap(), vehicle.acc());
        }

        self.frame += 1;
        self.record();
        trace!("simulated frame {}", self.frame);

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Gets the current simulation time in s.
    pub fn time(&self) -> f64 {
        self.frame as f64 * self.fd.dt()
    }

    /// The fundamental diagram of the simulation.
    pub fn fundamental_diagram(&self) -> &FundamentalDiagram {
        &self.fd
    }

    /// The road network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Replaces the link resolution order.
    pub fn set_link_order(&mut self, order: &[LinkId]) -> Result<()> {
        self.network.set_link_order(order)
    }

    /// Replaces the lane resolution order of a link.
    pub fn set_lane_order(&mut self, link_id: LinkId, order: &[LaneId]) -> Result<()> {
        self.network.set_lane_order(link_id, order)
    }

    /// Returns an iterator over all the vehicles, in order of vehicle number.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.columns.iter().map(|id| &self.vehicles[*id])
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    /// The recorded vehicle states, one row per frame.
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// The order in which vehicles are resolved: the lanes in network order,
    /// front to back, followed by vehicles outside any lane, leaders first.
    pub fn resolution_order(&self) -> Vec<VehicleId> {
        let mut seen = SecondaryMap::new();
        let mut order = Vec::with_capacity(self.vehicles.len());
        for lane in self.network.iter_lanes() {
            for vehicle_id in lane.vehicles() {
                if seen.insert(vehicle_id, ()).is_none() {
                    order.push(vehicle_id);
                }
            }
        }

        let mut rest = self
            .columns
            .iter()
            .copied()
            .filter(|id| !seen.contains_key(*id))
            .collect::<Vec<_>>();
        rest.sort_by_cached_key(|id| self.chain_depth(*id));
        order.extend(rest);
        order
    }

    /// The number of leaders ahead of a vehicle.
    fn chain_depth(&self, vehicle_id: VehicleId) -> usize {
        let leader = self.vehicles[vehicle_id].leader();
        std::iter::successors(leader, |id| self.vehicles[*id].leader()).count()
    }

    /// Whether following `leader` would put `vehicle_id` ahead of itself.
    fn would_cycle(&self, vehicle_id: VehicleId, leader: Option<VehicleId>) -> bool {
        let mut ahead = std::iter::successors(leader, |id| self.vehicles[*id].leader());
        let cycle = ahead.any(|id| id == vehicle_id);
        if cycle {
            debug!("rejected leader for vehicle {}", self.vehicles[vehicle_id].number());
        }
        cycle
    }

    /// Appends the current state of every vehicle to the trajectory.
    fn record(&mut self) {
        let vehicles = &self.vehicles;
        self.trajectory
            .record(self.columns.iter().map(|id| &vehicles[*id]));
    }
}
