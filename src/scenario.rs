//! Building simulations from initial conditions.

use crate::error::{non_negative, Error, Result};
use crate::fundamental::FundamentalDiagram;
use crate::link::LinkAttributes;
use crate::network::Network;
use crate::simulation::Simulation;
use crate::vehicle::{CarFollowingLaw, VehicleAttributes, VehicleType};
use log::info;
use rand::seq::index;
use rand::Rng;

/// The initial position (m), speed (m/s) and type of a vehicle.
pub type InitialState = (f64, f64, VehicleType);

/// Builds a [Simulation] from a list of links and the initial state of their vehicles.
#[derive(Clone, Debug)]
pub struct ScenarioBuilder {
    fd: FundamentalDiagram,
    seed: u64,
    law: CarFollowingLaw,
    links: Vec<LinkAttributes>,
    /// Vehicles per `(link, lane)`, front to back.
    vehicles: Vec<(usize, usize, Vec<InitialState>)>,
}

impl ScenarioBuilder {
    /// Creates a builder with no links.
    pub fn new(fd: FundamentalDiagram) -> Self {
        Self {
            fd,
            seed: 0,
            law: CarFollowingLaw::default(),
            links: vec![],
            vehicles: vec![],
        }
    }

    /// Sets the seed of the simulation's random generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the car following law given to every vehicle.
    pub fn law(mut self, law: impl Into<CarFollowingLaw>) -> Self {
        self.law = law.into();
        self
    }

    /// Adds a link with the given length (m) and number of lanes.
    pub fn link(mut self, length: f64, lanes: usize) -> Self {
        self.links.push(LinkAttributes { length, lanes });
        self
    }

    /// Places vehicles in a lane, given front to back.
    ///
    /// # Parameters
    /// * `link` - The index of the link, in the order links were added
    /// * `lane` - The index of the lane within the link
    /// * `vehicles` - The initial states of the vehicles
    pub fn lane_vehicles(
        mut self,
        link: usize,
        lane: usize,
        vehicles: impl IntoIterator<Item = InitialState>,
    ) -> Self {
        self.vehicles.push((link, lane, vehicles.into_iter().collect()));
        self
    }

    /// Spreads vehicles over the lanes of a link in turn: the first vehicle goes
    /// to the first lane, the second to the second lane, and so on.
    pub fn link_vehicles(
        mut self,
        link: usize,
        vehicles: impl IntoIterator<Item = InitialState>,
    ) -> Self {
        let lanes = self.links.get(link).map(|attrs| attrs.lanes).unwrap_or(1).max(1);
        let mut per_lane = vec![vec![]; lanes];
        for (idx, vehicle) in vehicles.into_iter().enumerate() {
            per_lane[idx % lanes].push(vehicle);
        }
        for (lane, vehicles) in per_lane.into_iter().enumerate() {
            self = self.lane_vehicles(link, lane, vehicles);
        }
        self
    }

    /// Builds the simulation.
    pub fn build(self) -> Result<Simulation> {
        let links = self.links.iter().map(|attrs| (attrs.length, attrs.lanes));
        let network = Network::from_links(links)?;
        let link_ids = network.link_order().to_vec();
        let mut sim = Simulation::new(network, self.fd, self.seed);

        for (link, lane, vehicles) in &self.vehicles {
            let lane_id = link_ids
                .get(*link)
                .and_then(|id| sim.network().link(*id))
                .and_then(|link| link.lane_ids().get(*lane).copied())
                .ok_or(Error::InvalidParameter {
                    name: "lane index",
                    value: *lane as f64,
                })?;
            for (pos, vel, vehicle_type) in vehicles {
                sim.add_vehicle_to_lane(
                    lane_id,
                    &VehicleAttributes {
                        pos: *pos,
                        vel: *vel,
                        vehicle_type: *vehicle_type,
                        law: self.law.clone(),
                    },
                )?;
            }
        }

        info!(
            "built scenario with {} links and {} vehicles",
            link_ids.len(),
            sim.iter_vehicles().count()
        );
        Ok(sim)
    }
}

/// A platoon of `count` human driven vehicles travelling at `speed`,
/// spaced at the equilibrium spacing for that speed, front to back.
/// The last vehicle is at position zero.
pub fn platoon(fd: &FundamentalDiagram, count: usize, speed: f64) -> Vec<InitialState> {
    let spacing = fd.equilibrium_spacing(speed);
    (0..count)
        .rev()
        .map(|idx| (idx as f64 * spacing, speed, VehicleType::Hdv))
        .collect()
}

/// Draws vehicle types for `count` vehicles, of which a share of
/// `penetration_rate` are connected.
pub fn assign_vehicle_types<R: Rng + ?Sized>(
    count: usize,
    penetration_rate: f64,
    rng: &mut R,
) -> Result<Vec<VehicleType>> {
    let rate = non_negative("penetration_rate", penetration_rate)?;
    if rate > 1.0 {
        return Err(Error::InvalidParameter {
            name: "penetration_rate",
            value: rate,
        });
    }
    let mut types = vec![VehicleType::Hdv; count];
    let connected = (count as f64 * rate) as usize;
    for idx in index::sample(rng, count, connected) {
        types[idx] = VehicleType::Cav;
    }
    Ok(types)
}
