pub use advisory::{Acceptance, AdvisoryDomain, SpeedAdvisory};
pub use error::{Error, Result};
pub use fundamental::FundamentalDiagram;
pub use lane::Lane;
pub use link::{Link, LinkAttributes};
pub use network::Network;
pub use scenario::{assign_vehicle_types, platoon, InitialState, ScenarioBuilder};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use trajectory::Trajectory;
pub use util::Interval;
pub use vehicle::dynamics::Kinematics;
pub use vehicle::{
    CarFollowingLaw, Control, Idm, IdmParams, Tampere, TampereParams, Vehicle, VehicleAttributes,
    VehicleType,
};

mod advisory;
mod debug;
mod error;
mod fundamental;
mod lane;
mod link;
pub mod math;
mod network;
mod scenario;
mod simulation;
mod trajectory;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Link].
    pub struct LinkId;
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type LinkSet = SlotMap<LinkId, Link>;
type LaneSet = SlotMap<LaneId, Lane>;
type VehicleSet = SlotMap<VehicleId, Vehicle>;
