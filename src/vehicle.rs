use self::dynamics::Kinematics;
use crate::advisory::SpeedAdvisory;
use crate::fundamental::FundamentalDiagram;
use crate::{LaneId, VehicleId};
use log::{debug, trace};
use rand::Rng;

pub use self::acceleration::{CarFollowingLaw, Idm, IdmParams, Tampere, TampereParams};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub(crate) mod acceleration;
pub(crate) mod dynamics;

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's arena key.
    pub(crate) id: VehicleId,
    /// The vehicle's sequence number, assigned in order of creation.
    number: usize,
    /// Whether the vehicle is human driven or connected.
    vehicle_type: VehicleType,
    /// The car following law.
    law: CarFollowingLaw,
    /// The state at the start of the current step.
    prev: Kinematics,
    /// The state at the end of the current step.
    curr: Kinematics,
    /// The lane the vehicle is travelling in.
    lane_id: Option<LaneId>,
    /// The vehicle directly ahead.
    leader: Option<VehicleId>,
    /// The external control signal.
    control: Control,
    /// The desired speed profile installed by a speed advisory.
    advisory: Option<SpeedAdvisory>,
    /// Whether an advisory has been installed.
    controlled: bool,
    /// The gap to the leader observed in the last step, in m.
    gap: Option<f64>,
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Debug, Default)]
pub struct VehicleAttributes {
    /// The initial position in m.
    pub pos: f64,
    /// The initial speed in m/s.
    pub vel: f64,
    /// Whether the vehicle is human driven or connected.
    pub vehicle_type: VehicleType,
    /// The car following law.
    pub law: CarFollowingLaw,
}

/// Distinguishes human driven vehicles from connected automated vehicles,
/// which may accept speed advisories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VehicleType {
    /// Human driven vehicle.
    #[default]
    Hdv,
    /// Connected automated vehicle.
    Cav,
}

/// An external control signal, which drives a vehicle with no leader.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Control {
    /// No signal.
    #[default]
    None,
    /// An acceleration command in m/s<sup>2</sup>.
    Acceleration(f64),
    /// A target speed in m/s.
    Speed(f64),
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(id: VehicleId, number: usize, attributes: &VehicleAttributes) -> Self {
        let state = Kinematics::new(attributes.pos, attributes.vel);
        Self {
            id,
            number,
            vehicle_type: attributes.vehicle_type,
            law: attributes.law.clone(),
            prev: state,
            curr: state,
            lane_id: None,
            leader: None,
            control: Control::None,
            advisory: None,
            controlled: false,
            gap: None,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// Gets the vehicle's sequence number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Whether the vehicle is human driven or connected.
    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    /// The vehicle's car following law.
    pub fn law(&self) -> &CarFollowingLaw {
        &self.law
    }

    /// The position in m.
    pub fn pos(&self) -> f64 {
        self.curr.pos
    }

    /// The speed in m/s.
    pub fn vel(&self) -> f64 {
        self.curr.vel
    }

    /// The acceleration in m/s<sup>2</sup>.
    pub fn acc(&self) -> f64 {
        self.curr.acc
    }

    /// The most recently computed state.
    pub fn state(&self) -> &Kinematics {
        &self.curr
    }

    /// The state at the start of the current step,
    /// which the car following law is evaluated against.
    pub fn prev_state(&self) -> &Kinematics {
        &self.prev
    }

    /// The ID of the lane the vehicle is travelling in.
    pub fn lane_id(&self) -> Option<LaneId> {
        self.lane_id
    }

    /// The ID of the vehicle directly ahead, if there is one.
    pub fn leader(&self) -> Option<VehicleId> {
        self.leader
    }

    /// The external control signal.
    pub fn control(&self) -> Control {
        self.control
    }

    /// Whether a speed advisory has been installed.
    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    /// The gap to the leader used in the last step, in m.
    pub fn gap(&self) -> Option<f64> {
        self.gap
    }

    pub(crate) fn set_leader(&mut self, leader: Option<VehicleId>) {
        self.leader = leader;
    }

    pub(crate) fn set_lane(&mut self, lane_id: Option<LaneId>) {
        self.lane_id = lane_id;
    }

    /// Begins a new step: the most recent state becomes the baseline.
    pub fn shift_state(&mut self) {
        self.prev = self.curr;
    }

    /// Stores the external control signal.
    /// It only has an effect while the vehicle has no leader.
    pub fn apply_control(&mut self, control: Control) {
        self.control = control;
    }

    /// Installs a speed advisory as the vehicle's desired speed profile.
    /// Only the first advisory is accepted; returns `false` if one is already installed.
    pub fn register_control_speed(&mut self, advisory: SpeedAdvisory) -> bool {
        if self.controlled {
            return false;
        }
        debug!(
            "vehicle {} accepted a {:?} speed advisory",
            self.number,
            advisory.domain()
        );
        self.advisory = Some(advisory);
        self.controlled = true;
        true
    }

    /// The speed the vehicle wants to travel at, in m/s.
    ///
    /// This is the installed advisory evaluated at the vehicle's position or
    /// at `time`, falling back to the free flow speed.
    pub fn desired_speed(&self, time: f64, fd: &FundamentalDiagram) -> f64 {
        self.advisory
            .as_ref()
            .and_then(|advisory| advisory.desired_speed(self.prev.pos, time))
            .unwrap_or_else(|| fd.free_flow_speed())
    }

    /// Computes a new acceleration and integrates the vehicle's speed and position.
    /// Must be called after [Vehicle::shift_state], and after the leader has been evolved.
    ///
    /// # Parameters
    /// * `leader` - The baseline state of the leader for this step
    /// * `time` - The simulation time in s
    /// * `fd` - The fundamental diagram of the road
    /// * `rng` - The source of randomness for stochastic laws
    pub fn evolve<R: Rng + ?Sized>(
        &mut self,
        leader: Option<&Kinematics>,
        time: f64,
        fd: &FundamentalDiagram,
        rng: &mut R,
    ) {
        let desired_speed = self.desired_speed(time, fd);
        let acc = self
            .law
            .compute_acceleration(&self.prev, leader, desired_speed, self.control, fd, rng);
        if !acc.is_finite() {
            trace!("vehicle {} computed a non-finite acceleration", self.number);
        }
        self.gap = leader.map(|leader| leader.pos - self.prev.pos);
        self.curr = self.prev.integrate(acc, fd.dt());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::advisory::AdvisoryDomain;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use slotmap::SlotMap;

    fn vehicle(attributes: &VehicleAttributes) -> Vehicle {
        let mut keys = SlotMap::<VehicleId, ()>::with_key();
        Vehicle::new(keys.insert(()), 0, attributes)
    }

    #[test]
    fn evolve_is_semi_implicit() {
        let fd = FundamentalDiagram::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = vehicle(&VehicleAttributes {
            pos: 50.0,
            vel: 20.0,
            law: Idm::default().into(),
            ..Default::default()
        });
        veh.shift_state();
        veh.apply_control(Control::Acceleration(-1.0));
        veh.evolve(None, 0.0, &fd, &mut rng);

        let dt = fd.dt();
        assert_approx_eq!(veh.acc(), -1.0);
        assert_approx_eq!(veh.vel(), 20.0 - dt);
        assert_approx_eq!(veh.pos(), 50.0 + (20.0 - dt) * dt);
        assert_eq!(veh.prev_state().pos, 50.0);
        assert_eq!(veh.gap(), None);
    }

    #[test]
    fn shift_promotes_latest_state() {
        let fd = FundamentalDiagram::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = vehicle(&VehicleAttributes {
            pos: 0.0,
            vel: 10.0,
            law: Idm::default().into(),
            ..Default::default()
        });
        veh.apply_control(Control::Acceleration(2.0));
        veh.shift_state();
        veh.evolve(None, 0.0, &fd, &mut rng);
        let latest = *veh.state();
        veh.shift_state();
        assert_eq!(*veh.prev_state(), latest);
    }

    #[test]
    fn advisory_is_installed_once() {
        let fd = FundamentalDiagram::default();
        let mut veh = vehicle(&VehicleAttributes {
            vehicle_type: VehicleType::Cav,
            ..Default::default()
        });
        assert_eq!(veh.desired_speed(0.0, &fd), 25.0);
        assert!(veh.register_control_speed(SpeedAdvisory::new(AdvisoryDomain::Time, |_| 18.0)));
        assert!(veh.is_controlled());
        assert!(!veh.register_control_speed(SpeedAdvisory::new(AdvisoryDomain::Time, |_| 10.0)));
        assert_eq!(veh.desired_speed(0.0, &fd), 18.0);
    }

    #[test]
    fn failing_advisory_falls_back_to_free_flow() {
        let fd = FundamentalDiagram::default();
        let mut veh = vehicle(&Default::default());
        veh.register_control_speed(SpeedAdvisory::new(AdvisoryDomain::Position, |_| f64::NAN));
        assert_eq!(veh.desired_speed(0.0, &fd), fd.free_flow_speed());
    }

    #[test]
    fn advisory_uses_baseline_position() {
        let fd = FundamentalDiagram::default();
        let mut veh = vehicle(&VehicleAttributes {
            pos: 120.0,
            ..Default::default()
        });
        veh.register_control_speed(SpeedAdvisory::new(AdvisoryDomain::Position, |x| x / 10.0));
        assert_approx_eq!(veh.desired_speed(99.0, &fd), 12.0);
    }
}
