//! Speed advisories broadcast to connected vehicles.

use crate::error::{Error, Result};
use crate::fundamental::FundamentalDiagram;
use crate::math::{pulse, sigmoid, SIGMOID_SCALE};
use crate::VehicleId;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use slotmap::SecondaryMap;
use std::fmt::Debug;
use std::ops::Range;
use std::rc::Rc;

/// The speed reduction announced by a congestion advisory, in m/s.
pub const SPEED_REDUCTION: f64 = 5.5; // m/s

/// The position of the congestion announced by an advisory, in m.
pub const CONGESTION_POSITION: f64 = 15000.0; // m

/// How far past the congestion a pulse advisory extends, in m.
const PULSE_EXTENSION: f64 = 1500.0; // m

/// The variable a speed advisory is a function of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisoryDomain {
    /// The vehicle's position in m.
    Position,
    /// The simulation time in s.
    Time,
}

/// A desired speed profile received by a vehicle.
#[derive(Clone)]
pub struct SpeedAdvisory {
    domain: AdvisoryDomain,
    profile: Rc<dyn Fn(f64) -> f64>,
}

impl SpeedAdvisory {
    /// Creates an advisory from an arbitrary speed profile.
    pub fn new(domain: AdvisoryDomain, profile: impl Fn(f64) -> f64 + 'static) -> Self {
        Self {
            domain,
            profile: Rc::new(profile),
        }
    }

    /// A smooth drop from `v0` to `v0 - drop` centred on `delay`.
    pub fn speed_drop(domain: AdvisoryDomain, v0: f64, drop: f64, delay: f64) -> Self {
        Self::new(domain, move |x| v0 - sigmoid(x, drop, SIGMOID_SCALE, delay))
    }

    /// A temporary reduction from `v0` to `v0 - drop`, starting around `delay`
    /// and lasting `duration`.
    pub fn speed_pulse(
        domain: AdvisoryDomain,
        v0: f64,
        drop: f64,
        delay: f64,
        duration: f64,
    ) -> Self {
        Self::new(domain, move |x| v0 - pulse(x, drop, delay, duration))
    }

    /// Announces a lasting congestion: the free flow speed drops by
    /// [SPEED_REDUCTION] around position `delay`.
    pub fn congestion_drop(fd: &FundamentalDiagram, delay: f64) -> Self {
        Self::speed_drop(AdvisoryDomain::Position, fd.free_flow_speed(), SPEED_REDUCTION, delay)
    }

    /// Announces a congestion which clears past [CONGESTION_POSITION].
    pub fn congestion_pulse(fd: &FundamentalDiagram, delay: f64) -> Self {
        let duration = CONGESTION_POSITION - delay + PULSE_EXTENSION;
        Self::speed_pulse(
            AdvisoryDomain::Position,
            fd.free_flow_speed(),
            SPEED_REDUCTION,
            delay,
            duration,
        )
    }

    /// The variable the advisory is evaluated against.
    pub fn domain(&self) -> AdvisoryDomain {
        self.domain
    }

    /// Evaluates the advised speed for a vehicle at `pos` at simulation time `time`.
    /// Returns `None` if the profile does not produce a finite speed.
    pub fn desired_speed(&self, pos: f64, time: f64) -> Option<f64> {
        let x = match self.domain {
            AdvisoryDomain::Position => pos,
            AdvisoryDomain::Time => time,
        };
        let speed = (self.profile)(x);
        speed.is_finite().then_some(speed)
    }
}

impl Debug for SpeedAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeedAdvisory")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// The thresholds at which individual vehicles accept a broadcast advisory.
#[derive(Clone, Debug)]
pub struct Acceptance {
    domain: AdvisoryDomain,
    thresholds: SecondaryMap<VehicleId, f64>,
}

impl Acceptance {
    /// Creates an empty set of thresholds.
    pub fn new(domain: AdvisoryDomain) -> Self {
        Self {
            domain,
            thresholds: SecondaryMap::new(),
        }
    }

    /// Samples a threshold for each vehicle uniformly from `range`.
    pub fn sample<R: Rng + ?Sized>(
        domain: AdvisoryDomain,
        vehicles: impl IntoIterator<Item = VehicleId>,
        range: Range<f64>,
        rng: &mut R,
    ) -> Result<Self> {
        if !(range.start.is_finite() && range.end.is_finite() && range.start < range.end) {
            return Err(Error::InvalidParameter {
                name: "acceptance range",
                value: range.end - range.start,
            });
        }
        let distr = Uniform::new(range.start, range.end);
        let mut acceptance = Self::new(domain);
        for vehicle_id in vehicles {
            acceptance.set_threshold(vehicle_id, distr.sample(rng));
        }
        Ok(acceptance)
    }

    /// Sets the threshold of a single vehicle.
    pub fn set_threshold(&mut self, vehicle_id: VehicleId, threshold: f64) {
        self.thresholds.insert(vehicle_id, threshold);
    }

    /// Gets the threshold of a vehicle, if it has one.
    pub fn threshold(&self, vehicle_id: VehicleId) -> Option<f64> {
        self.thresholds.get(vehicle_id).copied()
    }

    /// Whether the vehicle has reached its threshold.
    pub fn accepts(&self, vehicle_id: VehicleId, pos: f64, time: f64) -> bool {
        let x = match self.domain {
            AdvisoryDomain::Position => pos,
            AdvisoryDomain::Time => time,
        };
        self.threshold(vehicle_id).is_some_and(|threshold| x >= threshold)
    }
}
