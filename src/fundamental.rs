use crate::error::{positive, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default free-flow speed in m/s.
pub const FREE_FLOW_SPEED: f64 = 25.0; // m/s

/// The default shockwave speed in m/s.
pub const WAVE_SPEED: f64 = 6.25; // m/s

/// The default jam density in veh/m.
pub const JAM_DENSITY: f64 = 0.16; // veh/m

/// The triangular fundamental diagram shared by every vehicle in a simulation.
///
/// It fixes the integration time step, `1 / (w * k_x)`, which the
/// car following coefficients are tuned against.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FundamentalDiagram {
    /// The uncongested cruising speed in m/s.
    free_flow_speed: f64,
    /// The propagation speed of congestion waves in m/s.
    wave_speed: f64,
    /// The density at zero speed in veh/m.
    jam_density: f64,
}

impl FundamentalDiagram {
    /// Creates a new fundamental diagram, validating that each parameter is positive.
    pub fn new(free_flow_speed: f64, wave_speed: f64, jam_density: f64) -> Result<Self> {
        Ok(Self {
            free_flow_speed: positive("free_flow_speed", free_flow_speed)?,
            wave_speed: positive("wave_speed", wave_speed)?,
            jam_density: positive("jam_density", jam_density)?,
        })
    }

    /// The free-flow speed in m/s.
    pub fn free_flow_speed(&self) -> f64 {
        self.free_flow_speed
    }

    /// The shockwave speed in m/s.
    pub fn wave_speed(&self) -> f64 {
        self.wave_speed
    }

    /// The jam density in veh/m.
    pub fn jam_density(&self) -> f64 {
        self.jam_density
    }

    /// The integration time step in s.
    pub fn dt(&self) -> f64 {
        1.0 / (self.wave_speed * self.jam_density)
    }

    /// The minimum (jam) spacing between consecutive vehicles in m.
    pub fn jam_spacing(&self) -> f64 {
        1.0 / self.jam_density
    }

    /// The equilibrium spacing of a vehicle travelling at `speed`, in m.
    pub fn equilibrium_spacing(&self, speed: f64) -> f64 {
        self.jam_spacing() + speed / (self.wave_speed * self.jam_density)
    }

    /// The capacity flow in veh/h.
    pub fn capacity(&self) -> f64 {
        let (u, w, k) = (self.free_flow_speed, self.wave_speed, self.jam_density);
        u * w * k / (u + w) * 3600.0
    }
}

impl Default for FundamentalDiagram {
    fn default() -> Self {
        Self {
            free_flow_speed: FREE_FLOW_SPEED,
            wave_speed: WAVE_SPEED,
            jam_density: JAM_DENSITY,
        }
    }
}
