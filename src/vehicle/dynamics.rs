#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The longitudinal state of a vehicle at one time step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Kinematics {
    /// The position along the road in m.
    pub pos: f64,
    /// The speed in m/s.
    pub vel: f64,
    /// The acceleration in m/s<sup>2</sup>.
    pub acc: f64,
}

impl Kinematics {
    /// Creates a state with the given position and speed, and zero acceleration.
    pub fn new(pos: f64, vel: f64) -> Self {
        Self { pos, vel, acc: 0.0 }
    }

    /// Advances the state by one step using the semi-implicit Euler scheme.
    ///
    /// The speed is updated first and the *new* speed is used for the position,
    /// so the result is `pos + (vel + acc * dt) * dt`.
    pub fn integrate(&self, acc: f64, dt: f64) -> Self {
        let vel = self.vel + acc * dt;
        let pos = self.pos + vel * dt;
        Self { pos, vel, acc }
    }
}
