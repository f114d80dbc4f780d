use crate::vehicle::dynamics::Kinematics;
use crate::Vehicle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The recorded states of every vehicle over a simulation run.
///
/// Each row is one frame, the first being the initial state; each column
/// is one vehicle, ordered by vehicle number.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    /// Positions in m.
    positions: Vec<Vec<f64>>,
    /// Speeds in m/s.
    speeds: Vec<Vec<f64>>,
    /// Accelerations in m/s<sup>2</sup>.
    accelerations: Vec<Vec<f64>>,
}

impl Trajectory {
    /// The number of recorded frames.
    pub fn num_frames(&self) -> usize {
        self.positions.len()
    }

    /// The number of vehicles in each frame.
    pub fn num_vehicles(&self) -> usize {
        self.positions.first().map(Vec::len).unwrap_or(0)
    }

    /// Positions in m, indexed by frame then vehicle.
    pub fn positions(&self) -> &[Vec<f64>] {
        &self.positions
    }

    /// Speeds in m/s, indexed by frame then vehicle.
    pub fn speeds(&self) -> &[Vec<f64>] {
        &self.speeds
    }

    /// Accelerations in m/s<sup>2</sup>, indexed by frame then vehicle.
    pub fn accelerations(&self) -> &[Vec<f64>] {
        &self.accelerations
    }

    /// The recorded states of a single vehicle, by vehicle number.
    pub fn series(&self, number: usize) -> impl Iterator<Item = Kinematics> + '_ {
        (0..self.num_frames()).filter_map(move |frame| {
            Some(Kinematics {
                pos: *self.positions[frame].get(number)?,
                vel: *self.speeds[frame].get(number)?,
                acc: *self.accelerations[frame].get(number)?,
            })
        })
    }

    /// Appends a frame. The vehicles must be given in order of vehicle number.
    pub(crate) fn record<'a>(&mut self, vehicles: impl Iterator<Item = &'a Vehicle>) {
        let (mut positions, mut speeds, mut accelerations) = (vec![], vec![], vec![]);
        for vehicle in vehicles {
            positions.push(vehicle.pos());
            speeds.push(vehicle.vel());
            accelerations.push(vehicle.acc());
        }
        self.positions.push(positions);
        self.speeds.push(speeds);
        self.accelerations.push(accelerations);
    }

    pub(crate) fn clear(&mut self) {
        self.positions.clear();
        self.speeds.clear();
        self.accelerations.clear();
    }
}
