use crate::error::{Error, Result};
use crate::util::is_permutation;
use crate::{LaneId, LinkId};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default length of a link in m.
pub const LINK_LENGTH: f64 = 20000.0; // m

/// A stretch of road made up of parallel lanes.
///
/// The link only records which lanes it owns and in which order they are
/// resolved; it knows nothing about the lateral arrangement of the lanes.
#[derive(Clone, Debug)]
pub struct Link {
    /// The link ID.
    id: LinkId,
    /// The length of the link in m.
    length: f64,
    /// The lanes of the link.
    lanes: SmallVec<[LaneId; 4]>,
    /// The order in which the lanes are resolved each step.
    lane_order: SmallVec<[LaneId; 4]>,
}

/// The attributes of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkAttributes {
    /// The length in m.
    pub length: f64,
    /// The number of lanes.
    pub lanes: usize,
}

impl Default for LinkAttributes {
    fn default() -> Self {
        Self {
            length: LINK_LENGTH,
            lanes: 1,
        }
    }
}

impl Link {
    /// Creates a new link owning the given lanes.
    pub(crate) fn new(id: LinkId, length: f64, lanes: &[LaneId]) -> Self {
        Self {
            id,
            length,
            lanes: lanes.into(),
            lane_order: lanes.into(),
        }
    }

    /// Gets the link's ID.
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Gets the length of the link in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The number of lanes.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// The IDs of the link's lanes, in creation order.
    pub fn lane_ids(&self) -> &[LaneId] {
        &self.lanes
    }

    /// The order in which the lanes are resolved each step.
    pub fn lane_order(&self) -> &[LaneId] {
        &self.lane_order
    }

    /// Replaces the lane resolution order.
    /// The new order must contain each of the link's lanes exactly once.
    pub(crate) fn set_lane_order(&mut self, order: &[LaneId]) -> Result<()> {
        if !is_permutation(order, &self.lanes) {
            return Err(Error::InvalidOrder {
                expected: self.lanes.len(),
            });
        }
        self.lane_order = order.into();
        Ok(())
    }

    /// Resolves conflicts between vehicles merging within the link.
    /// Merging is not modelled, so this does nothing.
    pub(crate) fn solve_merges(&self) {}
}
