use crate::error::{positive, Error, Result};
use crate::lane::Lane;
use crate::link::{Link, LinkAttributes};
use crate::util::is_permutation;
use crate::{LaneId, LaneSet, LinkId, LinkSet};
use log::debug;
use smallvec::SmallVec;

/// A road network: a set of links and the order in which they are resolved.
#[derive(Clone, Debug, Default)]
pub struct Network {
    /// The links in the network.
    links: LinkSet,
    /// The lanes of every link.
    lanes: LaneSet,
    /// The order in which the links are resolved each step.
    link_order: Vec<LinkId>,
}

impl Network {
    /// Creates an empty network.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a network from `(length, lanes)` pairs, one per link.
    pub fn from_links(links: impl IntoIterator<Item = (f64, usize)>) -> Result<Self> {
        let mut network = Self::new();
        for (length, lanes) in links {
            network.add_link(&LinkAttributes { length, lanes })?;
        }
        Ok(network)
    }

    /// Adds a link to the network, along with its lanes.
    /// The link is resolved after all existing links.
    pub fn add_link(&mut self, attributes: &LinkAttributes) -> Result<LinkId> {
        let length = positive("length", attributes.length)?;
        if attributes.lanes == 0 {
            return Err(Error::InvalidParameter {
                name: "lanes",
                value: 0.0,
            });
        }
        let link_id = self.links.insert_with_key(|id| Link::new(id, length, &[]));
        let lanes = (0..attributes.lanes)
            .map(|_| self.lanes.insert_with_key(|id| Lane::new(id, link_id, length)))
            .collect::<SmallVec<[_; 4]>>();
        self.links[link_id] = Link::new(link_id, length, &lanes);
        self.link_order.push(link_id);
        Ok(link_id)
    }

    /// Removes a link and its lanes from the network.
    pub fn remove_link(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.remove(link_id)?;
        for lane_id in link.lane_ids() {
            self.lanes.remove(*lane_id);
        }
        self.link_order.retain(|id| *id != link_id);
        Some(link)
    }

    /// Declares which links feed into which.
    /// Merges and diverges are not modelled, so this has no effect.
    pub fn set_physical_connection(&mut self, from: LinkId, to: LinkId) {
        debug!("ignoring physical connection {:?} -> {:?}", from, to);
    }

    /// The number of links.
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Gets a reference to the link with the given ID.
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(link_id)
    }

    /// Gets a reference to the lane with the given ID.
    pub fn lane(&self, lane_id: LaneId) -> Option<&Lane> {
        self.lanes.get(lane_id)
    }

    pub(crate) fn lane_mut(&mut self, lane_id: LaneId) -> Option<&mut Lane> {
        self.lanes.get_mut(lane_id)
    }

    /// The order in which the links are resolved each step.
    pub fn link_order(&self) -> &[LinkId] {
        &self.link_order
    }

    /// Replaces the link resolution order.
    /// The new order must contain each link exactly once.
    pub fn set_link_order(&mut self, order: &[LinkId]) -> Result<()> {
        let ids = self.links.keys().collect::<Vec<_>>();
        if !is_permutation(order, &ids) {
            return Err(Error::InvalidOrder {
                expected: ids.len(),
            });
        }
        self.link_order = order.to_vec();
        Ok(())
    }

    /// Replaces the lane resolution order of a link.
    pub fn set_lane_order(&mut self, link_id: LinkId, order: &[LaneId]) -> Result<()> {
        match self.links.get_mut(link_id) {
            Some(link) => link.set_lane_order(order),
            None => Err(Error::UnknownLink(link_id)),
        }
    }

    /// Returns an iterator over the links, in resolution order.
    pub fn iter_links(&self) -> impl Iterator<Item = &Link> {
        self.link_order.iter().map(|id| &self.links[*id])
    }

    /// Returns an iterator over every lane, in resolution order:
    /// by link resolution order, then by each link's lane order.
    pub fn iter_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.iter_links()
            .flat_map(|link| link.lane_order().iter())
            .map(|id| &self.lanes[*id])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn links_own_their_lanes() {
        let network = Network::from_links([(20000.0, 1), (10000.0, 2)]).unwrap();
        assert_eq!(network.num_links(), 2);

        let links = network.iter_links().collect::<Vec<_>>();
        assert_eq!(links[0].num_lanes(), 1);
        assert_eq!(links[1].num_lanes(), 2);
        for link in links {
            for lane_id in link.lane_ids() {
                let lane = network.lane(*lane_id).unwrap();
                assert_eq!(lane.link_id(), link.id());
                assert_eq!(lane.length(), link.length());
                assert!(lane.is_empty());
            }
        }
        assert_eq!(network.iter_lanes().count(), 3);
    }

    #[test]
    fn reorders_links_and_lanes() {
        let mut network = Network::from_links([(100.0, 2), (200.0, 1)]).unwrap();
        let order = network.link_order().to_vec();
        network.set_link_order(&[order[1], order[0]]).unwrap();
        assert_eq!(network.iter_links().next().unwrap().length(), 200.0);

        let link = network.link(order[0]).unwrap();
        let lanes = link.lane_ids().to_vec();
        network.set_lane_order(order[0], &[lanes[1], lanes[0]]).unwrap();
        let resolved = network.iter_lanes().map(|lane| lane.id()).collect::<Vec<_>>();
        let first = network.link(order[1]).unwrap().lane_ids()[0];
        assert_eq!(resolved, vec![first, lanes[1], lanes[0]]);
    }

    #[test]
    fn rejects_invalid_orders() {
        let mut network = Network::from_links([(100.0, 2), (200.0, 1)]).unwrap();
        let order = network.link_order().to_vec();
        assert_eq!(
            network.set_link_order(&[order[0], order[0]]),
            Err(Error::InvalidOrder { expected: 2 })
        );
        assert_eq!(
            network.set_link_order(&order[..1]),
            Err(Error::InvalidOrder { expected: 2 })
        );
        let lanes = network.link(order[0]).unwrap().lane_ids().to_vec();
        assert!(network.set_lane_order(order[0], &lanes[..1]).is_err());
        assert_eq!(network.link_order(), &order[..]);
    }

    #[test]
    fn removes_links() {
        let mut network = Network::from_links([(100.0, 2), (200.0, 1)]).unwrap();
        let order = network.link_order().to_vec();
        let lanes = network.link(order[0]).unwrap().lane_ids().to_vec();
        let link = network.remove_link(order[0]).unwrap();
        assert_eq!(link.num_lanes(), 2);
        assert!(network.lane(lanes[0]).is_none());
        assert_eq!(network.link_order(), &order[1..]);
        assert!(network.remove_link(order[0]).is_none());
    }

    #[test]
    fn rejects_invalid_links() {
        let mut network = Network::new();
        let result = network.add_link(&LinkAttributes {
            length: 100.0,
            lanes: 0,
        });
        assert!(matches!(result, Err(Error::InvalidParameter { name: "lanes", .. })));
        let result = network.add_link(&LinkAttributes {
            length: -1.0,
            lanes: 1,
        });
        assert!(matches!(result, Err(Error::InvalidParameter { name: "length", .. })));
        assert_eq!(network.num_links(), 0);
    }

    #[test]
    fn physical_connections_are_inert() {
        let mut network = Network::from_links([(100.0, 1), (200.0, 1)]).unwrap();
        let order = network.link_order().to_vec();
        network.set_physical_connection(order[0], order[1]);
        assert_eq!(network.link_order(), &order[..]);
    }
}
