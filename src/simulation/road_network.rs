//! Road network graph owning every street
//!
//! Intersections are graph nodes and streets are directed edges. The street
//! data itself lives in a dense vector indexed by `StreetId`.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use super::error::SimError;
use super::street::SimStreet;
use super::types::{IntersectionId, StreetId, Tick};

#[derive(Debug, Default)]
pub struct SimRoadNetwork {
    /// Directed graph of intersections, each edge carrying its street id
    graph: DiGraph<IntersectionId, StreetId>,

    /// Node index per intersection id
    nodes: Vec<NodeIndex>,

    /// Storage for street data
    streets: Vec<SimStreet>,

    /// Street lookup by unique name
    by_name: HashMap<String, StreetId>,
}

impl SimRoadNetwork {
    /// Creates a network with intersections `0..intersection_count` and no streets
    pub fn new(intersection_count: usize) -> Self {
        let mut graph = DiGraph::with_capacity(intersection_count, 0);
        let nodes = (0..intersection_count)
            .map(|i| graph.add_node(IntersectionId(i)))
            .collect();
        Self {
            graph,
            nodes,
            ..Self::default()
        }
    }

    /// Adds a one-way street and returns its id
    pub fn add_street(
        &mut self,
        name: &str,
        start: IntersectionId,
        end: IntersectionId,
        traversal_time: Tick,
    ) -> Result<StreetId, SimError> {
        let count = self.nodes.len();
        for endpoint in [start, end] {
            if endpoint.0 >= count {
                return Err(SimError::IntersectionOutOfRange {
                    street: name.to_string(),
                    intersection: endpoint.0,
                    count,
                });
            }
        }
        if self.by_name.contains_key(name) {
            return Err(SimError::DuplicateStreet {
                name: name.to_string(),
            });
        }

        let id = StreetId(self.streets.len());
        self.graph
            .add_edge(self.nodes[start.0], self.nodes[end.0], id);
        self.streets
            .push(SimStreet::new(id, name, start, end, traversal_time));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn street(&self, id: StreetId) -> Option<&SimStreet> {
        self.streets.get(id.0)
    }

    pub fn street_mut(&mut self, id: StreetId) -> Option<&mut SimStreet> {
        self.streets.get_mut(id.0)
    }

    /// Like `street_mut`, but treats a missing street as an invariant violation
    pub fn expect_street_mut(&mut self, id: StreetId) -> Result<&mut SimStreet, SimError> {
        self.streets
            .get_mut(id.0)
            .ok_or(SimError::UnknownStreetId(id))
    }

    pub fn street_id(&self, name: &str) -> Option<StreetId> {
        self.by_name.get(name).copied()
    }

    pub fn street_name(&self, id: StreetId) -> Option<&str> {
        self.street(id).map(|s| s.name.as_str())
    }

    pub fn streets(&self) -> impl Iterator<Item = &SimStreet> {
        self.streets.iter()
    }

    /// Streets entering an intersection, in declaration order
    pub fn incoming_streets(&self, intersection: IntersectionId) -> Vec<StreetId> {
        self.adjacent_streets(intersection, Direction::Incoming)
    }

    /// Streets leaving an intersection, in declaration order
    pub fn outgoing_streets(&self, intersection: IntersectionId) -> Vec<StreetId> {
        self.adjacent_streets(intersection, Direction::Outgoing)
    }

    fn adjacent_streets(&self, intersection: IntersectionId, direction: Direction) -> Vec<StreetId> {
        let Some(&node) = self.nodes.get(intersection.0) else {
            return Vec::new();
        };
        // petgraph walks adjacency newest-first
        let mut streets: Vec<StreetId> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| *edge.weight())
            .collect();
        streets.sort_unstable();
        streets
    }

    pub fn street_count(&self) -> usize {
        self.streets.len()
    }

    pub fn intersection_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of cars currently queued on any street
    pub fn queued_cars(&self) -> usize {
        self.streets.iter().map(SimStreet::queue_len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> SimRoadNetwork {
        let mut network = SimRoadNetwork::new(4);
        network.add_street("a", IntersectionId(0), IntersectionId(1), 1).unwrap();
        network.add_street("b", IntersectionId(0), IntersectionId(2), 2).unwrap();
        network.add_street("c", IntersectionId(1), IntersectionId(3), 1).unwrap();
        network.add_street("d", IntersectionId(2), IntersectionId(3), 3).unwrap();
        network
    }

    #[test]
    fn test_adjacency_in_declaration_order() {
        let network = diamond();
        assert_eq!(
            network.outgoing_streets(IntersectionId(0)),
            vec![StreetId(0), StreetId(1)]
        );
        assert_eq!(
            network.incoming_streets(IntersectionId(3)),
            vec![StreetId(2), StreetId(3)]
        );
        assert!(network.incoming_streets(IntersectionId(0)).is_empty());
        assert!(network.incoming_streets(IntersectionId(9)).is_empty());
    }

    #[test]
    fn test_lookup_by_name() {
        let network = diamond();
        assert_eq!(network.street_id("d"), Some(StreetId(3)));
        assert_eq!(network.street_name(StreetId(1)), Some("b"));
        assert_eq!(network.street_id("zzz"), None);
    }

    #[test]
    fn test_duplicate_street_rejected() {
        let mut network = diamond();
        let err = network
            .add_street("a", IntersectionId(1), IntersectionId(2), 1)
            .unwrap_err();
        assert_eq!(err, SimError::DuplicateStreet { name: "a".into() });
    }

    #[test]
    fn test_endpoint_out_of_range_rejected() {
        let mut network = SimRoadNetwork::new(2);
        let err = network
            .add_street("x", IntersectionId(0), IntersectionId(2), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::IntersectionOutOfRange { intersection: 2, count: 2, .. }
        ));
    }
}
