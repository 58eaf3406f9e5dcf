use std::fmt::{Debug, Formatter};

use anyhow::{bail, Result};

use crate::problem::travel_matrix::FixSizedTravelMatrix;
use crate::problem::{Num, RequestId};

pub(crate) type Capacity = i32;

#[derive(Clone, Debug, PartialEq)]
pub enum NodeType {
    Depot,
    Pickup,
    Delivery,
}

impl NodeType {
    pub fn is_depot(&self) -> bool {
        matches!(self, Self::Depot)
    }
    pub fn is_pickup(&self) -> bool {
        matches!(self, Self::Pickup)
    }
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery)
    }
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Pickup | Self::Delivery)
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: usize,
    pub node_type: NodeType,
    pub x: f64,
    pub y: f64,
    pub demand: Capacity,
    pub ready: Num,
    pub due: Num,
    pub servicetime: Num,
    /// Partner node of the pickup-delivery pair; 0 for the depot.
    pub pair: usize,
}

pub struct PDPTWInstance {
    pub name: String,
    pub num_requests: usize,
    pub capacity: Capacity,
    pub nodes: Vec<Node>,
    pub(crate) travel_matrix: FixSizedTravelMatrix,
    /// request id per node; depot entry is unused
    request_ids: Vec<RequestId>,
    /// pickup node per request id
    pickups: Vec<usize>,
}

impl Debug for PDPTWInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "PDPTW instance '{}': {} requests, capacity {}",
            self.name, self.num_requests, self.capacity
        )
        .and(write!(f, "{:?}", &self.nodes))
    }
}

impl PDPTWInstance {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn distance(&self, from: usize, to: usize) -> Num {
        self.travel_matrix.distance(from, to)
    }

    #[inline(always)]
    pub fn time(&self, from: usize, to: usize) -> Num {
        self.travel_matrix.time(from, to)
    }

    pub fn max_distance(&self) -> Num {
        self.travel_matrix.max_distance()
    }

    /// Latest point in time at which the depot can be re-entered; used as the
    /// normalization horizon for time-related scores.
    pub fn planning_horizon(&self) -> Num {
        self.nodes[0].due
    }

    pub fn node_type(&self, id: usize) -> &NodeType {
        &self.nodes[id].node_type
    }

    pub fn is_pickup(&self, node_id: usize) -> bool {
        self.nodes[node_id].node_type.is_pickup()
    }

    pub fn is_delivery(&self, node_id: usize) -> bool {
        self.nodes[node_id].node_type.is_delivery()
    }

    pub fn pair_of(&self, node_id: usize) -> usize {
        debug_assert!(self.nodes[node_id].node_type.is_request());
        self.nodes[node_id].pair
    }

    pub fn pickup_of(&self, delivery_id: usize) -> usize {
        debug_assert!(self.is_delivery(delivery_id));
        self.nodes[delivery_id].pair
    }

    pub fn delivery_of(&self, pickup_id: usize) -> usize {
        debug_assert!(self.is_pickup(pickup_id));
        self.nodes[pickup_id].pair
    }

    pub fn request_id(&self, node_id: usize) -> RequestId {
        debug_assert!(self.nodes[node_id].node_type.is_request());
        self.request_ids[node_id]
    }

    pub fn pickup_id_of_request(&self, request_id: RequestId) -> usize {
        self.pickups[request_id]
    }

    pub fn iter_pickups(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.node_type.is_pickup())
    }
}

/// Builds the instance after checking the parsed data for self-consistency and
/// tightening the pair time windows the way the travel times dictate.
pub fn create_instance_with(
    name: String,
    capacity: Capacity,
    mut nodes: Vec<Node>,
    travel_matrix: FixSizedTravelMatrix,
) -> Result<PDPTWInstance> {
    if nodes.is_empty() || !nodes[0].node_type.is_depot() {
        bail!("instance must contain a depot at node 0");
    }
    if nodes.len() != travel_matrix.len() {
        bail!(
            "travel matrix covers {} nodes but instance has {}",
            travel_matrix.len(),
            nodes.len()
        );
    }
    if (nodes.len() - 1) % 2 != 0 {
        bail!("expected an even number of non-depot nodes, got {}", nodes.len() - 1);
    }
    if capacity < 0 {
        bail!("vehicle capacity must be non-negative, got {}", capacity);
    }
    if !travel_matrix.is_symmetric() {
        bail!("distance matrix is not symmetric");
    }

    for node in nodes.iter() {
        if node.servicetime < 0.0 {
            bail!("node {} has negative service time", node.id);
        }
        match node.node_type {
            NodeType::Depot => {
                if node.demand != 0 {
                    bail!("depot must have zero demand, got {}", node.demand);
                }
            }
            NodeType::Pickup => {
                if node.demand <= 0 {
                    bail!("pickup {} must have positive demand", node.id);
                }
                if node.pair == 0 || node.pair >= nodes.len() {
                    bail!("pickup {} has invalid delivery partner {}", node.id, node.pair);
                }
            }
            NodeType::Delivery => {
                if node.demand >= 0 {
                    bail!("delivery {} must have negative demand", node.id);
                }
            }
        }
    }

    // pairing must be a bijection over the non-depot nodes
    let mut request_ids = vec![usize::MAX; nodes.len()];
    let mut pickups = Vec::with_capacity((nodes.len() - 1) / 2);
    for id in 1..nodes.len() {
        if !nodes[id].node_type.is_pickup() {
            continue;
        }
        let d_id = nodes[id].pair;
        if !nodes[d_id].node_type.is_delivery() || nodes[d_id].pair != id {
            bail!("pairing mismatch between pickup {} and node {}", id, d_id);
        }
        if nodes[id].demand + nodes[d_id].demand != 0 {
            bail!(
                "demand of pickup {} and delivery {} does not cancel out",
                id,
                d_id
            );
        }
        let request_id = pickups.len();
        request_ids[id] = request_id;
        request_ids[d_id] = request_id;
        pickups.push(id);
    }
    let num_requests = pickups.len();
    if num_requests * 2 != nodes.len() - 1 {
        bail!(
            "instance has {} nodes but only {} pickup-delivery pairs",
            nodes.len(),
            num_requests
        );
    }

    // Tighten the pair windows: a delivery cannot start before its pickup has
    // been served and travelled from; a pickup is pointless after the latest
    // start that still reaches the delivery in time. Pure narrowing, so a
    // window inverting here means the pair was infeasible to begin with; the
    // constructor surfaces that, not the parser.
    for &p_id in pickups.iter() {
        let d_id = nodes[p_id].pair;
        let tt = travel_matrix.time(p_id, d_id);
        let p_st = nodes[p_id].servicetime;

        let earliest_delivery = nodes[p_id].ready + p_st + tt;
        if earliest_delivery > nodes[d_id].ready {
            nodes[d_id].ready = earliest_delivery;
        }
        let latest_pickup = nodes[d_id].due - tt - p_st;
        if latest_pickup < nodes[p_id].due {
            nodes[p_id].due = latest_pickup;
        }
    }

    Ok(PDPTWInstance {
        name,
        num_requests,
        capacity,
        nodes,
        travel_matrix,
        request_ids,
        pickups,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::problem::travel_matrix::FixSizedTravelMatrix;

    pub(crate) fn node(
        id: usize,
        node_type: NodeType,
        x: f64,
        y: f64,
        demand: Capacity,
        ready: Num,
        due: Num,
        servicetime: Num,
        pair: usize,
    ) -> Node {
        Node {
            id,
            node_type,
            x,
            y,
            demand,
            ready,
            due,
            servicetime,
            pair,
        }
    }

    /// depot at origin plus `pairs` as ((x, y, ready, due) pickup, (x, y, ready, due) delivery)
    pub(crate) fn instance_with_pairs(
        capacity: Capacity,
        horizon: Num,
        pairs: &[((f64, f64, Num, Num), (f64, f64, Num, Num))],
    ) -> PDPTWInstance {
        let mut nodes = vec![node(0, NodeType::Depot, 0.0, 0.0, 0, 0.0, horizon, 0.0, 0)];
        let mut coords = vec![(0.0, 0.0)];
        for (i, (p, d)) in pairs.iter().enumerate() {
            let p_id = 1 + i * 2;
            let d_id = p_id + 1;
            nodes.push(node(p_id, NodeType::Pickup, p.0, p.1, 1, p.2, p.3, 0.0, d_id));
            nodes.push(node(d_id, NodeType::Delivery, d.0, d.1, -1, d.2, d.3, 0.0, p_id));
            coords.push((p.0, p.1));
            coords.push((d.0, d.1));
        }
        let matrix = FixSizedTravelMatrix::with_euclidean_distances(&coords, 1.0);
        create_instance_with("test".to_string(), capacity, nodes, matrix).unwrap()
    }

    #[test]
    fn builds_pairing_lookup() {
        let instance = instance_with_pairs(
            10,
            1000.0,
            &[
                ((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0)),
                ((5.0, 5.0, 0.0, 500.0), (8.0, 8.0, 0.0, 1000.0)),
            ],
        );
        assert_eq!(instance.num_requests, 2);
        assert_eq!(instance.delivery_of(1), 2);
        assert_eq!(instance.pickup_of(4), 3);
        assert_eq!(instance.request_id(3), instance.request_id(4));
        assert_eq!(instance.pickup_id_of_request(instance.request_id(3)), 3);
    }

    #[test]
    fn rejects_pairing_mismatch() {
        let nodes = vec![
            node(0, NodeType::Depot, 0.0, 0.0, 0, 0.0, 100.0, 0.0, 0),
            node(1, NodeType::Pickup, 1.0, 0.0, 1, 0.0, 100.0, 0.0, 2),
            node(2, NodeType::Delivery, 2.0, 0.0, -1, 0.0, 100.0, 0.0, 1),
            node(3, NodeType::Pickup, 3.0, 0.0, 1, 0.0, 100.0, 0.0, 2),
            node(4, NodeType::Delivery, 4.0, 0.0, -1, 0.0, 100.0, 0.0, 3),
        ];
        let coords: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x, n.y)).collect();
        let matrix = FixSizedTravelMatrix::with_euclidean_distances(&coords, 1.0);
        let res = create_instance_with("bad".to_string(), 10, nodes, matrix);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_unbalanced_demand() {
        let nodes = vec![
            node(0, NodeType::Depot, 0.0, 0.0, 0, 0.0, 100.0, 0.0, 0),
            node(1, NodeType::Pickup, 1.0, 0.0, 2, 0.0, 100.0, 0.0, 2),
            node(2, NodeType::Delivery, 2.0, 0.0, -1, 0.0, 100.0, 0.0, 1),
        ];
        let coords: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x, n.y)).collect();
        let matrix = FixSizedTravelMatrix::with_euclidean_distances(&coords, 1.0);
        assert!(create_instance_with("bad".to_string(), 10, nodes, matrix).is_err());
    }

    #[test]
    fn tightens_pair_windows() {
        let instance = instance_with_pairs(
            10,
            1000.0,
            &[((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0))],
        );
        // delivery cannot start before pickup.ready + travel(p, d) = 0 + 10
        assert_eq!(instance.nodes[2].ready, 10.0);
        // pickup cannot start after delivery.due - travel(p, d) = 1000 - 10
        assert_eq!(instance.nodes[1].due, 500.0);
    }
}
