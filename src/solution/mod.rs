use crate::problem::pdptw::{Capacity, PDPTWInstance};
use crate::problem::Num;
use crate::utils::Tolerance;

/// Lexicographic objective: number of vehicles first, total distance second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolutionCost {
    pub vehicles: usize,
    pub distance: Num,
}

impl SolutionCost {
    pub fn better_than(&self, other: &SolutionCost) -> bool {
        self.vehicles < other.vehicles
            || (self.vehicles == other.vehicles && self.distance < other.distance - Num::tol())
    }

    pub fn not_worse_than(&self, other: &SolutionCost) -> bool {
        self.vehicles < other.vehicles
            || (self.vehicles == other.vehicles && self.distance <= other.distance + Num::tol())
    }
}

/// Ordered non-depot nodes of a single vehicle; the depot endpoints are
/// implicit. The travelled distance is cached and kept in sync by the
/// mutating operations on [Solution].
#[derive(Clone, Debug)]
pub struct Route {
    pub nodes: Vec<usize>,
    distance: Num,
}

impl Route {
    fn from_nodes(instance: &PDPTWInstance, nodes: Vec<usize>) -> Self {
        let distance = route_distance(instance, &nodes);
        Self { nodes, distance }
    }

    pub fn distance(&self) -> Num {
        self.distance
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn recompute(&mut self, instance: &PDPTWInstance) {
        self.distance = route_distance(instance, &self.nodes);
    }
}

/// Depot-to-depot distance of an itinerary of non-depot nodes.
pub fn route_distance(instance: &PDPTWInstance, nodes: &[usize]) -> Num {
    if nodes.is_empty() {
        return 0.0;
    }
    let mut distance = instance.distance(0, nodes[0]);
    for w in nodes.windows(2) {
        distance += instance.distance(w[0], w[1]);
    }
    distance + instance.distance(nodes[nodes.len() - 1], 0)
}

/// Schedule, load, and precedence check for an itinerary of non-depot nodes.
pub fn route_feasible(instance: &PDPTWInstance, nodes: &[usize]) -> bool {
    let depot = &instance.nodes[0];
    let mut time = depot.ready + depot.servicetime;
    let mut load: Capacity = 0;
    let mut prev = 0usize;

    for (pos, &id) in nodes.iter().enumerate() {
        let node = &instance.nodes[id];

        if node.node_type.is_delivery() {
            let p_id = node.pair;
            if !nodes[..pos].contains(&p_id) {
                return false;
            }
        }

        time += instance.time(prev, id);
        if time > node.due {
            return false;
        }
        if time < node.ready {
            time = node.ready;
        }
        time += node.servicetime;

        load += node.demand;
        if load > instance.capacity || load < 0 {
            return false;
        }

        prev = id;
    }

    time + instance.time(prev, 0) <= depot.due
}

/// Travelled distance of `nodes` with the pair of `pickup_id` spliced in at
/// `pickup_pos` / `delivery_pos` (positions in the resulting itinerary), or
/// None when the resulting route would be infeasible.
pub fn simulate_with_pair(
    instance: &PDPTWInstance,
    nodes: &[usize],
    pickup_id: usize,
    pickup_pos: usize,
    delivery_pos: usize,
) -> Option<Num> {
    debug_assert!(pickup_pos < delivery_pos);
    let delivery_id = instance.delivery_of(pickup_id);
    let new_len = nodes.len() + 2;
    debug_assert!(delivery_pos < new_len);

    let node_at = |k: usize| -> usize {
        if k == pickup_pos {
            pickup_id
        } else if k == delivery_pos {
            delivery_id
        } else if k < pickup_pos {
            nodes[k]
        } else if k < delivery_pos {
            nodes[k - 1]
        } else {
            nodes[k - 2]
        }
    };

    let depot = &instance.nodes[0];
    let mut time = depot.ready + depot.servicetime;
    let mut load: Capacity = 0;
    let mut distance = 0.0;
    let mut prev = 0usize;

    for k in 0..new_len {
        let id = node_at(k);
        let node = &instance.nodes[id];

        distance += instance.distance(prev, id);
        time += instance.time(prev, id);
        if time > node.due {
            return None;
        }
        if time < node.ready {
            time = node.ready;
        }
        time += node.servicetime;

        load += node.demand;
        if load > instance.capacity || load < 0 {
            return None;
        }

        prev = id;
    }

    distance += instance.distance(prev, 0);
    time += instance.time(prev, 0);
    if time > depot.due {
        return None;
    }

    Some(distance)
}

/// Cheapest feasible `(pickup_pos, delivery_pos, delta)` of splicing a pair
/// into a plain itinerary.
pub fn best_pair_insertion_into(
    instance: &PDPTWInstance,
    nodes: &[usize],
    base_distance: Num,
    pickup_id: usize,
) -> Option<(usize, usize, Num)> {
    let mut best: Option<(usize, usize, Num)> = None;
    let len = nodes.len();
    for pickup_pos in 0..=len {
        for delivery_pos in (pickup_pos + 1)..=(len + 1) {
            if let Some(distance) =
                simulate_with_pair(instance, nodes, pickup_id, pickup_pos, delivery_pos)
            {
                let delta = distance - base_distance;
                if best.map_or(true, |(_, _, best_delta)| delta < best_delta) {
                    best = Some((pickup_pos, delivery_pos, delta));
                }
            }
        }
    }
    best
}

/// Insertion of a pickup-delivery pair; positions index into the route as it
/// looks after both nodes are in place, so `pickup_pos < delivery_pos`.
#[derive(Copy, Clone, Debug)]
pub struct PairInsertion {
    pub route_idx: usize,
    pub pickup_pos: usize,
    pub delivery_pos: usize,
}

#[derive(Debug)]
pub enum BestInsertion {
    Some(PairInsertion, Num),
    None,
}

impl BestInsertion {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    pub fn replace_if_better(&mut self, other: BestInsertion) {
        match (&self, other) {
            (BestInsertion::None, x) => *self = x,
            (BestInsertion::Some(_, cost_a), BestInsertion::Some(ins_b, cost_b)) => {
                if cost_b < *cost_a {
                    *self = BestInsertion::Some(ins_b, cost_b)
                }
            }
            _ => {}
        }
    }
}

#[derive(Clone)]
pub struct Solution<'a> {
    pub(crate) instance: &'a PDPTWInstance,
    pub routes: Vec<Route>,
}

impl<'a> Solution<'a> {
    pub fn new(instance: &'a PDPTWInstance) -> Self {
        Self {
            instance,
            routes: Vec::new(),
        }
    }

    pub fn from_routes(instance: &'a PDPTWInstance, routes: Vec<Vec<usize>>) -> Self {
        Self {
            instance,
            routes: routes
                .into_iter()
                .filter(|r| !r.is_empty())
                .map(|r| Route::from_nodes(instance, r))
                .collect(),
        }
    }

    pub fn instance(&self) -> &'a PDPTWInstance {
        self.instance
    }

    pub fn vehicle_count(&self) -> usize {
        self.routes.len()
    }

    pub fn total_cost(&self) -> Num {
        self.routes.iter().map(|r| r.distance()).sum()
    }

    pub fn cost(&self) -> SolutionCost {
        SolutionCost {
            vehicles: self.vehicle_count(),
            distance: self.total_cost(),
        }
    }

    /// Pickup ids of every request currently serviced by some route.
    pub fn assigned_pickups(&self) -> Vec<usize> {
        self.routes
            .iter()
            .flat_map(|r| r.nodes.iter())
            .copied()
            .filter(|&id| self.instance.is_pickup(id))
            .collect()
    }

    pub fn find_route_of(&self, node_id: usize) -> Option<(usize, usize)> {
        for (route_idx, route) in self.routes.iter().enumerate() {
            if let Some(pos) = route.nodes.iter().position(|&n| n == node_id) {
                return Some((route_idx, pos));
            }
        }
        None
    }

    /// Distance delta of inserting the pair of `pickup_id` into a route, or
    /// None when any schedule, load, or window constraint breaks. O(len).
    pub fn evaluate_pair_insertion(
        &self,
        route_idx: usize,
        pickup_id: usize,
        pickup_pos: usize,
        delivery_pos: usize,
    ) -> Option<Num> {
        let route = &self.routes[route_idx];
        simulate_with_pair(self.instance, &route.nodes, pickup_id, pickup_pos, delivery_pos)
            .map(|distance| distance - route.distance())
    }

    pub fn find_best_insertion_in_route(&self, pickup_id: usize, route_idx: usize) -> BestInsertion {
        let route = &self.routes[route_idx];
        match best_pair_insertion_into(self.instance, &route.nodes, route.distance(), pickup_id) {
            Some((pickup_pos, delivery_pos, delta)) => BestInsertion::Some(
                PairInsertion {
                    route_idx,
                    pickup_pos,
                    delivery_pos,
                },
                delta,
            ),
            None => BestInsertion::None,
        }
    }

    pub fn find_best_insertion(&self, pickup_id: usize) -> BestInsertion {
        let mut best = BestInsertion::None;
        for route_idx in 0..self.routes.len() {
            best.replace_if_better(self.find_best_insertion_in_route(pickup_id, route_idx));
        }
        best
    }

    pub fn apply_insertion(&mut self, pickup_id: usize, insertion: PairInsertion) {
        let delivery_id = self.instance.delivery_of(pickup_id);
        let route = &mut self.routes[insertion.route_idx];
        route.nodes.insert(insertion.pickup_pos, pickup_id);
        route.nodes.insert(insertion.delivery_pos, delivery_id);
        route.recompute(self.instance);
    }

    /// Opens a fresh route `[p, d]`; false when even that is infeasible.
    pub fn push_pair_route(&mut self, pickup_id: usize) -> bool {
        let delivery_id = self.instance.delivery_of(pickup_id);
        let nodes = vec![pickup_id, delivery_id];
        if !route_feasible(self.instance, &nodes) {
            return false;
        }
        self.routes.push(Route::from_nodes(self.instance, nodes));
        true
    }

    /// Removes pickup and delivery from their route; prunes the route when it
    /// becomes empty. Returns false when the pair is not in the solution.
    pub fn remove_pair(&mut self, pickup_id: usize) -> bool {
        let delivery_id = self.instance.delivery_of(pickup_id);
        let Some((route_idx, _)) = self.find_route_of(pickup_id) else {
            return false;
        };
        let route = &mut self.routes[route_idx];
        route.nodes.retain(|&n| n != pickup_id && n != delivery_id);
        if route.nodes.is_empty() {
            self.routes.remove(route_idx);
        } else {
            self.routes[route_idx].recompute(self.instance);
        }
        true
    }

    /// Replaces a route's itinerary wholesale; caller guarantees feasibility.
    pub fn replace_route_nodes(&mut self, route_idx: usize, nodes: Vec<usize>) {
        if nodes.is_empty() {
            self.routes.remove(route_idx);
        } else {
            self.routes[route_idx] = Route::from_nodes(self.instance, nodes);
        }
    }

    pub fn prune_empty_routes(&mut self) {
        self.routes.retain(|r| !r.is_empty());
    }

    /// Snapshot with a stable route order (by first node visited).
    pub fn to_routes_vec(&self) -> Vec<Vec<usize>> {
        let mut routes: Vec<Vec<usize>> = self
            .routes
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| r.nodes.clone())
            .collect();
        routes.sort_by_key(|r| r[0]);
        routes
    }
}
