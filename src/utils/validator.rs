use fixedbitset::FixedBitSet;

use crate::problem::pdptw::{Capacity, NodeType, PDPTWInstance};
use crate::problem::Num;
use crate::solution::Solution;

/// Everything a route or solution can get wrong, with enough context to
/// pinpoint the offending stop. Diagnostic only; the search never branches on
/// the concrete kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// delivery whose pickup is not on the same route
    UnpairedDelivery { node: usize },
    /// pickup and delivery share the route but in the wrong order
    DeliveryBeforePickup { route: usize, node: usize },
    /// request not serviced by any route
    MissingRequest { pickup: usize },
    DuplicateVisit { node: usize },
    CapacityOverflow {
        route: usize,
        position: usize,
        load: Capacity,
    },
    TimeWindowViolation {
        route: usize,
        position: usize,
        arrival: Num,
        due: Num,
    },
    DepotReturnLate {
        route: usize,
        arrival: Num,
        due: Num,
    },
}

#[derive(Debug)]
pub enum ValidatorResult {
    Feasible(Num),
    Violations(Vec<Violation>),
}

impl ValidatorResult {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible(_))
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Feasible(_) => &[],
            Self::Violations(violations) => violations,
        }
    }
}

/// Walks one route, recording violations and marking visited nodes. Returns
/// the travelled distance (meaningful only for clean routes).
fn validate_route(
    instance: &PDPTWInstance,
    route_idx: usize,
    nodes: &[usize],
    visited: &mut FixedBitSet,
    violations: &mut Vec<Violation>,
) -> Num {
    let depot = &instance.nodes[0];
    let mut time = depot.ready + depot.servicetime;
    let mut load: Capacity = 0;
    let mut distance = 0.0;
    let mut prev = 0usize;

    let mut open_pickups = FixedBitSet::with_capacity(instance.num_nodes());

    for (position, &id) in nodes.iter().enumerate() {
        if visited.contains(id) {
            violations.push(Violation::DuplicateVisit { node: id });
        }
        visited.insert(id);

        let node = &instance.nodes[id];
        match node.node_type {
            NodeType::Pickup => {
                open_pickups.insert(id);
            }
            NodeType::Delivery => {
                if !open_pickups.contains(node.pair) {
                    if nodes[position..].contains(&node.pair) {
                        violations.push(Violation::DeliveryBeforePickup {
                            route: route_idx,
                            node: id,
                        });
                    } else {
                        violations.push(Violation::UnpairedDelivery { node: id });
                    }
                } else {
                    open_pickups.set(node.pair, false);
                }
            }
            NodeType::Depot => {
                violations.push(Violation::DuplicateVisit { node: id });
            }
        }

        distance += instance.distance(prev, id);
        time += instance.time(prev, id);
        if time > node.due {
            violations.push(Violation::TimeWindowViolation {
                route: route_idx,
                position,
                arrival: time,
                due: node.due,
            });
        }
        if time < node.ready {
            time = node.ready;
        }
        time += node.servicetime;

        load += node.demand;
        if load > instance.capacity || load < 0 {
            violations.push(Violation::CapacityOverflow {
                route: route_idx,
                position,
                load,
            });
        }

        prev = id;
    }

    if !nodes.is_empty() {
        distance += instance.distance(prev, 0);
        time += instance.time(prev, 0);
        if time > depot.due {
            violations.push(Violation::DepotReturnLate {
                route: route_idx,
                arrival: time,
                due: depot.due,
            });
        }
    }

    // pickups whose delivery never showed up on this route
    for p_id in open_pickups.ones() {
        violations.push(Violation::UnpairedDelivery {
            node: instance.delivery_of(p_id),
        });
    }

    distance
}

/// Single source of truth for feasibility. Never mutates its input; runs in
/// O(total nodes).
pub fn validate_solution(instance: &PDPTWInstance, solution: &Solution) -> ValidatorResult {
    let mut violations = Vec::new();
    let mut visited = FixedBitSet::with_capacity(instance.num_nodes());

    let mut total_distance = 0.0;
    for (route_idx, route) in solution.routes.iter().enumerate() {
        total_distance += validate_route(
            instance,
            route_idx,
            &route.nodes,
            &mut visited,
            &mut violations,
        );
    }

    for pickup in instance.iter_pickups() {
        if !visited.contains(pickup.id) {
            violations.push(Violation::MissingRequest { pickup: pickup.id });
        }
    }

    if violations.is_empty() {
        ValidatorResult::Feasible(total_distance)
    } else {
        ValidatorResult::Violations(violations)
    }
}

#[track_caller]
pub fn assert_valid_solution(instance: &PDPTWInstance, solution: &Solution) {
    match validate_solution(instance, solution) {
        ValidatorResult::Feasible(_) => {}
        ValidatorResult::Violations(violations) => {
            panic!("solution violates constraints: {:?}", violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::pdptw::tests::instance_with_pairs;
    use crate::problem::pdptw::PDPTWInstance;

    fn instance() -> PDPTWInstance {
        instance_with_pairs(
            1,
            1000.0,
            &[
                ((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0)),
                ((10.0, 5.0, 0.0, 500.0), (20.0, 5.0, 0.0, 1000.0)),
            ],
        )
    }

    #[test]
    fn accepts_feasible_solution_and_reports_distance() {
        let instance = instance();
        let sol = Solution::from_routes(&instance, vec![vec![1, 2], vec![3, 4]]);
        match validate_solution(&instance, &sol) {
            ValidatorResult::Feasible(distance) => {
                assert_eq!(distance, sol.total_cost());
            }
            other => panic!("expected feasible, got {:?}", other),
        }
    }

    #[test]
    fn detects_delivery_before_pickup() {
        let instance = instance();
        let sol = Solution::from_routes(&instance, vec![vec![2, 1], vec![3, 4]]);
        let result = validate_solution(&instance, &sol);
        assert!(result
            .violations()
            .iter()
            .any(|v| matches!(v, Violation::DeliveryBeforePickup { node: 2, .. })));
    }

    #[test]
    fn detects_unpaired_delivery_across_routes() {
        let instance = instance();
        let sol = Solution::from_routes(&instance, vec![vec![1, 4], vec![3, 2]]);
        let result = validate_solution(&instance, &sol);
        assert!(result
            .violations()
            .iter()
            .any(|v| matches!(v, Violation::UnpairedDelivery { .. })));
    }

    #[test]
    fn detects_missing_and_duplicate_requests() {
        let instance = instance();
        let missing = Solution::from_routes(&instance, vec![vec![1, 2]]);
        assert!(validate_solution(&instance, &missing)
            .violations()
            .iter()
            .any(|v| matches!(v, Violation::MissingRequest { pickup: 3 })));

        let duplicated = Solution::from_routes(&instance, vec![vec![1, 2], vec![1, 2], vec![3, 4]]);
        assert!(validate_solution(&instance, &duplicated)
            .violations()
            .iter()
            .any(|v| matches!(v, Violation::DuplicateVisit { node: 1 })));
    }

    #[test]
    fn detects_capacity_overflow_with_position() {
        let instance = instance();
        let sol = Solution::from_routes(&instance, vec![vec![1, 3, 2, 4]]);
        let result = validate_solution(&instance, &sol);
        assert!(result.violations().iter().any(|v| matches!(
            v,
            Violation::CapacityOverflow {
                route: 0,
                position: 1,
                load: 2
            }
        )));
    }

    #[test]
    fn detects_time_window_and_depot_return_violations() {
        let tight = instance_with_pairs(
            1,
            25.0,
            &[((10.0, 0.0, 0.0, 5.0), (20.0, 0.0, 0.0, 22.0))],
        );
        // pickup reachable (t=10 > due 5 fails)
        let sol = Solution::from_routes(&tight, vec![vec![1, 2]]);
        let result = validate_solution(&tight, &sol);
        assert!(result
            .violations()
            .iter()
            .any(|v| matches!(v, Violation::TimeWindowViolation { .. })));

        // every stop on time, only the way back to the depot is late:
        // service ends at t = 20, return at 20 + 20 = 40 > 39
        let late_return = instance_with_pairs(
            1,
            39.0,
            &[((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 25.0))],
        );
        let sol = Solution::from_routes(&late_return, vec![vec![1, 2]]);
        let result = validate_solution(&late_return, &sol);
        assert!(result
            .violations()
            .iter()
            .any(|v| matches!(v, Violation::DepotReturnLate { .. })));
    }
}
