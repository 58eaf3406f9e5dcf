use crate::problem::Num;
use crate::solution::{
    best_pair_insertion_into, route_distance, route_feasible, PairInsertion, Solution,
};
use crate::utils::Tolerance;

/// First improving relocation: a single node to a new position within its
/// route, or a whole pair into another route. A lone node never leaves its
/// route, that would tear the pair apart.
pub fn improve(solution: &mut Solution) -> bool {
    if relocate_node_within_route(solution) {
        return true;
    }
    relocate_pair_between_routes(solution)
}

fn relocate_node_within_route(solution: &mut Solution) -> bool {
    let instance = solution.instance();
    for route_idx in 0..solution.routes.len() {
        let nodes = &solution.routes[route_idx].nodes;
        let len = nodes.len();
        if len < 3 {
            continue;
        }
        let base_distance = solution.routes[route_idx].distance();
        for pos in 0..len {
            for new_pos in 0..len {
                if new_pos == pos {
                    continue;
                }
                let nodes = &solution.routes[route_idx].nodes;
                let mut candidate = nodes.clone();
                let node = candidate.remove(pos);
                candidate.insert(new_pos, node);
                let delta = route_distance(instance, &candidate) - base_distance;
                if delta < -Num::tol() && route_feasible(instance, &candidate) {
                    solution.replace_route_nodes(route_idx, candidate);
                    return true;
                }
            }
        }
    }
    false
}

fn relocate_pair_between_routes(solution: &mut Solution) -> bool {
    let instance = solution.instance();
    for source_idx in 0..solution.routes.len() {
        let pickups: Vec<usize> = solution.routes[source_idx]
            .nodes
            .iter()
            .copied()
            .filter(|&id| instance.is_pickup(id))
            .collect();

        for p_id in pickups {
            let d_id = instance.delivery_of(p_id);
            let source = &solution.routes[source_idx];
            let reduced: Vec<usize> = source
                .nodes
                .iter()
                .copied()
                .filter(|&n| n != p_id && n != d_id)
                .collect();
            // with inexact triangle inequality a shorter route is not
            // automatically schedulable
            if !reduced.is_empty() && !route_feasible(instance, &reduced) {
                continue;
            }
            let removal_gain = source.distance() - route_distance(instance, &reduced);

            for target_idx in 0..solution.routes.len() {
                if target_idx == source_idx {
                    continue;
                }
                let target = &solution.routes[target_idx];
                let Some((pickup_pos, delivery_pos, insertion_delta)) = best_pair_insertion_into(
                    instance,
                    &target.nodes,
                    target.distance(),
                    p_id,
                ) else {
                    continue;
                };

                if insertion_delta - removal_gain < -Num::tol() {
                    let source_pruned = reduced.is_empty();
                    solution.replace_route_nodes(source_idx, reduced);
                    let target_idx = if source_pruned && target_idx > source_idx {
                        target_idx - 1
                    } else {
                        target_idx
                    };
                    solution.apply_insertion(
                        p_id,
                        PairInsertion {
                            route_idx: target_idx,
                            pickup_pos,
                            delivery_pos,
                        },
                    );
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::pdptw::tests::instance_with_pairs;
    use crate::utils::validator::validate_solution;

    #[test]
    fn moves_a_detour_pair_to_the_matching_route() {
        // pair 2 (nodes 3, 4) sits right on the corridor of route 0 but was
        // assigned its own vehicle
        let instance = instance_with_pairs(
            4,
            10_000.0,
            &[
                ((10.0, 0.0, 0.0, 5000.0), (40.0, 0.0, 0.0, 10_000.0)),
                ((20.0, 0.0, 0.0, 5000.0), (30.0, 0.0, 0.0, 10_000.0)),
            ],
        );
        let mut sol = Solution::from_routes(&instance, vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(sol.vehicle_count(), 2);

        assert!(improve(&mut sol));
        assert_eq!(sol.vehicle_count(), 1);
        assert!(validate_solution(&instance, &sol).is_feasible());
    }

    #[test]
    fn repositions_a_node_within_its_route() {
        // delivery 2 at (40, 0) is visited in the middle, forcing a backtrack
        let instance = instance_with_pairs(
            4,
            10_000.0,
            &[
                ((10.0, 0.0, 0.0, 5000.0), (40.0, 0.0, 0.0, 10_000.0)),
                ((20.0, 5.0, 0.0, 5000.0), (30.0, 5.0, 0.0, 10_000.0)),
            ],
        );
        let mut sol = Solution::from_routes(&instance, vec![vec![1, 3, 2, 4]]);
        let before = sol.total_cost();

        assert!(improve(&mut sol));
        assert!(sol.total_cost() < before);
        assert!(validate_solution(&instance, &sol).is_feasible());
    }
}
