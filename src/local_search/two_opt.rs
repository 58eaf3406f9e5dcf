use crate::problem::Num;
use crate::solution::{route_feasible, Solution};
use crate::utils::Tolerance;

/// First improving intra-route segment reversal. A reversal that would put a
/// delivery ahead of its pickup fails the feasibility re-check and is skipped.
pub fn improve(solution: &mut Solution) -> bool {
    let instance = solution.instance();
    for route_idx in 0..solution.routes.len() {
        let nodes = &solution.routes[route_idx].nodes;
        let len = nodes.len();
        for i in 0..len.saturating_sub(1) {
            for j in (i + 1)..len {
                let prev_i = if i == 0 { 0 } else { nodes[i - 1] };
                let next_j = if j == len - 1 { 0 } else { nodes[j + 1] };
                let delta = instance.distance(prev_i, nodes[j])
                    + instance.distance(nodes[i], next_j)
                    - instance.distance(prev_i, nodes[i])
                    - instance.distance(nodes[j], next_j);
                if delta < -Num::tol() {
                    let mut candidate = nodes.clone();
                    candidate[i..=j].reverse();
                    if route_feasible(instance, &candidate) {
                        solution.replace_route_nodes(route_idx, candidate);
                        return true;
                    }
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
    use crate::solution::route_distance;
    use crate::utils::validator::validate_solution;

    #[test]
    fn untangles_a_crossing() {
        // two pairs on one line; visiting d2 before d1 makes the vehicle
        // backtrack, reversing [d1, d2] fixes it
        let instance = instance_with_pairs(
            4,
            10_000.0,
            &[
                ((10.0, 0.0, 0.0, 5000.0), (30.0, 0.0, 0.0, 10_000.0)),
                ((20.0, 0.0, 0.0, 5000.0), (40.0, 0.0, 0.0, 10_000.0)),
            ],
        );
        let mut sol = Solution::from_routes(&instance, vec![vec![1, 3, 4, 2]]);
        let before = route_distance(&instance, &sol.routes[0].nodes);

        assert!(improve(&mut sol));
        assert!(sol.total_cost() < before);
        assert!(validate_solution(&instance, &sol).is_feasible());
    }

    #[test]
    fn refuses_reversals_that_break_precedence() {
        // every distance-improving reversal of this route pulls a delivery
        // ahead of its pickup, so the operator must leave it untouched
        let instance = instance_with_pairs(
            1,
            10_000.0,
            &[
                ((10.0, 0.0, 0.0, 5000.0), (1.0, 0.0, 0.0, 10_000.0)),
                ((11.0, 0.0, 0.0, 5000.0), (30.0, 0.0, 0.0, 10_000.0)),
            ],
        );
        let mut sol = Solution::from_routes(&instance, vec![vec![1, 2, 3, 4]]);
        assert!(!improve(&mut sol));
        assert_eq!(sol.routes[0].nodes, vec![1, 2, 3, 4]);
    }
}
