use crate::problem::Num;
use crate::solution::{
    best_pair_insertion_into, route_distance, route_feasible, Solution,
};
use crate::utils::Tolerance;

/// First improving exchange: two nodes swapped within one route, or two whole
/// pairs traded between routes. Single nodes never cross routes.
pub fn improve(solution: &mut Solution) -> bool {
    if swap_nodes_within_route(solution) {
        return true;
    }
    exchange_pairs_between_routes(solution)
}

fn swap_nodes_within_route(solution: &mut Solution) -> bool {
    let instance = solution.instance();
    for route_idx in 0..solution.routes.len() {
        let len = solution.routes[route_idx].nodes.len();
        if len < 2 {
            continue;
        }
        let base_distance = solution.routes[route_idx].distance();
        for i in 0..len - 1 {
            for j in (i + 1)..len {
                let nodes = &solution.routes[route_idx].nodes;
                let mut candidate = nodes.clone();
                candidate.swap(i, j);
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

fn exchange_pairs_between_routes(solution: &mut Solution) -> bool {
    let instance = solution.instance();
    let route_count = solution.routes.len();
    for r1 in 0..route_count {
        for r2 in (r1 + 1)..route_count {
            let pickups1: Vec<usize> = pickups_of(solution, r1);
            let pickups2: Vec<usize> = pickups_of(solution, r2);

            for &p1 in &pickups1 {
                let d1 = instance.delivery_of(p1);
                let base1: Vec<usize> = solution.routes[r1]
                    .nodes
                    .iter()
                    .copied()
                    .filter(|&n| n != p1 && n != d1)
                    .collect();
                if !base1.is_empty() && !route_feasible(instance, &base1) {
                    continue;
                }
                let base1_distance = route_distance(instance, &base1);

                for &p2 in &pickups2 {
                    let d2 = instance.delivery_of(p2);
                    let base2: Vec<usize> = solution.routes[r2]
                        .nodes
                        .iter()
                        .copied()
                        .filter(|&n| n != p2 && n != d2)
                        .collect();
                    if !base2.is_empty() && !route_feasible(instance, &base2) {
                        continue;
                    }
                    let base2_distance = route_distance(instance, &base2);

                    let Some((pp1, dp1, delta1)) =
                        best_pair_insertion_into(instance, &base1, base1_distance, p2)
                    else {
                        continue;
                    };
                    let Some((pp2, dp2, delta2)) =
                        best_pair_insertion_into(instance, &base2, base2_distance, p1)
                    else {
                        continue;
                    };

                    let old = solution.routes[r1].distance() + solution.routes[r2].distance();
                    let new = base1_distance + delta1 + base2_distance + delta2;
                    if new - old < -Num::tol() {
                        let mut new1 = base1.clone();
                        new1.insert(pp1, p2);
                        new1.insert(dp1, d2);
                        let mut new2 = base2.clone();
                        new2.insert(pp2, p1);
                        new2.insert(dp2, d1);
                        solution.replace_route_nodes(r1, new1);
                        solution.replace_route_nodes(r2, new2);
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn pickups_of(solution: &Solution, route_idx: usize) -> Vec<usize> {
    let instance = solution.instance();
    solution.routes[route_idx]
        .nodes
        .iter()
        .copied()
        .filter(|&id| instance.is_pickup(id))
        .collect()
}
