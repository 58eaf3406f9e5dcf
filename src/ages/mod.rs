use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::solution::{route_feasible, BestInsertion, PairInsertion, Solution};
use crate::utils::validator::validate_solution;
use crate::utils::{CancellationToken, Countdown, Random};

pub struct Parameters {
    pub max_eliminations: usize,
    pub max_consecutive_failures: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            max_eliminations: 100,
            max_consecutive_failures: 20,
        }
    }
}

/// Vehicle reduction: pick the route with the fewest pairs, tear it apart,
/// and greedily push its requests into the remaining routes. Commits only a
/// fully reinserted, validated result; on failure the input stays untouched.
/// Random route merges run alongside to escape systematic dead-ends.
pub fn reduce_vehicles(
    solution: &mut Solution,
    params: &Parameters,
    rng: &mut Random,
    countdown: &Countdown,
    cancellation: &CancellationToken,
) -> usize {
    let mut eliminated = 0;
    let mut failures = 0;

    while eliminated < params.max_eliminations && failures < params.max_consecutive_failures {
        if countdown.is_finished() || cancellation.is_cancelled() {
            break;
        }
        if solution.vehicle_count() <= 1 {
            break;
        }

        if try_eliminate_smallest_route(solution, rng) {
            eliminated += 1;
            failures = 0;
            debug!("ages: route eliminated, {} vehicles left", solution.vehicle_count());
            continue;
        }

        if try_random_merge(solution, rng) {
            eliminated += 1;
            failures = 0;
            debug!("ages: routes merged, {} vehicles left", solution.vehicle_count());
        } else {
            failures += 1;
        }
    }

    eliminated
}

fn try_eliminate_smallest_route(solution: &mut Solution, rng: &mut Random) -> bool {
    let instance = solution.instance();

    let target = solution
        .routes
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.len()
                .cmp(&b.len())
                .then(a.distance().total_cmp(&b.distance()))
        })
        .map(|(idx, _)| idx)
        .expect("at least two routes");

    let mut pairs: Vec<usize> = solution.routes[target]
        .nodes
        .iter()
        .copied()
        .filter(|&id| instance.is_pickup(id))
        .collect();

    let mut scratch = solution.clone();
    scratch.routes.remove(target);
    pairs.shuffle(rng);

    for p_id in pairs {
        match scratch.find_best_insertion(p_id) {
            BestInsertion::Some(insertion, _) => scratch.apply_insertion(p_id, insertion),
            BestInsertion::None => return false,
        }
    }

    if !validate_solution(instance, &scratch).is_feasible() {
        return false;
    }
    *solution = scratch;
    true
}

/// Concatenation of two random routes, both orders; keeps the result only if
/// the combined schedule works out.
fn try_random_merge(solution: &mut Solution, rng: &mut Random) -> bool {
    let count = solution.vehicle_count();
    if count < 2 {
        return false;
    }
    let instance = solution.instance();
    let i = rng.gen_range(0..count);
    let j = rng.gen_range(0..count - 1);
    let j = if j >= i { j + 1 } else { j };

    for (head, tail) in [(i, j), (j, i)] {
        let mut merged = solution.routes[head].nodes.clone();
        merged.extend_from_slice(&solution.routes[tail].nodes);
        if route_feasible(instance, &merged) {
            let (keep, drop) = (head.min(tail), head.max(tail));
            solution.replace_route_nodes(keep, merged);
            solution.routes.remove(drop);
            return true;
        }
    }
    false
}

/// Random pair-aware moves used by the ILS diversification step: pair
/// relocation, pair swap between routes, and in-route segment shuffles. The
/// result is intentionally unchecked; the caller validates and reverts.
pub fn perform_perturbation(solution: &mut Solution, rng: &mut Random, num_moves: usize) -> usize {
    let mut applied = 0;
    for _ in 0..num_moves {
        let applied_move = match rng.gen_range(0..3) {
            0 => random_pair_relocation(solution, rng),
            1 => random_pair_swap(solution, rng),
            _ => random_segment_shuffle(solution, rng),
        };
        if applied_move {
            applied += 1;
        }
    }
    applied
}

fn random_pair_relocation(solution: &mut Solution, rng: &mut Random) -> bool {
    let pickups = solution.assigned_pickups();
    let Some(&p_id) = pickups.choose(rng) else {
        return false;
    };
    solution.remove_pair(p_id);
    insert_pair_at_random(solution, p_id, None, rng);
    true
}

fn random_pair_swap(solution: &mut Solution, rng: &mut Random) -> bool {
    if solution.vehicle_count() < 2 {
        return false;
    }
    let instance = solution.instance();
    let r1 = rng.gen_range(0..solution.vehicle_count());
    let r2 = {
        let j = rng.gen_range(0..solution.vehicle_count() - 1);
        if j >= r1 {
            j + 1
        } else {
            j
        }
    };

    let pick_from = |solution: &Solution, route_idx: usize, rng: &mut Random| -> Option<usize> {
        let pickups: Vec<usize> = solution.routes[route_idx]
            .nodes
            .iter()
            .copied()
            .filter(|&id| instance.is_pickup(id))
            .collect();
        pickups.choose(rng).copied()
    };

    let Some(p1) = pick_from(solution, r1, rng) else {
        return false;
    };
    let Some(p2) = pick_from(solution, r2, rng) else {
        return false;
    };
    let d1 = instance.delivery_of(p1);
    let d2 = instance.delivery_of(p2);

    // removal prunes emptied routes and shifts indices, so remember a
    // surviving node of each route to find it again afterwards
    let survivor = |solution: &Solution, route_idx: usize, p: usize, d: usize| {
        solution.routes[route_idx]
            .nodes
            .iter()
            .copied()
            .find(|&n| n != p && n != d)
    };
    let anchor1 = survivor(solution, r1, p1, d1);
    let anchor2 = survivor(solution, r2, p2, d2);

    solution.remove_pair(p1);
    solution.remove_pair(p2);

    insert_pair_at_random(solution, p1, anchor2, rng);
    insert_pair_at_random(solution, p2, anchor1, rng);
    true
}

fn insert_pair_at_random(
    solution: &mut Solution,
    pickup_id: usize,
    anchor: Option<usize>,
    rng: &mut Random,
) {
    if solution.routes.is_empty() {
        solution.push_pair_route(pickup_id);
        return;
    }
    let route_idx = anchor
        .and_then(|a| solution.find_route_of(a).map(|(idx, _)| idx))
        .unwrap_or_else(|| rng.gen_range(0..solution.routes.len()));
    let len = solution.routes[route_idx].nodes.len();
    let pickup_pos = rng.gen_range(0..=len);
    let delivery_pos = rng.gen_range(pickup_pos + 1..=len + 1);
    solution.apply_insertion(
        pickup_id,
        PairInsertion {
            route_idx,
            pickup_pos,
            delivery_pos,
        },
    );
}

fn random_segment_shuffle(solution: &mut Solution, rng: &mut Random) -> bool {
    if solution.routes.is_empty() {
        return false;
    }
    let route_idx = rng.gen_range(0..solution.routes.len());
    let len = solution.routes[route_idx].nodes.len();
    if len < 3 {
        return false;
    }
    let seg_len = rng.gen_range(2..=3.min(len));
    let start = rng.gen_range(0..=len - seg_len);

    let mut nodes = solution.routes[route_idx].nodes.clone();
    nodes[start..start + seg_len].shuffle(rng);
    solution.replace_route_nodes(route_idx, nodes);
    true
}
