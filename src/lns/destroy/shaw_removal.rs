use rand::seq::SliceRandom;

use crate::problem::pdptw::PDPTWInstance;
use crate::problem::Num;
use crate::solution::Solution;
use crate::utils::Random;

/// Shaw-style removal: seed with one random pair, then grow the removed set
/// by the pair most related to it. Relatedness blends spatial proximity of
/// both endpoints, time-window-centre proximity of the pickups, and whether
/// the pairs share a route.
pub struct ShawRemoval<'a> {
    instance: &'a PDPTWInstance,
    weight_distance: f64,
    weight_time: f64,
    weight_route: f64,
}

impl<'a> ShawRemoval<'a> {
    pub fn with_instance(instance: &'a PDPTWInstance) -> Self {
        Self {
            instance,
            weight_distance: 0.4,
            weight_time: 0.4,
            weight_route: 0.2,
        }
    }

    pub fn destroy(&self, solution: &mut Solution, rng: &mut Random, num: usize) -> Vec<usize> {
        let pickups = solution.assigned_pickups();
        if pickups.is_empty() {
            return vec![];
        }
        let num = num.min(pickups.len());

        // route membership before anything is torn out
        let route_of: Vec<(usize, usize)> = pickups
            .iter()
            .map(|&p| (p, solution.find_route_of(p).unwrap().0))
            .collect();
        let route_idx_of = |p_id: usize| -> usize {
            route_of.iter().find(|(p, _)| *p == p_id).unwrap().1
        };

        let seed = *pickups.choose(rng).unwrap();
        let mut removed = vec![seed];
        let mut remaining: Vec<usize> = pickups.into_iter().filter(|&p| p != seed).collect();

        while removed.len() < num && !remaining.is_empty() {
            let mut best_idx = 0;
            let mut best_score = Num::MIN;
            for (idx, &candidate) in remaining.iter().enumerate() {
                let score: Num = removed
                    .iter()
                    .map(|&other| {
                        self.relatedness(
                            candidate,
                            other,
                            route_idx_of(candidate) == route_idx_of(other),
                        )
                    })
                    .sum::<Num>()
                    / removed.len() as Num;
                if score > best_score {
                    best_score = score;
                    best_idx = idx;
                }
            }
            removed.push(remaining.remove(best_idx));
        }

        for &p_id in &removed {
            solution.remove_pair(p_id);
        }
        removed
    }

    fn relatedness(&self, pickup_a: usize, pickup_b: usize, same_route: bool) -> Num {
        let instance = self.instance;
        let delivery_a = instance.delivery_of(pickup_a);
        let delivery_b = instance.delivery_of(pickup_b);

        let max_distance = instance.max_distance().max(1.0);
        let span = instance.distance(pickup_a, pickup_b) + instance.distance(delivery_a, delivery_b);
        let distance_score = 1.0 - span / (2.0 * max_distance);

        let centre = |id: usize| {
            let node = &instance.nodes[id];
            (node.ready + node.due) / 2.0
        };
        let horizon = instance.planning_horizon().max(1.0);
        let time_score = 1.0 - (centre(pickup_a) - centre(pickup_b)).abs() / horizon;

        let route_score = if same_route { 1.0 } else { 0.0 };

        self.weight_distance * distance_score
            + self.weight_time * time_score
            + self.weight_route * route_score
    }
}
