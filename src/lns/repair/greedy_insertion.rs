use crate::problem::Num;
use crate::solution::{BestInsertion, PairInsertion, Solution};

/// Global greedy reinsertion: each round inserts the pair whose cheapest
/// feasible insertion is cheapest overall. Pairs no route can take open a
/// fresh route.
pub struct GreedyInsertion;

impl GreedyInsertion {
    pub fn repair(&self, solution: &mut Solution, removed: &[usize]) -> bool {
        let mut remaining: Vec<usize> = removed.to_vec();

        while !remaining.is_empty() {
            let mut best: Option<(usize, PairInsertion, Num)> = None;
            for (idx, &p_id) in remaining.iter().enumerate() {
                if let BestInsertion::Some(insertion, delta) = solution.find_best_insertion(p_id) {
                    if best.as_ref().map_or(true, |(_, _, d)| delta < *d) {
                        best = Some((idx, insertion, delta));
                    }
                }
            }

            match best {
                Some((idx, insertion, _)) => {
                    let p_id = remaining.remove(idx);
                    solution.apply_insertion(p_id, insertion);
                }
                None => {
                    let p_id = remaining.remove(0);
                    if !solution.push_pair_route(p_id) {
                        return false;
                    }
                }
            }
        }
        true
    }
}
