use crate::problem::Num;
use crate::solution::{BestInsertion, PairInsertion, Solution};

/// Regret-k reinsertion: pairs are ranked by how much is lost when their best
/// route is no longer available (difference between the best and the k-th
/// best per-route insertion cost); the pair with the largest regret goes
/// first, at its best position. Regrets are recomputed after every insertion.
pub struct RegretInsertion {
    k: usize,
}

impl RegretInsertion {
    pub fn new(k: usize) -> Self {
        Self { k: k.max(2) }
    }

    pub fn repair(&self, solution: &mut Solution, removed: &[usize]) -> bool {
        let mut remaining: Vec<usize> = removed.to_vec();

        while !remaining.is_empty() {
            let mut chosen: Option<(usize, Option<PairInsertion>, Num, Num)> = None;

            for (idx, &p_id) in remaining.iter().enumerate() {
                let mut options: Vec<(PairInsertion, Num)> = Vec::new();
                for route_idx in 0..solution.routes.len() {
                    if let BestInsertion::Some(insertion, delta) =
                        solution.find_best_insertion_in_route(p_id, route_idx)
                    {
                        options.push((insertion, delta));
                    }
                }
                options.sort_by(|a, b| a.1.total_cmp(&b.1));

                let (insertion, best_delta, regret) = match options.first() {
                    None => (None, Num::MAX, Num::INFINITY),
                    Some(&(insertion, best_delta)) => {
                        let reference = if options.len() >= self.k {
                            options[self.k - 1].1
                        } else if options.len() >= 2 {
                            options[options.len() - 1].1
                        } else {
                            // a single escape route left: effectively forced
                            Num::INFINITY
                        };
                        let regret = if reference.is_infinite() {
                            Num::INFINITY
                        } else {
                            reference - best_delta
                        };
                        (Some(insertion), best_delta, regret)
                    }
                };

                let replace = match &chosen {
                    None => true,
                    Some((_, _, chosen_best, chosen_regret)) => {
                        regret > *chosen_regret
                            || (regret == *chosen_regret && best_delta < *chosen_best)
                    }
                };
                if replace {
                    chosen = Some((idx, insertion, best_delta, regret));
                }
            }

            let (idx, insertion, _, _) = chosen.expect("remaining is non-empty");
            let p_id = remaining.remove(idx);
            match insertion {
                Some(insertion) => solution.apply_insertion(p_id, insertion),
                None => {
                    if !solution.push_pair_route(p_id) {
                        return false;
                    }
                }
            }
        }
        true
    }
}
