use rand::seq::SliceRandom;

use crate::solution::Solution;
use crate::utils::Random;

/// Uniform removal of `num` distinct pickup-delivery pairs.
pub struct RandomPairRemoval;

impl RandomPairRemoval {
    pub fn destroy(&self, solution: &mut Solution, rng: &mut Random, num: usize) -> Vec<usize> {
        let mut pickups = solution.assigned_pickups();
        let num = num.min(pickups.len());
        let (selected, _) = pickups.partial_shuffle(rng, num);
        let removed = selected.to_vec();
        for &p_id in &removed {
            solution.remove_pair(p_id);
        }
        removed
    }
}
