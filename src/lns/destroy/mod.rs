mod random_removal;
mod shaw_removal;

pub use random_removal::RandomPairRemoval;
pub use shaw_removal::ShawRemoval;

use crate::solution::Solution;
use crate::utils::Random;

pub enum DestroyOperator<'a> {
    RandomPair(RandomPairRemoval),
    Shaw(ShawRemoval<'a>),
}

impl DestroyOperator<'_> {
    /// Removes up to `num` pairs and returns their pickup ids.
    pub fn destroy(&self, solution: &mut Solution, rng: &mut Random, num: usize) -> Vec<usize> {
        match self {
            Self::RandomPair(op) => op.destroy(solution, rng, num),
            Self::Shaw(op) => op.destroy(solution, rng, num),
        }
    }
}
