use crate::problem::pdptw::PDPTWInstance;
use crate::solution::Solution;
use crate::utils::Countdown;

mod exchange;
mod relocate;
mod two_opt;

/// Route-level refinement: first-improvement within each operator, round-robin
/// across operators, until one full cycle finds nothing. Every applied move
/// keeps the solution feasible.
pub struct LocalSearch<'a> {
    instance: &'a PDPTWInstance,
}

impl<'a> LocalSearch<'a> {
    pub fn new(instance: &'a PDPTWInstance) -> Self {
        Self { instance }
    }

    pub fn run(&self, solution: &mut Solution, countdown: &Countdown) -> bool {
        debug_assert!(std::ptr::eq(self.instance, solution.instance()));
        let mut improved_any = false;
        loop {
            if countdown.is_finished() {
                break;
            }
            let mut improved = two_opt::improve(solution);
            if countdown.is_time_remaining() {
                improved |= relocate::improve(solution);
            }
            if countdown.is_time_remaining() {
                improved |= exchange::improve(solution);
            }
            if !improved {
                break;
            }
            improved_any = true;
        }
        improved_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::pdptw::tests::instance_with_pairs;
    use crate::utils::validator::validate_solution;

    #[test]
    fn polish_keeps_feasibility_and_never_worsens() {
        let instance = instance_with_pairs(
            4,
            10_000.0,
            &[
                ((10.0, 0.0, 0.0, 5000.0), (20.0, 0.0, 0.0, 10_000.0)),
                ((30.0, 0.0, 0.0, 5000.0), (40.0, 0.0, 0.0, 10_000.0)),
                ((10.0, 8.0, 0.0, 5000.0), (20.0, 8.0, 0.0, 10_000.0)),
            ],
        );
        // deliberately tangled single route
        let mut sol = crate::solution::Solution::from_routes(
            &instance,
            vec![vec![3, 1, 5, 4, 2, 6]],
        );
        assert!(validate_solution(&instance, &sol).is_feasible());
        let before = sol.total_cost();

        let ls = LocalSearch::new(&instance);
        ls.run(&mut sol, &Countdown::empty());

        assert!(validate_solution(&instance, &sol).is_feasible());
        assert!(sol.total_cost() <= before);
    }
}
