use crate::problem::pdptw::PDPTWInstance;
use crate::solution::{BestInsertion, Solution};

/// Pair-level greedy insertion. Requests are ranked by urgency (ascending
/// pickup due date, ties by pickup window width) and inserted one after
/// another at their cheapest feasible position; a request no open route can
/// take opens a new one.
pub struct GreedyPairInsertion<'a> {
    instance: &'a PDPTWInstance,
}

impl<'a> GreedyPairInsertion<'a> {
    pub fn new(instance: &'a PDPTWInstance) -> Self {
        Self { instance }
    }

    pub fn construct(&self) -> Option<Solution<'a>> {
        let mut pickups: Vec<usize> = self.instance.iter_pickups().map(|n| n.id).collect();
        pickups.sort_by(|&a, &b| {
            let node_a = &self.instance.nodes[a];
            let node_b = &self.instance.nodes[b];
            let width_a = node_a.due - node_a.ready;
            let width_b = node_b.due - node_b.ready;
            node_a
                .due
                .total_cmp(&node_b.due)
                .then(width_a.total_cmp(&width_b))
        });

        let mut solution = Solution::new(self.instance);
        for p_id in pickups {
            match solution.find_best_insertion(p_id) {
                BestInsertion::Some(insertion, _) => solution.apply_insertion(p_id, insertion),
                BestInsertion::None => {
                    if !solution.push_pair_route(p_id) {
                        // not even a dedicated vehicle can serve this request
                        return None;
                    }
                }
            }
        }
        Some(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::pdptw::tests::instance_with_pairs;
    use crate::utils::validator::validate_solution;

    #[test]
    fn single_pair_yields_single_route() {
        let instance = instance_with_pairs(
            1,
            1000.0,
            &[((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0))],
        );
        let solution = GreedyPairInsertion::new(&instance).construct().unwrap();
        assert_eq!(solution.vehicle_count(), 1);
        assert_eq!(solution.routes[0].nodes, vec![1, 2]);
        assert_eq!(solution.total_cost(), 50.0);
        assert!(validate_solution(&instance, &solution).is_feasible());
    }

    #[test]
    fn capacity_zero_with_positive_demand_fails() {
        let instance = instance_with_pairs(
            0,
            1000.0,
            &[((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0))],
        );
        assert!(GreedyPairInsertion::new(&instance).construct().is_none());
    }

    #[test]
    fn unreachable_window_fails() {
        // pickup closes before it can even be left in time for the delivery
        let instance = instance_with_pairs(
            1,
            1000.0,
            &[((10.0, 0.0, 6.0, 5.0), (20.0, 0.0, 0.0, 10.0))],
        );
        assert!(GreedyPairInsertion::new(&instance).construct().is_none());
    }

    #[test]
    fn shares_a_vehicle_when_capacity_allows() {
        let instance = instance_with_pairs(
            10,
            1000.0,
            &[
                ((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0)),
                ((11.0, 0.0, 0.0, 500.0), (21.0, 0.0, 0.0, 1000.0)),
            ],
        );
        let solution = GreedyPairInsertion::new(&instance).construct().unwrap();
        assert!(validate_solution(&instance, &solution).is_feasible());
        assert_eq!(solution.vehicle_count(), 1);
    }
}
