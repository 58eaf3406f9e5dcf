use crate::problem::pdptw::PDPTWInstance;
use crate::problem::Num;
use crate::solution::{route_feasible, Solution};

/// Clarke-Wright-style construction on pair level: one route per request,
/// then merge route pairs along the largest positive savings
/// `s(i, j) = d(i, 0) + d(0, j) - d(i, j)` as long as the concatenation stays
/// feasible. Used as fallback when greedy insertion comes up empty.
pub struct SavingsConstruction<'a> {
    instance: &'a PDPTWInstance,
}

impl<'a> SavingsConstruction<'a> {
    pub fn new(instance: &'a PDPTWInstance) -> Self {
        Self { instance }
    }

    pub fn construct(&self) -> Option<Solution<'a>> {
        let mut routes: Vec<Option<Vec<usize>>> = Vec::new();
        for pickup in self.instance.iter_pickups() {
            let nodes = vec![pickup.id, self.instance.delivery_of(pickup.id)];
            if !route_feasible(self.instance, &nodes) {
                return None;
            }
            routes.push(Some(nodes));
        }

        let mut savings = self.collect_savings(&routes);
        savings.sort_by(|a, b| b.2.total_cmp(&a.2).then((a.0, a.1).cmp(&(b.0, b.1))));

        for (i, j, _) in savings {
            let (Some(head), Some(tail)) = (&routes[i], &routes[j]) else {
                continue;
            };
            let mut merged = head.clone();
            merged.extend_from_slice(tail);
            if route_feasible(self.instance, &merged) {
                routes[i] = Some(merged);
                routes[j] = None;
            }
        }

        Some(Solution::from_routes(
            self.instance,
            routes.into_iter().flatten().collect(),
        ))
    }

    /// Positive savings between the tail of route `i` and the head of route
    /// `j`, for every ordered pair of distinct routes.
    fn collect_savings(&self, routes: &[Option<Vec<usize>>]) -> Vec<(usize, usize, Num)> {
        let mut savings = Vec::new();
        for i in 0..routes.len() {
            let Some(route_i) = &routes[i] else { continue };
            let last = *route_i.last().unwrap();
            for j in 0..routes.len() {
                if i == j {
                    continue;
                }
                let Some(route_j) = &routes[j] else { continue };
                let first = route_j[0];
                let saving = self.instance.distance(last, 0) + self.instance.distance(0, first)
                    - self.instance.distance(last, first);
                if saving > 0.0 {
                    savings.push((i, j, saving));
                }
            }
        }
        savings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validator::validate_solution;
    use crate::problem::pdptw::tests::instance_with_pairs;

    #[test]
    fn merges_collinear_requests_into_one_route() {
        let instance = instance_with_pairs(
            10,
            1000.0,
            &[
                ((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0)),
                ((30.0, 0.0, 0.0, 500.0), (40.0, 0.0, 0.0, 1000.0)),
            ],
        );
        let solution = SavingsConstruction::new(&instance).construct().unwrap();
        assert!(validate_solution(&instance, &solution).is_feasible());
        assert_eq!(solution.vehicle_count(), 1);
    }

    #[test]
    fn keeps_separate_routes_when_merging_is_infeasible() {
        // both pickups close so early that neither can follow the other's
        // delivery, in either concatenation order
        let instance = instance_with_pairs(
            1,
            1000.0,
            &[
                ((10.0, 0.0, 0.0, 12.0), (20.0, 0.0, 0.0, 1000.0)),
                ((0.0, 10.0, 0.0, 12.0), (0.0, 20.0, 0.0, 1000.0)),
            ],
        );
        let solution = SavingsConstruction::new(&instance).construct().unwrap();
        assert!(validate_solution(&instance, &solution).is_feasible());
        assert_eq!(solution.vehicle_count(), 2);
    }

    #[test]
    fn infeasible_singleton_pair_fails_construction() {
        let instance = instance_with_pairs(
            0,
            1000.0,
            &[((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0))],
        );
        assert!(SavingsConstruction::new(&instance).construct().is_none());
    }
}
