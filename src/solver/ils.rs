use std::ops::RangeInclusive;

use log::{info, warn};
use rand::Rng;
use took::Timer;

use crate::ages;
use crate::lns::{self, LargeNeighborhoodSearch};
use crate::local_search::LocalSearch;
use crate::problem::pdptw::PDPTWInstance;
use crate::solution::Solution;
use crate::solver::construction::{construct, InitialSolutionGeneration};
use crate::solver::{SolveStatus, SolverError, SolverResult};
use crate::utils::stats::{ProgressEvent, ProgressObserver, SearchStats};
use crate::utils::validator::validate_solution;
use crate::utils::{CancellationToken, Countdown, Random, TimeLimit};

pub struct Parameters {
    pub time_limit: TimeLimit,
    pub max_ils_iterations: usize,
    /// None lets the budget pick the inner iteration count
    pub lns_iterations: Option<usize>,
    pub num_destroy_range: RangeInclusive<usize>,
    pub lahc_history: usize,
    pub local_search_every: usize,
    pub no_improvement_stop: usize,
    pub regret_k: usize,
    pub num_perturbations: RangeInclusive<usize>,
    pub init: InitialSolutionGeneration,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            time_limit: TimeLimit::Seconds(60),
            max_ils_iterations: 20,
            lns_iterations: None,
            num_destroy_range: 8..=30,
            lahc_history: 1000,
            local_search_every: 20,
            no_improvement_stop: 5,
            regret_k: 2,
            num_perturbations: 2..=4,
            init: InitialSolutionGeneration::GreedyInsertion,
        }
    }
}

impl Parameters {
    /// Larger wall-clock budgets buy more inner iterations per ILS step.
    fn lns_iterations_for_budget(&self) -> usize {
        if let Some(explicit) = self.lns_iterations {
            return explicit;
        }
        match self.time_limit.as_seconds() {
            seconds if seconds >= 150 => 3000,
            seconds if seconds >= 100 => 2000,
            _ => 500,
        }
    }
}

/// Iterated local search: LNS for cost, AGES for fleet size, a full polish,
/// then a perturbation of the incumbent to diversify the next round. The
/// incumbent only ever moves to validated, lexicographically better
/// solutions.
pub fn solve<'a>(
    instance: &'a PDPTWInstance,
    params: &Parameters,
    warmstart: Option<Solution<'a>>,
    rng: &mut Random,
    cancellation: &CancellationToken,
    observer: &mut dyn ProgressObserver,
) -> Result<SolverResult, SolverError> {
    let timer = Timer::new();
    let countdown = Countdown::new(
        timer.clone(),
        TimeLimit::Seconds(params.time_limit.as_seconds()),
    );

    if cancellation.is_cancelled() {
        return Err(SolverError::Cancelled);
    }

    let mut best = match warmstart {
        Some(solution) => solution,
        None => construct(instance, params.init)?,
    };
    if !validate_solution(instance, &best).is_feasible() {
        // both the constructors and the warmstart path promise feasible
        // input; treat a broken promise as a failed construction rather than
        // search on garbage
        return Err(SolverError::ConstructionInfeasible);
    }
    let mut current = best.clone();

    let lns = LargeNeighborhoodSearch::with_instance(
        instance,
        lns::Parameters {
            max_iterations: params.lns_iterations_for_budget(),
            num_destroy_range: params.num_destroy_range.clone(),
            lahc_history: params.lahc_history,
            local_search_every: params.local_search_every,
            regret_k: params.regret_k,
        },
    );
    let local_search = LocalSearch::new(instance);
    let ages_params = ages::Parameters::default();

    let mut stats = SearchStats::default();
    let mut no_improvement = 0usize;
    let mut status = SolveStatus::IterationLimitReached;

    for iteration in 0..params.max_ils_iterations {
        if countdown.is_finished() {
            status = SolveStatus::TimeLimitReached;
            break;
        }
        if cancellation.is_cancelled() {
            status = SolveStatus::Cancelled;
            break;
        }
        stats.ils_iterations += 1;

        let (mut refined, lns_stats) =
            lns.run(&mut current, rng, &countdown, cancellation, observer);
        stats.lns.merge(&lns_stats);

        stats.routes_eliminated +=
            ages::reduce_vehicles(&mut refined, &ages_params, rng, &countdown, cancellation);

        local_search.run(&mut refined, &countdown);

        if validate_solution(instance, &refined).is_feasible()
            && refined.cost().better_than(&best.cost())
        {
            info!(
                "ils iteration {}: new incumbent {}/{}",
                iteration,
                refined.vehicle_count(),
                refined.total_cost()
            );
            observer.on_event(&ProgressEvent::improvement_found(iteration, refined.cost()));
            best = refined;
            no_improvement = 0;
        } else {
            no_improvement += 1;
        }
        observer.on_event(&ProgressEvent::iteration_done(iteration, best.cost()));

        if no_improvement >= params.no_improvement_stop && countdown.fraction_remaining() < 0.2 {
            status = SolveStatus::EarlyStopped;
            break;
        }

        // diversify: a few random pair-aware moves away from the incumbent,
        // reverted outright when they break anything
        let mut perturbed = best.clone();
        let num_moves = rng.gen_range(params.num_perturbations.clone());
        ages::perform_perturbation(&mut perturbed, rng, num_moves);
        if validate_solution(instance, &perturbed).is_feasible() {
            current = perturbed;
        } else {
            stats.perturbations_reverted += 1;
            current = best.clone();
        }
    }

    if status != SolveStatus::Cancelled {
        // final polish, not bound by the in-loop budget
        local_search.run(&mut best, &Countdown::empty());
        if status == SolveStatus::IterationLimitReached && countdown.is_finished() {
            status = SolveStatus::TimeLimitReached;
        }
        if stats.ils_iterations == params.max_ils_iterations
            && status == SolveStatus::IterationLimitReached
        {
            status = SolveStatus::Completed;
        }
    }

    match validate_solution(instance, &best) {
        result if result.is_feasible() => Ok(SolverResult {
            routes: best.to_routes_vec(),
            vehicles: best.vehicle_count(),
            total_distance: best.total_cost(),
            time: timer.took(),
            status,
            stats,
        }),
        result => {
            warn!("incumbent failed final validation: {:?}", result.violations());
            Err(SolverError::NoFeasibleSolutionFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::pdptw::tests::instance_with_pairs;
    use crate::utils::create_seeded_rng;
    use crate::utils::stats::DisabledProgress;

    fn cluster_instance() -> PDPTWInstance {
        let mut pairs = Vec::new();
        for i in 0..5 {
            let y = (i as f64) * 6.0;
            pairs.push(((10.0, y, 0.0, 5_000.0), (25.0, y, 0.0, 10_000.0)));
        }
        instance_with_pairs(3, 10_000.0, &pairs)
    }

    fn quick_params() -> Parameters {
        Parameters {
            time_limit: TimeLimit::Seconds(5),
            max_ils_iterations: 3,
            lns_iterations: Some(30),
            num_destroy_range: 2..=3,
            lahc_history: 50,
            local_search_every: 10,
            no_improvement_stop: 5,
            regret_k: 2,
            num_perturbations: 2..=4,
            init: InitialSolutionGeneration::GreedyInsertion,
        }
    }

    #[test]
    fn solve_produces_a_feasible_result() {
        let instance = cluster_instance();
        let mut rng = create_seeded_rng(0);
        let result = solve(
            &instance,
            &quick_params(),
            None,
            &mut rng,
            &CancellationToken::new(),
            &mut DisabledProgress,
        )
        .unwrap();

        assert!(result.vehicles >= 2); // capacity 3 cannot do it in one tour
        assert!(result.total_distance > 0.0);
        let serviced: usize = result.routes.iter().map(|r| r.len()).sum();
        assert_eq!(serviced, instance.num_requests * 2);
    }

    #[test]
    fn identical_seed_and_config_reproduce_the_run() {
        let instance = cluster_instance();
        let run = |seed| {
            let mut rng = create_seeded_rng(seed);
            let result = solve(
                &instance,
                &quick_params(),
                None,
                &mut rng,
                &CancellationToken::new(),
                &mut DisabledProgress,
            )
            .unwrap();
            (result.routes, result.vehicles, result.total_distance, result.stats.lns)
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn construction_infeasibility_is_surfaced() {
        let instance = instance_with_pairs(
            0,
            1000.0,
            &[((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0))],
        );
        let mut rng = create_seeded_rng(0);
        let err = solve(
            &instance,
            &quick_params(),
            None,
            &mut rng,
            &CancellationToken::new(),
            &mut DisabledProgress,
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::ConstructionInfeasible));
    }

    #[test]
    fn cancellation_before_start_is_an_error() {
        let instance = cluster_instance();
        let mut rng = create_seeded_rng(0);
        let token = CancellationToken::new();
        token.cancel();

        // already cancelled before construction: hard error
        assert!(matches!(
            solve(
                &instance,
                &quick_params(),
                None,
                &mut rng,
                &token,
                &mut DisabledProgress
            ),
            Err(SolverError::Cancelled)
        ));
    }

    #[test]
    fn cancellation_mid_search_keeps_the_incumbent() {
        struct CancelAfterFirstIteration<'a> {
            token: &'a CancellationToken,
        }
        impl ProgressObserver for CancelAfterFirstIteration<'_> {
            fn on_event(&mut self, event: &ProgressEvent) {
                if matches!(event, ProgressEvent::IterationDone { .. }) {
                    self.token.cancel();
                }
            }
        }

        let instance = cluster_instance();
        let mut rng = create_seeded_rng(0);
        let token = CancellationToken::new();
        let mut observer = CancelAfterFirstIteration { token: &token };

        let result = solve(&instance, &quick_params(), None, &mut rng, &token, &mut observer).unwrap();
        assert_eq!(result.status, SolveStatus::Cancelled);
        let serviced: usize = result.routes.iter().map(|r| r.len()).sum();
        assert_eq!(serviced, instance.num_requests * 2);
    }

    #[test]
    fn single_pair_instance_is_one_route() {
        let instance = instance_with_pairs(
            1,
            1000.0,
            &[((10.0, 0.0, 0.0, 500.0), (20.0, 0.0, 0.0, 1000.0))],
        );
        let mut rng = create_seeded_rng(7);
        let result = solve(
            &instance,
            &quick_params(),
            None,
            &mut rng,
            &CancellationToken::new(),
            &mut DisabledProgress,
        )
        .unwrap();
        assert_eq!(result.vehicles, 1);
        assert_eq!(result.routes, vec![vec![1, 2]]);
        assert_eq!(result.total_distance, 50.0);
    }
}
