use std::ops::RangeInclusive;

use log::debug;
use rand::Rng;
use took::Timer;

use crate::lns::acceptance::{AcceptDecision, LateAcceptance};
use crate::lns::destroy::{DestroyOperator, RandomPairRemoval, ShawRemoval};
use crate::lns::repair::{GreedyInsertion, RegretInsertion, RepairOperator};
use crate::local_search::LocalSearch;
use crate::problem::pdptw::PDPTWInstance;
use crate::solution::Solution;
use crate::utils::stats::{LnsStats, ProgressEvent, ProgressObserver};
use crate::utils::validator::validate_solution;
use crate::utils::{CancellationToken, Countdown, Random, TimeLimit};

pub(crate) mod acceptance;
pub mod destroy;
pub mod repair;

/// Seconds granted to each in-loop local search sweep.
const LS_TIME_BUDGET_SECONDS: u64 = 2;

pub struct Parameters {
    pub max_iterations: usize,
    pub num_destroy_range: RangeInclusive<usize>,
    pub lahc_history: usize,
    pub local_search_every: usize,
    pub regret_k: usize,
}

impl Parameters {
    pub fn default_for_instance(_instance: &PDPTWInstance) -> Self {
        Self {
            max_iterations: 500,
            num_destroy_range: 8..=30,
            lahc_history: 1000,
            local_search_every: 20,
            regret_k: 2,
        }
    }
}

/// Destroy-repair search over pair moves with LAHC acceptance. Candidates are
/// built on a scratch copy; whatever fails the validator gate or the
/// acceptance rule is dropped, the surviving candidate becomes the new
/// current solution.
pub struct LargeNeighborhoodSearch<'a> {
    instance: &'a PDPTWInstance,
    destroy_operators: Vec<DestroyOperator<'a>>,
    repair_operators: Vec<RepairOperator>,
    local_search: LocalSearch<'a>,
    params: Parameters,
}

impl<'a> LargeNeighborhoodSearch<'a> {
    pub fn with_instance(instance: &'a PDPTWInstance, params: Parameters) -> Self {
        Self {
            instance,
            destroy_operators: vec![
                DestroyOperator::RandomPair(RandomPairRemoval),
                DestroyOperator::Shaw(ShawRemoval::with_instance(instance)),
            ],
            repair_operators: vec![
                RepairOperator::Greedy(GreedyInsertion),
                RepairOperator::Regret(RegretInsertion::new(params.regret_k)),
            ],
            local_search: LocalSearch::new(instance),
            params,
        }
    }

    /// Runs the configured number of iterations starting from `current`,
    /// mutating it in place; returns the best solution seen and the counters.
    pub fn run(
        &self,
        current: &mut Solution<'a>,
        rng: &mut Random,
        countdown: &Countdown,
        cancellation: &CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> (Solution<'a>, LnsStats) {
        let mut stats = LnsStats::default();
        let mut best = current.clone();
        let mut lahc = LateAcceptance::with_history(self.params.lahc_history, current.cost());

        for iteration in 0..self.params.max_iterations {
            if countdown.is_finished() || cancellation.is_cancelled() {
                break;
            }
            stats.iterations += 1;

            let num_destroy = rng.gen_range(self.params.num_destroy_range.clone());
            let mut candidate = current.clone();

            let destroy_op = &self.destroy_operators[iteration % self.destroy_operators.len()];
            let removed = destroy_op.destroy(&mut candidate, rng, num_destroy);
            if removed.is_empty() {
                stats.repair_failures += 1;
                continue;
            }

            let repair_op = &self.repair_operators[iteration % self.repair_operators.len()];
            if !repair_op.repair(&mut candidate, &removed) {
                stats.repair_failures += 1;
                continue;
            }

            let improving = candidate.cost().better_than(&current.cost());
            if improving || (iteration + 1) % self.params.local_search_every == 0 {
                let budget = LS_TIME_BUDGET_SECONDS.min(countdown.time_remaining_millis() / 1000);
                if budget > 0 {
                    let ls_countdown = Countdown::new(Timer::new(), TimeLimit::Seconds(budget));
                    self.local_search.run(&mut candidate, &ls_countdown);
                }
            }

            if !validate_solution(self.instance, &candidate).is_feasible() {
                stats.rejected_infeasible += 1;
                continue;
            }

            match lahc.consider(candidate.cost(), current.cost()) {
                AcceptDecision::Rejected => {
                    stats.rejected_lahc += 1;
                    continue;
                }
                AcceptDecision::ImprovedCurrent => stats.improvements += 1,
                AcceptDecision::AcceptedWorse => stats.accepted_worse += 1,
            }
            *current = candidate;

            if current.cost().better_than(&best.cost()) {
                best = current.clone();
                debug!(
                    "lns iteration {}: new best {}/{}",
                    iteration,
                    best.vehicle_count(),
                    best.total_cost()
                );
                observer.on_event(&ProgressEvent::improvement_found(iteration, best.cost()));
            }
        }

        observer.on_event(&ProgressEvent::LnsStats(stats));
        (best, stats)
    }
}
