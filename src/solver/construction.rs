use clap::ValueEnum;
use log::{info, warn};

use crate::construction::insertion::GreedyPairInsertion;
use crate::construction::savings::SavingsConstruction;
use crate::problem::pdptw::PDPTWInstance;
use crate::solution::Solution;
use crate::solver::SolverError;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum InitialSolutionGeneration {
    GreedyInsertion,
    Savings,
}

/// Builds the initial feasible solution; the alternate constructor serves as
/// fallback when the chosen one comes up empty.
pub fn construct<'a>(
    instance: &'a PDPTWInstance,
    init: InitialSolutionGeneration,
) -> Result<Solution<'a>, SolverError> {
    let primary = match init {
        InitialSolutionGeneration::GreedyInsertion => {
            GreedyPairInsertion::new(instance).construct()
        }
        InitialSolutionGeneration::Savings => SavingsConstruction::new(instance).construct(),
    };

    if let Some(solution) = primary {
        info!(
            "initial solution: {} vehicles, distance {}",
            solution.vehicle_count(),
            solution.total_cost()
        );
        return Ok(solution);
    }

    warn!("primary construction failed, trying fallback constructor");
    let fallback = match init {
        InitialSolutionGeneration::GreedyInsertion => SavingsConstruction::new(instance).construct(),
        InitialSolutionGeneration::Savings => GreedyPairInsertion::new(instance).construct(),
    };

    fallback.ok_or(SolverError::ConstructionInfeasible)
}
