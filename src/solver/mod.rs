use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use took::Took;

use crate::problem::Num;
use crate::utils::stats::SearchStats;

pub mod construction;
pub mod ils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Completed,
    TimeLimitReached,
    IterationLimitReached,
    EarlyStopped,
    Cancelled,
}

#[derive(Debug)]
pub enum SolverError {
    InvalidInstance(String),
    ConstructionInfeasible,
    NoFeasibleSolutionFound,
    Cancelled,
}

impl Display for SolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInstance(reason) => write!(f, "invalid instance: {}", reason),
            Self::ConstructionInfeasible => {
                write!(f, "construction could not produce a feasible solution")
            }
            Self::NoFeasibleSolutionFound => write!(f, "no feasible solution found"),
            Self::Cancelled => write!(f, "search cancelled before a feasible solution was found"),
        }
    }
}

impl Error for SolverError {}

/// Final outcome of a solver run: a feasible set of routes plus the metadata
/// the caller reports on.
#[derive(Debug)]
pub struct SolverResult {
    /// routes of non-depot node ids, stable order (by first node)
    pub routes: Vec<Vec<usize>>,
    pub vehicles: usize,
    pub total_distance: Num,
    pub time: Took,
    pub status: SolveStatus,
    pub stats: SearchStats,
}
