use clap::{Parser, ValueEnum};

use crate::solver::construction::InitialSolutionGeneration;
use crate::solver::ils;
use crate::utils::TimeLimit;

#[derive(Parser, Debug)]
#[command(version)]
pub struct ProgramArguments {
    #[arg(long, help = "rng seed")]
    pub seed: Option<i128>,

    #[arg(short, long, help = "instance file path")]
    pub instance: String,

    #[arg(short, long, help = "solution file path")]
    pub solution: Option<String>,

    #[arg(
        long,
        help = "directory to store the solution",
        conflicts_with = "solution"
    )]
    pub solution_directory: Option<String>,

    #[arg(long, help = "file to store the progress track as JSON")]
    pub tracking_file: Option<String>,

    #[command(flatten)]
    pub solver: SolverArguments,

    #[arg(long, help = "print summary to stdout", default_value = "false")]
    pub print_summary_to_stdout: bool,
}

#[derive(Clone, ValueEnum, Debug)]
pub enum Solver {
    Ils,
    ConstructionOnly,
}

#[derive(clap::Args, Clone, Debug)]
pub struct SolverArguments {
    #[arg(long = "solver", value_enum, default_value = "ils")]
    pub variant: Solver,

    #[arg(long, default_value = "60")]
    pub time_limit_s: u64,

    #[arg(long, default_value = "20")]
    pub max_ils_iterations: usize,

    #[arg(long, help = "inner LNS iterations per ILS step (default scales with the time budget)")]
    pub lns_iterations: Option<usize>,

    #[arg(long, default_value = "8")]
    pub destroy_min: usize,

    #[arg(long, default_value = "30")]
    pub destroy_max: usize,

    #[arg(long, default_value = "1000")]
    pub lahc_history: usize,

    #[arg(long, default_value = "20")]
    pub local_search_every: usize,

    #[arg(long, default_value = "5")]
    pub no_improvement_stop: usize,

    #[arg(long, default_value = "2")]
    pub regret_k: usize,

    #[arg(long, value_enum, default_value = "greedy-insertion")]
    pub init: InitialSolutionGeneration,

    #[arg(long, help = "solution file to warmstart the solver")]
    pub warmstart_solution_file: Option<String>,
}

impl SolverArguments {
    pub fn ils_parameters(&self) -> ils::Parameters {
        let lo = self.destroy_min.min(self.destroy_max).max(1);
        let hi = self.destroy_max.max(self.destroy_min).max(1);
        ils::Parameters {
            time_limit: TimeLimit::Seconds(self.time_limit_s),
            max_ils_iterations: self.max_ils_iterations,
            lns_iterations: self.lns_iterations,
            num_destroy_range: lo..=hi,
            lahc_history: self.lahc_history,
            local_search_every: self.local_search_every.max(1),
            no_improvement_stop: self.no_improvement_stop,
            regret_k: self.regret_k,
            num_perturbations: 2..=4,
            init: self.init,
        }
    }
}
