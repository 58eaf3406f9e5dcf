#![allow(dead_code)]

use std::path::Path;

use clap::Parser;
use log::{info, warn};
use rand::random;
use took::Timer;

use crate::cli::Solver;
use crate::io::sintef_solution::{
    create_solution_from_sintef, load_sintef_solution, write_sintef_solution,
    SINTEFSolutionBuilder,
};
use crate::io::load_instance;
use crate::solution::Solution;
use crate::solver::{SolveStatus, SolverResult};
use crate::utils::stats::SearchProgressTracking;
use crate::utils::validator::validate_solution;
use crate::utils::{create_seeded_rng, CancellationToken};

mod ages;
mod cli;
mod construction;
mod io;
mod lns;
mod local_search;
mod problem;
mod solution;
mod solver;
mod utils;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = cli::ProgramArguments::parse();
    info!("{:?}", &args);

    let (seed_value, mut rng) = {
        let seed_value = args.seed.unwrap_or_else(|| random::<i128>().abs());
        info!("seed: {}", seed_value);
        (seed_value, create_seeded_rng(seed_value))
    };

    let load_timer = Timer::new();
    let instance = load_instance(&args.instance)
        .map_err(|e| solver::SolverError::InvalidInstance(e.to_string()))?;
    info!("instance loaded after {}", load_timer.took());

    let mut tracking = SearchProgressTracking::new();
    let cancellation = CancellationToken::new();

    info!("starting solver {:?}", &args.solver.variant);
    let result = match &args.solver.variant {
        Solver::Ils => {
            let params = args.solver.ils_parameters();
            let warmstart = load_warmstart(&args, &instance);
            if let Some(solution) = &warmstart {
                info!(
                    "warmstart incumbent: {} vehicles, distance {}",
                    solution.vehicle_count(),
                    solution.total_cost()
                );
            }
            solver::ils::solve(
                &instance,
                &params,
                warmstart,
                &mut rng,
                &cancellation,
                &mut tracking,
            )?
        }
        Solver::ConstructionOnly => construction_only(&instance, &args.solver)?,
    };

    info!("finished after {}", result.time);
    info!(
        "best solution found: {}/{} ({:?})",
        result.vehicles, result.total_distance, result.status
    );

    if args.print_summary_to_stdout {
        println!(
            "{},{},{}",
            result.vehicles,
            result.total_distance,
            result.time.as_std().as_secs()
        );
    }

    let instance_name = Path::new(&args.instance)
        .file_name()
        .map(|it| it.to_string_lossy().to_string())
        .unwrap_or_else(|| args.instance.clone());

    let solution_out = args.solution.clone().or_else(|| {
        args.solution_directory.as_ref().map(|dir| {
            format!(
                "{}/{}.{}_{}.{}.sol",
                dir, instance_name, result.vehicles, result.total_distance, seed_value
            )
        })
    });

    if let Some(solution_path) = solution_out {
        let mut builder = SINTEFSolutionBuilder::new();
        builder
            .instance_name(instance.name.clone())
            .routes(result.routes.clone());
        write_sintef_solution(&solution_path, &builder.build())?;
        info!("solution written to {}", solution_path);
    }

    if let Some(tracking_filepath) = args.tracking_file.as_ref() {
        tracking.write_json(Path::new(tracking_filepath))?;
    }

    Ok(())
}

/// Runs only the constructor, mirroring the full solver's result shape.
fn construction_only(
    instance: &problem::pdptw::PDPTWInstance,
    args: &cli::SolverArguments,
) -> Result<SolverResult, solver::SolverError> {
    let timer = Timer::new();
    let solution = solver::construction::construct(instance, args.init)?;
    Ok(SolverResult {
        routes: solution.to_routes_vec(),
        vehicles: solution.vehicle_count(),
        total_distance: solution.total_cost(),
        time: timer.took(),
        status: SolveStatus::Completed,
        stats: Default::default(),
    })
}

/// Loads and validates an optional warmstart solution; a feasible one seeds
/// the incumbent.
fn load_warmstart<'a>(
    args: &cli::ProgramArguments,
    instance: &'a problem::pdptw::PDPTWInstance,
) -> Option<Solution<'a>> {
    let path = args.solver.warmstart_solution_file.as_ref()?;
    match load_sintef_solution(path) {
        Ok(sintef) => {
            let solution = create_solution_from_sintef(&sintef, instance);
            if validate_solution(instance, &solution).is_feasible() {
                Some(solution)
            } else {
                warn!("warmstart solution {} is infeasible, ignoring", path);
                None
            }
        }
        Err(e) => {
            warn!("could not read warmstart solution {}: {}", path, e);
            None
        }
    }
}
