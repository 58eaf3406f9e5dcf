use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::problem::Num;
use crate::solution::SolutionCost;

/// Counters the LNS engine exposes after every run.
#[derive(Serialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LnsStats {
    pub iterations: usize,
    pub improvements: usize,
    pub rejected_infeasible: usize,
    pub rejected_lahc: usize,
    pub accepted_worse: usize,
    pub repair_failures: usize,
}

impl LnsStats {
    pub fn merge(&mut self, other: &LnsStats) {
        self.iterations += other.iterations;
        self.improvements += other.improvements;
        self.rejected_infeasible += other.rejected_infeasible;
        self.rejected_lahc += other.rejected_lahc;
        self.accepted_worse += other.accepted_worse;
        self.repair_failures += other.repair_failures;
    }
}

#[derive(Serialize, Default, Clone, Copy, Debug)]
pub struct SearchStats {
    pub ils_iterations: usize,
    pub routes_eliminated: usize,
    pub perturbations_reverted: usize,
    pub lns: LnsStats,
}

/// Structured search events; the outer tooling decides formatting.
#[derive(Serialize, Clone, Debug)]
pub enum ProgressEvent {
    IterationDone {
        iteration: usize,
        vehicles: usize,
        distance: Num,
    },
    ImprovementFound {
        iteration: usize,
        vehicles: usize,
        distance: Num,
    },
    LnsStats(LnsStats),
}

impl ProgressEvent {
    pub fn iteration_done(iteration: usize, cost: SolutionCost) -> Self {
        Self::IterationDone {
            iteration,
            vehicles: cost.vehicles,
            distance: cost.distance,
        }
    }

    pub fn improvement_found(iteration: usize, cost: SolutionCost) -> Self {
        Self::ImprovementFound {
            iteration,
            vehicles: cost.vehicles,
            distance: cost.distance,
        }
    }
}

pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent);
}

pub struct DisabledProgress;

impl ProgressObserver for DisabledProgress {
    fn on_event(&mut self, _: &ProgressEvent) {}
}

#[derive(Serialize)]
struct Tracking {
    when: Duration,
    what: ProgressEvent,
}

/// Records the event stream with timestamps relative to construction and
/// serializes it to JSON on request.
pub struct SearchProgressTracking {
    init_datetime: DateTime<Utc>,
    init_instant: Instant,
    events: Vec<Tracking>,
}

impl SearchProgressTracking {
    pub fn new() -> Self {
        Self {
            init_datetime: Utc::now(),
            init_instant: Instant::now(),
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let f = File::create(path)?;
        let mut file = BufWriter::new(&f);
        write!(file, "{{")?;
        write!(file, "\"datetime\":\"{}\",", self.init_datetime)?;
        write!(file, "\"tracks\":[")?;
        for (i, tracking) in self.events.iter().enumerate() {
            if i > 0 {
                write!(file, ",")?;
            }
            write!(file, "{}", serde_json::to_string(tracking)?)?;
        }
        write!(file, "]}}")?;
        Ok(())
    }
}

impl ProgressObserver for SearchProgressTracking {
    fn on_event(&mut self, event: &ProgressEvent) {
        self.events.push(Tracking {
            when: self.init_instant.elapsed(),
            what: event.clone(),
        });
    }
}
