use crate::backend::SolverBackend;
use crate::config::{OptimizerConfig, SearchLimits};
use crate::data::{Roster, SlotAssignment, Solution};
use crate::enumerate::{enumerate_slot_assignments, search_space_upper_bound};
use crate::error::{PlacementError, ScheduleError};
use crate::roster::RosterProvider;
use crate::solver::AssignmentSolver;
use crate::validation::validate_roster;
use log::{debug, info, warn};
use serde::Serialize;
use std::time::Instant;

/// Placements handed to each worker per batch when evaluating in parallel.
const BATCH_PER_WORKER: usize = 4;

/// Unpruned search spaces above this size get a warning before the search.
const LARGE_SEARCH_SPACE: u128 = 100_000;

/// Counters describing one optimization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub placements: usize,
    pub feasible: usize,
    pub infeasible: usize,
    pub backend_errors: usize,
    /// A limit ended the search before every placement was evaluated.
    pub stopped_early: bool,
    pub elapsed_secs: f64,
}

/// The best solution of a run and how the search went.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimized {
    pub solution: Solution,
    pub report: SearchReport,
}

/// Best solution seen so far, tagged with its enumeration index.
///
/// Only a strictly greater utility replaces the incumbent, so ties keep the
/// placement enumerated first as long as offers arrive in index order.
#[derive(Debug, Default)]
struct Incumbent {
    best: Option<(usize, Solution)>,
}

impl Incumbent {
    fn offer(&mut self, index: usize, candidate: Solution) {
        let improves = self
            .best
            .as_ref()
            .is_none_or(|(_, best)| candidate.total_utility > best.total_utility);
        if improves {
            info!(
                "New incumbent at placement #{} {} with utility {}",
                index, candidate.slot_assignment, candidate.total_utility
            );
            self.best = Some((index, candidate));
        }
    }
}

/// Exhaustive outer search: one assignment solve per enumerated placement.
pub struct GlobalOptimizer<'a> {
    solver: AssignmentSolver<'a>,
    limits: SearchLimits,
    workers: usize,
}

impl<'a> GlobalOptimizer<'a> {
    pub fn new(backend: &'a dyn SolverBackend) -> Self {
        Self {
            solver: AssignmentSolver::new(backend),
            limits: SearchLimits::unlimited(),
            workers: 1,
        }
    }

    pub fn from_config(backend: &'a dyn SolverBackend, config: &OptimizerConfig) -> Self {
        Self::new(backend)
            .with_limits(config.limits())
            .with_workers(config.workers)
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn optimize(&self, provider: &dyn RosterProvider) -> Result<Optimized, ScheduleError> {
        let start_time = Instant::now();
        let roster = provider.snapshot();
        validate_roster(&roster).map_err(ScheduleError::InvalidConfiguration)?;

        info!(
            "Optimizing {} students over {} shows and {} slots with {} worker(s) using {}",
            roster.students.len(),
            roster.shows.len(),
            roster.slots.len(),
            self.workers,
            self.solver.backend_name()
        );
        match search_space_upper_bound(roster.slots.len(), roster.shows.len()) {
            Some(bound) if bound <= LARGE_SEARCH_SPACE => {
                debug!("At most {} placements to evaluate", bound)
            }
            bound => warn!(
                "Placement space is large ({}); consider setting a time limit or placement cap",
                bound.map_or_else(|| "overflow".to_string(), |b| b.to_string())
            ),
        }

        let mut report = SearchReport::default();
        let mut incumbent = Incumbent::default();
        let mut placements = enumerate_slot_assignments(&roster.slots, &roster.shows)
            .enumerate()
            .peekable();

        loop {
            if self.limits.reached(report.placements) {
                report.stopped_early = placements.peek().is_some();
                break;
            }

            if self.workers <= 1 {
                let Some((index, placement)) = placements.next() else {
                    break;
                };
                let result = self.solver.solve(&roster, &placement);
                record(&mut report, &mut incumbent, index, &placement, result);
                continue;
            }

            let mut batch_size = self.workers * BATCH_PER_WORKER;
            if let Some(max) = self.limits.max_placements {
                batch_size = batch_size.min(max.saturating_sub(report.placements));
            }
            let batch: Vec<(usize, SlotAssignment)> = placements.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len();
            let mut results = self.evaluate_batch(&roster, batch);
            results.sort_by_key(|(index, _, _)| *index);
            let finished = results.len();
            for (index, placement, result) in results {
                record(&mut report, &mut incumbent, index, &placement, result);
            }
            if finished < batch_len {
                // the deadline passed mid-batch
                report.stopped_early = true;
                break;
            }
        }

        report.elapsed_secs = start_time.elapsed().as_secs_f64();
        info!(
            "Search finished in {:.2}s: {} placements, {} feasible, {} infeasible, {} backend errors{}",
            report.elapsed_secs,
            report.placements,
            report.feasible,
            report.infeasible,
            report.backend_errors,
            if report.stopped_early { ", stopped early" } else { "" }
        );

        match incumbent.best {
            Some((_, solution)) => Ok(Optimized { solution, report }),
            None => Err(ScheduleError::GlobalInfeasible {
                placements: report.placements,
                backend_errors: report.backend_errors,
            }),
        }
    }

    /// Solves a batch on scoped threads. Placements a worker reaches after
    /// the deadline are dropped unevaluated.
    fn evaluate_batch(
        &self,
        roster: &Roster,
        batch: Vec<(usize, SlotAssignment)>,
    ) -> Vec<(usize, SlotAssignment, Result<Solution, PlacementError>)> {
        let chunk_size = batch.len().div_ceil(self.workers);
        let deadline = self.limits.deadline;
        let solver = &self.solver;

        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .take_while(|_| deadline.is_none_or(|d| Instant::now() < d))
                            .map(|(index, placement)| {
                                (*index, placement.clone(), solver.solve(roster, placement))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

fn record(
    report: &mut SearchReport,
    incumbent: &mut Incumbent,
    index: usize,
    placement: &SlotAssignment,
    result: Result<Solution, PlacementError>,
) {
    report.placements += 1;
    match result {
        Ok(solution) => {
            report.feasible += 1;
            debug!(
                "Placement #{} {} has utility {}",
                index, placement, solution.total_utility
            );
            incumbent.offer(index, solution);
        }
        Err(PlacementError::Infeasible) => {
            report.infeasible += 1;
            debug!("Placement #{} {} is infeasible, skipping", index, placement);
        }
        Err(PlacementError::Backend(e)) => {
            report.backend_errors += 1;
            warn!("Placement #{} {} skipped: {}", index, placement, e);
        }
    }
}
