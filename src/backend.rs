//! The "solve this 0/1 linear program" port and its HiGHS adapter.

use crate::config::BackendConfig;
use crate::error::BackendError;
use good_lp::solvers::SolutionStatus;
use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, constraint,
    default_solver,
};
use log::{debug, info, trace, warn};
use std::time::Instant;

/// `lower <= sum(coefficient * x) <= upper`, either side optional.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl LinearConstraint {
    pub fn between(name: impl Into<String>, terms: Vec<(usize, f64)>, lower: f64, upper: Option<f64>) -> Self {
        Self {
            name: name.into(),
            terms,
            lower: Some(lower),
            upper,
        }
    }

    pub fn equal(name: impl Into<String>, terms: Vec<(usize, f64)>, value: f64) -> Self {
        Self::between(name, terms, value, Some(value))
    }

    /// Whether an all-zero assignment satisfies the bounds.
    pub fn admits_zero(&self) -> bool {
        self.lower.is_none_or(|lo| lo <= 0.0) && self.upper.is_none_or(|hi| hi >= 0.0)
    }
}

/// A maximisation problem over `num_vars` binary variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProgram {
    pub num_vars: usize,
    pub objective: Vec<(usize, f64)>,
    pub constraints: Vec<LinearConstraint>,
}

impl LinearProgram {
    pub fn objective_value(&self, values: &[bool]) -> f64 {
        self.objective
            .iter()
            .filter(|(var, _)| values[*var])
            .map(|(_, coefficient)| coefficient)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub values: Vec<bool>,
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal(LpSolution),
    Infeasible,
}

/// Anything able to optimise a binary linear program.
///
/// Implementations are stateless between calls and may be shared across
/// worker threads.
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, program: &LinearProgram) -> Result<LpOutcome, BackendError>;
}

/// HiGHS through `good_lp`.
#[derive(Debug, Clone, Default)]
pub struct HighsBackend {
    config: BackendConfig,
}

impl HighsBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

impl SolverBackend for HighsBackend {
    fn name(&self) -> &str {
        "highs"
    }

    fn solve(&self, program: &LinearProgram) -> Result<LpOutcome, BackendError> {
        let start_time = Instant::now();
        debug!(
            "Setting up ILP model with {} variables and {} constraints...",
            program.num_vars,
            program.constraints.len()
        );

        if program.num_vars == 0 {
            // HiGHS rejects empty models; only the constant rows remain.
            return Ok(if program.constraints.iter().all(LinearConstraint::admits_zero) {
                LpOutcome::Optimal(LpSolution {
                    values: Vec::new(),
                    objective: 0.0,
                })
            } else {
                LpOutcome::Infeasible
            });
        }

        let mut problem = ProblemVariables::new();
        let vars = problem.add_vector(variable().binary(), program.num_vars);

        let mut objective = Expression::with_capacity(program.objective.len());
        for &(var, coefficient) in &program.objective {
            objective.add_mul(coefficient, vars[var]);
        }

        let threads = highs_int("threads", self.config.threads)?;
        let random_seed = highs_int("random_seed", self.config.random_seed)?;
        let log_to_console = if self.config.log_to_console { "true" } else { "false" };
        let mut model = problem
            .maximise(objective)
            .using(default_solver)
            .set_option("threads", threads)
            .set_option("random_seed", random_seed)
            .set_option("log_to_console", log_to_console)
            .set_option("mip_rel_gap", self.config.mip_rel_gap);
        if let Some(limit) = self.config.time_limit_secs {
            model = model.set_option("time_limit", limit);
        }

        for c in &program.constraints {
            let mut lhs = Expression::with_capacity(c.terms.len());
            for &(var, coefficient) in &c.terms {
                lhs.add_mul(coefficient, vars[var]);
            }
            match (c.lower, c.upper) {
                (Some(lo), Some(hi)) if lo == hi => {
                    model.add_constraint(constraint!(lhs == lo));
                }
                (lower, upper) => {
                    if let Some(lo) = lower {
                        model.add_constraint(constraint!(lhs.clone() >= lo));
                    }
                    if let Some(hi) = upper {
                        model.add_constraint(constraint!(lhs <= hi));
                    }
                }
            }
            trace!("Added constraint {}", c.name);
        }

        let solution = match model.solve() {
            Ok(s) => s,
            // binary variables cannot be unbounded
            Err(ResolutionError::Infeasible | ResolutionError::Unbounded) => {
                debug!("HiGHS proved the program infeasible in {:.2?}", start_time.elapsed());
                return Ok(LpOutcome::Infeasible);
            }
            Err(e) => return Err(BackendError(e.to_string())),
        };

        check_status(solution.status(), self.config.mip_rel_gap)?;

        let values: Vec<bool> = vars.iter().map(|v| solution.value(*v) > 0.5).collect();
        let objective = program.objective_value(&values);
        info!(
            "Solution found in {:.2?} with objective {}",
            start_time.elapsed(),
            objective
        );
        Ok(LpOutcome::Optimal(LpSolution { values, objective }))
    }
}

/// HiGHS takes integer options as `i32`.
fn highs_int(option: &str, value: u32) -> Result<i32, BackendError> {
    i32::try_from(value)
        .map_err(|_| BackendError(format!("{} = {} exceeds the HiGHS option range", option, value)))
}

/// Only a proven optimum may be compared against other placements.
///
/// A stop on the gap is accepted when a non-zero gap was asked for. good_lp
/// reports every other early stop of HiGHS as `TimeLimit`.
fn check_status(status: SolutionStatus, mip_rel_gap: f64) -> Result<(), BackendError> {
    match status {
        SolutionStatus::Optimal => Ok(()),
        SolutionStatus::GapLimit if mip_rel_gap > 0.0 => {
            warn!(
                "HiGHS stopped within the configured gap {}; result may be suboptimal",
                mip_rel_gap
            );
            Ok(())
        }
        SolutionStatus::GapLimit => Err(BackendError(
            "HiGHS stopped on the gap limit without proving optimality".to_string(),
        )),
        SolutionStatus::TimeLimit => Err(BackendError(
            "HiGHS reached its time limit before proving optimality".to_string(),
        )),
    }
}
