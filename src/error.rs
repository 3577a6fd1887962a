use crate::validation::ValidationError;
use thiserror::Error;

/// The solver backend itself broke, as opposed to proving infeasibility.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("solver backend failed: {0}")]
pub struct BackendError(pub String);

/// Why a single placement produced no solution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no student assignment satisfies every constraint for this placement")]
    Infeasible,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse roster: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Terminal outcomes of an optimization run other than success.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid configuration: {}", summarize(.0))]
    InvalidConfiguration(Vec<ValidationError>),
    #[error(
        "no feasible schedule exists among {placements} evaluated placements \
         ({backend_errors} failed in the solver backend)"
    )]
    GlobalInfeasible {
        placements: usize,
        backend_errors: usize,
    },
    #[error(transparent)]
    Roster(#[from] RosterError),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
