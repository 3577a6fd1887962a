//! Assigns students to shows and shows to time slots, maximising total
//! preference utility under headcount, role-quota and availability limits.
//!
//! Every capacity-respecting show placement is enumerated; for each one the
//! student assignment is solved exactly as a 0/1 program by HiGHS, and the
//! best pair wins.

pub mod backend;
pub mod config;
pub mod consumer;
pub mod data;
pub mod enumerate;
pub mod error;
pub mod optimizer;
pub mod problem;
pub mod roster;
pub mod server;
pub mod solver;
pub mod validation;

pub use backend::{HighsBackend, SolverBackend};
pub use config::{BackendConfig, OptimizerConfig, SearchLimits};
pub use data::{RoleQuota, Roster, Show, Slot, SlotAssignment, Solution, Student};
pub use error::{BackendError, PlacementError, RosterError, ScheduleError};
pub use optimizer::{GlobalOptimizer, Optimized, SearchReport};
pub use roster::{JsonRosterFile, RosterProvider};
