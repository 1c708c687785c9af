//! typed errors for conditions that are programmer mistakes, not infeasible
//! schedules
//!
//! user-facing infeasibility is reported as plain `String` messages
//! collected by the validators (see [`crate::validators`]) and carried in
//! [`crate::orchestrator::SchedulingResult::errors`]. this module only
//! covers the other kind of failure described by the spec: a caller
//! misusing the API, or an internal invariant breaking.

use thiserror::Error;

/// a bug, either in this crate or in how a caller drives it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgrammerError {
    #[error("day {day} or position {position} is out of range for this schedule")]
    OutOfRange { day: u32, position: u32 },

    #[error("evaluated a duty interval of 1 day for doctor pk={doctor_pk} on day {day}; availability should have excluded this")]
    DoubleDutyInterval { doctor_pk: i64, day: u32 },
}
