//! assigns on-call duty positions to doctors across a calendar month
//!
//! the pipeline runs preflight validation, projects per-day availability
//! from doctor preferences and already-committed duties, places explicitly
//! requested duties, then fills everything else with a strain-guided
//! best-first tree search. see [`orchestrator::set_duties`] for the entry
//! point.

pub mod availability;
pub mod calendar;
pub mod doctor;
pub mod duty_schedule;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod requested;
pub mod search;
pub mod strain;
pub mod validators;
