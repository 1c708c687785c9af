//! pre-search placement of duties that doctors explicitly demanded
//!
//! for each requested day, every requesting doctor's eligible positions are
//! combined into a Cartesian product restricted to pairwise-distinct
//! entries (the original's `unique_product`), and one such combination is
//! committed at random from the injected RNG. each committed cell's
//! `strain_points` is overwritten with its evaluated strain, same as a
//! search-committed cell, per spec.md §3's duty-cell invariant.

use std::rc::Rc;

use itertools::Itertools;
use rand::Rng;

use crate::calendar::Calendar;
use crate::doctor::Doctor;
use crate::duty_schedule::DutySchedule;
use crate::error::ProgrammerError;
use crate::strain::StrainEvaluator;

/// commits one random legal position assignment per requested day
pub struct RequestedDutiesAssigner<'a, R: Rng> {
    rng: &'a mut R,
}

impl<'a, R: Rng> RequestedDutiesAssigner<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }

    pub fn assign(
        &mut self,
        doctors: &[Rc<Doctor>],
        schedule: &mut DutySchedule,
        calendar: &Calendar,
        evaluator: &StrainEvaluator,
    ) -> Result<(), ProgrammerError> {
        let mut requested_days: Vec<u32> = doctors
            .iter()
            .flat_map(|d| d.preferences.requested_days.iter().copied())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        requested_days.sort_unstable();

        for day in requested_days {
            self.assign_day(day, doctors, schedule, calendar, evaluator)?;
        }
        Ok(())
    }

    fn assign_day(
        &mut self,
        day: u32,
        doctors: &[Rc<Doctor>],
        schedule: &mut DutySchedule,
        calendar: &Calendar,
        evaluator: &StrainEvaluator,
    ) -> Result<(), ProgrammerError> {
        let row = match schedule.row(day) {
            Ok(row) => row,
            Err(_) => return Ok(()),
        };
        let free_positions = row.free_positions();

        let requesting: Vec<&Rc<Doctor>> = doctors
            .iter()
            .filter(|d| d.preferences.requested_days.contains(&day))
            .collect();
        if requesting.is_empty() {
            return Ok(());
        }

        let possible_positions: Vec<Vec<u32>> = requesting
            .iter()
            .map(|doctor| {
                let mut positions: Vec<u32> = doctor
                    .preferences
                    .preferred_positions
                    .intersection(&free_positions)
                    .copied()
                    .collect();
                positions.sort_unstable();
                positions
            })
            .collect();

        let combinations = unique_product(&possible_positions);
        if combinations.is_empty() {
            return Ok(());
        }

        let chosen = &combinations[self.rng.random_range(0..combinations.len())];
        let day_meta = calendar.day(day);
        for (doctor, &position) in requesting.iter().copied().zip(chosen.iter()) {
            let strain = evaluator.evaluate(&day_meta, doctor, schedule)?;
            if let Ok(cell) = schedule.get_mut(day, position) {
                cell.update(doctor.clone(), None, Some(strain), Some(false));
            }
        }
        Ok(())
    }
}

/// the Cartesian product of `sets`, keeping only tuples whose entries are
/// pairwise distinct
fn unique_product(sets: &[Vec<u32>]) -> Vec<Vec<u32>> {
    if sets.is_empty() {
        return Vec::new();
    }
    sets.iter()
        .map(|s| s.iter().copied())
        .multi_cartesian_product()
        .filter(|tuple| {
            let unique: std::collections::HashSet<u32> = tuple.iter().copied().collect();
            unique.len() == tuple.len()
        })
        .collect()
}
