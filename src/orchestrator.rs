//! wires validators, requested-duty assignment and search into a single
//! entry point, mirroring the original's `DutySetter`

use std::rc::Rc;

use rand::Rng;
use tracing::{info, instrument, warn};

use crate::calendar::Calendar;
use crate::doctor::Doctor;
use crate::duty_schedule::DutySchedule;
use crate::error::ProgrammerError;
use crate::requested::RequestedDutiesAssigner;
use crate::search::SearchCore;
use crate::strain::StrainEvaluator;
use crate::validators;

/// the outcome of one full scheduling run
#[derive(Debug)]
pub struct SchedulingResult {
    pub were_any_duties_set: bool,
    pub were_all_duties_set: bool,
    pub errors: Vec<String>,
    pub duties: DutySchedule,
}

/// runs validators, then (if they pass) requested-duty assignment and
/// search, over a freshly-built `DutySchedule` seeded with `seed_duties`
#[instrument(skip_all, fields(year = year, month = month, positions = positions, doctors = doctors.len()))]
pub fn set_duties<R: Rng>(
    year: i32,
    month: u32,
    positions: u32,
    doctors: &[Rc<Doctor>],
    seed_duties: impl FnOnce(&mut DutySchedule),
    rng: &mut R,
) -> Result<SchedulingResult, ProgrammerError> {
    let calendar = Calendar::new(year, month);
    let mut schedule = DutySchedule::new(year, month, positions);
    seed_duties(&mut schedule);

    let errors = validators::validate(doctors, &schedule, &calendar);
    if !errors.is_empty() {
        warn!(error_count = errors.len(), "validation failed, search skipped");
        return Ok(SchedulingResult {
            were_any_duties_set: false,
            were_all_duties_set: false,
            errors,
            duties: schedule,
        });
    }

    let evaluator = StrainEvaluator::new(year, month, positions, doctors);
    RequestedDutiesAssigner::new(rng).assign(doctors, &mut schedule, &calendar, &evaluator)?;

    let mut core = SearchCore::new(&calendar, evaluator, rng, positions);
    core.fill(doctors, &mut schedule)?;

    let were_any_duties_set = schedule.cells().any(|cell| cell.is_set());
    let were_all_duties_set = schedule.is_filled();
    info!(were_any_duties_set, were_all_duties_set, "scheduling run finished");

    Ok(SchedulingResult {
        were_any_duties_set,
        were_all_duties_set,
        errors: Vec::new(),
        duties: schedule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::Preferences;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn doctor(pk: i64) -> Rc<Doctor> {
        Rc::new(Doctor::new(
            pk,
            format!("Doctor {pk}"),
            Preferences {
                exceptions: HashSet::new(),
                requested_days: HashSet::new(),
                preferred_weekdays: (0..7).collect(),
                preferred_positions: HashSet::from([1, 2, 3]),
                maximum_accepted_duties: 15,
            },
        ))
    }

    #[test]
    fn validator_failure_skips_search_and_reports_errors() {
        let doctors = vec![doctor(1), doctor(2)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let result = set_duties(2025, 1, 3, &doctors, |_| {}, &mut rng).unwrap();

        assert!(!result.were_any_duties_set);
        assert!(!result.were_all_duties_set);
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn healthy_instance_fills_the_schedule() {
        let doctors: Vec<_> = (0..10).map(doctor).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        let result = set_duties(2025, 1, 3, &doctors, |_| {}, &mut rng).unwrap();

        assert!(result.errors.is_empty());
        assert!(result.were_all_duties_set);
    }

    /// S1: ten doctors, default preferences, January 2025; every day fills
    /// and counts/strain stay within the spec's balance bounds
    #[test]
    fn s1_balanced_month_fills_completely_within_bounds() {
        let doctors: Vec<_> = (0..10).map(doctor).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(2025);

        let result = set_duties(2025, 1, 3, &doctors, |_| {}, &mut rng).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.were_all_duties_set);
        assert!(result.duties.cells().all(|cell| cell.strain_points > 0));

        let counts: Vec<i64> = doctors
            .iter()
            .map(|d| result.duties.duties_for_doctor(d.pk).count() as i64)
            .collect();
        let total_count: i64 = counts.iter().sum();
        let mean_count = total_count as f64 / counts.len() as f64;
        for &count in &counts {
            assert!(
                (count as f64 - mean_count).abs() <= mean_count * 0.10 + 1.0,
                "count {count} too far from mean {mean_count}"
            );
        }

        let strains: Vec<i64> = doctors
            .iter()
            .map(|d| result.duties.duties_for_doctor(d.pk).map(|c| c.strain_points).sum())
            .collect();
        let total_strain: i64 = strains.iter().sum();
        let mean_strain = total_strain as f64 / strains.len() as f64;
        for &strain in &strains {
            assert!(
                (strain as f64 - mean_strain).abs() <= mean_strain * 0.20 + 50.0,
                "strain {strain} too far from mean {mean_strain}"
            );
        }
    }

    /// S2: a doctor with requested days, exceptions and a low cap never
    /// appears on an excepted day and never exceeds their cap
    #[test]
    fn s2_requested_and_excepted_days_are_honoured() {
        let mut doctors: Vec<_> = (0..10).map(doctor).collect();
        {
            let first = Rc::make_mut(&mut doctors[0]);
            first.preferences.requested_days = HashSet::from([1, 6, 19]);
            first.preferences.exceptions = HashSet::from([2, 3, 4, 5]);
            first.preferences.maximum_accepted_duties = 5;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = set_duties(2025, 1, 3, &doctors, |_| {}, &mut rng).unwrap();
        assert!(result.errors.is_empty());

        let doctor_zero_days: HashSet<u32> = result
            .duties
            .duties_for_doctor(doctors[0].pk)
            .map(|cell| cell.day_number)
            .collect();

        assert!(doctor_zero_days.contains(&1));
        assert!(doctor_zero_days.contains(&6));
        assert!(doctor_zero_days.contains(&19));
        for excepted in [2, 3, 4, 5] {
            assert!(!doctor_zero_days.contains(&excepted));
        }
        assert!(doctor_zero_days.len() as u32 <= 5);
    }
}
