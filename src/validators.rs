//! preflight checks that reject an infeasible instance before search ever
//! starts, with human-readable messages rather than exceptions
//!
//! run in a fixed order; a later validator never runs once an earlier one
//! has already produced errors (validators 4 and 5 assume the schedule is
//! otherwise well-formed).

use std::collections::HashSet;

use crate::availability::AvailabilityProjector;
use crate::calendar::Calendar;
use crate::doctor::Doctor;
use crate::duty_schedule::DutySchedule;

/// runs all five validators in order, short-circuiting after the first one
/// that reports errors
pub fn validate(doctors: &[std::rc::Rc<Doctor>], schedule: &DutySchedule, calendar: &Calendar) -> Vec<String> {
    let errors = doctor_count(doctors, schedule);
    if !errors.is_empty() {
        return errors;
    }

    let errors = preferences_coherence(doctors);
    if !errors.is_empty() {
        return errors;
    }

    let errors = requested_days_conflicts(doctors, schedule);
    if !errors.is_empty() {
        return errors;
    }

    let projector = AvailabilityProjector::new(calendar);
    let availability = projector.project(doctors, schedule);

    let errors = daily_doctor_availability(schedule, &availability);
    if !errors.is_empty() {
        return errors;
    }

    bidaily_doctor_availability(schedule, &availability)
}

fn doctor_count(doctors: &[std::rc::Rc<Doctor>], schedule: &DutySchedule) -> Vec<String> {
    let minimum = schedule.positions() * 2;
    let actual = doctors.len() as u32;
    if actual < minimum {
        vec![format!(
            "There are not enough doctors to fill all positions, minimum required: {minimum}, actual: {actual}."
        )]
    } else {
        Vec::new()
    }
}

fn preferences_coherence(doctors: &[std::rc::Rc<Doctor>]) -> Vec<String> {
    let mut errors = Vec::new();

    for doctor in doctors {
        let preferences = &doctor.preferences;

        let mut doubles = Vec::new();
        let mut requested: Vec<u32> = preferences.requested_days.iter().copied().collect();
        requested.sort_unstable();
        for &day in &requested {
            if preferences.requested_days.contains(&(day + 1)) {
                doubles.push(format!("{day} and {}", day + 1));
            }
        }
        if !doubles.is_empty() {
            errors.push(format!(
                "{doctor} requested double duties on the following days: {}",
                doubles.join(", ")
            ));
        }

        let mut conflicts: Vec<u32> = preferences
            .requested_days
            .intersection(&preferences.exceptions)
            .copied()
            .collect();
        conflicts.sort_unstable();
        if !conflicts.is_empty() {
            let conflicts_str = conflicts.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ");
            errors.push(format!("{doctor} requests and excludes the following dates: {conflicts_str}"));
        }

        let requested_count = preferences.requested_days.len();
        if requested_count as u32 > preferences.maximum_accepted_duties {
            errors.push(format!(
                "{doctor} requests duties on {requested_count} days, but would accept only {}.",
                preferences.maximum_accepted_duties
            ));
        }
    }

    errors
}

fn requested_days_conflicts(doctors: &[std::rc::Rc<Doctor>], schedule: &DutySchedule) -> Vec<String> {
    let mut errors = Vec::new();

    let mut requested_days: Vec<u32> = doctors
        .iter()
        .flat_map(|d| d.preferences.requested_days.iter().copied())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    requested_days.sort_unstable();

    for day in requested_days {
        let row = match schedule.row(day) {
            Ok(row) => row,
            Err(_) => continue,
        };

        if row.is_set() {
            errors.push(format!("Day {day} was requested but is already fully filled."));
            continue;
        }

        let mut requesting: Vec<&std::rc::Rc<Doctor>> = doctors
            .iter()
            .filter(|d| d.preferences.requested_days.contains(&day))
            .collect();
        requesting.sort_by_key(|d| d.preferences.preferred_positions.len());

        let initial: HashSet<u32> = row
            .set_duties()
            .map(|cell| cell.position)
            .collect();
        let initial_len = initial.len();
        let mut union = initial;

        let mut feasible = true;
        for (step, doctor) in requesting.iter().enumerate() {
            union.extend(&doctor.preferences.preferred_positions);
            if union.len() < step + 1 + initial_len {
                feasible = false;
                break;
            }
        }

        if !feasible {
            errors.push(format!(
                "Duty on day {day} was requested by {} doctors, but not enough positions are available.",
                requesting.len()
            ));
        }
    }

    errors
}

fn daily_doctor_availability(
    schedule: &DutySchedule,
    availability: &crate::availability::AvailabilitySchedule,
) -> Vec<String> {
    let mut errors = Vec::new();

    for day in 1..=schedule.days_in_month() {
        let row = availability.row(day);
        for cell in row.cells() {
            if !cell.is_set && cell.candidates.is_empty() {
                errors.push(format!(
                    "No doctors available for duty on day {day}, position {}.",
                    row.cells().iter().position(|c| std::ptr::eq(c, cell)).unwrap() as u32 + 1
                ));
            }
        }

        let union = row.doctors_for_all_positions();
        if (union.len() as u32) < schedule.positions() {
            errors.push(format!(
                "Day {day} has only {} available doctor(s) across all positions, needs at least {}.",
                union.len(),
                schedule.positions()
            ));
        }
    }

    errors
}

fn bidaily_doctor_availability(
    schedule: &DutySchedule,
    availability: &crate::availability::AvailabilitySchedule,
) -> Vec<String> {
    let mut errors = Vec::new();
    let positions = schedule.positions();
    let all_positions: Vec<u32> = (1..=positions).collect();

    for day in 1..schedule.days_in_month() {
        let mut reported: Vec<HashSet<u32>> = Vec::new();

        for subset_size in (1..=positions).rev() {
            for subset in subsets_of_size(&all_positions, subset_size) {
                if reported.iter().any(|already| subset.is_subset(already)) {
                    continue;
                }

                let today = availability.row(day).doctors_for_positions(&subset);
                let tomorrow = availability.row(day + 1).doctors_for_positions(&subset);

                let mut pks: HashSet<i64> = today.iter().map(|d| d.pk).collect();
                pks.extend(tomorrow.iter().map(|d| d.pk));

                let required = 2 * subset.len();
                if pks.len() < required {
                    let positions_str = {
                        let mut sorted: Vec<u32> = subset.iter().copied().collect();
                        sorted.sort_unstable();
                        sorted.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
                    };
                    errors.push(format!(
                        "Days {day} and {} cannot both be staffed for position(s) {positions_str}: {} doctor(s) available, needs {required}.",
                        day + 1,
                        pks.len()
                    ));
                    reported.push(subset);
                }
            }
        }
    }

    errors
}

/// every non-empty subset of `items` with exactly `size` elements
fn subsets_of_size(items: &[u32], size: u32) -> Vec<HashSet<u32>> {
    if size == 0 {
        return Vec::new();
    }
    let mut result = Vec::new();
    let n = items.len();
    let size = size as usize;
    if size > n {
        return result;
    }

    let mut indices: Vec<usize> = (0..size).collect();
    loop {
        result.push(indices.iter().map(|&i| items[i]).collect());

        let mut i = size;
        loop {
            if i == 0 {
                return result;
            }
            i -= 1;
            if indices[i] != i + n - size {
                break;
            }
            if i == 0 {
                return result;
            }
        }
        indices[i] += 1;
        for j in (i + 1)..size {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::Preferences;
    use std::rc::Rc;

    fn doctor(pk: i64, preferences: Preferences) -> Rc<Doctor> {
        Rc::new(Doctor::new(pk, format!("Doctor {pk}"), preferences))
    }

    fn default_preferences() -> Preferences {
        Preferences {
            exceptions: HashSet::new(),
            requested_days: HashSet::new(),
            preferred_weekdays: (0..7).collect(),
            preferred_positions: HashSet::from([1, 2, 3]),
            maximum_accepted_duties: 15,
        }
    }

    #[test]
    fn s4_not_enough_doctors() {
        let schedule = DutySchedule::new(2025, 1, 3);
        let doctors: Vec<_> = (0..5).map(|pk| doctor(pk, default_preferences())).collect();

        let errors = doctor_count(&doctors, &schedule);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not enough doctors"));
    }

    #[test]
    fn s5_three_preference_coherence_errors() {
        let mut p0 = default_preferences();
        p0.requested_days = HashSet::from([1, 2]);

        let mut p1 = default_preferences();
        p1.requested_days = HashSet::from([5]);
        p1.exceptions = HashSet::from([5]);

        let mut p2 = default_preferences();
        p2.requested_days = HashSet::from([10, 12, 14, 16, 18]);
        p2.maximum_accepted_duties = 4;

        let doctors = vec![doctor(0, p0), doctor(1, p1), doctor(2, p2)];
        let errors = preferences_coherence(&doctors);

        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("double duties on the following days")));
        assert!(errors.iter().any(|e| e.contains("requests and excludes")));
        assert!(errors.iter().any(|e| e.contains("requests duties on 5 days, but would accept only 4")));
    }

    #[test]
    fn s6_no_doctors_available_for_position() {
        let calendar = Calendar::new(2025, 1);
        let schedule = DutySchedule::new(2025, 1, 2);

        let mut excepted = default_preferences();
        excepted.preferred_positions = HashSet::from([1]);
        excepted.exceptions = HashSet::from([11]);

        let mut other = default_preferences();
        other.preferred_positions = HashSet::from([2]);

        let doctors = vec![
            doctor(0, excepted.clone()),
            doctor(1, excepted.clone()),
            doctor(2, excepted),
            doctor(3, other.clone()),
            doctor(4, other),
        ];

        let errors = validate(&doctors, &schedule, &calendar);
        assert!(errors.iter().any(|e| e.contains("No doctors available for duty on day 11, position 1")));
    }
}
