//! strain scoring: how costly it is to give a particular doctor a particular
//! day, given the partial schedule built so far
//!
//! the original implementation spread this over a `BaseStrainModifier`
//! class hierarchy with two mixins supplying shared state
//! (`AveragesDependentMixin`, `AdjacentMonthStrainModifierMixin`). here the
//! nine modifiers are a closed enum dispatched by [`StrainModifier::points`];
//! the shared state they needed lives on [`StrainEvaluator`] itself instead
//! of being threaded through a mixin chain.

use std::collections::HashSet;

use chrono::Weekday;

use crate::calendar::{Calendar, Day};
use crate::doctor::Doctor;
use crate::duty_schedule::DutySchedule;
use crate::error::ProgrammerError;

const TWO_DAYS_APART: i64 = 30;
const THREE_DAYS_APART: i64 = 20;
const FOUR_DAYS_APART: i64 = 10;
const JOIN_FRIDAY_WITH_SUNDAY: i64 = -60;
const AVOID_SATURDAY_AFTER_THURSDAY: i64 = 30;
const DONT_STEAL_SUNDAYS: i64 = 100;
const THURSDAY_IS_ORDINARY: i64 = 10;
const NEW_WEEKEND: i64 = 200;
const DUTY_LEFT: i64 = -10;

/// interval strain for a day gap; distance 1 is a bug, availability should
/// have already excluded it
fn interval_strain(distance: u32, doctor_pk: i64, day: u32) -> Result<i64, ProgrammerError> {
    match distance {
        1 => Err(ProgrammerError::DoubleDutyInterval { doctor_pk, day }),
        2 => Ok(TWO_DAYS_APART),
        3 => Ok(THREE_DAYS_APART),
        4 => Ok(FOUR_DAYS_APART),
        _ => Ok(0),
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

fn has_duty_on(schedule: &DutySchedule, day: u32, doctor_pk: i64) -> bool {
    schedule
        .row(day)
        .map(|row| row.has_duty(doctor_pk))
        .unwrap_or(false)
}

/// evaluates total strain for assigning one doctor to one day of a partial
/// schedule; holds averages and month-length context computed once
pub struct StrainEvaluator {
    previous_month_length: u32,
    current_month_length: u32,
    average_duties_per_doctor: f64,
    average_max_duties_preference: f64,
}

impl StrainEvaluator {
    pub fn new(year: i32, month: u32, positions: u32, all_doctors: &[std::rc::Rc<Doctor>]) -> Self {
        let (prev_year, prev_month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
        let previous_month_length = crate::calendar::days_in_month(prev_year, prev_month);
        let current_month_length = crate::calendar::days_in_month(year, month);

        let average_duties_per_doctor =
            (current_month_length * positions) as f64 / all_doctors.len().max(1) as f64;
        let average_max_duties_preference = all_doctors
            .iter()
            .map(|d| d.preferences.maximum_accepted_duties as f64)
            .sum::<f64>()
            / all_doctors.len().max(1) as f64;

        Self {
            previous_month_length,
            current_month_length,
            average_duties_per_doctor,
            average_max_duties_preference,
        }
    }

    /// total strain for assigning `doctor` to `day` in `schedule`; the
    /// schedule must not yet hold a duty for `doctor` on `day`
    pub fn evaluate(&self, day: &Day, doctor: &Doctor, schedule: &DutySchedule) -> Result<i64, ProgrammerError> {
        let mut strain = day.strain_points;

        strain += self.join_friday_with_sunday(day, doctor, schedule);
        strain += self.dont_steal_sundays(day, doctor, schedule);
        strain += self.avoid_saturday_after_thursday(day, doctor, schedule);
        strain += self.thursday_is_ordinary(day, doctor);
        strain += self.new_weekend(day, doctor, schedule);
        strain += self.remaining_duties(doctor, schedule);
        strain += self.previous_month_interval(day, doctor)?;
        strain += self.next_month_interval(day, doctor)?;
        strain += self.close_duties(day, doctor, schedule)?;

        Ok(strain)
    }

    fn join_friday_with_sunday(&self, day: &Day, doctor: &Doctor, schedule: &DutySchedule) -> i64 {
        if day.weekday == Weekday::Sun && day.number > 2 && has_duty_on(schedule, day.number - 2, doctor.pk) {
            JOIN_FRIDAY_WITH_SUNDAY
        } else {
            0
        }
    }

    fn dont_steal_sundays(&self, day: &Day, doctor: &Doctor, schedule: &DutySchedule) -> i64 {
        if day.weekday == Weekday::Sun && day.number > 2 && !has_duty_on(schedule, day.number - 2, doctor.pk) {
            DONT_STEAL_SUNDAYS
        } else {
            0
        }
    }

    fn avoid_saturday_after_thursday(&self, day: &Day, doctor: &Doctor, schedule: &DutySchedule) -> i64 {
        if day.weekday == Weekday::Sat && day.number > 2 && has_duty_on(schedule, day.number - 2, doctor.pk) {
            AVOID_SATURDAY_AFTER_THURSDAY
        } else {
            0
        }
    }

    /// "no weekends" here means the doctor's preferred weekdays contain
    /// none of Fri/Sat/Sun (0=Mon..6=Sun numbering)
    fn thursday_is_ordinary(&self, day: &Day, doctor: &Doctor) -> i64 {
        let no_weekends = [4u8, 5, 6]
            .iter()
            .all(|weekday| !doctor.preferences.preferred_weekdays.contains(weekday));
        if day.weekday == Weekday::Thu && no_weekends {
            THURSDAY_IS_ORDINARY
        } else {
            0
        }
    }

    fn new_weekend(&self, day: &Day, doctor: &Doctor, schedule: &DutySchedule) -> i64 {
        if !is_weekend(day.weekday) {
            return 0;
        }

        let calendar = Calendar::new(day.year, day.month);
        let weeks_on_duty: HashSet<i64> = (1..=self.current_month_length)
            .filter(|&d| has_duty_on(schedule, d, doctor.pk))
            .filter(|&d| is_weekend(calendar.day(d).weekday))
            .map(|d| calendar.day(d).week_of_month)
            .collect();

        if !weeks_on_duty.contains(&day.week_of_month) {
            NEW_WEEKEND * (weeks_on_duty.len() as i64 + 1)
        } else {
            0
        }
    }

    fn remaining_duties(&self, doctor: &Doctor, schedule: &DutySchedule) -> i64 {
        let duties_count = schedule.duties_for_doctor(doctor.pk).count() as i64;
        if duties_count == 0 {
            return 20 * DUTY_LEFT;
        }

        let maximum = doctor.preferences.maximum_accepted_duties as f64;
        let cap = if maximum < self.average_max_duties_preference {
            self.average_duties_per_doctor.ceil()
        } else {
            (self.average_duties_per_doctor * maximum / self.average_max_duties_preference).ceil()
        } as i64;

        let remaining = doctor.preferences.maximum_accepted_duties as i64 - duties_count;
        (remaining - cap) * DUTY_LEFT
    }

    fn previous_month_interval(&self, day: &Day, doctor: &Doctor) -> Result<i64, ProgrammerError> {
        if day.number >= 5 {
            return Ok(0);
        }
        let mut result = 0;
        for i in 0..(5 - day.number) {
            if doctor.last_month_duties.contains(&(self.previous_month_length - i)) {
                result += interval_strain(day.number + i, doctor.pk, day.number)?;
            }
        }
        Ok(result)
    }

    fn next_month_interval(&self, day: &Day, doctor: &Doctor) -> Result<i64, ProgrammerError> {
        if day.number <= self.current_month_length.saturating_sub(4) {
            return Ok(0);
        }
        let reversed = self.current_month_length - day.number;
        let mut result = 0;
        for i in 1..(5 - reversed) {
            if doctor.next_month_duties.contains(&i) {
                result += interval_strain(reversed + i, doctor.pk, day.number)?;
            }
        }
        Ok(result)
    }

    fn close_duties(&self, day: &Day, doctor: &Doctor, schedule: &DutySchedule) -> Result<i64, ProgrammerError> {
        let mut result = 0;
        for offset in [-4i32, -3, -2, 2, 3, 4] {
            let candidate = day.number as i32 + offset;
            if candidate < 1 || candidate > self.current_month_length as i32 {
                continue;
            }
            let candidate = candidate as u32;
            if has_duty_on(schedule, candidate, doctor.pk) {
                result += interval_strain(offset.unsigned_abs(), doctor.pk, day.number)?;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::Preferences;
    use std::rc::Rc;

    fn doctor(pk: i64, max: u32, preferred_weekdays: &[u8]) -> Rc<Doctor> {
        Rc::new(Doctor::new(
            pk,
            format!("Doctor {pk}"),
            Preferences {
                exceptions: HashSet::new(),
                requested_days: HashSet::new(),
                preferred_weekdays: preferred_weekdays.iter().copied().collect(),
                preferred_positions: HashSet::from([1]),
                maximum_accepted_duties: max,
            },
        ))
    }

    #[test]
    fn sunday_after_friday_duty_rewards_joining() {
        let calendar = Calendar::new(2025, 2); // Feb 2025: 7=Fri, 9=Sun
        let doctors = vec![doctor(1, 10, &[0, 1, 2, 3, 4, 5, 6])];
        let evaluator = StrainEvaluator::new(2025, 2, 1, &doctors);

        let mut schedule = DutySchedule::new(2025, 2, 1);
        schedule.get_mut(7, 1).unwrap().update(doctors[0].clone(), None, None, Some(false));

        let sunday = calendar.day(9);
        let strain = evaluator.evaluate(&sunday, &doctors[0], &schedule).unwrap();
        // base strain(100) + join bonus(-60)
        assert_eq!(strain, 100 - 60);
    }

    #[test]
    fn sunday_without_friday_duty_penalizes_stealing() {
        let calendar = Calendar::new(2025, 2);
        let doctors = vec![doctor(1, 10, &[0, 1, 2, 3, 4, 5, 6])];
        let evaluator = StrainEvaluator::new(2025, 2, 1, &doctors);
        let schedule = DutySchedule::new(2025, 2, 1);

        let sunday = calendar.day(9);
        let strain = evaluator.evaluate(&sunday, &doctors[0], &schedule).unwrap();
        assert_eq!(strain, 100 + 100);
    }

    #[test]
    fn zero_duties_gives_strong_pull() {
        let calendar = Calendar::new(2025, 2);
        let doctors = vec![doctor(1, 10, &[0, 1, 2, 3, 4, 5, 6])];
        let evaluator = StrainEvaluator::new(2025, 2, 1, &doctors);
        let schedule = DutySchedule::new(2025, 2, 1);

        let monday = calendar.day(3);
        let strain = evaluator.evaluate(&monday, &doctors[0], &schedule).unwrap();
        assert_eq!(strain, 80 - 200);
    }

    #[test]
    fn double_duty_interval_is_a_programmer_error() {
        let calendar = Calendar::new(2025, 2);
        let mut carried = doctor(1, 10, &[0, 1, 2, 3, 4, 5, 6]);
        // held a duty on the last day of January, adjacent to February 1st
        Rc::get_mut(&mut carried).unwrap().last_month_duties.insert(31);
        let doctors = vec![carried];
        let evaluator = StrainEvaluator::new(2025, 2, 1, &doctors);
        let schedule = DutySchedule::new(2025, 2, 1);

        let day = calendar.day(1);
        let err = evaluator.evaluate(&day, &doctors[0], &schedule).unwrap_err();
        assert_eq!(
            err,
            ProgrammerError::DoubleDutyInterval { doctor_pk: 1, day: 1 }
        );
    }
}
