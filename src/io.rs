//! JSON input/output document shapes and domain validation for them
//!
//! shape validation (missing fields, wrong types) is handled by `serde`
//! itself when deserializing; this module only covers the domain checks
//! the wire format can't express: ranges, set containment, and the
//! `maximum_accepted_duties` clamp.

use std::collections::HashSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::calendar::{self, Calendar};
use crate::doctor::{Doctor, Preferences};
use crate::duty_schedule::DutySchedule;
use crate::orchestrator::SchedulingResult;

#[derive(Debug, Deserialize)]
pub struct InputPreferences {
    #[serde(default)]
    pub exceptions: Vec<u32>,
    #[serde(default)]
    pub requested_days: Vec<u32>,
    #[serde(default)]
    pub preferred_weekdays: Vec<u8>,
    #[serde(default)]
    pub preferred_positions: Vec<u32>,
    pub maximum_accepted_duties: u32,
}

#[derive(Debug, Deserialize)]
pub struct InputDoctor {
    pub pk: i64,
    pub name: String,
    pub preferences: InputPreferences,
    #[serde(default)]
    pub last_month_duties: Vec<u32>,
    #[serde(default)]
    pub next_month_duties: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct InputDuty {
    pub pk: Option<i64>,
    pub day: u32,
    pub position: u32,
    pub doctor_pk: Option<i64>,
    pub strain_points: i64,
    pub set_by_user: bool,
}

#[derive(Debug, Deserialize)]
pub struct InputDocument {
    pub year: i32,
    pub month: u32,
    pub doctors_per_duty: u32,
    pub doctors: Vec<InputDoctor>,
    #[serde(default)]
    pub duties: Vec<InputDuty>,
}

#[derive(Debug, Serialize)]
pub struct OutputDuty {
    pub pk: Option<i64>,
    pub day: u32,
    pub position: u32,
    pub doctor_pk: Option<i64>,
    pub strain_points: i64,
    pub set_by_user: bool,
}

#[derive(Debug, Serialize)]
pub struct OutputDocument {
    pub were_any_duties_set: bool,
    pub were_all_duties_set: bool,
    pub errors: Vec<String>,
    pub duties: Vec<OutputDuty>,
}

impl From<SchedulingResult> for OutputDocument {
    fn from(result: SchedulingResult) -> Self {
        let duties = result
            .duties
            .cells()
            .map(|cell| OutputDuty {
                pk: cell.pk,
                day: cell.day_number,
                position: cell.position,
                doctor_pk: cell.doctor.as_ref().map(|d| d.pk),
                strain_points: cell.strain_points,
                set_by_user: cell.set_by_user,
            })
            .collect();

        Self {
            were_any_duties_set: result.were_any_duties_set,
            were_all_duties_set: result.were_all_duties_set,
            errors: result.errors,
            duties,
        }
    }
}

/// a loaded, domain-validated instance ready to hand to the orchestrator
#[derive(Debug)]
pub struct DomainInput {
    pub year: i32,
    pub month: u32,
    pub positions: u32,
    pub doctors: Vec<Rc<Doctor>>,
    pub duties: Vec<InputDuty>,
}

impl InputDocument {
    /// domain validation beyond what `serde` already guarantees; returns
    /// every violation found rather than stopping at the first one, since
    /// this is meant to run before the real §4.5 validators and give a
    /// caller the full picture of a malformed request
    pub fn into_domain(self) -> Result<DomainInput, Vec<String>> {
        let mut errors = Vec::new();

        if !(1..=12).contains(&self.month) {
            errors.push(format!("month must be in 1..=12, got {}", self.month));
        }
        if self.doctors_per_duty == 0 {
            errors.push("doctors_per_duty must be at least 1".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let days_in_month = calendar::days_in_month(self.year, self.month);
        let (prev_year, prev_month) = if self.month == 1 { (self.year - 1, 12) } else { (self.year, self.month - 1) };
        let previous_month_length = calendar::days_in_month(prev_year, prev_month);
        let (next_year, next_month) = if self.month == 12 { (self.year + 1, 1) } else { (self.year, self.month + 1) };
        let next_month_length = calendar::days_in_month(next_year, next_month);

        let weekday_range: HashSet<u8> = (0..7).collect();
        let position_range: HashSet<u32> = (1..=self.doctors_per_duty).collect();

        let mut doctors = Vec::with_capacity(self.doctors.len());
        for doctor in &self.doctors {
            Self::check_day_set(&doctor.preferences.exceptions, days_in_month, &format!("{} exceptions", doctor.pk), &mut errors);
            Self::check_day_set(&doctor.preferences.requested_days, days_in_month, &format!("{} requested_days", doctor.pk), &mut errors);
            Self::check_day_set(&doctor.last_month_duties, previous_month_length, &format!("{} last_month_duties", doctor.pk), &mut errors);
            Self::check_day_set(&doctor.next_month_duties, next_month_length, &format!("{} next_month_duties", doctor.pk), &mut errors);

            for weekday in &doctor.preferences.preferred_weekdays {
                if !weekday_range.contains(weekday) {
                    errors.push(format!("doctor {} preferred_weekdays contains out-of-range value {weekday}", doctor.pk));
                }
            }
            for position in &doctor.preferences.preferred_positions {
                if !position_range.contains(position) {
                    errors.push(format!("doctor {} preferred_positions contains out-of-range value {position}", doctor.pk));
                }
            }
        }

        for duty in &self.duties {
            if duty.day < 1 || duty.day > days_in_month {
                errors.push(format!("duty day {} is out of range for this month", duty.day));
            }
            if !position_range.contains(&duty.position) {
                errors.push(format!("duty position {} is out of range", duty.position));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        for doctor in self.doctors {
            let mut preferences = Preferences {
                exceptions: doctor.preferences.exceptions.into_iter().collect(),
                requested_days: doctor.preferences.requested_days.into_iter().collect(),
                preferred_weekdays: doctor.preferences.preferred_weekdays.into_iter().collect(),
                preferred_positions: doctor.preferences.preferred_positions.into_iter().collect(),
                maximum_accepted_duties: doctor.preferences.maximum_accepted_duties,
            };
            preferences.clamp_maximum(days_in_month);

            let mut built = Doctor::new(doctor.pk, doctor.name, preferences);
            built.last_month_duties = doctor.last_month_duties.into_iter().collect();
            built.next_month_duties = doctor.next_month_duties.into_iter().collect();
            doctors.push(Rc::new(built));
        }

        Ok(DomainInput {
            year: self.year,
            month: self.month,
            positions: self.doctors_per_duty,
            doctors,
            duties: self.duties,
        })
    }

    fn check_day_set(days: &[u32], max: u32, label: &str, errors: &mut Vec<String>) {
        for &day in days {
            if day < 1 || day > max {
                errors.push(format!("{label} contains out-of-range day {day} (month has {max} days)"));
            }
        }
    }
}

/// seeds a freshly-constructed `DutySchedule` with the input document's
/// pre-existing duty cells
pub fn seed_schedule(schedule: &mut DutySchedule, duties: &[InputDuty], doctors: &[Rc<Doctor>]) {
    for duty in duties {
        let Some(doctor_pk) = duty.doctor_pk else { continue };
        let Some(doctor) = doctors.iter().find(|d| d.pk == doctor_pk) else { continue };
        if let Ok(cell) = schedule.get_mut(duty.day, duty.position) {
            cell.update(
                doctor.clone(),
                duty.pk,
                Some(duty.strain_points),
                Some(duty.set_by_user),
            );
        }
    }
}

/// builds the calendar implied by an input document's year/month, for
/// callers that only need day metadata without running the full pipeline
pub fn calendar_for(input: &DomainInput) -> Calendar {
    Calendar::new(input.year, input.month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_month() {
        let input = InputDocument {
            year: 2025,
            month: 13,
            doctors_per_duty: 1,
            doctors: Vec::new(),
            duties: Vec::new(),
        };
        let errors = input.into_domain().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("month must be in 1..=12")));
    }

    #[test]
    fn clamps_maximum_accepted_duties_on_load() {
        let input = InputDocument {
            year: 2025,
            month: 1,
            doctors_per_duty: 1,
            doctors: vec![InputDoctor {
                pk: 1,
                name: "A".to_string(),
                preferences: InputPreferences {
                    exceptions: Vec::new(),
                    requested_days: Vec::new(),
                    preferred_weekdays: (0..7).collect(),
                    preferred_positions: vec![1],
                    maximum_accepted_duties: 100,
                },
                last_month_duties: Vec::new(),
                next_month_duties: Vec::new(),
            }],
            duties: Vec::new(),
        };

        let domain = input.into_domain().unwrap();
        assert_eq!(domain.doctors[0].preferences.maximum_accepted_duties, 15);
    }
}
