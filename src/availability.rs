//! per-day, per-position projection of "which doctors may legally take this
//! slot" given preferences, already-assigned duties, and neighbouring-month
//! context

use std::collections::HashSet;
use std::rc::Rc;

use chrono::Datelike;

use crate::calendar::Calendar;
use crate::doctor::Doctor;
use crate::duty_schedule::DutySchedule;

/// candidates for one (day, position) slot, plus whether it is already committed
#[derive(Clone, Debug, Default)]
pub struct AvailabilityCell {
    pub candidates: Vec<Rc<Doctor>>,
    pub is_set: bool,
}

/// one day's worth of availability cells, one per position
pub struct AvailabilityRow {
    pub day_number: u32,
    cells: Vec<AvailabilityCell>,
}

impl AvailabilityRow {
    pub fn cell(&self, position: u32) -> &AvailabilityCell {
        &self.cells[(position - 1) as usize]
    }

    pub fn cells(&self) -> &[AvailabilityCell] {
        &self.cells
    }

    pub fn free_positions(&self) -> HashSet<u32> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_set)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    /// union of candidates across every position
    pub fn doctors_for_positions(&self, positions: &HashSet<u32>) -> Vec<Rc<Doctor>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for &position in positions {
            for doctor in &self.cell(position).candidates {
                if seen.insert(doctor.pk) {
                    result.push(doctor.clone());
                }
            }
        }
        result
    }

    pub fn doctors_for_all_positions(&self) -> Vec<Rc<Doctor>> {
        let all_positions: HashSet<u32> = (1..=self.cells.len() as u32).collect();
        self.doctors_for_positions(&all_positions)
    }

    /// positions (among the free ones) this doctor appears as a candidate for
    pub fn positions_for_doctor(&self, doctor_pk: i64) -> HashSet<u32> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.candidates.iter().any(|d| d.pk == doctor_pk))
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    pub fn average_doctors_per_free_position(&self) -> f64 {
        let free: Vec<&AvailabilityCell> = self.cells.iter().filter(|cell| !cell.is_set).collect();
        if free.is_empty() {
            return 0.0;
        }
        let total: usize = free.iter().map(|cell| cell.candidates.len()).sum();
        total as f64 / free.len() as f64
    }

    pub fn is_set(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_set)
    }
}

/// a full day x position grid of candidate lists, derived from a partial
/// [`DutySchedule`]; rebuilt whenever the partial schedule changes
pub struct AvailabilitySchedule {
    rows: Vec<AvailabilityRow>,
}

impl AvailabilitySchedule {
    pub fn row(&self, day_number: u32) -> &AvailabilityRow {
        &self.rows[(day_number - 1) as usize]
    }

    pub fn rows(&self) -> &[AvailabilityRow] {
        &self.rows
    }
}

/// builds an [`AvailabilitySchedule`] from the doctor pool and a partial schedule
pub struct AvailabilityProjector<'a> {
    calendar: &'a Calendar,
}

impl<'a> AvailabilityProjector<'a> {
    pub fn new(calendar: &'a Calendar) -> Self {
        Self { calendar }
    }

    pub fn project(&self, doctors: &[Rc<Doctor>], schedule: &DutySchedule) -> AvailabilitySchedule {
        let positions = schedule.positions();
        let days_in_month = schedule.days_in_month();

        // step 1: drop doctors already at or past their cap
        let surviving: Vec<Rc<Doctor>> = doctors
            .iter()
            .filter(|doctor| {
                let held = schedule.duties_for_doctor(doctor.pk).count() as u32;
                held < doctor.preferences.maximum_accepted_duties
            })
            .cloned()
            .collect();

        let mut rows = Vec::with_capacity(days_in_month as usize);
        for day_number in 1..=days_in_month {
            rows.push(self.project_day(day_number, days_in_month, positions, &surviving, schedule));
        }

        AvailabilitySchedule { rows }
    }

    fn project_day(
        &self,
        day_number: u32,
        days_in_month: u32,
        positions: u32,
        surviving: &[Rc<Doctor>],
        schedule: &DutySchedule,
    ) -> AvailabilityRow {
        let mut cells: Vec<AvailabilityCell> = (0..positions).map(|_| AvailabilityCell::default()).collect();

        // step 2a/2b: seed already-committed duties, remove those doctors
        // from the day's candidate pool
        let mut pool: Vec<Rc<Doctor>> = surviving.to_vec();
        let row = schedule.row(day_number).expect("day in range");
        for duty in row.set_duties() {
            let doctor = duty.doctor.clone().expect("set_duties only yields bound cells");
            pool.retain(|d| d.pk != doctor.pk);
            let cell = &mut cells[(duty.position - 1) as usize];
            cell.is_set = true;
            cell.candidates.push(doctor);
        }

        let free_positions: HashSet<u32> = row.free_positions();
        let day = self.calendar.day(day_number);

        for doctor in pool {
            if self.holds_adjacent_duty(schedule, day_number, doctor.pk) {
                continue;
            }
            if !self.preferences_accept(&day, &doctor) {
                continue;
            }
            if day_number == 1 {
                let previous_last_day = crate::calendar::days_in_month(
                    if self.calendar.month() == 1 { self.calendar.year() - 1 } else { self.calendar.year() },
                    if self.calendar.month() == 1 { 12 } else { self.calendar.month() - 1 },
                );
                if doctor.last_month_duties.contains(&previous_last_day) {
                    continue;
                }
            }
            if day_number == days_in_month && doctor.next_month_duties.contains(&1) {
                continue;
            }

            for &position in free_positions.intersection(&doctor.preferences.preferred_positions) {
                cells[(position - 1) as usize].candidates.push(doctor.clone());
            }
        }

        AvailabilityRow { day_number, cells }
    }

    fn holds_adjacent_duty(&self, schedule: &DutySchedule, day_number: u32, doctor_pk: i64) -> bool {
        if day_number > 1 {
            if let Ok(row) = schedule.row(day_number - 1) {
                if row.has_duty(doctor_pk) {
                    return true;
                }
            }
        }
        if day_number < schedule.days_in_month() {
            if let Ok(row) = schedule.row(day_number + 1) {
                if row.has_duty(doctor_pk) {
                    return true;
                }
            }
        }
        false
    }

    fn preferences_accept(&self, day: &crate::calendar::Day, doctor: &Doctor) -> bool {
        let preferences = &doctor.preferences;

        let neighbours_not_requested =
            !preferences.requested_days.contains(&(day.number + 1)) && !day.number.checked_sub(1).is_some_and(|d| preferences.requested_days.contains(&d));

        let weekday_ok = preferences.preferred_weekdays.contains(&(day.weekday.num_days_from_monday() as u8))
            || preferences.requested_days.contains(&day.number);

        let not_excepted = !preferences.exceptions.contains(&day.number);

        neighbours_not_requested && weekday_ok && not_excepted
    }
}
