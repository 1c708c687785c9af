//! the day x position grid of duty cells that the whole pipeline fills in
//!
//! `DutySchedule` is constructed `(year, month, positions)`, per spec — the
//! source this crate is grounded on had contradictory snapshots of the
//! argument order; this crate fixes it.

use std::collections::HashSet;
use std::rc::Rc;

use crate::calendar::Calendar;
use crate::doctor::Doctor;
use crate::error::ProgrammerError;

/// one (day, position) slot, optionally bound to a doctor
#[derive(Clone, Debug)]
pub struct DutyCell {
    pub day_number: u32,
    pub position: u32,
    pub doctor: Option<Rc<Doctor>>,
    pub set_by_user: bool,
    pub strain_points: i64,
    pub pk: Option<i64>,
}

impl DutyCell {
    fn empty(day_number: u32, position: u32, strain_points: i64) -> Self {
        Self {
            day_number,
            position,
            doctor: None,
            set_by_user: false,
            strain_points,
            pk: None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.doctor.is_some()
    }

    /// the cell's only write path; only overwrites fields that are provided
    pub fn update(
        &mut self,
        doctor: Rc<Doctor>,
        pk: Option<i64>,
        strain_points: Option<i64>,
        set_by_user: Option<bool>,
    ) {
        self.doctor = Some(doctor);
        if let Some(set_by_user) = set_by_user {
            self.set_by_user = set_by_user;
        }
        if let Some(strain_points) = strain_points {
            self.strain_points = strain_points;
        }
        if let Some(pk) = pk {
            self.pk = Some(pk);
        }
    }
}

/// read-only view over one day's cells
pub struct DutyRow<'a> {
    cells: &'a [DutyCell],
}

impl<'a> DutyRow<'a> {
    pub fn cells(&self) -> &'a [DutyCell] {
        self.cells
    }

    pub fn free_positions(&self) -> HashSet<u32> {
        self.cells
            .iter()
            .filter(|cell| !cell.is_set())
            .map(|cell| cell.position)
            .collect()
    }

    pub fn has_duty(&self, doctor_pk: i64) -> bool {
        self.cells
            .iter()
            .any(|cell| cell.doctor.as_ref().is_some_and(|d| d.pk == doctor_pk))
    }

    pub fn set_duties(&self) -> impl Iterator<Item = &'a DutyCell> {
        self.cells.iter().filter(|cell| cell.is_set())
    }

    pub fn is_set(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_set())
    }
}

/// the day x position grid of duty cells
#[derive(Clone, Debug)]
pub struct DutySchedule {
    year: i32,
    month: u32,
    positions: u32,
    days_in_month: u32,
    cells: Vec<DutyCell>,
}

impl DutySchedule {
    pub fn new(year: i32, month: u32, positions: u32) -> Self {
        let calendar = Calendar::new(year, month);
        let days_in_month = calendar.days_in_month();
        let mut cells = Vec::with_capacity((days_in_month * positions) as usize);
        for day in calendar.days() {
            for position in 1..=positions {
                cells.push(DutyCell::empty(day.number, position, day.strain_points));
            }
        }
        Self {
            year,
            month,
            positions,
            days_in_month,
            cells,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn positions(&self) -> u32 {
        self.positions
    }

    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    fn index(&self, day: u32, position: u32) -> Result<usize, ProgrammerError> {
        if day < 1 || day > self.days_in_month || position < 1 || position > self.positions {
            return Err(ProgrammerError::OutOfRange { day, position });
        }
        Ok(((day - 1) * self.positions + (position - 1)) as usize)
    }

    pub fn get(&self, day: u32, position: u32) -> Result<&DutyCell, ProgrammerError> {
        let index = self.index(day, position)?;
        Ok(&self.cells[index])
    }

    pub fn get_mut(&mut self, day: u32, position: u32) -> Result<&mut DutyCell, ProgrammerError> {
        let index = self.index(day, position)?;
        Ok(&mut self.cells[index])
    }

    pub fn row(&self, day: u32) -> Result<DutyRow<'_>, ProgrammerError> {
        if day < 1 || day > self.days_in_month {
            return Err(ProgrammerError::OutOfRange { day, position: 1 });
        }
        let start = ((day - 1) * self.positions) as usize;
        let end = start + self.positions as usize;
        Ok(DutyRow {
            cells: &self.cells[start..end],
        })
    }

    pub fn cells(&self) -> impl Iterator<Item = &DutyCell> {
        self.cells.iter()
    }

    pub fn duties_for_doctor(&self, doctor_pk: i64) -> impl Iterator<Item = &DutyCell> {
        self.cells
            .iter()
            .filter(move |cell| cell.doctor.as_ref().is_some_and(|d| d.pk == doctor_pk))
    }

    /// deep copy of cell state; doctors are shared via `Rc`, never duplicated
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// copy all set cells from `other` into `self`, overwriting only empty
    /// cells; `set_by_user` cells in `self` are preserved
    pub fn merge(&mut self, other: &DutySchedule) {
        for (mine, theirs) in self.cells.iter_mut().zip(other.cells.iter()) {
            if mine.set_by_user || mine.is_set() {
                continue;
            }
            if let Some(doctor) = &theirs.doctor {
                mine.update(doctor.clone(), theirs.pk, Some(theirs.strain_points), Some(theirs.set_by_user));
            }
        }
    }

    pub fn is_filled(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_set())
    }

    pub fn not_filled_rows_count(&self) -> u32 {
        (1..=self.days_in_month)
            .filter(|&day| !self.row(day).expect("day in range").is_set())
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::Preferences;
    use std::collections::HashSet as HSet;

    fn doctor(pk: i64) -> Rc<Doctor> {
        Rc::new(Doctor::new(
            pk,
            format!("Doctor {pk}"),
            Preferences {
                exceptions: HSet::new(),
                requested_days: HSet::new(),
                preferred_weekdays: (0..7).collect(),
                preferred_positions: HSet::from([1, 2, 3]),
                maximum_accepted_duties: 15,
            },
        ))
    }

    #[test]
    fn new_schedule_has_all_cells_empty() {
        let schedule = DutySchedule::new(2025, 1, 3);
        assert!(!schedule.is_filled());
        assert_eq!(schedule.not_filled_rows_count(), 31);
    }

    #[test]
    fn get_out_of_range_fails() {
        let schedule = DutySchedule::new(2025, 1, 3);
        assert!(schedule.get(32, 1).is_err());
        assert!(schedule.get(1, 4).is_err());
    }

    #[test]
    fn update_then_row_reports_free_positions() {
        let mut schedule = DutySchedule::new(2025, 1, 3);
        schedule
            .get_mut(5, 1)
            .unwrap()
            .update(doctor(1), None, None, Some(false));

        let row = schedule.row(5).unwrap();
        assert_eq!(row.free_positions(), HSet::from([2, 3]));
        assert!(row.has_duty(1));
        assert!(!row.has_duty(2));
    }

    #[test]
    fn merge_preserves_set_by_user_cells() {
        let mut base = DutySchedule::new(2025, 1, 1);
        base.get_mut(1, 1).unwrap().update(doctor(99), None, None, Some(true));

        let mut incoming = DutySchedule::new(2025, 1, 1);
        incoming.get_mut(1, 1).unwrap().update(doctor(1), None, None, Some(false));
        incoming.get_mut(2, 1).unwrap().update(doctor(2), None, None, Some(false));

        base.merge(&incoming);

        assert_eq!(base.get(1, 1).unwrap().doctor.as_ref().unwrap().pk, 99);
        assert_eq!(base.get(2, 1).unwrap().doctor.as_ref().unwrap().pk, 2);
    }

    #[test]
    fn merge_preserves_already_set_non_user_cells() {
        let mut base = DutySchedule::new(2025, 1, 1);
        base.get_mut(1, 1).unwrap().update(doctor(7), None, None, Some(false));

        let mut incoming = DutySchedule::new(2025, 1, 1);
        incoming.get_mut(1, 1).unwrap().update(doctor(8), None, None, Some(false));

        base.merge(&incoming);

        assert_eq!(base.get(1, 1).unwrap().doctor.as_ref().unwrap().pk, 7);
    }

    #[test]
    fn duties_for_doctor_filters_by_pk() {
        let mut schedule = DutySchedule::new(2025, 1, 2);
        schedule.get_mut(1, 1).unwrap().update(doctor(7), None, None, None);
        schedule.get_mut(3, 2).unwrap().update(doctor(7), None, None, None);
        schedule.get_mut(2, 1).unwrap().update(doctor(8), None, None, None);

        assert_eq!(schedule.duties_for_doctor(7).count(), 2);
        assert_eq!(schedule.duties_for_doctor(8).count(), 1);
    }
}
