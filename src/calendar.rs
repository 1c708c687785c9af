//! day metadata: weekday, week-of-month, category and base strain points
//!
//! holidays are a static read-only table keyed by `(year, month)`, loaded
//! once; see [`HolidayTable::default`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use chrono::{Datelike, NaiveDate, Weekday};

/// classification of a day, used to branch strain and availability rules
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DayCategory {
    Weekday,
    Thursday,
    Weekend,
    Holiday,
}

/// a read-only `(year, month) -> {day numbers}` table of holidays
///
/// the default table carries a multi-year Polish holiday calendar (moving
/// feasts included) covering 2022-2032; years outside that range simply
/// have no holidays, they never panic or error.
#[derive(Clone, Debug, Default)]
pub struct HolidayTable {
    days: Arc<HashMap<(i32, u32), HashSet<u32>>>,
}

impl HolidayTable {
    pub fn new(days: HashMap<(i32, u32), HashSet<u32>>) -> Self {
        Self { days: Arc::new(days) }
    }

    pub fn is_holiday(&self, year: i32, month: u32, day: u32) -> bool {
        self.days
            .get(&(year, month))
            .is_some_and(|days| days.contains(&day))
    }
}

static DEFAULT_HOLIDAYS: LazyLock<HolidayTable> = LazyLock::new(build_default_holidays);

fn build_default_holidays() -> HolidayTable {
    let mut days: HashMap<(i32, u32), HashSet<u32>> = HashMap::new();
    let mut add = |year: i32, month: u32, nums: &[u32]| {
        days.entry((year, month)).or_default().extend(nums);
    };

    for year in 2022..=2032 {
        add(year, 1, &[1, 6]);
        add(year, 5, &[1, 3]);
        add(year, 8, &[15]);
        add(year, 11, &[1, 11]);
        add(year, 12, &[24, 25, 26, 31]);
    }

    // Easter
    add(2022, 4, &[16, 17, 18]);
    add(2023, 4, &[8, 9, 10]);
    add(2024, 3, &[30, 31]);
    add(2024, 4, &[1]);
    add(2025, 4, &[19, 20, 21]);
    add(2026, 4, &[4, 5, 6]);
    add(2027, 3, &[27, 28, 29]);
    add(2028, 4, &[15, 16, 17]);
    add(2029, 3, &[31]);
    add(2029, 4, &[1, 2]);
    add(2030, 4, &[20, 21, 22]);
    add(2031, 4, &[12, 13, 14]);
    add(2032, 3, &[27, 28, 29]);

    // Corpus Christi long weekend
    add(2022, 6, &[16, 17, 18, 19]);
    add(2023, 6, &[8, 9, 10, 11]);
    add(2024, 5, &[30, 31]);
    add(2024, 6, &[1, 6]);
    add(2025, 6, &[19, 20, 21, 22]);
    add(2026, 6, &[4, 5, 6, 7]);
    add(2027, 5, &[27, 28, 29, 30]);
    add(2028, 6, &[15, 16, 17, 18]);
    add(2029, 5, &[31]);
    add(2029, 6, &[1, 2, 3]);
    add(2030, 6, &[20, 21, 22, 23]);
    add(2031, 6, &[12, 13, 14, 15]);
    add(2032, 5, &[27, 28, 29, 30]);

    // long weekend in May
    add(2022, 4, &[30]);
    add(2022, 5, &[2]);
    add(2023, 4, &[29, 30]);
    add(2023, 5, &[2]);
    add(2024, 5, &[2, 4, 5]);
    add(2025, 5, &[2, 4]);
    add(2026, 5, &[2]);
    add(2027, 5, &[2]);
    add(2028, 4, &[29, 30]);
    add(2028, 5, &[2]);
    add(2029, 5, &[2]);
    add(2030, 5, &[2, 4, 5]);
    add(2031, 5, &[2, 4]);
    add(2032, 5, &[2]);

    // other bridge days
    add(2022, 1, &[7]);
    add(2022, 10, &[31]);
    add(2025, 11, &[10]);
    add(2026, 1, &[2, 5]);
    add(2027, 11, &[12]);
    add(2028, 1, &[7]);
    add(2029, 11, &[2]);
    add(2031, 11, &[10]);
    add(2032, 1, &[2, 5]);
    add(2032, 11, &[12]);

    HolidayTable::new(days)
}

/// immutable metadata for a single day of a schedule's month
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Day {
    pub number: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: Weekday,
    pub week_of_month: i64,
    pub category: DayCategory,
    pub strain_points: i64,
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Day {}/{}/{}", self.number, self.month, self.year)
    }
}

/// lookup of day metadata and holidays for one (year, month)
#[derive(Clone, Debug)]
pub struct Calendar {
    year: i32,
    month: u32,
    holidays: HolidayTable,
    days_in_month: u32,
}

impl Calendar {
    pub fn new(year: i32, month: u32) -> Self {
        Self::with_holidays(year, month, DEFAULT_HOLIDAYS.clone())
    }

    pub fn with_holidays(year: i32, month: u32, holidays: HolidayTable) -> Self {
        Self {
            year,
            month,
            holidays,
            days_in_month: days_in_month(year, month),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    /// metadata for `day` (1-based); panics if out of range, callers are
    /// expected to only request days within `1..=days_in_month()`
    pub fn day(&self, day: u32) -> Day {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, day)
            .unwrap_or_else(|| panic!("day {day} is out of range for {}/{}", self.month, self.year));

        let weekday = date.weekday();
        let is_holiday = self.holidays.is_holiday(self.year, self.month, day);

        let category = if weekday == Weekday::Thu {
            DayCategory::Thursday
        } else if is_weekend(weekday) {
            DayCategory::Weekend
        } else if is_holiday {
            DayCategory::Holiday
        } else {
            DayCategory::Weekday
        };

        let strain_points = if is_holiday {
            140
        } else {
            match weekday {
                Weekday::Thu => 70,
                Weekday::Fri => 90,
                Weekday::Sat => 110,
                Weekday::Sun => 100,
                _ => 80,
            }
        };

        Day {
            number: day,
            month: self.month,
            year: self.year,
            weekday,
            week_of_month: week_of_month(date),
            category,
            strain_points,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        (1..=self.days_in_month).map(|n| self.day(n))
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

fn week_of_month(date: NaiveDate) -> i64 {
    let first_of_month = date.with_day(1).expect("day 1 always exists");
    date.iso_week().week() as i64 - first_of_month.iso_week().week() as i64
}

/// number of days in `month`/`year` (1-indexed month)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("valid month");
    let first_of_this = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    (first_of_next - first_of_this).num_days() as u32
}
