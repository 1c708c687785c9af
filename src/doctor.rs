//! doctors and their duty preferences
//!
//! weekdays here follow the spec's own numbering (Monday = 0 .. Sunday =
//! 6), which happens to coincide with `chrono::Weekday::num_days_from_monday`.

use std::collections::HashSet;

/// one doctor's preferences for a single month's schedule
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preferences {
    /// days this doctor may never be assigned
    pub exceptions: HashSet<u32>,
    /// days this doctor demands to be assigned
    pub requested_days: HashSet<u32>,
    /// weekdays (0=Mon..6=Sun) this doctor is willing to work, absent a request
    pub preferred_weekdays: HashSet<u8>,
    /// positions (1..=P) this doctor is willing to fill
    pub preferred_positions: HashSet<u32>,
    /// maximum duties this doctor will accept this month, clamped to
    /// `floor(days_in_month / 2)` by [`Preferences::clamp_maximum`]
    pub maximum_accepted_duties: u32,
}

impl Preferences {
    /// enforce the `maximum_accepted_duties <= floor(days_in_month / 2)`
    /// invariant; must be called once per doctor when a schedule's month
    /// is known, typically right after loading the input document
    pub fn clamp_maximum(&mut self, days_in_month: u32) {
        let cap = days_in_month / 2;
        self.maximum_accepted_duties = self.maximum_accepted_duties.min(cap);
    }
}

/// a doctor eligible for duty, with stable identity `pk`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Doctor {
    pub pk: i64,
    pub name: String,
    pub preferences: Preferences,
    /// days of the *previous* month this doctor already holds a duty on
    pub last_month_duties: HashSet<u32>,
    /// days of the *next* month this doctor already holds a duty on
    pub next_month_duties: HashSet<u32>,
}

impl Doctor {
    pub fn new(pk: i64, name: impl Into<String>, preferences: Preferences) -> Self {
        Self {
            pk,
            name: name.into(),
            preferences,
            last_month_duties: HashSet::new(),
            next_month_duties: HashSet::new(),
        }
    }
}

impl std::fmt::Display for Doctor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (pk={})", self.name, self.pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(max: u32) -> Preferences {
        Preferences {
            exceptions: HashSet::new(),
            requested_days: HashSet::new(),
            preferred_weekdays: (0..7).collect(),
            preferred_positions: HashSet::from([1, 2, 3]),
            maximum_accepted_duties: max,
        }
    }

    #[test]
    fn clamp_maximum_caps_to_half_the_month() {
        let mut preferences = prefs(100);
        preferences.clamp_maximum(31);
        assert_eq!(preferences.maximum_accepted_duties, 15);
    }

    #[test]
    fn clamp_maximum_leaves_lower_values_untouched() {
        let mut preferences = prefs(5);
        preferences.clamp_maximum(31);
        assert_eq!(preferences.maximum_accepted_duties, 5);
    }
}
