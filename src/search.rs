//! frontier-based best-first DFS that fills the remaining, unrequested
//! duties, guided by strain, with adaptive depth widening
//!
//! nodes live in a flat arena (`Vec<Node>`); a node's parent is an index
//! into the same arena rather than an owned reference, so walking the
//! parent chain to reconstruct a schedule is a cheap integer walk with no
//! extra allocation per node.

use std::collections::VecDeque;
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::availability::AvailabilityProjector;
use crate::calendar::Calendar;
use crate::doctor::Doctor;
use crate::duty_schedule::DutySchedule;
use crate::error::ProgrammerError;
use crate::strain::StrainEvaluator;

const MAX_STEPS: u32 = 1000;

/// one node of the search tree; `None` parent marks the empty sentinel root
#[derive(Clone, Debug)]
struct Node {
    day_number: Option<u32>,
    doctors: Vec<Rc<Doctor>>,
    /// per-position evaluated strain, parallel to `doctors`; committed to
    /// each cell's `strain_points` on reconstruction
    doctor_strains: Vec<i64>,
    strain: i64,
    parent: Option<usize>,
    total_strain: i64,
    days_set: u32,
}

impl Node {
    fn sentinel() -> Self {
        Self {
            day_number: None,
            doctors: Vec::new(),
            doctor_strains: Vec::new(),
            strain: 0,
            parent: None,
            total_strain: 0,
            days_set: 0,
        }
    }
}

pub struct SearchCore<'a, R: Rng> {
    calendar: &'a Calendar,
    evaluator: StrainEvaluator,
    rng: &'a mut R,
    depth: u32,
    positions: u32,
    arena: Vec<Node>,
}

impl<'a, R: Rng> SearchCore<'a, R> {
    pub fn new(calendar: &'a Calendar, evaluator: StrainEvaluator, rng: &'a mut R, positions: u32) -> Self {
        Self {
            calendar,
            evaluator,
            rng,
            depth: 2,
            positions,
            arena: Vec::new(),
        }
    }

    /// searches for a completion of `base` and merges the best schedule
    /// found back into it; never fails the schedule, only returns an error
    /// for a genuine invariant violation
    pub fn fill(&mut self, doctors: &[Rc<Doctor>], base: &mut DutySchedule) -> Result<(), ProgrammerError> {
        let target_days = base.not_filled_rows_count();
        if target_days == 0 {
            return Ok(());
        }

        self.arena.clear();
        self.arena.push(Node::sentinel());
        let mut frontier: VecDeque<usize> = VecDeque::from([0]);

        let mut best: Option<usize> = None;
        let mut steps: u32 = 0;

        while let Some(current) = frontier.pop_back() {
            steps += 1;

            if Self::improves(&self.arena, best, current) {
                best = Some(current);
            }

            if self.arena[current].days_set == target_days {
                best = Some(current);
                break;
            }

            let children = self.expand(current, doctors, base)?;
            if !children.is_empty() {
                self.push_children(&mut frontier, children);
            }

            if steps > 2 * target_days && self.depth * self.positions < doctors.len() as u32 {
                self.depth += 1;
            }

            if steps > MAX_STEPS {
                break;
            }
        }

        if let Some(best) = best {
            let completed = self.reconstruct(best, base);
            base.merge(&completed);
        }

        Ok(())
    }

    fn improves(arena: &[Node], best: Option<usize>, candidate: usize) -> bool {
        match best {
            None => true,
            Some(best) => {
                let best = &arena[best];
                let candidate = &arena[candidate];
                candidate.days_set > best.days_set
                    || (candidate.days_set == best.days_set && candidate.total_strain < best.total_strain)
            }
        }
    }

    fn push_children(&mut self, frontier: &mut VecDeque<usize>, mut children: Vec<usize>) {
        children.shuffle(self.rng);
        children.sort_by_key(|&index| self.arena[index].strain);

        let mut iter = children.into_iter();
        if let Some(first) = iter.next() {
            let remainder: Vec<usize> = iter.collect();
            for index in remainder.into_iter().rev() {
                frontier.push_front(index);
            }
            frontier.push_back(first);
        }
    }

    /// reconstructs the schedule a node encodes: clone of `base`, then the
    /// parent chain's (day, doctors, strains) bindings superimposed in
    /// root-to-leaf order
    fn reconstruct(&self, node_index: usize, base: &DutySchedule) -> DutySchedule {
        let mut chain = Vec::new();
        let mut current = Some(node_index);
        while let Some(index) = current {
            let node = &self.arena[index];
            if let Some(day_number) = node.day_number {
                chain.push((day_number, node.doctors.clone(), node.doctor_strains.clone()));
            }
            current = node.parent;
        }

        let mut schedule = base.copy();
        for (day_number, doctors, strains) in chain.into_iter().rev() {
            for (position, (doctor, strain)) in (1..).zip(doctors.into_iter().zip(strains)) {
                if let Ok(cell) = schedule.get_mut(day_number, position) {
                    cell.update(doctor, None, Some(strain), Some(false));
                }
            }
        }
        schedule
    }

    fn expand(
        &mut self,
        node_index: usize,
        doctors: &[Rc<Doctor>],
        base: &DutySchedule,
    ) -> Result<Vec<usize>, ProgrammerError> {
        let partial = self.reconstruct(node_index, base);

        let projector = AvailabilityProjector::new(self.calendar);
        let availability = projector.project(doctors, &partial);

        let Some(day_number) = self.pick_day(&partial, &availability) else {
            return Ok(Vec::new());
        };

        let row = availability.row(day_number);
        let day = self.calendar.day(day_number);

        let union = row.doctors_for_all_positions();
        let mut strain_per_doctor: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();
        for doctor in &union {
            strain_per_doctor.insert(doctor.pk, self.evaluator.evaluate(&day, doctor, &partial)?);
        }

        let truncated_width = (self.depth * self.positions) as usize;
        let per_position: Vec<Vec<Rc<Doctor>>> = (1..=self.positions)
            .map(|position| {
                let mut candidates = row.cell(position).candidates.clone();
                candidates.sort_by_key(|d| strain_per_doctor.get(&d.pk).copied().unwrap_or(i64::MAX));
                candidates.truncate(truncated_width);
                candidates
            })
            .collect();

        let tuples = unique_tuples(&per_position);

        let base_union_prev = if day_number > 1 {
            Some(availability.row(day_number - 1).doctors_for_all_positions())
        } else {
            None
        };
        let base_union_next = if day_number < partial.days_in_month() {
            Some(availability.row(day_number + 1).doctors_for_all_positions())
        } else {
            None
        };

        let mut child_indices = Vec::new();
        for tuple in tuples {
            if self.conflicts_with_neighbour(&tuple, base_union_prev.as_deref()) {
                continue;
            }
            if self.conflicts_with_neighbour(&tuple, base_union_next.as_deref()) {
                continue;
            }

            let doctor_strains: Vec<i64> = tuple.iter().map(|d| strain_per_doctor.get(&d.pk).copied().unwrap_or(0)).collect();
            let strain: i64 = doctor_strains.iter().sum();
            let parent_total = self.arena[node_index].total_strain;
            let parent_days = self.arena[node_index].days_set;
            let child = Node {
                day_number: Some(day_number),
                doctors: tuple,
                doctor_strains,
                strain,
                parent: Some(node_index),
                total_strain: parent_total + strain,
                days_set: parent_days + 1,
            };
            self.arena.push(child);
            child_indices.push(self.arena.len() - 1);
        }

        Ok(child_indices)
    }

    /// a candidate tuple is unsolvable if staffing it would leave fewer
    /// than `positions` distinct doctors available for the neighbour day
    fn conflicts_with_neighbour(&self, tuple: &[Rc<Doctor>], neighbour_union: Option<&[Rc<Doctor>]>) -> bool {
        let Some(neighbour_union) = neighbour_union else {
            return false;
        };
        let taken: std::collections::HashSet<i64> = tuple.iter().map(|d| d.pk).collect();
        let remaining = neighbour_union.iter().filter(|d| !taken.contains(&d.pk)).count();
        (remaining as u32) < self.positions
    }

    /// the not-yet-filled day with the fewest average candidates per free
    /// position (fail-fast variable ordering)
    fn pick_day(&self, schedule: &DutySchedule, availability: &crate::availability::AvailabilitySchedule) -> Option<u32> {
        (1..=schedule.days_in_month())
            .filter(|&day| !schedule.row(day).expect("day in range").is_set())
            .min_by(|&a, &b| {
                let a = availability.row(a).average_doctors_per_free_position();
                let b = availability.row(b).average_doctors_per_free_position();
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

/// the Cartesian product across positions, filtered to tuples whose
/// doctors are pairwise distinct
fn unique_tuples(per_position: &[Vec<Rc<Doctor>>]) -> Vec<Vec<Rc<Doctor>>> {
    if per_position.is_empty() || per_position.iter().any(|p| p.is_empty()) {
        return Vec::new();
    }

    let mut result = vec![Vec::new()];
    for candidates in per_position {
        let mut next = Vec::new();
        for partial in &result {
            for doctor in candidates {
                if partial.iter().any(|d: &Rc<Doctor>| d.pk == doctor.pk) {
                    continue;
                }
                let mut extended = partial.clone();
                extended.push(doctor.clone());
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::Preferences;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn doctor(pk: i64, max: u32) -> Rc<Doctor> {
        Rc::new(Doctor::new(
            pk,
            format!("Doctor {pk}"),
            Preferences {
                exceptions: HashSet::new(),
                requested_days: HashSet::new(),
                preferred_weekdays: (0..7).collect(),
                preferred_positions: HashSet::from([1]),
                maximum_accepted_duties: max,
            },
        ))
    }

    #[test]
    fn fills_a_tiny_schedule_completely() {
        let calendar = Calendar::new(2025, 2);
        let doctors: Vec<_> = (0..10).map(|pk| doctor(pk, 15)).collect();
        let evaluator = StrainEvaluator::new(2025, 2, 1, &doctors);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mut schedule = DutySchedule::new(2025, 2, 1);
        let mut core = SearchCore::new(&calendar, evaluator, &mut rng, 1);
        core.fill(&doctors, &mut schedule).unwrap();

        assert!(schedule.is_filled());
    }

    #[test]
    fn unique_tuples_excludes_repeated_doctors() {
        let a = doctor(1, 10);
        let b = doctor(2, 10);
        let per_position = vec![vec![a.clone(), b.clone()], vec![a.clone(), b.clone()]];

        let tuples = unique_tuples(&per_position);
        assert_eq!(tuples.len(), 2);
        for tuple in tuples {
            assert_ne!(tuple[0].pk, tuple[1].pk);
        }
    }
}
