use crate::data::{Roster, SlotAssignment};

/// Solver inputs for one placement: utility and availability for every
/// (student, show) pair, indexed `[student][show]` in roster order.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSlotProblem {
    utility: Vec<Vec<f64>>,
    available: Vec<Vec<bool>>,
}

impl FixedSlotProblem {
    /// A student is available for a show iff the placement's slot for that
    /// show is among the student's available slots. Shows the placement does
    /// not cover are unavailable to everyone.
    pub fn build(roster: &Roster, placement: &SlotAssignment) -> Self {
        let utility = roster
            .students
            .iter()
            .map(|student| {
                roster
                    .shows
                    .iter()
                    .map(|show| student.utility(&show.name))
                    .collect()
            })
            .collect();

        let available = roster
            .students
            .iter()
            .map(|student| {
                roster
                    .shows
                    .iter()
                    .map(|show| {
                        placement
                            .show_slot(&show.name)
                            .is_some_and(|slot| student.is_available_for_slot(slot))
                    })
                    .collect()
            })
            .collect();

        Self { utility, available }
    }

    pub fn utility(&self, student: usize, show: usize) -> f64 {
        self.utility[student][show]
    }

    pub fn is_available(&self, student: usize, show: usize) -> bool {
        self.available[student][show]
    }

    pub fn num_students(&self) -> usize {
        self.utility.len()
    }

    /// Every (student, show) pair the student can actually attend.
    pub fn available_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.available.iter().enumerate().flat_map(|(student, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, ok)| **ok)
                .map(move |(show, _)| (student, show))
        })
    }
}
