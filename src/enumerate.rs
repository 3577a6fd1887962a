use crate::data::{Show, Slot, SlotAssignment};

/// Lazily yields every placement of `shows` into `slots` that respects each
/// slot's `max_shows`.
///
/// Placements come out in the order induced by trying slots in input order
/// for each show, shows taken in input order. The search is depth-first over
/// an explicit stack, so memory stays at one frame per show and the caller
/// can stop at any point.
///
/// The space is bounded by `slots.len() ^ shows.len()` before pruning, so
/// this is only practical for small rosters.
#[derive(Debug, Clone)]
pub struct SlotAssignments<'a> {
    slots: &'a [Slot],
    shows: &'a [Show],
    /// Slot index chosen for each placed show, one entry per depth.
    chosen: Vec<usize>,
    /// Next slot index to try at each depth.
    cursor: Vec<usize>,
    /// Shows currently placed per slot.
    used: Vec<u32>,
    done: bool,
}

pub fn enumerate_slot_assignments<'a>(slots: &'a [Slot], shows: &'a [Show]) -> SlotAssignments<'a> {
    SlotAssignments {
        slots,
        shows,
        chosen: Vec::with_capacity(shows.len()),
        cursor: vec![0; shows.len()],
        used: vec![0; slots.len()],
        done: false,
    }
}

impl SlotAssignments<'_> {
    /// Rewinds to the first placement.
    pub fn restart(&mut self) {
        self.chosen.clear();
        self.cursor.iter_mut().for_each(|c| *c = 0);
        self.used.iter_mut().for_each(|u| *u = 0);
        self.done = false;
    }

    fn build(&self) -> SlotAssignment {
        let mut assignment = SlotAssignment::new();
        for (show, &slot) in self.shows.iter().zip(&self.chosen) {
            assignment.assign(show.name.as_str(), self.slots[slot].name.as_str());
        }
        assignment
    }

    fn backtrack(&mut self) {
        if let Some(slot) = self.chosen.pop() {
            self.used[slot] -= 1;
        }
    }
}

impl Iterator for SlotAssignments<'_> {
    type Item = SlotAssignment;

    fn next(&mut self) -> Option<SlotAssignment> {
        if self.done {
            return None;
        }
        if self.shows.is_empty() {
            self.done = true;
            return Some(SlotAssignment::new());
        }

        loop {
            let depth = self.chosen.len();
            if depth == self.shows.len() {
                let placement = self.build();
                self.backtrack();
                return Some(placement);
            }

            let open = (self.cursor[depth]..self.slots.len())
                .find(|&slot| self.used[slot] < self.slots[slot].max_shows);

            match open {
                Some(slot) => {
                    self.cursor[depth] = slot + 1;
                    self.chosen.push(slot);
                    self.used[slot] += 1;
                    if depth + 1 < self.shows.len() {
                        self.cursor[depth + 1] = 0;
                    }
                }
                None if depth == 0 => {
                    self.done = true;
                    return None;
                }
                None => {
                    self.cursor[depth] = 0;
                    self.backtrack();
                }
            }
        }
    }
}

/// `slots ^ shows`, the unpruned size of the placement space, or `None` on
/// overflow.
pub fn search_space_upper_bound(num_slots: usize, num_shows: usize) -> Option<u128> {
    let exponent = u32::try_from(num_shows).ok()?;
    (num_slots as u128).checked_pow(exponent)
}
