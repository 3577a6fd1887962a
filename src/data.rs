use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

// Type aliases for clarity
pub type ShowName = String;
pub type SlotName = String;
pub type StudentName = String;
pub type Role = String;

/// Headcount bounds for students holding one role within a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleQuota {
    #[serde(default)]
    pub min: u32,
    /// `None` means no upper bound.
    #[serde(default)]
    pub max: Option<u32>,
}

impl RoleQuota {
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    pub fn contains(&self, count: u32) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl Default for RoleQuota {
    fn default() -> Self {
        Self::at_least(0)
    }
}

/// A bookable activity with headcount and per-role limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub name: ShowName,
    pub student_min: u32,
    pub student_max: u32,
    /// Roles missing from this map are unconstrained.
    #[serde(default)]
    pub role_quota: BTreeMap<Role, RoleQuota>,
}

impl Show {
    pub fn new(name: impl Into<ShowName>, student_min: u32, student_max: u32) -> Self {
        Self {
            name: name.into(),
            student_min,
            student_max,
            role_quota: BTreeMap::new(),
        }
    }

    pub fn with_quota(mut self, role: impl Into<Role>, quota: RoleQuota) -> Self {
        self.role_quota.insert(role.into(), quota);
        self
    }

    pub fn quota(&self, role: &str) -> RoleQuota {
        self.role_quota.get(role).copied().unwrap_or_default()
    }
}

/// A time window hosting at most `max_shows` shows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub name: SlotName,
    pub max_shows: u32,
}

impl Slot {
    pub fn new(name: impl Into<SlotName>, max_shows: u32) -> Self {
        Self {
            name: name.into(),
            max_shows,
        }
    }
}

/// A person to be placed in exactly one show.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub name: StudentName,
    #[serde(default)]
    pub preferences: HashMap<ShowName, f64>,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub available_slots: BTreeSet<SlotName>,
}

impl Student {
    pub fn new(name: impl Into<StudentName>) -> Self {
        Self {
            name: name.into(),
            preferences: HashMap::new(),
            roles: BTreeSet::new(),
            available_slots: BTreeSet::new(),
        }
    }

    pub fn prefers(mut self, show: impl Into<ShowName>, utility: f64) -> Self {
        self.preferences.insert(show.into(), utility);
        self
    }

    pub fn with_role(mut self, role: impl Into<Role>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn available_in<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SlotName>,
    {
        self.available_slots.extend(slots.into_iter().map(Into::into));
        self
    }

    /// Utility for a show; shows without a preference score 0.
    pub fn utility(&self, show: &str) -> f64 {
        self.preferences.get(show).copied().unwrap_or(0.0)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_available_for_slot(&self, slot: &str) -> bool {
        self.available_slots.contains(slot)
    }
}

/// The complete, read-only input of one optimization run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(default)]
    pub shows: Vec<Show>,
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl Roster {
    pub fn new(shows: Vec<Show>, slots: Vec<Slot>, students: Vec<Student>) -> Self {
        Self {
            shows,
            slots,
            students,
        }
    }

    pub fn show(&self, name: &str) -> Option<&Show> {
        self.shows.iter().find(|s| s.name == name)
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// Mapping from show to slot.
///
/// A show is written at most once; the enumerator never produces a
/// placement that exceeds a slot's `max_shows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SlotAssignment {
    show_slots: BTreeMap<ShowName, SlotName>,
}

impl SlotAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `show` into `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `show` already has a slot.
    pub fn assign(&mut self, show: impl Into<ShowName>, slot: impl Into<SlotName>) {
        let show = show.into();
        let slot = slot.into();
        if let Some(previous) = self.show_slots.get(&show) {
            panic!(
                "show {} is already assigned to slot {}, refusing to reassign it to {}",
                show, previous, slot
            );
        }
        self.show_slots.insert(show, slot);
    }

    pub fn show_slot(&self, show: &str) -> Option<&str> {
        self.show_slots.get(show).map(String::as_str)
    }

    pub fn show_slots(&self) -> &BTreeMap<ShowName, SlotName> {
        &self.show_slots
    }

    pub fn num_shows(&self, slot: &str) -> usize {
        self.show_slots.values().filter(|s| *s == slot).count()
    }

    pub fn len(&self) -> usize {
        self.show_slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.show_slots.is_empty()
    }
}

impl fmt::Display for SlotAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .show_slots
            .iter()
            .map(|(show, slot)| format!("{show}@{slot}"))
            .collect();
        write!(f, "[{}]", pairs.join(", "))
    }
}

/// The final output: a placement plus the student assignment it admits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub total_utility: f64,
    pub student_show_assignment: BTreeMap<StudentName, ShowName>,
    pub slot_assignment: SlotAssignment,
}

/// Describes one broken invariant found by [`Solution::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub constraint_type: String,
    pub description: String,
}

impl Violation {
    fn new(constraint_type: &str, description: String) -> Self {
        Self {
            constraint_type: constraint_type.to_string(),
            description,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}

impl Solution {
    pub fn assigned_show(&self, student: &str) -> Option<&str> {
        self.student_show_assignment.get(student).map(String::as_str)
    }

    pub fn students_in(&self, show: &str) -> impl Iterator<Item = &str> + '_ {
        let show = show.to_string();
        self.student_show_assignment
            .iter()
            .filter(move |(_, s)| **s == show)
            .map(|(student, _)| student.as_str())
    }

    /// Re-checks every scheduling invariant against `roster`.
    pub fn verify(&self, roster: &Roster) -> Vec<Violation> {
        let mut violations = Vec::new();

        // exactly one show per student
        for student in &roster.students {
            match self.assigned_show(&student.name) {
                None => violations.push(Violation::new(
                    "Exactly One Show",
                    format!("Student {} has no show.", student.name),
                )),
                Some(show) if roster.show(show).is_none() => violations.push(Violation::new(
                    "Exactly One Show",
                    format!("Student {} is assigned to unknown show {}.", student.name, show),
                )),
                Some(_) => {}
            }
        }
        for student in self.student_show_assignment.keys() {
            if !roster.students.iter().any(|s| &s.name == student) {
                violations.push(Violation::new(
                    "Exactly One Show",
                    format!("Unknown student {} appears in the assignment.", student),
                ));
            }
        }

        // slot capacity
        for slot in &roster.slots {
            let placed = self.slot_assignment.num_shows(&slot.name);
            if placed > slot.max_shows as usize {
                violations.push(Violation::new(
                    "Slot Capacity",
                    format!(
                        "Slot {} hosts {} shows but allows {}.",
                        slot.name, placed, slot.max_shows
                    ),
                ));
            }
        }

        for show in &roster.shows {
            let Some(slot) = self.slot_assignment.show_slot(&show.name) else {
                violations.push(Violation::new(
                    "Slot Capacity",
                    format!("Show {} has no slot.", show.name),
                ));
                continue;
            };

            let members: Vec<&Student> = roster
                .students
                .iter()
                .filter(|s| self.assigned_show(&s.name) == Some(show.name.as_str()))
                .collect();

            let headcount = members.len() as u32;
            if headcount < show.student_min || headcount > show.student_max {
                violations.push(Violation::new(
                    "Headcount",
                    format!(
                        "Show {} has {} students, expected {}-{}.",
                        show.name, headcount, show.student_min, show.student_max
                    ),
                ));
            }

            for (role, quota) in &show.role_quota {
                let count = members.iter().filter(|s| s.has_role(role)).count() as u32;
                if !quota.contains(count) {
                    violations.push(Violation::new(
                        "Role Quota",
                        format!(
                            "Show {} has {} students with role {}, outside {:?}.",
                            show.name, count, role, quota
                        ),
                    ));
                }
            }

            for student in members {
                if !student.is_available_for_slot(slot) {
                    violations.push(Violation::new(
                        "Availability",
                        format!(
                            "Student {} is not available in slot {} for show {}.",
                            student.name, slot, show.name
                        ),
                    ));
                }
            }
        }

        violations
    }
}
