use crate::data::{RoleQuota, Roster, Show, Slot, Student};
use crate::error::RosterError;
use log::info;
use std::path::{Path, PathBuf};

/// Read access to the shows, slots and students of one optimization run.
///
/// The optimizer never writes through this interface; whatever backs it
/// (a file, a database session, fixtures) is supplied by the caller.
pub trait RosterProvider {
    fn shows(&self) -> &[Show];
    fn slots(&self) -> &[Slot];
    fn students(&self) -> &[Student];

    /// Copies the provider's view into an owned [`Roster`].
    fn snapshot(&self) -> Roster {
        Roster::new(
            self.shows().to_vec(),
            self.slots().to_vec(),
            self.students().to_vec(),
        )
    }
}

impl RosterProvider for Roster {
    fn shows(&self) -> &[Show] {
        &self.shows
    }

    fn slots(&self) -> &[Slot] {
        &self.slots
    }

    fn students(&self) -> &[Student] {
        &self.students
    }

    fn snapshot(&self) -> Roster {
        self.clone()
    }
}

/// A roster stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonRosterFile {
    path: PathBuf,
}

impl JsonRosterFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<Roster, RosterError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| RosterError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let roster: Roster = serde_json::from_str(&text)?;
        info!(
            "Loaded roster from {}: {} shows, {} slots, {} students",
            self.path.display(),
            roster.shows.len(),
            roster.slots.len(),
            roster.students.len()
        );
        Ok(roster)
    }
}

pub const DEMO_ROLES: [&str; 5] = ["guitar", "vocals", "drums", "bass", "keys"];

/// Small built-in roster for demos and smoke tests.
pub fn seed_roster() -> Roster {
    let show = |name: &str| {
        DEMO_ROLES
            .iter()
            .fold(Show::new(name, 1, 2), |show, role| {
                show.with_quota(*role, RoleQuota::new(0, 100))
            })
    };
    let shows = vec![show("Led Zeppelin"), show("Metallica")];

    let slots = vec![
        Slot::new("Wed", 1),
        Slot::new("Sat-1", 1),
        Slot::new("Sat-2", 1),
    ];
    let everywhere: Vec<String> = slots.iter().map(|s| s.name.clone()).collect();

    let students = vec![
        Student::new("Ramona")
            .with_role("vocals")
            .prefers("Led Zeppelin", 1.0)
            .prefers("Metallica", 3.0)
            .available_in(everywhere.clone()),
        Student::new("Jennifer")
            .with_role("drums")
            .prefers("Led Zeppelin", 4.0)
            .prefers("Metallica", 0.0)
            .available_in(everywhere.clone()),
        Student::new("Chao")
            .with_role("guitar")
            .prefers("Led Zeppelin", 2.0)
            .prefers("Metallica", 2.0)
            .available_in(everywhere),
    ];

    Roster::new(shows, slots, students)
}
