use crate::data::Solution;
use log::info;
use std::io::Write;

/// Receives the winning solution once a run completes.
pub trait ResultConsumer {
    fn consume(&mut self, solution: &Solution) -> std::io::Result<()>;
}

/// Writes the solution to the log.
#[derive(Debug, Default)]
pub struct LogConsumer;

impl ResultConsumer for LogConsumer {
    fn consume(&mut self, solution: &Solution) -> std::io::Result<()> {
        info!("Total utility: {}", solution.total_utility);
        for (show, slot) in solution.slot_assignment.show_slots() {
            let students: Vec<&str> = solution.students_in(show).collect();
            info!("{} @ {}: {}", show, slot, students.join(", "));
        }
        Ok(())
    }
}

/// Writes the solution as pretty-printed JSON.
#[derive(Debug)]
pub struct JsonConsumer<W> {
    out: W,
}

impl<W: Write> JsonConsumer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultConsumer for JsonConsumer<W> {
    fn consume(&mut self, solution: &Solution) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, solution)?;
        writeln!(self.out)
    }
}
