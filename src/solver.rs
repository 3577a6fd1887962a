use crate::backend::{LinearConstraint, LinearProgram, LpOutcome, SolverBackend};
use crate::data::{Roster, SlotAssignment, Solution};
use crate::error::{BackendError, PlacementError};
use crate::problem::FixedSlotProblem;
use itertools::Itertools;
use log::{debug, error, trace};
use std::collections::BTreeMap;

/// The 0/1 program for one placement plus the (student, show) pair behind
/// each variable.
#[derive(Debug, Clone)]
pub struct Formulation {
    pub program: LinearProgram,
    pub pairs: Vec<(usize, usize)>,
}

/// Builds the assignment program.
///
/// x_ij = 1 if student i is in show j. Pairs the student cannot attend get
/// no variable at all.
pub fn formulate(roster: &Roster, problem: &FixedSlotProblem) -> Formulation {
    let pairs: Vec<(usize, usize)> = problem.available_pairs().collect();
    trace!(
        "Generated {} assignment variables out of a theoretical maximum of {}.",
        pairs.len(),
        roster.students.len() * roster.shows.len()
    );

    let objective = pairs
        .iter()
        .enumerate()
        .map(|(var, &(student, show))| (var, problem.utility(student, show)))
        .filter(|(_, utility)| *utility != 0.0)
        .collect();

    let by_student = pairs
        .iter()
        .enumerate()
        .map(|(var, &(student, _))| (student, var))
        .into_group_map();
    let by_show = pairs
        .iter()
        .enumerate()
        .map(|(var, &(_, show))| (show, var))
        .into_group_map();
    let ones = |vars: Option<&Vec<usize>>| -> Vec<(usize, f64)> {
        vars.map(|v| v.iter().map(|&var| (var, 1.0)).collect())
            .unwrap_or_default()
    };

    let mut constraints = Vec::new();

    // each student in exactly one show
    for (i, student) in roster.students.iter().enumerate() {
        constraints.push(LinearConstraint::equal(
            format!("one_show[{}]", student.name),
            ones(by_student.get(&i)),
            1.0,
        ));
    }

    for (j, show) in roster.shows.iter().enumerate() {
        let members = by_show.get(&j);

        // headcount
        constraints.push(LinearConstraint::between(
            format!("headcount[{}]", show.name),
            ones(members),
            show.student_min as f64,
            Some(show.student_max as f64),
        ));

        // per-role quota, only for roles the show lists
        for (role, quota) in &show.role_quota {
            let terms: Vec<(usize, f64)> = members
                .map(|vars| {
                    vars.iter()
                        .filter(|&&var| roster.students[pairs[var].0].has_role(role))
                        .map(|&var| (var, 1.0))
                        .collect()
                })
                .unwrap_or_default();
            constraints.push(LinearConstraint::between(
                format!("quota[{}][{}]", show.name, role),
                terms,
                quota.min as f64,
                quota.max.map(f64::from),
            ));
        }
    }

    Formulation {
        program: LinearProgram {
            num_vars: pairs.len(),
            objective,
            constraints,
        },
        pairs,
    }
}

/// Finds the utility-maximising student assignment for a fixed placement.
pub struct AssignmentSolver<'a> {
    backend: &'a dyn SolverBackend,
}

impl<'a> AssignmentSolver<'a> {
    pub fn new(backend: &'a dyn SolverBackend) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn solve(
        &self,
        roster: &Roster,
        placement: &SlotAssignment,
    ) -> Result<Solution, PlacementError> {
        let problem = FixedSlotProblem::build(roster, placement);
        self.solve_problem(roster, placement, &problem)
    }

    pub fn solve_problem(
        &self,
        roster: &Roster,
        placement: &SlotAssignment,
        problem: &FixedSlotProblem,
    ) -> Result<Solution, PlacementError> {
        let formulation = formulate(roster, problem);

        // rows without variables are decided here; a student with no
        // attendable show lands in this case
        if let Some(row) = formulation
            .program
            .constraints
            .iter()
            .find(|c| c.terms.is_empty() && !c.admits_zero())
        {
            debug!("Placement {} is infeasible: {} cannot be met", placement, row.name);
            return Err(PlacementError::Infeasible);
        }

        let lp = match self.backend.solve(&formulation.program)? {
            LpOutcome::Optimal(lp) => lp,
            LpOutcome::Infeasible => {
                debug!("Placement {} is infeasible", placement);
                return Err(PlacementError::Infeasible);
            }
        };

        let mut student_show_assignment = BTreeMap::new();
        let mut total_utility = 0.0;
        for (var, &(student, show)) in formulation.pairs.iter().enumerate() {
            if !lp.values.get(var).copied().unwrap_or(false) {
                continue;
            }
            let student_name = roster.students[student].name.clone();
            let show_name = roster.shows[show].name.clone();
            if let Some(previous) = student_show_assignment.insert(student_name, show_name) {
                return Err(BackendError(format!(
                    "student {} was placed in both {} and {}",
                    roster.students[student].name, previous, roster.shows[show].name
                ))
                .into());
            }
            total_utility += problem.utility(student, show);
        }

        let solution = Solution {
            total_utility,
            student_show_assignment,
            slot_assignment: placement.clone(),
        };

        let violations = solution.verify(roster);
        if !violations.is_empty() {
            for violation in &violations {
                error!("Backend result for placement {} broke {}", placement, violation);
            }
            return Err(BackendError(format!(
                "{} returned an assignment violating {} constraints",
                self.backend.name(),
                violations.len()
            ))
            .into());
        }

        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HighsBackend;
    use crate::data::{RoleQuota, Show, Slot, Student};

    fn single_slot(shows: Vec<Show>, students: Vec<Student>) -> (Roster, SlotAssignment) {
        let students = students
            .into_iter()
            .map(|s| s.available_in(["Day"]))
            .collect();
        let roster = Roster::new(shows, vec![Slot::new("Day", 10)], students);
        let mut placement = SlotAssignment::new();
        for show in &roster.shows {
            placement.assign(show.name.as_str(), "Day");
        }
        (roster, placement)
    }

    #[test]
    fn formulation_omits_unavailable_pairs() {
        let roster = Roster::new(
            vec![Show::new("Led", 0, 4), Show::new("Metal", 1, 5)],
            vec![Slot::new("Mon", 1), Slot::new("Tue", 1)],
            vec![
                Student::new("Jen").prefers("Led", 3.0).available_in(["Mon"]),
                Student::new("Chao").available_in(["Mon", "Tue"]),
            ],
        );
        let mut placement = SlotAssignment::new();
        placement.assign("Led", "Mon");
        placement.assign("Metal", "Tue");

        let f = formulate(&roster, &FixedSlotProblem::build(&roster, &placement));
        assert_eq!(f.pairs, vec![(0, 0), (1, 0), (1, 1)]);
        assert_eq!(f.program.num_vars, 3);
        assert_eq!(f.program.objective, vec![(0, 3.0)]);
        // two students, two headcount rows
        assert_eq!(f.program.constraints.len(), 4);
    }

    #[test]
    fn quota_rows_only_for_listed_roles() {
        let (roster, placement) = single_slot(
            vec![Show::new("Metallica", 0, 5)
                .with_quota("guitar", RoleQuota::new(1, 1))
                .with_quota("drums", RoleQuota::at_least(1))],
            vec![
                Student::new("Jennifer").with_role("drums"),
                Student::new("Chao").with_role("guitar"),
            ],
        );
        let f = formulate(&roster, &FixedSlotProblem::build(&roster, &placement));
        let quota_rows: Vec<_> = f
            .program
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("quota"))
            .collect();
        assert_eq!(quota_rows.len(), 2);
        let drums = quota_rows
            .iter()
            .find(|c| c.name == "quota[Metallica][drums]")
            .unwrap();
        assert_eq!(drums.terms, vec![(0, 1.0)]);
        assert_eq!(drums.upper, None);
    }

    #[test]
    fn assigns_students_to_favourite_shows() {
        let (roster, placement) = single_slot(
            vec![Show::new("Led", 0, 4), Show::new("Metal", 1, 5)],
            vec![
                Student::new("Jen").prefers("Led", 3.0).prefers("Metal", 0.0),
                Student::new("Chao").prefers("Led", 0.0).prefers("Metal", 3.0),
            ],
        );
        let backend = HighsBackend::default();
        let solution = AssignmentSolver::new(&backend)
            .solve(&roster, &placement)
            .unwrap();
        assert_eq!(solution.assigned_show("Jen"), Some("Led"));
        assert_eq!(solution.assigned_show("Chao"), Some("Metal"));
        assert_eq!(solution.total_utility, 6.0);
        assert_eq!(solution.slot_assignment, placement);
    }

    #[test]
    fn honours_role_quotas() {
        let (roster, placement) = single_slot(
            vec![
                Show::new("Metallica", 0, 5)
                    .with_quota("guitar", RoleQuota::new(1, 1))
                    .with_quota("drums", RoleQuota::new(1, 1)),
                Show::new("LadyGaga", 0, 5).with_quota("vocals", RoleQuota::new(1, 1)),
            ],
            vec![
                Student::new("Ramona").with_role("vocals").prefers("LadyGaga", 10.0),
                Student::new("Jennifer").with_role("drums"),
                Student::new("Chao").with_role("guitar"),
            ],
        );
        let backend = HighsBackend::default();
        let solution = AssignmentSolver::new(&backend)
            .solve(&roster, &placement)
            .unwrap();
        assert_eq!(solution.assigned_show("Ramona"), Some("LadyGaga"));
        assert_eq!(solution.assigned_show("Jennifer"), Some("Metallica"));
        assert_eq!(solution.assigned_show("Chao"), Some("Metallica"));
        assert_eq!(solution.total_utility, 10.0);
    }

    #[test]
    fn unmet_minimum_is_infeasible() {
        let (roster, placement) = single_slot(
            vec![Show::new("Duet", 2, 2)],
            vec![Student::new("Solo").prefers("Duet", 1.0)],
        );
        let backend = HighsBackend::default();
        let result = AssignmentSolver::new(&backend).solve(&roster, &placement);
        assert_eq!(result, Err(PlacementError::Infeasible));
    }

    #[test]
    fn student_without_options_is_infeasible() {
        let roster = Roster::new(
            vec![Show::new("Led", 0, 4)],
            vec![Slot::new("Mon", 1), Slot::new("Tue", 1)],
            vec![Student::new("Jen").available_in(["Tue"])],
        );
        let mut placement = SlotAssignment::new();
        placement.assign("Led", "Mon");

        let backend = HighsBackend::default();
        let result = AssignmentSolver::new(&backend).solve(&roster, &placement);
        assert_eq!(result, Err(PlacementError::Infeasible));
    }

    #[test]
    fn backend_failure_is_reported_distinctly() {
        struct Broken;
        impl SolverBackend for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn solve(&self, _: &LinearProgram) -> Result<LpOutcome, BackendError> {
                Err(BackendError("crashed".to_string()))
            }
        }

        let (roster, placement) =
            single_slot(vec![Show::new("Led", 0, 4)], vec![Student::new("Jen")]);
        let result = AssignmentSolver::new(&Broken).solve(&roster, &placement);
        assert_eq!(
            result,
            Err(PlacementError::Backend(BackendError("crashed".to_string())))
        );
    }

    #[test]
    fn rejects_backend_results_that_break_constraints() {
        struct Everything;
        impl SolverBackend for Everything {
            fn name(&self) -> &str {
                "everything"
            }
            fn solve(&self, program: &LinearProgram) -> Result<LpOutcome, BackendError> {
                let values = vec![true; program.num_vars];
                let objective = program.objective_value(&values);
                Ok(LpOutcome::Optimal(crate::backend::LpSolution { values, objective }))
            }
        }

        let (roster, placement) = single_slot(
            vec![Show::new("Led", 0, 4), Show::new("Metal", 0, 4)],
            vec![Student::new("Jen")],
        );
        let result = AssignmentSolver::new(&Everything).solve(&roster, &placement);
        assert!(matches!(result, Err(PlacementError::Backend(_))));
    }
}
