use itertools::Itertools;
use show_scheduler::enumerate::enumerate_slot_assignments;
use show_scheduler::solver::AssignmentSolver;
use show_scheduler::{
    GlobalOptimizer, HighsBackend, PlacementError, RoleQuota, Roster, ScheduleError, Show, Slot,
    Solution, Student,
};
use std::collections::BTreeMap;

fn everywhere(student: Student, slots: &[Slot]) -> Student {
    student.available_in(slots.iter().map(|s| s.name.clone()))
}

fn assert_invariants(roster: &Roster, solution: &Solution) {
    let violations = solution.verify(roster);
    assert!(violations.is_empty(), "{:?}", violations);
    assert_eq!(solution.student_show_assignment.len(), roster.students.len());
}

/// Best utility over every placement and every student->show map.
fn brute_force_best(roster: &Roster) -> Option<f64> {
    let mut best: Option<f64> = None;
    for placement in enumerate_slot_assignments(&roster.slots, &roster.shows) {
        let choices = std::iter::repeat_n(0..roster.shows.len(), roster.students.len())
            .multi_cartesian_product();
        for choice in choices {
            let student_show_assignment: BTreeMap<String, String> = roster
                .students
                .iter()
                .zip(&choice)
                .map(|(student, &show)| (student.name.clone(), roster.shows[show].name.clone()))
                .collect();
            let total_utility = roster
                .students
                .iter()
                .zip(&choice)
                .map(|(student, &show)| student.utility(&roster.shows[show].name))
                .sum();
            let candidate = Solution {
                total_utility,
                student_show_assignment,
                slot_assignment: placement.clone(),
            };
            if candidate.verify(roster).is_empty() {
                best = Some(best.map_or(total_utility, |b: f64| b.max(total_utility)));
            }
        }
    }
    best
}

#[test]
fn students_get_their_favourite_show() {
    let slots = vec![Slot::new("Day", 2)];
    let roster = Roster::new(
        vec![Show::new("Led", 0, 4), Show::new("Metal", 1, 5)],
        slots.clone(),
        vec![
            everywhere(Student::new("Jen").prefers("Led", 3.0).prefers("Metal", 0.0), &slots),
            everywhere(Student::new("Chao").prefers("Led", 0.0).prefers("Metal", 3.0), &slots),
        ],
    );
    let backend = HighsBackend::default();
    let result = GlobalOptimizer::new(&backend).optimize(&roster).unwrap();

    assert_eq!(result.solution.assigned_show("Jen"), Some("Led"));
    assert_eq!(result.solution.assigned_show("Chao"), Some("Metal"));
    assert_eq!(result.solution.total_utility, 6.0);
    assert_invariants(&roster, &result.solution);
}

#[test]
fn single_capacity_slots_enumerate_in_input_order() {
    let slots = vec![Slot::new("Mon", 1), Slot::new("Wed", 1)];
    let shows = vec![Show::new("Led", 0, 1), Show::new("Metal", 0, 1)];
    let placements: Vec<_> = enumerate_slot_assignments(&slots, &shows).collect();

    assert_eq!(placements.len(), 2);
    assert_eq!(placements[0].show_slot("Led"), Some("Mon"));
    assert_eq!(placements[0].show_slot("Metal"), Some("Wed"));
}

#[test]
fn three_shows_in_two_roomy_slots() {
    let slots = vec![Slot::new("Mon", 3), Slot::new("Tue", 3)];
    let shows = vec![
        Show::new("Led", 0, 1),
        Show::new("Metal", 0, 1),
        Show::new("GNR", 0, 1),
    ];
    assert_eq!(enumerate_slot_assignments(&slots, &shows).count(), 8);
}

#[test]
fn role_quotas_decide_the_assignment() {
    let slots = vec![Slot::new("Mon", 1), Slot::new("Tue", 1)];
    let roster = Roster::new(
        vec![
            Show::new("Metallica", 0, 5)
                .with_quota("guitar", RoleQuota::new(1, 1))
                .with_quota("drums", RoleQuota::new(1, 1)),
            Show::new("LadyGaga", 0, 5).with_quota("vocals", RoleQuota::new(1, 1)),
        ],
        slots.clone(),
        vec![
            everywhere(
                Student::new("Ramona")
                    .with_role("vocals")
                    .prefers("Metallica", 0.0)
                    .prefers("LadyGaga", 10.0),
                &slots,
            ),
            everywhere(Student::new("Jennifer").with_role("drums"), &slots),
            everywhere(Student::new("Chao").with_role("guitar"), &slots),
        ],
    );
    let backend = HighsBackend::default();
    let result = GlobalOptimizer::new(&backend).optimize(&roster).unwrap();

    assert_eq!(result.solution.assigned_show("Ramona"), Some("LadyGaga"));
    assert_eq!(result.solution.assigned_show("Jennifer"), Some("Metallica"));
    assert_eq!(result.solution.assigned_show("Chao"), Some("Metallica"));
    assert_invariants(&roster, &result.solution);
}

#[test]
fn unmet_minimum_makes_the_run_infeasible() {
    let slots = vec![Slot::new("Day", 1)];
    let roster = Roster::new(
        vec![Show::new("Duet", 2, 3)],
        slots.clone(),
        vec![everywhere(Student::new("Solo").prefers("Duet", 1.0), &slots)],
    );
    let backend = HighsBackend::default();

    let placement = enumerate_slot_assignments(&roster.slots, &roster.shows)
        .next()
        .unwrap();
    assert_eq!(
        AssignmentSolver::new(&backend).solve(&roster, &placement),
        Err(PlacementError::Infeasible)
    );

    let err = GlobalOptimizer::new(&backend).optimize(&roster).unwrap_err();
    assert!(matches!(err, ScheduleError::GlobalInfeasible { placements: 1, .. }));
}

#[test]
fn inverted_bounds_are_rejected_before_search() {
    let roster = Roster::new(
        vec![Show::new("Led", 5, 2)],
        vec![Slot::new("Day", 1)],
        vec![Student::new("Jen").available_in(["Day"])],
    );
    let backend = HighsBackend::default();
    let err = GlobalOptimizer::new(&backend).optimize(&roster).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidConfiguration(_)));
}

#[test]
fn matches_brute_force_optimum() {
    let slots = vec![Slot::new("Tue", 1), Slot::new("Thu", 2)];
    let roster = Roster::new(
        vec![
            Show::new("Grunge", 1, 2).with_quota("drums", RoleQuota::new(1, 1)),
            Show::new("Floyd", 1, 3).with_quota("guitar", RoleQuota::at_least(1)),
            Show::new("Maiden", 0, 2),
        ],
        slots.clone(),
        vec![
            Student::new("Ramona")
                .with_role("vocals")
                .prefers("Grunge", 2.0)
                .prefers("Floyd", 4.0)
                .available_in(["Thu"]),
            Student::new("Jennifer")
                .with_role("drums")
                .prefers("Grunge", 5.0)
                .prefers("Maiden", 1.0)
                .available_in(["Tue", "Thu"]),
            Student::new("Chao")
                .with_role("guitar")
                .prefers("Floyd", 1.5)
                .prefers("Maiden", 3.0)
                .available_in(["Tue"]),
            Student::new("Alex")
                .with_role("guitar")
                .with_role("drums")
                .prefers("Maiden", 2.5)
                .prefers("Grunge", 0.5)
                .available_in(["Tue", "Thu"]),
        ],
    );
    let backend = HighsBackend::default();
    let result = GlobalOptimizer::new(&backend).optimize(&roster).unwrap();
    let expected = brute_force_best(&roster).unwrap();

    assert!(
        (result.solution.total_utility - expected).abs() < 1e-9,
        "optimizer found {}, brute force {}",
        result.solution.total_utility,
        expected
    );
    assert_invariants(&roster, &result.solution);
}

#[test]
fn parallel_workers_agree_with_sequential_search() {
    let slots = vec![Slot::new("Mon", 2), Slot::new("Tue", 1), Slot::new("Wed", 1)];
    let roster = Roster::new(
        vec![
            Show::new("Led", 1, 2),
            Show::new("Metal", 1, 2),
            Show::new("Floyd", 0, 2),
        ],
        slots.clone(),
        vec![
            Student::new("A").prefers("Led", 1.0).available_in(["Mon"]),
            Student::new("B").prefers("Metal", 2.0).available_in(["Tue", "Wed"]),
            Student::new("C").prefers("Floyd", 3.0).available_in(["Wed"]),
            everywhere(Student::new("D").prefers("Led", 1.0), &slots),
        ],
    );
    let backend = HighsBackend::default();
    let sequential = GlobalOptimizer::new(&backend).optimize(&roster).unwrap();
    let parallel = GlobalOptimizer::new(&backend)
        .with_workers(4)
        .optimize(&roster)
        .unwrap();

    assert_eq!(sequential.solution.total_utility, parallel.solution.total_utility);
    assert_eq!(
        sequential.solution.slot_assignment,
        parallel.solution.slot_assignment
    );
    assert_eq!(sequential.report.placements, parallel.report.placements);
    assert_invariants(&roster, &parallel.solution);
}
