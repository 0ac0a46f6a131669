use chrono::Weekday;
use proptest::prelude::*;
use schedule_assistant::combination::combinations;
use schedule_assistant::filter::by_min_start;
use schedule_assistant::{
    Catalog, CombinationError, Course, Schedule, SearchOptions, Section, SectionId, Session,
    combination_count, combinations_after_filter, enumerate_combinations, possible_schedules,
    possible_schedules_with, search_schedules, sessions_for_section,
};
use std::time::Duration;

fn s(label: &str, day: Weekday, start: u8, duration: u8) -> Session {
    Session::new(label, day, start, duration, "Prof")
}

fn add_course(catalog: &mut Catalog, code: &str, sections: Vec<(&str, Vec<Session>)>) {
    let mut course = Course::new(code, format!("Course {code}"));
    for (id, sessions) in sections {
        course.insert_section(Section::new(id, 30, 5, sessions));
    }
    catalog.insert_course(course);
}

fn picks(schedule: &Schedule) -> Vec<String> {
    schedule
        .sections()
        .iter()
        .map(|s| format!("{}{}", s.course_code, s.section_id))
        .collect()
}

fn combo_picks(combo: &schedule_assistant::Combination) -> Vec<String> {
    combo
        .iter()
        .map(|choice| format!("{}{}", choice.course_code, choice.section_id))
        .collect()
}

#[test]
fn sections_of_one_course_may_overlap_each_other_but_not_other_courses() {
    let mut catalog = Catalog::new();
    add_course(
        &mut catalog,
        "A",
        vec![
            ("1", vec![s("a1", Weekday::Mon, 8, 2)]),
            ("2", vec![s("a2", Weekday::Mon, 9, 2)]),
        ],
    );
    add_course(&mut catalog, "B", vec![("1", vec![s("b1", Weekday::Tue, 8, 1)])]);

    let schedules = possible_schedules(&catalog, &["A", "B"]).unwrap();
    assert_eq!(schedules.len(), 2);
    assert_eq!(picks(&schedules[0]), vec!["A1", "B1"]);
    assert_eq!(picks(&schedules[1]), vec!["A2", "B1"]);
}

#[test]
fn overlapping_single_sections_yield_no_schedule() {
    let mut catalog = Catalog::new();
    add_course(&mut catalog, "A", vec![("1", vec![s("a1", Weekday::Mon, 8, 2)])]);
    add_course(&mut catalog, "C", vec![("1", vec![s("c1", Weekday::Mon, 9, 1)])]);

    let schedules = possible_schedules(&catalog, &["A", "C"]).unwrap();
    assert!(schedules.is_empty());
}

#[test]
fn combinations_follow_course_then_section_order() {
    let mut catalog = Catalog::new();
    add_course(
        &mut catalog,
        "X",
        vec![
            ("10", vec![s("x10", Weekday::Mon, 8, 1)]),
            ("2", vec![s("x2", Weekday::Mon, 9, 1)]),
        ],
    );
    add_course(
        &mut catalog,
        "Y",
        vec![
            ("1", vec![s("y1", Weekday::Tue, 8, 1)]),
            ("2", vec![s("y2", Weekday::Tue, 9, 1)]),
            ("3", vec![s("y3", Weekday::Tue, 10, 1)]),
        ],
    );

    assert_eq!(combination_count(&catalog, &["X", "Y"]).unwrap(), 6);
    let combos = enumerate_combinations(&catalog, &["X", "Y"]).unwrap();
    let order: Vec<Vec<String>> = combos.iter().map(combo_picks).collect();
    // Numeric section ids sort numerically: 2 before 10.
    assert_eq!(
        order,
        vec![
            vec!["X2", "Y1"],
            vec!["X2", "Y2"],
            vec!["X2", "Y3"],
            vec!["X10", "Y1"],
            vec!["X10", "Y2"],
            vec!["X10", "Y3"],
        ]
    );

    let reversed = enumerate_combinations(&catalog, &["Y", "X"]).unwrap();
    assert_eq!(combo_picks(&reversed[1]), vec!["Y1", "X10"]);
}

#[test]
fn sessions_for_section_carries_course_and_section_fields() {
    let mut catalog = Catalog::new();
    add_course(
        &mut catalog,
        "A",
        vec![(
            "1",
            vec![s("lab", Weekday::Thu, 14, 2), s("lec", Weekday::Mon, 8, 2)],
        )],
    );

    let sessions = sessions_for_section(&catalog, "A", &SectionId::new("1")).unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session.label, "lec");
    assert_eq!(sessions[1].session.label, "lab");
    for item in &sessions {
        assert_eq!(item.course_code, "A");
        assert_eq!(item.course_name, "Course A");
        assert_eq!(item.section_id.as_str(), "1");
        assert_eq!(item.capacity, 30);
        assert_eq!(item.enrolled, 5);
    }

    assert_eq!(
        sessions_for_section(&catalog, "A", &SectionId::new("9")),
        Err(CombinationError::UnknownSection {
            course_code: "A".into(),
            section_id: SectionId::new("9"),
        })
    );
}

#[test]
fn unknown_course_is_an_error() {
    let catalog = Catalog::new();
    assert_eq!(
        possible_schedules(&catalog, &["NOPE"]).unwrap_err(),
        CombinationError::UnknownCourse("NOPE".into())
    );
    assert!(combination_count(&catalog, &["NOPE"]).is_err());
}

#[test]
fn no_requested_courses_gives_one_empty_schedule() {
    let catalog = Catalog::new();
    let none: [&str; 0] = [];
    assert_eq!(combination_count(&catalog, &none).unwrap(), 1);
    let schedules = possible_schedules(&catalog, &none).unwrap();
    assert_eq!(schedules.len(), 1);
    assert!(schedules[0].sessions().is_empty());
}

#[test]
fn course_without_sections_gives_no_combination() {
    let mut catalog = Catalog::new();
    add_course(&mut catalog, "A", vec![("1", vec![s("a1", Weekday::Mon, 8, 2)])]);
    catalog.insert_course(Course::new("E", "Empty"));

    assert_eq!(combination_count(&catalog, &["A", "E"]).unwrap(), 0);
    assert_eq!(combinations(&catalog, &["A", "E"]).unwrap().count(), 0);
    assert!(possible_schedules(&catalog, &["A", "E"]).unwrap().is_empty());
}

#[test]
fn sections_without_sessions_stay_in_the_picks() {
    let mut catalog = Catalog::new();
    add_course(&mut catalog, "A", vec![("1", vec![s("a1", Weekday::Mon, 8, 2)])]);
    add_course(&mut catalog, "E", vec![("7", Vec::new())]);

    let schedules = possible_schedules(&catalog, &["A", "E"]).unwrap();
    assert_eq!(schedules.len(), 1);
    assert_eq!(picks(&schedules[0]), vec!["A1", "E7"]);
    assert_eq!(schedules[0].sessions().len(), 1);
}

#[test]
fn course_emptied_by_a_filter_gives_no_schedule() {
    let mut catalog = Catalog::new();
    add_course(&mut catalog, "A", vec![("1", vec![s("a1", Weekday::Mon, 8, 2)])]);
    add_course(&mut catalog, "B", vec![("1", vec![s("b1", Weekday::Tue, 11, 1)])]);
    let filtered = by_min_start(&catalog, 10);
    assert!(filtered.course("A").is_none());

    let combos = combinations_after_filter(&catalog, &filtered, &["A", "B"]).unwrap();
    assert_eq!(combos.total(), 0);
    let schedules = search_schedules(combos, &SearchOptions::default()).unwrap();
    assert!(schedules.is_empty());

    let kept = combinations_after_filter(&catalog, &filtered, &["B"]).unwrap();
    assert_eq!(kept.total(), 1);

    assert_eq!(
        combinations_after_filter(&catalog, &filtered, &["A", "Z"]).unwrap_err(),
        CombinationError::UnknownCourse("Z".into())
    );
}

fn wide_catalog(courses: usize, sections: usize) -> Catalog {
    let mut catalog = Catalog::new();
    for c in 0..courses {
        let mut course = Course::new(format!("C{c}"), format!("Course {c}"));
        for sec in 0..sections {
            let day = [Weekday::Mon, Weekday::Tue, Weekday::Wed][sec % 3];
            let start = 7 + ((c * 2 + sec) % 12) as u8;
            course.insert_section(Section::new(
                (sec + 1).to_string(),
                30,
                0,
                vec![Session::new(format!("c{c}s{sec}"), day, start, 2, "Prof")],
            ));
        }
        catalog.insert_course(course);
    }
    catalog
}

#[test]
fn parallel_search_matches_sequential_order() {
    let catalog = wide_catalog(3, 6);
    let codes = ["C0", "C1", "C2"];
    let sequential = possible_schedules(&catalog, &codes).unwrap();
    assert_eq!(sequential[0].sections().len(), 3);
    let parallel = possible_schedules_with(
        &catalog,
        &codes,
        &SearchOptions {
            parallel: true,
            deadline: None,
        },
    )
    .unwrap();
    assert!(!sequential.is_empty());
    assert_eq!(sequential, parallel);
}

#[test]
fn exhausted_deadline_aborts_the_search() {
    let catalog = wide_catalog(3, 20);
    let codes = ["C0", "C1", "C2"];
    for parallel in [false, true] {
        let result = possible_schedules_with(
            &catalog,
            &codes,
            &SearchOptions {
                parallel,
                deadline: Some(Duration::ZERO),
            },
        );
        assert!(
            matches!(result, Err(CombinationError::DeadlineExceeded { .. })),
            "expected deadline error (parallel={parallel})"
        );
    }
}

#[test]
fn short_deadline_stops_a_huge_parallel_search_early() {
    let catalog = wide_catalog(10, 10);
    let codes: Vec<String> = (0..10).map(|c| format!("C{c}")).collect();
    assert_eq!(combination_count(&catalog, &codes).unwrap(), 10u128.pow(10));

    let result = possible_schedules_with(
        &catalog,
        &codes,
        &SearchOptions {
            parallel: true,
            deadline: Some(Duration::from_millis(1)),
        },
    );
    match result {
        Err(CombinationError::DeadlineExceeded { checked, .. }) => {
            assert!((checked as u128) < 10u128.pow(10));
            assert_eq!(checked % 4096, 0);
        }
        other => panic!("expected deadline error, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn deadline_reports_merged_count_in_both_modes() {
    let catalog = wide_catalog(3, 20);
    let codes = ["C0", "C1", "C2"];
    for parallel in [false, true] {
        let err = possible_schedules_with(
            &catalog,
            &codes,
            &SearchOptions {
                parallel,
                deadline: Some(Duration::ZERO),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            CombinationError::DeadlineExceeded {
                limit: Duration::ZERO,
                checked: 0,
            }
        );
    }
}

#[test]
fn generous_deadline_does_not_change_the_result() {
    let catalog = wide_catalog(2, 5);
    let codes = ["C0", "C1"];
    let plain = possible_schedules(&catalog, &codes).unwrap();
    let bounded = possible_schedules_with(
        &catalog,
        &codes,
        &SearchOptions {
            parallel: false,
            deadline: Some(Duration::from_secs(60)),
        },
    )
    .unwrap();
    assert_eq!(plain, bounded);
}

fn arb_catalog() -> impl Strategy<Value = Catalog> {
    let session = (0u8..3, 7u8..14, 1u8..3).prop_map(|(day, start, duration)| {
        let day = [Weekday::Mon, Weekday::Tue, Weekday::Wed][day as usize];
        Session::new("s", day, start, duration, "Prof")
    });
    let section = prop::collection::vec(session, 1..3);
    let course = prop::collection::vec(section, 0..4);
    prop::collection::vec(course, 1..4).prop_map(|courses| {
        let mut catalog = Catalog::new();
        for (ci, sections) in courses.into_iter().enumerate() {
            let mut course = Course::new(format!("C{ci}"), format!("Course {ci}"));
            for (si, sessions) in sections.into_iter().enumerate() {
                course.insert_section(Section::new((si + 1).to_string(), 30, 0, sessions));
            }
            catalog.insert_course(course);
        }
        catalog
    })
}

proptest! {
    #[test]
    fn enumeration_size_is_the_product_of_section_counts(catalog in arb_catalog()) {
        let codes: Vec<String> = catalog.courses.keys().cloned().collect();
        let expected: usize = catalog.courses.values().map(|c| c.sections.len()).product();
        let combos = enumerate_combinations(&catalog, &codes).unwrap();
        prop_assert_eq!(combos.len(), expected);
        prop_assert_eq!(combination_count(&catalog, &codes).unwrap(), expected as u128);
    }

    #[test]
    fn schedules_are_the_mergeable_combinations_in_order(catalog in arb_catalog()) {
        let codes: Vec<String> = catalog.courses.keys().cloned().collect();
        let expected: Vec<_> = enumerate_combinations(&catalog, &codes)
            .unwrap()
            .iter()
            .filter_map(|combo| Schedule::from_combination(combo).ok())
            .collect();
        let schedules = possible_schedules(&catalog, &codes).unwrap();
        prop_assert_eq!(schedules, expected);
    }
}
