use course_grader::config::GradingPolicy;
use course_grader::error::GradeError;
use course_grader::output::write_sections;
use course_grader::pipeline::{GradedCourse, grade_course};
use course_grader::scoring::grade::LetterGrade;
use course_grader::scoring::score::StudentScores;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(rel)
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn copy_fixture_data(name: &str) -> PathBuf {
    let dir = temp_dir(name);
    fs::create_dir_all(&dir).unwrap();
    for entry in fs::read_dir(fixture("data")).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, dir.join(path.file_name().unwrap())).unwrap();
    }
    dir
}

fn graded() -> GradedCourse {
    let policy = GradingPolicy::load(&fixture("policy.json")).expect("load policy");
    grade_course(&fixture("data"), &policy).expect("grade course")
}

fn student<'a>(course: &'a GradedCourse, id: &str) -> &'a StudentScores {
    course
        .scores
        .iter()
        .find(|s| s.student == id)
        .unwrap_or_else(|| panic!("no scores for {id}"))
}

#[test]
fn test_full_pipeline() {
    let course = graded();

    let mut ids: Vec<&str> = course.scores.iter().map(|s| s.student.as_str()).collect();
    ids.sort();
    assert_eq!(ids, ["gxl12345", "mxg12345", "nxo12345", "wxb12345"]);
    assert_eq!(course.table.len(), 4);

    let woody = student(&course, "wxb12345");
    assert!((woody.homework_score - 0.8).abs() < 1e-12);
    assert!((woody.quiz_score - 0.9).abs() < 1e-12);
    assert!((woody.final_score - 0.635).abs() < 1e-12);
    assert_eq!(woody.ceiling_score, 64);
    assert_eq!(woody.grade, LetterGrade::D);

    let grant = student(&course, "gxl12345");
    assert!((grant.final_score - 0.825).abs() < 1e-12);
    assert_eq!(grant.ceiling_score, 83);
    assert_eq!(grant.grade, LetterGrade::B);

    let malaika = student(&course, "mxg12345");
    assert_eq!(malaika.ceiling_score, 77);
    assert_eq!(malaika.grade, LetterGrade::C);
}

#[test]
fn test_absent_quiz_data_counts_as_zero() {
    let course = graded();

    // No quiz_2 row for this student.
    let malaika = student(&course, "mxg12345");
    assert!((malaika.total_quizzes - 0.25).abs() < 1e-12);
    assert!((malaika.average_quizzes - 0.5).abs() < 1e-12);
    assert!((malaika.quiz_score - 0.5).abs() < 1e-12);

    // No quiz rows at all.
    let nola = student(&course, "nxo12345");
    assert_eq!(nola.quiz_score, 0.0);
    assert_eq!(nola.ceiling_score, 69);
    assert_eq!(nola.grade, LetterGrade::D);
}

#[test]
fn test_scores_respect_invariants() {
    let course = graded();

    for s in &course.scores {
        assert_eq!(s.ceiling_score, (s.final_score * 100.0).ceil() as i64);
        assert!((0..=100).contains(&s.ceiling_score));
        for (best, a, b) in [
            (s.homework_score, s.total_homework, s.average_homework),
            (s.quiz_score, s.total_quizzes, s.average_quizzes),
        ] {
            assert!(best >= a.min(b).max(0.0));
            assert!(best <= 1.0);
        }
    }

    let mut by_ceiling: Vec<&StudentScores> = course.scores.iter().collect();
    by_ceiling.sort_by_key(|s| s.ceiling_score);
    assert!(by_ceiling.windows(2).all(|w| w[0].grade <= w[1].grade));
}

#[test]
fn test_grade_summary() {
    let course = graded();
    let counts: Vec<(LetterGrade, usize)> =
        course.summary.counts.iter().map(|(g, c)| (*g, *c)).collect();
    assert_eq!(
        counts,
        [
            (LetterGrade::F, 0),
            (LetterGrade::D, 2),
            (LetterGrade::C, 1),
            (LetterGrade::B, 1),
            (LetterGrade::A, 0),
        ]
    );
    assert!((course.summary.mean - 0.727375).abs() < 1e-9);
    assert!((course.summary.std_dev - 0.084138155236888).abs() < 1e-9);
}

#[test]
fn test_section_files_are_sorted_and_reproducible() {
    let out = temp_dir("course_grader_it_sections");
    let policy = GradingPolicy::load(&fixture("policy.json")).unwrap();

    let course = grade_course(&fixture("data"), &policy).unwrap();
    let reports = write_sections(&course.table, &policy, &out).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].path, out.join("section_1_data.csv"));
    assert_eq!(reports[1].path, out.join("section_2_data.csv"));

    let section_1 = fs::read_to_string(&reports[0].path).unwrap();
    let lines: Vec<&str> = section_1.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID,Name,NetID,Email Address,Section,First Name,Last Name,"));
    assert!(lines[0].ends_with(",Quiz 1,Quiz 2,Exam 1 Score,Exam 2 Score,Exam 3 Score,Total Homework,Average Homework,Homework Score,Total Quizzes,Average Quizzes,Quiz Score,Final Score,Ceiling Score,Final Grade"));
    assert!(lines[1].contains("wxb12345"));
    assert!(lines[1].ends_with(",64,D"));
    assert!(lines[2].contains("gxl12345"));

    let section_2 = fs::read_to_string(&reports[1].path).unwrap();
    let ids: Vec<bool> = section_2
        .lines()
        .skip(1)
        .map(|l| l.contains("mxg12345"))
        .collect();
    assert_eq!(ids, [true, false]);

    let rerun = grade_course(&fixture("data"), &policy).unwrap();
    write_sections(&rerun.table, &policy, &out).unwrap();
    assert_eq!(fs::read_to_string(&reports[0].path).unwrap(), section_1);
    assert_eq!(fs::read_to_string(&reports[1].path).unwrap(), section_2);

    fs::remove_dir_all(&out).unwrap();
}

#[test]
fn test_missing_data_directory_fails() {
    let dir = temp_dir("course_grader_it_empty");
    fs::create_dir_all(&dir).unwrap();

    let err = grade_course(&dir, &GradingPolicy::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GradeError>(),
        Some(GradeError::MissingFile { .. })
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unconfigured_quiz_counts_toward_quiz_total() {
    let dir = copy_fixture_data("course_grader_it_quiz_6");
    fs::write(
        dir.join("quiz_6_grades.csv"),
        "Last Name,First Name,Email,Grade\nBarr,Woody,woody.barr@univ.edu,4\n",
    )
    .unwrap();
    let policy = GradingPolicy::load(&fixture("policy.json")).unwrap();

    let course = grade_course(&dir, &policy).unwrap();
    let woody = student(&course, "wxb12345");
    // (7.5 + 28.5 + 4) / (10 + 30)
    assert!((woody.total_quizzes - 1.0).abs() < 1e-12);
    assert!((woody.average_quizzes - 0.85).abs() < 1e-12);
    assert!((woody.quiz_score - 1.0).abs() < 1e-12);
    assert!((woody.final_score - 0.665).abs() < 1e-12);
    assert_eq!(woody.ceiling_score, 67);

    let nola = student(&course, "nxo12345");
    assert_eq!(nola.quiz_score, 0.0);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_data_directory_with_glob_characters() {
    let dir = copy_fixture_data("course_grader_it_[1]");
    let policy = GradingPolicy::load(&fixture("policy.json")).unwrap();

    let course = grade_course(&dir, &policy).unwrap();
    assert!(course.table.column_index("Quiz 2").is_some());
    assert_eq!(course.scores, graded().scores);

    fs::remove_dir_all(&dir).unwrap();
}
