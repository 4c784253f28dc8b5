use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::model::{CourseId, Material, Quiz};

/// Score percentage that maps to one GPA point.
pub const PERCENT_PER_GPA_POINT: f64 = 25.0;

/// Letter grade for an average quiz score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformanceGrade {
    APlus,
    A,
    B,
    C,
    D,
}

impl PerformanceGrade {
    #[must_use]
    pub fn from_average(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::APlus,
            s if s >= 80.0 => Self::A,
            s if s >= 70.0 => Self::B,
            s if s >= 60.0 => Self::C,
            _ => Self::D,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Average and grade of one course's completed quizzes.
///
/// A course with no completed quiz averages 0 and grades `D`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseBreakdown {
    pub course_id: CourseId,
    pub average: f64,
    pub grade: PerformanceGrade,
}

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub pending_quizzes: usize,
    pub completed_quizzes: usize,
    pub average_score: f64,
    pub grade: PerformanceGrade,
    pub bookmarked_materials: usize,
    pub due_today: usize,
    /// One entry per course that has quizzes, ordered by course id.
    pub courses: Vec<CourseBreakdown>,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(quizzes: &[Quiz], materials: &[Material], today: NaiveDate) -> Self {
        let completed: Vec<f64> = quizzes
            .iter()
            .filter(|q| q.is_completed())
            .map(|q| q.score().unwrap_or(0.0))
            .collect();
        let average_score = mean(&completed);

        let mut by_course: BTreeMap<CourseId, Vec<f64>> = BTreeMap::new();
        for quiz in quizzes {
            let Some(course_id) = quiz.course_id() else {
                continue;
            };
            let scores = by_course.entry(course_id).or_default();
            if quiz.is_completed() {
                scores.push(quiz.score().unwrap_or(0.0));
            }
        }
        let courses = by_course
            .into_iter()
            .map(|(course_id, scores)| {
                let average = mean(&scores);
                CourseBreakdown {
                    course_id,
                    average,
                    grade: PerformanceGrade::from_average(average),
                }
            })
            .collect();

        Self {
            pending_quizzes: quizzes.len() - completed.len(),
            completed_quizzes: completed.len(),
            average_score,
            grade: PerformanceGrade::from_average(average_score),
            bookmarked_materials: materials.iter().filter(|m| m.bookmarked).count(),
            due_today: quizzes.iter().filter(|q| q.is_due_on(today)).count(),
            courses,
        }
    }

    /// Cumulative GPA on a 4.00 scale (`average_score / 25`).
    #[must_use]
    pub fn gpa(&self) -> f64 {
        self.average_score / PERCENT_PER_GPA_POINT
    }
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = scores.len() as f64;
    scores.iter().sum::<f64>() / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, PersistedProgress, QuizId, QuizQuestion};
    use crate::time::fixed_now;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, d).unwrap()
    }

    fn quiz(id: u64, deadline: NaiveDate, score: Option<f64>) -> Quiz {
        quiz_in(id, None, deadline, score)
    }

    fn quiz_in(
        id: u64,
        course_id: Option<CourseId>,
        deadline: NaiveDate,
        score: Option<f64>,
    ) -> Quiz {
        let q = QuizQuestion::new(
            "Q",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            "",
            None,
        )
        .unwrap();
        let progress = PersistedProgress {
            completed: score.is_some(),
            score,
            user_answers: Some(vec![Answer::Selected(0)]),
            current_index: Some(0),
        };
        Quiz::from_persisted(
            QuizId::new(id),
            "T",
            course_id,
            vec![q],
            deadline,
            fixed_now(),
            progress,
        )
        .unwrap()
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(PerformanceGrade::from_average(95.0), PerformanceGrade::APlus);
        assert_eq!(PerformanceGrade::from_average(90.0), PerformanceGrade::APlus);
        assert_eq!(PerformanceGrade::from_average(89.9), PerformanceGrade::A);
        assert_eq!(PerformanceGrade::from_average(70.0), PerformanceGrade::B);
        assert_eq!(PerformanceGrade::from_average(60.0), PerformanceGrade::C);
        assert_eq!(PerformanceGrade::from_average(0.0).to_string(), "D");
    }

    #[test]
    fn no_completed_quizzes_averages_zero() {
        let stats = DashboardStats::compute(&[quiz(1, day(20), None)], &[], day(20));
        assert_eq!(stats.pending_quizzes, 1);
        assert_eq!(stats.completed_quizzes, 0);
        assert!(stats.average_score.abs() < f64::EPSILON);
        assert_eq!(stats.grade, PerformanceGrade::D);
        assert_eq!(stats.due_today, 1);
    }

    #[test]
    fn averages_completed_scores_only() {
        let quizzes = [
            quiz(1, day(20), Some(100.0)),
            quiz(2, day(20), Some(70.0)),
            quiz(3, day(21), None),
        ];
        let stats = DashboardStats::compute(&quizzes, &[], day(20));
        assert_eq!(stats.completed_quizzes, 2);
        assert!((stats.average_score - 85.0).abs() < f64::EPSILON);
        assert_eq!(stats.grade, PerformanceGrade::A);
        assert_eq!(stats.due_today, 0);
    }

    #[test]
    fn gpa_is_average_over_twenty_five() {
        let quizzes = [quiz(1, day(20), Some(90.0)), quiz(2, day(20), Some(80.0))];
        let stats = DashboardStats::compute(&quizzes, &[], day(20));
        assert!((stats.gpa() - 3.4).abs() < 1e-9);

        let empty = DashboardStats::compute(&[], &[], day(20));
        assert!(empty.gpa().abs() < f64::EPSILON);
    }

    #[test]
    fn courses_are_graded_on_their_completed_quizzes() {
        let pharmacology = Some(CourseId::new(2));
        let chemistry = Some(CourseId::new(1));
        let quizzes = [
            quiz_in(1, pharmacology, day(20), Some(100.0)),
            quiz_in(2, pharmacology, day(20), Some(80.0)),
            quiz_in(3, pharmacology, day(21), None),
            quiz_in(4, chemistry, day(21), None),
            quiz(5, day(21), Some(10.0)),
        ];
        let stats = DashboardStats::compute(&quizzes, &[], day(20));

        assert_eq!(
            stats.courses,
            vec![
                CourseBreakdown {
                    course_id: CourseId::new(1),
                    average: 0.0,
                    grade: PerformanceGrade::D,
                },
                CourseBreakdown {
                    course_id: CourseId::new(2),
                    average: 90.0,
                    grade: PerformanceGrade::APlus,
                },
            ]
        );
    }
}
