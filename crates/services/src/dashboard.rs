use std::sync::Arc;

use chrono::NaiveDate;

use nexus_core::agenda::{AgendaEntry, AgendaFilter, entries_for_date};
use nexus_core::model::{LevelProgress, Material, ProfileId, StudyEvent};
use nexus_core::stats::DashboardStats;
use storage::repository::{ProfileRepository, QuizRepository, StorageError};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub level: LevelProgress,
    pub points: u64,
}

/// Read-only views over quizzes and the learner profile.
///
/// Materials and study events are passed in by the caller; they are not
/// stored by this workspace.
pub struct DashboardService {
    profile_id: ProfileId,
    quizzes: Arc<dyn QuizRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        profile_id: ProfileId,
        quizzes: Arc<dyn QuizRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            profile_id,
            quizzes,
            profiles,
        }
    }

    /// Headline statistics and level for `today`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile is missing, or other
    /// storage errors if reads fail.
    pub async fn overview(
        &self,
        today: NaiveDate,
        materials: &[Material],
    ) -> Result<DashboardOverview, StorageError> {
        let quizzes = self.quizzes.all_quizzes().await?;
        let profile = self
            .profiles
            .get_profile(self.profile_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(DashboardOverview {
            stats: DashboardStats::compute(&quizzes, materials, today),
            level: profile.level(),
            points: profile.points(),
        })
    }

    /// Calendar entries for `date`.
    ///
    /// # Errors
    ///
    /// Returns storage errors if quizzes cannot be read.
    pub async fn agenda(
        &self,
        date: NaiveDate,
        materials: &[Material],
        events: &[StudyEvent],
        filter: AgendaFilter,
    ) -> Result<Vec<AgendaEntry>, StorageError> {
        let quizzes = self.quizzes.all_quizzes().await?;
        Ok(entries_for_date(date, &quizzes, materials, events, filter))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use nexus_core::agenda::AgendaSource;
    use nexus_core::model::{
        Answer, CourseId, EventId, MaterialId, MaterialKind, Profile, ProgressPatch, Quiz, QuizId,
        QuizQuestion,
    };
    use nexus_core::stats::PerformanceGrade;
    use nexus_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    use super::*;

    fn quiz(id: u64, deadline: NaiveDate) -> Quiz {
        let question = QuizQuestion::new(
            "Q",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            "",
            None,
        )
        .unwrap();
        Quiz::new(
            QuizId::new(id),
            format!("Quiz {id}"),
            None,
            vec![question.clone(), question],
            deadline,
            fixed_now(),
        )
        .unwrap()
    }

    async fn setup() -> (DashboardService, InMemoryRepository, NaiveDate) {
        let repo = InMemoryRepository::new();
        let today = fixed_now().date_naive();
        repo.upsert_profile(&Profile::new(ProfileId::new(1), "Student").unwrap())
            .await
            .unwrap();
        repo.insert_quiz(&quiz(1, today)).await.unwrap();
        repo.insert_quiz(&quiz(2, today + Duration::days(7))).await.unwrap();
        repo.insert_quiz(&quiz(3, today)).await.unwrap();
        repo.apply_progress(
            QuizId::new(3),
            &ProgressPatch::completed(50.0, vec![Answer::Selected(0), Answer::Selected(1)]),
        )
        .await
        .unwrap();
        repo.add_points(ProfileId::new(1), 625).await.unwrap();

        let service = DashboardService::new(
            ProfileId::new(1),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (service, repo, today)
    }

    #[tokio::test]
    async fn overview_combines_quizzes_and_profile() {
        let (service, _repo, today) = setup().await;
        let overview = service.overview(today, &[]).await.unwrap();

        assert_eq!(overview.stats.pending_quizzes, 2);
        assert_eq!(overview.stats.completed_quizzes, 1);
        assert!((overview.stats.average_score - 50.0).abs() < f64::EPSILON);
        assert_eq!(overview.stats.grade, PerformanceGrade::D);
        assert_eq!(overview.points, 625);
        assert_eq!(overview.level.level, 2);
        assert!((overview.level.percent_to_next - 25.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn agenda_lists_pending_deadlines_then_events() {
        let (service, _repo, today) = setup().await;
        let reminder = Material {
            id: MaterialId::new(1),
            course_id: CourseId::new(1),
            title: "Renal dosing notes".into(),
            kind: MaterialKind::Note,
            bookmarked: true,
            reminder_at: today.and_hms_opt(9, 0, 0),
        };
        let event = StudyEvent {
            id: EventId::new(1),
            title: "Group revision".into(),
            date: today,
            time: None,
            description: None,
        };

        let entries = service
            .agenda(today, &[reminder], &[event], AgendaFilter::default())
            .await
            .unwrap();
        let sources: Vec<_> = entries.iter().map(|e| e.source).collect();
        assert_eq!(
            sources,
            vec![
                AgendaSource::QuizDeadline(QuizId::new(1)),
                AgendaSource::MaterialReminder(MaterialId::new(1)),
                AgendaSource::StudyEvent(EventId::new(1)),
            ]
        );
    }

    #[tokio::test]
    async fn overview_and_agenda_cover_every_quiz() {
        let repo = InMemoryRepository::new();
        let today = fixed_now().date_naive();
        repo.upsert_profile(&Profile::new(ProfileId::new(1), "Student").unwrap())
            .await
            .unwrap();
        for id in 1..=600 {
            repo.insert_quiz(&quiz(id, today)).await.unwrap();
        }
        let service =
            DashboardService::new(ProfileId::new(1), Arc::new(repo.clone()), Arc::new(repo));

        let overview = service.overview(today, &[]).await.unwrap();
        assert_eq!(overview.stats.pending_quizzes, 600);
        assert_eq!(overview.stats.due_today, 600);

        let entries = service
            .agenda(today, &[], &[], AgendaFilter::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 600);
    }

    #[tokio::test]
    async fn overview_breaks_scores_down_by_course() {
        let repo = InMemoryRepository::new();
        let today = fixed_now().date_naive();
        repo.upsert_profile(&Profile::new(ProfileId::new(1), "Student").unwrap())
            .await
            .unwrap();
        let question = QuizQuestion::new(
            "Q",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            "",
            None,
        )
        .unwrap();
        let quiz = Quiz::new(
            QuizId::new(1),
            "Pharmacology 1",
            Some(CourseId::new(7)),
            vec![question],
            today,
            fixed_now(),
        )
        .unwrap();
        repo.insert_quiz(&quiz).await.unwrap();
        repo.apply_progress(
            QuizId::new(1),
            &ProgressPatch::completed(75.0, vec![Answer::Selected(0)]),
        )
        .await
        .unwrap();

        let service =
            DashboardService::new(ProfileId::new(1), Arc::new(repo.clone()), Arc::new(repo));
        let overview = service.overview(today, &[]).await.unwrap();
        assert_eq!(overview.stats.courses.len(), 1);
        assert_eq!(overview.stats.courses[0].course_id, CourseId::new(7));
        assert_eq!(overview.stats.courses[0].grade, PerformanceGrade::B);
        assert!((overview.stats.gpa() - 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn overview_requires_profile() {
        let repo = InMemoryRepository::new();
        let service =
            DashboardService::new(ProfileId::new(4), Arc::new(repo.clone()), Arc::new(repo));
        assert!(matches!(
            service.overview(fixed_now().date_naive(), &[]).await,
            Err(StorageError::NotFound)
        ));
    }
}
