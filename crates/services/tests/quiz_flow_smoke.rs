use chrono::NaiveDate;
use nexus_core::attempt::Advance;
use nexus_core::model::{ProfileId, Quiz, QuizId, QuizQuestion};
use nexus_core::time::fixed_now;
use services::{AppConfig, AppServices, WritePolicy};

fn pharmacology_quiz() -> Quiz {
    let questions = [0_usize, 1, 2, 3]
        .into_iter()
        .map(|correct| {
            QuizQuestion::new(
                format!("Question with answer {correct}"),
                vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct,
                "",
                None,
            )
            .unwrap()
        })
        .collect();
    Quiz::new(
        QuizId::new(1),
        "Professional Evaluation: Pharmacology",
        None,
        questions,
        NaiveDate::from_ymd_opt(2023, 11, 21).unwrap(),
        fixed_now(),
    )
    .unwrap()
}

fn config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        profile_id: ProfileId::new(1),
        write_policy: WritePolicy::Confirmed,
    }
}

async fn complete_with_half_marks(app: &AppServices) {
    app.storage().quizzes.insert_quiz(&pharmacology_quiz()).await.unwrap();

    let attempts = app.quiz_attempts();
    let mut attempt = attempts.open(QuizId::new(1)).await.unwrap();
    for (i, pick) in [0, 0, 2, 0].into_iter().enumerate() {
        attempts.select_answer(&mut attempt, i, pick).await.unwrap();
        let outcome = attempts.advance(&mut attempt).await.unwrap();
        if i == 3 {
            assert!(matches!(outcome.advance, Advance::Completed { .. }));
        }
    }
}

#[tokio::test]
async fn in_memory_flow_completes_and_rewards() {
    let app = AppServices::in_memory(&config("sqlite::memory:")).await.unwrap();
    complete_with_half_marks(&app).await;

    let overview = app
        .dashboard()
        .overview(fixed_now().date_naive(), &[])
        .await
        .unwrap();
    assert_eq!(overview.stats.completed_quizzes, 1);
    assert_eq!(overview.points, 125);
    assert_eq!(overview.level.level, 1);
}

#[tokio::test]
async fn sqlite_flow_survives_reopen() {
    let url = "sqlite:file:memdb_services_flow?mode=memory&cache=shared";
    let app = AppServices::new_sqlite(&config(url)).await.unwrap();
    complete_with_half_marks(&app).await;

    let reopened = AppServices::new_sqlite(&config(url)).await.unwrap();
    let attempt = reopened.quiz_attempts().open(QuizId::new(1)).await.unwrap();
    assert!(attempt.is_completed());
    assert_eq!(attempt.quiz().score(), Some(50.0));

    let review = attempt.review().unwrap();
    assert_eq!(review.iter().filter(|r| r.is_correct).count(), 2);

    let level = reopened.rewards().level().await.unwrap();
    assert_eq!(level.points_into_level, 125);
}
