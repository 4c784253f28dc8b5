use std::error::Error;
use std::io::{self, BufRead, Read, Write};

use chrono::NaiveDate;
use nexus_core::agenda::{AgendaFilter, AgendaSource};
use nexus_core::attempt::{Advance, QuizAttempt};
use nexus_core::formatted::{TextBlock, render};
use nexus_core::model::QuizId;
use services::AppServices;

const LIST_LIMIT: u32 = 50;
const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

//
// ─── RENDER ────────────────────────────────────────────────────────────────────
//

pub fn render_file(path: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let text = if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };

    let blocks = render(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }
    for block in &blocks {
        println!("{}", terminal_line(block));
    }
    Ok(())
}

fn terminal_line(block: &TextBlock) -> String {
    match block {
        TextBlock::Heading { text } => format!("== {text} =="),
        TextBlock::ListItem { .. } => format!("  • {}", block.plain_text()),
        TextBlock::Paragraph { .. } => block.plain_text(),
        TextBlock::Blank => String::new(),
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

pub async fn list_quizzes(app: &AppServices) -> Result<(), Box<dyn Error>> {
    let quizzes = app.storage().quizzes.list_quizzes(LIST_LIMIT).await?;
    if quizzes.is_empty() {
        println!("No quizzes yet. Run `cargo run -p storage --bin seed` to add samples.");
        return Ok(());
    }
    for quiz in &quizzes {
        let status = match quiz.score() {
            Some(score) if quiz.is_completed() => format!("completed {score:.0}%"),
            _ => format!(
                "question {}/{}, due {}",
                quiz.current_index() + 1,
                quiz.question_count(),
                quiz.deadline()
            ),
        };
        println!("[{}] {} ({status})", quiz.id(), quiz.title());
    }
    Ok(())
}

enum Input {
    Select(usize),
    Next,
    Quit,
    Invalid,
}

fn parse_input(raw: &str, options: usize) -> Input {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "n" | "next" => return Input::Next,
        "q" | "quit" => return Input::Quit,
        _ => {}
    }
    let index = match raw.chars().next() {
        Some(c) if raw.len() == 1 && c.is_ascii_alphabetic() => {
            OPTION_LABELS
                .iter()
                .position(|label| label.eq_ignore_ascii_case(&c))
        }
        _ => raw.parse::<usize>().ok().and_then(|n| n.checked_sub(1)),
    };
    match index {
        Some(i) if i < options => Input::Select(i),
        _ => Input::Invalid,
    }
}

fn print_question(attempt: &QuizAttempt) {
    let index = attempt.current_index();
    let quiz = attempt.quiz();
    let question = &quiz.questions()[index];
    let selected = attempt.answers()[index].selected();

    println!();
    println!("{} | question {} of {}", quiz.title(), index + 1, quiz.question_count());
    println!("{}", question.question());
    for (i, option) in question.options().iter().enumerate() {
        println!("{}", option_line(i, option, selected == Some(i)));
    }
}

// Question text is shown as stored; only study material goes through the renderer.
fn option_line(index: usize, option: &str, selected: bool) -> String {
    let marker = if selected { '*' } else { ' ' };
    format!(" {marker} {}) {option}", OPTION_LABELS[index])
}

fn print_review(attempt: &QuizAttempt) {
    let Some(review) = attempt.review() else {
        return;
    };
    if let Some(score) = attempt.quiz().score() {
        println!("Score: {score:.0}%");
    }
    for (i, (item, question)) in review.iter().zip(attempt.quiz().questions()).enumerate() {
        let verdict = if item.is_correct { "correct" } else { "incorrect" };
        let picked = item
            .selected
            .selected()
            .map_or('-', |choice| OPTION_LABELS[choice]);
        println!(
            "{}. {verdict}: picked {picked}, answer {}",
            i + 1,
            OPTION_LABELS[item.correct_answer]
        );
        if !question.explanation().is_empty() {
            println!("   {}", question.explanation());
        }
    }
}

pub async fn take_quiz(app: &AppServices, id: QuizId) -> Result<(), Box<dyn Error>> {
    let attempts = app.quiz_attempts();
    let mut attempt = attempts.open(id).await?;
    if attempt.is_completed() {
        print_review(&attempt);
        return Ok(());
    }

    println!("Pick an option (A-D or 1-4), `n` for next, `q` to leave.");
    let stdin = io::stdin();
    loop {
        print_question(&attempt);
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let current = attempt.current_index();
        let options = attempt.quiz().questions()[current].options().len();
        match parse_input(&line, options) {
            Input::Select(option) => {
                let step = attempts.select_answer(&mut attempt, current, option).await?;
                if !step.persisted {
                    println!("(answer kept locally; saving failed)");
                }
            }
            Input::Next => {
                let outcome = attempts.advance(&mut attempt).await?;
                if !outcome.persisted {
                    println!("(progress kept locally; saving failed)");
                }
                match outcome.advance {
                    Advance::Refused => println!("Select an answer first."),
                    Advance::Moved { .. } => {}
                    Advance::Completed { reward, .. } => {
                        println!();
                        print_review(&attempt);
                        if reward.amount > 0 {
                            println!("+{} points ({})", reward.amount, reward.reason);
                        }
                        return Ok(());
                    }
                }
            }
            Input::Quit => break,
            Input::Invalid => println!("Unrecognised input."),
        }
    }

    let quiz = attempts.suspend(attempt);
    println!(
        "Left at question {} of {}. Run `quiz {}` to resume.",
        quiz.current_index() + 1,
        quiz.question_count(),
        quiz.id()
    );
    Ok(())
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

pub async fn dashboard(app: &AppServices, date: NaiveDate) -> Result<(), Box<dyn Error>> {
    let dashboard = app.dashboard();
    let overview = dashboard.overview(date, &[]).await?;
    let stats = &overview.stats;

    println!("Profile {}", app.profile_id());
    println!(
        "  Level {} ({} points, {:.0}% to next)",
        overview.level.level, overview.points, overview.level.percent_to_next
    );
    println!(
        "  Quizzes: {} pending, {} completed",
        stats.pending_quizzes, stats.completed_quizzes
    );
    println!(
        "  Average score: {:.1}% (grade {}, GPA {:.2} / 4.00)",
        stats.average_score,
        stats.grade,
        stats.gpa()
    );
    for course in &stats.courses {
        println!(
            "    course {}: {:.1}% (grade {})",
            course.course_id, course.average, course.grade
        );
    }

    let entries = dashboard
        .agenda(date, &[], &[], AgendaFilter::default())
        .await?;
    println!();
    println!("Agenda for {date}:");
    if entries.is_empty() {
        println!("  nothing scheduled");
    }
    for entry in entries {
        let kind = match entry.source {
            AgendaSource::QuizDeadline(_) => "deadline",
            AgendaSource::MaterialReminder(_) => "reminder",
            AgendaSource::StudyEvent(_) => "event",
        };
        match entry.time {
            Some(time) => println!("  {time} [{kind}] {}", entry.title),
            None => println!("  [{kind}] {}", entry.title),
        }
    }
    Ok(())
}
