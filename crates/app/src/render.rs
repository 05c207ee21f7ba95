//! Terminal output for quizzes, attempts and history.

use serde_json::json;
use services::AttemptListItem;
use sphere_core::model::{Quiz, QuizResult};
use sphere_core::{QuestionStatus, QuizSession, ReviewEntry};

use crate::OutputFormat;

/// `m:ss`, minutes unpadded.
pub fn format_time(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One marker per question: `.` open, `+` answered, `?` flagged. The current
/// question is bracketed.
pub fn progress_strip(session: &QuizSession) -> String {
    let total = session.sampled_questions().len();
    (0..total)
        .map(|index| {
            let marker = match session.question_status(index) {
                Some(QuestionStatus::Flagged) => '?',
                Some(QuestionStatus::Answered) => '+',
                _ => '.',
            };
            if index == session.current_index() {
                format!("[{marker}]")
            } else {
                format!(" {marker} ")
            }
        })
        .collect()
}

pub fn print_question(session: &QuizSession) {
    let index = session.current_index();
    let total = session.sampled_questions().len();
    let question = session.current_question();
    let selected = session.answers()[index].as_deref();

    println!();
    println!(
        "{}   time left {}",
        progress_strip(session),
        format_time(session.remaining_secs())
    );
    println!("Question {} of {total}: {}", index + 1, question.text());
    for (i, option) in question.options().iter().enumerate() {
        let mark = if selected == Some(option.as_str()) { '>' } else { ' ' };
        println!(" {mark} {}. {option}", i + 1);
    }
    if session.flagged().contains(&index) {
        println!("   (flagged for review)");
    }
}

pub fn print_help() {
    println!("Commands:");
    println!("  <n>     answer with option n");
    println!("  n       next question");
    println!("  p       previous question");
    println!("  g <n>   go to question n");
    println!("  f       flag or unflag this question");
    println!("  r       jump to the first flagged question");
    println!("  s       submit now");
    println!("  q       quit without saving");
}

pub fn print_result(result: &QuizResult, review: &[ReviewEntry<'_>]) {
    println!();
    println!(
        "Score {}/{} ({}%), {}",
        result.correct_count,
        result.total_questions,
        result.percentage(),
        if result.passed { "passed" } else { "failed" }
    );
    println!("Time taken {}", format_time(result.elapsed_secs));
    println!();
    for entry in review {
        let verdict = if entry.correct { "correct" } else { "wrong" };
        println!("{}. {} [{verdict}]", entry.index + 1, entry.question.text());
        println!(
            "   your answer: {}",
            entry.selected.unwrap_or("(no answer)")
        );
        if !entry.correct {
            println!("   right answer: {}", entry.question.correct_option());
        }
    }
}

pub fn print_quiz_list(quizzes: &[Quiz], format: OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => {
            let items: Vec<_> = quizzes
                .iter()
                .map(|quiz| {
                    json!({
                        "id": quiz.id(),
                        "title": quiz.title(),
                        "description": quiz.description(),
                        "questions": quiz.question_count(),
                        "created_at": quiz.created_at(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Plain => {
            if quizzes.is_empty() {
                println!("No quizzes yet.");
            }
            for quiz in quizzes {
                println!(
                    "{:>4}  {}  ({} questions)",
                    quiz.id(),
                    quiz.title(),
                    quiz.question_count()
                );
            }
        }
    }
    Ok(())
}

pub fn print_history(
    quiz: &Quiz,
    recent: &[AttemptListItem],
    best: Option<&AttemptListItem>,
    format: OutputFormat,
) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => {
            let doc = json!({
                "quiz_id": quiz.id(),
                "title": quiz.title(),
                "best": best,
                "recent": recent,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Plain => {
            println!("{}", quiz.title());
            if recent.is_empty() {
                println!("No attempts yet.");
                return Ok(());
            }
            for item in recent {
                println!("  {}", attempt_line(item));
            }
            if let Some(best) = best {
                println!("Best: {}", attempt_line(best));
            }
        }
    }
    Ok(())
}

fn attempt_line(item: &AttemptListItem) -> String {
    format!(
        "{}  {}/{} ({}%)  {}  {}",
        item.completed_at.format("%Y-%m-%d %H:%M"),
        item.correct,
        item.total,
        item.percentage,
        format_time(item.elapsed_secs),
        if item.passed { "PASS" } else { "FAIL" }
    )
}
