//! Interactive terminal attempt.
//!
//! The countdown, the answer highlight delay and stdin are multiplexed on one
//! task, so the session itself is only ever touched from here.

use std::fmt;

use log::{debug, warn};
use services::{ActiveSession, IntervalTicker, QuizSessionService, TickSource};
use sphere_core::model::QuizId;
use sphere_core::{AdvanceOutcome, AnswerOutcome, QuizSession, SessionStatus};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::render;

type Input = Lines<BufReader<Stdin>>;

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCommand {
    /// Zero-based option index.
    Answer(usize),
    Next,
    Previous,
    /// Zero-based question index.
    Goto(usize),
    Flag,
    ReviewFlagged,
    Submit,
    Quit,
    Help,
    Redraw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    OptionOutOfRange { given: usize, options: usize },
    QuestionOutOfRange { given: usize, questions: usize },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(raw) => write!(f, "unknown command {raw:?} (h for help)"),
            CommandError::OptionOutOfRange { given, options } => {
                write!(f, "option {given} does not exist, pick 1 to {options}")
            }
            CommandError::QuestionOutOfRange { given, questions } => {
                write!(f, "question {given} does not exist, pick 1 to {questions}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Parses a line against the current question's option count and the
/// session's question count. Numbers are one-based on input.
pub fn parse_command(
    input: &str,
    options: usize,
    questions: usize,
) -> Result<PlayCommand, CommandError> {
    let input = input.trim();
    let mut parts = input.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(PlayCommand::Redraw);
    };
    let unknown = || CommandError::Unknown(input.to_string());

    let command = match head {
        "n" => PlayCommand::Next,
        "p" => PlayCommand::Previous,
        "f" => PlayCommand::Flag,
        "r" => PlayCommand::ReviewFlagged,
        "s" => PlayCommand::Submit,
        "q" => PlayCommand::Quit,
        "h" | "?" => PlayCommand::Help,
        "g" => {
            let given: usize = parts
                .next()
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(unknown)?;
            if given == 0 || given > questions {
                return Err(CommandError::QuestionOutOfRange { given, questions });
            }
            PlayCommand::Goto(given - 1)
        }
        raw => {
            let given: usize = raw.parse().map_err(|_| unknown())?;
            if given == 0 || given > options {
                return Err(CommandError::OptionOutOfRange { given, options });
            }
            PlayCommand::Answer(given - 1)
        }
    };

    if parts.next().is_some() {
        return Err(unknown());
    }
    Ok(command)
}

enum AttemptEnd {
    Finished,
    Quit,
}

/// Plays attempts on `quiz_id` until the player leaves.
///
/// Pending attempt writes are awaited before returning so they are not cut
/// off when the runtime shuts down.
pub async fn run(
    sessions: &QuizSessionService,
    quiz_id: QuizId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut active = sessions.start_session(quiz_id).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut reports: Vec<JoinHandle<_>> = Vec::new();

    println!("{}", active.session().quiz().title());
    render::print_help();

    loop {
        match play_attempt(&mut active, &mut input).await? {
            AttemptEnd::Quit => {
                println!("Left without saving.");
                break;
            }
            AttemptEnd::Finished => {
                let finished = sessions.finish_session(&mut active)?;
                render::print_result(&finished.result, &active.session().review());
                reports.extend(finished.report);

                if !ask_retry(&mut input).await? {
                    break;
                }
                if let Err(err) = sessions.restart_session(&mut active).await {
                    println!("Cannot start another attempt: {err}");
                    break;
                }
            }
        }
    }

    for report in reports {
        if let Ok(None) | Err(_) = report.await {
            warn!("an attempt on quiz {quiz_id} could not be saved");
        }
    }
    Ok(())
}

async fn ask_retry(input: &mut Input) -> std::io::Result<bool> {
    println!();
    println!("Try again with new questions? [y/N]");
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn play_attempt(
    active: &mut ActiveSession,
    input: &mut Input,
) -> std::io::Result<AttemptEnd> {
    let reveal_delay = active.session().settings().reveal_delay();
    let mut ticker = IntervalTicker::new();
    let mut reveal_until: Option<Instant> = None;

    render::print_question(active.session());

    loop {
        if active.session().is_finished() {
            return Ok(AttemptEnd::Finished);
        }

        let reveal_deadline = reveal_until.unwrap_or_else(Instant::now);
        tokio::select! {
            () = ticker.next_tick() => {
                if active.session_mut().tick() == SessionStatus::Finished {
                    println!();
                    println!("Time is up!");
                } else {
                    announce_time(active.session().remaining_secs());
                }
            }
            () = sleep_until(reveal_deadline), if reveal_until.is_some() => {
                reveal_until = None;
                advance(active.session_mut());
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed, leaving attempt");
                    return Ok(AttemptEnd::Quit);
                };
                let session = active.session();
                let parsed = parse_command(
                    &line,
                    session.current_question().options().len(),
                    session.sampled_questions().len(),
                );
                match parsed {
                    Ok(PlayCommand::Quit) => return Ok(AttemptEnd::Quit),
                    Ok(_) if reveal_until.is_some() => {
                        debug!("input {line:?} ignored while showing the answer");
                    }
                    Ok(command) => {
                        if apply(active.session_mut(), command) {
                            reveal_until = Some(Instant::now() + reveal_delay);
                        }
                    }
                    Err(err) => {
                        debug!("ignored input {line:?}: {err}");
                        println!("{err}");
                    }
                }
            }
        }
    }
}

fn announce_time(remaining: u32) {
    if matches!(remaining, 60 | 30 | 10) {
        println!("{} left", render::format_time(remaining));
    }
}

/// Applies a command. Returns `true` when an answer was recorded and the
/// highlight delay should start.
fn apply(session: &mut QuizSession, command: PlayCommand) -> bool {
    match command {
        PlayCommand::Answer(option) => {
            let Some(choice) = session.current_question().options().get(option).cloned() else {
                return false;
            };
            match session.answer(&choice) {
                AnswerOutcome::Recorded { correct: true } => {
                    println!("Correct!");
                    return true;
                }
                AnswerOutcome::Recorded { correct: false } => {
                    println!(
                        "Wrong, the answer is {}",
                        session.current_question().correct_option()
                    );
                    return true;
                }
                AnswerOutcome::Ignored => println!("Already answered."),
            }
        }
        PlayCommand::Next => advance(session),
        PlayCommand::Previous => {
            session.previous();
            render::print_question(session);
        }
        PlayCommand::Goto(index) => {
            session.jump_to(index);
            render::print_question(session);
        }
        PlayCommand::Flag => {
            let index = session.current_index();
            match session.toggle_flag(index) {
                Some(true) => println!("Flagged question {}.", index + 1),
                Some(false) => println!("Unflagged question {}.", index + 1),
                None => {}
            }
        }
        PlayCommand::ReviewFlagged => match session.jump_to_first_flagged() {
            Some(_) => render::print_question(session),
            None => println!("Nothing is flagged."),
        },
        PlayCommand::Submit => {
            session.finish();
        }
        PlayCommand::Help => render::print_help(),
        PlayCommand::Redraw => render::print_question(session),
        PlayCommand::Quit => {}
    }
    false
}

fn advance(session: &mut QuizSession) {
    match session.advance() {
        AdvanceOutcome::Moved { .. } => render::print_question(session),
        AdvanceOutcome::ReviewPending { flagged } => {
            let list: Vec<String> = flagged.iter().map(|i| (i + 1).to_string()).collect();
            println!(
                "Still flagged: {}. Use r to review them or s to submit.",
                list.join(", ")
            );
        }
        AdvanceOutcome::Finished => {}
    }
}
