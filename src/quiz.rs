//! Quiz records, answer matching and the single-question session.
use crate::error::{QuizError, Result};
use crate::store::QuizStore;
use serde::Deserialize;
use tracing::debug;

/// One question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizRecord {
    pub question: String,
    pub answer: String,
}

impl QuizRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Text used when asking this record.
    pub fn prompt(&self) -> String {
        format!("{}? ", self.question)
    }
}

/// Result of evaluating one answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// How a presenter should highlight a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Success,
    Failure,
    Highlight,
}

/// Source of answer lines. Each call blocks until a line is available.
pub trait Prompter {
    /// Returns `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Option<String>;

    /// Like `ask`, but the user starts from `current`; an empty line keeps it.
    fn ask_prefilled(&mut self, prompt: &str, current: &str) -> Option<String> {
        let line = self.ask(prompt)?;
        if line.trim().is_empty() {
            Some(current.to_string())
        } else {
            Some(line)
        }
    }
}

/// Output sink. Never influences control flow.
pub trait Presenter {
    fn show(&mut self, text: &str);
    fn show_emphasized(&mut self, text: &str, emphasis: Emphasis);
    fn show_error(&mut self, text: &str);
}

/// Compares a free-text answer with the stored one, ignoring case and
/// surrounding whitespace.
pub fn matches(input: &str, stored: &str) -> bool {
    input.to_lowercase().trim() == stored.to_lowercase().trim()
}

pub fn evaluate(input: &str, record: &QuizRecord) -> Outcome {
    if matches(input, &record.answer) {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    }
}

/// Turns the raw command parameter into a store index.
pub fn parse_index(param: Option<&str>) -> Result<usize> {
    let raw = param.ok_or(QuizError::MissingParameter)?;
    raw.trim()
        .parse::<usize>()
        .map_err(|_| QuizError::InvalidIndex(raw.to_string()))
}

/// Asks the record at `param` once and reports whether the answer matched.
///
/// The parameter is checked before the store is touched. Exactly one answer
/// is accepted; the store is never written.
pub fn run_test<S, T>(store: &S, param: Option<&str>, term: &mut T) -> Result<Outcome>
where
    S: QuizStore + ?Sized,
    T: Prompter + Presenter + ?Sized,
{
    let index = parse_index(param)?;
    let record = store.get(index)?;

    let answer = term
        .ask(&record.prompt())
        .ok_or(QuizError::InputClosed)?;
    let outcome = evaluate(&answer, &record);
    debug!(index, ?outcome, "test answered");

    term.show("Your answer is:");
    match outcome {
        Outcome::Correct => term.show_emphasized("Correct", Emphasis::Success),
        Outcome::Incorrect => term.show_emphasized("Incorrect", Emphasis::Failure),
    }
    Ok(outcome)
}
