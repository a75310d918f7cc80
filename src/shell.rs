//! Read-eval-print loop: command parsing, dispatch and the stdin/stdout terminal.
use crate::error::{QuizError, Result};
use crate::play::{run_play, PositionSource};
use crate::quiz::{parse_index, run_test, Emphasis, Presenter, Prompter, QuizRecord};
use crate::store::QuizStore;
use dialoguer::console::style;
use dialoguer::Input;
use std::io::{self, IsTerminal, Write};
use tracing::{debug, warn};

pub const PROMPT: &str = "quiz > ";

/// Consecutive failed reads after which input counts as closed.
const MAX_READ_FAILURES: usize = 3;

const HELP: [&str; 11] = [
    "Commands:",
    "  h|help       -> show this help",
    "  list         -> list the existing quizzes",
    "  show <id>    -> show the question and answer of a quiz",
    "  add          -> add a new quiz interactively",
    "  delete <id>  -> delete a quiz",
    "  edit <id>    -> edit a quiz",
    "  test <id>    -> try one quiz",
    "  p|play       -> answer every quiz in random order",
    "  credits      -> credits",
    "  q|quit|exit  -> exit",
];

enum Flow {
    Continue,
    Quit,
}

/// Runs commands until `quit` or end of input.
///
/// A failing command is reported and the prompt comes back; only closed
/// input ends the loop.
pub fn run<S, T, R>(store: &mut S, term: &mut T, positions: &mut R)
where
    S: QuizStore + ?Sized,
    T: Prompter + Presenter + ?Sized,
    R: PositionSource + ?Sized,
{
    while let Some(line) = term.ask(PROMPT) {
        match dispatch(&line, store, term, positions) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => return,
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, command = line.trim(), "command failed");
                term.show_error(&e.to_string());
            }
            Err(e) => {
                term.show_error(&e.to_string());
                break;
            }
        }
    }
    term.show("Goodbye!");
}

fn dispatch<S, T, R>(line: &str, store: &mut S, term: &mut T, positions: &mut R) -> Result<Flow>
where
    S: QuizStore + ?Sized,
    T: Prompter + Presenter + ?Sized,
    R: PositionSource + ?Sized,
{
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Flow::Continue);
    };
    let param = words.next();

    match command.to_lowercase().as_str() {
        "h" | "help" => {
            for line in HELP {
                term.show(line);
            }
        }
        "list" => {
            for (index, record) in store.list()? {
                term.show(&format!("  [{index}]: {}", record.question));
            }
        }
        "show" => {
            let index = parse_index(param)?;
            let record = store.get(index)?;
            term.show(&format!("[{index}]: {} => {}", record.question, record.answer));
        }
        "add" => add(store, term)?,
        "delete" => {
            let index = parse_index(param)?;
            let record = store.delete(index)?;
            term.show(&format!("Deleted [{index}]: {}", record.question));
        }
        "edit" => edit(store, param, term)?,
        "test" => {
            run_test(&*store, param, term)?;
        }
        "p" | "play" => {
            run_play(&*store, term, positions)?;
        }
        "credits" => {
            term.show(&format!(
                "{} {} by:",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ));
            for author in env!("CARGO_PKG_AUTHORS").split(':') {
                term.show_emphasized(author, Emphasis::Success);
            }
        }
        "q" | "quit" | "exit" => {
            term.show("Goodbye!");
            return Ok(Flow::Quit);
        }
        other => return Err(QuizError::UnknownCommand(other.to_string())),
    }
    Ok(Flow::Continue)
}

fn add<S, T>(store: &mut S, term: &mut T) -> Result<()>
where
    S: QuizStore + ?Sized,
    T: Prompter + Presenter + ?Sized,
{
    let question = required(term.ask(" Enter a question: "), "question")?;
    let answer = required(term.ask(" Enter the answer: "), "answer")?;

    let record = QuizRecord::new(question, answer);
    let index = store.add(record.clone())?;
    term.show(&format!(
        "Added [{index}]: {} => {}",
        record.question, record.answer
    ));
    Ok(())
}

fn edit<S, T>(store: &mut S, param: Option<&str>, term: &mut T) -> Result<()>
where
    S: QuizStore + ?Sized,
    T: Prompter + Presenter + ?Sized,
{
    let index = parse_index(param)?;
    let current = store.get(index)?;

    let question = required(
        term.ask_prefilled(" Enter a question: ", &current.question),
        "question",
    )?;
    let answer = required(
        term.ask_prefilled(" Enter the answer: ", &current.answer),
        "answer",
    )?;

    let record = QuizRecord::new(question, answer);
    store.update(index, record.clone())?;
    term.show(&format!(
        "Quiz [{index}] changed to: {} => {}",
        record.question, record.answer
    ));
    Ok(())
}

fn required(line: Option<String>, field: &'static str) -> Result<String> {
    let line = line.ok_or(QuizError::InputClosed)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(QuizError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Terminal over the process's stdin and stdout.
pub struct Terminal {
    stdin: io::Stdin,
    interactive: bool,
}

impl Terminal {
    pub fn stdin() -> Self {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        Self { stdin, interactive }
    }
}

impl Prompter for Terminal {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        let mut failures = 0;
        loop {
            print!("{}", style(prompt).red());
            io::stdout().flush().ok();

            // a failed read still consumes the offending line, so asking again moves on
            let mut line = String::new();
            match self.stdin.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => return Some(line.trim_end_matches(['\r', '\n']).to_string()),
                Err(e) => {
                    warn!(error = %e, "failed to read input");
                    failures += 1;
                    if failures >= MAX_READ_FAILURES {
                        return None;
                    }
                    self.show_error("Error reading input, try again.");
                }
            }
        }
    }

    fn ask_prefilled(&mut self, prompt: &str, current: &str) -> Option<String> {
        if !self.interactive {
            let line = self.ask(prompt)?;
            return Some(if line.trim().is_empty() {
                current.to_string()
            } else {
                line
            });
        }

        match Input::<String>::new()
            .with_prompt(prompt.trim())
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(error = %e, "line editor failed");
                None
            }
        }
    }
}

impl Presenter for Terminal {
    fn show(&mut self, text: &str) {
        println!("{text}");
    }

    fn show_emphasized(&mut self, text: &str, emphasis: Emphasis) {
        let styled = match emphasis {
            Emphasis::Success => style(text).green().bold(),
            Emphasis::Failure => style(text).red().bold(),
            Emphasis::Highlight => style(text).magenta().bold(),
        };
        println!("{styled}");
    }

    fn show_error(&mut self, text: &str) {
        eprintln!(
            "{} {}",
            style("Error:").for_stderr().red().bold(),
            style(text).for_stderr().red()
        );
    }
}
