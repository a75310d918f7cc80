//! Full-quiz session: every record asked once, in random order, until the
//! first wrong answer.
//!
//! The state machine (`PlayState`/`Round`) is synchronous and does no I/O;
//! `run_play` is the adapter that feeds it answers from a `Prompter`.
use crate::error::{QuizError, Result};
use crate::quiz::{evaluate, Emphasis, Outcome, Presenter, Prompter, QuizRecord};
use crate::store::QuizStore;
use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::{debug, info};

/// Picks the position of the next question within the working set.
pub trait PositionSource {
    /// Returns a position in `[0, len)`; `len` is never zero.
    /// Values outside the range are wrapped by the engine.
    fn draw(&mut self, len: usize) -> usize;
}

/// Uniform draws from any `rand` generator.
pub struct RngPositions<R> {
    rng: R,
}

impl<R: Rng> RngPositions<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngPositions<ThreadRng> {
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> PositionSource for RngPositions<R> {
    fn draw(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// How a play session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// Every record was answered correctly.
    Won,
    /// An answer was wrong.
    Lost,
    /// There was nothing to ask.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaySummary {
    pub ending: Ending,
    pub score: usize,
    /// Questions presented, including the one answered wrongly.
    pub asked: usize,
    /// Records in the snapshot taken at start.
    pub total: usize,
}

/// A question is outstanding.
#[derive(Debug, Clone)]
pub struct Round {
    /// Records not yet answered correctly, tagged with their index at start.
    remaining: Vec<(usize, QuizRecord)>,
    drawn: usize,
    score: usize,
    asked: usize,
    total: usize,
}

#[derive(Debug, Clone)]
pub enum PlayState {
    AwaitAnswer(Round),
    Finished(PlaySummary),
}

impl PlayState {
    /// Builds the first state from a snapshot of the store.
    pub fn start<P: PositionSource + ?Sized>(
        snapshot: Vec<(usize, QuizRecord)>,
        positions: &mut P,
    ) -> Self {
        let total = snapshot.len();
        Self::advance(snapshot, 0, 0, total, positions)
    }

    fn advance<P: PositionSource + ?Sized>(
        remaining: Vec<(usize, QuizRecord)>,
        score: usize,
        asked: usize,
        total: usize,
        positions: &mut P,
    ) -> Self {
        if remaining.is_empty() {
            let ending = if total == 0 { Ending::Empty } else { Ending::Won };
            return PlayState::Finished(PlaySummary {
                ending,
                score,
                asked,
                total,
            });
        }

        let drawn = positions.draw(remaining.len()) % remaining.len();
        PlayState::AwaitAnswer(Round {
            remaining,
            drawn,
            score,
            asked: asked + 1,
            total,
        })
    }

    pub fn score(&self) -> usize {
        match self {
            PlayState::AwaitAnswer(round) => round.score,
            PlayState::Finished(summary) => summary.score,
        }
    }
}

impl Round {
    /// The outstanding record and its index at session start.
    pub fn current(&self) -> (usize, &QuizRecord) {
        let (index, record) = &self.remaining[self.drawn];
        (*index, record)
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Evaluates one answer and moves to the next state.
    ///
    /// A correct answer removes the drawn position from the working set; a
    /// wrong one ends the session.
    pub fn answer<P: PositionSource + ?Sized>(
        self,
        input: &str,
        positions: &mut P,
    ) -> (Outcome, PlayState) {
        let Round {
            mut remaining,
            drawn,
            score,
            asked,
            total,
        } = self;

        let outcome = evaluate(input, &remaining[drawn].1);
        let next = match outcome {
            Outcome::Correct => {
                remaining.remove(drawn);
                PlayState::advance(remaining, score + 1, asked, total, positions)
            }
            Outcome::Incorrect => PlayState::Finished(PlaySummary {
                ending: Ending::Lost,
                score,
                asked,
                total,
            }),
        };
        (outcome, next)
    }
}

/// Runs a whole play session against the current contents of `store`.
///
/// The store is read once, at start, and never written.
pub fn run_play<S, T, R>(store: &S, term: &mut T, positions: &mut R) -> Result<PlaySummary>
where
    S: QuizStore + ?Sized,
    T: Prompter + Presenter + ?Sized,
    R: PositionSource + ?Sized,
{
    let snapshot = store.list()?;
    info!(total = snapshot.len(), "play started");

    let mut state = PlayState::start(snapshot, positions);
    loop {
        let round = match state {
            PlayState::Finished(summary) => {
                report(term, &summary);
                info!(ending = ?summary.ending, score = summary.score, "play finished");
                return Ok(summary);
            }
            PlayState::AwaitAnswer(round) => round,
        };

        let (index, record) = round.current();
        debug!(index, remaining = round.remaining(), "asking");
        let answer = term.ask(&record.prompt()).ok_or(QuizError::InputClosed)?;

        let (outcome, next) = round.answer(&answer, positions);
        match outcome {
            Outcome::Correct => term.show(&format!("CORRECT - {} right so far.", next.score())),
            Outcome::Incorrect => term.show("INCORRECT."),
        }
        state = next;
    }
}

fn report<T: Presenter + ?Sized>(term: &mut T, summary: &PlaySummary) {
    match summary.ending {
        Ending::Won => term.show("Nothing left to solve."),
        Ending::Empty => term.show("There are no quizzes to play."),
        Ending::Lost => {}
    }
    term.show(&format!(
        "Questions asked: {} of {}.",
        summary.asked, summary.total
    ));
    term.show("End of quiz. Score:");
    term.show_emphasized(&summary.score.to_string(), Emphasis::Highlight);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::fakes::ScriptedTerminal;
    use crate::store::SqliteStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, VecDeque};

    /// Draws a fixed sequence of positions.
    struct ScriptedPositions(VecDeque<usize>);

    impl ScriptedPositions {
        fn new(draws: &[usize]) -> Self {
            Self(draws.iter().copied().collect())
        }
    }

    impl PositionSource for ScriptedPositions {
        fn draw(&mut self, _len: usize) -> usize {
            self.0.pop_front().unwrap_or(0)
        }
    }

    /// Always knows the right answer.
    struct Oracle {
        answers: HashMap<String, String>,
        term: ScriptedTerminal,
    }

    impl Oracle {
        fn for_store(store: &SqliteStore) -> Self {
            let answers = store
                .list()
                .unwrap()
                .into_iter()
                .map(|(_, r)| (r.prompt(), r.answer.to_uppercase()))
                .collect();
            Self {
                answers,
                term: ScriptedTerminal::default(),
            }
        }
    }

    impl Prompter for Oracle {
        fn ask(&mut self, prompt: &str) -> Option<String> {
            self.term.prompts.push(prompt.to_string());
            self.answers.get(prompt).cloned()
        }
    }

    impl Presenter for Oracle {
        fn show(&mut self, text: &str) {
            self.term.show(text);
        }

        fn show_emphasized(&mut self, text: &str, emphasis: Emphasis) {
            self.term.show_emphasized(text, emphasis);
        }

        fn show_error(&mut self, text: &str) {
            self.term.show_error(text);
        }
    }

    fn store_with(pairs: &[(&str, &str)]) -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for (q, a) in pairs {
            store.add(QuizRecord::new(*q, *a)).unwrap();
        }
        store
    }

    fn three() -> SqliteStore {
        store_with(&[("One", "1"), ("Two", "2"), ("Three", "3")])
    }

    #[test]
    fn test_empty_store_asks_nothing() {
        let store = store_with(&[]);
        let mut term = ScriptedTerminal::new(&["anything"]);

        let summary = run_play(&store, &mut term, &mut ScriptedPositions::new(&[])).unwrap();

        assert_eq!(summary.ending, Ending::Empty);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.asked, 0);
        assert!(term.prompts.is_empty());
        assert!(term.printed("There are no quizzes to play."));
        assert!(term.printed("Questions asked: 0 of 0."));
    }

    #[test]
    fn test_first_wrong_answer_ends_session() {
        let store = three();
        let mut term = ScriptedTerminal::new(&["nope", "2", "3"]);

        let summary = run_play(&store, &mut term, &mut ScriptedPositions::new(&[1])).unwrap();

        assert_eq!(summary.ending, Ending::Lost);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.asked, 1);
        assert_eq!(term.prompts, vec!["Two? ".to_string()]);
        assert!(term.printed("INCORRECT."));
        assert!(term.printed("End of quiz. Score:"));
    }

    #[test]
    fn test_all_correct_asks_each_record_once() {
        let store = three();
        let mut oracle = Oracle::for_store(&store);
        let mut positions = RngPositions::new(StdRng::seed_from_u64(7));

        let summary = run_play(&store, &mut oracle, &mut positions).unwrap();

        assert_eq!(summary.ending, Ending::Won);
        assert_eq!(summary.score, 3);
        assert_eq!(summary.asked, 3);
        let mut asked = oracle.term.prompts.clone();
        asked.sort();
        assert_eq!(asked, vec!["One? ", "Three? ", "Two? "]);
        assert!(oracle.term.printed("Nothing left to solve."));
        assert!(oracle.term.printed("CORRECT - 3 right so far."));
    }

    #[test]
    fn test_scripted_draws_control_order() {
        let store = three();
        let mut term = ScriptedTerminal::new(&["3", " 1 ", "2"]);

        // positions are relative to what is left: [One, Two, Three] -> [One, Two] -> [Two]
        let summary =
            run_play(&store, &mut term, &mut ScriptedPositions::new(&[2, 0, 0])).unwrap();

        assert_eq!(term.prompts, vec!["Three? ", "One? ", "Two? "]);
        assert_eq!(summary.score, 3);
        assert_eq!(summary.ending, Ending::Won);
    }

    #[test]
    fn test_wrong_after_some_correct_keeps_score() {
        let store = three();
        let mut term = ScriptedTerminal::new(&["1", "x"]);

        let summary = run_play(&store, &mut term, &mut ScriptedPositions::new(&[0, 0])).unwrap();

        assert_eq!(summary.ending, Ending::Lost);
        assert_eq!(summary.score, 1);
        assert_eq!(summary.asked, 2);
    }

    #[test]
    fn test_no_record_drawn_twice() {
        let records: Vec<(usize, QuizRecord)> = (0..12)
            .map(|i| (i, QuizRecord::new(format!("q{i}"), format!("a{i}"))))
            .collect();

        for seed in 0..20 {
            let mut positions = RngPositions::new(StdRng::seed_from_u64(seed));
            let mut state = PlayState::start(records.clone(), &mut positions);
            let mut seen = Vec::new();
            let mut rounds = 0;

            while let PlayState::AwaitAnswer(round) = state {
                rounds += 1;
                assert!(rounds <= records.len() + 1);
                let (index, record) = round.current();
                seen.push(index);
                let answer = record.answer.clone();
                state = round.answer(&answer, &mut positions).1;
            }

            assert!(matches!(state, PlayState::Finished(_)));
            assert_eq!(state.score(), 12);
            seen.sort_unstable();
            assert_eq!(seen, (0..12).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_duplicate_records_each_asked() {
        let store = store_with(&[("Same", "x"), ("Same", "x")]);
        let mut term = ScriptedTerminal::new(&["x", "x", "x"]);

        let summary = run_play(&store, &mut term, &mut ScriptedPositions::new(&[1, 0])).unwrap();

        assert_eq!(summary.score, 2);
        assert_eq!(term.prompts.len(), 2);
        assert_eq!(summary.ending, Ending::Won);
    }

    #[test]
    fn test_out_of_range_draw_wraps() {
        let records = vec![
            (0, QuizRecord::new("a", "1")),
            (1, QuizRecord::new("b", "2")),
        ];
        let state = PlayState::start(records, &mut ScriptedPositions::new(&[5]));

        match state {
            PlayState::AwaitAnswer(round) => assert_eq!(round.current().0, 1),
            PlayState::Finished(_) => panic!("expected a question"),
        }
    }

    #[test]
    fn test_score_never_exceeds_total() {
        let store = store_with(&[("a", "1"), ("b", "2")]);
        let mut oracle = Oracle::for_store(&store);

        let summary = run_play(&store, &mut oracle, &mut RngPositions::thread()).unwrap();

        assert!(summary.score <= summary.total);
        assert!(summary.score <= summary.asked);
    }

    #[test]
    fn test_input_closed_mid_session() {
        let store = three();
        let mut term = ScriptedTerminal::new(&["1"]);

        let result = run_play(&store, &mut term, &mut ScriptedPositions::new(&[0, 0]));

        assert!(matches!(result, Err(QuizError::InputClosed)));
        assert_eq!(store.count().unwrap(), 3);
    }
}
