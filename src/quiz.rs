use crate::chooser::{Question, QuestionChooser};
use crate::error::Result;
use crate::filter::IntervalFilter;
use crate::interval::Interval;
use crate::phrase::Phrase;
use crate::player::Player;
use crate::score::ScoreKeeper;
use itertools::Itertools;
use rand::Rng;
use std::collections::BTreeSet;

/// Which answer buttons are still live for the interval being asked about.
/// A wrong guess stays disabled until the next reset.
#[derive(Clone, Debug)]
pub struct IntervalChoices {
  enabled: IntervalFilter,
  wrong: BTreeSet<Interval>,
}

impl IntervalChoices {
  pub fn new() -> Self {
    Self {
      enabled: IntervalFilter::empty(),
      wrong: BTreeSet::new(),
    }
  }
  pub fn reset(&mut self, choices: IntervalFilter) {
    self.enabled = choices;
    self.wrong.clear();
  }
  pub fn remove_choice(&mut self, answer: Interval) {
    self.wrong.insert(answer);
  }
  pub fn allows(&self, candidate: Interval) -> bool {
    self.enabled.allows(candidate) && !self.wrong.contains(&candidate)
  }
}

impl Default for IntervalChoices {
  fn default() -> Self {
    Self::new()
  }
}

struct Attempt {
  question: Question,
  position: usize,
  // First guess for each interval reached so far.
  answers: Vec<Interval>,
}

enum Outcome {
  Wrong,
  Next,
  Complete,
}

/// Runs the quiz: asks a question, gates answers one interval at a time,
/// scores the phrase once every interval is named, then asks the next.
pub struct Quizzer<R, P> {
  chooser: QuestionChooser<R>,
  scores: ScoreKeeper,
  player: P,
  choices: IntervalChoices,
  current: Option<Attempt>,
  listeners: Vec<Box<dyn FnMut()>>,
}

impl<R: Rng, P: Player> Quizzer<R, P> {
  pub fn new(chooser: QuestionChooser<R>, scores: ScoreKeeper, player: P) -> Self {
    Self {
      chooser,
      scores,
      player,
      choices: IntervalChoices::new(),
      current: None,
      listeners: Vec::new(),
    }
  }

  /// Called after every answer; re-read the accessors from there.
  pub fn on_answer_chosen<F: FnMut() + 'static>(&mut self, listener: F) {
    self.listeners.push(Box::new(listener));
  }

  /// Starts the next question, abandoning any question in progress. If no
  /// question can be made, nothing changes.
  pub fn start_question(&mut self) -> Result<()> {
    let question = self.chooser.choose_question(&self.scores)?;
    self.choices.reset(question.choices().clone());
    self.current = Some(Attempt {
      question,
      position: 0,
      answers: Vec::new(),
    });
    self.replay()
  }

  /// Plays the current question again from the top.
  pub fn replay(&mut self) -> Result<()> {
    match &self.current {
      Some(attempt) => self
        .player
        .play(attempt.question.phrase(), attempt.question.start_note()),
      None => Ok(()),
    }
  }

  /// Tries `candidate` (an ascending interval) as the answer for the current
  /// interval. Finishing the phrase records it even if the next question
  /// can't be made; the error is returned and no question is in progress.
  pub fn check_answer(&mut self, candidate: Interval) -> Result<()> {
    assert!(candidate.is_ascending(), "got non-ascending interval");
    let attempt = self.current.as_mut().expect("no question in progress");
    if attempt.answers.len() <= attempt.position {
      attempt.answers.push(candidate);
    }
    let outcome = if !attempt.question.is_correct(candidate, attempt.position) {
      Outcome::Wrong
    } else {
      attempt.position += 1;
      if attempt.position >= attempt.question.answer_count() {
        Outcome::Complete
      } else {
        Outcome::Next
      }
    };

    let result = match outcome {
      Outcome::Wrong => {
        self.choices.remove_choice(candidate);
        self.replay()
      }
      Outcome::Next => {
        let choices = attempt.question.choices().clone();
        self.choices.reset(choices);
        self.play_remaining()
      }
      Outcome::Complete => {
        if let Some(done) = self.current.take() {
          self.scores.add_result(&done.question, &done.answers);
        }
        self.start_question()
      }
    };
    for listener in &mut self.listeners {
      listener();
    }
    result
  }

  fn play_remaining(&mut self) -> Result<()> {
    match &self.current {
      Some(attempt) => {
        let start = attempt.question.notes()[attempt.position];
        let rest = attempt.question.phrase().suffix(attempt.position);
        self.player.play(&rest, start)
      }
      None => Ok(()),
    }
  }

  /// Plays a phrase from the score page, from a note it was asked at.
  pub fn play_scored(&mut self, phrase: &Phrase) -> Result<()> {
    let start = self.scores.replay_note(phrase);
    self.player.play(phrase, start)
  }

  pub fn shutdown(&mut self) {
    self.player.shutdown();
  }

  pub fn is_started(&self) -> bool {
    self.current.is_some()
  }
  pub fn question(&self) -> Option<&Question> {
    self.current.as_ref().map(|attempt| &attempt.question)
  }
  /// Index of the interval being asked about.
  pub fn position(&self) -> usize {
    self.current.as_ref().map_or(0, |attempt| attempt.position)
  }
  pub fn allows(&self, candidate: Interval) -> bool {
    self.choices.allows(candidate)
  }
  pub fn choices(&self) -> &IntervalChoices {
    &self.choices
  }

  pub fn question_text(&self) -> String {
    let first = self.position() + 1;
    format!(
      "What's the difference in pitch between notes {} and {}?",
      first,
      first + 1
    )
  }
  /// Names of the intervals answered so far in this question.
  pub fn phrase_so_far(&self) -> String {
    match &self.current {
      Some(attempt) => attempt.question.phrase().intervals()[..attempt.position]
        .iter()
        .map(|interval| interval.name())
        .join(", "),
      None => String::new(),
    }
  }
  pub fn score_summary(&self) -> String {
    self.scores.summary()
  }

  pub fn scores(&self) -> &ScoreKeeper {
    &self.scores
  }
  pub fn scores_mut(&mut self) -> &mut ScoreKeeper {
    &mut self.scores
  }
  pub fn chooser(&self) -> &QuestionChooser<R> {
    &self.chooser
  }
  /// Settings changes apply from the next question on.
  pub fn chooser_mut(&mut self) -> &mut QuestionChooser<R> {
    &mut self.chooser
  }
}

#[cfg(test)]
mod test_support {
  use crate::error::{Result, Unavailable};
  use crate::note::Note;
  use crate::phrase::Phrase;
  use crate::player::Player;
  use std::cell::RefCell;
  use std::rc::Rc;

  pub type Played = Rc<RefCell<Vec<(Phrase, Note)>>>;

  #[derive(Default)]
  pub struct RecordingPlayer {
    pub played: Played,
    pub broken: bool,
  }

  impl Player for RecordingPlayer {
    fn play(&mut self, phrase: &Phrase, start: Note) -> Result<()> {
      if self.broken {
        return Err(Unavailable::Playback("broken".to_string()));
      }
      self.played.borrow_mut().push((phrase.clone(), start));
      Ok(())
    }
    fn shutdown(&mut self) {}
  }
}

#[cfg(test)]
use self::test_support::{Played, RecordingPlayer};

#[cfg(test)]
fn quizzer(seed: u64) -> (Quizzer<rand::rngs::SmallRng, RecordingPlayer>, Played) {
  use crate::scale::Scale;
  use rand::SeedableRng;
  let mut chooser = QuestionChooser::new(rand::rngs::SmallRng::seed_from_u64(seed));
  chooser.set_scale(Scale::CHROMATIC);
  let player = RecordingPlayer::default();
  let played = player.played.clone();
  (Quizzer::new(chooser, ScoreKeeper::new(), player), played)
}

#[cfg(test)]
fn answer(quizzer: &Quizzer<rand::rngs::SmallRng, RecordingPlayer>, position: usize) -> Interval {
  quizzer.question().unwrap().phrase().intervals()[position].to_ascending()
}

#[cfg(test)]
fn wrong_answer(right: Interval) -> Interval {
  if right == Interval::PERFECT_FOURTH {
    Interval::PERFECT_FIFTH
  } else {
    Interval::PERFECT_FOURTH
  }
}

#[test]
fn test_interval_choices() {
  let mut choices = IntervalChoices::new();
  assert!(!choices.allows(Interval::PERFECT_FOURTH));
  choices.reset(IntervalFilter::default());
  assert!(choices.allows(Interval::PERFECT_FOURTH));
  assert!(!choices.allows(Interval::OCTAVE));
  choices.remove_choice(Interval::PERFECT_FOURTH);
  assert!(!choices.allows(Interval::PERFECT_FOURTH));
  assert!(choices.allows(Interval::PERFECT_FIFTH));
  choices.reset(IntervalFilter::default());
  assert!(choices.allows(Interval::PERFECT_FOURTH));
}

#[test]
fn test_start_question_plays_phrase() {
  let (mut quizzer, played) = quizzer(1);
  assert!(!quizzer.is_started());
  quizzer.start_question().unwrap();
  let question = quizzer.question().unwrap().clone();
  assert_eq!(
    *played.borrow(),
    vec![(question.phrase().clone(), question.start_note())]
  );
  assert_eq!(quizzer.position(), 0);
  assert!(quizzer.allows(Interval::PERFECT_FOURTH));
  assert!(quizzer.allows(Interval::PERFECT_FIFTH));
  assert!(!quizzer.allows(Interval::MAJOR_THIRD));
  assert_eq!(
    quizzer.question_text(),
    "What's the difference in pitch between notes 1 and 2?"
  );
}

#[test]
fn test_wrong_then_right_scores_once_as_wrong() {
  let (mut quizzer, played) = quizzer(2);
  quizzer.start_question().unwrap();
  let phrase = quizzer.question().unwrap().phrase().clone();
  let right = answer(&quizzer, 0);
  let wrong = wrong_answer(right);

  quizzer.check_answer(wrong).unwrap();
  assert!(!quizzer.allows(wrong));
  assert_eq!(played.borrow().len(), 2);
  assert_eq!(quizzer.scores().total(), 0);

  quizzer.check_answer(right).unwrap();
  let row = quizzer.scores().row(&phrase).unwrap();
  assert_eq!(row.outcomes(), &[false]);
  assert_eq!(quizzer.scores().total(), 1);
  // A fresh question has started with every choice live again.
  assert_eq!(quizzer.position(), 0);
  assert!(quizzer.allows(wrong));
  assert_eq!(played.borrow().len(), 3);
}

#[test]
fn test_multi_interval_phrase() {
  let (mut quizzer, played) = quizzer(3);
  quizzer.chooser_mut().set_note_count(3);
  quizzer.start_question().unwrap();
  let question = quizzer.question().unwrap().clone();

  let first = answer(&quizzer, 0);
  quizzer.check_answer(first).unwrap();
  assert_eq!(quizzer.position(), 1);
  assert_eq!(quizzer.phrase_so_far(), first.name());
  assert_eq!(
    quizzer.question_text(),
    "What's the difference in pitch between notes 2 and 3?"
  );
  let (rest, start) = played.borrow().last().unwrap().clone();
  assert_eq!(rest, question.phrase().suffix(1));
  assert_eq!(start, question.notes()[1]);

  let second = answer(&quizzer, 1);
  quizzer.check_answer(wrong_answer(second)).unwrap();
  assert_eq!(quizzer.position(), 1);
  quizzer.check_answer(second).unwrap();

  let row = quizzer.scores().row(question.phrase()).unwrap();
  assert_eq!(row.outcomes(), &[false]);
  assert_eq!(quizzer.scores().last_phrase(), Some(question.phrase()));
}

#[test]
fn test_all_right_scores_right() {
  let (mut quizzer, _) = quizzer(4);
  quizzer.chooser_mut().set_note_count(3);
  quizzer.start_question().unwrap();
  let phrase = quizzer.question().unwrap().phrase().clone();
  quizzer.check_answer(answer(&quizzer, 0)).unwrap();
  quizzer.check_answer(answer(&quizzer, 1)).unwrap();
  assert_eq!(quizzer.scores().row(&phrase).unwrap().outcomes(), &[true]);
  assert_eq!(quizzer.score_summary(), "Score: 100% (1 of 1)");
}

#[test]
fn test_wrong_choice_stays_disabled_within_step() {
  let (mut quizzer, _) = quizzer(5);
  quizzer.chooser_mut().set_interval_allowed(Interval::MAJOR_THIRD, true);
  quizzer.start_question().unwrap();
  let right = answer(&quizzer, 0);
  let wrong: Vec<_> = [Interval::MAJOR_THIRD, Interval::PERFECT_FOURTH, Interval::PERFECT_FIFTH]
    .iter()
    .copied()
    .filter(|&interval| interval != right)
    .collect();
  quizzer.check_answer(wrong[0]).unwrap();
  quizzer.check_answer(wrong[1]).unwrap();
  assert!(!quizzer.allows(wrong[0]));
  assert!(!quizzer.allows(wrong[1]));
  assert!(quizzer.allows(right));
}

#[test]
fn test_listeners_fire_after_each_answer() {
  use std::cell::Cell;
  use std::rc::Rc;
  let (mut quizzer, _) = quizzer(6);
  let answered = Rc::new(Cell::new(0));
  let scored = Rc::new(Cell::new(0));
  let a = answered.clone();
  quizzer.on_answer_chosen(move || a.set(a.get() + 1));
  let s = scored.clone();
  quizzer.scores_mut().on_change(move || s.set(s.get() + 1));
  quizzer.start_question().unwrap();
  let right = answer(&quizzer, 0);
  quizzer.check_answer(wrong_answer(right)).unwrap();
  assert_eq!((answered.get(), scored.get()), (1, 0));
  quizzer.check_answer(right).unwrap();
  assert_eq!((answered.get(), scored.get()), (2, 1));
}

#[test]
fn test_unavailable_leaves_state_alone() {
  let (mut quizzer, played) = quizzer(7);
  quizzer.start_question().unwrap();
  let before = quizzer.question().unwrap().clone();
  quizzer.chooser_mut().set_interval_allowed(Interval::PERFECT_FOURTH, false);
  quizzer.chooser_mut().set_interval_allowed(Interval::PERFECT_FIFTH, false);
  assert!(quizzer.start_question().is_err());
  assert_eq!(quizzer.question(), Some(&before));
  assert_eq!(played.borrow().len(), 1);
  // The question in progress keeps the answers it was asked with.
  assert!(quizzer.allows(before.phrase().intervals()[0].to_ascending()));
}

#[test]
fn test_completed_phrase_is_scored_when_next_question_fails() {
  let (mut quizzer, _) = quizzer(8);
  quizzer.start_question().unwrap();
  let right = answer(&quizzer, 0);
  quizzer.chooser_mut().set_interval_allowed(Interval::PERFECT_FOURTH, false);
  quizzer.chooser_mut().set_interval_allowed(Interval::PERFECT_FIFTH, false);
  assert_eq!(quizzer.check_answer(right), Err(crate::error::Unavailable::NoIntervals));
  assert_eq!(quizzer.scores().total(), 1);
  assert_eq!(quizzer.scores().right(), 1);
  assert!(!quizzer.is_started());
  assert_eq!(quizzer.question_text(), "What's the difference in pitch between notes 1 and 2?");
}

#[test]
fn test_playback_failure_is_reported() {
  use crate::scale::Scale;
  use rand::SeedableRng;
  let mut chooser = QuestionChooser::new(rand::rngs::SmallRng::seed_from_u64(8));
  chooser.set_scale(Scale::CHROMATIC);
  let player = RecordingPlayer {
    broken: true,
    ..RecordingPlayer::default()
  };
  let mut quizzer = Quizzer::new(chooser, ScoreKeeper::new(), player);
  assert!(quizzer.start_question().is_err());
  assert!(quizzer.is_started());
}

#[test]
#[should_panic(expected = "non-ascending")]
fn test_descending_answer_panics() {
  let (mut quizzer, _) = quizzer(9);
  quizzer.start_question().unwrap();
  quizzer.check_answer(Interval::new(-5)).unwrap();
}
