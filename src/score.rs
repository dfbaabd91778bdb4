use crate::chooser::Question;
use crate::interval::Interval;
use crate::note::Note;
use crate::phrase::Phrase;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// A phrase needs practice until its last this-many attempts are all right.
pub const PRACTICE_WINDOW: usize = 3;

/// Every attempt at one phrase, oldest first.
#[derive(Clone, Debug)]
pub struct PhraseRow {
  phrase: Phrase,
  outcomes: Vec<bool>,
  start_notes: Vec<Note>,
  replayed: usize,
}

impl PhraseRow {
  fn new(phrase: Phrase) -> Self {
    Self {
      phrase,
      outcomes: Vec::new(),
      start_notes: Vec::new(),
      replayed: 0,
    }
  }
  fn add_result(&mut self, start_note: Note, right: bool) {
    self.outcomes.push(right);
    self.start_notes.push(start_note);
  }

  pub fn phrase(&self) -> &Phrase {
    &self.phrase
  }
  pub fn outcomes(&self) -> &[bool] {
    &self.outcomes
  }
  pub fn tries(&self) -> usize {
    self.outcomes.len()
  }
  pub fn right(&self) -> usize {
    self.outcomes.iter().filter(|&&right| right).count()
  }
  pub fn wrong(&self) -> usize {
    self.tries() - self.right()
  }
  /// Wrong answers among the most recent `window` attempts.
  pub fn recent_wrong(&self, window: usize) -> usize {
    self
      .outcomes
      .iter()
      .rev()
      .take(window)
      .filter(|&&right| !right)
      .count()
  }
  pub fn needs_practice(&self) -> bool {
    self.tries() < PRACTICE_WINDOW || self.recent_wrong(PRACTICE_WINDOW) > 0
  }
}

/// Right/wrong ledger per phrase, for the score page and for steering the
/// chooser back to phrases the user keeps missing.
#[derive(Default)]
pub struct ScoreKeeper {
  right: usize,
  wrong: usize,
  rows: BTreeMap<Phrase, PhraseRow>,
  last_phrase: Option<Phrase>,
  listeners: Vec<Box<dyn FnMut()>>,
}

impl ScoreKeeper {
  pub fn new() -> Self {
    Self::default()
  }

  /// Called whenever the score changes; re-read the accessors from there.
  pub fn on_change<F: FnMut() + 'static>(&mut self, listener: F) {
    self.listeners.push(Box::new(listener));
  }
  fn fire_change(&mut self) {
    for listener in &mut self.listeners {
      listener();
    }
  }

  /// Records one attempt at `question`. Returns whether `answers` (the first
  /// guess for each interval) were all right.
  pub fn add_result(&mut self, question: &Question, answers: &[Interval]) -> bool {
    let phrase = question.phrase();
    let right = phrase.contains_intervals_in_order(answers);
    if right {
      self.right += 1;
    } else {
      self.wrong += 1;
    }
    self
      .rows
      .entry(phrase.clone())
      .or_insert_with(|| PhraseRow::new(phrase.clone()))
      .add_result(question.start_note(), right);
    self.last_phrase = Some(phrase.clone());
    info!(%phrase, right, total = self.total(), "phrase answered");
    self.fire_change();
    right
  }

  pub fn reset(&mut self) {
    self.right = 0;
    self.wrong = 0;
    self.rows.clear();
    self.last_phrase = None;
    self.fire_change();
  }

  pub fn total(&self) -> usize {
    self.right + self.wrong
  }
  pub fn right(&self) -> usize {
    self.right
  }
  pub fn wrong(&self) -> usize {
    self.wrong
  }
  pub fn last_phrase(&self) -> Option<&Phrase> {
    self.last_phrase.as_ref()
  }
  pub fn rows(&self) -> impl Iterator<Item = &PhraseRow> {
    self.rows.values()
  }
  pub fn row(&self, phrase: &Phrase) -> Option<&PhraseRow> {
    self.rows.get(phrase)
  }

  pub fn phrases_needing_practice(&self) -> BTreeSet<Phrase> {
    self
      .rows
      .values()
      .filter(|row| row.needs_practice())
      .map(|row| row.phrase.clone())
      .collect()
  }

  /// Start note for replaying `phrase` from the score page; cycles through
  /// the notes it was asked from.
  pub fn replay_note(&mut self, phrase: &Phrase) -> Note {
    match self.rows.get_mut(phrase) {
      Some(row) if !row.start_notes.is_empty() => {
        let note = row.start_notes[row.replayed % row.start_notes.len()];
        row.replayed += 1;
        note
      }
      _ => Note::MIDDLE_C,
    }
  }

  /// E.g. `Score: 75% (3 of 4)`; empty before the first result.
  pub fn summary(&self) -> String {
    let total = self.total();
    if total == 0 {
      return String::new();
    }
    let percent = (self.right as f64 * 100.0 / total as f64).round();
    format!("Score: {:.0}% ({} of {})", percent, self.right, total)
  }
}

#[cfg(test)]
fn question(half_steps: &[i64], start: i64) -> Question {
  use crate::filter::IntervalFilter;
  let phrase = Phrase::new(half_steps.iter().copied().map(Interval::new).collect());
  Question::new(phrase, Note::from_midi(start), IntervalFilter::default())
}

#[test]
fn test_add_result() {
  let mut scores = ScoreKeeper::new();
  let q = question(&[-5, 7], 60);
  assert!(scores.add_result(&q, &[Interval::PERFECT_FOURTH, Interval::PERFECT_FIFTH]));
  assert!(!scores.add_result(&q, &[Interval::PERFECT_FIFTH, Interval::PERFECT_FIFTH]));
  let row = scores.row(q.phrase()).unwrap();
  assert_eq!(row.outcomes(), &[true, false]);
  assert_eq!((row.tries(), row.right(), row.wrong()), (2, 1, 1));
  assert_eq!(scores.last_phrase(), Some(q.phrase()));
  assert_eq!(scores.summary(), "Score: 50% (1 of 2)");
}

#[test]
fn test_summary_rounds_half_up() {
  let mut scores = ScoreKeeper::new();
  let q = question(&[5], 60);
  scores.add_result(&q, &[Interval::PERFECT_FOURTH]);
  for _ in 0..7 {
    scores.add_result(&q, &[Interval::PERFECT_FIFTH]);
  }
  assert_eq!(scores.summary(), "Score: 13% (1 of 8)");
}

#[test]
fn test_needs_practice() {
  let mut scores = ScoreKeeper::new();
  let q = question(&[5], 60);
  let right = [Interval::PERFECT_FOURTH];
  let wrong = [Interval::PERFECT_FIFTH];
  scores.add_result(&q, &wrong);
  scores.add_result(&q, &right);
  scores.add_result(&q, &right);
  assert!(scores.phrases_needing_practice().contains(q.phrase()));
  scores.add_result(&q, &right);
  assert!(scores.phrases_needing_practice().is_empty());
  scores.add_result(&q, &wrong);
  assert_eq!(scores.row(q.phrase()).unwrap().recent_wrong(PRACTICE_WINDOW), 1);
  assert!(!scores.phrases_needing_practice().is_empty());
}

#[test]
fn test_new_phrase_needs_practice_until_three_tries() {
  let mut scores = ScoreKeeper::new();
  let q = question(&[7], 50);
  for _ in 0..2 {
    scores.add_result(&q, &[Interval::PERFECT_FIFTH]);
    assert_eq!(scores.phrases_needing_practice().len(), 1);
  }
  scores.add_result(&q, &[Interval::PERFECT_FIFTH]);
  assert!(scores.phrases_needing_practice().is_empty());
}

#[test]
fn test_reset_and_listeners() {
  use std::cell::Cell;
  use std::rc::Rc;
  let changes = Rc::new(Cell::new(0));
  let mut scores = ScoreKeeper::new();
  let seen = changes.clone();
  scores.on_change(move || seen.set(seen.get() + 1));
  scores.add_result(&question(&[5], 60), &[]);
  assert_eq!(changes.get(), 1);
  scores.reset();
  assert_eq!(changes.get(), 2);
  assert_eq!(scores.total(), 0);
  assert_eq!(scores.last_phrase(), None);
  assert_eq!(scores.rows().count(), 0);
  assert_eq!(scores.summary(), "");
}

#[test]
fn test_replay_note_cycles() {
  let mut scores = ScoreKeeper::new();
  let first = question(&[5], 48);
  let again = question(&[5], 55);
  scores.add_result(&first, &[]);
  scores.add_result(&again, &[]);
  let notes: Vec<_> = (0..3).map(|_| scores.replay_note(first.phrase()).number()).collect();
  assert_eq!(notes, vec![48, 55, 48]);
  let unknown = Phrase::new(vec![Interval::OCTAVE]);
  assert_eq!(scores.replay_note(&unknown), Note::MIDDLE_C);
}
