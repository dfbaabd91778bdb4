use crate::error::{Result, Unavailable};
use crate::filter::{DirectionFilter, IntervalFilter};
use crate::interval::Interval;
use crate::note::Note;
use crate::phrase::Phrase;
use crate::scale::Scale;
use crate::score::ScoreKeeper;
use crate::search::PhraseSpace;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

pub const MIN_NOTE_COUNT: usize = 2;
pub const MAX_NOTE_COUNT: usize = 16;
pub const DEFAULT_NOTE_COUNT: usize = 2;

/// Smallest candidate pool a question is drawn from.
pub const MIN_CHOICES: usize = 3;
const MAX_FRESH_TRIES: usize = 100;
const MAX_ATTEMPTS: usize = 16;

/// A phrase at a concrete pitch, plus the answers that were legal when it
/// was asked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Question {
  phrase: Phrase,
  start_note: Note,
  choices: IntervalFilter,
}

impl Question {
  pub fn new(phrase: Phrase, start_note: Note, choices: IntervalFilter) -> Self {
    Self {
      phrase,
      start_note,
      choices,
    }
  }
  pub fn phrase(&self) -> &Phrase {
    &self.phrase
  }
  pub fn start_note(&self) -> Note {
    self.start_note
  }
  pub fn choices(&self) -> &IntervalFilter {
    &self.choices
  }
  pub fn notes(&self) -> Vec<Note> {
    self.phrase.notes(self.start_note)
  }
  /// Number of intervals the user has to name.
  pub fn answer_count(&self) -> usize {
    self.phrase.intervals().len()
  }
  pub fn is_correct(&self, candidate: Interval, position: usize) -> bool {
    self.phrase.intervals()[position].to_ascending() == candidate
  }
}

/// Produces questions that satisfy the current settings, preferring phrases
/// the user recently got wrong.
pub struct QuestionChooser<R> {
  rng: R,
  scale: Scale,
  intervals: IntervalFilter,
  direction: DirectionFilter,
  note_count: usize,
}

impl<R: Rng> QuestionChooser<R> {
  pub fn new(rng: R) -> Self {
    Self {
      rng,
      scale: Scale::default(),
      intervals: IntervalFilter::default(),
      direction: DirectionFilter::default(),
      note_count: DEFAULT_NOTE_COUNT,
    }
  }

  pub fn scale(&self) -> Scale {
    self.scale
  }
  pub fn set_scale(&mut self, scale: Scale) {
    info!(%scale, "scale changed");
    self.scale = scale;
  }
  pub fn interval_filter(&self) -> &IntervalFilter {
    &self.intervals
  }
  pub fn is_interval_allowed(&self, interval: Interval) -> bool {
    self.intervals.allows(interval)
  }
  pub fn set_interval_allowed(&mut self, interval: Interval, allowed: bool) {
    info!(%interval, allowed, "interval toggled");
    self.intervals = if allowed {
      self.intervals.enable(interval)
    } else {
      self.intervals.disable(interval)
    };
  }
  pub fn direction(&self) -> DirectionFilter {
    self.direction
  }
  pub fn set_direction(&mut self, direction: DirectionFilter) {
    info!(%direction, "direction changed");
    self.direction = direction;
  }
  pub fn note_count(&self) -> usize {
    self.note_count
  }
  pub fn set_note_count(&mut self, note_count: usize) {
    let clamped = note_count.max(MIN_NOTE_COUNT).min(MAX_NOTE_COUNT);
    if clamped != note_count {
      warn!(requested = note_count, used = clamped, "note count out of range");
    }
    self.note_count = clamped;
  }

  /// Picks the next question. Fails without side effects (beyond consuming
  /// randomness) if nothing fits the current settings.
  pub fn choose_question(&mut self, scores: &ScoreKeeper) -> Result<Question> {
    let choices = self.intervals.intersect_scale(&self.scale);
    if choices.is_empty() {
      warn!(scale = %self.scale, "no enabled interval occurs in the scale");
      return Err(Unavailable::NoIntervals);
    }
    let window = Note::LOWEST.interval_to(Note::HIGHEST).half_steps();
    let max_range = window.min(self.largest_phrase_range(&choices));
    let mut space = PhraseSpace::new(
      choices.generate(self.direction),
      &self.scale,
      self.note_count,
      max_range,
    );

    let last = scores.last_phrase();
    let practice: Vec<Phrase> = scores
      .phrases_needing_practice()
      .into_iter()
      .filter(|phrase| {
        Some(phrase) != last
          && phrase.note_count() == self.note_count
          && phrase.range() <= max_range
          && choices.allows_phrase(phrase)
          && self.direction.allows_phrase(phrase)
          && phrase.can_transpose_to(&self.scale)
      })
      .collect();

    for _ in 0..MAX_ATTEMPTS {
      let mut candidates = practice.clone();
      for _ in 0..MAX_FRESH_TRIES {
        if candidates.len() >= MIN_CHOICES {
          break;
        }
        match space.sample(&mut self.rng) {
          Some(phrase) if Some(&phrase) != last && !candidates.contains(&phrase) => {
            candidates.push(phrase)
          }
          Some(_) => {}
          None => break,
        }
      }
      if candidates.is_empty() {
        // The previous phrase may be the only one left.
        candidates.extend(space.sample(&mut self.rng));
      }
      debug!(
        practice = practice.len(),
        pool = candidates.len(),
        "candidate phrases"
      );
      let phrase = match candidates.choose(&mut self.rng) {
        Some(phrase) => phrase.clone(),
        None => break,
      };
      if phrase.range() > max_range {
        continue;
      }
      let start_note = phrase.choose_start_note(&mut self.rng, Note::LOWEST, Note::HIGHEST);
      if let Some(start_note) = start_note {
        debug!(%phrase, %start_note, "chose question");
        return Ok(Question::new(phrase, start_note, choices));
      }
    }
    warn!(note_count = self.note_count, "no phrase fits the playable range");
    Err(Unavailable::NoPhrase {
      note_count: self.note_count,
    })
  }

  // Largest interval, plus the second smallest for a third note, plus the
  // smallest for every note after that.
  fn largest_phrase_range(&self, choices: &IntervalFilter) -> i64 {
    let mut range = choices.largest().half_steps();
    if self.note_count > 2 {
      range += choices.second_smallest().half_steps();
    }
    range + choices.smallest().half_steps() * self.note_count.saturating_sub(3) as i64
  }
}

#[cfg(test)]
fn seeded(seed: u64) -> QuestionChooser<rand::rngs::SmallRng> {
  use rand::SeedableRng;
  QuestionChooser::new(rand::rngs::SmallRng::seed_from_u64(seed))
}

#[cfg(test)]
fn fourths_and_fifths(seed: u64) -> QuestionChooser<rand::rngs::SmallRng> {
  let mut chooser = seeded(seed);
  chooser.set_scale(Scale::CHROMATIC);
  chooser
}

#[test]
fn test_two_note_question() {
  let scores = ScoreKeeper::new();
  let mut chooser = fourths_and_fifths(1);
  for _ in 0..50 {
    let question = chooser.choose_question(&scores).unwrap();
    assert_eq!(question.answer_count(), 1);
    let answer = question.phrase().intervals()[0].to_ascending();
    assert!(answer == Interval::PERFECT_FOURTH || answer == Interval::PERFECT_FIFTH);
    assert!(question.phrase().intervals()[0].is_ascending());
    for candidate in Interval::all_named() {
      assert_eq!(question.is_correct(candidate, 0), candidate == answer);
    }
  }
}

#[test]
fn test_questions_stay_in_window() {
  let scores = ScoreKeeper::new();
  let mut chooser = seeded(5);
  chooser.set_scale(Scale::MAJOR);
  chooser.set_direction(DirectionFilter::Both);
  chooser.set_note_count(6);
  for interval in Interval::all_named() {
    chooser.set_interval_allowed(interval, true);
  }
  for _ in 0..50 {
    let question = chooser.choose_question(&scores).unwrap();
    assert_eq!(question.phrase().note_count(), 6);
    assert!(question.phrase().can_transpose_to(&Scale::MAJOR));
    for note in question.notes() {
      assert!(Note::LOWEST <= note && note <= Note::HIGHEST);
    }
  }
}

#[test]
fn test_same_seed_same_questions() {
  let run = |seed| {
    let scores = ScoreKeeper::new();
    let mut chooser = seeded(seed);
    chooser.set_direction(DirectionFilter::Both);
    chooser.set_note_count(4);
    chooser.set_interval_allowed(Interval::MAJOR_SECOND, true);
    (0..20)
      .map(|_| chooser.choose_question(&scores).unwrap())
      .collect::<Vec<_>>()
  };
  assert_eq!(run(9), run(9));
}

#[test]
fn test_direction_is_honoured() {
  let scores = ScoreKeeper::new();
  let mut chooser = fourths_and_fifths(2);
  chooser.set_direction(DirectionFilter::Descending);
  chooser.set_note_count(3);
  for _ in 0..20 {
    let question = chooser.choose_question(&scores).unwrap();
    assert!(DirectionFilter::Descending.allows_phrase(question.phrase()));
  }
}

#[test]
fn test_empty_filter_is_unavailable() {
  let scores = ScoreKeeper::new();
  let mut chooser = fourths_and_fifths(3);
  chooser.set_interval_allowed(Interval::PERFECT_FOURTH, false);
  chooser.set_interval_allowed(Interval::PERFECT_FIFTH, false);
  assert_eq!(chooser.choose_question(&scores), Err(Unavailable::NoIntervals));

  chooser.set_interval_allowed(Interval::MINOR_SECOND, true);
  chooser.set_scale(Scale::PENTATONIC);
  assert_eq!(chooser.choose_question(&scores), Err(Unavailable::NoIntervals));
}

#[test]
fn test_no_phrase_is_unavailable() {
  let scores = ScoreKeeper::new();
  let mut chooser = fourths_and_fifths(4);
  chooser.set_interval_allowed(Interval::PERFECT_FOURTH, false);
  chooser.set_interval_allowed(Interval::PERFECT_FIFTH, false);
  chooser.set_interval_allowed(Interval::OCTAVE, true);
  chooser.set_note_count(4);
  assert!(chooser.choose_question(&scores).is_ok());
  // Four octaves up is wider than the playable window.
  chooser.set_note_count(5);
  assert_eq!(
    chooser.choose_question(&scores),
    Err(Unavailable::NoPhrase { note_count: 5 })
  );
}

#[test]
fn test_missed_phrase_comes_back() {
  let mut scores = ScoreKeeper::new();
  let mut chooser = fourths_and_fifths(6);
  chooser.set_direction(DirectionFilter::Both);
  chooser.set_note_count(3);
  for interval in Interval::all_named() {
    chooser.set_interval_allowed(interval, true);
  }
  let missed = chooser.choose_question(&scores).unwrap();
  scores.add_result(&missed, &[Interval::OCTAVE, Interval::OCTAVE]);
  let other = Question::new(
    Phrase::new(vec![Interval::new(30), Interval::new(30)]),
    Note::MIDDLE_C,
    IntervalFilter::default(),
  );
  scores.add_result(&other, &[]);
  // The missed phrase is one of three candidates out of hundreds of phrases.
  let repeats = (0..60)
    .filter(|_| chooser.choose_question(&scores).unwrap().phrase() == missed.phrase())
    .count();
  assert!(repeats > 5, "missed phrase repeated {} times", repeats);
}

#[test]
fn test_last_phrase_is_not_repeated() {
  let mut scores = ScoreKeeper::new();
  let mut chooser = fourths_and_fifths(8);
  let mut previous = chooser.choose_question(&scores).unwrap();
  for _ in 0..30 {
    scores.add_result(&previous, &[Interval::OCTAVE]);
    let next = chooser.choose_question(&scores).unwrap();
    assert_ne!(next.phrase(), previous.phrase());
    previous = next;
  }
}

#[test]
fn test_only_phrase_may_repeat() {
  let mut scores = ScoreKeeper::new();
  let mut chooser = fourths_and_fifths(10);
  chooser.set_interval_allowed(Interval::PERFECT_FIFTH, false);
  let first = chooser.choose_question(&scores).unwrap();
  scores.add_result(&first, &[Interval::PERFECT_FOURTH]);
  let second = chooser.choose_question(&scores).unwrap();
  assert_eq!(first.phrase(), second.phrase());
}

#[test]
fn test_note_count_is_clamped() {
  let mut chooser = seeded(0);
  chooser.set_note_count(1);
  assert_eq!(chooser.note_count(), MIN_NOTE_COUNT);
  chooser.set_note_count(99);
  assert_eq!(chooser.note_count(), MAX_NOTE_COUNT);
}
