use crate::interval::Interval;
use crate::note::Note;
use crate::scale::Scale;
use itertools::{Itertools, MinMaxResult};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::cmp::Ordering;

/// A melodic shape: the signed intervals between consecutive notes, not tied
/// to any starting pitch.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Phrase(Vec<Interval>);

impl Phrase {
  pub fn new(intervals: Vec<Interval>) -> Self {
    Phrase(intervals)
  }
  pub fn intervals(&self) -> &[Interval] {
    &self.0
  }
  pub fn note_count(&self) -> usize {
    self.0.len() + 1
  }

  /// Every note of the phrase, including `start`.
  pub fn notes(&self, start: Note) -> Vec<Note> {
    std::iter::once(start)
      .chain(self.0.iter().scan(start, |note, &interval| {
        *note = note.offset(interval);
        Some(*note)
      }))
      .collect()
  }

  /// Lowest and highest note, in half-steps relative to the first note.
  pub fn bounds(&self) -> (i64, i64) {
    match self
      .notes(Note::from_midi(0))
      .into_iter()
      .map(Note::number)
      .minmax()
    {
      MinMaxResult::MinMax(low, high) => (low, high),
      MinMaxResult::OneElement(only) => (only, only),
      MinMaxResult::NoElements => unreachable!(),
    }
  }
  pub fn range(&self) -> i64 {
    let (low, high) = self.bounds();
    high - low
  }

  /// The pitch classes the phrase touches, relative to its first note.
  pub fn scale(&self) -> Scale {
    Scale::from_notes(0, self.notes(Note::from_midi(0)).into_iter().map(Note::number))
  }
  pub fn can_transpose_to(&self, scale: &Scale) -> bool {
    scale.contains_anywhere(&self.scale())
  }

  /// Picks a start note so the whole phrase lies within `lowest..=highest`.
  pub fn choose_start_note<R: Rng>(
    &self,
    rng: &mut R,
    lowest: Note,
    highest: Note,
  ) -> Option<Note> {
    let (low, high) = self.bounds();
    let first = lowest.number() - low;
    let last = highest.number() - high;
    if first > last {
      return None;
    }
    Some(Note::from_midi(Uniform::new_inclusive(first, last).sample(rng)))
  }

  /// True if `answers` names this phrase's intervals in order, ignoring
  /// direction.
  pub fn contains_intervals_in_order(&self, answers: &[Interval]) -> bool {
    self.0.len() == answers.len()
      && self
        .0
        .iter()
        .zip(answers)
        .all(|(interval, answer)| interval.to_ascending() == *answer)
  }

  /// The rest of the phrase starting at interval `position`.
  pub fn suffix(&self, position: usize) -> Phrase {
    Phrase(self.0[position..].to_vec())
  }
}

impl Ord for Phrase {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .0
      .len()
      .cmp(&other.0.len())
      .then_with(|| self.0.cmp(&other.0))
  }
}

impl PartialOrd for Phrase {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl std::fmt::Display for Phrase {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(&self.0.iter().map(|interval| interval.short_name()).join(" "))
  }
}

#[cfg(test)]
fn phrase(half_steps: &[i64]) -> Phrase {
  Phrase::new(half_steps.iter().copied().map(Interval::new).collect())
}

#[test]
fn test_notes_and_range() {
  let p = phrase(&[5, -7, 2]);
  let notes: Vec<_> = p.notes(Note::MIDDLE_C).into_iter().map(Note::number).collect();
  assert_eq!(notes, vec![60, 65, 58, 60]);
  assert_eq!(p.bounds(), (-2, 5));
  assert_eq!(p.range(), 7);
  assert_eq!(p.note_count(), 4);
  assert_eq!(phrase(&[]).range(), 0);
}

#[test]
fn test_scale() {
  assert_eq!(phrase(&[5]).scale().bit_string(), "100001000000");
  assert_eq!(phrase(&[5, 2]).scale().bit_string(), "100001010000");
  assert_eq!(phrase(&[-5]).scale().bit_string(), "100000010000");
}

#[test]
fn test_can_transpose_to() {
  let check = |expected: bool, bit_string: &str, half_steps: &[i64]| {
    let scale = Scale::from_bit_string(bit_string).unwrap();
    assert_eq!(phrase(half_steps).can_transpose_to(&scale), expected);
  };
  check(true, "100001000000", &[5]);
  check(true, "010000100000", &[5]);
  check(true, "001000010000", &[5]);
  check(false, "110000000000", &[5]);
  check(true, "101011010101", &[5]);
  check(true, "101011010101", &[5, 2]);
  check(true, "101011010101", &[5, 1]);
  check(false, "101011010101", &[1, 1]);
}

#[test]
fn test_choose_start_note() {
  use rand::SeedableRng;
  let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
  let p = phrase(&[12, -19, 7]);
  for _ in 0..200 {
    let start = p.choose_start_note(&mut rng, Note::LOWEST, Note::HIGHEST).unwrap();
    for note in p.notes(start) {
      assert!(Note::LOWEST <= note && note <= Note::HIGHEST, "{}", note);
    }
  }
  let too_wide = phrase(&[12, 12, 12, 12]);
  assert_eq!(too_wide.choose_start_note(&mut rng, Note::LOWEST, Note::HIGHEST), None);
  let exact = phrase(&[38]);
  assert_eq!(exact.choose_start_note(&mut rng, Note::LOWEST, Note::HIGHEST), Some(Note::LOWEST));
}

#[test]
fn test_contains_intervals_in_order() {
  let p = phrase(&[-5, 7]);
  assert!(p.contains_intervals_in_order(&[Interval::PERFECT_FOURTH, Interval::PERFECT_FIFTH]));
  assert!(!p.contains_intervals_in_order(&[Interval::PERFECT_FIFTH, Interval::PERFECT_FOURTH]));
  assert!(!p.contains_intervals_in_order(&[Interval::PERFECT_FOURTH]));
}

#[test]
fn test_ordering() {
  assert!(phrase(&[12]) < phrase(&[0, 0]));
  assert!(phrase(&[-5, 7]) < phrase(&[5, 7]));
  assert_eq!(phrase(&[5, -7]).to_string(), "P4\u{2191} P5\u{2193}");
  assert_eq!(phrase(&[5, -7, 2]).suffix(1), phrase(&[-7, 2]));
}
