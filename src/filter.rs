use crate::error::ParseError;
use crate::interval::Interval;
use crate::phrase::Phrase;
use crate::scale::Scale;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Which directions generated intervals may move in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DirectionFilter {
  Ascending,
  Descending,
  Both,
}

impl DirectionFilter {
  pub fn label(self) -> &'static str {
    match self {
      Self::Ascending => "Up",
      Self::Descending => "Down",
      Self::Both => "Both",
    }
  }
  pub fn allows(self, interval: Interval) -> bool {
    match self {
      Self::Ascending => interval.is_ascending(),
      Self::Descending => interval.is_descending(),
      Self::Both => true,
    }
  }
  pub fn allows_phrase(self, phrase: &Phrase) -> bool {
    phrase.intervals().iter().all(|&interval| self.allows(interval))
  }
  /// The next policy in Up, Down, Both order, for a toggle button.
  pub fn next(self) -> Self {
    match self {
      Self::Ascending => Self::Descending,
      Self::Descending => Self::Both,
      Self::Both => Self::Ascending,
    }
  }
}

impl Default for DirectionFilter {
  fn default() -> Self {
    Self::Ascending
  }
}

impl std::fmt::Display for DirectionFilter {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for DirectionFilter {
  type Err = ParseError;
  fn from_str(s: &str) -> Result<Self, ParseError> {
    match s.trim().to_ascii_lowercase().as_str() {
      "up" | "ascending" => Ok(Self::Ascending),
      "down" | "descending" => Ok(Self::Descending),
      "both" => Ok(Self::Both),
      _ => Err(ParseError::Direction(s.to_string())),
    }
  }
}

/// The intervals the user has enabled. Stored without direction; a filter is
/// never mutated in place, each change builds a new one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IntervalFilter {
  enabled: BTreeSet<Interval>,
}

impl IntervalFilter {
  pub fn new<I: IntoIterator<Item = Interval>>(intervals: I) -> Self {
    Self {
      enabled: intervals.into_iter().map(Interval::to_ascending).collect(),
    }
  }
  pub fn empty() -> Self {
    Self::new(None)
  }

  pub fn enable(&self, choice: Interval) -> Self {
    let mut enabled = self.enabled.clone();
    enabled.insert(choice.to_ascending());
    Self { enabled }
  }
  pub fn disable(&self, choice: Interval) -> Self {
    let mut enabled = self.enabled.clone();
    enabled.remove(&choice.to_ascending());
    Self { enabled }
  }

  /// Keeps only the intervals found somewhere in `scale`.
  pub fn intersect_scale(&self, scale: &Scale) -> Self {
    Self {
      enabled: self
        .enabled
        .iter()
        .copied()
        .filter(|&interval| scale.contains_interval_anywhere(interval))
        .collect(),
    }
  }

  pub fn allows(&self, interval: Interval) -> bool {
    self.enabled.contains(&interval.to_ascending())
  }
  pub fn allows_phrase(&self, phrase: &Phrase) -> bool {
    phrase.intervals().iter().all(|&interval| self.allows(interval))
  }

  /// The signed intervals a phrase may use under `direction`, lowest first.
  pub fn generate(&self, direction: DirectionFilter) -> Vec<Interval> {
    let mut result = BTreeSet::new();
    for &interval in &self.enabled {
      for candidate in [interval, interval.reverse()].iter().copied() {
        if direction.allows(candidate) {
          result.insert(candidate);
        }
      }
    }
    result.into_iter().collect()
  }

  pub fn is_empty(&self) -> bool {
    self.enabled.is_empty()
  }
  pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
    self.enabled.iter().copied()
  }

  pub fn smallest(&self) -> Interval {
    *self.enabled.iter().next().expect("smallest of an empty interval filter")
  }
  /// Falls back to the smallest when only one interval is enabled.
  pub fn second_smallest(&self) -> Interval {
    let mut it = self.enabled.iter();
    let smallest = it.next().expect("second smallest of an empty interval filter");
    *it.next().unwrap_or(smallest)
  }
  pub fn largest(&self) -> Interval {
    *self.enabled.iter().next_back().expect("largest of an empty interval filter")
  }
}

impl Default for IntervalFilter {
  fn default() -> Self {
    Self::new(vec![Interval::PERFECT_FOURTH, Interval::PERFECT_FIFTH])
  }
}

#[cfg(test)]
fn short_names(intervals: &[Interval]) -> String {
  use itertools::Itertools;
  intervals.iter().map(|i| i.short_name()).join(" ")
}

#[test]
fn test_direction_filter() {
  let down = Interval::new(-4);
  assert!(DirectionFilter::Ascending.allows(Interval::MAJOR_THIRD));
  assert!(!DirectionFilter::Ascending.allows(down));
  assert!(DirectionFilter::Descending.allows(down));
  assert!(DirectionFilter::Descending.allows(Interval::UNISON));
  assert!(DirectionFilter::Both.allows(down));
  assert_eq!("Down".parse(), Ok(DirectionFilter::Descending));
  assert!("sideways".parse::<DirectionFilter>().is_err());
  assert_eq!(DirectionFilter::Both.next(), DirectionFilter::Ascending);
}

#[test]
fn test_enable_disable() {
  let filter = IntervalFilter::empty().enable(Interval::new(-7));
  assert!(filter.allows(Interval::PERFECT_FIFTH));
  assert!(filter.allows(Interval::new(-7)));
  let smaller = filter.disable(Interval::PERFECT_FIFTH);
  assert!(smaller.is_empty());
  assert!(filter.allows(Interval::PERFECT_FIFTH));
}

#[test]
fn test_generate() {
  let filter = IntervalFilter::new(vec![Interval::UNISON, Interval::PERFECT_FOURTH]);
  assert_eq!(short_names(&filter.generate(DirectionFilter::Ascending)), "U\u{2191} P4\u{2191}");
  assert_eq!(short_names(&filter.generate(DirectionFilter::Descending)), "P4\u{2193} U\u{2191}");
  assert_eq!(
    short_names(&filter.generate(DirectionFilter::Both)),
    "P4\u{2193} U\u{2191} P4\u{2191}"
  );
}

#[test]
fn test_intersect_scale() {
  let filter = IntervalFilter::new(vec![
    Interval::MINOR_SECOND,
    Interval::MAJOR_SECOND,
    Interval::TRITONE,
  ]);
  let pentatonic = filter.intersect_scale(&Scale::PENTATONIC);
  assert_eq!(pentatonic.iter().collect::<Vec<_>>(), vec![Interval::MAJOR_SECOND]);
  let major = filter.intersect_scale(&Scale::MAJOR);
  assert_eq!(major, filter);
}

#[test]
fn test_smallest_and_largest() {
  let filter =
    IntervalFilter::new(vec![Interval::new(-9), Interval::MINOR_THIRD, Interval::OCTAVE]);
  assert_eq!(filter.smallest(), Interval::MINOR_THIRD);
  assert_eq!(filter.second_smallest(), Interval::MAJOR_SIXTH);
  assert_eq!(filter.largest(), Interval::OCTAVE);
  let single = IntervalFilter::new(vec![Interval::PERFECT_FOURTH]);
  assert_eq!(single.second_smallest(), Interval::PERFECT_FOURTH);
}

#[test]
#[should_panic]
fn test_smallest_of_empty() {
  IntervalFilter::empty().smallest();
}
