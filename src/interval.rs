use crate::error::ParseError;
use std::ops::{Add, Neg};
use std::str::FromStr;

/// A signed distance between two notes, in half-steps. Negative is descending;
/// zero (a unison) counts as both ascending and descending.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Interval(i64);

const NAMES: [(&str, &str); 13] = [
  ("Unison", "U"),
  ("Minor Second", "m2"),
  ("Major Second", "M2"),
  ("Minor Third", "m3"),
  ("Major Third", "M3"),
  ("Perfect Fourth", "P4"),
  ("Tritone", "TT"),
  ("Perfect Fifth", "P5"),
  ("Minor Sixth", "m6"),
  ("Major Sixth", "M6"),
  ("Minor Seventh", "m7"),
  ("Major Seventh", "M7"),
  ("Octave", "8va"),
];

impl Interval {
  pub const UNISON: Interval = Interval(0);
  pub const MINOR_SECOND: Interval = Interval(1);
  pub const MAJOR_SECOND: Interval = Interval(2);
  pub const MINOR_THIRD: Interval = Interval(3);
  pub const MAJOR_THIRD: Interval = Interval(4);
  pub const PERFECT_FOURTH: Interval = Interval(5);
  pub const TRITONE: Interval = Interval(6);
  pub const PERFECT_FIFTH: Interval = Interval(7);
  pub const MINOR_SIXTH: Interval = Interval(8);
  pub const MAJOR_SIXTH: Interval = Interval(9);
  pub const MINOR_SEVENTH: Interval = Interval(10);
  pub const MAJOR_SEVENTH: Interval = Interval(11);
  pub const OCTAVE: Interval = Interval(12);

  pub const fn new(half_steps: i64) -> Self {
    Interval(half_steps)
  }
  pub fn half_steps(self) -> i64 {
    self.0
  }
  pub fn is_ascending(self) -> bool {
    self.0 >= 0
  }
  pub fn is_descending(self) -> bool {
    self.0 <= 0
  }
  pub fn reverse(self) -> Self {
    Interval(-self.0)
  }
  pub fn to_ascending(self) -> Self {
    Interval(self.0.abs())
  }
  pub fn up(self) -> Self {
    Interval(self.0 + 1)
  }

  /// Every interval from `lowest` to `highest` inclusive.
  pub fn range(lowest: Interval, highest: Interval) -> IntervalRange {
    IntervalRange {
      next: lowest,
      last: highest,
    }
  }
  /// The intervals that have names, unison through octave.
  pub fn all_named() -> IntervalRange {
    Self::range(Self::UNISON, Self::OCTAVE)
  }

  pub fn name(self) -> String {
    match NAMES.get(self.0.unsigned_abs() as usize) {
      Some((name, _)) => name.to_string(),
      None => format!("Interval<{}>", self.0),
    }
  }
  pub fn abbreviation(self) -> &'static str {
    NAMES
      .get(self.0.unsigned_abs() as usize)
      .map_or("?", |(_, abbrev)| abbrev)
  }
  /// Abbreviation plus an arrow for the direction, e.g. `P4↑`.
  pub fn short_name(self) -> String {
    let arrow = if self.is_ascending() { '\u{2191}' } else { '\u{2193}' };
    format!("{}{}", self.abbreviation(), arrow)
  }
}

impl Add for Interval {
  type Output = Interval;
  fn add(self, other: Interval) -> Interval {
    Interval(self.0 + other.0)
  }
}

impl Neg for Interval {
  type Output = Interval;
  fn neg(self) -> Interval {
    self.reverse()
  }
}

impl std::fmt::Display for Interval {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(&self.name())
  }
}

/// Accepts an abbreviation (`P4`, case-sensitive since `m3` != `M3`), a full
/// name (any case), or a signed number of half-steps.
impl FromStr for Interval {
  type Err = ParseError;
  fn from_str(s: &str) -> Result<Self, ParseError> {
    let s = s.trim();
    if let Ok(half_steps) = s.parse::<i64>() {
      return Ok(Interval(half_steps));
    }
    NAMES
      .iter()
      .position(|(name, abbrev)| *abbrev == s || name.eq_ignore_ascii_case(s))
      .map(|i| Interval(i as i64))
      .ok_or_else(|| ParseError::Interval(s.to_string()))
  }
}

/// Lazy, restartable (`Clone`) walk over consecutive intervals.
#[derive(Clone, Debug)]
pub struct IntervalRange {
  next: Interval,
  last: Interval,
}

impl Iterator for IntervalRange {
  type Item = Interval;
  fn next(&mut self) -> Option<Interval> {
    if self.next > self.last {
      return None;
    }
    let current = self.next;
    self.next = current.up();
    Some(current)
  }
}

#[test]
fn test_reverse_and_ascending() {
  for half_steps in -30..=30 {
    let x = Interval::new(half_steps);
    assert_eq!(x.reverse().reverse(), x);
    assert_eq!(x.to_ascending().half_steps(), half_steps.abs());
    assert_eq!(-x, x.reverse());
  }
  assert!(Interval::UNISON.is_ascending());
  assert!(Interval::UNISON.is_descending());
  assert!(!Interval::new(-3).is_ascending());
}

#[test]
fn test_ordering() {
  assert!(Interval::new(-7) < Interval::UNISON);
  assert!(Interval::PERFECT_FOURTH < Interval::PERFECT_FIFTH);
  assert_eq!(Interval::PERFECT_FOURTH + Interval::MAJOR_SECOND, Interval::PERFECT_FIFTH);
  assert_eq!(Interval::OCTAVE.up(), Interval::new(13));
}

#[test]
fn test_range() {
  let range = Interval::range(Interval::new(-1), Interval::new(2));
  let expected: Vec<_> = (-1..=2).map(Interval::new).collect();
  assert_eq!(range.clone().collect::<Vec<_>>(), expected);
  assert_eq!(range.collect::<Vec<_>>(), expected);
  assert_eq!(Interval::all_named().count(), 13);
  assert_eq!(Interval::range(Interval::OCTAVE, Interval::UNISON).count(), 0);
}

#[test]
fn test_names() {
  assert_eq!(Interval::PERFECT_FIFTH.name(), "Perfect Fifth");
  assert_eq!(Interval::new(-7).name(), "Perfect Fifth");
  assert_eq!(Interval::new(19).name(), "Interval<19>");
  assert_eq!(Interval::new(19).abbreviation(), "?");
  assert_eq!(Interval::PERFECT_FOURTH.short_name(), "P4\u{2191}");
  assert_eq!(Interval::new(-5).short_name(), "P4\u{2193}");
}

#[test]
fn test_parse() {
  assert_eq!("P4".parse(), Ok(Interval::PERFECT_FOURTH));
  assert_eq!("m3".parse(), Ok(Interval::MINOR_THIRD));
  assert_eq!("M3".parse(), Ok(Interval::MAJOR_THIRD));
  assert_eq!("tritone".parse(), Ok(Interval::TRITONE));
  assert_eq!(" 8va ".parse(), Ok(Interval::OCTAVE));
  assert_eq!("-7".parse(), Ok(Interval::new(-7)));
  assert_eq!(
    "P9".parse::<Interval>(),
    Err(ParseError::Interval("P9".to_string()))
  );
}
