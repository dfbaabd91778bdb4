use crate::error::ParseError;
use crate::interval::Interval;
use std::collections::BTreeSet;
use std::str::FromStr;

const OCTAVE: i64 = 12;
const ALL_BITS: u16 = (1 << OCTAVE) - 1;

/// A set of pitch classes relative to a tonic, as a 12-bit mask. Bit 0 is
/// the tonic; the bit string reads from the tonic upwards, so it is the mask
/// written lowest bit first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Scale {
  bits: u16,
}

impl Scale {
  pub const DEFAULT: Scale = Scale::PENTATONIC;
  pub const MAJOR: Scale = Scale { bits: 0b1010_1011_0101 };
  pub const PENTATONIC: Scale = Scale { bits: 0b0010_1001_0101 };
  pub const BLUES: Scale = Scale { bits: 0b0100_1110_1101 };
  pub const HARMONIC_MINOR: Scale = Scale { bits: 0b1001_1010_1101 };
  pub const CHROMATIC: Scale = Scale { bits: ALL_BITS };

  /// Labelled scales for a menu, in display order.
  pub fn catalog() -> &'static [(&'static str, Scale)] {
    &[
      ("Pentatonic", Scale::PENTATONIC),
      ("Blues", Scale::BLUES),
      ("Major / Natural Minor", Scale::MAJOR),
      ("Harmonic Minor", Scale::HARMONIC_MINOR),
      ("Chromatic", Scale::CHROMATIC),
    ]
  }

  pub fn from_bit_string(bit_string: &str) -> Result<Self, ParseError> {
    if bit_string.chars().count() != OCTAVE as usize {
      return Err(ParseError::Scale(bit_string.to_string()));
    }
    let mut bits = 0;
    for (i, c) in bit_string.chars().enumerate() {
      match c {
        '1' => bits |= 1 << i,
        '0' => {}
        _ => return Err(ParseError::Scale(bit_string.to_string())),
      }
    }
    Ok(Scale { bits })
  }

  /// Folds absolute notes into pitch classes relative to `tonic`.
  pub fn from_notes<I: IntoIterator<Item = i64>>(tonic: i64, notes: I) -> Self {
    let bits = notes
      .into_iter()
      .fold(0, |bits, note| bits | 1 << pitch_class(note - tonic));
    Scale { bits }
  }

  /// Builds a scale from the half-steps between its degrees, which must
  /// cover exactly one octave.
  pub fn from_steps(steps: &[i64]) -> Self {
    assert_eq!(steps.iter().sum::<i64>(), OCTAVE);
    let notes = steps.iter().scan(0, |note, step| {
      let current = *note;
      *note += step;
      Some(current)
    });
    Self::from_notes(0, notes)
  }

  pub fn bit_string(&self) -> String {
    (0..OCTAVE)
      .map(|i| if self.bits & 1 << i != 0 { '1' } else { '0' })
      .collect()
  }

  pub fn len(&self) -> usize {
    self.bits.count_ones() as usize
  }
  pub fn is_empty(&self) -> bool {
    self.bits == 0
  }

  /// True if the note `half_steps` above the tonic (any octave) is in the scale.
  pub fn contains_from_tonic(&self, half_steps: i64) -> bool {
    self.bits & 1 << pitch_class(half_steps) != 0
  }

  pub fn rotate(&self, interval: Interval) -> Self {
    let n = pitch_class(interval.half_steps()) as u32;
    Scale {
      bits: (self.bits << n | self.bits >> ((OCTAVE as u32 - n) % OCTAVE as u32)) & ALL_BITS,
    }
  }

  /// The distinct rotations of this scale. Stops at the first repeat, so a
  /// symmetric scale yields fewer than twelve.
  pub fn rotations(&self) -> BTreeSet<Scale> {
    let mut result = BTreeSet::new();
    let mut current = *self;
    while result.insert(current) {
      current = current.rotate(Interval::MINOR_SECOND);
    }
    result
  }

  pub fn contains_without_rotation(&self, candidate: &Scale) -> bool {
    self.bits | candidate.bits == self.bits
  }

  /// True if `candidate`, transposed to some pitch, fits inside this scale.
  pub fn contains_anywhere(&self, candidate: &Scale) -> bool {
    candidate
      .rotations()
      .iter()
      .any(|rotation| self.contains_without_rotation(rotation))
  }

  /// True if two notes of the scale are `interval` apart (modulo octaves).
  pub fn contains_interval_anywhere(&self, interval: Interval) -> bool {
    self.contains_anywhere(&Scale::from_notes(0, vec![0, interval.half_steps()]))
  }
}

impl Default for Scale {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl std::fmt::Display for Scale {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Scale({})", self.bit_string())
  }
}

/// Accepts a bit string or a catalog name (`major`, `pentatonic`, `blues`,
/// `harmonic-minor`, `chromatic`).
impl FromStr for Scale {
  type Err = ParseError;
  fn from_str(s: &str) -> Result<Self, ParseError> {
    match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
      "major" | "minor" => Ok(Scale::MAJOR),
      "pentatonic" => Ok(Scale::PENTATONIC),
      "blues" => Ok(Scale::BLUES),
      "harmonic-minor" => Ok(Scale::HARMONIC_MINOR),
      "chromatic" => Ok(Scale::CHROMATIC),
      other => Self::from_bit_string(other),
    }
  }
}

fn pitch_class(half_steps: i64) -> i64 {
  half_steps.rem_euclid(OCTAVE)
}

#[cfg(test)]
fn scale(bit_string: &str) -> Scale {
  Scale::from_bit_string(bit_string).unwrap()
}

#[test]
fn test_bit_string_round_trip() {
  for bits in 0..=ALL_BITS {
    let pattern = Scale { bits }.bit_string();
    assert_eq!(scale(&pattern).bit_string(), pattern);
  }
  assert_eq!(Scale::MAJOR.bit_string(), "101011010101");
  assert_eq!(Scale::PENTATONIC.bit_string(), "101010010100");
  assert_eq!(Scale::BLUES.bit_string(), "101101110010");
  assert_eq!(Scale::HARMONIC_MINOR.bit_string(), "101101011001");
  assert!(Scale::from_bit_string("10101").is_err());
  assert!(Scale::from_bit_string("10101101010x").is_err());
}

#[test]
fn test_from_steps() {
  assert_eq!(Scale::from_steps(&[2, 2, 1, 2, 2, 2, 1]), Scale::MAJOR);
  assert_eq!(Scale::from_steps(&[2, 2, 3, 2, 3]), Scale::PENTATONIC);
  assert_eq!(Scale::from_notes(60, vec![60, 65, 72]).bit_string(), "100001000000");
}

#[test]
fn test_rotate() {
  let check = |input: &str, expected: &str, interval: Interval| {
    assert_eq!(scale(input).rotate(interval).bit_string(), expected);
  };
  check("100000000000", "100000000000", Interval::UNISON);
  check("100000000000", "010000000000", Interval::MINOR_SECOND);
  check("100000000000", "000000000001", Interval::MAJOR_SEVENTH);
  check("100000000000", "100000000000", Interval::OCTAVE);
  check("100000000000", "010000000000", Interval::OCTAVE.up());
  check("000000000001", "100000000000", Interval::MINOR_SECOND);
  check("000000000001", "000000000010", Interval::MINOR_SECOND.reverse());
  check("100000000000", "000000000001", Interval::MINOR_SECOND.reverse());
  check("000000000001", "100000000000", Interval::MAJOR_SEVENTH.reverse());
  check("000000000001", "000000000001", Interval::OCTAVE.reverse());
  check("000000000001", "000000000010", Interval::OCTAVE.up().reverse());
}

#[test]
fn test_rotate_inverse() {
  for (_, s) in Scale::catalog() {
    for half_steps in -25..=25 {
      let x = Interval::new(half_steps);
      assert_eq!(s.rotate(x).rotate(x.reverse()), *s);
    }
  }
}

#[test]
fn test_rotations() {
  let bit_strings = |s: Scale| s.rotations().iter().map(Scale::bit_string).collect::<Vec<_>>();
  assert_eq!(bit_strings(scale("100000000000")).len(), 12);
  assert_eq!(
    bit_strings(scale("101010101010")),
    vec!["101010101010", "010101010101"]
  );
  assert_eq!(bit_strings(Scale::CHROMATIC), vec!["111111111111"]);
  assert_eq!(Scale::MAJOR.rotations().len(), 12);
}

#[test]
fn test_contains_interval_anywhere() {
  assert!(!Scale::PENTATONIC.contains_interval_anywhere(Interval::MINOR_SECOND));
  assert!(Scale::PENTATONIC.contains_interval_anywhere(Interval::MAJOR_SECOND));
  for bits in 0..=ALL_BITS {
    let s = Scale { bits };
    for half_steps in -13i64..=13 {
      let distance = half_steps.rem_euclid(OCTAVE);
      let brute_force = (0..OCTAVE).any(|low| {
        s.contains_from_tonic(low) && s.contains_from_tonic(low + distance)
      });
      assert_eq!(
        s.contains_interval_anywhere(Interval::new(half_steps)),
        brute_force,
        "{} {}",
        s,
        half_steps
      );
    }
  }
}

#[test]
fn test_parse() {
  assert_eq!("Major".parse(), Ok(Scale::MAJOR));
  assert_eq!("harmonic_minor".parse(), Ok(Scale::HARMONIC_MINOR));
  assert_eq!("100001000000".parse::<Scale>().map(|s| s.len()), Ok(2));
  assert!("dorian".parse::<Scale>().is_err());
}
