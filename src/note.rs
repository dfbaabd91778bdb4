use crate::interval::Interval;

const PITCH_CLASS_NAMES: [&str; 12] = [
  "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// An absolute pitch, numbered like MIDI (middle C is 60).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Note(i64);

impl Note {
  pub const MIDDLE_C: Note = Note(60);
  /// Lowest note a question may use: an octave and a fifth below middle C.
  pub const LOWEST: Note = Note(60 - 12 - 7);
  /// Highest note a question may use: an octave and a fifth above middle C.
  pub const HIGHEST: Note = Note(60 + 12 + 7);

  pub const fn from_midi(number: i64) -> Self {
    Note(number)
  }
  pub fn number(self) -> i64 {
    self.0
  }
  pub fn offset(self, interval: Interval) -> Self {
    Note(self.0 + interval.half_steps())
  }
  pub fn interval_to(self, other: Note) -> Interval {
    Interval::new(other.0 - self.0)
  }
  pub fn octave(self) -> i64 {
    self.0.div_euclid(12) - 1
  }
  pub fn pitch_class_name(self) -> &'static str {
    PITCH_CLASS_NAMES[self.0.rem_euclid(12) as usize]
  }
  pub fn midi(self) -> u8 {
    if self.0 < 0 || self.0 > 127 {
      panic!("midi note out of range");
    }
    self.0 as u8
  }
}

impl std::fmt::Display for Note {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}{}", self.pitch_class_name(), self.octave())
  }
}

#[test]
fn test_note() {
  assert_eq!(Note::MIDDLE_C.to_string(), "C4");
  assert_eq!(Note::LOWEST.to_string(), "F2");
  assert_eq!(Note::HIGHEST.to_string(), "G5");
  assert_eq!(Note::from_midi(59).to_string(), "B3");
  assert_eq!(Note::MIDDLE_C.offset(Interval::new(-3)), Note::from_midi(57));
  assert_eq!(Note::LOWEST.interval_to(Note::HIGHEST), Interval::new(38));
  assert_eq!(Note::HIGHEST.midi(), 79);
}
