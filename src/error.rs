use thiserror::Error;

pub type Result<T> = std::result::Result<T, Unavailable>;

/// The one runtime failure: something the caller asked for can't be produced
/// right now. The UI is expected to beep and log, then carry on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Unavailable {
  #[error("unavailable: no intervals are enabled in the current scale")]
  NoIntervals,

  #[error("unavailable: no {note_count}-note phrase fits the playable range")]
  NoPhrase { note_count: usize },

  #[error("unavailable: playback failed: {0}")]
  Playback(String),
}

/// Rejected configuration text (command line, menus).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
  #[error("bad scale: {0:?} (expected a catalog name or 12 characters of 0 and 1)")]
  Scale(String),

  #[error("unknown interval: {0:?}")]
  Interval(String),

  #[error("unknown direction: {0:?} (expected up, down or both)")]
  Direction(String),
}
