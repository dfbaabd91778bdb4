//! Ear-training exercises: random melodic phrases built from a chosen set of
//! intervals and a scale, asked one interval at a time and scored per phrase.

pub mod chooser;
pub mod error;
pub mod filter;
pub mod interval;
pub mod midi;
pub mod note;
pub mod phrase;
pub mod player;
pub mod quiz;
pub mod scale;
pub mod score;
pub mod search;
pub mod seed;
pub mod stream;

pub use chooser::{Question, QuestionChooser};
pub use error::{ParseError, Result, Unavailable};
pub use filter::{DirectionFilter, IntervalFilter};
pub use interval::Interval;
pub use note::Note;
pub use phrase::Phrase;
pub use player::{MidiPlayer, MidiSettings, Player, SilentPlayer};
pub use quiz::{IntervalChoices, Quizzer};
pub use scale::Scale;
pub use score::ScoreKeeper;
pub use seed::Seed;
