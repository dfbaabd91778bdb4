use crate::note::Note;
use crate::stream::Stream;
pub use midi::{Channel, Message};
use midi::{RawMessage, ToRawMessages};
use std::time::Duration;

const VELOCITY: u8 = 90;

pub trait MessageExt {
  fn encode(&self) -> Vec<u8>;
}

impl MessageExt for Message {
  fn encode(&self) -> Vec<u8> {
    let mut dest = Vec::new();
    for msg in self.to_raw_messages().into_iter() {
      match msg {
        RawMessage::Status(a) => dest.extend_from_slice(&[a | 0x80]),
        RawMessage::StatusData(a, b) => dest.extend_from_slice(&[a | 0x80, b]),
        RawMessage::StatusDataData(a, b, c) => dest.extend_from_slice(&[a | 0x80, b, c]),
        RawMessage::Raw(a) => dest.extend_from_slice(&[a]),
      }
    }
    dest
  }
}

/// Silences the channel, selects `program`, then plays each note for one beat.
pub fn phrase_messages(
  channel: Channel,
  program: u8,
  notes: Vec<Note>,
  beat: Duration,
) -> Stream<'static, Message> {
  Stream::immediate(Message::AllSoundOff(channel))
    .chain(Stream::immediate(Message::ProgramChange(channel, program)))
    .chain(Stream::sequence(
      notes,
      beat,
      move |note: &Note| Message::NoteOn(channel, note.midi(), VELOCITY),
      move |note: &Note| Message::NoteOff(channel, note.midi(), VELOCITY),
    ))
}

#[test]
fn test_phrase_messages() {
  let beat = Duration::from_millis(750);
  let notes = vec![Note::MIDDLE_C, Note::from_midi(67)];
  let encoded: Vec<_> = phrase_messages(Channel::Ch1, 4, notes, beat)
    .into_iter()
    .map(|(delay, message)| (delay.as_millis(), message.encode()))
    .collect();
  assert_eq!(
    encoded,
    vec![
      (0, Message::AllSoundOff(Channel::Ch1).encode()),
      (0, Message::ProgramChange(Channel::Ch1, 4).encode()),
      (0, Message::NoteOn(Channel::Ch1, 60, VELOCITY).encode()),
      (750, Message::NoteOff(Channel::Ch1, 60, VELOCITY).encode()),
      (0, Message::NoteOn(Channel::Ch1, 67, VELOCITY).encode()),
      (750, Message::NoteOff(Channel::Ch1, 67, VELOCITY).encode()),
    ]
  );
}
