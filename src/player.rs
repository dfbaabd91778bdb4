use crate::error::{Result, Unavailable};
use crate::midi::{phrase_messages, Channel, Message, MessageExt};
use crate::note::Note;
use crate::phrase::Phrase;
use midir::{MidiOutput, MidiOutputConnection};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where phrases get played. `play` replaces whatever is sounding and
/// returns without waiting for the phrase to finish.
pub trait Player {
  fn play(&mut self, phrase: &Phrase, start: Note) -> Result<()>;
  fn shutdown(&mut self);
}

impl<P: Player + ?Sized> Player for Box<P> {
  fn play(&mut self, phrase: &Phrase, start: Note) -> Result<()> {
    (**self).play(phrase, start)
  }
  fn shutdown(&mut self) {
    (**self).shutdown()
  }
}

/// Logs instead of playing; for running without a synthesizer.
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl Player for SilentPlayer {
  fn play(&mut self, phrase: &Phrase, start: Note) -> Result<()> {
    debug!(%phrase, %start, "play (silent)");
    Ok(())
  }
  fn shutdown(&mut self) {}
}

#[derive(Clone, Debug)]
pub struct MidiSettings {
  pub client_name: String,
  /// First output port whose name starts with this is used.
  pub port_prefix: String,
  /// General MIDI program (instrument) number.
  pub program: u8,
  pub beats_per_minute: u32,
}

impl Default for MidiSettings {
  fn default() -> Self {
    Self {
      client_name: "eartrainer".to_string(),
      port_prefix: "FLUID".to_string(),
      program: 4,
      beats_per_minute: 80,
    }
  }
}

enum Command {
  Play(Vec<Note>),
  Shutdown,
}

const CHANNEL: Channel = Channel::Ch1;

/// Plays through a MIDI output port. The port is owned by a worker thread so
/// that timing a phrase never blocks the caller.
pub struct MidiPlayer {
  commands: Sender<Command>,
  worker: Option<JoinHandle<()>>,
}

impl MidiPlayer {
  pub fn open(settings: MidiSettings) -> Result<Self> {
    let (ready_tx, ready_rx) = mpsc::channel();
    let (commands, inbox) = mpsc::channel();
    let worker = thread::Builder::new()
      .name("midi-playback".to_string())
      .spawn(move || match connect(&settings) {
        Ok(conn) => {
          let _ = ready_tx.send(Ok(()));
          run(conn, inbox, &settings);
        }
        Err(e) => {
          let _ = ready_tx.send(Err(e));
        }
      })
      .map_err(|e| Unavailable::Playback(e.to_string()))?;
    match ready_rx.recv() {
      Ok(Ok(())) => Ok(Self {
        commands,
        worker: Some(worker),
      }),
      Ok(Err(e)) => {
        let _ = worker.join();
        Err(Unavailable::Playback(e))
      }
      Err(_) => Err(Unavailable::Playback("playback thread exited".to_string())),
    }
  }
}

impl Player for MidiPlayer {
  fn play(&mut self, phrase: &Phrase, start: Note) -> Result<()> {
    debug!(%phrase, %start, "play");
    self
      .commands
      .send(Command::Play(phrase.notes(start)))
      .map_err(|_| Unavailable::Playback("playback thread has stopped".to_string()))
  }
  fn shutdown(&mut self) {
    if let Some(worker) = self.worker.take() {
      let _ = self.commands.send(Command::Shutdown);
      if worker.join().is_err() {
        warn!("playback thread panicked");
      }
    }
  }
}

impl Drop for MidiPlayer {
  fn drop(&mut self) {
    self.shutdown();
  }
}

fn connect(settings: &MidiSettings) -> std::result::Result<MidiOutputConnection, String> {
  let output = MidiOutput::new(&settings.client_name).map_err(|e| e.to_string())?;
  let ports = output.ports();
  let port = ports
    .iter()
    .find(|port| {
      output
        .port_name(port)
        .map_or(false, |name| name.starts_with(&settings.port_prefix))
    })
    .ok_or_else(|| format!("no MIDI output port starting with {:?}", settings.port_prefix))?;
  let name = output.port_name(port).unwrap_or_default();
  let conn = output
    .connect(port, "eartrainer_port")
    .map_err(|e| e.to_string())?;
  info!(port = %name, "connected to MIDI output");
  Ok(conn)
}

fn run(mut conn: MidiOutputConnection, inbox: Receiver<Command>, settings: &MidiSettings) {
  let beat = Duration::from_secs(60) / settings.beats_per_minute.max(1);
  let mut next = inbox.recv().ok();
  while let Some(command) = next.take() {
    match command {
      Command::Shutdown => break,
      Command::Play(notes) => {
        next = perform(&mut conn, &inbox, notes, settings.program, beat);
        if next.is_none() {
          next = inbox.recv().ok();
        }
      }
    }
  }
  send(&mut conn, &Message::AllSoundOff(CHANNEL));
  conn.close();
}

// Returns the command that interrupted playback, if any.
fn perform(
  conn: &mut MidiOutputConnection,
  inbox: &Receiver<Command>,
  notes: Vec<Note>,
  program: u8,
  beat: Duration,
) -> Option<Command> {
  for (delay, message) in phrase_messages(CHANNEL, program, notes, beat) {
    match inbox.recv_timeout(delay) {
      Ok(command) => return Some(command),
      Err(RecvTimeoutError::Timeout) => {}
      Err(RecvTimeoutError::Disconnected) => return None,
    }
    send(conn, &message);
  }
  None
}

fn send(conn: &mut MidiOutputConnection, message: &Message) {
  if let Err(e) = conn.send(&message.encode()) {
    warn!(error = %e, "failed to send MIDI message");
  }
}

#[test]
fn test_silent_player() {
  let mut player: Box<dyn Player> = Box::new(SilentPlayer);
  let phrase = Phrase::new(vec![crate::interval::Interval::PERFECT_FOURTH]);
  assert_eq!(player.play(&phrase, Note::MIDDLE_C), Ok(()));
  player.shutdown();
}
