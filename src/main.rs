use clap::Parser;
use eartrainer::{
  DirectionFilter, Interval, MidiPlayer, MidiSettings, Player, QuestionChooser, Quizzer, Scale,
  ScoreKeeper, Seed, SilentPlayer, Unavailable,
};
use itertools::Itertools;
use std::cell::Cell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Name the intervals in short random melodies.
#[derive(Debug, Parser)]
#[command(name = "eartrainer", version)]
struct Args {
  /// Seed for a reproducible session (random if omitted)
  #[arg(long, env = "EARTRAINER_SEED")]
  seed: Option<u64>,

  /// Notes per phrase
  #[arg(long, env = "EARTRAINER_NOTES", default_value_t = 2)]
  notes: usize,

  /// Scale: major, pentatonic, blues, harmonic-minor, chromatic, or a
  /// 12-character pattern like 101011010101
  #[arg(long, env = "EARTRAINER_SCALE", default_value = "pentatonic")]
  scale: Scale,

  /// Direction of the intervals: up, down or both
  #[arg(long, env = "EARTRAINER_DIRECTION", default_value = "up")]
  direction: DirectionFilter,

  /// Interval to practice, e.g. P4 or "minor third" (repeatable; default P4 and P5)
  #[arg(long = "interval", env = "EARTRAINER_INTERVALS", value_delimiter = ',')]
  intervals: Vec<Interval>,

  /// Use the first MIDI output port whose name starts with this
  #[arg(long, env = "EARTRAINER_PORT", default_value = "FLUID")]
  port: String,

  /// General MIDI program (instrument) to play with
  #[arg(long, env = "EARTRAINER_PROGRAM", default_value_t = 4)]
  program: u8,

  /// Playback tempo in beats per minute
  #[arg(long, env = "EARTRAINER_TEMPO", default_value_t = 80)]
  tempo: u32,

  /// Don't open a MIDI port; print the notes instead
  #[arg(long)]
  silent: bool,
}

const HELP: &str = "answer with an interval (P4, m3, tritone, 7, ...), \
  or: r = replay, s = skip, d = change direction, t = score table, \
  p N = play row N, q = quit";

fn open_player(args: &Args) -> Box<dyn Player> {
  if args.silent {
    return Box::new(SilentPlayer);
  }
  let settings = MidiSettings {
    port_prefix: args.port.clone(),
    program: args.program,
    beats_per_minute: args.tempo,
    ..MidiSettings::default()
  };
  match MidiPlayer::open(settings) {
    Ok(player) => Box::new(player),
    Err(e) => {
      alert(&e);
      eprintln!("continuing without sound");
      Box::new(SilentPlayer)
    }
  }
}

fn alert(e: &Unavailable) {
  warn!(error = %e, "unavailable");
  eprintln!("\x07{}", e);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();
  let label = args.seed.unwrap_or_else(Seed::random_label);
  info!(seed = label, "starting session");

  let mut chooser = QuestionChooser::new(Seed::new(label).fork("questions").rng());
  chooser.set_scale(args.scale);
  chooser.set_direction(args.direction);
  chooser.set_note_count(args.notes);
  if !args.intervals.is_empty() {
    let defaults: Vec<_> = chooser.interval_filter().iter().collect();
    for interval in defaults {
      chooser.set_interval_allowed(interval, false);
    }
    for &interval in &args.intervals {
      chooser.set_interval_allowed(interval, true);
    }
  }

  let mut quizzer = Quizzer::new(chooser, ScoreKeeper::new(), open_player(&args));
  let answered = Rc::new(Cell::new(false));
  let scored = Rc::new(Cell::new(false));
  let flag = answered.clone();
  quizzer.on_answer_chosen(move || flag.set(true));
  let flag = scored.clone();
  quizzer.scores_mut().on_change(move || flag.set(true));

  println!("{}", HELP);
  if let Err(e) = quizzer.start_question() {
    alert(&e);
  }
  let stdin = io::stdin();
  loop {
    if quizzer.is_started() {
      print!("{} {}> ", quizzer.question_text(), quizzer.phrase_so_far());
    } else {
      print!("(no question; s to try again)> ");
    }
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.lock().read_line(&mut line)? == 0 {
      break;
    }
    let line = line.trim();
    let result = match line {
      "" => Ok(()),
      "q" | "quit" => break,
      "?" | "h" | "help" => {
        println!("{}", HELP);
        let live = Interval::all_named()
          .filter(|&interval| quizzer.allows(interval))
          .map(|interval| interval.abbreviation())
          .join(" ");
        println!("choices: {}", live);
        println!("scales for --scale (a pattern, or a name like harmonic-minor):");
        for (name, scale) in Scale::catalog() {
          println!("  {:24} {}", name, scale.bit_string());
        }
        Ok(())
      }
      "r" => quizzer.replay(),
      "d" => {
        let direction = quizzer.chooser().direction().next();
        quizzer.chooser_mut().set_direction(direction);
        println!("direction: {}", direction);
        quizzer.start_question()
      }
      "s" => quizzer.start_question(),
      "t" => {
        for (i, row) in quizzer.scores().rows().enumerate() {
          let phrase = row.phrase().to_string();
          println!("{:3}  {:24} {:3} right {:3} wrong", i + 1, phrase, row.right(), row.wrong());
        }
        Ok(())
      }
      _ if line.starts_with("p ") => {
        let phrase = line[2..]
          .trim()
          .parse::<usize>()
          .ok()
          .and_then(|n| quizzer.scores().rows().nth(n.wrapping_sub(1)))
          .map(|row| row.phrase().clone());
        match phrase {
          Some(phrase) => quizzer.play_scored(&phrase),
          None => {
            println!("no such row");
            Ok(())
          }
        }
      }
      _ => match line.parse::<Interval>() {
        Ok(interval) if !quizzer.is_started() => {
          println!("no question in progress ({})", interval);
          Ok(())
        }
        Ok(interval) if !quizzer.allows(interval.to_ascending()) => {
          println!("{} is not a choice right now", interval.to_ascending());
          Ok(())
        }
        Ok(interval) => quizzer.check_answer(interval.to_ascending()),
        Err(e) => {
          println!("{}", e);
          Ok(())
        }
      },
    };
    if let Err(e) = result {
      alert(&e);
    }
    if answered.replace(false) && scored.get() {
      println!("{}", quizzer.score_summary());
    }
    scored.set(false);
  }

  quizzer.shutdown();
  Ok(())
}
