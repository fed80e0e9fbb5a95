//! Scripted key streams
//!
//! A replay script drives a processor on a virtual clock, one step per line:
//!
//! ```text
//! # scroll, then jump to the top
//! press jjj
//! down j
//! wait 350
//! up j
//! press g
//! wait 1200
//! mode insert
//! ```

use std::fmt;
use std::time::Duration;

use crate::keymap::{Dispatch, KeyProcessor, NormalizedKey};

/// One line of a replay script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    /// Keydown followed by keyup for every key in the notation
    Press(String),
    Down(String),
    Up(String),
    Wait(Duration),
    Mode(String),
}

/// What happened during a replay, stamped with the virtual time
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEntry {
    pub at: Duration,
    pub event: ReplayEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    Dispatched(Dispatch<String>),
    /// Key passed through to the host
    Forwarded(String),
    ModeChanged(String),
}

impl fmt::Display for ReplayEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}ms  ", self.at.as_millis())?;
        match &self.event {
            ReplayEvent::Dispatched(d) => {
                write!(f, "{} [{}]", d.action, d.sequence.join(" "))?;
                if d.repeat {
                    write!(f, " (repeat)")?;
                }
                Ok(())
            }
            ReplayEvent::Forwarded(key) => write!(f, "forward {}", key),
            ReplayEvent::ModeChanged(mode) => write!(f, "mode {}", mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ReplayError {}

/// Parse a replay script
pub fn parse_script(source: &str) -> Result<Vec<ReplayStep>, ReplayError> {
    let mut steps = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let error = |message: String| ReplayError {
            line: index + 1,
            message,
        };

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };
        if arg.is_empty() {
            return Err(error(format!("`{}` needs an argument", command)));
        }

        let step = match command {
            "press" => ReplayStep::Press(arg.to_string()),
            "down" => ReplayStep::Down(arg.to_string()),
            "up" => ReplayStep::Up(arg.to_string()),
            "mode" => ReplayStep::Mode(arg.to_string()),
            "wait" => {
                let ms: u64 = arg
                    .parse()
                    .map_err(|_| error(format!("invalid wait duration {:?}", arg)))?;
                ReplayStep::Wait(Duration::from_millis(ms))
            }
            other => return Err(error(format!("unknown command {:?}", other))),
        };
        steps.push(step);
    }

    Ok(steps)
}

/// Run steps against a processor and collect what it did
pub fn run(processor: &mut KeyProcessor<String>, steps: &[ReplayStep]) -> Vec<ReplayEntry> {
    let mut entries = Vec::new();

    for step in steps {
        tracing::trace!("Replay step {:?}", step);
        match step {
            ReplayStep::Press(notation) => {
                for key in processor.parser().parse_key_sequence(notation) {
                    keydown(processor, key.clone(), &mut entries);
                    processor.key_up(&key);
                }
            }
            ReplayStep::Down(notation) => {
                for key in processor.parser().parse_key_sequence(notation) {
                    keydown(processor, key, &mut entries);
                }
            }
            ReplayStep::Up(notation) => {
                for key in processor.parser().parse_key_sequence(notation) {
                    processor.key_up(&key);
                }
            }
            ReplayStep::Wait(duration) => {
                entries.extend(processor.advance_timed(*duration).into_iter().map(
                    |(at, dispatch)| ReplayEntry {
                        at,
                        event: ReplayEvent::Dispatched(dispatch),
                    },
                ));
            }
            ReplayStep::Mode(mode) => {
                processor.set_mode(mode);
                entries.push(ReplayEntry {
                    at: processor.now(),
                    event: ReplayEvent::ModeChanged(mode.clone()),
                });
            }
        }
    }

    entries
}

fn keydown(
    processor: &mut KeyProcessor<String>,
    key: NormalizedKey,
    entries: &mut Vec<ReplayEntry>,
) {
    let name = key.notation();
    let outcome = processor.process_key(key);
    let at = processor.now();

    if let Some(dispatch) = outcome.dispatch {
        entries.push(ReplayEntry {
            at,
            event: ReplayEvent::Dispatched(dispatch),
        });
    }
    if !outcome.consumed {
        entries.push(ReplayEntry {
            at,
            event: ReplayEvent::Forwarded(name),
        });
    }
}
