//! Line-oriented operator console
//!
//! Reads one command per line and drives a [`StageController`]. Tag moves
//! run on a worker thread so that `!` is still read and sent while the
//! move is polling; the worker reports back over a channel and the result
//! is printed before the next prompt.

use anyhow::{anyhow, bail, Context};
use stagekit_core::Axis;
use stagekit_motion::{HomeOutcome, StageController};
use stagekit_settings::TagCatalog;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

const HELP: &str = "\
Commands:
  h            home (first time per connection), otherwise return to origin
  w / s        jog X + / -
  a / d        jog Y + / -
  q / e        jog Z + / -
  g X Y Z      absolute move
  t TAG        move to a catalog tag (XY first, then Z)
  p            read position from the controller
  !            feed hold
  ~            resume
  m            disable motors
  l            list catalog tags
  help         this text
  exit         disable motors and disconnect";

/// One console command
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// `h`: home, or return to origin once homed
    Home,
    /// `w/s/a/d/q/e`: relative move of one axis
    Jog(Axis, f64),
    /// `g X Y Z`: absolute move
    Goto(f64, f64, f64),
    /// `t TAG`: confirmed move to a catalog tag
    Tag(String),
    /// `p`: re-read the position from the firmware
    Position,
    /// `!`: feed hold
    Stop,
    /// `~`: cycle start
    Resume,
    /// `m`: de-energize the steppers
    DisableMotors,
    /// `l`: list catalog tags
    ListTags,
    /// `help`
    Help,
    /// `exit`: disable motors and disconnect
    Exit,
}

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse_command(line: &str, jog_step: f64) -> anyhow::Result<Option<ConsoleCommand>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_lowercase().as_str() {
        "h" => ConsoleCommand::Home,
        "w" => ConsoleCommand::Jog(Axis::X, jog_step),
        "s" => ConsoleCommand::Jog(Axis::X, -jog_step),
        "a" => ConsoleCommand::Jog(Axis::Y, jog_step),
        "d" => ConsoleCommand::Jog(Axis::Y, -jog_step),
        "q" => ConsoleCommand::Jog(Axis::Z, jog_step),
        "e" => ConsoleCommand::Jog(Axis::Z, -jog_step),
        "g" => {
            if rest.len() != 3 {
                bail!("usage: g X Y Z");
            }
            let mut values = [0.0; 3];
            for (slot, word) in values.iter_mut().zip(&rest) {
                *slot = word
                    .parse()
                    .with_context(|| format!("not a coordinate: {word}"))?;
            }
            ConsoleCommand::Goto(values[0], values[1], values[2])
        }
        "t" => match rest.as_slice() {
            [tag] => ConsoleCommand::Tag(tag.to_string()),
            _ => bail!("usage: t TAG"),
        },
        "p" => ConsoleCommand::Position,
        "!" => ConsoleCommand::Stop,
        "~" => ConsoleCommand::Resume,
        "m" => ConsoleCommand::DisableMotors,
        "l" => ConsoleCommand::ListTags,
        "help" | "?" => ConsoleCommand::Help,
        "exit" | "quit" => ConsoleCommand::Exit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

/// Command line of the `stagekit` binary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    /// Configuration file; `STAGEKIT_CONFIG` or the default path otherwise
    pub config: Option<PathBuf>,
    /// Tag catalog document
    pub catalog: Option<PathBuf>,
    /// Print candidate serial ports and exit
    pub list_ports: bool,
}

impl Options {
    /// Parse arguments without the program name
    pub fn parse<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Options::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                    options.config = Some(PathBuf::from(path));
                }
                "--catalog" | "-t" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--catalog needs a path"))?;
                    options.catalog = Some(PathBuf::from(path));
                }
                "--list-ports" | "-l" => options.list_ports = true,
                other => bail!("unexpected argument '{other}'"),
            }
        }
        Ok(options)
    }
}

/// Interactive session over one controller
pub struct Console {
    controller: Arc<StageController>,
    catalog: TagCatalog,
    jog_step: f64,
    worker: Option<JoinHandle<()>>,
    results_tx: Sender<String>,
    results_rx: Receiver<String>,
}

impl Console {
    /// Console over a connected controller; `jog_step` is the distance of one jog key
    pub fn new(controller: Arc<StageController>, catalog: TagCatalog, jog_step: f64) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            controller,
            catalog,
            jog_step,
            worker: None,
            results_tx,
            results_rx,
        }
    }

    /// Read commands until `exit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> anyhow::Result<()> {
        writeln!(out, "{HELP}")?;
        for line in input.lines() {
            let line = line.context("reading console input")?;
            self.drain_results(out)?;

            let command = match parse_command(&line, self.jog_step) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(out, "error: {e}")?;
                    continue;
                }
            };
            debug!(?command, "Console command");

            if command == ConsoleCommand::Exit {
                break;
            }
            if let Err(e) = self.execute(command, out) {
                writeln!(out, "error: {e}")?;
            }
        }
        self.shutdown(out)
    }

    fn execute<W: Write>(&mut self, command: ConsoleCommand, out: &mut W) -> anyhow::Result<()> {
        let controller = &self.controller;
        match command {
            ConsoleCommand::Home => match controller.go_home()? {
                HomeOutcome::Homed => writeln!(out, "homed, position {}", controller.position())?,
                HomeOutcome::ReturnedToOrigin(report) => {
                    writeln!(out, "returned to origin {}", report.target)?
                }
            },
            ConsoleCommand::Jog(axis, delta) => {
                let report = controller.jog(axis, delta)?;
                for warning in &report.warnings {
                    writeln!(out, "warning: {warning}")?;
                }
                writeln!(out, "commanded {}", report.target)?;
            }
            ConsoleCommand::Goto(x, y, z) => {
                let report = controller.move_to(Some(x), Some(y), Some(z))?;
                for warning in &report.warnings {
                    writeln!(out, "warning: {warning}")?;
                }
                writeln!(out, "commanded {}", report.target)?;
            }
            ConsoleCommand::Tag(tag) => {
                let location = self
                    .catalog
                    .get(&tag)
                    .ok_or_else(|| anyhow!("unknown tag '{tag}'"))?;
                self.spawn_tag_move(tag, location)?;
                writeln!(out, "moving...")?;
            }
            ConsoleCommand::Position => {
                let position = controller.refresh_position()?;
                writeln!(out, "position {position}")?;
            }
            ConsoleCommand::Stop => {
                controller.stop_all()?;
                writeln!(out, "feed hold sent; '~' to resume")?;
            }
            ConsoleCommand::Resume => {
                controller.resume()?;
                writeln!(out, "resumed")?;
            }
            ConsoleCommand::DisableMotors => {
                controller.disable_motors()?;
                writeln!(out, "motors disabled")?;
            }
            ConsoleCommand::ListTags => {
                if self.catalog.is_empty() {
                    writeln!(out, "no tags loaded")?;
                }
                for entry in self.catalog.entries() {
                    writeln!(out, "{:>8}  ({:.3}, {:.3}, {:.3})", entry.tag, entry.x, entry.y, entry.z)?;
                }
            }
            ConsoleCommand::Help => writeln!(out, "{HELP}")?,
            ConsoleCommand::Exit => {}
        }
        Ok(())
    }

    fn spawn_tag_move(&mut self, tag: String, location: (f64, f64, f64)) -> anyhow::Result<()> {
        if self.worker.as_ref().is_some_and(|w| !w.is_finished()) {
            bail!("a tag move is still running");
        }
        if let Some(finished) = self.worker.take() {
            if finished.join().is_err() {
                warn!("Previous tag move worker panicked");
            }
        }

        let controller = self.controller.clone();
        let results = self.results_tx.clone();
        let handle = std::thread::Builder::new()
            .name("tag-move".into())
            .spawn(move || {
                info!(tag = %tag, "Moving to tag");
                let message = match controller.move_to_tag(location) {
                    Ok(report) => format!("tag {tag} reached at {}", report.target),
                    Err(e) => format!("tag {tag} failed: {e}"),
                };
                // The console may already be gone.
                let _ = results.send(message);
            })
            .context("spawning tag move worker")?;
        self.worker = Some(handle);
        Ok(())
    }

    fn drain_results<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        for message in self.results_rx.try_iter() {
            writeln!(out, "{message}")?;
        }
        Ok(())
    }

    fn shutdown<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        if let Some(worker) = self.worker.take() {
            if !worker.is_finished() {
                writeln!(out, "waiting for the tag move to finish...")?;
            }
            if worker.join().is_err() {
                warn!("Tag move worker panicked");
            }
        }
        self.drain_results(out)?;

        if let Err(e) = self.controller.disable_motors() {
            debug!("Motors not disabled on exit: {}", e);
        }
        self.controller.disconnect();
        writeln!(out, "connection closed")?;
        Ok(())
    }
}
