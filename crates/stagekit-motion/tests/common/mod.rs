//! In-memory GRBL double for controller tests
//!
//! The double answers synchronously from inside `write_all`, so every
//! reply is buffered by the time the transport starts reading.

#![allow(dead_code)]

use parking_lot::Mutex;
use stagekit_communication::firmware::grbl::FirmwareParameter;
use stagekit_communication::{PortOpener, SerialLink, TransportOptions};
use stagekit_core::{Clock, ConnectionError, ManualClock, Position};
use stagekit_motion::{ControllerConfig, PollPolicy, StageController};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Something the firmware received
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Line(String),
    Realtime(char),
}

/// Scripted answer to one `?`
#[derive(Debug, Clone)]
pub enum Scripted {
    At(Position),
    Raw(String),
}

#[derive(Default)]
struct Sim {
    events: Vec<Event>,
    output: VecDeque<u8>,
    partial: Vec<u8>,
    position: Position,
    target: Position,
    statuses: VecDeque<Scripted>,
    stuck: bool,
    held: bool,
    rejected: Vec<(String, u8)>,
    fail_writes: bool,
}

impl Sim {
    fn reply(&mut self, line: &str) {
        self.output.extend(line.bytes());
        self.output.extend(b"\r\n");
    }

    fn status(&mut self) {
        self.events.push(Event::Realtime('?'));
        let line = match self.statuses.pop_front() {
            Some(Scripted::At(pos)) => {
                self.position = pos;
                format_status(self.state_name(), pos)
            }
            Some(Scripted::Raw(raw)) => raw,
            None => format_status(self.state_name(), self.position),
        };
        self.reply(&line);
    }

    fn state_name(&self) -> &'static str {
        if self.held {
            "Hold:0"
        } else {
            "Idle"
        }
    }

    fn line(&mut self, line: String) {
        self.events.push(Event::Line(line.clone()));

        if let Some(code) = self
            .rejected
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, code)| *code)
        {
            self.reply(&format!("error:{}", code));
            return;
        }

        if line == "$H" {
            self.position = Position::ORIGIN;
            self.target = Position::ORIGIN;
            self.reply("ok");
        } else if line == "$X" || line == "G92 X0 Y0 Z0" || line == "M84" {
            self.reply("ok");
        } else if line.starts_with('$') && line.contains('=') {
            self.reply("ok");
        } else if let Some(words) = line.strip_prefix("G0") {
            for word in words.split_whitespace() {
                let (letter, value) = word.split_at(1);
                let value: f64 = match value.parse() {
                    Ok(v) => v,
                    Err(_) => {
                        self.reply("error:2");
                        return;
                    }
                };
                match letter {
                    "X" => self.target.x = value,
                    "Y" => self.target.y = value,
                    "Z" => self.target.z = value,
                    _ => {
                        self.reply("error:20");
                        return;
                    }
                }
            }
            if !self.stuck {
                self.position = self.target;
            }
            self.reply("ok");
        } else {
            self.reply("error:20");
        }
    }
}

pub fn format_status(state: &str, pos: Position) -> String {
    format!(
        "<{}|MPos:{:.3},{:.3},{:.3}|FS:0,0>",
        state, pos.x, pos.y, pos.z
    )
}

/// Shared handle on the simulated firmware
#[derive(Clone, Default)]
pub struct SimulatedGrbl {
    inner: Arc<Mutex<Sim>>,
}

impl SimulatedGrbl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().events.clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Line(line) => Some(line),
                Event::Realtime(_) => None,
            })
            .collect()
    }

    pub fn motion_frames(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with("G0"))
            .collect()
    }

    pub fn realtime_count(&self, byte: char) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == Event::Realtime(byte))
            .count()
    }

    pub fn position_of(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn clear_events(&self) {
        self.inner.lock().events.clear();
    }

    pub fn script(&self, statuses: &[Scripted]) {
        self.inner.lock().statuses.extend(statuses.iter().cloned());
    }

    pub fn script_positions(&self, positions: &[(f64, f64, f64)]) {
        let statuses: Vec<Scripted> = positions
            .iter()
            .map(|p| Scripted::At(Position::from(*p)))
            .collect();
        self.script(&statuses);
    }

    pub fn set_stuck(&self, stuck: bool) {
        self.inner.lock().stuck = stuck;
    }

    pub fn set_position(&self, pos: Position) {
        self.inner.lock().position = pos;
    }

    pub fn reject(&self, prefix: &str, code: u8) {
        self.inner.lock().rejected.push((prefix.to_string(), code));
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    pub fn is_held(&self) -> bool {
        self.inner.lock().held
    }
}

struct SimLink {
    name: String,
    grbl: SimulatedGrbl,
}

impl SerialLink for SimLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut sim = self.grbl.inner.lock();
        if sim.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        for &byte in data {
            match byte {
                b'?' => sim.status(),
                b'!' => {
                    sim.events.push(Event::Realtime('!'));
                    sim.held = true;
                }
                b'~' => {
                    sim.events.push(Event::Realtime('~'));
                    sim.held = false;
                }
                b'\r' | b'\n' => {
                    let line = String::from_utf8_lossy(&sim.partial).trim().to_string();
                    sim.partial.clear();
                    if !line.is_empty() {
                        sim.line(line);
                    }
                }
                other => sim.partial.push(other),
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut sim = self.grbl.inner.lock();
        let n = buf.len().min(sim.output.len());
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        for slot in buf.iter_mut().take(n) {
            *slot = sim.output.pop_front().unwrap();
        }
        Ok(n)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.grbl.inner.lock().output.clear();
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn SerialLink>> {
        Ok(Box::new(SimLink {
            name: self.name.clone(),
            grbl: self.grbl.clone(),
        }))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Opens the simulated firmware on a fixed set of port names
pub struct SimOpener {
    available: Vec<String>,
    grbl: SimulatedGrbl,
    pub attempts: Mutex<Vec<String>>,
}

impl SimOpener {
    pub fn new(available: &[&str], grbl: SimulatedGrbl) -> Self {
        Self {
            available: available.iter().map(|s| s.to_string()).collect(),
            grbl,
            attempts: Mutex::new(Vec::new()),
        }
    }
}

impl PortOpener for SimOpener {
    fn open(&self, port: &str, _baud_rate: u32) -> Result<Box<dyn SerialLink>, ConnectionError> {
        self.attempts.lock().push(port.to_string());
        if self.available.iter().any(|p| p == port) {
            Ok(Box::new(SimLink {
                name: port.to_string(),
                grbl: self.grbl.clone(),
            }))
        } else {
            Err(ConnectionError::FailedToOpen {
                port: port.to_string(),
                reason: "No such file or directory".to_string(),
            })
        }
    }
}

pub const HOMING_SETTLE: Duration = Duration::from_millis(1500);
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const RESET_SETTLE: Duration = Duration::from_secs(2);

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        ports: vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()],
        transport: TransportOptions {
            reply_timeout: Duration::from_millis(20),
            reset_settle: RESET_SETTLE,
        },
        homing_settle: HOMING_SETTLE,
        poll: PollPolicy {
            interval: POLL_INTERVAL,
            max_polls: 10,
            tolerance: 0.01,
            protocol_retries: 3,
        },
        parameters: vec![
            FirmwareParameter::new(10, "1"),
            FirmwareParameter::new(110, "2000.000"),
        ],
        ..ControllerConfig::default()
    }
}

pub struct Harness {
    pub controller: Arc<StageController>,
    pub grbl: SimulatedGrbl,
    pub clock: Arc<ManualClock>,
    pub opener: Arc<SimOpener>,
}

/// Controller wired to the double; only `/dev/ttyUSB1` opens
pub fn harness(config: ControllerConfig) -> Harness {
    let grbl = SimulatedGrbl::new();
    let clock = Arc::new(ManualClock::new());
    let opener = Arc::new(SimOpener::new(&["/dev/ttyUSB1"], grbl.clone()));
    let controller = Arc::new(StageController::new(
        config,
        opener.clone() as Arc<dyn PortOpener>,
        clock.clone() as Arc<dyn Clock>,
    ));
    Harness {
        controller,
        grbl,
        clock,
        opener,
    }
}

/// Connected harness with the connect traffic cleared
pub fn connected(config: ControllerConfig) -> Harness {
    let h = harness(config);
    h.controller.connect().unwrap();
    h.grbl.clear_events();
    h
}
