//! Run loop merging every clock and input source into one ordered stream.
//!
//! Producers (the instruction clock, the frame clock and the frontend's input
//! thread) send [`Event`]s into a single bounded channel. The [`Scheduler`]
//! is the only consumer and handles one event to completion before taking
//! the next, so a frame is always rendered between two whole instructions.

use std::io;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use typed_builder::TypedBuilder;

use crate::error::Result;
use crate::executor::{self, Outcome};
use crate::frontend::Frontend;
use crate::instruction::Instruction;
use crate::machine::Machine;
use crate::NUM_KEYS;

pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 500;
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 60;
/// Events queued beyond this make the clocks drop ticks instead of waiting.
pub const EVENT_QUEUE_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Instruction clock fired.
    Tick,
    /// Frame clock fired.
    Frame,
    /// Manual single step requested (debug mode).
    Step,
    KeyDown(u8),
    KeyUp(u8),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Debug mode, waiting for the next [`Event::Step`].
    AwaitingManualStep,
    /// `Fx0A` is waiting for a key to store in `V[register]`.
    AwaitingKey { register: usize },
    Stopped,
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct SchedulerConfig {
    #[builder(default = DEFAULT_INSTRUCTIONS_PER_SECOND)]
    pub instructions_per_second: u32,
    #[builder(default = DEFAULT_FRAMES_PER_SECOND)]
    pub frames_per_second: u32,
    /// Replace the instruction clock with manual steps.
    #[builder(default = false)]
    pub debug: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The channel every producer feeds and the scheduler drains.
pub fn event_channel() -> (SyncSender<Event>, Receiver<Event>) {
    mpsc::sync_channel(EVENT_QUEUE_DEPTH)
}

pub struct Scheduler<F: Frontend> {
    machine: Machine,
    listing: Vec<Instruction>,
    frontend: F,
    config: SchedulerConfig,
    state: RunState,
    executed: u64,
    frames: u64,
}

impl<F: Frontend> Scheduler<F> {
    pub fn new(machine: Machine, frontend: F, config: SchedulerConfig) -> Self {
        let listing = machine.listing();
        let state = if config.debug {
            RunState::AwaitingManualStep
        } else {
            RunState::Running
        };
        Scheduler {
            machine,
            listing,
            frontend,
            config,
            state,
            executed: 0,
            frames: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Start the periodic sources feeding `sender`: the frame clock always,
    /// the instruction clock only outside debug mode. The threads exit once
    /// the receiving end is dropped. A rate of zero is `InvalidInput`.
    pub fn spawn_clocks(&self, sender: &SyncSender<Event>) -> io::Result<Vec<JoinHandle<()>>> {
        let mut clocks = vec![spawn_clock(
            "chipterm_frame_clock",
            self.config.frames_per_second,
            Event::Frame,
            sender.clone(),
        )?];
        if !self.config.debug {
            clocks.push(spawn_clock(
                "chipterm_cpu_clock",
                self.config.instructions_per_second,
                Event::Tick,
                sender.clone(),
            )?);
        }
        Ok(clocks)
    }

    /// Handle events until a quit request, a closed channel or a fatal
    /// machine error. Returns the final machine state.
    pub fn run(mut self, events: Receiver<Event>) -> Result<Machine> {
        log::info!(
            "scheduler starting: {} instructions/s, {} frames/s, debug={}",
            self.config.instructions_per_second,
            self.config.frames_per_second,
            self.config.debug
        );
        self.start();
        while self.state != RunState::Stopped {
            let Ok(event) = events.recv() else {
                log::info!("all event sources closed");
                break;
            };
            if let Err(e) = self.handle(event) {
                log::error!("machine halted at {:#05x}: {}", self.machine.pc(), e);
                return Err(e);
            }
        }

        log::info!(
            "scheduler stopped after {} instructions and {} frames",
            self.executed,
            self.frames
        );
        self.state = RunState::Stopped;
        Ok(self.machine)
    }

    fn start(&mut self) {
        self.frontend.clear_display();
        if self.config.debug {
            self.frontend.log("DEBUG mode: press ENTER to cycle CPU instructions");
        }
    }

    /// Apply one event. Handlers always run to completion.
    pub fn handle(&mut self, event: Event) -> Result<()> {
        match (event, self.state) {
            (_, RunState::Stopped) => {}
            (Event::Quit, _) => {
                log::debug!("quit requested");
                self.state = RunState::Stopped;
            }
            (Event::Frame, _) => {
                self.frontend.render_frame(&self.machine, &self.listing);
                self.frames += 1;
            }
            (Event::KeyDown(key) | Event::KeyUp(key), _) if key as usize >= NUM_KEYS => {
                log::warn!("ignoring key {:#x} outside the keypad", key);
            }
            (Event::KeyDown(key), RunState::AwaitingKey { register }) => {
                self.machine.set_input(Some(key));
                self.machine.v_reg[register] = key;
                self.state = self.resume_state();
                log::debug!("key {:X} stored in V{:X}", key, register);
            }
            (Event::KeyDown(key), _) => self.machine.set_input(Some(key)),
            (Event::KeyUp(key), _) => {
                if self.machine.input() == Some(key) {
                    self.machine.set_input(None);
                }
            }
            (Event::Tick, RunState::Running) | (Event::Step, RunState::AwaitingManualStep) => {
                self.cycle()?;
            }
            (Event::Tick | Event::Step, _) => {}
        }
        Ok(())
    }

    fn cycle(&mut self) -> Result<()> {
        let ins = self.machine.fetch();
        let outcome = executor::step(&mut self.machine, &ins, &mut self.frontend)?;
        self.executed += 1;
        if let Outcome::WaitForKey { register } = outcome {
            log::debug!("waiting for a key for V{:X}", register);
            self.state = RunState::AwaitingKey { register };
        }
        Ok(())
    }

    fn resume_state(&self) -> RunState {
        if self.config.debug {
            RunState::AwaitingManualStep
        } else {
            RunState::Running
        }
    }
}

fn spawn_clock(
    name: &str,
    rate_hz: u32,
    event: Event,
    sender: SyncSender<Event>,
) -> io::Result<JoinHandle<()>> {
    if rate_hz == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} needs a rate above 0 Hz", name),
        ));
    }
    let period = Duration::from_secs(1) / rate_hz;
    thread::Builder::new()
        .name(name.into())
        .spawn(move || clock_loop(period, event, sender))
}

fn clock_loop(period: Duration, event: Event, sender: SyncSender<Event>) {
    let mut next = Instant::now() + period;
    loop {
        let now = Instant::now();
        if next > now {
            spin_sleep::sleep(next - now);
        }
        match sender.try_send(event) {
            // a full queue means the consumer is behind; drop this tick
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
        next += period;
        let now = Instant::now();
        if now > next + period {
            // don't burst to catch up after a stall
            next = now + period;
        }
    }
    log::trace!("{:?} clock stopped", event);
}
