use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chipterm_chip8::scheduler::{
    event_channel, DEFAULT_FRAMES_PER_SECOND, DEFAULT_INSTRUCTIONS_PER_SECOND,
};
use chipterm_chip8::{decode, Font, Machine, Scheduler, SchedulerConfig, START_ADDRESS};
use chipterm_tui::{spawn_input, Keymap, TuiFrontend};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "chipterm", version, about = "Run a CHIP-8 program in the terminal")]
pub struct Options {
    /// Program image, loaded at 0x200.
    #[arg(value_name = "ROM")]
    pub rom: PathBuf,

    /// Execute one instruction per ENTER instead of running the clock.
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Instruction clock rate.
    #[arg(
        long,
        default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub ips: u32,

    /// Display refresh rate.
    #[arg(
        long,
        default_value_t = DEFAULT_FRAMES_PER_SECOND,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub fps: u32,

    /// Text file with the 80 font bytes, one per line.
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Keymap::Literal)]
    pub keymap: Keymap,

    /// Write log output here; the terminal belongs to the UI.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else {
        // anything printed to stderr would tear through the alternate screen
        builder.filter_level(log::LevelFilter::Off);
    }
    builder.try_init()?;
    Ok(())
}

/// Build a machine from the font and program named in `options`.
pub fn load_machine(options: &Options) -> Result<Machine> {
    let font = match &options.font {
        Some(path) => Font::read(path)
            .with_context(|| format!("failed to load font {}", path.display()))?,
        None => Font::default(),
    };
    let rom = std::fs::read(&options.rom)
        .with_context(|| format!("failed to read program {}", options.rom.display()))?;

    let mut machine = Machine::new(&font);
    machine
        .load_program(&rom)
        .with_context(|| format!("failed to load program {}", options.rom.display()))?;
    log::info!("loaded {} ({} bytes)", options.rom.display(), rom.len());
    Ok(machine)
}

pub fn run(options: &Options) -> Result<()> {
    let machine = load_machine(options)?;
    let config = SchedulerConfig::builder()
        .instructions_per_second(options.ips)
        .frames_per_second(options.fps)
        .debug(options.debug)
        .build();

    let frontend = TuiFrontend::new()?;
    let scheduler = Scheduler::new(machine, frontend, config);

    let (sender, receiver) = event_channel();
    // detached: they exit on their own once the receiver is gone
    scheduler
        .spawn_clocks(&sender)
        .context("failed to start clock threads")?;
    spawn_input(sender, options.keymap, options.debug)
        .context("failed to start input thread")?;

    let machine = scheduler.run(receiver)?;
    log::info!("stopped at {:#05x}", machine.pc());
    Ok(())
}

/// One line per instruction word of `rom`, addressed as if loaded at 0x200.
/// A trailing odd byte is ignored.
pub fn disassemble(rom: &[u8]) -> Vec<String> {
    rom.chunks_exact(2)
        .enumerate()
        .map(|(i, word)| {
            let pc = START_ADDRESS.wrapping_add((i * 2) as u16);
            let ins = decode(word[0], word[1], pc);
            format!("{:#06x}:\t{:#06x}\t{}", pc, ins.word, ins)
        })
        .collect()
}
