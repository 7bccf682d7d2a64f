//! CHIP-8 virtual machine core: machine state, instruction decoding, the
//! opcode executor and the multi-rate clock scheduler that drives them.
//!
//! Rendering and input are left to a [`Frontend`] implementation so the core
//! can be driven headless in tests.

pub mod display;
pub mod error;
pub mod executor;
pub mod font;
pub mod frontend;
pub mod instruction;
pub mod machine;
pub mod opcode;
pub mod scheduler;

pub use display::FrameBuffer;
pub use error::{Chip8Error, Result};
pub use executor::{step, Outcome};
pub use font::Font;
pub use frontend::{Frontend, Screen};
pub use instruction::{decode, Instruction};
pub use machine::Machine;
pub use opcode::Opcode;
pub use scheduler::{Event, RunState, Scheduler, SchedulerConfig};

/// Addressable memory in bytes.
pub const RAM_SIZE: usize = 4096;
/// Mask applied to every address computed by an instruction.
pub const ADDRESS_MASK: u16 = 0x0FFF;
/// Programs are loaded here and execution starts here.
pub const START_ADDRESS: u16 = 0x200;
/// Largest program image that fits between `START_ADDRESS` and the end of RAM.
pub const MAX_PROGRAM_SIZE: usize = RAM_SIZE - START_ADDRESS as usize;

pub const NUM_REGS: usize = 16;
/// `VF` doubles as the carry, borrow and collision flag.
pub const FLAG_REG: usize = 0xF;
pub const STACK_SIZE: usize = 16;
pub const NUM_KEYS: usize = 16;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// Bytes per hexadecimal digit sprite.
pub const FONT_GLYPH_SIZE: usize = 5;
pub const FONTSET_SIZE: usize = FONT_GLYPH_SIZE * 16;
/// Where the font table lives; `Fx29` computes offsets from here.
pub const FONTSET_ADDRESS: usize = 0x000;

pub const FONTSET: [u8; FONTSET_SIZE] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
