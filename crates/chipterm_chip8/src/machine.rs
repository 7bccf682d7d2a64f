use crate::error::{Chip8Error, Result};
use crate::font::Font;
use crate::instruction::{self, Instruction};
use crate::{
    FONTSET_ADDRESS, FONTSET_SIZE, MAX_PROGRAM_SIZE, NUM_KEYS, NUM_REGS, RAM_SIZE, STACK_SIZE,
    START_ADDRESS,
};

/// Registers, memory, stack and timers of one CHIP-8 machine.
///
/// Only the executor mutates registers and memory; the scheduler writes
/// `input` on behalf of the input collaborator. Frontends get read-only
/// accessors.
#[derive(Clone, Debug)]
pub struct Machine {
    /// program counter
    pub(crate) pc: u16,
    pub(crate) ram: [u8; RAM_SIZE],
    /// V Registers
    pub(crate) v_reg: [u8; NUM_REGS],
    /// I Register
    pub(crate) i_reg: u16,
    /// number of occupied stack slots
    pub(crate) stack_pointer: usize,
    pub(crate) stack: [u16; STACK_SIZE],
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    /// key currently held, if any
    pub(crate) input: Option<u8>,
    program_len: usize,
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new(&Font::default())
    }
}

impl Machine {
    pub fn new(font: &Font) -> Self {
        let mut machine = Self {
            pc: START_ADDRESS,
            ram: [0; RAM_SIZE],
            v_reg: [0; NUM_REGS],
            i_reg: 0,
            stack_pointer: 0,
            stack: [0; STACK_SIZE],
            delay_timer: 0,
            sound_timer: 0,
            input: None,
            program_len: 0,
        };
        machine.ram[FONTSET_ADDRESS..FONTSET_ADDRESS + FONTSET_SIZE]
            .copy_from_slice(font.as_bytes());
        machine
    }

    /// Build a machine from a textual font table, refusing to start if the
    /// table is malformed.
    pub fn load_sprites(source: &str) -> Result<Self> {
        let font = Font::parse(source)?;
        Ok(Self::new(&font))
    }

    /// Copy a program image to `START_ADDRESS`, zeroing whatever a previous
    /// image left above it.
    pub fn load_program(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                len: rom.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = START_ADDRESS as usize;
        let end = start + rom.len();
        self.ram[start..].fill(0);
        self.ram[start..end].copy_from_slice(rom);
        self.program_len = rom.len();
        log::debug!("loaded {} byte program at {:#05x}", rom.len(), start);
        Ok(())
    }

    pub fn decrement_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Decode the word at the program counter without advancing it.
    pub fn fetch(&self) -> Instruction {
        let pc = self.pc as usize % RAM_SIZE;
        instruction::decode(self.ram[pc], self.ram[(pc + 1) % RAM_SIZE], self.pc)
    }

    /// Decoded view of the loaded program, one entry per word.
    pub fn listing(&self) -> Vec<Instruction> {
        instruction::listing(&self.ram, START_ADDRESS, self.program_len)
    }

    pub(crate) fn set_input(&mut self, key: Option<u8>) {
        debug_assert!(key.map_or(true, |k| (k as usize) < NUM_KEYS));
        self.input = key;
    }

    /// Skip the next instruction when `condition` holds.
    pub(crate) fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    pub(crate) fn push(&mut self, val: u16) -> Result<()> {
        if self.stack_pointer == STACK_SIZE {
            return Err(Chip8Error::StackOverflow {
                pc: val.wrapping_sub(2),
            });
        }
        self.stack[self.stack_pointer] = val;
        self.stack_pointer += 1;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<u16> {
        if self.stack_pointer == 0 {
            return Err(Chip8Error::StackUnderflow {
                pc: self.pc.wrapping_sub(2),
            });
        }
        self.stack_pointer -= 1;
        Ok(self.stack[self.stack_pointer])
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i_reg
    }

    pub fn v(&self) -> &[u8; NUM_REGS] {
        &self.v_reg
    }

    pub fn memory(&self) -> &[u8; RAM_SIZE] {
        &self.ram
    }

    pub fn stack(&self) -> &[u16; STACK_SIZE] {
        &self.stack
    }

    pub fn sp(&self) -> usize {
        self.stack_pointer
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn input(&self) -> Option<u8> {
        self.input
    }

    pub fn program_len(&self) -> usize {
        self.program_len
    }
}
