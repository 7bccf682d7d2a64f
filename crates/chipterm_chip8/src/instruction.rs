use std::fmt;

use crate::opcode::Opcode;
use crate::RAM_SIZE;

/// A decoded instruction word and its operand fields.
///
/// Built fresh on every fetch and never mutated; `pc` is the address the word
/// was fetched from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub word: u16,
    pub addr: u16,
    pub x: u8,
    pub y: u8,
    pub kk: u8,
    pub nibble: u8,
    pub pc: u16,
}

impl Instruction {
    /// Top four bits, selecting the instruction family.
    pub fn family(&self) -> u8 {
        (self.word >> 12) as u8
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::decode(self)
    }
}

/// Split a big-endian instruction word into its operand fields.
pub fn decode(high: u8, low: u8, pc: u16) -> Instruction {
    let word = (high as u16) << 8 | low as u16;
    Instruction {
        word,
        addr: word & 0x0FFF,
        x: high & 0x0F,
        y: (low & 0xF0) >> 4,
        kk: low,
        nibble: low & 0x0F,
        pc,
    }
}

/// Decode `len` bytes of `memory` starting at `start`, two bytes per entry.
/// An odd trailing byte is paired with whatever follows it in memory.
pub fn listing(memory: &[u8], start: u16, len: usize) -> Vec<Instruction> {
    (0..len)
        .step_by(2)
        .map(|offset| {
            let addr = (start as usize + offset) % RAM_SIZE;
            decode(memory[addr], memory[(addr + 1) % RAM_SIZE], addr as u16)
        })
        .collect()
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode() {
            Some(op) => write!(f, "{}", op),
            None => write!(f, "UNKNOWN"),
        }
    }
}
