use std::fmt;

use crate::instruction::Instruction;

/// Every instruction class of the CHIP-8 ISA, with the operands it uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 0nnn
    Sys { addr: u16 },
    /// 1nnn
    Jp { addr: u16 },
    /// 2nnn
    Call { addr: u16 },
    /// 3xkk
    SeByte { x: u8, kk: u8 },
    /// 4xkk
    SneByte { x: u8, kk: u8 },
    /// 5xy0
    SeReg { x: u8, y: u8 },
    /// 6xkk
    LdByte { x: u8, kk: u8 },
    /// 7xkk
    AddByte { x: u8, kk: u8 },
    /// 8xy0
    LdReg { x: u8, y: u8 },
    /// 8xy1
    Or { x: u8, y: u8 },
    /// 8xy2
    And { x: u8, y: u8 },
    /// 8xy3
    Xor { x: u8, y: u8 },
    /// 8xy4
    AddReg { x: u8, y: u8 },
    /// 8xy5
    Sub { x: u8, y: u8 },
    /// 8xy6
    Shr { x: u8 },
    /// 8xy7
    Subn { x: u8, y: u8 },
    /// 8xyE
    Shl { x: u8 },
    /// 9xy0
    SneReg { x: u8, y: u8 },
    /// Annn
    LdI { addr: u16 },
    /// Bnnn
    JpV0 { addr: u16 },
    /// Cxkk
    Rnd { x: u8, kk: u8 },
    /// Dxyn
    Drw { x: u8, y: u8, n: u8 },
    /// Ex9E
    Skp { x: u8 },
    /// ExA1
    Sknp { x: u8 },
    /// Fx07
    LdVxDt { x: u8 },
    /// Fx0A
    LdVxKey { x: u8 },
    /// Fx15
    LdDtVx { x: u8 },
    /// Fx18
    LdStVx { x: u8 },
    /// Fx1E
    AddI { x: u8 },
    /// Fx29
    LdFont { x: u8 },
    /// Fx33
    Bcd { x: u8 },
    /// Fx55
    Store { x: u8 },
    /// Fx65
    Load { x: u8 },
}

impl Opcode {
    /// Classify an instruction. Exact words are matched first, then the
    /// family nibble, then the low nibble or low byte inside families that
    /// pack sub-operations there. `None` means no class applies.
    pub fn decode(ins: &Instruction) -> Option<Opcode> {
        use Opcode::*;

        let Instruction {
            addr, x, y, kk, nibble, ..
        } = *ins;

        match ins.word {
            0x00E0 => return Some(Cls),
            0x00EE => return Some(Ret),
            _ => {}
        }

        let op = match ins.family() {
            0x0 => Sys { addr },
            0x1 => Jp { addr },
            0x2 => Call { addr },
            0x3 => SeByte { x, kk },
            0x4 => SneByte { x, kk },
            0x5 if nibble == 0 => SeReg { x, y },
            0x6 => LdByte { x, kk },
            0x7 => AddByte { x, kk },
            0x8 => match nibble {
                0x0 => LdReg { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddReg { x, y },
                0x5 => Sub { x, y },
                0x6 => Shr { x },
                0x7 => Subn { x, y },
                0xE => Shl { x },
                _ => return None,
            },
            0x9 if nibble == 0 => SneReg { x, y },
            0xA => LdI { addr },
            0xB => JpV0 { addr },
            0xC => Rnd { x, kk },
            0xD => Drw { x, y, n: nibble },
            0xE => match kk {
                0x9E => Skp { x },
                0xA1 => Sknp { x },
                _ => return None,
            },
            0xF => match kk {
                0x07 => LdVxDt { x },
                0x0A => LdVxKey { x },
                0x15 => LdDtVx { x },
                0x18 => LdStVx { x },
                0x1E => AddI { x },
                0x29 => LdFont { x },
                0x33 => Bcd { x },
                0x55 => Store { x },
                0x65 => Load { x },
                _ => return None,
            },
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Opcode::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Sys { addr } => write!(f, "SYS {:#05x}", addr),
            Jp { addr } => write!(f, "JP {:#05x}", addr),
            Call { addr } => write!(f, "CALL {:#05x}", addr),
            SeByte { x, kk } => write!(f, "SE V{:X}, {:#04x}", x, kk),
            SneByte { x, kk } => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            SeReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte { x, kk } => write!(f, "LD V{:X}, {:#04x}", x, kk),
            AddByte { x, kk } => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            LdReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr { x } => write!(f, "SHR V{:X}", x),
            Subn { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl { x } => write!(f, "SHL V{:X}", x),
            SneReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI { addr } => write!(f, "LD I, {:#05x}", addr),
            JpV0 { addr } => write!(f, "JP V0, {:#05x}", addr),
            Rnd { x, kk } => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Drw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp { x } => write!(f, "SKP V{:X}", x),
            Sknp { x } => write!(f, "SKNP V{:X}", x),
            LdVxDt { x } => write!(f, "LD V{:X}, DT", x),
            LdVxKey { x } => write!(f, "LD V{:X}, K", x),
            LdDtVx { x } => write!(f, "LD DT, V{:X}", x),
            LdStVx { x } => write!(f, "LD ST, V{:X}", x),
            AddI { x } => write!(f, "ADD I, V{:X}", x),
            LdFont { x } => write!(f, "LD F, V{:X}", x),
            Bcd { x } => write!(f, "LD B, V{:X}", x),
            Store { x } => write!(f, "LD [I], V{:X}", x),
            Load { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
