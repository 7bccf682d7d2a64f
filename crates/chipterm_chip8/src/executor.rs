use crate::error::Result;
use crate::frontend::Screen;
use crate::instruction::Instruction;
use crate::machine::Machine;
use crate::opcode::Opcode;
use crate::{ADDRESS_MASK, FLAG_REG, FONTSET_ADDRESS, FONT_GLYPH_SIZE, RAM_SIZE};

/// What happened while executing one instruction, beyond the state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// `Dxyn` ran; `collision` mirrors the value written to `VF`.
    Drew { collision: bool },
    /// `Fx0A` ran; the caller must not execute further until a key arrives
    /// and is stored in `V[register]`.
    WaitForKey { register: usize },
    /// No opcode class matched; only the program counter and timers moved.
    Unrecognized,
}

/// Execute one decoded instruction against `machine`.
///
/// The program counter is advanced before dispatch so jumps and calls can
/// overwrite it, and the timers are decremented once afterwards whatever the
/// instruction was.
pub fn step<S: Screen + ?Sized>(
    machine: &mut Machine,
    ins: &Instruction,
    screen: &mut S,
) -> Result<Outcome> {
    machine.pc = machine.pc.wrapping_add(2);
    let outcome = match ins.opcode() {
        Some(op) => execute(machine, op, screen),
        None => {
            let message = format!(
                "unrecognized instruction {:#06x} at {:#05x}",
                ins.word, ins.pc
            );
            log::warn!("{}", message);
            screen.log(&message);
            Ok(Outcome::Unrecognized)
        }
    };
    machine.decrement_timers();
    outcome
}

fn execute<S: Screen + ?Sized>(m: &mut Machine, op: Opcode, screen: &mut S) -> Result<Outcome> {
    log::trace!("{:#05x}: {}", m.pc.wrapping_sub(2), op);
    match op {
        Opcode::Cls => screen.clear_display(),
        Opcode::Ret => m.pc = m.pop()?,
        Opcode::Sys { .. } => screen.log(&format!("skip instruction {}", op)),
        Opcode::Jp { addr } => m.pc = addr,
        Opcode::Call { addr } => {
            m.push(m.pc)?;
            m.pc = addr;
        }
        Opcode::SeByte { x, kk } => m.skip_if(m.v_reg[x as usize] == kk),
        Opcode::SneByte { x, kk } => m.skip_if(m.v_reg[x as usize] != kk),
        Opcode::SeReg { x, y } => m.skip_if(m.v_reg[x as usize] == m.v_reg[y as usize]),
        Opcode::LdByte { x, kk } => m.v_reg[x as usize] = kk,
        Opcode::AddByte { x, kk } => {
            m.v_reg[x as usize] = m.v_reg[x as usize].wrapping_add(kk);
        }
        Opcode::LdReg { x, y } => m.v_reg[x as usize] = m.v_reg[y as usize],
        Opcode::Or { x, y } => m.v_reg[x as usize] |= m.v_reg[y as usize],
        Opcode::And { x, y } => m.v_reg[x as usize] &= m.v_reg[y as usize],
        Opcode::Xor { x, y } => m.v_reg[x as usize] ^= m.v_reg[y as usize],
        Opcode::AddReg { x, y } => {
            let (val, carry) = m.v_reg[x as usize].overflowing_add(m.v_reg[y as usize]);
            m.v_reg[x as usize] = val;
            m.v_reg[FLAG_REG] = carry as u8;
        }
        Opcode::Sub { x, y } => {
            let (vx, vy) = (m.v_reg[x as usize], m.v_reg[y as usize]);
            m.v_reg[x as usize] = vx.wrapping_sub(vy);
            m.v_reg[FLAG_REG] = (vx > vy) as u8;
        }
        Opcode::Shr { x } => {
            m.v_reg[FLAG_REG] = m.v_reg[x as usize] & 0x1;
            m.v_reg[x as usize] >>= 1;
        }
        Opcode::Subn { x, y } => {
            // result lands in Vy, not Vx
            let (vx, vy) = (m.v_reg[x as usize], m.v_reg[y as usize]);
            m.v_reg[y as usize] = vy.wrapping_sub(vx);
            m.v_reg[FLAG_REG] = (vy > vx) as u8;
        }
        Opcode::Shl { x } => {
            m.v_reg[FLAG_REG] = (m.v_reg[x as usize] >> 7) & 0x1;
            m.v_reg[x as usize] <<= 1;
        }
        Opcode::SneReg { x, y } => m.skip_if(m.v_reg[x as usize] != m.v_reg[y as usize]),
        Opcode::LdI { addr } => m.i_reg = addr,
        Opcode::JpV0 { addr } => m.pc = (addr + m.v_reg[0] as u16) & ADDRESS_MASK,
        Opcode::Rnd { x, kk } => m.v_reg[x as usize] = rand::random::<u8>() & kk,
        Opcode::Drw { x, y, n } => {
            let sprite: Vec<u8> = (0..n as u16).map(|row| m.ram[addr(m.i_reg + row)]).collect();
            let collision = screen.draw_sprite(&sprite, m.v_reg[x as usize], m.v_reg[y as usize]);
            m.v_reg[FLAG_REG] = collision as u8;
            return Ok(Outcome::Drew { collision });
        }
        Opcode::Skp { x } => m.skip_if(m.input == Some(m.v_reg[x as usize])),
        Opcode::Sknp { x } => m.skip_if(m.input != Some(m.v_reg[x as usize])),
        Opcode::LdVxDt { x } => m.v_reg[x as usize] = m.delay_timer,
        Opcode::LdVxKey { x } => return Ok(Outcome::WaitForKey { register: x as usize }),
        Opcode::LdDtVx { x } => m.delay_timer = m.v_reg[x as usize],
        Opcode::LdStVx { x } => m.sound_timer = m.v_reg[x as usize],
        Opcode::AddI { x } => m.i_reg = (m.i_reg + m.v_reg[x as usize] as u16) & ADDRESS_MASK,
        Opcode::LdFont { x } => {
            m.i_reg = (FONTSET_ADDRESS + m.v_reg[x as usize] as usize * FONT_GLYPH_SIZE) as u16;
        }
        Opcode::Bcd { x } => {
            let val = m.v_reg[x as usize];
            m.ram[addr(m.i_reg)] = val / 100;
            m.ram[addr(m.i_reg + 1)] = (val / 10) % 10;
            m.ram[addr(m.i_reg + 2)] = val % 10;
        }
        Opcode::Store { x } => {
            for offset in 0..=x as u16 {
                m.ram[addr(m.i_reg + offset)] = m.v_reg[offset as usize];
            }
        }
        Opcode::Load { x } => {
            for offset in 0..=x as u16 {
                m.v_reg[offset as usize] = m.ram[addr(m.i_reg + offset)];
            }
        }
    }
    Ok(Outcome::Continue)
}

/// Memory index for an address, wrapping past the top of RAM.
fn addr(a: u16) -> usize {
    a as usize % RAM_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Chip8Error;
    use crate::frontend::testing::RecordingFrontend;
    use crate::instruction::decode;
    use crate::{FONTSET, STACK_SIZE};

    struct Rig {
        machine: Machine,
        screen: RecordingFrontend,
    }

    impl Rig {
        fn new(program: &[u16]) -> Self {
            let rom: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
            let mut machine = Machine::default();
            machine.load_program(&rom).unwrap();
            Rig {
                machine,
                screen: RecordingFrontend::default(),
            }
        }

        fn run(&mut self, count: usize) -> Result<Outcome> {
            let mut outcome = Outcome::Continue;
            for _ in 0..count {
                let ins = self.machine.fetch();
                outcome = step(&mut self.machine, &ins, &mut self.screen)?;
            }
            Ok(outcome)
        }

        fn exec(&mut self, word: u16) -> Result<Outcome> {
            let pc = self.machine.pc;
            let ins = decode((word >> 8) as u8, word as u8, pc);
            step(&mut self.machine, &ins, &mut self.screen)
        }

        fn v(&self, r: usize) -> u8 {
            self.machine.v_reg[r]
        }
    }

    #[test]
    fn load_then_skip_equal() {
        let mut rig = Rig::new(&[0x6A42, 0x3A42]);
        rig.run(2).unwrap();
        assert_eq!(rig.machine.pc(), 0x200 + 6);
    }

    #[test]
    fn skip_not_equal_and_register_compare() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[1] = 5;
        rig.machine.v_reg[2] = 5;
        rig.exec(0x4105).unwrap();
        assert_eq!(rig.machine.pc(), 0x202);
        rig.exec(0x5120).unwrap();
        assert_eq!(rig.machine.pc(), 0x206);
        rig.exec(0x9120).unwrap();
        assert_eq!(rig.machine.pc(), 0x208);
    }

    #[test]
    fn add_with_carry() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[0] = 0xFF;
        rig.machine.v_reg[1] = 0x01;
        rig.exec(0x8014).unwrap();
        assert_eq!((rig.v(0), rig.v(FLAG_REG)), (0x00, 1));

        rig.machine.v_reg[0] = 0x01;
        rig.exec(0x8014).unwrap();
        assert_eq!((rig.v(0), rig.v(FLAG_REG)), (0x02, 0));
    }

    #[test]
    fn add_byte_wraps_without_touching_flag() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[3] = 0xF0;
        rig.machine.v_reg[FLAG_REG] = 7;
        rig.exec(0x7320).unwrap();
        assert_eq!((rig.v(3), rig.v(FLAG_REG)), (0x10, 7));
    }

    #[test]
    fn subtract_flags_use_strict_greater_than() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[0] = 5;
        rig.machine.v_reg[1] = 3;
        rig.exec(0x8015).unwrap();
        assert_eq!((rig.v(0), rig.v(FLAG_REG)), (2, 1));

        rig.machine.v_reg[0] = 3;
        rig.machine.v_reg[1] = 3;
        rig.exec(0x8015).unwrap();
        assert_eq!((rig.v(0), rig.v(FLAG_REG)), (0, 0));

        rig.machine.v_reg[0] = 1;
        rig.machine.v_reg[1] = 2;
        rig.exec(0x8015).unwrap();
        assert_eq!((rig.v(0), rig.v(FLAG_REG)), (0xFF, 0));
    }

    #[test]
    fn subn_stores_into_vy() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[0] = 3;
        rig.machine.v_reg[1] = 10;
        rig.exec(0x8017).unwrap();
        assert_eq!((rig.v(0), rig.v(1), rig.v(FLAG_REG)), (3, 7, 1));

        rig.machine.v_reg[0] = 10;
        rig.machine.v_reg[1] = 3;
        rig.exec(0x8017).unwrap();
        assert_eq!((rig.v(0), rig.v(1), rig.v(FLAG_REG)), (10, 249, 0));
    }

    #[test]
    fn shift_right_flag_is_lsb() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[2] = 0x03;
        rig.exec(0x8206).unwrap();
        assert_eq!((rig.v(2), rig.v(FLAG_REG)), (0x01, 1));
        rig.machine.v_reg[2] = 0x04;
        rig.exec(0x8206).unwrap();
        assert_eq!((rig.v(2), rig.v(FLAG_REG)), (0x02, 0));
    }

    #[test]
    fn shift_left_flag_is_msb() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[2] = 0x81;
        rig.exec(0x820E).unwrap();
        assert_eq!((rig.v(2), rig.v(FLAG_REG)), (0x02, 1));
        rig.machine.v_reg[2] = 0x40;
        rig.exec(0x820E).unwrap();
        assert_eq!((rig.v(2), rig.v(FLAG_REG)), (0x80, 0));
    }

    #[test]
    fn bitwise_ops() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[0] = 0b1100;
        rig.machine.v_reg[1] = 0b1010;
        rig.exec(0x8011).unwrap();
        assert_eq!(rig.v(0), 0b1110);
        rig.exec(0x8012).unwrap();
        assert_eq!(rig.v(0), 0b1010);
        rig.exec(0x8013).unwrap();
        assert_eq!(rig.v(0), 0);
        rig.exec(0x8010).unwrap();
        assert_eq!(rig.v(0), 0b1010);
    }

    #[test]
    fn bcd_of_157() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[4] = 157;
        rig.machine.i_reg = 0x300;
        rig.exec(0xF433).unwrap();
        assert_eq!(&rig.machine.memory()[0x300..0x303], &[1, 5, 7]);
    }

    #[test]
    fn call_then_return() {
        // 0x200: CALL 0x206 / 0x202: (return lands here) / 0x206: RET
        let mut rig = Rig::new(&[0x2206, 0x0000, 0x0000, 0x00EE]);
        rig.run(1).unwrap();
        assert_eq!(rig.machine.pc(), 0x206);
        assert_eq!(rig.machine.sp(), 1);
        rig.run(1).unwrap();
        assert_eq!(rig.machine.pc(), 0x202);
        assert_eq!(rig.machine.sp(), 0);
    }

    #[test]
    fn return_on_empty_stack_is_fatal() {
        let mut rig = Rig::new(&[0x00EE]);
        let err = rig.run(1).unwrap_err();
        assert!(matches!(err, Chip8Error::StackUnderflow { pc: 0x200 }));
    }

    #[test]
    fn seventeenth_nested_call_overflows() {
        // a subroutine that calls itself
        let mut rig = Rig::new(&[0x2200]);
        rig.run(STACK_SIZE).unwrap();
        assert_eq!(rig.machine.sp(), STACK_SIZE);
        let err = rig.run(1).unwrap_err();
        assert!(matches!(err, Chip8Error::StackOverflow { pc: 0x200 }));
    }

    #[test]
    fn jumps() {
        let mut rig = Rig::new(&[]);
        rig.exec(0x1345).unwrap();
        assert_eq!(rig.machine.pc(), 0x345);
        rig.machine.v_reg[0] = 0x10;
        rig.exec(0xB300).unwrap();
        assert_eq!(rig.machine.pc(), 0x310);
        rig.machine.v_reg[0] = 0xFF;
        rig.exec(0xBFF0).unwrap();
        assert_eq!(rig.machine.pc(), 0x0EF);
    }

    #[test]
    fn index_register_ops() {
        let mut rig = Rig::new(&[]);
        rig.exec(0xAFFE).unwrap();
        assert_eq!(rig.machine.i(), 0xFFE);
        rig.machine.v_reg[1] = 3;
        rig.exec(0xF11E).unwrap();
        assert_eq!(rig.machine.i(), 0x001);
        rig.machine.v_reg[2] = 0xB;
        rig.exec(0xF229).unwrap();
        assert_eq!(rig.machine.i(), 0xB * 5);
    }

    #[test]
    fn store_then_load_registers() {
        let mut rig = Rig::new(&[]);
        for r in 0..=3 {
            rig.machine.v_reg[r] = 0x10 + r as u8;
        }
        rig.machine.v_reg[4] = 0xEE;
        rig.machine.i_reg = 0x400;
        rig.exec(0xF355).unwrap();
        assert_eq!(&rig.machine.memory()[0x400..0x405], &[0x10, 0x11, 0x12, 0x13, 0]);
        assert_eq!(rig.machine.i(), 0x400);

        rig.machine.v_reg = [0; 16];
        rig.exec(0xF365).unwrap();
        assert_eq!(&rig.machine.v()[..5], &[0x10, 0x11, 0x12, 0x13, 0]);
    }

    #[test]
    fn store_wraps_past_end_of_memory() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[0] = 0xAA;
        rig.machine.v_reg[1] = 0xBB;
        rig.machine.i_reg = 0xFFF;
        rig.exec(0xF155).unwrap();
        assert_eq!(rig.machine.memory()[0xFFF], 0xAA);
        assert_eq!(rig.machine.memory()[0x000], 0xBB);
    }

    #[test]
    fn timers_load_and_read_back() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[5] = 10;
        rig.exec(0xF515).unwrap();
        // the load is followed by this instruction's own decrement
        assert_eq!(rig.machine.delay_timer(), 9);
        rig.exec(0xF607).unwrap();
        assert_eq!(rig.v(6), 9);
        assert_eq!(rig.machine.delay_timer(), 8);
        rig.exec(0xF518).unwrap();
        assert_eq!(rig.machine.sound_timer(), 9);
    }

    #[test]
    fn delay_timer_drops_once_per_instruction() {
        // JP 0x200 forever; nothing writes DT
        let mut rig = Rig::new(&[0x1200]);
        rig.machine.delay_timer = 7;
        rig.run(5).unwrap();
        assert_eq!(rig.machine.delay_timer(), 2);
        rig.run(5).unwrap();
        assert_eq!(rig.machine.delay_timer(), 0);
    }

    #[test]
    fn random_is_masked() {
        let mut rig = Rig::new(&[]);
        for _ in 0..64 {
            rig.exec(0xC30F).unwrap();
            assert_eq!(rig.v(3) & 0xF0, 0);
        }
        rig.exec(0xC300).unwrap();
        assert_eq!(rig.v(3), 0);
    }

    #[test]
    fn draw_twice_clears_and_collides() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[0] = 3;
        rig.machine.v_reg[1] = 4;
        rig.machine.v_reg[2] = 0xA;
        rig.exec(0xF229).unwrap();
        let first = rig.exec(0xD015).unwrap();
        assert_eq!(first, Outcome::Drew { collision: false });
        assert_eq!(rig.v(FLAG_REG), 0);
        let glyph_pixels: usize = FONTSET[50..55].iter().map(|b| b.count_ones() as usize).sum();
        assert_eq!(rig.screen.screen.lit().count(), glyph_pixels);

        let second = rig.exec(0xD015).unwrap();
        assert_eq!(second, Outcome::Drew { collision: true });
        assert_eq!(rig.v(FLAG_REG), 1);
        assert!(rig.screen.screen.is_blank());
    }

    #[test]
    fn clear_screen_reaches_frontend() {
        let mut rig = Rig::new(&[0x00E0]);
        rig.run(1).unwrap();
        assert_eq!(rig.screen.clears, 1);
    }

    #[test]
    fn key_skips_compare_against_held_key() {
        let mut rig = Rig::new(&[]);
        rig.machine.v_reg[0] = 7;
        rig.exec(0xE09E).unwrap();
        assert_eq!(rig.machine.pc(), 0x202);
        rig.exec(0xE0A1).unwrap();
        assert_eq!(rig.machine.pc(), 0x206);

        rig.machine.set_input(Some(7));
        rig.exec(0xE09E).unwrap();
        assert_eq!(rig.machine.pc(), 0x20A);
        rig.exec(0xE0A1).unwrap();
        assert_eq!(rig.machine.pc(), 0x20C);
    }

    #[test]
    fn wait_for_key_is_reported_not_blocked() {
        let mut rig = Rig::new(&[0xF40A]);
        assert_eq!(rig.run(1).unwrap(), Outcome::WaitForKey { register: 4 });
        assert_eq!(rig.machine.pc(), 0x202);
    }

    #[test]
    fn sys_is_logged_and_ignored() {
        let mut rig = Rig::new(&[0x0123]);
        let before = rig.machine.clone();
        rig.run(1).unwrap();
        assert_eq!(rig.machine.pc(), 0x202);
        assert_eq!(rig.machine.v(), before.v());
        assert_eq!(rig.screen.logs, vec!["skip instruction SYS 0x123".to_string()]);
    }

    #[test]
    fn unrecognized_only_moves_pc_and_timers() {
        let mut rig = Rig::new(&[0x8AB9]);
        rig.machine.delay_timer = 3;
        let before = rig.machine.clone();
        assert_eq!(rig.run(1).unwrap(), Outcome::Unrecognized);
        assert_eq!(rig.machine.pc(), 0x202);
        assert_eq!(rig.machine.delay_timer(), 2);
        assert_eq!(rig.machine.v(), before.v());
        assert_eq!(rig.machine.memory()[..], before.memory()[..]);
        assert_eq!(rig.screen.logs.len(), 1);
        assert!(rig.screen.logs[0].starts_with("unrecognized instruction 0x8ab9"));
    }
}
