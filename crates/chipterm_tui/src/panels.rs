//! Text for the debug panels, kept apart from the terminal so it can be
//! checked without one.

use std::collections::VecDeque;

use chipterm_chip8::{Instruction, Machine, START_ADDRESS};

/// Entries shown per page of the program listing.
pub const PROGRAM_PAGE_SIZE: usize = 40;
/// Log lines kept for the console panel.
pub const CONSOLE_HISTORY: usize = 64;

/// Append a console message, dropping the oldest once `CONSOLE_HISTORY`
/// lines are kept.
pub fn push_console(logs: &mut VecDeque<String>, message: &str) {
    if logs.len() >= CONSOLE_HISTORY {
        logs.pop_front();
    }
    logs.push_back(message.to_string());
}

pub fn console_lines(logs: &VecDeque<String>, visible: usize) -> Vec<String> {
    let mut lines = vec!["> press ESC to quit".to_string(), String::new()];
    let skip = logs.len().saturating_sub(visible);
    lines.extend(logs.iter().skip(skip).cloned());
    lines
}

/// The page of the listing holding the program counter, with the current
/// instruction marked.
pub fn program_lines(machine: &Machine, listing: &[Instruction]) -> Vec<String> {
    let pc = machine.pc();
    let position = pc.saturating_sub(START_ADDRESS) as usize / 2;
    let page_start = (position / PROGRAM_PAGE_SIZE) * PROGRAM_PAGE_SIZE;
    let page_end = (page_start + PROGRAM_PAGE_SIZE).min(listing.len());
    listing
        .get(page_start..page_end)
        .unwrap_or_default()
        .iter()
        .map(|ins| {
            let marker = if ins.pc == pc { "  <-- PC" } else { "" };
            format!("{:#05x}: {:04x} {}{}", ins.pc, ins.word, ins, marker)
        })
        .collect()
}

pub fn hardware_lines(machine: &Machine) -> Vec<String> {
    let mut lines: Vec<String> = machine
        .v()
        .iter()
        .enumerate()
        .map(|(i, v)| format!("V{:X} = {:#04x}", i, v))
        .collect();

    lines.push(String::new());
    lines.push(format!("PC = {:#05x}", machine.pc()));
    lines.push(format!("I  = {:#05x}", machine.i()));
    lines.push(String::new());
    for (i, addr) in machine.stack().iter().enumerate() {
        let marker = if machine.sp() == i { "  <-- SP" } else { "" };
        lines.push(format!("S{:X} = {:#05x}{}", i, addr, marker));
    }
    lines.push(String::new());
    lines.push(format!("DT = {:#04x}", machine.delay_timer()));
    lines.push(format!("ST = {:#04x}", machine.sound_timer()));
    lines.push(match machine.input() {
        Some(key) => format!("KEY = {:X}", key),
        None => "KEY = -".to_string(),
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_with(program: &[u8]) -> Machine {
        let mut m = Machine::default();
        m.load_program(program).unwrap();
        m
    }

    #[test]
    fn console_keeps_latest_lines() {
        let logs: VecDeque<String> = (0..10).map(|i| format!("line {}", i)).collect();
        let lines = console_lines(&logs, 3);
        assert_eq!(lines[0], "> press ESC to quit");
        assert_eq!(&lines[2..], &["line 7", "line 8", "line 9"]);
    }

    #[test]
    fn console_history_is_bounded() {
        let mut logs = VecDeque::new();
        for i in 0..CONSOLE_HISTORY + 5 {
            push_console(&mut logs, &format!("line {}", i));
        }
        assert_eq!(logs.len(), CONSOLE_HISTORY);
        assert_eq!(logs.front().unwrap(), "line 5");
        assert_eq!(logs.back().unwrap(), &format!("line {}", CONSOLE_HISTORY + 4));
    }

    #[test]
    fn program_marks_current_instruction() {
        let m = machine_with(&[0x00, 0xE0, 0x12, 0x00]);
        let lines = program_lines(&m, &m.listing());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0x200: 00e0 CLS  <-- PC");
        assert_eq!(lines[1], "0x202: 1200 JP 0x200");
    }

    #[test]
    fn program_pages_follow_pc() {
        let rom = vec![0x00; PROGRAM_PAGE_SIZE * 2 * 2 + 4];
        let m = machine_with(&rom);
        let listing = m.listing();
        let first = program_lines(&m, &listing);
        assert_eq!(first.len(), PROGRAM_PAGE_SIZE);

        // JP to the first entry of the third page
        let target = 0x200 + (PROGRAM_PAGE_SIZE * 2 * 2) as u16;
        let mut jumped = m.clone();
        let ins = chipterm_chip8::decode(0x10 | (target >> 8) as u8, target as u8, jumped.pc());
        chipterm_chip8::step(&mut jumped, &ins, &mut NullScreen).unwrap();
        let last = program_lines(&jumped, &listing);
        assert_eq!(last.len(), 2);
        assert!(last[0].ends_with("<-- PC"));
    }

    #[test]
    fn hardware_shows_registers_and_stack_pointer() {
        let m = machine_with(&[]);
        let lines = hardware_lines(&m);
        assert_eq!(lines[0], "V0 = 0x00");
        assert!(lines.contains(&"PC = 0x200".to_string()));
        assert!(lines.contains(&"S0 = 0x000  <-- SP".to_string()));
        assert_eq!(lines.last().unwrap(), "KEY = -");
    }

    struct NullScreen;

    impl chipterm_chip8::Screen for NullScreen {
        fn draw_sprite(&mut self, _sprite: &[u8], _x: u8, _y: u8) -> bool {
            false
        }
        fn clear_display(&mut self) {}
        fn log(&mut self, _message: &str) {}
    }
}
