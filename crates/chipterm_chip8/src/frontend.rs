use crate::instruction::Instruction;
use crate::machine::Machine;

/// Output side the executor talks to while running an instruction.
pub trait Screen {
    /// XOR-blit `sprite` at `(x, y)` with wraparound. Returns true when a lit
    /// pixel was switched off.
    fn draw_sprite(&mut self, sprite: &[u8], x: u8, y: u8) -> bool;
    fn clear_display(&mut self);
    fn log(&mut self, message: &str);
}

/// What the scheduler drives: a [`Screen`] that can also present a frame.
///
/// Every call happens on the scheduler's thread between two instructions,
/// so `machine` is never observed half-updated.
pub trait Frontend: Screen {
    fn render_frame(&mut self, machine: &Machine, listing: &[Instruction]);
}
