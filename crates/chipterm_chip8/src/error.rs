use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Failures that stop the machine. Unrecognized instructions are not errors:
/// they are logged and execution carries on.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("font table could not be loaded: {0}")]
    Init(String),
    #[error("program is {len} bytes but only {max} bytes fit above 0x200")]
    ProgramTooLarge { len: usize, max: usize },
    #[error("stack overflow: call at {pc:#05x} with all return slots in use")]
    StackOverflow { pc: u16 },
    #[error("stack underflow: return at {pc:#05x} with an empty stack")]
    StackUnderflow { pc: u16 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
