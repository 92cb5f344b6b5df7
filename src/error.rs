use std::io;

use miette::Diagnostic;
use thiserror::Error;

use crate::runtime::Status;

/// Fatal condition raised while executing an image.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error("illegal instruction 0x{instr:04x} at 0x{pc:04x}")]
    #[diagnostic(
        code(run::illegal_instruction),
        help("opcodes RTI (0x8) and RES (0xD) cannot be executed")
    )]
    IllegalInstruction { instr: u16, pc: u16 },

    #[error("trap with unknown vector x{vector:02X} at 0x{pc:04x}")]
    #[diagnostic(
        code(run::unknown_trap),
        help("vectors x20 to x25 are always available, x26 and x27 need the `putn` and `reg` features")
    )]
    UnknownTrap { vector: u8, pc: u16 },

    #[error("input ended while waiting for a character at 0x{pc:04x}")]
    #[diagnostic(
        code(run::input_unavailable),
        help("the program reads more characters than its input provides")
    )]
    InputUnavailable { pc: u16 },

    #[error("console device failed")]
    #[diagnostic(code(run::device))]
    Device(#[from] io::Error),

    #[error("machine is not running ({0:?})")]
    #[diagnostic(code(run::not_running))]
    NotRunning(Status),
}

impl RunError {
    /// Whether the run was cut short by the user, rather than by the program.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, RunError::Device(e) if e.kind() == io::ErrorKind::Interrupted)
    }
}

/// Image could not be placed into memory.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("image is empty")]
    #[diagnostic(
        code(load::empty),
        help("an image starts with a 16-bit origin address")
    )]
    Empty,

    #[error("image is not aligned to 16 bits ({len} bytes)")]
    #[diagnostic(
        code(load::truncated),
        help("images are sequences of big-endian 16-bit words")
    )]
    Truncated { len: usize },

    #[error("image could not be read")]
    #[diagnostic(code(load::io))]
    Io(#[from] io::Error),
}
