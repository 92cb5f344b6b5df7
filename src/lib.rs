// Machine state
mod memory;
pub use memory::{Memory, KBDR, KBSR, MEMORY_MAX};
mod registers;
pub use registers::{Flag, Register, Registers, PC_START};

// Execution
mod decode;
pub use decode::{sign_extend, CondMask, Instruction, JumpTarget, Opcode, Operand};
mod runtime;
pub use runtime::{RunState, Status};
mod trap;
pub use trap::{TrapVector, IN_PROMPT};

// Devices and host
pub mod device;
pub mod image;
pub mod output;
pub mod term;

mod error;
pub use error::{LoadError, RunError};
mod features;
pub use features::Features;
