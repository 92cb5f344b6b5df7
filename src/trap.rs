use crate::device::{InputDevice, OutputSink};
use crate::error::RunError;
use crate::registers::Register;
use crate::runtime::{RunState, Status};

/// Printed by `IN` before waiting for a key.
pub const IN_PROMPT: &str = "Enter a character: ";

/// Built-in routines reachable through `TRAP`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TrapVector {
    /// Read one character into R0, without echo.
    Getc = 0x20,
    /// Write the character in R0.
    Out = 0x21,
    /// Write the string of one character per cell starting at R0.
    Puts = 0x22,
    /// Prompt, then read one character into R0 with echo.
    In = 0x23,
    /// Write the string of two characters per cell starting at R0.
    Putsp = 0x24,
    Halt = 0x25,
    /// Write R0 as a signed decimal. Needs the `putn` feature.
    Putn = 0x26,
    /// Write every register. Needs the `reg` feature.
    Reg = 0x27,
}

impl TryFrom<u8> for TrapVector {
    type Error = ();
    fn try_from(vector: u8) -> Result<Self, Self::Error> {
        Ok(match vector {
            0x20 => TrapVector::Getc,
            0x21 => TrapVector::Out,
            0x22 => TrapVector::Puts,
            0x23 => TrapVector::In,
            0x24 => TrapVector::Putsp,
            0x25 => TrapVector::Halt,
            0x26 => TrapVector::Putn,
            0x27 => TrapVector::Reg,
            _ => return Err(()),
        })
    }
}

impl<I: InputDevice, O: OutputSink> RunState<I, O> {
    /// `pc` is the address of the `TRAP` instruction.
    pub(crate) fn trap(&mut self, vector: u8, pc: u16) -> Result<(), RunError> {
        let unknown = RunError::UnknownTrap { vector, pc };
        let Ok(trap) = TrapVector::try_from(vector) else {
            return Err(unknown);
        };
        match trap {
            TrapVector::Getc => {
                let ch = self.read_char(pc)?;
                self.regs.set(Register::R0, ch as u16);
            }
            TrapVector::Out => {
                let ch = (self.regs.get(Register::R0) & 0xFF) as u8;
                self.output.write(ch)?;
                self.output.flush()?;
            }
            TrapVector::Puts => {
                let mut addr = self.regs.get(Register::R0);
                loop {
                    let ch = (self.load(addr)? & 0xFF) as u8;
                    if ch == 0 {
                        break;
                    }
                    self.output.write(ch)?;
                    addr = addr.wrapping_add(1);
                }
                self.output.flush()?;
            }
            TrapVector::In => {
                self.write_str(IN_PROMPT)?;
                self.output.flush()?;
                let ch = self.read_char(pc)?;
                self.output.write(ch)?;
                self.output.flush()?;
                self.regs.set(Register::R0, ch as u16);
            }
            TrapVector::Putsp => {
                let mut addr = self.regs.get(Register::R0);
                'string: loop {
                    let chr_raw = self.load(addr)?;
                    for ch in [chr_raw & 0xFF, chr_raw >> 8] {
                        if ch == 0 {
                            break 'string;
                        }
                        self.output.write(ch as u8)?;
                    }
                    addr = addr.wrapping_add(1);
                }
                self.output.flush()?;
            }
            TrapVector::Halt => {
                self.status = Status::Halted;
            }
            TrapVector::Putn if self.features.putn => {
                let val = self.regs.get(Register::R0) as i16;
                self.write_str(&format!("{val}\n"))?;
                self.output.flush()?;
            }
            TrapVector::Reg if self.features.reg => {
                let dump: String = self
                    .regs
                    .iter()
                    .map(|(reg, val)| format!("{reg} {val}\n"))
                    .collect();
                self.write_str(&dump)?;
                self.output.flush()?;
            }
            TrapVector::Putn | TrapVector::Reg => return Err(unknown),
        }
        Ok(())
    }

    /// Block until a character arrives. End of input is fatal.
    fn read_char(&mut self, pc: u16) -> Result<u8, RunError> {
        self.input
            .block_read()?
            .ok_or(RunError::InputUnavailable { pc })
    }

    fn write_str(&mut self, string: &str) -> Result<(), RunError> {
        for byte in string.bytes() {
            self.output.write(byte)?;
        }
        Ok(())
    }
}
