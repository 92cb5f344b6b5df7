use crate::decode::{Instruction, JumpTarget, Operand};
use crate::device::{InputDevice, OutputSink};
use crate::error::RunError;
use crate::features::Features;
use crate::memory::Memory;
use crate::registers::{Register, Registers};

/// Execution status of a [`RunState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    /// `HALT` was executed.
    Halted,
    /// An instruction failed. State is kept as it was at the failure.
    Faulted,
}

/// Represents complete program state during runtime.
pub struct RunState<I, O> {
    /// System memory - 128KB in size.
    pub(crate) mem: Memory,
    pub(crate) regs: Registers,
    pub(crate) status: Status,
    pub(crate) features: Features,
    /// Instructions executed so far.
    cycles: u64,
    pub(crate) input: I,
    pub(crate) output: O,
}

impl<I: InputDevice, O: OutputSink> RunState<I, O> {
    /// Machine with preloaded memory and freshly reset registers.
    pub fn new(mem: Memory, input: I, output: O) -> Self {
        RunState {
            mem,
            regs: Registers::new(),
            status: Status::Running,
            features: Features::default(),
            cycles: 0,
            input,
            output,
        }
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed. Any error leaves the machine [`Status::Faulted`].
    pub fn step(&mut self) -> Result<Instruction, RunError> {
        if self.status != Status::Running {
            return Err(RunError::NotRunning(self.status));
        }
        let result = self.fetch_execute();
        if result.is_err() {
            self.status = Status::Faulted;
        }
        result
    }

    fn fetch_execute(&mut self) -> Result<Instruction, RunError> {
        let pc = self.regs.pc();
        let word = self.mem.read(pc, &mut self.input)?;
        // PC incremented before instruction is performed
        self.regs.increment_pc();
        let instr = Instruction::decode(word);
        self.execute(instr, word, pc)?;
        self.cycles += 1;
        Ok(instr)
    }

    /// Run until `HALT` or a fatal error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, RunError> {
        let start_cycles = self.cycles;
        while self.status == Status::Running {
            self.step()?;
        }
        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_for(&mut self, max_cycles: u64) -> Result<u64, RunError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);
        while self.status == Status::Running && self.cycles < limit {
            self.step()?;
        }
        Ok(self.cycles - start_cycles)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// `pc` is the address `word` was fetched from.
    fn execute(&mut self, instr: Instruction, word: u16, pc: u16) -> Result<(), RunError> {
        match instr {
            Instruction::Add { dest, src, operand } => {
                let res = self.regs.get(src).wrapping_add(self.operand(operand));
                self.regs.set_with_flags(dest, res);
            }
            Instruction::And { dest, src, operand } => {
                let res = self.regs.get(src) & self.operand(operand);
                self.regs.set_with_flags(dest, res);
            }
            Instruction::Not { dest, src } => {
                let res = !self.regs.get(src);
                self.regs.set_with_flags(dest, res);
            }
            Instruction::Br { cond, offset } => {
                if cond.matches(self.regs.flag()) {
                    self.regs.set_pc(self.pc_offset(offset));
                }
            }
            Instruction::Jmp { base } => {
                self.regs.set_pc(self.regs.get(base));
            }
            Instruction::Jsr { target } => {
                // Read the base first, in case it is R7
                let dest = match target {
                    JumpTarget::Offset(offset) => self.pc_offset(offset),
                    JumpTarget::Register(base) => self.regs.get(base),
                };
                self.regs.set(Register::R7, self.regs.pc());
                self.regs.set_pc(dest);
            }
            Instruction::Ld { dest, offset } => {
                let val = self.load(self.pc_offset(offset))?;
                self.regs.set_with_flags(dest, val);
            }
            Instruction::Ldi { dest, offset } => {
                let ptr = self.load(self.pc_offset(offset))?;
                let val = self.load(ptr)?;
                self.regs.set_with_flags(dest, val);
            }
            Instruction::Ldr { dest, base, offset } => {
                let addr = self.regs.get(base).wrapping_add(offset);
                let val = self.load(addr)?;
                self.regs.set_with_flags(dest, val);
            }
            Instruction::Lea { dest, offset } => {
                let addr = self.pc_offset(offset);
                self.regs.set_with_flags(dest, addr);
            }
            Instruction::St { src, offset } => {
                self.mem.write(self.pc_offset(offset), self.regs.get(src));
            }
            Instruction::Sti { src, offset } => {
                let ptr = self.load(self.pc_offset(offset))?;
                self.mem.write(ptr, self.regs.get(src));
            }
            Instruction::Str { src, base, offset } => {
                let addr = self.regs.get(base).wrapping_add(offset);
                self.mem.write(addr, self.regs.get(src));
            }
            Instruction::Trap { vector } => self.trap(vector, pc)?,
            Instruction::Rti | Instruction::Res => {
                return Err(RunError::IllegalInstruction { instr: word, pc });
            }
        }
        Ok(())
    }

    #[inline]
    fn operand(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Register(reg) => self.regs.get(reg),
            Operand::Immediate(imm) => imm,
        }
    }

    /// Address relative to the already incremented PC.
    #[inline]
    fn pc_offset(&self, offset: u16) -> u16 {
        self.regs.pc().wrapping_add(offset)
    }

    #[inline]
    pub(crate) fn load(&mut self, addr: u16) -> Result<u16, RunError> {
        Ok(self.mem.read(addr, &mut self.input)?)
    }
}
