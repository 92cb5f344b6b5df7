use std::cmp::Ordering;
use std::fmt;

/// Address execution starts from after a reset.
pub const PC_START: u16 = 0x3000;

/// Index of a general purpose register.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    /// Holds the return address after `JSR`/`JSRR`.
    R7,
}

impl Register {
    pub const ALL: [Register; 8] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    /// Register selected by the 3-bit field of `word` starting at bit `shift`.
    #[inline]
    pub fn from_field(word: u16, shift: u32) -> Self {
        Self::ALL[((word >> shift) & 0b111) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}

/// Condition code. Exactly one is held at any time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flag {
    N = 0b100,
    Z = 0b010,
    P = 0b001,
}

impl Flag {
    /// Condition code describing `val` as a signed 16-bit integer.
    pub fn of(val: u16) -> Self {
        match (val as i16).cmp(&0) {
            Ordering::Less => Flag::N,
            Ordering::Equal => Flag::Z,
            Ordering::Greater => Flag::P,
        }
    }

    /// Bit of this flag within the `nzp` field of a `BR` instruction.
    pub fn bits(self) -> u16 {
        self as u16
    }
}

/// General purpose registers, program counter and condition code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    reg: [u16; 8],
    pc: u16,
    flag: Flag,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            reg: [0; 8],
            pc: PC_START,
            flag: Flag::Z,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn get(&self, reg: Register) -> u16 {
        self.reg[reg.index()]
    }

    #[inline]
    pub fn set(&mut self, reg: Register, val: u16) {
        self.reg[reg.index()] = val;
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Move past the word just fetched, wrapping at the end of memory.
    #[inline]
    pub fn increment_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    #[inline]
    pub fn flag(&self) -> Flag {
        self.flag
    }

    /// Recompute the condition code from the current value of `reg`.
    #[inline]
    pub fn update_flags(&mut self, reg: Register) {
        self.flag = Flag::of(self.get(reg));
    }

    /// Write `val` to `reg` and set the condition code from it.
    #[inline]
    pub fn set_with_flags(&mut self, reg: Register, val: u16) {
        self.set(reg, val);
        self.update_flags(reg);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        Register::ALL.into_iter().map(|reg| (reg, self.get(reg)))
    }
}
