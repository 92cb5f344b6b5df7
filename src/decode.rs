use std::fmt;

use crate::registers::{Flag, Register};

/// Reinterpret the low `bits` bits of `val` as a two's complement integer.
#[inline]
pub fn sign_extend(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits < 16);
    // Sign bit
    let sign = val & (1u16 << (bits - 1));
    // Bits lower than sign bit
    let magnitude = val & ((1u16 << bits) - 1);
    // Positive input: all bits unset; 0x0000
    // Negative input: sign bit and above will be set, lower bits will be reset
    //      Eg. bits=14 -> 0xE000
    let sign_extension = (!sign).wrapping_add(1); // sign * -1
    magnitude | sign_extension
}

/// Top four bits of an instruction word.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Br = 0x0,
    Add = 0x1,
    Ld = 0x2,
    St = 0x3,
    Jsr = 0x4,
    And = 0x5,
    Ldr = 0x6,
    Str = 0x7,
    Rti = 0x8,
    Not = 0x9,
    Ldi = 0xA,
    Sti = 0xB,
    Jmp = 0xC,
    Res = 0xD,
    Lea = 0xE,
    Trap = 0xF,
}

impl Opcode {
    const TABLE: [Opcode; 16] = [
        Opcode::Br,
        Opcode::Add,
        Opcode::Ld,
        Opcode::St,
        Opcode::Jsr,
        Opcode::And,
        Opcode::Ldr,
        Opcode::Str,
        Opcode::Rti,
        Opcode::Not,
        Opcode::Ldi,
        Opcode::Sti,
        Opcode::Jmp,
        Opcode::Res,
        Opcode::Lea,
        Opcode::Trap,
    ];

    #[inline]
    pub fn of(word: u16) -> Self {
        Self::TABLE[(word >> 12) as usize]
    }
}

/// The `nzp` field of a `BR` instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CondMask(u16);

impl CondMask {
    pub fn new(bits: u16) -> Self {
        CondMask(bits & 0b111)
    }

    pub fn matches(self, flag: Flag) -> bool {
        self.0 & flag.bits() != 0
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

impl fmt::Display for CondMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, ch) in [(Flag::N, 'n'), (Flag::Z, 'z'), (Flag::P, 'p')] {
            if self.matches(flag) {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

/// Second operand of `ADD` and `AND`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operand {
    Register(Register),
    /// Already sign extended from 5 bits.
    Immediate(u16),
}

/// Where `JSR`/`JSRR` transfers control to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpTarget {
    /// PC relative, already sign extended from 11 bits.
    Offset(u16),
    Register(Register),
}

/// Decoded instruction word. Offsets are sign extended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    Br { cond: CondMask, offset: u16 },
    Add { dest: Register, src: Register, operand: Operand },
    Ld { dest: Register, offset: u16 },
    St { src: Register, offset: u16 },
    Jsr { target: JumpTarget },
    And { dest: Register, src: Register, operand: Operand },
    Ldr { dest: Register, base: Register, offset: u16 },
    Str { src: Register, base: Register, offset: u16 },
    Rti,
    Not { dest: Register, src: Register },
    Ldi { dest: Register, offset: u16 },
    Sti { src: Register, offset: u16 },
    Jmp { base: Register },
    Res,
    Lea { dest: Register, offset: u16 },
    Trap { vector: u8 },
}

impl Instruction {
    /// Split an instruction word into its opcode and operand fields.
    pub fn decode(word: u16) -> Self {
        let reg_hi = Register::from_field(word, 9);
        let reg_mid = Register::from_field(word, 6);
        let pc_offset9 = sign_extend(word, 9);
        let operand = || {
            if word & 0b10_0000 == 0 {
                Operand::Register(Register::from_field(word, 0))
            } else {
                Operand::Immediate(sign_extend(word, 5))
            }
        };

        match Opcode::of(word) {
            Opcode::Br => Instruction::Br {
                cond: CondMask::new(word >> 9),
                offset: pc_offset9,
            },
            Opcode::Add => Instruction::Add {
                dest: reg_hi,
                src: reg_mid,
                operand: operand(),
            },
            Opcode::Ld => Instruction::Ld {
                dest: reg_hi,
                offset: pc_offset9,
            },
            Opcode::St => Instruction::St {
                src: reg_hi,
                offset: pc_offset9,
            },
            Opcode::Jsr => Instruction::Jsr {
                target: if word & 0x0800 == 0 {
                    JumpTarget::Register(reg_mid)
                } else {
                    JumpTarget::Offset(sign_extend(word, 11))
                },
            },
            Opcode::And => Instruction::And {
                dest: reg_hi,
                src: reg_mid,
                operand: operand(),
            },
            Opcode::Ldr => Instruction::Ldr {
                dest: reg_hi,
                base: reg_mid,
                offset: sign_extend(word, 6),
            },
            Opcode::Str => Instruction::Str {
                src: reg_hi,
                base: reg_mid,
                offset: sign_extend(word, 6),
            },
            Opcode::Rti => Instruction::Rti,
            Opcode::Not => Instruction::Not {
                dest: reg_hi,
                src: reg_mid,
            },
            Opcode::Ldi => Instruction::Ldi {
                dest: reg_hi,
                offset: pc_offset9,
            },
            Opcode::Sti => Instruction::Sti {
                src: reg_hi,
                offset: pc_offset9,
            },
            Opcode::Jmp => Instruction::Jmp { base: reg_mid },
            Opcode::Res => Instruction::Res,
            Opcode::Lea => Instruction::Lea {
                dest: reg_hi,
                offset: pc_offset9,
            },
            Opcode::Trap => Instruction::Trap {
                vector: (word & 0xFF) as u8,
            },
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Br { .. } => Opcode::Br,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Ld { .. } => Opcode::Ld,
            Instruction::St { .. } => Opcode::St,
            Instruction::Jsr { .. } => Opcode::Jsr,
            Instruction::And { .. } => Opcode::And,
            Instruction::Ldr { .. } => Opcode::Ldr,
            Instruction::Str { .. } => Opcode::Str,
            Instruction::Rti => Opcode::Rti,
            Instruction::Not { .. } => Opcode::Not,
            Instruction::Ldi { .. } => Opcode::Ldi,
            Instruction::Sti { .. } => Opcode::Sti,
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Res => Opcode::Res,
            Instruction::Lea { .. } => Opcode::Lea,
            Instruction::Trap { .. } => Opcode::Trap,
        }
    }
}

/// Signed offset or immediate, as written in assembly.
struct Imm(u16);

impl fmt::Display for Imm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0 as i16)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{reg}"),
            Operand::Immediate(val) => write!(f, "{}", Imm(*val)),
        }
    }
}

/// Disassembly, used for tracing.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Br { cond, offset } if cond.bits() == 0 => write!(f, "NOP {}", Imm(offset)),
            Br { cond, offset } => write!(f, "BR{cond} {}", Imm(offset)),
            Add { dest, src, operand } => write!(f, "ADD {dest}, {src}, {operand}"),
            And { dest, src, operand } => write!(f, "AND {dest}, {src}, {operand}"),
            Not { dest, src } => write!(f, "NOT {dest}, {src}"),
            Ld { dest, offset } => write!(f, "LD {dest}, {}", Imm(offset)),
            Ldi { dest, offset } => write!(f, "LDI {dest}, {}", Imm(offset)),
            Lea { dest, offset } => write!(f, "LEA {dest}, {}", Imm(offset)),
            Ldr { dest, base, offset } => write!(f, "LDR {dest}, {base}, {}", Imm(offset)),
            St { src, offset } => write!(f, "ST {src}, {}", Imm(offset)),
            Sti { src, offset } => write!(f, "STI {src}, {}", Imm(offset)),
            Str { src, base, offset } => write!(f, "STR {src}, {base}, {}", Imm(offset)),
            Jmp { base: Register::R7 } => write!(f, "RET"),
            Jmp { base } => write!(f, "JMP {base}"),
            Jsr {
                target: JumpTarget::Offset(offset),
            } => write!(f, "JSR {}", Imm(offset)),
            Jsr {
                target: JumpTarget::Register(base),
            } => write!(f, "JSRR {base}"),
            Trap { vector } => write!(f, "TRAP x{vector:02X}"),
            Rti => write!(f, "RTI"),
            Res => write!(f, "RES"),
        }
    }
}
