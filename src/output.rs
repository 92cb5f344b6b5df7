use std::fmt::Write;
use std::path::Path;

use colored::Colorize;

use crate::decode::Instruction;
use crate::registers::Registers;

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

/// Host-side status lines, kept on stderr so program output is untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Output {
    /// Produce minimal output, suited for blackbox tests.
    pub minimal: bool,
}

impl Output {
    pub fn new(minimal: bool) -> Self {
        Output { minimal }
    }

    pub fn message(&self, color: MsgColor, left: &str, right: &str) {
        if self.minimal {
            return;
        }
        let left = match color {
            MsgColor::Green => left.green(),
            MsgColor::Cyan => left.cyan(),
            MsgColor::Red => left.red(),
        };
        eprintln!("{left:>12} {right}");
    }

    pub fn file_message(&self, color: MsgColor, left: &str, right: &Path) {
        let right = format!("target {}", right.display());
        self.message(color, left, &right);
    }

    /// One executed instruction, with the address it was fetched from.
    pub fn trace(&self, pc: u16, instr: &Instruction) {
        eprintln!("{}", trace_line(pc, instr));
    }

    pub fn print_registers(&self, regs: &Registers) {
        eprint!("{}", register_table(regs, self.minimal));
    }
}

pub fn trace_line(pc: u16, instr: &Instruction) -> String {
    format!("0x{pc:04x}  {instr}")
}

/// Register contents, as a box or in a plain `R0 5` form when minimal.
pub fn register_table(regs: &Registers, minimal: bool) -> String {
    let mut out = String::new();
    if minimal {
        for (reg, val) in regs.iter() {
            let _ = writeln!(out, "{} {}", reg, val);
        }
        let _ = writeln!(out, "PC {}", regs.pc());
        let _ = writeln!(out, "CC {:03b}", regs.flag().bits());
        return out;
    }

    out.push_str("\x1b[2m┌────────────────────────────────────┐\x1b[0m\n");
    out.push_str("\x1b[2m│        \x1b[3mhex     int    uint    char\x1b[0m\x1b[2m │\x1b[0m\n");
    for (reg, val) in regs.iter() {
        let _ = writeln!(
            out,
            "\x1b[2m│\x1b[0m \x1b[1m{reg}\x1b[0m  0x{val:04x}  {:-6}  {val:-6}  {} \x1b[2m│\x1b[0m",
            val as i16,
            char_display(val),
        );
    }
    let _ = writeln!(
        out,
        "\x1b[2m│\x1b[0m \x1b[1mPC\x1b[0m  0x{:04x}                 \x1b[1mCC\x1b[0m  {:03b} \x1b[2m│\x1b[0m",
        regs.pc(),
        regs.flag().bits(),
    );
    out.push_str("\x1b[2m└────────────────────────────────────┘\x1b[0m\n");
    out
}

/// Three column wide rendering of a value as a character.
fn char_display(value: u16) -> String {
    let shown = match value {
        // ASCII control characters which are arbitrarily considered significant
        0x00 => "NUL",
        0x08 => "BS ",
        0x09 => "HT ",
        0x0a => "LF ",
        0x0b => "VT ",
        0x0c => "FF ",
        0x0d => "CR ",
        0x1b => "ESC",
        0x7f => "DEL",

        // Space
        0x20 => "[_]",

        // Printable ASCII characters
        0x21..=0x7e => return format!("   {:<3}", value as u8 as char),

        // Any ASCII character not already matched (unimportant control characters)
        0x00..=0x7f => "\x1b[2m───\x1b[0m",
        // Any non-ASCII character
        0x0080.. => "\x1b[2m┄┄┄\x1b[0m",
    };
    format!("   {shown}")
}
