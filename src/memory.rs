use std::io;

use crate::device::InputDevice;

/// LC3 can address 128KB of memory.
pub const MEMORY_MAX: usize = 0x10000;

/// Keyboard status register. Bit 15 is set while a character is waiting in [`KBDR`].
pub const KBSR: u16 = 0xFE00;
/// Keyboard data register. Holds the last character polled from the keyboard.
pub const KBDR: u16 = 0xFE02;

/// Flat 16-bit address space. Every address is valid.
#[derive(Clone)]
pub struct Memory {
    mem: Box<[u16; MEMORY_MAX]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            mem: Box::new([0; MEMORY_MAX]),
        }
    }

    /// Read a cell as the processor does.
    ///
    /// Reading [`KBSR`] polls `input` first, latching any available character into [`KBDR`].
    pub fn read(&mut self, addr: u16, input: &mut impl InputDevice) -> io::Result<u16> {
        if addr == KBSR {
            match input.poll()? {
                Some(ch) => {
                    self.write(KBSR, 1 << 15);
                    self.write(KBDR, ch as u16);
                }
                None => self.write(KBSR, self.get(KBSR) & 0x7FFF),
            }
        }
        Ok(self.get(addr))
    }

    /// Read a cell without any device side effects.
    #[inline]
    pub fn get(&self, addr: u16) -> u16 {
        self.mem[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u16) {
        self.mem[addr as usize] = val;
    }

    /// Copy `words` into consecutive cells starting at `origin`, wrapping past `0xFFFF`.
    pub fn load(&mut self, origin: u16, words: impl IntoIterator<Item = u16>) -> usize {
        let mut count = 0;
        for (addr, word) in (0..=u16::MAX).cycle().skip(origin as usize).zip(words) {
            self.write(addr, word);
            count += 1;
        }
        count
    }
}
