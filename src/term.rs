use std::io::{self, stdin, stdout, IsTerminal, Stdout, Write};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEvent},
    terminal,
};

use crate::device::{InputDevice, OutputSink, StreamInput};

/// Raw mode for the lifetime of the value.
///
/// Dropping restores the previous mode, including while unwinding.
pub struct RawMode {
    was_raw: bool,
}

impl RawMode {
    pub fn enable() -> io::Result<Self> {
        let was_raw = terminal::is_raw_mode_enabled()?;
        if !was_raw {
            terminal::enable_raw_mode()?;
        }
        Ok(RawMode { was_raw })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if !self.was_raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Console of the process.
///
/// The terminal stays in its normal mode while the machine computes, so `Ctrl+C` and output
/// behave as usual. Raw mode is only held while waiting on a key.
pub struct Terminal {
    interactive: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Terminal {
            interactive: stdin().is_terminal(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Keyboard input. An interactive stdin is read key by key, anything else as a byte stream.
    pub fn keyboard(&self) -> Keyboard {
        if self.interactive {
            Keyboard::Keys {
                buffered: Vec::new(),
            }
        } else {
            Keyboard::Stream(StreamInput::spawn(stdin()))
        }
    }

    pub fn console(&self) -> Console {
        Console { stdout: stdout() }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

pub enum Keyboard {
    Keys {
        /// Remaining bytes of a multi-byte character, in order.
        buffered: Vec<u8>,
    },
    Stream(StreamInput),
}

impl InputDevice for Keyboard {
    fn poll(&mut self) -> io::Result<Option<u8>> {
        match self {
            Keyboard::Keys { buffered } => read_key_byte(buffered, Some(Duration::ZERO)),
            Keyboard::Stream(stream) => stream.poll(),
        }
    }

    fn block_read(&mut self) -> io::Result<Option<u8>> {
        match self {
            Keyboard::Keys { buffered } => read_key_byte(buffered, None),
            Keyboard::Stream(stream) => stream.block_read(),
        }
    }
}

pub struct Console {
    stdout: Stdout,
}

impl OutputSink for Console {
    fn write(&mut self, byte: u8) -> io::Result<()> {
        self.stdout.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

/// Next byte typed on the keyboard, waiting up to `timeout` (forever if `None`).
///
/// Raw mode is held only for the duration of the read.
fn read_key_byte(buffered: &mut Vec<u8>, timeout: Option<Duration>) -> io::Result<Option<u8>> {
    if !buffered.is_empty() {
        return Ok(Some(buffered.remove(0)));
    }
    let _raw = RawMode::enable()?;
    loop {
        if let Some(timeout) = timeout {
            if !event::poll(timeout)? {
                return Ok(None);
            }
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        let Some(ch) = key_char(key)? else {
            if timeout.is_some() {
                return Ok(None);
            }
            continue;
        };
        // Multi-byte characters are handed out one byte per read
        let mut bytes = [0u8; 4];
        let encoded = ch.encode_utf8(&mut bytes).as_bytes();
        buffered.extend_from_slice(&encoded[1..]);
        return Ok(Some(encoded[0]));
    }
}

/// Character typed by a key press, if it produces one.
///
/// `Ctrl+C` is reported as [`io::ErrorKind::Interrupted`].
fn key_char(event: KeyEvent) -> io::Result<Option<char>> {
    use event::{KeyCode, KeyEventKind, KeyModifiers as Mod};

    if matches!(event.kind, KeyEventKind::Release) {
        return Ok(None);
    }

    let ch = match (event.modifiers, event.code) {
        (Mod::CONTROL, KeyCode::Char('c')) => {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        }
        (_, KeyCode::Enter) => '\n',
        (_, KeyCode::Backspace) => '\x08',
        (_, KeyCode::Tab) => '\t',
        (_, KeyCode::Esc) => '\x1b',
        (Mod::NONE | Mod::SHIFT, KeyCode::Char(ch)) => ch,
        _ => return Ok(None),
    };
    Ok(Some(ch))
}
