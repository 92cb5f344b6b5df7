use std::collections::VecDeque;
use std::io::{self, BufReader, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Source of keyboard input for the machine.
pub trait InputDevice {
    /// Take the next character if one is ready, without waiting.
    fn poll(&mut self) -> io::Result<Option<u8>>;

    /// Wait for the next character.
    ///
    /// `Ok(None)` means the input has ended and no character will ever arrive.
    fn block_read(&mut self) -> io::Result<Option<u8>>;
}

/// Destination of console output from the machine.
pub trait OutputSink {
    fn write(&mut self, byte: u8) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: InputDevice + ?Sized> InputDevice for &mut T {
    fn poll(&mut self) -> io::Result<Option<u8>> {
        (**self).poll()
    }
    fn block_read(&mut self) -> io::Result<Option<u8>> {
        (**self).block_read()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write(&mut self, byte: u8) -> io::Result<()> {
        (**self).write(byte)
    }
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Collects output in memory.
impl OutputSink for Vec<u8> {
    fn write(&mut self, byte: u8) -> io::Result<()> {
        self.push(byte);
        Ok(())
    }
}

/// Input fed from a fixed sequence of bytes.
///
/// Every byte is immediately available to `poll`. Once exhausted, `block_read`
/// reports the end of input.
#[derive(Debug, Default, Clone)]
pub struct BufferedInput {
    bytes: VecDeque<u8>,
}

impl BufferedInput {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            bytes: bytes.as_ref().iter().copied().collect(),
        }
    }

    pub fn push(&mut self, byte: u8) {
        self.bytes.push_back(byte);
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl InputDevice for BufferedInput {
    fn poll(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }

    fn block_read(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }
}

/// Input read from a byte stream on a background thread.
///
/// `poll` never waits on the stream. A read failure is reported once, after which the input has
/// ended.
pub struct StreamInput {
    bytes: Receiver<io::Result<u8>>,
}

impl StreamInput {
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> Self {
        let (sender, bytes) = mpsc::channel();
        thread::spawn(move || {
            for byte in BufReader::new(reader).bytes() {
                let failed = byte.is_err();
                // Receiver gone, nobody is listening anymore
                if sender.send(byte).is_err() || failed {
                    break;
                }
            }
        });
        Self { bytes }
    }
}

impl InputDevice for StreamInput {
    fn poll(&mut self) -> io::Result<Option<u8>> {
        match self.bytes.try_recv() {
            Ok(byte) => byte.map(Some),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Ok(None),
        }
    }

    fn block_read(&mut self) -> io::Result<Option<u8>> {
        match self.bytes.recv() {
            Ok(byte) => byte.map(Some),
            // Sender dropped at end of stream
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out its bytes only once released.
    struct Gated {
        release: Receiver<()>,
        bytes: &'static [u8],
    }

    impl Read for Gated {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.bytes.is_empty() {
                return Ok(0);
            }
            let _ = self.release.recv();
            let len = self.bytes.len().min(buf.len());
            buf[..len].copy_from_slice(&self.bytes[..len]);
            self.bytes = &self.bytes[len..];
            Ok(len)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
        }
    }

    #[test]
    fn stream_poll_does_not_wait() {
        let (release, gate) = mpsc::channel();
        let mut input = StreamInput::spawn(Gated {
            release: gate,
            bytes: b"ok",
        });
        assert_eq!(input.poll().unwrap(), None);

        release.send(()).unwrap();
        assert_eq!(input.block_read().unwrap(), Some(b'o'));
        assert_eq!(input.block_read().unwrap(), Some(b'k'));
        assert_eq!(input.block_read().unwrap(), None);
        assert_eq!(input.poll().unwrap(), None);
    }

    #[test]
    fn stream_failure_ends_input() {
        let mut input = StreamInput::spawn(Broken);
        let err = input.block_read().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(input.block_read().unwrap(), None);
    }

    #[test]
    fn buffered_input_drains() {
        let mut input = BufferedInput::new("ab");
        assert_eq!(input.poll().unwrap(), Some(b'a'));
        input.push(b'c');
        assert_eq!(input.remaining(), 2);
        assert_eq!(input.block_read().unwrap(), Some(b'b'));
        assert_eq!(input.block_read().unwrap(), Some(b'c'));
        assert_eq!(input.block_read().unwrap(), None);
        assert_eq!(input.poll().unwrap(), None);
    }

    #[test]
    fn vec_sink_through_reference() {
        let mut out = Vec::new();
        {
            let mut sink = &mut out;
            OutputSink::write(&mut sink, b'h').unwrap();
            OutputSink::write(&mut sink, b'i').unwrap();
            OutputSink::flush(&mut sink).unwrap();
        }
        assert_eq!(out, b"hi");
    }
}
