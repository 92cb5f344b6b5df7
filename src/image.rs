use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::LoadError;
use crate::memory::Memory;

/// Placement of a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loaded {
    pub origin: u16,
    /// Words placed after the origin word.
    pub len: usize,
}

/// Place a binary image into memory.
///
/// The image is a stream of big-endian words. The first is the origin address, the rest fill
/// consecutive cells from there.
pub fn load_image(mut reader: impl Read, mem: &mut Memory) -> Result<Loaded, LoadError> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        return Err(LoadError::Empty);
    }
    if buffer.len() % 2 != 0 {
        return Err(LoadError::Truncated { len: buffer.len() });
    }

    let mut words = buffer
        .chunks_exact(2)
        .map(|word| u16::from_be_bytes([word[0], word[1]]));
    // Length checked above
    let Some(origin) = words.next() else {
        return Err(LoadError::Empty);
    };
    let len = mem.load(origin, words);
    Ok(Loaded { origin, len })
}

pub fn load_file(path: impl AsRef<Path>, mem: &mut Memory) -> Result<Loaded, LoadError> {
    let file = File::open(path)?;
    load_image(BufReader::new(file), mem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_at_origin() {
        let mut mem = Memory::new();
        let bytes: [u8; 6] = [0x30, 0x00, 0x10, 0x25, 0xf0, 0x25];
        let loaded = load_image(&bytes[..], &mut mem).unwrap();
        assert_eq!(loaded, Loaded { origin: 0x3000, len: 2 });
        assert_eq!(mem.get(0x3000), 0x1025);
        assert_eq!(mem.get(0x3001), 0xf025);
        assert_eq!(mem.get(0x3002), 0);
    }

    #[test]
    fn origin_only() {
        let mut mem = Memory::new();
        let loaded = load_image(&[0x40u8, 0x00][..], &mut mem).unwrap();
        assert_eq!(loaded, Loaded { origin: 0x4000, len: 0 });
    }

    #[test]
    fn wraps_past_end() {
        let mut mem = Memory::new();
        let bytes: [u8; 6] = [0xff, 0xff, 0x00, 0x01, 0x00, 0x02];
        load_image(&bytes[..], &mut mem).unwrap();
        assert_eq!(mem.get(0xffff), 1);
        assert_eq!(mem.get(0x0000), 2);
    }

    #[test]
    fn rejects_bad_streams() {
        let mut mem = Memory::new();
        assert!(matches!(
            load_image(&[0u8; 0][..], &mut mem),
            Err(LoadError::Empty)
        ));
        assert!(matches!(
            load_image(&[0x30u8][..], &mut mem),
            Err(LoadError::Truncated { len: 1 })
        ));
        assert!(matches!(
            load_image(&[0x30u8, 0x00, 0x12][..], &mut mem),
            Err(LoadError::Truncated { len: 3 })
        ));
    }

    #[test]
    fn later_images_overwrite() {
        let mut mem = Memory::new();
        load_image(&[0x30u8, 0x00, 0x00, 0x01, 0x00, 0x02][..], &mut mem).unwrap();
        load_image(&[0x30u8, 0x01, 0x00, 0x09][..], &mut mem).unwrap();
        assert_eq!(mem.get(0x3000), 1);
        assert_eq!(mem.get(0x3001), 9);
    }

    #[test]
    fn missing_file() {
        let mut mem = Memory::new();
        let result = load_file("tests/files/does_not_exist.obj", &mut mem);
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
