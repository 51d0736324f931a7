use std::path::{Path, PathBuf};

pub const WORD_SIZE: usize = 4;
pub const STACK_SIZE: usize = 256;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("cannot read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("code size {len} is not a multiple of 4 bytes")]
    Misaligned { len: usize },
}

/// Read-only program bytes, a whole number of instruction words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeImage {
    bytes: Vec<u8>,
}

impl CodeImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LoadError> {
        if bytes.len() % WORD_SIZE != 0 {
            return Err(LoadError::Misaligned { len: bytes.len() });
        }
        Ok(Self { bytes })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len_words(&self) -> usize {
        self.bytes.len() / WORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Big-endian word at instruction `index`, or `None` past the end.
    pub fn fetch(&self, index: usize) -> Option<u32> {
        let off = index.checked_mul(WORD_SIZE)?;
        let b = self.bytes.get(off..off.checked_add(WORD_SIZE)?)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn word_bytes(&self, index: usize) -> Option<&[u8]> {
        let off = index.checked_mul(WORD_SIZE)?;
        self.bytes.get(off..off.checked_add(WORD_SIZE)?)
    }
}

/// 256-byte stack addressed by an 8-bit pointer; every index is in bounds.
#[derive(Clone, PartialEq, Eq)]
pub struct Stack {
    cells: [u8; STACK_SIZE],
}

impl Stack {
    pub fn new() -> Self {
        Self {
            cells: [0; STACK_SIZE],
        }
    }

    pub fn read(&self, idx: u8) -> u8 {
        self.cells[idx as usize]
    }

    pub fn write(&mut self, idx: u8, val: u8) {
        self.cells[idx as usize] = val;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.cells.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        f.debug_struct("Stack")
            .field("nonzero_prefix", &&self.cells[..used])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_assembles_big_endian_words() {
        let code = CodeImage::from_bytes(vec![0x04, 0x00, 0x07, 0x01, 0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(code.len_words(), 2);
        assert_eq!(code.fetch(0), Some(0x0400_0701));
        assert_eq!(code.fetch(1), Some(0xAABB_CCDD));
        assert_eq!(code.fetch(2), None);
        assert_eq!(code.fetch(usize::MAX), None);
    }

    #[test]
    fn partial_words_are_rejected() {
        for len in [1usize, 2, 3, 5, 7] {
            let err = CodeImage::from_bytes(vec![0; len]).unwrap_err();
            assert!(matches!(err, LoadError::Misaligned { len: l } if l == len));
        }
        assert!(CodeImage::from_bytes(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn stack_cells_cover_every_pointer_value() {
        let mut stack = Stack::new();
        stack.write(255, 9);
        stack.write(0, 4);
        assert_eq!(stack.read(255), 9);
        assert_eq!(stack.read(0), 4);
        assert_eq!(stack.as_slice().len(), STACK_SIZE);
    }
}
