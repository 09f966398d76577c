use serde::{Deserialize, Serialize};

/// Maximum number of entries in the constant pool and the string pool.
/// Both are addressed by one-byte immediates.
pub const POOL_MAX: usize = 256;

/// A compiled bytecode chunk.
///
/// A chunk is an append-only byte vector plus two pools: constants
/// (IEEE-754 doubles) and strings (owned, interned). Pool entries are never
/// removed and indices stay stable, so emitted immediates remain valid for
/// the chunk's lifetime.
///
/// Chunks serialize with `postcard` for the `.vnb` on-disk form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub constants: Vec<f64>,
    pub strings: Vec<String>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one byte and returns its address.
    pub fn write(&mut self, byte: u8) -> usize {
        self.code.push(byte);
        self.code.len() - 1
    }

    /// Interns a constant: linear scan, return the existing index on a hit,
    /// append on a miss. `None` when the pool is full.
    pub fn add_constant(&mut self, constant: f64) -> Option<u8> {
        for (i, c) in self.constants.iter().enumerate() {
            if *c == constant {
                return Some(i as u8);
            }
        }
        if self.constants.len() >= POOL_MAX {
            return None;
        }
        let idx = self.constants.len() as u8;
        self.constants.push(constant);
        Some(idx)
    }

    /// Interns a string by value equality. `None` when the pool is full.
    pub fn add_string(&mut self, string: &str) -> Option<u8> {
        for (i, s) in self.strings.iter().enumerate() {
            if s == string {
                return Some(i as u8);
            }
        }
        if self.strings.len() >= POOL_MAX {
            return None;
        }
        let idx = self.strings.len() as u8;
        self.strings.push(string.to_string());
        Some(idx)
    }

    /// Writes `delta` big-endian into the two bytes immediately after the
    /// jump opcode at `addr`. Patching never shifts code; the placeholder
    /// reserved the exact space.
    pub fn patch_i16(&mut self, addr: usize, delta: i16) {
        let bytes = delta.to_be_bytes();
        self.code[addr + 1] = bytes[0];
        self.code[addr + 2] = bytes[1];
    }

    /// Decodes the big-endian i16 stored at `addr..addr + 2`.
    pub fn read_i16(&self, addr: usize) -> i16 {
        i16::from_be_bytes([self.code[addr], self.code[addr + 1]])
    }
}
