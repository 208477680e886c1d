//! Random identifiers for archive part names.

use rand::RngCore;

/// Source of low-collision hex identifiers.
pub trait IdGenerator {
    /// Return `len` lowercase hex characters.
    fn hex(&self, len: usize) -> String;
}

/// Identifiers drawn from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn hex(&self, len: usize) -> String {
        let mut bytes = vec![0u8; len.div_ceil(2)];
        rand::thread_rng().fill_bytes(&mut bytes);
        let mut out = hex::encode(bytes);
        out.truncate(len);
        out
    }
}
