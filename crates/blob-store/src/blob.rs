//! Owned byte buffers

use rand::RngCore;
use std::fmt;

/// An immutable byte buffer representing one unit of payload.
///
/// A `Blob` is deliberately not `Clone`: once handed to a store, the store is
/// the only owner and the buffer is freed when the entry is evicted or cleared.
pub struct Blob {
    data: Box<[u8]>,
}

impl Blob {
    pub fn new(data: impl Into<Box<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    /// A blob of `len` zero bytes
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    /// A blob of `len` random bytes.
    ///
    /// Filling the buffer forces every page to be touched, so the allocation
    /// is real memory pressure and not a lazily mapped zero page.
    pub fn random(len: usize) -> Self {
        let mut data = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut data);
        Self::new(data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob").field("len", &self.data.len()).finish()
    }
}
