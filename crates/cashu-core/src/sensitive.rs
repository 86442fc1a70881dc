//! Sensitive byte buffers
//!
//! Wrapper for private material (seeds, blinding factors, derived scalars)
//! that is wiped when dropped and compared in constant time.

use core::fmt;
use std::ops::Deref;

use zeroize::Zeroize;

/// Byte buffer holding secret material. Wiped on drop with a triple pass
/// (zero, random, zero).
#[derive(Clone, Default)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    /// Wrap bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Bytes as slice
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Length of the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time equality against another byte slice
    pub fn ct_eq(&self, other: &[u8]) -> bool {
        constant_time_eq(&self.0, other)
    }

    /// Wipe the buffer now rather than waiting for drop
    pub fn wipe(&mut self) {
        use rand::RngCore;

        self.0.zeroize();
        rand::thread_rng().fill_bytes(&mut self.0);
        self.0.zeroize();
    }
}

impl Deref for SensitiveBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for SensitiveBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for SensitiveBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes([REDACTED; {}])", self.0.len())
    }
}

impl Drop for SensitiveBytes {
    fn drop(&mut self) {
        self.wipe();
        tracing::trace!("Sensitive buffer dropped.");
    }
}

/// Constant-time byte comparison. Runtime depends only on the lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_wipe() {
        let mut buf = SensitiveBytes::new(vec![0xAA; 32]);
        buf.wipe();
        assert!(buf.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_redacted_debug() {
        let buf = SensitiveBytes::new(vec![1, 2, 3]);
        let out = format!("{buf:?}");
        assert!(!out.contains('1'));
        assert!(out.contains("REDACTED"));
    }
}
