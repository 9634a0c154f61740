//! Certificate serial numbers.

use std::fmt;

use data_encoding::HEXLOWER;
use rand::rngs::OsRng;
use rand::RngCore;

/// A 128-bit certificate serial number.
///
/// Each authority starts from a random value with the top bit set and counts
/// up by one per issued certificate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerialNumber(u128);

impl SerialNumber {
    /// A random 128-bit starting point with the most significant bit set.
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        Self(u128::from_be_bytes(bytes) | (1 << 127))
    }

    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    /// The following serial, or `None` once the space is exhausted.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Big-endian magnitude without leading zero bytes.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        let bytes = self.0.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        bytes[first..].to_vec()
    }

    /// Parse a big-endian magnitude, ignoring leading zero bytes.
    ///
    /// Returns `None` if the value does not fit in 128 bits.
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let significant = &bytes[first..];
        if significant.len() > 16 {
            return None;
        }
        let mut buf = [0u8; 16];
        buf[16 - significant.len()..].copy_from_slice(significant);
        Some(Self(u128::from_be_bytes(buf)))
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&HEXLOWER.encode(&self.to_be_bytes()))
    }
}

impl fmt::Debug for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerialNumber({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_has_top_bit_set() {
        for _ in 0..16 {
            assert!(SerialNumber::random().value() >> 127 == 1);
        }
    }

    #[test]
    fn next_increments_by_one() {
        let s = SerialNumber::new(41);
        assert_eq!(s.next(), Some(SerialNumber::new(42)));
    }

    #[test]
    fn next_stops_at_max() {
        assert_eq!(SerialNumber::new(u128::MAX).next(), None);
    }

    #[test]
    fn be_bytes_are_minimal() {
        assert_eq!(SerialNumber::new(0).to_be_bytes(), vec![0]);
        assert_eq!(SerialNumber::new(0x0102).to_be_bytes(), vec![1, 2]);
        assert_eq!(SerialNumber::new(u128::MAX).to_be_bytes().len(), 16);
    }

    #[test]
    fn from_be_slice_skips_leading_zeros() {
        let s = SerialNumber::random();
        let mut padded = vec![0u8];
        padded.extend(s.to_be_bytes());
        assert_eq!(SerialNumber::from_be_slice(&padded), Some(s));
    }

    #[test]
    fn from_be_slice_rejects_oversized() {
        assert_eq!(SerialNumber::from_be_slice(&[1u8; 17]), None);
    }
}
