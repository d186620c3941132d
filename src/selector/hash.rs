//! Hash functions used for server selection

use adler::Adler32;
use md5::{Digest, Md5};

/// Adler-32 checksum of `key`, used by the modulo selector
pub fn adler32(key: &[u8]) -> u32 {
    let mut hasher = Adler32::new();
    hasher.write_slice(key);
    hasher.checksum()
}

/// Ring coordinate of `key`: Adler-32 of the lowercase hex MD5 digest.
///
/// Virtual node positions and key lookups both go through this function,
/// so node placement stays compatible with other clients using the same scheme.
pub fn ring_hash(key: &[u8]) -> u32 {
    let digest = format!("{:x}", Md5::digest(key));
    adler32(digest.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(adler32(b""), 1);
        assert_eq!(adler32(b"a"), 0x0062_0062);
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn test_ring_hash_goes_through_hex_digest() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(ring_hash(b""), adler32(b"d41d8cd98f00b204e9800998ecf8427e"));
        assert_eq!(ring_hash(b"id"), ring_hash(b"id"));
        assert_ne!(ring_hash(b"id"), ring_hash(b"ie"));
    }
}
