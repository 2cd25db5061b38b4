//! Marshaling between `Vec<f32>` embeddings and the `BLOB` column `cairn-storage`'s SQLite schema
//! stores them in. Every embedding is a fixed-length, little-endian `f32` sequence; [`zerocopy`]
//! gives per-element encode/decode without a textual or length-prefixed framing, at the cost of not
//! assuming the `BLOB`'s byte buffer is 4-byte aligned (SQLite gives no such guarantee), so decode
//! reads element-by-element rather than reinterpreting the whole buffer as `&[f32]` in place.

use zerocopy::{FromBytes, Immutable, IntoBytes};

/// Encode a vector into its little-endian byte representation for storage
/// in a SQLite `BLOB` column.
#[must_use]
pub fn encode(vector: &[f32]) -> Vec<u8> {
    vector.as_bytes().to_vec()
}

/// Decode a `BLOB` column back into an embedding. Returns `None` if the
/// byte length is not a multiple of 4 -- a corrupt or truncated row rather
/// than a valid embedding of some dimension.
#[must_use]
pub fn decode(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    bytes.chunks_exact(4).map(|chunk| f32::read_from_bytes(chunk).ok()).collect()
}

const _: fn() = || {
    fn assert_impl<T: FromBytes + IntoBytes + Immutable>() {}
    assert_impl::<f32>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_vector() {
        let original = vec![0.1_f32, -0.5, 1.0, 0.0];
        let bytes = encode(&original);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn rejects_truncated_bytes() {
        assert!(decode(&[0, 1, 2]).is_none());
    }
}
