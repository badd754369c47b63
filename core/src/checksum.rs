//! MD5 digest framing an aggregated payload.
//!
//! The digest covers exactly the protobuf body: the bytes between the magic
//! prefix and the trailing digest itself.

use md5::{Digest as _, Md5};

use crate::constants::DIGEST_LEN;

/// Compute the 16-byte digest of a serialized body.
#[inline]
pub fn compute(body: &[u8]) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&Md5::digest(body));
    out
}

/// Check `digest` against the digest of `body`.
///
/// A digest of the wrong length never verifies.
#[inline]
pub fn verify(body: &[u8], digest: &[u8]) -> bool {
    digest.len() == DIGEST_LEN && compute(body)[..] == *digest
}
