// crates/nexus-core/src/token.rs
//
// Opaque tokens standing in for block hashes and vote signatures.
//
// These carry no cryptographic meaning and are never verified. They only
// need to look like identifiers and be unique enough for display.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a vote signature token.
pub const SIGNATURE_TOKEN_LEN: usize = 16;

/// Generate an opaque block hash for a round.
///
/// SHA-256 over the round number, proposer id, and a random nonce, hex-encoded.
pub fn block_hash_token<R: Rng + ?Sized>(round_number: u64, proposer: &str, rng: &mut R) -> String {
    let nonce: [u8; 16] = rng.gen();
    let mut hasher = Sha256::new();
    hasher.update(round_number.to_be_bytes());
    hasher.update(proposer.as_bytes());
    hasher.update(nonce);
    hex::encode(hasher.finalize())
}

/// Generate an opaque vote signature token.
pub fn signature_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_alphanumeric(rng, SIGNATURE_TOKEN_LEN)
}

/// Random alphanumeric string of the given length.
pub fn random_alphanumeric<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}
