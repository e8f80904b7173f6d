//! Cryptographic building blocks: hashes, BIP39 mnemonics, BIP32 derivation
//! and signed messages.

pub mod hd;
pub mod message;
pub mod mnemonic;

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Double SHA-256, the chain's transaction and message digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// RIPEMD160(SHA256(data)), used for addresses and key fingerprints.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256d_empty() {
        // Double SHA-256 of the empty string is a fixed vector.
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_hash160_known_vector() {
        // HASH160 of the generator-point compressed pubkey.
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        assert_eq!(
            hex::encode(hash160(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }
}
