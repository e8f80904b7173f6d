//! BIP39 mnemonic handling
//!
//! Mnemonics are transient: they are validated, stretched into a seed and
//! discarded. Nothing in the core persists them.

use crate::core::errors::WalletError;
use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// Entropy for generated mnemonics: 128 bits, i.e. 12 words.
const GENERATED_ENTROPY_BYTES: usize = 16;

/// Generates a fresh 12-word English mnemonic from OS randomness.
pub fn generate_mnemonic() -> Result<Mnemonic, WalletError> {
    let mut entropy = Zeroizing::new([0u8; GENERATED_ENTROPY_BYTES]);
    OsRng.fill_bytes(entropy.as_mut());
    Mnemonic::from_entropy_in(Language::English, entropy.as_ref())
        .map_err(|e| WalletError::CryptoError(format!("mnemonic generation failed: {}", e)))
}

/// Checks wordlist membership and the embedded checksum.
pub fn validate_mnemonic(words: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, words).is_ok()
}

/// Stretches a mnemonic sentence and passphrase into the 512-bit BIP39 seed
/// (PBKDF2-HMAC-SHA512, 2048 rounds). Deterministic for a given input pair.
pub fn seed_from_mnemonic(words: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, words)
        .map_err(|e| WalletError::InvalidEncoding(format!("invalid mnemonic: {}", e)))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR_WORDS: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_mnemonic_is_valid() {
        let mnemonic = generate_mnemonic().unwrap();
        assert_eq!(mnemonic.word_count(), 12);
        assert!(validate_mnemonic(&mnemonic.to_string()));
    }

    #[test]
    fn test_generated_mnemonics_differ() {
        let a = generate_mnemonic().unwrap().to_string();
        let b = generate_mnemonic().unwrap().to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_mnemonic() {
        assert!(validate_mnemonic(VECTOR_WORDS));
        // Last word carries the checksum; swapping it must fail.
        assert!(!validate_mnemonic(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon"
        ));
        assert!(!validate_mnemonic("not a mnemonic at all"));
        assert!(!validate_mnemonic(""));
    }

    #[test]
    fn test_seed_standard_vector() {
        let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
        assert_eq!(
            hex::encode(seed.as_slice()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_seed_is_deterministic_and_passphrase_sensitive() {
        let a = seed_from_mnemonic(VECTOR_WORDS, "hunter2").unwrap();
        let b = seed_from_mnemonic(VECTOR_WORDS, "hunter2").unwrap();
        let c = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_seed_rejects_bad_mnemonic() {
        let err = seed_from_mnemonic("abandon abandon", "").unwrap_err();
        assert!(matches!(err, WalletError::InvalidEncoding(_)));
    }
}
