//! Key material
//!
//! A key pair is either a full secp256k1 pair or a watch-only public point.
//! The split is a type-level fact: signing paths take the private scalar
//! through `secret_key()`, which is the single place a watch-only key turns
//! into `NoPrivateKey`. Key material is immutable after construction;
//! derivation produces new instances.

use crate::core::errors::WalletError;
use crate::core::network::NetworkParams;
use crate::crypto::hash160;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use secrecy::{ExposeSecret, SecretVec};
use tracing::debug;

/// A secp256k1 key pair with its private scalar present.
pub struct FullKeyPair {
    secret: SecretVec<u8>,
    public: PublicKey,
    compressed: bool,
    params: NetworkParams,
}

/// A public-key-only pair: can receive and monitor, never sign locally.
pub struct WatchOnlyKey {
    public: PublicKey,
    compressed: bool,
    params: NetworkParams,
}

/// Key material owned by exactly one wallet.
pub enum KeyMaterial {
    Full(FullKeyPair),
    WatchOnly(WatchOnlyKey),
}

impl KeyMaterial {
    /// Builds full key material from a 32-byte private scalar.
    pub fn from_secret_bytes(secret: &[u8], params: NetworkParams) -> Result<Self, WalletError> {
        if secret.len() != 32 {
            return Err(WalletError::InvalidEncoding(format!(
                "private key must be 32 bytes, got {}",
                secret.len()
            )));
        }
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(secret)
            .map_err(|e| WalletError::InvalidEncoding(format!("invalid private key: {}", e)))?;
        let public = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(KeyMaterial::Full(FullKeyPair {
            secret: SecretVec::new(secret.to_vec()),
            public,
            compressed: true,
            params,
        }))
    }

    /// Builds watch-only key material from a public point.
    pub fn from_public_key(public: PublicKey, params: NetworkParams) -> Self {
        KeyMaterial::WatchOnly(WatchOnlyKey {
            public,
            compressed: true,
            params,
        })
    }

    /// Decodes a Base58Check WIF private key.
    ///
    /// Fails with `InvalidEncoding` on checksum mismatch, wrong version byte
    /// or malformed payload.
    pub fn from_wif(wif: &str, params: NetworkParams) -> Result<Self, WalletError> {
        let payload = bs58::decode(wif)
            .with_check(None)
            .into_vec()
            .map_err(|e| WalletError::InvalidEncoding(format!("bad WIF: {}", e)))?;
        if payload.is_empty() || payload[0] != params.wif_version {
            return Err(WalletError::InvalidEncoding(format!(
                "WIF version byte does not match {}",
                params.network
            )));
        }
        let (secret, compressed) = match payload.len() {
            33 => (&payload[1..33], false),
            34 if payload[33] == 0x01 => (&payload[1..33], true),
            _ => {
                return Err(WalletError::InvalidEncoding(
                    "WIF payload has unexpected length".to_string(),
                ))
            }
        };
        let mut key = Self::from_secret_bytes(secret, params)?;
        if let KeyMaterial::Full(pair) = &mut key {
            pair.compressed = compressed;
        }
        debug!(network = %params.network, "restored key material from WIF");
        Ok(key)
    }

    /// Encodes the private scalar as WIF, or `NoPrivateKey` for watch-only.
    pub fn to_wif(&self) -> Result<String, WalletError> {
        let pair = match self {
            KeyMaterial::Full(pair) => pair,
            KeyMaterial::WatchOnly(_) => return Err(WalletError::NoPrivateKey),
        };
        let mut payload = Vec::with_capacity(34);
        payload.push(pair.params.wif_version);
        payload.extend_from_slice(pair.secret.expose_secret());
        if pair.compressed {
            payload.push(0x01);
        }
        Ok(bs58::encode(payload).with_check().into_string())
    }

    pub fn network(&self) -> NetworkParams {
        match self {
            KeyMaterial::Full(pair) => pair.params,
            KeyMaterial::WatchOnly(key) => key.params,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyMaterial::Full(pair) => pair.public,
            KeyMaterial::WatchOnly(key) => key.public,
        }
    }

    pub fn is_compressed(&self) -> bool {
        match self {
            KeyMaterial::Full(pair) => pair.compressed,
            KeyMaterial::WatchOnly(key) => key.compressed,
        }
    }

    pub fn is_watch_only(&self) -> bool {
        matches!(self, KeyMaterial::WatchOnly(_))
    }

    /// Serialized public key honoring the compressed flag.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        if self.is_compressed() {
            self.public_key().serialize().to_vec()
        } else {
            self.public_key().serialize_uncompressed().to_vec()
        }
    }

    /// Base58Check address: version byte over HASH160 of the public key.
    pub fn address(&self) -> String {
        let mut payload = Vec::with_capacity(21);
        payload.push(self.network().pubkey_hash_version);
        payload.extend_from_slice(&hash160(&self.public_key_bytes()));
        bs58::encode(payload).with_check().into_string()
    }

    /// The private scalar, or `NoPrivateKey` for watch-only material.
    pub(crate) fn secret_key(&self) -> Result<SecretKey, WalletError> {
        match self {
            KeyMaterial::Full(pair) => SecretKey::from_slice(pair.secret.expose_secret())
                .map_err(|e| WalletError::CryptoError(format!("stored key invalid: {}", e))),
            KeyMaterial::WatchOnly(_) => Err(WalletError::NoPrivateKey),
        }
    }

    /// DER-encoded low-S ECDSA signature over a 32-byte digest.
    pub fn sign_hash(&self, digest: &[u8; 32]) -> Result<Vec<u8>, WalletError> {
        let secret = self.secret_key()?;
        let secp = Secp256k1::new();
        let msg = Message::from_slice(digest)
            .map_err(|e| WalletError::CryptoError(format!("digest rejected: {}", e)))?;
        let mut signature = secp.sign_ecdsa(&msg, &secret);
        signature.normalize_s();
        Ok(signature.serialize_der().to_vec())
    }

    /// Checks whether a mnemonic/passphrase pair reproduces this key's
    /// account address. Used to confirm a backup before discarding it.
    pub fn verify_mnemonic(&self, words: &str, passphrase: &str) -> bool {
        use crate::crypto::hd::HdNode;
        use crate::crypto::mnemonic::seed_from_mnemonic;

        let Ok(seed) = seed_from_mnemonic(words, passphrase) else {
            return false;
        };
        let Ok(master) = HdNode::from_seed(seed.as_ref(), self.network()) else {
            return false;
        };
        match master.derive_account().and_then(|n| n.key_material()) {
            Ok(material) => material.address() == self.address(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::network::{Network, NetworkParams};

    fn params() -> NetworkParams {
        NetworkParams::for_network(Network::Mainnet)
    }

    #[test]
    fn test_address_shape() {
        let key = KeyMaterial::from_secret_bytes(&[7u8; 32], params()).unwrap();
        let address = key.address();
        assert!(params().is_valid_address(&address), "bad address {}", address);
        assert!(address.starts_with('X'));
        assert_eq!(address.len(), 34);
    }

    #[test]
    fn test_wif_round_trip() {
        let key = KeyMaterial::from_secret_bytes(&[7u8; 32], params()).unwrap();
        let wif = key.to_wif().unwrap();
        let restored = KeyMaterial::from_wif(&wif, params()).unwrap();
        assert_eq!(restored.address(), key.address());
        assert!(restored.is_compressed());
    }

    #[test]
    fn test_wif_rejects_corruption() {
        let key = KeyMaterial::from_secret_bytes(&[7u8; 32], params()).unwrap();
        let mut wif = key.to_wif().unwrap();
        // Corrupt one character; Base58Check must catch it.
        let replacement = if wif.ends_with('2') { '3' } else { '2' };
        wif.pop();
        wif.push(replacement);
        assert!(matches!(
            KeyMaterial::from_wif(&wif, params()),
            Err(WalletError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_wif_rejects_wrong_network_version() {
        let key = KeyMaterial::from_secret_bytes(&[7u8; 32], params()).unwrap();
        let wif = key.to_wif().unwrap();
        let testnet = NetworkParams::for_network(Network::Testnet);
        assert!(matches!(
            KeyMaterial::from_wif(&wif, testnet),
            Err(WalletError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_watch_only_has_no_wif() {
        let full = KeyMaterial::from_secret_bytes(&[7u8; 32], params()).unwrap();
        let watch = KeyMaterial::from_public_key(full.public_key(), params());
        assert!(watch.is_watch_only());
        assert_eq!(watch.address(), full.address());
        assert!(matches!(watch.to_wif(), Err(WalletError::NoPrivateKey)));
        assert!(matches!(watch.secret_key(), Err(WalletError::NoPrivateKey)));
    }

    #[test]
    fn test_from_secret_rejects_bad_lengths() {
        assert!(KeyMaterial::from_secret_bytes(&[1u8; 16], params()).is_err());
        assert!(KeyMaterial::from_secret_bytes(&[0u8; 32], params()).is_err());
    }

    #[test]
    fn test_uncompressed_address_differs() {
        let key = KeyMaterial::from_secret_bytes(&[7u8; 32], params()).unwrap();
        let mut wif = String::new();
        if let KeyMaterial::Full(pair) = &key {
            let mut payload = vec![params().wif_version];
            payload.extend_from_slice(pair.secret.expose_secret());
            wif = bs58::encode(payload).with_check().into_string();
        }
        let uncompressed = KeyMaterial::from_wif(&wif, params()).unwrap();
        assert!(!uncompressed.is_compressed());
        assert_eq!(uncompressed.public_key_bytes().len(), 65);
        assert_ne!(uncompressed.address(), key.address());
    }
}
