//! Recoverable signed messages
//!
//! Signatures are 65 bytes: a header byte encoding the recovery id and
//! compression flag, followed by the compact (r, s) pair. Verification
//! recovers the public key and compares the derived address, so a signature
//! proves control of an address without revealing the public key up front.

use crate::core::errors::WalletError;
use crate::core::keys::KeyMaterial;
use crate::core::network::NetworkParams;
use crate::crypto::{hash160, sha256d};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};

/// Longest message the single length byte in the digest preimage can carry.
pub const MAX_MESSAGE_LEN: usize = 255;

fn message_digest(params: &NetworkParams, message: &str) -> Result<[u8; 32], WalletError> {
    let body = message.as_bytes();
    if body.len() > MAX_MESSAGE_LEN {
        return Err(WalletError::MessageTooLong(body.len()));
    }
    let mut preimage =
        Vec::with_capacity(params.message_prefix.len() + 1 + body.len());
    preimage.extend_from_slice(params.message_prefix.as_bytes());
    preimage.push(body.len() as u8);
    preimage.extend_from_slice(body);
    Ok(sha256d(&preimage))
}

/// Signs `message` with the key's private scalar.
///
/// Header byte is `recovery_id + 27`, plus 4 when the key serializes its
/// public key compressed. Fails with `NoPrivateKey` on watch-only material.
pub fn sign_message(key: &KeyMaterial, message: &str) -> Result<Vec<u8>, WalletError> {
    let digest = message_digest(&key.network(), message)?;
    let secret = key.secret_key()?;
    let secp = Secp256k1::new();
    let msg = Message::from_slice(&digest)
        .map_err(|e| WalletError::CryptoError(format!("digest rejected: {}", e)))?;
    let signature = secp.sign_ecdsa_recoverable(&msg, &secret);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut header = recovery_id.to_i32() as u8 + 27;
    if key.is_compressed() {
        header += 4;
    }
    let mut out = Vec::with_capacity(65);
    out.push(header);
    out.extend_from_slice(&compact);
    Ok(out)
}

/// Verifies a 65-byte recoverable signature against an address.
///
/// Returns `Ok(true)` when the recovered key hashes to `address` under the
/// given network's version byte, `Ok(false)` on a well-formed mismatch, and
/// an error only for malformed input.
pub fn verify_message(
    params: &NetworkParams,
    address: &str,
    message: &str,
    signature: &[u8],
) -> Result<bool, WalletError> {
    if signature.len() != 65 {
        return Err(WalletError::InvalidEncoding(format!(
            "signature must be 65 bytes, got {}",
            signature.len()
        )));
    }
    let header = signature[0];
    if !(27..27 + 8).contains(&header) {
        return Err(WalletError::InvalidEncoding(format!(
            "bad signature header byte {}",
            header
        )));
    }
    let compressed = (header - 27) & 0x04 != 0;
    let recovery_id = RecoveryId::from_i32(((header - 27) & 0x03) as i32)
        .map_err(|e| WalletError::InvalidEncoding(format!("bad recovery id: {}", e)))?;
    let recoverable = RecoverableSignature::from_compact(&signature[1..], recovery_id)
        .map_err(|e| WalletError::InvalidEncoding(format!("bad compact signature: {}", e)))?;

    let digest = message_digest(params, message)?;
    let msg = Message::from_slice(&digest)
        .map_err(|e| WalletError::CryptoError(format!("digest rejected: {}", e)))?;
    let secp = Secp256k1::new();
    let public = match secp.recover_ecdsa(&msg, &recoverable) {
        Ok(key) => key,
        Err(_) => return Ok(false),
    };

    let serialized = if compressed {
        public.serialize().to_vec()
    } else {
        public.serialize_uncompressed().to_vec()
    };
    let mut payload = Vec::with_capacity(21);
    payload.push(params.pubkey_hash_version);
    payload.extend_from_slice(&hash160(&serialized));
    let recovered_address = bs58::encode(payload).with_check().into_string();
    Ok(recovered_address == address)
}
