//! BIP32 hierarchical deterministic derivation
//!
//! An `HdNode` is produced from a seed or from a parent node, never mutated.
//! Hardened derivation needs the private scalar and fails on watch-only
//! nodes; normal derivation tweaks the public point and works on both.
//! Watch-only nodes restored from a hardware device carry a delegate handle
//! so downstream signing can be routed back to the device.

use crate::core::errors::WalletError;
use crate::core::keys::KeyMaterial;
use crate::core::network::NetworkParams;
use crate::crypto::hash160;
use crate::hardware::{DelegatedSigner, DerivationPath};
use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for master-node construction, fixed by the derivation standard.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Index bit marking a hardened child.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

enum HdKey {
    Private(Zeroizing<[u8; 32]>),
    Public(PublicKey),
}

/// A hardware signer together with the path this node was restored from.
#[derive(Clone)]
pub struct DelegateHandle {
    pub signer: Arc<dyn DelegatedSigner>,
    pub path: DerivationPath,
}

/// One node of the key tree.
pub struct HdNode {
    key: HdKey,
    public: PublicKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    params: NetworkParams,
    delegate: Option<DelegateHandle>,
}

impl HdNode {
    /// Master node: HMAC-SHA512 over the seed with the fixed key; left half
    /// is the master scalar, right half the chain code.
    pub fn from_seed(seed: &[u8], params: NetworkParams) -> Result<Self, WalletError> {
        if seed.len() < 16 || seed.len() > 64 {
            return Err(WalletError::ValidationError(format!(
                "seed must be 16..=64 bytes, got {}",
                seed.len()
            )));
        }
        let mut mac = HmacSha512::new_from_slice(MASTER_HMAC_KEY)
            .map_err(|e| WalletError::CryptoError(format!("HMAC init failed: {}", e)))?;
        mac.update(seed);
        let digest = mac.finalize().into_bytes();

        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&digest[..32]);
        // Reject the (astronomically unlikely) invalid master scalar early.
        let secret_key = SecretKey::from_slice(key.as_ref())
            .map_err(|e| WalletError::CryptoError(format!("master key invalid: {}", e)))?;
        let public = PublicKey::from_secret_key(&Secp256k1::new(), &secret_key);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        Ok(Self {
            key: HdKey::Private(key),
            public,
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: 0,
            params,
            delegate: None,
        })
    }

    /// Restores a watch-only extended node from a hardware device.
    ///
    /// The device reports the compressed public key and chain code at `path`;
    /// the resulting node keeps a handle to the device so spends from this
    /// subtree are delegated back to it.
    pub async fn from_device(
        signer: Arc<dyn DelegatedSigner>,
        path: DerivationPath,
        params: NetworkParams,
    ) -> Result<Self, WalletError> {
        let device_key = signer.get_public_key(&path).await?;
        let public = PublicKey::from_slice(&device_key.public_key).map_err(|e| {
            WalletError::InvalidEncoding(format!("device returned a bad public key: {}", e))
        })?;
        debug!(%path, "restored watch-only node from device");
        Ok(Self {
            key: HdKey::Public(public),
            public,
            chain_code: device_key.chain_code,
            depth: path.indices().len() as u8,
            parent_fingerprint: [0u8; 4],
            child_index: path.indices().last().copied().unwrap_or(0),
            params,
            delegate: Some(DelegateHandle { signer, path }),
        })
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn network(&self) -> NetworkParams {
        self.params
    }

    pub fn is_watch_only(&self) -> bool {
        matches!(self.key, HdKey::Public(_))
    }

    pub fn delegate(&self) -> Option<&DelegateHandle> {
        self.delegate.as_ref()
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// First four bytes of HASH160 of the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = hash160(&self.public_key().serialize());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Derives one child. `index` must be below 2^31; hardened children need
    /// the private scalar and fail with `DerivationRequiresPrivateKey` on
    /// watch-only nodes. Deterministic for a given (node, index, hardened).
    pub fn derive(&self, index: u32, hardened: bool) -> Result<HdNode, WalletError> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::ValidationError(format!(
                "child index {} must be below 2^31",
                index
            )));
        }
        let child_index = if hardened { HARDENED_OFFSET | index } else { index };

        let mut data = Vec::with_capacity(37);
        match (&self.key, hardened) {
            (HdKey::Private(secret), true) => {
                data.push(0x00);
                data.extend_from_slice(secret.as_ref());
            }
            (HdKey::Public(_), true) => return Err(WalletError::DerivationRequiresPrivateKey),
            (_, false) => data.extend_from_slice(&self.public_key().serialize()),
        }
        data.extend_from_slice(&child_index.to_be_bytes());

        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| WalletError::CryptoError(format!("HMAC init failed: {}", e)))?;
        mac.update(&data);
        let digest = mac.finalize().into_bytes();

        let mut tweak_bytes = [0u8; 32];
        tweak_bytes.copy_from_slice(&digest[..32]);
        let tweak = Scalar::from_be_bytes(tweak_bytes)
            .map_err(|_| WalletError::CryptoError("derived scalar out of range".to_string()))?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        let (key, public) = match &self.key {
            HdKey::Private(secret) => {
                let parent = SecretKey::from_slice(secret.as_ref())
                    .map_err(|e| WalletError::CryptoError(format!("node scalar invalid: {}", e)))?;
                let child = parent
                    .add_tweak(&tweak)
                    .map_err(|_| WalletError::CryptoError("derived key invalid".to_string()))?;
                let public = PublicKey::from_secret_key(&Secp256k1::new(), &child);
                (HdKey::Private(Zeroizing::new(child.secret_bytes())), public)
            }
            HdKey::Public(public) => {
                let secp = Secp256k1::new();
                let child = public
                    .add_exp_tweak(&secp, &tweak)
                    .map_err(|_| WalletError::CryptoError("derived point invalid".to_string()))?;
                (HdKey::Public(child), child)
            }
        };

        // A delegated subtree keeps the device path in sync with the node.
        let delegate = self.delegate.as_ref().map(|handle| DelegateHandle {
            signer: Arc::clone(&handle.signer),
            path: handle.path.child(child_index),
        });

        Ok(HdNode {
            key,
            public,
            chain_code,
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_index,
            params: self.params,
            delegate,
        })
    }

    /// Applies the network's fixed hardened account path (m/88'/0'/0').
    pub fn derive_account(&self) -> Result<HdNode, WalletError> {
        let mut node = self.derive(self.params.account_path[0], true)?;
        for &level in &self.params.account_path[1..] {
            node = node.derive(level, true)?;
        }
        Ok(node)
    }

    /// Walks an explicit derivation path from this node.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<HdNode, WalletError> {
        let mut node = None;
        for &raw in path.indices() {
            let parent = node.as_ref().unwrap_or(self);
            node = Some(parent.derive(raw & !HARDENED_OFFSET, raw >= HARDENED_OFFSET)?);
        }
        node.ok_or_else(|| WalletError::ValidationError("empty derivation path".to_string()))
    }

    /// Non-hardened page of children, usable on watch-only (device) nodes.
    pub fn derive_account_page(&self, start: u32, count: u32) -> Result<Vec<HdNode>, WalletError> {
        let end = start.checked_add(count).ok_or_else(|| {
            WalletError::ValidationError(format!(
                "page {}..+{} exceeds the index range",
                start, count
            ))
        })?;
        (start..end).map(|i| self.derive(i, false)).collect()
    }

    /// Hardened per-index accounts under m/88'/0' (mobile-wallet layout).
    pub fn derive_mobile_page(&self, count: u32) -> Result<Vec<HdNode>, WalletError> {
        let parent = self
            .derive(self.params.account_path[0], true)?
            .derive(self.params.account_path[1], true)?;
        (0..count).map(|i| parent.derive(i, true)).collect()
    }

    /// Extracts key material for wallet use.
    pub fn key_material(&self) -> Result<KeyMaterial, WalletError> {
        match &self.key {
            HdKey::Private(secret) => KeyMaterial::from_secret_bytes(secret.as_ref(), self.params),
            HdKey::Public(public) => Ok(KeyMaterial::from_public_key(*public, self.params)),
        }
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    /// Watch-only view of this node (drops the private scalar, keeps the
    /// chain code so non-hardened derivation still works).
    pub fn to_watch_only(&self) -> HdNode {
        HdNode {
            key: HdKey::Public(self.public),
            public: self.public,
            chain_code: self.chain_code,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
            params: self.params,
            delegate: self.delegate.clone(),
        }
    }
}
