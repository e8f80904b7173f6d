//! Hardware signer delegation
//!
//! A `DelegatedSigner` stands in for a device that holds private keys the
//! wallet never sees. The wallet derives watch-only addresses from the
//! device's exported extended public key and routes signature requests back
//! through the trait. Implementations serialize their own device I/O.

use crate::blockchain::traits::PrevTxFetcher;
use crate::blockchain::tx::Transaction;
use crate::core::errors::WalletError;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Index bit marking a hardened path component.
const HARDENED_BIT: u32 = 0x8000_0000;

/// A BIP32 path as sent to a device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivationPath {
    indices: Vec<u32>,
}

impl DerivationPath {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Extends the path by one raw child index (hardened bit included).
    pub fn child(&self, index: u32) -> Self {
        let mut indices = self.indices.clone();
        indices.push(index);
        Self { indices }
    }

    /// Device wire form: component count, then each index big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.indices.len() * 4);
        out.push(self.indices.len() as u8);
        for index in &self.indices {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    /// Accepts `m/88'/0'/0'` style paths; `'` or `h` marks hardened.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("m/").or_else(|| s.strip_prefix("M/")).ok_or_else(|| {
            WalletError::ValidationError(format!("path {:?} must start with m/", s))
        })?;
        let mut indices = Vec::new();
        for component in rest.split('/') {
            let (digits, hardened) =
                match component.strip_suffix('\'').or_else(|| component.strip_suffix('h')) {
                    Some(digits) => (digits, true),
                    None => (component, false),
                };
            let index: u32 = digits.parse().map_err(|_| {
                WalletError::ValidationError(format!("bad path component {:?}", component))
            })?;
            if index >= HARDENED_BIT {
                return Err(WalletError::ValidationError(format!(
                    "path component {} out of range",
                    index
                )));
            }
            indices.push(if hardened { index | HARDENED_BIT } else { index });
        }
        Ok(Self { indices })
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in &self.indices {
            if index & HARDENED_BIT != 0 {
                write!(f, "/{}'", index & !HARDENED_BIT)?;
            } else {
                write!(f, "/{}", index)?;
            }
        }
        Ok(())
    }
}

/// Extended public key material reported by a device.
#[derive(Debug, Clone)]
pub struct DevicePublicKey {
    /// Compressed SEC1 encoding, 33 bytes.
    pub public_key: Vec<u8>,
    pub chain_code: [u8; 32],
}

/// A device that signs on the wallet's behalf.
#[async_trait]
pub trait DelegatedSigner: Send + Sync {
    /// Public key and chain code at `path`.
    async fn get_public_key(&self, path: &DerivationPath)
        -> Result<DevicePublicKey, WalletError>;

    /// Produces complete unlocking scripts for every input of `tx`, in input
    /// order. Devices that verify inputs re-fetch the spent transactions
    /// through `fetcher`.
    async fn sign_inputs(
        &self,
        path: &DerivationPath,
        tx: &Transaction,
        fetcher: &dyn PrevTxFetcher,
    ) -> Result<Vec<Vec<u8>>, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hardened_path() {
        let path: DerivationPath = "m/88'/0'/0'".parse().unwrap();
        assert_eq!(
            path.indices(),
            &[88 | HARDENED_BIT, HARDENED_BIT, HARDENED_BIT]
        );
        assert_eq!(path.to_string(), "m/88'/0'/0'");
    }

    #[test]
    fn test_parse_h_suffix_and_mixed() {
        let path: DerivationPath = "m/44h/88'/0/1".parse().unwrap();
        assert_eq!(
            path.indices(),
            &[44 | HARDENED_BIT, 88 | HARDENED_BIT, 0, 1]
        );
        assert_eq!(path.to_string(), "m/44'/88'/0/1");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("88'/0'".parse::<DerivationPath>().is_err());
        assert!("m/abc".parse::<DerivationPath>().is_err());
        assert!("m/2147483648".parse::<DerivationPath>().is_err());
    }

    #[test]
    fn test_child_appends_raw_index() {
        let path: DerivationPath = "m/88'".parse().unwrap();
        let child = path.child(5);
        assert_eq!(child.to_string(), "m/88'/5");
    }

    #[test]
    fn test_wire_bytes() {
        let path: DerivationPath = "m/88'/1".parse().unwrap();
        let bytes = path.to_bytes();
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..5], &(88u32 | HARDENED_BIT).to_be_bytes());
        assert_eq!(&bytes[5..9], &1u32.to_be_bytes());
    }
}
