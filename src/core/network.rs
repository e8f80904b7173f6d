//! Network parameters
//!
//! All chain-specific constants live here and are injected into every
//! component at construction time. There is no process-global network
//! switch; callers pick `Mainnet` or `Testnet` once at startup.

use crate::core::errors::WalletError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal exponent of the native unit (1 BUTK = 10^16 base units).
pub const NATIVE_DECIMALS: u32 = 16;

/// Base58 addresses on this chain are a fixed prefix character followed by
/// exactly 33 word characters. Both networks share the prefix; the constant
/// must not be re-derived or the wallet loses compatibility with deployed
/// addresses.
pub const ADDRESS_PATTERN: &str = r"^X\w{33}$";

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(ADDRESS_PATTERN).expect("address pattern is a valid regex"));

/// Network identifier, supplied once at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl FromStr for Network {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(WalletError::ValidationError(format!(
                "unknown network identifier: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Immutable chain constants for one network.
///
/// The account path and version bytes are configuration copied from the
/// original chain deployment, not values to derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    pub network: Network,
    /// Signed-message prefix, including its leading length byte.
    pub message_prefix: &'static str,
    /// Version byte for pay-to-pubkey-hash addresses.
    pub pubkey_hash_version: u8,
    /// Version byte for WIF private key encoding.
    pub wif_version: u8,
    /// Hardened account derivation levels under the master node (m/88'/0'/0').
    pub account_path: [u32; 3],
}

impl NetworkParams {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self {
                network,
                message_prefix: "\x15Butk Signed Message:\n",
                pubkey_hash_version: 0x4c,
                wif_version: 0x80,
                account_path: [88, 0, 0],
            },
            Network::Testnet => Self {
                network,
                message_prefix: "\x15Butk Signed Message:\n",
                pubkey_hash_version: 0x4c,
                wif_version: 0xef,
                account_path: [88, 0, 0],
            },
        }
    }

    /// Checks the address shape for this chain: prefix + 33 word characters.
    pub fn is_valid_address(&self, address: &str) -> bool {
        ADDRESS_RE.is_match(address)
    }
}
