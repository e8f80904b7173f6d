//! Butk wallet core: HD key management, transaction construction and
//! signing, message signatures, token deployment, and an async wallet
//! aggregate over an explorer backend.

pub mod blockchain;
pub mod core;
pub mod crypto;
pub mod hardware;
pub mod wallet;

pub use crate::core::errors::WalletError;
pub use crate::core::keys::KeyMaterial;
pub use crate::core::network::{Network, NetworkParams, NATIVE_DECIMALS};
pub use crate::crypto::hd::HdNode;
pub use crate::wallet::{Wallet, WalletState};
