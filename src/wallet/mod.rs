//! Wallet aggregate
//!
//! A `Wallet` ties key material to an explorer backend and keeps a cached
//! view of balances and history. The cache is never a source of truth: a
//! failed refresh keeps the previous snapshot and reports the error, leaving
//! the wallet usable in a degraded state rather than poisoned.

use crate::blockchain::builder::TransactionBuilder;
use crate::blockchain::traits::{BalanceInfo, Explorer, ExplorerFetcher, TokenBalance, TxRecord};
use crate::core::errors::WalletError;
use crate::core::keys::KeyMaterial;
use crate::core::network::NetworkParams;
use crate::crypto::hd::{DelegateHandle, HdNode};
use crate::crypto::message;
use crate::crypto::mnemonic::seed_from_mnemonic;
use crate::hardware::{DelegatedSigner, DerivationPath};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    /// Created but never synced.
    Uninitialized,
    /// A refresh is in flight.
    Loading,
    /// At least one sync attempt has completed.
    Ready,
}

/// Cached chain view for the wallet's address.
#[derive(Debug, Clone, Default)]
pub struct WalletInfo {
    pub balance: u64,
    pub unconfirmed_balance: u64,
    pub token_balances: Vec<TokenBalance>,
}

pub struct Wallet {
    key: KeyMaterial,
    delegate: Option<DelegateHandle>,
    state: WalletState,
    info: WalletInfo,
    tx_history: Vec<TxRecord>,
    explorer: Arc<dyn Explorer>,
}

impl Wallet {
    fn new(key: KeyMaterial, delegate: Option<DelegateHandle>, explorer: Arc<dyn Explorer>) -> Self {
        Self {
            key,
            delegate,
            state: WalletState::Uninitialized,
            info: WalletInfo::default(),
            tx_history: Vec::new(),
            explorer,
        }
    }

    /// Wallet at the fixed account path of a mnemonic-derived key tree.
    pub fn from_mnemonic(
        words: &str,
        passphrase: &str,
        params: NetworkParams,
        explorer: Arc<dyn Explorer>,
    ) -> Result<Self, WalletError> {
        let seed = seed_from_mnemonic(words, passphrase)?;
        let account = HdNode::from_seed(seed.as_ref(), params)?.derive_account()?;
        Ok(Self::new(account.key_material()?, None, explorer))
    }

    /// Wallet for a single WIF-encoded private key.
    pub fn from_wif(
        wif: &str,
        params: NetworkParams,
        explorer: Arc<dyn Explorer>,
    ) -> Result<Self, WalletError> {
        Ok(Self::new(KeyMaterial::from_wif(wif, params)?, None, explorer))
    }

    /// Wallet for an already-derived node, carrying its delegate if any.
    pub fn from_node(node: &HdNode, explorer: Arc<dyn Explorer>) -> Result<Self, WalletError> {
        Ok(Self::new(
            node.key_material()?,
            node.delegate().cloned(),
            explorer,
        ))
    }

    /// Watch-only wallet backed by a hardware device at `path`.
    pub async fn from_device(
        signer: Arc<dyn DelegatedSigner>,
        path: DerivationPath,
        params: NetworkParams,
        explorer: Arc<dyn Explorer>,
    ) -> Result<Self, WalletError> {
        let node = HdNode::from_device(signer, path, params).await?;
        Self::from_node(&node, explorer)
    }

    pub fn address(&self) -> String {
        self.key.address()
    }

    pub fn state(&self) -> WalletState {
        self.state
    }

    pub fn info(&self) -> &WalletInfo {
        &self.info
    }

    pub fn tx_history(&self) -> &[TxRecord] {
        &self.tx_history
    }

    pub fn is_watch_only(&self) -> bool {
        self.key.is_watch_only()
    }

    pub fn network(&self) -> NetworkParams {
        self.key.network()
    }

    /// Syntactic address check for this wallet's network.
    pub fn validate_address(&self, address: &str) -> bool {
        self.key.network().is_valid_address(address)
    }

    /// Fetches balances and history concurrently and updates the cache.
    ///
    /// Each fetch that succeeds is applied even when the other fails; the
    /// first failure is returned. Stale cache entries survive a failed
    /// fetch, and the wallet always lands back in `Ready`.
    pub async fn refresh(&mut self) -> Result<(), WalletError> {
        self.state = WalletState::Loading;
        let address = self.address();
        let (balance, history) = futures::join!(
            self.explorer.get_balance_info(&address),
            self.explorer.get_transaction_history(&address),
        );

        let mut first_err = None;
        match balance {
            Ok(BalanceInfo {
                balance,
                unconfirmed_balance,
                token_balances,
            }) => {
                self.info = WalletInfo {
                    balance,
                    unconfirmed_balance,
                    token_balances,
                };
            }
            Err(e) => first_err = Some(e),
        }
        match history {
            Ok(records) => self.tx_history = records,
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        self.state = WalletState::Ready;
        match first_err {
            None => Ok(()),
            Some(e) => {
                warn!(%address, error = %e, "refresh kept stale cache");
                Err(e)
            }
        }
    }

    /// Sends `amount` base units to `to` with the given `fee`, returning the
    /// broadcast txid.
    pub async fn send(&mut self, to: &str, amount: u64, fee: u64) -> Result<String, WalletError> {
        if !self.validate_address(to) {
            return Err(WalletError::ValidationError(format!(
                "{:?} is not a valid address",
                to
            )));
        }
        let address = self.address();
        let utxos = self.explorer.get_utxo_list(&address).await?;
        let fetcher = ExplorerFetcher(self.explorer.as_ref());
        let tx = TransactionBuilder::build_pubkey_hash_transaction(
            &self.key,
            self.delegate.as_ref(),
            &fetcher,
            to,
            amount,
            fee,
            &utxos,
        )
        .await?;
        let txid = self.explorer.submit_transaction(&tx.to_hex()).await?;
        info!(%txid, amount, fee, "transaction accepted");
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "post-send refresh failed");
        }
        Ok(txid)
    }

    /// Signs a human-readable message with this wallet's key.
    pub fn sign_message(&self, text: &str) -> Result<Vec<u8>, WalletError> {
        message::sign_message(&self.key, text)
    }

    /// Verifies a recoverable signature against an address on this network.
    pub fn verify_message(
        &self,
        address: &str,
        text: &str,
        signature: &[u8],
    ) -> Result<bool, WalletError> {
        message::verify_message(&self.key.network(), address, text, signature)
    }
}
