//! Backend abstractions
//!
//! The wallet talks to the chain through `Explorer`; tests and alternative
//! backends supply their own implementations. `PrevTxFetcher` is the narrow
//! slice the transaction builder needs, so signing code never sees the full
//! explorer surface.

use crate::blockchain::utxo::Utxo;
use crate::core::errors::WalletError;
use async_trait::async_trait;
use ethers::types::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Confirmed balance in base units.
    pub balance: u64,
    /// Sum of unconfirmed incoming outputs in base units.
    pub unconfirmed_balance: u64,
    #[serde(default)]
    pub token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub contract_address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub balance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub txid: String,
    /// Net amount in base units, negative for outgoing transfers.
    pub amount: i64,
    pub confirmations: u32,
    /// Unix seconds; unset while the transaction is in the mempool.
    pub timestamp: Option<i64>,
}

/// Chain data backend.
#[async_trait]
pub trait Explorer: Send + Sync {
    async fn get_balance_info(&self, address: &str) -> Result<BalanceInfo, WalletError>;

    async fn get_transaction_history(&self, address: &str)
        -> Result<Vec<TxRecord>, WalletError>;

    async fn get_utxo_list(&self, address: &str) -> Result<Vec<Utxo>, WalletError>;

    /// Broadcasts a raw transaction, returning its txid.
    async fn submit_transaction(&self, raw_hex: &str) -> Result<String, WalletError>;

    /// Raw bytes of a confirmed transaction, for prevout script lookup.
    async fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>, WalletError>;
}

/// Prevout script source used while signing.
#[async_trait]
pub trait PrevTxFetcher: Send + Sync {
    /// Locking script of output `vout` of transaction `txid`.
    async fn fetch_prevout_script(&self, txid: &str, vout: u32) -> Result<Vec<u8>, WalletError>;
}

/// Adapts an `Explorer` to the fetcher interface the builder wants.
pub struct ExplorerFetcher<'a>(pub &'a dyn Explorer);

#[async_trait]
impl PrevTxFetcher for ExplorerFetcher<'_> {
    async fn fetch_prevout_script(&self, txid: &str, vout: u32) -> Result<Vec<u8>, WalletError> {
        let raw = self.0.fetch_raw_transaction(txid).await?;
        extract_output_script(&raw, vout)
    }
}

/// Walks a legacy-serialized transaction and returns output `vout`'s script.
fn extract_output_script(raw: &[u8], vout: u32) -> Result<Vec<u8>, WalletError> {
    let mut cursor = Cursor { raw, pos: 0 };
    cursor.skip(4)?; // version
    let input_count = cursor.read_varint()?;
    for _ in 0..input_count {
        cursor.skip(36)?; // outpoint
        let script_len = cursor.read_varint()? as usize;
        cursor.skip(script_len)?;
        cursor.skip(4)?; // sequence
    }
    let output_count = cursor.read_varint()?;
    if u64::from(vout) >= output_count {
        return Err(WalletError::ValidationError(format!(
            "output {} out of range ({} outputs)",
            vout, output_count
        )));
    }
    for i in 0..output_count {
        cursor.skip(8)?; // value
        let script_len = cursor.read_varint()? as usize;
        if i == u64::from(vout) {
            return cursor.take(script_len);
        }
        cursor.skip(script_len)?;
    }
    Err(WalletError::InvalidEncoding(
        "truncated transaction".to_string(),
    ))
}

struct Cursor<'a> {
    raw: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn skip(&mut self, n: usize) -> Result<(), WalletError> {
        self.take(n).map(|_| ())
    }

    fn take(&mut self, n: usize) -> Result<Vec<u8>, WalletError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.raw.len())
            .ok_or_else(|| WalletError::InvalidEncoding("truncated transaction".to_string()))?;
        let slice = self.raw[self.pos..end].to_vec();
        self.pos = end;
        Ok(slice)
    }

    fn read_varint(&mut self) -> Result<u64, WalletError> {
        let first = self.take(1)?[0];
        Ok(match first {
            0xfd => u16::from_le_bytes(
                self.take(2)?
                    .try_into()
                    .map_err(|_| WalletError::InvalidEncoding("varint".to_string()))?,
            ) as u64,
            0xfe => u32::from_le_bytes(
                self.take(4)?
                    .try_into()
                    .map_err(|_| WalletError::InvalidEncoding("varint".to_string()))?,
            ) as u64,
            0xff => u64::from_le_bytes(
                self.take(8)?
                    .try_into()
                    .map_err(|_| WalletError::InvalidEncoding("varint".to_string()))?,
            ),
            n => n as u64,
        })
    }
}
