use crate::blockchain::tx::OutPoint;
use serde::{Deserialize, Serialize};

/// A spendable output as reported by an explorer backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub address: String,
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    #[serde(default)]
    pub confirmations: u32,
}

impl Utxo {
    pub fn outpoint(&self) -> Result<OutPoint, crate::core::errors::WalletError> {
        OutPoint::from_txid_hex(&self.txid, self.vout)
    }
}
