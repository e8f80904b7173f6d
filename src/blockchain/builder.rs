//! Transaction assembly and signing
//!
//! Inputs are selected by accumulating the supplied UTXO list in order until
//! the target is covered; callers control selection policy by ordering the
//! list. A change output is added only when a remainder exists, so the
//! builder never produces a zero-value output.

use crate::blockchain::script;
use crate::blockchain::traits::PrevTxFetcher;
use crate::blockchain::tx::{Transaction, TxIn, TxOut, SIGHASH_ALL};
use crate::blockchain::utxo::Utxo;
use crate::core::errors::WalletError;
use crate::core::keys::KeyMaterial;
use crate::crypto::hd::DelegateHandle;
use tracing::debug;

pub struct TransactionBuilder;

impl TransactionBuilder {
    /// Builds and signs a payment of `amount` base units to `to`, spending
    /// from `key`'s address.
    ///
    /// Watch-only keys require a delegate handle; its device signs every
    /// input. `utxos` are consumed front-to-back until `amount + fee` is
    /// covered.
    pub async fn build_pubkey_hash_transaction(
        key: &KeyMaterial,
        delegate: Option<&DelegateHandle>,
        fetcher: &dyn PrevTxFetcher,
        to: &str,
        amount: u64,
        fee: u64,
        utxos: &[Utxo],
    ) -> Result<Transaction, WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }
        let target = amount.checked_add(fee).ok_or_else(|| {
            WalletError::InvalidAmount("amount + fee overflows".to_string())
        })?;

        let (selected, total) = Self::select_utxos(utxos, target)?;
        debug!(
            inputs = selected.len(),
            total, target, "selected inputs for spend"
        );

        let params = key.network();
        let mut outputs = vec![TxOut {
            value: amount,
            script_pubkey: script::script_pubkey_for_address(to, &params)?,
        }];
        let change = total - target;
        if change > 0 {
            outputs.push(TxOut {
                value: change,
                script_pubkey: script::script_pubkey_for_address(&key.address(), &params)?,
            });
        }

        let mut inputs = Vec::with_capacity(selected.len());
        for utxo in &selected {
            inputs.push(TxIn::new(utxo.outpoint()?));
        }
        let mut tx = Transaction::new(inputs, outputs);

        Self::sign_transaction(key, delegate, fetcher, &mut tx).await?;
        Ok(tx)
    }

    /// Signs every input, locally or through the delegate for watch-only
    /// keys.
    pub(crate) async fn sign_transaction(
        key: &KeyMaterial,
        delegate: Option<&DelegateHandle>,
        fetcher: &dyn PrevTxFetcher,
        tx: &mut Transaction,
    ) -> Result<(), WalletError> {
        if key.is_watch_only() {
            let Some(handle) = delegate else {
                return Err(WalletError::DelegationUnavailable);
            };
            let script_sigs = handle.signer.sign_inputs(&handle.path, tx, fetcher).await?;
            if script_sigs.len() != tx.inputs.len() {
                return Err(WalletError::ValidationError(format!(
                    "device signed {} inputs, expected {}",
                    script_sigs.len(),
                    tx.inputs.len()
                )));
            }
            for (input, script_sig) in tx.inputs.iter_mut().zip(script_sigs) {
                input.script_sig = script_sig;
            }
        } else {
            let mut prevout_scripts = Vec::with_capacity(tx.inputs.len());
            for input in &tx.inputs {
                let outpoint = &input.previous_output;
                prevout_scripts.push(
                    fetcher
                        .fetch_prevout_script(&outpoint.txid_hex(), outpoint.vout)
                        .await?,
                );
            }
            Self::sign_local(key, tx, &prevout_scripts)?;
        }
        Ok(())
    }

    /// Accumulates UTXOs in list order until `target` is covered.
    pub(crate) fn select_utxos(
        utxos: &[Utxo],
        target: u64,
    ) -> Result<(Vec<Utxo>, u64), WalletError> {
        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for utxo in utxos {
            total = total.checked_add(utxo.value).ok_or_else(|| {
                WalletError::InvalidAmount("input total overflows".to_string())
            })?;
            selected.push(utxo.clone());
            if total >= target {
                return Ok((selected, total));
            }
        }
        Err(WalletError::InsufficientFunds(format!(
            "have {} base units, need {}",
            total, target
        )))
    }

    pub(crate) fn sign_local(
        key: &KeyMaterial,
        tx: &mut Transaction,
        prevout_scripts: &[Vec<u8>],
    ) -> Result<(), WalletError> {
        let pubkey = key.public_key_bytes();
        for index in 0..tx.inputs.len() {
            let digest = tx.signature_hash(index, &prevout_scripts[index], SIGHASH_ALL)?;
            let mut der = key.sign_hash(&digest)?;
            der.push(SIGHASH_ALL as u8);
            tx.inputs[index].script_sig = script::unlocking_script(&der, &pubkey);
        }
        Ok(())
    }
}
