//! Token contract deployment
//!
//! Deploys an EVM token contract through an `OP_CREATE` output. Constructor
//! parameters are ABI-encoded `(string, string, uint8, uint256)` and appended
//! to the compiled contract bytecode; the issued supply is scaled by the
//! token's own decimals before encoding, and the scaled value must fit in
//! 256 bits.

use crate::blockchain::builder::TransactionBuilder;
use crate::blockchain::script::{self, contract_create_script};
use crate::blockchain::traits::PrevTxFetcher;
use crate::blockchain::tx::{Transaction, TxIn, TxOut};
use crate::blockchain::utxo::Utxo;
use crate::core::errors::WalletError;
use crate::core::keys::KeyMaterial;
use crate::crypto::hd::DelegateHandle;
use ethers::abi::{encode, Token};
use ethers::types::U256;
use tracing::debug;

/// ABI-encodes token constructor parameters.
///
/// `total_supply` is the issued amount in whole tokens as a decimal string;
/// the encoded value is `total_supply * 10^decimals`. `AmountOverflow` when
/// the scaled supply does not fit in 256 bits.
pub fn encode_create_token_params(
    name: &str,
    symbol: &str,
    decimals: u8,
    total_supply: &str,
) -> Result<Vec<u8>, WalletError> {
    let supply = U256::from_dec_str(total_supply).map_err(|e| {
        WalletError::InvalidAmount(format!("bad total supply {:?}: {}", total_supply, e))
    })?;
    let scaled = supply
        .checked_mul(U256::exp10(decimals as usize))
        .ok_or_else(|| {
            WalletError::AmountOverflow(format!(
                "{} * 10^{} exceeds 256 bits",
                total_supply, decimals
            ))
        })?;
    Ok(encode(&[
        Token::String(name.to_string()),
        Token::String(symbol.to_string()),
        Token::Uint(U256::from(decimals)),
        Token::Uint(scaled),
    ]))
}

/// Builds and signs a transaction deploying a token contract.
///
/// The first output carries the `OP_CREATE` script with zero value; the gas
/// budget (`gas_limit * gas_price`) plus `fee` is funded from `utxos`, with
/// any remainder returned as change. The supply overflow check runs before
/// any input is signed.
#[allow(clippy::too_many_arguments)]
pub async fn build_create_token_transaction(
    key: &KeyMaterial,
    delegate: Option<&DelegateHandle>,
    fetcher: &dyn PrevTxFetcher,
    bytecode: &[u8],
    name: &str,
    symbol: &str,
    decimals: u8,
    total_supply: &str,
    gas_limit: u64,
    gas_price: u64,
    fee: u64,
    utxos: &[Utxo],
) -> Result<Transaction, WalletError> {
    let mut payload = bytecode.to_vec();
    payload.extend_from_slice(&encode_create_token_params(
        name,
        symbol,
        decimals,
        total_supply,
    )?);

    let gas_budget = gas_limit.checked_mul(gas_price).ok_or_else(|| {
        WalletError::InvalidAmount("gas budget overflows".to_string())
    })?;
    let target = gas_budget.checked_add(fee).ok_or_else(|| {
        WalletError::InvalidAmount("gas budget + fee overflows".to_string())
    })?;

    let (selected, total) = TransactionBuilder::select_utxos(utxos, target)?;
    debug!(
        inputs = selected.len(),
        gas_budget, fee, "funding token deployment"
    );

    let params = key.network();
    let mut outputs = vec![TxOut {
        value: 0,
        script_pubkey: contract_create_script(gas_limit, gas_price, &payload),
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

    TransactionBuilder::sign_transaction(key, delegate, fetcher, &mut tx).await?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::script::OP_CREATE;
    use crate::core::network::{Network, NetworkParams};
    use async_trait::async_trait;

    #[test]
    fn test_encode_layout() {
        let encoded = encode_create_token_params("Demo", "DMO", 8, "21000000").unwrap();
        // Four head slots precede the dynamic string tails.
        assert!(encoded.len() >= 128);
        // Slot 2 is the uint8 decimals.
        assert_eq!(encoded[95], 8);
        // Slot 3 is the scaled supply: 21000000 * 10^8.
        let scaled = U256::from_big_endian(&encoded[96..128]);
        assert_eq!(scaled, U256::from(2_100_000_000_000_000u64));
    }

    #[test]
    fn test_supply_overflow_boundary() {
        // 10^60 * 10^18 = 10^78 > 2^256 (~1.16e77).
        let huge = "1".to_string() + &"0".repeat(60);
        assert!(matches!(
            encode_create_token_params("T", "T", 18, &huge),
            Err(WalletError::AmountOverflow(_))
        ));
        // One token with 18 decimals is fine.
        assert!(encode_create_token_params("T", "T", 18, "1").is_ok());
        // 2^256 - 1 with no scaling is the largest admissible value.
        let max = U256::MAX.to_string();
        assert!(encode_create_token_params("T", "T", 0, &max).is_ok());
        // Any scaling of 2^256 - 1 overflows.
        assert!(encode_create_token_params("T", "T", 1, &max).is_err());
    }

    #[test]
    fn test_supply_must_be_decimal() {
        assert!(matches!(
            encode_create_token_params("T", "T", 8, "12a4"),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    struct FixedFetcher(Vec<u8>);

    #[async_trait]
    impl PrevTxFetcher for FixedFetcher {
        async fn fetch_prevout_script(
            &self,
            _txid: &str,
            _vout: u32,
        ) -> Result<Vec<u8>, WalletError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_token_deploy_transaction_shape() {
        let params = NetworkParams::for_network(Network::Mainnet);
        let key = KeyMaterial::from_secret_bytes(&[0x42u8; 32], params).unwrap();
        let fetcher = FixedFetcher(
            script::script_pubkey_for_address(&key.address(), &params).unwrap(),
        );
        let utxos = vec![Utxo {
            address: key.address(),
            txid: "aa00000000000000000000000000000000000000000000000000000000000bb0"
                .to_string(),
            vout: 0,
            value: 200_000_000,
            confirmations: 6,
        }];
        let tx = build_create_token_transaction(
            &key,
            None,
            &fetcher,
            &[0x60, 0x80, 0x60, 0x40],
            "Demo",
            "DMO",
            8,
            "1000000",
            2_500_000,
            40,
            10_000_000,
            &utxos,
        )
        .await
        .unwrap();
        // OP_CREATE output first, zero value.
        assert_eq!(tx.outputs[0].value, 0);
        assert_eq!(*tx.outputs[0].script_pubkey.last().unwrap(), OP_CREATE);
        // Change: 200_000_000 - (2_500_000 * 40 + 10_000_000) = 90_000_000.
        assert_eq!(tx.outputs[1].value, 90_000_000);
        assert!(!tx.inputs[0].script_sig.is_empty());
    }

    #[tokio::test]
    async fn test_overflow_rejected_before_fetching_or_signing() {
        struct PanicFetcher;

        #[async_trait]
        impl PrevTxFetcher for PanicFetcher {
            async fn fetch_prevout_script(
                &self,
                _txid: &str,
                _vout: u32,
            ) -> Result<Vec<u8>, WalletError> {
                panic!("must not reach the network on an invalid supply");
            }
        }

        let params = NetworkParams::for_network(Network::Mainnet);
        let key = KeyMaterial::from_secret_bytes(&[0x42u8; 32], params).unwrap();
        let huge = "1".to_string() + &"0".repeat(60);
        let err = build_create_token_transaction(
            &key,
            None,
            &PanicFetcher,
            &[],
            "T",
            "T",
            18,
            &huge,
            2_500_000,
            40,
            10_000_000,
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WalletError::AmountOverflow(_)));
    }
}
