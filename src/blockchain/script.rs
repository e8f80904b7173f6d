//! Script construction
//!
//! Only the script shapes the wallet spends and creates: P2PKH locking and
//! unlocking scripts, and the EVM contract-creation script used for token
//! deployment.

use crate::core::errors::WalletError;
use crate::core::network::NetworkParams;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CREATE: u8 = 0xc1;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;

/// Appends `data` with the minimal push opcode.
pub fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0..=0x4b => script.push(data.len() as u8),
        0x4c..=0xff => {
            script.push(OP_PUSHDATA1);
            script.push(data.len() as u8);
        }
        0x100..=0xffff => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(data.len() as u16).to_le_bytes());
        }
        _ => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(data.len() as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
}

/// Pushes an integer as a minimally-encoded script number.
pub fn push_script_num(script: &mut Vec<u8>, value: u64) {
    if value == 0 {
        script.push(0x00);
        return;
    }
    if value <= 16 {
        // OP_1..OP_16
        script.push(0x50 + value as u8);
        return;
    }
    let mut bytes = Vec::new();
    let mut v = value;
    while v > 0 {
        bytes.push((v & 0xff) as u8);
        v >>= 8;
    }
    // Sign bit must be clear for a positive number.
    if bytes[bytes.len() - 1] & 0x80 != 0 {
        bytes.push(0x00);
    }
    push_data(script, &bytes);
}

/// P2PKH locking script for a 20-byte pubkey hash.
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    push_data(&mut script, pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Locking script for a Base58Check address, rejecting foreign version bytes.
pub fn script_pubkey_for_address(
    address: &str,
    params: &NetworkParams,
) -> Result<Vec<u8>, WalletError> {
    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| WalletError::InvalidEncoding(format!("bad address {}: {}", address, e)))?;
    if payload.len() != 21 {
        return Err(WalletError::InvalidEncoding(format!(
            "address payload must be 21 bytes, got {}",
            payload.len()
        )));
    }
    if payload[0] != params.pubkey_hash_version {
        return Err(WalletError::InvalidEncoding(format!(
            "address version byte 0x{:02x} does not match network",
            payload[0]
        )));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(p2pkh_script(&hash))
}

/// P2PKH unlocking script: signature push then pubkey push.
pub fn unlocking_script(signature: &[u8], pubkey: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(2 + signature.len() + pubkey.len());
    push_data(&mut script, signature);
    push_data(&mut script, pubkey);
    script
}

/// Contract-creation script: EVM version, gas limit, gas price, bytecode,
/// OP_CREATE.
pub fn contract_create_script(gas_limit: u64, gas_price: u64, bytecode: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(bytecode.len() + 16);
    push_script_num(&mut script, 4); // EVM version
    push_script_num(&mut script, gas_limit);
    push_script_num(&mut script, gas_price);
    push_data(&mut script, bytecode);
    script.push(OP_CREATE);
    script
}
