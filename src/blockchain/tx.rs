//! Legacy transaction structures and binary encoding
//!
//! Encoding is bit-exact legacy serialization: little-endian integers,
//! varint-prefixed lists, txids stored byte-reversed relative to their
//! display hex. The signature hash here is the legacy SIGHASH_ALL scheme.

use crate::core::errors::WalletError;
use crate::crypto::sha256d;

pub const TX_VERSION: i32 = 2;
pub const SIGHASH_ALL: u32 = 0x01;

/// Reference to an output of a prior transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutPoint {
    /// Internal byte order (reversed from display hex).
    pub txid: [u8; 32],
    pub vout: u32,
}

impl OutPoint {
    /// Parses a display-order txid hex string.
    pub fn from_txid_hex(txid: &str, vout: u32) -> Result<Self, WalletError> {
        let bytes = hex::decode(txid)
            .map_err(|e| WalletError::InvalidEncoding(format!("bad txid hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(WalletError::InvalidEncoding(format!(
                "txid must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut internal = [0u8; 32];
        for (i, b) in bytes.iter().rev().enumerate() {
            internal[i] = *b;
        }
        Ok(Self { txid: internal, vout })
    }

    /// Display-order hex of the referenced txid.
    pub fn txid_hex(&self) -> String {
        let mut display = self.txid;
        display.reverse();
        hex::encode(display)
    }
}

#[derive(Debug, Clone)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Vec::new(),
            sequence: u32::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

fn write_varint(buf: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

impl Transaction {
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            version: TX_VERSION,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.estimate_size());
        buf.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(&input.previous_output.txid);
            buf.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            write_varint(&mut buf, input.script_sig.len() as u64);
            buf.extend_from_slice(&input.script_sig);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_varint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_varint(&mut buf, output.script_pubkey.len() as u64);
            buf.extend_from_slice(&output.script_pubkey);
        }
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Display-order txid: double-SHA256 of the serialization, reversed.
    pub fn txid(&self) -> String {
        let mut hash = sha256d(&self.serialize());
        hash.reverse();
        hex::encode(hash)
    }

    /// Legacy SIGHASH_ALL digest for input `index`.
    ///
    /// All input scripts are cleared except the signing input, which carries
    /// `script_code` (the locking script of the output being spent); the
    /// 4-byte hash type is appended before double hashing.
    pub fn signature_hash(
        &self,
        index: usize,
        script_code: &[u8],
        hash_type: u32,
    ) -> Result<[u8; 32], WalletError> {
        if index >= self.inputs.len() {
            return Err(WalletError::ValidationError(format!(
                "input index {} out of range ({} inputs)",
                index,
                self.inputs.len()
            )));
        }
        let mut copy = self.clone();
        for (i, input) in copy.inputs.iter_mut().enumerate() {
            input.script_sig = if i == index {
                script_code.to_vec()
            } else {
                Vec::new()
            };
        }
        let mut preimage = copy.serialize();
        preimage.extend_from_slice(&hash_type.to_le_bytes());
        Ok(sha256d(&preimage))
    }

    fn estimate_size(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| 41 + i.script_sig.len())
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| 9 + o.script_pubkey.len())
            .sum();
        10 + inputs + outputs
    }
}
