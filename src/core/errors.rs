use std::fmt;

/// Custom error type for wallet operations.
#[derive(Debug)]
pub enum WalletError {
    /// The amount string is not a valid decimal literal, has more fractional
    /// digits than the unit allows, or does not fit the target integer width.
    InvalidAmount(String),
    /// The available unspent outputs cannot cover amount plus fee.
    InsufficientFunds(String),
    /// Bad Base58Check payload, checksum or version byte (WIF or address).
    InvalidEncoding(String),
    /// Hardened derivation was requested on a watch-only node.
    DerivationRequiresPrivateKey,
    /// The key is watch-only and no delegated signer is attached.
    DelegationUnavailable,
    /// A token amount computation would wrap around 2^256.
    AmountOverflow(String),
    /// The message length does not fit the single-byte length prefix.
    MessageTooLong(usize),
    /// A signing operation was requested on watch-only key material.
    NoPrivateKey,
    /// Explorer or device I/O failure.
    NetworkError(String),
    /// Internal cryptographic failure (HMAC, curve arithmetic).
    CryptoError(String),
    /// Input validation errors (paths, indices, scripts).
    ValidationError(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            WalletError::InsufficientFunds(msg) => write!(f, "Insufficient funds: {}", msg),
            WalletError::InvalidEncoding(msg) => write!(f, "Invalid encoding: {}", msg),
            WalletError::DerivationRequiresPrivateKey => {
                write!(f, "Hardened derivation requires a private key")
            }
            WalletError::DelegationUnavailable => {
                write!(f, "No private key and no delegated signer available")
            }
            WalletError::AmountOverflow(msg) => write!(f, "Amount overflow: {}", msg),
            WalletError::MessageTooLong(len) => {
                write!(f, "Message too long: {} bytes (limit 255)", len)
            }
            WalletError::NoPrivateKey => write!(f, "Key material is watch-only"),
            WalletError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            WalletError::CryptoError(msg) => write!(f, "Crypto error: {}", msg),
            WalletError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

impl WalletError {
    /// Refresh-style operations may retry these without user interaction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::NetworkError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_insufficient_funds() {
        let err = WalletError::InsufficientFunds("need 10, have 3".to_string());
        assert_eq!(format!("{}", err), "Insufficient funds: need 10, have 3");
    }

    #[test]
    fn test_display_message_too_long() {
        let err = WalletError::MessageTooLong(256);
        assert_eq!(format!("{}", err), "Message too long: 256 bytes (limit 255)");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(WalletError::NetworkError("timeout".to_string()).is_retryable());
        assert!(!WalletError::NoPrivateKey.is_retryable());
        assert!(!WalletError::DelegationUnavailable.is_retryable());
    }
}
