//! Error types for the wallet engine

use thiserror::Error;

/// Core errors that can occur in the wallet engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Indexer connection and query errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexerError {
    #[error("Indexer unreachable at {url}")]
    Unreachable { url: String },

    #[error("Indexer returned error: {message}")]
    ApiError { message: String },

    #[error("Indexer request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Token not found: {token_id}")]
    TokenNotFound { token_id: String },
}

/// Token accounting errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid decimals {decimals}: decimals must be an integer 0-9")]
    InvalidDecimals { decimals: u8 },

    #[error("No token utxos for tokenId {token_id}")]
    NoTokenUtxos { token_id: String },

    #[error("Insufficient tokens ({token}): need {required}, have {available}")]
    InsufficientTokens {
        token: String,
        required: String,
        available: String,
    },
}

/// Result type alias for wallet engine operations
pub type Result<T> = std::result::Result<T, Error>;

impl TokenError {
    /// Get a stable error code for callers that surface errors by name
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidDecimals { .. } => "invalid_decimals",
            Self::NoTokenUtxos { .. } => "no_token_utxos",
            Self::InsufficientTokens { .. } => "insufficient_tokens",
        }
    }
}
