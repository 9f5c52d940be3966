// src/error.rs
use ethers::types::Address;
use thiserror::Error;

use crate::addresses::DexName;

#[derive(Error, Debug)]
pub enum SwapRequestError {
    #[error("{key} not configured for chain {chain_id}")]
    MissingConfig { key: &'static str, chain_id: u64 },

    #[error("{0} not supported")]
    UnsupportedDex(DexName),

    #[error("Must provide either `smartAccount` or `initSmartAccountInput`")]
    MissingSender,

    #[error("Smart account {given:?} does not match {derived:?} derived from `initSmartAccountInput`")]
    SenderMismatch { given: Address, derived: Address },

    #[error("TokenIn and TokenOut must be different")]
    SameToken,

    #[error("Sequence id {0} must be less than 2^31")]
    SequenceIdOutOfRange(u64),

    #[error("Smart account {0:?} already exists")]
    SmartAccountExists(Address),

    #[error("Session key {0:?} already authorized")]
    SessionKeyAuthorized(Address),

    #[error("Session key {0:?} not authorized")]
    SessionKeyNotAuthorized(Address),

    #[error("Invalid session public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Ethereum provider error: {0}")]
    EthereumProviderError(String),

    #[error("Can not estimate verification gas. {0}")]
    VerificationGas(String),

    #[error("Failed to decode {what}: 0x{payload}")]
    Decode { what: &'static str, payload: String },

    #[error("Malformed JSON-RPC response: {0}")]
    MalformedResponse(String),
}

impl SwapRequestError {
    // Caller mistakes, detected before any remote call
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::MissingConfig { .. }
                | Self::UnsupportedDex(_)
                | Self::MissingSender
                | Self::SenderMismatch { .. }
                | Self::SameToken
                | Self::SequenceIdOutOfRange(_)
                | Self::SmartAccountExists(_)
                | Self::SessionKeyAuthorized(_)
                | Self::SessionKeyNotAuthorized(_)
                | Self::InvalidPublicKey(_)
                | Self::InvalidParameters(_)
        )
    }

    pub(crate) fn decode(what: &'static str, payload: impl AsRef<[u8]>) -> Self {
        Self::Decode {
            what,
            payload: hex::encode(payload),
        }
    }
}

pub type Result<T, E = SwapRequestError> = std::result::Result<T, E>;
