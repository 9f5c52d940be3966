// src/lib.rs
pub mod addresses;
pub mod calldata;
pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod gas;
pub mod nonce;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod types;
pub mod uniswap;

pub use client::{ChainClient, EthersChainClient, SimulationTransport};
pub use config::ProviderConfig;
pub use error::SwapRequestError;
pub use provider::SmartAccountV1Provider;
