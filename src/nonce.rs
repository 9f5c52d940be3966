// src/nonce.rs
use ethers::types::{Address, U256};
use tracing::debug;

use crate::client::ChainClient;
use crate::error::{Result, SwapRequestError};

pub const MAX_SEQUENCE_ID: u64 = 1 << 31;

pub fn direction_bit(token_in: Address, token_out: Address) -> u64 {
    u64::from(token_in < token_out)
}

// key = (pool << 32) | (zero_for_one << 31) | sequence_id
pub fn nonce_key(
    pool: Address,
    token_in: Address,
    token_out: Address,
    sequence_id: u64,
) -> Result<U256> {
    check_sequence_id(sequence_id)?;

    let prefix = U256::from_big_endian(pool.as_bytes()) << 32;
    let suffix = (direction_bit(token_in, token_out) << 31) | sequence_id;
    Ok(prefix | U256::from(suffix))
}

pub fn check_sequence_id(sequence_id: u64) -> Result<()> {
    if sequence_id >= MAX_SEQUENCE_ID {
        return Err(SwapRequestError::SequenceIdOutOfRange(sequence_id));
    }
    Ok(())
}

// Read, not reserved. Concurrent requests on one partition see the same nonce
#[allow(clippy::too_many_arguments)]
pub async fn derive_nonce<C: ChainClient + ?Sized>(
    client: &C,
    entry_point: Address,
    smart_account: Address,
    dex_factory: Address,
    token_in: Address,
    token_out: Address,
    fee: u32,
    sequence_id: u64,
) -> Result<U256> {
    check_sequence_id(sequence_id)?;

    let pool = client.get_pool(dex_factory, token_in, token_out, fee).await?;
    let key = nonce_key(pool, token_in, token_out, sequence_id)?;
    debug!("Nonce key for pool {:?}: {:#x}", pool, key);

    client.get_nonce(entry_point, smart_account, key).await
}
