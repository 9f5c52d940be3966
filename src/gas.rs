// src/gas.rs
use ethers::abi::AbiDecode;
use ethers::types::{Address, Bytes, U256};
use tracing::{debug, warn};

use crate::client::ChainClient;
use crate::contracts::{ExecuteBatchCall, IEntryPointErrors};
use crate::error::{Result, SwapRequestError};
use crate::types::{SimulationOutcome, UserOperation};

// ref: https://github.com/wolflo/evm-opcodes/blob/main/gas.md#aa-call-operations
pub const BASE_TRANSACTION_GAS: u64 = 21_000;

// At or below this the account has no code yet and the estimate is meaningless
pub const UNDEPLOYED_ACCOUNT_GAS_THRESHOLD: u64 = 50_000;

pub const FALLBACK_CALL_GAS_LIMIT: u64 = 200_000;

pub const MAX_VERIFICATION_GAS: u64 = 30_000_000;

// Never fails. A failed estimate falls back to FALLBACK_CALL_GAS_LIMIT
pub async fn estimate_call_gas<C: ChainClient + ?Sized>(
    client: &C,
    entry_point: Address,
    smart_account: Address,
    call: ExecuteBatchCall,
) -> U256 {
    match client
        .estimate_execute_batch_gas(entry_point, smart_account, call)
        .await
    {
        Ok(estimated) if estimated <= U256::from(UNDEPLOYED_ACCOUNT_GAS_THRESHOLD) => {
            debug!(
                "Estimate {} for {:?} too low, account not deployed",
                estimated, smart_account
            );
            U256::from(FALLBACK_CALL_GAS_LIMIT)
        }
        Ok(estimated) => estimated - U256::from(BASE_TRANSACTION_GAS),
        Err(e) => {
            warn!(
                "Call gas estimation for {:?} failed, using fallback: {}",
                smart_account, e
            );
            U256::from(FALLBACK_CALL_GAS_LIMIT)
        }
    }
}

pub async fn estimate_verification_gas<C: ChainClient + ?Sized>(
    client: &C,
    entry_point: Address,
    user_op: &UserOperation,
    mock_signature: Bytes,
) -> Result<U256> {
    let simulated = UserOperation {
        verification_gas_limit: U256::from(MAX_VERIFICATION_GAS),
        signature: mock_signature,
        ..user_op.clone()
    };

    match client.simulate_validation(entry_point, simulated).await? {
        SimulationOutcome::Reverted(data) => decode_validation_revert(&data),
        SimulationOutcome::Returned(_) => Err(SwapRequestError::VerificationGas(
            "simulateValidation returned without reverting".to_string(),
        )),
    }
}

pub fn decode_validation_revert(data: &[u8]) -> Result<U256> {
    let decoded = IEntryPointErrors::decode(data)
        .map_err(|_| SwapRequestError::decode("simulateValidation revert", data))?;

    match decoded {
        // returnInfo = (preOpGas, prefund, sigFailed, validAfter, validUntil, paymasterContext)
        IEntryPointErrors::ValidationResult(result) => Ok(result.return_info.0),
        IEntryPointErrors::ValidationResultWithAggregation(result) => Ok(result.return_info.0),
        IEntryPointErrors::FailedOp(failed) => Err(SwapRequestError::VerificationGas(format!(
            "FailedOp({}, {})",
            failed.op_index, failed.reason
        ))),
        IEntryPointErrors::RevertString(reason) => Err(SwapRequestError::VerificationGas(
            format!("Error({})", reason),
        )),
        other => Err(SwapRequestError::VerificationGas(format!("{:?}", other))),
    }
}
