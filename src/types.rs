// src/types.rs
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

use crate::addresses::DexName;
use crate::contracts;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperation {
    pub fn with_signature(self, signature: Bytes) -> Self {
        Self { signature, ..self }
    }
}

impl From<UserOperation> for contracts::UserOperation {
    fn from(op: UserOperation) -> Self {
        Self {
            sender: op.sender,
            nonce: op.nonce,
            init_code: op.init_code,
            call_data: op.call_data,
            call_gas_limit: op.call_gas_limit,
            verification_gas_limit: op.verification_gas_limit,
            pre_verification_gas: op.pre_verification_gas,
            max_fee_per_gas: op.max_fee_per_gas,
            max_priority_fee_per_gas: op.max_priority_fee_per_gas,
            paymaster_and_data: op.paymaster_and_data,
            signature: op.signature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinglePathSwapInput {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    // Defaults to the smart account
    #[serde(default)]
    pub recipient: Option<Address>,
    pub deadline: U256,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    // Zero means no limit
    #[serde(default)]
    pub sqrt_price_limit_x96: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSmartAccountInput {
    pub owner: Address,
    pub salt: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapRequestInput {
    // Sequence id inside the (pool, direction) nonce partition
    #[serde(default)]
    pub order_id: u64,
    #[serde(default)]
    pub smart_account: Option<Address>,
    pub dex: DexName,
    pub swap_input: SinglePathSwapInput,
    #[serde(default)]
    pub gasless: bool,
    #[serde(default)]
    pub init_smart_account_input: Option<InitSmartAccountInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapRequestOutput {
    pub smart_account: Address,
    pub user_op_hash: H256,
    pub request: UserOperation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    // Hex, no 0x prefix
    pub private_key: String,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionKeyRequestOutput {
    pub session_key: SessionKey,
    pub request: TypedData,
}

// simulateValidation always reverts, a return is unexpected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationOutcome {
    Returned(Bytes),
    Reverted(Bytes),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn swap_input_defaults_optional_fields() {
        let input: CreateSwapRequestInput = serde_json::from_value(json!({
            "dex": "uniswapV3",
            "swapInput": {
                "tokenIn": "0xfff9976782d46cc05630d1f6ebab18b2324d6b14",
                "tokenOut": "0x11cb8ef24755bc347aae8b9694f24d66fe94d6c2",
                "fee": 3000,
                "deadline": "0x8000000000000000000000000000000000000000000000000000000000000000",
                "amountIn": "0x2710",
                "amountOutMinimum": "0x0"
            },
            "gasless": true
        }))
        .unwrap();

        assert_eq!(input.order_id, 0);
        assert_eq!(input.smart_account, None);
        assert_eq!(input.init_smart_account_input, None);
        assert_eq!(input.swap_input.recipient, None);
        assert_eq!(input.swap_input.sqrt_price_limit_x96, None);
        assert_eq!(input.swap_input.amount_in, U256::from(10_000));
        assert_eq!(input.dex, DexName::UniswapV3);
    }

    #[test]
    fn user_operation_serializes_camel_case() {
        let op = UserOperation::default();
        let value = serde_json::to_value(&op).unwrap();
        assert!(value.get("callGasLimit").is_some());
        assert!(value.get("paymasterAndData").is_some());
        assert_eq!(value["signature"], json!("0x"));
    }

    #[test]
    fn with_signature_only_touches_signature() {
        let op = UserOperation {
            nonce: U256::from(7),
            ..Default::default()
        };
        let signed = op.clone().with_signature(Bytes::from(vec![1, 2, 3]));
        assert_eq!(signed.nonce, op.nonce);
        assert_eq!(signed.signature, Bytes::from(vec![1, 2, 3]));
    }
}
