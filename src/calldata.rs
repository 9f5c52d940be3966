// src/calldata.rs
use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, H160, U256};

use crate::contracts::{
    ApproveCall, CreateAccountCall, ExactInputSingleCall, ExactInputSingleParams,
    ExecuteBatchCall, MulticallCall, UnwrapWeth9Call,
};
use crate::types::SinglePathSwapInput;

// Output stays in the router until unwrapWETH9 pays it out
pub const ROUTER_HELD_RECIPIENT: Address = H160([0; 20]);

// WETH output is swapped into the router and unwrapped in the same multicall
pub fn swap_router_calldata(
    swap: &SinglePathSwapInput,
    weth: Address,
    smart_account: Address,
) -> Bytes {
    let recipient = swap.recipient.unwrap_or(smart_account);
    let params = |recipient| ExactInputSingleParams {
        token_in: swap.token_in,
        token_out: swap.token_out,
        fee: swap.fee,
        recipient,
        deadline: swap.deadline,
        amount_in: swap.amount_in,
        amount_out_minimum: swap.amount_out_minimum,
        sqrt_price_limit_x96: swap.sqrt_price_limit_x96.unwrap_or_default(),
    };

    if swap.token_out == weth {
        let exact_input_single = ExactInputSingleCall {
            params: params(ROUTER_HELD_RECIPIENT),
        };
        let unwrap_weth9 = UnwrapWeth9Call {
            amount_minimum: swap.amount_out_minimum,
            recipient,
        };

        MulticallCall {
            data: vec![
                exact_input_single.encode().into(),
                unwrap_weth9.encode().into(),
            ],
        }
        .encode()
        .into()
    } else {
        ExactInputSingleCall {
            params: params(recipient),
        }
        .encode()
        .into()
    }
}

// WETH input goes to the router as value, anything else is approved first
pub fn swap_batch(
    swap: &SinglePathSwapInput,
    weth: Address,
    swap_router: Address,
    router_calldata: Bytes,
) -> ExecuteBatchCall {
    if swap.token_in == weth {
        ExecuteBatchCall {
            dest: vec![swap_router],
            value: vec![swap.amount_in],
            func: vec![router_calldata],
        }
    } else {
        let approve = ApproveCall {
            spender: swap_router,
            amount: swap.amount_in,
        };

        ExecuteBatchCall {
            dest: vec![swap.token_in, swap_router],
            value: vec![U256::zero(), U256::zero()],
            func: vec![approve.encode().into(), router_calldata],
        }
    }
}

pub fn execute_batch_calldata(call: ExecuteBatchCall) -> Bytes {
    call.encode().into()
}

// factory ++ createAccount(owner, salt)
pub fn init_code(factory: Address, owner: Address, salt: U256) -> Bytes {
    let mut bytes = factory.as_bytes().to_vec();
    bytes.extend(CreateAccountCall { owner, salt }.encode());
    bytes.into()
}
