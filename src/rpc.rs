// src/rpc.rs
use std::sync::Arc;

use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Bytes, U256};
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::error::{ErrorObject, ErrorObjectOwned, INVALID_PARAMS_CODE};
use tracing::{debug, error, info};

use crate::client::ChainClient;
use crate::error::SwapRequestError;
use crate::provider::SmartAccountV1Provider;
use crate::session;
use crate::types::{CreateSessionKeyRequestOutput, CreateSwapRequestInput, CreateSwapRequestOutput};

pub const SWAP_ERROR_CODE: i32 = -32000;

#[rpc(server, namespace = "swap")]
pub trait SwapRpc {
    #[method(name = "createSwapRequest")]
    async fn create_swap_request(
        &self,
        input: CreateSwapRequestInput,
    ) -> RpcResult<CreateSwapRequestOutput>;

    #[method(name = "getSmartAccountAddress")]
    async fn get_smart_account_address(&self, owner: Address, salt: U256) -> RpcResult<Address>;

    #[method(name = "createSessionKeyRequest")]
    async fn create_session_key_request(
        &self,
        owner: Address,
        salt: U256,
    ) -> RpcResult<CreateSessionKeyRequestOutput>;

    #[method(name = "revokeSessionKeyRequest")]
    async fn revoke_session_key_request(
        &self,
        owner: Address,
        salt: U256,
        public_key: Bytes,
    ) -> RpcResult<TypedData>;

    #[method(name = "aggregateClientSignatures")]
    async fn aggregate_client_signatures(
        &self,
        owner_signature: Bytes,
        session_signature: Bytes,
        session_nonce: U256,
    ) -> RpcResult<Bytes>;
}

pub struct SwapRpcImpl<C> {
    provider: Arc<SmartAccountV1Provider<C>>,
}

impl<C: ChainClient> SwapRpcImpl<C> {
    pub fn new(provider: Arc<SmartAccountV1Provider<C>>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<C: ChainClient> SwapRpcServer for SwapRpcImpl<C> {
    async fn create_swap_request(
        &self,
        input: CreateSwapRequestInput,
    ) -> RpcResult<CreateSwapRequestOutput> {
        debug!(
            "Received swap request {} -> {} on {}",
            input.swap_input.token_in, input.swap_input.token_out, input.dex
        );

        match self.provider.create_swap_request(input).await {
            Ok(output) => {
                info!(
                    "Built swap request {:?} for {:?}",
                    output.user_op_hash, output.smart_account
                );
                Ok(output)
            }
            Err(e) => Err(rpc_error("createSwapRequest", e)),
        }
    }

    async fn get_smart_account_address(&self, owner: Address, salt: U256) -> RpcResult<Address> {
        self.provider
            .get_smart_account_address(owner, salt)
            .await
            .map_err(|e| rpc_error("getSmartAccountAddress", e))
    }

    async fn create_session_key_request(
        &self,
        owner: Address,
        salt: U256,
    ) -> RpcResult<CreateSessionKeyRequestOutput> {
        debug!("Received session key request for owner {:?}", owner);

        self.provider
            .create_session_key_request(owner, salt)
            .await
            .map_err(|e| rpc_error("createSessionKeyRequest", e))
    }

    async fn revoke_session_key_request(
        &self,
        owner: Address,
        salt: U256,
        public_key: Bytes,
    ) -> RpcResult<TypedData> {
        debug!("Received session key revocation for owner {:?}", owner);

        self.provider
            .revoke_session_key_request(owner, salt, &public_key)
            .await
            .map_err(|e| rpc_error("revokeSessionKeyRequest", e))
    }

    async fn aggregate_client_signatures(
        &self,
        owner_signature: Bytes,
        session_signature: Bytes,
        session_nonce: U256,
    ) -> RpcResult<Bytes> {
        Ok(session::aggregate_client_signatures(
            &owner_signature,
            &session_signature,
            session_nonce,
        ))
    }
}

pub fn rpc_error(method: &str, e: SwapRequestError) -> ErrorObjectOwned {
    let code = if e.is_invalid_request() {
        INVALID_PARAMS_CODE
    } else {
        error!("{} failed: {}", method, e);
        SWAP_ERROR_CODE
    };

    ErrorObject::owned(code, e.to_string(), None::<()>)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::addresses::{DexAddressesV3, DexConfig, DexName};
    use crate::client::MockChainClient;
    use crate::config::{ProviderConfig, ResolvedConfig};
    use crate::types::SinglePathSwapInput;

    fn rpc(client: MockChainClient, config: ProviderConfig) -> SwapRpcImpl<MockChainClient> {
        let provider = SmartAccountV1Provider::from_resolved(
            Arc::new(client),
            ResolvedConfig::resolve(11155111, config),
        );
        SwapRpcImpl::new(Arc::new(provider))
    }

    #[test]
    fn request_errors_are_invalid_params() {
        let err = rpc_error("createSwapRequest", SwapRequestError::SameToken);
        assert_eq!(err.code(), INVALID_PARAMS_CODE);
        assert_eq!(err.message(), "TokenIn and TokenOut must be different");
    }

    #[test]
    fn remote_errors_are_server_errors_with_message() {
        let err = rpc_error(
            "createSwapRequest",
            SwapRequestError::EthereumProviderError("timeout".to_string()),
        );
        assert_eq!(err.code(), SWAP_ERROR_CODE);
        assert_eq!(err.message(), "Ethereum provider error: timeout");
    }

    #[tokio::test]
    async fn aggregate_is_served_without_chain_access() {
        let rpc = rpc(MockChainClient::new(), ProviderConfig::default());
        let signature = rpc
            .aggregate_client_signatures(
                Bytes::from(vec![0x11; 65]),
                Bytes::from(vec![0x22; 65]),
                U256::from(1),
            )
            .await
            .unwrap();
        assert_eq!(signature.len(), 162);
        assert_eq!(signature[161], 1);
    }

    #[tokio::test]
    async fn swap_precondition_failure_is_invalid_params() {
        let config = ProviderConfig {
            dex: Some(DexConfig {
                weth: Address::repeat_byte(0xee),
                dexes: HashMap::from([(
                    DexName::UniswapV3,
                    DexAddressesV3 {
                        swap_router: Address::repeat_byte(1),
                        factory: Address::repeat_byte(2),
                        nonfungible_position_manager: Address::zero(),
                        quoter_v2: Address::zero(),
                    },
                )]),
            }),
            ..Default::default()
        };
        let input = CreateSwapRequestInput {
            order_id: 0,
            smart_account: Some(Address::repeat_byte(0xac)),
            dex: DexName::UniswapV3,
            swap_input: SinglePathSwapInput {
                token_in: Address::repeat_byte(0x70),
                token_out: Address::repeat_byte(0x70),
                fee: 500,
                recipient: None,
                deadline: U256::MAX,
                amount_in: U256::one(),
                amount_out_minimum: U256::zero(),
                sqrt_price_limit_x96: None,
            },
            gasless: false,
            init_smart_account_input: None,
        };

        let err = rpc(MockChainClient::new(), config)
            .create_swap_request(input)
            .await
            .unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS_CODE);
    }

    #[tokio::test]
    async fn provider_failure_is_server_error() {
        let mut client = MockChainClient::new();
        client.expect_get_account_address().returning(|_, _, _| {
            Err(SwapRequestError::EthereumProviderError("connection refused".into()))
        });

        let err = rpc(client, ProviderConfig::default())
            .get_smart_account_address(Address::repeat_byte(1), U256::zero())
            .await
            .unwrap_err();
        assert_eq!(err.code(), SWAP_ERROR_CODE);
    }
}
