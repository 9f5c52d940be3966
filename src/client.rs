// src/client.rs
use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::contract::ContractError;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
#[cfg(test)]
use mockall::automock;
use serde_json::{json, Value};
use tracing::debug;

use crate::contracts::{
    self, Eip712DomainFields, ExecuteBatchCall, IEntryPoint, SessionKeyManager, SmartAccountV1,
    SmartAccountV1Factory, UniswapV3Factory, ERC20,
};
use crate::error::{Result, SwapRequestError};
use crate::types::{SimulationOutcome, UserOperation};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    async fn chain_id(&self) -> Result<u64>;

    async fn get_pool(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Address>;

    // Counterfactual address from the account factory
    async fn get_account_address(
        &self,
        factory: Address,
        owner: Address,
        salt: U256,
    ) -> Result<Address>;

    async fn get_code(&self, address: Address) -> Result<Bytes>;

    async fn get_nonce(&self, entry_point: Address, sender: Address, key: U256) -> Result<U256>;

    async fn get_user_op_hash(&self, entry_point: Address, user_op: UserOperation) -> Result<H256>;

    // Estimated with the entry point as caller
    async fn estimate_execute_batch_gas(
        &self,
        entry_point: Address,
        smart_account: Address,
        call: ExecuteBatchCall,
    ) -> Result<U256>;

    // Undecoded return or revert data of simulateValidation
    async fn simulate_validation(
        &self,
        entry_point: Address,
        user_op: UserOperation,
    ) -> Result<SimulationOutcome>;

    async fn session_nonce(&self, authority: Address, owner: Address) -> Result<U256>;

    async fn is_session_authorized(
        &self,
        authority: Address,
        owner: Address,
        session_key: Address,
    ) -> Result<bool>;

    async fn eip712_domain(&self, contract: Address) -> Result<Eip712DomainFields>;

    async fn decimals(&self, token: Address) -> Result<u8>;
}

// Some providers drop revert data on the contract-call path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationTransport {
    Contract,
    RawCall { url: String },
}

pub struct EthersChainClient<M> {
    client: Arc<M>,
    simulation: SimulationTransport,
    http: reqwest::Client,
}

impl EthersChainClient<Provider<Http>> {
    pub fn connect(eth_rpc_url: &str, raw_simulation: bool) -> Result<Self> {
        let provider = Provider::<Http>::try_from(eth_rpc_url)
            .map_err(|e| SwapRequestError::InvalidParameters(e.to_string()))?;
        let simulation = if raw_simulation {
            SimulationTransport::RawCall {
                url: eth_rpc_url.to_string(),
            }
        } else {
            SimulationTransport::Contract
        };

        Ok(Self::new(Arc::new(provider), simulation))
    }
}

impl<M: Middleware + 'static> EthersChainClient<M> {
    pub fn new(client: Arc<M>, simulation: SimulationTransport) -> Self {
        Self {
            client,
            simulation,
            http: reqwest::Client::new(),
        }
    }

    async fn raw_eth_call(&self, url: &str, to: Address, data: Bytes) -> Result<SimulationOutcome> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{ "to": to, "data": data }, "latest"],
            "id": 1,
        });

        let envelope: Value = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(provider_error)?
            .json()
            .await
            .map_err(|e| SwapRequestError::MalformedResponse(e.to_string()))?;

        parse_call_envelope(&envelope)
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainClient for EthersChainClient<M> {
    async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.client.get_chainid().await.map_err(provider_error)?;
        u64::try_from(chain_id)
            .map_err(|_| SwapRequestError::MalformedResponse(format!("chain id {}", chain_id)))
    }

    async fn get_pool(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Address> {
        UniswapV3Factory::new(factory, self.client.clone())
            .get_pool(token_a, token_b, fee)
            .call()
            .await
            .map_err(provider_error)
    }

    async fn get_account_address(
        &self,
        factory: Address,
        owner: Address,
        salt: U256,
    ) -> Result<Address> {
        SmartAccountV1Factory::new(factory, self.client.clone())
            .get_address(owner, salt)
            .call()
            .await
            .map_err(provider_error)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.client
            .get_code(address, None)
            .await
            .map_err(provider_error)
    }

    async fn get_nonce(&self, entry_point: Address, sender: Address, key: U256) -> Result<U256> {
        IEntryPoint::new(entry_point, self.client.clone())
            .get_nonce(sender, key)
            .call()
            .await
            .map_err(provider_error)
    }

    async fn get_user_op_hash(&self, entry_point: Address, user_op: UserOperation) -> Result<H256> {
        let hash = IEntryPoint::new(entry_point, self.client.clone())
            .get_user_op_hash(user_op.into())
            .call()
            .await
            .map_err(provider_error)?;
        Ok(H256::from(hash))
    }

    async fn estimate_execute_batch_gas(
        &self,
        entry_point: Address,
        smart_account: Address,
        call: ExecuteBatchCall,
    ) -> Result<U256> {
        SmartAccountV1::new(smart_account, self.client.clone())
            .execute_batch(call.dest, call.value, call.func)
            .from(entry_point)
            .estimate_gas()
            .await
            .map_err(provider_error)
    }

    async fn simulate_validation(
        &self,
        entry_point: Address,
        user_op: UserOperation,
    ) -> Result<SimulationOutcome> {
        let call = IEntryPoint::new(entry_point, self.client.clone())
            .simulate_validation(contracts::UserOperation::from(user_op));

        match &self.simulation {
            SimulationTransport::Contract => match call.call().await {
                Ok(()) => Ok(SimulationOutcome::Returned(Bytes::new())),
                Err(ContractError::Revert(data)) => Ok(SimulationOutcome::Reverted(data)),
                Err(e) => Err(provider_error(e)),
            },
            SimulationTransport::RawCall { url } => {
                let data = call.calldata().ok_or_else(|| {
                    SwapRequestError::InvalidParameters(
                        "simulateValidation calldata missing".to_string(),
                    )
                })?;
                debug!("Simulating validation with raw eth_call against {}", url);
                self.raw_eth_call(url, entry_point, data).await
            }
        }
    }

    async fn session_nonce(&self, authority: Address, owner: Address) -> Result<U256> {
        SessionKeyManager::new(authority, self.client.clone())
            .nonces(owner)
            .call()
            .await
            .map_err(provider_error)
    }

    async fn is_session_authorized(
        &self,
        authority: Address,
        owner: Address,
        session_key: Address,
    ) -> Result<bool> {
        SessionKeyManager::new(authority, self.client.clone())
            .is_authorized(owner, session_key)
            .call()
            .await
            .map_err(provider_error)
    }

    async fn eip712_domain(&self, contract: Address) -> Result<Eip712DomainFields> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(contract)
            .data(contracts::eip712_domain_calldata())
            .into();
        let output = self.client.call(&tx, None).await.map_err(provider_error)?;
        contracts::decode_eip712_domain(&output)
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        ERC20::new(token, self.client.clone())
            .decimals()
            .call()
            .await
            .map_err(provider_error)
    }
}

// Revert data sits in error.data, directly or nested one level under data
pub fn parse_call_envelope(envelope: &Value) -> Result<SimulationOutcome> {
    if let Some(result) = envelope.get("result") {
        return hex_field(result)
            .map(SimulationOutcome::Returned)
            .ok_or_else(|| SwapRequestError::MalformedResponse(envelope.to_string()));
    }

    let error = envelope
        .get("error")
        .ok_or_else(|| SwapRequestError::MalformedResponse(envelope.to_string()))?;

    let data = error
        .get("data")
        .and_then(|data| hex_field(data).or_else(|| data.get("data").and_then(hex_field)));

    match data {
        Some(data) => Ok(SimulationOutcome::Reverted(data)),
        None => match error.get("message").and_then(Value::as_str) {
            Some(message) => Err(SwapRequestError::EthereumProviderError(message.to_string())),
            None => Err(SwapRequestError::MalformedResponse(envelope.to_string())),
        },
    }
}

fn hex_field(value: &Value) -> Option<Bytes> {
    value.as_str().and_then(|s| s.parse::<Bytes>().ok())
}

fn provider_error(e: impl Display) -> SwapRequestError {
    SwapRequestError::EthereumProviderError(e.to_string())
}

#[cfg(test)]
mod tests {
    use ethers::providers::{JsonRpcError, MockProvider, MockResponse};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    // Answers one HTTP request with `response`, handing back the request body
    async fn serve_once(response: Value) -> (String, oneshot::Receiver<Value>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            let body_start = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&request[..body_start]).to_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|len| len.trim().parse().unwrap())
                .unwrap_or(0);
            while request.len() < body_start + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..n]);
            }
            let _ = tx.send(serde_json::from_slice(&request[body_start..]).unwrap());

            let body = response.to_string();
            let reply = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
        });

        (url, rx)
    }

    fn mocked_client(
        simulation: SimulationTransport,
    ) -> (EthersChainClient<Provider<MockProvider>>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (EthersChainClient::new(Arc::new(provider), simulation), mock)
    }

    #[tokio::test]
    async fn raw_call_simulation_reads_revert_from_node_error() {
        let entry_point = Address::repeat_byte(0xee);
        let (url, request) = serve_once(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted", "data": "0x220266b6" }
        }))
        .await;
        let (client, _mock) = mocked_client(SimulationTransport::RawCall { url });

        let outcome = client
            .simulate_validation(entry_point, UserOperation::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SimulationOutcome::Reverted(Bytes::from(vec![0x22, 0x02, 0x66, 0xb6]))
        );

        let request = request.await.unwrap();
        assert_eq!(request["method"], "eth_call");
        assert_eq!(request["params"][0]["to"], json!(entry_point));
        let data = request["params"][0]["data"].as_str().unwrap();
        let selector = hex::encode(contracts::SimulateValidationCall::selector());
        assert!(data.starts_with(&format!("0x{}", selector)));
    }

    #[tokio::test]
    async fn raw_call_simulation_surfaces_node_message() {
        let (url, _request) = serve_once(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "header not found" }
        }))
        .await;
        let (client, _mock) = mocked_client(SimulationTransport::RawCall { url });

        let err = client
            .simulate_validation(Address::zero(), UserOperation::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ethereum provider error: header not found");
    }

    #[tokio::test]
    async fn contract_simulation_takes_revert_from_provider_error() {
        let (client, mock) = mocked_client(SimulationTransport::Contract);
        mock.push_response(MockResponse::Error(JsonRpcError {
            code: 3,
            message: "execution reverted".to_string(),
            data: Some(json!("0x220266b6")),
        }));

        let outcome = client
            .simulate_validation(Address::zero(), UserOperation::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SimulationOutcome::Reverted(Bytes::from(vec![0x22, 0x02, 0x66, 0xb6]))
        );
    }

    #[tokio::test]
    async fn oversized_chain_id_is_malformed() {
        let (client, mock) = mocked_client(SimulationTransport::Contract);
        mock.push::<U256, _>(U256::MAX).unwrap();

        let err = client.chain_id().await.unwrap_err();
        assert!(matches!(err, SwapRequestError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn chain_id_is_read_from_node() {
        let (client, mock) = mocked_client(SimulationTransport::Contract);
        mock.push::<U256, _>(U256::from(11155111u64)).unwrap();

        assert_eq!(client.chain_id().await.unwrap(), 11155111);
    }

    #[test]
    fn result_envelope_is_a_return() {
        let outcome = parse_call_envelope(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": "0x0102"
        }))
        .unwrap();
        assert_eq!(outcome, SimulationOutcome::Returned(Bytes::from(vec![1, 2])));
    }

    #[test]
    fn error_data_is_a_revert() {
        let outcome = parse_call_envelope(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted", "data": "0xe0cff05f" }
        }))
        .unwrap();
        assert_eq!(
            outcome,
            SimulationOutcome::Reverted(Bytes::from(vec![0xe0, 0xcf, 0xf0, 0x5f]))
        );
    }

    #[test]
    fn nested_error_data_is_a_revert() {
        let outcome = parse_call_envelope(&json!({
            "error": { "code": -32000, "message": "reverted", "data": { "data": "0xff" } }
        }))
        .unwrap();
        assert_eq!(outcome, SimulationOutcome::Reverted(Bytes::from(vec![0xff])));
    }

    #[test]
    fn error_without_data_surfaces_node_message() {
        let err = parse_call_envelope(&json!({
            "error": { "code": -32000, "message": "header not found" }
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Ethereum provider error: header not found");
    }

    #[test]
    fn unrecognized_envelope_is_malformed() {
        let err = parse_call_envelope(&json!({ "jsonrpc": "2.0", "id": 1 })).unwrap_err();
        assert!(matches!(err, SwapRequestError::MalformedResponse(_)));

        let err = parse_call_envelope(&json!({ "result": 42 })).unwrap_err();
        assert!(err.to_string().contains("42"));
    }
}
