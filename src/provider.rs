// src/provider.rs
use std::sync::Arc;

use ethers::types::transaction::eip712::{EIP712Domain, TypedData};
use ethers::types::{Address, Bytes, U256};
use tracing::{debug, info};

use crate::addresses::{DexConfig, SessionAuthority};
use crate::calldata;
use crate::client::ChainClient;
use crate::config::{ProviderConfig, ResolvedConfig};
use crate::error::{Result, SwapRequestError};
use crate::gas;
use crate::nonce;
use crate::session::{self, SessionIntent};
use crate::types::{
    CreateSessionKeyRequestOutput, CreateSwapRequestInput, CreateSwapRequestOutput,
    UserOperation,
};

// Placeholder fee rates until fees follow the chain's fee market
pub const DEFAULT_MAX_FEE_PER_GAS: u64 = 30_000_000_000;
pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS: u64 = 2_000_000_000;

pub struct SmartAccountV1Provider<C> {
    client: Arc<C>,
    config: ResolvedConfig,
}

impl<C: ChainClient> SmartAccountV1Provider<C> {
    pub async fn new(client: Arc<C>, config: ProviderConfig) -> Result<Self> {
        let chain_id = client.chain_id().await?;
        let config = ResolvedConfig::resolve(chain_id, config);

        info!(
            "Initialized smart account provider for chain {} with entry point {:?}",
            chain_id,
            config.entry_point()
        );

        Ok(Self::from_resolved(client, config))
    }

    pub fn from_resolved(client: Arc<C>, config: ResolvedConfig) -> Self {
        Self { client, config }
    }

    pub fn with_dex(mut self, dex: DexConfig) -> Self {
        self.config.set_dex(dex);
        self
    }

    pub fn with_factory(mut self, factory: Address) -> Self {
        self.config.set_factory(factory);
        self
    }

    pub fn with_session_authority(mut self, authority: SessionAuthority) -> Self {
        self.config.set_session_authority(authority);
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub async fn get_smart_account_address(&self, owner: Address, salt: U256) -> Result<Address> {
        let factory = self.config.factory()?;
        self.client.get_account_address(factory, owner, salt).await
    }

    pub async fn create_swap_request(
        &self,
        input: CreateSwapRequestInput,
    ) -> Result<CreateSwapRequestOutput> {
        let swap = &input.swap_input;

        // 1. Check configuration and preconditions before touching the chain
        if input.smart_account.is_none() && input.init_smart_account_input.is_none() {
            return Err(SwapRequestError::MissingSender);
        }
        let dex_config = self.config.dex()?;
        let dex = dex_config
            .get(input.dex)
            .ok_or(SwapRequestError::UnsupportedDex(input.dex))?;
        if swap.token_in == swap.token_out {
            return Err(SwapRequestError::SameToken);
        }
        nonce::check_sequence_id(input.order_id)?;
        if let Some(limit) = swap.sqrt_price_limit_x96 {
            // Encoded as uint160
            if limit.bits() > 160 {
                return Err(SwapRequestError::InvalidParameters(format!(
                    "sqrtPriceLimitX96 {} does not fit in uint160",
                    limit
                )));
            }
        }
        let init = match input.init_smart_account_input {
            Some(init) => Some((init, self.config.factory()?)),
            None => None,
        };

        // 2. Resolve the sender, deploying it with this operation if asked to
        let (smart_account, init_code) = match init {
            Some((init, factory)) => {
                let derived = self
                    .client
                    .get_account_address(factory, init.owner, init.salt)
                    .await?;
                if let Some(given) = input.smart_account {
                    if given != derived {
                        return Err(SwapRequestError::SenderMismatch { given, derived });
                    }
                }

                let code = self.client.get_code(derived).await?;
                if !code.is_empty() {
                    return Err(SwapRequestError::SmartAccountExists(derived));
                }

                debug!("Smart account {:?} will be deployed by {:?}", derived, factory);
                (derived, calldata::init_code(factory, init.owner, init.salt))
            }
            None => (
                input.smart_account.ok_or(SwapRequestError::MissingSender)?,
                Bytes::new(),
            ),
        };

        // 3. Router calldata and the account's executeBatch legs
        let router_calldata = calldata::swap_router_calldata(swap, dex_config.weth, smart_account);
        let batch = calldata::swap_batch(swap, dex_config.weth, dex.swap_router, router_calldata);
        let call_data = calldata::execute_batch_calldata(batch.clone());

        // 4. Nonce from the (pool, direction, order id) partition
        let nonce = nonce::derive_nonce(
            self.client.as_ref(),
            self.config.entry_point(),
            smart_account,
            dex.factory,
            swap.token_in,
            swap.token_out,
            swap.fee,
            input.order_id,
        )
        .await?;

        let mut user_op = UserOperation {
            sender: smart_account,
            nonce,
            init_code,
            call_data,
            ..Default::default()
        };

        // 5. Gas limits. Bundler compensation stays zero
        user_op.call_gas_limit = gas::estimate_call_gas(
            self.client.as_ref(),
            self.config.entry_point(),
            smart_account,
            batch,
        )
        .await;
        user_op.verification_gas_limit = gas::estimate_verification_gas(
            self.client.as_ref(),
            self.config.entry_point(),
            &user_op,
            self.config.signature_layout().mock_signature(),
        )
        .await?;
        debug!(
            "Gas for {:?}: call {}, verification {}",
            smart_account, user_op.call_gas_limit, user_op.verification_gas_limit
        );

        // 6. Fees, unless a sponsor pays out of band
        if !input.gasless {
            user_op.max_fee_per_gas = U256::from(DEFAULT_MAX_FEE_PER_GAS);
            user_op.max_priority_fee_per_gas = U256::from(DEFAULT_MAX_PRIORITY_FEE_PER_GAS);
        }

        // 7. Hash to be signed, independent of the signature field
        let user_op_hash = self
            .client
            .get_user_op_hash(self.config.entry_point(), user_op.clone())
            .await?;

        info!(
            "Created swap request {:?} for {:?} with nonce {:#x}",
            user_op_hash, smart_account, user_op.nonce
        );

        Ok(CreateSwapRequestOutput {
            smart_account,
            user_op_hash,
            request: user_op,
        })
    }

    // The authorization check is advisory, a permit can land before the owner signs
    pub async fn create_session_key_request(
        &self,
        owner: Address,
        salt: U256,
    ) -> Result<CreateSessionKeyRequestOutput> {
        let authority = self.config.session_authority()?;
        let session_key = session::generate_session_key();

        if self
            .client
            .is_session_authorized(authority.address(), owner, session_key.address)
            .await?
        {
            return Err(SwapRequestError::SessionKeyAuthorized(session_key.address));
        }

        let request = self
            .session_request(SessionIntent::Permit, authority, owner, salt, session_key.address)
            .await?;

        info!(
            "Created session key {:?} request for owner {:?}",
            session_key.address, owner
        );

        Ok(CreateSessionKeyRequestOutput {
            session_key,
            request,
        })
    }

    pub async fn revoke_session_key_request(
        &self,
        owner: Address,
        salt: U256,
        public_key: &[u8],
    ) -> Result<TypedData> {
        let authority = self.config.session_authority()?;
        let session_key = session::session_key_address(public_key)?;

        if !self
            .client
            .is_session_authorized(authority.address(), owner, session_key)
            .await?
        {
            return Err(SwapRequestError::SessionKeyNotAuthorized(session_key));
        }

        self.session_request(SessionIntent::Revoke, authority, owner, salt, session_key)
            .await
    }

    async fn session_request(
        &self,
        intent: SessionIntent,
        authority: SessionAuthority,
        owner: Address,
        salt: U256,
        session_key: Address,
    ) -> Result<TypedData> {
        let nonce = self
            .client
            .session_nonce(authority.address(), owner)
            .await?;
        let domain = self.session_domain(authority).await?;
        debug!(
            "{} domain {:?} at nonce {}",
            intent.primary_type(),
            domain.name,
            nonce
        );

        Ok(session::session_typed_data(
            intent,
            domain,
            owner,
            salt,
            session_key,
            nonce,
        ))
    }

    async fn session_domain(&self, authority: SessionAuthority) -> Result<EIP712Domain> {
        match authority {
            SessionAuthority::SessionKeyManager(manager) => Ok(session::session_manager_domain(
                self.config.chain_id(),
                manager,
            )),
            SessionAuthority::Authorizer(authorizer) => {
                let fields = self.client.eip712_domain(authorizer).await?;
                Ok(session::contract_domain(
                    self.config.chain_id(),
                    authorizer,
                    fields,
                ))
            }
        }
    }
}
