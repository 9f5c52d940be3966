// src/config.rs
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::addresses::{self, DexConfig, SessionAuthority};
use crate::error::{Result, SwapRequestError};
use crate::session::SignatureLayout;

// Overrides. `None` falls back to the chain tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub entry_point: Option<Address>,
    pub factory: Option<Address>,
    pub session_authority: Option<SessionAuthority>,
    pub dex: Option<DexConfig>,
    #[serde(default)]
    pub signature_layout: SignatureLayout,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    chain_id: u64,
    entry_point: Address,
    factory: Option<Address>,
    session_authority: Option<SessionAuthority>,
    dex: Option<DexConfig>,
    signature_layout: SignatureLayout,
}

impl ResolvedConfig {
    pub fn resolve(chain_id: u64, config: ProviderConfig) -> Self {
        let smart_account = addresses::smart_account_addresses(chain_id);

        Self {
            chain_id,
            entry_point: config
                .entry_point
                .or(smart_account.map(|a| a.entry_point))
                .unwrap_or_else(addresses::entry_point),
            factory: config.factory.or(smart_account.map(|a| a.factory)),
            session_authority: config
                .session_authority
                .or(smart_account.map(|a| a.session_authority)),
            dex: config.dex.or_else(|| addresses::dex_config(chain_id)),
            signature_layout: config.signature_layout,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn signature_layout(&self) -> SignatureLayout {
        self.signature_layout
    }

    pub fn factory(&self) -> Result<Address> {
        self.factory.ok_or_else(|| self.missing("factory"))
    }

    pub fn session_authority(&self) -> Result<SessionAuthority> {
        self.session_authority
            .ok_or_else(|| self.missing("session key manager"))
    }

    pub fn dex(&self) -> Result<&DexConfig> {
        self.dex.as_ref().ok_or_else(|| self.missing("dex"))
    }

    pub(crate) fn set_factory(&mut self, factory: Address) {
        self.factory = Some(factory);
    }

    pub(crate) fn set_session_authority(&mut self, authority: SessionAuthority) {
        self.session_authority = Some(authority);
    }

    pub(crate) fn set_dex(&mut self, dex: DexConfig) {
        self.dex = Some(dex);
    }

    fn missing(&self, key: &'static str) -> SwapRequestError {
        SwapRequestError::MissingConfig {
            key,
            chain_id: self.chain_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::addresses::DexName;

    #[test]
    fn chain_table_fills_missing_fields() {
        let resolved = ResolvedConfig::resolve(11155111, ProviderConfig::default());
        assert_eq!(resolved.entry_point(), addresses::entry_point());
        assert!(resolved.factory().is_ok());
        assert!(matches!(
            resolved.session_authority().unwrap(),
            SessionAuthority::Authorizer(_)
        ));
        assert!(resolved.dex().unwrap().get(DexName::UniswapV3).is_some());
    }

    #[test]
    fn explicit_override_wins() {
        let factory = Address::repeat_byte(0x11);
        let manager = Address::repeat_byte(0x22);
        let dex = DexConfig {
            weth: Address::repeat_byte(0x33),
            dexes: HashMap::new(),
        };
        let resolved = ResolvedConfig::resolve(
            11155111,
            ProviderConfig {
                factory: Some(factory),
                session_authority: Some(SessionAuthority::SessionKeyManager(manager)),
                dex: Some(dex.clone()),
                ..Default::default()
            },
        );
        assert_eq!(resolved.factory().unwrap(), factory);
        assert_eq!(
            resolved.session_authority().unwrap(),
            SessionAuthority::SessionKeyManager(manager)
        );
        assert_eq!(resolved.dex().unwrap(), &dex);
    }

    #[test]
    fn absent_values_fail_on_use_only() {
        // Mainnet has a dex table but no smart account deployment
        let resolved = ResolvedConfig::resolve(1, ProviderConfig::default());
        assert!(resolved.dex().is_ok());
        let err = resolved.factory().unwrap_err();
        assert_eq!(err.to_string(), "factory not configured for chain 1");
        assert!(resolved.session_authority().is_err());
    }
}
