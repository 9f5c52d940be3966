// src/addresses.rs
use std::collections::HashMap;
use std::fmt;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

// EntryPoint v0.6, same address on every supported chain
pub const ENTRYPOINT_ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";

const UNISWAP_V3_ETH_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";
const UNISWAP_V3_ETH_SWAP_ROUTER: &str = "0xE592427A0AEce92De3Edee1F18E0157C05861564";
const UNISWAP_V3_ETH_POSITION_MANAGER: &str = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88";
const UNISWAP_V3_ETH_QUOTER_V2: &str = "0x61fFE014bA17989E743c5F6cB21bF9697530B21e";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DexName {
    UniswapV3,
    PancakeSwapV3,
}

impl fmt::Display for DexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DexName::UniswapV3 => write!(f, "uniswapV3"),
            DexName::PancakeSwapV3 => write!(f, "pancakeSwapV3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexAddressesV3 {
    pub swap_router: Address,
    pub factory: Address,
    pub nonfungible_position_manager: Address,
    pub quoter_v2: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexConfig {
    pub weth: Address,
    #[serde(default)]
    pub dexes: HashMap<DexName, DexAddressesV3>,
}

impl DexConfig {
    pub fn get(&self, name: DexName) -> Option<&DexAddressesV3> {
        self.dexes.get(&name)
    }
}

// Contract that authorizes session keys for an owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionAuthority {
    SessionKeyManager(Address),
    Authorizer(Address),
}

impl SessionAuthority {
    pub fn address(&self) -> Address {
        match self {
            SessionAuthority::SessionKeyManager(address) | SessionAuthority::Authorizer(address) => {
                *address
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAccountAddresses {
    pub entry_point: Address,
    pub factory: Address,
    pub session_authority: SessionAuthority,
}

pub fn entry_point() -> Address {
    address(ENTRYPOINT_ADDRESS)
}

pub fn smart_account_addresses(chain_id: u64) -> Option<SmartAccountAddresses> {
    match chain_id {
        11155111 => Some(SmartAccountAddresses {
            entry_point: entry_point(),
            factory: address("0x2a7554024fe1F77C4cf62ae176E24C63bF5a14d5"),
            session_authority: SessionAuthority::Authorizer(address(
                "0xfD1de5cab889487f7E4773dD77c1f218071CD145",
            )),
        }),
        _ => None,
    }
}

pub fn dex_config(chain_id: u64) -> Option<DexConfig> {
    let (uniswap_v3, weth) = match chain_id {
        1 => (
            uniswap_v3_eth(),
            "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
        ),
        11155111 => (
            DexAddressesV3 {
                factory: address("0x0227628f3F023bb0B980b67D528571c95c6DaC1c"),
                swap_router: address("0xc671db9c8c2e650FB5C9B9F119522700e5b7A958"),
                nonfungible_position_manager: address(
                    "0x1238536071E1c677A632429e3655c799b22cDA52",
                ),
                quoter_v2: address("0xAb32382C0FE4F7FDC63E3A5d87e9545D64aa4c3e"),
            },
            "0xfFf9976782d46CC05630D1f6eBAb18b2324d6B14",
        ),
        137 => (
            uniswap_v3_eth(),
            "0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270",
        ),
        80001 => (
            uniswap_v3_eth(),
            "0x9c3C9283D3e44854697Cd22D3Faa240Cfb032889",
        ),
        _ => return None,
    };

    Some(DexConfig {
        weth: address(weth),
        dexes: HashMap::from([(DexName::UniswapV3, uniswap_v3)]),
    })
}

fn uniswap_v3_eth() -> DexAddressesV3 {
    DexAddressesV3 {
        factory: address(UNISWAP_V3_ETH_FACTORY),
        swap_router: address(UNISWAP_V3_ETH_SWAP_ROUTER),
        nonfungible_position_manager: address(UNISWAP_V3_ETH_POSITION_MANAGER),
        quoter_v2: address(UNISWAP_V3_ETH_QUOTER_V2),
    }
}

fn address(literal: &str) -> Address {
    literal
        .parse()
        .expect("address table literals should parse")
}
