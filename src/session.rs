// src/session.rs
use std::collections::BTreeMap;

use ethers::core::k256::ecdsa::{SigningKey, VerifyingKey};
use ethers::core::rand::thread_rng;
use ethers::types::transaction::eip712::{EIP712Domain, Eip712DomainType, TypedData};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::{public_key_to_address, secret_key_to_address};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contracts::Eip712DomainFields;
use crate::error::{Result, SwapRequestError};
use crate::types::SessionKey;

pub const SESSION_MANAGER_DOMAIN_NAME: &str = "LongDefi Session Key Manager";
pub const SESSION_MANAGER_DOMAIN_VERSION: &str = "1";

pub const ECDSA_SIGNATURE_LENGTH: usize = 65;

// r || s || v shaped, recovers to no key
pub const MOCK_ECDSA_SIGNATURE: [u8; ECDSA_SIGNATURE_LENGTH] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xf0,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x7a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0x1c,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignatureLayout {
    #[default]
    OwnerOnly,
    // owner ++ session ++ nonce32
    OwnerSession,
    // server ++ owner ++ session ++ nonce32
    ServerOwnerSession,
}

impl SignatureLayout {
    pub fn ecdsa_parts(&self) -> usize {
        match self {
            Self::OwnerOnly => 1,
            Self::OwnerSession => 2,
            Self::ServerOwnerSession => 3,
        }
    }

    pub fn has_session_nonce(&self) -> bool {
        !matches!(self, Self::OwnerOnly)
    }

    pub fn signature_length(&self) -> usize {
        let nonce = if self.has_session_nonce() { 32 } else { 0 };
        self.ecdsa_parts() * ECDSA_SIGNATURE_LENGTH + nonce
    }

    pub fn mock_signature(&self) -> Bytes {
        let mut signature = Vec::with_capacity(self.signature_length());
        for _ in 0..self.ecdsa_parts() {
            signature.extend_from_slice(&MOCK_ECDSA_SIGNATURE);
        }
        if self.has_session_nonce() {
            signature.extend_from_slice(&[0u8; 32]);
        }
        signature.into()
    }
}

pub fn aggregate_client_signatures(
    owner_signature: &[u8],
    session_signature: &[u8],
    session_nonce: U256,
) -> Bytes {
    let mut nonce = [0u8; 32];
    session_nonce.to_big_endian(&mut nonce);

    let mut signature =
        Vec::with_capacity(owner_signature.len() + session_signature.len() + nonce.len());
    signature.extend_from_slice(owner_signature);
    signature.extend_from_slice(session_signature);
    signature.extend_from_slice(&nonce);
    signature.into()
}

pub fn with_server_signature(server_signature: &[u8], client_signatures: &[u8]) -> Bytes {
    [server_signature, client_signatures].concat().into()
}

pub fn generate_session_key() -> SessionKey {
    let signing_key = SigningKey::random(&mut thread_rng());
    SessionKey {
        private_key: hex::encode(signing_key.to_bytes()),
        address: secret_key_to_address(&signing_key),
    }
}

// Accepts compressed or uncompressed SEC1
pub fn session_key_address(public_key: &[u8]) -> Result<Address> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| SwapRequestError::InvalidPublicKey(e.to_string()))?;
    Ok(public_key_to_address(&verifying_key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIntent {
    Permit,
    Revoke,
}

impl SessionIntent {
    pub fn primary_type(&self) -> &'static str {
        match self {
            Self::Permit => "Permit",
            Self::Revoke => "Revoke",
        }
    }
}

pub fn session_manager_domain(chain_id: u64, manager: Address) -> EIP712Domain {
    EIP712Domain {
        name: Some(SESSION_MANAGER_DOMAIN_NAME.to_string()),
        version: Some(SESSION_MANAGER_DOMAIN_VERSION.to_string()),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(manager),
        salt: None,
    }
}

// Chain id and verifying contract never come from the contract's report
pub fn contract_domain(chain_id: u64, contract: Address, fields: Eip712DomainFields) -> EIP712Domain {
    EIP712Domain {
        name: Some(fields.name),
        version: Some(fields.version),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(contract),
        salt: None,
    }
}

pub fn session_typed_data(
    intent: SessionIntent,
    domain: EIP712Domain,
    owner: Address,
    salt: U256,
    session_key: Address,
    nonce: U256,
) -> TypedData {
    let mut types = BTreeMap::new();
    types.insert(
        "EIP712Domain".to_string(),
        vec![
            field("name", "string"),
            field("version", "string"),
            field("chainId", "uint256"),
            field("verifyingContract", "address"),
        ],
    );
    types.insert(
        intent.primary_type().to_string(),
        vec![
            field("owner", "address"),
            field("salt", "uint256"),
            field("sessionKey", "address"),
            field("nonce", "uint256"),
        ],
    );

    let mut message = BTreeMap::new();
    message.insert("owner".to_string(), Value::String(format!("{:?}", owner)));
    message.insert("salt".to_string(), Value::String(salt.to_string()));
    message.insert(
        "sessionKey".to_string(),
        Value::String(format!("{:?}", session_key)),
    );
    message.insert("nonce".to_string(), Value::String(nonce.to_string()));

    TypedData {
        domain,
        types,
        primary_type: intent.primary_type().to_string(),
        message,
    }
}

fn field(name: &str, r#type: &str) -> Eip712DomainType {
    Eip712DomainType {
        name: name.to_string(),
        r#type: r#type.to_string(),
    }
}
