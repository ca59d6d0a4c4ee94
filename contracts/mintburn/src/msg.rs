use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Coin};

use crate::address;
use crate::error::ContractError;
use crate::state::{Escrow, ModuleConfig};

#[cw_serde]
#[derive(Default)]
pub struct InstantiateMsg {
    pub store_key: Option<String>,
    pub bech32_prefix: Option<String>,
    pub base_denom: Option<String>,
    pub trusted_consumer_chain_id: Option<String>,
}

impl InstantiateMsg {
    pub fn into_config(self) -> ModuleConfig {
        let defaults = ModuleConfig::default();
        ModuleConfig {
            store_key: self.store_key.unwrap_or(defaults.store_key),
            bech32_prefix: self.bech32_prefix.unwrap_or(defaults.bech32_prefix),
            base_denom: self.base_denom.unwrap_or(defaults.base_denom),
            trusted_consumer_chain_id: self
                .trusted_consumer_chain_id
                .unwrap_or(defaults.trusted_consumer_chain_id),
            ..defaults
        }
    }
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Lock the attached funds in escrow for a consumer chain
    EscrowInitial {
        consumer_chain_id: String,
        amount: Coin,
        recipient: Option<String>,
        expiry_height: Option<u64>,
        expiry_time_unix: Option<u64>,
    },
    /// Refund the pending escrow on a route to the caller
    CancelEscrow {
        consumer_chain_id: String,
        denom: String,
    },
    /// Mark a pending escrow as claimed on the consumer chain
    MarkEscrowClaimed {
        escrow_id: String,
        consumer_chain_id: String,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Escrow currently indexed for a route
    #[returns(EscrowResponse)]
    Escrow {
        consumer_chain_id: String,
        denom: String,
    },
    #[returns(EscrowResponse)]
    EscrowById { escrow_id: String },
    /// List escrows in escrow id byte order
    #[returns(EscrowsResponse)]
    Escrows {
        status_filter: Option<String>,
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Committed key and value of an escrow, for off-chain proof assembly
    #[returns(EscrowProofResponse)]
    EscrowProof {
        consumer_chain_id: String,
        denom: String,
        height: Option<u64>,
        prove: Option<bool>,
    },
    #[returns(AuthorizedIcaResponse)]
    AuthorizedIca { consumer_chain_id: String },
    #[returns(AllowedChannelsResponse)]
    AllowedChannels {},
    #[returns(ModuleConfig)]
    Config {},
}

#[cw_serde]
pub struct EscrowResponse {
    pub escrow: Option<Escrow>,
}

#[cw_serde]
pub struct EscrowsResponse {
    pub escrows: Vec<Escrow>,
}

#[cw_serde]
pub struct EscrowProofResponse {
    pub height: u64,
    /// Exact bytes committed under the escrow's primary key
    pub value: Binary,
    /// `[store_key, hex(primary_key)]`
    pub key_path: Vec<String>,
    pub escrow_id: String,
    pub amount_denom: String,
    pub amount_value: String,
}

#[cw_serde]
pub struct AuthorizedIcaResponse {
    pub ica_address: Option<String>,
}

#[cw_serde]
pub struct AllowedChannelsResponse {
    pub channels: Vec<String>,
}

#[cw_serde]
pub struct MsgEscrowInitial {
    pub sender: String,
    pub consumer_chain_id: String,
    pub amount: Coin,
    pub recipient: String,
    pub expiry_height: u64,
    pub expiry_time_unix: u64,
}

#[cw_serde]
pub struct MsgEscrowInitialResponse {
    pub escrow_id: String,
}

#[cw_serde]
pub struct MsgCancelEscrow {
    pub sender: String,
    pub consumer_chain_id: String,
    pub denom: String,
}

#[cw_serde]
pub struct MsgMarkEscrowClaimed {
    pub sender: String,
    pub escrow_id: String,
    pub consumer_chain_id: String,
}

impl MsgEscrowInitial {
    pub fn validate_basic(&self, bech32_prefix: &str) -> Result<(), ContractError> {
        validate_field_address(bech32_prefix, &self.sender, "sender")?;
        require_non_blank(&self.consumer_chain_id, "consumer_chain_id")?;
        validate_amount(&self.amount)?;
        if !self.recipient.is_empty() {
            validate_field_address(bech32_prefix, &self.recipient, "recipient")?;
        }
        Ok(())
    }
}

impl MsgCancelEscrow {
    pub fn validate_basic(&self, bech32_prefix: &str) -> Result<(), ContractError> {
        validate_field_address(bech32_prefix, &self.sender, "sender")?;
        require_non_blank(&self.consumer_chain_id, "consumer_chain_id")?;
        validate_denom(&self.denom)
    }
}

impl MsgMarkEscrowClaimed {
    pub fn validate_basic(&self, bech32_prefix: &str) -> Result<(), ContractError> {
        validate_field_address(bech32_prefix, &self.sender, "sender")?;
        require_non_blank(&self.escrow_id, "escrow_id")?;
        require_non_blank(&self.consumer_chain_id, "consumer_chain_id")
    }
}

fn validate_field_address(prefix: &str, value: &str, field: &str) -> Result<(), ContractError> {
    match address::validate(prefix, value) {
        Ok(_) => Ok(()),
        Err(ContractError::InvalidAddress { reason }) => {
            Err(ContractError::invalid_address(format!("{field}: {reason}")))
        }
        Err(e) => Err(e),
    }
}

pub fn require_non_blank(value: &str, field: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::invalid_request(format!("{field} is required")));
    }
    Ok(())
}

/// A single positive coin with a well-formed denom.
pub fn validate_amount(amount: &Coin) -> Result<(), ContractError> {
    validate_denom(&amount.denom)?;
    if amount.amount.is_zero() {
        return Err(ContractError::invalid_coins("amount must be > 0"));
    }
    Ok(())
}

/// Cosmos SDK denom rule: `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
pub fn validate_denom(denom: &str) -> Result<(), ContractError> {
    let invalid = || ContractError::invalid_coins(format!("invalid denom: {denom}"));
    let mut chars = denom.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(invalid()),
    }
    if !(3..=128).contains(&denom.len()) {
        return Err(invalid());
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-')) {
        return Err(invalid());
    }
    Ok(())
}
