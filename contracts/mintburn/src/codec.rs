//! Canonical binary form of an [`Escrow`].
//!
//! The bytes written under the primary escrow key are exactly what a
//! consumer chain verifies against the provider's app hash, so encoding must
//! be deterministic: protobuf wire format, fields in tag order, defaults
//! omitted.

use std::str::FromStr;

use cosmwasm_std::{Coin, StdError, StdResult, Uint128};
use prost::Message;

use crate::state::{Escrow, EscrowStatus};

/// `maany.mintburn.v1.Escrow`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EscrowRecord {
    #[prost(string, tag = "1")]
    pub escrow_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub consumer_chain_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub amount: ::core::option::Option<CoinRecord>,
    #[prost(string, tag = "4")]
    pub recipient: ::prost::alloc::string::String,
    #[prost(uint64, tag = "5")]
    pub expiry_height: u64,
    #[prost(uint64, tag = "6")]
    pub expiry_time_unix: u64,
    #[prost(enumeration = "EscrowStatusRecord", tag = "7")]
    pub status: i32,
}

/// `cosmos.base.v1beta1.Coin`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoinRecord {
    #[prost(string, tag = "1")]
    pub denom: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub amount: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EscrowStatusRecord {
    Unspecified = 0,
    Pending = 1,
    Claimed = 2,
    Canceled = 3,
}

impl From<EscrowStatus> for EscrowStatusRecord {
    fn from(status: EscrowStatus) -> Self {
        match status {
            EscrowStatus::Pending => EscrowStatusRecord::Pending,
            EscrowStatus::Claimed => EscrowStatusRecord::Claimed,
            EscrowStatus::Canceled => EscrowStatusRecord::Canceled,
        }
    }
}

impl From<&Escrow> for EscrowRecord {
    fn from(escrow: &Escrow) -> Self {
        EscrowRecord {
            escrow_id: escrow.escrow_id.clone(),
            consumer_chain_id: escrow.consumer_chain_id.clone(),
            amount: Some(CoinRecord {
                denom: escrow.amount.denom.clone(),
                amount: escrow.amount.amount.to_string(),
            }),
            recipient: escrow.recipient.clone(),
            expiry_height: escrow.expiry_height,
            expiry_time_unix: escrow.expiry_time_unix,
            status: EscrowStatusRecord::from(escrow.status.clone()) as i32,
        }
    }
}

impl TryFrom<EscrowRecord> for Escrow {
    type Error = StdError;

    fn try_from(record: EscrowRecord) -> StdResult<Self> {
        let status = match EscrowStatusRecord::try_from(record.status) {
            Ok(EscrowStatusRecord::Pending) => EscrowStatus::Pending,
            Ok(EscrowStatusRecord::Claimed) => EscrowStatus::Claimed,
            Ok(EscrowStatusRecord::Canceled) => EscrowStatus::Canceled,
            _ => {
                return Err(StdError::parse_err(
                    "Escrow",
                    format!("unknown escrow status {}", record.status),
                ))
            }
        };
        let coin = record.amount.unwrap_or_default();
        let amount = if coin.amount.is_empty() {
            Uint128::zero()
        } else {
            Uint128::from_str(&coin.amount)?
        };
        Ok(Escrow {
            escrow_id: record.escrow_id,
            consumer_chain_id: record.consumer_chain_id,
            amount: Coin {
                denom: coin.denom,
                amount,
            },
            recipient: record.recipient,
            expiry_height: record.expiry_height,
            expiry_time_unix: record.expiry_time_unix,
            status,
        })
    }
}

/// Encodes an escrow into its committed byte form.
pub fn encode_escrow(escrow: &Escrow) -> Vec<u8> {
    EscrowRecord::from(escrow).encode_to_vec()
}

/// Decodes bytes previously produced by [`encode_escrow`].
pub fn decode_escrow(bytes: &[u8]) -> StdResult<Escrow> {
    let record = EscrowRecord::decode(bytes).map_err(|e| StdError::parse_err("Escrow", e))?;
    Escrow::try_from(record)
}
