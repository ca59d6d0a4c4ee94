use cosmwasm_std::StdError;
use cw_utils::PaymentError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("invalid coins: {reason}")]
    InvalidCoins { reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("internal error: {reason}")]
    Internal { reason: String },

    #[error("unimplemented: {what}")]
    Unimplemented { what: String },

    #[error("packet rejected: {reason}")]
    PacketRejected { reason: String },
}

impl ContractError {
    pub fn invalid_address(reason: impl ToString) -> Self {
        ContractError::InvalidAddress {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_coins(reason: impl ToString) -> Self {
        ContractError::InvalidCoins {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_request(reason: impl ToString) -> Self {
        ContractError::InvalidRequest {
            reason: reason.to_string(),
        }
    }

    pub fn not_found(what: impl ToString) -> Self {
        ContractError::NotFound {
            what: what.to_string(),
        }
    }

    pub fn internal(reason: impl ToString) -> Self {
        ContractError::Internal {
            reason: reason.to_string(),
        }
    }

    pub fn packet_rejected(reason: impl ToString) -> Self {
        ContractError::PacketRejected {
            reason: reason.to_string(),
        }
    }
}
