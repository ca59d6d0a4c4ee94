pub mod address;
pub mod bank;
pub mod codec;
pub mod contract;
mod error;
pub mod ibc;
pub mod keeper;
pub mod msg;
pub mod proof;
pub mod state;

#[cfg(not(target_arch = "wasm32"))]
pub mod testing;

pub use crate::error::ContractError;
