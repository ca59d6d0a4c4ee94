pub mod denom;
pub mod ica;
pub mod keepers;
pub mod querier;
pub mod resolver;
pub mod transfer;
pub mod types;

pub use ica::IcaHostMiddleware;
pub use querier::StargateIbcQuerier;
pub use resolver::{ChannelIdentityResolver, CounterpartyIdentity, ResolveError};
pub use transfer::TransferMiddleware;
