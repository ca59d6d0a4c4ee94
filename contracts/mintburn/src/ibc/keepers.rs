//! Collaborators the middlewares consume. Channel, connection and client
//! reads are served by [`crate::ibc::querier::StargateIbcQuerier`]. The
//! interchain-account host lookup, the port router driving [`IbcModule`]
//! and a bank with authority over ICS-20 escrow accounts come from the
//! host. [`crate::testing`] has in-memory versions of all of them.

use cosmwasm_std::{Addr, Binary, DepsMut, Env, IbcPacket, StdResult};

use crate::ibc::types::{
    Acknowledgement, ChanClose, ChanOpenAck, ChanOpenConfirm, ChanOpenInit, ChanOpenTry,
    ChannelEnd, ClientState, ConnectionEnd,
};

pub trait ChannelReader {
    fn channel(&self, port_id: &str, channel_id: &str) -> Option<ChannelEnd>;
}

pub trait ConnectionReader {
    fn connection(&self, connection_id: &str) -> Option<ConnectionEnd>;
}

pub trait ClientReader {
    fn client_state(&self, client_id: &str) -> Option<ClientState>;
}

pub trait IcaHostReader {
    /// Interchain account registered on this host for a controller port
    /// reached over `connection_id`.
    fn interchain_account_address(&self, connection_id: &str, port_id: &str) -> Option<String>;
}

/// An IBC application (or middleware) as seen by the port router.
pub trait IbcModule {
    fn on_chan_open_init(&mut self, deps: DepsMut, env: &Env, msg: &ChanOpenInit)
        -> StdResult<String>;

    fn on_chan_open_try(&mut self, deps: DepsMut, env: &Env, msg: &ChanOpenTry) -> StdResult<String>;

    fn on_chan_open_ack(&mut self, deps: DepsMut, env: &Env, msg: &ChanOpenAck) -> StdResult<()>;

    fn on_chan_open_confirm(
        &mut self,
        deps: DepsMut,
        env: &Env,
        msg: &ChanOpenConfirm,
    ) -> StdResult<()>;

    fn on_chan_close_init(&mut self, deps: DepsMut, env: &Env, msg: &ChanClose) -> StdResult<()>;

    fn on_chan_close_confirm(&mut self, deps: DepsMut, env: &Env, msg: &ChanClose)
        -> StdResult<()>;

    fn on_recv_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        relayer: &Addr,
    ) -> Acknowledgement;

    fn on_acknowledgement_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        acknowledgement: &Binary,
        relayer: &Addr,
    ) -> StdResult<()>;

    fn on_timeout_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        relayer: &Addr,
    ) -> StdResult<()>;
}
