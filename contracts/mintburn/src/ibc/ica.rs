//! Interchain-account host middleware. When an ICA channel finishes
//! opening, the account registered for it becomes the escrow-mint
//! authority recorded for the counterparty chain.

use cosmwasm_std::{Addr, Binary, DepsMut, Env, IbcPacket, StdResult, Storage};

use crate::ibc::keepers::{IbcModule, IcaHostReader};
use crate::ibc::resolver::ChannelIdentityResolver;
use crate::ibc::types::{
    Acknowledgement, ChanClose, ChanOpenAck, ChanOpenConfirm, ChanOpenInit, ChanOpenTry,
};
use crate::state::{ModuleConfig, AUTHORIZED_ICAS};

pub struct IcaHostMiddleware<'a, A> {
    app: A,
    config: ModuleConfig,
    resolver: ChannelIdentityResolver<'a>,
    ica_host: Box<dyn IcaHostReader + 'a>,
}

impl<'a, A: IbcModule> IcaHostMiddleware<'a, A> {
    pub fn new(
        app: A,
        config: ModuleConfig,
        resolver: ChannelIdentityResolver<'a>,
        ica_host: Box<dyn IcaHostReader + 'a>,
    ) -> Self {
        IcaHostMiddleware {
            app,
            config,
            resolver,
            ica_host,
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    fn register(&self, storage: &mut dyn Storage, port_id: &str, channel_id: &str) {
        if port_id != self.config.ica_host_port {
            return;
        }
        let identity = match self.resolver.resolve(port_id, channel_id) {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(channel_id, error = %err, "cannot resolve ICA counterparty");
                return;
            }
        };
        match self
            .ica_host
            .interchain_account_address(&identity.connection_id, &identity.counterparty_port_id)
            .filter(|address| !address.is_empty())
        {
            Some(ica_address) => {
                AUTHORIZED_ICAS.set(storage, &identity.chain_id, &ica_address);
                tracing::info!(
                    consumer_chain_id = %identity.chain_id,
                    ica_address = %ica_address,
                    "interchain account authorized"
                );
            }
            None => tracing::warn!(
                connection_id = %identity.connection_id,
                controller_port = %identity.counterparty_port_id,
                "no interchain account registered"
            ),
        }
    }
}

impl<'a, A: IbcModule> IbcModule for IcaHostMiddleware<'a, A> {
    fn on_chan_open_init(
        &mut self,
        deps: DepsMut,
        env: &Env,
        msg: &ChanOpenInit,
    ) -> StdResult<String> {
        self.app.on_chan_open_init(deps, env, msg)
    }

    fn on_chan_open_try(
        &mut self,
        deps: DepsMut,
        env: &Env,
        msg: &ChanOpenTry,
    ) -> StdResult<String> {
        self.app.on_chan_open_try(deps, env, msg)
    }

    fn on_chan_open_ack(&mut self, deps: DepsMut, env: &Env, msg: &ChanOpenAck) -> StdResult<()> {
        self.register(deps.storage, &msg.port_id, &msg.channel_id);
        self.app.on_chan_open_ack(deps, env, msg)
    }

    fn on_chan_open_confirm(
        &mut self,
        deps: DepsMut,
        env: &Env,
        msg: &ChanOpenConfirm,
    ) -> StdResult<()> {
        self.register(deps.storage, &msg.port_id, &msg.channel_id);
        self.app.on_chan_open_confirm(deps, env, msg)
    }

    fn on_chan_close_init(&mut self, deps: DepsMut, env: &Env, msg: &ChanClose) -> StdResult<()> {
        self.app.on_chan_close_init(deps, env, msg)
    }

    fn on_chan_close_confirm(
        &mut self,
        deps: DepsMut,
        env: &Env,
        msg: &ChanClose,
    ) -> StdResult<()> {
        self.app.on_chan_close_confirm(deps, env, msg)
    }

    fn on_recv_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        relayer: &Addr,
    ) -> Acknowledgement {
        self.app.on_recv_packet(deps, env, packet, relayer)
    }

    fn on_acknowledgement_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        acknowledgement: &Binary,
        relayer: &Addr,
    ) -> StdResult<()> {
        self.app
            .on_acknowledgement_packet(deps, env, packet, acknowledgement, relayer)
    }

    fn on_timeout_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        relayer: &Addr,
    ) -> StdResult<()> {
        self.app.on_timeout_packet(deps, env, packet, relayer)
    }
}
