//! Transfer port middleware.
//!
//! Channels whose counterparty is the trusted consumer chain are tracked in
//! the allowed-channel set. An inbound packet on such a channel carrying
//! this chain's base denom, minted natively on the consumer, is paid out of
//! the channel's ICS-20 escrow account instead of being turned into a
//! voucher by the wrapped transfer application.

use std::str::FromStr;

use cosmwasm_std::{
    from_json, Addr, Binary, Coin, DepsMut, Env, IbcPacket, StdResult, Storage, Uint128,
};

use crate::address;
use crate::bank::BankKeeper;
use crate::error::ContractError;
use crate::ibc::denom::{parse_denom_trace, receiver_chain_is_source};
use crate::ibc::keepers::IbcModule;
use crate::ibc::resolver::ChannelIdentityResolver;
use crate::ibc::types::{
    Acknowledgement, ChanClose, ChanOpenAck, ChanOpenConfirm, ChanOpenInit, ChanOpenTry,
    FungibleTokenPacketData,
};
use crate::keeper::Keeper;
use crate::state::ALLOWED_CHANNELS;

pub const ERR_INVALID_PACKET_DATA: &str = "invalid packet data";
pub const ERR_INVALID_RECEIVER: &str = "invalid receiver";
pub const ERR_INVALID_AMOUNT: &str = "invalid amount";
pub const ERR_RELEASE_FAILED: &str = "release failed";

pub struct TransferMiddleware<'a, A, B> {
    app: A,
    keeper: Keeper<B>,
    resolver: ChannelIdentityResolver<'a>,
}

impl<'a, A: IbcModule, B: BankKeeper> TransferMiddleware<'a, A, B> {
    pub fn new(app: A, keeper: Keeper<B>, resolver: ChannelIdentityResolver<'a>) -> Self {
        TransferMiddleware {
            app,
            keeper,
            resolver,
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn keeper(&self) -> &Keeper<B> {
        &self.keeper
    }

    fn track_channel(&self, storage: &mut dyn Storage, port_id: &str, channel_id: &str) {
        let config = self.keeper.config();
        if port_id != config.transfer_port {
            return;
        }
        match self.resolver.chain_id(port_id, channel_id) {
            Ok(chain_id) if chain_id == config.trusted_consumer_chain_id => {
                ALLOWED_CHANNELS.insert(storage, channel_id);
                tracing::info!(channel_id, chain_id = %chain_id, "transfer channel allowed");
            }
            Ok(chain_id) => {
                tracing::debug!(channel_id, chain_id = %chain_id, "counterparty not trusted");
            }
            Err(err) => {
                tracing::warn!(channel_id, error = %err, "cannot resolve counterparty chain");
            }
        }
    }

    fn untrack_channel(&self, storage: &mut dyn Storage, port_id: &str, channel_id: &str) {
        if port_id != self.keeper.config().transfer_port {
            return;
        }
        ALLOWED_CHANNELS.remove(storage, channel_id);
        tracing::info!(channel_id, "transfer channel removed");
    }

    /// Base denom of a token minted natively on the sending chain. `None`
    /// when the token originally left from here, which the wrapped app
    /// already unescrows on its own.
    fn returning_base_denom(&self, packet: &IbcPacket, denom: &str) -> Option<String> {
        if receiver_chain_is_source(&packet.src.port_id, &packet.src.channel_id, denom) {
            return None;
        }
        Some(parse_denom_trace(denom).base_denom)
    }

    fn release(
        &mut self,
        packet: &IbcPacket,
        data: &FungibleTokenPacketData,
        denom: String,
    ) -> Result<(Addr, Coin), ContractError> {
        let prefix = self.keeper.config().bech32_prefix.clone();
        let receiver = address::validate(&prefix, &data.receiver)
            .map_err(|_| ContractError::packet_rejected(ERR_INVALID_RECEIVER))?;
        let amount = Uint128::from_str(&data.amount)
            .ok()
            .filter(|amount| !amount.is_zero())
            .ok_or_else(|| ContractError::packet_rejected(ERR_INVALID_AMOUNT))?;
        let coin = Coin { denom, amount };

        let escrow = address::transfer_escrow_address(
            &prefix,
            &packet.dest.port_id,
            &packet.dest.channel_id,
        )?;
        self.keeper
            .send_from_escrow_to_account(&escrow, &receiver, &coin)
            .map_err(|err| {
                tracing::error!(escrow = %escrow, error = %err, "escrow release failed");
                ContractError::packet_rejected(ERR_RELEASE_FAILED)
            })?;
        Ok((receiver, coin))
    }
}

impl<'a, A: IbcModule, B: BankKeeper> IbcModule for TransferMiddleware<'a, A, B> {
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
        self.track_channel(deps.storage, &msg.port_id, &msg.channel_id);
        self.app.on_chan_open_ack(deps, env, msg)
    }

    fn on_chan_open_confirm(
        &mut self,
        deps: DepsMut,
        env: &Env,
        msg: &ChanOpenConfirm,
    ) -> StdResult<()> {
        self.track_channel(deps.storage, &msg.port_id, &msg.channel_id);
        self.app.on_chan_open_confirm(deps, env, msg)
    }

    fn on_chan_close_init(&mut self, deps: DepsMut, env: &Env, msg: &ChanClose) -> StdResult<()> {
        self.untrack_channel(deps.storage, &msg.port_id, &msg.channel_id);
        self.app.on_chan_close_init(deps, env, msg)
    }

    fn on_chan_close_confirm(
        &mut self,
        deps: DepsMut,
        env: &Env,
        msg: &ChanClose,
    ) -> StdResult<()> {
        self.untrack_channel(deps.storage, &msg.port_id, &msg.channel_id);
        self.app.on_chan_close_confirm(deps, env, msg)
    }

    fn on_recv_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        relayer: &Addr,
    ) -> Acknowledgement {
        let intercept = packet.src.port_id == self.keeper.config().transfer_port
            && self
                .keeper
                .is_allowed_channel(deps.storage, &packet.dest.channel_id);
        if !intercept {
            return self.app.on_recv_packet(deps, env, packet, relayer);
        }

        let data: FungibleTokenPacketData = match from_json(&packet.data) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(
                    sequence = packet.sequence,
                    error = %err,
                    "malformed transfer packet"
                );
                return Acknowledgement::error(ERR_INVALID_PACKET_DATA);
            }
        };

        let denom = match self.returning_base_denom(packet, &data.denom) {
            Some(denom) if denom == self.keeper.config().base_denom => denom,
            _ => return self.app.on_recv_packet(deps, env, packet, relayer),
        };

        match self.release(packet, &data, denom) {
            Ok((receiver, coin)) => {
                tracing::info!(
                    height = env.block.height,
                    sequence = packet.sequence,
                    channel_id = %packet.dest.channel_id,
                    receiver = %receiver,
                    amount = %coin,
                    "released from transfer escrow"
                );
                Acknowledgement::success()
            }
            Err(ContractError::PacketRejected { reason }) => Acknowledgement::error(reason),
            Err(err) => Acknowledgement::error(err.to_string()),
        }
    }

    fn on_acknowledgement_packet(
        &mut self,
        deps: DepsMut,
        env: &Env,
        packet: &IbcPacket,
        acknowledgement: &Binary,
        relayer: &Addr,
    ) -> StdResult<()> {
        tracing::debug!(sequence = packet.sequence, "acknowledgement passed through");
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
        tracing::debug!(sequence = packet.sequence, "timeout passed through");
        self.app.on_timeout_packet(deps, env, packet, relayer)
    }
}
