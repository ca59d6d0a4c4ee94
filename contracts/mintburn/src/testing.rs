//! In-memory collaborators for unit and integration tests.

use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Binary, Coin, DepsMut, Env, IbcPacket, StdError, StdResult, Uint128};

use crate::address;
use crate::bank::BankKeeper;
use crate::ibc::keepers::{
    ChannelReader, ClientReader, ConnectionReader, IbcModule, IcaHostReader,
};
use crate::ibc::types::{
    Acknowledgement, ChanClose, ChanOpenAck, ChanOpenConfirm, ChanOpenInit, ChanOpenTry,
    ChannelEnd, ChannelState, ClientState, ConnectionCounterparty, ConnectionEnd, Counterparty,
    TendermintClientState,
};
use crate::state::DEFAULT_BECH32_PREFIX;

/// Deterministic account address for a human readable name.
pub fn account(name: &str) -> Addr {
    address::module_address(DEFAULT_BECH32_PREFIX, name).expect("valid test account")
}

/// Balance sheet keyed by address and denom.
#[derive(Clone, Debug, Default)]
pub struct MockBank {
    prefix: String,
    balances: BTreeMap<(String, String), Uint128>,
}

impl MockBank {
    pub fn new(prefix: &str) -> Self {
        MockBank {
            prefix: prefix.to_string(),
            balances: BTreeMap::new(),
        }
    }

    pub fn set_balance(&mut self, addr: &Addr, amount: Coin) {
        self.balances
            .insert((addr.to_string(), amount.denom), amount.amount);
    }

    pub fn balance(&self, addr: &Addr, denom: &str) -> Uint128 {
        self.balances
            .get(&(addr.to_string(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }
}

impl BankKeeper for MockBank {
    fn send_coins(&mut self, from: &Addr, to: &Addr, amount: &Coin) -> StdResult<()> {
        let available = self.balance(from, &amount.denom);
        if available < amount.amount {
            return Err(StdError::generic_err(format!(
                "insufficient funds: {available}{denom} < {amount}",
                denom = amount.denom
            )));
        }
        if from == to {
            return Ok(());
        }
        let received = self.balance(to, &amount.denom) + amount.amount;
        self.balances.insert(
            (from.to_string(), amount.denom.clone()),
            available - amount.amount,
        );
        self.balances
            .insert((to.to_string(), amount.denom.clone()), received);
        Ok(())
    }

    fn module_address(&self, module_name: &str) -> StdResult<Addr> {
        address::module_address(&self.prefix, module_name)
            .map_err(|e| StdError::generic_err(e.to_string()))
    }
}

/// Channels, connections and light clients of a fake IBC stack.
#[derive(Clone, Debug, Default)]
pub struct MockIbcRegistry {
    channels: BTreeMap<(String, String), ChannelEnd>,
    connections: BTreeMap<String, ConnectionEnd>,
    clients: BTreeMap<String, ClientState>,
}

impl MockIbcRegistry {
    pub fn with_channel(mut self, port_id: &str, channel_id: &str, hops: Vec<String>) -> Self {
        self.channels.insert(
            (port_id.to_string(), channel_id.to_string()),
            ChannelEnd {
                state: ChannelState::Open,
                ordering: cosmwasm_std::IbcOrder::Unordered,
                counterparty: Counterparty {
                    port_id: port_id.to_string(),
                    channel_id: "channel-0".to_string(),
                },
                connection_hops: hops,
                version: String::new(),
            },
        );
        self
    }

    pub fn with_counterparty_port(
        mut self,
        port_id: &str,
        channel_id: &str,
        counterparty_port: &str,
    ) -> Self {
        if let Some(channel) = self
            .channels
            .get_mut(&(port_id.to_string(), channel_id.to_string()))
        {
            channel.counterparty.port_id = counterparty_port.to_string();
        }
        self
    }

    /// Connection whose local and counterparty client ids are both
    /// `client_id`.
    pub fn with_connection(self, connection_id: &str, client_id: &str) -> Self {
        self.with_connection_clients(connection_id, client_id, client_id)
    }

    pub fn with_connection_clients(
        mut self,
        connection_id: &str,
        client_id: &str,
        counterparty_client_id: &str,
    ) -> Self {
        self.connections.insert(
            connection_id.to_string(),
            ConnectionEnd {
                client_id: client_id.to_string(),
                counterparty: ConnectionCounterparty {
                    client_id: counterparty_client_id.to_string(),
                    connection_id: "connection-0".to_string(),
                },
            },
        );
        self
    }

    pub fn with_client(mut self, client_id: &str, state: ClientState) -> Self {
        self.clients.insert(client_id.to_string(), state);
        self
    }

    /// Channel over one connection to a Tendermint client for `chain_id`.
    pub fn with_tendermint_channel(
        self,
        port_id: &str,
        channel_id: &str,
        connection_id: &str,
        client_id: &str,
        chain_id: &str,
    ) -> Self {
        self.with_channel(port_id, channel_id, vec![connection_id.to_string()])
            .with_connection(connection_id, client_id)
            .with_client(
                client_id,
                ClientState::Tendermint(TendermintClientState {
                    chain_id: chain_id.to_string(),
                    latest_height: 1,
                }),
            )
    }
}

impl ChannelReader for MockIbcRegistry {
    fn channel(&self, port_id: &str, channel_id: &str) -> Option<ChannelEnd> {
        self.channels
            .get(&(port_id.to_string(), channel_id.to_string()))
            .cloned()
    }
}

impl ConnectionReader for MockIbcRegistry {
    fn connection(&self, connection_id: &str) -> Option<ConnectionEnd> {
        self.connections.get(connection_id).cloned()
    }
}

impl ClientReader for MockIbcRegistry {
    fn client_state(&self, client_id: &str) -> Option<ClientState> {
        self.clients.get(client_id).cloned()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockIcaHost {
    accounts: BTreeMap<(String, String), String>,
}

impl MockIcaHost {
    pub fn with_account(mut self, connection_id: &str, port_id: &str, address: &str) -> Self {
        self.accounts.insert(
            (connection_id.to_string(), port_id.to_string()),
            address.to_string(),
        );
        self
    }
}

impl IcaHostReader for MockIcaHost {
    fn interchain_account_address(&self, connection_id: &str, port_id: &str) -> Option<String> {
        self.accounts
            .get(&(connection_id.to_string(), port_id.to_string()))
            .cloned()
    }
}

/// Stand-in for the wrapped application. Records every callback it sees.
#[derive(Debug, Default)]
pub struct MockIbcApp {
    pub calls: Vec<String>,
    pub fail_handshake: bool,
}

impl MockIbcApp {
    pub fn failing() -> Self {
        MockIbcApp {
            calls: vec![],
            fail_handshake: true,
        }
    }

    fn handshake(&mut self, call: String) -> StdResult<()> {
        self.calls.push(call);
        if self.fail_handshake {
            return Err(StdError::generic_err("handshake rejected by app"));
        }
        Ok(())
    }
}

impl IbcModule for MockIbcApp {
    fn on_chan_open_init(&mut self, _: DepsMut, _: &Env, msg: &ChanOpenInit) -> StdResult<String> {
        self.handshake(format!("open_init:{}", msg.channel_id))?;
        Ok(msg.version.clone())
    }

    fn on_chan_open_try(&mut self, _: DepsMut, _: &Env, msg: &ChanOpenTry) -> StdResult<String> {
        self.handshake(format!("open_try:{}", msg.channel_id))?;
        Ok(msg.counterparty_version.clone())
    }

    fn on_chan_open_ack(&mut self, _: DepsMut, _: &Env, msg: &ChanOpenAck) -> StdResult<()> {
        self.handshake(format!("open_ack:{}", msg.channel_id))
    }

    fn on_chan_open_confirm(
        &mut self,
        _: DepsMut,
        _: &Env,
        msg: &ChanOpenConfirm,
    ) -> StdResult<()> {
        self.handshake(format!("open_confirm:{}", msg.channel_id))
    }

    fn on_chan_close_init(&mut self, _: DepsMut, _: &Env, msg: &ChanClose) -> StdResult<()> {
        self.handshake(format!("close_init:{}", msg.channel_id))
    }

    fn on_chan_close_confirm(&mut self, _: DepsMut, _: &Env, msg: &ChanClose) -> StdResult<()> {
        self.handshake(format!("close_confirm:{}", msg.channel_id))
    }

    fn on_recv_packet(
        &mut self,
        _: DepsMut,
        _: &Env,
        packet: &IbcPacket,
        _: &Addr,
    ) -> Acknowledgement {
        self.calls.push(format!("recv:{}", packet.sequence));
        Acknowledgement::success()
    }

    fn on_acknowledgement_packet(
        &mut self,
        _: DepsMut,
        _: &Env,
        packet: &IbcPacket,
        _: &Binary,
        _: &Addr,
    ) -> StdResult<()> {
        self.calls.push(format!("ack:{}", packet.sequence));
        Ok(())
    }

    fn on_timeout_packet(
        &mut self,
        _: DepsMut,
        _: &Env,
        packet: &IbcPacket,
        _: &Addr,
    ) -> StdResult<()> {
        self.calls.push(format!("timeout:{}", packet.sequence));
        Ok(())
    }
}
