//! Channel, connection and client readers backed by the host's IBC gRPC
//! query services, reached through Stargate queries.
//!
//! Requests and responses are protobuf encoded. Lookups that fail for any
//! reason read as absent; the resolver turns that into the matching
//! [`crate::ibc::ResolveError`].

use cosmwasm_std::{
    to_json_vec, Binary, ContractResult, Empty, IbcOrder, QuerierWrapper, QueryRequest,
    SystemResult,
};
use prost::Message;

use crate::ibc::keepers::{ChannelReader, ClientReader, ConnectionReader};
use crate::ibc::types::{
    ChannelEnd, ChannelState, ClientState, ConnectionCounterparty, ConnectionEnd, Counterparty,
    TendermintClientState,
};

pub const CHANNEL_QUERY_PATH: &str = "/ibc.core.channel.v1.Query/Channel";
pub const CONNECTION_QUERY_PATH: &str = "/ibc.core.connection.v1.Query/Connection";
pub const CLIENT_STATE_QUERY_PATH: &str = "/ibc.core.client.v1.Query/ClientState";

pub const TENDERMINT_CLIENT_TYPE_URL: &str = "/ibc.lightclients.tendermint.v1.ClientState";
pub const SOLOMACHINE_CLIENT_TYPE_URL: &str = "/ibc.lightclients.solomachine.v3.ClientState";
pub const LOCALHOST_CLIENT_TYPE_URL: &str = "/ibc.lightclients.localhost.v2.ClientState";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryChannelRequest {
    #[prost(string, tag = "1")]
    pub port_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub channel_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryChannelResponse {
    #[prost(message, optional, tag = "1")]
    pub channel: ::core::option::Option<ChannelRecord>,
}

/// `ibc.core.channel.v1.Channel`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelRecord {
    #[prost(int32, tag = "1")]
    pub state: i32,
    #[prost(int32, tag = "2")]
    pub ordering: i32,
    #[prost(message, optional, tag = "3")]
    pub counterparty: ::core::option::Option<ChannelCounterpartyRecord>,
    #[prost(string, repeated, tag = "4")]
    pub connection_hops: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag = "5")]
    pub version: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelCounterpartyRecord {
    #[prost(string, tag = "1")]
    pub port_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub channel_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryConnectionRequest {
    #[prost(string, tag = "1")]
    pub connection_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryConnectionResponse {
    #[prost(message, optional, tag = "1")]
    pub connection: ::core::option::Option<ConnectionRecord>,
}

/// `ibc.core.connection.v1.ConnectionEnd`, without versions and prefix.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectionRecord {
    #[prost(string, tag = "1")]
    pub client_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub state: i32,
    #[prost(message, optional, tag = "4")]
    pub counterparty: ::core::option::Option<ConnectionCounterpartyRecord>,
    #[prost(uint64, tag = "5")]
    pub delay_period: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectionCounterpartyRecord {
    #[prost(string, tag = "1")]
    pub client_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub connection_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryClientStateRequest {
    #[prost(string, tag = "1")]
    pub client_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryClientStateResponse {
    #[prost(message, optional, tag = "1")]
    pub client_state: ::core::option::Option<AnyRecord>,
}

/// `google.protobuf.Any`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AnyRecord {
    #[prost(string, tag = "1")]
    pub type_url: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeightRecord {
    #[prost(uint64, tag = "1")]
    pub revision_number: u64,
    #[prost(uint64, tag = "2")]
    pub revision_height: u64,
}

/// The two fields read from `ibc.lightclients.tendermint.v1.ClientState`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TendermintClientRecord {
    #[prost(string, tag = "1")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "7")]
    pub latest_height: ::core::option::Option<HeightRecord>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SolomachineClientRecord {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
}

fn channel_state(state: i32) -> Option<ChannelState> {
    match state {
        1 => Some(ChannelState::Init),
        2 => Some(ChannelState::TryOpen),
        3 => Some(ChannelState::Open),
        4 => Some(ChannelState::Closed),
        _ => None,
    }
}

fn channel_order(ordering: i32) -> Option<IbcOrder> {
    match ordering {
        1 => Some(IbcOrder::Unordered),
        2 => Some(IbcOrder::Ordered),
        _ => None,
    }
}

impl TryFrom<AnyRecord> for ClientState {
    type Error = String;

    fn try_from(any: AnyRecord) -> Result<Self, Self::Error> {
        match any.type_url.as_str() {
            TENDERMINT_CLIENT_TYPE_URL => {
                let tm = TendermintClientRecord::decode(any.value.as_slice())
                    .map_err(|e| e.to_string())?;
                Ok(ClientState::Tendermint(TendermintClientState {
                    chain_id: tm.chain_id,
                    latest_height: tm.latest_height.map_or(0, |h| h.revision_height),
                }))
            }
            SOLOMACHINE_CLIENT_TYPE_URL => {
                let sm = SolomachineClientRecord::decode(any.value.as_slice())
                    .map_err(|e| e.to_string())?;
                Ok(ClientState::Solomachine {
                    sequence: sm.sequence,
                })
            }
            LOCALHOST_CLIENT_TYPE_URL => Ok(ClientState::Localhost {}),
            other => Err(format!("unknown client state type {other}")),
        }
    }
}

/// IBC readers over the contract's querier.
#[derive(Clone, Copy)]
pub struct StargateIbcQuerier<'a> {
    querier: QuerierWrapper<'a>,
}

impl<'a> StargateIbcQuerier<'a> {
    pub fn new(querier: QuerierWrapper<'a>) -> Self {
        StargateIbcQuerier { querier }
    }

    fn query<Req: Message, Res: Message + Default>(&self, path: &str, request: &Req) -> Option<Res> {
        let request: QueryRequest<Empty> = QueryRequest::Stargate {
            path: path.to_string(),
            data: Binary::from(request.encode_to_vec()),
        };
        let raw = to_json_vec(&request).ok()?;
        let bin = match self.querier.raw_query(&raw) {
            SystemResult::Ok(ContractResult::Ok(bin)) => bin,
            SystemResult::Ok(ContractResult::Err(err)) => {
                tracing::debug!(path, error = %err, "ibc query failed");
                return None;
            }
            SystemResult::Err(err) => {
                tracing::debug!(path, error = %err, "ibc query rejected");
                return None;
            }
        };
        match Res::decode(bin.as_slice()) {
            Ok(res) => Some(res),
            Err(err) => {
                tracing::warn!(path, error = %err, "cannot decode ibc query response");
                None
            }
        }
    }
}

impl ChannelReader for StargateIbcQuerier<'_> {
    fn channel(&self, port_id: &str, channel_id: &str) -> Option<ChannelEnd> {
        let res: QueryChannelResponse = self.query(
            CHANNEL_QUERY_PATH,
            &QueryChannelRequest {
                port_id: port_id.to_string(),
                channel_id: channel_id.to_string(),
            },
        )?;
        let channel = res.channel?;
        let counterparty = channel.counterparty.unwrap_or_default();
        Some(ChannelEnd {
            state: channel_state(channel.state)?,
            ordering: channel_order(channel.ordering)?,
            counterparty: Counterparty {
                port_id: counterparty.port_id,
                channel_id: counterparty.channel_id,
            },
            connection_hops: channel.connection_hops,
            version: channel.version,
        })
    }
}

impl ConnectionReader for StargateIbcQuerier<'_> {
    fn connection(&self, connection_id: &str) -> Option<ConnectionEnd> {
        let res: QueryConnectionResponse = self.query(
            CONNECTION_QUERY_PATH,
            &QueryConnectionRequest {
                connection_id: connection_id.to_string(),
            },
        )?;
        let connection = res.connection?;
        let counterparty = connection.counterparty.unwrap_or_default();
        Some(ConnectionEnd {
            client_id: connection.client_id,
            counterparty: ConnectionCounterparty {
                client_id: counterparty.client_id,
                connection_id: counterparty.connection_id,
            },
        })
    }
}

impl ClientReader for StargateIbcQuerier<'_> {
    fn client_state(&self, client_id: &str) -> Option<ClientState> {
        let res: QueryClientStateResponse = self.query(
            CLIENT_STATE_QUERY_PATH,
            &QueryClientStateRequest {
                client_id: client_id.to_string(),
            },
        )?;
        match ClientState::try_from(res.client_state?) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(client_id, error = %err, "unreadable client state");
                None
            }
        }
    }
}
