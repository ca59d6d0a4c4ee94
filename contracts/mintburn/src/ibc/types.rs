use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_binary, Binary, IbcOrder, StdResult};
use serde::{Deserialize, Serialize};

#[cw_serde]
pub struct Counterparty {
    pub port_id: String,
    pub channel_id: String,
}

#[cw_serde]
pub enum ChannelState {
    Init,
    TryOpen,
    Open,
    Closed,
}

#[cw_serde]
pub struct ChannelEnd {
    pub state: ChannelState,
    pub ordering: IbcOrder,
    pub counterparty: Counterparty,
    pub connection_hops: Vec<String>,
    pub version: String,
}

#[cw_serde]
pub struct ConnectionCounterparty {
    pub client_id: String,
    pub connection_id: String,
}

#[cw_serde]
pub struct ConnectionEnd {
    /// Local client tracking the counterparty chain.
    pub client_id: String,
    pub counterparty: ConnectionCounterparty,
}

#[cw_serde]
pub struct TendermintClientState {
    pub chain_id: String,
    pub latest_height: u64,
}

#[cw_serde]
pub enum ClientState {
    Tendermint(TendermintClientState),
    Solomachine { sequence: u64 },
    Localhost {},
}

impl ClientState {
    pub fn client_type(&self) -> &'static str {
        match self {
            ClientState::Tendermint(_) => "07-tendermint",
            ClientState::Solomachine { .. } => "06-solomachine",
            ClientState::Localhost {} => "09-localhost",
        }
    }
}

#[cw_serde]
pub struct ChanOpenInit {
    pub order: IbcOrder,
    pub connection_hops: Vec<String>,
    pub port_id: String,
    pub channel_id: String,
    pub counterparty: Counterparty,
    pub version: String,
}

#[cw_serde]
pub struct ChanOpenTry {
    pub order: IbcOrder,
    pub connection_hops: Vec<String>,
    pub port_id: String,
    pub channel_id: String,
    pub counterparty: Counterparty,
    pub counterparty_version: String,
}

#[cw_serde]
pub struct ChanOpenAck {
    pub port_id: String,
    pub channel_id: String,
    pub counterparty_channel_id: String,
    pub counterparty_version: String,
}

#[cw_serde]
pub struct ChanOpenConfirm {
    pub port_id: String,
    pub channel_id: String,
}

/// Payload of both close-init and close-confirm.
#[cw_serde]
pub struct ChanClose {
    pub port_id: String,
    pub channel_id: String,
}

/// ICS-20 `FungibleTokenPacketData`. Unknown fields are tolerated.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FungibleTokenPacketData {
    pub denom: String,
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub memo: String,
}

/// ICS-20 acknowledgement envelope: `{"result": ...}` or `{"error": ...}`.
#[cw_serde]
pub enum Acknowledgement {
    Result(Binary),
    Error(String),
}

impl Acknowledgement {
    /// The fungible token success acknowledgement, a single `0x01` byte.
    pub fn success() -> Self {
        Acknowledgement::Result(Binary::from(vec![1u8]))
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Acknowledgement::Error(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Acknowledgement::Result(_))
    }

    pub fn to_binary(&self) -> StdResult<Binary> {
        to_json_binary(self)
    }
}
