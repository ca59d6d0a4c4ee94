use cosmwasm_std::QuerierWrapper;
use thiserror::Error;

use crate::ibc::keepers::{ChannelReader, ClientReader, ConnectionReader};
use crate::ibc::querier::StargateIbcQuerier;
use crate::ibc::types::ClientState;

#[derive(Error, Debug, PartialEq)]
pub enum ResolveError {
    #[error("channel {port_id}/{channel_id} not found")]
    ChannelNotFound { port_id: String, channel_id: String },

    #[error("channel {channel_id} has no connection hop")]
    MissingConnectionHop { channel_id: String },

    #[error("connection {connection_id} not found")]
    ConnectionNotFound { connection_id: String },

    #[error("client state {client_id} not found")]
    ClientStateNotFound { client_id: String },

    #[error("unexpected client state type {client_type} for {client_id}")]
    UnsupportedClient {
        client_id: String,
        client_type: String,
    },
}

/// Who sits at the other end of a channel.
#[derive(Clone, Debug, PartialEq)]
pub struct CounterpartyIdentity {
    /// Chain id declared by the counterparty's light client.
    pub chain_id: String,
    pub connection_id: String,
    pub counterparty_port_id: String,
}

/// Walks channel, first connection hop, connection, the counterparty's
/// client id and its client state to recover the counterparty chain id.
/// Never mutates anything.
pub struct ChannelIdentityResolver<'a> {
    channels: Box<dyn ChannelReader + 'a>,
    connections: Box<dyn ConnectionReader + 'a>,
    clients: Box<dyn ClientReader + 'a>,
}

impl<'a> ChannelIdentityResolver<'a> {
    pub fn new(
        channels: Box<dyn ChannelReader + 'a>,
        connections: Box<dyn ConnectionReader + 'a>,
        clients: Box<dyn ClientReader + 'a>,
    ) -> Self {
        ChannelIdentityResolver {
            channels,
            connections,
            clients,
        }
    }

    /// Builds a resolver over a single registry serving all three lookups.
    pub fn from_registry<R>(registry: R) -> Self
    where
        R: ChannelReader + ConnectionReader + ClientReader + Clone + 'a,
    {
        Self::new(
            Box::new(registry.clone()),
            Box::new(registry.clone()),
            Box::new(registry),
        )
    }

    /// Resolver over the host's IBC query services.
    pub fn from_querier(querier: QuerierWrapper<'a>) -> Self {
        Self::from_registry(StargateIbcQuerier::new(querier))
    }

    pub fn resolve(
        &self,
        port_id: &str,
        channel_id: &str,
    ) -> Result<CounterpartyIdentity, ResolveError> {
        let channel = self.channels.channel(port_id, channel_id).ok_or_else(|| {
            ResolveError::ChannelNotFound {
                port_id: port_id.to_string(),
                channel_id: channel_id.to_string(),
            }
        })?;
        let connection_id = channel.connection_hops.first().cloned().ok_or_else(|| {
            ResolveError::MissingConnectionHop {
                channel_id: channel_id.to_string(),
            }
        })?;
        let connection = self.connections.connection(&connection_id).ok_or_else(|| {
            ResolveError::ConnectionNotFound {
                connection_id: connection_id.clone(),
            }
        })?;
        let client_id = connection.counterparty.client_id;
        let client_state = self.clients.client_state(&client_id).ok_or_else(|| {
            ResolveError::ClientStateNotFound {
                client_id: client_id.clone(),
            }
        })?;
        match client_state {
            ClientState::Tendermint(tm) => Ok(CounterpartyIdentity {
                chain_id: tm.chain_id,
                connection_id,
                counterparty_port_id: channel.counterparty.port_id,
            }),
            other => Err(ResolveError::UnsupportedClient {
                client_id,
                client_type: other.client_type().to_string(),
            }),
        }
    }

    pub fn chain_id(&self, port_id: &str, channel_id: &str) -> Result<String, ResolveError> {
        self.resolve(port_id, channel_id).map(|identity| identity.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ibc::types::TendermintClientState;
    use crate::testing::MockIbcRegistry;

    #[test]
    fn resolves_tendermint_chain_id() {
        let registry = MockIbcRegistry::default().with_tendermint_channel(
            "transfer",
            "channel-0",
            "connection-0",
            "07-tendermint-0",
            "maanydex",
        );
        let resolver = ChannelIdentityResolver::from_registry(registry);
        let identity = resolver.resolve("transfer", "channel-0").unwrap();
        assert_eq!(identity.chain_id, "maanydex");
        assert_eq!(identity.connection_id, "connection-0");
        assert_eq!(identity.counterparty_port_id, "transfer");
    }

    #[test]
    fn follows_counterparty_client() {
        // the connection's own client tracks another chain than the one
        // its counterparty client id points at
        let registry = MockIbcRegistry::default()
            .with_channel("transfer", "channel-4", vec!["connection-4".to_string()])
            .with_connection_clients("connection-4", "07-tendermint-5", "07-tendermint-0")
            .with_client(
                "07-tendermint-5",
                ClientState::Tendermint(TendermintClientState {
                    chain_id: "osmosis-1".to_string(),
                    latest_height: 9,
                }),
            )
            .with_client(
                "07-tendermint-0",
                ClientState::Tendermint(TendermintClientState {
                    chain_id: "maanydex".to_string(),
                    latest_height: 3,
                }),
            );
        let resolver = ChannelIdentityResolver::from_registry(registry);
        assert_eq!(
            resolver.chain_id("transfer", "channel-4"),
            Ok("maanydex".to_string())
        );

        let registry = MockIbcRegistry::default()
            .with_channel("transfer", "channel-4", vec!["connection-4".to_string()])
            .with_connection_clients("connection-4", "07-tendermint-5", "07-tendermint-0")
            .with_client(
                "07-tendermint-5",
                ClientState::Tendermint(TendermintClientState {
                    chain_id: "osmosis-1".to_string(),
                    latest_height: 9,
                }),
            );
        let resolver = ChannelIdentityResolver::from_registry(registry);
        assert_eq!(
            resolver.resolve("transfer", "channel-4"),
            Err(ResolveError::ClientStateNotFound {
                client_id: "07-tendermint-0".to_string()
            })
        );
    }

    #[test]
    fn reports_each_missing_link() {
        let resolver = ChannelIdentityResolver::from_registry(MockIbcRegistry::default());
        assert!(matches!(
            resolver.resolve("transfer", "channel-9"),
            Err(ResolveError::ChannelNotFound { .. })
        ));

        let registry = MockIbcRegistry::default().with_channel("transfer", "channel-1", vec![]);
        let resolver = ChannelIdentityResolver::from_registry(registry);
        assert!(matches!(
            resolver.resolve("transfer", "channel-1"),
            Err(ResolveError::MissingConnectionHop { .. })
        ));

        let registry = MockIbcRegistry::default().with_channel(
            "transfer",
            "channel-1",
            vec!["connection-7".to_string()],
        );
        let resolver = ChannelIdentityResolver::from_registry(registry);
        assert_eq!(
            resolver.resolve("transfer", "channel-1"),
            Err(ResolveError::ConnectionNotFound {
                connection_id: "connection-7".to_string()
            })
        );

        let registry = MockIbcRegistry::default()
            .with_channel("transfer", "channel-1", vec!["connection-7".to_string()])
            .with_connection("connection-7", "07-tendermint-3");
        let resolver = ChannelIdentityResolver::from_registry(registry);
        assert!(matches!(
            resolver.resolve("transfer", "channel-1"),
            Err(ResolveError::ClientStateNotFound { .. })
        ));
    }

    #[test]
    fn rejects_non_tendermint_clients() {
        let registry = MockIbcRegistry::default()
            .with_channel("transfer", "channel-1", vec!["connection-1".to_string()])
            .with_connection("connection-1", "06-solomachine-0")
            .with_client("06-solomachine-0", ClientState::Solomachine { sequence: 1 });
        let resolver = ChannelIdentityResolver::from_registry(registry);
        assert_eq!(
            resolver.chain_id("transfer", "channel-1"),
            Err(ResolveError::UnsupportedClient {
                client_id: "06-solomachine-0".to_string(),
                client_type: "06-solomachine".to_string(),
            })
        );
    }
}
