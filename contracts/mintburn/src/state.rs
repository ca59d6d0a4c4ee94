use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Order, StdError, StdResult, Storage};
use cw_storage_plus::{Item, Map};

use crate::codec::{decode_escrow, encode_escrow};
use crate::error::ContractError;

pub const DEFAULT_MODULE_NAME: &str = "mintburn";
pub const DEFAULT_STORE_KEY: &str = "x-mintburn";
pub const DEFAULT_BECH32_PREFIX: &str = "maany";
pub const DEFAULT_BASE_DENOM: &str = "umaany";
pub const DEFAULT_TRUSTED_CONSUMER_CHAIN_ID: &str = "maanydex";
pub const TRANSFER_PORT_ID: &str = "transfer";
pub const ICA_HOST_PORT_ID: &str = "icahost";

/// Immutable module configuration, built once and handed to every component.
#[cw_serde]
pub struct ModuleConfig {
    pub module_name: String,
    /// Substore name used as the first segment of proof key paths.
    pub store_key: String,
    pub bech32_prefix: String,
    /// This chain's own base token; only this denom is released on return.
    pub base_denom: String,
    pub trusted_consumer_chain_id: String,
    pub transfer_port: String,
    pub ica_host_port: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleConfig {
            module_name: DEFAULT_MODULE_NAME.to_string(),
            store_key: DEFAULT_STORE_KEY.to_string(),
            bech32_prefix: DEFAULT_BECH32_PREFIX.to_string(),
            base_denom: DEFAULT_BASE_DENOM.to_string(),
            trusted_consumer_chain_id: DEFAULT_TRUSTED_CONSUMER_CHAIN_ID.to_string(),
            transfer_port: TRANSFER_PORT_ID.to_string(),
            ica_host_port: ICA_HOST_PORT_ID.to_string(),
        }
    }
}

pub const CONFIG: Item<ModuleConfig> = Item::new("config");

/// Account that funded each escrow, keyed by escrow id. Kept beside the
/// committed record so the proven bytes stay unchanged.
pub const DEPOSITORS: Map<&str, Addr> = Map::new("depositor");

#[cw_serde]
pub struct Escrow {
    pub escrow_id: String,
    pub consumer_chain_id: String,
    pub amount: Coin,
    /// Empty when the recipient is not yet known.
    pub recipient: String,
    pub expiry_height: u64,
    pub expiry_time_unix: u64,
    pub status: EscrowStatus,
}

#[cw_serde]
pub enum EscrowStatus {
    Pending,
    Claimed,
    Canceled,
}

impl EscrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowStatus::Pending => "PENDING",
            EscrowStatus::Claimed => "CLAIMED",
            EscrowStatus::Canceled => "CANCELED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, EscrowStatus::Pending)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscrowStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(EscrowStatus::Pending),
            "CLAIMED" => Ok(EscrowStatus::Claimed),
            "CANCELED" => Ok(EscrowStatus::Canceled),
            other => Err(ContractError::invalid_request(format!(
                "unknown escrow status {other}; expected PENDING|CLAIMED|CANCELED"
            ))),
        }
    }
}

// Persisted key layout. Shared with consumer-side verification, do not change.
pub const ESCROW_ID_COUNTER_KEY: &[u8] = &[0x00];
pub const ESCROW_KEY_PREFIX: u8 = 0x01;
pub const ESCROW_INDEX_PREFIX: u8 = 0x02;
pub const ALLOWED_CHANNEL_PREFIX: &[u8] = b"allowed-channel/";
pub const AUTHORIZED_ICA_PREFIX: &[u8] = b"AuthorizedICA/";

/// `0x01 ∥ escrow_id`
pub fn escrow_key(escrow_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + escrow_id.len());
    key.push(ESCROW_KEY_PREFIX);
    key.extend_from_slice(escrow_id.as_bytes());
    key
}

/// `0x02 ∥ consumer_chain_id ∥ 0x00 ∥ denom`
pub fn escrow_index_key(consumer_chain_id: &str, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + consumer_chain_id.len() + denom.len());
    key.push(ESCROW_INDEX_PREFIX);
    key.extend_from_slice(consumer_chain_id.as_bytes());
    key.push(0x00);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn prefixed(prefix: &[u8], suffix: &str) -> Vec<u8> {
    [prefix, suffix.as_bytes()].concat()
}

/// Smallest key strictly greater than every key starting with `prefix`.
fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return end;
        }
    }
    end
}

/// Escrow records, the id counter and the route index.
///
/// Writes are unchecked: transition legality belongs to the keeper.
pub struct EscrowLedger;

pub const ESCROWS: EscrowLedger = EscrowLedger;

impl EscrowLedger {
    /// Writes the record under its id and points the route index at it,
    /// replacing whatever the route pointed to before.
    pub fn put(&self, storage: &mut dyn Storage, escrow: &Escrow) {
        storage.set(&escrow_key(&escrow.escrow_id), &encode_escrow(escrow));
        storage.set(
            &escrow_index_key(&escrow.consumer_chain_id, &escrow.amount.denom),
            escrow.escrow_id.as_bytes(),
        );
    }

    pub fn by_id(&self, storage: &dyn Storage, escrow_id: &str) -> StdResult<Option<Escrow>> {
        storage
            .get(&escrow_key(escrow_id))
            .map(|bz| decode_escrow(&bz))
            .transpose()
    }

    pub fn by_route(
        &self,
        storage: &dyn Storage,
        consumer_chain_id: &str,
        denom: &str,
    ) -> StdResult<Option<Escrow>> {
        let Some(id) = storage.get(&escrow_index_key(consumer_chain_id, denom)) else {
            return Ok(None);
        };
        let id = String::from_utf8(id).map_err(StdError::from)?;
        self.by_id(storage, &id)
    }

    /// Raw committed bytes at the primary key, if any.
    pub fn raw(&self, storage: &dyn Storage, escrow_id: &str) -> Option<Vec<u8>> {
        storage.get(&escrow_key(escrow_id))
    }

    /// Visits records in primary key order, that is by escrow id compared as
    /// bytes: "10" sorts before "9".
    pub fn iterate<F>(
        &self,
        storage: &dyn Storage,
        start_after: Option<&str>,
        mut visit: F,
    ) -> StdResult<()>
    where
        F: FnMut(Escrow) -> ControlFlow<()>,
    {
        let start = match start_after {
            Some(id) => {
                let mut key = escrow_key(id);
                key.push(0x00);
                key
            }
            None => vec![ESCROW_KEY_PREFIX],
        };
        let end = [ESCROW_KEY_PREFIX + 1];
        for (_, value) in storage.range(Some(&start), Some(&end), Order::Ascending) {
            if visit(decode_escrow(&value)?).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Allocates the next escrow id. The counter is an 8-byte big-endian
    /// integer under `0x00`; ids start at "1" and never repeat.
    pub fn next_id(&self, storage: &mut dyn Storage) -> Result<String, ContractError> {
        let current = match storage.get(ESCROW_ID_COUNTER_KEY) {
            None => 0u64,
            Some(bz) => {
                let raw: [u8; 8] = bz.as_slice().try_into().map_err(|_| {
                    ContractError::internal(format!(
                        "escrow id counter has {} bytes, expected 8",
                        bz.len()
                    ))
                })?;
                u64::from_be_bytes(raw)
            }
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| ContractError::internal("escrow id counter overflow"))?;
        storage.set(ESCROW_ID_COUNTER_KEY, &next.to_be_bytes());
        Ok(next.to_string())
    }
}

/// Transfer channels bound to the trusted consumer chain.
pub struct ChannelSet;

pub const ALLOWED_CHANNELS: ChannelSet = ChannelSet;

impl ChannelSet {
    pub fn insert(&self, storage: &mut dyn Storage, channel_id: &str) {
        storage.set(&prefixed(ALLOWED_CHANNEL_PREFIX, channel_id), &[1]);
    }

    pub fn remove(&self, storage: &mut dyn Storage, channel_id: &str) {
        storage.remove(&prefixed(ALLOWED_CHANNEL_PREFIX, channel_id));
    }

    pub fn contains(&self, storage: &dyn Storage, channel_id: &str) -> bool {
        storage
            .get(&prefixed(ALLOWED_CHANNEL_PREFIX, channel_id))
            .is_some()
    }

    pub fn list(&self, storage: &dyn Storage) -> StdResult<Vec<String>> {
        let end = prefix_end(ALLOWED_CHANNEL_PREFIX);
        storage
            .range(Some(ALLOWED_CHANNEL_PREFIX), Some(&end), Order::Ascending)
            .map(|(key, _)| {
                String::from_utf8(key[ALLOWED_CHANNEL_PREFIX.len()..].to_vec())
                    .map_err(StdError::from)
            })
            .collect()
    }
}

/// Consumer chain id to the interchain account allowed to relay mints for it.
pub struct IcaRegistry;

pub const AUTHORIZED_ICAS: IcaRegistry = IcaRegistry;

impl IcaRegistry {
    /// Records the mapping, overwriting any previous registration.
    pub fn set(&self, storage: &mut dyn Storage, consumer_chain_id: &str, ica_address: &str) {
        storage.set(
            &prefixed(AUTHORIZED_ICA_PREFIX, consumer_chain_id),
            ica_address.as_bytes(),
        );
    }

    pub fn get(&self, storage: &dyn Storage, consumer_chain_id: &str) -> StdResult<Option<String>> {
        storage
            .get(&prefixed(AUTHORIZED_ICA_PREFIX, consumer_chain_id))
            .map(|bz| String::from_utf8(bz).map_err(StdError::from))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::coin;
    use cosmwasm_std::testing::MockStorage;

    fn escrow(id: &str, chain: &str, denom: &str) -> Escrow {
        Escrow {
            escrow_id: id.to_string(),
            consumer_chain_id: chain.to_string(),
            amount: coin(100, denom),
            recipient: String::new(),
            expiry_height: 0,
            expiry_time_unix: 0,
            status: EscrowStatus::Pending,
        }
    }

    #[test]
    fn key_layout() {
        assert_eq!(escrow_key("12"), b"\x0112".to_vec());
        assert_eq!(escrow_index_key("dex-1", "umaany"), b"\x02dex-1\x00umaany".to_vec());
    }

    #[test]
    fn next_id_is_monotonic_and_persisted() {
        let mut storage = MockStorage::new();
        assert_eq!(ESCROWS.next_id(&mut storage).unwrap(), "1");
        assert_eq!(ESCROWS.next_id(&mut storage).unwrap(), "2");
        assert_eq!(
            storage.get(ESCROW_ID_COUNTER_KEY).unwrap(),
            2u64.to_be_bytes().to_vec()
        );

        // a fresh ledger handle over the same store continues the sequence
        let ledger = EscrowLedger;
        let ids: Vec<u64> = (0..20)
            .map(|_| ledger.next_id(&mut storage).unwrap().parse().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids[0], 3);
    }

    #[test]
    fn next_id_rejects_corrupt_counter() {
        let mut storage = MockStorage::new();
        storage.set(ESCROW_ID_COUNTER_KEY, &[1, 2, 3]);
        let err = ESCROWS.next_id(&mut storage).unwrap_err();
        assert!(matches!(err, ContractError::Internal { .. }));
    }

    #[test]
    fn route_index_points_at_latest_write() {
        let mut storage = MockStorage::new();
        let first = escrow("1", "dex-1", "umaany");
        let mut second = escrow("2", "dex-1", "umaany");
        second.amount = coin(250, "umaany");
        ESCROWS.put(&mut storage, &first);
        ESCROWS.put(&mut storage, &second);

        let routed = ESCROWS.by_route(&storage, "dex-1", "umaany").unwrap().unwrap();
        assert_eq!(routed, second);
        assert_eq!(ESCROWS.by_id(&storage, "1").unwrap().unwrap(), first);
        assert!(ESCROWS.by_route(&storage, "dex-2", "umaany").unwrap().is_none());
        assert!(ESCROWS.by_id(&storage, "3").unwrap().is_none());
    }

    #[test]
    fn iterate_is_byte_ordered_and_stoppable() {
        let mut storage = MockStorage::new();
        for id in ["1", "2", "10", "9"] {
            ESCROWS.put(&mut storage, &escrow(id, "dex-1", &format!("denom{id}")));
        }
        // unrelated keys around the escrow prefix are never visited
        ALLOWED_CHANNELS.insert(&mut storage, "channel-0");
        storage.set(ESCROW_ID_COUNTER_KEY, &4u64.to_be_bytes());

        let mut seen = vec![];
        ESCROWS
            .iterate(&storage, None, |e| {
                seen.push(e.escrow_id);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(seen, vec!["1", "10", "2", "9"]);

        let mut seen = vec![];
        ESCROWS
            .iterate(&storage, Some("10"), |e| {
                seen.push(e.escrow_id);
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(seen, vec!["2"]);
    }

    #[test]
    fn allowed_channels() {
        let mut storage = MockStorage::new();
        ALLOWED_CHANNELS.insert(&mut storage, "channel-1");
        ALLOWED_CHANNELS.insert(&mut storage, "channel-0");
        assert!(ALLOWED_CHANNELS.contains(&storage, "channel-0"));
        assert!(!ALLOWED_CHANNELS.contains(&storage, "channel-2"));
        assert_eq!(
            ALLOWED_CHANNELS.list(&storage).unwrap(),
            vec!["channel-0", "channel-1"]
        );
        ALLOWED_CHANNELS.remove(&mut storage, "channel-0");
        assert_eq!(ALLOWED_CHANNELS.list(&storage).unwrap(), vec!["channel-1"]);
    }

    #[test]
    fn authorized_ica_overwrites() {
        let mut storage = MockStorage::new();
        assert!(AUTHORIZED_ICAS.get(&storage, "dex-1").unwrap().is_none());
        AUTHORIZED_ICAS.set(&mut storage, "dex-1", "maany1first");
        AUTHORIZED_ICAS.set(&mut storage, "dex-1", "maany1second");
        assert_eq!(
            AUTHORIZED_ICAS.get(&storage, "dex-1").unwrap().as_deref(),
            Some("maany1second")
        );
    }

    #[test]
    fn status_parsing() {
        assert_eq!("pending".parse::<EscrowStatus>().unwrap(), EscrowStatus::Pending);
        assert_eq!("CANCELED".parse::<EscrowStatus>().unwrap(), EscrowStatus::Canceled);
        assert!("done".parse::<EscrowStatus>().is_err());
    }
}
