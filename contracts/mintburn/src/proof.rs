//! Key and value material for proving an escrow to another chain.
//!
//! Only the committed bytes and their store path are produced here. The
//! membership proof itself comes from a raw store query against
//! `key_path` at `height`, made by the caller.

use cosmwasm_std::{Coin, Storage};

use crate::codec::encode_escrow;
use crate::error::ContractError;
use crate::msg::require_non_blank;
use crate::state::{escrow_key, ModuleConfig, ESCROWS};

#[derive(Clone, Debug, PartialEq)]
pub struct EscrowProof {
    pub height: u64,
    pub value: Vec<u8>,
    /// `[store_key, hex(primary_key)]`
    pub key_path: Vec<String>,
    pub escrow_id: String,
    pub amount: Coin,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProofExport {
    CurrentHeight(EscrowProof),
    /// Only the executing height can be described; other heights are never
    /// silently replaced by it.
    Rejected { requested: u64, current: u64 },
}

/// Describes the escrow indexed for `(consumer_chain_id, denom)`. A
/// `height` of zero means the current one.
pub fn describe(
    storage: &dyn Storage,
    config: &ModuleConfig,
    consumer_chain_id: &str,
    denom: &str,
    height: u64,
    current_height: u64,
) -> Result<ProofExport, ContractError> {
    require_non_blank(consumer_chain_id, "consumer_chain_id")?;
    require_non_blank(denom, "denom")?;
    if height != 0 && height != current_height {
        return Ok(ProofExport::Rejected {
            requested: height,
            current: current_height,
        });
    }

    let escrow = ESCROWS
        .by_route(storage, consumer_chain_id, denom)?
        .ok_or_else(|| {
            ContractError::not_found(format!(
                "escrow for consumer_chain_id={consumer_chain_id} denom={denom}"
            ))
        })?;
    if escrow.escrow_id.is_empty() {
        return Err(ContractError::internal("stored escrow has no id"));
    }

    Ok(ProofExport::CurrentHeight(EscrowProof {
        height: current_height,
        value: encode_escrow(&escrow),
        key_path: vec![
            config.store_key.clone(),
            hex::encode(escrow_key(&escrow.escrow_id)),
        ],
        escrow_id: escrow.escrow_id,
        amount: escrow.amount,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Escrow, EscrowStatus};
    use cosmwasm_std::coin;
    use cosmwasm_std::testing::MockStorage;

    fn seeded() -> MockStorage {
        let mut storage = MockStorage::new();
        ESCROWS.put(
            &mut storage,
            &Escrow {
                escrow_id: "12".to_string(),
                consumer_chain_id: "dex-1".to_string(),
                amount: coin(100, "umaany"),
                recipient: String::new(),
                expiry_height: 0,
                expiry_time_unix: 0,
                status: EscrowStatus::Pending,
            },
        );
        storage
    }

    #[test]
    fn describes_committed_bytes_at_current_height() {
        let storage = seeded();
        let config = ModuleConfig::default();

        let export = describe(&storage, &config, "dex-1", "umaany", 0, 77).unwrap();
        let ProofExport::CurrentHeight(proof) = export else {
            panic!("expected a proof at the current height");
        };
        assert_eq!(proof.height, 77);
        assert_eq!(proof.key_path, vec!["x-mintburn".to_string(), "013132".to_string()]);
        assert_eq!(Some(proof.value), ESCROWS.raw(&storage, "12"));
        assert_eq!(proof.escrow_id, "12");
        assert_eq!(proof.amount, coin(100, "umaany"));

        let same = describe(&storage, &config, "dex-1", "umaany", 77, 77).unwrap();
        assert!(matches!(same, ProofExport::CurrentHeight(_)));
    }

    #[test]
    fn other_heights_are_rejected() {
        let storage = seeded();
        let export =
            describe(&storage, &ModuleConfig::default(), "dex-1", "umaany", 76, 77).unwrap();
        assert_eq!(
            export,
            ProofExport::Rejected {
                requested: 76,
                current: 77
            }
        );
    }

    #[test]
    fn missing_route_and_blank_fields() {
        let storage = seeded();
        let config = ModuleConfig::default();
        assert!(matches!(
            describe(&storage, &config, "dex-2", "umaany", 0, 1),
            Err(ContractError::NotFound { .. })
        ));
        assert!(matches!(
            describe(&storage, &config, "", "umaany", 0, 1),
            Err(ContractError::InvalidRequest { .. })
        ));
        assert!(matches!(
            describe(&storage, &config, "dex-1", " ", 0, 1),
            Err(ContractError::InvalidRequest { .. })
        ));
    }
}
