//! Bech32 account addresses.
//!
//! Addresses are validated against the configured human-readable prefix
//! rather than through `Api::addr_validate`, so the same rules apply to the
//! contract front end and to the IBC middleware running in the host.

use bech32::{FromBase32, ToBase32, Variant};
use cosmwasm_std::Addr;
use sha2::{Digest, Sha256};

use crate::error::ContractError;

/// ICS-20 application version mixed into the transfer escrow address preimage.
pub const ICS20_VERSION: &str = "ics20-1";

const ADDRESS_LEN: usize = 20;
const MAX_ADDRESS_LEN: usize = 255;

/// Validates a bech32 account address and returns it as an [`Addr`].
pub fn validate(prefix: &str, address: &str) -> Result<Addr, ContractError> {
    if address.trim().is_empty() {
        return Err(ContractError::invalid_address("empty address string is not allowed"));
    }
    let (hrp, data, variant) =
        bech32::decode(address).map_err(|e| ContractError::invalid_address(e))?;
    if variant != Variant::Bech32 {
        return Err(ContractError::invalid_address("expected bech32, got bech32m"));
    }
    if hrp != prefix {
        return Err(ContractError::invalid_address(format!(
            "invalid Bech32 prefix; expected {prefix}, got {hrp}"
        )));
    }
    let raw = Vec::<u8>::from_base32(&data).map_err(|e| ContractError::invalid_address(e))?;
    if raw.is_empty() || raw.len() > MAX_ADDRESS_LEN {
        return Err(ContractError::invalid_address(format!(
            "address length {} out of range",
            raw.len()
        )));
    }
    Ok(Addr::unchecked(address))
}

/// Encodes raw address bytes with the given prefix.
pub fn encode(prefix: &str, raw: &[u8]) -> Result<Addr, ContractError> {
    bech32::encode(prefix, raw.to_base32(), Variant::Bech32)
        .map(Addr::unchecked)
        .map_err(|e| ContractError::internal(format!("bech32 encode: {e}")))
}

/// Address of a module account: the first 20 bytes of `sha256(name)`.
pub fn module_address(prefix: &str, module_name: &str) -> Result<Addr, ContractError> {
    let hash = Sha256::digest(module_name.as_bytes());
    encode(prefix, &hash[..ADDRESS_LEN])
}

/// Address holding ICS-20 escrowed funds for a local port/channel pair.
pub fn transfer_escrow_address(
    prefix: &str,
    port_id: &str,
    channel_id: &str,
) -> Result<Addr, ContractError> {
    let mut hasher = Sha256::new();
    hasher.update(ICS20_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(format!("{port_id}/{channel_id}").as_bytes());
    let hash = hasher.finalize();
    encode(prefix, &hash[..ADDRESS_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_roundtrips_encoded_address() {
        let addr = module_address("maany", "mintburn").unwrap();
        assert!(addr.as_str().starts_with("maany1"));
        assert_eq!(validate("maany", addr.as_str()).unwrap(), addr);
    }

    #[test]
    fn validate_rejects_wrong_prefix() {
        let addr = module_address("cosmos", "mintburn").unwrap();
        let err = validate("maany", addr.as_str()).unwrap_err();
        assert!(matches!(err, ContractError::InvalidAddress { .. }));
    }

    #[test]
    fn validate_rejects_garbage() {
        assert!(validate("maany", "").is_err());
        assert!(validate("maany", "not-an-address").is_err());
        assert!(validate("maany", "maany1qqqqqqqq").is_err());
    }

    #[test]
    fn escrow_address_depends_on_channel() {
        let a = transfer_escrow_address("maany", "transfer", "channel-0").unwrap();
        let b = transfer_escrow_address("maany", "transfer", "channel-1").unwrap();
        assert_ne!(a, b);
        assert_eq!(
            a,
            transfer_escrow_address("maany", "transfer", "channel-0").unwrap()
        );
    }
}
