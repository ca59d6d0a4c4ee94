//! Escrow lifecycle.
//!
//! ```text
//! (none) --initiate--> PENDING --cancel--> CANCELED
//!                      PENDING --mark claimed--> CLAIMED
//! ```
//!
//! CLAIMED and CANCELED are terminal. Operations on one route must be
//! applied in delivery order; the keeper adds no locking of its own.

use cosmwasm_std::{Addr, Coin, StdResult, Storage};

use crate::address;
use crate::bank::BankKeeper;
use crate::error::ContractError;
use crate::msg::{validate_amount, MsgCancelEscrow, MsgEscrowInitial, MsgMarkEscrowClaimed};
use crate::state::{Escrow, EscrowStatus, ModuleConfig, ALLOWED_CHANNELS, DEPOSITORS, ESCROWS};

pub struct Keeper<B> {
    config: ModuleConfig,
    bank: B,
}

impl<B: BankKeeper> Keeper<B> {
    pub fn new(config: ModuleConfig, bank: B) -> Self {
        Keeper { config, bank }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn into_bank(self) -> B {
        self.bank
    }

    /// Custody account holding every pending escrow's funds.
    pub fn module_address(&self) -> StdResult<Addr> {
        self.bank.module_address(&self.config.module_name)
    }

    /// Locks `msg.amount` in module custody and records a PENDING escrow.
    /// Returns the new escrow id.
    pub fn escrow_initial(
        &mut self,
        storage: &mut dyn Storage,
        msg: &MsgEscrowInitial,
    ) -> Result<String, ContractError> {
        validate_amount(&msg.amount)?;
        let sender = address::validate(&self.config.bech32_prefix, &msg.sender)?;

        let custody = self.module_address()?;
        self.bank.send_coins(&sender, &custody, &msg.amount)?;

        let escrow = Escrow {
            escrow_id: ESCROWS.next_id(storage)?,
            consumer_chain_id: msg.consumer_chain_id.clone(),
            amount: msg.amount.clone(),
            recipient: msg.recipient.clone(),
            expiry_height: msg.expiry_height,
            expiry_time_unix: msg.expiry_time_unix,
            status: EscrowStatus::Pending,
        };
        ESCROWS.put(storage, &escrow);
        DEPOSITORS.save(storage, escrow.escrow_id.as_str(), &sender)?;

        tracing::info!(
            escrow_id = %escrow.escrow_id,
            consumer_chain_id = %escrow.consumer_chain_id,
            amount = %escrow.amount,
            sender = %sender,
            "escrow initiated"
        );
        Ok(escrow.escrow_id)
    }

    /// Refunds the pending escrow on `(consumer_chain_id, denom)` to its
    /// depositor. A missing escrow, one that already left PENDING and one
    /// funded by another account are rejected alike.
    pub fn cancel_escrow(
        &mut self,
        storage: &mut dyn Storage,
        msg: &MsgCancelEscrow,
    ) -> Result<Escrow, ContractError> {
        let to = address::validate(&self.config.bech32_prefix, &msg.sender)?;
        let not_found = || {
            ContractError::not_found(format!(
                "pending escrow for consumer_chain_id={} denom={}",
                msg.consumer_chain_id, msg.denom
            ))
        };

        let mut escrow = ESCROWS
            .by_route(storage, &msg.consumer_chain_id, &msg.denom)?
            .filter(|e| e.status == EscrowStatus::Pending)
            .ok_or_else(not_found)?;
        if DEPOSITORS.may_load(storage, escrow.escrow_id.as_str())?.as_ref() != Some(&to) {
            return Err(not_found());
        }

        let custody = self.module_address()?;
        self.bank.send_coins(&custody, &to, &escrow.amount)?;

        escrow.status = EscrowStatus::Canceled;
        ESCROWS.put(storage, &escrow);

        tracing::info!(
            escrow_id = %escrow.escrow_id,
            consumer_chain_id = %escrow.consumer_chain_id,
            amount = %escrow.amount,
            refund_to = %to,
            "escrow canceled"
        );
        Ok(escrow)
    }

    /// Moves a pending escrow to CLAIMED. Funds are not touched: they left
    /// custody through the mint-authority flow before this is called.
    pub fn mark_escrow_claimed(
        &mut self,
        storage: &mut dyn Storage,
        msg: &MsgMarkEscrowClaimed,
    ) -> Result<Escrow, ContractError> {
        let mut escrow = ESCROWS
            .by_id(storage, &msg.escrow_id)?
            .ok_or_else(|| ContractError::not_found(format!("escrow {}", msg.escrow_id)))?;
        if escrow.status != EscrowStatus::Pending {
            return Err(ContractError::Unauthorized {});
        }

        escrow.status = EscrowStatus::Claimed;
        ESCROWS.put(storage, &escrow);

        tracing::info!(
            escrow_id = %escrow.escrow_id,
            consumer_chain_id = %msg.consumer_chain_id,
            "escrow marked claimed"
        );
        Ok(escrow)
    }

    /// Moves funds locked in an ICS-20 escrow account straight to `to`.
    pub fn send_from_escrow_to_account(
        &mut self,
        escrow: &Addr,
        to: &Addr,
        amount: &Coin,
    ) -> StdResult<()> {
        self.bank.send_coins(escrow, to, amount)
    }

    pub fn is_allowed_channel(&self, storage: &dyn Storage, channel_id: &str) -> bool {
        ALLOWED_CHANNELS.contains(storage, channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account, MockBank};
    use cosmwasm_std::coin;
    use cosmwasm_std::testing::MockStorage;

    const DENOM: &str = "umaany";

    fn setup() -> (MockStorage, Keeper<MockBank>, Addr) {
        let config = ModuleConfig::default();
        let alice = account("alice");
        let mut bank = MockBank::new(&config.bech32_prefix);
        bank.set_balance(&alice, coin(1_000, DENOM));
        (MockStorage::new(), Keeper::new(config, bank), alice)
    }

    fn initial(sender: &Addr, amount: u128) -> MsgEscrowInitial {
        MsgEscrowInitial {
            sender: sender.to_string(),
            consumer_chain_id: "dex-1".to_string(),
            amount: coin(amount, DENOM),
            recipient: String::new(),
            expiry_height: 0,
            expiry_time_unix: 0,
        }
    }

    fn cancel(sender: &Addr) -> MsgCancelEscrow {
        MsgCancelEscrow {
            sender: sender.to_string(),
            consumer_chain_id: "dex-1".to_string(),
            denom: DENOM.to_string(),
        }
    }

    fn claim(escrow_id: &str) -> MsgMarkEscrowClaimed {
        MsgMarkEscrowClaimed {
            sender: account("relayer").to_string(),
            escrow_id: escrow_id.to_string(),
            consumer_chain_id: "dex-1".to_string(),
        }
    }

    #[test]
    fn initiate_locks_funds_and_records_pending() {
        let (mut storage, mut keeper, alice) = setup();
        let custody = keeper.module_address().unwrap();

        let id = keeper.escrow_initial(&mut storage, &initial(&alice, 100)).unwrap();
        assert_eq!(id, "1");

        let escrow = ESCROWS.by_route(&storage, "dex-1", DENOM).unwrap().unwrap();
        assert_eq!(escrow.status, EscrowStatus::Pending);
        assert_eq!(escrow.amount, coin(100, DENOM));
        assert_eq!(keeper.bank().balance(&custody, DENOM).u128(), 100);
        assert_eq!(keeper.bank().balance(&alice, DENOM).u128(), 900);
    }

    #[test]
    fn initiate_failures_leave_no_trace() {
        let (mut storage, mut keeper, alice) = setup();

        let err = keeper
            .escrow_initial(&mut storage, &initial(&alice, 0))
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidCoins { .. }));

        let mut msg = initial(&alice, 10);
        msg.sender = "bogus".to_string();
        let err = keeper.escrow_initial(&mut storage, &msg).unwrap_err();
        assert!(matches!(err, ContractError::InvalidAddress { .. }));

        // bank failure propagates unchanged
        let err = keeper
            .escrow_initial(&mut storage, &initial(&alice, 5_000))
            .unwrap_err();
        assert!(matches!(err, ContractError::Std(_)));
        assert!(err.to_string().contains("insufficient funds"));

        assert!(ESCROWS.by_route(&storage, "dex-1", DENOM).unwrap().is_none());
        assert_eq!(ESCROWS.next_id(&mut storage).unwrap(), "1");
        assert_eq!(keeper.bank().balance(&alice, DENOM).u128(), 1_000);
    }

    #[test]
    fn cancel_refunds_sender_once() {
        let (mut storage, mut keeper, alice) = setup();
        let custody = keeper.module_address().unwrap();
        keeper.escrow_initial(&mut storage, &initial(&alice, 100)).unwrap();

        let canceled = keeper.cancel_escrow(&mut storage, &cancel(&alice)).unwrap();
        assert_eq!(canceled.status, EscrowStatus::Canceled);
        assert_eq!(keeper.bank().balance(&alice, DENOM).u128(), 1_000);
        assert_eq!(keeper.bank().balance(&custody, DENOM).u128(), 0);

        let err = keeper.cancel_escrow(&mut storage, &cancel(&alice)).unwrap_err();
        assert!(matches!(err, ContractError::NotFound { .. }));
        assert_eq!(keeper.bank().balance(&alice, DENOM).u128(), 1_000);
    }

    #[test]
    fn cancel_only_by_depositor() {
        let (mut storage, mut keeper, alice) = setup();
        let mallory = account("mallory");
        let custody = keeper.module_address().unwrap();
        let id = keeper.escrow_initial(&mut storage, &initial(&alice, 100)).unwrap();
        assert_eq!(DEPOSITORS.load(&storage, id.as_str()).unwrap(), alice);

        let err = keeper.cancel_escrow(&mut storage, &cancel(&mallory)).unwrap_err();
        assert!(matches!(err, ContractError::NotFound { .. }));
        assert_eq!(keeper.bank().balance(&mallory, DENOM).u128(), 0);
        assert_eq!(keeper.bank().balance(&custody, DENOM).u128(), 100);
        let escrow = ESCROWS.by_id(&storage, &id).unwrap().unwrap();
        assert_eq!(escrow.status, EscrowStatus::Pending);

        keeper.cancel_escrow(&mut storage, &cancel(&alice)).unwrap();
        assert_eq!(keeper.bank().balance(&alice, DENOM).u128(), 1_000);
    }

    #[test]
    fn cancel_rejects_claimed_and_missing() {
        let (mut storage, mut keeper, alice) = setup();
        let custody = keeper.module_address().unwrap();

        let err = keeper.cancel_escrow(&mut storage, &cancel(&alice)).unwrap_err();
        assert!(matches!(err, ContractError::NotFound { .. }));

        let id = keeper.escrow_initial(&mut storage, &initial(&alice, 100)).unwrap();
        keeper.mark_escrow_claimed(&mut storage, &claim(&id)).unwrap();
        let before = ESCROWS.by_id(&storage, &id).unwrap();

        let err = keeper.cancel_escrow(&mut storage, &cancel(&alice)).unwrap_err();
        assert!(matches!(err, ContractError::NotFound { .. }));
        assert_eq!(ESCROWS.by_id(&storage, &id).unwrap(), before);
        assert_eq!(keeper.bank().balance(&custody, DENOM).u128(), 100);
    }

    #[test]
    fn mark_claimed_only_from_pending() {
        let (mut storage, mut keeper, alice) = setup();
        let id = keeper.escrow_initial(&mut storage, &initial(&alice, 100)).unwrap();
        assert_eq!(id, "1");

        let routed = ESCROWS.by_route(&storage, "dex-1", DENOM).unwrap().unwrap();
        assert_eq!(routed.status, EscrowStatus::Pending);
        assert_eq!(routed.amount, coin(100, DENOM));

        let claimed = keeper.mark_escrow_claimed(&mut storage, &claim("1")).unwrap();
        assert_eq!(claimed.status, EscrowStatus::Claimed);

        let err = keeper.mark_escrow_claimed(&mut storage, &claim("1")).unwrap_err();
        assert_eq!(err, ContractError::Unauthorized {});

        let err = keeper.mark_escrow_claimed(&mut storage, &claim("2")).unwrap_err();
        assert!(matches!(err, ContractError::NotFound { .. }));
    }

    #[test]
    fn mark_claimed_rejects_canceled() {
        let (mut storage, mut keeper, alice) = setup();
        let id = keeper.escrow_initial(&mut storage, &initial(&alice, 100)).unwrap();
        keeper.cancel_escrow(&mut storage, &cancel(&alice)).unwrap();
        let err = keeper.mark_escrow_claimed(&mut storage, &claim(&id)).unwrap_err();
        assert_eq!(err, ContractError::Unauthorized {});
    }

    #[test]
    fn second_escrow_on_route_supersedes_index() {
        let (mut storage, mut keeper, alice) = setup();
        let first = keeper.escrow_initial(&mut storage, &initial(&alice, 100)).unwrap();
        let second = keeper.escrow_initial(&mut storage, &initial(&alice, 200)).unwrap();
        assert_eq!((first.as_str(), second.as_str()), ("1", "2"));

        let routed = ESCROWS.by_route(&storage, "dex-1", DENOM).unwrap().unwrap();
        assert_eq!(routed.escrow_id, "2");
        let original = ESCROWS.by_id(&storage, "1").unwrap().unwrap();
        assert_eq!(original.amount, coin(100, DENOM));
        assert_eq!(original.status, EscrowStatus::Pending);
    }

    #[test]
    fn release_moves_escrowed_funds() {
        let (_, mut keeper, alice) = setup();
        let escrow = account("ics20-escrow");
        keeper.bank.set_balance(&escrow, coin(50, DENOM));
        keeper
            .send_from_escrow_to_account(&escrow, &alice, &coin(20, DENOM))
            .unwrap();
        assert_eq!(keeper.bank().balance(&escrow, DENOM).u128(), 30);
        assert_eq!(keeper.bank().balance(&alice, DENOM).u128(), 1_020);
        assert!(keeper
            .send_from_escrow_to_account(&escrow, &alice, &coin(31, DENOM))
            .is_err());
    }
}
