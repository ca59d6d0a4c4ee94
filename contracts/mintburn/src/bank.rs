use cosmwasm_std::{Addr, BankMsg, Coin, MessageInfo, StdError, StdResult};
use cw_utils::must_pay;

/// Funds custody service. Every transfer is all-or-nothing.
pub trait BankKeeper {
    fn send_coins(&mut self, from: &Addr, to: &Addr, amount: &Coin) -> StdResult<()>;

    fn module_address(&self, module_name: &str) -> StdResult<Addr>;
}

/// Custody backed by the contract's own account.
///
/// Deposits must arrive as the funds attached to the executing message and
/// withdrawals are queued as bank messages. They only take effect if the
/// whole call succeeds, which gives the atomicity the keeper relies on.
pub struct ContractBank {
    contract: Addr,
    info: MessageInfo,
    deposited: bool,
    messages: Vec<BankMsg>,
}

impl ContractBank {
    pub fn new(contract: Addr, info: MessageInfo) -> Self {
        ContractBank {
            contract,
            info,
            deposited: false,
            messages: vec![],
        }
    }

    pub fn into_messages(self) -> Vec<BankMsg> {
        self.messages
    }
}

impl BankKeeper for ContractBank {
    fn send_coins(&mut self, from: &Addr, to: &Addr, amount: &Coin) -> StdResult<()> {
        if *to == self.contract {
            if *from != self.info.sender {
                return Err(StdError::generic_err(format!(
                    "cannot deposit on behalf of {from}"
                )));
            }
            if self.deposited {
                return Err(StdError::generic_err("attached funds already consumed"));
            }
            let paid = must_pay(&self.info, &amount.denom)
                .map_err(|e| StdError::generic_err(e.to_string()))?;
            if paid != amount.amount {
                return Err(StdError::generic_err(format!(
                    "insufficient funds: attached {paid}{denom}, required {amount}",
                    denom = amount.denom
                )));
            }
            self.deposited = true;
            return Ok(());
        }
        if *from != self.contract {
            return Err(StdError::generic_err(format!(
                "contract custody cannot move funds held by {from}"
            )));
        }
        self.messages.push(BankMsg::Send {
            to_address: to.to_string(),
            amount: vec![amount.clone()],
        });
        Ok(())
    }

    fn module_address(&self, _module_name: &str) -> StdResult<Addr> {
        Ok(self.contract.clone())
    }
}
