#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response};
use cw2::set_contract_version;
use cw_utils::nonpayable;
use std::ops::ControlFlow;
use std::str::FromStr;

use crate::bank::ContractBank;
use crate::error::ContractError;
use crate::keeper::Keeper;
use crate::msg::{
    AllowedChannelsResponse, AuthorizedIcaResponse, EscrowProofResponse, EscrowResponse,
    EscrowsResponse, ExecuteMsg, InstantiateMsg, MsgCancelEscrow, MsgEscrowInitial,
    MsgEscrowInitialResponse, MsgMarkEscrowClaimed, QueryMsg,
};
use crate::proof::{self, ProofExport};
use crate::state::{
    EscrowStatus, ModuleConfig, ALLOWED_CHANNELS, AUTHORIZED_ICAS, CONFIG, ESCROWS,
};

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:mintburn";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_LIMIT: u32 = 30;
const MAX_LIMIT: u32 = 100;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    let config = msg.into_config();
    if config.bech32_prefix.is_empty() {
        return Err(ContractError::invalid_request("bech32_prefix is required"));
    }
    crate::msg::validate_denom(&config.base_denom)?;

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("base_denom", config.base_denom)
        .add_attribute("trusted_consumer_chain_id", config.trusted_consumer_chain_id))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    match msg {
        ExecuteMsg::EscrowInitial {
            consumer_chain_id,
            amount,
            recipient,
            expiry_height,
            expiry_time_unix,
        } => {
            let msg = MsgEscrowInitial {
                sender: info.sender.to_string(),
                consumer_chain_id,
                amount,
                recipient: recipient.unwrap_or_default(),
                expiry_height: expiry_height.unwrap_or_default(),
                expiry_time_unix: expiry_time_unix.unwrap_or_default(),
            };
            execute_escrow_initial(deps, env, info, config, msg)
        }
        ExecuteMsg::CancelEscrow {
            consumer_chain_id,
            denom,
        } => {
            let msg = MsgCancelEscrow {
                sender: info.sender.to_string(),
                consumer_chain_id,
                denom,
            };
            execute_cancel_escrow(deps, env, info, config, msg)
        }
        ExecuteMsg::MarkEscrowClaimed {
            escrow_id,
            consumer_chain_id,
        } => {
            let msg = MsgMarkEscrowClaimed {
                sender: info.sender.to_string(),
                escrow_id,
                consumer_chain_id,
            };
            execute_mark_escrow_claimed(deps, env, info, config, msg)
        }
    }
}

pub fn execute_escrow_initial(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    config: ModuleConfig,
    msg: MsgEscrowInitial,
) -> Result<Response, ContractError> {
    msg.validate_basic(&config.bech32_prefix)?;

    let mut keeper = Keeper::new(config, ContractBank::new(env.contract.address, info));
    let escrow_id = keeper.escrow_initial(deps.storage, &msg)?;

    Ok(Response::new()
        .add_messages(keeper.into_bank().into_messages())
        .set_data(to_json_binary(&MsgEscrowInitialResponse {
            escrow_id: escrow_id.clone(),
        })?)
        .add_attribute("method", "escrow_initial")
        .add_attribute("escrow_id", escrow_id)
        .add_attribute("consumer_chain_id", msg.consumer_chain_id)
        .add_attribute("amount", msg.amount.to_string()))
}

pub fn execute_cancel_escrow(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    config: ModuleConfig,
    msg: MsgCancelEscrow,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;
    msg.validate_basic(&config.bech32_prefix)?;

    let mut keeper = Keeper::new(config, ContractBank::new(env.contract.address, info));
    let escrow = keeper.cancel_escrow(deps.storage, &msg)?;

    Ok(Response::new()
        .add_messages(keeper.into_bank().into_messages())
        .add_attribute("method", "cancel_escrow")
        .add_attribute("escrow_id", escrow.escrow_id)
        .add_attribute("consumer_chain_id", escrow.consumer_chain_id)
        .add_attribute("amount", escrow.amount.to_string()))
}

pub fn execute_mark_escrow_claimed(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    config: ModuleConfig,
    msg: MsgMarkEscrowClaimed,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;
    msg.validate_basic(&config.bech32_prefix)?;

    let mut keeper = Keeper::new(config, ContractBank::new(env.contract.address, info));
    let escrow = keeper.mark_escrow_claimed(deps.storage, &msg)?;

    Ok(Response::new()
        .add_attribute("method", "mark_escrow_claimed")
        .add_attribute("escrow_id", escrow.escrow_id)
        .add_attribute("consumer_chain_id", msg.consumer_chain_id)
        .add_attribute("amount", escrow.amount.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    let bin = match msg {
        QueryMsg::Escrow {
            consumer_chain_id,
            denom,
        } => to_json_binary(&query_escrow(deps, consumer_chain_id, denom)?)?,
        QueryMsg::EscrowById { escrow_id } => to_json_binary(&EscrowResponse {
            escrow: ESCROWS.by_id(deps.storage, &escrow_id)?,
        })?,
        QueryMsg::Escrows {
            status_filter,
            start_after,
            limit,
        } => to_json_binary(&query_escrows(deps, status_filter, start_after, limit)?)?,
        QueryMsg::EscrowProof {
            consumer_chain_id,
            denom,
            height,
            prove,
        } => to_json_binary(&query_escrow_proof(
            deps,
            env,
            consumer_chain_id,
            denom,
            height,
            prove,
        )?)?,
        QueryMsg::AuthorizedIca { consumer_chain_id } => to_json_binary(&AuthorizedIcaResponse {
            ica_address: AUTHORIZED_ICAS.get(deps.storage, &consumer_chain_id)?,
        })?,
        QueryMsg::AllowedChannels {} => to_json_binary(&AllowedChannelsResponse {
            channels: ALLOWED_CHANNELS.list(deps.storage)?,
        })?,
        QueryMsg::Config {} => to_json_binary(&CONFIG.load(deps.storage)?)?,
    };
    Ok(bin)
}

fn query_escrow(
    deps: Deps,
    consumer_chain_id: String,
    denom: String,
) -> Result<EscrowResponse, ContractError> {
    crate::msg::require_non_blank(&consumer_chain_id, "consumer_chain_id")?;
    crate::msg::require_non_blank(&denom, "denom")?;
    Ok(EscrowResponse {
        escrow: ESCROWS.by_route(deps.storage, &consumer_chain_id, &denom)?,
    })
}

fn query_escrows(
    deps: Deps,
    status_filter: Option<String>,
    start_after: Option<String>,
    limit: Option<u32>,
) -> Result<EscrowsResponse, ContractError> {
    let status = status_filter
        .filter(|s| !s.is_empty())
        .map(|s| EscrowStatus::from_str(&s))
        .transpose()?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;

    let mut escrows = vec![];
    if limit == 0 {
        return Ok(EscrowsResponse { escrows });
    }
    ESCROWS.iterate(deps.storage, start_after.as_deref(), |escrow| {
        if status.as_ref().map_or(true, |s| *s == escrow.status) {
            escrows.push(escrow);
        }
        if escrows.len() >= limit {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;
    Ok(EscrowsResponse { escrows })
}

fn query_escrow_proof(
    deps: Deps,
    env: Env,
    consumer_chain_id: String,
    denom: String,
    height: Option<u64>,
    prove: Option<bool>,
) -> Result<EscrowProofResponse, ContractError> {
    if prove.unwrap_or(false) {
        return Err(ContractError::Unimplemented {
            what: "membership proofs are fetched with a raw store query at key_path".to_string(),
        });
    }
    let config = CONFIG.load(deps.storage)?;
    let export = proof::describe(
        deps.storage,
        &config,
        &consumer_chain_id,
        &denom,
        height.unwrap_or_default(),
        env.block.height,
    )?;
    match export {
        ProofExport::CurrentHeight(proof) => Ok(EscrowProofResponse {
            height: proof.height,
            value: Binary::from(proof.value),
            key_path: proof.key_path,
            escrow_id: proof.escrow_id,
            amount_denom: proof.amount.denom,
            amount_value: proof.amount.amount.to_string(),
        }),
        ProofExport::Rejected { requested, current } => Err(ContractError::invalid_request(
            format!("proof height {requested} does not match current height {current}"),
        )),
    }
}
