use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
    Uint128,
};
use cw2::{ensure_from_older_version, set_contract_version};
use greenhouse_interface::wager::{Config, ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};

use crate::{
    execute, query,
    state::{CONFIG, LEDGER_COUNT, PLANT_COUNT, WAGER_COUNT},
    ContractError,
};

pub(crate) const CONTRACT_NAME: &str = "crates.io:greenhouse-wager-module";
pub(crate) const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let mut config = Config::default();
    if let Some(update) = msg.config {
        config.apply(update);
    }
    config.validate()?;
    CONFIG.save(deps.storage, &config)?;

    PLANT_COUNT.save(deps.storage, &Uint128::zero())?;
    WAGER_COUNT.save(deps.storage, &Uint128::zero())?;
    LEDGER_COUNT.save(deps.storage, &0)?;

    let owner = deps.api.addr_validate(&msg.owner)?;
    let ownership = cw_ownable::initialize_owner(deps.storage, deps.api, Some(owner.as_str()))?;

    Ok(Response::new().add_attributes(ownership.into_attributes()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::UpdateOwnership(action) => {
            let ownership = cw_ownable::update_ownership(deps, &env.block, &info.sender, action)?;
            Ok(Response::new().add_attributes(ownership.into_attributes()))
        }
        ExecuteMsg::RegisterPlant {
            name,
            species,
            acquired_at,
        } => execute::register_plant(deps, env, info, name, species, acquired_at),
        ExecuteMsg::PlaceWager {
            plant_id,
            predicted_death_date,
            stake,
        } => execute::place_wager(deps, env, info, plant_id, predicted_death_date, stake),
        ExecuteMsg::DeclareDeath {
            plant_id,
            death_date,
        } => execute::declare_death(deps, env, info, plant_id, death_date),
        ExecuteMsg::SettleWagers { plant_id } => execute::settle_wagers(deps, info, plant_id),
        ExecuteMsg::CancelWager { wager_id } => execute::cancel_wager(deps, info, wager_id),
        ExecuteMsg::RecomputeRanks {} => execute::recompute_ranks_batch(deps, info),
        ExecuteMsg::UpdateConfig { config } => execute::update_config(deps, info, config),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query::config(deps)?),
        QueryMsg::Plant { plant_id } => to_json_binary(&query::plant(deps, plant_id)?),
        QueryMsg::Plants {
            start_after,
            limit,
            include_dead,
        } => to_json_binary(&query::plants(deps, start_after, limit, include_dead)?),
        QueryMsg::Wager { wager_id } => to_json_binary(&query::wager(deps, wager_id)?),
        QueryMsg::Wagers {
            start_after,
            limit,
            filter,
            unresolved_only,
        } => to_json_binary(&query::list_wagers(
            deps,
            start_after,
            limit,
            filter,
            unresolved_only,
        )?),
        QueryMsg::Ledger { addr } => to_json_binary(&query::ledger(deps, addr)?),
        QueryMsg::Ledgers { start_after, limit } => {
            to_json_binary(&query::ledgers(deps, start_after, limit)?)
        }
        QueryMsg::Leaderboard { limit } => to_json_binary(&query::leaderboard(deps, limit)?),
        QueryMsg::Ownership {} => to_json_binary(&cw_ownable::get_ownership(deps.storage)?),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, msg: MigrateMsg) -> Result<Response, ContractError> {
    let _version = ensure_from_older_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    match msg {
        MigrateMsg::FromCompatible {} => {}
    };

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::default())
}
