use cosmwasm_std::{Deps, Order, StdResult, Uint128};
use cw_storage_plus::Bound;
use cw_utils::maybe_addr;
use greenhouse_interface::wager::{
    Config, LedgerResponse, PlantResponse, WagerFilter, WagerResponse,
};
use itertools::Itertools as _;

use crate::state::{leaderboard_cmp, wagers, Ledger, Wager, CONFIG, LEDGERS, PLANTS};

const DEFAULT_LIMIT: u32 = 30;
const MAX_LIMIT: u32 = 100;

pub fn config(deps: Deps) -> StdResult<Config> {
    CONFIG.load(deps.storage)
}

pub fn plant(deps: Deps, plant_id: Uint128) -> StdResult<PlantResponse> {
    Ok(PLANTS
        .load(deps.storage, plant_id.u128())?
        .into_response(plant_id))
}

pub fn plants(
    deps: Deps,
    start_after: Option<Uint128>,
    limit: Option<u32>,
    include_dead: Option<bool>,
) -> StdResult<Vec<PlantResponse>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let include_dead = include_dead.unwrap_or(false);
    let start = start_after.map(|x| Bound::exclusive(x.u128()));

    PLANTS
        .range(deps.storage, start, None, Order::Ascending)
        .filter(|item| match item {
            Ok((_, plant)) => include_dead || plant.is_active,
            Err(_) => true,
        })
        .take(limit)
        .map(|item| item.map(|(id, plant)| plant.into_response(Uint128::new(id))))
        .collect()
}

pub fn wager(deps: Deps, wager_id: Uint128) -> StdResult<WagerResponse> {
    Ok(wagers()
        .load(deps.storage, wager_id.u128())?
        .into_response(wager_id))
}

pub fn list_wagers(
    deps: Deps,
    start_after: Option<Uint128>,
    limit: Option<u32>,
    filter: Option<WagerFilter>,
    unresolved_only: Option<bool>,
) -> StdResult<Vec<WagerResponse>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let unresolved_only = unresolved_only.unwrap_or(false);
    let start = start_after.map(|x| Bound::exclusive(x.u128()));
    let keep = |item: &StdResult<(u128, Wager)>| match item {
        Ok((_, wager)) => !unresolved_only || !wager.is_resolved,
        Err(_) => true,
    };

    let items = match filter {
        Some(WagerFilter::Plant { plant_id }) => wagers()
            .idx
            .plant
            .prefix(plant_id.u128())
            .range(deps.storage, start, None, Order::Ascending)
            .filter(keep)
            .take(limit)
            .collect::<StdResult<Vec<_>>>()?,
        Some(WagerFilter::Staker { addr }) => {
            let addr = deps.api.addr_validate(&addr)?;
            wagers()
                .idx
                .staker
                .prefix(addr.to_string())
                .range(deps.storage, start, None, Order::Ascending)
                .filter(keep)
                .take(limit)
                .collect::<StdResult<Vec<_>>>()?
        }
        None => wagers()
            .range(deps.storage, start, None, Order::Ascending)
            .filter(keep)
            .take(limit)
            .collect::<StdResult<Vec<_>>>()?,
    };

    Ok(items
        .into_iter()
        .map(|(id, wager)| wager.into_response(Uint128::new(id)))
        .collect())
}

pub fn ledger(deps: Deps, addr: String) -> StdResult<LedgerResponse> {
    let addr = deps.api.addr_validate(&addr)?;
    let ledger = match LEDGERS.may_load(deps.storage, &addr)? {
        Some(ledger) => ledger,
        // Users who have never wagered read as an untouched starting ledger
        None => Ledger::new(CONFIG.load(deps.storage)?.starting_points, 0),
    };

    Ok(ledger.into_response(addr))
}

pub fn ledgers(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<Vec<LedgerResponse>> {
    let binding = maybe_addr(deps.api, start_after)?;
    let start = binding.as_ref().map(Bound::exclusive);

    cw_paginate::paginate_map(&LEDGERS, deps.storage, start, limit, |addr, ledger| {
        Ok(ledger.into_response(addr))
    })
}

pub fn leaderboard(deps: Deps, limit: Option<u32>) -> StdResult<Vec<LedgerResponse>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;

    Ok(LEDGERS
        .range(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?
        .into_iter()
        .sorted_by(|(_, a), (_, b)| leaderboard_cmp(a, b))
        .take(limit)
        .map(|(addr, ledger)| ledger.into_response(addr))
        .collect())
}
