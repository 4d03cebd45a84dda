use cosmwasm_std::{
    ensure, Addr, Decimal, DepsMut, Env, Event, MessageInfo, Order, Response, StdError, StdResult,
    Storage, Timestamp, Uint128,
};
use cw_ownable::assert_owner;
use greenhouse_interface::wager::{Config, ConfigUpdate};
use itertools::Itertools as _;

use crate::{
    state::{
        leaderboard_cmp, wagers, Ledger, Plant, Wager, ACTIVE_WAGERS, CONFIG, LEDGERS,
        LEDGER_COUNT, PLANTS, PLANT_COUNT, WAGER_COUNT,
    },
    ContractError,
};

const SECONDS_PER_DAY: u64 = 86_400;

/// Day windows for the payout tiers; only the multipliers are configurable.
/// The 1-day jackpot slack absorbs timezone rounding on the host side.
const JACKPOT_WINDOW_DAYS: u64 = 1;
const CLOSE_WINDOW_DAYS: u64 = 3;
const NEAR_WINDOW_DAYS: u64 = 7;

pub fn register_plant(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    name: String,
    species: String,
    acquired_at: Option<Timestamp>,
) -> Result<Response, ContractError> {
    ensure!(
        !name.trim().is_empty() && !species.trim().is_empty(),
        ContractError::StdError(StdError::generic_err("Name and species cannot be empty"))
    );

    let acquired_at = acquired_at.unwrap_or(env.block.time);
    ensure!(
        acquired_at <= env.block.time,
        ContractError::StdError(StdError::generic_err(
            "Acquisition date cannot be in the future"
        ))
    );

    let plant_id = PLANT_COUNT.update(deps.storage, |x| -> StdResult<_> {
        Ok(x.checked_add(Uint128::one())?)
    })?;

    PLANTS.save(
        deps.storage,
        plant_id.u128(),
        &Plant {
            owner: info.sender.clone(),
            name,
            species,
            acquired_at,
            death_date: None,
            is_active: true,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "register_plant")
        .add_attribute("id", plant_id)
        .add_attribute("owner", info.sender))
}

pub fn place_wager(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    plant_id: Uint128,
    predicted_death_date: Timestamp,
    stake: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let plant = PLANTS.load(deps.storage, plant_id.u128())?;

    ensure!(plant.is_active, ContractError::PlantInactive {});
    ensure!(
        plant.owner != info.sender,
        ContractError::CannotWagerOwnPlant {}
    );
    ensure!(
        stake >= config.min_bet && stake <= config.max_bet,
        ContractError::InvalidStakeRange {
            stake,
            min: config.min_bet,
            max: config.max_bet,
        }
    );
    ensure!(
        predicted_death_date > env.block.time,
        ContractError::InvalidPredictionDate {}
    );
    ensure!(
        !ACTIVE_WAGERS.has(deps.storage, (&info.sender, plant_id.u128())),
        ContractError::DuplicateActiveWager {}
    );

    let mut ledger = ensure_ledger(deps.storage, &info.sender, &config)?;
    ensure!(
        stake <= ledger.balance,
        ContractError::InsufficientBalance {
            stake,
            balance: ledger.balance,
        }
    );

    // The debit and the wager row commit together or not at all
    ledger.balance = ledger.balance.checked_sub(stake)?;
    LEDGERS.save(deps.storage, &info.sender, &ledger)?;

    let wager_id = WAGER_COUNT.update(deps.storage, |x| -> StdResult<_> {
        Ok(x.checked_add(Uint128::one())?)
    })?;

    wagers().save(
        deps.storage,
        wager_id.u128(),
        &Wager {
            staker: info.sender.clone(),
            plant_id,
            predicted_death_date,
            stake,
            placed_at: env.block.time,
            is_resolved: false,
            won: None,
            points_won: None,
        },
    )?;
    ACTIVE_WAGERS.save(deps.storage, (&info.sender, plant_id.u128()), &wager_id)?;

    let rank_events = recompute_ranks(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "place_wager")
        .add_attribute("id", wager_id)
        .add_attribute("plant_id", plant_id)
        .add_attribute("staker", info.sender)
        .add_attribute("stake", stake)
        .add_events(rank_events))
}

pub fn declare_death(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    plant_id: Uint128,
    death_date: Option<Timestamp>,
) -> Result<Response, ContractError> {
    let mut plant = PLANTS.load(deps.storage, plant_id.u128())?;

    ensure!(plant.owner == info.sender, ContractError::Unauthorized {});
    ensure!(plant.death_date.is_none(), ContractError::PlantAlreadyDead {});

    let death_date = death_date.unwrap_or(env.block.time);
    ensure!(
        death_date >= plant.acquired_at,
        ContractError::StdError(StdError::generic_err(
            "Death date cannot precede the acquisition date"
        ))
    );

    plant.death_date = Some(death_date);
    plant.is_active = false;
    PLANTS.save(deps.storage, plant_id.u128(), &plant)?;

    let config = CONFIG.load(deps.storage)?;
    let outcome = settle_plant(deps.storage, plant_id.u128(), death_date, &config)?;
    let rank_events = recompute_ranks(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "declare_death")
        .add_attribute("id", plant_id)
        .add_attribute("settled", outcome.settled.to_string())
        .add_attribute("winners", outcome.winners.to_string())
        .add_events(outcome.events)
        .add_events(rank_events))
}

pub fn settle_wagers(
    deps: DepsMut,
    info: MessageInfo,
    plant_id: Uint128,
) -> Result<Response, ContractError> {
    assert_owner(deps.storage, &info.sender)?;

    let plant = PLANTS.load(deps.storage, plant_id.u128())?;
    let death_date = plant.death_date.ok_or(ContractError::PlantNotDead {})?;

    let config = CONFIG.load(deps.storage)?;
    let outcome = settle_plant(deps.storage, plant_id.u128(), death_date, &config)?;
    let rank_events = recompute_ranks(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "settle_wagers")
        .add_attribute("id", plant_id)
        .add_attribute("settled", outcome.settled.to_string())
        .add_attribute("winners", outcome.winners.to_string())
        .add_events(outcome.events)
        .add_events(rank_events))
}

pub fn cancel_wager(
    deps: DepsMut,
    info: MessageInfo,
    wager_id: Uint128,
) -> Result<Response, ContractError> {
    assert_owner(deps.storage, &info.sender)?;

    let wager = wagers().load(deps.storage, wager_id.u128())?;
    ensure!(!wager.is_resolved, ContractError::WagerAlreadyResolved {});

    let mut ledger = LEDGERS.load(deps.storage, &wager.staker)?;
    ledger.apply_cancellation(wager.stake)?;
    LEDGERS.save(deps.storage, &wager.staker, &ledger)?;

    wagers().remove(deps.storage, wager_id.u128())?;
    ACTIVE_WAGERS.remove(deps.storage, (&wager.staker, wager.plant_id.u128()));

    let rank_events = recompute_ranks(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "cancel_wager")
        .add_attribute("id", wager_id)
        .add_attribute("staker", wager.staker)
        .add_attribute("refund", wager.stake)
        .add_events(rank_events))
}

pub fn recompute_ranks_batch(
    deps: DepsMut,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    assert_owner(deps.storage, &info.sender)?;

    let rank_events = recompute_ranks(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "recompute_ranks")
        .add_attribute("changed", rank_events.len().to_string())
        .add_events(rank_events))
}

pub fn update_config(
    deps: DepsMut,
    info: MessageInfo,
    update: ConfigUpdate,
) -> Result<Response, ContractError> {
    assert_owner(deps.storage, &info.sender)?;

    let mut config = CONFIG.load(deps.storage)?;
    config.apply(update);
    config.validate()?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_config"))
}

/// Idempotent ledger factory; seeds a new ledger with the configured
/// starting points and the next insertion sequence
pub(crate) fn ensure_ledger(
    storage: &mut dyn Storage,
    addr: &Addr,
    config: &Config,
) -> StdResult<Ledger> {
    if let Some(ledger) = LEDGERS.may_load(storage, addr)? {
        return Ok(ledger);
    }

    let seq = LEDGER_COUNT.update(storage, |x| -> StdResult<_> { Ok(x + 1) })?;
    let ledger = Ledger::new(config.starting_points, seq);
    LEDGERS.save(storage, addr, &ledger)?;

    Ok(ledger)
}

pub(crate) struct SettlementOutcome {
    pub settled: u32,
    pub winners: u32,
    pub events: Vec<Event>,
}

/// Settles every unresolved wager on a plant against an explicit death date.
/// Already-resolved wagers are skipped, so re-running for the same plant is
/// a no-op once the batch has drained.
fn settle_plant(
    storage: &mut dyn Storage,
    plant_id: u128,
    death_date: Timestamp,
    config: &Config,
) -> Result<SettlementOutcome, ContractError> {
    let wager_ids = wagers()
        .idx
        .plant
        .prefix(plant_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;

    let mut settled = 0u32;
    let mut winners = 0u32;
    let mut events = vec![];

    for wager_id in wager_ids {
        let mut wager = wagers().load(storage, wager_id)?;
        if wager.is_resolved {
            continue;
        }

        let days_diff = date_delta_days(wager.predicted_death_date, death_date);
        let multiplier = payout_multiplier(days_diff, config);
        let points_won = wager.stake.checked_mul_floor(multiplier)?;
        let won = !points_won.is_zero();

        // Each wager settles as its own unit of work; a corrupt ledger row
        // is reported and skipped rather than blocking the rest of the batch
        let outcome = LEDGERS
            .may_load(storage, &wager.staker)?
            .ok_or_else(|| StdError::not_found("ledger"))
            .and_then(|mut ledger| {
                ledger
                    .apply_outcome(won, points_won)
                    .map_err(StdError::overflow)?;
                Ok(ledger)
            });
        let ledger = match outcome {
            Ok(ledger) => ledger,
            Err(err) => {
                events.push(
                    Event::new("settlement_failed")
                        .add_attribute("wager_id", Uint128::new(wager_id))
                        .add_attribute("staker", wager.staker.as_str())
                        .add_attribute("error", err.to_string()),
                );
                continue;
            }
        };

        wager.is_resolved = true;
        wager.won = Some(won);
        wager.points_won = Some(points_won);
        wagers().save(storage, wager_id, &wager)?;
        LEDGERS.save(storage, &wager.staker, &ledger)?;
        ACTIVE_WAGERS.remove(storage, (&wager.staker, plant_id));

        settled += 1;
        if won {
            winners += 1;
        }

        events.push(
            Event::new("wager_settled")
                .add_attribute("wager_id", Uint128::new(wager_id))
                .add_attribute("staker", wager.staker.as_str())
                .add_attribute("won", won.to_string())
                .add_attribute("days_off", days_diff.to_string())
                .add_attribute("points_won", points_won),
        );
    }

    Ok(SettlementOutcome {
        settled,
        winners,
        events,
    })
}

/// Re-ranks every ledger: descending balance, stable on creation order,
/// dense 1..N. Only ledgers whose rank actually changed are persisted.
pub(crate) fn recompute_ranks(storage: &mut dyn Storage) -> StdResult<Vec<Event>> {
    let ledgers = LEDGERS
        .range(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;

    let mut events = vec![];
    for (position, (addr, mut ledger)) in ledgers
        .into_iter()
        .sorted_by(|(_, a), (_, b)| leaderboard_cmp(a, b))
        .enumerate()
    {
        let rank = position as u64 + 1;
        if ledger.rank != rank {
            let previous = ledger.rank;
            ledger.rank = rank;
            LEDGERS.save(storage, &addr, &ledger)?;

            events.push(
                Event::new("rank_changed")
                    .add_attribute("addr", addr.as_str())
                    .add_attribute("previous", previous.to_string())
                    .add_attribute("rank", rank.to_string()),
            );
        }
    }

    Ok(events)
}

/// Whole days since the epoch. Settlement compares calendar dates, not raw
/// timestamps, so a prediction an hour before midnight is not off by a day.
pub(crate) fn epoch_days(ts: Timestamp) -> u64 {
    ts.seconds() / SECONDS_PER_DAY
}

pub(crate) fn date_delta_days(predicted: Timestamp, actual: Timestamp) -> u64 {
    epoch_days(predicted).abs_diff(epoch_days(actual))
}

pub(crate) fn payout_multiplier(days_diff: u64, config: &Config) -> Decimal {
    if days_diff <= JACKPOT_WINDOW_DAYS {
        config.jackpot_multiplier
    } else if days_diff <= CLOSE_WINDOW_DAYS {
        config.close_multiplier
    } else if days_diff <= NEAR_WINDOW_DAYS {
        config.near_multiplier
    } else {
        Decimal::zero()
    }
}
