use std::cmp::Ordering;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, OverflowError, Timestamp, Uint128};
use cw_storage_plus::{Index, IndexList, IndexedMap, Item, Map, MultiIndex};
use greenhouse_interface::wager::{Config, LedgerResponse, PlantResponse, WagerResponse};

pub const CONFIG: Item<Config> = Item::new("config");

pub const PLANT_COUNT: Item<Uint128> = Item::new("plant_count");
pub const WAGER_COUNT: Item<Uint128> = Item::new("wager_count");
pub const LEDGER_COUNT: Item<u64> = Item::new("ledger_count");

pub const PLANTS: Map<u128, Plant> = Map::new("plants");
pub const LEDGERS: Map<&Addr, Ledger> = Map::new("ledgers");

/// Maps (staker, plant id) to the staker's unresolved wager on that plant,
/// enforcing one outstanding wager per user per plant
pub const ACTIVE_WAGERS: Map<(&Addr, u128), Uint128> = Map::new("active_wagers");

#[cw_serde]
pub struct Plant {
    pub owner: Addr,
    pub name: String,
    pub species: String,
    pub acquired_at: Timestamp,
    /// Set at most once; the plant is permanently inactive afterwards
    pub death_date: Option<Timestamp>,
    pub is_active: bool,
}

impl Plant {
    pub fn into_response(self, plant_id: Uint128) -> PlantResponse {
        PlantResponse {
            plant_id,
            owner: self.owner,
            name: self.name,
            species: self.species,
            acquired_at: self.acquired_at,
            death_date: self.death_date,
            is_active: self.is_active,
        }
    }
}

#[cw_serde]
pub struct Wager {
    pub staker: Addr,
    pub plant_id: Uint128,
    pub predicted_death_date: Timestamp,
    pub stake: Uint128,
    pub placed_at: Timestamp,
    /// Monotonic; `won` and `points_won` are written exactly once, when this
    /// flips to true
    pub is_resolved: bool,
    pub won: Option<bool>,
    pub points_won: Option<Uint128>,
}

impl Wager {
    pub fn into_response(self, wager_id: Uint128) -> WagerResponse {
        WagerResponse {
            wager_id,
            staker: self.staker,
            plant_id: self.plant_id,
            predicted_death_date: self.predicted_death_date,
            stake: self.stake,
            placed_at: self.placed_at,
            is_resolved: self.is_resolved,
            won: self.won,
            points_won: self.points_won,
        }
    }
}

pub struct WagerIndexes<'a> {
    pub plant: MultiIndex<'a, u128, Wager, u128>,
    pub staker: MultiIndex<'a, String, Wager, u128>,
}

impl IndexList<Wager> for WagerIndexes<'_> {
    fn get_indexes(&'_ self) -> Box<dyn Iterator<Item = &'_ dyn Index<Wager>> + '_> {
        let v: Vec<&dyn Index<Wager>> = vec![&self.plant, &self.staker];
        Box::new(v.into_iter())
    }
}

pub fn wagers<'a>() -> IndexedMap<'a, u128, Wager, WagerIndexes<'a>> {
    let indexes = WagerIndexes {
        plant: MultiIndex::new(|_pk, w| w.plant_id.u128(), "wagers", "wagers__plant"),
        staker: MultiIndex::new(|_pk, w| w.staker.to_string(), "wagers", "wagers__staker"),
    };
    IndexedMap::new("wagers", indexes)
}

#[cw_serde]
pub struct Ledger {
    /// A legal balance never goes negative; placement validation guarantees
    /// the debit is covered
    pub balance: Uint128,
    pub wins: u64,
    pub losses: u64,
    pub accuracy: Decimal,
    /// Dense 1-based position by descending balance; 0 until first ranked
    pub rank: u64,
    /// Creation order, the stable tie-break for equal balances
    pub seq: u64,
}

impl Ledger {
    pub fn new(starting_points: Uint128, seq: u64) -> Self {
        Self {
            balance: starting_points,
            wins: 0,
            losses: 0,
            accuracy: Decimal::zero(),
            rank: 0,
            seq,
        }
    }

    /// Applies a settled wager's outcome. The stake was already debited at
    /// placement, so losses only bump the counter.
    pub fn apply_outcome(&mut self, won: bool, points_won: Uint128) -> Result<(), OverflowError> {
        if won {
            self.balance = self.balance.checked_add(points_won)?;
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.recalculate_accuracy();

        Ok(())
    }

    /// Refunds the stake of an administratively cancelled wager without
    /// touching the win/loss record
    pub fn apply_cancellation(&mut self, refund: Uint128) -> Result<(), OverflowError> {
        self.balance = self.balance.checked_add(refund)?;

        Ok(())
    }

    fn recalculate_accuracy(&mut self) {
        let settled = self.wins + self.losses;
        self.accuracy = if settled == 0 {
            Decimal::zero()
        } else {
            Decimal::from_ratio(self.wins as u128 * 100, settled as u128)
        };
    }

    pub fn into_response(self, addr: Addr) -> LedgerResponse {
        LedgerResponse {
            addr,
            balance: self.balance,
            wins: self.wins,
            losses: self.losses,
            accuracy: self.accuracy,
            rank: self.rank,
        }
    }
}

/// Leaderboard ordering: descending balance, ties kept in creation order
pub fn leaderboard_cmp(a: &Ledger, b: &Ledger) -> Ordering {
    b.balance.cmp(&a.balance).then(a.seq.cmp(&b.seq))
}
