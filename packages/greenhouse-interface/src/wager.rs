use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Decimal, StdError, StdResult, Timestamp, Uint128};

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: String,
    /// Overrides for the default game settings
    pub config: Option<ConfigUpdate>,
}

/// Game settings, read once per operation and never mutated by the engine
#[cw_serde]
pub struct Config {
    pub min_bet: Uint128,
    pub max_bet: Uint128,
    /// Balance a ledger is seeded with on first use
    pub starting_points: Uint128,
    /// Payout for predictions within 1 day of the death date
    pub jackpot_multiplier: Decimal,
    /// Payout for predictions within 3 days
    pub close_multiplier: Decimal,
    /// Payout for predictions within 7 days
    pub near_multiplier: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_bet: Uint128::new(10),
            max_bet: Uint128::new(500),
            starting_points: Uint128::new(1000),
            jackpot_multiplier: Decimal::percent(500),
            close_multiplier: Decimal::percent(300),
            near_multiplier: Decimal::percent(150),
        }
    }
}

impl Config {
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(min_bet) = update.min_bet {
            self.min_bet = min_bet;
        }
        if let Some(max_bet) = update.max_bet {
            self.max_bet = max_bet;
        }
        if let Some(starting_points) = update.starting_points {
            self.starting_points = starting_points;
        }
        if let Some(jackpot_multiplier) = update.jackpot_multiplier {
            self.jackpot_multiplier = jackpot_multiplier;
        }
        if let Some(close_multiplier) = update.close_multiplier {
            self.close_multiplier = close_multiplier;
        }
        if let Some(near_multiplier) = update.near_multiplier {
            self.near_multiplier = near_multiplier;
        }
    }

    pub fn validate(&self) -> StdResult<()> {
        if self.min_bet.is_zero() {
            return Err(StdError::generic_err("Min bet cannot be zero"));
        }
        if self.min_bet > self.max_bet {
            return Err(StdError::generic_err("Min bet cannot exceed max bet"));
        }
        if self.jackpot_multiplier < self.close_multiplier
            || self.close_multiplier < self.near_multiplier
        {
            return Err(StdError::generic_err(
                "Payout multipliers must not increase as the prediction gets worse",
            ));
        }

        Ok(())
    }
}

#[cw_serde]
#[derive(Default)]
pub struct ConfigUpdate {
    pub min_bet: Option<Uint128>,
    pub max_bet: Option<Uint128>,
    pub starting_points: Option<Uint128>,
    pub jackpot_multiplier: Option<Decimal>,
    pub close_multiplier: Option<Decimal>,
    pub near_multiplier: Option<Decimal>,
}

#[cw_ownable::cw_ownable_execute]
#[cw_serde]
pub enum ExecuteMsg {
    RegisterPlant {
        name: String,
        species: String,
        /// Defaults to the block time
        acquired_at: Option<Timestamp>,
    },
    PlaceWager {
        plant_id: Uint128,
        predicted_death_date: Timestamp,
        stake: Uint128,
    },
    /// Mark a plant dead and settle its outstanding wagers
    /// Only callable by the plant's owner
    DeclareDeath {
        plant_id: Uint128,
        /// Defaults to the block time; immutable once set
        death_date: Option<Timestamp>,
    },
    /// Re-run settlement on an already-dead plant, sweeping wagers left
    /// unresolved by an isolated failure
    SettleWagers {
        plant_id: Uint128,
    },
    /// Cancel an unresolved wager and refund its stake
    CancelWager {
        wager_id: Uint128,
    },
    RecomputeRanks {},
    UpdateConfig {
        config: ConfigUpdate,
    },
}

#[cw_serde]
pub enum WagerFilter {
    Plant { plant_id: Uint128 },
    Staker { addr: String },
}

#[cw_ownable::cw_ownable_query]
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(PlantResponse)]
    Plant { plant_id: Uint128 },
    #[returns(Vec<PlantResponse>)]
    Plants {
        start_after: Option<Uint128>,
        limit: Option<u32>,
        include_dead: Option<bool>,
    },
    #[returns(WagerResponse)]
    Wager { wager_id: Uint128 },
    #[returns(Vec<WagerResponse>)]
    Wagers {
        start_after: Option<Uint128>,
        limit: Option<u32>,
        filter: Option<WagerFilter>,
        unresolved_only: Option<bool>,
    },
    #[returns(LedgerResponse)]
    Ledger { addr: String },
    #[returns(Vec<LedgerResponse>)]
    Ledgers {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Ledgers in rank order
    #[returns(Vec<LedgerResponse>)]
    Leaderboard { limit: Option<u32> },
}

#[cw_serde]
pub enum MigrateMsg {
    FromCompatible {},
}

#[cw_serde]
pub struct PlantResponse {
    pub plant_id: Uint128,
    pub owner: Addr,
    pub name: String,
    pub species: String,
    pub acquired_at: Timestamp,
    pub death_date: Option<Timestamp>,
    pub is_active: bool,
}

#[cw_serde]
pub struct WagerResponse {
    pub wager_id: Uint128,
    pub staker: Addr,
    pub plant_id: Uint128,
    pub predicted_death_date: Timestamp,
    pub stake: Uint128,
    pub placed_at: Timestamp,
    pub is_resolved: bool,
    pub won: Option<bool>,
    pub points_won: Option<Uint128>,
}

#[cw_serde]
pub struct LedgerResponse {
    pub addr: Addr,
    pub balance: Uint128,
    pub wins: u64,
    pub losses: u64,
    /// Settled-wager accuracy as a percentage
    pub accuracy: Decimal,
    /// Dense 1-based position by descending balance; 0 until first ranked
    pub rank: u64,
}
