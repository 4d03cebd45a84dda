use cosmwasm_std::{CheckedMultiplyFractionError, OverflowError, StdError, Uint128};
use cw_ownable::OwnershipError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    StdError(#[from] StdError),

    #[error("{0}")]
    OwnershipError(#[from] OwnershipError),

    #[error("{0}")]
    OverflowError(#[from] OverflowError),

    #[error("{0}")]
    CheckedMultiplyFractionError(#[from] CheckedMultiplyFractionError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Stake {stake} is outside the allowed range [{min}, {max}]")]
    InvalidStakeRange {
        stake: Uint128,
        min: Uint128,
        max: Uint128,
    },

    #[error("Stake {stake} exceeds the available balance of {balance}")]
    InsufficientBalance { stake: Uint128, balance: Uint128 },

    #[error("Predicted death date must be in the future")]
    InvalidPredictionDate {},

    #[error("An unresolved wager on this plant already exists")]
    DuplicateActiveWager {},

    #[error("Plant is inactive")]
    PlantInactive {},

    #[error("Plant has already been declared dead")]
    PlantAlreadyDead {},

    #[error("Plant has no death date")]
    PlantNotDead {},

    #[error("Wager has already been resolved")]
    WagerAlreadyResolved {},

    #[error("Cannot wager on your own plant")]
    CannotWagerOwnPlant {},
}
