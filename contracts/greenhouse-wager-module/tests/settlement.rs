use anyhow::Result;
use cosmwasm_std::{Addr, Decimal, Empty, Timestamp, Uint128};
use cw_multi_test::{App, AppResponse, Contract, ContractWrapper, Executor};
use greenhouse_interface::wager::{
    ExecuteMsg, InstantiateMsg, LedgerResponse, QueryMsg, WagerResponse,
};
use greenhouse_wager_module::{contract, ContractError};

const DAY: u64 = 86_400;

fn wager_module() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(
        contract::execute,
        contract::instantiate,
        contract::query,
    ))
}

fn setup() -> Result<(App, Addr, Addr)> {
    let mut app = App::default();
    app.update_block(|block| block.time = Timestamp::from_seconds(100 * DAY));

    let admin = app.api().addr_make("admin");
    let code_id = app.store_code(wager_module());
    let module = app.instantiate_contract(
        code_id,
        admin.clone(),
        &InstantiateMsg {
            owner: admin.to_string(),
            config: None,
        },
        &[],
        "Greenhouse Wager Module",
        None,
    )?;

    Ok((app, module, admin))
}

fn register_plant(app: &mut App, module: &Addr, owner: &Addr) -> Result<Uint128> {
    let res = app.execute_contract(
        owner.clone(),
        module.clone(),
        &ExecuteMsg::RegisterPlant {
            name: "Francine".to_string(),
            species: "Ficus lyrata".to_string(),
            acquired_at: None,
        },
        &[],
    )?;

    Ok(Uint128::new(event_attr(&res, "id").parse()?))
}

fn place(
    app: &mut App,
    module: &Addr,
    bettor: &Addr,
    plant_id: Uint128,
    predicted: Timestamp,
    stake: u128,
) -> Result<Uint128> {
    let res = app.execute_contract(
        bettor.clone(),
        module.clone(),
        &ExecuteMsg::PlaceWager {
            plant_id,
            predicted_death_date: predicted,
            stake: Uint128::new(stake),
        },
        &[],
    )?;

    Ok(Uint128::new(event_attr(&res, "id").parse()?))
}

fn event_attr(res: &AppResponse, key: &str) -> String {
    res.events
        .iter()
        .filter(|e| e.ty == "wasm")
        .flat_map(|e| &e.attributes)
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
        .unwrap_or_default()
}

fn query_ledger(app: &App, module: &Addr, addr: &Addr) -> Result<LedgerResponse> {
    Ok(app.wrap().query_wasm_smart(
        module,
        &QueryMsg::Ledger {
            addr: addr.to_string(),
        },
    )?)
}

fn query_wager(app: &App, module: &Addr, wager_id: Uint128) -> Result<WagerResponse> {
    Ok(app
        .wrap()
        .query_wasm_smart(module, &QueryMsg::Wager { wager_id })?)
}

#[test]
fn test_jackpot_within_one_day() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let wager_id = place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(110 * DAY),
        200,
    )?;

    // The plant dies one day off the prediction
    app.update_block(|block| block.time = Timestamp::from_seconds(111 * DAY));
    let res = app.execute_contract(
        admin,
        module.clone(),
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: None,
        },
        &[],
    )?;
    assert_eq!(event_attr(&res, "settled"), "1");
    assert_eq!(event_attr(&res, "winners"), "1");
    assert!(res
        .events
        .iter()
        .any(|e| e.ty == "wasm-wager_settled"
            && e.attributes
                .iter()
                .any(|a| a.key == "points_won" && a.value == "1000")));

    let wager = query_wager(&app, &module, wager_id)?;
    assert!(wager.is_resolved);
    assert_eq!(wager.won, Some(true));
    assert_eq!(wager.points_won, Some(Uint128::new(1000)));

    // 1000 - 200 stake + 200 * 5.0
    let ledger = query_ledger(&app, &module, &bettor)?;
    assert_eq!(ledger.balance, Uint128::new(1800));
    assert_eq!(ledger.wins, 1);
    assert_eq!(ledger.losses, 0);
    assert_eq!(ledger.accuracy, Decimal::percent(100));

    Ok(())
}

#[test]
fn test_loss_beyond_seven_days() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let wager_id = place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(101 * DAY),
        50,
    )?;

    // 19 days off the prediction
    app.update_block(|block| block.time = Timestamp::from_seconds(120 * DAY));
    app.execute_contract(
        admin,
        module.clone(),
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: None,
        },
        &[],
    )?;

    let wager = query_wager(&app, &module, wager_id)?;
    assert!(wager.is_resolved);
    assert_eq!(wager.won, Some(false));
    assert_eq!(wager.points_won, Some(Uint128::zero()));

    // The stake stays gone; only the loss counter moves
    let ledger = query_ledger(&app, &module, &bettor)?;
    assert_eq!(ledger.balance, Uint128::new(950));
    assert_eq!(ledger.wins, 0);
    assert_eq!(ledger.losses, 1);
    assert_eq!(ledger.accuracy, Decimal::zero());

    Ok(())
}

#[test]
fn test_payout_tiers_and_conservation() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let plant_id = register_plant(&mut app, &module, &admin)?;

    // One bettor per tier boundary: days off the death date and the points a
    // 100-point stake should earn
    let cases: [(u64, u128); 7] = [
        (110, 500),
        (111, 500),
        (112, 300),
        (113, 300),
        (114, 150),
        (117, 150),
        (118, 0),
    ];

    let bettors: Vec<Addr> = cases
        .iter()
        .map(|(day, _)| app.api().addr_make(&format!("bettor{}", day)))
        .collect();
    for (bettor, (day, _)) in bettors.iter().zip(cases.iter()) {
        place(
            &mut app,
            &module,
            bettor,
            plant_id,
            Timestamp::from_seconds(day * DAY),
            100,
        )?;
    }

    app.update_block(|block| block.time = Timestamp::from_seconds(110 * DAY));
    let res = app.execute_contract(
        admin,
        module.clone(),
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: None,
        },
        &[],
    )?;
    assert_eq!(event_attr(&res, "settled"), "7");
    assert_eq!(event_attr(&res, "winners"), "6");

    for (bettor, (_, points)) in bettors.iter().zip(cases.iter()) {
        let ledger = query_ledger(&app, &module, bettor)?;
        assert_eq!(ledger.balance, Uint128::new(900 + points));
    }

    // Batch conservation: total credits equal the winners' points
    let all: Vec<LedgerResponse> = app.wrap().query_wasm_smart(
        &module,
        &QueryMsg::Ledgers {
            start_after: None,
            limit: None,
        },
    )?;
    let total: u128 = all.iter().map(|l| l.balance.u128()).sum();
    let expected_points: u128 = cases.iter().map(|(_, points)| points).sum();
    assert_eq!(total, 7 * 900 + expected_points);

    Ok(())
}

#[test]
fn test_calendar_dates_not_timestamps() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    // Predicted 23:00, died 00:30 the next date: 90 minutes apart on the
    // clock, one day apart on the calendar, still inside the jackpot window
    place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(110 * DAY + 82_800),
        100,
    )?;

    app.update_block(|block| block.time = Timestamp::from_seconds(111 * DAY + 1_800));
    let res = app.execute_contract(
        admin,
        module.clone(),
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: None,
        },
        &[],
    )?;
    assert!(res
        .events
        .iter()
        .any(|e| e.ty == "wasm-wager_settled"
            && e.attributes
                .iter()
                .any(|a| a.key == "days_off" && a.value == "1")));

    let ledger = query_ledger(&app, &module, &bettor)?;
    assert_eq!(ledger.balance, Uint128::new(900 + 500));

    Ok(())
}

#[test]
fn test_explicit_death_date() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(110 * DAY),
        100,
    )?;

    // Settlement runs against the declared date, not the block time
    app.execute_contract(
        admin,
        module.clone(),
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: Some(Timestamp::from_seconds(115 * DAY)),
        },
        &[],
    )?;

    let ledger = query_ledger(&app, &module, &bettor)?;
    assert_eq!(ledger.balance, Uint128::new(900 + 150));

    Ok(())
}

#[test]
fn test_resolution_is_monotonic() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let wager_id = place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(110 * DAY),
        100,
    )?;

    app.update_block(|block| block.time = Timestamp::from_seconds(110 * DAY));
    app.execute_contract(
        admin.clone(),
        module.clone(),
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: None,
        },
        &[],
    )?;
    let settled = query_wager(&app, &module, wager_id)?;

    // A second sweep finds nothing unresolved and changes nothing
    let res = app.execute_contract(
        admin.clone(),
        module.clone(),
        &ExecuteMsg::SettleWagers { plant_id },
        &[],
    )?;
    assert_eq!(event_attr(&res, "settled"), "0");
    assert_eq!(query_wager(&app, &module, wager_id)?, settled);

    // The death date is immutable
    let err = app
        .execute_contract(
            admin,
            module,
            &ExecuteMsg::DeclareDeath {
                plant_id,
                death_date: Some(Timestamp::from_seconds(120 * DAY)),
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(
        err.downcast::<ContractError>()?,
        ContractError::PlantAlreadyDead {}
    );

    Ok(())
}

#[test]
fn test_settle_requires_death_date() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let err = app
        .execute_contract(admin, module, &ExecuteMsg::SettleWagers { plant_id }, &[])
        .unwrap_err();
    assert_eq!(
        err.downcast::<ContractError>()?,
        ContractError::PlantNotDead {}
    );

    Ok(())
}

#[test]
fn test_only_plant_owner_declares_death() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let err = app
        .execute_contract(
            bettor,
            module,
            &ExecuteMsg::DeclareDeath {
                plant_id,
                death_date: None,
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(
        err.downcast::<ContractError>()?,
        ContractError::Unauthorized {}
    );

    Ok(())
}

#[test]
fn test_death_cannot_precede_acquisition() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let result = app.execute_contract(
        admin,
        module,
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: Some(Timestamp::from_seconds(99 * DAY)),
        },
        &[],
    );
    assert!(result.is_err());

    Ok(())
}

#[test]
fn test_cancellation_refunds_stake() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let wager_id = place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(110 * DAY),
        200,
    )?;
    assert_eq!(
        query_ledger(&app, &module, &bettor)?.balance,
        Uint128::new(800)
    );

    let res = app.execute_contract(
        admin,
        module.clone(),
        &ExecuteMsg::CancelWager { wager_id },
        &[],
    )?;
    assert_eq!(event_attr(&res, "refund"), "200");

    let ledger = query_ledger(&app, &module, &bettor)?;
    assert_eq!(ledger.balance, Uint128::new(1000));
    assert_eq!(ledger.wins, 0);
    assert_eq!(ledger.losses, 0);

    // The wager row is gone and the plant is open to the bettor again
    assert!(query_wager(&app, &module, wager_id).is_err());
    place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(112 * DAY),
        100,
    )?;

    Ok(())
}

#[test]
fn test_cancel_resolved_wager_rejected() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let wager_id = place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(110 * DAY),
        100,
    )?;
    app.execute_contract(
        admin.clone(),
        module.clone(),
        &ExecuteMsg::DeclareDeath {
            plant_id,
            death_date: None,
        },
        &[],
    )?;

    let err = app
        .execute_contract(admin, module, &ExecuteMsg::CancelWager { wager_id }, &[])
        .unwrap_err();
    assert_eq!(
        err.downcast::<ContractError>()?,
        ContractError::WagerAlreadyResolved {}
    );

    Ok(())
}

#[test]
fn test_cancel_requires_contract_owner() -> Result<()> {
    let (mut app, module, admin) = setup()?;
    let bettor = app.api().addr_make("bettor");
    let plant_id = register_plant(&mut app, &module, &admin)?;

    let wager_id = place(
        &mut app,
        &module,
        &bettor,
        plant_id,
        Timestamp::from_seconds(110 * DAY),
        100,
    )?;

    let result = app.execute_contract(bettor, module, &ExecuteMsg::CancelWager { wager_id }, &[]);
    assert!(result.is_err());

    Ok(())
}
