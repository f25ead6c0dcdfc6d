use crate::fixtures::{Protocol, SECONDARY, USER_COLLATERAL};
use bonding_protocol_contracts::errors::ProtocolError;
use bonding_protocol_contracts::events::Liquidated;
use bonding_protocol_contracts::interest::rate_per_block_from_apr_bps;
use bonding_protocol_contracts::math::{from_whole, ratio};
use bonding_protocol_contracts::types::PositionStatus;
use odra::casper_types::U256;
use odra::host::HostRef;
use pretty_assertions::assert_eq;

/// 1% of principal per block
fn one_percent() -> U256 {
    ratio(1, 100)
}

#[test]
fn test_bond_mints_half_of_collateral_value() {
    let mut p = Protocol::deploy();
    let engine = p.bonding.address().clone();

    p.as_caller(p.user);
    let minted = p.bonding.bond(from_whole(100), from_whole(50));

    assert_eq!(minted, from_whole(50));
    assert_eq!(p.stable.balance_of(p.user), from_whole(50));
    assert_eq!(p.collateral.balance_of(p.user), from_whole(USER_COLLATERAL - 100));
    assert_eq!(p.collateral.balance_of(engine), from_whole(100));
    assert_eq!(p.bonding.get_position_status(p.user), PositionStatus::Indebted);

    let totals = p.bonding.get_totals();
    assert_eq!(totals.total_collateral, from_whole(100));
    assert_eq!(totals.total_debt, from_whole(50));
}

#[test]
fn test_bond_rejects_low_output() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    assert_eq!(
        p.bonding.try_bond(from_whole(100), from_whole(51)),
        Err(ProtocolError::SlippageExceeded.into())
    );
    assert_eq!(
        p.bonding.try_bond(U256::zero(), U256::zero()),
        Err(ProtocolError::ZeroAmount.into())
    );
}

#[test]
fn test_unbond_returns_collateral_for_repaid_stable() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());

    let released = p.bonding.unbond(from_whole(20), from_whole(40));

    assert_eq!(released, from_whole(40));
    assert_eq!(p.stable.balance_of(p.user), from_whole(30));
    assert_eq!(p.collateral.balance_of(p.user), from_whole(USER_COLLATERAL - 60));

    let info = p.bonding.get_position(p.user);
    assert_eq!(info.position.collateral, from_whole(60));
    assert_eq!(info.position.debt, from_whole(30));
}

#[test]
fn test_unbond_slippage_after_price_rise() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());

    // Collateral worth twice as much releases half as many units
    p.set_collateral_price(from_whole(2));
    p.as_caller(p.user);
    assert_eq!(
        p.bonding.try_unbond(from_whole(20), from_whole(40)),
        Err(ProtocolError::SlippageExceeded.into())
    );
    assert_eq!(p.bonding.unbond(from_whole(20), from_whole(20)), from_whole(20));
}

#[test]
fn test_unbond_rejects_over_repay_and_unhealthy_release() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());

    assert_eq!(
        p.bonding.try_unbond(from_whole(51), U256::zero()),
        Err(ProtocolError::OverRepay.into())
    );

    // Releasing 10 / 0.5 at 0.6 leaves 66.7 * 0.6 * 0.8 = 32 against 40 owed
    p.set_collateral_price(ratio(6, 10));
    p.as_caller(p.user);
    assert_eq!(
        p.bonding.try_unbond(from_whole(10), U256::zero()),
        Err(ProtocolError::InsufficientCollateral.into())
    );

    let position = p.bonding.get_position(p.user).position;
    assert_eq!(position.debt, from_whole(50));
    assert_eq!(position.collateral, from_whole(100));
}

#[test]
fn test_unbond_and_withdraw_after_interest_accrues() {
    let mut p = Protocol::deploy();
    let rate = rate_per_block_from_apr_bps(10_000);
    p.as_caller(p.admin);
    p.bonding.set_rate(ratio(1, 2), ratio(15, 100), rate, ratio(85, 100), ratio(1, 2));

    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());
    p.advance_blocks(1);

    // One block of interest puts the position just past max LTV
    let interest = rate * U256::from(50u64);
    assert_eq!(p.bonding.calculate_interest(p.user), interest);
    assert_eq!(p.bonding.calculate_quota(p.user).borrowable, U256::zero());

    assert_eq!(p.bonding.unbond(from_whole(20), U256::zero()), from_whole(40));
    p.bonding.withdraw(U256::one());

    let position = p.bonding.get_position(p.user).position;
    assert_eq!(position.interest, U256::zero());
    assert_eq!(position.debt, from_whole(30) + interest);
    assert_eq!(position.collateral, from_whole(60) - U256::one());
    assert_eq!(p.stable.balance_of(p.fee_recipient), interest);

    // Adding collateral at max LTV moves the position back towards it
    assert_eq!(p.bonding.bond(from_whole(10), U256::zero()), from_whole(5));
    assert_eq!(p.bonding.get_position(p.user).position.collateral, from_whole(70) - U256::one());
}

#[test]
fn test_bond_unbond_then_liquidate_after_price_drop() {
    let mut p = Protocol::deploy();
    p.mint_stable(p.liquidator, from_whole(20));

    p.as_caller(p.user);
    assert_eq!(p.bonding.bond(from_whole(100), U256::zero()), from_whole(50));
    assert_eq!(p.bonding.unbond(from_whole(20), U256::zero()), from_whole(40));

    // 60 * 0.6 * 0.8 = 28.8 < 30
    p.set_collateral_price(ratio(6, 10));
    assert!(p.bonding.is_liquidatable(p.user));

    p.as_caller(p.liquidator);
    let result = p.bonding.liquidate(p.user, from_whole(20), U256::zero());

    let seized = U256::from(33_333_333_333_333_333_333u128);
    assert_eq!(result.collateral_to_liquidator, seized);
    assert_eq!(p.stable.balance_of(p.liquidator), U256::zero());

    let position = p.bonding.get_position(p.user).position;
    assert_eq!(position.debt, from_whole(10));
    assert_eq!(position.collateral, from_whole(60) - seized);
    // 26.7 * 0.6 * 0.8 = 12.8 covers the remaining 10
    assert!(!p.bonding.is_liquidatable(p.user));
}

#[test]
fn test_liquidation_after_price_drop() {
    let mut p = Protocol::deploy();
    p.as_caller(p.admin);
    p.bonding.set_rate(ratio(1, 2), ratio(1, 10), U256::zero(), ratio(8, 10), ratio(1, 2));
    p.mint_stable(p.liquidator, from_whole(100));

    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());

    // 100 * 0.8 = 80 covers 50 owed
    p.as_caller(p.liquidator);
    assert_eq!(
        p.bonding.try_liquidate(p.user, from_whole(20), U256::zero()),
        Err(ProtocolError::HealthyPosition.into())
    );
    assert!(!p.bonding.is_liquidatable(p.user));

    // 60 * 0.8 = 48 no longer covers 50
    p.set_collateral_price(ratio(6, 10));
    assert!(p.bonding.is_liquidatable(p.user));

    p.as_caller(p.liquidator);
    assert_eq!(
        p.bonding.try_liquidate(p.user, from_whole(51), U256::zero()),
        Err(ProtocolError::ExceedsDebt.into())
    );
    // 33.3 units at 0.6 are worth just under 20
    assert_eq!(
        p.bonding.try_liquidate(p.user, from_whole(20), from_whole(20)),
        Err(ProtocolError::SlippageExceeded.into())
    );

    let result = p.bonding.liquidate(p.user, from_whole(20), from_whole(19));

    let seized = U256::from(33_333_333_333_333_333_333u128);
    let penalty = U256::from(3_333_333_333_333_333_333u128);
    assert_eq!(result.collateral_to_liquidator, seized);
    assert_eq!(result.penalty_collateral, penalty);
    assert_eq!(result.repayment.principal_paid, from_whole(20));

    assert_eq!(p.collateral.balance_of(p.liquidator), from_whole(USER_COLLATERAL) + seized);
    assert_eq!(p.collateral.balance_of(p.fee_recipient), penalty);
    assert_eq!(p.stable.balance_of(p.liquidator), from_whole(80));

    let info = p.bonding.get_position(p.user);
    assert_eq!(info.position.debt, from_whole(30));
    assert_eq!(info.position.collateral, from_whole(100) - seized - penalty);
    assert_eq!(info.position.liquidations, 1);

    let totals = p.bonding.get_totals();
    assert_eq!(totals.liquidation_count, 1);
    assert_eq!(totals.total_penalty_collateral, penalty);
    assert_eq!(totals.total_debt, from_whole(30));

    assert!(p.env.emitted_event(
        &p.bonding,
        Liquidated {
            account: p.user,
            liquidator: p.liquidator,
            repaid: from_whole(20),
            collateral_seized: seized,
            secondary_seized: U256::zero(),
            penalty_collateral: penalty,
            penalty_secondary: U256::zero(),
        }
    ));
}

#[test]
fn test_full_liquidation_marks_position_liquidated() {
    let mut p = Protocol::deploy();
    p.mint_stable(p.liquidator, from_whole(100));

    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());
    p.set_collateral_price(ratio(5, 10));

    // Repaying everything at 0.5 seizes exactly all 100 units
    p.as_caller(p.liquidator);
    let result = p.bonding.liquidate(p.user, from_whole(50), U256::zero());
    assert_eq!(result.collateral_to_liquidator, from_whole(100));
    assert_eq!(p.bonding.get_position_status(p.user), PositionStatus::Liquidated);
}

#[test]
fn test_borrow_beyond_ltv_fails_and_keeps_debt() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    p.bonding.provide(from_whole(100));
    assert_eq!(p.bonding.get_position_status(p.user), PositionStatus::Collateralized);

    p.bonding.borrow(from_whole(50));
    assert_eq!(
        p.bonding.try_borrow(U256::one()),
        Err(ProtocolError::ExceedsLoanToValue.into())
    );

    assert_eq!(p.bonding.get_position(p.user).position.debt, from_whole(50));
    assert_eq!(p.stable.balance_of(p.user), from_whole(50));
}

#[test]
fn test_interest_accrues_and_reaches_fee_recipient() {
    let mut p = Protocol::deploy();
    p.as_caller(p.admin);
    p.bonding.set_rate(ratio(1, 2), U256::zero(), one_percent(), ratio(8, 10), ratio(1, 2));

    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());
    p.advance_blocks(10);

    // 50 * 1% * 10 blocks
    assert_eq!(p.bonding.calculate_interest(p.user), from_whole(5));
    // Views leave the stored checkpoint alone
    assert_eq!(p.bonding.calculate_interest(p.user), from_whole(5));

    p.mint_stable(p.user, from_whole(5));
    p.as_caller(p.user);
    assert_eq!(
        p.bonding.try_repay(from_whole(56)),
        Err(ProtocolError::OverRepay.into())
    );

    let repayment = p.bonding.repay(from_whole(55));
    assert_eq!(repayment.interest_paid, from_whole(5));
    assert_eq!(repayment.principal_paid, from_whole(50));

    let info = p.bonding.get_position(p.user);
    assert_eq!(info.position.debt, U256::zero());
    assert_eq!(info.position.interest, U256::zero());
    assert_eq!(info.status, PositionStatus::Collateralized);

    assert_eq!(p.stable.balance_of(p.user), U256::zero());
    assert_eq!(p.stable.balance_of(p.fee_recipient), from_whole(5));
    assert_eq!(p.bonding.get_totals().total_interest_collected, from_whole(5));
}

#[test]
fn test_withdraw_keeps_position_healthy() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    p.bonding.provide(from_whole(100));
    p.bonding.borrow(from_whole(40));

    // 40 owed needs 50 of value at an 80% liquidation ratio
    let quota = p.bonding.calculate_quota(p.user);
    assert_eq!(quota.borrowable, from_whole(10));
    assert_eq!(quota.withdrawable, from_whole(50));

    assert_eq!(
        p.bonding.try_withdraw(from_whole(51)),
        Err(ProtocolError::InsufficientCollateral.into())
    );
    p.bonding.withdraw(from_whole(50));
    assert_eq!(p.collateral.balance_of(p.user), from_whole(USER_COLLATERAL - 50));
    assert!(!p.bonding.is_liquidatable(p.user));

    // Nothing owed: everything can leave, but not more
    p.bonding.repay(from_whole(40));
    assert_eq!(
        p.bonding.try_withdraw(from_whole(51)),
        Err(ProtocolError::InsufficientCollateral.into())
    );
    p.bonding.withdraw(from_whole(50));
    assert_eq!(p.bonding.get_position_status(p.user), PositionStatus::Closed);
}

#[test]
fn test_secondary_collateral_counts_at_its_weight() {
    let mut p = Protocol::deploy_with_secondary();
    let engine = p.bonding.address().clone();

    p.as_caller(p.user);
    p.bonding.provide(from_whole(100));
    p.bonding.provide_secondary(from_whole(100));
    assert_eq!(p.secondary.balance_of(engine), from_whole(100));

    // (100 + 100 * 0.5) * 0.5
    let info = p.bonding.get_position(p.user);
    assert_eq!(info.collateral_value, from_whole(150));
    assert_eq!(info.max_borrow, from_whole(75));

    p.bonding.borrow(from_whole(75));

    // (50 + 100 * 0.5) * 0.8 = 80 still covers 75
    p.bonding.withdraw(from_whole(50));
    // (50 + 80 * 0.5) * 0.8 = 72 does not
    assert_eq!(
        p.bonding.try_withdraw_secondary(from_whole(20)),
        Err(ProtocolError::InsufficientCollateral.into())
    );
    // (50 + 90 * 0.5) * 0.8 = 76
    p.bonding.withdraw_secondary(from_whole(10));
    assert_eq!(p.secondary.balance_of(p.user), from_whole(USER_COLLATERAL - 90));
    assert_eq!(p.secondary.balance_of(engine), from_whole(90));
    assert_eq!(p.bonding.get_totals().total_secondary_collateral, from_whole(90));

    assert_eq!(
        p.bonding.try_withdraw_secondary(from_whole(91)),
        Err(ProtocolError::InsufficientCollateral.into())
    );
}

#[test]
fn test_liquidation_spills_into_secondary_collateral() {
    let mut p = Protocol::deploy_with_secondary();
    p.mint_stable(p.liquidator, from_whole(20));

    p.as_caller(p.user);
    p.bonding.provide(from_whole(10));
    p.bonding.provide_secondary(from_whole(100));
    // 10 + 100 * 0.5 = 60 of value supports 30
    p.bonding.borrow(from_whole(30));

    // (10 + 100 * 0.5 * 0.5) * 0.8 = 28 < 30
    p.set_price(SECONDARY, ratio(1, 2));
    assert!(p.bonding.is_liquidatable(p.user));

    // 10 primary covers 10 of the repayment, 20 secondary at 0.5 the rest
    p.as_caller(p.liquidator);
    assert_eq!(
        p.bonding.try_liquidate(p.user, from_whole(20), from_whole(21)),
        Err(ProtocolError::SlippageExceeded.into())
    );
    let result = p.bonding.liquidate(p.user, from_whole(20), from_whole(20));

    assert_eq!(result.collateral_to_liquidator, from_whole(10));
    assert_eq!(result.secondary_to_liquidator, from_whole(20));
    assert_eq!(p.collateral.balance_of(p.liquidator), from_whole(USER_COLLATERAL + 10));
    assert_eq!(p.secondary.balance_of(p.liquidator), from_whole(USER_COLLATERAL + 20));
    assert_eq!(p.stable.balance_of(p.liquidator), U256::zero());

    let position = p.bonding.get_position(p.user).position;
    assert_eq!(position.collateral, U256::zero());
    assert_eq!(position.secondary_collateral, from_whole(80));
    assert_eq!(position.debt, from_whole(10));
    assert_eq!(p.bonding.get_totals().total_secondary_collateral, from_whole(80));
}

#[test]
fn test_secondary_operations_need_secondary_asset() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    assert_eq!(
        p.bonding.try_provide_secondary(from_whole(1)),
        Err(ProtocolError::InvalidConfig.into())
    );
}

#[test]
fn test_configuration_is_restricted() {
    let mut p = Protocol::deploy();

    p.as_caller(p.user);
    assert_eq!(
        p.bonding.try_set_rate(ratio(1, 2), U256::zero(), one_percent(), ratio(8, 10), ratio(1, 2)),
        Err(ProtocolError::Unauthorized.into())
    );
    assert_eq!(
        p.bonding.try_set_value(ratio(6, 10), ratio(8, 10)),
        Err(ProtocolError::Unauthorized.into())
    );
    assert_eq!(
        p.bonding.try_set_fee_recipient(p.user),
        Err(ProtocolError::Unauthorized.into())
    );

    p.as_caller(p.admin);
    assert_eq!(
        p.bonding.try_set_value(ratio(9, 10), ratio(8, 10)),
        Err(ProtocolError::InvalidConfig.into())
    );
    p.bonding.set_value(ratio(6, 10), ratio(8, 10));
    assert_eq!(p.bonding.get_config().max_loan_to_value, ratio(6, 10));

    p.bonding.transfer_configurator(p.user);
    assert_eq!(p.bonding.get_configurator(), Some(p.user));
    assert_eq!(
        p.bonding.try_set_value(ratio(1, 2), ratio(8, 10)),
        Err(ProtocolError::Unauthorized.into())
    );

    p.as_caller(p.user);
    p.bonding.set_value(ratio(1, 2), ratio(7, 10));
    assert_eq!(p.bonding.get_config().liquidation_ratio, ratio(7, 10));
}

#[test]
fn test_views_report_without_settling() {
    let mut p = Protocol::deploy();
    p.as_caller(p.admin);
    p.bonding.set_rate(ratio(1, 2), U256::zero(), one_percent(), ratio(8, 10), ratio(1, 2));

    p.as_caller(p.user);
    p.bonding.provide(from_whole(100));
    p.bonding.borrow(from_whole(10));
    p.advance_blocks(5);

    let before = p.bonding.get_totals();
    let info = p.bonding.get_position(p.user);
    assert_eq!(info.position.interest, ratio(1, 2));
    assert_eq!(p.bonding.calculate_interest(p.user), ratio(1, 2));
    assert_eq!(p.bonding.get_totals(), before);

    // Borrowable headroom accounts for the pending interest
    let quota = p.bonding.calculate_quota(p.user);
    assert_eq!(quota.borrowable, from_whole(40) - ratio(1, 2));
}

#[test]
fn test_rate_change_does_not_reprice_past_blocks() {
    let mut p = Protocol::deploy();
    p.as_caller(p.user);
    p.bonding.bond(from_whole(100), U256::zero());
    p.advance_blocks(1_000);

    p.as_caller(p.admin);
    p.bonding.set_rate(ratio(1, 2), U256::zero(), ratio(1, 1_000), ratio(8, 10), ratio(1, 2));
    assert_eq!(p.bonding.calculate_interest(p.user), U256::zero());
    assert!(!p.bonding.is_liquidatable(p.user));

    // 50 * 0.1% * 10 blocks
    p.advance_blocks(10);
    assert_eq!(p.bonding.calculate_interest(p.user), ratio(1, 2));

    // Dropping the rate keeps what already accrued
    p.bonding.set_rate(ratio(1, 2), U256::zero(), U256::zero(), ratio(8, 10), ratio(1, 2));
    p.advance_blocks(10);
    assert_eq!(p.bonding.calculate_interest(p.user), ratio(1, 2));
}
