// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    company, create_test_actor, create_test_bank, hours_settings, period,
};
use crate::{ChangeContext, CoreError, HourBank};
use hourbank_audit::{ChangeKind, VersionRecord};
use hourbank_domain::{
    BankLedger, CalculationWarning, CompanyId, ContractKindCode, ContractSettings, CycleState,
    Minutes, MonthlyCalculation, Overage, QuantityKind, Tickets, Usage,
};
use rust_decimal::Decimal;

fn routine() -> ChangeContext {
    ChangeContext::recompute(create_test_actor(), "Monthly close")
}

async fn compute(bank: &HourBank, year: i32, month: u8) -> MonthlyCalculation {
    bank.calculations()
        .compute(company(), period(year, month), &routine())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_first_month_uses_baseline_and_rolls_half() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 1), Minutes::hm(30, 0));

    let calc: MonthlyCalculation = compute(&bank, 2024, 1).await;
    let hours: BankLedger<Minutes> = calc.hours.unwrap();

    assert_eq!(calc.version, 1);
    assert!(calc.id.is_some());
    assert!(!calc.is_period_end);
    assert!(calc.tickets.is_none());
    assert_eq!(hours.baseline, Minutes::hm(40, 0));
    assert_eq!(hours.rollover_from_previous, Minutes::hm(0, 0));
    assert_eq!(hours.balance, Minutes::hm(10, 0));
    assert_eq!(hours.rollover_to_next, Minutes::hm(5, 0));
    assert_eq!(calc.amount_to_bill, Decimal::ZERO);
    assert_eq!(calc.computed_by, "analyst-1");
}

#[tokio::test]
async fn test_rollover_chains_between_months() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 1), Minutes::hm(30, 0));
    store.put_usage(company(), period(2024, 2), Minutes::hm(50, 0));

    compute(&bank, 2024, 1).await;
    let feb: MonthlyCalculation = compute(&bank, 2024, 2).await;
    let hours: BankLedger<Minutes> = feb.hours.unwrap();

    assert_eq!(hours.rollover_from_previous, Minutes::hm(5, 0));
    assert_eq!(hours.available_balance, Minutes::hm(45, 0));
    assert_eq!(hours.balance, Minutes::hm(-5, 0));
    // A deficit carries in full
    assert_eq!(hours.rollover_to_next, Minutes::hm(-5, 0));
}

#[tokio::test]
async fn test_billed_requests_and_adjustments_enter_total_consumption() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 1), Minutes::hm(20, 0));
    store.put_billed(
        company(),
        period(2024, 1),
        Usage {
            hours: Minutes::hm(4, 30),
            tickets: Tickets::from_count(0),
        },
    );

    let calc: MonthlyCalculation = compute(&bank, 2024, 1).await;
    let hours: BankLedger<Minutes> = calc.hours.unwrap();

    assert_eq!(hours.billed_requests, Minutes::hm(4, 30));
    assert_eq!(hours.total_consumption, Minutes::hm(24, 30));
    assert_eq!(hours.balance, Minutes::hm(15, 30));
}

#[tokio::test]
async fn test_period_end_zeroes_positive_balance() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 3), Minutes::hm(10, 0));

    let calc: MonthlyCalculation = compute(&bank, 2024, 3).await;
    let hours: BankLedger<Minutes> = calc.hours.unwrap();

    assert!(calc.is_period_end);
    assert_eq!(hours.balance, Minutes::hm(30, 0));
    assert_eq!(hours.closing_balance, Minutes::hm(0, 0));
    assert_eq!(hours.rollover_to_next, Minutes::hm(0, 0));
    assert_eq!(hours.overage, None);
    assert_eq!(calc.overage_note, None);
}

#[tokio::test]
async fn test_period_end_deficit_is_priced() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 3), Minutes::hm(55, 0));
    store.put_rate(company(), QuantityKind::Hours, period(2023, 6), 100);

    let calc: MonthlyCalculation = compute(&bank, 2024, 3).await;
    let hours: BankLedger<Minutes> = calc.hours.unwrap();

    assert_eq!(
        hours.overage,
        Some(Overage {
            amount: Minutes::hm(15, 0),
            value: Decimal::from(1500),
            rate: Some(Decimal::from(100)),
            rate_found: true,
        })
    );
    assert_eq!(hours.rollover_to_next, Minutes::hm(0, 0));
    assert_eq!(calc.amount_to_bill, Decimal::from(1500));
    assert_eq!(
        calc.overage_note.as_deref(),
        Some("Overage of 15:00 hours for period 03/2024 - Value: 1,500.00")
    );
    assert!(calc.warnings.is_empty());
    assert!(calc.has_overage());
}

#[tokio::test]
async fn test_latest_rate_before_period_wins() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 3), Minutes::hm(41, 0));
    store.put_rate(company(), QuantityKind::Hours, period(2023, 1), 80);
    store.put_rate(company(), QuantityKind::Hours, period(2024, 2), 120);
    store.put_rate(company(), QuantityKind::Hours, period(2024, 4), 500);

    let calc: MonthlyCalculation = compute(&bank, 2024, 3).await;

    assert_eq!(calc.amount_to_bill, Decimal::from(120));
}

#[tokio::test]
async fn test_missing_rate_is_a_warning_not_an_error() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 3), Minutes::hm(50, 0));

    let calc: MonthlyCalculation = compute(&bank, 2024, 3).await;
    let overage: Overage<Minutes> = calc.hours.unwrap().overage.unwrap();

    assert!(!overage.rate_found);
    assert_eq!(overage.amount, Minutes::hm(10, 0));
    assert_eq!(overage.value, Decimal::ZERO);
    assert_eq!(
        calc.warnings,
        vec![CalculationWarning::RateNotFound {
            kind: QuantityKind::Hours
        }]
    );
    assert_eq!(
        calc.overage_note.as_deref(),
        Some("Overage of 10:00 hours for period 03/2024 - Value: 0.00")
    );
}

#[tokio::test]
async fn test_each_compute_writes_a_new_version_and_record() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 1), Minutes::hm(30, 0));

    compute(&bank, 2024, 1).await;
    store.put_usage(company(), period(2024, 1), Minutes::hm(35, 0));
    let second: MonthlyCalculation = compute(&bank, 2024, 1).await;

    assert_eq!(second.version, 2);
    assert_eq!(store.inserted().len(), 2);

    let history: Vec<VersionRecord> = bank
        .ledger()
        .history(company(), period(2024, 1))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].from_version, 1);
    assert_eq!(history[0].to_version, 2);
    assert_eq!(history[0].change_kind, ChangeKind::Recompute);
    assert_eq!(history[1].from_version, 0);
    assert!(history[1].before.is_empty());
    assert_eq!(history[0].calculation_id, second.id.unwrap());
}

#[tokio::test]
async fn test_failed_version_record_leaves_no_orphan_calculation() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 1), Minutes::hm(30, 0));
    compute(&bank, 2024, 1).await;
    store.set_versions_down(true);

    let result: Result<MonthlyCalculation, CoreError> = bank
        .calculations()
        .compute(company(), period(2024, 1), &routine())
        .await;

    assert!(matches!(result, Err(CoreError::Integration { .. })));
    assert_eq!(store.inserted().len(), 1);
    assert_eq!(store.recorded().len(), 1);

    // The next successful write continues from the last recorded version
    store.set_versions_down(false);
    let retried: MonthlyCalculation = compute(&bank, 2024, 1).await;
    let history: Vec<VersionRecord> = bank
        .ledger()
        .history(company(), period(2024, 1))
        .await
        .unwrap();
    assert_eq!(retried.version, 2);
    assert_eq!(history[0].from_version, 1);
    assert_eq!(history[0].to_version, 2);
    assert_eq!(history[0].calculation_id, retried.id.unwrap());
    assert!(!history[0].diff().touches("id"));
}

#[tokio::test]
async fn test_recompute_is_recorded_as_correction() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 1), Minutes::hm(30, 0));
    compute(&bank, 2024, 1).await;

    let corrected: MonthlyCalculation = bank
        .calculations()
        .recompute(
            company(),
            period(2024, 1),
            &create_test_actor(),
            "Usage feed re-sent",
        )
        .await
        .unwrap();

    let history: Vec<VersionRecord> = bank
        .ledger()
        .history(company(), period(2024, 1))
        .await
        .unwrap();
    assert_eq!(corrected.version, 2);
    assert_eq!(history[0].change_kind, ChangeKind::Correction);
    assert_eq!(history[0].reason, "Usage feed re-sent");
}

#[tokio::test]
async fn test_get_or_compute_reuses_existing_version() {
    let (bank, store) = create_test_bank();
    store.put_usage(company(), period(2024, 1), Minutes::hm(30, 0));

    let first: MonthlyCalculation = bank
        .calculations()
        .get_or_compute(company(), period(2024, 1), &create_test_actor())
        .await
        .unwrap();
    let second: MonthlyCalculation = bank
        .calculations()
        .get_or_compute(company(), period(2024, 1), &create_test_actor())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.inserted().len(), 1);
    assert_eq!(
        bank.calculations()
            .latest(company(), period(2024, 1))
            .await
            .unwrap(),
        Some(first)
    );
}

#[tokio::test]
async fn test_missing_parameter_blocks_computation() {
    let (bank, store) = create_test_bank();
    let mut settings: ContractSettings = hours_settings();
    settings.cycle_length_months = None;
    store.put_contract(company(), settings);

    let result: Result<MonthlyCalculation, CoreError> = bank
        .calculations()
        .compute(company(), period(2024, 1), &routine())
        .await;

    match result {
        Err(CoreError::Configuration { field, context }) => {
            assert_eq!(field, "cycle_length_months");
            assert_eq!(context.company, Some(company()));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
    assert!(store.inserted().is_empty());
}

#[tokio::test]
async fn test_unknown_company_is_not_configured() {
    let (bank, _store) = create_test_bank();

    let result: Result<MonthlyCalculation, CoreError> = bank
        .calculations()
        .compute(CompanyId::new(404), period(2024, 1), &routine())
        .await;

    assert!(matches!(
        result,
        Err(CoreError::Configuration { ref field, .. }) if field == "contract"
    ));
}

#[tokio::test]
async fn test_out_of_range_parameter_is_validation_error() {
    let (bank, store) = create_test_bank();
    let mut settings: ContractSettings = hours_settings();
    settings.monthly_rollover_percent = Some(Decimal::from(120));
    store.put_contract(company(), settings);

    let result: Result<MonthlyCalculation, CoreError> = bank
        .calculations()
        .compute(company(), period(2024, 1), &routine())
        .await;

    assert!(matches!(result, Err(CoreError::Validation { .. })));
}

#[tokio::test]
async fn test_provider_outage_is_retryable_and_writes_nothing() {
    let (bank, store) = create_test_bank();
    store.set_consumption_down(true);

    let err: CoreError = bank
        .calculations()
        .compute(company(), period(2024, 1), &routine())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err, CoreError::Integration { .. }));
    assert_eq!(err.context().period, Some(period(2024, 1)));
    assert!(store.inserted().is_empty());
}

#[tokio::test]
async fn test_special_rollover_threads_cycle_index() {
    let (bank, store) = create_test_bank();
    let mut settings: ContractSettings = hours_settings();
    settings.cycle_length_months = Some(1);
    settings.has_special_rollover = Some(true);
    settings.cycles_until_zeroing = Some(2);
    store.put_contract(company(), settings);
    for month in 1..=3 {
        store.put_usage(company(), period(2024, month), Minutes::hm(30, 0));
    }

    let jan: MonthlyCalculation = compute(&bank, 2024, 1).await;
    let feb: MonthlyCalculation = compute(&bank, 2024, 2).await;
    let mar: MonthlyCalculation = compute(&bank, 2024, 3).await;

    assert_eq!(jan.cycle, CycleState::new(1, 2).unwrap());
    assert_eq!(jan.next_cycle, CycleState::new(2, 2).unwrap());
    assert_eq!(jan.hours_rollover(), Minutes::hm(10, 0));

    assert_eq!(feb.cycle.index(), 2);
    assert_eq!(feb.hours.unwrap().balance, Minutes::hm(20, 0));
    assert_eq!(feb.hours_rollover(), Minutes::hm(0, 0));
    assert_eq!(feb.next_cycle.index(), 1);

    assert_eq!(mar.cycle.index(), 1);
    assert_eq!(mar.hours.unwrap().rollover_from_previous, Minutes::hm(0, 0));
    assert_eq!(mar.hours_rollover(), Minutes::hm(10, 0));
}

#[tokio::test]
async fn test_combined_contract_prices_both_kinds() {
    let (bank, store) = create_test_bank();
    let settings: ContractSettings = ContractSettings {
        kind: Some(ContractKindCode::Both),
        cycle_length_months: Some(1),
        tickets_baseline: Some(Tickets::from_count(10)),
        ..hours_settings()
    };
    store.put_contract(company(), settings);
    store.put_billed(
        company(),
        period(2024, 1),
        Usage {
            hours: Minutes::hm(42, 0),
            tickets: Tickets::from_count(12),
        },
    );
    store.put_rate(company(), QuantityKind::Hours, period(2024, 1), 100);
    store.put_rate(company(), QuantityKind::Tickets, period(2024, 1), 25);

    let calc: MonthlyCalculation = compute(&bank, 2024, 1).await;

    assert_eq!(calc.hours.unwrap().overage_value(), Decimal::from(200));
    assert_eq!(calc.tickets.unwrap().overage_value(), Decimal::from(50));
    assert_eq!(calc.amount_to_bill, Decimal::from(250));
    assert_eq!(
        calc.overage_note.as_deref(),
        Some(
            "Overage of 2:00 hours for period 01/2024 - Value: 200.00\n\
             Overage of 2.00 tickets for period 01/2024 - Value: 50.00"
        )
    );
}
