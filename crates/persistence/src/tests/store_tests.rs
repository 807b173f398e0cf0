// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::{
    company, create_test_actor, create_test_store, hours_settings, period, sample_calculation,
};
use crate::{PersistenceError, SqliteStore};
use diesel::RunQueryDsl;
use hourbank::ports::{
    AdjustmentStore, AllocationStore, CalculationStore, ConsumptionProvider, ParameterStore,
    RateCatalog, VersionStore,
};
use hourbank::{PortError, PortErrorKind};
use hourbank_audit::{ChangeKind, Snapshot, VersionRecord};
use hourbank_domain::{
    Adjustment, AdjustmentAmount, AdjustmentTotals, Allocation, BankLedger, BillingRate,
    CalculationWarning, ContractSettings, Direction, Minutes, MonthlyCalculation, Overage,
    Period, QuantityKind, Tickets, Usage,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use time::macros::datetime;

fn rate(from: Period, until: Option<Period>, value: i64) -> BillingRate {
    BillingRate {
        id: None,
        company: company(),
        kind: QuantityKind::Hours,
        effective_from: from,
        effective_until: until,
        value_per_unit: Decimal::from(value),
    }
}

fn adjustment(hours: i64, direction: Direction) -> Adjustment {
    Adjustment {
        id: None,
        company: company(),
        period: period(2024, 2),
        amount: AdjustmentAmount {
            hours: Some(Minutes::hm(hours, 0)),
            tickets: None,
        },
        direction,
        note: String::from("Ticket 4411 was billed twice"),
        active: true,
        author: String::from("analyst-1"),
        created_at: datetime!(2024-03-02 10:15 UTC),
        deactivated_by: None,
        deactivated_at: None,
    }
}

fn allocation(name: &str, percent: i64, active: bool) -> Allocation {
    Allocation {
        id: None,
        company: company(),
        name: name.to_string(),
        baseline_share_percent: Decimal::from(percent),
        active,
    }
}

fn transition(
    previous: Option<&MonthlyCalculation>,
    current: &MonthlyCalculation,
    kind: ChangeKind,
) -> VersionRecord {
    VersionRecord {
        id: None,
        calculation_id: 0,
        company: current.company,
        period: current.period,
        from_version: previous.map_or(0, |p| p.version),
        to_version: current.version,
        before: previous
            .map(|p| Snapshot::capture(p).unwrap())
            .unwrap_or_default(),
        after: Snapshot::capture(current).unwrap(),
        reason: String::from("Monthly close"),
        change_kind: kind,
        author: create_test_actor(),
        created_at: datetime!(2024-02-01 08:00 UTC),
    }
}

async fn try_insert(
    store: &SqliteStore,
    calculation: &MonthlyCalculation,
) -> Result<(MonthlyCalculation, VersionRecord), PortError> {
    let record: VersionRecord = transition(None, calculation, ChangeKind::Recompute);
    store.insert_versioned(calculation, &record).await
}

async fn insert(store: &SqliteStore, calculation: &MonthlyCalculation) -> MonthlyCalculation {
    try_insert(store, calculation).await.unwrap().0
}

#[tokio::test]
async fn test_contract_settings_survive_storage() {
    let store: SqliteStore = create_test_store().await;

    let settings: Option<ContractSettings> = ParameterStore::get(&store, company()).await.unwrap();

    assert_eq!(settings, Some(hours_settings()));
}

#[tokio::test]
async fn test_missing_settings_stay_missing_and_replace_earlier_ones() {
    let store: SqliteStore = create_test_store().await;
    let partial: ContractSettings = ContractSettings {
        cycle_length_months: None,
        monthly_rollover_percent: None,
        ..hours_settings()
    };

    store.put_contract(company(), &partial).await.unwrap();
    let settings: ContractSettings = ParameterStore::get(&store, company())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(settings.cycle_length_months, None);
    assert_eq!(settings.monthly_rollover_percent, None);
    assert_eq!(settings.hours_baseline, Some(Minutes::hm(40, 0)));
}

#[tokio::test]
async fn test_unreported_usage_reads_as_zero() {
    let store: SqliteStore = create_test_store().await;

    let usage: Usage = store.consumption(company(), period(2024, 5)).await.unwrap();

    assert_eq!(usage, Usage::default());
}

#[tokio::test]
async fn test_usage_channels_are_separate_and_replaced() {
    let store: SqliteStore = create_test_store().await;
    let jan: Period = period(2024, 1);

    store
        .put_usage(
            company(),
            jan,
            Usage {
                hours: Minutes::hm(10, 0),
                tickets: Tickets::from_count(0),
            },
        )
        .await
        .unwrap();
    store
        .put_usage(
            company(),
            jan,
            Usage {
                hours: Minutes::hm(12, 30),
                tickets: Tickets::new(Decimal::new(250, 2)),
            },
        )
        .await
        .unwrap();
    store
        .put_billed(
            company(),
            jan,
            Usage {
                hours: Minutes::hm(2, 0),
                tickets: Tickets::from_count(0),
            },
        )
        .await
        .unwrap();

    let consumption: Usage = store.consumption(company(), jan).await.unwrap();
    let billed: Usage = store.billed_requests(company(), jan).await.unwrap();

    assert_eq!(consumption.hours, Minutes::hm(12, 30));
    assert_eq!(consumption.tickets, Tickets::new(Decimal::new(250, 2)));
    assert_eq!(billed.hours, Minutes::hm(2, 0));
}

#[tokio::test]
async fn test_latest_rate_picks_latest_start_on_or_before_period() {
    let store: SqliteStore = create_test_store().await;
    store.put_rate(&rate(period(2023, 6), None, 100)).await.unwrap();
    store.put_rate(&rate(period(2024, 2), None, 120)).await.unwrap();
    store.put_rate(&rate(period(2024, 9), None, 150)).await.unwrap();

    let march: Option<BillingRate> = store
        .latest_rate(company(), period(2024, 3), QuantityKind::Hours)
        .await
        .unwrap();
    let january: Option<BillingRate> = store
        .latest_rate(company(), period(2024, 1), QuantityKind::Hours)
        .await
        .unwrap();
    let too_early: Option<BillingRate> = store
        .latest_rate(company(), period(2023, 1), QuantityKind::Hours)
        .await
        .unwrap();
    let tickets: Option<BillingRate> = store
        .latest_rate(company(), period(2024, 3), QuantityKind::Tickets)
        .await
        .unwrap();

    assert_eq!(march.unwrap().value_per_unit, Decimal::from(120));
    assert_eq!(january.unwrap().value_per_unit, Decimal::from(100));
    assert!(too_early.is_none());
    assert!(tickets.is_none());
}

#[tokio::test]
async fn test_expired_rate_is_returned_when_nothing_newer_exists() {
    let store: SqliteStore = create_test_store().await;
    store
        .put_rate(&rate(period(2023, 1), Some(period(2023, 6)), 90))
        .await
        .unwrap();

    let found: BillingRate = store
        .latest_rate(company(), period(2024, 3), QuantityKind::Hours)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.value_per_unit, Decimal::from(90));
    assert_eq!(found.effective_until, Some(period(2023, 6)));
    assert!(found.is_expired_at(period(2024, 3)));
}

#[tokio::test]
async fn test_calculation_versions_must_be_sequential() {
    let store: SqliteStore = create_test_store().await;
    let jan: Period = period(2024, 1);

    let first: MonthlyCalculation = insert(&store, &sample_calculation(jan, 1)).await;
    assert!(first.id.is_some());

    let duplicate: PortError = try_insert(&store, &sample_calculation(jan, 1))
        .await
        .unwrap_err();
    let skipped: PortError = try_insert(&store, &sample_calculation(jan, 3))
        .await
        .unwrap_err();
    assert_eq!(duplicate.kind, PortErrorKind::Conflict);
    assert_eq!(skipped.kind, PortErrorKind::Conflict);

    let second: MonthlyCalculation = insert(&store, &sample_calculation(jan, 2)).await;
    let latest: MonthlyCalculation = store.latest(company(), jan).await.unwrap().unwrap();
    let original: MonthlyCalculation = store
        .get_version(company(), jan, 1)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(latest, second);
    assert_eq!(original, first);
    assert!(
        store
            .get_version(company(), jan, 7)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_calculation_round_trips_every_field() {
    let store: SqliteStore = create_test_store().await;
    let mut calculation: MonthlyCalculation = sample_calculation(period(2024, 3), 1);
    calculation.is_period_end = true;
    calculation.tickets = Some(BankLedger {
        baseline: Tickets::from_count(10),
        rollover_from_previous: Tickets::from_count(0),
        available_balance: Tickets::from_count(10),
        consumption: Tickets::new(Decimal::new(1250, 2)),
        billed_requests: Tickets::from_count(0),
        adjustments: Tickets::from_count(0),
        total_consumption: Tickets::new(Decimal::new(1250, 2)),
        balance: Tickets::new(Decimal::new(-250, 2)),
        closing_balance: Tickets::new(Decimal::new(-250, 2)),
        rollover_to_next: Tickets::from_count(0),
        overage: Some(Overage {
            amount: Tickets::new(Decimal::new(250, 2)),
            value: Decimal::ZERO,
            rate: None,
            rate_found: false,
        }),
    });
    calculation.warnings = vec![CalculationWarning::RateNotFound {
        kind: QuantityKind::Tickets,
    }];
    calculation.overage_note =
        Some(String::from("Overage of 2.50 tickets for period 03/2024 - Value: 0.00"));

    let stored: MonthlyCalculation = insert(&store, &calculation).await;
    let loaded: MonthlyCalculation = store
        .latest(company(), period(2024, 3))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(loaded, stored);
    assert_eq!(loaded.warnings, calculation.warnings);
    assert_eq!(loaded.tickets, calculation.tickets);
}

#[tokio::test]
async fn test_stored_calculations_cannot_be_rewritten() {
    let store: SqliteStore = create_test_store().await;
    insert(&store, &sample_calculation(period(2024, 1), 1)).await;

    let update: Result<usize, PersistenceError> = store
        .with_conn("tamper", |conn| {
            diesel::sql_query("UPDATE calculations SET amount_to_bill = '999'")
                .execute(conn)
                .map_err(PersistenceError::from)
        })
        .await;
    let delete: Result<usize, PersistenceError> = store
        .with_conn("tamper", |conn| {
            diesel::sql_query("DELETE FROM calculations")
                .execute(conn)
                .map_err(PersistenceError::from)
        })
        .await;

    assert!(update.is_err());
    assert!(delete.is_err());
    let latest: MonthlyCalculation = store
        .latest(company(), period(2024, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.amount_to_bill, Decimal::ZERO);
}

#[tokio::test]
async fn test_only_active_adjustments_count_toward_total() {
    let store: SqliteStore = create_test_store().await;
    let feb: Period = period(2024, 2);

    let entry: Adjustment = AdjustmentStore::insert(&store, &adjustment(5, Direction::Entry))
        .await
        .unwrap();
    AdjustmentStore::insert(&store, &adjustment(2, Direction::Exit))
        .await
        .unwrap();

    let both: AdjustmentTotals = store.active_total(company(), feb).await.unwrap();
    assert_eq!(both.hours, Minutes::hm(3, 0));

    let entry_id: i64 = entry.id.unwrap();
    let deactivated: Adjustment = store
        .deactivate(entry_id, "supervisor-2", datetime!(2024-03-05 09:00 UTC))
        .await
        .unwrap();
    assert!(!deactivated.active);
    assert_eq!(deactivated.deactivated_by.as_deref(), Some("supervisor-2"));
    assert_eq!(
        deactivated.deactivated_at,
        Some(datetime!(2024-03-05 09:00 UTC))
    );

    let remaining: AdjustmentTotals = store.active_total(company(), feb).await.unwrap();
    assert_eq!(remaining.hours, Minutes::hm(-2, 0));

    let listed: Vec<Adjustment> = AdjustmentStore::list(&store, company(), feb).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], deactivated);
    assert!(listed[1].active);
}

#[tokio::test]
async fn test_deactivation_rejects_repeats_and_unknown_ids() {
    let store: SqliteStore = create_test_store().await;
    let stored: Adjustment = AdjustmentStore::insert(&store, &adjustment(5, Direction::Entry))
        .await
        .unwrap();
    let id: i64 = stored.id.unwrap();
    let at: OffsetDateTime = datetime!(2024-03-05 09:00 UTC);

    store.deactivate(id, "supervisor-2", at).await.unwrap();
    let again: PortError = store.deactivate(id, "supervisor-2", at).await.unwrap_err();
    let unknown: PortError = store.deactivate(9_999, "supervisor-2", at).await.unwrap_err();

    assert_eq!(again.kind, PortErrorKind::Conflict);
    assert_eq!(unknown.kind, PortErrorKind::NotFound);
}

#[tokio::test]
async fn test_version_history_is_newest_first_and_append_only() {
    let store: SqliteStore = create_test_store().await;
    let jan: Period = period(2024, 1);
    let v1: MonthlyCalculation = sample_calculation(jan, 1);
    let v2: MonthlyCalculation = sample_calculation(jan, 2);

    let mut stored_ids: Vec<i64> = Vec::new();
    for (previous, current, kind) in [
        (None, &v1, ChangeKind::Recompute),
        (Some(&v1), &v2, ChangeKind::Correction),
    ] {
        let (stored, recorded): (MonthlyCalculation, VersionRecord) = store
            .insert_versioned(current, &transition(previous, current, kind))
            .await
            .unwrap();
        assert!(recorded.id.is_some());
        assert_eq!(Some(recorded.calculation_id), stored.id);
        stored_ids.push(recorded.calculation_id);
    }

    let history: Vec<VersionRecord> = store.history(company(), jan).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].to_version, 2);
    assert_eq!(history[0].change_kind, ChangeKind::Correction);
    assert_eq!(history[0].calculation_id, stored_ids[1]);
    assert_eq!(history[1].from_version, 0);
    assert!(history[1].before.is_empty());
    assert_eq!(history[1].after, Snapshot::capture(&v1).unwrap());
    assert_eq!(history[0].author, create_test_actor());

    let tampered: Result<usize, PersistenceError> = store
        .with_conn("tamper", |conn| {
            diesel::sql_query("UPDATE version_records SET reason = 'rewritten'")
                .execute(conn)
                .map_err(PersistenceError::from)
        })
        .await;
    assert!(tampered.is_err());
}

#[tokio::test]
async fn test_rejected_version_record_rolls_back_calculation() {
    let store: SqliteStore = create_test_store().await;
    let jan: Period = period(2024, 1);
    store
        .with_conn("block version log", |conn| {
            diesel::sql_query(
                "CREATE TRIGGER version_log_offline BEFORE INSERT ON version_records \
                 BEGIN SELECT RAISE(ABORT, 'version log offline'); END",
            )
            .execute(conn)
            .map_err(PersistenceError::from)
        })
        .await
        .unwrap();

    let rejected: PortError = try_insert(&store, &sample_calculation(jan, 1))
        .await
        .unwrap_err();

    assert_eq!(rejected.kind, PortErrorKind::Rejected);
    assert!(store.latest(company(), jan).await.unwrap().is_none());
    assert!(store.history(company(), jan).await.unwrap().is_empty());

    store
        .with_conn("unblock version log", |conn| {
            diesel::sql_query("DROP TRIGGER version_log_offline")
                .execute(conn)
                .map_err(PersistenceError::from)
        })
        .await
        .unwrap();

    // Version 1 is still free because nothing was committed
    let (stored, recorded): (MonthlyCalculation, VersionRecord) =
        try_insert(&store, &sample_calculation(jan, 1)).await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(Some(recorded.calculation_id), stored.id);
}

#[tokio::test]
async fn test_allocations_upsert_by_name() {
    let store: SqliteStore = create_test_store().await;

    let support: Allocation = store
        .put_allocation(&allocation("Support", 50, true))
        .await
        .unwrap();
    store
        .put_allocation(&allocation("Projects", 50, true))
        .await
        .unwrap();
    let updated: Allocation = store
        .put_allocation(&allocation("Support", 70, false))
        .await
        .unwrap();

    assert_eq!(updated.id, support.id);

    let listed: Vec<Allocation> = AllocationStore::list(&store, company()).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "Support");
    assert_eq!(listed[0].baseline_share_percent, Decimal::from(70));
    assert!(!listed[0].active);
    assert_eq!(listed[1].name, "Projects");
}
