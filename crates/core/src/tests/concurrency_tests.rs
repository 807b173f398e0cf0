// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{company, create_test_actor, create_test_bank, hours_settings, period};
use crate::{AdjustmentOutcome, ChangeContext, CompanyLocks, CoreError};
use futures::future::join_all;
use hourbank_audit::VersionRecord;
use hourbank_domain::{
    AdjustmentAmount, BankLedger, CompanyId, Direction, Minutes, MonthlyCalculation,
};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_company_computes_are_serialized() {
    let (bank, _store) = create_test_bank();

    let tasks = (0..8).map(|_| {
        let bank = bank.clone();
        tokio::spawn(async move {
            let change: ChangeContext =
                ChangeContext::recompute(create_test_actor(), "Concurrent close");
            bank.calculations()
                .compute(company(), period(2024, 1), &change)
                .await
        })
    });
    let results: Vec<Result<MonthlyCalculation, CoreError>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let mut versions: Vec<u32> = results
        .into_iter()
        .map(|result| result.unwrap().version)
        .collect();
    versions.sort_unstable();
    assert_eq!(versions, (1..=8).collect::<Vec<u32>>());
}

#[tokio::test]
async fn test_companies_compute_independently() {
    let (bank, store) = create_test_bank();
    let other: CompanyId = CompanyId::new(2);
    store.put_contract(other, hours_settings());
    let change: ChangeContext = ChangeContext::recompute(create_test_actor(), "Monthly close");

    let results: Vec<Result<MonthlyCalculation, CoreError>> = join_all([
        bank.calculations()
            .compute(company(), period(2024, 1), &change),
        bank.calculations().compute(other, period(2024, 1), &change),
    ])
    .await;

    let companies: Vec<CompanyId> = results
        .into_iter()
        .map(|result| result.unwrap().company)
        .collect();
    assert_eq!(companies, vec![company(), other]);
    assert_eq!(store.inserted().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adjustments_each_cascade_in_turn() {
    let (bank, store) = create_test_bank();
    let change: ChangeContext = ChangeContext::recompute(create_test_actor(), "Monthly close");
    for month in 1..=3 {
        store.put_usage(company(), period(2024, month), Minutes::hm(30, 0));
        bank.calculations()
            .compute(company(), period(2024, month), &change)
            .await
            .unwrap();
    }

    let tasks = (0..6).map(|n| {
        let bank = bank.clone();
        tokio::spawn(async move {
            bank.adjustments()
                .create(
                    company(),
                    period(2024, 2),
                    AdjustmentAmount {
                        hours: Some(Minutes::hm(1, 0)),
                        tickets: None,
                    },
                    Direction::Entry,
                    &format!("Onsite visit {n} logged twice"),
                    &create_test_actor(),
                )
                .await
        })
    });
    let outcomes: Vec<Result<AdjustmentOutcome, CoreError>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();
    for outcome in outcomes {
        assert_eq!(outcome.unwrap().recalculated_months, 2);
    }

    let feb: MonthlyCalculation = bank
        .calculations()
        .latest(company(), period(2024, 2))
        .await
        .unwrap()
        .unwrap();
    let mar: MonthlyCalculation = bank
        .calculations()
        .latest(company(), period(2024, 3))
        .await
        .unwrap()
        .unwrap();
    let feb_hours: BankLedger<Minutes> = feb.hours.unwrap();
    assert_eq!(feb.version, 7);
    assert_eq!(mar.version, 7);
    assert_eq!(feb_hours.adjustments, Minutes::hm(6, 0));
    assert_eq!(
        mar.hours.unwrap().rollover_from_previous,
        feb_hours.rollover_to_next
    );

    let mut to_versions: Vec<u32> = bank
        .ledger()
        .history(company(), period(2024, 2))
        .await
        .unwrap()
        .iter()
        .map(|record: &VersionRecord| record.to_version)
        .collect();
    to_versions.sort_unstable();
    assert_eq!(to_versions, (1..=7).collect::<Vec<u32>>());
}

#[tokio::test]
async fn test_held_company_lock_does_not_block_another_company() {
    let locks: CompanyLocks = CompanyLocks::new();
    let _held: OwnedMutexGuard<()> = locks.acquire(company()).await;

    let other = tokio::time::timeout(Duration::from_secs(1), locks.acquire(CompanyId::new(2)));

    assert!(other.await.is_ok());
}

#[tokio::test]
async fn test_same_company_lock_waits_for_release() {
    let locks: CompanyLocks = CompanyLocks::new();
    let held: OwnedMutexGuard<()> = locks.acquire(company()).await;

    let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(company()));
    assert!(blocked.await.is_err());

    drop(held);
    let released = tokio::time::timeout(Duration::from_secs(1), locks.acquire(company()));
    assert!(released.await.is_ok());
}
