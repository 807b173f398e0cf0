// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod adjustment;
mod allocation;
mod calculation;
mod contract;
mod error;
mod overage;
mod period;
mod quantity;
mod rollover;

#[cfg(test)]
mod tests;

pub use adjustment::{
    Adjustment, AdjustmentAmount, Direction, MIN_NOTE_LENGTH, active_totals, validate_note,
};
pub use allocation::{
    Allocation, SegmentedCalculation, segment, validate_sum, verify_segmented_sum,
};
pub use calculation::{
    AdjustmentTotals, BankLedger, CalculationWarning, LedgerInputs, LedgerOutcome, MonthRules,
    MonthlyCalculation, Overage, Usage, evaluate_ledger,
};
pub use contract::{
    CompanyId, ContractKind, ContractKindCode, ContractParameters, ContractSettings, CycleState,
    validate_cycle_length, validate_percent,
};
pub use error::DomainError;
pub use overage::{BillingRate, OverageValuation, describe, price_overage};
pub use period::Period;
pub use quantity::{Minutes, Quantity, QuantityKind, Tickets, format_money, round_two};
pub use rollover::{
    ClosureOutcome, apply_closure, cascade_periods, is_period_end, monthly_rollover,
};
