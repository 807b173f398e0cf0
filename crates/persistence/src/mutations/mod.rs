// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! - `calculations`: Version inserts behind the optimistic version check,
//!   together with their version record
//! - `adjustments`: Adjustment inserts and soft deactivation
//! - `audit`: Version record appends
//! - `seeding`: Reference data upserts (contracts, usage, rates, allocations)
//!
//! Calculations and version records are append-only; the schema rejects
//! updates and deletes on both tables.

pub mod adjustments;
pub mod audit;
pub mod calculations;
pub mod seeding;

pub use adjustments::{deactivate_adjustment, insert_adjustment};
pub use calculations::insert_versioned_calculation;
pub use seeding::{put_allocation, put_contract, put_rate, put_usage};
