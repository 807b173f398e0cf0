// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! - `reference`: Contracts, usage, billing rates and allocations
//! - `calculations`: Calculation versions
//! - `adjustments`: Manual adjustments
//! - `audit`: Version records

pub mod adjustments;
pub mod audit;
pub mod calculations;
pub mod reference;

pub use adjustments::{get_adjustment, list_adjustments};
pub use audit::list_version_records;
pub use calculations::{get_calculation_version, latest_calculation, latest_version_number};
pub use reference::{get_contract, get_usage, latest_rate, list_allocations};
