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

mod adjustments;
mod error;
mod ledger;
mod locks;
mod orchestrator;
pub mod ports;
mod resolver;
mod segmenter;
mod valuator;

#[cfg(test)]
mod tests;

pub use adjustments::{AdjustmentManager, AdjustmentOutcome};
pub use error::{CoreError, ErrorContext};
pub use ledger::{ChangeContext, VersionLedger};
pub use locks::CompanyLocks;
pub use orchestrator::CalculationOrchestrator;
pub use ports::{PortError, PortErrorKind, Ports};
pub use resolver::ParameterResolver;
pub use segmenter::Segmenter;
pub use valuator::OverageValuator;

/// The bank services wired to one set of ports.
///
/// All services share a single [`CompanyLocks`] registry, so work on one
/// company is serialized no matter which service started it.
#[derive(Debug, Clone)]
pub struct HourBank {
    orchestrator: CalculationOrchestrator,
    adjustments: AdjustmentManager,
    segmenter: Segmenter,
}

impl HourBank {
    /// Builds every service over `ports`.
    #[must_use]
    pub fn new(ports: Ports) -> Self {
        let locks: CompanyLocks = CompanyLocks::new();
        let orchestrator: CalculationOrchestrator =
            CalculationOrchestrator::new(ports.clone(), locks.clone());
        let adjustments: AdjustmentManager =
            AdjustmentManager::new(ports.adjustments.clone(), orchestrator.clone(), locks);
        let segmenter: Segmenter = Segmenter::new(ports.calculations, ports.allocations);

        Self {
            orchestrator,
            adjustments,
            segmenter,
        }
    }

    /// Monthly computation.
    #[must_use]
    pub const fn calculations(&self) -> &CalculationOrchestrator {
        &self.orchestrator
    }

    /// Adjustment creation, deactivation and listing.
    #[must_use]
    pub const fn adjustments(&self) -> &AdjustmentManager {
        &self.adjustments
    }

    /// Allocation segmentation.
    #[must_use]
    pub const fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Version history and diffs.
    #[must_use]
    pub const fn ledger(&self) -> &VersionLedger {
        self.orchestrator.ledger()
    }
}
