// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::{CoreError, ErrorContext, WithContext};
use crate::ports::{AllocationStore, CalculationStore};
use hourbank_domain::{
    Allocation, CompanyId, MonthlyCalculation, Period, SegmentedCalculation, segment,
    verify_segmented_sum,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Splits stored calculations across a company's allocations.
#[derive(Clone)]
pub struct Segmenter {
    calculations: Arc<dyn CalculationStore>,
    allocations: Arc<dyn AllocationStore>,
}

impl Segmenter {
    /// Creates a segmenter over the calculation and allocation stores.
    #[must_use]
    pub fn new(
        calculations: Arc<dyn CalculationStore>,
        allocations: Arc<dyn AllocationStore>,
    ) -> Self {
        Self {
            calculations,
            allocations,
        }
    }

    /// Segments a calculation across the given allocations.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the active shares do not sum to 100.
    pub fn segment(
        calculation: &MonthlyCalculation,
        allocations: &[Allocation],
    ) -> Result<Vec<SegmentedCalculation>, CoreError> {
        let segments: Vec<SegmentedCalculation> =
            segment(calculation, allocations).within(|| {
                ErrorContext::new("segment")
                    .company(calculation.company)
                    .period(calculation.period)
                    .field("baseline_share_percent")
            })?;

        if !verify_segmented_sum(calculation, &segments) {
            warn!(
                company = %calculation.company,
                period = %calculation.period,
                version = calculation.version,
                "Segment totals drift beyond tolerance"
            );
        }
        Ok(segments)
    }

    /// Segments the latest version of a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the month has never been computed, the allocation
    /// set is invalid, or a store fails.
    pub async fn segment_latest(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<SegmentedCalculation>, CoreError> {
        let context = || ErrorContext::new("segment").company(company).period(period);

        let calculation: MonthlyCalculation = self
            .calculations
            .latest(company, period)
            .await
            .within(context)?
            .ok_or_else(|| CoreError::NotFound {
                context: context(),
                resource: format!("calculation for {period}"),
            })?;
        let allocations: Vec<Allocation> =
            self.allocations.list(company).await.within(context)?;

        debug!(
            company = %company,
            period = %period,
            version = calculation.version,
            allocations = allocations.len(),
            "Segmenting calculation"
        );
        Self::segment(&calculation, &allocations)
    }
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter").finish_non_exhaustive()
    }
}
