// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::{CoreError, ErrorContext, WithContext};
use crate::ports::ParameterStore;
use hourbank_domain::{
    CompanyId, ContractKindCode, ContractParameters, ContractSettings, QuantityKind,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Loads and validates a company's contract parameters.
///
/// The resolver never writes and never invents required values: a missing
/// kind, cycle length or start date fails the caller.
#[derive(Clone)]
pub struct ParameterResolver {
    store: Arc<dyn ParameterStore>,
}

impl ParameterResolver {
    /// Creates a resolver over a parameter store.
    #[must_use]
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self { store }
    }

    /// Resolves the parameters for `company`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The store is unreachable
    /// - The company has no stored settings
    /// - A required parameter is missing
    /// - A configured value is out of range
    pub async fn resolve(&self, company: CompanyId) -> Result<ContractParameters, CoreError> {
        let context = || ErrorContext::new("resolve parameters").company(company);

        let settings: ContractSettings = self
            .store
            .get(company)
            .await
            .within(context)?
            .ok_or_else(|| CoreError::Configuration {
                context: context().field("contract"),
                field: String::from("contract"),
            })?;

        warn_on_missing_baselines(company, &settings);

        let params: ContractParameters =
            ContractParameters::from_settings(company, &settings).within(context)?;
        debug!(
            company = %company,
            kind = %params.kind.code(),
            cycle_length = params.cycle_length_months,
            "Resolved contract parameters"
        );
        Ok(params)
    }
}

fn warn_on_missing_baselines(company: CompanyId, settings: &ContractSettings) {
    let tracked: &[QuantityKind] = match settings.kind {
        Some(ContractKindCode::Hours) => &[QuantityKind::Hours],
        Some(ContractKindCode::Tickets) => &[QuantityKind::Tickets],
        Some(ContractKindCode::Both) => &[QuantityKind::Hours, QuantityKind::Tickets],
        None => &[],
    };

    for kind in tracked {
        let missing: bool = match kind {
            QuantityKind::Hours => settings.hours_baseline.is_none(),
            QuantityKind::Tickets => settings.tickets_baseline.is_none(),
        };
        if missing {
            warn!(
                company = %company,
                kind = %kind,
                "No baseline configured; treating it as zero"
            );
        }
    }
}

impl std::fmt::Debug for ParameterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterResolver").finish_non_exhaustive()
    }
}
