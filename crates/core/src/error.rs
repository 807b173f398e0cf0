// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::ports::{PortError, PortErrorKind};
use hourbank_domain::{CompanyId, DomainError, Period};

/// Where an error happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The public operation that failed (e.g. `compute`).
    pub operation: &'static str,
    /// The company being processed, when known.
    pub company: Option<CompanyId>,
    /// The month being processed, when known.
    pub period: Option<Period>,
    /// The offending field, when one can be named.
    pub field: Option<String>,
}

impl ErrorContext {
    /// Creates a context for `operation`.
    #[must_use]
    pub const fn new(operation: &'static str) -> Self {
        Self {
            operation,
            company: None,
            period: None,
            field: None,
        }
    }

    /// Attaches the company.
    #[must_use]
    pub const fn company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    /// Attaches the month.
    #[must_use]
    pub const fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Attaches the offending field.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.operation)?;
        if let Some(company) = self.company {
            write!(f, " for company {company}")?;
        }
        if let Some(period) = self.period {
            write!(f, " in {period}")?;
        }
        if let Some(field) = &self.field {
            write!(f, " ({field})")?;
        }
        Ok(())
    }
}

/// Errors returned by the bank services.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Contract parameters are missing. Blocks the computation.
    #[error("{context} failed: contract parameter '{field}' is not configured")]
    Configuration {
        /// Where it happened.
        context: ErrorContext,
        /// The missing parameter.
        field: String,
    },
    /// Input or configuration values violate a bank rule.
    #[error("{context} failed: {source}")]
    Validation {
        /// Where it happened.
        context: ErrorContext,
        /// The violated rule.
        source: DomainError,
    },
    /// A referenced record does not exist.
    #[error("{context} failed: {resource} not found")]
    NotFound {
        /// Where it happened.
        context: ErrorContext,
        /// Description of the missing record.
        resource: String,
    },
    /// A store or provider failed.
    #[error("{context} failed: {message}")]
    Integration {
        /// Where it happened.
        context: ErrorContext,
        /// Backend detail.
        message: String,
        /// Whether retrying may succeed.
        retryable: bool,
    },
    /// A concurrent write produced the same version first.
    #[error("{context} failed: {message}")]
    Conflict {
        /// Where it happened.
        context: ErrorContext,
        /// Backend detail.
        message: String,
    },
}

impl CoreError {
    /// Classifies a domain rule violation.
    ///
    /// Missing contract parameters become [`CoreError::Configuration`];
    /// everything else is a [`CoreError::Validation`].
    #[must_use]
    pub fn from_domain(context: ErrorContext, err: DomainError) -> Self {
        match err {
            DomainError::NotConfigured { field } => Self::Configuration {
                context: context.field(field),
                field: field.to_string(),
            },
            source => Self::Validation { context, source },
        }
    }

    /// Classifies a port failure.
    #[must_use]
    pub fn from_port(context: ErrorContext, err: PortError) -> Self {
        match err.kind {
            PortErrorKind::Unavailable => Self::Integration {
                context,
                message: err.message,
                retryable: true,
            },
            PortErrorKind::Rejected => Self::Integration {
                context,
                message: err.message,
                retryable: false,
            },
            PortErrorKind::Conflict => Self::Conflict {
                context,
                message: err.message,
            },
            PortErrorKind::NotFound => Self::NotFound {
                context,
                resource: err.message,
            },
        }
    }

    /// Returns the context the error was raised in.
    #[must_use]
    pub const fn context(&self) -> &ErrorContext {
        match self {
            Self::Configuration { context, .. }
            | Self::Validation { context, .. }
            | Self::NotFound { context, .. }
            | Self::Integration { context, .. }
            | Self::Conflict { context, .. } => context,
        }
    }

    /// Returns true if resubmitting the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Integration { retryable, .. } => *retryable,
            Self::Conflict { .. } => true,
            Self::Configuration { .. } | Self::Validation { .. } | Self::NotFound { .. } => false,
        }
    }
}

/// Adds an [`ErrorContext`] to port and domain results.
pub(crate) trait WithContext<T> {
    fn within(self, context: impl FnOnce() -> ErrorContext) -> Result<T, CoreError>;
}

impl<T> WithContext<T> for Result<T, PortError> {
    fn within(self, context: impl FnOnce() -> ErrorContext) -> Result<T, CoreError> {
        self.map_err(|err| CoreError::from_port(context(), err))
    }
}

impl<T> WithContext<T> for Result<T, DomainError> {
    fn within(self, context: impl FnOnce() -> ErrorContext) -> Result<T, CoreError> {
        self.map_err(|err| CoreError::from_domain(context(), err))
    }
}
