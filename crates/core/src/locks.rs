// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dashmap::DashMap;
use hourbank_domain::CompanyId;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per company.
///
/// Operations on the same company run one at a time. Looking up a company's
/// mutex only touches one shard of the registry, so different companies
/// never wait on each other.
#[derive(Debug, Clone, Default)]
pub struct CompanyLocks {
    registry: Arc<DashMap<CompanyId, Arc<Mutex<()>>>>,
}

impl CompanyLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and returns exclusive access to `company`.
    ///
    /// The lock is released when the guard is dropped.
    pub async fn acquire(&self, company: CompanyId) -> OwnedMutexGuard<()> {
        // The shard guard must be gone before awaiting
        let lock: Arc<Mutex<()>> = self.registry.entry(company).or_default().clone();
        lock.lock_owned().await
    }
}
