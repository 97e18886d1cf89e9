//! File-backed deal ledger.
//!
//! Wraps a [`VersionedFile`] holding the whole deals document. The gateway's
//! single-region deployment keeps the ledger on local disk (or a mounted
//! bucket); the [`DealLedger`] trait is the seam a remote store with native
//! conditional writes would slot into.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{DealLedger, LedgerError};
use crate::store::{Version, VersionedFile};
use crate::types::Deals;

/// Deal ledger persisted as `deals.<gen>.json` in a directory.
pub struct FileLedger {
    store: VersionedFile<Deals>,
}

impl FileLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileLedger {
            store: VersionedFile::new(dir, "deals"),
        }
    }
}

#[async_trait]
impl DealLedger for FileLedger {
    async fn load(&self) -> Result<(Deals, Version), LedgerError> {
        Ok(self.store.load()?)
    }

    async fn save(&self, deals: &Deals, expected: Version) -> Result<Version, LedgerError> {
        Ok(self.store.save(deals, expected)?)
    }
}
