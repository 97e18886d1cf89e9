//! The deal ledger: the authoritative store of all deals.
//!
//! The ledger is a whole-document resource with no partial-update primitive.
//! Every writer re-loads, mutates, and saves as one logical unit; the version
//! token makes the save conditional so concurrent writers cannot silently
//! clobber each other. [`promote_deal`] packages that discipline as a bounded
//! retry loop for the one mutation this gateway performs.

use async_trait::async_trait;
use tracing::debug;

use crate::store::{StoreError, Version};
use crate::types::{DealId, Deals, PackageTier};

mod file;

pub use file::FileLedger;

/// Errors that can occur against the ledger store.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The underlying store failed (unreachable, unreadable, malformed).
    #[error("ledger store error: {0}")]
    Store(#[from] StoreError),

    /// The conditional write kept losing to concurrent writers.
    #[error("ledger update contention: gave up after {attempts} attempts")]
    Contention { attempts: u32 },
}

/// Read/write access to the whole ledger document.
///
/// `save` succeeds only if the document is unchanged since the `load` that
/// produced `expected`; otherwise it fails with
/// [`StoreError::Conflict`] and the caller retries from a fresh load.
#[async_trait]
pub trait DealLedger: Send + Sync {
    /// Loads the full ledger and its version token.
    async fn load(&self) -> Result<(Deals, Version), LedgerError>;

    /// Conditionally writes the full ledger back.
    async fn save(&self, deals: &Deals, expected: Version) -> Result<Version, LedgerError>;
}

/// Outcome of a promotion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// The deal transitioned to promoted with the given package.
    Promoted,
    /// The deal already carried this promotion; nothing was written.
    /// Duplicate webhook deliveries land here, and downstream triggers
    /// must not fire again.
    AlreadyPromoted,
    /// No deal with this id exists in the ledger.
    UnknownDeal,
}

/// Maximum save attempts before giving up on a contended update.
const MAX_ATTEMPTS: u32 = 5;

/// Marks a deal as promoted with the given package tier.
///
/// Runs the load → mutate → conditional-save cycle, retrying on version
/// conflicts up to a bounded number of attempts. Reapplying an identical
/// promotion is detected before writing and reported as
/// [`PromotionOutcome::AlreadyPromoted`].
pub async fn promote_deal(
    ledger: &dyn DealLedger,
    deal_id: &DealId,
    package: PackageTier,
) -> Result<PromotionOutcome, LedgerError> {
    for attempt in 1..=MAX_ATTEMPTS {
        let (mut deals, version) = ledger.load().await?;

        let Some(deal) = deals.find_mut(deal_id) else {
            return Ok(PromotionOutcome::UnknownDeal);
        };
        if deal.promoted && deal.package == package {
            return Ok(PromotionOutcome::AlreadyPromoted);
        }
        deal.promoted = true;
        deal.package = package;

        match ledger.save(&deals, version).await {
            Ok(_) => return Ok(PromotionOutcome::Promoted),
            Err(LedgerError::Store(StoreError::Conflict { .. })) => {
                debug!(
                    deal_id = %deal_id,
                    attempt,
                    "ledger changed underneath promotion, retrying"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Err(LedgerError::Contention {
        attempts: MAX_ATTEMPTS,
    })
}
