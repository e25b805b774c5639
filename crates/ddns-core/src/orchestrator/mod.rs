//! Update orchestrator
//!
//! The Orchestrator runs one update cycle:
//! - Resolving the current public address per family via AddressResolver
//! - Skipping families without a configured record id
//! - Pushing the address via RecordUpdater
//! - Reporting a per-family outcome
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────┐
//!                     │ Orchestrator │
//!                     └──────────────┘
//!                            │
//!             ┌──────────────┴──────────────┐
//!             │ IPv4 first, then IPv6       │
//!             ▼                             ▼
//!   ┌──────────────────┐          ┌──────────────────┐
//!   │ AddressResolver  │          │  RecordUpdater   │
//!   │ (resolve family) │ ───────▶ │ (A / AAAA)       │
//!   └──────────────────┘          └──────────────────┘
//! ```
//!
//! ## Failure isolation
//!
//! Nothing in a cycle propagates an error. A failure for one family is
//! logged, recorded in the [`CycleReport`] and the other family is still
//! processed. There is no retry: the next attempt is the next cycle.

use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::{UpdatePlan, UpdateTarget};
use crate::error::{RemoteUpdateError, ResolutionError};
use crate::traits::{
    AddressFamily, AddressResolver, RecordUpdate, RecordUpdater, ResolvedAddress, UpdateReceipt,
};

/// What happened to one address family during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    /// The address could not be resolved; no update attempted
    ResolutionFailed(ResolutionError),

    /// Resolved, but no record id is configured for this family
    NotConfigured { address: ResolvedAddress },

    /// The provider accepted the update
    Updated {
        address: ResolvedAddress,
        receipt: UpdateReceipt,
    },

    /// The provider call failed (logged and swallowed)
    UpdateFailed {
        address: ResolvedAddress,
        error: RemoteUpdateError,
    },
}

impl FamilyOutcome {
    /// Whether the updater was invoked for this family
    pub fn attempted_update(&self) -> bool {
        matches!(self, Self::Updated { .. } | Self::UpdateFailed { .. })
    }

    /// The address resolved in this cycle, if any
    pub fn address(&self) -> Option<&ResolvedAddress> {
        match self {
            Self::ResolutionFailed(_) => None,
            Self::NotConfigured { address }
            | Self::Updated { address, .. }
            | Self::UpdateFailed { address, .. } => Some(address),
        }
    }
}

/// Per-family result of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub ipv4: FamilyOutcome,
    pub ipv6: FamilyOutcome,
}

impl CycleReport {
    /// Outcome for `family`
    pub fn outcome(&self, family: AddressFamily) -> &FamilyOutcome {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    /// Number of updater invocations in this cycle
    pub fn updates_attempted(&self) -> usize {
        [&self.ipv4, &self.ipv6]
            .into_iter()
            .filter(|o| o.attempted_update())
            .count()
    }
}

/// Runs update cycles against a fixed plan
///
/// Cheap to share: the background task holds it behind an `Arc`.
pub struct Orchestrator {
    /// Public address resolver
    resolver: Arc<dyn AddressResolver>,

    /// DNS record updater
    updater: Arc<dyn RecordUpdater>,

    /// Immutable plan (credentials, domain, targets)
    plan: Arc<UpdatePlan>,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// # Parameters
    ///
    /// - `resolver`: Address resolver implementation
    /// - `updater`: Record updater implementation
    /// - `plan`: Resolved configuration
    pub fn new(
        resolver: Arc<dyn AddressResolver>,
        updater: Arc<dyn RecordUpdater>,
        plan: UpdatePlan,
    ) -> Self {
        Self {
            resolver,
            updater,
            plan: Arc::new(plan),
        }
    }

    /// The plan this orchestrator runs
    pub fn plan(&self) -> &UpdatePlan {
        &self.plan
    }

    /// Run one full cycle: IPv4 then IPv6
    ///
    /// # Returns
    ///
    /// A [`CycleReport`]; this never fails.
    pub async fn run_cycle(&self) -> CycleReport {
        let ipv4 = self.process_family(AddressFamily::V4).await;
        let ipv6 = self.process_family(AddressFamily::V6).await;
        CycleReport { ipv4, ipv6 }
    }

    async fn process_family(&self, family: AddressFamily) -> FamilyOutcome {
        let span = info_span!("family", family = family.label());
        async move {
            info!("Fetching current {} address", family);
            let address = match self.resolver.resolve(family).await {
                Ok(address) => address,
                Err(e) => {
                    error!("Error getting {} address: {}", family, e);
                    return FamilyOutcome::ResolutionFailed(e);
                }
            };
            info!("Current {} address: {}", family, address);

            let target = self.plan.target(family);
            let Some(request) = self.build_update(target, &address) else {
                warn!(
                    "Record id for {} is not set; skipping {} record update",
                    family, target.record_type
                );
                return FamilyOutcome::NotConfigured { address };
            };

            match self.updater.update(&self.plan.credentials, &request).await {
                Ok(receipt) => FamilyOutcome::Updated { address, receipt },
                Err(error) => {
                    // Already logged by the updater; recorded, never propagated
                    warn!(
                        provider = self.updater.provider_name(),
                        "{} record update failed, waiting for next cycle",
                        target.record_type
                    );
                    FamilyOutcome::UpdateFailed { address, error }
                }
            }
        }
        .instrument(span)
        .await
    }

    fn build_update(&self, target: &UpdateTarget, address: &ResolvedAddress) -> Option<RecordUpdate> {
        let record_id = target.record_id?;
        Some(RecordUpdate {
            domain: self.plan.domain.clone(),
            record_id,
            value: address.value.clone(),
            record_type: target.record_type,
            sub_domain: target.effective_sub_domain().to_string(),
        })
    }
}
