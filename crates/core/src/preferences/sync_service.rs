//! Save-cycle orchestration against the two remote systems.
//!
//! The preference authority is the system of record for compliance
//! sensitive consent; the engagement platform is a best-effort downstream
//! mirror. Consistency is eventual and one-directional: the mirror's
//! state never overrides or blocks the authority's.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::{debug, warn};

use crate::errors::{Error, Result};
use crate::events::{AuditEvent, AuditEventSink, NoOpAuditEventSink};
use crate::preferences::diff::build_sync_plan;
use crate::preferences::mapping::SubscriptionGroupMapping;
use crate::preferences::model::{
    ChangeRecord, GroupId, PreferenceCatalog, PreferenceKey, PreferenceMatrix, SubscriptionState,
};
use crate::preferences::snapshot_store::SnapshotStore;

/// System-of-record access for consent state.
#[async_trait]
pub trait AuthorityGateway: Send + Sync {
    /// Currently opted-out cells; absence means opted-in.
    async fn fetch_opt_outs(&self, user_token: &str) -> Result<Vec<PreferenceKey>>;

    /// Full replace of the opted-out cell set, not a patch.
    async fn replace_opt_outs(
        &self,
        user_token: &str,
        opt_outs: &[PreferenceKey],
    ) -> Result<()>;
}

/// Downstream engagement mirror.
#[async_trait]
pub trait EngagementGateway: Send + Sync {
    async fn set_subscription_group_states(
        &self,
        states: &BTreeMap<GroupId, SubscriptionState>,
    ) -> Result<()>;
}

/// Why a save cycle ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    AuthorityWrite,
    EngagementWrite,
}

/// Save-cycle lifecycle. `Saving` is the mutual-exclusion mechanism:
/// one cycle per session, guarded here even though the UI also disables
/// re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Saving,
    Reconciled,
    Failed(FailureReason),
}

/// Outcome of a save cycle that committed to the system of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Both writes landed, or the engagement payload was empty.
    Reconciled { changes: Vec<ChangeRecord> },
    /// The authority committed and the snapshot advanced, but the
    /// engagement mirror did not; the mismatch is logged for out-of-band
    /// reconciliation and never retried inline.
    PartialSuccess {
        changes: Vec<ChangeRecord>,
        reason: String,
    },
}

/// Orchestrates one-directional preference synchronization for a single
/// user session.
pub struct PreferenceSyncService {
    catalog: PreferenceCatalog,
    mapping: SubscriptionGroupMapping,
    snapshot_store: SnapshotStore,
    authority: Arc<dyn AuthorityGateway>,
    engagement: Arc<dyn EngagementGateway>,
    audit_sink: Arc<dyn AuditEventSink>,
    phase: RwLock<SyncPhase>,
}

impl PreferenceSyncService {
    pub fn new(
        catalog: PreferenceCatalog,
        mapping: SubscriptionGroupMapping,
        authority: Arc<dyn AuthorityGateway>,
        engagement: Arc<dyn EngagementGateway>,
    ) -> Self {
        Self {
            catalog,
            mapping,
            snapshot_store: SnapshotStore::new(),
            authority,
            engagement,
            audit_sink: Arc::new(NoOpAuditEventSink),
            phase: RwLock::new(SyncPhase::Idle),
        }
    }

    /// Sets the audit sink for emitting change events after reconciled
    /// saves.
    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditEventSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    pub fn catalog(&self) -> &PreferenceCatalog {
        &self.catalog
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.read().unwrap()
    }

    /// Current snapshot, fetching from the authority when the store is
    /// still unloaded for this session.
    pub async fn get_snapshot(&self, user_token: &str) -> Result<PreferenceMatrix> {
        if self.snapshot_store.is_loaded() {
            return self.snapshot_store.current();
        }
        if self.phase() == SyncPhase::Saving {
            return Err(Error::AlreadyInProgress);
        }

        let opt_outs = self
            .authority
            .fetch_opt_outs(user_token)
            .await
            .map_err(|err| match err {
                fetch @ Error::AuthorityFetchFailed(_) => fetch,
                other => Error::AuthorityFetchFailed(other.to_string()),
            })?;
        let matrix = PreferenceMatrix::from_opt_outs(&self.catalog, &opt_outs);
        self.snapshot_store.load(matrix.clone());
        debug!(
            "Loaded preference snapshot with {} opted-out cell(s)",
            opt_outs.len()
        );
        Ok(matrix)
    }

    /// Discard local edits: the stored snapshot, unchanged.
    pub fn revert(&self) -> Result<PreferenceMatrix> {
        self.snapshot_store.current()
    }

    /// Run one save cycle.
    ///
    /// Sequencing contract:
    /// 1. Authority write first. On failure nothing changes locally and
    ///    the user can retry without re-entering edits.
    /// 2. Authority acceptance commits the desired matrix to the
    ///    snapshot store immediately.
    /// 3. The engagement write follows; its failure downgrades the
    ///    result to `PartialSuccess` but never rolls back step 2.
    /// 4. On full reconciliation one audit event with the complete
    ///    change list is emitted.
    pub async fn save(&self, user_token: &str, desired: PreferenceMatrix) -> Result<SaveOutcome> {
        self.begin_save()?;
        let result = self.run_save_cycle(user_token, desired).await;
        let next_phase = match &result {
            Ok(SaveOutcome::Reconciled { .. }) => SyncPhase::Reconciled,
            Ok(SaveOutcome::PartialSuccess { .. }) => {
                SyncPhase::Failed(FailureReason::EngagementWrite)
            }
            Err(Error::AuthorityWriteFailed(_)) => SyncPhase::Failed(FailureReason::AuthorityWrite),
            // Rejected before any remote call (NotLoaded, malformed
            // matrix): the cycle never started.
            Err(_) => SyncPhase::Idle,
        };
        self.finish_save(next_phase);
        result
    }

    fn begin_save(&self) -> Result<()> {
        let mut phase = self.phase.write().unwrap();
        if *phase == SyncPhase::Saving {
            return Err(Error::AlreadyInProgress);
        }
        *phase = SyncPhase::Saving;
        Ok(())
    }

    fn finish_save(&self, next: SyncPhase) {
        *self.phase.write().unwrap() = next;
    }

    async fn run_save_cycle(
        &self,
        user_token: &str,
        desired: PreferenceMatrix,
    ) -> Result<SaveOutcome> {
        let snapshot = self.snapshot_store.current()?;
        let plan = build_sync_plan(&self.catalog, &self.mapping, &snapshot, &desired)?;
        debug!(
            "Save cycle: {} change(s), {} opt-out(s), {} group state(s)",
            plan.changes.len(),
            plan.authority_opt_outs.len(),
            plan.engagement_states.len()
        );

        if let Err(err) = self
            .authority
            .replace_opt_outs(user_token, &plan.authority_opt_outs)
            .await
        {
            warn!("Authority write rejected; snapshot left untouched: {}", err);
            return Err(match err {
                write @ Error::AuthorityWriteFailed(_) => write,
                other => Error::AuthorityWriteFailed(other.to_string()),
            });
        }

        // Authority acceptance is sufficient to commit locally even if
        // the mirror is unreachable.
        self.snapshot_store.load(desired);

        if !plan.engagement_states.is_empty() {
            if let Err(err) = self
                .engagement
                .set_subscription_group_states(&plan.engagement_states)
                .await
            {
                warn!(
                    "Engagement mirror write failed after authority commit; {} group state(s) \
                     need out-of-band reconciliation: {}",
                    plan.engagement_states.len(),
                    err
                );
                return Ok(SaveOutcome::PartialSuccess {
                    changes: plan.changes,
                    reason: err.to_string(),
                });
            }
        }

        self.audit_sink
            .emit(AuditEvent::preferences_updated(plan.changes.clone()));
        Ok(SaveOutcome::Reconciled {
            changes: plan.changes,
        })
    }
}
