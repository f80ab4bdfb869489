//! Pure diff & translation from matrix edits to remote payloads.

use std::collections::BTreeMap;

use log::warn;

use crate::errors::{Error, Result};
use crate::preferences::mapping::SubscriptionGroupMapping;
use crate::preferences::model::{
    ChangeRecord, GroupId, PreferenceCatalog, PreferenceKey, PreferenceMatrix, SubscriptionState,
};

/// Payloads and audit material for one save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncPlan {
    /// Complete desired opt-out set, in canonical order. The authority's
    /// write is a full replace, not a patch; mandatory topics never
    /// appear here.
    pub authority_opt_outs: Vec<PreferenceKey>,
    /// Group states for cells that changed, are relevant, and have a
    /// mapping entry.
    pub engagement_states: BTreeMap<GroupId, SubscriptionState>,
    /// One record per cell whose state flipped, in canonical order.
    pub changes: Vec<ChangeRecord>,
}

impl SyncPlan {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Build the plan for one save cycle from the last confirmed snapshot and
/// the user's desired matrix.
///
/// Pure and synchronous; inputs are never mutated. Total over well-formed
/// inputs: equal matrices yield empty payloads, never an error. When two
/// changed cells resolve to the same subscription group with conflicting
/// desired states, the cell later in canonical catalog order wins and the
/// conflict is logged.
pub fn build_sync_plan(
    catalog: &PreferenceCatalog,
    mapping: &SubscriptionGroupMapping,
    snapshot: &PreferenceMatrix,
    desired: &PreferenceMatrix,
) -> Result<SyncPlan> {
    ensure_total(catalog, snapshot, "snapshot")?;
    ensure_total(catalog, desired, "desired")?;

    let mut plan = SyncPlan::default();

    for topic in catalog.topics() {
        for channel in catalog.channels() {
            let key = PreferenceKey::new(topic.id.clone(), channel.id.clone());
            let old_state = snapshot.state(&key)?;
            let new_state = desired.state(&key)?;

            if topic.can_opt_out && !new_state {
                plan.authority_opt_outs.push(key.clone());
            }

            if old_state == new_state {
                continue;
            }

            plan.changes.push(ChangeRecord {
                topic_id: topic.id.clone(),
                channel_id: channel.id.clone(),
                old_state,
                new_state,
            });

            if !mapping.is_relevant(&topic.id) {
                continue;
            }
            let Some(group_id) = mapping.lookup(&topic.id, &channel.id) else {
                continue;
            };
            let next = SubscriptionState::from_opted_in(new_state);
            if let Some(previous) = plan.engagement_states.insert(group_id.clone(), next) {
                if previous != next {
                    warn!(
                        "Conflicting desired states for subscription group {}; keeping {:?} from cell {}",
                        group_id, next, key
                    );
                }
            }
        }
    }

    Ok(plan)
}

fn ensure_total(
    catalog: &PreferenceCatalog,
    matrix: &PreferenceMatrix,
    label: &str,
) -> Result<()> {
    if matrix.is_total_over(catalog) {
        return Ok(());
    }
    Err(Error::MatrixNotTotal(format!(
        "{} matrix has {} cell(s), catalog has {}",
        label,
        matrix.len(),
        catalog.cell_count()
    )))
}
