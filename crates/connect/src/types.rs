//! Wire types for the authority and engagement APIs.

use portal_core::preferences::SubscriptionState;
use serde::{Deserialize, Serialize};

/// One opted-out (topic, channel) cell on the authority's wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptOutCell {
    pub topic_id: String,
    pub channel_id: String,
}

/// GET /api/v1/preferences/opt-outs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptOutsResponse {
    pub opt_outs: Vec<OptOutCell>,
}

/// PUT /api/v1/preferences/opt-outs — full replace, not incremental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOptOutsRequest {
    pub opt_outs: Vec<OptOutCell>,
}

/// One subscription group status on the engagement platform's wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionGroupEntry {
    pub subscription_group_id: String,
    pub subscription_state: SubscriptionState,
}

/// POST /subscription/status/set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSubscriptionStatesRequest {
    pub subscription_groups: Vec<SubscriptionGroupEntry>,
}

/// POST /events/track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    pub name: String,
    pub time: String,
    pub properties: serde_json::Value,
}

/// Generic success acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response body shared by both services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}
