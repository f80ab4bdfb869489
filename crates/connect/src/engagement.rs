//! Engagement platform API client (subscription mirror + audit events).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use portal_core::errors::{Error as CoreError, Result as CoreResult};
use portal_core::events::{AuditEvent, AuditEventSink};
use portal_core::preferences::{EngagementGateway, GroupId, SubscriptionState};

use crate::error::{ConnectError, Result};
use crate::http::parse_response;
use crate::types::{
    SetSubscriptionStatesRequest, SubscriptionGroupEntry, SuccessResponse, TrackEventRequest,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the engagement platform's subscription and event endpoints.
#[derive(Debug, Clone)]
pub struct EngagementClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EngagementClient {
    /// Create a new engagement client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the engagement REST API
    /// * `api_key` - The workspace API key
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| ConnectError::auth("Invalid API key format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Set subscription group membership states.
    ///
    /// POST /subscription/status/set
    pub async fn set_group_states(&self, groups: Vec<SubscriptionGroupEntry>) -> Result<()> {
        let url = format!("{}/subscription/status/set", self.base_url);
        debug!("Setting {} subscription group state(s)", groups.len());

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&SetSubscriptionStatesRequest {
                subscription_groups: groups,
            })
            .send()
            .await?;

        let _: SuccessResponse = parse_response(response).await?;
        Ok(())
    }

    /// Track one analytics/audit event.
    ///
    /// POST /events/track
    pub async fn track_event(&self, event: TrackEventRequest) -> Result<()> {
        let url = format!("{}/events/track", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&event)
            .send()
            .await?;

        let _: SuccessResponse = parse_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl EngagementGateway for EngagementClient {
    async fn set_subscription_group_states(
        &self,
        states: &BTreeMap<GroupId, SubscriptionState>,
    ) -> CoreResult<()> {
        let groups = states
            .iter()
            .map(|(group_id, state)| SubscriptionGroupEntry {
                subscription_group_id: group_id.to_string(),
                subscription_state: *state,
            })
            .collect();
        self.set_group_states(groups)
            .await
            .map_err(|err| CoreError::EngagementWriteFailed(err.to_string()))
    }
}

/// Bridges the core audit sink to the engagement event endpoint.
///
/// Delivery is spawned onto the runtime and never awaited: a dropped
/// audit event is logged, but it cannot block or fail the save cycle
/// that emitted it.
pub struct EngagementAuditSink {
    client: EngagementClient,
}

impl EngagementAuditSink {
    pub fn new(client: EngagementClient) -> Self {
        Self { client }
    }
}

impl AuditEventSink for EngagementAuditSink {
    fn emit(&self, event: AuditEvent) {
        let client = self.client.clone();
        tokio::spawn(async move {
            let request = TrackEventRequest {
                name: event.name.clone(),
                time: event.occurred_at.clone(),
                properties: serde_json::json!({ "changes": event.changes }),
            };
            if let Err(err) = client.track_event(request).await {
                warn!(
                    "Audit event {} dropped ({:?}): {}",
                    event.event_id,
                    err.retry_class(),
                    err
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_scripted_server, ScriptedResponse};
    use portal_core::preferences::ChangeRecord;

    #[tokio::test]
    async fn set_group_states_sends_snake_case_states() {
        let (base_url, captured, server) = spawn_scripted_server(vec![ScriptedResponse {
            status: 200,
            body: r#"{"success":true}"#.to_string(),
        }])
        .await;

        let client = EngagementClient::new(&base_url, "api-key");
        client
            .set_group_states(vec![SubscriptionGroupEntry {
                subscription_group_id: "grp-marketing-email".to_string(),
                subscription_state: SubscriptionState::Unsubscribed,
            }])
            .await
            .expect("set states");

        let requests = captured.lock().await.clone();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/subscription/status/set");
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer api-key")
        );
        assert!(requests[0].body.contains(r#""subscriptionState":"unsubscribed""#));

        server.abort();
    }

    #[tokio::test]
    async fn gateway_maps_mirror_failure_to_engagement_write_failed() {
        let (base_url, _captured, server) = spawn_scripted_server(vec![ScriptedResponse {
            status: 503,
            body: r#"{"error":"error","code":"UNAVAILABLE","message":"maintenance"}"#.to_string(),
        }])
        .await;

        let client = EngagementClient::new(&base_url, "api-key");
        let states = BTreeMap::from([(
            GroupId::from("grp-marketing-email"),
            SubscriptionState::Subscribed,
        )]);
        let result = client.set_subscription_group_states(&states).await;

        assert!(matches!(result, Err(CoreError::EngagementWriteFailed(_))));
        server.abort();
    }

    #[tokio::test]
    async fn audit_sink_delivers_change_list_without_blocking() {
        let (base_url, captured, server) = spawn_scripted_server(vec![ScriptedResponse {
            status: 200,
            body: r#"{"success":true}"#.to_string(),
        }])
        .await;

        let sink = EngagementAuditSink::new(EngagementClient::new(&base_url, "api-key"));
        sink.emit(AuditEvent::preferences_updated(vec![ChangeRecord {
            topic_id: "marketing".into(),
            channel_id: "email".into(),
            old_state: true,
            new_state: false,
        }]));

        // emit returns immediately; wait for the spawned delivery
        let mut delivered = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if !captured.lock().await.is_empty() {
                delivered = true;
                break;
            }
        }
        assert!(delivered, "audit event never reached the mock server");

        let requests = captured.lock().await.clone();
        assert_eq!(requests[0].path, "/events/track");
        assert!(requests[0].body.contains("notification_preferences_updated"));
        assert!(requests[0].body.contains(r#""topicId":"marketing""#));

        server.abort();
    }
}
