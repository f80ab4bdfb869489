//! Preference authority API client (system of record for consent).

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use portal_core::errors::{Error as CoreError, Result as CoreResult};
use portal_core::preferences::{AuthorityGateway, PreferenceKey};

use crate::error::{ConnectError, Result};
use crate::http::parse_response;
use crate::types::{OptOutCell, OptOutsResponse, ReplaceOptOutsRequest, SuccessResponse};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the preference authority's opt-out endpoints.
#[derive(Debug, Clone)]
pub struct AuthorityClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthorityClient {
    /// Create a new authority client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the authority API (e.g., "https://accounts.example.com")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create headers for an API request.
    fn headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ConnectError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Get the user's currently opted-out cells; absence means opted-in.
    ///
    /// GET /api/v1/preferences/opt-outs
    pub async fn get_opt_outs(&self, token: &str) -> Result<Vec<OptOutCell>> {
        let url = format!("{}/api/v1/preferences/opt-outs", self.base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers(token)?)
            .send()
            .await?;

        let body: OptOutsResponse = parse_response(response).await?;
        Ok(body.opt_outs)
    }

    /// Replace the user's complete opt-out set. Full replace, not a patch.
    ///
    /// PUT /api/v1/preferences/opt-outs
    pub async fn put_opt_outs(&self, token: &str, opt_outs: Vec<OptOutCell>) -> Result<()> {
        let url = format!("{}/api/v1/preferences/opt-outs", self.base_url);
        debug!("Replacing {} opted-out cell(s)", opt_outs.len());

        let response = self
            .client
            .put(&url)
            .headers(self.headers(token)?)
            .json(&ReplaceOptOutsRequest { opt_outs })
            .send()
            .await?;

        let _: SuccessResponse = parse_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthorityGateway for AuthorityClient {
    async fn fetch_opt_outs(&self, user_token: &str) -> CoreResult<Vec<PreferenceKey>> {
        let cells = self
            .get_opt_outs(user_token)
            .await
            .map_err(|err| CoreError::AuthorityFetchFailed(err.to_string()))?;
        Ok(cells
            .into_iter()
            .map(|cell| PreferenceKey::new(cell.topic_id.into(), cell.channel_id.into()))
            .collect())
    }

    async fn replace_opt_outs(
        &self,
        user_token: &str,
        opt_outs: &[PreferenceKey],
    ) -> CoreResult<()> {
        let cells = opt_outs
            .iter()
            .map(|key| OptOutCell {
                topic_id: key.topic_id.to_string(),
                channel_id: key.channel_id.to_string(),
            })
            .collect();
        self.put_opt_outs(user_token, cells)
            .await
            .map_err(|err| CoreError::AuthorityWriteFailed(err.to_string()))
    }
}
