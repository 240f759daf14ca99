//! Blocking HTTP client for the repository API

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;

use super::auth::{TokenResponse, TokenState};
use crate::config::SourceConfig;
use crate::error::{DupError, Result};
use crate::source::RecordSource;

const TOKEN_PATH: &str = "/oauth/token";
const API_ROOT: &str = "/essential-utility/v3/repositories";

/// Client for one API endpoint, shareable across fetch threads
pub struct EasClient {
    base_url: String,
    api_key: String,
    username: String,
    password: String,
    page_size: u32,
    agent: ureq::Agent,
    tokens: Mutex<TokenState>,
}

impl std::fmt::Debug for EasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl EasClient {
    /// Build a client from source settings; the connection settings must be
    /// complete
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.require_connection()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent())
            .build();

        Ok(Self {
            base_url: config.endpoint.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            username: config.username.clone().unwrap_or_default(),
            password: config.password.clone().unwrap_or_default(),
            page_size: config.page_size.max(1),
            agent,
            tokens: Mutex::new(TokenState::default()),
        })
    }

    fn lock_tokens(&self) -> MutexGuard<'_, TokenState> {
        // A panic while holding the lock leaves at worst a stale token
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `Authorization` header value, authenticating first when needed
    fn authorization(&self) -> Result<String> {
        let mut tokens = self.lock_tokens();
        let now = Utc::now();
        if let Some(bearer) = tokens.bearer(now) {
            return Ok(format!("Bearer {}", bearer));
        }

        let grant = tokens.next_grant(&self.username, &self.password, now);
        tracing::debug!(grant = grant.grant_type(), "requesting access token");

        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let response: TokenResponse = self
            .agent
            .post(&url)
            .set("x-api-key", &self.api_key)
            .send_json(&grant)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    DupError::Auth(format!("{} returned HTTP {}", TOKEN_PATH, code))
                }
                other => DupError::transport(&url, other),
            })?
            .into_json()
            .map_err(|e| DupError::Auth(format!("unreadable token response: {}", e)))?;

        let bearer = format!("Bearer {}", response.bearer_token);
        tokens.apply(response, now);
        Ok(bearer)
    }

    /// GET a JSON document
    fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let authorization = self.authorization()?;
        let response = self
            .agent
            .get(url)
            .set("Authorization", &authorization)
            .set("x-api-key", &self.api_key)
            .call();

        match response {
            Ok(res) => res.into_json().map_err(|e| DupError::transport(url, e)),
            Err(ureq::Error::Status(401, _)) => {
                self.lock_tokens().invalidate();
                Err(DupError::Auth(format!("{} rejected the access token", url)))
            }
            Err(ureq::Error::Status(code, _)) => {
                Err(DupError::transport(url, format!("HTTP {}", code)))
            }
            Err(e) => Err(DupError::transport(url, e)),
        }
    }

    /// Class metadata of a repository, as returned by the API
    pub fn classes_metadata(&self, repo_id: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("{}{}/{}/classes/meta-data", self.base_url, API_ROOT, repo_id))
    }

    fn instances_url(&self, repo_id: &str, class_name: &str, max_depth: u32, slots: &str) -> String {
        instances_url(&self.base_url, repo_id, class_name, max_depth, slots)
    }
}

impl RecordSource for EasClient {
    fn fetch_all(
        &self,
        repo_id: &str,
        class_name: &str,
        max_depth: u32,
        slots: &str,
    ) -> Result<Vec<serde_json::Value>> {
        let base = self.instances_url(repo_id, class_name, max_depth, slots);
        let mut cursor = Some(format!("start=0,count={}", self.page_size));
        let mut instances = Vec::new();
        let mut pages = 0usize;

        while let Some(current) = cursor.take() {
            let url = format!("{}{}", base, cursor_query(&current));
            let mut page = self.get_json(&url)?;
            pages += 1;

            let Some(serde_json::Value::Array(items)) = page.get_mut("instances").map(serde_json::Value::take)
            else {
                break;
            };
            instances.extend(items);

            cursor = page
                .get("next_page")
                .and_then(serde_json::Value::as_str)
                .filter(|next| !next.is_empty())
                .map(str::to_string);

            if cursor.as_deref() == Some(current.as_str()) {
                tracing::warn!(class = class_name, cursor = %current, "pagination cursor did not advance");
                break;
            }
        }

        tracing::debug!(class = class_name, pages, count = instances.len(), "fetched instances");
        Ok(instances)
    }
}

fn instances_url(base_url: &str, repo_id: &str, class_name: &str, max_depth: u32, slots: &str) -> String {
    let mut url = format!(
        "{}{}/{}/classes/{}/instances?maxdepth={}",
        base_url, API_ROOT, repo_id, class_name, max_depth
    );
    if !slots.is_empty() {
        url.push_str("&slots=");
        url.push_str(slots);
    }
    url
}

/// Turn a `start=100,count=100` cursor into `&start=100&count=100`
fn cursor_query(cursor: &str) -> String {
    format!("&{}", cursor.replace(',', "&"))
}
