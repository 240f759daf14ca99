//! OAuth token bookkeeping

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens are renewed this long before they actually expire
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Body of a `/oauth/token` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub bearer_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in_minutes: i64,
    #[serde(default)]
    pub refresh_token_expires_in_minutes: i64,
}

/// Body of a `/oauth/token` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRequest<'a> {
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

impl<'a> TokenRequest<'a> {
    pub(crate) fn password(username: &'a str, password: &'a str) -> Self {
        Self {
            grant_type: "password",
            username: Some(username),
            password: Some(password),
            refresh_token: None,
        }
    }

    pub(crate) fn refresh(token: &'a str) -> Self {
        Self {
            grant_type: "refresh_token",
            username: None,
            password: None,
            refresh_token: Some(token),
        }
    }

    pub(crate) fn grant_type(&self) -> &'static str {
        self.grant_type
    }
}

/// Current bearer and refresh tokens with their expiry instants
#[derive(Debug, Clone, Default)]
pub struct TokenState {
    bearer: Option<String>,
    bearer_expires: Option<DateTime<Utc>>,
    refresh: Option<String>,
    refresh_expires: Option<DateTime<Utc>>,
}

fn still_valid(expires: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires.is_some_and(|at| at > now + Duration::seconds(EXPIRY_MARGIN_SECONDS))
}

impl TokenState {
    /// Bearer token usable at `now`
    pub fn bearer(&self, now: DateTime<Utc>) -> Option<&str> {
        if still_valid(self.bearer_expires, now) {
            self.bearer.as_deref()
        } else {
            None
        }
    }

    /// Refresh token usable at `now`
    pub fn refresh_token(&self, now: DateTime<Utc>) -> Option<&str> {
        if still_valid(self.refresh_expires, now) {
            self.refresh.as_deref()
        } else {
            None
        }
    }

    /// Grant to request next: a refresh grant while the refresh token is
    /// valid, otherwise a password grant
    pub(crate) fn next_grant<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
        now: DateTime<Utc>,
    ) -> TokenRequest<'a> {
        match self.refresh_token(now) {
            Some(token) => TokenRequest::refresh(token),
            None => TokenRequest::password(username, password),
        }
    }

    /// Record a token response received at `now`
    pub fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.bearer = Some(response.bearer_token);
        self.bearer_expires = Some(now + Duration::minutes(response.expires_in_minutes));
        self.refresh = response.refresh_token.filter(|t| !t.is_empty());
        self.refresh_expires = self
            .refresh
            .as_ref()
            .map(|_| now + Duration::minutes(response.refresh_token_expires_in_minutes));
    }

    /// Forget the bearer token so the next request re-authenticates
    pub fn invalidate(&mut self) {
        self.bearer = None;
        self.bearer_expires = None;
    }
}
