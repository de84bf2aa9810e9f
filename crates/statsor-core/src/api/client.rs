//! HTTP client for the hosted Supabase project.
//!
//! Table access goes through PostgREST (`/rest/v1`), sign-in through GoTrue
//! (`/auth/v1`). Every request carries the project's anon key; requests made
//! while signed in also carry the user's bearer token, which is what the
//! store's row-level security policies key on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Method};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::SessionData;

use super::store::{Query, RemoteStore, Table};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// PostgREST path prefix.
const REST_PATH: &str = "rest/v1";

/// GoTrue path prefix.
const AUTH_PATH: &str = "auth/v1";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// Supabase client.
/// Clone is cheap - reqwest::Client and the session slot are shared.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<SessionData>>>,
}

impl SupabaseClient {
    /// Create a new client for the project at `base_url`.
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Install a previously saved session
    pub async fn set_session(&self, data: SessionData) {
        *self.session.write().await = Some(data);
    }

    pub async fn session(&self) -> Option<SessionData> {
        self.session.read().await.clone()
    }

    /// Drop the current session
    pub async fn sign_out(&self) {
        *self.session.write().await = None;
        info!("Signed out");
    }

    /// Sign in with email and password, installing and returning the session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData, ApiError> {
        let url = format!("{}/{}/token?grant_type=password", self.base_url, AUTH_PATH);
        let body = serde_json::json!({ "email": email, "password": password });
        let data = self.request_token(&url, &body).await?;
        info!(user_id = %data.user_id, "Signed in");
        self.set_session(data.clone()).await;
        Ok(data)
    }

    /// Exchange the stored refresh token for a new access token
    pub async fn refresh(&self) -> Result<SessionData, ApiError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(ApiError::Unauthorized)?;

        let url = format!(
            "{}/{}/token?grant_type=refresh_token",
            self.base_url, AUTH_PATH
        );
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let data = self.request_token(&url, &body).await?;
        debug!(user_id = %data.user_id, "Session refreshed");
        self.set_session(data.clone()).await;
        Ok(data)
    }

    async fn request_token(&self, url: &str, body: &Value) -> Result<SessionData, ApiError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let token: TokenResponse = response.json().await?;
        let now = Utc::now();

        Ok(SessionData {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user.id,
            email: token.user.email.unwrap_or_default(),
            expires_at: now + chrono::Duration::seconds(token.expires_in),
            created_at: now,
        })
    }

    fn auth_headers(&self, token: Option<&str>) -> Result<header::HeaderMap, ApiError> {
        let invalid = |_| ApiError::InvalidResponse("Invalid header value".to_string());

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            header::HeaderValue::from_str(&self.anon_key).map_err(invalid)?,
        );
        let bearer = token.unwrap_or(&self.anon_key);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", bearer)).map_err(invalid)?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table.name())
    }

    /// Send a PostgREST request and decode the returned row array.
    async fn rest(
        &self,
        method: Method,
        table: Table,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Vec<Value>, ApiError> {
        let token = self.session.read().await.as_ref().map(|s| s.access_token.clone());
        let url = self.table_url(table);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers(token.as_deref())?)
            .header("Prefer", "return=representation")
            .query(params);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = Self::check_response(request.send().await?).await?;
        let text = response.text().await?;
        debug!(%method, table = %table, bytes = text.len(), "Store response received");

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {} rows: {}", table, e)))
    }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    async fn current_user(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.user_id.clone())
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>, ApiError> {
        self.rest(Method::GET, query.table, &query.to_params(), None).await
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError> {
        let params = [("select".to_string(), "*".to_string())];
        let rows = self.rest(Method::POST, table, &params, Some(&row)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidResponse(format!("Insert into {} returned no row", table)))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, ApiError> {
        self.rest(Method::PATCH, query.table, &query.to_params(), Some(&patch))
            .await
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Value>, ApiError> {
        self.rest(Method::DELETE, query.table, &query.to_params(), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let client = SupabaseClient::new("https://abc.supabase.co/", "anon").expect("client");
        assert_eq!(
            client.table_url(Table::Players),
            "https://abc.supabase.co/rest/v1/players"
        );
    }

    #[test]
    fn test_auth_headers_fall_back_to_anon_key() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon-key").expect("client");

        let headers = client.auth_headers(None).expect("headers");
        assert_eq!(headers.get("apikey").and_then(|v| v.to_str().ok()), Some("anon-key"));
        assert_eq!(
            headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer anon-key")
        );

        let headers = client.auth_headers(Some("jwt")).expect("headers");
        assert_eq!(
            headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer jwt")
        );
    }

    #[test]
    fn test_parse_token_response() {
        let json = r#"{"access_token":"a","token_type":"bearer","expires_in":3600,"refresh_token":"r","user":{"id":"8d0fd2b3-9ca9-4ba6-bd4e-1f9e2b1c7f10","email":"coach@example.com"}}"#;
        let parsed: TokenResponse = serde_json::from_str(json).expect("token response");
        assert_eq!(parsed.user.id, "8d0fd2b3-9ca9-4ba6-bd4e-1f9e2b1c7f10");
        assert_eq!(parsed.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_current_user_follows_session() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon").expect("client");
        assert_eq!(client.current_user().await, None);

        let now = Utc::now();
        client
            .set_session(SessionData {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
                user_id: "u1".to_string(),
                email: "coach@example.com".to_string(),
                expires_at: now + chrono::Duration::hours(1),
                created_at: now,
            })
            .await;
        assert_eq!(client.current_user().await.as_deref(), Some("u1"));

        client.sign_out().await;
        assert_eq!(client.current_user().await, None);
    }
}
