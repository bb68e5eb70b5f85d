//! Hosted backend client (PostgREST-style REST API)
//!
//! Tables are exposed at `<base>/rest/v1/<table>`; filters are query
//! parameters of the form `column=eq.value` and ordering is
//! `order=column.asc|desc`. Requests carry the project API key. The bearer
//! credential is the backend access token when one is stored, otherwise the
//! API key itself; the local session token is never sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::ports::key_value::keys;
use crate::ports::{BackendStore, Filter, Identity, KeyValueStore, Order, Row, Table};

/// Request timeout for backend calls
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

/// REST implementation of [`BackendStore`]
pub struct RestBackend {
    client: Client,
    base_url: Url,
    api_key: String,
    session: Arc<dyn KeyValueStore>,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str, session: Arc<dyn KeyValueStore>) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config("backend API key cannot be empty".to_string()));
        }
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid backend URL {:?}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            session,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| Error::Config(format!("invalid backend URL: {}", e)))
    }

    /// URL for a table request with filter and ordering applied
    fn table_url(&self, table: Table, filter: &Filter, order: Option<&Order>) -> Result<Url> {
        let mut url = self.endpoint(&format!("rest/v1/{}", table.name()))?;
        {
            let mut query = url.query_pairs_mut();
            for (column, value) in filter.predicates() {
                query.append_pair(column, &filter_value(value));
            }
            if let Some(order) = order {
                let direction = if order.ascending { "asc" } else { "desc" };
                query.append_pair("order", &format!("{}.{}", order.column, direction));
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .session
            .get(keys::BACKEND_ACCESS_TOKEN)?
            .unwrap_or_else(|| self.api_key.clone());
        Ok(request.header("apikey", &self.api_key).bearer_auth(token))
    }

    /// Drop the persisted session after the backend rejected its credential
    fn expire_session(&self) {
        for key in [keys::BACKEND_ACCESS_TOKEN, keys::SESSION_TOKEN, keys::CURRENT_USER_ID] {
            if let Err(e) = self.session.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear session key");
            }
        }
    }

    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::info!("backend rejected the access token, signing out");
                self.expire_session();
                Err(Error::SessionExpired)
            }
            StatusCode::CONFLICT => Err(Error::AlreadyExists(body)),
            _ => Err(Error::persistence(format!("backend returned HTTP {}: {}", status, body))),
        }
    }
}

/// Encode a filter value as a PostgREST operator expression
fn filter_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "is.null".to_string(),
        JsonValue::String(s) => format!("eq.{}", s),
        other => format!("eq.{}", other),
    }
}

#[async_trait]
impl BackendStore for RestBackend {
    async fn insert(&self, table: Table, row: Row) -> Result<Row> {
        let url = self.endpoint(&format!("rest/v1/{}", table.name()))?;
        let request = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.check(self.authorize(request)?.send().await?).await?;
        let mut rows: Vec<Row> = response.json().await?;
        if rows.is_empty() {
            return Err(Error::persistence(format!("insert into {} returned no row", table)));
        }
        Ok(rows.swap_remove(0))
    }

    async fn select(&self, table: Table, filter: &Filter, order: Option<&Order>) -> Result<Vec<Row>> {
        let url = self.table_url(table, filter, order)?;
        let request = self.client.get(url);
        let response = self.check(self.authorize(request)?.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<()> {
        let url = self.table_url(table, filter, None)?;
        let request = self.client.patch(url).json(&patch);
        self.check(self.authorize(request)?.send().await?).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<Identity>> {
        if self.session.get(keys::BACKEND_ACCESS_TOKEN)?.is_none() {
            return Ok(None);
        }
        let request = self.client.get(self.endpoint("auth/v1/user")?);
        let response = self.check(self.authorize(request)?.send().await?).await?;
        let user: AuthUser = response.json().await?;
        Ok(Some(Identity { id: user.id }))
    }
}
