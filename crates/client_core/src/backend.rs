//! HTTP client for the hosted backend: the PostgREST data API under
//! `/rest/v1` and the auth API under `/auth/v1`.

use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use shared::{
    error::BackendError,
    protocol::{SessionUser, AUTH_PATH, REST_PATH},
};
use tracing::debug;
use url::Url;

use crate::{error::StoreError, AuthService, DataStore};

const PREFER_HEADER: &str = "Prefer";
const APIKEY_HEADER: &str = "apikey";

/// Row filter understood by the data API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: String, value: String },
    In { column: String, values: Vec<String> },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn in_list<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } => column,
        }
    }

    /// Right-hand side of the query pair, e.g. `eq.user-42` or `in.(1,2,3)`.
    pub fn operator_expression(&self) -> String {
        match self {
            Filter::Eq { value, .. } => format!("eq.{value}"),
            Filter::In { values, .. } => {
                let items = values
                    .iter()
                    .map(|value| quote_list_item(value))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("in.({items})")
            }
        }
    }
}

fn quote_list_item(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ':') || c.is_whitespace());
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub table: String,
    pub columns: String,
    pub filter: Option<Filter>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>, columns: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: columns.into(),
            filter: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Whether an insert should echo the stored rows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    Representation,
    Minimal,
}

impl Returning {
    fn prefer_header(self) -> &'static str {
        match self {
            Returning::Representation => "return=representation",
            Returning::Minimal => "return=minimal",
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    access_token: Option<String>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_access_token", &self.access_token.is_some())
            .finish()
    }
}

impl BackendClient {
    pub fn new(base_url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    /// Acts on behalf of the signed-in user instead of the anonymous role.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        let token = access_token.into();
        self.access_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    fn endpoint(&self, prefix: &str, path: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::Transport(format!(
                    "backend url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(prefix.split('/'))
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        builder
            .header(APIKEY_HEADER, self.anon_key.as_str())
            .bearer_auth(bearer)
    }
}

#[async_trait]
impl DataStore for BackendClient {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, StoreError> {
        let url = self.endpoint(REST_PATH, &query.table)?;
        let mut params = vec![("select".to_string(), query.columns.clone())];
        if let Some(filter) = &query.filter {
            params.push((filter.column().to_string(), filter.operator_expression()));
        }
        debug!(table = %query.table, filter = ?query.filter, "backend: select");

        let response = self
            .authorized(self.http.get(url))
            .query(&params)
            .send()
            .await?;
        read_rows(response).await
    }

    async fn insert(
        &self,
        table: &str,
        rows: Vec<Value>,
        returning: Returning,
    ) -> Result<Vec<Value>, StoreError> {
        let url = self.endpoint(REST_PATH, table)?;
        debug!(table, rows = rows.len(), ?returning, "backend: insert");

        let mut request = self
            .authorized(self.http.post(url))
            .header(PREFER_HEADER, HeaderValue::from_static(returning.prefer_header()))
            .json(&rows);
        if returning == Returning::Representation {
            request = request.query(&[("select", "*")]);
        }

        let response = request.send().await?;
        let rows = read_rows(response).await?;
        Ok(match returning {
            Returning::Representation => rows,
            Returning::Minimal => Vec::new(),
        })
    }
}

#[async_trait]
impl AuthService for BackendClient {
    async fn current_user(&self) -> Result<Option<SessionUser>, StoreError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };
        let url = self.endpoint(AUTH_PATH, "user")?;
        debug!("backend: fetch session user");

        let response = self
            .http
            .get(url)
            .header(APIKEY_HEADER, self.anon_key.as_str())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}

async fn read_rows(response: Response) -> Result<Vec<Value>, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Option<Vec<Value>> = serde_json::from_str(&body)?;
    Ok(rows.unwrap_or_default())
}

fn api_error(status: StatusCode, body: &str) -> StoreError {
    let mut error = serde_json::from_str::<BackendError>(body).unwrap_or_default();
    if error.message.trim().is_empty() {
        error.message = match body.trim() {
            "" => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            text => text.to_string(),
        };
    }
    StoreError::Api {
        status: status.as_u16(),
        error,
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
