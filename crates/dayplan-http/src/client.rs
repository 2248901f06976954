//! reqwest implementation of [`DayBackend`]
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET  trips/{trip}/days/{day}` returns the day
//! - `POST trips/{trip}/days/{day}/transactions` applies a transaction;
//!   `409 Conflict` signals a stale base revision
//! - `GET  places/search?q=..&city=..&limit=..` returns a JSON array of places

use crate::config::HttpBackendConfig;
use async_trait::async_trait;
use dayplan_changes::TransactionRequest;
use dayplan_model::{DayKey, PlaceResult, RemoteDayState, Revision};
use dayplan_session::{BackendError, DayBackend, PlaceQuery, TransactionError};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Errors constructing an [`HttpDayBackend`]
#[derive(Debug, thiserror::Error)]
pub enum HttpBackendError {
    /// Base URL did not parse or cannot carry a path
    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl {
        /// Configured value
        url: String,
        /// Parse failure
        reason: String,
    },

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Day backend talking to the trip planner REST API
#[derive(Debug, Clone)]
pub struct HttpDayBackend {
    base: Url,
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl HttpDayBackend {
    /// Build a client for `config`
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the client cannot be built
    pub fn connect(config: &HttpBackendConfig) -> Result<Self, HttpBackendError> {
        let invalid = |reason: String| HttpBackendError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("cannot carry a path".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base,
            client,
            auth_token: config.auth_token.clone(),
        })
    }

    /// Configured API root
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Rejected(format!("{} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn day_url(&self, key: &DayKey) -> Result<Url, BackendError> {
        self.endpoint(&["trips", key.trip_id.as_str(), "days", key.day_id.as_str()])
    }

    pub(crate) fn transaction_url(&self, key: &DayKey) -> Result<Url, BackendError> {
        self.endpoint(&[
            "trips",
            key.trip_id.as_str(),
            "days",
            key.day_id.as_str(),
            "transactions",
        ])
    }

    pub(crate) fn search_url(&self, query: &PlaceQuery) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&["places", "search"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.text);
            if let Some(city) = &query.city_scope {
                pairs.append_pair("city", city);
            }
            pairs.append_pair("limit", &query.limit.to_string());
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }
}

#[async_trait]
impl DayBackend for HttpDayBackend {
    async fn fetch_day(&self, key: &DayKey) -> Result<RemoteDayState, BackendError> {
        let url = self.day_url(key)?;
        debug!(%url, "fetching day");
        let response = self.send(self.client.get(url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, body_text(response).await));
        }
        decode(response).await
    }

    async fn apply_transaction(
        &self,
        key: &DayKey,
        request: &TransactionRequest,
    ) -> Result<RemoteDayState, TransactionError> {
        let url = self.transaction_url(key)?;
        debug!(%url, changes = request.len(), base = %request.base_revision, "submitting transaction");
        let response = self.send(self.client.post(url).json(request)).await?;
        let status = response.status();
        if status == StatusCode::CONFLICT {
            let current_revision = parse_conflict(&body_text(response).await);
            warn!(day = %key, base = %request.base_revision, ?current_revision, "server reported conflict");
            return Err(TransactionError::Conflict { current_revision });
        }
        if !status.is_success() {
            return Err(status_error(status, body_text(response).await).into());
        }
        Ok(decode(response).await?)
    }

    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, BackendError> {
        let url = self.search_url(query)?;
        let response = self.send(self.client.get(url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, body_text(response).await));
        }
        decode(response).await
    }
}

async fn body_text(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Map a non-success status onto the backend error taxonomy
pub(crate) fn status_error(status: StatusCode, body: String) -> BackendError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| status.to_string(), str::to_string)
    } else {
        body
    };
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        s if s.is_client_error() => BackendError::Rejected(format!("{}: {message}", s.as_u16())),
        s => BackendError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConflictBody {
    #[serde(default)]
    current_revision: Option<Revision>,
}

/// Server revision from a 409 body, when it carries one
pub(crate) fn parse_conflict(body: &str) -> Option<Revision> {
    serde_json::from_str::<ConflictBody>(body)
        .ok()
        .and_then(|b| b.current_revision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayplan_model::{DayId, TripId};

    fn backend(base: &str) -> HttpDayBackend {
        HttpDayBackend::connect(&HttpBackendConfig::new(base)).unwrap()
    }

    fn key() -> DayKey {
        DayKey::new(TripId::new("trip 1").unwrap(), DayId::new("d/2").unwrap(), 1)
    }

    #[test]
    fn day_urls_escape_ids() {
        let http = backend("https://api.example.com/v1/");
        assert_eq!(
            http.day_url(&key()).unwrap().as_str(),
            "https://api.example.com/v1/trips/trip%201/days/d%2F2"
        );
        assert_eq!(
            http.transaction_url(&key()).unwrap().as_str(),
            "https://api.example.com/v1/trips/trip%201/days/d%2F2/transactions"
        );
    }

    #[test]
    fn search_url_carries_query() {
        let http = backend("https://api.example.com");
        let url = http
            .search_url(&PlaceQuery {
                text: "coffee & cake".to_string(),
                city_scope: Some("Barcelona".to_string()),
                limit: 5,
            })
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/places/search?q=coffee+%26+cake&city=Barcelona&limit=5"
        );

        let url = http
            .search_url(&PlaceQuery {
                text: "bar".to_string(),
                city_scope: None,
                limit: 10,
            })
            .unwrap();
        assert_eq!(url.query(), Some("q=bar&limit=10"));
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = HttpDayBackend::connect(&HttpBackendConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, HttpBackendError::InvalidBaseUrl { .. }));
        let err = HttpDayBackend::connect(&HttpBackendConfig::new("mailto:a@b.c")).unwrap_err();
        assert!(matches!(err, HttpBackendError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, String::new()),
            BackendError::NotFound("Not Found".to_string())
        );
        let rejected = status_error(StatusCode::UNPROCESSABLE_ENTITY, "bad change".to_string());
        assert_eq!(rejected, BackendError::Rejected("422: bad change".to_string()));
        assert!(!rejected.is_retryable());

        let server = status_error(StatusCode::BAD_GATEWAY, "upstream".to_string());
        assert_eq!(
            server,
            BackendError::Server {
                status: 502,
                message: "upstream".to_string()
            }
        );
        assert!(server.is_retryable());
    }

    #[test]
    fn conflict_body() {
        assert_eq!(parse_conflict(r#"{"currentRevision": 9}"#), Some(Revision(9)));
        assert_eq!(parse_conflict("{}"), None);
        assert_eq!(parse_conflict("stale"), None);
    }
}
