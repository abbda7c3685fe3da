//! REST gateway against the storyboard backend
//!
//! `GET {base}/storyboards/{id}` returns the record or 404;
//! `PUT {base}/storyboards/{id}` with `{title, data}` updates it. A backend
//! that only updates existing rows answers 404 to the first PUT, in which
//! case the record is created with `POST {base}/storyboards` and the id the
//! backend assigns is used for this document from then on. The blob travels
//! as an uninterpreted string field.

use crate::config::GatewayConfig;
use crate::error::PersistenceError;
use crate::gateway::PersistenceGateway;
use crate::types::{DocumentId, PersistedBlob, RecordId, StoreRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RecordBody {
    id: Value,
    data: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl RecordBody {
    fn record_id(&self) -> Result<RecordId, PersistenceError> {
        match &self.id {
            Value::String(s) => Ok(RecordId(s.clone())),
            Value::Number(n) => Ok(RecordId(n.to_string())),
            other => Err(PersistenceError::MalformedRecord(format!(
                "unexpected record id {other}"
            ))),
        }
    }
}

/// Gateway speaking JSON over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
    // backend-assigned ids of records created by POST
    assigned: Arc<Mutex<HashMap<DocumentId, RecordId>>>,
}

impl HttpGateway {
    /// Build a client from `config`
    ///
    /// # Errors
    /// `PersistenceError::Config` if the base URL is empty or the client cannot be built
    pub fn new(config: &GatewayConfig) -> Result<Self, PersistenceError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(PersistenceError::Config("base_url must not be empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PersistenceError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            bearer_token: config.bearer_token.clone(),
            assigned: Arc::default(),
        })
    }

    /// Resource URL for `document`
    ///
    /// Once the backend has assigned a record id to `document` the URL
    /// addresses that record instead.
    #[must_use]
    pub fn record_url(&self, document: &DocumentId) -> String {
        match self.assigned.lock().get(document) {
            Some(record) => format!("{}/storyboards/{record}", self.base_url),
            None => format!("{}/storyboards/{document}", self.base_url),
        }
    }

    /// Collection URL that new records are posted to
    #[must_use]
    pub fn collection_url(&self) -> String {
        format!("{}/storyboards", self.base_url)
    }

    async fn create(
        &self,
        document: &DocumentId,
        request: &StoreRequest,
    ) -> Result<RecordId, PersistenceError> {
        let response = self
            .authorize(self.client.post(self.collection_url()))
            .json(request)
            .send()
            .await?;
        let body: RecordBody = ensure_success(response).await?.json().await?;
        let record = body.record_id()?;
        tracing::info!(document = %document, record = %record, "backend created storyboard record");
        self.assigned.lock().insert(document.clone(), record.clone());
        Ok(record)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string());
    Err(PersistenceError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn fetch_latest(
        &self,
        document: &DocumentId,
    ) -> Result<Option<PersistedBlob>, PersistenceError> {
        let response = self
            .authorize(self.client.get(self.record_url(document)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: RecordBody = ensure_success(response).await?.json().await?;
        let record_id = body.record_id()?;
        Ok(body.data.map(|data| PersistedBlob {
            record_id,
            data,
            updated_at: body.updated_at,
        }))
    }

    async fn store(
        &self,
        document: &DocumentId,
        request: StoreRequest,
    ) -> Result<RecordId, PersistenceError> {
        let response = self
            .authorize(self.client.put(self.record_url(document)))
            .json(&request)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(document = %document, "no record to update, creating one");
            return self.create(document, &request).await;
        }
        let body: RecordBody = ensure_success(response).await?.json().await?;
        body.record_id()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_url_joins_without_double_slash() {
        let gateway =
            HttpGateway::new(&GatewayConfig::new().with_base_url("https://example.test/api/")).unwrap();
        let doc = DocumentId::parse("board-7").unwrap();
        assert_eq!(
            gateway.record_url(&doc),
            "https://example.test/api/storyboards/board-7"
        );
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            HttpGateway::new(&GatewayConfig::new().with_base_url("  ")),
            Err(PersistenceError::Config(_))
        ));
    }

    #[test]
    fn record_body_accepts_numeric_ids() {
        let body: RecordBody =
            serde_json::from_str(r#"{"id": 42, "data": "blob", "title": "x"}"#).unwrap();
        assert_eq!(body.record_id().unwrap(), RecordId("42".into()));

        let body: RecordBody = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert!(body.record_id().is_err());
        assert!(body.data.is_none());
    }
}
