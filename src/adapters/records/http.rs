//! HTTP record API client.
//!
//! - `POST   {base_url}/{flow}` creates a record and answers `{"id": ...}`
//! - `PATCH  {base_url}/{flow}/{id}` replaces its fields
//! - `DELETE {base_url}/{flow}/{id}` removes it
//!
//! The user is identified by the `X-User-Id` header; the API key, when set,
//! is sent as a bearer token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::FlowType;
use crate::ports::{RecordApi, RecordApiError};

const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone)]
pub struct HttpRecordApiConfig {
    pub base_url: String,
    api_key: Option<Secret<String>>,
    pub timeout: Duration,
}

impl HttpRecordApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_key(mut self, api_key: Secret<String>) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: Value,
}

pub struct HttpRecordApi {
    config: HttpRecordApiConfig,
    client: Client,
}

impl HttpRecordApi {
    pub fn new(config: HttpRecordApiConfig) -> Result<Self, RecordApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RecordApiError::Unavailable(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { config, client })
    }

    fn collection_url(&self, flow_type: FlowType) -> String {
        format!("{}/{}", self.config.base_url, flow_type.as_str())
    }

    fn record_url(&self, flow_type: FlowType, record_id: &RecordId) -> String {
        format!("{}/{}", self.collection_url(flow_type), record_id)
    }

    fn authorize(&self, request: RequestBuilder, user_id: &UserId) -> RequestBuilder {
        let request = request.header(USER_ID_HEADER, user_id.as_str());
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RecordApiError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                RecordApiError::Unavailable(format!(
                    "Request timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            } else if e.is_connect() {
                RecordApiError::Unavailable(format!("Connection failed: {}", e))
            } else {
                RecordApiError::Unavailable(e.to_string())
            }
        })
    }

    /// Maps non-success statuses to errors.
    async fn check_status(
        response: Response,
        record_id: Option<&RecordId>,
    ) -> Result<Response, RecordApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match (status, record_id) {
            (StatusCode::NOT_FOUND, Some(id)) => Err(RecordApiError::NotFound(id.clone())),
            (status, _) if status.is_server_error() => {
                Err(RecordApiError::Unavailable(format!("Server error {}: {}", status, body)))
            }
            (status, _) => Err(RecordApiError::Rejected {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

/// Accepts string and numeric ids.
fn parse_record_id(id: &Value) -> Result<RecordId, RecordApiError> {
    let raw = match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(RecordApiError::InvalidResponse(format!(
                "unexpected id {}",
                other
            )))
        }
    };
    RecordId::new(raw).map_err(|e| RecordApiError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn create(
        &self,
        flow_type: FlowType,
        user_id: &UserId,
        payload: &Value,
    ) -> Result<RecordId, RecordApiError> {
        let request = self.authorize(self.client.post(self.collection_url(flow_type)), user_id);
        let response = self.send(request.json(payload)).await?;
        let response = Self::check_status(response, None).await?;

        let created: CreatedRecord = response
            .json()
            .await
            .map_err(|e| RecordApiError::InvalidResponse(e.to_string()))?;
        let record_id = parse_record_id(&created.id)?;

        tracing::debug!(flow = %flow_type, record_id = %record_id, "Record API created record");
        Ok(record_id)
    }

    async fn update(
        &self,
        flow_type: FlowType,
        user_id: &UserId,
        record_id: &RecordId,
        payload: &Value,
    ) -> Result<(), RecordApiError> {
        let url = self.record_url(flow_type, record_id);
        let request = self.authorize(self.client.patch(url), user_id);
        let response = self.send(request.json(payload)).await?;
        Self::check_status(response, Some(record_id)).await?;
        Ok(())
    }

    async fn delete(
        &self,
        flow_type: FlowType,
        user_id: &UserId,
        record_id: &RecordId,
    ) -> Result<(), RecordApiError> {
        let url = self.record_url(flow_type, record_id);
        let request = self.authorize(self.client.delete(url), user_id);
        let response = self.send(request).await?;
        Self::check_status(response, Some(record_id)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for HttpRecordApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecordApi")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api() -> HttpRecordApi {
        HttpRecordApi::new(HttpRecordApiConfig::new("https://records.example.com/v1/")).unwrap()
    }

    #[test]
    fn urls_join_flow_and_record_id() {
        let api = api();
        let id = RecordId::new("42").unwrap();

        assert_eq!(api.collection_url(FlowType::Death), "https://records.example.com/v1/death");
        assert_eq!(
            api.record_url(FlowType::Expense, &id),
            "https://records.example.com/v1/expense/42"
        );
    }

    #[test]
    fn record_ids_may_be_numbers() {
        assert_eq!(parse_record_id(&json!(17)).unwrap().as_str(), "17");
        assert_eq!(parse_record_id(&json!("abc")).unwrap().as_str(), "abc");
        assert!(parse_record_id(&json!(null)).is_err());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = HttpRecordApiConfig::new("https://records.example.com")
            .with_api_key(Secret::new("sk-very-secret".to_string()));
        let api = HttpRecordApi::new(config).unwrap();
        assert!(!format!("{:?}", api).contains("sk-very-secret"));
    }
}
