use grok_filter_contracts::valves::{FilterValves, UserValves};
use reqwest::Client as HttpClient;
use serde_json::{json, Map, Value};

use crate::error::GenerationError;

/// Raw outcome of one call to the generations endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP transport for `POST {api_base}/v1/images/generations`.
#[derive(Debug, Clone)]
pub struct ImageClient {
    endpoint: String,
    api_key: String,
    http: HttpClient,
}

impl ImageClient {
    pub fn new(valves: &FilterValves) -> anyhow::Result<Self> {
        // Idle connections are dropped at once so nothing is reused across calls.
        let http = HttpClient::builder().pool_max_idle_per_host(0).build()?;
        Ok(Self {
            endpoint: valves.endpoint(),
            api_key: valves.api_key.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn post_generation(
        &self,
        payload: &Value,
    ) -> Result<RawImageResponse, GenerationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawImageResponse { status, body })
    }
}

/// Request body for the generations endpoint.
///
/// `user` is only present when the settings carry a non-empty identifier.
pub fn build_payload(prompt: &str, valves: &UserValves) -> Value {
    let mut payload = map_object(json!({
        "prompt": prompt,
        "model": valves.model,
        "n": valves.effective_n(),
        "response_format": valves.response_format.as_str(),
    }));
    if let Some(user) = valves.user_identifier() {
        payload.insert("user".to_string(), Value::String(user.to_string()));
    }
    Value::Object(payload)
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
