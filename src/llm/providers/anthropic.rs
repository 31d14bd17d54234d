use std::time::Duration;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::errors::{GruntyError, GruntyResult, ProtocolError};
use crate::llm::provider::ModelClient;
use crate::llm::types::{AssistantResponse, MessageRequest, Role};

pub struct AnthropicClient {
    api_base: String,
    api_key: String,
    api_version: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(
        api_base: String,
        api_key: String,
        api_version: String,
        timeout: Duration,
    ) -> GruntyResult<Self> {
        Self::with_builder(reqwest::Client::builder(), api_base, api_key, api_version, timeout)
    }

    fn with_builder(
        builder: reqwest::ClientBuilder,
        api_base: String,
        api_key: String,
        api_version: String,
        timeout: Duration,
    ) -> GruntyResult<Self> {
        let client = builder
            .timeout(timeout)
            .build()
            .map_err(|e| GruntyError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            api_base,
            api_key,
            api_version,
            timeout,
            client,
        })
    }

    pub fn from_config(config: &ModelConfig, api_key: String) -> GruntyResult<Self> {
        Self::new(
            config.api_base.clone(),
            api_key,
            config.api_version.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn send_error(&self, e: reqwest::Error) -> GruntyError {
        if e.is_timeout() {
            GruntyError::Transport(format!(
                "request timed out after {}s",
                self.timeout.as_secs_f64()
            ))
        } else {
            GruntyError::Transport(format!("request failed: {e}"))
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn create_message(&self, request: &MessageRequest) -> GruntyResult<AssistantResponse> {
        let body = serde_json::to_value(request)?;

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending model request"
        );
        tracing::debug!(
            body = %sanitized_for_log(&body),
            "request body (sanitized, base64 omitted)"
        );

        let response = self
            .client
            .post(&self.api_base)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(GruntyError::Transport(describe_error(status, &err_body)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.send_error(e))?;
        let parsed = parse_response(&text)?;

        tracing::info!(
            blocks = parsed.content.len(),
            stop_reason = parsed.stop_reason.as_deref().unwrap_or("-"),
            "model response received"
        );
        Ok(parsed)
    }
}

fn parse_response(text: &str) -> GruntyResult<AssistantResponse> {
    let parsed: AssistantResponse = serde_json::from_str(text)
        .map_err(|e| ProtocolError::MalformedResponse(e.to_string()))?;
    if parsed.role != Role::Assistant {
        return Err(ProtocolError::MalformedResponse("response role is not assistant".into()).into());
    }
    Ok(parsed)
}

/// Prefer the API's own `{error: {type, message}}` over the raw body.
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let (Some(kind), Some(message)) = (
            json["error"]["type"].as_str(),
            json["error"]["message"].as_str(),
        ) {
            return format!("{status}: {kind}: {message}");
        }
    }
    format!("{status}: {body}")
}

/// Copy of the request body with image payloads replaced, for logging only.
fn sanitized_for_log(body: &serde_json::Value) -> String {
    fn scrub(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                if map.get("type").and_then(|t| t.as_str()) == Some("base64") {
                    if let Some(data) = map.get_mut("data") {
                        *data = serde_json::Value::String("<omitted_base64_image>".into());
                    }
                }
                map.values_mut().for_each(scrub);
            }
            serde_json::Value::Array(items) => items.iter_mut().for_each(scrub),
            _ => {}
        }
    }

    let mut log_body = body.clone();
    scrub(&mut log_body);
    serde_json::to_string(&log_body).unwrap_or_default()
}
