//! Client for a locally hosted, OpenAI-compatible inference server
//!
//! llama.cpp's `llama-server`, Ollama and LM Studio all expose
//! `/v1/chat/completions`; the model itself is loaded by that process.

use super::types::{LlmMessage, LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Chat completions against a local inference server
pub struct LocalModelService {
    client: Client,
    endpoint: String,
    model_id: String,
}

impl LocalModelService {
    pub fn new(
        base_url: &str,
        model_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}{CHAT_COMPLETIONS_PATH}",
                base_url.trim_end_matches('/')
            ),
            model_id: model_id.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn translate_request(&self, request: &LlmRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = request.system.as_deref().filter(|s| !s.is_empty()) {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: Some(system.to_string()),
            });
        }

        messages.extend(request.messages.iter().map(Self::translate_message));

        ChatCompletionRequest {
            model: self.model_id.clone(),
            messages,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    fn translate_message(msg: &LlmMessage) -> WireMessage {
        let role = match msg.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        WireMessage {
            role: role.to_string(),
            content: Some(msg.content.clone()),
        }
    }

    fn normalize_response(resp: ChatCompletionResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::empty_response("No choices in response"))?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::empty_response("Model returned no text"));
        }

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse {
            text,
            end_turn: choice.finish_reason.as_deref() == Some("stop"),
            usage,
        })
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> LlmError {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status.as_u16() {
            400..=499 => LlmError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => LlmError::server_error(format!("Server error: {message}")),
            _ => LlmError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl LlmService for LocalModelService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let wire_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(parsed)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI-compatible wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Start a stub inference server; returns its base URL
    async fn stub_server(status: StatusCode, body: Value, seen: Arc<Mutex<Vec<Value>>>) -> String {
        let app = Router::new().route(
            CHAT_COMPLETIONS_PATH,
            post(move |Json(req): Json<Value>| {
                let body = body.clone();
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(req);
                    (status, Json(body))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn service(base_url: &str) -> LocalModelService {
        LocalModelService::new(base_url, "nilechat-3b", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let svc = service("http://127.0.0.1:8080/");
        assert_eq!(svc.endpoint(), "http://127.0.0.1:8080/v1/chat/completions");
    }

    #[test]
    fn test_translate_request_puts_system_first() {
        let svc = service("http://localhost:1");
        let request = LlmRequest {
            system: Some("Be brief.".to_string()),
            messages: vec![
                LlmMessage::user("hi"),
                LlmMessage::assistant("hello"),
                LlmMessage::user("how are you"),
            ],
            max_tokens: Some(64),
        };

        let wire = serde_json::to_value(svc.translate_request(&request)).unwrap();
        assert_eq!(wire["model"], "nilechat-3b");
        assert_eq!(wire["max_tokens"], 64);
        assert_eq!(wire["stream"], false);
        let roles: Vec<_> = wire["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
    }

    #[test]
    fn test_translate_request_omits_empty_system_and_max_tokens() {
        let svc = service("http://localhost:1");
        let request = LlmRequest {
            system: Some(String::new()),
            ..LlmRequest::prompt("hi")
        };
        let wire = serde_json::to_value(svc.translate_request(&request)).unwrap();
        assert_eq!(wire["messages"].as_array().unwrap().len(), 1);
        assert!(wire.get("max_tokens").is_none());
    }

    #[test]
    fn test_normalize_rejects_missing_choices_and_blank_text() {
        let empty = ChatCompletionResponse {
            choices: vec![],
            usage: None,
        };
        let err = LocalModelService::normalize_response(empty).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::EmptyResponse);

        let blank = ChatCompletionResponse {
            choices: vec![WireChoice {
                message: WireMessage {
                    role: "assistant".to_string(),
                    content: Some("  \n ".to_string()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        };
        let err = LocalModelService::normalize_response(blank).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::EmptyResponse);
    }

    #[test]
    fn test_classify_status() {
        let err = LocalModelService::classify_status(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"context too long"}}"#,
        );
        assert_eq!(err.kind, LlmErrorKind::InvalidRequest);
        assert!(err.message.contains("context too long"));

        let err = LocalModelService::classify_status(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            "loading model",
        );
        assert_eq!(err.kind, LlmErrorKind::ServerError);
        assert!(err.message.contains("loading model"));
    }

    #[tokio::test]
    async fn test_complete_round_trip_against_stub() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base = stub_server(
            StatusCode::OK,
            json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "  hello there \n"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            }),
            seen.clone(),
        )
        .await;

        let response = service(&base)
            .complete(&LlmRequest::prompt("hi"))
            .await
            .unwrap();

        // Trimming is the caller's job
        assert_eq!(response.text, "  hello there \n");
        assert!(response.end_turn);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 3);

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn test_complete_maps_server_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base = stub_server(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"message": "out of memory"}}),
            seen,
        )
        .await;

        let err = service(&base)
            .complete(&LlmRequest::prompt("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ServerError);
        assert!(err.message.contains("out of memory"));
    }

    #[tokio::test]
    async fn test_complete_connection_refused_is_network() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = service(&format!("http://{addr}"))
            .complete(&LlmRequest::prompt("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Network);
    }
}
