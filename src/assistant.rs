//! Client for the remote baking assistant.
//!
//! One request per message, no retries. Every failure is turned into a
//! friendly fallback reply, so callers only ever see text.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://crust-crumb-backend.vercel.app/api/chat";

pub const WELCOME_MESSAGE: &str = "Hey there, baker! I'm Krusty, your friendly bread concierge. I'm here to help you on your sourdough journey using wisdom from Henry's book. Ask me about techniques, schedules, or troubleshooting - you've got this!";
pub const EMPTY_REPLY: &str = "I couldn't generate a response. Let's try that again, baker!";
pub const STATUS_FALLBACK: &str =
    "Sorry, I'm having trouble connecting to my baking brain right now. Please try again in a moment!";
pub const TRANSPORT_FALLBACK: &str = "Sorry, I encountered an error while consulting the baking spirits. Please check your connection and try again!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AssistantClient {
    pub fn new(config: &AssistantConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Sends `message` with the prior transcript and returns the reply text.
    pub async fn ask(&self, history: &[ChatTurn], message: &str) -> String {
        let request = ChatRequest {
            message: message.to_string(),
            history: history.to_vec(),
        };
        debug!(endpoint = %self.endpoint, turns = history.len(), "sending assistant request");
        let response = match self.http.post(&self.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "assistant request failed");
                return TRANSPORT_FALLBACK.to_string();
            }
        };
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "assistant returned an error status");
            return STATUS_FALLBACK.to_string();
        }
        match response.json::<Value>().await {
            Ok(body) => reply_from_body(&body),
            Err(err) => {
                warn!(error = %err, "assistant response was not JSON");
                TRANSPORT_FALLBACK.to_string()
            }
        }
    }
}

/// Reads `response`, then `text`; empty or missing values fall through.
pub fn reply_from_body(body: &Value) -> String {
    ["response", "text"]
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or(EMPTY_REPLY)
        .to_string()
}

/// A chat transcript that opens with the assistant's greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            turns: vec![ChatTurn::model(WELCOME_MESSAGE)],
        }
    }
}

impl Conversation {
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Appends the user's message and the reply. Blank input is ignored and
    /// returns `None`. The request history already includes the new message.
    pub async fn send(&mut self, client: &AssistantClient, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        self.turns.push(ChatTurn::user(text));
        let reply = client.ask(&self.turns, text).await;
        self.turns.push(ChatTurn::model(reply.clone()));
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_prefers_response_field() {
        let body = json!({"response": "Feed it twice a day.", "text": "ignored"});
        assert_eq!(reply_from_body(&body), "Feed it twice a day.");
    }

    #[test]
    fn reply_falls_back_to_text_field() {
        assert_eq!(reply_from_body(&json!({"response": "", "text": "Use rye."})), "Use rye.");
        assert_eq!(reply_from_body(&json!({"text": "Use rye."})), "Use rye.");
    }

    #[test]
    fn reply_without_text_uses_empty_reply() {
        assert_eq!(reply_from_body(&json!({"status": "ok"})), EMPTY_REPLY);
        assert_eq!(reply_from_body(&json!({"response": 42})), EMPTY_REPLY);
    }

    #[test]
    fn request_serializes_lowercase_roles() {
        let request = ChatRequest {
            message: "Why is my crumb gummy?".to_string(),
            history: vec![ChatTurn::model("Hi!"), ChatTurn::user("Why is my crumb gummy?")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["history"][0]["role"], "model");
        assert_eq!(value["history"][1]["role"], "user");
        assert_eq!(value["message"], "Why is my crumb gummy?");
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_transport_fallback() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = AssistantClient::new(&AssistantConfig {
            endpoint: format!("http://{addr}/api/chat"),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap();
        assert_eq!(client.ask(&[], "hello").await, TRANSPORT_FALLBACK);
    }

    #[tokio::test]
    async fn blank_messages_are_not_sent() {
        let client = AssistantClient::new(&AssistantConfig::default()).unwrap();
        let mut conversation = Conversation::default();
        assert_eq!(conversation.send(&client, "   ").await, None);
        assert_eq!(conversation.turns().len(), 1);
    }

    #[cfg(feature = "web")]
    mod against_local_backend {
        use super::*;
        use axum::{Json, Router, http::StatusCode, routing::post};

        async fn spawn(router: Router) -> AssistantClient {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            AssistantClient::new(&AssistantConfig {
                endpoint: format!("http://{addr}/api/chat"),
                timeout: Some(Duration::from_secs(5)),
            })
            .unwrap()
        }

        #[tokio::test]
        async fn conversation_sends_history_including_new_message() {
            let client = spawn(Router::new().route(
                "/api/chat",
                post(|Json(request): Json<ChatRequest>| async move {
                    Json(json!({
                        "response": format!("{} turns, last: {}", request.history.len(), request.message)
                    }))
                }),
            ))
            .await;
            let mut conversation = Conversation::default();
            let reply = conversation.send(&client, "How wet is 75%?").await;
            assert_eq!(reply.as_deref(), Some("2 turns, last: How wet is 75%?"));
            assert_eq!(conversation.turns().len(), 3);
            assert_eq!(conversation.turns()[2].role, ChatRole::Model);
        }

        #[tokio::test]
        async fn error_status_yields_status_fallback() {
            let client = spawn(Router::new().route(
                "/api/chat",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            ))
            .await;
            assert_eq!(client.ask(&[], "hello").await, STATUS_FALLBACK);
        }
    }
}
