// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Client for the language-model endpoint.
//!
//! One request is in flight at a time. A second [`AssistantClient::send_message`] while the
//! first is still awaiting the endpoint is rejected with [`AssistantError::Busy`] instead of
//! being queued.

pub mod prompt;
pub mod response;
pub mod transport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde_json::json;

use crate::model::ChatMessage;
use crate::store::AssistantSettings;

pub use prompt::{build_messages, SYSTEM_PROMPT};
pub use response::{parse_ai_response, AiResponse};
pub use transport::{ChatTransport, HttpReply, HttpTransport, TransportError};

pub const MAX_MESSAGE_CHARS: usize = 10_000;
pub const TEMPERATURE: f64 = 0.2;
pub const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("message is empty")]
    Empty,
    #[error("message is too long ({len} characters, maximum is {max})")]
    TooLong { len: usize, max: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error(transparent)]
    InvalidMessage(#[from] MessageError),
    #[error("a request is already in progress")]
    Busy,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("API response contained no completion")]
    MissingCompletion,
    #[error("API response is not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

/// Checks a user message before anything else happens with it.
pub fn validate_message(text: &str) -> Result<(), MessageError> {
    if text.trim().is_empty() {
        return Err(MessageError::Empty);
    }
    let len = text.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(MessageError::TooLong { len, max: MAX_MESSAGE_CHARS });
    }
    Ok(())
}

/// Clears the in-flight flag when the request future completes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AssistantClient<T> {
    transport: T,
    settings: AssistantSettings,
    in_flight: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl<T: ChatTransport> AssistantClient<T> {
    pub fn new(transport: T, settings: AssistantSettings) -> Self {
        Self {
            transport,
            settings,
            in_flight: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: AssistantSettings) {
        self.settings = settings;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn record_outcome<R>(&self, outcome: &Result<R, AssistantError>) {
        let mut last_error = self.last_error.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last_error = outcome.as_ref().err().map(ToString::to_string);
    }

    /// Sends `user_text` with the diagram `context` and prior `history`, then parses the reply.
    ///
    /// Input problems and a missing credential fail before any network activity.
    pub async fn send_message(
        &self,
        user_text: &str,
        context: Option<&str>,
        history: &[ChatMessage],
    ) -> Result<AiResponse, AssistantError> {
        let outcome = self.send_inner(user_text, context, history).await;
        if !matches!(outcome, Err(AssistantError::Busy)) {
            self.record_outcome(&outcome);
        }
        outcome
    }

    async fn send_inner(
        &self,
        user_text: &str,
        context: Option<&str>,
        history: &[ChatMessage],
    ) -> Result<AiResponse, AssistantError> {
        validate_message(user_text)?;
        let api_key = self.settings.api_key().ok_or(AssistantError::MissingApiKey)?;
        let _guard = InFlight::acquire(&self.in_flight).ok_or(AssistantError::Busy)?;

        let messages = build_messages(user_text, context, history);
        tracing::debug!(
            model = %self.settings.model(),
            messages = messages.len(),
            "sending assistant request"
        );
        let body = json!({
            "model": self.settings.model(),
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let reply = self.transport.post_json(self.settings.endpoint(), api_key, &body).await?;
        if !reply.is_success() {
            tracing::warn!(status = reply.status, "assistant endpoint returned an error");
            return Err(AssistantError::Api { status: reply.status, body: reply.body });
        }

        let completion = serde_json::from_str::<response::CompletionResponse>(&reply.body)
            .map_err(AssistantError::MalformedResponse)?;
        let content = completion.into_content().ok_or(AssistantError::MissingCompletion)?;
        Ok(parse_ai_response(&content))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Notify;

    use super::{
        validate_message, AssistantClient, AssistantError, ChatTransport, HttpReply,
        MessageError, TransportError, MAX_MESSAGE_CHARS,
    };
    use crate::store::AssistantSettings;

    fn completion(content: &str) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    struct FakeTransport {
        calls: AtomicUsize,
        reply: Result<HttpReply, String>,
        requests: Mutex<Vec<(String, String, Value)>>,
        gate: Option<Notify>,
    }

    impl FakeTransport {
        fn replying(status: u16, body: String) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Ok(HttpReply { status, body }),
                requests: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self { reply: Err(message.to_owned()), ..Self::replying(200, String::new()) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn post_json(
            &self,
            url: &str,
            bearer: &str,
            body: &Value,
        ) -> Result<HttpReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().expect("requests").push((
                url.to_owned(),
                bearer.to_owned(),
                body.clone(),
            ));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply.clone().map_err(TransportError::Unavailable)
        }
    }

    fn settings() -> AssistantSettings {
        AssistantSettings::default().with_api_key(Some("sk-test".to_owned()))
    }

    #[test]
    fn message_validation_bounds() {
        assert_eq!(validate_message("   \n"), Err(MessageError::Empty));
        assert_eq!(validate_message(""), Err(MessageError::Empty));
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert_eq!(
            validate_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)),
            Err(MessageError::TooLong { len: MAX_MESSAGE_CHARS + 1, max: MAX_MESSAGE_CHARS })
        );
    }

    #[tokio::test]
    async fn blank_messages_never_reach_the_transport() {
        let client = AssistantClient::new(FakeTransport::replying(200, completion("{}")), settings());
        let err = client.send_message("   ", None, &[]).await.expect_err("blank");
        assert!(matches!(err, AssistantError::InvalidMessage(MessageError::Empty)));
        assert_eq!(client.transport().calls(), 0);
        assert_eq!(client.last_error().as_deref(), Some("message is empty"));
    }

    #[tokio::test]
    async fn missing_api_key_never_reaches_the_transport() {
        let client = AssistantClient::new(
            FakeTransport::replying(200, completion("{}")),
            AssistantSettings::default(),
        );
        assert!(!client.is_configured());
        let err = client.send_message("add a task", None, &[]).await.expect_err("no key");
        assert!(matches!(err, AssistantError::MissingApiKey));
        assert_eq!(client.transport().calls(), 0);
    }

    #[tokio::test]
    async fn request_carries_model_parameters_and_bearer() {
        let reply = completion(r#"{"message": "Added", "commands": [{"action": "addTask", "id": "t1"}]}"#);
        let client = AssistantClient::new(FakeTransport::replying(200, reply), settings());

        let response = client.send_message("add a task", Some("[]"), &[]).await.expect("send");
        assert_eq!(response.message, "Added");
        assert_eq!(response.commands.len(), 1);
        assert!(!client.is_loading());
        assert_eq!(client.last_error(), None);

        let requests = client.transport().requests.lock().expect("requests");
        let (url, bearer, body) = &requests[0];
        assert_eq!(url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(bearer, "sk-test");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let client = AssistantClient::new(
            FakeTransport::replying(401, r#"{"error": "bad key"}"#.to_owned()),
            settings(),
        );
        let err = client.send_message("hello", None, &[]).await.expect_err("401");
        assert!(matches!(err, AssistantError::Api { status: 401, .. }));
        assert!(client.last_error().is_some_and(|error| error.starts_with("API error 401")));
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn transport_and_shape_failures_are_descriptive() {
        let client = AssistantClient::new(FakeTransport::failing("connection refused"), settings());
        let err = client.send_message("hello", None, &[]).await.expect_err("transport");
        assert_eq!(err.to_string(), "endpoint unavailable: connection refused");

        let client = AssistantClient::new(
            FakeTransport::replying(200, r#"{"choices": []}"#.to_owned()),
            settings(),
        );
        let err = client.send_message("hello", None, &[]).await.expect_err("no choices");
        assert!(matches!(err, AssistantError::MissingCompletion));

        let client =
            AssistantClient::new(FakeTransport::replying(200, "<html>".to_owned()), settings());
        let err = client.send_message("hello", None, &[]).await.expect_err("not json");
        assert!(matches!(err, AssistantError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_rejected() {
        let transport = FakeTransport {
            gate: Some(Notify::new()),
            ..FakeTransport::replying(200, completion(r#"{"message": "ok"}"#))
        };
        let client = AssistantClient::new(transport, settings());

        let (first, second, ()) = tokio::join!(
            client.send_message("first", None, &[]),
            async {
                let outcome = client.send_message("second", None, &[]).await;
                assert!(client.is_loading());
                outcome
            },
            async {
                if let Some(gate) = &client.transport().gate {
                    gate.notify_one();
                }
            },
        );

        assert_eq!(first.expect("first send").message, "ok");
        assert!(matches!(second, Err(AssistantError::Busy)));
        assert_eq!(client.transport().calls(), 1);
        assert!(!client.is_loading());
        assert_eq!(client.last_error(), None);
    }
}
