// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Parsing of model replies. Nothing in here fails: unusable output degrades to a plain text
//! message with no commands.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::ops::{decode_commands, TransformCommand};

pub const DEFAULT_MESSAGE: &str = "Done!";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AiResponse {
    pub message: String,
    pub commands: Vec<TransformCommand>,
    /// Why parts of the reply were dropped, if any were.
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    pub(crate) choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub(crate) message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    pub(crate) content: Option<String>,
}

impl CompletionResponse {
    pub(crate) fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message?.content
    }
}

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\s*```\s*$").ok())
        .as_ref()
}

/// Removes one surrounding Markdown code fence (```json ... ```), if present.
pub fn strip_code_fence(raw: &str) -> &str {
    fence_pattern()
        .and_then(|fence| fence.captures(raw))
        .and_then(|captures| captures.get(1))
        .map_or(raw.trim(), |inner| inner.as_str().trim())
}

/// Turns the completion text into an [`AiResponse`].
///
/// * a JSON object yields its `message` (default `"Done!"`) and its `commands`;
/// * anything else becomes the message verbatim, with no commands;
/// * a command list that fails validation is dropped as a whole and the reasons are kept as
///   warnings.
pub fn parse_ai_response(raw: &str) -> AiResponse {
    let body = strip_code_fence(raw);
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body) else {
        return AiResponse { message: raw.trim().to_owned(), ..AiResponse::default() };
    };

    let message = match object.remove("message") {
        Some(Value::String(message)) if !message.trim().is_empty() => message,
        _ => DEFAULT_MESSAGE.to_owned(),
    };

    let (commands, warnings) = match object.remove("commands") {
        None | Some(Value::Null) => (Vec::new(), Vec::new()),
        Some(Value::Array(candidates)) => match decode_commands(&candidates) {
            Ok(commands) => (commands, Vec::new()),
            Err(errors) => (Vec::new(), errors),
        },
        Some(other) => (Vec::new(), vec![format!("commands must be an array, got {other}")]),
    };

    for warning in &warnings {
        tracing::warn!(warning = %warning, "dropping assistant commands");
    }

    AiResponse { message, commands, warnings }
}
