// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One chat-driven editing session: the live diagram, its conversation and the assistant.

use crate::assistant::{validate_message, AssistantClient, AssistantError, ChatTransport};
use crate::engine::{DiagramEngine, EngineError};
use crate::model::{ChatRole, Conversation};
use crate::ops::{execute_batch, CommandResult};
use crate::query::context_json;

/// What one assistant turn did to the diagram.
#[derive(Debug)]
pub struct TurnReport {
    pub message: String,
    pub results: Vec<CommandResult>,
    pub warnings: Vec<String>,
}

impl TurnReport {
    pub fn failures(&self) -> impl Iterator<Item = &CommandResult> {
        self.results.iter().filter(|result| !result.success())
    }

    pub fn applied(&self) -> usize {
        self.results.iter().filter(|result| result.success()).count()
    }
}

pub struct AssistSession<E, T> {
    engine: E,
    conversation: Conversation,
    client: AssistantClient<T>,
}

impl<E, T> AssistSession<E, T>
where
    E: DiagramEngine,
    T: ChatTransport,
{
    pub fn new(engine: E, client: AssistantClient<T>) -> Self {
        Self { engine, conversation: Conversation::new(), client }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn client(&self) -> &AssistantClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut AssistantClient<T> {
        &mut self.client
    }

    pub fn context_json(&self) -> String {
        context_json(&self.engine)
    }

    pub fn export_xml(&self) -> String {
        self.engine.export_xml()
    }

    pub fn import_xml(&mut self, xml: &str) -> Result<(), EngineError> {
        self.engine.import_xml(xml)
    }

    pub fn reset_conversation(&mut self) {
        self.conversation.reset();
    }

    /// Runs one turn: asks the assistant about `text`, applies the returned commands and
    /// records the exchange.
    ///
    /// A rejected message leaves the conversation untouched. Once the user message is
    /// recorded, every outcome (including failures) is recorded too.
    pub async fn submit(&mut self, text: &str) -> Result<TurnReport, AssistantError> {
        validate_message(text)?;
        self.conversation.add_message(ChatRole::User, text);

        let context = self.context_json();
        let messages = self.conversation.messages();
        let history = &messages[..messages.len().saturating_sub(1)];
        let response = match self.client.send_message(text, Some(&context), history).await {
            Ok(response) => response,
            Err(err) => {
                self.conversation.add_message(ChatRole::System, format!("Error: {err}"));
                return Err(err);
            }
        };

        let results = execute_batch(&mut self.engine, &response.commands);
        self.conversation.add_message(ChatRole::Assistant, response.message.clone());

        if !response.warnings.is_empty() {
            self.conversation.add_message(
                ChatRole::System,
                format!("Ignored invalid commands:\n{}", bullet_list(&response.warnings)),
            );
        }
        let failures = results
            .iter()
            .filter(|result| !result.success())
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        if !failures.is_empty() {
            self.conversation.add_message(
                ChatRole::System,
                format!("Some commands failed:\n{}", bullet_list(&failures)),
            );
        }

        Ok(TurnReport { message: response.message, results, warnings: response.warnings })
    }
}

fn bullet_list(lines: &[String]) -> String {
    lines.iter().map(|line| format!("- {line}")).collect::<Vec<_>>().join("\n")
}
