// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::{json, Value};

use crate::model::{ChatMessage, ChatRole};
use crate::ops::TransformCommand;

/// Prior user/assistant turns replayed with each request.
pub const HISTORY_LIMIT: usize = 10;

pub const SYSTEM_PROMPT: &str = r#"You are a BPMN modeling assistant. You edit the user's process diagram by emitting commands.

Respond with ONLY a JSON object of this shape, and nothing else:
{"message": "<short reply to the user>", "commands": [<command>, ...]}

Available commands (the "action" field selects the command):
- {"action": "clear"}: remove everything and start from an empty process
- {"action": "addStartEvent", "id": "...", "name": "...", "x": 150, "y": 200}
- {"action": "addTask", "id": "...", "name": "...", "x": 300, "y": 200}
- {"action": "addExclusiveGateway", "id": "...", "name": "...", "x": 450, "y": 200}
- {"action": "addParallelGateway", "id": "...", "name": "...", "x": 450, "y": 200}
- {"action": "addEndEvent", "id": "...", "name": "...", "x": 600, "y": 200}
- {"action": "addSequenceFlow", "sourceId": "...", "targetId": "..."}
- {"action": "updateElement", "id": "...", "properties": {"name": "..."}}
- {"action": "removeElement", "id": "..."}

Rules:
- Ids must be unique and contain no whitespace, e.g. "Task_CheckStock".
- x/y in commands are the center of the shape in pixels. Lay processes out left to right, about
  150 px apart; branches go 120 px above or below the main line.
- x/y in the current diagram elements are the top-left corner of the shape. A 100x80 task
  listed at x=250, y=160 is centered at (300, 200); events are 36x36 and gateways 50x50.
- Commands run in order, so a flow may reference shapes created earlier in the same list.
- Reference existing elements by the ids listed in the current diagram.
- If no change is needed, return an empty "commands" list."#;

/// The system prompt followed by the JSON schema of a single command.
pub fn system_prompt() -> String {
    let schema = schemars::schema_for!(TransformCommand);
    match serde_json::to_string(&schema) {
        Ok(schema) => format!("{SYSTEM_PROMPT}\n\nJSON schema of one command:\n{schema}"),
        Err(_) => SYSTEM_PROMPT.to_owned(),
    }
}

fn wire_message(role: ChatRole, content: &str) -> Value {
    json!({"role": role.as_str(), "content": content})
}

/// Builds the chat `messages` array: instructions, the diagram snapshot (if any), the most
/// recent history, then the new user message. System entries in `history` are local notices
/// and are not replayed.
pub fn build_messages(user_text: &str, context: Option<&str>, history: &[ChatMessage]) -> Vec<Value> {
    let mut messages = vec![wire_message(ChatRole::System, &system_prompt())];

    if let Some(context) = context {
        messages.push(wire_message(
            ChatRole::System,
            &format!("Current diagram elements (JSON):\n{context}"),
        ));
    }

    let replayed = history
        .iter()
        .filter(|message| matches!(message.role, ChatRole::User | ChatRole::Assistant))
        .collect::<Vec<_>>();
    let skip = replayed.len().saturating_sub(HISTORY_LIMIT);
    messages.extend(
        replayed
            .into_iter()
            .skip(skip)
            .map(|message| wire_message(message.role, &message.content)),
    );

    messages.push(wire_message(ChatRole::User, user_text));
    messages
}

#[cfg(test)]
mod tests {
    use super::{build_messages, system_prompt, HISTORY_LIMIT, SYSTEM_PROMPT};
    use crate::model::{ChatRole, Conversation};

    #[test]
    fn prompt_lists_every_action() {
        for action in crate::ops::ACTIONS {
            assert!(SYSTEM_PROMPT.contains(&format!("\"{action}\"")), "{action}");
        }
        assert!(system_prompt().contains("\"sourceId\""));
    }

    #[test]
    fn coordinate_hint_matches_the_context_snapshot() {
        use crate::engine::InMemoryModeler;
        use crate::ops::{execute, ShapePayload, TransformCommand};
        use crate::query::extract_context;

        let mut modeler = InMemoryModeler::blank().expect("blank");
        let task = ShapePayload { id: "t1".to_owned(), name: None, x: Some(300.0), y: Some(200.0) };
        execute(&mut modeler, &TransformCommand::AddTask(task)).expect("add task");

        let summary = extract_context(&modeler).pop().expect("task summary");
        assert_eq!((summary.x, summary.y), (Some(250), Some(160)));
        assert!(SYSTEM_PROMPT.contains("top-left corner"));
        assert!(SYSTEM_PROMPT.contains("listed at x=250, y=160 is centered at (300, 200)"));
    }

    #[test]
    fn context_goes_in_a_second_system_message() {
        let messages = build_messages("add a task", Some("[]"), &[]);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "system");
        assert!(messages[1]["content"].as_str().is_some_and(|content| content.ends_with("[]")));
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "add a task");

        assert_eq!(build_messages("hi", None, &[]).len(), 2);
    }

    #[test]
    fn history_is_capped_and_skips_system_notices() {
        let mut conversation = Conversation::new();
        for turn in 0..8 {
            conversation.add_message(ChatRole::User, format!("question {turn}"));
            conversation.add_message(ChatRole::Assistant, format!("answer {turn}"));
            conversation.add_message(ChatRole::System, "Error: something");
        }

        let messages = build_messages("next", None, conversation.messages());
        assert_eq!(messages.len(), 1 + HISTORY_LIMIT + 1);
        assert_eq!(messages[1]["content"], "question 3");
        assert_eq!(messages[HISTORY_LIMIT]["content"], "answer 7");
        assert!(messages[1..=HISTORY_LIMIT].iter().all(|message| message["role"] != "system"));
    }
}
