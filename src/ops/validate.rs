// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural screening of untrusted command JSON.

use serde::Serialize;
use serde_json::Value;

use super::TransformCommand;

/// Every action the executor understands, in prompt order.
pub const ACTIONS: [&str; 9] = [
    "clear",
    "addTask",
    "addStartEvent",
    "addEndEvent",
    "addExclusiveGateway",
    "addParallelGateway",
    "addSequenceFlow",
    "updateElement",
    "removeElement",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    /// Valid exactly when `errors` is empty.
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn require_id(
    action: &str,
    field: &str,
    object: &serde_json::Map<String, Value>,
    errors: &mut Vec<String>,
) {
    match object.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => {}
        _ => errors.push(format!("{action} requires a non-empty string \"{field}\"")),
    }
}

fn require_number(field: &str, object: &serde_json::Map<String, Value>, errors: &mut Vec<String>) {
    match object.get(field) {
        None | Some(Value::Number(_)) => {}
        Some(_) => errors.push(format!("{field} must be a number")),
    }
}

/// Checks one candidate command. Never panics and never looks at the diagram; whether the
/// referenced ids exist is decided at execution time.
pub fn validate_command(candidate: &Value) -> Validation {
    let Some(object) = candidate.as_object() else {
        return Validation::from_errors(vec!["Command must be a JSON object".to_owned()]);
    };

    let action = match object.get("action") {
        None => return Validation::from_errors(vec!["Missing required field: action".to_owned()]),
        Some(Value::String(action)) if ACTIONS.contains(&action.as_str()) => action.as_str(),
        Some(other) => {
            return Validation::from_errors(vec![format!("Invalid action: {}", describe(other))]);
        }
    };

    let mut errors = Vec::new();
    match action {
        "clear" => {}
        "addSequenceFlow" => {
            require_id(action, "sourceId", object, &mut errors);
            require_id(action, "targetId", object, &mut errors);
        }
        "updateElement" => {
            require_id(action, "id", object, &mut errors);
            if !object.get("properties").is_some_and(Value::is_object) {
                errors.push(format!("{action} requires an object \"properties\""));
            }
        }
        "removeElement" => require_id(action, "id", object, &mut errors),
        _ => {
            require_id(action, "id", object, &mut errors);
            require_number("x", object, &mut errors);
            require_number("y", object, &mut errors);
            if object.get("name").is_some_and(|name| !name.is_string() && !name.is_null()) {
                errors.push("name must be a string".to_owned());
            }
        }
    }
    Validation::from_errors(errors)
}

/// Checks a whole command list; errors are prefixed with the 1-based command index.
pub fn validate_all(candidates: &[Value]) -> Validation {
    let errors = candidates
        .iter()
        .enumerate()
        .flat_map(|(index, candidate)| {
            validate_command(candidate)
                .errors
                .into_iter()
                .map(move |error| format!("Command {}: {error}", index + 1))
        })
        .collect::<Vec<_>>();
    Validation::from_errors(errors)
}

/// Validates and decodes a command list as a unit: either every command is usable or none is.
pub fn decode_commands(candidates: &[Value]) -> Result<Vec<TransformCommand>, Vec<String>> {
    let validation = validate_all(candidates);
    if !validation.valid {
        return Err(validation.errors);
    }

    let mut commands = Vec::with_capacity(candidates.len());
    let mut errors = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        match serde_json::from_value::<TransformCommand>(candidate.clone()) {
            Ok(command) => commands.push(command),
            Err(err) => errors.push(format!("Command {}: {err}", index + 1)),
        }
    }
    if errors.is_empty() {
        Ok(commands)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{decode_commands, validate_all, validate_command, Validation};
    use crate::ops::{FlowPayload, TransformCommand};

    #[test]
    fn sequence_flow_with_both_ends_is_valid() {
        let validation =
            validate_command(&json!({"action": "addSequenceFlow", "sourceId": "a", "targetId": "b"}));
        assert_eq!(validation, Validation::ok());
    }

    #[rstest]
    #[case(json!({"action": "addSequenceFlow", "targetId": "b"}), "sourceId")]
    #[case(json!({"action": "addSequenceFlow", "sourceId": "a"}), "targetId")]
    #[case(json!({"action": "addSequenceFlow", "sourceId": "", "targetId": "b"}), "sourceId")]
    fn sequence_flow_names_the_missing_end(#[case] candidate: serde_json::Value, #[case] field: &str) {
        let validation = validate_command(&candidate);
        assert!(!validation.valid);
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.errors[0].contains(field), "{:?}", validation.errors);
    }

    #[rstest]
    #[case(json!({"action": "bogus"}), "Invalid action: bogus")]
    #[case(json!({"action": 7}), "Invalid action: 7")]
    #[case(json!({"id": "t1"}), "Missing required field: action")]
    #[case(json!("addTask"), "Command must be a JSON object")]
    #[case(json!(null), "Command must be a JSON object")]
    fn unusable_shapes_are_rejected(#[case] candidate: serde_json::Value, #[case] expected: &str) {
        let validation = validate_command(&candidate);
        assert!(!validation.valid);
        assert_eq!(validation.errors, vec![expected.to_owned()]);
    }

    #[rstest]
    #[case(json!({"action": "clear"}))]
    #[case(json!({"action": "addTask", "id": "t1"}))]
    #[case(json!({"action": "addStartEvent", "id": "s1", "name": "Go", "x": 100, "y": 120.5}))]
    #[case(json!({"action": "addParallelGateway", "id": "g1", "name": null}))]
    #[case(json!({"action": "updateElement", "id": "t1", "properties": {"name": "Review"}}))]
    #[case(json!({"action": "removeElement", "id": "t1"}))]
    fn well_formed_commands_pass(#[case] candidate: serde_json::Value) {
        assert!(validate_command(&candidate).valid, "{candidate}");
    }

    #[rstest]
    #[case(json!({"action": "addTask"}), "addTask requires a non-empty string \"id\"")]
    #[case(json!({"action": "addEndEvent", "id": "   "}), "addEndEvent requires a non-empty string \"id\"")]
    #[case(json!({"action": "addTask", "id": "t1", "x": "10"}), "x must be a number")]
    #[case(json!({"action": "addTask", "id": "t1", "y": true}), "y must be a number")]
    #[case(json!({"action": "addTask", "id": "t1", "name": 3}), "name must be a string")]
    #[case(json!({"action": "removeElement"}), "removeElement requires a non-empty string \"id\"")]
    #[case(json!({"action": "updateElement", "id": "t1"}), "updateElement requires an object \"properties\"")]
    #[case(json!({"action": "updateElement", "id": "t1", "properties": []}), "updateElement requires an object \"properties\"")]
    fn payload_problems_are_reported(#[case] candidate: serde_json::Value, #[case] expected: &str) {
        assert_eq!(validate_command(&candidate).errors, vec![expected.to_owned()]);
    }

    #[test]
    fn validate_all_prefixes_the_one_based_index() {
        let validation = validate_all(&[
            json!({"action": "clear"}),
            json!({"action": "removeElement"}),
            json!({"action": "bogus"}),
        ]);
        assert!(!validation.valid);
        assert_eq!(
            validation.errors,
            vec![
                "Command 2: removeElement requires a non-empty string \"id\"".to_owned(),
                "Command 3: Invalid action: bogus".to_owned(),
            ]
        );
        assert_eq!(validate_all(&[]), Validation::ok());
    }

    #[test]
    fn decode_commands_is_all_or_nothing() {
        let commands = decode_commands(&[
            json!({"action": "addStartEvent", "id": "s1"}),
            json!({"action": "addSequenceFlow", "sourceId": "s1", "targetId": "t1"}),
        ])
        .expect("valid list");
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[1],
            TransformCommand::AddSequenceFlow(FlowPayload {
                source_id: "s1".to_owned(),
                target_id: "t1".to_owned(),
            })
        );

        let errors = decode_commands(&[
            json!({"action": "addStartEvent", "id": "s1"}),
            json!({"action": "removeElement"}),
        ])
        .expect_err("second command is invalid");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Command 2: "));
    }
}
