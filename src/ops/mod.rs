// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram transform commands and their execution.
//!
//! Commands arrive as untrusted JSON from the assistant, are screened by [`validate`], decoded
//! into [`TransformCommand`] and applied one by one. A failing command never stops the rest of
//! its batch.

pub mod validate;

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::{DiagramEngine, EngineError, NewShape};
use crate::format::bpmn::BLANK_DIAGRAM_XML;
use crate::model::{ElementId, ElementKind, IdError, Point};

pub use validate::{decode_commands, validate_all, validate_command, Validation, ACTIONS};

/// Payload shared by the five shape-creating commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShapePayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Center x; a per-kind default applies when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Center y; a per-kind default applies when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowPayload {
    pub source_id: String,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UpdatePayload {
    pub id: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RemovePayload {
    pub id: String,
}

/// One requested diagram mutation, tagged by `action` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TransformCommand {
    Clear,
    AddTask(ShapePayload),
    AddStartEvent(ShapePayload),
    AddEndEvent(ShapePayload),
    AddExclusiveGateway(ShapePayload),
    AddParallelGateway(ShapePayload),
    AddSequenceFlow(FlowPayload),
    UpdateElement(UpdatePayload),
    RemoveElement(RemovePayload),
}

impl TransformCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::AddTask(_) => "addTask",
            Self::AddStartEvent(_) => "addStartEvent",
            Self::AddEndEvent(_) => "addEndEvent",
            Self::AddExclusiveGateway(_) => "addExclusiveGateway",
            Self::AddParallelGateway(_) => "addParallelGateway",
            Self::AddSequenceFlow(_) => "addSequenceFlow",
            Self::UpdateElement(_) => "updateElement",
            Self::RemoveElement(_) => "removeElement",
        }
    }

    /// The element kind and payload of a shape-creating command.
    pub fn shape(&self) -> Option<(ElementKind, &ShapePayload)> {
        match self {
            Self::AddTask(payload) => Some((ElementKind::Task, payload)),
            Self::AddStartEvent(payload) => Some((ElementKind::StartEvent, payload)),
            Self::AddEndEvent(payload) => Some((ElementKind::EndEvent, payload)),
            Self::AddExclusiveGateway(payload) => Some((ElementKind::ExclusiveGateway, payload)),
            Self::AddParallelGateway(payload) => Some((ElementKind::ParallelGateway, payload)),
            Self::Clear
            | Self::AddSequenceFlow(_)
            | Self::UpdateElement(_)
            | Self::RemoveElement(_) => None,
        }
    }

    /// Runs the same checks the assistant output goes through against this command's wire form.
    pub fn validate(&self) -> Validation {
        match serde_json::to_value(self) {
            Ok(value) => validate_command(&value),
            Err(err) => Validation::from_errors(vec![format!("Command cannot be encoded: {err}")]),
        }
    }
}

impl fmt::Display for TransformCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => f.write_str("clear"),
            Self::AddSequenceFlow(FlowPayload { source_id, target_id }) => {
                write!(f, "addSequenceFlow({source_id} -> {target_id})")
            }
            Self::UpdateElement(UpdatePayload { id, .. })
            | Self::RemoveElement(RemovePayload { id }) => write!(f, "{}({id})", self.action()),
            Self::AddTask(ShapePayload { id, .. })
            | Self::AddStartEvent(ShapePayload { id, .. })
            | Self::AddEndEvent(ShapePayload { id, .. })
            | Self::AddExclusiveGateway(ShapePayload { id, .. })
            | Self::AddParallelGateway(ShapePayload { id, .. }) => {
                write!(f, "{}({id})", self.action())
            }
        }
    }
}

/// Where a shape goes when the command carries no coordinates: start events left of center,
/// end events right of it, tasks and gateways in between.
pub fn default_position(kind: ElementKind) -> Point {
    match kind {
        ElementKind::StartEvent => Point::new(150.0, 200.0),
        ElementKind::EndEvent => Point::new(600.0, 200.0),
        ElementKind::ExclusiveGateway | ElementKind::ParallelGateway => Point::new(450.0, 200.0),
        _ => Point::new(300.0, 200.0),
    }
}

fn default_name(kind: ElementKind) -> Option<String> {
    match kind {
        ElementKind::Task => Some("Task".to_owned()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Cleared,
    Created { id: ElementId },
    Connected { id: ElementId },
    Updated { id: ElementId, properties: Vec<String> },
    Removed { ids: Vec<ElementId> },
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cleared => f.write_str("diagram cleared"),
            Self::Created { id } => write!(f, "created {id}"),
            Self::Connected { id } => write!(f, "created sequence flow {id}"),
            Self::Updated { id, properties } => {
                write!(f, "updated {id} ({})", properties.join(", "))
            }
            Self::Removed { ids } => {
                let mut ids = ids.iter();
                match ids.next() {
                    Some(first) => {
                        write!(f, "removed {first}")?;
                        let dependents = ids.len();
                        if dependents > 0 {
                            write!(f, " and {dependents} dependent element(s)")?;
                        }
                        Ok(())
                    }
                    None => f.write_str("removed nothing"),
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid command: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },
    #[error("invalid element id {value:?}: {source}")]
    InvalidId {
        value: String,
        #[source]
        source: IdError,
    },
    #[error("diagram has no root container")]
    RootNotFound,
    #[error("element not found: {id}")]
    ElementNotFound { id: String },
    #[error("source element not found: {id}")]
    SourceNotFound { id: String },
    #[error("target element not found: {id}")]
    TargetNotFound { id: String },
    #[error("could not reset the diagram: {source}")]
    Clear {
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Outcome of one command in a batch.
#[derive(Debug)]
pub struct CommandResult {
    pub command: TransformCommand,
    pub outcome: Result<CommandOutput, CommandError>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output(&self) -> Option<&CommandOutput> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CommandError> {
        self.outcome.as_ref().err()
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(output) => write!(f, "{}: {output}", self.command),
            Err(err) => write!(f, "{}: {err}", self.command),
        }
    }
}

/// Applies one command. The command is re-validated first, so hand-built commands get the
/// same screening as assistant output.
pub fn execute<E>(engine: &mut E, command: &TransformCommand) -> Result<CommandOutput, CommandError>
where
    E: DiagramEngine + ?Sized,
{
    let validation = command.validate();
    if !validation.valid {
        return Err(CommandError::Invalid { errors: validation.errors });
    }

    match command {
        TransformCommand::Clear => {
            engine.import_xml(BLANK_DIAGRAM_XML).map_err(|source| CommandError::Clear { source })?;
            Ok(CommandOutput::Cleared)
        }
        TransformCommand::AddSequenceFlow(FlowPayload { source_id, target_id }) => {
            let source = resolve(engine, source_id)
                .ok_or_else(|| CommandError::SourceNotFound { id: source_id.clone() })?;
            let target = resolve(engine, target_id)
                .ok_or_else(|| CommandError::TargetNotFound { id: target_id.clone() })?;
            let id = engine.connect(&source, &target)?;
            Ok(CommandOutput::Connected { id })
        }
        TransformCommand::UpdateElement(UpdatePayload { id, properties }) => {
            let id = resolve(engine, id)
                .ok_or_else(|| CommandError::ElementNotFound { id: id.clone() })?;
            let properties = engine.update_properties(&id, properties)?;
            Ok(CommandOutput::Updated { id, properties })
        }
        TransformCommand::RemoveElement(RemovePayload { id }) => {
            let id = resolve(engine, id)
                .ok_or_else(|| CommandError::ElementNotFound { id: id.clone() })?;
            let ids = engine.remove_element(&id)?;
            Ok(CommandOutput::Removed { ids })
        }
        TransformCommand::AddTask(payload) => add_shape(engine, ElementKind::Task, payload),
        TransformCommand::AddStartEvent(payload) => {
            add_shape(engine, ElementKind::StartEvent, payload)
        }
        TransformCommand::AddEndEvent(payload) => add_shape(engine, ElementKind::EndEvent, payload),
        TransformCommand::AddExclusiveGateway(payload) => {
            add_shape(engine, ElementKind::ExclusiveGateway, payload)
        }
        TransformCommand::AddParallelGateway(payload) => {
            add_shape(engine, ElementKind::ParallelGateway, payload)
        }
    }
}

fn resolve<E>(engine: &E, id: &str) -> Option<ElementId>
where
    E: DiagramEngine + ?Sized,
{
    engine.get(id).map(|element| element.id().clone())
}

fn add_shape<E>(
    engine: &mut E,
    kind: ElementKind,
    payload: &ShapePayload,
) -> Result<CommandOutput, CommandError>
where
    E: DiagramEngine + ?Sized,
{
    let root = engine
        .root_element()
        .map(|root| root.id().clone())
        .ok_or(CommandError::RootNotFound)?;
    let id = ElementId::new(payload.id.clone())
        .map_err(|source| CommandError::InvalidId { value: payload.id.clone(), source })?;

    let fallback = default_position(kind);
    let shape = NewShape {
        id,
        kind,
        name: payload.name.clone().or_else(|| default_name(kind)),
        position: Point::new(payload.x.unwrap_or(fallback.x), payload.y.unwrap_or(fallback.y)),
    };
    let id = engine.create_shape(shape, &root)?;
    Ok(CommandOutput::Created { id })
}

/// Applies `commands` strictly in order. Every command gets exactly one result; failures are
/// recorded and the batch moves on, so later commands still see what earlier ones created.
pub fn execute_batch<E>(engine: &mut E, commands: &[TransformCommand]) -> Vec<CommandResult>
where
    E: DiagramEngine + ?Sized,
{
    let results = commands
        .iter()
        .map(|command| {
            let outcome = execute(engine, command);
            match &outcome {
                Ok(output) => tracing::debug!(%command, %output, "command applied"),
                Err(err) => tracing::warn!(%command, error = %err, "command failed"),
            }
            CommandResult { command: command.clone(), outcome }
        })
        .collect::<Vec<_>>();

    let failed = results.iter().filter(|result| !result.success()).count();
    tracing::info!(total = results.len(), failed, "command batch executed");
    results
}
