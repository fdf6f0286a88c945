// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use bpmn_assist::engine::InMemoryModeler;
use bpmn_assist::ops::{execute_batch, FlowPayload, ShapePayload, TransformCommand};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Number of tasks on the main line.
    pub fn tasks(self) -> usize {
        match self {
            Self::Small => 8,
            Self::Medium => 60,
            Self::Large => 400,
        }
    }
}

fn shape(id: String, name: Option<String>, x: f64, y: f64) -> ShapePayload {
    ShapePayload { id, name, x: Some(x), y: Some(y) }
}

fn flow(source: &str, target: &str) -> TransformCommand {
    TransformCommand::AddSequenceFlow(FlowPayload {
        source_id: source.to_owned(),
        target_id: target.to_owned(),
    })
}

/// Start, `tasks` tasks in a row with an exclusive gateway after every fifth task, end; each
/// gateway also branches off to a dead-end side task.
pub fn process_commands(tasks: usize) -> Vec<TransformCommand> {
    let mut commands = vec![
        TransformCommand::Clear,
        TransformCommand::AddStartEvent(shape("Start".to_owned(), Some("Start".to_owned()), 150.0, 200.0)),
    ];
    let mut previous = "Start".to_owned();
    let mut x = 300.0;

    for idx in 0..tasks {
        let task = format!("Task_{idx:04}");
        commands.push(TransformCommand::AddTask(shape(task.clone(), Some(format!("Step {idx}")), x, 200.0)));
        commands.push(flow(&previous, &task));
        previous = task;
        x += 150.0;

        if idx % 5 == 4 {
            let gateway = format!("Gateway_{idx:04}");
            let side = format!("Task_{idx:04}_side");
            commands.push(TransformCommand::AddExclusiveGateway(shape(
                gateway.clone(),
                Some(format!("Check {idx}?")),
                x,
                200.0,
            )));
            commands.push(TransformCommand::AddTask(shape(side.clone(), None, x, 320.0)));
            commands.push(flow(&previous, &gateway));
            commands.push(flow(&gateway, &side));
            previous = gateway;
            x += 150.0;
        }
    }

    commands.push(TransformCommand::AddEndEvent(shape("End".to_owned(), None, x, 200.0)));
    commands.push(flow(&previous, "End"));
    commands
}

pub fn commands(case: Case) -> Vec<TransformCommand> {
    process_commands(case.tasks())
}

/// Wire form of [`commands`], as the assistant would send it.
pub fn command_json(case: Case) -> Vec<Value> {
    commands(case)
        .iter()
        .map(|command| serde_json::to_value(command).unwrap_or_else(|_| json!({})))
        .collect()
}

pub fn modeler(case: Case) -> InMemoryModeler {
    let mut modeler = InMemoryModeler::blank().expect("blank modeler");
    let results = execute_batch(&mut modeler, &commands(case));
    assert!(results.iter().all(|result| result.success()), "fixture commands must apply");
    modeler
}
