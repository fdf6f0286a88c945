// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![cfg(test)]

use super::diagram::BpmnDiagram;
use super::element::{Bounds, DiagramElement, ElementKind};
use super::ids::{DefinitionsId, ElementId};

pub(crate) fn eid(value: &str) -> ElementId {
    ElementId::new(value).expect("element id")
}

fn connect(diagram: &mut BpmnDiagram, id: &str, source: &str, target: &str) {
    let mut flow = DiagramElement::connection(eid(id), eid(source), eid(target));
    let from = diagram.get(source).and_then(|e| e.bounds().copied()).expect("source bounds");
    let to = diagram.get(target).and_then(|e| e.bounds().copied()).expect("target bounds");
    flow.set_waypoints(vec![from.mid_right(), to.mid_left()]);
    diagram.insert(flow).expect("insert flow");
}

/// `Start -> Review request -> (gateway) -yes-> End`, with one labelled flow.
pub(crate) fn approval_process() -> BpmnDiagram {
    let mut diagram = BpmnDiagram::new(
        DefinitionsId::new("Definitions_1").expect("definitions id"),
        eid("Process_1"),
    );

    for element in [
        DiagramElement::shape(
            eid("Start"),
            ElementKind::StartEvent,
            Bounds::new(132.0, 182.0, 36.0, 36.0),
        ),
        DiagramElement::shape(
            eid("Task_Review"),
            ElementKind::Task,
            Bounds::new(250.0, 160.0, 100.0, 80.0),
        )
        .with_name(Some("Review request")),
        DiagramElement::shape(
            eid("Gateway_Approved"),
            ElementKind::ExclusiveGateway,
            Bounds::new(405.4, 175.0, 50.0, 50.0),
        ),
        DiagramElement::shape(
            eid("End"),
            ElementKind::EndEvent,
            Bounds::new(532.0, 182.0, 36.0, 36.0),
        ),
    ] {
        diagram.insert(element).expect("insert shape");
    }

    connect(&mut diagram, "Flow_1", "Start", "Task_Review");
    connect(&mut diagram, "Flow_2", "Task_Review", "Gateway_Approved");
    connect(&mut diagram, "Flow_3", "Gateway_Approved", "End");
    if let Some(flow) = diagram.get_mut("Flow_3") {
        flow.set_name(Some("yes"));
    }
    diagram
        .insert(DiagramElement::label(
            eid("Flow_3_label"),
            eid("Flow_3"),
            Bounds::new(480.0, 180.0, 20.0, 14.0),
        ))
        .expect("insert label");

    diagram
}
