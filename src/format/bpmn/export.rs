// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fmt::Write;

use quick_xml::escape::escape;
use serde_json::Value;

use super::{ASSIST_NS, BPMN_DI_NS, BPMN_MODEL_NS, DC_NS, DI_NS};
use crate::model::{Bounds, BpmnDiagram, DiagramElement, ElementKind};

/// Serializes `diagram` as BPMN 2.0 XML, semantic part first and DI second.
///
/// Elements are written in creation order so repeated exports of the same diagram are
/// byte-identical.
pub fn export_bpmn(diagram: &BpmnDiagram) -> String {
    let elements = diagram.elements_in_creation_order();
    let labels = elements
        .iter()
        .filter_map(|element| {
            let target = element.label_target()?;
            Some((target.as_str(), *element.bounds()?))
        })
        .collect::<HashMap<_, _>>();

    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for flow in elements.iter().filter(|element| element.kind().is_connection()) {
        if let (Some(source), Some(target)) = (flow.source(), flow.target()) {
            outgoing.entry(source.as_str()).or_default().push(flow.id().as_str());
            incoming.entry(target.as_str()).or_default().push(flow.id().as_str());
        }
    }

    let process_id = diagram.root_id().map(|id| id.as_str()).unwrap_or("Process_1");

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        xml,
        r#"<bpmn:definitions xmlns:bpmn="{BPMN_MODEL_NS}" xmlns:bpmndi="{BPMN_DI_NS}" xmlns:dc="{DC_NS}" xmlns:di="{DI_NS}" xmlns:assist="{ASSIST_NS}" id="{}" targetNamespace="http://bpmn.io/schema/bpmn">"#,
        escape(diagram.definitions_id().as_str())
    );
    let _ = writeln!(xml, r#"  <bpmn:process id="{}" isExecutable="false">"#, escape(process_id));

    for element in &elements {
        let Some(tag) = semantic_tag(element.kind()) else {
            continue;
        };
        let mut attrs = format!(r#"id="{}""#, escape(element.id().as_str()));
        if let Some(name) = element.name() {
            let _ = write!(attrs, r#" name="{}""#, escape(name));
        }
        if let (Some(source), Some(target)) = (element.source(), element.target()) {
            let _ = write!(
                attrs,
                r#" sourceRef="{}" targetRef="{}""#,
                escape(source.as_str()),
                escape(target.as_str())
            );
        }
        push_property_attrs(&mut attrs, element);

        let id = element.id().as_str();
        let ins = incoming.get(id).map(Vec::as_slice).unwrap_or_default();
        let outs = outgoing.get(id).map(Vec::as_slice).unwrap_or_default();
        if ins.is_empty() && outs.is_empty() {
            let _ = writeln!(xml, "    <bpmn:{tag} {attrs} />");
            continue;
        }
        let _ = writeln!(xml, "    <bpmn:{tag} {attrs}>");
        for flow_id in ins {
            let _ = writeln!(xml, "      <bpmn:incoming>{}</bpmn:incoming>", escape(*flow_id));
        }
        for flow_id in outs {
            let _ = writeln!(xml, "      <bpmn:outgoing>{}</bpmn:outgoing>", escape(*flow_id));
        }
        let _ = writeln!(xml, "    </bpmn:{tag}>");
    }
    xml.push_str("  </bpmn:process>\n");

    xml.push_str("  <bpmndi:BPMNDiagram id=\"BPMNDiagram_1\">\n");
    let _ = writeln!(
        xml,
        r#"    <bpmndi:BPMNPlane id="BPMNPlane_1" bpmnElement="{}">"#,
        escape(process_id)
    );
    for element in &elements {
        let id = element.id().as_str();
        let label = labels.get(id);
        if element.kind().is_node() {
            let Some(bounds) = element.bounds() else {
                continue;
            };
            let _ = writeln!(
                xml,
                r#"      <bpmndi:BPMNShape id="{}_di" bpmnElement="{}">"#,
                escape(id),
                escape(id)
            );
            push_bounds(&mut xml, "        ", bounds);
            push_label(&mut xml, label);
            xml.push_str("      </bpmndi:BPMNShape>\n");
        } else if element.kind().is_connection() {
            let _ = writeln!(
                xml,
                r#"      <bpmndi:BPMNEdge id="{}_di" bpmnElement="{}">"#,
                escape(id),
                escape(id)
            );
            for point in element.waypoints() {
                let _ = writeln!(xml, r#"        <di:waypoint x="{}" y="{}" />"#, point.x, point.y);
            }
            push_label(&mut xml, label);
            xml.push_str("      </bpmndi:BPMNEdge>\n");
        }
    }
    xml.push_str("    </bpmndi:BPMNPlane>\n");
    xml.push_str("  </bpmndi:BPMNDiagram>\n");
    xml.push_str("</bpmn:definitions>\n");
    xml
}

fn semantic_tag(kind: ElementKind) -> Option<&'static str> {
    match kind {
        ElementKind::StartEvent => Some("startEvent"),
        ElementKind::EndEvent => Some("endEvent"),
        ElementKind::Task => Some("task"),
        ElementKind::ExclusiveGateway => Some("exclusiveGateway"),
        ElementKind::ParallelGateway => Some("parallelGateway"),
        ElementKind::SequenceFlow => Some("sequenceFlow"),
        ElementKind::Process | ElementKind::Label => None,
    }
}

fn push_bounds(xml: &mut String, indent: &str, bounds: &Bounds) {
    let _ = writeln!(
        xml,
        r#"{indent}<dc:Bounds x="{}" y="{}" width="{}" height="{}" />"#,
        bounds.x, bounds.y, bounds.width, bounds.height
    );
}

fn push_label(xml: &mut String, label: Option<&Bounds>) {
    let Some(bounds) = label else {
        return;
    };
    xml.push_str("        <bpmndi:BPMNLabel>\n");
    push_bounds(xml, "          ", bounds);
    xml.push_str("        </bpmndi:BPMNLabel>\n");
}

/// Free-form properties go out as `assist:` attributes; strings verbatim, everything else as
/// compact JSON. Keys that are not valid XML names are left out.
fn push_property_attrs(attrs: &mut String, element: &DiagramElement) {
    for (key, value) in element.properties() {
        if !is_xml_name(key) {
            tracing::warn!(element = %element.id(), key = %key, "skipping property with non-XML key");
            continue;
        }
        let rendered = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let _ = write!(attrs, r#" assist:{key}="{}""#, escape(rendered.as_str()));
    }
}

fn is_xml_name(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
