// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;

use crate::model::{
    Bounds, BpmnDiagram, DefinitionsId, DiagramElement, DiagramError, ElementId, ElementKind,
    IdError, Point,
};

#[derive(Debug, thiserror::Error)]
pub enum BpmnImportError {
    #[error("malformed BPMN XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed BPMN XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("document contains no bpmn:process")]
    MissingProcess,
    #[error("invalid {field} {value:?}: {source}")]
    InvalidId {
        field: &'static str,
        value: String,
        #[source]
        source: IdError,
    },
    #[error("sequence flow {flow_id} references unknown element {reference:?}")]
    UnknownReference { flow_id: String, reference: String },
    #[error("sequence flow {flow_id} is missing its {field}")]
    MissingReference { flow_id: String, field: &'static str },
    #[error("invalid number {value:?} in DI attribute {field}")]
    InvalidNumber { field: &'static str, value: String },
    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

#[derive(Debug)]
struct NodeRecord {
    id: String,
    kind: ElementKind,
    name: Option<String>,
    properties: Vec<(String, String)>,
}

#[derive(Debug)]
struct FlowRecord {
    id: String,
    name: Option<String>,
    source: Option<String>,
    target: Option<String>,
    properties: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct DiRecord {
    bounds: HashMap<String, Bounds>,
    label_bounds: HashMap<String, Bounds>,
    waypoints: HashMap<String, Vec<Point>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiOwner {
    Shape,
    Edge,
}

#[derive(Debug, Default)]
struct ImportState {
    definitions_id: Option<String>,
    process_id: Option<String>,
    process_depth: Option<usize>,
    reading_primary_process: bool,
    nodes: Vec<NodeRecord>,
    flows: Vec<FlowRecord>,
    di: DiRecord,
    di_owner: Option<(DiOwner, String)>,
    in_di_label: bool,
}

/// Parses a BPMN 2.0 document into a diagram.
///
/// Only the first `bpmn:process` is read. Flow nodes outside the supported kinds are skipped
/// with a warning; sequence flows must reference imported nodes. Named events, gateways and
/// flows get a label element, placed from DI when the document has one.
pub fn import_bpmn(xml: &str) -> Result<BpmnDiagram, BpmnImportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = ImportState::default();
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                state.open(&start, depth)?;
                depth += 1;
            }
            Event::Empty(start) => {
                state.open(&start, depth)?;
                state.close(start.local_name().as_ref(), depth);
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                state.close(end.local_name().as_ref(), depth);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    state.finish()
}

impl ImportState {
    fn open(&mut self, start: &BytesStart<'_>, depth: usize) -> Result<(), BpmnImportError> {
        let local = start.local_name();
        let local = local.as_ref();

        if let Some(process_depth) = self.process_depth {
            if depth == process_depth + 1 {
                self.open_flow_element(start, local)?;
            }
            return Ok(());
        }

        match local {
            b"definitions" => {
                self.definitions_id = attr(start, b"id")?;
            }
            b"process" => {
                self.process_depth = Some(depth);
                self.reading_primary_process = self.process_id.is_none();
                if self.reading_primary_process {
                    self.process_id = attr(start, b"id")?;
                } else {
                    tracing::warn!("ignoring additional bpmn:process; only the first is imported");
                }
            }
            b"BPMNShape" => {
                if let Some(target) = attr(start, b"bpmnElement")? {
                    self.di_owner = Some((DiOwner::Shape, target));
                }
            }
            b"BPMNEdge" => {
                if let Some(target) = attr(start, b"bpmnElement")? {
                    self.di_owner = Some((DiOwner::Edge, target));
                }
            }
            b"BPMNLabel" => {
                self.in_di_label = true;
            }
            b"Bounds" => {
                if let Some((_, target)) = &self.di_owner {
                    let bounds = Bounds::new(
                        number_attr(start, b"x", "x")?,
                        number_attr(start, b"y", "y")?,
                        number_attr(start, b"width", "width")?,
                        number_attr(start, b"height", "height")?,
                    );
                    let slot = if self.in_di_label {
                        &mut self.di.label_bounds
                    } else {
                        &mut self.di.bounds
                    };
                    slot.insert(target.clone(), bounds);
                }
            }
            b"waypoint" => {
                if let Some((DiOwner::Edge, target)) = &self.di_owner {
                    let point = Point::new(number_attr(start, b"x", "x")?, number_attr(start, b"y", "y")?);
                    self.di.waypoints.entry(target.clone()).or_default().push(point);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn open_flow_element(
        &mut self,
        start: &BytesStart<'_>,
        local: &[u8],
    ) -> Result<(), BpmnImportError> {
        if !self.reading_primary_process {
            return Ok(());
        }

        let kind = match local {
            b"startEvent" => ElementKind::StartEvent,
            b"endEvent" => ElementKind::EndEvent,
            b"task" | b"userTask" | b"serviceTask" | b"scriptTask" | b"manualTask"
            | b"sendTask" | b"receiveTask" | b"businessRuleTask" => ElementKind::Task,
            b"exclusiveGateway" => ElementKind::ExclusiveGateway,
            b"parallelGateway" => ElementKind::ParallelGateway,
            b"sequenceFlow" => ElementKind::SequenceFlow,
            other => {
                tracing::warn!(
                    element = %String::from_utf8_lossy(other),
                    "skipping unsupported BPMN flow element"
                );
                return Ok(());
            }
        };

        let Some(id) = attr(start, b"id")? else {
            tracing::warn!(kind = %kind, "skipping BPMN flow element without id");
            return Ok(());
        };
        let name = attr(start, b"name")?;
        let properties = assist_attrs(start)?;

        if kind == ElementKind::SequenceFlow {
            self.flows.push(FlowRecord {
                id,
                name,
                source: attr(start, b"sourceRef")?,
                target: attr(start, b"targetRef")?,
                properties,
            });
        } else {
            self.nodes.push(NodeRecord { id, kind, name, properties });
        }
        Ok(())
    }

    fn close(&mut self, local: &[u8], depth: usize) {
        match local {
            b"process" if self.process_depth == Some(depth) => {
                self.process_depth = None;
                self.reading_primary_process = false;
            }
            b"BPMNShape" | b"BPMNEdge" => {
                self.di_owner = None;
            }
            b"BPMNLabel" => {
                self.in_di_label = false;
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<BpmnDiagram, BpmnImportError> {
        let Some(process_id) = self.process_id else {
            return Err(BpmnImportError::MissingProcess);
        };
        let definitions_id = self.definitions_id.unwrap_or_else(|| "Definitions_1".to_owned());
        let definitions_id = DefinitionsId::new(definitions_id.clone()).map_err(|source| {
            BpmnImportError::InvalidId { field: "definitions id", value: definitions_id, source }
        })?;
        let mut diagram = BpmnDiagram::new(definitions_id, element_id("process id", process_id)?);
        let mut di = self.di;

        for node in self.nodes {
            let bounds = di.bounds.remove(&node.id).unwrap_or_else(|| {
                tracing::warn!(element = %node.id, "BPMN shape has no DI bounds; placing at origin");
                let (width, height) = node.kind.default_size().unwrap_or((100.0, 80.0));
                Bounds::new(0.0, 0.0, width, height)
            });
            let mut element = DiagramElement::shape(element_id("element id", node.id)?, node.kind, bounds)
                .with_name(node.name);
            apply_properties(&mut element, node.properties);
            diagram.insert(element)?;
        }

        for flow in self.flows {
            let source = resolve_reference(&diagram, &flow.id, flow.source.as_deref(), "sourceRef")?;
            let target = resolve_reference(&diagram, &flow.id, flow.target.as_deref(), "targetRef")?;
            let waypoints = match di.waypoints.remove(&flow.id) {
                Some(points) if points.len() >= 2 => points,
                _ => straight_waypoints(&diagram, &source, &target),
            };
            let mut element = DiagramElement::connection(element_id("flow id", flow.id)?, source, target)
                .with_name(flow.name);
            element.set_waypoints(waypoints);
            apply_properties(&mut element, flow.properties);
            diagram.insert(element)?;
        }

        let labelled = diagram
            .elements_in_creation_order()
            .into_iter()
            .filter(|element| element.kind().has_external_label() && element.name().is_some())
            .map(|element| {
                let bounds = di
                    .label_bounds
                    .get(element.id().as_str())
                    .copied()
                    .or_else(|| element.default_label_bounds());
                (element.id().clone(), bounds)
            })
            .collect::<Vec<_>>();
        for (owner, bounds) in labelled {
            let Some(bounds) = bounds else {
                continue;
            };
            let label_id = diagram.free_label_id(&owner)?;
            diagram.insert(DiagramElement::label(label_id, owner, bounds))?;
        }

        Ok(diagram)
    }
}

/// Straight connection between the facing sides of two shapes.
pub(crate) fn straight_waypoints(
    diagram: &BpmnDiagram,
    source: &ElementId,
    target: &ElementId,
) -> Vec<Point> {
    let from = diagram.get(source.as_str()).and_then(|element| element.bounds().copied());
    let to = diagram.get(target.as_str()).and_then(|element| element.bounds().copied());
    match (from, to) {
        (Some(from), Some(to)) => vec![from.mid_right(), to.mid_left()],
        _ => Vec::new(),
    }
}

fn resolve_reference(
    diagram: &BpmnDiagram,
    flow_id: &str,
    reference: Option<&str>,
    field: &'static str,
) -> Result<ElementId, BpmnImportError> {
    let Some(reference) = reference else {
        return Err(BpmnImportError::MissingReference { flow_id: flow_id.to_owned(), field });
    };
    match diagram.get(reference) {
        Some(element) if element.kind().is_node() => Ok(element.id().clone()),
        _ => Err(BpmnImportError::UnknownReference {
            flow_id: flow_id.to_owned(),
            reference: reference.to_owned(),
        }),
    }
}

fn element_id(field: &'static str, value: String) -> Result<ElementId, BpmnImportError> {
    ElementId::new(value.clone()).map_err(|source| BpmnImportError::InvalidId { field, value, source })
}

fn attr(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, BpmnImportError> {
    for attribute in start.attributes() {
        let attribute = attribute?;
        if attribute.key.local_name().as_ref() == name {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn number_attr(
    start: &BytesStart<'_>,
    name: &[u8],
    field: &'static str,
) -> Result<f64, BpmnImportError> {
    let raw = attr(start, name)?.unwrap_or_default();
    raw.trim()
        .parse::<f64>()
        .map_err(|_| BpmnImportError::InvalidNumber { field, value: raw })
}

fn assist_attrs(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, BpmnImportError> {
    let mut properties = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = attribute.key;
        if key.prefix().map(|prefix| prefix.as_ref() == b"assist") != Some(true) {
            continue;
        }
        let name = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
        properties.push((name, attribute.unescape_value()?.into_owned()));
    }
    Ok(properties)
}

/// Reverses the exporter's encoding: JSON-looking values come back typed, the rest as strings.
fn apply_properties(element: &mut DiagramElement, properties: Vec<(String, String)>) {
    for (key, raw) in properties {
        let value = match serde_json::from_str::<Value>(&raw) {
            Ok(value) if !value.is_string() => value,
            _ => Value::String(raw),
        };
        element.properties_mut().insert(key, value);
    }
}
