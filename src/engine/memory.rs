// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::{Map, Value};

use super::{Canvas, DiagramIo, ElementRegistry, EngineError, Modeling, NewShape};
use crate::format::bpmn::import::straight_waypoints;
use crate::format::bpmn::{export_bpmn, import_bpmn};
use crate::model::{
    Bounds, BpmnDiagram, DefinitionsId, DiagramElement, ElementId, ElementKind, IdError,
};

/// Diagram engine backed by a plain [`BpmnDiagram`].
///
/// Every successful mutation bumps the diagram revision, which callers can use to detect
/// changes the same way an editor's command-stack notifications would.
#[derive(Debug, Clone)]
pub struct InMemoryModeler {
    diagram: BpmnDiagram,
}

impl InMemoryModeler {
    pub fn new(diagram: BpmnDiagram) -> Self {
        Self { diagram }
    }

    /// An empty `Process_1`, equivalent to importing the blank document.
    pub fn blank() -> Result<Self, IdError> {
        Ok(Self::new(BpmnDiagram::new(
            DefinitionsId::new("Definitions_1")?,
            ElementId::new("Process_1")?,
        )))
    }

    pub fn from_xml(xml: &str) -> Result<Self, EngineError> {
        Ok(Self::new(import_bpmn(xml)?))
    }

    pub fn diagram(&self) -> &BpmnDiagram {
        &self.diagram
    }

    pub fn into_diagram(self) -> BpmnDiagram {
        self.diagram
    }

    pub fn revision(&self) -> u64 {
        self.diagram.rev()
    }

    /// Adds, keeps or drops the external label of `owner` so it matches the owner's name.
    /// Only a label element pointing back at `owner` counts; a user element that happens to
    /// be called `{owner}_label` is never touched.
    fn sync_label(&mut self, owner: &ElementId) -> Result<(), EngineError> {
        let Some(element) = self.diagram.get(owner.as_str()) else {
            return Ok(());
        };
        if !element.kind().has_external_label() {
            return Ok(());
        }
        let wants_label = element.name().is_some();
        let placement = element.default_label_bounds();
        let existing = self.diagram.label_of(owner).map(|label| label.id().clone());

        match (wants_label, existing, placement) {
            (true, None, Some(bounds)) => {
                let label_id = self.diagram.free_label_id(owner)?;
                self.diagram.insert(DiagramElement::label(label_id, owner.clone(), bounds))?;
            }
            (false, Some(label_id), _) => {
                self.diagram.remove_cascade(label_id.as_str())?;
            }
            _ => {}
        }
        Ok(())
    }

    fn next_flow_id(&self) -> Result<ElementId, EngineError> {
        let mut n = self.diagram.next_seq();
        loop {
            let candidate = format!("Flow_{n}");
            if !self.diagram.contains(&candidate) {
                return ElementId::new(candidate)
                    .map_err(|_| EngineError::NotFound { id: format!("Flow_{n}") });
            }
            n = n.saturating_add(1);
        }
    }

    fn lookup(&self, id: &ElementId) -> Result<&DiagramElement, EngineError> {
        self.diagram
            .get(id.as_str())
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })
    }
}

impl ElementRegistry for InMemoryModeler {
    fn get(&self, id: &str) -> Option<&DiagramElement> {
        self.diagram.get(id)
    }

    fn all(&self) -> Vec<&DiagramElement> {
        self.diagram.elements().values().collect()
    }
}

impl Canvas for InMemoryModeler {
    fn root_element(&self) -> Option<&DiagramElement> {
        self.diagram.root()
    }
}

impl Modeling for InMemoryModeler {
    fn create_shape(
        &mut self,
        shape: NewShape,
        parent: &ElementId,
    ) -> Result<ElementId, EngineError> {
        let parent = self.lookup(parent)?;
        if parent.kind() != ElementKind::Process {
            return Err(EngineError::InvalidParent { id: parent.id().clone(), kind: parent.kind() });
        }
        if !shape.kind.is_node() {
            return Err(EngineError::NotAShape { kind: shape.kind });
        }
        let Some((width, height)) = shape.kind.default_size() else {
            return Err(EngineError::NotAShape { kind: shape.kind });
        };

        // Labels are not visible to callers, so a new shape may claim a label's id.
        if let Some(moved) = self.diagram.relocate_label(shape.id.as_str())? {
            tracing::debug!(id = %shape.id, label = %moved, "moved label to free a shape id");
        }

        let bounds = Bounds::centered_at(shape.position, width, height);
        let element = DiagramElement::shape(shape.id.clone(), shape.kind, bounds).with_name(shape.name);
        self.diagram.insert(element)?;
        self.sync_label(&shape.id)?;
        self.diagram.bump_rev();
        Ok(shape.id)
    }

    fn connect(
        &mut self,
        source: &ElementId,
        target: &ElementId,
    ) -> Result<ElementId, EngineError> {
        for endpoint in [source, target] {
            let element = self.lookup(endpoint)?;
            if !element.kind().is_node() {
                return Err(EngineError::ConnectionNotAllowed {
                    id: element.id().clone(),
                    kind: element.kind(),
                });
            }
        }

        let id = self.next_flow_id()?;
        let mut flow = DiagramElement::connection(id.clone(), source.clone(), target.clone());
        flow.set_waypoints(straight_waypoints(&self.diagram, source, target));
        self.diagram.insert(flow)?;
        self.diagram.bump_rev();
        Ok(id)
    }

    fn update_properties(
        &mut self,
        id: &ElementId,
        properties: &Map<String, Value>,
    ) -> Result<Vec<String>, EngineError> {
        self.lookup(id)?;
        // Validate everything first so a rejected key leaves the element untouched.
        for (key, value) in properties {
            match key.as_str() {
                "id" => {
                    return Err(EngineError::InvalidProperty {
                        key: key.clone(),
                        reason: "element ids are immutable",
                    })
                }
                "name" if !(value.is_string() || value.is_null()) => {
                    return Err(EngineError::InvalidProperty {
                        key: key.clone(),
                        reason: "name must be a string or null",
                    })
                }
                _ => {}
            }
        }

        let element = self
            .diagram
            .get_mut(id.as_str())
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })?;
        let mut updated = Vec::with_capacity(properties.len());
        for (key, value) in properties {
            match (key.as_str(), value) {
                ("name", Value::String(name)) => element.set_name(Some(name.as_str())),
                ("name", _) => element.set_name::<String>(None),
                (_, Value::Null) => {
                    element.properties_mut().remove(key);
                }
                _ => {
                    element.properties_mut().insert(key.clone(), value.clone());
                }
            }
            updated.push(key.clone());
        }

        self.sync_label(id)?;
        self.diagram.bump_rev();
        Ok(updated)
    }

    fn remove_element(&mut self, id: &ElementId) -> Result<Vec<ElementId>, EngineError> {
        let removed = self.diagram.remove_cascade(id.as_str())?;
        self.diagram.bump_rev();
        Ok(removed)
    }
}

impl DiagramIo for InMemoryModeler {
    fn import_xml(&mut self, xml: &str) -> Result<(), EngineError> {
        let mut imported = import_bpmn(xml)?;
        imported.set_rev(self.diagram.rev().saturating_add(1));
        self.diagram = imported;
        Ok(())
    }

    fn export_xml(&self) -> String {
        export_bpmn(&self.diagram)
    }
}
