// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::element::{DiagramElement, ElementKind};
use super::ids::{DefinitionsId, ElementId, IdError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("element already exists (id={id})")]
    AlreadyExists { id: ElementId },
    #[error("element not found (id={id})")]
    NotFound { id: String },
    #[error("the root container cannot be removed (id={id})")]
    RootRemoval { id: ElementId },
    #[error(transparent)]
    InvalidId(#[from] IdError),
}

/// A single BPMN process diagram: one root container plus the element graph beneath it.
///
/// Elements are keyed by id; each insert stamps a creation sequence number so callers can
/// recover insertion order independently of the map's key order.
#[derive(Debug, Clone, PartialEq)]
pub struct BpmnDiagram {
    definitions_id: DefinitionsId,
    root_id: Option<ElementId>,
    elements: BTreeMap<ElementId, DiagramElement>,
    next_seq: u64,
    rev: u64,
}

impl BpmnDiagram {
    pub fn new(definitions_id: DefinitionsId, root_id: ElementId) -> Self {
        let mut diagram = Self::without_root(definitions_id);
        diagram.root_id = Some(root_id.clone());
        diagram.stamp_and_store(DiagramElement::root(root_id));
        diagram
    }

    /// A diagram with no root container. Shape creation against it fails; it exists to model
    /// a half-imported or otherwise malformed engine state.
    pub fn without_root(definitions_id: DefinitionsId) -> Self {
        Self { definitions_id, root_id: None, elements: BTreeMap::new(), next_seq: 0, rev: 0 }
    }

    pub fn definitions_id(&self) -> &DefinitionsId {
        &self.definitions_id
    }

    pub fn root_id(&self) -> Option<&ElementId> {
        self.root_id.as_ref()
    }

    pub fn root(&self) -> Option<&DiagramElement> {
        self.root_id.as_ref().and_then(|id| self.elements.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&DiagramElement> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut DiagramElement> {
        self.elements.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn elements(&self) -> &BTreeMap<ElementId, DiagramElement> {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements_in_creation_order(&self) -> Vec<&DiagramElement> {
        let mut elements = self.elements.values().collect::<Vec<_>>();
        elements.sort_by_key(|element| element.seq());
        elements
    }

    /// The external label attached to `owner`, whatever id it was stored under.
    pub fn label_of(&self, owner: &ElementId) -> Option<&DiagramElement> {
        self.elements.values().find(|element| {
            element.kind() == ElementKind::Label && element.label_target() == Some(owner)
        })
    }

    /// `{owner}_label`, or `{owner}_label_<n>` for the first free `n` when another element
    /// already holds that id.
    pub fn free_label_id(&self, owner: &ElementId) -> Result<ElementId, DiagramError> {
        let base = format!("{owner}_label");
        if !self.contains(&base) {
            return Ok(ElementId::new(base)?);
        }
        let mut n = 2u64;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.contains(&candidate) {
                return Ok(ElementId::new(candidate)?);
            }
            n = n.saturating_add(1);
        }
    }

    /// Moves the label stored under `id` to a fresh id so a visible element can take `id`.
    /// Returns the label's new id; `None` when `id` is free or held by anything but a label.
    pub fn relocate_label(&mut self, id: &str) -> Result<Option<ElementId>, DiagramError> {
        let Some(existing) = self.elements.get(id) else {
            return Ok(None);
        };
        if existing.kind() != ElementKind::Label {
            return Ok(None);
        }
        let (Some(owner), Some(bounds)) = (existing.label_target().cloned(), existing.bounds().copied())
        else {
            return Ok(None);
        };
        let seq = existing.seq();

        let new_id = self.free_label_id(&owner)?;
        self.elements.remove(id);
        let mut label = DiagramElement::label(new_id.clone(), owner, bounds);
        label.set_seq(seq);
        self.elements.insert(new_id.clone(), label);
        Ok(Some(new_id))
    }

    /// The sequence number the next inserted element will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn insert(&mut self, element: DiagramElement) -> Result<(), DiagramError> {
        if self.elements.contains_key(element.id()) {
            return Err(DiagramError::AlreadyExists { id: element.id().clone() });
        }
        self.stamp_and_store(element);
        Ok(())
    }

    fn stamp_and_store(&mut self, mut element: DiagramElement) {
        element.set_seq(self.next_seq);
        self.next_seq = self.next_seq.saturating_add(1);
        self.elements.insert(element.id().clone(), element);
    }

    /// Removes `id` and everything that transitively depends on it (connections attached to
    /// a removed node, labels of removed elements). Returns the removed ids, `id` first.
    pub fn remove_cascade(&mut self, id: &str) -> Result<Vec<ElementId>, DiagramError> {
        let Some(element) = self.elements.get(id) else {
            return Err(DiagramError::NotFound { id: id.to_owned() });
        };
        if self.root_id.as_ref() == Some(element.id()) {
            return Err(DiagramError::RootRemoval { id: element.id().clone() });
        }

        let mut removed = vec![element.id().clone()];
        let mut cursor = 0;
        while cursor < removed.len() {
            let current = removed[cursor].clone();
            let dependents = self
                .elements
                .values()
                .filter(|candidate| candidate.depends_on(&current))
                .map(|candidate| candidate.id().clone())
                .filter(|candidate| !removed.contains(candidate))
                .collect::<Vec<_>>();
            removed.extend(dependents);
            cursor += 1;
        }

        for removed_id in &removed {
            self.elements.remove(removed_id);
        }
        Ok(removed)
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    pub fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{BpmnDiagram, DiagramError};
    use crate::model::fixtures::{approval_process, eid};
    use crate::model::{Bounds, DefinitionsId, DiagramElement, ElementKind};

    #[test]
    fn new_diagram_contains_only_the_root() {
        let diagram = BpmnDiagram::new(
            DefinitionsId::new("Definitions_1").expect("definitions id"),
            eid("Process_1"),
        );
        assert_eq!(diagram.len(), 1);
        assert_eq!(diagram.root().map(|root| root.kind()), Some(ElementKind::Process));
        assert_eq!(diagram.rev(), 0);
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut diagram = approval_process();
        let duplicate = DiagramElement::shape(
            eid("Task_Review"),
            ElementKind::Task,
            Bounds::new(0.0, 0.0, 100.0, 80.0),
        );
        assert_eq!(
            diagram.insert(duplicate),
            Err(DiagramError::AlreadyExists { id: eid("Task_Review") })
        );
    }

    #[test]
    fn creation_order_differs_from_key_order() {
        let diagram = approval_process();
        let ordered = diagram
            .elements_in_creation_order()
            .into_iter()
            .map(|element| element.id().as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            ordered,
            vec![
                "Process_1",
                "Start",
                "Task_Review",
                "Gateway_Approved",
                "End",
                "Flow_1",
                "Flow_2",
                "Flow_3",
                "Flow_3_label",
            ]
        );
    }

    #[test]
    fn remove_cascade_takes_connections_and_their_labels() {
        let mut diagram = approval_process();
        let removed = diagram.remove_cascade("Gateway_Approved").expect("remove");
        let removed = removed.iter().map(|id| id.as_str()).collect::<Vec<_>>();
        assert_eq!(removed, vec!["Gateway_Approved", "Flow_2", "Flow_3", "Flow_3_label"]);
        assert!(diagram.contains("Task_Review"));
        assert!(diagram.contains("Flow_1"));
        assert!(!diagram.contains("Flow_3_label"));
    }

    #[test]
    fn remove_cascade_refuses_root_and_unknown_ids() {
        let mut diagram = approval_process();
        assert_eq!(
            diagram.remove_cascade("Process_1"),
            Err(DiagramError::RootRemoval { id: eid("Process_1") })
        );
        assert_eq!(
            diagram.remove_cascade("nope"),
            Err(DiagramError::NotFound { id: "nope".to_owned() })
        );
    }

    #[test]
    fn labels_are_found_by_owner_and_can_be_moved_aside() {
        let mut diagram = approval_process();
        assert_eq!(diagram.free_label_id(&eid("End")), Ok(eid("End_label")));
        assert_eq!(diagram.free_label_id(&eid("Flow_3")), Ok(eid("Flow_3_label_2")));

        assert_eq!(diagram.relocate_label("Task_Review"), Ok(None));
        assert_eq!(diagram.relocate_label("nope"), Ok(None));

        let seq = diagram.get("Flow_3_label").map(DiagramElement::seq);
        assert_eq!(diagram.relocate_label("Flow_3_label"), Ok(Some(eid("Flow_3_label_2"))));
        assert!(!diagram.contains("Flow_3_label"));
        let label = diagram.label_of(&eid("Flow_3")).expect("moved label");
        assert_eq!(label.id().as_str(), "Flow_3_label_2");
        assert_eq!(Some(label.seq()), seq);
        assert_eq!(label.bounds(), Some(&Bounds::new(480.0, 180.0, 20.0, 14.0)));
    }
}
