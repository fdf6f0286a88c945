// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The capability surface the command layer needs from a diagram editor.
//!
//! The command executor and the context extractor only ever talk to these traits, so a
//! different editor (or a test double) can stand in for [`InMemoryModeler`].

mod memory;

use serde_json::{Map, Value};

use crate::format::bpmn::BpmnImportError;
use crate::model::{DiagramElement, DiagramError, ElementId, ElementKind, Point};

pub use memory::InMemoryModeler;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Diagram(#[from] DiagramError),
    #[error(transparent)]
    Import(#[from] BpmnImportError),
    #[error("element not found (id={id})")]
    NotFound { id: String },
    #[error("{kind} cannot be created as a shape")]
    NotAShape { kind: ElementKind },
    #[error("element {id} ({kind}) cannot be used as a shape parent")]
    InvalidParent { id: ElementId, kind: ElementKind },
    #[error("element {id} ({kind}) cannot be connected")]
    ConnectionNotAllowed { id: ElementId, kind: ElementKind },
    #[error("property {key:?} cannot be changed: {reason}")]
    InvalidProperty { key: String, reason: &'static str },
}

/// Lookup into the live element graph.
pub trait ElementRegistry {
    fn get(&self, id: &str) -> Option<&DiagramElement>;

    /// Every element, in the engine's native iteration order.
    fn all(&self) -> Vec<&DiagramElement>;
}

pub trait Canvas {
    /// The single root container new shapes are attached to.
    fn root_element(&self) -> Option<&DiagramElement>;
}

/// A node to be created by [`Modeling::create_shape`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewShape {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: Option<String>,
    /// Center of the new shape.
    pub position: Point,
}

pub trait Modeling {
    fn create_shape(&mut self, shape: NewShape, parent: &ElementId)
        -> Result<ElementId, EngineError>;

    /// Creates a sequence flow and returns its generated id.
    fn connect(&mut self, source: &ElementId, target: &ElementId)
        -> Result<ElementId, EngineError>;

    /// Merges `properties` into the element; returns the keys that were applied.
    fn update_properties(
        &mut self,
        id: &ElementId,
        properties: &Map<String, Value>,
    ) -> Result<Vec<String>, EngineError>;

    /// Removes the element and whatever depends on it; returns every removed id.
    fn remove_element(&mut self, id: &ElementId) -> Result<Vec<ElementId>, EngineError>;
}

pub trait DiagramIo {
    /// Replaces the whole diagram with the parsed document.
    fn import_xml(&mut self, xml: &str) -> Result<(), EngineError>;

    fn export_xml(&self) -> String;
}

/// Everything the command executor needs, as one bound.
pub trait DiagramEngine: ElementRegistry + Canvas + Modeling + DiagramIo {}

impl<T: ElementRegistry + Canvas + Modeling + DiagramIo> DiagramEngine for T {}
