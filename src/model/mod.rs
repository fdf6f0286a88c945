// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A diagram is one root process with nodes, sequence flows and label sub-elements beneath it.
//! The conversation types live here too since the session owns both.

pub mod conversation;
pub mod diagram;
pub mod element;
pub(crate) mod fixtures;
pub mod ids;

pub use conversation::{ChatMessage, ChatRole, Conversation};
pub use diagram::{BpmnDiagram, DiagramError};
pub use element::{Bounds, DiagramElement, ElementKind, Point};
pub use ids::{DefinitionsId, ElementId, Id, IdError};
