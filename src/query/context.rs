// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;

use crate::engine::ElementRegistry;
use crate::model::{DiagramElement, ElementKind};

/// One diagram element as the assistant sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl ElementSummary {
    fn from_element(element: &DiagramElement) -> Self {
        let bounds = element.bounds();
        Self {
            id: element.id().to_string(),
            kind: element.kind().bpmn_type().to_owned(),
            name: element.name().unwrap_or_default().to_owned(),
            x: bounds.map(|bounds| bounds.x.round() as i64),
            y: bounds.map(|bounds| bounds.y.round() as i64),
            source_id: element.source().map(ToString::to_string),
            target_id: element.target().map(ToString::to_string),
        }
    }
}

fn is_summarized(element: &DiagramElement) -> bool {
    !matches!(element.kind(), ElementKind::Process | ElementKind::Label)
}

/// Summaries of every node and flow, in creation order. The root container and label
/// sub-elements are left out.
pub fn extract_context<R>(registry: &R) -> Vec<ElementSummary>
where
    R: ElementRegistry + ?Sized,
{
    let mut elements = registry
        .all()
        .into_iter()
        .filter(|element| is_summarized(element))
        .collect::<Vec<_>>();
    elements.sort_by_key(|element| element.seq());
    elements.into_iter().map(ElementSummary::from_element).collect()
}

/// [`extract_context`] rendered as indented JSON, ready to embed in a prompt.
pub fn context_json<R>(registry: &R) -> String
where
    R: ElementRegistry + ?Sized,
{
    serde_json::to_string_pretty(&extract_context(registry)).unwrap_or_else(|_| "[]".to_owned())
}
