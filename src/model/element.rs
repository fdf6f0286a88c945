// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::ids::ElementId;

/// The closed set of element kinds the diagram model understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Process,
    StartEvent,
    EndEvent,
    Task,
    ExclusiveGateway,
    ParallelGateway,
    SequenceFlow,
    Label,
}

impl ElementKind {
    pub fn bpmn_type(self) -> &'static str {
        match self {
            Self::Process => "bpmn:Process",
            Self::StartEvent => "bpmn:StartEvent",
            Self::EndEvent => "bpmn:EndEvent",
            Self::Task => "bpmn:Task",
            Self::ExclusiveGateway => "bpmn:ExclusiveGateway",
            Self::ParallelGateway => "bpmn:ParallelGateway",
            Self::SequenceFlow => "bpmn:SequenceFlow",
            Self::Label => "label",
        }
    }

    pub fn is_node(self) -> bool {
        matches!(
            self,
            Self::StartEvent
                | Self::EndEvent
                | Self::Task
                | Self::ExclusiveGateway
                | Self::ParallelGateway
        )
    }

    pub fn is_connection(self) -> bool {
        self == Self::SequenceFlow
    }

    /// Events, gateways and flows render their name in a separate label element; tasks
    /// render it inside the shape.
    pub fn has_external_label(self) -> bool {
        matches!(
            self,
            Self::StartEvent
                | Self::EndEvent
                | Self::ExclusiveGateway
                | Self::ParallelGateway
                | Self::SequenceFlow
        )
    }

    /// Default `(width, height)` of a freshly created shape.
    pub fn default_size(self) -> Option<(f64, f64)> {
        match self {
            Self::Task => Some((100.0, 80.0)),
            Self::StartEvent | Self::EndEvent => Some((36.0, 36.0)),
            Self::ExclusiveGateway | Self::ParallelGateway => Some((50.0, 50.0)),
            Self::Label => Some((90.0, 20.0)),
            Self::Process | Self::SequenceFlow => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bpmn_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned shape bounds; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn centered_at(center: Point, width: f64, height: f64) -> Self {
        Self { x: center.x - width / 2.0, y: center.y - height / 2.0, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn mid_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height / 2.0)
    }

    pub fn mid_left(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramElement {
    id: ElementId,
    kind: ElementKind,
    name: Option<String>,
    bounds: Option<Bounds>,
    source: Option<ElementId>,
    target: Option<ElementId>,
    waypoints: Vec<Point>,
    label_target: Option<ElementId>,
    properties: BTreeMap<String, Value>,
    seq: u64,
}

impl DiagramElement {
    pub fn root(id: ElementId) -> Self {
        Self::bare(id, ElementKind::Process)
    }

    pub fn shape(id: ElementId, kind: ElementKind, bounds: Bounds) -> Self {
        let mut element = Self::bare(id, kind);
        element.bounds = Some(bounds);
        element
    }

    pub fn connection(id: ElementId, source: ElementId, target: ElementId) -> Self {
        let mut element = Self::bare(id, ElementKind::SequenceFlow);
        element.source = Some(source);
        element.target = Some(target);
        element
    }

    pub fn label(id: ElementId, label_target: ElementId, bounds: Bounds) -> Self {
        let mut element = Self::bare(id, ElementKind::Label);
        element.label_target = Some(label_target);
        element.bounds = Some(bounds);
        element
    }

    fn bare(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            name: None,
            bounds: None,
            source: None,
            target: None,
            waypoints: Vec::new(),
            label_target: None,
            properties: BTreeMap::new(),
            seq: 0,
        }
    }

    pub fn with_name<T: Into<String>>(mut self, name: Option<T>) -> Self {
        self.set_name(name);
        self
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Empty names are stored as "no name".
    pub fn set_name<T: Into<String>>(&mut self, name: Option<T>) {
        self.name = name.map(Into::into).filter(|name| !name.is_empty());
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    pub fn set_bounds(&mut self, bounds: Option<Bounds>) {
        self.bounds = bounds;
    }

    pub fn source(&self) -> Option<&ElementId> {
        self.source.as_ref()
    }

    pub fn target(&self) -> Option<&ElementId> {
        self.target.as_ref()
    }

    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }

    pub fn set_waypoints(&mut self, waypoints: Vec<Point>) {
        self.waypoints = waypoints;
    }

    pub fn label_target(&self) -> Option<&ElementId> {
        self.label_target.as_ref()
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.properties
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn set_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    /// Whether this element points at `id` as source, target or label target.
    pub fn depends_on(&self, id: &ElementId) -> bool {
        self.source.as_ref() == Some(id)
            || self.target.as_ref() == Some(id)
            || self.label_target.as_ref() == Some(id)
    }

    /// Where an external label for this element goes when none was placed explicitly:
    /// centered below a shape, or centered on the midpoint of a connection.
    pub fn default_label_bounds(&self) -> Option<Bounds> {
        let (width, height) = ElementKind::Label.default_size()?;
        if let Some(bounds) = &self.bounds {
            let center = bounds.center();
            return Some(Bounds::new(
                center.x - width / 2.0,
                bounds.y + bounds.height + 5.0,
                width,
                height,
            ));
        }
        let (first, last) = (self.waypoints.first()?, self.waypoints.last()?);
        let mid = Point::new((first.x + last.x) / 2.0, (first.y + last.y) / 2.0);
        Some(Bounds::centered_at(mid, width, height))
    }
}
