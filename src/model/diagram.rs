// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::ids::{ConnectorId, ShapeId};

/// The geometric kind of a shape.
///
/// This is a closed sum: each variant has exactly one SVG primitive derivation
/// in the codec, there is no open-ended dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rect,
    Ellipse,
    Diamond,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Ellipse => "ellipse",
            Self::Diamond => "diamond",
        }
    }
}

/// Connector routing. `Orthogonal` is accepted in persisted data but no
/// current algorithm produces or routes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    #[default]
    Straight,
    Orthogonal,
}

impl ConnectorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::Orthogonal => "orthogonal",
        }
    }
}

/// An axis-aligned bounding box in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// A positioned, sized, typed diagram node with a text label.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    bounds: Rect,
    text: String,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind, bounds: Rect, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            bounds,
            text: text.into(),
        }
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.bounds.x += dx;
        self.bounds.y += dy;
    }
}

/// A field-wise update for [`Shape`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub kind: Option<ShapeKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub text: Option<String>,
}

/// A directed edge between two shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    id: ConnectorId,
    from: ShapeId,
    to: ShapeId,
    kind: ConnectorKind,
}

impl Connector {
    /// Self-loops are rejected at creation; no later pass needs to re-check.
    pub fn new(
        id: ConnectorId,
        from: ShapeId,
        to: ShapeId,
        kind: ConnectorKind,
    ) -> Result<Self, SelfLoop> {
        if from == to {
            return Err(SelfLoop { shape_id: from });
        }
        Ok(Self { id, from, to, kind })
    }

    pub fn id(&self) -> &ConnectorId {
        &self.id
    }

    pub fn from(&self) -> &ShapeId {
        &self.from
    }

    pub fn to(&self) -> &ShapeId {
        &self.to
    }

    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfLoop {
    shape_id: ShapeId,
}

impl fmt::Display for SelfLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connector endpoints must differ (both are {})",
            self.shape_id
        )
    }
}

impl std::error::Error for SelfLoop {}

/// The live diagram: shape list plus connector list.
///
/// Exclusively owned by the store; codecs consume and produce plain
/// snapshots of its contents and never retain references into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    shapes: Vec<Shape>,
    connectors: Vec<Connector>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a diagram from parsed parts, keeping the first shape for a
    /// duplicated id and dropping connectors whose id duplicates an earlier
    /// one. Connector endpoints are not checked against the shape list here:
    /// sidecar-persisted connectors may reference ids from an externally
    /// authored SVG's own id space.
    pub fn from_parts(shapes: Vec<Shape>, connectors: Vec<Connector>) -> Self {
        let mut diagram = Self::new();
        for shape in shapes {
            diagram.insert_shape(shape);
        }
        for connector in connectors {
            diagram.insert_connector(connector);
        }
        diagram
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connectors.is_empty()
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.id().as_str() == id)
    }

    pub fn contains_shape(&self, id: &str) -> bool {
        self.shape(id).is_some()
    }

    /// Returns false (and leaves the diagram unchanged) when the id is
    /// already taken.
    pub fn insert_shape(&mut self, shape: Shape) -> bool {
        if self.contains_shape(shape.id().as_str()) {
            return false;
        }
        self.shapes.push(shape);
        true
    }

    pub fn insert_connector(&mut self, connector: Connector) -> bool {
        if self
            .connectors
            .iter()
            .any(|existing| existing.id() == connector.id())
        {
            return false;
        }
        self.connectors.push(connector);
        true
    }

    /// Merges patch fields into the shape. Width/height values that are not
    /// strictly positive are dropped field-wise so the size invariant holds
    /// after every mutation. Returns false when the shape does not exist.
    pub fn update_shape(&mut self, id: &str, patch: &ShapePatch) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|shape| shape.id().as_str() == id) else {
            return false;
        };

        if let Some(kind) = patch.kind {
            shape.kind = kind;
        }
        if let Some(x) = patch.x {
            shape.bounds.x = x;
        }
        if let Some(y) = patch.y {
            shape.bounds.y = y;
        }
        if let Some(width) = patch.width {
            if width > 0.0 {
                shape.bounds.width = width;
            }
        }
        if let Some(height) = patch.height {
            if height > 0.0 {
                shape.bounds.height = height;
            }
        }
        if let Some(text) = patch.text.as_ref() {
            shape.text = text.clone();
        }
        true
    }

    /// Removes the shape and cascades removal of every connector touching it.
    pub fn remove_shape(&mut self, id: &str) -> Option<Shape> {
        let index = self
            .shapes
            .iter()
            .position(|shape| shape.id().as_str() == id)?;
        let removed = self.shapes.remove(index);
        self.connectors.retain(|connector| {
            connector.from().as_str() != id && connector.to().as_str() != id
        });
        Some(removed)
    }

    /// Appends imported content in one step; callers guarantee fresh ids.
    pub fn merge(&mut self, shapes: Vec<Shape>, connectors: Vec<Connector>) {
        self.shapes.extend(shapes);
        self.connectors.extend(connectors);
    }
}

#[cfg(test)]
mod tests {
    use super::{Connector, ConnectorKind, Diagram, Rect, Shape, ShapeKind, ShapePatch};
    use crate::model::{ConnectorId, ShapeId};

    fn shape(id: &str) -> Shape {
        Shape::new(
            ShapeId::new(id).expect("shape id"),
            ShapeKind::Rect,
            Rect::new(0.0, 0.0, 120.0, 50.0),
            "",
        )
    }

    fn connector(id: &str, from: &str, to: &str) -> Connector {
        Connector::new(
            ConnectorId::new(id).expect("connector id"),
            ShapeId::new(from).expect("from id"),
            ShapeId::new(to).expect("to id"),
            ConnectorKind::Straight,
        )
        .expect("connector")
    }

    #[test]
    fn connector_rejects_self_loop() {
        let id = ConnectorId::new("c1").expect("connector id");
        let endpoint = ShapeId::new("a").expect("shape id");
        let result = Connector::new(id, endpoint.clone(), endpoint, ConnectorKind::Straight);
        assert!(result.is_err());
    }

    #[test]
    fn insert_shape_rejects_duplicate_id() {
        let mut diagram = Diagram::new();
        assert!(diagram.insert_shape(shape("a")));
        assert!(!diagram.insert_shape(shape("a")));
        assert_eq!(diagram.shapes().len(), 1);
    }

    #[test]
    fn remove_shape_cascades_connectors() {
        let mut diagram = Diagram::new();
        diagram.insert_shape(shape("a"));
        diagram.insert_shape(shape("b"));
        diagram.insert_shape(shape("c"));
        diagram.insert_connector(connector("c1", "a", "b"));
        diagram.insert_connector(connector("c2", "b", "c"));
        diagram.insert_connector(connector("c3", "a", "c"));

        assert!(diagram.remove_shape("b").is_some());

        assert_eq!(diagram.shapes().len(), 2);
        assert_eq!(diagram.connectors().len(), 1);
        assert_eq!(diagram.connectors()[0].id().as_str(), "c3");
    }

    #[test]
    fn update_shape_merges_fields_and_drops_non_positive_sizes() {
        let mut diagram = Diagram::new();
        diagram.insert_shape(shape("a"));

        let applied = diagram.update_shape(
            "a",
            &ShapePatch {
                x: Some(30.0),
                width: Some(-5.0),
                height: Some(0.0),
                text: Some("Start".to_owned()),
                ..ShapePatch::default()
            },
        );
        assert!(applied);

        let updated = diagram.shape("a").expect("shape");
        assert_eq!(updated.bounds().x, 30.0);
        assert_eq!(updated.bounds().width, 120.0);
        assert_eq!(updated.bounds().height, 50.0);
        assert_eq!(updated.text(), "Start");
    }

    #[test]
    fn update_shape_returns_false_for_missing_id() {
        let mut diagram = Diagram::new();
        assert!(!diagram.update_shape("missing", &ShapePatch::default()));
    }

    #[test]
    fn from_parts_keeps_first_shape_for_duplicate_id() {
        let mut first = shape("a");
        first.set_text("first");
        let mut second = shape("a");
        second.set_text("second");

        let diagram = Diagram::from_parts(vec![first, second], Vec::new());
        assert_eq!(diagram.shapes().len(), 1);
        assert_eq!(diagram.shape("a").expect("shape").text(), "first");
    }

    #[test]
    fn rect_containment_and_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(10.0, 20.0));
        assert!(rect.contains(110.0, 70.0));
        assert!(!rect.contains(111.0, 30.0));
        assert_eq!(rect.center(), (60.0, 45.0));
    }
}
