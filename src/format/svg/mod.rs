// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canonical SVG geometry codec.
//!
//! Serialization is the round-trip format of record: one `<g id>` per shape
//! with exactly one geometric primitive plus a centered text block, and one
//! arrow path per connector. Parsing accepts our own output plus, as a
//! fallback, draw.io-exported SVG (`g[data-cell-id]`), for which bounding
//! boxes are recovered through composed ancestor transforms.
//!
//! Connectors are intentionally *not* recovered from arrow paths: once
//! flattened to cubic curves the source/target references are gone. The
//! links sidecar carries the lossless connector list; this parser returns an
//! empty connector list rather than fabricating edges from geometry.

mod transform;

use crate::format::xml::{self, XmlElement};
use crate::model::{Connector, Rect, Shape, ShapeId, ShapeKind, CONNECTOR_ID_PREFIX};

use transform::{parse_transform, Transform};

#[cfg(test)]
mod tests;

/// Uniform padding around content in the emitted view window.
const VIEW_MARGIN: f64 = 20.0;
/// The view window never shrinks below the default canvas size.
const VIEW_MIN_WIDTH: f64 = 800.0;
const VIEW_MIN_HEIGHT: f64 = 600.0;

const SHAPE_STROKE: &str = "#45475a";
const RECT_FILL: &str = "#89b4fa";
const ELLIPSE_FILL: &str = "#a6e3a1";
const DIAMOND_FILL: &str = "#f9e2af";
const CONNECTOR_STROKE: &str = "#6c7086";
const TEXT_FILL: &str = "#1e1e2e";

/// draw.io tags elements with this attribute instead of `id`.
const FOREIGN_ID_ATTR: &str = "data-cell-id";
/// draw.io root-layer cells; never diagram content.
const RESERVED_ROOT_MARKERS: [&str; 2] = ["0", "1"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSvg {
    pub shapes: Vec<Shape>,
    pub connectors: Vec<Connector>,
}

/// Serializes the diagram snapshot into a self-contained SVG document.
///
/// The view window is `min(0, content) - 20 .. max(800/600, content) + 20`
/// per axis, so an empty diagram still yields the default canvas plus
/// margin. Shape coordinates are emitted in model space; the single outer
/// group carries the translation into the view window's frame, which keeps
/// the parse side free of any coordinate adjustment.
pub fn serialize_svg(shapes: &[Shape], connectors: &[Connector]) -> String {
    let mut min_x = 0.0_f64;
    let mut min_y = 0.0_f64;
    let mut max_x = VIEW_MIN_WIDTH;
    let mut max_y = VIEW_MIN_HEIGHT;
    for shape in shapes {
        let bounds = shape.bounds();
        min_x = min_x.min(bounds.x);
        min_y = min_y.min(bounds.y);
        max_x = max_x.max(bounds.right());
        max_y = max_y.max(bounds.bottom());
    }
    min_x -= VIEW_MARGIN;
    min_y -= VIEW_MARGIN;
    max_x += VIEW_MARGIN;
    max_y += VIEW_MARGIN;

    let width = max_x - min_x;
    let height = max_y - min_y;

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {width} {height}\" width=\"{width}\" height=\"{height}\">\n"
    ));
    out.push_str(&format!(
        "  <defs><marker id=\"arrow\" markerWidth=\"10\" markerHeight=\"10\" refX=\"9\" refY=\"3\" orient=\"auto\"><polygon points=\"0 0, 10 3, 0 6\" fill=\"{CONNECTOR_STROKE}\"/></marker></defs>\n"
    ));
    out.push_str(&format!(
        "  <g transform=\"translate({}, {})\">\n",
        -min_x, -min_y
    ));

    for connector in connectors {
        let Some(from) = shapes
            .iter()
            .find(|shape| shape.id() == connector.from())
        else {
            continue;
        };
        let Some(to) = shapes.iter().find(|shape| shape.id() == connector.to()) else {
            continue;
        };
        out.push_str("    ");
        out.push_str(&connector_path(from, to));
        out.push('\n');
    }

    for shape in shapes {
        out.push_str("    ");
        out.push_str(&shape_group(shape));
        out.push('\n');
    }

    out.push_str("  </g>\n</svg>\n");
    out
}

fn shape_group(shape: &Shape) -> String {
    let id = escape_xml(shape.id().as_str());
    let bounds = shape.bounds();
    let (cx, cy) = bounds.center();
    let text = text_block(shape.text(), cx, cy);

    match shape.kind() {
        ShapeKind::Rect => format!(
            "<g id=\"{id}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{RECT_FILL}\" stroke=\"{SHAPE_STROKE}\" stroke-width=\"2\" rx=\"4\"/>{text}</g>",
            bounds.x, bounds.y, bounds.width, bounds.height
        ),
        ShapeKind::Ellipse => format!(
            "<g id=\"{id}\"><ellipse cx=\"{cx}\" cy=\"{cy}\" rx=\"{}\" ry=\"{}\" fill=\"{ELLIPSE_FILL}\" stroke=\"{SHAPE_STROKE}\" stroke-width=\"2\"/>{text}</g>",
            bounds.width / 2.0,
            bounds.height / 2.0
        ),
        ShapeKind::Diamond => {
            // Four points at the midpoints of each bounding edge.
            let points = format!(
                "{cx},{} {},{cy} {cx},{} {},{cy}",
                bounds.y,
                bounds.right(),
                bounds.bottom(),
                bounds.x
            );
            format!(
                "<g id=\"{id}\"><polygon points=\"{points}\" fill=\"{DIAMOND_FILL}\" stroke=\"{SHAPE_STROKE}\" stroke-width=\"2\"/>{text}</g>"
            )
        }
    }
}

fn connector_path(from: &Shape, to: &Shape) -> String {
    let from_bounds = from.bounds();
    let to_bounds = to.bounds();
    // Anchor at source bottom-center and target top-center; the control
    // points sit at each endpoint's x and the shared vertical midpoint,
    // giving a vertical S-curve.
    let fx = from_bounds.x + from_bounds.width / 2.0;
    let fy = from_bounds.bottom();
    let tx = to_bounds.x + to_bounds.width / 2.0;
    let ty = to_bounds.y;
    let my = (fy + ty) / 2.0;
    format!(
        "<path d=\"M {fx} {fy} C {fx} {my}, {tx} {my}, {tx} {ty}\" fill=\"none\" stroke=\"{CONNECTOR_STROKE}\" stroke-width=\"2\" marker-end=\"url(#arrow)\"/>"
    )
}

fn text_block(text: &str, cx: f64, cy: f64) -> String {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    // A label with no visible content collapses to a single placeholder line.
    let lines: Vec<&str> = if lines.iter().any(|line| !line.trim().is_empty()) {
        lines
    } else if text.is_empty() {
        vec!["..."]
    } else {
        vec![text]
    };

    // 1.2em line height; the first line is lifted by half the block height
    // so the whole stack stays vertically centered on cy.
    let first_dy = if lines.len() > 1 {
        -((lines.len() - 1) as f64) * 0.5 * 1.2
    } else {
        0.0
    };

    let mut spans = String::new();
    for (index, line) in lines.iter().enumerate() {
        let dy = if index == 0 {
            format!("{first_dy}em")
        } else {
            "1.2em".to_owned()
        };
        spans.push_str(&format!(
            "<tspan x=\"{cx}\" dy=\"{dy}\">{}</tspan>",
            escape_xml(line)
        ));
    }

    format!(
        "<text x=\"{cx}\" y=\"{cy}\" text-anchor=\"middle\" font-size=\"12\" fill=\"{TEXT_FILL}\">{spans}</text>"
    )
}

/// Escapes the five reserved markup characters.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Parses an SVG document into shapes. Malformed or unrecognized input
/// degrades to an empty result; it never raises. The connector list is
/// always empty (see the module docs).
pub fn parse_svg(content: &str) -> ParsedSvg {
    let Some(root) = xml::parse_document(content) else {
        return ParsedSvg::default();
    };
    let svg = if root.name() == "svg" {
        &root
    } else {
        match root.first_descendant("svg") {
            Some(svg) => svg,
            None => return ParsedSvg::default(),
        }
    };

    let drawing_root = svg
        .child_elements()
        .find(|child| child.name() == "g")
        .unwrap_or(svg);

    let mut shapes = Vec::new();
    for group in drawing_root.descendants() {
        if group.name() != "g" {
            continue;
        }
        let Some(id) = group.attr("id") else {
            continue;
        };
        if id.starts_with(CONNECTOR_ID_PREFIX) {
            continue;
        }
        let Some(shape) = shape_from_group(id, group) else {
            continue;
        };
        shapes.push(shape);
    }

    if shapes.is_empty() {
        shapes = parse_foreign_svg(svg);
    }

    ParsedSvg {
        shapes,
        connectors: Vec::new(),
    }
}

fn shape_from_group(id: &str, group: &XmlElement) -> Option<Shape> {
    let id = ShapeId::new(id).ok()?;

    let (kind, bounds) = if let Some(rect) = group.first_descendant("rect") {
        let x = attr_f64(rect, "x", 0.0);
        let y = attr_f64(rect, "y", 0.0);
        let width = attr_f64(rect, "width", 100.0);
        let height = attr_f64(rect, "height", 60.0);
        (ShapeKind::Rect, Rect::new(x, y, width, height))
    } else if let Some(ellipse) = group.first_descendant("ellipse") {
        let cx = attr_f64(ellipse, "cx", 0.0);
        let cy = attr_f64(ellipse, "cy", 0.0);
        let rx = attr_f64(ellipse, "rx", 50.0);
        let ry = attr_f64(ellipse, "ry", 30.0);
        (
            ShapeKind::Ellipse,
            Rect::new(cx - rx, cy - ry, rx * 2.0, ry * 2.0),
        )
    } else if let Some(polygon) = group.first_descendant("polygon") {
        let points = parse_points(polygon.attr("points").unwrap_or_default());
        if points.len() < 4 {
            return None;
        }
        let corners = &points[..4];
        let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        (
            ShapeKind::Diamond,
            Rect::new(min_x, min_y, max_x - min_x, max_y - min_y),
        )
    } else {
        return None;
    };

    let text = group
        .first_descendant("text")
        .map(recover_text)
        .unwrap_or_default();

    Some(Shape::new(id, kind, bounds, text))
}

/// Prefers tspan contents joined by newline; falls back to the raw text
/// content when the text element has no tspans.
fn recover_text(text_element: &XmlElement) -> String {
    let tspans: Vec<&XmlElement> = text_element
        .descendants()
        .into_iter()
        .filter(|element| element.name() == "tspan")
        .collect();
    if tspans.is_empty() {
        text_element.text_content()
    } else {
        tspans
            .iter()
            .map(|tspan| tspan.text_content())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fallback for SVG not authored by this codec (draw.io exports): shapes are
/// `g[data-cell-id]` groups, and their rendered bounding boxes must be
/// recovered by mapping primitive corners through the composed ancestor
/// transform chain. Text is not recovered on this path.
fn parse_foreign_svg(svg: &XmlElement) -> Vec<Shape> {
    let mut shapes = Vec::new();
    walk_foreign(svg, Transform::identity(), &mut shapes);
    shapes
}

fn walk_foreign(element: &XmlElement, parent_transform: Transform, out: &mut Vec<Shape>) {
    for child in element.child_elements() {
        let transform = match child.attr("transform") {
            Some(value) => parent_transform.then(&parse_transform(value)),
            None => parent_transform,
        };

        if child.name() == "g" {
            if let Some(id) = child.attr(FOREIGN_ID_ATTR) {
                if !RESERVED_ROOT_MARKERS.contains(&id) {
                    if let Some(shape) = foreign_shape(id, child, transform) {
                        out.push(shape);
                    }
                }
            }
        }

        walk_foreign(child, transform, out);
    }
}

fn foreign_shape(id: &str, group: &XmlElement, group_transform: Transform) -> Option<Shape> {
    let id = ShapeId::new(id).ok()?;

    // Kind falls back to primitive presence only.
    let kind = if group.first_descendant("ellipse").is_some() {
        ShapeKind::Ellipse
    } else if group.first_descendant("polygon").is_some() {
        ShapeKind::Diamond
    } else if group.first_descendant("rect").is_some() {
        ShapeKind::Rect
    } else {
        return None;
    };

    let mut corners = Vec::new();
    collect_primitive_corners(group, group_transform, &mut corners);
    if corners.is_empty() {
        return None;
    }

    let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    Some(Shape::new(
        id,
        kind,
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y),
        "",
    ))
}

fn collect_primitive_corners(
    element: &XmlElement,
    transform: Transform,
    out: &mut Vec<(f64, f64)>,
) {
    for child in element.child_elements() {
        let child_transform = match child.attr("transform") {
            Some(value) => transform.then(&parse_transform(value)),
            None => transform,
        };

        if let Some(bounds) = primitive_bounds(child) {
            for (x, y) in [
                (bounds.x, bounds.y),
                (bounds.right(), bounds.y),
                (bounds.x, bounds.bottom()),
                (bounds.right(), bounds.bottom()),
            ] {
                out.push(child_transform.apply(x, y));
            }
        }

        collect_primitive_corners(child, child_transform, out);
    }
}

fn primitive_bounds(element: &XmlElement) -> Option<Rect> {
    match element.name() {
        "rect" => Some(Rect::new(
            attr_f64(element, "x", 0.0),
            attr_f64(element, "y", 0.0),
            attr_f64(element, "width", 0.0),
            attr_f64(element, "height", 0.0),
        )),
        "ellipse" => {
            let cx = attr_f64(element, "cx", 0.0);
            let cy = attr_f64(element, "cy", 0.0);
            let rx = attr_f64(element, "rx", 0.0);
            let ry = attr_f64(element, "ry", 0.0);
            Some(Rect::new(cx - rx, cy - ry, rx * 2.0, ry * 2.0))
        }
        "polygon" => {
            let points = parse_points(element.attr("points").unwrap_or_default());
            if points.is_empty() {
                return None;
            }
            let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
            let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
            let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
            let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
            Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
        }
        _ => None,
    }
}

fn attr_f64(element: &XmlElement, name: &str, default: f64) -> f64 {
    element
        .attr(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_points(value: &str) -> Vec<(f64, f64)> {
    let numbers: Vec<f64> = value
        .split([',', ' ', '\t', '\n', '\r'])
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect();
    numbers
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}
