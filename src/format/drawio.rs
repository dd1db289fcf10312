// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! draw.io / mxGraph XML importer.
//!
//! Ingests pasted `<mxGraphModel>` content (optionally percent-encoded) and
//! materializes shapes and connectors with freshly generated ids so imported
//! content can never collide with the live diagram's id space.

use std::collections::{HashMap, HashSet};

use crate::format::xml::{self, XmlElement};
use crate::model::{Connector, ConnectorId, ConnectorKind, Rect, Shape, ShapeId, ShapeKind};

const MODEL_TAG: &str = "mxGraphModel";
const CELL_TAG: &str = "mxCell";

/// Parent ids that mean "top level"; mxGraph reserves cell 0 as the model
/// root and cell 1 as the default layer.
const TOP_LEVEL_PARENTS: [&str; 2] = ["0", "1"];

/// Vertices below this size in either dimension are layout artifacts, not
/// diagram content.
const MIN_SHAPE_DIMENSION: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawioImport {
    pub shapes: Vec<Shape>,
    pub connectors: Vec<Connector>,
}

/// Recognizes draw.io / mxGraph content: either the model root tag up front
/// (plain or percent-encoded) or both the model and cell tag substrings
/// anywhere in the text.
pub fn is_drawio_content(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.starts_with("%3CmxGraphModel") || trimmed.starts_with("<mxGraphModel") {
        return true;
    }
    trimmed.contains(MODEL_TAG) && trimmed.contains(CELL_TAG)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone)]
struct Cell {
    id: String,
    parent: String,
    vertex: bool,
    edge: bool,
    value: String,
    style: String,
    geometry: Option<Geometry>,
    source: Option<String>,
    target: Option<String>,
    source_point: Option<Point>,
    target_point: Option<Point>,
}

/// Parses draw.io XML into shapes and connectors. Anything that is not an
/// `mxGraphModel` document yields an empty import; malformed structure
/// degrades per cell rather than failing the whole paste.
pub fn parse_drawio(input: &str) -> DrawioImport {
    let mut text = input.trim().to_owned();
    if text.contains("%3C") || text.contains("%3E") {
        if let Ok(decoded) = urlencoding::decode(&text) {
            text = decoded.into_owned();
        }
    }

    let Some(root) = xml::parse_document(&text) else {
        return DrawioImport::default();
    };
    if root.name() != MODEL_TAG {
        return DrawioImport::default();
    }

    let cells: Vec<Cell> = root
        .descendants()
        .into_iter()
        .filter(|element| element.name() == CELL_TAG)
        .map(parse_cell)
        .collect();
    let by_id: HashMap<&str, &Cell> = cells.iter().map(|cell| (cell.id.as_str(), cell)).collect();

    let mut shapes = Vec::new();
    let mut id_map: HashMap<&str, ShapeId> = HashMap::new();

    for cell in &cells {
        let Some(geometry) = cell.geometry else {
            continue;
        };
        if !cell.vertex {
            continue;
        }
        let style = cell.style.to_ascii_lowercase();
        if style.contains("group") || style.contains("shape=connector") || style.contains("text;") {
            continue;
        }
        if geometry.width < MIN_SHAPE_DIMENSION || geometry.height < MIN_SHAPE_DIMENSION {
            continue;
        }

        let position = absolute_point(&by_id, &cell.parent, geometry.x, geometry.y);
        let id = ShapeId::fresh();
        id_map.insert(cell.id.as_str(), id.clone());
        shapes.push(Shape::new(
            id,
            kind_from_style(&cell.style),
            Rect::new(position.x, position.y, geometry.width, geometry.height),
            decode_rich_text(&cell.value).trim(),
        ));
    }

    let mut connectors = Vec::new();
    for cell in &cells {
        if !cell.edge {
            continue;
        }

        let endpoints = match (&cell.source, &cell.target) {
            (Some(source), Some(target)) => id_map
                .get(source.as_str())
                .zip(id_map.get(target.as_str()))
                .map(|(from, to)| (from.clone(), to.clone())),
            _ => match (cell.source_point, cell.target_point) {
                (Some(source), Some(target)) => {
                    let source = absolute_point(&by_id, &cell.parent, source.x, source.y);
                    let target = absolute_point(&by_id, &cell.parent, target.x, target.y);
                    shape_at(&shapes, source).zip(shape_at(&shapes, target))
                }
                _ => None,
            },
        };

        let Some((from, to)) = endpoints else {
            continue;
        };
        // Self-loops (resolved from == to) are dropped here.
        if let Ok(connector) =
            Connector::new(ConnectorId::fresh(), from, to, ConnectorKind::Straight)
        {
            connectors.push(connector);
        }
    }

    tracing::debug!(
        shapes = shapes.len(),
        connectors = connectors.len(),
        "imported draw.io content"
    );

    DrawioImport { shapes, connectors }
}

fn parse_cell(element: &XmlElement) -> Cell {
    let geometry_element = element.first_descendant("mxGeometry");
    let geometry = geometry_element.map(|geometry| Geometry {
        x: attr_f64(geometry, "x", 0.0),
        y: attr_f64(geometry, "y", 0.0),
        width: attr_f64(geometry, "width", 100.0),
        height: attr_f64(geometry, "height", 60.0),
    });

    let point_as = |role: &str| {
        geometry_element.and_then(|geometry| {
            geometry
                .descendants()
                .into_iter()
                .find(|candidate| candidate.attr("as") == Some(role))
                .map(|point| Point {
                    x: attr_f64(point, "x", 0.0),
                    y: attr_f64(point, "y", 0.0),
                })
        })
    };

    Cell {
        id: element.attr("id").unwrap_or_default().to_owned(),
        parent: element.attr("parent").unwrap_or("0").to_owned(),
        vertex: element.attr("vertex") == Some("1"),
        edge: element.attr("edge") == Some("1"),
        value: element.attr("value").unwrap_or_default().to_owned(),
        style: element.attr("style").unwrap_or_default().to_owned(),
        geometry,
        source: element.attr("source").map(str::to_owned),
        target: element.attr("target").map(str::to_owned),
        source_point: point_as("sourcePoint"),
        target_point: point_as("targetPoint"),
    }
}

/// Resolves coordinates local to `parent` into absolute coordinates by
/// accumulating ancestor offsets. The walk is iterative with a visited set:
/// a malformed parent cycle terminates the accumulation instead of looping,
/// leaving the position resolved as far as the chain was sound. The chain
/// also ends at a missing parent or one without geometry.
fn absolute_point(by_id: &HashMap<&str, &Cell>, parent: &str, x: f64, y: f64) -> Point {
    let mut point = Point { x, y };
    let mut current = parent;
    let mut visited: HashSet<&str> = HashSet::new();

    while !TOP_LEVEL_PARENTS.contains(&current) {
        if !visited.insert(current) {
            tracing::warn!(cell = current, "parent cycle in imported content");
            break;
        }
        let Some(cell) = by_id.get(current) else {
            break;
        };
        let Some(geometry) = cell.geometry else {
            break;
        };
        point.x += geometry.x;
        point.y += geometry.y;
        current = &cell.parent;
    }

    point
}

fn kind_from_style(style: &str) -> ShapeKind {
    let style = style.to_ascii_lowercase();
    if style.contains("shape=ellipse") || style.contains("shape=doubleellipse") {
        ShapeKind::Ellipse
    } else if style.contains("shape=rhombus")
        || style.contains("shape=diamond")
        || style.contains("shape=hexagon")
    {
        ShapeKind::Diamond
    } else {
        ShapeKind::Rect
    }
}

/// Binds a point to a shape: containment first, nearest center (squared
/// distance) as the fallback so point-addressed edges still attach to
/// something plausible.
fn shape_at(shapes: &[Shape], point: Point) -> Option<ShapeId> {
    if let Some(shape) = shapes
        .iter()
        .find(|shape| shape.bounds().contains(point.x, point.y))
    {
        return Some(shape.id().clone());
    }

    shapes
        .iter()
        .min_by(|a, b| {
            let da = center_distance_squared(a, point);
            let db = center_distance_squared(b, point);
            da.total_cmp(&db)
        })
        .map(|shape| shape.id().clone())
}

fn center_distance_squared(shape: &Shape, point: Point) -> f64 {
    let (cx, cy) = shape.bounds().center();
    (point.x - cx).powi(2) + (point.y - cy).powi(2)
}

/// Reduces an mxCell `value` (markup-escaped rich text) to plain text:
/// tags are stripped, character entities decoded. Nothing fancier than the
/// entities draw.io actually emits.
fn decode_rich_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.char_indices();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '<' => {
                // Skip to the closing bracket; unterminated tags swallow the rest.
                for (_, tag_ch) in chars.by_ref() {
                    if tag_ch == '>' {
                        break;
                    }
                }
            }
            '&' => {
                let rest = &value[index..];
                match decode_entity(rest) {
                    Some((decoded, length)) => {
                        out.push_str(&decoded);
                        // Consume the entity body beyond the '&'.
                        for _ in 0..length - 1 {
                            chars.next();
                        }
                    }
                    None => out.push('&'),
                }
            }
            other => out.push(other),
        }
    }

    out
}

/// Decodes one leading entity, returning the replacement and the entity's
/// byte length in the source.
fn decode_entity(text: &str) -> Option<(String, usize)> {
    let end = text.find(';')?;
    if end > 10 {
        return None;
    }
    let body = &text[1..end];
    let decoded = match body {
        "amp" => "&".to_owned(),
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "quot" => "\"".to_owned(),
        "apos" => "'".to_owned(),
        "nbsp" => " ".to_owned(),
        _ => {
            let code = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| body.strip_prefix('#').and_then(|dec| dec.parse().ok()))?;
            char::from_u32(code)?.to_string()
        }
    };
    Some((decoded, end + 1))
}

fn attr_f64(element: &XmlElement, name: &str, default: f64) -> f64 {
    element
        .attr(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
