// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::rstest;

use super::{parse_svg, serialize_svg};
use crate::model::{Connector, ConnectorId, ConnectorKind, Rect, Shape, ShapeId, ShapeKind};

fn shape(id: &str, kind: ShapeKind, bounds: Rect, text: &str) -> Shape {
    Shape::new(ShapeId::new(id).expect("shape id"), kind, bounds, text)
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

fn assert_rect_close(actual: Rect, expected: Rect) {
    for (a, b) in [
        (actual.x, expected.x),
        (actual.y, expected.y),
        (actual.width, expected.width),
        (actual.height, expected.height),
    ] {
        assert!((a - b).abs() < 1e-9, "expected {expected:?}, got {actual:?}");
    }
}

#[rstest]
#[case(ShapeKind::Rect)]
#[case(ShapeKind::Ellipse)]
#[case(ShapeKind::Diamond)]
fn round_trip_recovers_kind_bounds_and_text(#[case] kind: ShapeKind) {
    let original = shape("node-1", kind, Rect::new(40.0, 70.0, 120.0, 50.0), "Start");
    let svg = serialize_svg(&[original.clone()], &[]);

    let parsed = parse_svg(&svg);
    assert_eq!(parsed.shapes.len(), 1);
    let recovered = &parsed.shapes[0];
    assert_eq!(recovered.id().as_str(), "node-1");
    assert_eq!(recovered.kind(), kind);
    assert_rect_close(recovered.bounds(), original.bounds());
    assert_eq!(recovered.text(), "Start");
}

#[test]
fn round_trip_recovers_multi_line_text() {
    let original = shape(
        "node-1",
        ShapeKind::Rect,
        Rect::new(0.0, 0.0, 120.0, 50.0),
        "first\nsecond\nthird",
    );
    let svg = serialize_svg(&[original], &[]);
    assert_eq!(svg.matches("<tspan").count(), 3);

    let parsed = parse_svg(&svg);
    assert_eq!(parsed.shapes[0].text(), "first\nsecond\nthird");
}

#[test]
fn round_trip_escapes_markup_in_labels_and_ids() {
    let original = shape(
        "a&b",
        ShapeKind::Rect,
        Rect::new(0.0, 0.0, 120.0, 50.0),
        "<Review> & \"ship\"",
    );
    let svg = serialize_svg(&[original], &[]);
    assert!(!svg.contains("<Review>"));

    let parsed = parse_svg(&svg);
    assert_eq!(parsed.shapes[0].id().as_str(), "a&b");
    assert_eq!(parsed.shapes[0].text(), "<Review> & \"ship\"");
}

#[test]
fn blank_label_serializes_as_placeholder() {
    let original = shape("node-1", ShapeKind::Rect, Rect::new(0.0, 0.0, 120.0, 50.0), "");
    let svg = serialize_svg(&[original], &[]);
    assert!(svg.contains(">...</tspan>"));
}

#[test]
fn empty_diagram_yields_the_default_view_window() {
    let svg = serialize_svg(&[], &[]);
    assert!(svg.contains("viewBox=\"0 0 840 640\""));
    assert!(svg.contains("translate(20, 20)"));
}

#[test]
fn view_window_grows_with_content_and_never_clips_negative_coordinates() {
    let original = shape(
        "node-1",
        ShapeKind::Rect,
        Rect::new(-100.0, -50.0, 1000.0, 50.0),
        "",
    );
    let svg = serialize_svg(&[original], &[]);
    // x spans -120..920, y spans -70..620.
    assert!(svg.contains("viewBox=\"0 0 1040 690\""));
    assert!(svg.contains("translate(120, 70)"));
}

#[test]
fn connectors_are_emitted_but_not_recovered() {
    let shapes = vec![
        shape("a", ShapeKind::Rect, Rect::new(0.0, 0.0, 120.0, 50.0), "A"),
        shape("b", ShapeKind::Rect, Rect::new(0.0, 200.0, 120.0, 50.0), "B"),
    ];
    let connectors = vec![connector("conn-1", "a", "b")];
    let svg = serialize_svg(&shapes, &connectors);

    // Bottom-center of a to top-center of b, with midpoint control points.
    assert!(svg.contains("d=\"M 60 50 C 60 125, 60 125, 60 200\""));
    assert!(svg.contains("marker-end=\"url(#arrow)\""));

    let parsed = parse_svg(&svg);
    assert_eq!(parsed.shapes.len(), 2);
    assert!(parsed.connectors.is_empty());
}

#[test]
fn connector_with_missing_endpoint_is_skipped() {
    let shapes = vec![shape("a", ShapeKind::Rect, Rect::new(0.0, 0.0, 120.0, 50.0), "A")];
    let connectors = vec![connector("conn-1", "a", "ghost")];
    let svg = serialize_svg(&shapes, &connectors);
    assert!(!svg.contains("<path"));
}

#[test]
fn groups_with_connector_prefix_or_no_primitive_are_ignored() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg"><g>
        <g id="conn-abc"><rect x="0" y="0" width="10" height="10"/></g>
        <g id="label-only"><text x="0" y="0">hi</text></g>
        <g id="real"><rect x="5" y="6" width="70" height="40"/></g>
    </g></svg>"##;

    let parsed = parse_svg(svg);
    assert_eq!(parsed.shapes.len(), 1);
    assert_eq!(parsed.shapes[0].id().as_str(), "real");
    assert_rect_close(parsed.shapes[0].bounds(), Rect::new(5.0, 6.0, 70.0, 40.0));
}

#[test]
fn ellipse_geometry_is_recovered_from_center_and_radii() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><g>
        <g id="e"><ellipse cx="100" cy="60" rx="40" ry="20"/></g>
    </g></svg>"#;

    let parsed = parse_svg(svg);
    assert_eq!(parsed.shapes[0].kind(), ShapeKind::Ellipse);
    assert_rect_close(parsed.shapes[0].bounds(), Rect::new(60.0, 40.0, 80.0, 40.0));
}

#[test]
fn malformed_or_foreign_content_degrades_to_empty() {
    assert!(parse_svg("<svg><g></svg>").shapes.is_empty());
    assert!(parse_svg("not svg").shapes.is_empty());
    assert!(parse_svg("<html><body/></html>").shapes.is_empty());
}

#[test]
fn drawio_export_fallback_recovers_cells_through_transforms() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
      <g data-cell-id="0">
        <g data-cell-id="1">
          <g transform="translate(10, 20)">
            <g data-cell-id="abc123"><rect x="0" y="0" width="120" height="60"/></g>
            <g data-cell-id="def456" transform="scale(2)"><ellipse cx="50" cy="50" rx="10" ry="10"/></g>
          </g>
        </g>
      </g>
    </svg>"#;

    let parsed = parse_svg(svg);
    assert_eq!(parsed.shapes.len(), 2);

    let rect = parsed
        .shapes
        .iter()
        .find(|shape| shape.id().as_str() == "abc123")
        .expect("rect cell");
    assert_eq!(rect.kind(), ShapeKind::Rect);
    assert_rect_close(rect.bounds(), Rect::new(10.0, 20.0, 120.0, 60.0));
    assert_eq!(rect.text(), "");

    let ellipse = parsed
        .shapes
        .iter()
        .find(|shape| shape.id().as_str() == "def456")
        .expect("ellipse cell");
    assert_eq!(ellipse.kind(), ShapeKind::Ellipse);
    // scale(2) inside translate(10, 20): 40..60 doubles to 80..120, then shifts.
    assert_rect_close(ellipse.bounds(), Rect::new(90.0, 100.0, 40.0, 40.0));
}

#[test]
fn drawio_fallback_skips_root_layer_markers_and_empty_groups() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
      <g data-cell-id="0"><rect x="0" y="0" width="5" height="5"/></g>
      <g data-cell-id="decor"><text x="0" y="0">note</text></g>
    </svg>"#;

    assert!(parse_svg(svg).shapes.is_empty());
}
