// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end paste-merge: draw.io XML in, persisted workspace out.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use triton::format::parse_sidecar;
use triton::model::ShapeKind;
use triton::store::{DiagramStore, WorkspaceFolder, DIAGRAM_SVG, LINKS_JSON};

const START_END_XML: &str = r#"<mxGraphModel dx="800" dy="600">
  <root>
    <mxCell id="0"/>
    <mxCell id="1" parent="0"/>
    <mxCell id="start" parent="1" vertex="1" value="Start" style="rounded=1;whiteSpace=wrap;">
      <mxGeometry x="0" y="0" width="120" height="60"/>
    </mxCell>
    <mxCell id="end" parent="1" vertex="1" value="End" style="shape=ellipse;whiteSpace=wrap;">
      <mxGeometry x="200" y="0" width="120" height="60"/>
    </mxCell>
    <mxCell id="flow" parent="1" edge="1" source="start" target="end">
      <mxGeometry relative="1"/>
    </mxCell>
  </root>
</mxGraphModel>"#;

fn temp_workspace(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = env::temp_dir().join(format!("triton-{prefix}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&path).unwrap();
    path
}

#[test]
fn pasted_drawio_content_survives_a_full_save_and_reload_cycle() {
    let workspace_dir = temp_workspace("e2e");
    let mut store = DiagramStore::open(WorkspaceFolder::open(&workspace_dir)).unwrap();

    let stats = store.paste_import(START_END_XML).unwrap();
    assert_eq!(stats.shapes, 2);
    assert_eq!(stats.connectors, 1);

    let start = store
        .diagram()
        .shapes()
        .iter()
        .find(|shape| shape.text() == "Start")
        .unwrap();
    let end = store
        .diagram()
        .shapes()
        .iter()
        .find(|shape| shape.text() == "End")
        .unwrap();

    assert_eq!(start.kind(), ShapeKind::Rect);
    assert_eq!(end.kind(), ShapeKind::Ellipse);

    // Paste-merge lands everything offset by (20, 20).
    assert_eq!((start.bounds().x, start.bounds().y), (20.0, 20.0));
    assert_eq!((end.bounds().x, end.bounds().y), (220.0, 20.0));

    let connector = &store.diagram().connectors()[0];
    assert_eq!(connector.from(), start.id());
    assert_eq!(connector.to(), end.id());

    // The shape borrows must end before flushing mutably.
    let start_id = start.id().clone();

    store.flush().unwrap();
    assert!(workspace_dir.join(DIAGRAM_SVG).is_file());

    // The connector round-trips through the sidecar, never the geometry file.
    let sidecar = parse_sidecar(&fs::read_to_string(workspace_dir.join(LINKS_JSON)).unwrap());
    let persisted = sidecar.connectors.unwrap();
    assert_eq!(persisted.len(), 1);

    let reopened = DiagramStore::open(WorkspaceFolder::open(&workspace_dir)).unwrap();
    assert_eq!(reopened.diagram().shapes().len(), 2);
    assert_eq!(reopened.diagram().connectors().len(), 1);
    let reopened_start = reopened.diagram().shape(start_id.as_str()).unwrap();
    assert_eq!(reopened_start.text(), "Start");
    assert_eq!(reopened_start.bounds().x, 20.0);

    let _ = fs::remove_dir_all(&workspace_dir);
}

#[test]
fn pasting_into_a_populated_diagram_appends_without_touching_existing_content() {
    let workspace_dir = temp_workspace("e2e-merge");
    let mut store = DiagramStore::open(WorkspaceFolder::open(&workspace_dir)).unwrap();

    let existing = store.add_shape(ShapeKind::Diamond, 400.0, 400.0);
    store.paste_import(START_END_XML).unwrap();

    assert_eq!(store.diagram().shapes().len(), 3);
    let untouched = store.diagram().shape(existing.as_str()).unwrap();
    assert_eq!((untouched.bounds().x, untouched.bounds().y), (400.0, 400.0));

    // A second paste generates fresh ids, so nothing collides.
    store.paste_import(START_END_XML).unwrap();
    assert_eq!(store.diagram().shapes().len(), 5);
    assert_eq!(store.diagram().connectors().len(), 2);

    let _ = fs::remove_dir_all(&workspace_dir);
}
