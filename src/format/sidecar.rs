// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Links sidecar codec.
//!
//! The sidecar JSON carries everything the geometry file cannot: the
//! shape-to-document link table, the persisted connector list (the only
//! lossless channel for connectors), and UI tab state. Writes always use the
//! current schema; reads additionally accept the legacy `shapeLinks` table
//! with its `docKind` field name. The file is rewritten wholesale on every
//! save, never patched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Connector, ConnectorId, ConnectorKind, DocKind, ShapeId, ShapeLink};

pub const SCHEMA_VERSION: u32 = 1;

/// Persisted tab state, one entry per open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabState {
    pub doc_path: String,
    pub active: bool,
    pub pinned: bool,
}

/// Everything recovered from a sidecar file. `connectors` is `None` when the
/// sidecar carried no connector list at all, which callers must distinguish
/// from an explicitly empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidecarState {
    pub links: BTreeMap<ShapeId, ShapeLink>,
    pub connectors: Option<Vec<Connector>>,
    pub open_tabs: Vec<TabState>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SidecarJson {
    schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    links: Option<BTreeMap<String, LinkEntryJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape_links: Option<BTreeMap<String, LegacyLinkEntryJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connectors: Option<Vec<ConnectorJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ui_state: Option<UiStateJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audit: Option<AuditJson>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkEntryJson {
    doc_path: String,
    doc_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyLinkEntryJson {
    doc_path: String,
    doc_kind: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConnectorJson {
    id: String,
    from: String,
    to: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiStateJson {
    #[serde(default)]
    open_tabs: Vec<TabJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_split: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabJson {
    doc_path: String,
    active: bool,
    pinned: bool,
    group: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_modified: Option<String>,
}

/// Serializes the current state under the preferred schema with a fresh
/// audit timestamp.
pub fn serialize_sidecar(
    links: &BTreeMap<ShapeId, ShapeLink>,
    connectors: &[Connector],
    open_tabs: &[TabState],
) -> Result<String, serde_json::Error> {
    let json = SidecarJson {
        schema_version: SCHEMA_VERSION,
        links: Some(
            links
                .iter()
                .map(|(id, link)| {
                    (
                        id.as_str().to_owned(),
                        LinkEntryJson {
                            doc_path: link.doc_path.clone(),
                            doc_type: link.kind.as_str().to_owned(),
                            title: link.title.clone(),
                        },
                    )
                })
                .collect(),
        ),
        shape_links: None,
        connectors: Some(
            connectors
                .iter()
                .map(|connector| ConnectorJson {
                    id: connector.id().as_str().to_owned(),
                    from: connector.from().as_str().to_owned(),
                    to: connector.to().as_str().to_owned(),
                    kind: connector.kind().as_str().to_owned(),
                })
                .collect(),
        ),
        ui_state: Some(UiStateJson {
            open_tabs: open_tabs
                .iter()
                .map(|tab| TabJson {
                    doc_path: tab.doc_path.clone(),
                    active: tab.active,
                    pinned: tab.pinned,
                    group: "main".to_owned(),
                })
                .collect(),
            active_split: Some("main".to_owned()),
        }),
        audit: Some(AuditJson {
            last_modified: Some(chrono::Utc::now().to_rfc3339()),
        }),
    };
    serde_json::to_string_pretty(&json)
}

/// Parses a sidecar file permissively: either schema shape is accepted, with
/// the preferred `links` table winning when both are present. Entries that
/// do not decode (bad id, unknown kind string) are dropped individually;
/// malformed JSON degrades to the empty state.
pub fn parse_sidecar(text: &str) -> SidecarState {
    let json: SidecarJson = match serde_json::from_str(text) {
        Ok(json) => json,
        Err(error) => {
            tracing::warn!(%error, "unreadable links sidecar, starting empty");
            return SidecarState::default();
        }
    };

    let mut links = BTreeMap::new();
    if let Some(table) = json.links {
        for (id, entry) in table {
            let Some((id, link)) = decode_link(&id, entry.doc_path, &entry.doc_type, entry.title)
            else {
                continue;
            };
            links.insert(id, link);
        }
    } else if let Some(table) = json.shape_links {
        for (id, entry) in table {
            let Some((id, link)) = decode_link(&id, entry.doc_path, &entry.doc_kind, entry.title)
            else {
                continue;
            };
            links.insert(id, link);
        }
    }

    let connectors = json.connectors.map(|entries| {
        entries
            .into_iter()
            .filter_map(|entry| {
                let id = ConnectorId::new(entry.id).ok()?;
                let from = ShapeId::new(entry.from).ok()?;
                let to = ShapeId::new(entry.to).ok()?;
                let kind = match entry.kind.as_str() {
                    "orthogonal" => ConnectorKind::Orthogonal,
                    _ => ConnectorKind::Straight,
                };
                Connector::new(id, from, to, kind).ok()
            })
            .collect()
    });

    let open_tabs = json
        .ui_state
        .map(|ui_state| {
            ui_state
                .open_tabs
                .into_iter()
                .map(|tab| TabState {
                    doc_path: tab.doc_path,
                    active: tab.active,
                    pinned: tab.pinned,
                })
                .collect()
        })
        .unwrap_or_default();

    SidecarState {
        links,
        connectors,
        open_tabs,
    }
}

fn decode_link(
    id: &str,
    doc_path: String,
    kind: &str,
    title: Option<String>,
) -> Option<(ShapeId, ShapeLink)> {
    let id = ShapeId::new(id).ok()?;
    let kind = match kind {
        "pdf" => DocKind::Pdf,
        "image" => DocKind::Image,
        "markdown" => DocKind::Markdown,
        "json" => DocKind::Json,
        _ => return None,
    };
    Some((
        id,
        ShapeLink {
            doc_path,
            kind,
            title,
        },
    ))
}
