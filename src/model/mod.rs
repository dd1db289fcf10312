// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A diagram is a flat shape list plus a connector list; documents attach to
//! shapes through links keyed by element id.

pub mod diagram;
pub mod document;
pub mod ids;

pub use diagram::{
    Connector, ConnectorKind, Diagram, Rect, SelfLoop, Shape, ShapeKind, ShapePatch,
};
pub use document::{title_from_path, DocKind, OpenDocument, ShapeLink};
pub use ids::{ConnectorId, Id, IdError, ShapeId, CONNECTOR_ID_PREFIX, SHAPE_ID_PREFIX};
