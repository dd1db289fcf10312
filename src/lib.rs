// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Triton: diagram geometry and interchange engine.
//!
//! A workspace is a plain folder: the diagram lives in `diagram.svg` (a
//! canonical, round-trippable SVG subset), shape-to-document links and
//! connector metadata in `diagram.links.json`. [`store::DiagramStore`] owns
//! the live model and persists it with debounced saves; [`format`] holds the
//! SVG codec, the sidecar codec, and the draw.io importer.

pub mod format;
pub mod model;
pub mod store;
