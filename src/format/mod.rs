// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Interchange codecs: the canonical SVG geometry format, the links sidecar
//! JSON, and the draw.io import path. All parsers here degrade by omission
//! on malformed input instead of returning errors; "nothing recognized" is a
//! valid outcome the store knows how to handle.

pub mod drawio;
pub mod sidecar;
pub mod svg;
mod xml;

pub use drawio::{is_drawio_content, parse_drawio, DrawioImport};
pub use sidecar::{parse_sidecar, serialize_sidecar, SidecarState, TabState, SCHEMA_VERSION};
pub use svg::{parse_svg, serialize_svg, ParsedSvg};
