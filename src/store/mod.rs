// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Workspace persistence and the orchestrating diagram store.

pub mod diagram_store;
pub mod workspace_folder;

pub use diagram_store::{DiagramStore, ImportStats, PasteError, DEFAULT_QUIET_PERIOD};
pub use workspace_folder::{
    StoreError, WorkspaceFolder, WriteDurability, DIAGRAM_SVG, DOCS_DIR, LINKS_JSON,
};
