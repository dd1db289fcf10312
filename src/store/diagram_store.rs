// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The diagram store: owns the live model, applies mutations, and
//! coordinates debounced persistence through both codecs.
//!
//! Every successful mutation marks the store dirty and schedules a
//! background save after a quiet period. The snapshot to persist is
//! serialized at scheduling time, so a mutation landing while a save is in
//! flight can never make that save lose state. Re-scheduling replaces the
//! pending snapshot and resets the quiet period; at most one save per
//! workspace is queued or in flight.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant};

use crate::format::{
    is_drawio_content, parse_drawio, parse_sidecar, parse_svg, serialize_sidecar, serialize_svg,
    TabState,
};
use crate::model::{
    title_from_path, Connector, ConnectorId, ConnectorKind, Diagram, DocKind, OpenDocument, Rect,
    Shape, ShapeId, ShapeKind, ShapeLink, ShapePatch,
};
use crate::store::workspace_folder::{StoreError, WorkspaceFolder, LINKS_JSON};


/// Quiet period between the last mutation and the background save.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

/// Offset applied to pasted content so it never lands exactly on top of
/// existing shapes.
const PASTE_OFFSET: f64 = 20.0;

#[derive(Debug)]
struct SaveTask {
    folder: WorkspaceFolder,
    svg: Option<String>,
    links_json: String,
}

#[derive(Debug, Default)]
struct SaveState {
    /// Pending snapshot per workspace root with its debounce deadline.
    /// Scheduling again replaces the entry wholesale.
    pending: HashMap<PathBuf, (SaveTask, Instant)>,
    in_flight: Option<PathBuf>,
}

#[derive(Debug)]
struct SaveInner {
    state: Mutex<SaveState>,
    cv: Condvar,
}

#[derive(Debug)]
struct SaveScheduler {
    inner: Arc<SaveInner>,
}

impl SaveScheduler {
    fn new() -> Self {
        let inner = Arc::new(SaveInner {
            state: Mutex::new(SaveState::default()),
            cv: Condvar::new(),
        });

        std::thread::Builder::new()
            .name("triton-save".to_owned())
            .spawn({
                let inner = inner.clone();
                move || Self::run_worker(inner)
            })
            .expect("spawn save worker thread");

        Self { inner }
    }

    fn schedule(&self, task: SaveTask, quiet_period: Duration) {
        let root = task.folder.root().to_path_buf();
        let deadline = Instant::now() + quiet_period;

        let mut state = self.inner.state.lock().expect("save lock poisoned");
        state.pending.insert(root, (task, deadline));
        self.inner.cv.notify_one();
    }

    fn cancel(&self, root: &Path) {
        let mut state = self.inner.state.lock().expect("save lock poisoned");
        state.pending.remove(root);
    }

    /// Blocks until no save for this workspace is queued or in flight.
    fn wait_idle(&self, root: &Path) {
        let mut state = self.inner.state.lock().expect("save lock poisoned");
        while state.pending.contains_key(root)
            || state.in_flight.as_deref().is_some_and(|active| active == root)
        {
            state = self.inner.cv.wait(state).expect("save cv poisoned");
        }
    }

    fn run_worker(inner: Arc<SaveInner>) {
        loop {
            let task = {
                let mut state = inner.state.lock().expect("save lock poisoned");

                loop {
                    let now = Instant::now();
                    let due = state
                        .pending
                        .iter()
                        .filter(|(_, (_, deadline))| *deadline <= now)
                        .min_by_key(|(_, (_, deadline))| *deadline)
                        .map(|(root, _)| root.clone());

                    if let Some(root) = due {
                        if let Some((task, _)) = state.pending.remove(&root) {
                            state.in_flight = Some(root);
                            break task;
                        }
                    }

                    let earliest = state
                        .pending
                        .values()
                        .map(|(_, deadline)| *deadline)
                        .min();
                    state = match earliest {
                        Some(deadline) => {
                            let wait = deadline.saturating_duration_since(now);
                            inner
                                .cv
                                .wait_timeout(state, wait)
                                .expect("save cv poisoned")
                                .0
                        }
                        None => inner.cv.wait(state).expect("save cv poisoned"),
                    };
                }
            };

            let result = match &task.svg {
                Some(svg) => task
                    .folder
                    .write_diagram_svg(svg)
                    .and_then(|()| task.folder.write_links_json(&task.links_json)),
                None => task.folder.write_links_json(&task.links_json),
            };
            if let Err(error) = result {
                tracing::warn!(%error, root = ?task.folder.root(), "background save failed");
            }

            let mut state = inner.state.lock().expect("save lock poisoned");
            state.in_flight = None;
            inner.cv.notify_all();
        }
    }
}

static SAVES: OnceLock<SaveScheduler> = OnceLock::new();

fn saves() -> &'static SaveScheduler {
    SAVES.get_or_init(SaveScheduler::new)
}

/// Why a paste was rejected without touching the diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteError {
    /// The text does not look like the supported interchange format.
    UnrecognizedContent,
    /// Recognized format, but nothing importable in it.
    NoShapes,
}

impl fmt::Display for PasteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedContent => f.write_str("pasted text is not draw.io content"),
            Self::NoShapes => f.write_str("pasted content contains no importable shapes"),
        }
    }
}

impl std::error::Error for PasteError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub shapes: usize,
    pub connectors: usize,
}

#[derive(Debug)]
pub struct DiagramStore {
    folder: WorkspaceFolder,
    diagram: Diagram,
    links: BTreeMap<ShapeId, ShapeLink>,
    /// Raw geometry file kept verbatim when parsing recovered no shapes, so
    /// callers can still display an externally authored SVG as-is.
    raw_svg: Option<String>,
    open_tabs: Vec<OpenDocument>,
    active_tab: Option<String>,
    dirty: bool,
    quiet_period: Duration,
}

impl DiagramStore {
    /// Opens a workspace and loads the diagram and sidecar from it. Missing
    /// files mean an empty diagram, not an error.
    pub fn open(folder: WorkspaceFolder) -> Result<Self, StoreError> {
        let mut store = Self {
            folder,
            diagram: Diagram::new(),
            links: BTreeMap::new(),
            raw_svg: None,
            open_tabs: Vec::new(),
            active_tab: None,
            dirty: false,
            quiet_period: DEFAULT_QUIET_PERIOD,
        };
        store.reload()?;
        Ok(store)
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn folder(&self) -> &WorkspaceFolder {
        &self.folder
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn links(&self) -> &BTreeMap<ShapeId, ShapeLink> {
        &self.links
    }

    pub fn raw_svg(&self) -> Option<&str> {
        self.raw_svg.as_deref()
    }

    pub fn open_tabs(&self) -> &[OpenDocument] {
        &self.open_tabs
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the in-memory model with the persisted state, regardless of
    /// any pending background save.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let svg_text = self.folder.read_diagram_svg()?;
        let sidecar_text = self.folder.read_links_json()?;

        let mut shapes = Vec::new();
        let mut connectors = Vec::new();
        let mut raw_svg = None;
        if let Some(text) = svg_text {
            let parsed = parse_svg(&text);
            if parsed.shapes.is_empty() {
                raw_svg = Some(text);
            }
            shapes = parsed.shapes;
            connectors = parsed.connectors;
        }

        let mut links = BTreeMap::new();
        let mut open_tabs = Vec::new();
        let mut active_tab = None;
        if let Some(text) = sidecar_text {
            let sidecar = parse_sidecar(&text);
            links = sidecar.links;
            // The sidecar's connector list is authoritative when present;
            // geometry-recovered connectors are best-effort only.
            if let Some(persisted) = sidecar.connectors {
                connectors = persisted;
            }
            for tab in sidecar.open_tabs {
                let Some(kind) = DocKind::from_path(&tab.doc_path) else {
                    continue;
                };
                if tab.active {
                    active_tab = Some(tab.doc_path.clone());
                }
                let mut document =
                    OpenDocument::new(tab.doc_path.clone(), kind, title_from_path(&tab.doc_path));
                document.pinned = tab.pinned;
                open_tabs.push(document);
            }
        }

        self.diagram = Diagram::from_parts(shapes, connectors);
        self.links = links;
        self.raw_svg = raw_svg;
        self.open_tabs = open_tabs;
        self.active_tab = active_tab;
        self.dirty = false;
        Ok(())
    }

    /// Adds a shape of the given kind at (x, y) with the default size for
    /// that kind and an empty label. Returns the fresh id.
    pub fn add_shape(&mut self, kind: ShapeKind, x: f64, y: f64) -> ShapeId {
        let id = ShapeId::fresh();
        let (width, height) = match kind {
            ShapeKind::Diamond => (80.0, 80.0),
            ShapeKind::Rect | ShapeKind::Ellipse => (120.0, 50.0),
        };
        self.diagram.insert_shape(Shape::new(
            id.clone(),
            kind,
            Rect::new(x, y, width, height),
            "",
        ));
        self.mark_dirty();
        id
    }

    /// Adds a connector between two shapes. A self-loop is a no-op and
    /// returns `None`.
    pub fn add_connector(&mut self, from: &ShapeId, to: &ShapeId) -> Option<ConnectorId> {
        let id = ConnectorId::fresh();
        let connector = Connector::new(
            id.clone(),
            from.clone(),
            to.clone(),
            ConnectorKind::Straight,
        )
        .ok()?;
        self.diagram.insert_connector(connector);
        self.mark_dirty();
        Some(id)
    }

    pub fn update_shape(&mut self, id: &str, patch: &ShapePatch) -> bool {
        if !self.diagram.update_shape(id, patch) {
            return false;
        }
        self.mark_dirty();
        true
    }

    /// Deletes the shape, its connectors, and its link entry.
    pub fn delete_shape(&mut self, id: &str) -> bool {
        if self.diagram.remove_shape(id).is_none() {
            return false;
        }
        self.links.retain(|link_id, _| link_id.as_str() != id);
        self.mark_dirty();
        true
    }

    /// Links a shape to a document. Rejected (returning false, no state
    /// change) when the extension is unsupported, or when the id is neither
    /// in the diagram nor possibly in an externally authored SVG's own id
    /// space (i.e. no raw SVG is held).
    pub fn link_shape(&mut self, shape_id: &str, doc_path: &str) -> bool {
        if !self.diagram.contains_shape(shape_id) && self.raw_svg.is_none() {
            return false;
        }
        let Ok(shape_id) = ShapeId::new(shape_id) else {
            return false;
        };
        let title = title_from_path(doc_path);
        let Some(link) = ShapeLink::for_path(doc_path, Some(title)) else {
            return false;
        };
        self.links.insert(shape_id, link);
        self.mark_dirty();
        true
    }

    pub fn unlink_shape(&mut self, shape_id: &str) -> bool {
        if self.links.remove(shape_id).is_none() {
            return false;
        }
        self.mark_dirty();
        true
    }

    /// Merges pasted draw.io content into the live diagram, offset by
    /// (20, 20). The diagram is untouched on rejection.
    pub fn paste_import(&mut self, text: &str) -> Result<ImportStats, PasteError> {
        if !is_drawio_content(text) {
            return Err(PasteError::UnrecognizedContent);
        }
        let mut import = parse_drawio(text);
        if import.shapes.is_empty() {
            return Err(PasteError::NoShapes);
        }

        for shape in &mut import.shapes {
            shape.translate(PASTE_OFFSET, PASTE_OFFSET);
        }

        let stats = ImportStats {
            shapes: import.shapes.len(),
            connectors: import.connectors.len(),
        };
        self.diagram.merge(import.shapes, import.connectors);
        self.mark_dirty();
        Ok(stats)
    }

    /// Opens a workspace document as a tab. Opening an already-open path
    /// only switches the active tab; the file is not read again.
    pub fn open_document(&mut self, path: &str) -> Result<&OpenDocument, StoreError> {
        if let Some(index) = self.open_tabs.iter().position(|tab| tab.path == path) {
            self.active_tab = Some(path.to_owned());
            return Ok(&self.open_tabs[index]);
        }

        let Some(kind) = DocKind::from_path(path) else {
            return Err(StoreError::UnsupportedDocument {
                path: path.to_owned(),
            });
        };
        let Some(bytes) = self.folder.read_file(path)? else {
            return Err(StoreError::MissingDocument {
                path: path.to_owned(),
            });
        };

        let mut document = OpenDocument::new(path, kind, title_from_path(path));
        document.bytes = Some(bytes);
        self.open_tabs.push(document);
        self.active_tab = Some(path.to_owned());
        Ok(self.open_tabs.last().expect("tab just pushed"))
    }

    /// Closes a tab; when it was active, the last remaining tab becomes
    /// active.
    pub fn close_tab(&mut self, path: &str) -> bool {
        let Some(index) = self.open_tabs.iter().position(|tab| tab.path == path) else {
            return false;
        };
        self.open_tabs.remove(index);
        if self.active_tab.as_deref() == Some(path) {
            self.active_tab = self.open_tabs.last().map(|tab| tab.path.clone());
        }
        true
    }

    pub fn set_active_tab(&mut self, path: &str) -> bool {
        if !self.open_tabs.iter().any(|tab| tab.path == path) {
            return false;
        }
        self.active_tab = Some(path.to_owned());
        true
    }

    pub fn set_tab_pinned(&mut self, path: &str, pinned: bool) -> bool {
        let Some(tab) = self.open_tabs.iter_mut().find(|tab| tab.path == path) else {
            return false;
        };
        tab.pinned = pinned;
        true
    }

    /// Saves synchronously through both codecs and clears the dirty flag.
    /// Any pending background save for this workspace is superseded, and an
    /// in-flight one is waited out first so a stale snapshot can never land
    /// on top of this write.
    pub fn save(&mut self) -> Result<(), StoreError> {
        saves().cancel(self.folder.root());
        saves().wait_idle(self.folder.root());

        let (svg, links_json) = self.serialize_snapshot()?;
        if let Some(svg) = svg {
            self.folder.write_diagram_svg(&svg)?;
        }
        self.folder.write_links_json(&links_json)?;
        self.dirty = false;
        Ok(())
    }

    /// Waits out any in-flight background save, then saves synchronously if
    /// there is unsaved state.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        saves().cancel(self.folder.root());
        saves().wait_idle(self.folder.root());
        if self.dirty {
            self.save()?;
        }
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;

        // Snapshot now; the worker must persist the state as of this
        // mutation even if more arrive while it writes.
        match self.serialize_snapshot() {
            Ok((svg, links_json)) => saves().schedule(
                SaveTask {
                    folder: self.folder.clone(),
                    svg,
                    links_json,
                },
                self.quiet_period,
            ),
            Err(error) => {
                tracing::warn!(%error, "cannot serialize snapshot, background save skipped");
            }
        }
    }

    /// The geometry half is `None` when the workspace holds an externally
    /// authored SVG we could not parse and the model is still empty:
    /// overwriting that file with an empty document would destroy it.
    fn serialize_snapshot(&self) -> Result<(Option<String>, String), StoreError> {
        let svg = if self.raw_svg.is_some() && self.diagram.shapes().is_empty() {
            None
        } else {
            Some(serialize_svg(
                self.diagram.shapes(),
                self.diagram.connectors(),
            ))
        };

        let tabs: Vec<TabState> = self
            .open_tabs
            .iter()
            .map(|tab| TabState {
                doc_path: tab.path.clone(),
                active: self.active_tab.as_deref() == Some(tab.path.as_str()),
                pinned: tab.pinned,
            })
            .collect();
        let links_json = serialize_sidecar(&self.links, self.diagram.connectors(), &tabs)
            .map_err(|source| StoreError::Json {
                path: self.folder.root().join(LINKS_JSON),
                source,
            })?;

        Ok((svg, links_json))
    }
}
