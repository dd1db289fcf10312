// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Workspace folder persistence.
//!
//! A workspace is a plain directory: `diagram.svg` plus `diagram.links.json`
//! at the root, linked documents conventionally under `docs/`. Both
//! canonical files are looked up at the root first and then under `docs/`,
//! which keeps workspaces organized either way. Writes always target the
//! root and go through an atomic tmp+rename with an optional fsync.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::DocKind;

pub const DIAGRAM_SVG: &str = "diagram.svg";
pub const LINKS_JSON: &str = "diagram.links.json";
pub const DOCS_DIR: &str = "docs";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to
    /// stable storage where possible. Exact guarantees are
    /// platform/filesystem-dependent.
    Durable,
}

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidRelativePath {
        field: &'static str,
        value: PathBuf,
    },
    SymlinkRefused {
        path: PathBuf,
    },
    UnsupportedDocument {
        path: String,
    },
    MissingDocument {
        path: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::InvalidRelativePath { field, value } => {
                write!(f, "invalid relative path for {field}: {value:?}")
            }
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
            Self::UnsupportedDocument { path } => {
                write!(f, "unsupported document type: {path:?}")
            }
            Self::MissingDocument { path } => {
                write!(f, "document not found in workspace: {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidRelativePath { .. }
            | Self::SymlinkRefused { .. }
            | Self::UnsupportedDocument { .. }
            | Self::MissingDocument { .. } => None,
        }
    }
}

/// Handle to one workspace directory. Cheap to clone; carries no open file
/// state.
#[derive(Debug, Clone)]
pub struct WorkspaceFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl WorkspaceFolder {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    /// Reads the geometry file, trying the root then `docs/`. `Ok(None)`
    /// means neither location has one, which is a normal state for a fresh
    /// workspace.
    pub fn read_diagram_svg(&self) -> Result<Option<String>, StoreError> {
        self.read_canonical(DIAGRAM_SVG)
    }

    /// Reads the links sidecar, same search order as the geometry file.
    pub fn read_links_json(&self) -> Result<Option<String>, StoreError> {
        self.read_canonical(LINKS_JSON)
    }

    pub fn write_diagram_svg(&self, content: &str) -> Result<(), StoreError> {
        self.write_atomic(&self.root.join(DIAGRAM_SVG), content.as_bytes())
    }

    pub fn write_links_json(&self, content: &str) -> Result<(), StoreError> {
        self.write_atomic(&self.root.join(LINKS_JSON), content.as_bytes())
    }

    fn read_canonical(&self, file_name: &str) -> Result<Option<String>, StoreError> {
        for candidate in [
            self.root.join(file_name),
            self.root.join(DOCS_DIR).join(file_name),
        ] {
            match fs::read_to_string(&candidate) {
                Ok(text) => return Ok(Some(text)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StoreError::Io {
                        path: candidate,
                        source,
                    })
                }
            }
        }
        Ok(None)
    }

    /// Reads an arbitrary workspace-relative file. Traversal outside the
    /// workspace is rejected; a missing file is `Ok(None)`.
    pub fn read_file(&self, relative: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let relative = normalized_relative("document path", relative)?;
        match fs::read(self.root.join(&relative)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: self.root.join(relative),
                source,
            }),
        }
    }

    /// Lists files under `docs/` recursively; when there is no `docs/`
    /// folder, falls back to walking the workspace root. Paths use `/`
    /// separators relative to the root. Dotfiles are not listed.
    pub fn list_doc_files(&self) -> Vec<String> {
        let docs = self.root.join(DOCS_DIR);
        let mut out = Vec::new();
        if docs.is_dir() {
            walk_files(&docs, DOCS_DIR, &mut out);
        } else {
            walk_files(&self.root, "", &mut out);
        }
        out.sort();
        out
    }

    /// Copies a document into `docs/`, returning its workspace-relative
    /// path. A file of the same name and size is assumed identical and not
    /// copied again; a name clash with a different size gets a ` (n)`
    /// suffix before the extension.
    pub fn copy_into_docs(&self, file_name: &str, contents: &[u8]) -> Result<String, StoreError> {
        if DocKind::from_path(file_name).is_none() {
            return Err(StoreError::UnsupportedDocument {
                path: file_name.to_owned(),
            });
        }
        let file_name = normalized_relative("document name", file_name)?;
        if file_name.components().count() != 1 {
            return Err(StoreError::InvalidRelativePath {
                field: "document name",
                value: file_name,
            });
        }
        let file_name = file_name.to_string_lossy().into_owned();

        let docs = self.root.join(DOCS_DIR);
        fs::create_dir_all(&docs).map_err(|source| StoreError::Io {
            path: docs.clone(),
            source,
        })?;

        let target = docs.join(&file_name);
        if let Ok(metadata) = fs::metadata(&target) {
            if metadata.is_file() && metadata.len() == contents.len() as u64 {
                return Ok(format!("{DOCS_DIR}/{file_name}"));
            }
        }

        let unique = unique_file_name(&docs, &file_name);
        self.write_atomic(&docs.join(&unique), contents)?;
        Ok(format!("{DOCS_DIR}/{unique}"))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        match fs::symlink_metadata(path) {
            Ok(md) if md.file_type().is_symlink() => {
                return Err(StoreError::SymlinkRefused {
                    path: path.to_path_buf(),
                });
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let Some(parent) = path.parent() else {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("path has no parent"),
            });
        };
        let Some(file_name) = path.file_name() else {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("path has no file name"),
            });
        };

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let tmp_path = parent.join(format!(
            ".triton.tmp.{}.{}",
            file_name.to_string_lossy(),
            nanos
        ));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        file.write_all(contents).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        if self.durability == WriteDurability::Durable {
            file.sync_all().map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        }
        drop(file);

        if let Err(source) = rename_overwrite(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        if self.durability == WriteDurability::Durable {
            #[cfg(unix)]
            {
                let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
                dir.sync_all().map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        Ok(())
    }
}

fn normalized_relative(field: &'static str, value: &str) -> Result<PathBuf, StoreError> {
    let normalized = value.replace('\\', "/");
    let path = PathBuf::from(&normalized);

    if path.as_os_str().is_empty() || path.is_absolute() {
        return Err(StoreError::InvalidRelativePath {
            field,
            value: path,
        });
    }
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::ParentDir => {
                return Err(StoreError::InvalidRelativePath {
                    field,
                    value: path.clone(),
                });
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(path)
}

fn walk_files(dir: &Path, prefix: &str, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => walk_files(&entry.path(), &path, out),
            Ok(file_type) if file_type.is_file() => out.push(path),
            _ => {}
        }
    }
}

fn unique_file_name(dir: &Path, base_name: &str) -> String {
    let (stem, ext) = match base_name.rfind('.') {
        Some(index) => base_name.split_at(index),
        None => (base_name, ""),
    };

    let mut name = base_name.to_owned();
    let mut n = 0;
    while dir.join(&name).exists() {
        n += 1;
        name = format!("{stem} ({n}){ext}");
    }
    name
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}
