// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Supported document kinds for linking, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Pdf,
    Image,
    Markdown,
    Json,
}

impl DocKind {
    /// Derives the kind from the path's extension, or `None` when the
    /// extension is not in the supported set. An unsupported extension means
    /// no link/tab is created; there is no catch-all kind.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "svg" | "webp" => Some(Self::Image),
            "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Markdown => "markdown",
            Self::Json => "json",
        }
    }
}

/// Association from a diagram element to a workspace document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeLink {
    pub doc_path: String,
    pub kind: DocKind,
    pub title: Option<String>,
}

impl ShapeLink {
    /// Returns `None` when the kind cannot be derived from the path.
    pub fn for_path(doc_path: impl Into<String>, title: Option<String>) -> Option<Self> {
        let doc_path = doc_path.into();
        let kind = DocKind::from_path(&doc_path)?;
        Some(Self {
            doc_path,
            kind,
            title,
        })
    }
}

/// An opened document tab. Transient session state: the loaded bytes are
/// dropped when the tab closes and are never persisted with the geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDocument {
    pub path: String,
    pub kind: DocKind,
    pub title: String,
    pub bytes: Option<Vec<u8>>,
    pub pinned: bool,
}

impl OpenDocument {
    pub fn new(path: impl Into<String>, kind: DocKind, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            title: title.into(),
            bytes: None,
            pinned: false,
        }
    }
}

/// Derives a display title from the last path segment, falling back to the
/// whole path.
pub fn title_from_path(path: &str) -> String {
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::{title_from_path, DocKind, ShapeLink};

    #[test]
    fn doc_kind_covers_the_supported_extension_set() {
        assert_eq!(DocKind::from_path("manual.pdf"), Some(DocKind::Pdf));
        assert_eq!(DocKind::from_path("docs/logo.PNG"), Some(DocKind::Image));
        assert_eq!(DocKind::from_path("a/b/photo.jpeg"), Some(DocKind::Image));
        assert_eq!(DocKind::from_path("icon.svg"), Some(DocKind::Image));
        assert_eq!(DocKind::from_path("notes.md"), Some(DocKind::Markdown));
        assert_eq!(DocKind::from_path("data.json"), Some(DocKind::Json));
        assert_eq!(DocKind::from_path("archive.zip"), None);
        assert_eq!(DocKind::from_path("no-extension"), None);
    }

    #[test]
    fn shape_link_requires_a_supported_extension() {
        assert!(ShapeLink::for_path("docs/spec.md", None).is_some());
        assert!(ShapeLink::for_path("docs/a.out", None).is_none());
    }

    #[test]
    fn title_falls_back_to_the_whole_path() {
        assert_eq!(title_from_path("docs/spec.md"), "spec.md");
        assert_eq!(title_from_path("spec.md"), "spec.md");
    }
}
