// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;

use uuid::Uuid;

/// Prefix on freshly minted shape ids.
pub const SHAPE_ID_PREFIX: &str = "node-";
/// Prefix on freshly minted connector ids. The geometry codec keys off this
/// prefix to tell connector artifacts from shape groups.
pub const CONNECTOR_ID_PREFIX: &str = "conn-";

/// A stable identifier used across the model and persisted surfaces.
///
/// Imported ids are accepted as-is and are not required to look like the
/// minted `node-`/`conn-` ones; the only constraint is that an id is a
/// non-empty *path segment* (i.e. contains no `/`), because ids are persisted
/// verbatim as SVG `id` attributes and as keys in the links sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id_segment(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    fn fresh_with_prefix(prefix: &str) -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self::new(format!("{prefix}{}", &uuid[..8])).expect("uuid segment is a valid id")
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
    ContainsSlash,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("id must not be empty"),
            Self::ContainsSlash => f.write_str("id must not contain '/'"),
        }
    }
}

impl std::error::Error for IdError {}

fn validate_id_segment(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value.contains('/') {
        return Err(IdError::ContainsSlash);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeIdTag {}
pub type ShapeId = Id<ShapeIdTag>;

impl ShapeId {
    /// Mints a fresh `node-`-prefixed id.
    pub fn fresh() -> Self {
        Self::fresh_with_prefix(SHAPE_ID_PREFIX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectorIdTag {}
pub type ConnectorId = Id<ConnectorIdTag>;

impl ConnectorId {
    /// Mints a fresh `conn-`-prefixed id.
    pub fn fresh() -> Self {
        Self::fresh_with_prefix(CONNECTOR_ID_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConnectorId, Id, IdError, ShapeId, CONNECTOR_ID_PREFIX, SHAPE_ID_PREFIX,
    };

    #[test]
    fn id_rejects_empty() {
        let result: Result<Id<()>, _> = Id::new("");
        assert_eq!(result, Err(IdError::Empty));
    }

    #[test]
    fn id_rejects_slash() {
        let result: Result<Id<()>, _> = Id::new("a/b");
        assert_eq!(result, Err(IdError::ContainsSlash));
    }

    #[test]
    fn id_accepts_drawio_style_values() {
        let id: Id<()> = Id::new("kTkXBaGJva6kBOnM-1").expect("id");
        assert_eq!(id.as_str(), "kTkXBaGJva6kBOnM-1");
    }

    #[test]
    fn fresh_ids_carry_their_prefix_and_do_not_repeat() {
        let a = ShapeId::fresh();
        let b = ShapeId::fresh();
        assert!(a.as_str().starts_with(SHAPE_ID_PREFIX));
        assert_ne!(a, b);

        let c = ConnectorId::fresh();
        assert!(c.as_str().starts_with(CONNECTOR_ID_PREFIX));
    }
}
