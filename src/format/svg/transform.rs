// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Affine transform accumulator for the foreign-SVG fallback parse.
//!
//! There is no layout engine here; cumulative coordinate transforms are
//! recovered by parsing `transform` attributes on ancestor groups and
//! composing the matrices ourselves. Only the functions draw.io exports
//! actually use are supported (matrix/translate/scale/rotate); anything else
//! in the list is skipped.

use std::sync::OnceLock;

use regex::Regex;

/// An SVG affine matrix `matrix(a b c d e f)`:
///
/// ```text
/// | a c e |
/// | b d f |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub(crate) fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub(crate) fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    pub(crate) fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    pub(crate) fn rotate(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Matrix product `self * other`: `other` is applied to points first,
    /// matching how SVG composes a parent transform with a child's.
    pub(crate) fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub(crate) fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

fn transform_fn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(matrix|translate|scale|rotate)\s*\(([^)]*)\)")
            .expect("transform regex is valid")
    })
}

/// Parses a `transform` attribute value into a single composed matrix.
/// Functions appear left to right; the leftmost is outermost.
pub(crate) fn parse_transform(value: &str) -> Transform {
    let mut composed = Transform::identity();

    for captures in transform_fn_regex().captures_iter(value) {
        let name = &captures[1];
        let args: Vec<f64> = captures[2]
            .split([',', ' ', '\t', '\n', '\r'])
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect();

        let step = match (name, args.as_slice()) {
            ("matrix", [a, b, c, d, e, f]) => Transform {
                a: *a,
                b: *b,
                c: *c,
                d: *d,
                e: *e,
                f: *f,
            },
            ("translate", [tx]) => Transform::translate(*tx, 0.0),
            ("translate", [tx, ty]) => Transform::translate(*tx, *ty),
            ("scale", [s]) => Transform::scale(*s, *s),
            ("scale", [sx, sy]) => Transform::scale(*sx, *sy),
            ("rotate", [degrees]) => Transform::rotate(*degrees),
            ("rotate", [degrees, cx, cy]) => Transform::translate(*cx, *cy)
                .then(&Transform::rotate(*degrees))
                .then(&Transform::translate(-cx, -cy)),
            _ => continue,
        };

        composed = composed.then(&step);
    }

    composed
}
