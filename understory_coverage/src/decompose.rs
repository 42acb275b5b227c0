// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Border-strip decomposition of the uncovered area.

use core::slice;

use smallvec::SmallVec;

use crate::grid::GridView;
use crate::rect::{PixelRect, outside_bands};
use crate::shrink::{minimal_uncovered_bbox, trim_bottom, trim_left, trim_right, trim_top};
use crate::state::{CoverageMode, Criterion};

/// Four out-of-bounds bands, four border strips and the residual interior.
const MAX_RECTS: usize = 9;

/// The rectangles still to compute inside a region of interest.
///
/// The rectangles are pairwise disjoint. They are produced in a fixed order:
/// the parts of the region lying outside the map bounds (left, bottom, right,
/// top), then the unrendered border strips (bottom, top, left, right), then
/// the residual interior.
///
/// [`reserved_elsewhere`](Self::reserved_elsewhere) is only ever set by
/// trimap queries. An empty result with the flag set means the region is
/// entirely claimed by other workers, not finished: the caller has to wait
/// for them rather than declare completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UncoveredRects {
    rects: SmallVec<[PixelRect; MAX_RECTS]>,
    reserved_elsewhere: bool,
}

impl UncoveredRects {
    fn push(&mut self, rect: PixelRect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    /// Returns the rectangles as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[PixelRect] {
        &self.rects
    }

    /// Iterates over the rectangles.
    pub fn iter(&self) -> slice::Iter<'_, PixelRect> {
        self.rects.iter()
    }

    /// Returns the number of rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Returns `true` if nothing is left to compute.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns `true` if the query met pixels reserved by another worker.
    #[must_use]
    pub fn reserved_elsewhere(&self) -> bool {
        self.reserved_elsewhere
    }

    /// Returns the total number of pixels to compute.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Returns the bounding box of all rectangles.
    #[must_use]
    pub fn bounding_box(&self) -> PixelRect {
        self.rects
            .iter()
            .fold(PixelRect::ZERO, |acc, r| acc.union(*r))
    }
}

impl<'a> IntoIterator for &'a UncoveredRects {
    type Item = &'a PixelRect;
    type IntoIter = slice::Iter<'a, PixelRect>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}

impl IntoIterator for UncoveredRects {
    type Item = PixelRect;
    type IntoIter = smallvec::IntoIter<[PixelRect; MAX_RECTS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.into_iter()
    }
}

/// The border-strip decomposition of a minimal uncovered bounding box.
///
/// ```text
/// BBBBBBBBBBBBBB
/// BBBBBBBBBBBBBB
/// CXXXXXXXXXXDDD
/// CXXXXXXXXXXDDD
/// CXXXXXXXXXXDDD
/// AAAAAAAAAAAAAA
/// ```
///
/// The strips `A` (bottom), `B` (top), `C` (left) and `D` (right) are the
/// widest strips flush with the box edges that hold no available pixel; they
/// are pure work. `X` is what remains. Panning typically leaves one or two
/// strips and an already rendered `X`; zooming out leaves a ring of strips
/// around a rendered `X`.
///
/// `bottom`, `top`, `left`, `right` and `interior` exactly tile `bbox`.
/// `residual` is `interior` shrunk once more to its own uncovered bounding box.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decomposition {
    /// The minimal uncovered bounding box being decomposed.
    pub bbox: PixelRect,
    /// Strip `A`: full width of `bbox`, below `interior`.
    pub bottom: PixelRect,
    /// Strip `B`: full width of `bbox`, above `interior`.
    pub top: PixelRect,
    /// Strip `C`: height of `interior`, left of it.
    pub left: PixelRect,
    /// Strip `D`: height of `interior`, right of it.
    pub right: PixelRect,
    /// `X` before its final shrink.
    pub interior: PixelRect,
    /// `X` after its final shrink: the uncovered part of `interior`.
    pub residual: PixelRect,
    /// Whether any pass met a pixel reserved by another worker.
    pub reserved_elsewhere: bool,
}

impl Decomposition {
    /// Returns the four strips in emission order (bottom, top, left, right).
    #[must_use]
    pub fn strips(&self) -> [PixelRect; 4] {
        [self.bottom, self.top, self.left, self.right]
    }

    /// Returns `true` if the strips and the interior exactly tile the box.
    ///
    /// This checks the shared edges: `A` and `B` span the box width and meet
    /// `X` at its bottom and top edges, `C` and `D` span the height of `X` and
    /// meet it at its left and right edges.
    #[must_use]
    pub fn tiles_bbox(&self) -> bool {
        let (m, x) = (self.bbox, self.interior);
        let (a, b, c, d) = (self.bottom, self.top, self.left, self.right);
        let a_ok = a.y0 == m.y0 && a.x0 == m.x0 && a.x1 == m.x1 && a.y1 == x.y0;
        let b_ok = b.y1 == m.y1 && b.x0 == m.x0 && b.x1 == m.x1 && b.y0 == x.y1;
        let c_ok = c.y0 == x.y0 && c.y1 == x.y1 && c.x0 == m.x0 && c.x1 == x.x0;
        let d_ok = d.y0 == x.y0 && d.y1 == x.y1 && d.x0 == x.x1 && d.x1 == m.x1;
        a_ok && b_ok && c_ok && d_ok
    }

    /// Iterates over the rectangles to compute: the non-empty strips, then the
    /// residual if non-empty.
    pub fn work(&self) -> impl Iterator<Item = PixelRect> {
        self.strips()
            .into_iter()
            .chain([self.residual])
            .filter(|r| !r.is_empty())
    }
}

/// Peels the unrendered border strips off `bbox` and shrinks what remains.
///
/// `bbox` is normally the result of [`minimal_uncovered_bbox`] and must lie
/// inside the grid bounds.
pub(crate) fn decompose_bbox(
    view: &GridView<'_>,
    bbox: PixelRect,
    mode: CoverageMode,
) -> Decomposition {
    let unrendered = Criterion::Unrendered(mode);

    let below = trim_bottom(view, bbox, unrendered);
    let above = trim_top(view, below.rect, unrendered);
    let mut reserved = below.reserved | above.reserved;
    let mut interior = above.rect;
    let (mut left_edge, mut right_edge) = (interior.x0, interior.x1);
    if interior.height() > 0 {
        let left = trim_left(view, interior, unrendered);
        let right = trim_right(view, left.rect, unrendered);
        reserved |= left.reserved | right.reserved;
        left_edge = left.rect.x0;
        right_edge = right.rect.x1;
        interior = right.rect;
    }

    let decomposition = Decomposition {
        bbox,
        bottom: PixelRect::new(bbox.x0, bbox.y0, bbox.x1, below.rect.y0),
        top: PixelRect::new(bbox.x0, above.rect.y1, bbox.x1, bbox.y1),
        left: PixelRect::new(bbox.x0, interior.y0, left_edge, interior.y1),
        right: PixelRect::new(right_edge, interior.y0, bbox.x1, interior.y1),
        interior,
        residual: PixelRect::ZERO,
        reserved_elsewhere: false,
    };
    assert!(
        decomposition.tiles_bbox(),
        "border strips do not tile {bbox:?}: {decomposition:?}"
    );

    let residual = minimal_uncovered_bbox(view, interior, mode);
    Decomposition {
        residual: residual.rect,
        reserved_elsewhere: reserved | residual.reserved,
        ..decomposition
    }
}

/// Computes the rectangles left to compute in `roi`.
///
/// `roi` may extend past the grid bounds; the parts outside are never covered
/// and are returned as is. With `decompose_borders` off, the inside part is
/// returned as its single minimal uncovered bounding box.
pub(crate) fn uncovered_rects(
    view: &GridView<'_>,
    roi: PixelRect,
    mode: CoverageMode,
    decompose_borders: bool,
) -> UncoveredRects {
    let bounds = view.bounds();
    let mut out = UncoveredRects::default();
    for band in outside_bands(roi, bounds) {
        out.push(band);
    }

    let inside = roi.intersect(bounds);
    if inside.is_empty() {
        return out;
    }

    let bbox = minimal_uncovered_bbox(view, inside, mode);
    out.reserved_elsewhere |= bbox.reserved;
    if bbox.rect.is_empty() {
        return out;
    }
    if !decompose_borders {
        out.push(bbox.rect);
        return out;
    }

    let decomposition = decompose_bbox(view, bbox.rect, mode);
    out.reserved_elsewhere |= decomposition.reserved_elsewhere;
    for rect in decomposition.work() {
        out.push(rect);
    }
    out
}
