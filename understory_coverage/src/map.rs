// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The coverage map: one state byte per pixel of an image buffer.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use crate::config::CoverageConfig;
use crate::decompose::{Decomposition, UncoveredRects, decompose_bbox, uncovered_rects};
use crate::error::CoverageError;
use crate::grid::{GridView, GridViewMut};
use crate::rect::PixelRect;
use crate::report::CoverageReport;
use crate::shrink::minimal_uncovered_bbox;
use crate::state::{CoverageMode, PixelState, RESERVED, UNRENDERED};

/// Per-pixel render coverage of an image buffer.
///
/// A `CoverageMap` covers an integer rectangle (its bounds) with one
/// [`PixelState`] per pixel, stored row-major from the bottom-left corner.
/// It answers the question a render scheduler asks before computing a region
/// of interest: which parts of it still need computing?
///
/// The map is not synchronized. The owner is expected to hold an exclusive
/// lock around every mutation and at least a shared lock around queries; see
/// [`SharedCoverage`](crate::SharedCoverage) for such an owner.
///
/// # Example
///
/// ```
/// use understory_coverage::{CoverageMap, PixelRect};
///
/// let mut map = CoverageMap::new(PixelRect::new(0, 0, 10, 10));
/// map.mark_available(PixelRect::new(0, 0, 10, 5));
///
/// assert_eq!(
///     map.uncovered_bbox(PixelRect::new(0, 0, 10, 10)),
///     PixelRect::new(0, 5, 10, 10)
/// );
/// ```
///
/// # Preconditions
///
/// Writes and copies take rectangles that must lie inside the bounds (of both
/// maps, for copies); violating this panics. The `try_*` variants report a
/// [`CoverageError`] instead. Queries accept any region and intersect it with
/// the bounds and the restriction rectangle themselves.
#[derive(Clone, Default)]
pub struct CoverageMap {
    bounds: PixelRect,
    data: Vec<u8>,
    restriction: Option<PixelRect>,
    config: CoverageConfig,
}

impl fmt::Debug for CoverageMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverageMap")
            .field("bounds", &self.bounds)
            .field("restriction", &self.restriction)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CoverageMap {
    /// Creates an all-unrendered map over `bounds` with the default
    /// configuration.
    #[must_use]
    pub fn new(bounds: PixelRect) -> Self {
        Self::with_config(bounds, CoverageConfig::default())
    }

    /// Creates an all-unrendered map over `bounds`.
    #[must_use]
    pub fn with_config(bounds: PixelRect, config: CoverageConfig) -> Self {
        Self {
            bounds,
            data: vec![UNRENDERED; buffer_len(bounds)],
            restriction: None,
            config: config.sanitized(),
        }
    }

    /// Re-allocates the map over `bounds`, all unrendered.
    ///
    /// The restriction rectangle is dropped; the configuration is kept.
    pub fn initialize(&mut self, bounds: PixelRect) {
        self.data.clear();
        self.data.resize(buffer_len(bounds), UNRENDERED);
        self.bounds = bounds;
        self.restriction = None;
    }

    /// Returns the rectangle the map covers.
    #[must_use]
    pub fn bounds(&self) -> PixelRect {
        self.bounds
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub fn config(&self) -> CoverageConfig {
        self.config
    }

    /// Turns the border-strip decomposition of rectangle queries on or off.
    pub fn set_decompose_borders(&mut self, decompose_borders: bool) {
        self.config.decompose_borders = decompose_borders;
    }

    /// Narrows every subsequent query to `restriction`, or lifts the
    /// restriction with `None`.
    ///
    /// The restriction is a transient query hint: it does not change the
    /// stored coverage and is dropped by [`initialize`](Self::initialize) and
    /// [`swap_with`](Self::swap_with).
    pub fn set_restriction(&mut self, restriction: Option<PixelRect>) {
        self.restriction = restriction;
    }

    /// Returns the current restriction rectangle.
    #[must_use]
    pub fn restriction(&self) -> Option<PixelRect> {
        self.restriction
    }

    /// Returns a read-only, stride-aware view of the coverage bytes.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.data, self.bounds)
    }

    fn view_mut(&mut self) -> GridViewMut<'_> {
        GridViewMut::new(&mut self.data, self.bounds)
    }

    /// Returns the state of pixel `(x, y)`, or `None` outside the bounds.
    #[must_use]
    pub fn read(&self, x: i32, y: i32) -> Option<PixelState> {
        self.view().at(x, y).and_then(PixelState::from_byte)
    }

    /// Sets every pixel of `rect` to `state`.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is not inside the bounds. Writing
    /// [`PixelState::Reserved`] into a map without reservations panics in
    /// debug builds and writes [`PixelState::Unrendered`] otherwise.
    pub fn write(&mut self, rect: PixelRect, state: PixelState) {
        assert!(
            self.bounds.contains_rect(rect),
            "{rect:?} is not inside coverage bounds {:?}",
            self.bounds
        );
        let byte = state.to_byte();
        debug_assert!(
            self.accepts(byte),
            "reserved state written into a map without reservations"
        );
        let byte = self.admit(byte);
        self.view_mut().fill(rect, byte);
    }

    /// Checked variant of [`write`](Self::write).
    pub fn try_write(&mut self, rect: PixelRect, state: PixelState) -> Result<(), CoverageError> {
        if !self.bounds.contains_rect(rect) {
            return Err(CoverageError::RectOutOfBounds {
                rect,
                bounds: self.bounds,
            });
        }
        if !self.accepts(state.to_byte()) {
            return Err(CoverageError::ReservationsDisabled);
        }
        self.view_mut().fill(rect, state.to_byte());
        Ok(())
    }

    /// Marks `rect` as computed and available.
    pub fn mark_available(&mut self, rect: PixelRect) {
        self.write(rect, PixelState::Available);
    }

    /// Marks `rect` as being computed by the caller, so that other workers
    /// neither request it again nor consider it finished.
    ///
    /// The reservation must end with [`mark_available`](Self::mark_available)
    /// or, if the render is abandoned, with [`clear`](Self::clear) on exactly
    /// the same rectangle.
    #[cfg(feature = "trimap")]
    pub fn mark_reserved(&mut self, rect: PixelRect) {
        self.write(rect, PixelState::Reserved);
    }

    /// Marks `rect` as unrendered again.
    pub fn clear(&mut self, rect: PixelRect) {
        self.write(rect, PixelState::Unrendered);
    }

    /// Marks the whole map as available, as when the image is restored from a
    /// persisted copy.
    pub fn mark_all_available(&mut self) {
        self.data.fill(PixelState::Available.to_byte());
    }

    /// Marks the whole map as unrendered.
    pub fn clear_all(&mut self) {
        self.data.fill(UNRENDERED);
    }

    /// Copies the coverage of `rect` from `other`, row by row.
    ///
    /// `other` may have different bounds. Reserved pixels arrive as
    /// unrendered in a map without reservations.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is not inside the bounds of both maps.
    pub fn copy_region_from(&mut self, rect: PixelRect, other: &Self) {
        assert!(
            self.bounds.contains_rect(rect) && other.bounds.contains_rect(rect),
            "{rect:?} is not inside both {:?} and {:?}",
            self.bounds,
            other.bounds
        );
        if rect.is_empty() {
            return;
        }
        let reservations = self.config.reservations;
        let src = other.view();
        let mut dst = GridViewMut::new(&mut self.data, self.bounds);
        for y in rect.y0..rect.y1 {
            let from = src.row(y, rect.x0..rect.x1);
            let to = dst.row_mut(y, rect.x0..rect.x1);
            to.copy_from_slice(from);
            if !reservations {
                for byte in to.iter_mut().filter(|b| **b == RESERVED) {
                    *byte = UNRENDERED;
                }
            }
        }
    }

    /// Checked variant of [`copy_region_from`](Self::copy_region_from).
    pub fn try_copy_region_from(&mut self, rect: PixelRect, other: &Self) -> Result<(), CoverageError> {
        for bounds in [self.bounds, other.bounds] {
            if !bounds.contains_rect(rect) {
                return Err(CoverageError::RectOutOfBounds { rect, bounds });
            }
        }
        self.copy_region_from(rect, other);
        Ok(())
    }

    /// Copies the coverage of the row span `[x0, x1)` at `y` from `other`.
    ///
    /// # Panics
    ///
    /// Panics if the span is not inside the bounds of both maps.
    pub fn copy_row_from(&mut self, x0: i32, x1: i32, y: i32, other: &Self) {
        self.copy_region_from(PixelRect::new(x0, y, x1, y + 1), other);
    }

    /// Exchanges the coverage of two maps in constant time.
    ///
    /// Buffers, bounds and the reservation setting move together. Both
    /// restriction rectangles are dropped.
    pub fn swap_with(&mut self, other: &mut Self) {
        mem::swap(&mut self.data, &mut other.data);
        mem::swap(&mut self.bounds, &mut other.bounds);
        mem::swap(&mut self.config.reservations, &mut other.config.reservations);
        self.restriction = None;
        other.restriction = None;
    }

    /// Returns the smallest rectangle holding every pixel of `roi` that is not
    /// available.
    ///
    /// The result lies inside `roi`, the bounds and the restriction. Reserved
    /// pixels count as not available.
    #[must_use]
    pub fn uncovered_bbox(&self, roi: PixelRect) -> PixelRect {
        self.bbox_query(roi, CoverageMode::Simple).0
    }

    /// Trimap variant of [`uncovered_bbox`](Self::uncovered_bbox).
    ///
    /// Reserved pixels count as covered; the returned flag tells whether any
    /// were met outside the returned rectangle. An empty rectangle with the
    /// flag set means the region is claimed by other workers, not finished.
    ///
    /// ```
    /// use understory_coverage::{CoverageMap, PixelRect};
    ///
    /// let bounds = PixelRect::new(0, 0, 10, 10);
    /// let mut map = CoverageMap::new(bounds);
    /// map.mark_available(bounds);
    /// map.mark_reserved(PixelRect::new(3, 3, 7, 7));
    ///
    /// let (bbox, reserved_elsewhere) = map.uncovered_bbox_trimap(bounds);
    /// assert!(bbox.is_empty());
    /// assert!(reserved_elsewhere);
    /// ```
    #[cfg(feature = "trimap")]
    #[must_use]
    pub fn uncovered_bbox_trimap(&self, roi: PixelRect) -> (PixelRect, bool) {
        self.bbox_query(roi, CoverageMode::Trimap)
    }

    fn bbox_query(&self, roi: PixelRect, mode: CoverageMode) -> (PixelRect, bool) {
        let Some(roi) = self.restrict(roi) else {
            return (PixelRect::ZERO, false);
        };
        let inside = roi.intersect(self.bounds);
        if inside.is_empty() {
            return (PixelRect::ZERO, false);
        }
        let bbox = minimal_uncovered_bbox(&self.view(), inside, mode);
        (bbox.rect, bbox.reserved)
    }

    /// Returns disjoint rectangles covering every pixel of `roi` that is not
    /// available.
    ///
    /// Parts of `roi` outside the bounds are returned as they are. Inside the
    /// bounds, the uncovered bounding box is split into unrendered border
    /// strips and a shrunk interior, unless border decomposition is disabled
    /// in the [`CoverageConfig`].
    #[must_use]
    pub fn uncovered_rects(&self, roi: PixelRect) -> UncoveredRects {
        self.rects_query(roi, CoverageMode::Simple)
    }

    /// Trimap variant of [`uncovered_rects`](Self::uncovered_rects).
    ///
    /// Reserved pixels are never returned as work; whether any were met is
    /// reported by [`UncoveredRects::reserved_elsewhere`].
    #[cfg(feature = "trimap")]
    #[must_use]
    pub fn uncovered_rects_trimap(&self, roi: PixelRect) -> UncoveredRects {
        self.rects_query(roi, CoverageMode::Trimap)
    }

    fn rects_query(&self, roi: PixelRect, mode: CoverageMode) -> UncoveredRects {
        let Some(roi) = self.restrict(roi) else {
            return UncoveredRects::default();
        };
        uncovered_rects(&self.view(), roi, mode, self.config.decompose_borders)
    }

    /// Returns the full border-strip decomposition of the uncovered bounding
    /// box of `roi`, or `None` when nothing inside the bounds is uncovered.
    #[must_use]
    pub fn decompose(&self, roi: PixelRect, mode: CoverageMode) -> Option<Decomposition> {
        let roi = self.restrict(roi)?;
        let inside = roi.intersect(self.bounds);
        if inside.is_empty() {
            return None;
        }
        let view = self.view();
        let bbox = minimal_uncovered_bbox(&view, inside, mode);
        if bbox.rect.is_empty() {
            return None;
        }
        let decomposition = decompose_bbox(&view, bbox.rect, mode);
        Some(Decomposition {
            reserved_elsewhere: decomposition.reserved_elsewhere | bbox.reserved,
            ..decomposition
        })
    }

    /// Summarizes the unrendered and reserved pixels of `roi`.
    #[must_use]
    pub fn report(&self, roi: PixelRect) -> CoverageReport {
        CoverageReport::scan(&self.view(), roi.intersect(self.bounds))
    }

    /// Applies the restriction rectangle; `None` if nothing is left.
    fn restrict(&self, roi: PixelRect) -> Option<PixelRect> {
        let roi = match self.restriction {
            Some(restriction) => roi.intersect(restriction),
            None => roi,
        };
        (!roi.is_empty()).then_some(roi)
    }

    fn accepts(&self, byte: u8) -> bool {
        byte != RESERVED || self.config.reservations
    }

    fn admit(&self, byte: u8) -> u8 {
        if self.accepts(byte) { byte } else { UNRENDERED }
    }
}

fn buffer_len(bounds: PixelRect) -> usize {
    usize::try_from(bounds.area()).expect("coverage bounds exceed the address space")
}
