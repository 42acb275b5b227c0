// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stride-aware access to the coverage bytes.

use core::ops::Range;

use crate::rect::PixelRect;

/// Row-major byte grid addressed in pixel coordinates.
///
/// A grid covers `bounds`; the byte for pixel `(x, y)` lives at
/// `(y - bounds.y0) * stride + (x - bounds.x0)` with `stride == bounds.width()`.
#[derive(Copy, Clone, Debug)]
struct Layout {
    bounds: PixelRect,
    stride: usize,
}

impl Layout {
    fn new(bounds: PixelRect, len: usize) -> Self {
        let stride = bounds.width() as usize;
        debug_assert_eq!(
            len as u64,
            bounds.area(),
            "grid buffer does not match its bounds"
        );
        Self { bounds, stride }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains_point(x, y) {
            return None;
        }
        let dx = x.abs_diff(self.bounds.x0) as usize;
        let dy = y.abs_diff(self.bounds.y0) as usize;
        Some(dy * self.stride + dx)
    }

    /// Byte range of the row `y`, columns `xs`.
    #[inline]
    fn row_range(&self, y: i32, xs: Range<i32>) -> Range<usize> {
        let b = self.bounds;
        assert!(
            y >= b.y0 && y < b.y1 && xs.start >= b.x0 && xs.end <= b.x1 && xs.start <= xs.end,
            "row {y} span {xs:?} outside of {b:?}"
        );
        let start = y.abs_diff(b.y0) as usize * self.stride + xs.start.abs_diff(b.x0) as usize;
        start..start + xs.end.abs_diff(xs.start) as usize
    }
}

/// Read-only view of a coverage grid.
///
/// Every accessor is checked against the grid bounds: point reads return
/// `None` outside of them, and row or column spans must lie inside them.
#[derive(Copy, Clone, Debug)]
pub struct GridView<'a> {
    data: &'a [u8],
    layout: Layout,
}

impl<'a> GridView<'a> {
    pub(crate) fn new(data: &'a [u8], bounds: PixelRect) -> Self {
        Self {
            layout: Layout::new(bounds, data.len()),
            data,
        }
    }

    /// Returns the rectangle the grid covers.
    #[must_use]
    pub fn bounds(&self) -> PixelRect {
        self.layout.bounds
    }

    /// Returns the byte at `(x, y)`, or `None` outside the bounds.
    #[must_use]
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> Option<u8> {
        self.layout.index(x, y).map(|i| self.data[i])
    }

    /// Returns the bytes of row `y` between columns `xs`.
    ///
    /// # Panics
    ///
    /// Panics if the span is not inside the bounds.
    #[must_use]
    #[inline]
    pub fn row(&self, y: i32, xs: Range<i32>) -> &'a [u8] {
        &self.data[self.layout.row_range(y, xs)]
    }

    /// Iterates over the bytes of column `x` between rows `ys`, bottom to top.
    ///
    /// # Panics
    ///
    /// Panics if the span is not inside the bounds.
    #[inline]
    pub fn column(&self, x: i32, ys: Range<i32>) -> impl Iterator<Item = u8> + 'a {
        let bounds = self.layout.bounds;
        assert!(
            x >= bounds.x0
                && x < bounds.x1
                && ys.start >= bounds.y0
                && ys.end <= bounds.y1
                && ys.start <= ys.end,
            "column {x} span {ys:?} outside of {bounds:?}"
        );
        let stride = self.layout.stride;
        let first = ys.start.abs_diff(bounds.y0) as usize * stride + x.abs_diff(bounds.x0) as usize;
        let data = self.data;
        (0..ys.end.abs_diff(ys.start) as usize).map(move |row| data[first + row * stride])
    }
}

/// Mutable view of a coverage grid.
#[derive(Debug)]
pub(crate) struct GridViewMut<'a> {
    data: &'a mut [u8],
    layout: Layout,
}

impl<'a> GridViewMut<'a> {
    pub(crate) fn new(data: &'a mut [u8], bounds: PixelRect) -> Self {
        Self {
            layout: Layout::new(bounds, data.len()),
            data,
        }
    }

    pub(crate) fn row_mut(&mut self, y: i32, xs: Range<i32>) -> &mut [u8] {
        let range = self.layout.row_range(y, xs);
        &mut self.data[range]
    }

    /// Sets every byte of `rect` to `byte`. `rect` must lie inside the bounds.
    pub(crate) fn fill(&mut self, rect: PixelRect, byte: u8) {
        if rect.is_empty() {
            return;
        }
        for y in rect.y0..rect.y1 {
            self.row_mut(y, rect.x0..rect.x1).fill(byte);
        }
    }
}
