// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer pixel rectangles.

use core::fmt;

use kurbo::{Affine, Rect};

/// An axis-aligned, half-open integer rectangle `[x0, x1) × [y0, y1)`.
///
/// `y0` is the bottom (minimum) row and `y1` the top (exclusive) row, matching
/// the raster convention of the image buffers this crate tracks. Constructors
/// normalize their input so that `x1 >= x0` and `y1 >= y0`; a rectangle with a
/// zero width or height is empty.
///
/// # Example
///
/// ```
/// use understory_coverage::PixelRect;
///
/// let a = PixelRect::new(0, 0, 10, 10);
/// let b = PixelRect::new(5, 5, 20, 20);
///
/// assert_eq!(a.intersect(b), PixelRect::new(5, 5, 10, 10));
/// assert_eq!(a.area(), 100);
/// assert!(PixelRect::new(3, 3, 3, 9).is_empty());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    /// Left edge, inclusive.
    pub x0: i32,
    /// Bottom edge, inclusive.
    pub y0: i32,
    /// Right edge, exclusive.
    pub x1: i32,
    /// Top edge, exclusive.
    pub y1: i32,
}

impl PixelRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self {
        x0: 0,
        y0: 0,
        x1: 0,
        y1: 0,
    };

    /// Creates a rectangle from its edges.
    ///
    /// An inverted edge pair is collapsed onto its minimum, so the result is
    /// empty rather than negative.
    #[must_use]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            x0,
            y0,
            x1: if x1 < x0 { x0 } else { x1 },
            y1: if y1 < y0 { y0 } else { y1 },
        }
    }

    /// Creates a rectangle from its bottom-left corner and size.
    #[must_use]
    pub const fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(
            x,
            y,
            x.saturating_add_unsigned(width),
            y.saturating_add_unsigned(height),
        )
    }

    /// Returns `x1 - x0`.
    ///
    /// Unsigned, so that rectangles spanning the whole `i32` range have a
    /// representable width.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.x1.abs_diff(self.x0)
    }

    /// Returns `y1 - y0`.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.y1.abs_diff(self.y0)
    }

    /// Returns the number of pixels covered.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns `true` if the rectangle covers no pixel.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Returns `true` if the pixel `(x, y)` lies inside the rectangle.
    #[must_use]
    pub const fn contains_point(self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Returns `true` if every pixel of `other` lies inside `self`.
    ///
    /// An empty `other` is contained in any rectangle.
    #[must_use]
    pub const fn contains_rect(self, other: Self) -> bool {
        other.is_empty()
            || (other.x0 >= self.x0
                && other.x1 <= self.x1
                && other.y0 >= self.y0
                && other.y1 <= self.y1)
    }

    /// Returns the intersection of two rectangles, possibly empty.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        Self::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }

    /// Returns `true` if the two rectangles share at least one pixel.
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns the smallest rectangle containing both rectangles.
    ///
    /// Empty operands are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Returns the smallest pixel rectangle enclosing a canonical rectangle.
    ///
    /// Minimum edges are floored and maximum edges are ceiled. Coordinates
    /// beyond the `i32` range saturate.
    #[must_use]
    pub fn enclosing(rect: Rect) -> Self {
        let r = rect.abs().expand();
        Self::new(
            saturate(r.x0),
            saturate(r.y0),
            saturate(r.x1),
            saturate(r.y1),
        )
    }

    /// Converts a canonical-space rectangle to the pixel bounds of an image at
    /// the given mipmap level.
    ///
    /// The x axis is first divided by `pixel_aspect`, then both axes are scaled
    /// by `2^-mipmap_level`, and the result is enclosed.
    ///
    /// # Panics
    ///
    /// Panics if `mipmap_level >= 32` or `pixel_aspect` is not a positive,
    /// finite number.
    #[must_use]
    pub fn from_canonical(rect: Rect, mipmap_level: u32, pixel_aspect: f64) -> Self {
        assert!(mipmap_level < 32, "mipmap level out of range");
        assert!(
            pixel_aspect.is_finite() && pixel_aspect > 0.0,
            "pixel aspect ratio must be positive"
        );
        let scale = 1.0 / f64::from(1_u32 << mipmap_level);
        let to_pixels = Affine::scale_non_uniform(scale / pixel_aspect, scale);
        Self::enclosing(to_pixels.transform_rect_bbox(rect))
    }

    /// Returns this rectangle in floating-point coordinates.
    #[must_use]
    pub fn to_kurbo(self) -> Rect {
        Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x1),
            f64::from(self.y1),
        )
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int casts saturate, which is the intended clamping"
)]
fn saturate(v: f64) -> i32 {
    v as i32
}

impl fmt::Debug for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelRect([{}, {}) × [{}, {}))",
            self.x0, self.x1, self.y0, self.y1
        )
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})x[{},{})", self.x0, self.x1, self.y0, self.y1)
    }
}

/// Splits the part of `roi` lying outside `bounds` into disjoint bands.
///
/// The bottom and top bands span the full width of `roi`; the left and right
/// bands only span the rows `roi` shares with `bounds`. Empty bands are
/// skipped. The bands never extend outside `roi`.
pub(crate) fn outside_bands(roi: PixelRect, bounds: PixelRect) -> impl Iterator<Item = PixelRect> {
    let mid_y0 = roi.y0.max(bounds.y0).min(roi.y1);
    let mid_y1 = roi.y1.min(bounds.y1).max(mid_y0);
    let bands = if roi.is_empty() {
        [PixelRect::ZERO; 4]
    } else {
        [
            // Left, restricted to the shared rows.
            PixelRect::new(roi.x0, mid_y0, bounds.x0.min(roi.x1), mid_y1),
            // Bottom.
            PixelRect::new(roi.x0, roi.y0, roi.x1, bounds.y0.min(roi.y1)),
            // Right, restricted to the shared rows.
            PixelRect::new(bounds.x1.max(roi.x0), mid_y0, roi.x1, mid_y1),
            // Top.
            PixelRect::new(roi.x0, bounds.y1.max(roi.y0), roi.x1, roi.y1),
        ]
    };
    bands.into_iter().filter(|band| !band.is_empty())
}
