// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge-shrinking passes and the minimal uncovered bounding box.
//!
//! Each pass takes a rectangle and returns a new one with a single edge moved
//! inwards over every line (row or column) accepted by a [`Criterion`]. The
//! passes are independent and compose: the bounding box query is four of them
//! in the fixed order bottom, top, left, right.

use crate::grid::GridView;
use crate::rect::PixelRect;
use crate::state::{CoverageMode, Criterion, LineScan};

/// A rectangle produced by a pass, and whether the pass must raise the
/// "reserved elsewhere" flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Trimmed {
    pub(crate) rect: PixelRect,
    pub(crate) reserved: bool,
}

fn scan_row(view: &GridView<'_>, criterion: Criterion, rect: PixelRect, y: i32) -> LineScan {
    LineScan::run(criterion, view.row(y, rect.x0..rect.x1).iter().copied())
}

fn scan_column(view: &GridView<'_>, criterion: Criterion, rect: PixelRect, x: i32) -> LineScan {
    LineScan::run(criterion, view.column(x, rect.y0..rect.y1))
}

/// Raises the bottom edge (`y0`) over accepted rows.
pub(crate) fn trim_bottom(view: &GridView<'_>, rect: PixelRect, criterion: Criterion) -> Trimmed {
    let mut reserved = false;
    let mut y0 = rect.y0;
    while y0 < rect.y1 {
        let scan = scan_row(view, criterion, rect, y0);
        reserved |= scan.reserved;
        if !scan.accepted {
            break;
        }
        y0 += 1;
    }
    Trimmed {
        rect: PixelRect::new(rect.x0, y0, rect.x1, rect.y1),
        reserved,
    }
}

/// Lowers the top edge (`y1`) over accepted rows.
pub(crate) fn trim_top(view: &GridView<'_>, rect: PixelRect, criterion: Criterion) -> Trimmed {
    let mut reserved = false;
    let mut y1 = rect.y1;
    while y1 > rect.y0 {
        let scan = scan_row(view, criterion, rect, y1 - 1);
        reserved |= scan.reserved;
        if !scan.accepted {
            break;
        }
        y1 -= 1;
    }
    Trimmed {
        rect: PixelRect::new(rect.x0, rect.y0, rect.x1, y1),
        reserved,
    }
}

/// Moves the left edge (`x0`) right over accepted columns.
pub(crate) fn trim_left(view: &GridView<'_>, rect: PixelRect, criterion: Criterion) -> Trimmed {
    let mut reserved = false;
    let mut x0 = rect.x0;
    while x0 < rect.x1 {
        let scan = scan_column(view, criterion, rect, x0);
        reserved |= scan.reserved;
        if !scan.accepted {
            break;
        }
        x0 += 1;
    }
    Trimmed {
        rect: PixelRect::new(x0, rect.y0, rect.x1, rect.y1),
        reserved,
    }
}

/// Moves the right edge (`x1`) left over accepted columns.
pub(crate) fn trim_right(view: &GridView<'_>, rect: PixelRect, criterion: Criterion) -> Trimmed {
    let mut reserved = false;
    let mut x1 = rect.x1;
    while x1 > rect.x0 {
        let scan = scan_column(view, criterion, rect, x1 - 1);
        reserved |= scan.reserved;
        if !scan.accepted {
            break;
        }
        x1 -= 1;
    }
    Trimmed {
        rect: PixelRect::new(rect.x0, rect.y0, x1, rect.y1),
        reserved,
    }
}

/// Returns the smallest rectangle inside `roi` that holds every pixel not
/// covered under `mode`.
///
/// Every pixel of `roi` outside the result is available, or, in trimap mode,
/// available or reserved. `roi` must lie inside the grid bounds.
///
/// The edges shrink greedily in the order bottom, top, left, right. The
/// columns passes are skipped once the rows passes have emptied the box.
pub(crate) fn minimal_uncovered_bbox(
    view: &GridView<'_>,
    roi: PixelRect,
    mode: CoverageMode,
) -> Trimmed {
    debug_assert!(
        view.bounds().contains_rect(roi),
        "{roi:?} is not inside {:?}",
        view.bounds()
    );
    let criterion = Criterion::Covered(mode);

    let bottom = trim_bottom(view, roi, criterion);
    let top = trim_top(view, bottom.rect, criterion);
    let mut reserved = bottom.reserved | top.reserved;
    if top.rect.is_empty() {
        return Trimmed {
            rect: top.rect,
            reserved,
        };
    }

    let left = trim_left(view, top.rect, criterion);
    let right = trim_right(view, left.rect, criterion);
    reserved |= left.reserved | right.reserved;
    Trimmed {
        rect: right.rect,
        reserved,
    }
}
