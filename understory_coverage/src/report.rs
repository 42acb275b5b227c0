// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostic summary of the pixels left in a region.

use core::fmt;

use crate::grid::GridView;
use crate::rect::PixelRect;
use crate::state::{RESERVED, UNRENDERED};

/// Where the unrendered and reserved pixels of a region are.
///
/// Produced by [`CoverageMap::report`](crate::CoverageMap::report). Unlike the
/// uncovered queries, which are tuned for scheduling, this is an exact
/// per-pixel census meant for logging and debugging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// The scanned region (the queried region clipped to the map bounds).
    pub region: PixelRect,
    /// Bounding box of the unrendered pixels; empty if there are none.
    pub unrendered: PixelRect,
    /// Number of unrendered pixels.
    pub unrendered_count: u64,
    /// Bounding box of the reserved pixels; empty if there are none.
    pub reserved: PixelRect,
    /// Number of reserved pixels.
    pub reserved_count: u64,
}

impl CoverageReport {
    pub(crate) fn scan(view: &GridView<'_>, region: PixelRect) -> Self {
        let mut report = Self {
            region,
            ..Self::default()
        };
        if region.is_empty() {
            return report;
        }
        for y in region.y0..region.y1 {
            for (x, byte) in (region.x0..).zip(view.row(y, region.x0..region.x1)) {
                let pixel = PixelRect::new(x, y, x + 1, y + 1);
                match *byte {
                    UNRENDERED => {
                        report.unrendered = report.unrendered.union(pixel);
                        report.unrendered_count += 1;
                    }
                    RESERVED => {
                        report.reserved = report.reserved.union(pixel);
                        report.reserved_count += 1;
                    }
                    _ => {}
                }
            }
        }
        report
    }

    /// Returns `true` if every pixel of the region is available.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unrendered_count == 0 && self.reserved_count == 0
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete() {
            return write!(f, "{} fully available", self.region);
        }
        write!(f, "{}:", self.region)?;
        if self.unrendered_count > 0 {
            write!(
                f,
                " {} unrendered pixels in {}",
                self.unrendered_count, self.unrendered
            )?;
        }
        if self.reserved_count > 0 {
            write!(
                f,
                " {} reserved pixels in {}",
                self.reserved_count, self.reserved
            )?;
        }
        Ok(())
    }
}
