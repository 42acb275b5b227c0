// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime configuration of a coverage map.

/// Runtime options of a [`CoverageMap`](crate::CoverageMap).
///
/// # Example
///
/// ```
/// use understory_coverage::{CoverageConfig, CoverageMap, PixelRect};
///
/// let config = CoverageConfig {
///     decompose_borders: false,
///     ..CoverageConfig::default()
/// };
/// let map = CoverageMap::with_config(PixelRect::new(0, 0, 64, 64), config);
/// assert!(!map.config().decompose_borders);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CoverageConfig {
    /// Whether the map may hold reserved pixels.
    ///
    /// A map without reservations never stores the reserved state: writing it
    /// is a programming error, and reserved pixels copied in from another map
    /// arrive as unrendered. Always `false` without the `trimap` feature.
    pub reservations: bool,
    /// Whether rectangle queries split the uncovered bounding box into
    /// unrendered border strips and a shrunk interior.
    ///
    /// When `false`, a rectangle query returns the single minimal uncovered
    /// bounding box of the in-bounds part of the region.
    pub decompose_borders: bool,
}

impl CoverageConfig {
    /// Configuration for a map that is only ever used from a single renderer:
    /// no reservations, border decomposition on.
    pub const SIMPLE: Self = Self {
        reservations: false,
        decompose_borders: true,
    };

    /// Clears options that the enabled features cannot honor.
    #[must_use]
    pub(crate) const fn sanitized(self) -> Self {
        Self {
            reservations: self.reservations && cfg!(feature = "trimap"),
            decompose_borders: self.decompose_borders,
        }
    }
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            reservations: cfg!(feature = "trimap"),
            decompose_borders: true,
        }
    }
}
