// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by the checked coverage operations.

use core::fmt;

use crate::rect::PixelRect;

/// Error returned by the `try_*` operations of [`CoverageMap`](crate::CoverageMap).
///
/// The unchecked counterparts treat these conditions as programming errors
/// and panic instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CoverageError {
    /// A rectangle passed to a write or copy does not lie inside the bounds
    /// of a map it touches.
    RectOutOfBounds {
        /// The offending rectangle.
        rect: PixelRect,
        /// The bounds it was expected to lie in.
        bounds: PixelRect,
    },
    /// A reserved state was written into a map created without reservations.
    ReservationsDisabled,
}

impl fmt::Display for CoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RectOutOfBounds { rect, bounds } => {
                write!(f, "rectangle {rect} is not inside coverage bounds {bounds}")
            }
            Self::ReservationsDisabled => {
                f.write_str("reserved state written into a map without reservations")
            }
        }
    }
}

impl core::error::Error for CoverageError {}
