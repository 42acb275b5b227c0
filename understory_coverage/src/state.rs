// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pixel coverage states and the query policy that interprets them.

use core::fmt;

/// The coverage state of a single pixel.
///
/// Each pixel of a [`CoverageMap`](crate::CoverageMap) is stored as one byte
/// holding the discriminant of this enum.
///
/// In reservation (trimap) mode the state machine is
/// `Unrendered → Reserved → Available`, and an aborted render must take
/// `Reserved → Unrendered` again. Without reservations only
/// `Unrendered → Available` and the explicit clear exist.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PixelState {
    /// Not computed.
    #[default]
    Unrendered = 0,
    /// Computed and available.
    Available = 1,
    /// Being computed by another worker.
    #[cfg(feature = "trimap")]
    Reserved = 2,
}

impl PixelState {
    /// Returns the byte stored in the map for this state.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Decodes a stored byte.
    ///
    /// Returns `None` for bytes that are not a valid state.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            UNRENDERED => Some(Self::Unrendered),
            AVAILABLE => Some(Self::Available),
            #[cfg(feature = "trimap")]
            RESERVED => Some(Self::Reserved),
            _ => None,
        }
    }
}

impl fmt::Debug for PixelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unrendered => "Unrendered",
            Self::Available => "Available",
            #[cfg(feature = "trimap")]
            Self::Reserved => "Reserved",
        };
        f.write_str(name)
    }
}

pub(crate) const UNRENDERED: u8 = 0;
pub(crate) const AVAILABLE: u8 = 1;
/// Reserved pixels are stored as `2` even when the state itself is compiled
/// out, so that scans can recognize stray bytes.
pub(crate) const RESERVED: u8 = 2;

/// How a coverage query interprets [`PixelState::Reserved`] pixels.
///
/// This is a runtime policy: both interpretations share one implementation
/// of the scans.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum CoverageMode {
    /// Only `Available` counts as covered. A reserved pixel is treated like
    /// an unrendered one.
    #[default]
    Simple,
    /// Reserved pixels count as covered (they are not requested again) but
    /// their presence is reported to the caller, which must wait for the
    /// reservation holder rather than assume the region is complete.
    #[cfg(feature = "trimap")]
    Trimap,
}

impl CoverageMode {
    /// Returns `true` for [`CoverageMode::Trimap`].
    #[must_use]
    pub const fn is_trimap(self) -> bool {
        match self {
            Self::Simple => false,
            #[cfg(feature = "trimap")]
            Self::Trimap => true,
        }
    }
}

/// Verdict of a line criterion on one pixel byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// The pixel keeps the line eligible.
    Accept,
    /// The pixel keeps the line eligible, and it is reserved.
    AcceptReserved,
    /// The pixel ends the line's eligibility.
    Reject,
    /// The pixel ends the line's eligibility because it is reserved.
    RejectReserved,
}

/// What a scan is looking for in each line (row or column).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Criterion {
    /// Lines whose every pixel is covered. Used to shrink a bounding box
    /// down to the uncovered area.
    Covered(CoverageMode),
    /// Lines holding no available pixel. Used to peel wholly unrendered
    /// strips off a bounding box.
    Unrendered(CoverageMode),
}

impl Criterion {
    #[inline]
    pub(crate) fn step(self, byte: u8) -> Step {
        match self {
            Self::Covered(mode) => match byte {
                UNRENDERED => Step::Reject,
                RESERVED if mode.is_trimap() => Step::AcceptReserved,
                RESERVED => Step::Reject,
                _ => Step::Accept,
            },
            Self::Unrendered(mode) => match byte {
                AVAILABLE => Step::Reject,
                RESERVED if mode.is_trimap() => Step::RejectReserved,
                _ => Step::Accept,
            },
        }
    }
}

/// Result of scanning one line against a [`Criterion`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct LineScan {
    /// Every pixel of the line was accepted.
    pub(crate) accepted: bool,
    /// The scan must raise the caller's "reserved elsewhere" flag.
    pub(crate) reserved: bool,
}

impl LineScan {
    /// Runs `criterion` over `pixels`, stopping at the first rejection.
    ///
    /// A reserved pixel is only reported when it decided the outcome: for an
    /// accepted line, when one was seen anywhere in it; for a rejected line,
    /// when it was the rejecting pixel.
    #[inline]
    pub(crate) fn run(criterion: Criterion, pixels: impl IntoIterator<Item = u8>) -> Self {
        let mut saw_reserved = false;
        for byte in pixels {
            match criterion.step(byte) {
                Step::Accept => {}
                Step::AcceptReserved => saw_reserved = true,
                Step::Reject => {
                    return Self {
                        accepted: false,
                        reserved: false,
                    };
                }
                Step::RejectReserved => {
                    return Self {
                        accepted: false,
                        reserved: true,
                    };
                }
            }
        }
        Self {
            accepted: true,
            reserved: saw_reserved,
        }
    }
}
