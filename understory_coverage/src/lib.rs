// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Coverage: per-pixel render coverage for incremental renderers.
//!
//! A renderer that caches images across frames keeps, next to each cached
//! image, a record of which pixels hold computed values. Before computing a
//! region of interest it asks that record what is still missing, so that only
//! the missing pixels are computed. This crate provides that record and the
//! queries a scheduler runs against it:
//!
//! - **Pixel rectangles** ([`PixelRect`]): half-open integer rectangles, with
//!   conversion from canonical (floating point) coordinates at a mipmap level.
//! - **Coverage maps** ([`CoverageMap`]): one [`PixelState`] byte per pixel of
//!   an image buffer, with region writes, copies between buffers and swaps.
//! - **Uncovered queries**: the minimal bounding box of the pixels left to
//!   compute ([`CoverageMap::uncovered_bbox`]), or a short list of disjoint
//!   rectangles covering them ([`CoverageMap::uncovered_rects`]).
//! - **Reservations** (`trimap` feature): pixels being computed by a worker are
//!   marked reserved, so that other workers neither recompute them nor treat
//!   them as finished.
//! - **Shared maps** (`std` feature, [`SharedCoverage`]): a map behind a
//!   reader-writer lock, with claims that query and reserve atomically.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_coverage::{CoverageMap, PixelRect};
//!
//! let bounds = PixelRect::new(0, 0, 100, 100);
//! let mut map = CoverageMap::new(bounds);
//!
//! // Render the whole image once.
//! for rect in &map.uncovered_rects(bounds) {
//!     // render(rect);
//!     map.mark_available(*rect);
//! }
//! assert!(map.uncovered_rects(bounds).is_empty());
//!
//! // Invalidate a region; only that region is reported again.
//! map.clear(PixelRect::new(10, 10, 20, 20));
//! assert_eq!(
//!     map.uncovered_rects(bounds).as_slice(),
//!     &[PixelRect::new(10, 10, 20, 20)]
//! );
//! ```
//!
//! ## Rectangle Queries
//!
//! [`CoverageMap::uncovered_rects`] returns at most nine pairwise disjoint
//! rectangles ([`UncoveredRects`]):
//!
//! - the parts of the region of interest outside the map bounds, which are
//!   never covered;
//! - up to four unrendered border strips of the uncovered bounding box;
//! - the rest of the box, shrunk once more to its own uncovered bounding box.
//!
//! The strips match the damage left by panning (one or two strips) and zooming
//! out (a ring of four). [`CoverageMap::decompose`] exposes the decomposition
//! itself as a [`Decomposition`].
//!
//! The result is sound (every pixel left to compute is in some rectangle) but
//! not minimal: the residual interior may contain available pixels, which a
//! renderer then recomputes.
//!
//! ## Reservations
//!
//! In a multi-threaded renderer several workers may request overlapping
//! regions of the same image. With the `trimap` feature a map also stores
//! [`PixelState::Reserved`]. The `*_trimap` queries treat reserved pixels as
//! covered and raise a "reserved elsewhere" flag when they met any: an empty
//! result with the flag set means the region is being computed by someone
//! else, and the caller must wait rather than declare it finished.
//!
//! ```rust
//! # #[cfg(feature = "trimap")]
//! # {
//! use understory_coverage::{CoverageMap, PixelRect};
//!
//! let bounds = PixelRect::new(0, 0, 8, 8);
//! let mut map = CoverageMap::new(bounds);
//!
//! let mine = map.uncovered_rects_trimap(bounds);
//! for rect in &mine {
//!     map.mark_reserved(*rect);
//! }
//!
//! let theirs = map.uncovered_rects_trimap(bounds);
//! assert!(theirs.is_empty());
//! assert!(theirs.reserved_elsewhere());
//! # }
//! ```
//!
//! [`SharedCoverage::claim`] performs the query and the reservation under one
//! lock and hands back a [`RenderClaim`] that releases the reservation unless
//! it is completed.
//!
//! ## Synchronization
//!
//! [`CoverageMap`] is not synchronized; its owner serializes access. Queries
//! need shared access and writes exclusive access, which is exactly what
//! [`SharedCoverage`] provides.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: claims at `trace`, claims
//! dropped without being settled at `warn`.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. [`SharedCoverage`] needs the `std`
//! feature for its lock.
//!
//! ## Features
//!
//! - `std` (default): enables [`SharedCoverage`] and Kurbo's `std` support.
//! - `libm`: Kurbo's floating point support for `no_std` builds.
//! - `trimap` (default): enables [`PixelState::Reserved`] and the trimap
//!   queries.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod config;
mod decompose;
mod error;
mod grid;
mod map;
mod rect;
mod report;
#[cfg(feature = "std")]
mod shared;
mod shrink;
mod state;

pub use config::CoverageConfig;
pub use decompose::{Decomposition, UncoveredRects};
pub use error::CoverageError;
pub use grid::GridView;
pub use map::CoverageMap;
pub use rect::PixelRect;
pub use report::CoverageReport;
#[cfg(all(feature = "std", feature = "trimap"))]
pub use shared::RenderClaim;
#[cfg(feature = "std")]
pub use shared::SharedCoverage;
pub use state::{CoverageMode, PixelState};
