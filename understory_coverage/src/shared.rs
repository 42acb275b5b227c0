// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A coverage map shared between render workers.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::CoverageConfig;
use crate::decompose::UncoveredRects;
use crate::map::CoverageMap;
use crate::rect::PixelRect;
use crate::report::CoverageReport;

/// A [`CoverageMap`] behind a reader-writer lock.
///
/// Queries take the shared lock and mutations the exclusive one, so a worker
/// never observes a half-written rectangle. A panic while the lock is held
/// does not poison the coverage: every write is a plain byte fill, and the
/// map stays consistent whatever point it was interrupted at.
///
/// With the `trimap` feature, [`claim`](Self::claim) combines the uncovered
/// query with the reservation of its result under one exclusive lock, which is
/// what lets several workers split a region of interest without computing any
/// pixel twice.
#[derive(Debug, Default)]
pub struct SharedCoverage {
    map: RwLock<CoverageMap>,
}

impl SharedCoverage {
    /// Creates an all-unrendered shared map over `bounds`.
    #[must_use]
    pub fn new(bounds: PixelRect) -> Self {
        Self::from_map(CoverageMap::new(bounds))
    }

    /// Creates an all-unrendered shared map over `bounds` with `config`.
    #[must_use]
    pub fn with_config(bounds: PixelRect, config: CoverageConfig) -> Self {
        Self::from_map(CoverageMap::with_config(bounds, config))
    }

    /// Wraps an existing map.
    #[must_use]
    pub fn from_map(map: CoverageMap) -> Self {
        Self {
            map: RwLock::new(map),
        }
    }

    /// Unwraps the map.
    #[must_use]
    pub fn into_inner(self) -> CoverageMap {
        self.map.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, CoverageMap> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CoverageMap> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with shared access to the map.
    pub fn read_map<R>(&self, f: impl FnOnce(&CoverageMap) -> R) -> R {
        f(&self.read())
    }

    /// Runs `f` with exclusive access to the map.
    pub fn write_map<R>(&self, f: impl FnOnce(&mut CoverageMap) -> R) -> R {
        f(&mut self.write())
    }

    /// Returns the rectangle the map covers.
    #[must_use]
    pub fn bounds(&self) -> PixelRect {
        self.read().bounds()
    }

    /// See [`CoverageMap::uncovered_bbox`].
    #[must_use]
    pub fn uncovered_bbox(&self, roi: PixelRect) -> PixelRect {
        self.read().uncovered_bbox(roi)
    }

    /// See [`CoverageMap::uncovered_rects`].
    #[must_use]
    pub fn uncovered_rects(&self, roi: PixelRect) -> UncoveredRects {
        self.read().uncovered_rects(roi)
    }

    /// See [`CoverageMap::report`].
    #[must_use]
    pub fn report(&self, roi: PixelRect) -> CoverageReport {
        self.read().report(roi)
    }

    /// See [`CoverageMap::mark_available`].
    pub fn mark_available(&self, rect: PixelRect) {
        self.write().mark_available(rect);
    }

    /// See [`CoverageMap::clear`].
    pub fn clear(&self, rect: PixelRect) {
        self.write().clear(rect);
    }

    /// See [`CoverageMap::set_restriction`].
    pub fn set_restriction(&self, restriction: Option<PixelRect>) {
        self.write().set_restriction(restriction);
    }

    /// Reserves the part of `roi` nobody has rendered or claimed yet.
    ///
    /// The returned claim lists the rectangles the caller must now compute.
    /// It must be settled with [`RenderClaim::complete`] once they are
    /// written, or [`RenderClaim::abort`] if the render is abandoned; dropping
    /// it unsettled aborts it. An [idle](RenderClaim::is_idle) claim means the
    /// rest of `roi` is being computed by other workers: wait and query again.
    ///
    /// Rectangles are reserved whole. The residual interior of a decomposition
    /// is not minimal and may hold pixels that other workers reserved or
    /// finished; those pixels are then computed twice.
    ///
    /// The map must have been created with reservations enabled (the default
    /// configuration); otherwise reserving panics in debug builds.
    ///
    /// # Example
    ///
    /// ```
    /// use understory_coverage::{PixelRect, SharedCoverage};
    ///
    /// let shared = SharedCoverage::new(PixelRect::new(0, 0, 64, 64));
    /// let roi = PixelRect::new(0, 0, 32, 32);
    ///
    /// let claim = shared.claim(roi);
    /// assert_eq!(claim.rects(), &[roi]);
    ///
    /// // A second worker finds the region taken.
    /// let other = shared.claim(roi);
    /// assert!(other.is_idle());
    /// assert!(other.reserved_elsewhere());
    ///
    /// claim.complete();
    /// assert!(shared.uncovered_bbox(roi).is_empty());
    /// ```
    #[cfg(feature = "trimap")]
    #[must_use = "dropping a claim releases its reservation"]
    pub fn claim(&self, roi: PixelRect) -> RenderClaim<'_> {
        let mut map = self.write();
        let rects = map.uncovered_rects_trimap(roi);
        let bounds = map.bounds();
        for rect in rects.iter().map(|r| r.intersect(bounds)) {
            if !rect.is_empty() {
                map.mark_reserved(rect);
            }
        }
        log::trace!(
            "claimed {} rects ({} px) of {roi}, reserved elsewhere: {}",
            rects.len(),
            rects.area(),
            rects.reserved_elsewhere()
        );
        RenderClaim {
            owner: self,
            rects,
            settled: false,
        }
    }
}

impl From<CoverageMap> for SharedCoverage {
    fn from(map: CoverageMap) -> Self {
        Self::from_map(map)
    }
}

/// Rectangles reserved by one worker in a [`SharedCoverage`].
///
/// Created by [`SharedCoverage::claim`].
#[cfg(feature = "trimap")]
#[derive(Debug)]
pub struct RenderClaim<'a> {
    owner: &'a SharedCoverage,
    rects: UncoveredRects,
    settled: bool,
}

#[cfg(feature = "trimap")]
impl RenderClaim<'_> {
    /// Returns the rectangles this worker must compute.
    ///
    /// Parts of the region of interest outside the map bounds are listed too,
    /// but only the parts inside the bounds are reserved.
    #[must_use]
    pub fn rects(&self) -> &[PixelRect] {
        self.rects.as_slice()
    }

    /// Returns `true` if other workers hold reservations in the region.
    #[must_use]
    pub fn reserved_elsewhere(&self) -> bool {
        self.rects.reserved_elsewhere()
    }

    /// Returns `true` if there is nothing for this worker to compute.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.rects.is_empty()
    }

    /// Marks every claimed rectangle as available.
    pub fn complete(mut self) {
        self.settle(true);
    }

    /// Returns every claimed rectangle to the unrendered state.
    pub fn abort(mut self) {
        self.settle(false);
    }

    fn settle(&mut self, rendered: bool) {
        self.settled = true;
        if self.rects.is_empty() {
            return;
        }
        let mut map = self.owner.write();
        let bounds = map.bounds();
        for rect in self.rects.iter().map(|r| r.intersect(bounds)) {
            if rect.is_empty() {
                continue;
            }
            if rendered {
                map.mark_available(rect);
            } else {
                map.clear(rect);
            }
        }
        log::trace!(
            "{} claim of {} rects ({} px)",
            if rendered { "completed" } else { "aborted" },
            self.rects.len(),
            self.rects.area()
        );
    }
}

#[cfg(feature = "trimap")]
impl Drop for RenderClaim<'_> {
    fn drop(&mut self) {
        if self.settled || self.rects.is_empty() {
            return;
        }
        log::warn!(
            "render claim of {} rects dropped without being settled, releasing it",
            self.rects.len()
        );
        self.settle(false);
        if log::log_enabled!(log::Level::Debug) && !self.rects.is_empty() {
            let area = self.rects.bounding_box();
            log::debug!("coverage after release: {}", self.owner.report(area));
        }
    }
}
