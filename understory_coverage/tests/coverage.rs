// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenario and randomized property tests for the uncovered queries.

use understory_coverage::{CoverageMap, CoverageMode, PixelRect, PixelState, UncoveredRects};

const TEN: PixelRect = PixelRect::new(0, 0, 10, 10);

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    /// Uniform in `lo..hi`.
    fn range(&mut self, lo: i32, hi: i32) -> i32 {
        assert!(lo < hi, "empty range {lo}..{hi}");
        lo + (self.next_u32() % hi.abs_diff(lo)) as i32
    }

    fn rect_within(&mut self, area: PixelRect) -> PixelRect {
        let x0 = self.range(area.x0, area.x1);
        let y0 = self.range(area.y0, area.y1);
        let x1 = self.range(x0, area.x1 + 1);
        let y1 = self.range(y0, area.y1 + 1);
        PixelRect::new(x0, y0, x1, y1)
    }
}

fn pixels(rect: PixelRect) -> impl Iterator<Item = (i32, i32)> {
    (rect.y0..rect.y1).flat_map(move |y| (rect.x0..rect.x1).map(move |x| (x, y)))
}

fn covers(rects: &UncoveredRects, x: i32, y: i32) -> usize {
    rects.iter().filter(|r| r.contains_point(x, y)).count()
}

/// A map over odd bounds filled with random rectangles of every state.
///
/// The damage pattern is drawn too: scattered rectangles, a rendered
/// rectangle (zoom out), or a rendered side (pan).
fn random_map(rng: &mut Lcg, trimap: bool) -> CoverageMap {
    let bounds = PixelRect::new(-3, 2, 13, 15);
    let mut map = CoverageMap::new(bounds);
    match rng.range(0, 3) {
        0 => {
            if rng.range(0, 2) == 0 {
                map.mark_all_available();
            }
            for _ in 0..rng.range(0, 8) {
                let rect = rng.rect_within(bounds);
                match rng.range(0, if trimap { 3 } else { 2 }) {
                    0 => map.clear(rect),
                    1 => map.mark_available(rect),
                    _ => map.write(rect, reserved()),
                }
            }
        }
        1 => {
            let inner = rng.rect_within(bounds);
            map.mark_available(inner);
        }
        _ => {
            let split = rng.range(bounds.x0, bounds.x1);
            map.mark_available(PixelRect::new(bounds.x0, bounds.y0, split, bounds.y1));
        }
    }
    if trimap && rng.range(0, 2) == 0 {
        let rect = rng.rect_within(bounds);
        map.write(rect, reserved());
    }
    map
}

#[cfg(feature = "trimap")]
fn reserved() -> PixelState {
    PixelState::Reserved
}

#[cfg(not(feature = "trimap"))]
fn reserved() -> PixelState {
    PixelState::Unrendered
}

fn random_roi(rng: &mut Lcg, map: &CoverageMap) -> PixelRect {
    let b = map.bounds();
    rng.rect_within(PixelRect::new(b.x0 - 4, b.y0 - 4, b.x1 + 4, b.y1 + 4))
}

#[test]
fn round_trip() {
    let mut map = CoverageMap::new(TEN);
    map.mark_available(PixelRect::new(0, 0, 10, 5));
    assert_eq!(map.uncovered_bbox(TEN), PixelRect::new(0, 5, 10, 10));
}

#[test]
fn covered_border_leaves_a_single_interior_rect() {
    let mut map = CoverageMap::new(TEN);
    map.mark_available(TEN);
    map.clear(PixelRect::new(3, 3, 7, 7));
    let rects = map.uncovered_rects(TEN);
    assert_eq!(rects.as_slice(), &[PixelRect::new(3, 3, 7, 7)]);
    assert!(!rects.reserved_elsewhere());
}

#[cfg(feature = "trimap")]
#[test]
fn reserved_region_means_wait() {
    let mut map = CoverageMap::new(TEN);
    map.mark_available(TEN);
    map.mark_reserved(PixelRect::new(3, 3, 7, 7));

    let (bbox, reserved_elsewhere) = map.uncovered_bbox_trimap(TEN);
    assert!(bbox.is_empty());
    assert!(reserved_elsewhere);

    let rects = map.uncovered_rects_trimap(TEN);
    assert!(rects.is_empty());
    assert!(rects.reserved_elsewhere());

    // The simple queries still see the reserved pixels as missing.
    assert_eq!(map.uncovered_bbox(TEN), PixelRect::new(3, 3, 7, 7));
}

#[test]
fn out_of_bounds_roi_yields_slivers_only() {
    let bounds = PixelRect::new(0, 0, 5, 5);
    let mut map = CoverageMap::new(bounds);
    map.mark_all_available();
    let roi = PixelRect::new(-2, -2, 7, 7);

    let rects = map.uncovered_rects(roi);
    assert_eq!(rects.len(), 4);
    for rect in &rects {
        assert!(!rect.is_empty());
        assert!(!rect.intersects(bounds), "{rect:?} overlaps the bounds");
    }
    assert_eq!(rects.area(), roi.area() - bounds.area());
    assert!(map.uncovered_bbox(roi).is_empty());
}

#[test]
fn huge_roi_reports_exact_area() {
    let map = CoverageMap::new(TEN);
    let roi = PixelRect::new(i32::MIN / 2 - 10, -1, i32::MAX / 2 + 10, 5);
    let rects = map.uncovered_rects(roi);
    // Bottom band, left and right bands, and the unrendered part of the map.
    assert_eq!(rects.len(), 4);
    assert_eq!(rects.area(), roi.area());
    assert_eq!(rects.bounding_box(), roi);

    let everything = PixelRect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
    assert_eq!(map.uncovered_bbox(everything), TEN);
    assert_eq!(map.uncovered_rects(everything).area(), everything.area());
}

#[test]
fn pan_and_zoom_damage() {
    // Zoom out: a rendered centre inside an unrendered ring.
    let mut map = CoverageMap::new(TEN);
    map.mark_available(PixelRect::new(2, 2, 8, 8));
    let rects = map.uncovered_rects(TEN);
    assert_eq!(
        rects.as_slice(),
        &[
            PixelRect::new(0, 0, 10, 2),
            PixelRect::new(0, 8, 10, 10),
            PixelRect::new(0, 2, 2, 8),
            PixelRect::new(8, 2, 10, 8),
        ]
    );

    // Pan right: the rendered part shifted left, a strip opens on the right.
    let mut map = CoverageMap::new(TEN);
    map.mark_available(PixelRect::new(0, 0, 7, 10));
    assert_eq!(
        map.uncovered_rects(TEN).as_slice(),
        &[PixelRect::new(7, 0, 10, 10)]
    );
}

#[test]
fn roi_outside_everything() {
    let map = CoverageMap::new(TEN);
    let roi = PixelRect::new(20, 20, 25, 22);
    assert!(map.uncovered_bbox(roi).is_empty());
    assert_eq!(map.uncovered_rects(roi).as_slice(), &[roi]);
    assert!(map.uncovered_rects(PixelRect::ZERO).is_empty());
}

#[test]
fn bbox_is_contained_sound_and_complete() {
    let mut rng = Lcg::new(0xC0E7_0000_0000_0010);
    for _ in 0..300 {
        let map = random_map(&mut rng, false);
        let roi = random_roi(&mut rng, &map);
        let inside = roi.intersect(map.bounds());
        let bbox = map.uncovered_bbox(roi);

        assert!(inside.contains_rect(bbox), "{bbox:?} escapes {inside:?}");
        let mut all_available = true;
        for (x, y) in pixels(inside) {
            let state = map.read(x, y);
            all_available &= state == Some(PixelState::Available);
            if !bbox.contains_point(x, y) {
                assert_eq!(state, Some(PixelState::Available), "({x}, {y}) left out");
            }
        }
        assert_eq!(all_available, bbox.is_empty());
    }
}

#[test]
fn rects_are_disjoint_and_cover_every_missing_pixel() {
    let mut rng = Lcg::new(0xC0E7_0000_0000_0011);
    for i in 0..300 {
        let mut map = random_map(&mut rng, false);
        map.set_decompose_borders(i % 4 != 0);
        let roi = random_roi(&mut rng, &map);
        let rects = map.uncovered_rects(roi);

        assert!(rects.len() <= 9);
        for (a, ra) in rects.iter().enumerate() {
            assert!(!ra.is_empty());
            assert!(roi.contains_rect(*ra), "{ra:?} escapes {roi:?}");
            for rb in rects.iter().skip(a + 1) {
                assert!(!ra.intersects(*rb), "{ra:?} overlaps {rb:?}");
            }
        }
        for (x, y) in pixels(roi) {
            if map.read(x, y) != Some(PixelState::Available) {
                assert_eq!(covers(&rects, x, y), 1, "({x}, {y}) not covered once");
            }
        }
        assert!(!rects.reserved_elsewhere());
    }
}

#[test]
fn decomposition_tiles_the_bbox() {
    let mut rng = Lcg::new(0xC0E7_0000_0000_0012);
    let mut decomposed = 0;
    for _ in 0..300 {
        let map = random_map(&mut rng, false);
        let roi = random_roi(&mut rng, &map);
        let Some(d) = map.decompose(roi, CoverageMode::Simple) else {
            assert!(map.uncovered_bbox(roi).is_empty());
            continue;
        };
        decomposed += 1;
        assert_eq!(d.bbox, map.uncovered_bbox(roi));
        assert!(d.tiles_bbox());

        let parts = [d.bottom, d.top, d.left, d.right, d.interior];
        let area: u64 = parts.iter().map(|r| r.area()).sum();
        assert_eq!(area, d.bbox.area());
        for (a, ra) in parts.iter().enumerate() {
            for rb in parts.iter().skip(a + 1) {
                assert!(!ra.intersects(*rb), "{ra:?} overlaps {rb:?}");
            }
        }
        assert!(d.interior.contains_rect(d.residual));
        for strip in d.strips() {
            for (x, y) in pixels(strip) {
                assert_ne!(map.read(x, y), Some(PixelState::Available));
            }
        }
    }
    assert!(decomposed > 30, "only {decomposed} maps had work");
}

#[test]
fn marking_is_idempotent() {
    let mut rng = Lcg::new(0xC0E7_0000_0000_0013);
    for _ in 0..100 {
        let mut once = random_map(&mut rng, false);
        let rect = rng.rect_within(once.bounds());
        let mut twice = once.clone();
        once.mark_available(rect);
        twice.mark_available(rect);
        twice.mark_available(rect);
        assert_eq!(once.view().row(5, -3..13), twice.view().row(5, -3..13));
        assert_eq!(once.report(once.bounds()), twice.report(twice.bounds()));

        let bounds = once.bounds();
        once.mark_available(bounds);
        let roi = random_roi(&mut rng, &once);
        assert!(once.uncovered_bbox(roi).is_empty());
    }
}

#[cfg(feature = "trimap")]
#[test]
fn trimap_flag_tracks_excluded_reservations() {
    let mut rng = Lcg::new(0xC0E7_0000_0000_0014);
    for _ in 0..400 {
        let map = random_map(&mut rng, true);
        let roi = random_roi(&mut rng, &map);
        let inside = roi.intersect(map.bounds());
        let any_reserved = pixels(inside).any(|(x, y)| map.read(x, y) == Some(PixelState::Reserved));

        let (bbox, bbox_flag) = map.uncovered_bbox_trimap(roi);
        let rects = map.uncovered_rects_trimap(roi);
        let mut excluded_from_bbox = false;
        let mut excluded_from_rects = false;
        for (x, y) in pixels(inside) {
            match map.read(x, y) {
                Some(PixelState::Reserved) => {
                    excluded_from_bbox |= !bbox.contains_point(x, y);
                    excluded_from_rects |= covers(&rects, x, y) == 0;
                }
                Some(PixelState::Unrendered) => {
                    assert!(bbox.contains_point(x, y), "({x}, {y}) left out");
                    assert_eq!(covers(&rects, x, y), 1, "({x}, {y}) not covered once");
                }
                _ => {}
            }
        }

        if !any_reserved {
            assert!(!bbox_flag);
            assert!(!rects.reserved_elsewhere());
        }
        if excluded_from_bbox {
            assert!(bbox_flag, "reservation outside {bbox:?} not reported");
        }
        if excluded_from_rects {
            assert!(rects.reserved_elsewhere(), "reservation outside {rects:?} not reported");
        }
    }
}

#[cfg(feature = "trimap")]
#[test]
fn strips_never_hold_reservations() {
    let mut rng = Lcg::new(0xC0E7_0000_0000_0015);
    for _ in 0..200 {
        let map = random_map(&mut rng, true);
        let roi = random_roi(&mut rng, &map);
        if let Some(d) = map.decompose(roi, CoverageMode::Trimap) {
            assert!(d.tiles_bbox());
            for strip in d.strips() {
                for (x, y) in pixels(strip) {
                    assert_eq!(map.read(x, y), Some(PixelState::Unrendered));
                }
            }
        }
    }
}

#[test]
fn canonical_roi_round_trip() {
    let roi = PixelRect::from_canonical(kurbo::Rect::new(0.0, 0.0, 100.0, 50.0), 1, 1.0);
    assert_eq!(roi, PixelRect::new(0, 0, 50, 25));

    let mut map = CoverageMap::new(PixelRect::new(0, 0, 64, 64));
    map.mark_available(roi);
    assert!(map.uncovered_bbox(roi).is_empty());
    assert_eq!(map.uncovered_bbox(map.bounds()), PixelRect::new(0, 0, 64, 64));
}
