// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grid localisation — find the largest external contour in a binary image,
// reduce it to a polygon, and accept it only if it is a convex quadrilateral.

use image::GrayImage;
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use sudokuscan_core::config::LocatorConfig;
use sudokuscan_core::error::{Result, ScanError};
use sudokuscan_core::types::{Point2, Quadrilateral, shoelace_area};
use tracing::{debug, info, instrument, warn};

/// Locate the puzzle boundary in a binary image (ink = non-zero).
///
/// Fails with [`ScanError::NoGridFound`] when the image has no foreground at
/// all, [`ScanError::AmbiguousGrid`] when the largest shape does not simplify
/// to four vertices, and [`ScanError::NonConvexGrid`] when the four vertices
/// do not form a convex quadrilateral (corner ordering would be unreliable).
#[instrument(skip_all, fields(width = binary.width(), height = binary.height()))]
pub fn locate_grid(binary: &GrayImage, config: &LocatorConfig) -> Result<Quadrilateral> {
    let contours = find_contours::<i32>(binary);
    let external: Vec<&Contour<i32>> = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect();
    debug!(
        total = contours.len(),
        external = external.len(),
        "Contours extracted"
    );

    let largest = largest_contour(&external).ok_or(ScanError::NoGridFound)?;

    let perimeter = arc_length(&largest.points, true);
    let epsilon = config.epsilon_ratio * perimeter;
    let polygon = approximate_closed_polygon(&largest.points, epsilon);
    debug!(
        contour_points = largest.points.len(),
        perimeter,
        epsilon,
        vertices = polygon.len(),
        "Largest contour approximated"
    );

    if polygon.len() != 4 {
        warn!(vertices = polygon.len(), "Grid boundary is not a quadrilateral");
        return Err(ScanError::AmbiguousGrid {
            vertices: polygon.len(),
        });
    }

    let points: [Point2; 4] = [
        to_point2(polygon[0]),
        to_point2(polygon[1]),
        to_point2(polygon[2]),
        to_point2(polygon[3]),
    ];
    let quad = Quadrilateral::from_unordered(points);

    if config.require_convex && !quad.is_convex() {
        warn!(corners = ?quad.corners(), "Grid boundary is not convex");
        return Err(ScanError::NonConvexGrid);
    }

    info!(
        top_left = ?quad.top_left(),
        top_right = ?quad.top_right(),
        bottom_right = ?quad.bottom_right(),
        bottom_left = ?quad.bottom_left(),
        area = quad.area(),
        "Grid located"
    );
    Ok(quad)
}

/// The contour enclosing the largest area. Earlier contours win ties.
fn largest_contour<'a>(contours: &[&'a Contour<i32>]) -> Option<&'a Contour<i32>> {
    let mut best: Option<(&Contour<i32>, f32)> = None;
    for contour in contours {
        let area = contour_area(contour);
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(contour, _)| contour)
}

fn contour_area(contour: &Contour<i32>) -> f32 {
    let points: Vec<Point2> = contour.points.iter().map(|p| to_point2(*p)).collect();
    shoelace_area(&points)
}

fn to_point2(p: Point<i32>) -> Point2 {
    (p.x as f32, p.y as f32)
}

fn squared_distance(a: Point<i32>, b: Point<i32>) -> i64 {
    let dx = i64::from(a.x - b.x);
    let dy = i64::from(a.y - b.y);
    dx * dx + dy * dy
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_distance = -1;
    for (i, p) in points.iter().enumerate() {
        let d = squared_distance(*p, origin);
        if d > best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

/// Douglas–Peucker simplification of a closed curve.
///
/// The curve is split at two mutually distant points so that the arbitrary
/// start of the boundary trace never survives as a spurious vertex; each half
/// is simplified as an open chain and the halves are rejoined.
fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let mut polygon = if points.len() < 3 || epsilon <= 0.0 {
        points.to_vec()
    } else {
        let first = farthest_from(points, points[0]);
        let second = farthest_from(points, points[first]);
        let (a, b) = (first.min(second), first.max(second));
        if a == b {
            vec![points[a]]
        } else {
            let forward = &points[a..=b];
            let wrapped: Vec<Point<i32>> = points[b..]
                .iter()
                .chain(points[..=a].iter())
                .copied()
                .collect();

            let mut joined = approximate_polygon_dp(forward, epsilon, false);
            let tail = approximate_polygon_dp(&wrapped, epsilon, false);
            // Each half repeats the other's endpoint.
            joined.pop();
            joined.extend(tail);
            joined.pop();
            joined
        }
    };

    polygon.dedup();
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    polygon
}
