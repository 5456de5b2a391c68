// src/geometry/shapes.rs

//! Composite shapes assembled from the primitive `Geometry` operations.

use super::{CurveId, Geometry, GeometryError, PointId};
use nalgebra::{Point2, Vector2};
use std::f64::consts::PI;

/// Adds one point per coordinate and the lines joining them cyclically.
///
/// Line `n` runs from point `n` to point `(n + 1) % K`, so the returned lines
/// can be fed straight into `Geometry::add_line_loop`.
pub fn add_closed_polyline(
    geo: &mut Geometry,
    coords: &[[f64; 3]],
    mesh_size: f64,
) -> Result<(Vec<PointId>, Vec<CurveId>), GeometryError> {
    let points = coords
        .iter()
        .map(|&c| geo.add_point(c, mesh_size))
        .collect::<Result<Vec<_>, _>>()?;

    let k = points.len();
    let lines = (0..k)
        .map(|n| geo.add_line(points[n], points[(n + 1) % k]))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((points, lines))
}

/// Samples `n` points on an axis-aligned ellipse, counter-clockwise from the
/// positive x semi-axis, at angles `2πk/n`.
pub fn ellipse_coords(center: Point2<f64>, semi_x: f64, semi_y: f64, n: usize) -> Vec<[f64; 3]> {
    (0..n)
        .map(|k| {
            let theta = 2.0 * PI * k as f64 / n as f64;
            let p = center + Vector2::new(semi_x * theta.cos(), semi_y * theta.sin());
            [p.x, p.y, 0.0]
        })
        .collect()
}

/// Adds a circle made of arcs through the given rim points.
///
/// The center point is created first, then the rim points in order, then
/// arc `k` from rim point `k` to rim point `k + 1`, wrapping around. Rim
/// points must all lie at the same distance from the center. With fewer than
/// three rim points an arc would span half a turn or more, which gmsh
/// rejects, so such requests fail with `ArcTooWide`.
pub fn add_circle_arcs(
    geo: &mut Geometry,
    center: [f64; 3],
    rim: &[[f64; 3]],
    mesh_size: f64,
) -> Result<(PointId, Vec<CurveId>), GeometryError> {
    let center_id = geo.add_point(center, mesh_size)?;
    let rim = rim
        .iter()
        .map(|&c| geo.add_point(c, mesh_size))
        .collect::<Result<Vec<_>, _>>()?;

    let arcs = (0..rim.len())
        .map(|k| geo.add_circle_arc(rim[k], center_id, rim[(k + 1) % rim.len()]))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((center_id, arcs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_polyline_links_last_point_to_first() {
        let mut geo = Geometry::new();
        let coords = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let (points, lines) = add_closed_polyline(&mut geo, &coords, 0.1).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(lines.len(), 3);
        assert_eq!(geo.curve(lines[2]).unwrap().endpoints(), (points[2], points[0]));
        assert!(geo.add_line_loop(&lines).is_ok());
    }

    #[test]
    fn test_ellipse_coords() {
        let coords = ellipse_coords(Point2::new(0.5, -0.25), 1.5, 1.0, 4);

        assert_eq!(coords.len(), 4);
        assert_relative_eq!(coords[0][0], 2.0);
        assert_relative_eq!(coords[0][1], -0.25);
        assert_relative_eq!(coords[1][0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(coords[1][1], 0.75);
        assert_relative_eq!(coords[2][0], -1.0);
        assert!(coords.iter().all(|c| c[2] == 0.0));
    }

    #[test]
    fn test_circle_arcs_match_quarter_points() {
        let mut geo = Geometry::new();
        let rim = ellipse_coords(Point2::new(0.5, 0.5), 0.25, 0.25, 4);
        let (center, arcs) = add_circle_arcs(&mut geo, [0.5, 0.5, 0.0], &rim, 0.01).unwrap();

        assert_eq!(center.tag(), 1);
        assert_eq!(arcs.len(), 4);
        assert_eq!(geo.point_count(), 5);

        let (start, _) = geo.curve(arcs[0]).unwrap().endpoints();
        let p = geo.point(start).unwrap();
        assert_relative_eq!(p.coords.x, 0.75);
        assert_relative_eq!(p.coords.y, 0.5);

        let (_, end) = geo.curve(arcs[3]).unwrap().endpoints();
        assert_eq!(end, start);
        assert!(geo.add_line_loop(&arcs).is_ok());
    }

    #[test]
    fn test_rim_off_the_circle_is_rejected() {
        let mut geo = Geometry::new();
        let rim = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-2.0, 0.0, 0.0], [0.0, -1.0, 0.0]];
        let result = add_circle_arcs(&mut geo, [0.0, 0.0, 0.0], &rim, 0.1);
        assert!(matches!(result, Err(GeometryError::ArcRadiusMismatch { .. })));
    }

    #[test]
    fn test_two_arcs_are_rejected() {
        let mut geo = Geometry::new();
        let rim = ellipse_coords(Point2::origin(), 1.0, 1.0, 2);
        let result = add_circle_arcs(&mut geo, [0.0, 0.0, 0.0], &rim, 0.1);
        assert!(matches!(result, Err(GeometryError::ArcTooWide { .. })));
    }
}
