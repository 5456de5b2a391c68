// src/scenes/domain.rs

//! An elliptical domain with elliptical holes, every boundary sampled as a
//! polygon.

use super::require;
use crate::config::{DomainConfig, EllipseConfig};
use crate::geometry::shapes::{add_closed_polyline, ellipse_coords};
use crate::geometry::{CurveId, Geometry, LoopId};
use crate::PipelineError;
use nalgebra::Point2;

pub fn build(config: &DomainConfig) -> Result<Geometry, PipelineError> {
    validate_ellipse("outer boundary", &config.outer)?;
    for (i, hole) in config.holes.iter().enumerate() {
        validate_ellipse(&format!("hole {}", i + 1), hole)?;
    }
    let segments = config.outer.segments;
    require((1..=segments).contains(&config.outer_groups), || {
        format!(
            "outer boundary of {} segments cannot be split into {} groups",
            segments, config.outer_groups
        )
    })?;

    let mut geo = Geometry::new();

    let lines = add_ellipse(&mut geo, &config.outer, config.mesh_size)?;
    for (k, range) in split_evenly(segments, config.outer_groups).enumerate() {
        let label = outer_group_label(config.outer.label.as_deref(), k, config.outer_groups);
        geo.add_physical(&lines[range], label.as_deref())?;
    }
    let outer_loop = geo.add_line_loop(&lines)?;

    let holes = config
        .holes
        .iter()
        .map(|hole| -> Result<LoopId, PipelineError> {
            let lines = add_ellipse(&mut geo, hole, config.mesh_size)?;
            geo.add_physical(lines.clone(), hole.label.as_deref())?;
            Ok(geo.add_line_loop(&lines)?)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let surface = geo.add_plane_surface(outer_loop, &holes)?;
    geo.add_physical(surface, config.surface_label.as_deref())?;

    log::info!(
        "Built domain: {} points, {} curves, {} holes, {} physical groups",
        geo.point_count(),
        geo.curve_count(),
        holes.len(),
        geo.physical_count()
    );
    Ok(geo)
}

fn add_ellipse(geo: &mut Geometry, ellipse: &EllipseConfig, mesh_size: f64) -> Result<Vec<CurveId>, PipelineError> {
    let [x, y] = ellipse.center;
    let coords = ellipse_coords(Point2::new(x, y), ellipse.semi_x, ellipse.semi_y, ellipse.segments);
    let (_, lines) = add_closed_polyline(geo, &coords, mesh_size)?;
    Ok(lines)
}

fn validate_ellipse(name: &str, ellipse: &EllipseConfig) -> Result<(), PipelineError> {
    require(ellipse.segments >= 3, || {
        format!("{} needs at least 3 segments, got {}", name, ellipse.segments)
    })?;
    require(ellipse.semi_x > 0.0 && ellipse.semi_y > 0.0, || {
        format!("{} semi-axes must be positive", name)
    })
}

/// Each outer group gets its own name: `<label>_<k+1>` when the boundary is
/// split, the bare label when it is not.
fn outer_group_label(label: Option<&str>, k: usize, groups: usize) -> Option<String> {
    match label {
        Some(label) if groups > 1 => Some(format!("{}_{}", label, k + 1)),
        Some(label) => Some(label.to_string()),
        None => None,
    }
}

/// Splits `0..n` into `parts` consecutive ranges whose lengths differ by at
/// most one.
fn split_evenly(n: usize, parts: usize) -> impl Iterator<Item = std::ops::Range<usize>> {
    (0..parts).map(move |k| k * n / parts..(k + 1) * n / parts)
}
