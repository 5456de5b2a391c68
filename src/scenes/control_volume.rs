// src/scenes/control_volume.rs

//! A square control volume with a circle of arcs inside it.
//!
//! The arcs are built but do not bound the meshed surface, and they are only
//! tagged when `tag_arcs` is set.

use super::require;
use crate::config::ControlVolumeConfig;
use crate::geometry::shapes::{add_circle_arcs, add_closed_polyline};
use crate::geometry::Geometry;
use crate::PipelineError;

pub fn build(config: &ControlVolumeConfig) -> Result<Geometry, PipelineError> {
    require(config.square.len() >= 3, || {
        format!("control volume needs at least 3 corners, got {}", config.square.len())
    })?;
    require(config.arc_rim.len() >= 3, || {
        format!("inner circle needs at least 3 rim points, got {}", config.arc_rim.len())
    })?;

    let mut geo = Geometry::new();

    let (_, lines) = add_closed_polyline(&mut geo, &config.square, config.mesh_size)?;
    geo.add_physical(lines.clone(), config.boundary_label.as_deref())?;
    let line_loop = geo.add_line_loop(&lines)?;

    let (_, arcs) = add_circle_arcs(&mut geo, config.arc_center, &config.arc_rim, config.mesh_size)?;
    if config.tag_arcs {
        geo.add_physical(arcs, config.arc_label.as_deref())?;
    }

    let surface = geo.add_plane_surface(line_loop, &[])?;
    geo.add_physical(surface, config.surface_label.as_deref())?;

    log::info!(
        "Built control volume: {} points, {} curves, {} physical groups",
        geo.point_count(),
        geo.curve_count(),
        geo.physical_count()
    );
    Ok(geo)
}
