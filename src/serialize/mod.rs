// src/serialize/mod.rs

//! Emits a `Geometry` as a gmsh `.geo` script (built-in kernel syntax).

use crate::geometry::{Curve, Entity, Geometry, GeometryError, PhysicalMembers};
use crate::PipelineError;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Renders the geometry as `.geo` source, one statement per entity in
/// creation order.
///
/// The output depends only on the sequence of `add_*` calls, so building the
/// same geometry twice yields identical text.
pub fn to_geo_code(geo: &Geometry) -> Result<String, GeometryError> {
    let mut code = format!("// geomesh {}\n", env!("CARGO_PKG_VERSION"));
    for &entity in geo.entities() {
        code.push_str(&statement(geo, entity)?);
        code.push('\n');
    }
    Ok(code)
}

/// Renders the single `.geo` statement declaring `entity`.
fn statement(geo: &Geometry, entity: Entity) -> Result<String, GeometryError> {
    let text = match entity {
        Entity::Point(id) => {
            let p = geo.point(id)?;
            format!(
                "Point({}) = {{{}, {}, {}, {}}};",
                id.tag(),
                p.coords.x,
                p.coords.y,
                p.coords.z,
                p.mesh_size
            )
        }
        Entity::Curve(id) => match *geo.curve(id)? {
            Curve::Line { start, end } => format!("Line({}) = {{{}, {}}};", id.tag(), start.tag(), end.tag()),
            Curve::Arc { start, center, end } => format!(
                "Circle({}) = {{{}, {}, {}}};",
                id.tag(),
                start.tag(),
                center.tag(),
                end.tag()
            ),
        },
        Entity::Loop(id) => {
            let line_loop = geo.line_loop(id)?;
            let tags = join_tags(line_loop.curves.iter().map(|c| c.tag()));
            format!("Line Loop({}) = {{{}}};", id.tag(), tags)
        }
        Entity::Surface(id) => {
            let surface = geo.surface(id)?;
            let loops = std::iter::once(surface.outer)
                .chain(surface.holes.iter().copied())
                .map(|l| l.tag());
            format!("Plane Surface({}) = {{{}}};", id.tag(), join_tags(loops))
        }
        Entity::Physical(id) => {
            let group = geo.physical(id)?;
            let (keyword, tags) = match &group.members {
                PhysicalMembers::Curves(curves) => ("Line", join_tags(curves.iter().map(|c| c.tag()))),
                PhysicalMembers::Surfaces(surfaces) => ("Surface", join_tags(surfaces.iter().map(|s| s.tag()))),
            };
            match &group.label {
                Some(label) => format!(
                    "Physical {}(\"{}\", {}) = {{{}}};",
                    keyword,
                    escape_label(label),
                    id.tag(),
                    tags
                ),
                None => format!("Physical {}({}) = {{{}}};", keyword, id.tag(), tags),
            }
        }
    };
    Ok(text)
}

/// Writes the `.geo` script to `path`, replacing any existing content.
pub fn write_geo(geo: &Geometry, path: &Path) -> Result<String, PipelineError> {
    let code = to_geo_code(geo)?;
    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(path).map_err(io_err)?;
    file.write_all(code.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;

    log::info!("Wrote {} bytes of GEO code to {}", code.len(), path.display());
    Ok(code)
}

fn join_tags(tags: impl Iterator<Item = usize>) -> String {
    tags.map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
