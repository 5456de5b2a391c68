// src/geometry/mod.rs

//! In-memory description of a planar gmsh geometry.
//!
//! Entities are appended through the `add_*` operations and are never mutated
//! or removed afterwards. Every operation returns an opaque handle that later
//! operations use to refer back to the entity, mirroring how tags work in a
//! `.geo` script.

pub mod shapes;

use nalgebra::Point3;
use std::f64::consts::PI;
use thiserror::Error;

/// Relative tolerance used when comparing the two radii of a circle arc.
const ARC_RADIUS_TOLERANCE: f64 = 1e-9;

/// Errors raised while building a geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("unknown {kind} handle #{tag}")]
    UnknownHandle { kind: &'static str, tag: usize },

    #[error("coordinate ({x}, {y}, {z}) is not finite")]
    NonFiniteCoordinate { x: f64, y: f64, z: f64 },

    #[error("mesh size must be finite and positive, got {0}")]
    InvalidMeshSize(f64),

    #[error("line starts and ends at point #{0}")]
    DegenerateLine(usize),

    #[error("arc endpoint coincides with its center point #{0}")]
    DegenerateArc(usize),

    #[error("arc radii differ: start is {start_radius}, end is {end_radius}")]
    ArcRadiusMismatch { start_radius: f64, end_radius: f64 },

    #[error("arc spans {angle} rad; circle arcs must be strictly less than pi")]
    ArcTooWide { angle: f64 },

    #[error("line loop has no curves")]
    EmptyLoop,

    #[error("curve at position {position} does not end where the next curve starts")]
    DisconnectedLoop { position: usize },

    #[error("line loop does not close: last curve ends at point #{end}, first starts at point #{start}")]
    OpenLoop { start: usize, end: usize },

    #[error("line loop #{0} is used more than once in the same surface")]
    DuplicateHole(usize),

    #[error("physical group has no members")]
    EmptyPhysicalGroup,
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// The 1-based tag this entity carries in the emitted script.
            pub fn tag(self) -> usize {
                self.0 + 1
            }

            fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to a point.
    PointId
);
handle!(
    /// Handle to a line or a circle arc. Both live in gmsh's curve tag space.
    CurveId
);
handle!(
    /// Handle to a closed line loop.
    LoopId
);
handle!(
    /// Handle to a plane surface.
    SurfaceId
);
handle!(
    /// Handle to a physical group.
    PhysicalId
);

/// A point with its local target mesh size.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub coords: Point3<f64>,
    pub mesh_size: f64,
}

/// A straight line or a circle arc between two points.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    Line { start: PointId, end: PointId },
    Arc { start: PointId, center: PointId, end: PointId },
}

impl Curve {
    /// Returns the (start, end) points of the curve.
    pub fn endpoints(&self) -> (PointId, PointId) {
        match *self {
            Curve::Line { start, end } => (start, end),
            Curve::Arc { start, end, .. } => (start, end),
        }
    }
}

/// An ordered, closed chain of curves.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLoop {
    pub curves: Vec<CurveId>,
}

/// A region bounded by an outer loop, with zero or more holes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneSurface {
    pub outer: LoopId,
    pub holes: Vec<LoopId>,
}

/// The members of a physical group. A group holds entities of one dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalMembers {
    Curves(Vec<CurveId>),
    Surfaces(Vec<SurfaceId>),
}

impl PhysicalMembers {
    pub fn len(&self) -> usize {
        match self {
            PhysicalMembers::Curves(c) => c.len(),
            PhysicalMembers::Surfaces(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<CurveId>> for PhysicalMembers {
    fn from(curves: Vec<CurveId>) -> Self {
        PhysicalMembers::Curves(curves)
    }
}

impl From<&[CurveId]> for PhysicalMembers {
    fn from(curves: &[CurveId]) -> Self {
        PhysicalMembers::Curves(curves.to_vec())
    }
}

impl From<SurfaceId> for PhysicalMembers {
    fn from(surface: SurfaceId) -> Self {
        PhysicalMembers::Surfaces(vec![surface])
    }
}

/// A named tag over a set of curves or surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalGroup {
    pub label: Option<String>,
    pub members: PhysicalMembers,
}

/// One created entity, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Point(PointId),
    Curve(CurveId),
    Loop(LoopId),
    Surface(SurfaceId),
    Physical(PhysicalId),
}

/// Accumulates geometric primitives for one `.geo` script.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    points: Vec<Point>,
    curves: Vec<Curve>,
    loops: Vec<LineLoop>,
    surfaces: Vec<PlaneSurface>,
    physicals: Vec<PhysicalGroup>,
    order: Vec<Entity>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point with a local mesh-size hint.
    pub fn add_point(&mut self, coords: [f64; 3], mesh_size: f64) -> Result<PointId, GeometryError> {
        let [x, y, z] = coords;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { x, y, z });
        }
        if !(mesh_size.is_finite() && mesh_size > 0.0) {
            return Err(GeometryError::InvalidMeshSize(mesh_size));
        }

        let id = PointId(self.points.len());
        self.points.push(Point {
            coords: Point3::new(x, y, z),
            mesh_size,
        });
        self.order.push(Entity::Point(id));
        Ok(id)
    }

    /// Adds a straight line from `start` to `end`.
    pub fn add_line(&mut self, start: PointId, end: PointId) -> Result<CurveId, GeometryError> {
        self.point(start)?;
        self.point(end)?;
        if start == end {
            return Err(GeometryError::DegenerateLine(start.tag()));
        }
        Ok(self.push_curve(Curve::Line { start, end }))
    }

    /// Adds a circle arc from `start` to `end` around `center`.
    ///
    /// Both endpoints must lie at the same distance from the center and the
    /// arc must span less than half a turn, which is what gmsh accepts for
    /// `Circle` entities.
    pub fn add_circle_arc(&mut self, start: PointId, center: PointId, end: PointId) -> Result<CurveId, GeometryError> {
        let c = self.point(center)?.coords;
        let s = self.point(start)?.coords - c;
        let e = self.point(end)?.coords - c;

        let (start_radius, end_radius) = (s.norm(), e.norm());
        if start_radius == 0.0 {
            return Err(GeometryError::DegenerateArc(center.tag()));
        }
        if end_radius == 0.0 {
            return Err(GeometryError::DegenerateArc(center.tag()));
        }
        if (start_radius - end_radius).abs() > ARC_RADIUS_TOLERANCE * start_radius.max(end_radius) {
            return Err(GeometryError::ArcRadiusMismatch { start_radius, end_radius });
        }

        let angle = s.cross(&e).norm().atan2(s.dot(&e));
        if angle >= PI - 1e-12 {
            return Err(GeometryError::ArcTooWide { angle });
        }

        Ok(self.push_curve(Curve::Arc { start, center, end }))
    }

    /// Adds a closed loop made of `curves`, in order.
    pub fn add_line_loop(&mut self, curves: &[CurveId]) -> Result<LoopId, GeometryError> {
        if curves.is_empty() {
            return Err(GeometryError::EmptyLoop);
        }
        let ends = curves
            .iter()
            .map(|&c| self.curve(c).map(Curve::endpoints))
            .collect::<Result<Vec<_>, _>>()?;

        let n = ends.len();
        for i in 0..n - 1 {
            if ends[i].1 != ends[i + 1].0 {
                return Err(GeometryError::DisconnectedLoop { position: i });
            }
        }
        if ends[n - 1].1 != ends[0].0 {
            return Err(GeometryError::OpenLoop {
                start: ends[0].0.tag(),
                end: ends[n - 1].1.tag(),
            });
        }

        let id = LoopId(self.loops.len());
        self.loops.push(LineLoop { curves: curves.to_vec() });
        self.order.push(Entity::Loop(id));
        Ok(id)
    }

    /// Adds a plane surface bounded by `outer` with the given holes.
    ///
    /// Holes are assumed to lie inside the outer loop and not to overlap each
    /// other; only their identity is checked here.
    pub fn add_plane_surface(&mut self, outer: LoopId, holes: &[LoopId]) -> Result<SurfaceId, GeometryError> {
        self.line_loop(outer)?;
        for (i, &hole) in holes.iter().enumerate() {
            self.line_loop(hole)?;
            if hole == outer || holes[..i].contains(&hole) {
                return Err(GeometryError::DuplicateHole(hole.tag()));
            }
        }

        let id = SurfaceId(self.surfaces.len());
        self.surfaces.push(PlaneSurface {
            outer,
            holes: holes.to_vec(),
        });
        self.order.push(Entity::Surface(id));
        Ok(id)
    }

    /// Groups curves or surfaces under one physical tag.
    pub fn add_physical(
        &mut self,
        members: impl Into<PhysicalMembers>,
        label: Option<&str>,
    ) -> Result<PhysicalId, GeometryError> {
        let members = members.into();
        if members.is_empty() {
            return Err(GeometryError::EmptyPhysicalGroup);
        }
        match &members {
            PhysicalMembers::Curves(curves) => {
                for &c in curves {
                    self.curve(c)?;
                }
            }
            PhysicalMembers::Surfaces(surfaces) => {
                for &s in surfaces {
                    self.surface(s)?;
                }
            }
        }

        let id = PhysicalId(self.physicals.len());
        self.physicals.push(PhysicalGroup {
            label: label.map(str::to_string),
            members,
        });
        self.order.push(Entity::Physical(id));
        Ok(id)
    }

    /// All entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.order
    }

    pub fn point(&self, id: PointId) -> Result<&Point, GeometryError> {
        self.points.get(id.index()).ok_or(GeometryError::UnknownHandle { kind: "point", tag: id.tag() })
    }

    pub fn curve(&self, id: CurveId) -> Result<&Curve, GeometryError> {
        self.curves.get(id.index()).ok_or(GeometryError::UnknownHandle { kind: "curve", tag: id.tag() })
    }

    pub fn line_loop(&self, id: LoopId) -> Result<&LineLoop, GeometryError> {
        self.loops.get(id.index()).ok_or(GeometryError::UnknownHandle { kind: "line loop", tag: id.tag() })
    }

    pub fn surface(&self, id: SurfaceId) -> Result<&PlaneSurface, GeometryError> {
        self.surfaces.get(id.index()).ok_or(GeometryError::UnknownHandle { kind: "surface", tag: id.tag() })
    }

    pub fn physical(&self, id: PhysicalId) -> Result<&PhysicalGroup, GeometryError> {
        self.physicals.get(id.index()).ok_or(GeometryError::UnknownHandle { kind: "physical group", tag: id.tag() })
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn physical_count(&self) -> usize {
        self.physicals.len()
    }

    fn push_curve(&mut self, curve: Curve) -> CurveId {
        let id = CurveId(self.curves.len());
        self.curves.push(curve);
        self.order.push(Entity::Curve(id));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(geo: &mut Geometry) -> (Vec<PointId>, Vec<CurveId>) {
        let coords = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let points: Vec<_> = coords.iter().map(|&c| geo.add_point(c, 0.01).unwrap()).collect();
        let lines = (0..4).map(|n| geo.add_line(points[n], points[(n + 1) % 4]).unwrap()).collect();
        (points, lines)
    }

    #[test]
    fn test_handles_follow_creation_order() {
        let mut geo = Geometry::new();
        let (points, lines) = unit_square(&mut geo);

        assert_eq!(points.iter().map(|p| p.tag()).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(lines.iter().map(|l| l.tag()).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(geo.entities().len(), 8);
        assert_eq!(geo.entities()[0], Entity::Point(points[0]));
        assert_eq!(geo.entities()[4], Entity::Curve(lines[0]));
    }

    #[test]
    fn test_lines_and_arcs_share_curve_tags() {
        let mut geo = Geometry::new();
        let (_, lines) = unit_square(&mut geo);
        let center = geo.add_point([0.5, 0.5, 0.0], 0.01).unwrap();
        let a = geo.add_point([0.75, 0.5, 0.0], 0.01).unwrap();
        let b = geo.add_point([0.5, 0.75, 0.0], 0.01).unwrap();
        let arc = geo.add_circle_arc(a, center, b).unwrap();

        assert_eq!(arc.tag(), lines.len() + 1);
        assert_eq!(geo.curve_count(), 5);
        assert_eq!(geo.curve(arc).unwrap().endpoints(), (a, b));
    }

    #[test]
    fn test_closed_loop_is_accepted() {
        let mut geo = Geometry::new();
        let (_, lines) = unit_square(&mut geo);
        let line_loop = geo.add_line_loop(&lines).unwrap();
        assert_eq!(geo.line_loop(line_loop).unwrap().curves, lines);
    }

    #[test]
    fn test_open_loop_is_rejected() {
        let mut geo = Geometry::new();
        let (_, lines) = unit_square(&mut geo);
        let result = geo.add_line_loop(&lines[..3]);
        assert_eq!(result, Err(GeometryError::OpenLoop { start: 1, end: 4 }));
        assert_eq!(geo.loop_count(), 0);
    }

    #[test]
    fn test_disconnected_loop_is_rejected() {
        let mut geo = Geometry::new();
        let (_, lines) = unit_square(&mut geo);
        let shuffled = [lines[0], lines[2], lines[1], lines[3]];
        assert_eq!(geo.add_line_loop(&shuffled), Err(GeometryError::DisconnectedLoop { position: 0 }));
        assert_eq!(geo.add_line_loop(&[]), Err(GeometryError::EmptyLoop));
    }

    #[test]
    fn test_invalid_points_are_rejected() {
        let mut geo = Geometry::new();
        assert_eq!(geo.add_point([0.0, 0.0, 0.0], 0.0), Err(GeometryError::InvalidMeshSize(0.0)));
        assert!(matches!(
            geo.add_point([f64::NAN, 0.0, 0.0], 0.1),
            Err(GeometryError::NonFiniteCoordinate { .. })
        ));
        assert_eq!(geo.point_count(), 0);
    }

    #[test]
    fn test_degenerate_line_is_rejected() {
        let mut geo = Geometry::new();
        let p = geo.add_point([0.0, 0.0, 0.0], 0.1).unwrap();
        assert_eq!(geo.add_line(p, p), Err(GeometryError::DegenerateLine(1)));
    }

    #[test]
    fn test_unknown_handle_is_rejected() {
        let mut other = Geometry::new();
        let (_, lines) = unit_square(&mut other);

        let mut geo = Geometry::new();
        let p = geo.add_point([0.0, 0.0, 0.0], 0.1).unwrap();
        let foreign = other.add_point([2.0, 0.0, 0.0], 0.1).unwrap();

        assert_eq!(
            geo.add_line(p, foreign),
            Err(GeometryError::UnknownHandle { kind: "point", tag: 5 })
        );
        assert_eq!(
            geo.add_physical(lines, None),
            Err(GeometryError::UnknownHandle { kind: "curve", tag: 1 })
        );
    }

    #[test]
    fn test_arc_validation() {
        let mut geo = Geometry::new();
        let center = geo.add_point([0.0, 0.0, 0.0], 0.1).unwrap();
        let east = geo.add_point([1.0, 0.0, 0.0], 0.1).unwrap();
        let west = geo.add_point([-1.0, 0.0, 0.0], 0.1).unwrap();
        let far = geo.add_point([0.0, 2.0, 0.0], 0.1).unwrap();

        assert!(matches!(geo.add_circle_arc(east, center, west), Err(GeometryError::ArcTooWide { .. })));
        assert!(matches!(
            geo.add_circle_arc(east, center, far),
            Err(GeometryError::ArcRadiusMismatch { .. })
        ));
        assert_eq!(geo.add_circle_arc(center, center, east), Err(GeometryError::DegenerateArc(1)));
        assert_eq!(geo.curve_count(), 0);
    }

    #[test]
    fn test_surface_holes_must_be_distinct() {
        let mut geo = Geometry::new();
        let (_, lines) = unit_square(&mut geo);
        let outer = geo.add_line_loop(&lines).unwrap();

        assert_eq!(geo.add_plane_surface(outer, &[outer]), Err(GeometryError::DuplicateHole(1)));

        let surface = geo.add_plane_surface(outer, &[]).unwrap();
        assert!(geo.surface(surface).unwrap().holes.is_empty());
    }

    #[test]
    fn test_physical_groups() {
        let mut geo = Geometry::new();
        let (_, lines) = unit_square(&mut geo);
        let outer = geo.add_line_loop(&lines).unwrap();
        let surface = geo.add_plane_surface(outer, &[]).unwrap();

        let boundary = geo.add_physical(&lines[..2], Some("inlet")).unwrap();
        let domain = geo.add_physical(surface, None).unwrap();

        assert_eq!(boundary.tag(), 1);
        assert_eq!(domain.tag(), 2);
        assert_eq!(geo.physical(boundary).unwrap().label.as_deref(), Some("inlet"));
        assert_eq!(geo.physical(domain).unwrap().members, PhysicalMembers::Surfaces(vec![surface]));
        assert_eq!(geo.add_physical(Vec::<CurveId>::new(), None), Err(GeometryError::EmptyPhysicalGroup));
    }
}
