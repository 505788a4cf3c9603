//! Model entities and the tag-indexed store holding them.

use crate::errors::{GeoError, Result};
use crate::float_types::{Real, tolerance};
use crate::model::sweep::{Sweep, SweepId};
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Entity tag. Strictly positive; a negative tag inside a loop means "reversed".
pub type Tag = i32;

/// Topological dimension of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dim {
    Point = 0,
    Curve = 1,
    Surface = 2,
    Volume = 3,
}

impl Dim {
    pub const ALL: [Dim; 4] = [Dim::Point, Dim::Curve, Dim::Surface, Dim::Volume];

    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub const fn from_i32(dim: i32) -> Option<Dim> {
        match dim {
            0 => Some(Dim::Point),
            1 => Some(Dim::Curve),
            2 => Some(Dim::Surface),
            3 => Some(Dim::Volume),
            _ => None,
        }
    }

    pub const fn up(self) -> Option<Dim> {
        Dim::from_i32(self as i32 + 1)
    }

    pub const fn down(self) -> Option<Dim> {
        Dim::from_i32(self as i32 - 1)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dim::Point => "point",
            Dim::Curve => "curve",
            Dim::Surface => "surface",
            Dim::Volume => "volume",
        };
        f.write_str(name)
    }
}

/// `(dimension, tag)` pair addressing one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimTag {
    pub dim: Dim,
    pub tag: Tag,
}

impl DimTag {
    pub const fn new(dim: Dim, tag: Tag) -> Self {
        DimTag { dim, tag }
    }

    pub const fn point(tag: Tag) -> Self {
        Self::new(Dim::Point, tag)
    }

    pub const fn curve(tag: Tag) -> Self {
        Self::new(Dim::Curve, tag)
    }

    pub const fn surface(tag: Tag) -> Self {
        Self::new(Dim::Surface, tag)
    }

    pub const fn volume(tag: Tag) -> Self {
        Self::new(Dim::Volume, tag)
    }

    /// Same entity with a positive tag.
    pub const fn abs(self) -> Self {
        Self::new(self.dim, self.tag.abs())
    }
}

impl From<(Dim, Tag)> for DimTag {
    fn from((dim, tag): (Dim, Tag)) -> Self {
        DimTag::new(dim, tag)
    }
}

impl fmt::Display for DimTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dim.as_i32(), self.tag)
    }
}

/// How an entity came out of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Translated/rotated copy of `source` (same dimension) at the end of the sweep.
    Top { source: Tag, sweep: SweepId },
    /// Swept by `source` (one dimension lower).
    Swept { source: Tag, sweep: SweepId },
}

impl Origin {
    pub const fn sweep(&self) -> SweepId {
        match self {
            Origin::Top { sweep, .. } | Origin::Swept { sweep, .. } => *sweep,
        }
    }

    pub const fn source(&self) -> Tag {
        match self {
            Origin::Top { source, .. } | Origin::Swept { source, .. } => *source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub coords: Point3<Real>,
    /// Target element size around this point, `0` when unset.
    pub mesh_size: Real,
    pub origin: Option<Origin>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveShape {
    Line,
    /// Arc strictly smaller than π about `center`.
    CircleArc {
        center: Point3<Real>,
        center_tag: Option<Tag>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub start: Tag,
    pub end: Tag,
    pub shape: CurveShape,
    pub origin: Option<Origin>,
}

/// Closed chain of signed curve tags.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveLoop {
    pub curves: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Planar region bounded by curve loops, the first one being the outer boundary.
    Plane,
    /// Lateral surface traced by a curve during a sweep.
    Ruled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub loops: Vec<Tag>,
    pub kind: SurfaceKind,
    pub origin: Option<Origin>,
}

/// Closed shell of surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLoop {
    pub surfaces: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub shells: Vec<Tag>,
    pub origin: Option<Origin>,
}

/// Sweep angle of the arc `start -> end` about `center`.
pub fn arc_angle(start: &Point3<Real>, center: &Point3<Real>, end: &Point3<Real>) -> Real {
    (start - center).angle(&(end - center))
}

/// Point at parameter `u ∈ [0, 1]` along the arc.
pub fn arc_point(
    start: &Point3<Real>,
    center: &Point3<Real>,
    end: &Point3<Real>,
    u: Real,
) -> Point3<Real> {
    let a = start - center;
    let b = end - center;
    match Unit::try_new(a.cross(&b), tolerance() * a.norm_squared()) {
        Some(axis) => {
            let rot = Rotation3::from_axis_angle(&axis, a.angle(&b) * u);
            // blend radii so the end lands exactly on `end`
            let radius = a.norm() + (b.norm() - a.norm()) * u;
            center + (rot * a).normalize() * radius
        },
        None => start + (end - start) * u,
    }
}

/// Every entity of a model, indexed by tag, plus the sweeps that produced some of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities {
    pub(crate) points: BTreeMap<Tag, Point>,
    pub(crate) curves: BTreeMap<Tag, Curve>,
    pub(crate) curve_loops: BTreeMap<Tag, CurveLoop>,
    pub(crate) surfaces: BTreeMap<Tag, Surface>,
    pub(crate) surface_loops: BTreeMap<Tag, SurfaceLoop>,
    pub(crate) volumes: BTreeMap<Tag, Volume>,
    /// Creation order; sweep sources always precede what they produce.
    pub(crate) order: Vec<DimTag>,
    pub(crate) sweeps: Vec<Sweep>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self, dim: Dim) -> usize {
        match dim {
            Dim::Point => self.points.len(),
            Dim::Curve => self.curves.len(),
            Dim::Surface => self.surfaces.len(),
            Dim::Volume => self.volumes.len(),
        }
    }

    /// Sorted tags of every entity of `dim`.
    pub fn tags(&self, dim: Dim) -> Vec<Tag> {
        match dim {
            Dim::Point => self.points.keys().copied().collect(),
            Dim::Curve => self.curves.keys().copied().collect(),
            Dim::Surface => self.surfaces.keys().copied().collect(),
            Dim::Volume => self.volumes.keys().copied().collect(),
        }
    }

    /// Tags of `dim` in creation order.
    pub fn ordered(&self, dim: Dim) -> impl Iterator<Item = Tag> + '_ {
        self.order
            .iter()
            .filter(move |dt| dt.dim == dim)
            .map(|dt| dt.tag)
    }

    pub fn contains(&self, dimtag: DimTag) -> bool {
        let tag = dimtag.tag.abs();
        match dimtag.dim {
            Dim::Point => self.points.contains_key(&tag),
            Dim::Curve => self.curves.contains_key(&tag),
            Dim::Surface => self.surfaces.contains_key(&tag),
            Dim::Volume => self.volumes.contains_key(&tag),
        }
    }

    pub fn point(&self, tag: Tag) -> Result<&Point> {
        self.points
            .get(&tag.abs())
            .ok_or(GeoError::UnknownEntity(DimTag::point(tag.abs())))
    }

    pub fn curve(&self, tag: Tag) -> Result<&Curve> {
        self.curves
            .get(&tag.abs())
            .ok_or(GeoError::UnknownEntity(DimTag::curve(tag.abs())))
    }

    pub fn surface(&self, tag: Tag) -> Result<&Surface> {
        self.surfaces
            .get(&tag.abs())
            .ok_or(GeoError::UnknownEntity(DimTag::surface(tag.abs())))
    }

    pub fn volume(&self, tag: Tag) -> Result<&Volume> {
        self.volumes
            .get(&tag.abs())
            .ok_or(GeoError::UnknownEntity(DimTag::volume(tag.abs())))
    }

    pub fn curve_loop(&self, tag: Tag) -> Result<&CurveLoop> {
        self.curve_loops
            .get(&tag.abs())
            .ok_or(GeoError::UnknownLoop {
                dim: Dim::Curve,
                tag: tag.abs(),
            })
    }

    pub fn surface_loop(&self, tag: Tag) -> Result<&SurfaceLoop> {
        self.surface_loops
            .get(&tag.abs())
            .ok_or(GeoError::UnknownLoop {
                dim: Dim::Surface,
                tag: tag.abs(),
            })
    }

    pub fn sweep(&self, id: SweepId) -> Option<&Sweep> {
        self.sweeps.get(id)
    }

    pub fn sweeps(&self) -> &[Sweep] {
        &self.sweeps
    }

    /// Origin of an entity created by a sweep.
    pub fn origin(&self, dimtag: DimTag) -> Result<Option<Origin>> {
        Ok(match dimtag.dim {
            Dim::Point => self.point(dimtag.tag)?.origin,
            Dim::Curve => self.curve(dimtag.tag)?.origin,
            Dim::Surface => self.surface(dimtag.tag)?.origin,
            Dim::Volume => self.volume(dimtag.tag)?.origin,
        })
    }

    pub fn coords(&self, tag: Tag) -> Result<Point3<Real>> {
        Ok(self.point(tag)?.coords)
    }

    /// `(first, last)` point of a curve, swapped for a negative tag.
    pub fn oriented_endpoints(&self, signed: Tag) -> Result<(Tag, Tag)> {
        let curve = self.curve(signed)?;
        Ok(if signed < 0 {
            (curve.end, curve.start)
        } else {
            (curve.start, curve.end)
        })
    }

    /// Point at parameter `u ∈ [0, 1]` from start to end of curve `tag`.
    pub fn curve_point(&self, tag: Tag, u: Real) -> Result<Point3<Real>> {
        let curve = self.curve(tag)?;
        let start = self.coords(curve.start)?;
        let end = self.coords(curve.end)?;
        Ok(match &curve.shape {
            CurveShape::Line => start + (end - start) * u,
            CurveShape::CircleArc { center, .. } => arc_point(&start, center, &end, u),
        })
    }

    pub fn curve_length(&self, tag: Tag) -> Result<Real> {
        let curve = self.curve(tag)?;
        let start = self.coords(curve.start)?;
        let end = self.coords(curve.end)?;
        Ok(match &curve.shape {
            CurveShape::Line => (end - start).norm(),
            CurveShape::CircleArc { center, .. } => {
                (start - center).norm() * arc_angle(&start, center, &end)
            },
        })
    }

    /// Closed polyline of a curve loop, each arc sampled `arc_samples` times.
    /// The closing point is not repeated.
    pub fn loop_polyline(&self, loop_tag: Tag, arc_samples: usize) -> Result<Vec<Point3<Real>>> {
        let mut out = Vec::new();
        for &signed in &self.curve_loop(loop_tag)?.curves {
            let samples = match self.curve(signed)?.shape {
                CurveShape::Line => 1,
                CurveShape::CircleArc { .. } => arc_samples.max(1),
            };
            for i in 0..samples {
                let u = i as Real / samples as Real;
                let u = if signed < 0 { 1.0 - u } else { u };
                out.push(self.curve_point(signed.abs(), u)?);
            }
        }
        Ok(out)
    }

    /// Oriented boundary: `-start, +end` for curves, signed loop members above.
    pub fn boundary(&self, dimtag: DimTag) -> Result<Vec<DimTag>> {
        let sign = dimtag.tag.signum();
        let mut out = Vec::new();
        match dimtag.dim {
            Dim::Point => {
                self.point(dimtag.tag)?;
            },
            Dim::Curve => {
                let curve = self.curve(dimtag.tag)?;
                out.push(DimTag::point(-sign * curve.start));
                out.push(DimTag::point(sign * curve.end));
            },
            Dim::Surface => {
                for &l in &self.surface(dimtag.tag)?.loops {
                    for &c in &self.curve_loop(l)?.curves {
                        out.push(DimTag::curve(sign * c));
                    }
                }
            },
            Dim::Volume => {
                for &shell in &self.volume(dimtag.tag)?.shells {
                    for &s in &self.surface_loop(shell)?.surfaces {
                        out.push(DimTag::surface(sign * s));
                    }
                }
            },
        }
        Ok(out)
    }

    /// Every entity in the downward closure of `dimtags`, including them.
    pub fn closure(&self, dimtags: &[DimTag]) -> Result<BTreeSet<DimTag>> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<DimTag> = dimtags.iter().map(|dt| dt.abs()).collect();
        while let Some(dt) = stack.pop() {
            if !seen.insert(dt) {
                continue;
            }
            for b in self.boundary(dt)? {
                stack.push(b.abs());
            }
        }
        Ok(seen)
    }

    /// Points in the downward closure of `dimtags`.
    pub fn closure_points(&self, dimtags: &[DimTag]) -> Result<Vec<Tag>> {
        Ok(self
            .closure(dimtags)?
            .into_iter()
            .filter(|dt| dt.dim == Dim::Point)
            .map(|dt| dt.tag)
            .collect())
    }

    /// First entity still built on `dimtag`, if any: a boundary user, the
    /// top copy of a sweep, or the entity it swept.
    pub fn user_of(&self, dimtag: DimTag) -> Option<DimTag> {
        let tag = dimtag.tag.abs();
        let top_of = |o: &Option<Origin>| matches!(o, Some(Origin::Top { source, .. }) if *source == tag);
        let swept_by = |o: &Option<Origin>| matches!(o, Some(Origin::Swept { source, .. }) if *source == tag);
        match dimtag.dim {
            Dim::Point => self
                .curves
                .iter()
                .find(|(_, c)| {
                    c.start == tag
                        || c.end == tag
                        || swept_by(&c.origin)
                        || matches!(c.shape, CurveShape::CircleArc { center_tag: Some(t), .. } if t == tag)
                })
                .map(|(&t, _)| DimTag::curve(t))
                .or_else(|| {
                    self.points
                        .iter()
                        .find(|(_, p)| top_of(&p.origin))
                        .map(|(&t, _)| DimTag::point(t))
                }),
            Dim::Curve => self
                .surfaces
                .iter()
                .find(|(_, s)| {
                    swept_by(&s.origin)
                        || s.loops.iter().any(|l| {
                            self.curve_loops
                                .get(&l.abs())
                                .is_some_and(|cl| cl.curves.iter().any(|c| c.abs() == tag))
                        })
                })
                .map(|(&t, _)| DimTag::surface(t))
                .or_else(|| {
                    self.curves
                        .iter()
                        .find(|(_, c)| top_of(&c.origin))
                        .map(|(&t, _)| DimTag::curve(t))
                }),
            Dim::Surface => self
                .volumes
                .iter()
                .find(|(_, v)| {
                    swept_by(&v.origin)
                        || v.shells.iter().any(|l| {
                            self.surface_loops
                                .get(&l.abs())
                                .is_some_and(|sl| sl.surfaces.iter().any(|s| s.abs() == tag))
                        })
                })
                .map(|(&t, _)| DimTag::volume(t))
                .or_else(|| {
                    self.surfaces
                        .iter()
                        .find(|(_, s)| top_of(&s.origin))
                        .map(|(&t, _)| DimTag::surface(t))
                }),
            Dim::Volume => None,
        }
    }

    /// Axis-aligned bounds `(mins, maxs)` of every point and arc.
    pub fn bounding_box(&self) -> Option<(Point3<Real>, Point3<Real>)> {
        let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
        let mut maxs = Point3::new(Real::MIN, Real::MIN, Real::MIN);
        let mut any = false;
        let mut grow = |p: &Point3<Real>| {
            mins = mins.inf(p);
            maxs = maxs.sup(p);
            any = true;
        };
        for p in self.points.values() {
            grow(&p.coords);
        }
        for (&tag, curve) in &self.curves {
            if matches!(curve.shape, CurveShape::CircleArc { .. }) {
                for i in 1..8 {
                    if let Ok(p) = self.curve_point(tag, i as Real / 8.0) {
                        grow(&p);
                    }
                }
            }
        }
        any.then_some((mins, maxs))
    }

    /// Diagonal of the bounding box, the model's characteristic length.
    pub fn characteristic_length(&self) -> Real {
        self.bounding_box()
            .map(|(mins, maxs)| (maxs - mins).norm())
            .unwrap_or(1.0)
    }

    /// Whether `dimtag` takes part in a sweep, as a source or a product.
    pub fn in_sweep(&self, dimtag: DimTag) -> Result<bool> {
        let dimtag = dimtag.abs();
        Ok(self.origin(dimtag)?.is_some() || self.sweeps.iter().any(|s| s.involves(dimtag)))
    }

    /// Smallest unused positive tag above every existing one.
    pub fn next_tag(&self, dim: Dim) -> Tag {
        let last = match dim {
            Dim::Point => self.points.keys().next_back(),
            Dim::Curve => self.curves.keys().next_back(),
            Dim::Surface => self.surfaces.keys().next_back(),
            Dim::Volume => self.volumes.keys().next_back(),
        };
        last.map_or(1, |t| t + 1)
    }

    pub fn next_loop_tag(&self, dim: Dim) -> Tag {
        let last = match dim {
            Dim::Curve => self.curve_loops.keys().next_back(),
            _ => self.surface_loops.keys().next_back(),
        };
        last.map_or(1, |t| t + 1)
    }

    /// Unit normal of the plane through a closed polyline (Newell's method).
    pub fn newell_normal(ring: &[Point3<Real>]) -> Option<Unit<Vector3<Real>>> {
        let mut n = Vector3::zeros();
        for (i, a) in ring.iter().enumerate() {
            let b = &ring[(i + 1) % ring.len()];
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
        }
        Unit::try_new(n, Real::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::PI;
    use approx::assert_relative_eq;

    #[test]
    fn dim_steps() {
        assert_eq!(Dim::Point.up(), Some(Dim::Curve));
        assert_eq!(Dim::Volume.up(), None);
        assert_eq!(Dim::Point.down(), None);
        assert_eq!(Dim::from_i32(2), Some(Dim::Surface));
        assert_eq!(DimTag::surface(-3).abs(), DimTag::surface(3));
        assert_eq!(DimTag::volume(1).to_string(), "(3, 1)");
    }

    #[test]
    fn arc_midpoint_stays_on_circle() {
        let c = Point3::origin();
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::new(0.0, 1.0, 0.0);
        let m = arc_point(&a, &c, &b, 0.5);
        assert_relative_eq!(m.coords.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.x, m.y, epsilon = 1e-12);
        assert_relative_eq!(arc_angle(&a, &c, &b), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(arc_point(&a, &c, &b, 1.0), b, epsilon = 1e-12);
    }

    #[test]
    fn newell_normal_of_ccw_square() {
        let ring = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = Entities::newell_normal(&ring).unwrap();
        assert_relative_eq!(n.into_inner(), Vector3::z(), epsilon = 1e-12);
    }
}
