//! The built-in geometry kernel.
//!
//! Entities are added by tag into a staging area; nothing is visible to the
//! mesher until [`Model::synchronize`](crate::model::Model::synchronize)
//! publishes them.

use crate::errors::{GeoError, Result};
use crate::float_types::{PI, Real, scaled_tolerance, tolerance};
use crate::model::entity::{
    Curve, CurveLoop, CurveShape, Dim, DimTag, Entities, Origin, Point, Surface, SurfaceKind,
    SurfaceLoop, Tag, Volume, arc_angle,
};
use crate::model::sweep::{Sweep, SweepId, SweepOptions, Transform};
use hashbrown::HashMap;
use log::debug;
use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Relative mismatch allowed between the start and end radius of an arc.
const ARC_RADIUS_RTOL: Real = 1e-6;

/// Relative distance a plane surface boundary may stray from its plane.
const PLANARITY_RTOL: Real = 1e-6;

/// Samples per arc when checking planarity.
const ARC_SAMPLES: usize = 4;

/// Staging area for model entities.
#[derive(Debug, Clone, Default)]
pub struct GeoKernel {
    entities: Entities,
    dirty: bool,
}

impl GeoKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    /// `true` when something changed since the last synchronization.
    pub const fn has_pending_changes(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_synchronized(&mut self) {
        self.dirty = false;
    }

    fn claim_tag(&self, dim: Dim, tag: Option<Tag>) -> Result<Tag> {
        match tag {
            None => Ok(self.entities.next_tag(dim)),
            Some(t) if t <= 0 => Err(GeoError::InvalidTag(dim, t)),
            Some(t) if self.entities.contains(DimTag::new(dim, t)) => {
                Err(GeoError::DuplicateTag(DimTag::new(dim, t)))
            },
            Some(t) => Ok(t),
        }
    }

    fn claim_loop_tag(&self, dim: Dim, tag: Option<Tag>) -> Result<Tag> {
        let taken = |t: &Tag| match dim {
            Dim::Curve => self.entities.curve_loops.contains_key(t),
            _ => self.entities.surface_loops.contains_key(t),
        };
        match tag {
            None => Ok(self.entities.next_loop_tag(dim)),
            Some(t) if t <= 0 => Err(GeoError::InvalidTag(dim, t)),
            Some(t) if taken(&t) => Err(GeoError::DuplicateTag(DimTag::new(dim, t))),
            Some(t) => Ok(t),
        }
    }

    fn created(&mut self, dimtag: DimTag) -> DimTag {
        debug!("geo: added {} {}", dimtag.dim, dimtag.tag);
        self.entities.order.push(dimtag);
        self.dirty = true;
        dimtag
    }

    /// Add a point with a target mesh size (`0` for none). Returns its tag.
    pub fn add_point(
        &mut self,
        x: Real,
        y: Real,
        z: Real,
        mesh_size: Real,
        tag: Option<Tag>,
    ) -> Result<Tag> {
        let coords = Point3::new(x, y, z);
        if !coords.iter().all(|c| c.is_finite()) {
            return Err(GeoError::InvalidCoordinate(coords));
        }
        if !mesh_size.is_finite() || mesh_size < 0.0 {
            return Err(GeoError::InvalidMeshSize(mesh_size));
        }
        let tag = self.claim_tag(Dim::Point, tag)?;
        self.insert_point(
            tag,
            Point {
                coords,
                mesh_size,
                origin: None,
            },
        );
        Ok(tag)
    }

    fn insert_point(&mut self, tag: Tag, point: Point) -> Tag {
        self.entities.points.insert(tag, point);
        self.created(DimTag::point(tag)).tag
    }

    /// Straight segment between two existing points.
    pub fn add_line(&mut self, start: Tag, end: Tag, tag: Option<Tag>) -> Result<Tag> {
        let a = self.entities.coords(start)?;
        let b = self.entities.coords(end)?;
        if start.abs() == end.abs() || (b - a).norm() <= tolerance() {
            return Err(GeoError::DegenerateCurve(a));
        }
        let tag = self.claim_tag(Dim::Curve, tag)?;
        Ok(self.insert_curve(
            tag,
            Curve {
                start: start.abs(),
                end: end.abs(),
                shape: CurveShape::Line,
                origin: None,
            },
        ))
    }

    /// Circle arc from `start` to `end` about the point `center`, sweeping
    /// strictly less than π.
    pub fn add_circle_arc(
        &mut self,
        start: Tag,
        center: Tag,
        end: Tag,
        tag: Option<Tag>,
    ) -> Result<Tag> {
        let a = self.entities.coords(start)?;
        let c = self.entities.coords(center)?;
        let b = self.entities.coords(end)?;
        Self::check_arc(&a, &c, &b)?;
        if start.abs() == end.abs() {
            return Err(GeoError::DegenerateCurve(a));
        }
        let tag = self.claim_tag(Dim::Curve, tag)?;
        Ok(self.insert_curve(
            tag,
            Curve {
                start: start.abs(),
                end: end.abs(),
                shape: CurveShape::CircleArc {
                    center: c,
                    center_tag: Some(center.abs()),
                },
                origin: None,
            },
        ))
    }

    fn check_arc(a: &Point3<Real>, c: &Point3<Real>, b: &Point3<Real>) -> Result<()> {
        let ra = (a - c).norm();
        let rb = (b - c).norm();
        if ra <= tolerance() || rb <= tolerance() || (b - a).norm() <= tolerance() {
            return Err(GeoError::DegenerateCurve(*a));
        }
        if (ra - rb).abs() > ARC_RADIUS_RTOL * ra.max(rb) {
            return Err(GeoError::ArcRadiusMismatch { start: ra, end: rb });
        }
        let angle = arc_angle(a, c, b);
        if angle >= PI - tolerance() {
            return Err(GeoError::ArcTooWide(angle));
        }
        Ok(())
    }

    fn insert_curve(&mut self, tag: Tag, curve: Curve) -> Tag {
        self.entities.curves.insert(tag, curve);
        self.created(DimTag::curve(tag)).tag
    }

    /// Closed loop of signed curve tags. Curves given out of order or with the
    /// wrong orientation are chained into a closed ring when possible.
    pub fn add_curve_loop(&mut self, curves: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        let ordered = self.chain_curves(curves)?;
        let tag = self.claim_loop_tag(Dim::Curve, tag)?;
        self.entities
            .curve_loops
            .insert(tag, CurveLoop { curves: ordered });
        self.dirty = true;
        debug!("geo: added curve loop {tag}");
        Ok(tag)
    }

    fn chain_curves(&self, curves: &[Tag]) -> Result<Vec<Tag>> {
        let Some(&first) = curves.first() else {
            return Err(GeoError::EmptyLoop(Dim::Curve));
        };
        for &c in curves {
            if c == 0 {
                return Err(GeoError::InvalidTag(Dim::Curve, c));
            }
            self.entities.curve(c)?;
        }
        if self.is_closed_chain(curves)? {
            return Ok(curves.to_vec());
        }

        let mut remaining: Vec<Tag> = curves[1..].to_vec();
        let mut chain = vec![first];
        let (loop_start, mut cursor) = self.entities.oriented_endpoints(first)?;
        while !remaining.is_empty() {
            let mut next = None;
            for (i, &c) in remaining.iter().enumerate() {
                let (s, e) = self.entities.oriented_endpoints(c.abs())?;
                if s == cursor {
                    next = Some((i, c.abs(), e));
                    break;
                }
                if e == cursor {
                    next = Some((i, -c.abs(), s));
                    break;
                }
            }
            let Some((i, signed, end)) = next else {
                return Err(GeoError::LoopNotClosed(remaining[0].abs()));
            };
            remaining.swap_remove(i);
            chain.push(signed);
            cursor = end;
        }
        if cursor != loop_start {
            return Err(GeoError::LoopNotClosed(chain[chain.len() - 1].abs()));
        }
        Ok(chain)
    }

    fn is_closed_chain(&self, curves: &[Tag]) -> Result<bool> {
        for (i, &c) in curves.iter().enumerate() {
            let next = curves[(i + 1) % curves.len()];
            let (_, end) = self.entities.oriented_endpoints(c)?;
            let (start, _) = self.entities.oriented_endpoints(next)?;
            if end != start {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Plane surface bounded by `loops`; the first loop is the outer boundary,
    /// the others are holes.
    pub fn add_plane_surface(&mut self, loops: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        if loops.is_empty() {
            return Err(GeoError::EmptyLoop(Dim::Curve));
        }
        let loops: Vec<Tag> = loops.iter().map(|l| l.abs()).collect();
        self.check_planar(&loops)?;
        let tag = self.claim_tag(Dim::Surface, tag)?;
        Ok(self.insert_surface(
            tag,
            Surface {
                loops,
                kind: SurfaceKind::Plane,
                origin: None,
            },
        ))
    }

    fn check_planar(&self, loops: &[Tag]) -> Result<()> {
        let outer = self.entities.loop_polyline(loops[0], ARC_SAMPLES)?;
        let mut all = outer.clone();
        for &hole in &loops[1..] {
            all.extend(self.entities.loop_polyline(hole, ARC_SAMPLES)?);
        }
        let Some(normal) = Entities::newell_normal(&outer) else {
            return Err(GeoError::NonPlanarSurface(outer[0]));
        };
        let size = self.entities.characteristic_length();
        let offset = normal.dot(&outer[0].coords);
        for p in &all {
            if (normal.dot(&p.coords) - offset).abs() > PLANARITY_RTOL * size {
                return Err(GeoError::NonPlanarSurface(*p));
            }
        }
        Ok(())
    }

    fn insert_surface(&mut self, tag: Tag, surface: Surface) -> Tag {
        self.entities.surfaces.insert(tag, surface);
        self.created(DimTag::surface(tag)).tag
    }

    /// Closed shell of surfaces: every bounding curve must be shared by
    /// exactly two of them.
    pub fn add_surface_loop(&mut self, surfaces: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        if surfaces.is_empty() {
            return Err(GeoError::EmptyLoop(Dim::Surface));
        }
        let mut uses: HashMap<Tag, usize> = HashMap::new();
        for &s in surfaces {
            for c in self.entities.boundary(DimTag::surface(s.abs()))? {
                *uses.entry(c.tag.abs()).or_insert(0) += 1;
            }
        }
        if let Some((&curve, _)) = uses.iter().filter(|&(_, &n)| n != 2).min_by_key(|(t, _)| **t) {
            return Err(GeoError::ShellNotClosed(curve));
        }
        let tag = self.claim_loop_tag(Dim::Surface, tag)?;
        self.entities.surface_loops.insert(
            tag,
            SurfaceLoop {
                surfaces: surfaces.iter().map(|s| s.abs()).collect(),
            },
        );
        self.dirty = true;
        debug!("geo: added surface loop {tag}");
        Ok(tag)
    }

    /// Volume bounded by surface loops; the first is the outer shell.
    pub fn add_volume(&mut self, shells: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        if shells.is_empty() {
            return Err(GeoError::EmptyLoop(Dim::Surface));
        }
        for &s in shells {
            self.entities.surface_loop(s)?;
        }
        let tag = self.claim_tag(Dim::Volume, tag)?;
        Ok(self.insert_volume(
            tag,
            Volume {
                shells: shells.iter().map(|s| s.abs()).collect(),
                origin: None,
            },
        ))
    }

    fn insert_volume(&mut self, tag: Tag, volume: Volume) -> Tag {
        self.entities.volumes.insert(tag, volume);
        self.created(DimTag::volume(tag)).tag
    }

    /// Extrude entities along `(dx, dy, dz)`.
    ///
    /// For every input the output holds, in order: the top entity, the swept
    /// entity one dimension up, then the lateral entities swept by each
    /// boundary entity of the input.
    pub fn extrude(
        &mut self,
        dimtags: &[DimTag],
        dx: Real,
        dy: Real,
        dz: Real,
        options: SweepOptions,
    ) -> Result<Vec<DimTag>> {
        let transform = Transform::translation(dx, dy, dz)?;
        self.sweep(dimtags, transform, options)
    }

    /// Revolve entities by `angle` about the axis through `(x, y, z)` with
    /// direction `(ax, ay, az)`. Output is ordered like [`Self::extrude`].
    #[allow(clippy::too_many_arguments)]
    pub fn revolve(
        &mut self,
        dimtags: &[DimTag],
        x: Real,
        y: Real,
        z: Real,
        ax: Real,
        ay: Real,
        az: Real,
        angle: Real,
        options: SweepOptions,
    ) -> Result<Vec<DimTag>> {
        let transform = Transform::rotation(Point3::new(x, y, z), Vector3::new(ax, ay, az), angle)?;
        self.sweep(dimtags, transform, options)
    }

    fn sweep(
        &mut self,
        dimtags: &[DimTag],
        transform: Transform,
        options: SweepOptions,
    ) -> Result<Vec<DimTag>> {
        if dimtags.is_empty() {
            return Ok(Vec::new());
        }
        let closure = self.entities.closure(dimtags)?;
        if let Some(volume) = closure.iter().find(|dt| dt.dim == Dim::Volume) {
            return Err(GeoError::Unsupported {
                operation: "extrusion",
                dim: volume.dim,
            });
        }
        let source_points: Vec<Tag> = closure
            .iter()
            .filter(|dt| dt.dim == Dim::Point)
            .map(|dt| dt.tag)
            .collect();
        for &p in &source_points {
            let coords = self.entities.coords(p)?;
            if let Some(foot) = transform.axis_projection(&coords) {
                let size = self.entities.characteristic_length();
                if (coords - foot).norm() <= scaled_tolerance(size) {
                    return Err(GeoError::InvalidSweep(format!(
                        "point {p} lies on the rotation axis"
                    )));
                }
            }
        }

        let id = self.entities.sweeps.len();
        self.entities.sweeps.push(Sweep {
            id,
            transform,
            layers: options.layers,
            recombine: options.recombine,
            sources: closure.iter().copied().collect(),
            source_points,
        });

        let mut memo = HashMap::new();
        let mut out = Vec::new();
        for &dt in dimtags {
            let dt = dt.abs();
            let (top, swept) = self.sweep_entity(dt, id, &mut memo)?;
            out.push(top);
            out.push(swept);
            for b in self.entities.boundary(dt)? {
                let (_, lateral) = self.sweep_entity(b.abs(), id, &mut memo)?;
                out.push(lateral);
            }
        }
        debug!("geo: sweep {id} produced {} entities", out.len());
        Ok(out)
    }

    /// Sweep one entity, returning `(top, swept)`. Shared boundaries are
    /// swept once per call through `memo`.
    fn sweep_entity(
        &mut self,
        dt: DimTag,
        id: SweepId,
        memo: &mut HashMap<DimTag, (DimTag, DimTag)>,
    ) -> Result<(DimTag, DimTag)> {
        if let Some(&done) = memo.get(&dt) {
            return Ok(done);
        }
        let transform = self.entities.sweeps[id].transform.clone();
        let result = match dt.dim {
            Dim::Point => {
                let point = self.entities.point(dt.tag)?.clone();
                let top_coords = transform.apply(&point.coords, 1.0);
                let top_tag = self.entities.next_tag(Dim::Point);
                self.insert_point(
                    top_tag,
                    Point {
                        coords: top_coords,
                        mesh_size: point.mesh_size,
                        origin: Some(Origin::Top {
                            source: dt.tag,
                            sweep: id,
                        }),
                    },
                );
                let shape = match transform.axis_projection(&point.coords) {
                    Some(center) => CurveShape::CircleArc {
                        center,
                        center_tag: None,
                    },
                    None => CurveShape::Line,
                };
                let line_tag = self.entities.next_tag(Dim::Curve);
                self.insert_curve(
                    line_tag,
                    Curve {
                        start: dt.tag,
                        end: top_tag,
                        shape,
                        origin: Some(Origin::Swept {
                            source: dt.tag,
                            sweep: id,
                        }),
                    },
                );
                (DimTag::point(top_tag), DimTag::curve(line_tag))
            },
            Dim::Curve => {
                let curve = self.entities.curve(dt.tag)?.clone();
                let (top_start, side_start) =
                    self.sweep_entity(DimTag::point(curve.start), id, memo)?;
                let (top_end, side_end) = self.sweep_entity(DimTag::point(curve.end), id, memo)?;
                let shape = match curve.shape {
                    CurveShape::Line => CurveShape::Line,
                    CurveShape::CircleArc { center, .. } => CurveShape::CircleArc {
                        center: transform.apply(&center, 1.0),
                        center_tag: None,
                    },
                };
                let top_tag = self.entities.next_tag(Dim::Curve);
                self.insert_curve(
                    top_tag,
                    Curve {
                        start: top_start.tag,
                        end: top_end.tag,
                        shape,
                        origin: Some(Origin::Top {
                            source: dt.tag,
                            sweep: id,
                        }),
                    },
                );
                let loop_tag = self.entities.next_loop_tag(Dim::Curve);
                self.entities.curve_loops.insert(
                    loop_tag,
                    CurveLoop {
                        curves: vec![dt.tag, side_end.tag, -top_tag, -side_start.tag],
                    },
                );
                let surface_tag = self.entities.next_tag(Dim::Surface);
                self.insert_surface(
                    surface_tag,
                    Surface {
                        loops: vec![loop_tag],
                        kind: SurfaceKind::Ruled,
                        origin: Some(Origin::Swept {
                            source: dt.tag,
                            sweep: id,
                        }),
                    },
                );
                (DimTag::curve(top_tag), DimTag::surface(surface_tag))
            },
            Dim::Surface => {
                let surface = self.entities.surface(dt.tag)?.clone();
                let mut top_loops = Vec::with_capacity(surface.loops.len());
                let mut laterals = Vec::new();
                for &l in &surface.loops {
                    let curves = self.entities.curve_loop(l)?.curves.clone();
                    let mut top_curves = Vec::with_capacity(curves.len());
                    for c in curves {
                        let (top, lateral) = self.sweep_entity(DimTag::curve(c.abs()), id, memo)?;
                        top_curves.push(c.signum() * top.tag);
                        laterals.push(lateral.tag);
                    }
                    let loop_tag = self.entities.next_loop_tag(Dim::Curve);
                    self.entities
                        .curve_loops
                        .insert(loop_tag, CurveLoop { curves: top_curves });
                    top_loops.push(loop_tag);
                }
                let top_tag = self.entities.next_tag(Dim::Surface);
                self.insert_surface(
                    top_tag,
                    Surface {
                        loops: top_loops,
                        kind: surface.kind,
                        origin: Some(Origin::Top {
                            source: dt.tag,
                            sweep: id,
                        }),
                    },
                );
                let mut shell = vec![dt.tag, top_tag];
                shell.extend(laterals);
                let shell_tag = self.entities.next_loop_tag(Dim::Surface);
                self.entities
                    .surface_loops
                    .insert(shell_tag, SurfaceLoop { surfaces: shell });
                let volume_tag = self.entities.next_tag(Dim::Volume);
                self.insert_volume(
                    volume_tag,
                    Volume {
                        shells: vec![shell_tag],
                        origin: Some(Origin::Swept {
                            source: dt.tag,
                            sweep: id,
                        }),
                    },
                );
                (DimTag::surface(top_tag), DimTag::volume(volume_tag))
            },
            Dim::Volume => {
                return Err(GeoError::Unsupported {
                    operation: "extrusion",
                    dim: Dim::Volume,
                });
            },
        };
        memo.insert(dt, result);
        Ok(result)
    }

    /// Translate entities (and everything they are built on, arc centre
    /// points included) in place.
    pub fn translate(&mut self, dimtags: &[DimTag], dx: Real, dy: Real, dz: Real) -> Result<()> {
        let vector = Vector3::new(dx, dy, dz);
        self.move_rigidly(dimtags, "translation", |p| p + vector)
    }

    /// Rotate entities in place by `angle` about the axis through `(x, y, z)`
    /// with direction `(ax, ay, az)`. Any angle is accepted here.
    #[allow(clippy::too_many_arguments)]
    pub fn rotate(
        &mut self,
        dimtags: &[DimTag],
        x: Real,
        y: Real,
        z: Real,
        ax: Real,
        ay: Real,
        az: Real,
        angle: Real,
    ) -> Result<()> {
        let Some(axis) = Unit::try_new(Vector3::new(ax, ay, az), tolerance()) else {
            return Err(GeoError::InvalidSweep(format!(
                "rotation axis ({ax}, {ay}, {az}) is degenerate"
            )));
        };
        let origin = Point3::new(x, y, z);
        let rot = Rotation3::from_axis_angle(&axis, angle);
        self.move_rigidly(dimtags, "rotation", |p| origin + rot * (p - origin))
    }

    fn move_rigidly<F>(&mut self, dimtags: &[DimTag], operation: &'static str, f: F) -> Result<()>
    where
        F: Fn(Point3<Real>) -> Point3<Real>,
    {
        let mut closure = self.entities.closure(dimtags)?;
        // arc centre points move with their arcs
        let centers: Vec<DimTag> = closure
            .iter()
            .filter(|dt| dt.dim == Dim::Curve)
            .filter_map(|dt| match self.entities.curves.get(&dt.tag) {
                Some(Curve {
                    shape: CurveShape::CircleArc { center_tag: Some(c), .. },
                    ..
                }) => Some(DimTag::point(*c)),
                _ => None,
            })
            .filter(|dt| self.entities.contains(*dt))
            .collect();
        closure.extend(centers);
        for &dt in &closure {
            if self.entities.in_sweep(dt)? {
                return Err(GeoError::Unsupported { operation, dim: dt.dim });
            }
        }
        for dt in closure {
            match dt.dim {
                Dim::Point => {
                    if let Some(p) = self.entities.points.get_mut(&dt.tag) {
                        p.coords = f(p.coords);
                    }
                },
                Dim::Curve => {
                    if let Some(Curve {
                        shape: CurveShape::CircleArc { center, .. },
                        ..
                    }) = self.entities.curves.get_mut(&dt.tag)
                    {
                        *center = f(*center);
                    }
                },
                _ => {},
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Deep copy of entities with fresh tags; shared boundaries are copied once.
    pub fn copy(&mut self, dimtags: &[DimTag]) -> Result<Vec<DimTag>> {
        let mut memo = HashMap::new();
        dimtags
            .iter()
            .map(|dt| self.copy_entity(dt.abs(), &mut memo))
            .collect()
    }

    fn copy_entity(&mut self, dt: DimTag, memo: &mut HashMap<DimTag, Tag>) -> Result<DimTag> {
        if let Some(&tag) = memo.get(&dt) {
            return Ok(DimTag::new(dt.dim, tag));
        }
        let tag = match dt.dim {
            Dim::Point => {
                let mut point = self.entities.point(dt.tag)?.clone();
                point.origin = None;
                let tag = self.entities.next_tag(Dim::Point);
                self.insert_point(tag, point)
            },
            Dim::Curve => {
                let mut curve = self.entities.curve(dt.tag)?.clone();
                curve.start = self.copy_entity(DimTag::point(curve.start), memo)?.tag;
                curve.end = self.copy_entity(DimTag::point(curve.end), memo)?.tag;
                if let CurveShape::CircleArc { center_tag, .. } = &mut curve.shape {
                    *center_tag = None;
                }
                curve.origin = None;
                let tag = self.entities.next_tag(Dim::Curve);
                self.insert_curve(tag, curve)
            },
            Dim::Surface => {
                let surface = self.entities.surface(dt.tag)?.clone();
                if surface.kind == SurfaceKind::Ruled {
                    return Err(GeoError::Unsupported {
                        operation: "copy of a swept lateral surface",
                        dim: Dim::Surface,
                    });
                }
                let mut loops = Vec::with_capacity(surface.loops.len());
                for l in surface.loops {
                    let curves = self.entities.curve_loop(l)?.curves.clone();
                    let mut copied = Vec::with_capacity(curves.len());
                    for c in curves {
                        copied.push(c.signum() * self.copy_entity(DimTag::curve(c.abs()), memo)?.tag);
                    }
                    let loop_tag = self.entities.next_loop_tag(Dim::Curve);
                    self.entities
                        .curve_loops
                        .insert(loop_tag, CurveLoop { curves: copied });
                    loops.push(loop_tag);
                }
                let tag = self.entities.next_tag(Dim::Surface);
                self.insert_surface(
                    tag,
                    Surface {
                        loops,
                        kind: SurfaceKind::Plane,
                        origin: None,
                    },
                )
            },
            Dim::Volume => {
                return Err(GeoError::Unsupported {
                    operation: "copy",
                    dim: Dim::Volume,
                });
            },
        };
        memo.insert(dt, tag);
        Ok(DimTag::new(dt.dim, tag))
    }

    /// Remove entities. With `recursive`, boundary entities left unused are
    /// removed too.
    pub fn remove(&mut self, dimtags: &[DimTag], recursive: bool) -> Result<()> {
        let mut targets: Vec<DimTag> = dimtags.iter().map(|dt| dt.abs()).collect();
        targets.sort_by(|a, b| b.dim.cmp(&a.dim));
        for dt in targets {
            if !self.entities.contains(dt) {
                return Err(GeoError::UnknownEntity(dt));
            }
            self.remove_entity(dt, recursive)?;
        }
        Ok(())
    }

    fn remove_entity(&mut self, dt: DimTag, recursive: bool) -> Result<()> {
        if let Some(user) = self.entities.user_of(dt) {
            return Err(GeoError::InUse { entity: dt, user });
        }
        let boundary = self.entities.boundary(dt)?;
        match dt.dim {
            Dim::Point => {
                self.entities.points.remove(&dt.tag);
            },
            Dim::Curve => {
                self.entities.curves.remove(&dt.tag);
                self.entities
                    .curve_loops
                    .retain(|_, l| !l.curves.iter().any(|c| c.abs() == dt.tag));
            },
            Dim::Surface => {
                if let Some(s) = self.entities.surfaces.remove(&dt.tag) {
                    for l in s.loops {
                        self.remove_unused_curve_loop(l);
                    }
                }
                self.entities
                    .surface_loops
                    .retain(|_, l| !l.surfaces.contains(&dt.tag));
            },
            Dim::Volume => {
                if let Some(v) = self.entities.volumes.remove(&dt.tag) {
                    for l in v.shells {
                        let used = self.entities.volumes.values().any(|o| o.shells.contains(&l));
                        if !used {
                            self.entities.surface_loops.remove(&l);
                        }
                    }
                }
            },
        }
        self.entities.order.retain(|o| *o != dt);
        self.dirty = true;
        debug!("geo: removed {} {}", dt.dim, dt.tag);
        if recursive {
            for b in boundary {
                let b = b.abs();
                if self.entities.contains(b) && self.entities.user_of(b).is_none() {
                    self.remove_entity(b, true)?;
                }
            }
        }
        Ok(())
    }

    fn remove_unused_curve_loop(&mut self, l: Tag) {
        let used = self.entities.surfaces.values().any(|s| s.loops.contains(&l));
        if !used {
            self.entities.curve_loops.remove(&l);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(geo: &mut GeoKernel) -> Tag {
        geo.add_point(0.0, 0.0, 0.0, 0.1, Some(1)).unwrap();
        geo.add_point(1.0, 0.0, 0.0, 0.1, Some(2)).unwrap();
        geo.add_point(0.0, 1.0, 0.0, 0.1, Some(3)).unwrap();
        geo.add_line(1, 2, Some(1)).unwrap();
        geo.add_line(2, 3, Some(2)).unwrap();
        geo.add_line(3, 1, Some(3)).unwrap();
        geo.add_curve_loop(&[1, 2, 3], Some(1)).unwrap()
    }

    #[test]
    fn auto_tags_follow_the_largest() {
        let mut geo = GeoKernel::new();
        geo.add_point(0.0, 0.0, 0.0, 0.0, Some(7)).unwrap();
        assert_eq!(geo.add_point(1.0, 0.0, 0.0, 0.0, None).unwrap(), 8);
        assert!(matches!(
            geo.add_point(2.0, 0.0, 0.0, 0.0, Some(7)),
            Err(GeoError::DuplicateTag(_))
        ));
        assert!(matches!(
            geo.add_point(2.0, 0.0, 0.0, 0.0, Some(0)),
            Err(GeoError::InvalidTag(Dim::Point, 0))
        ));
    }

    #[test]
    fn loop_out_of_order_is_chained() {
        let mut geo = GeoKernel::new();
        triangle(&mut geo);
        let l = geo.add_curve_loop(&[1, 3, 2], None).unwrap();
        assert_eq!(geo.entities().curve_loop(l).unwrap().curves, vec![1, 2, 3]);
        let l = geo.add_curve_loop(&[-1, 2, 3], None).unwrap();
        assert_eq!(geo.entities().curve_loop(l).unwrap().curves, vec![-1, -3, -2]);
    }

    #[test]
    fn open_loop_is_rejected() {
        let mut geo = GeoKernel::new();
        triangle(&mut geo);
        assert!(matches!(
            geo.add_curve_loop(&[1, 2], None),
            Err(GeoError::LoopNotClosed(_))
        ));
    }

    #[test]
    fn arcs_must_stay_below_pi() {
        let mut geo = GeoKernel::new();
        geo.add_point(1.0, 0.0, 0.0, 0.0, Some(1)).unwrap();
        geo.add_point(0.0, 0.0, 0.0, 0.0, Some(2)).unwrap();
        geo.add_point(-1.0, 0.0, 0.0, 0.0, Some(3)).unwrap();
        geo.add_point(0.0, 2.0, 0.0, 0.0, Some(4)).unwrap();
        assert!(matches!(
            geo.add_circle_arc(1, 2, 3, None),
            Err(GeoError::ArcTooWide(_))
        ));
        assert!(matches!(
            geo.add_circle_arc(1, 2, 4, None),
            Err(GeoError::ArcRadiusMismatch { .. })
        ));
        assert!(matches!(
            geo.add_circle_arc(1, 2, 1, None),
            Err(GeoError::DegenerateCurve(_))
        ));
    }

    #[test]
    fn extrude_point_gives_top_and_line() {
        let mut geo = GeoKernel::new();
        geo.add_point(0.0, 0.0, 0.0, 0.1, Some(1)).unwrap();
        let out = geo
            .extrude(&[DimTag::point(1)], 0.0, 0.0, 1.0, SweepOptions::default())
            .unwrap();
        assert_eq!(out, vec![DimTag::point(2), DimTag::curve(1)]);
        let line = geo.entities().curve(1).unwrap();
        assert_eq!((line.start, line.end), (1, 2));
    }

    #[test]
    fn swept_entities_are_frozen() {
        let mut geo = GeoKernel::new();
        let l = triangle(&mut geo);
        let s = geo.add_plane_surface(&[l], None).unwrap();
        geo.extrude(&[DimTag::surface(s)], 0.0, 0.0, 1.0, SweepOptions::default())
            .unwrap();
        assert!(matches!(
            geo.translate(&[DimTag::surface(s)], 1.0, 0.0, 0.0),
            Err(GeoError::Unsupported { .. })
        ));
    }

    #[test]
    fn remove_refuses_used_entities() {
        let mut geo = GeoKernel::new();
        triangle(&mut geo);
        assert!(matches!(
            geo.remove(&[DimTag::point(1)], false),
            Err(GeoError::InUse { .. })
        ));
        geo.add_point(5.0, 5.0, 5.0, 0.0, Some(9)).unwrap();
        geo.remove(&[DimTag::point(9)], false).unwrap();
        assert!(!geo.entities().contains(DimTag::point(9)));
    }
}
