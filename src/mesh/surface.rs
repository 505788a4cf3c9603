//! Surface meshing: refined constrained Delaunay triangulation of plane
//! surfaces, structured rows on the lateral surfaces of sweeps.

use crate::errors::MeshError;
use crate::float_types::Real;
use crate::mesh::mesher::Mesher;
use crate::mesh::{Element, ElementType, NodeId, split_quad};
use crate::model::{DimTag, Entities, SweepId, Tag};
use geo::{Contains, Coord, LineString, Point as GeoPoint, Polygon as GeoPolygon};
use hashbrown::HashSet;
use log::{trace, warn};
use nalgebra::{Point3, Unit, Vector3};
use spade::handles::FixedVertexHandle;
use spade::{
    AngleLimit, ConstrainedDelaunayTriangulation, Point2, RefinementParameters, Triangulation,
};

/// spade refuses coordinates closer to zero than this.
#[allow(clippy::excessive_precision)]
const MIN_ALLOWED_VALUE: Real = 1.793662034335766e-43;

/// Orthonormal frame of a plane surface; `u × v` is the outer loop normal.
struct PlaneFrame {
    origin: Point3<Real>,
    u: Vector3<Real>,
    v: Vector3<Real>,
}

impl PlaneFrame {
    fn new(origin: Point3<Real>, normal: Unit<Vector3<Real>>) -> Self {
        let helper = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = (helper - normal.into_inner() * normal.dot(&helper)).normalize();
        let v = normal.cross(&u);
        PlaneFrame { origin, u, v }
    }

    fn project(&self, p: &Point3<Real>) -> (Real, Real) {
        let d = p - self.origin;
        let clamp = |x: Real| if x.abs() < MIN_ALLOWED_VALUE { 0.0 } else { x };
        (clamp(d.dot(&self.u)), clamp(d.dot(&self.v)))
    }

    fn lift(&self, x: Real, y: Real) -> Point3<Real> {
        self.origin + self.u * x + self.v * y
    }
}

impl Mesher<'_> {
    /// Nodes around a curve loop, following the sign of each member; the
    /// closing node is not repeated.
    fn loop_nodes(&self, loop_tag: Tag) -> Result<Vec<NodeId>, MeshError> {
        let mut ring = Vec::new();
        for &signed in &self.entities.curve_loop(loop_tag)?.curves {
            let mut nodes = self.curve_nodes_of(signed)?;
            if signed < 0 {
                nodes.reverse();
            }
            nodes.pop();
            ring.extend(nodes);
        }
        Ok(ring)
    }

    /// Mean target size over the model points bounding a surface.
    fn surface_size(&self, loops: &[Tag]) -> Result<Real, MeshError> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &l in loops {
            for &c in &self.entities.curve_loop(l)?.curves {
                let (start, _) = self.entities.oriented_endpoints(c)?;
                sum += self.size_at(start)?;
                count += 1;
            }
        }
        Ok(if count == 0 {
            self.fallback_size
        } else {
            sum / count as Real
        })
    }

    pub(super) fn mesh_plane_surface(&mut self, tag: Tag) -> Result<(), MeshError> {
        let entities: &Entities = self.entities;
        let surface = entities.surface(tag)?;
        let owner = DimTag::surface(tag);
        let fail = |reason: String| MeshError::Triangulation { tag, reason };

        let mut rings = Vec::with_capacity(surface.loops.len());
        for &l in &surface.loops {
            rings.push(self.loop_nodes(l)?);
        }
        let outer: Vec<Point3<Real>> = rings[0].iter().map(|&n| self.mesh.pos(n)).collect();
        let normal = Entities::newell_normal(&outer)
            .ok_or_else(|| fail("outer loop encloses no area".to_string()))?;
        let frame = PlaneFrame::new(outer[0], normal);
        let flat: Vec<Vec<(Real, Real)>> = rings
            .iter()
            .map(|ring| ring.iter().map(|&n| frame.project(&self.mesh.pos(n))).collect())
            .collect();

        let shell = GeoPolygon::new(
            LineString::new(flat[0].iter().map(|&(x, y)| Coord { x, y }).collect()),
            Vec::new(),
        );
        for (hole, &loop_tag) in flat.iter().zip(&surface.loops).skip(1) {
            let (x, y) = hole[0];
            if !shell.contains(&GeoPoint::new(x, y)) {
                return Err(MeshError::HoleOutsideShell {
                    tag,
                    hole: loop_tag,
                });
            }
        }

        let mut cdt: ConstrainedDelaunayTriangulation<Point2<Real>> =
            ConstrainedDelaunayTriangulation::new();
        // spade vertex index -> mesh node
        let mut node_of: Vec<Option<NodeId>> = Vec::new();
        let mut handles: Vec<Vec<FixedVertexHandle>> = Vec::with_capacity(rings.len());
        for (ring, coords) in rings.iter().zip(&flat) {
            let mut ring_handles = Vec::with_capacity(ring.len());
            for (&node, &(x, y)) in ring.iter().zip(coords) {
                let handle = cdt
                    .insert(Point2::new(x, y))
                    .map_err(|e| fail(format!("cannot insert node {node}: {e:?}")))?;
                let index = handle.index();
                if node_of.len() <= index {
                    node_of.resize(index + 1, None);
                }
                match node_of[index] {
                    Some(existing) if existing != node => {
                        return Err(fail(format!("nodes {existing} and {node} coincide")));
                    },
                    _ => node_of[index] = Some(node),
                }
                ring_handles.push(handle);
            }
            handles.push(ring_handles);
        }
        for ring in &handles {
            for (i, &from) in ring.iter().enumerate() {
                let to = ring[(i + 1) % ring.len()];
                if from == to {
                    continue;
                }
                if !cdt.can_add_constraint(from, to) {
                    return Err(fail("boundary loops intersect".to_string()));
                }
                cdt.add_constraint(from, to);
            }
        }

        let size = self.surface_size(&surface.loops)?;
        let max_area = (3.0 as Real).sqrt() / 4.0 * size * size;
        let params = RefinementParameters::<Real>::new()
            .exclude_outer_faces(true)
            .keep_constraint_edges()
            .with_angle_limit(AngleLimit::from_deg(self.options.angle_limit_deg))
            .with_max_allowed_area(max_area)
            .with_max_additional_vertices(self.options.max_refinement_vertices);
        let result = cdt.refine(params);
        if !result.refinement_complete {
            warn!("surface {tag}: refinement stopped at the vertex limit");
        }
        let excluded: HashSet<usize> = result.excluded_faces.iter().map(|f| f.index()).collect();

        for vertex in cdt.vertices() {
            let index = vertex.fix().index();
            if node_of.len() <= index {
                node_of.resize(index + 1, None);
            }
            if node_of[index].is_none() {
                let p = vertex.position();
                node_of[index] = Some(self.mesh.add_node(frame.lift(p.x, p.y), owner));
            }
        }

        let mut count = 0usize;
        for face in cdt.inner_faces() {
            if excluded.contains(&face.fix().index()) {
                continue;
            }
            let mut nodes = Vec::with_capacity(3);
            for v in face.vertices() {
                let node = node_of[v.fix().index()]
                    .ok_or_else(|| fail("face references an unknown vertex".to_string()))?;
                nodes.push(node);
            }
            self.mesh
                .push_element(owner, Element::new(ElementType::Triangle, nodes));
            count += 1;
        }
        if count == 0 {
            return Err(fail("no triangle inside the boundary".to_string()));
        }
        trace!("surface {tag}: {count} triangles");
        Ok(())
    }

    /// Rows of quads between the layer images of the swept curve, split into
    /// triangles unless the sweep recombines.
    pub(super) fn mesh_lateral_surface(
        &mut self,
        tag: Tag,
        curve: Tag,
        sweep: SweepId,
    ) -> Result<(), MeshError> {
        let owner = DimTag::surface(tag);
        let base = self.curve_nodes_of(curve)?;
        let layers = self.layer_count(sweep)?;
        let recombine = self.recombined(sweep);
        let mut rows: Vec<Vec<NodeId>> = Vec::with_capacity(layers + 1);
        for k in 0..=layers {
            let mut row = Vec::with_capacity(base.len());
            for &n in &base {
                row.push(self.image(n, sweep, k, owner)?);
            }
            rows.push(row);
        }
        for k in 0..layers {
            for i in 0..base.len() - 1 {
                let quad = [rows[k][i], rows[k][i + 1], rows[k + 1][i + 1], rows[k + 1][i]];
                if recombine {
                    self.mesh
                        .push_element(owner, Element::new(ElementType::Quad, quad.to_vec()));
                } else {
                    for tri in split_quad(quad) {
                        self.mesh
                            .push_element(owner, Element::new(ElementType::Triangle, tri.to_vec()));
                    }
                }
            }
        }
        Ok(())
    }
}
