//! Triangle view of a mesh, shared by the triangle-based exporters.
use crate::float_types::Real;
use crate::mesh::{ElementType, Mesh, split_quad};
use crate::model::Dim;
use nalgebra::{Point3, Vector3};

/// A triangulated 3D surface.
///
/// Anything that can present itself as a bunch of triangles in 3D
/// can automatically use all the triangle-based IO backends.
pub trait Triangulated3D {
    /// Call `f` for each triangle `[v0, v1, v2]`.
    fn visit_triangles<F>(&self, f: F)
    where
        F: FnMut([Point3<Real>; 3]);
}

/// Unit normal of a triangle, zero when degenerate.
pub fn facet_normal(tri: &[Point3<Real>; 3]) -> Vector3<Real> {
    (tri[1] - tri[0])
        .cross(&(tri[2] - tri[0]))
        .try_normalize(Real::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// The surface elements of the mesh; quads are split along the same diagonal
/// as the simplicial meshes use.
impl Triangulated3D for Mesh {
    fn visit_triangles<F>(&self, mut f: F)
    where
        F: FnMut([Point3<Real>; 3]),
    {
        for (_, element) in self.elements(Dim::Surface) {
            let n = &element.nodes;
            match element.kind {
                ElementType::Triangle => f([self.pos(n[0]), self.pos(n[1]), self.pos(n[2])]),
                ElementType::Quad => {
                    for tri in split_quad([n[0], n[1], n[2], n[3]]) {
                        f(tri.map(|id| self.pos(id)));
                    }
                },
                _ => {},
            }
        }
    }
}
