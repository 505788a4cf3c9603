//! `Mesh` struct: nodes and elements classified on model entities, and the
//! generator that builds them from a synchronized model.

use crate::errors::MeshError;
use crate::float_types::Real;
use crate::model::{Dim, DimTag, Entities};
use log::{debug, info};
use nalgebra::Point3;
use std::collections::BTreeMap;

pub mod manifold;
mod mesher;
pub mod options;
pub mod quality;
mod surface;
mod volume;

pub use options::MeshOptions;
pub use quality::MeshStatistics;

/// 1-based node number, as written to mesh files.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub pos: Point3<Real>,
    /// Entity the node is classified on.
    pub entity: DimTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Point,
    Line,
    Triangle,
    Quad,
    Tetrahedron,
    Prism,
}

impl ElementType {
    pub const fn node_count(self) -> usize {
        match self {
            ElementType::Point => 1,
            ElementType::Line => 2,
            ElementType::Triangle => 3,
            ElementType::Quad => 4,
            ElementType::Tetrahedron => 4,
            ElementType::Prism => 6,
        }
    }

    pub const fn dim(self) -> Dim {
        match self {
            ElementType::Point => Dim::Point,
            ElementType::Line => Dim::Curve,
            ElementType::Triangle | ElementType::Quad => Dim::Surface,
            ElementType::Tetrahedron | ElementType::Prism => Dim::Volume,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ElementType::Point => "point",
            ElementType::Line => "line",
            ElementType::Triangle => "triangle",
            ElementType::Quad => "quadrangle",
            ElementType::Tetrahedron => "tetrahedron",
            ElementType::Prism => "prism",
        }
    }
}

/// One element; triangles and quads are counter-clockwise about their
/// surface normal, volume elements have positive volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementType,
    pub nodes: Vec<NodeId>,
}

impl Element {
    pub fn new(kind: ElementType, nodes: Vec<NodeId>) -> Self {
        debug_assert_eq!(kind.node_count(), nodes.len());
        Element { kind, nodes }
    }
}

/// Elements classified on one model entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityMesh {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    nodes: Vec<Node>,
    entities: BTreeMap<DimTag, EntityMesh>,
}

impl Mesh {
    /// Mesh every entity of dimension `<= dim`, lower dimensions first so that
    /// each entity reuses the nodes of its boundary.
    pub fn generate(entities: &Entities, dim: i32, options: &MeshOptions) -> Result<Mesh, MeshError> {
        let target = Dim::from_i32(dim).ok_or(MeshError::InvalidDimension(dim))?;
        options.validate()?;
        if entities.is_empty() {
            return Err(MeshError::NotSynchronized);
        }
        info!("meshing up to dimension {dim}");
        let mesh = mesher::Mesher::new(entities, options).run(target)?;
        for d in Dim::ALL {
            if d > target {
                break;
            }
            debug!(
                "dimension {}: {} elements",
                d.as_i32(),
                mesh.elements(d).count()
            );
        }
        info!(
            "done meshing: {} nodes, {} elements",
            mesh.node_count(),
            mesh.element_count()
        );
        Ok(mesh)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        id.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes classified on `entity`.
    pub fn nodes_on(&self, entity: DimTag) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.entity == entity)
            .map(|n| n.id)
            .collect()
    }

    pub fn entity(&self, entity: DimTag) -> Option<&EntityMesh> {
        self.entities.get(&entity)
    }

    /// Meshed entities in `(dim, tag)` order.
    pub fn entity_meshes(&self) -> impl Iterator<Item = (DimTag, &EntityMesh)> {
        self.entities.iter().map(|(dt, m)| (*dt, m))
    }

    /// Elements of every entity of dimension `dim`.
    pub fn elements(&self, dim: Dim) -> impl Iterator<Item = (DimTag, &Element)> {
        self.entities
            .iter()
            .filter(move |(dt, _)| dt.dim == dim)
            .flat_map(|(dt, m)| m.elements.iter().map(move |e| (*dt, e)))
    }

    pub fn element_count(&self) -> usize {
        self.entities.values().map(|m| m.elements.len()).sum()
    }

    pub fn count_of(&self, kind: ElementType) -> usize {
        self.elements(kind.dim()).filter(|(_, e)| e.kind == kind).count()
    }

    /// Position of a node created by this mesh.
    pub(crate) fn pos(&self, id: NodeId) -> Point3<Real> {
        self.nodes[id - 1].pos
    }

    pub(crate) fn add_node(&mut self, pos: Point3<Real>, entity: DimTag) -> NodeId {
        let id = self.nodes.len() + 1;
        self.nodes.push(Node { id, pos, entity });
        id
    }

    pub(crate) fn push_element(&mut self, entity: DimTag, element: Element) {
        self.entities.entry(entity).or_default().elements.push(element);
    }

    /// Make sure `entity` shows up even when it received no element.
    pub(crate) fn touch(&mut self, entity: DimTag) {
        self.entities.entry(entity).or_default();
    }
}

/// Split a quad `[a, b, c, d]` along the diagonal through its smallest node id.
///
/// Neighbouring quads and prism faces apply the same rule, so shared faces
/// are always cut the same way.
pub fn split_quad(q: [NodeId; 4]) -> [[NodeId; 3]; 2] {
    let min = (0..4).min_by_key(|&i| q[i]).unwrap_or(0);
    if min % 2 == 0 {
        [[q[0], q[1], q[2]], [q[0], q[2], q[3]]]
    } else {
        [[q[0], q[1], q[3]], [q[1], q[2], q[3]]]
    }
}

/// Signed volume of the tetrahedron `a b c d`.
pub fn tet_volume(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>, d: &Point3<Real>) -> Real {
    (b - a).cross(&(c - a)).dot(&(d - a)) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_split_follows_smallest_node() {
        assert_eq!(split_quad([1, 5, 6, 2]), [[1, 5, 6], [1, 6, 2]]);
        assert_eq!(split_quad([5, 1, 2, 6]), [[5, 1, 6], [1, 2, 6]]);
        // both neighbours of the shared edge 1-6 agree on the diagonal
        assert_eq!(split_quad([6, 2, 1, 5])[0], [6, 2, 1]);
    }

    #[test]
    fn tet_volume_sign() {
        let o = Point3::origin();
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        let z = Point3::new(0.0, 0.0, 1.0);
        assert!((tet_volume(&o, &x, &y, &z) - 1.0 / 6.0).abs() < 1e-12);
        assert!(tet_volume(&o, &y, &x, &z) < 0.0);
    }

    #[test]
    fn element_type_table() {
        assert_eq!(ElementType::Prism.node_count(), 6);
        assert_eq!(ElementType::Quad.dim(), Dim::Surface);
        assert!(ElementType::Line < ElementType::Tetrahedron);
    }
}
