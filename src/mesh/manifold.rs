use crate::mesh::{Element, ElementType, Mesh, NodeId};
use crate::model::{Dim, DimTag, Tag};
use hashbrown::{HashMap, HashSet};

/// Faces of a 3D element, each in the node order of the element.
pub(crate) fn element_faces(element: &Element) -> Vec<Vec<NodeId>> {
    let n = &element.nodes;
    let pick = |idx: &[usize]| idx.iter().map(|&i| n[i]).collect::<Vec<_>>();
    match element.kind {
        ElementType::Tetrahedron => vec![
            pick(&[0, 2, 1]),
            pick(&[0, 1, 3]),
            pick(&[1, 2, 3]),
            pick(&[0, 3, 2]),
        ],
        ElementType::Prism => vec![
            pick(&[0, 2, 1]),
            pick(&[3, 4, 5]),
            pick(&[0, 1, 4, 3]),
            pick(&[1, 2, 5, 4]),
            pick(&[2, 0, 3, 5]),
        ],
        _ => Vec::new(),
    }
}

fn face_key(face: &[NodeId]) -> Vec<NodeId> {
    let mut key = face.to_vec();
    key.sort_unstable();
    key
}

impl Mesh {
    /// Faces of the elements of `volume` that belong to a single element.
    pub fn boundary_faces(&self, volume: Tag) -> Vec<Vec<NodeId>> {
        let Some(mesh) = self.entity(DimTag::volume(volume)) else {
            return Vec::new();
        };
        let mut counts: HashMap<Vec<NodeId>, (u32, Vec<NodeId>)> = HashMap::new();
        for element in &mesh.elements {
            for face in element_faces(element) {
                counts.entry(face_key(&face)).or_insert((0, face)).0 += 1;
            }
        }
        let mut faces: Vec<Vec<NodeId>> = counts
            .into_values()
            .filter(|(count, _)| *count == 1)
            .map(|(_, face)| face)
            .collect();
        faces.sort_unstable();
        faces
    }

    /// Edges of the boundary of `volume` that are not shared by exactly two
    /// boundary faces. Zero for a closed 2-manifold boundary.
    pub fn open_edges(&self, volume: Tag) -> usize {
        let mut edge_counts: HashMap<(NodeId, NodeId), u32> = HashMap::new();
        for face in self.boundary_faces(volume) {
            for i in 0..face.len() {
                let (a, b) = (face[i], face[(i + 1) % face.len()]);
                let key = if a < b { (a, b) } else { (b, a) };
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }
        edge_counts.values().filter(|&&c| c != 2).count()
    }

    /// Boundary faces of `volume` matching no surface element.
    pub fn unmatched_faces(&self, volume: Tag) -> usize {
        let surface_faces: HashSet<Vec<NodeId>> = self
            .elements(Dim::Surface)
            .map(|(_, e)| face_key(&e.nodes))
            .collect();
        self.boundary_faces(volume)
            .iter()
            .filter(|f| !surface_faces.contains(&face_key(f)))
            .count()
    }

    /// Checks if the boundary of every meshed volume is manifold
    ///
    /// ### Returns
    /// Returns `true` if every boundary edge of every volume appears exactly 2 times
    pub fn is_manifold(&self) -> bool {
        self.entity_meshes()
            .filter(|(dt, _)| dt.dim == Dim::Volume)
            .all(|(dt, _)| self.open_edges(dt.tag) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn single_tet() -> Mesh {
        let mut mesh = Mesh::default();
        let owner = DimTag::volume(1);
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ] {
            mesh.add_node(p, owner);
        }
        mesh.push_element(owner, Element::new(ElementType::Tetrahedron, vec![1, 2, 3, 4]));
        mesh
    }

    #[test]
    fn lone_tetrahedron_is_closed() {
        let mesh = single_tet();
        assert_eq!(mesh.boundary_faces(1).len(), 4);
        assert_eq!(mesh.open_edges(1), 0);
        assert!(mesh.is_manifold());
        assert_eq!(mesh.unmatched_faces(1), 4);
    }

    #[test]
    fn shared_face_is_interior() {
        let mut mesh = single_tet();
        let owner = DimTag::volume(1);
        mesh.add_node(Point3::new(1.0, 1.0, 1.0), owner);
        mesh.push_element(owner, Element::new(ElementType::Tetrahedron, vec![2, 3, 4, 5]));
        assert_eq!(mesh.boundary_faces(1).len(), 6);
        assert!(mesh.is_manifold());
    }
}
