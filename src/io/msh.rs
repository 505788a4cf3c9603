//! Gmsh MSH 2.2 ASCII export.

use crate::mesh::{ElementType, Mesh};
use std::fmt::Write;

/// Element type codes of the MSH format.
pub const fn msh_code(kind: ElementType) -> u32 {
    match kind {
        ElementType::Line => 1,
        ElementType::Triangle => 2,
        ElementType::Quad => 3,
        ElementType::Tetrahedron => 4,
        ElementType::Prism => 6,
        ElementType::Point => 15,
    }
}

/// Serialize a mesh as MSH 2.2 ASCII.
///
/// Every element carries two tags, the physical and the elementary one, both
/// set to the tag of the entity it is classified on.
pub fn to_msh(mesh: &Mesh) -> String {
    let mut out = String::new();
    out.push_str("$MeshFormat\n2.2 0 8\n$EndMeshFormat\n");

    out.push_str("$Nodes\n");
    let _ = writeln!(out, "{}", mesh.node_count());
    for node in mesh.nodes() {
        let _ = writeln!(out, "{} {} {} {}", node.id, node.pos.x, node.pos.y, node.pos.z);
    }
    out.push_str("$EndNodes\n");

    out.push_str("$Elements\n");
    let _ = writeln!(out, "{}", mesh.element_count());
    let mut id = 0usize;
    for (entity, entity_mesh) in mesh.entity_meshes() {
        for element in &entity_mesh.elements {
            id += 1;
            let _ = write!(
                out,
                "{id} {} 2 {} {}",
                msh_code(element.kind),
                entity.tag,
                entity.tag
            );
            for node in &element.nodes {
                let _ = write!(out, " {node}");
            }
            out.push('\n');
        }
    }
    out.push_str("$EndElements\n");
    out
}

impl Mesh {
    pub fn to_msh(&self) -> String {
        self::to_msh(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Element;
    use crate::model::DimTag;
    use nalgebra::Point3;

    #[test]
    fn writes_sections_and_tags() {
        let mut mesh = Mesh::default();
        let a = mesh.add_node(Point3::new(0.0, 0.0, 0.0), DimTag::point(1));
        let b = mesh.add_node(Point3::new(1.0, 0.0, 0.0), DimTag::point(2));
        mesh.push_element(DimTag::point(1), Element::new(ElementType::Point, vec![a]));
        mesh.push_element(DimTag::point(2), Element::new(ElementType::Point, vec![b]));
        mesh.push_element(DimTag::curve(7), Element::new(ElementType::Line, vec![a, b]));
        let text = mesh.to_msh();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "$MeshFormat");
        assert_eq!(lines[1], "2.2 0 8");
        assert_eq!(lines[4], "2");
        assert_eq!(lines[5], "1 0 0 0");
        assert!(lines.contains(&"3 1 2 7 7 1 2"));
        assert!(lines.contains(&"1 15 2 1 1 1"));
        assert_eq!(lines.last(), Some(&"$EndElements"));
    }
}
