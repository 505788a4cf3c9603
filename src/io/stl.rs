use crate::triangulated::{Triangulated3D, facet_normal};
use std::io::Cursor;

/// Export to ASCII STL
/// Convert the surface elements to an **ASCII STL** string with the given `name`.
///
/// ```rust
/// # use geomesh::{Session, mesh::MeshOptions, shapes};
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let mut session = Session::initialize();
/// let model = session.add("disk");
/// shapes::disk(model.geo(), 1.0, 0.5)?;
/// model.synchronize();
/// let mesh = model.generate_mesh(2, &MeshOptions::default())?;
/// let text = mesh.to_stl_ascii("disk");
/// assert!(text.starts_with("solid disk"));
/// # Ok(())
/// # }
/// ```
pub fn to_stl_ascii<T: Triangulated3D>(shape: &T, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("solid {name}\n"));

    shape.visit_triangles(|tri| {
        let n = facet_normal(&tri);
        out.push_str(&format!("  facet normal {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
        out.push_str("    outer loop\n");
        for p in &tri {
            out.push_str(&format!("      vertex {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    });

    out.push_str(&format!("endsolid {name}\n"));
    out
}

/// Export to BINARY STL (returns `Vec<u8>`)
///
/// The resulting `Vec<u8>` can then be written to a file or handled in memory.
/// Binary STL has no room for a name, `_name` only keeps the signature in
/// line with [`to_stl_ascii`].
pub fn to_stl_binary<T: Triangulated3D>(shape: &T, _name: &str) -> std::io::Result<Vec<u8>> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::new();

    shape.visit_triangles(|tri| {
        let n = facet_normal(&tri);
        #[allow(clippy::unnecessary_cast)]
        {
            triangles.push(Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: tri.map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
            });
        }
    });

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter())?;
    Ok(cursor.into_inner())
}

impl crate::mesh::Mesh {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }
    pub fn to_stl_binary(&self, name: &str) -> std::io::Result<Vec<u8>> {
        self::to_stl_binary(self, name)
    }
}
