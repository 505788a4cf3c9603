//! Cube built bottom-up and tetrahedralized from its centroid; writes `box.msh`
//! and, with the `stl-io` feature, `box.stl`.

use geomesh::mesh::ElementType;
use geomesh::{MeshOptions, Session, shapes};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut session = Session::with_options(MeshOptions::default().size_factor(0.5));
    let model = session.add("box");
    shapes::unit_box(model.geo(), 1.0, 0.5)?;
    model.synchronize();

    let mesh = session.generate(3)?;
    let stats = mesh.validate()?;
    println!(
        "volume {:.6} from {} tetrahedra",
        stats.volume,
        stats.count(ElementType::Tetrahedron)
    );

    #[cfg(feature = "msh-io")]
    mesh.write("box.msh")?;
    #[cfg(feature = "stl-io")]
    mesh.write("box.stl")?;
    Ok(())
}
