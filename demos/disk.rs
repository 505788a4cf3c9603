//! 2D mesh of a four-arc disk, printed as ASCII STL.

use geomesh::{MeshOptions, Session, shapes};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut session = Session::initialize();
    let model = session.add("disk");
    shapes::disk(model.geo(), 1.0, 0.2)?;
    model.synchronize();

    let mesh = model.generate_mesh(2, &MeshOptions::default().angle_limit_deg(30.0))?;
    let stats = mesh.statistics();
    eprintln!(
        "area {:.6}, worst triangle {:.3}",
        stats.surface_area,
        stats.min_triangle_quality.unwrap_or(0.0)
    );

    #[cfg(feature = "stl-io")]
    print!("{}", mesh.to_stl_ascii("disk"));
    Ok(())
}
