//! Three revolved sectors of a torus, recombined into prisms.

use geomesh::mesh::ElementType;
use geomesh::{Session, SweepOptions, shapes};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut session = Session::initialize();
    let model = session.add("torus");
    let volumes = shapes::torus_sector(
        model.geo(),
        0.1,
        0.2,
        0.05,
        SweepOptions::default().recombine(true),
    )?;
    model.synchronize();

    let mesh = session.generate(3)?;
    let stats = mesh.validate()?;
    println!(
        "{} sectors, {} prisms, volume {:.6}",
        volumes.len(),
        stats.count(ElementType::Prism),
        stats.volume
    );

    #[cfg(feature = "msh-io")]
    mesh.write("torus.msh")?;
    Ok(())
}
