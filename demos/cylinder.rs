//! Cylinder from three arcs, extruded and meshed in 3D.
//!
//! Run with `-nopopup` to skip the viewer.

use geomesh::float_types::{Real, TAU};
use geomesh::viewer::{Viewer, popup_requested};
use geomesh::{DimTag, Session, SweepOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut session = Session::initialize();
    let model = session.add("cylinder");
    let geo = model.geo();

    let lc: Real = 0.1;
    let n = 3;
    for i in 1..=n {
        let angle = TAU * i as Real / n as Real;
        geo.add_point(0.1 * angle.cos(), 0.1 * angle.sin(), 0.0, lc, Some(i))?;
    }
    let center = geo.add_point(0.0, 0.0, 0.0, 4.0, None)?;

    geo.add_circle_arc(1, center, 2, Some(1))?;
    geo.add_circle_arc(2, center, 3, Some(2))?;
    geo.add_circle_arc(3, center, 1, Some(3))?;
    geo.add_curve_loop(&[1, 2, 3], Some(1))?;
    geo.add_plane_surface(&[1], Some(1))?;

    geo.extrude(&[DimTag::surface(1)], 0.0, 0.0, 0.3, SweepOptions::default())?;

    model.synchronize();
    let mesh = session.generate(3)?;
    let stats = mesh.validate()?;
    println!(
        "{} nodes, {} elements, volume {:.6}",
        stats.nodes,
        mesh.element_count(),
        stats.volume
    );

    if popup_requested(std::env::args()) {
        Viewer::from_env().show(&mesh, "cylinder")?;
    }

    session.finalize();
    Ok(())
}
