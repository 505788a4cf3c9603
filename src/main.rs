//! geomesh CLI - build a ready-made model, mesh it and show it.
//!
//! Usage: geomesh <SHAPE> [OPTIONS]
//!
//! `-nopopup` is accepted as well as `--nopopup`, in any position.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{LevelFilter, info};

use geomesh::mesh::MeshStatistics;
use geomesh::model::Model;
use geomesh::viewer::{Viewer, is_nopopup_flag, popup_requested};
use geomesh::{MeshOptions, Real, Session, SweepOptions, shapes};

#[derive(Parser)]
#[command(name = "geomesh")]
#[command(author, version, about = "Geometry and meshing CLI", long_about = None)]
#[command(after_help = "Pass -nopopup (or --nopopup) anywhere to skip the viewer.")]
struct Cli {
    #[command(subcommand)]
    shape: Shape,

    /// Highest dimension to mesh (0 to 3)
    #[arg(long, global = true, default_value = "3")]
    dim: i32,

    /// Scale every element size
    #[arg(long, global = true, default_value = "1.0")]
    size_factor: Real,

    /// Keep quadrangles and prisms in every sweep
    #[arg(long, global = true)]
    recombine: bool,

    /// Write the mesh (.msh or .stl)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Shape {
    /// Cylinder on a circle of arcs, extruded along z
    Cylinder {
        #[arg(long, default_value = "0.1")]
        radius: Real,

        #[arg(long, default_value = "0.3")]
        height: Real,

        /// Number of arcs around the base (at least 3)
        #[arg(long, default_value = "3")]
        arcs: usize,

        /// Mesh size at the rim points
        #[arg(long, default_value = "0.1")]
        mesh_size: Real,
    },

    /// Cube built from points, lines and plane surfaces
    Box {
        #[arg(long, default_value = "1.0")]
        size: Real,

        #[arg(long, default_value = "0.25")]
        mesh_size: Real,
    },

    /// Flat disk of four arcs
    Disk {
        #[arg(long, default_value = "1.0")]
        radius: Real,

        #[arg(long, default_value = "0.1")]
        mesh_size: Real,
    },

    /// Three revolved sectors of a torus
    Torus {
        #[arg(long, default_value = "0.1")]
        radius: Real,

        /// Distance from the section centre to the axis
        #[arg(long, default_value = "0.2")]
        offset: Real,

        #[arg(long, default_value = "0.05")]
        mesh_size: Real,
    },
}

impl Shape {
    const fn name(&self) -> &'static str {
        match self {
            Shape::Cylinder { .. } => "cylinder",
            Shape::Box { .. } => "box",
            Shape::Disk { .. } => "disk",
            Shape::Torus { .. } => "torus",
        }
    }

    fn build(&self, model: &mut Model, recombine: bool) -> geomesh::errors::Result<()> {
        let geo = model.geo();
        match *self {
            Shape::Cylinder {
                radius,
                height,
                arcs,
                mesh_size,
            } => {
                shapes::cylinder(geo, radius, height, arcs, mesh_size)?;
            },
            Shape::Box { size, mesh_size } => {
                shapes::unit_box(geo, size, mesh_size)?;
            },
            Shape::Disk { radius, mesh_size } => {
                shapes::disk(geo, radius, mesh_size)?;
            },
            Shape::Torus {
                radius,
                offset,
                mesh_size,
            } => {
                let options = SweepOptions::default().recombine(recombine);
                shapes::torus_sector(geo, radius, offset, mesh_size, options)?;
            },
        }
        Ok(())
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let popup = popup_requested(&args);
    let cli = Cli::parse_from(args.into_iter().filter(|a| !is_nopopup_flag(a)));

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli, popup) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, popup: bool) -> Result<(), Box<dyn std::error::Error>> {
    let options = MeshOptions::default()
        .size_factor(cli.size_factor)
        .recombine_all(cli.recombine);
    let mut session = Session::with_options(options);
    let name = cli.shape.name();
    let model = session.add(name);
    cli.shape.build(model, cli.recombine)?;
    model.synchronize();

    let mesh = session.generate(cli.dim)?;
    let stats = if cli.dim == 3 {
        mesh.validate()?
    } else {
        mesh.statistics()
    };
    report(&stats);

    if let Some(path) = &cli.output {
        mesh.write(path)?;
    }

    if popup {
        Viewer::from_env().show(&mesh, name)?;
    } else {
        info!("viewer suppressed");
    }

    session.finalize();
    Ok(())
}

fn report(stats: &MeshStatistics) {
    info!("nodes: {}", stats.nodes);
    for (kind, count) in &stats.elements {
        info!("{}: {}", kind.name(), count);
    }
    info!(
        "length {:.6}, area {:.6}, volume {:.6}",
        stats.curve_length, stats.surface_area, stats.volume
    );
    info!("edge lengths in [{:.6}, {:.6}]", stats.min_edge, stats.max_edge);
    if let Some(q) = stats.min_tet_quality {
        info!("worst tetrahedron quality: {q:.4}");
    }
}
