//! A small **geometry and meshing** kernel in the spirit of gmsh's built-in
//! `geo` kernel: tagged points, lines, circle arcs, curve loops, plane surfaces
//! and volumes, structured extrusions and revolutions, and a mesher producing
//! conforming line, triangle, quadrangle, tetrahedron and prism meshes.
//!
//! ```rust
//! # use geomesh::{Session, DimTag, SweepOptions};
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut session = Session::initialize();
//! let model = session.add("cylinder");
//! let lc = 0.1;
//! let geo = model.geo();
//! for i in 1..=3 {
//!     let a = std::f64::consts::TAU * i as f64 / 3.0;
//!     geo.add_point(0.1 * a.cos(), 0.1 * a.sin(), 0.0, lc, Some(i))?;
//! }
//! let center = geo.add_point(0.0, 0.0, 0.0, 4.0, None)?;
//! geo.add_circle_arc(1, center, 2, Some(1))?;
//! geo.add_circle_arc(2, center, 3, Some(2))?;
//! geo.add_circle_arc(3, center, 1, Some(3))?;
//! geo.add_curve_loop(&[1, 2, 3], Some(1))?;
//! geo.add_plane_surface(&[1], Some(1))?;
//! geo.extrude(&[DimTag::surface(1)], 0.0, 0.0, 0.3, SweepOptions::default())?;
//! model.synchronize();
//! let mesh = session.generate(3)?;
//! assert!(mesh.validate()?.volume > 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` export of the surface elements
//! - **msh-io**: Gmsh MSH 2.2 export and the external [viewer]
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon for mesh statistics

#![forbid(unsafe_code)]
#![warn(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod io;
pub mod mesh;
pub mod model;
pub mod shapes;
pub mod triangulated;

#[cfg(feature = "msh-io")]
pub mod viewer;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::{GeoError, MeshError};
pub use float_types::Real;
pub use mesh::{Mesh, MeshOptions};
pub use model::{Dim, DimTag, GeoKernel, Layers, Model, Session, SweepOptions, Tag};
