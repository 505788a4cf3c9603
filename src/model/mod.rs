//! Models, the session that owns them, and the built-in geometry kernel.

pub mod entity;
pub mod geo;
pub mod sweep;

pub use entity::{
    Curve, CurveLoop, CurveShape, Dim, DimTag, Entities, Origin, Point, Surface, SurfaceKind,
    SurfaceLoop, Tag, Volume,
};
pub use geo::GeoKernel;
pub use sweep::{Layers, Sweep, SweepId, SweepOptions, Transform};

use crate::errors::{GeoError, MeshError, Result};
use crate::float_types::Real;
use crate::mesh::{Mesh, MeshOptions};
use log::{debug, info, warn};
use nalgebra::Point3;

/// A named model: the geometry kernel where entities are built, and the
/// synchronized topology that meshing sees.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    geo: GeoKernel,
    topology: Entities,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Model {
            name: name.into(),
            geo: GeoKernel::new(),
            topology: Entities::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Built-in kernel used to add entities.
    pub fn geo(&mut self) -> &mut GeoKernel {
        &mut self.geo
    }

    pub fn geo_ref(&self) -> &GeoKernel {
        &self.geo
    }

    /// Publish the kernel's entities to the topology used for meshing.
    pub fn synchronize(&mut self) {
        self.topology = self.geo.entities().clone();
        self.geo.mark_synchronized();
        info!(
            "model {:?}: synchronized {} points, {} curves, {} surfaces, {} volumes",
            self.name,
            self.topology.len(Dim::Point),
            self.topology.len(Dim::Curve),
            self.topology.len(Dim::Surface),
            self.topology.len(Dim::Volume)
        );
    }

    /// Synchronized entities.
    pub fn topology(&self) -> &Entities {
        &self.topology
    }

    pub fn is_synchronized(&self) -> bool {
        !self.geo.has_pending_changes()
    }

    /// Synchronized entities of one dimension, or all of them when `dim` is `None`.
    pub fn entities(&self, dim: Option<Dim>) -> Vec<DimTag> {
        let dims = match dim {
            Some(d) => vec![d],
            None => Dim::ALL.to_vec(),
        };
        dims.into_iter()
            .flat_map(|d| {
                self.topology
                    .tags(d)
                    .into_iter()
                    .map(move |t| DimTag::new(d, t))
            })
            .collect()
    }

    /// Boundary of the given entities; tags carry orientation when `oriented`.
    pub fn boundary(&self, dimtags: &[DimTag], oriented: bool) -> Result<Vec<DimTag>> {
        let mut out = Vec::new();
        for &dt in dimtags {
            for b in self.topology.boundary(dt)? {
                out.push(if oriented { b } else { b.abs() });
            }
        }
        Ok(out)
    }

    pub fn bounding_box(&self) -> Option<(Point3<Real>, Point3<Real>)> {
        self.topology.bounding_box()
    }

    /// Mesh the synchronized entities up to dimension `dim`.
    pub fn generate_mesh(&self, dim: i32, options: &MeshOptions) -> Result<Mesh, MeshError> {
        if !self.is_synchronized() {
            warn!(
                "model {:?}: kernel has changes that were not synchronized, meshing the last synchronized state",
                self.name
            );
        }
        Mesh::generate(&self.topology, dim, options)
    }
}

/// Owner of every model and of the meshing options.
///
/// Created by [`Session::initialize`]; dropping it finalizes the session.
#[derive(Debug)]
pub struct Session {
    models: Vec<Model>,
    current: Option<usize>,
    options: MeshOptions,
}

impl Session {
    pub fn initialize() -> Self {
        Self::with_options(MeshOptions::default())
    }

    pub fn with_options(options: MeshOptions) -> Self {
        info!("session initialized");
        Session {
            models: Vec::new(),
            current: None,
            options,
        }
    }

    /// Add a model and make it current. An existing model of that name is replaced.
    pub fn add(&mut self, name: &str) -> &mut Model {
        let index = match self.models.iter().position(|m| m.name() == name) {
            Some(i) => {
                self.models[i] = Model::new(name);
                i
            },
            None => {
                self.models.push(Model::new(name));
                self.models.len() - 1
            },
        };
        debug!("session: current model is {name:?}");
        self.current = Some(index);
        &mut self.models[index]
    }

    pub fn set_current(&mut self, name: &str) -> Result<()> {
        let i = self
            .models
            .iter()
            .position(|m| m.name() == name)
            .ok_or_else(|| GeoError::UnknownModel(name.to_string()))?;
        self.current = Some(i);
        Ok(())
    }

    pub fn current(&self) -> Result<&Model> {
        self.current
            .and_then(|i| self.models.get(i))
            .ok_or(GeoError::NoCurrentModel)
    }

    pub fn current_mut(&mut self) -> Result<&mut Model> {
        self.current
            .and_then(|i| self.models.get_mut(i))
            .ok_or(GeoError::NoCurrentModel)
    }

    /// Remove the current model; the previously added one becomes current.
    pub fn remove_current(&mut self) -> Result<Model> {
        let i = self.current.ok_or(GeoError::NoCurrentModel)?;
        let model = self.models.remove(i);
        self.current = self.models.len().checked_sub(1);
        Ok(model)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(Model::name)
    }

    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut MeshOptions {
        &mut self.options
    }

    /// Mesh the current model with the session's options.
    pub fn generate(&self, dim: i32) -> Result<Mesh, MeshError> {
        self.current()?.generate_mesh(dim, &self.options)
    }

    /// Explicit finalization; equivalent to dropping the session.
    pub fn finalize(self) {}
}

impl Drop for Session {
    fn drop(&mut self) {
        info!("session finalized ({} models)", self.models.len());
    }
}
