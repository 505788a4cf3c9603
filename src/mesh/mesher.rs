//! Bottom-up mesh generation: points, then curves, surfaces and volumes.
//!
//! Entities produced by a sweep are not meshed independently. Their nodes are
//! images of the source nodes under the sweep transform, one row per layer, so
//! that lateral surfaces and swept volumes come out structured and conforming.

use crate::errors::MeshError;
use crate::float_types::Real;
use crate::mesh::{Element, ElementType, Mesh, MeshOptions, NodeId};
use crate::model::{Dim, DimTag, Entities, Origin, SurfaceKind, SweepId, Tag};
use hashbrown::HashMap;
use log::{debug, trace};

/// Slack subtracted before rounding a segment count up, so that a length that
/// is an exact multiple of the size does not gain a segment from round-off.
const SEGMENT_SNAP: Real = 1e-6;

pub(crate) struct Mesher<'a> {
    pub(super) entities: &'a Entities,
    pub(super) options: &'a MeshOptions,
    /// Size used for points that carry none: a tenth of the model diagonal.
    pub(super) fallback_size: Real,
    pub(super) mesh: Mesh,
    point_nodes: HashMap<Tag, NodeId>,
    /// Ordered nodes of each curve, start to end.
    pub(super) curve_nodes: HashMap<Tag, Vec<NodeId>>,
    /// `(source node, sweep, layer) -> node`
    images: HashMap<(NodeId, SweepId, usize), NodeId>,
    layers: HashMap<SweepId, Vec<Real>>,
}

/// Number of segments for a curve of `length` meshed at size `size`.
pub(crate) fn segment_count(length: Real, size: Real) -> usize {
    let n = (length / size - SEGMENT_SNAP).ceil();
    if n.is_finite() && n > 1.0 { n as usize } else { 1 }
}

impl<'a> Mesher<'a> {
    pub(crate) fn new(entities: &'a Entities, options: &'a MeshOptions) -> Self {
        Mesher {
            entities,
            options,
            fallback_size: entities.characteristic_length() / 10.0,
            mesh: Mesh::default(),
            point_nodes: HashMap::new(),
            curve_nodes: HashMap::new(),
            images: HashMap::new(),
            layers: HashMap::new(),
        }
    }

    pub(crate) fn run(mut self, dim: Dim) -> Result<Mesh, MeshError> {
        self.mesh_points()?;
        if dim >= Dim::Curve {
            self.mesh_curves()?;
        }
        if dim >= Dim::Surface {
            self.mesh_surfaces()?;
        }
        if dim >= Dim::Volume {
            self.mesh_volumes()?;
        }
        Ok(self.mesh)
    }

    /// Target element size at a model point.
    pub(super) fn size_at(&self, point: Tag) -> Result<Real, MeshError> {
        let p = self.entities.point(point)?;
        Ok(self.options.element_size(p.mesh_size, self.fallback_size))
    }

    pub(super) fn recombined(&self, sweep: SweepId) -> bool {
        self.options.recombine_all || self.entities.sweep(sweep).is_some_and(|s| s.recombine)
    }

    /// Layer interface parameters `0 = t_0 < ... < t_n = 1` of a sweep.
    ///
    /// Without explicit layers, the count follows the longest path any source
    /// point travels, meshed at the mean size of the source points.
    pub(super) fn layer_params(&mut self, sweep: SweepId) -> Result<Vec<Real>, MeshError> {
        if let Some(params) = self.layers.get(&sweep) {
            return Ok(params.clone());
        }
        let entities = self.entities;
        let s = entities.sweep(sweep).ok_or_else(|| {
            MeshError::Unsupported(format!("entity refers to unknown sweep {sweep}"))
        })?;
        let params = match &s.layers {
            Some(layers) => layers.parameters(),
            None => {
                let mut path: Real = 0.0;
                let mut size_sum = 0.0;
                for &p in &s.source_points {
                    path = path.max(s.transform.path_length(&entities.coords(p)?));
                    size_sum += self.size_at(p)?;
                }
                let size = if s.source_points.is_empty() {
                    self.fallback_size
                } else {
                    size_sum / s.source_points.len() as Real
                };
                let n = segment_count(path, size);
                (0..=n).map(|i| i as Real / n as Real).collect()
            },
        };
        debug!("sweep {sweep}: {} layers", params.len() - 1);
        self.layers.insert(sweep, params.clone());
        Ok(params)
    }

    pub(super) fn layer_count(&mut self, sweep: SweepId) -> Result<usize, MeshError> {
        Ok(self.layer_params(sweep)?.len() - 1)
    }

    /// Image of `node` on layer `layer` of `sweep`, created on `owner` when new.
    pub(super) fn image(
        &mut self,
        node: NodeId,
        sweep: SweepId,
        layer: usize,
        owner: DimTag,
    ) -> Result<NodeId, MeshError> {
        if layer == 0 {
            return Ok(node);
        }
        if let Some(&id) = self.images.get(&(node, sweep, layer)) {
            return Ok(id);
        }
        let t = self.layer_params(sweep)?[layer];
        let entities = self.entities;
        let transform = &entities
            .sweep(sweep)
            .ok_or_else(|| MeshError::Unsupported(format!("unknown sweep {sweep}")))?
            .transform;
        let pos = transform.apply(&self.mesh.pos(node), t);
        let id = self.mesh.add_node(pos, owner);
        self.images.insert((node, sweep, layer), id);
        Ok(id)
    }

    /// Images of `nodes` on the last layer of `sweep`.
    pub(super) fn top_images(
        &mut self,
        nodes: &[NodeId],
        sweep: SweepId,
        owner: DimTag,
    ) -> Result<Vec<NodeId>, MeshError> {
        let last = self.layer_count(sweep)?;
        let mut out = Vec::with_capacity(nodes.len());
        for &n in nodes {
            out.push(self.image(n, sweep, last, owner)?);
        }
        Ok(out)
    }

    fn mesh_points(&mut self) -> Result<(), MeshError> {
        let entities = self.entities;
        for tag in entities.ordered(Dim::Point) {
            let owner = DimTag::point(tag);
            let point = entities.point(tag)?;
            let node = match point.origin {
                Some(Origin::Top { source, sweep }) => {
                    let src = self.point_node(source)?;
                    self.top_images(&[src], sweep, owner)?[0]
                },
                _ => self.mesh.add_node(point.coords, owner),
            };
            self.point_nodes.insert(tag, node);
            self.mesh
                .push_element(owner, Element::new(ElementType::Point, vec![node]));
        }
        Ok(())
    }

    fn point_node(&self, tag: Tag) -> Result<NodeId, MeshError> {
        self.point_nodes
            .get(&tag)
            .copied()
            .ok_or_else(|| MeshError::Unsupported(format!("point {tag} was not meshed")))
    }

    fn mesh_curves(&mut self) -> Result<(), MeshError> {
        let entities = self.entities;
        for tag in entities.ordered(Dim::Curve) {
            let owner = DimTag::curve(tag);
            let curve = entities.curve(tag)?;
            let nodes = match curve.origin {
                Some(Origin::Top { source, sweep }) => {
                    let src = self.curve_nodes_of(source)?;
                    self.top_images(&src, sweep, owner)?
                },
                Some(Origin::Swept { source, sweep }) => {
                    let base = self.point_node(source)?;
                    let layers = self.layer_count(sweep)?;
                    let mut nodes = Vec::with_capacity(layers + 1);
                    for k in 0..=layers {
                        nodes.push(self.image(base, sweep, k, owner)?);
                    }
                    nodes
                },
                None => {
                    let length = entities.curve_length(tag)?;
                    let size = (self.size_at(curve.start)? + self.size_at(curve.end)?) / 2.0;
                    let n = segment_count(length, size);
                    let mut nodes = Vec::with_capacity(n + 1);
                    nodes.push(self.point_node(curve.start)?);
                    for i in 1..n {
                        let pos = entities.curve_point(tag, i as Real / n as Real)?;
                        nodes.push(self.mesh.add_node(pos, owner));
                    }
                    nodes.push(self.point_node(curve.end)?);
                    nodes
                },
            };
            trace!("curve {tag}: {} segments", nodes.len() - 1);
            self.mesh.touch(owner);
            for pair in nodes.windows(2) {
                self.mesh
                    .push_element(owner, Element::new(ElementType::Line, pair.to_vec()));
            }
            self.curve_nodes.insert(tag, nodes);
        }
        Ok(())
    }

    pub(super) fn curve_nodes_of(&self, tag: Tag) -> Result<Vec<NodeId>, MeshError> {
        self.curve_nodes
            .get(&tag.abs())
            .cloned()
            .ok_or_else(|| MeshError::Unsupported(format!("curve {} was not meshed", tag.abs())))
    }

    fn mesh_surfaces(&mut self) -> Result<(), MeshError> {
        let entities = self.entities;
        for tag in entities.ordered(Dim::Surface) {
            let surface = entities.surface(tag)?;
            match (surface.kind, surface.origin) {
                (_, Some(Origin::Top { source, sweep })) => {
                    self.mirror(DimTag::surface(source), DimTag::surface(tag), sweep)?
                },
                (SurfaceKind::Ruled, Some(Origin::Swept { source, sweep })) => {
                    self.mesh_lateral_surface(tag, source, sweep)?
                },
                (SurfaceKind::Plane, _) => self.mesh_plane_surface(tag)?,
                (SurfaceKind::Ruled, None) => {
                    return Err(MeshError::Unsupported(format!(
                        "ruled surface {tag} was not produced by a sweep"
                    )));
                },
            }
            self.mesh.touch(DimTag::surface(tag));
        }
        Ok(())
    }

    fn mesh_volumes(&mut self) -> Result<(), MeshError> {
        let entities = self.entities;
        for tag in entities.ordered(Dim::Volume) {
            let volume = entities.volume(tag)?;
            match volume.origin {
                Some(Origin::Swept { source, sweep }) => {
                    self.mesh_swept_volume(tag, source, sweep)?
                },
                Some(Origin::Top { source, sweep }) => {
                    self.mirror(DimTag::volume(source), DimTag::volume(tag), sweep)?
                },
                None => self.mesh_shell_volume(tag)?,
            }
            self.mesh.touch(DimTag::volume(tag));
        }
        Ok(())
    }

    /// Copy the elements of `source` onto its top copy `target`.
    fn mirror(&mut self, source: DimTag, target: DimTag, sweep: SweepId) -> Result<(), MeshError> {
        let elements = self
            .mesh
            .entity(source)
            .map(|m| m.elements.clone())
            .unwrap_or_default();
        for element in elements {
            let nodes = self.top_images(&element.nodes, sweep, target)?;
            self.mesh.push_element(target, Element::new(element.kind, nodes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_counts_round_up() {
        assert_eq!(segment_count(1.0, 0.1), 10);
        assert_eq!(segment_count(0.3, 0.1), 3);
        assert_eq!(segment_count(0.31, 0.1), 4);
        assert_eq!(segment_count(0.01, 0.1), 1);
        assert_eq!(segment_count(1.0, 0.0), 1);
    }
}
