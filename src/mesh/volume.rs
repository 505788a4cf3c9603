//! Volume meshing: layered prisms for swept volumes, a star tetrahedralization
//! from the centroid for volumes bounded by an explicit shell.

use crate::errors::MeshError;
use crate::float_types::{Real, tolerance};
use crate::mesh::mesher::Mesher;
use crate::mesh::{Element, ElementType, NodeId, split_quad, tet_volume};
use crate::model::{DimTag, SweepId, Tag};
use log::trace;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;

/// Vertex permutations of a prism bringing vertex `i` to position 0 while
/// keeping the bottom/top pairing `(0, 3) (1, 4) (2, 5)`.
const PRISM_ROTATIONS: [[usize; 6]; 6] = [
    [0, 1, 2, 3, 4, 5],
    [1, 2, 0, 4, 5, 3],
    [2, 0, 1, 5, 3, 4],
    [3, 5, 4, 0, 2, 1],
    [4, 3, 5, 1, 0, 2],
    [5, 4, 3, 2, 1, 0],
];

/// Split a prism `[b0, b1, b2, t0, t1, t2]` into three tetrahedra.
///
/// Each quad face is cut along the diagonal through its smallest node id,
/// matching [`split_quad`], so neighbouring prisms and lateral surfaces stay
/// conforming.
pub fn split_prism(v: [NodeId; 6]) -> [[NodeId; 4]; 3] {
    let min = (0..6).min_by_key(|&i| v[i]).unwrap_or(0);
    let p = PRISM_ROTATIONS[min].map(|i| v[i]);
    if p[1].min(p[5]) < p[2].min(p[4]) {
        [
            [p[0], p[1], p[2], p[5]],
            [p[0], p[1], p[5], p[4]],
            [p[0], p[4], p[5], p[3]],
        ]
    } else {
        [
            [p[0], p[1], p[2], p[4]],
            [p[0], p[4], p[2], p[5]],
            [p[0], p[4], p[5], p[3]],
        ]
    }
}

impl Mesher<'_> {
    fn volume_floor(&self) -> Real {
        tolerance() * self.fallback_size.powi(3)
    }

    /// Push a tetrahedron with positive volume, swapping two nodes if needed.
    fn push_tet(&mut self, owner: DimTag, mut t: [NodeId; 4]) -> Result<(), MeshError> {
        let vol = tet_volume(
            &self.mesh.pos(t[0]),
            &self.mesh.pos(t[1]),
            &self.mesh.pos(t[2]),
            &self.mesh.pos(t[3]),
        );
        if vol.abs() <= self.volume_floor() {
            return Err(self.inverted(owner, vol));
        }
        if vol < 0.0 {
            t.swap(1, 2);
        }
        self.mesh
            .push_element(owner, Element::new(ElementType::Tetrahedron, t.to_vec()));
        Ok(())
    }

    fn push_prism(&mut self, owner: DimTag, mut p: [NodeId; 6]) -> Result<(), MeshError> {
        let [b0, b1, b2, t0, ..] = p.map(|n| self.mesh.pos(n));
        let vol = tet_volume(&b0, &b1, &b2, &t0);
        if vol.abs() <= self.volume_floor() {
            return Err(self.inverted(owner, vol));
        }
        if vol < 0.0 {
            p.swap(1, 2);
            p.swap(4, 5);
        }
        self.mesh
            .push_element(owner, Element::new(ElementType::Prism, p.to_vec()));
        Ok(())
    }

    fn inverted(&self, owner: DimTag, measure: Real) -> MeshError {
        MeshError::InvertedElement {
            entity: owner,
            element: self.mesh.entity(owner).map_or(0, |m| m.elements.len()),
            measure,
        }
    }

    pub(super) fn mesh_swept_volume(
        &mut self,
        tag: Tag,
        source: Tag,
        sweep: SweepId,
    ) -> Result<(), MeshError> {
        let owner = DimTag::volume(tag);
        let elements = self
            .mesh
            .entity(DimTag::surface(source))
            .map(|m| m.elements.clone())
            .unwrap_or_default();
        let layers = self.layer_count(sweep)?;
        let recombine = self.recombined(sweep);
        for element in elements {
            let [a, b, c] = match element.kind {
                ElementType::Triangle => [element.nodes[0], element.nodes[1], element.nodes[2]],
                ElementType::Quad => {
                    return Err(MeshError::Unsupported(format!(
                        "volume {tag}: sweeping quadrangles of surface {source} into hexahedra"
                    )));
                },
                _ => continue,
            };
            for k in 0..layers {
                let mut prism = [0; 6];
                for (i, n) in [a, b, c].into_iter().enumerate() {
                    prism[i] = self.image(n, sweep, k, owner)?;
                    prism[i + 3] = self.image(n, sweep, k + 1, owner)?;
                }
                if recombine {
                    self.push_prism(owner, prism)?;
                } else {
                    for tet in split_prism(prism) {
                        self.push_tet(owner, tet)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Connect every boundary triangle to one node at the centroid of the
    /// shell. Only valid for a single shell that is star-shaped about it.
    pub(super) fn mesh_shell_volume(&mut self, tag: Tag) -> Result<(), MeshError> {
        let owner = DimTag::volume(tag);
        let entities = self.entities;
        let volume = entities.volume(tag)?;
        if volume.shells.len() != 1 {
            return Err(MeshError::Unsupported(format!(
                "volume {tag}: star meshing needs exactly one shell, found {}",
                volume.shells.len()
            )));
        }

        let mut faces: Vec<Vec<[NodeId; 3]>> = Vec::new();
        for &s in &entities.surface_loop(volume.shells[0])?.surfaces {
            let mut tris = Vec::new();
            for element in self
                .mesh
                .entity(DimTag::surface(s))
                .map(|m| m.elements.as_slice())
                .unwrap_or_default()
            {
                match element.kind {
                    ElementType::Triangle => {
                        tris.push([element.nodes[0], element.nodes[1], element.nodes[2]])
                    },
                    ElementType::Quad => {
                        let n = &element.nodes;
                        tris.extend(split_quad([n[0], n[1], n[2], n[3]]));
                    },
                    _ => {},
                }
            }
            faces.push(tris);
        }

        let boundary: BTreeSet<NodeId> = faces.iter().flatten().flatten().copied().collect();
        if boundary.is_empty() {
            return Err(MeshError::NotStarShaped(tag));
        }
        let mut sum = Vector3::<Real>::zeros();
        for &n in &boundary {
            sum += self.mesh.pos(n).coords;
        }
        let center = Point3::from(sum / boundary.len() as Real);

        let floor = self.volume_floor();
        let mut tets = Vec::new();
        for tris in faces {
            let signed: Vec<Real> = tris
                .iter()
                .map(|t| {
                    tet_volume(
                        &self.mesh.pos(t[0]),
                        &self.mesh.pos(t[1]),
                        &self.mesh.pos(t[2]),
                        &center,
                    )
                })
                .collect();
            // surfaces are oriented as a whole so the shell encloses positive volume
            let flip = signed.iter().sum::<Real>() < 0.0;
            for (t, vol) in tris.into_iter().zip(signed) {
                let vol = if flip { -vol } else { vol };
                if vol <= floor {
                    return Err(MeshError::NotStarShaped(tag));
                }
                tets.push(if flip { [t[0], t[2], t[1]] } else { t });
            }
        }

        let apex = self.mesh.add_node(center, owner);
        for [a, b, c] in tets {
            self.mesh.push_element(
                owner,
                Element::new(ElementType::Tetrahedron, vec![a, b, c, apex]),
            );
        }
        trace!(
            "volume {tag}: star of {} tetrahedra",
            self.mesh.entity(owner).map_or(0, |m| m.elements.len())
        );
        Ok(())
    }
}
