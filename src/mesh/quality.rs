//! Element measures, quality and whole-mesh statistics.

use crate::errors::MeshError;
use crate::float_types::Real;
use crate::mesh::{Element, ElementType, Mesh, tet_volume};
use crate::model::Dim;
use hashbrown::HashSet;
use log::{debug, info};
use nalgebra::Point3;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Summary of a generated mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStatistics {
    pub nodes: usize,
    pub elements: BTreeMap<ElementType, usize>,
    pub curve_length: Real,
    pub surface_area: Real,
    pub volume: Real,
    pub min_edge: Real,
    pub max_edge: Real,
    /// Smallest measure over the 3D elements.
    pub min_volume_measure: Option<Real>,
    /// Worst triangle shape, 1 for equilateral.
    pub min_triangle_quality: Option<Real>,
    /// Worst tetrahedron shape, 1 for regular.
    pub min_tet_quality: Option<Real>,
    /// Whether the boundary of every meshed volume is a closed 2-manifold.
    pub closed_boundaries: bool,
}

impl MeshStatistics {
    pub fn count(&self, kind: ElementType) -> usize {
        self.elements.get(&kind).copied().unwrap_or(0)
    }
}

fn element_edges(kind: ElementType) -> &'static [(usize, usize)] {
    match kind {
        ElementType::Point => &[],
        ElementType::Line => &[(0, 1)],
        ElementType::Triangle => &[(0, 1), (1, 2), (2, 0)],
        ElementType::Quad => &[(0, 1), (1, 2), (2, 3), (3, 0)],
        ElementType::Tetrahedron => &[(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)],
        ElementType::Prism => &[
            (0, 1),
            (1, 2),
            (2, 0),
            (3, 4),
            (4, 5),
            (5, 3),
            (0, 3),
            (1, 4),
            (2, 5),
        ],
    }
}

fn min_of(values: impl Iterator<Item = Real>) -> Option<Real> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: Real| a.min(v))))
}

impl Mesh {
    fn positions(&self, element: &Element) -> Vec<Point3<Real>> {
        element.nodes.iter().map(|&n| self.pos(n)).collect()
    }

    /// Length, area or signed volume of an element; 0 for points.
    pub fn measure(&self, element: &Element) -> Real {
        let p = self.positions(element);
        match element.kind {
            ElementType::Point => 0.0,
            ElementType::Line => (p[1] - p[0]).norm(),
            ElementType::Triangle => (p[1] - p[0]).cross(&(p[2] - p[0])).norm() / 2.0,
            ElementType::Quad => {
                ((p[1] - p[0]).cross(&(p[2] - p[0])).norm()
                    + (p[2] - p[0]).cross(&(p[3] - p[0])).norm())
                    / 2.0
            },
            ElementType::Tetrahedron => tet_volume(&p[0], &p[1], &p[2], &p[3]),
            ElementType::Prism => {
                tet_volume(&p[0], &p[1], &p[2], &p[5])
                    + tet_volume(&p[0], &p[1], &p[5], &p[4])
                    + tet_volume(&p[0], &p[4], &p[5], &p[3])
            },
        }
    }

    /// Normalized shape measure in `(0, 1]` for triangles and tetrahedra.
    pub fn quality(&self, element: &Element) -> Option<Real> {
        let p = self.positions(element);
        match element.kind {
            ElementType::Triangle => {
                let sum_sq = (p[1] - p[0]).norm_squared()
                    + (p[2] - p[1]).norm_squared()
                    + (p[0] - p[2]).norm_squared();
                (sum_sq > 0.0).then(|| 4.0 * (3.0 as Real).sqrt() * self.measure(element) / sum_sq)
            },
            ElementType::Tetrahedron => {
                let mut sum_sq = 0.0;
                for i in 0..4 {
                    for j in i + 1..4 {
                        sum_sq += (p[j] - p[i]).norm_squared();
                    }
                }
                let rms = (sum_sq / 6.0).sqrt();
                (rms > 0.0).then(|| 6.0 * (2.0 as Real).sqrt() * self.measure(element) / rms.powi(3))
            },
            _ => None,
        }
    }

    fn total_measure(&self, dim: Dim) -> Real {
        let elements: Vec<&Element> = self.elements(dim).map(|(_, e)| e).collect();

        #[cfg(feature = "parallel")]
        let total = elements.par_iter().map(|e| self.measure(e)).sum();

        #[cfg(not(feature = "parallel"))]
        let total = elements.iter().map(|e| self.measure(e)).sum();

        total
    }

    fn min_quality(&self, kind: ElementType) -> Option<Real> {
        let elements: Vec<&Element> = self
            .elements(kind.dim())
            .map(|(_, e)| e)
            .filter(|e| e.kind == kind)
            .collect();

        #[cfg(feature = "parallel")]
        let qualities: Vec<Real> = elements.par_iter().filter_map(|e| self.quality(e)).collect();

        #[cfg(not(feature = "parallel"))]
        let qualities: Vec<Real> = elements.iter().filter_map(|e| self.quality(e)).collect();

        min_of(qualities.into_iter())
    }

    /// Shortest and longest distinct element edge, `(0, 0)` for an empty mesh.
    pub fn edge_length_range(&self) -> (Real, Real) {
        let mut edges = HashSet::new();
        for dim in [Dim::Curve, Dim::Surface, Dim::Volume] {
            for (_, element) in self.elements(dim) {
                for &(i, j) in element_edges(element.kind) {
                    let (a, b) = (element.nodes[i], element.nodes[j]);
                    edges.insert(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        let lengths: Vec<Real> = edges
            .into_iter()
            .map(|(a, b)| (self.pos(b) - self.pos(a)).norm())
            .collect();
        let min = min_of(lengths.iter().copied()).unwrap_or(0.0);
        let max = lengths.iter().copied().fold(0.0, Real::max);
        (min, max)
    }

    pub fn statistics(&self) -> MeshStatistics {
        let mut elements = BTreeMap::new();
        for dim in Dim::ALL {
            for (_, e) in self.elements(dim) {
                *elements.entry(e.kind).or_insert(0) += 1;
            }
        }
        let (min_edge, max_edge) = self.edge_length_range();
        MeshStatistics {
            nodes: self.node_count(),
            elements,
            curve_length: self.total_measure(Dim::Curve),
            surface_area: self.total_measure(Dim::Surface),
            volume: self.total_measure(Dim::Volume),
            min_edge,
            max_edge,
            min_volume_measure: min_of(self.elements(Dim::Volume).map(|(_, e)| self.measure(e))),
            min_triangle_quality: self.min_quality(ElementType::Triangle),
            min_tet_quality: self.min_quality(ElementType::Tetrahedron),
            closed_boundaries: self.is_manifold(),
        }
    }

    /// Check that every 3D element has positive volume and that the boundary
    /// of every meshed volume is closed and matches the surface elements.
    pub fn validate(&self) -> Result<MeshStatistics, MeshError> {
        for (dt, mesh) in self.entity_meshes().filter(|(dt, _)| dt.dim == Dim::Volume) {
            for (i, element) in mesh.elements.iter().enumerate() {
                let measure = self.measure(element);
                if measure <= 0.0 {
                    return Err(MeshError::InvertedElement {
                        entity: dt,
                        element: i,
                        measure,
                    });
                }
            }
            let open_edges = self.open_edges(dt.tag);
            if open_edges > 0 {
                return Err(MeshError::OpenBoundary {
                    tag: dt.tag,
                    open_edges,
                });
            }
            let faces = self.unmatched_faces(dt.tag);
            if faces > 0 {
                return Err(MeshError::NonConforming { tag: dt.tag, faces });
            }
            debug!("volume {}: boundary is closed and conforming", dt.tag);
        }
        let stats = self.statistics();
        info!(
            "mesh is valid: {} nodes, volume {:.6}, area {:.6}",
            stats.nodes, stats.volume, stats.surface_area
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DimTag;
    use approx::assert_relative_eq;

    #[test]
    fn measures_of_unit_shapes() {
        let mut mesh = Mesh::default();
        let owner = DimTag::volume(1);
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ] {
            mesh.add_node(p, owner);
        }
        let prism = Element::new(ElementType::Prism, vec![1, 2, 3, 4, 5, 6]);
        assert_relative_eq!(mesh.measure(&prism), 0.5, epsilon = 1e-12);
        let tri = Element::new(ElementType::Triangle, vec![1, 2, 3]);
        assert_relative_eq!(mesh.measure(&tri), 0.5, epsilon = 1e-12);
        let q = mesh.quality(&tri).unwrap();
        assert!(q > 0.0 && q < 1.0);
        let mut volume = Mesh::default();
        for p in mesh.nodes() {
            volume.add_node(p.pos, owner);
        }
        volume.push_element(owner, prism);
        let stats = volume.statistics();
        assert_relative_eq!(stats.min_edge, 1.0, epsilon = 1e-12);
        assert_relative_eq!(stats.max_edge, (2.0 as Real).sqrt(), epsilon = 1e-12);
        assert!(stats.closed_boundaries);
        assert_eq!(stats.count(ElementType::Prism), 1);
        let quad = Element::new(ElementType::Quad, vec![1, 2, 5, 4]);
        assert_relative_eq!(mesh.measure(&quad), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn regular_tetrahedron_has_unit_quality() {
        let mut mesh = Mesh::default();
        let owner = DimTag::volume(1);
        for p in [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
        ] {
            mesh.add_node(p, owner);
        }
        let tet = Element::new(ElementType::Tetrahedron, vec![1, 2, 3, 4]);
        assert_relative_eq!(mesh.quality(&tet).unwrap().abs(), 1.0, epsilon = 1e-12);
    }
}
