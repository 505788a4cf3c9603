//! Sweeps: the rigid motions behind `extrude` and `revolve`, and their layering.

use crate::errors::{GeoError, Result};
use crate::float_types::{PI, Real, tolerance};
use crate::model::{DimTag, Tag};
use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Index of a sweep inside its kernel.
pub type SweepId = usize;

/// Rigid motion swept by an extrusion.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Straight extrusion along `vector`.
    Translation { vector: Vector3<Real> },
    /// Revolution of `angle` radians about the axis through `origin`.
    Rotation {
        origin: Point3<Real>,
        axis: Unit<Vector3<Real>>,
        angle: Real,
    },
}

impl Transform {
    pub fn translation(dx: Real, dy: Real, dz: Real) -> Result<Self> {
        let vector = Vector3::new(dx, dy, dz);
        if !vector.iter().all(|c| c.is_finite()) || vector.norm() <= tolerance() {
            return Err(GeoError::InvalidSweep(format!(
                "translation vector ({dx}, {dy}, {dz}) is degenerate"
            )));
        }
        Ok(Transform::Translation { vector })
    }

    /// Revolution about the axis through `origin` with direction `axis`.
    ///
    /// Like every arc in the kernel, the swept angle must stay strictly below π.
    pub fn rotation(origin: Point3<Real>, axis: Vector3<Real>, angle: Real) -> Result<Self> {
        let Some(axis) = Unit::try_new(axis, tolerance()) else {
            return Err(GeoError::InvalidSweep(format!(
                "rotation axis ({}, {}, {}) is degenerate",
                axis.x, axis.y, axis.z
            )));
        };
        if !angle.is_finite() || angle.abs() <= tolerance() || angle.abs() >= PI - tolerance() {
            return Err(GeoError::InvalidSweep(format!(
                "rotation angle {angle} must satisfy 0 < |angle| < Pi"
            )));
        }
        Ok(Transform::Rotation { origin, axis, angle })
    }

    /// Apply the fraction `t` (0 = identity, 1 = full motion) to a point.
    pub fn apply(&self, p: &Point3<Real>, t: Real) -> Point3<Real> {
        match self {
            Transform::Translation { vector } => p + vector * t,
            Transform::Rotation {
                origin,
                axis,
                angle,
            } => {
                let rot = Rotation3::from_axis_angle(axis, angle * t);
                origin + rot * (p - origin)
            },
        }
    }

    /// Point on the rotation axis closest to `p`, `None` for translations.
    pub fn axis_projection(&self, p: &Point3<Real>) -> Option<Point3<Real>> {
        match self {
            Transform::Translation { .. } => None,
            Transform::Rotation { origin, axis, .. } => {
                let along = (p - origin).dot(axis);
                Some(origin + axis.into_inner() * along)
            },
        }
    }

    /// Length of the path travelled by `p` over the whole motion.
    pub fn path_length(&self, p: &Point3<Real>) -> Real {
        match self {
            Transform::Translation { vector } => vector.norm(),
            Transform::Rotation { angle, .. } => {
                let center = self.axis_projection(p).unwrap_or(*p);
                (p - center).norm() * angle.abs()
            },
        }
    }
}

/// Structured layering of a sweep: `counts[i]` elements up to the
/// normalized height `heights[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layers {
    pub counts: Vec<usize>,
    pub heights: Vec<Real>,
}

impl Layers {
    pub fn new(counts: Vec<usize>, heights: Vec<Real>) -> Result<Self> {
        if counts.is_empty() || counts.len() != heights.len() {
            return Err(GeoError::InvalidLayers(format!(
                "{} layer counts for {} heights",
                counts.len(),
                heights.len()
            )));
        }
        if counts.contains(&0) {
            return Err(GeoError::InvalidLayers("layer counts must be positive".into()));
        }
        let mut previous = 0.0;
        for &h in &heights {
            if h.is_nan() || h <= previous || h > 1.0 + tolerance() {
                return Err(GeoError::InvalidLayers(format!(
                    "heights must increase strictly within (0, 1], got {h} after {previous}"
                )));
            }
            previous = h;
        }
        if (previous - 1.0).abs() > tolerance() {
            return Err(GeoError::InvalidLayers(format!(
                "last height must be 1, got {previous}"
            )));
        }
        Ok(Layers { counts, heights })
    }

    /// `n` evenly spaced layers.
    pub fn uniform(n: usize) -> Result<Self> {
        Self::new(vec![n], vec![1.0])
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Normalized parameters `t_0 = 0 < t_1 < ... < t_N = 1` of the layer interfaces.
    pub fn parameters(&self) -> Vec<Real> {
        let mut params = Vec::with_capacity(self.total() + 1);
        params.push(0.0);
        let mut start = 0.0;
        for (&count, &end) in self.counts.iter().zip(&self.heights) {
            for i in 1..=count {
                params.push(start + (end - start) * i as Real / count as Real);
            }
            start = end;
        }
        // the final parameter is exactly 1 so images land on the top entities
        if let Some(last) = params.last_mut() {
            *last = 1.0;
        }
        params
    }
}

/// Options shared by `extrude` and `revolve`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOptions {
    /// Explicit layering; derived from the mesh size when `None`.
    pub layers: Option<Layers>,
    /// Keep quads and prisms instead of splitting them into simplices.
    pub recombine: bool,
}

impl SweepOptions {
    pub fn layers(mut self, layers: Layers) -> Self {
        self.layers = Some(layers);
        self
    }

    pub const fn recombine(mut self, recombine: bool) -> Self {
        self.recombine = recombine;
        self
    }
}

/// One call to `extrude`/`revolve`, remembered so the mesher can replay it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub id: SweepId,
    pub transform: Transform,
    pub layers: Option<Layers>,
    pub recombine: bool,
    /// Every entity that was swept, inputs and their boundaries.
    pub sources: Vec<DimTag>,
    /// Points of `sources`, used to derive the layer count.
    pub source_points: Vec<Tag>,
}

impl Sweep {
    pub fn involves(&self, dimtag: DimTag) -> bool {
        self.sources.contains(&dimtag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn layered_parameters_follow_heights() {
        let layers = Layers::new(vec![2, 1], vec![0.5, 1.0]).unwrap();
        let t = layers.parameters();
        assert_eq!(t.len(), 4);
        assert_relative_eq!(t[1], 0.25);
        assert_relative_eq!(t[2], 0.5);
        assert_eq!(t[3], 1.0);
    }

    #[test]
    fn rejects_bad_layers() {
        assert!(Layers::new(vec![], vec![]).is_err());
        assert!(Layers::new(vec![0], vec![1.0]).is_err());
        assert!(Layers::new(vec![1, 1], vec![0.6, 0.4]).is_err());
        assert!(Layers::new(vec![3], vec![0.9]).is_err());
    }

    #[test]
    fn rotation_rejects_half_turn() {
        let r = Transform::rotation(Point3::origin(), Vector3::z(), PI);
        assert!(matches!(r, Err(GeoError::InvalidSweep(_))));
        assert!(Transform::rotation(Point3::origin(), Vector3::zeros(), 1.0).is_err());
    }

    #[test]
    fn rotation_moves_along_circle() {
        let r = Transform::rotation(Point3::new(0.0, 1.0, 0.0), Vector3::x(), PI / 2.0).unwrap();
        let p = r.apply(&Point3::origin(), 1.0);
        assert_relative_eq!(p, Point3::new(0.0, 1.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(r.path_length(&Point3::origin()), PI / 2.0, epsilon = 1e-12);
    }
}
