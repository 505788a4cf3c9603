//! Meshing options.

use crate::errors::MeshError;
use crate::float_types::Real;

/// Knobs for [`Mesh::generate`](crate::mesh::Mesh::generate).
///
/// Element sizes come from the mesh size of the model points; points without
/// one use `size_default`, or a tenth of the model's bounding-box diagonal
/// when that is unset too. Every size is then scaled by `size_factor` and clamped to
/// `[size_min, size_max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshOptions {
    pub size_factor: Real,
    pub size_min: Real,
    pub size_max: Real,
    pub size_default: Option<Real>,
    /// Smallest angle the surface refinement aims for, in degrees.
    pub angle_limit_deg: f64,
    /// Keep quads and prisms on every sweep, not only the recombined ones.
    pub recombine_all: bool,
    /// Cap on the vertices a single surface refinement may add.
    pub max_refinement_vertices: usize,
}

impl Default for MeshOptions {
    fn default() -> Self {
        MeshOptions {
            size_factor: 1.0,
            size_min: 0.0,
            size_max: Real::MAX,
            size_default: None,
            angle_limit_deg: 25.0,
            recombine_all: false,
            max_refinement_vertices: 200_000,
        }
    }
}

impl MeshOptions {
    pub const fn size_factor(mut self, factor: Real) -> Self {
        self.size_factor = factor;
        self
    }

    pub const fn size_bounds(mut self, min: Real, max: Real) -> Self {
        self.size_min = min;
        self.size_max = max;
        self
    }

    pub const fn size_default(mut self, size: Real) -> Self {
        self.size_default = Some(size);
        self
    }

    pub const fn angle_limit_deg(mut self, degrees: f64) -> Self {
        self.angle_limit_deg = degrees;
        self
    }

    pub const fn recombine_all(mut self, recombine: bool) -> Self {
        self.recombine_all = recombine;
        self
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if !(self.size_factor.is_finite() && self.size_factor > 0.0) {
            return Err(MeshError::InvalidOptions(format!(
                "size factor {} must be finite and positive",
                self.size_factor
            )));
        }
        if self.size_min.is_nan() || self.size_max.is_nan() || self.size_min < 0.0 || self.size_min > self.size_max || self.size_max <= 0.0 {
            return Err(MeshError::InvalidOptions(format!(
                "size bounds [{}, {}] are not a positive range",
                self.size_min, self.size_max
            )));
        }
        if let Some(size) = self.size_default {
            if !(size.is_finite() && size > 0.0) {
                return Err(MeshError::InvalidOptions(format!(
                    "default size {size} must be finite and positive"
                )));
            }
        }
        if !(self.angle_limit_deg >= 0.0 && self.angle_limit_deg < 60.0) {
            return Err(MeshError::InvalidOptions(format!(
                "angle limit {} must lie in [0, 60) degrees",
                self.angle_limit_deg
            )));
        }
        Ok(())
    }

    /// Target element size around a point carrying `point_size` (`0` = unset).
    pub fn element_size(&self, point_size: Real, fallback: Real) -> Real {
        let base = if point_size > 0.0 {
            point_size
        } else {
            self.size_default.unwrap_or(fallback)
        };
        (base * self.size_factor).clamp(self.size_min, self.size_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_scaled_then_clamped() {
        let opts = MeshOptions::default().size_factor(0.5).size_bounds(0.1, 1.0);
        assert_eq!(opts.element_size(1.0, 9.0), 0.5);
        assert_eq!(opts.element_size(0.0, 9.0), 1.0);
        assert_eq!(opts.element_size(0.01, 9.0), 0.1);
        assert_eq!(opts.size_default(0.4).element_size(0.0, 9.0), 0.2);
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert!(MeshOptions::default().size_bounds(2.0, 1.0).validate().is_err());
        assert!(MeshOptions::default().size_factor(0.0).validate().is_err());
        assert!(MeshOptions::default().validate().is_ok());
    }
}
