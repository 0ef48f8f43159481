//! Coordinate projectors bridging a field's native space and the common
//! geographic space.
//!
//! A projector is fully described by its parameters, so two projectors are
//! interchangeable exactly when their parameters compare equal. Tree
//! rewrites rely on that: matching projectors above sibling branches can be
//! merged into one.

use crate::field::FieldAccessor;
use crate::geometry::{projection, Coord, Mask};

/// Parameters relating a field's native coordinate space to the common
/// geographic space (EPSG:4326, longitude/latitude degrees).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Native space is a projected CRS identified by EPSG code, as used for
    /// satellite swath grids.
    Swath { native_epsg: u16 },
    /// Native space is an affine grid: `common = origin + native * scale`.
    Affine { origin: Coord, scale: Coord },
}

/// Bidirectional transform built from [`Projection`] parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    projection: Projection,
}

impl Projector {
    #[must_use]
    pub const fn new(projection: Projection) -> Self {
        Self { projection }
    }

    /// Build a projector from a field's stored projection constants.
    #[must_use]
    pub fn from_field(field: &dyn FieldAccessor) -> Option<Self> {
        field.projection().map(Self::new)
    }

    #[must_use]
    pub const fn projection(&self) -> Projection {
        self.projection
    }

    /// Transform a native-space coordinate into the common space.
    ///
    /// # Errors
    /// Returns a description of the failure when the point cannot be
    /// transformed, for example outside the CRS's domain of validity.
    pub fn to_common(&self, point: Coord) -> Result<Coord, String> {
        match self.projection {
            Projection::Swath { native_epsg } => {
                projection::project_point(native_epsg, projection::COMMON_EPSG, point)
            }
            Projection::Affine { origin, scale } => Ok(origin + point * scale),
        }
    }

    /// Transform a common-space coordinate into the native space. Inverse of
    /// [`Self::to_common`].
    ///
    /// # Errors
    /// Returns a description of the failure when the point cannot be
    /// transformed.
    pub fn to_native(&self, point: Coord) -> Result<Coord, String> {
        match self.projection {
            Projection::Swath { native_epsg } => {
                projection::project_point(projection::COMMON_EPSG, native_epsg, point)
            }
            Projection::Affine { origin, scale } => {
                if scale.x == 0.0 || scale.y == 0.0 {
                    return Err("affine projection has a zero scale component".to_string());
                }
                Ok((point - origin) / scale)
            }
        }
    }

    /// Map a native-space coverage mask into the common space, vertex by
    /// vertex. Vertices that fail to transform become invalid coordinates;
    /// polygon topology is preserved.
    #[must_use]
    pub fn mask_to_common(&self, mask: &Mask) -> Mask {
        mask.iter()
            .map(|polygon| polygon.map(|v| self.to_common(v).unwrap_or(Coord::INVALID)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    const EPS: f64 = 1e-9;

    fn affine() -> Projector {
        Projector::new(Projection::Affine {
            origin: Coord::new(100.0, 200.0),
            scale: Coord::new(0.5, -0.25),
        })
    }

    #[test]
    fn test_affine_roundtrip() {
        let projector = affine();
        let native = Coord::new(8.0, 12.0);

        let common = projector.to_common(native).expect("forward");
        assert_eq!(common, Coord::new(104.0, 197.0));

        let back = projector.to_native(common).expect("inverse");
        assert!((back.x - native.x).abs() < EPS && (back.y - native.y).abs() < EPS);
    }

    #[test]
    fn test_affine_zero_scale_fails_inverse() {
        let projector = Projector::new(Projection::Affine {
            origin: Coord::new(0.0, 0.0),
            scale: Coord::new(0.0, 1.0),
        });
        assert!(projector.to_native(Coord::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn test_swath_roundtrip() {
        // UTM zone 32N.
        let projector = Projector::new(Projection::Swath { native_epsg: 32632 });
        let native = Coord::new(500_000.0, 5_000_000.0);

        let common = projector.to_common(native).expect("forward");
        assert!((common.x - 9.0).abs() < 1e-6, "central meridian, got {}", common.x);

        let back = projector.to_native(common).expect("inverse");
        assert!((back.x - native.x).abs() < 1e-3);
        assert!((back.y - native.y).abs() < 1e-3);
    }

    #[test]
    fn test_equality_is_parameter_equality() {
        let a = Projector::new(Projection::Swath { native_epsg: 32632 });
        let b = Projector::new(Projection::Swath { native_epsg: 32632 });
        let c = Projector::new(Projection::Swath { native_epsg: 32633 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, affine());
    }

    #[test]
    fn test_mask_transform_preserves_topology() {
        let projector = affine();
        let mask = vec![Polygon::from_vertices(vec![
            Coord::new(0.0, 0.0),
            Coord::new(2.0, 0.0),
            Coord::new(2.0, 2.0),
        ])];

        let mapped = projector.mask_to_common(&mask);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].len(), 3);
        assert_eq!(mapped[0].vertices()[0], Coord::new(100.0, 200.0));
        assert_eq!(mapped[0].vertices()[1], Coord::new(101.0, 200.0));
        assert_eq!(mapped[0].vertices()[2], Coord::new(101.0, 199.5));
    }
}
