//! Convenience builders for common tree shapes.

use std::f64::consts::PI;

use crate::field::FieldAccessor;
use crate::node::DataNode;
use crate::ops::{BinaryFn, UnaryFn};
use crate::promote::promote_projectors;

/// Default window spacing for spatial aggregation, matching the block grid
/// pitch of the swath products this crate was written for.
pub const DEFAULT_AVERAGING_SPACING_METERS: f64 = 17_600.0;

/// Wrap a finished tree in a spatial averager and re-promote, so a projector
/// sitting at the tree's root moves above the averager and the window
/// offsets apply in native meters. Radius 0 returns the tree unchanged.
#[must_use]
pub fn averaged(node: DataNode, radius: usize, spacing: f64) -> Box<DataNode> {
    if radius == 0 {
        return Box::new(node);
    }
    let mut tree = Box::new(DataNode::average(radius, spacing, node));
    promote_projectors(&mut tree);
    tree
}

/// Convert a radiance tree to top-of-atmosphere reflectance.
///
/// The factor `scale * pi * distance^2 / irradiance` comes from the field's
/// calibration constants; the secant of the solar zenith angle corrects for
/// illumination geometry. Returns `None` when the field carries no solar
/// irradiance, since the conversion is undefined without it.
#[must_use]
pub fn reflectance(
    radiance: DataNode,
    solar_zenith: DataNode,
    field: &dyn FieldAccessor,
) -> Option<DataNode> {
    let irradiance = field.solar_irradiance();
    if irradiance <= 0.0 {
        return None;
    }
    let factor = field.scale() * PI * field.solar_distance().powi(2) / irradiance;
    Some(DataNode::binary(
        BinaryFn::Mul,
        DataNode::unary(UnaryFn::Scale(factor), radiance),
        DataNode::unary(UnaryFn::SecDeg, solar_zenith),
    ))
}
