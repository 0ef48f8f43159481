//! Safe numeric casting utilities for raster sampling.
//!
//! Float-to-integer conversions for pixel and block indices require bounds
//! checking because the float may be negative, out of range, or NaN. These
//! helpers centralize the checks so the sampling code stays free of bare
//! `as` casts.

/// Convert a float to a pixel index, returning `None` if out of bounds.
///
/// Handles negative values, values at or beyond `max_value`, and NaN, all of
/// which return `None`.
///
/// # Arguments
/// * `value` - The floating point coordinate
/// * `max_value` - The maximum valid index (exclusive)
#[inline]
#[must_use]
pub fn f64_to_pixel_index(value: f64, max_value: usize) -> Option<usize> {
    if value.is_nan() || value < 0.0 {
        return None;
    }
    // Safety: we've already checked value >= 0 and is not NaN above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = value as usize;
    if index >= max_value {
        None
    } else {
        Some(index)
    }
}

/// Convert a fractional block offset to a whole block count.
///
/// Returns `None` for NaN, negative offsets (the coordinate lies before the
/// first block) and offsets too large for `i32` (far past any block range).
#[inline]
#[must_use]
pub fn f64_to_block_offset(value: f64) -> Option<i32> {
    if value.is_nan() || value < 0.0 || value >= f64::from(i32::MAX) {
        return None;
    }
    // Safety: range-checked above
    #[allow(clippy::cast_possible_truncation)]
    Some(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_to_pixel_index() {
        assert_eq!(f64_to_pixel_index(0.0, 100), Some(0));
        assert_eq!(f64_to_pixel_index(50.5, 100), Some(50));
        assert_eq!(f64_to_pixel_index(99.9, 100), Some(99));
        assert_eq!(f64_to_pixel_index(100.0, 100), None);
        assert_eq!(f64_to_pixel_index(-1.0, 100), None);
        assert_eq!(f64_to_pixel_index(f64::NAN, 100), None);
    }

    #[test]
    fn test_f64_to_block_offset() {
        assert_eq!(f64_to_block_offset(0.0), Some(0));
        assert_eq!(f64_to_block_offset(2.75), Some(2));
        assert_eq!(f64_to_block_offset(-0.25), None);
        assert_eq!(f64_to_block_offset(f64::NAN), None);
        assert_eq!(f64_to_block_offset(1e12), None);
    }
}
