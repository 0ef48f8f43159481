//! EPSG-to-EPSG point transforms using pure Rust (proj4rs + crs-definitions).

use super::Coord;

/// The common geographic CRS every projector node converts into: WGS84
/// longitude/latitude.
pub const COMMON_EPSG: u16 = 4326;

/// Project a point from one CRS to another.
///
/// Handles any EPSG code present in the crs-definitions database (thousands
/// of codes including UTM zones and national grids).
///
/// # Errors
/// Returns an error if either EPSG code is not in the database or the
/// transformation itself fails (e.g. a pole-adjacent point in a projection
/// that cannot represent it).
pub fn project_point(source_epsg: u16, target_epsg: u16, point: Coord) -> Result<Coord, String> {
    // No-op if same CRS
    if source_epsg == target_epsg {
        return Ok(point);
    }

    project_with_proj4rs(source_epsg, target_epsg, point)
}

/// Get the PROJ4 string for an EPSG code from the crs-definitions database.
#[inline]
pub fn get_proj_string(epsg: u16) -> Option<&'static str> {
    crs_definitions::from_code(epsg).map(|def| def.proj4)
}

/// Check if an EPSG code represents a geographic (lon/lat) CRS.
#[inline]
#[must_use]
pub fn is_geographic_crs(epsg: u16) -> bool {
    // The proj string is authoritative; the 4000 range check is only a
    // fallback for codes missing from the database.
    if let Some(proj_str) = get_proj_string(epsg) {
        proj_str.contains("+proj=longlat")
    } else {
        epsg == COMMON_EPSG || (4000..5000).contains(&epsg)
    }
}

fn project_with_proj4rs(source_epsg: u16, target_epsg: u16, point: Coord) -> Result<Coord, String> {
    use proj4rs::proj::Proj;
    use proj4rs::transform::transform;

    let source_str = get_proj_string(source_epsg)
        .ok_or_else(|| format!("EPSG:{source_epsg} is not in the crs-definitions database"))?;
    let target_str = get_proj_string(target_epsg)
        .ok_or_else(|| format!("EPSG:{target_epsg} is not in the crs-definitions database"))?;

    let source_proj = Proj::from_proj_string(source_str)
        .map_err(|e| format!("Invalid source projection EPSG:{source_epsg}: {e:?}"))?;
    let target_proj = Proj::from_proj_string(target_str)
        .map_err(|e| format!("Invalid target projection EPSG:{target_epsg}: {e:?}"))?;

    // proj4rs uses radians for geographic coordinates
    let (x_in, y_in) = if is_geographic_crs(source_epsg) {
        (point.x.to_radians(), point.y.to_radians())
    } else {
        (point.x, point.y)
    };

    let mut transformed = (x_in, y_in, 0.0);
    transform(&source_proj, &target_proj, &mut transformed)
        .map_err(|e| format!("Transform from EPSG:{source_epsg} to EPSG:{target_epsg} failed: {e:?}"))?;

    // Convert back from radians if target is geographic
    if is_geographic_crs(target_epsg) {
        Ok(Coord::new(transformed.0.to_degrees(), transformed.1.to_degrees()))
    } else {
        Ok(Coord::new(transformed.0, transformed.1))
    }
}
