//! Bounding-geometry construction.
//!
//! Two box strategies coexist on purpose. Postcode resolution scans boxes a
//! few metres wide, where curvature is noise and a raw degree delta is the
//! cheapest thing that works. Job search scans rings kilometres wide, where a
//! degree delta visibly distorts, so corners are projected along great-circle
//! bearings instead. Do not unify them: at small scale they produce different
//! boxes, and result sets would shift.

use crate::models::{BoundingBox, Point};
use geo::{Destination, Haversine, Point as GeoPoint};

/// How to construct a bounding box from a center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxMode {
    /// Corners projected from the center along bearings 45 degrees and 225
    /// degrees at `radius` kilometres, on the haversine sphere.
    Geodesic,
    /// Corners offset by `radius` degrees in raw lat/lng. No curvature
    /// correction.
    Planar,
}

/// Build the query box around `center`.
///
/// `radius` is kilometres in [`BoxMode::Geodesic`] and degrees in
/// [`BoxMode::Planar`]. Radius 0 degenerates to coincident corners, which a
/// containment query treats as "nothing inside" rather than an error.
/// Non-finite inputs propagate unchanged; validation is the caller's job.
pub fn bounding_box(center: Point, radius: f64, mode: BoxMode) -> BoundingBox {
    match mode {
        BoxMode::Geodesic => {
            let origin = GeoPoint::new(center.lng, center.lat);
            let ne = Haversine.destination(origin, 45.0, radius * 1000.0);
            let sw = Haversine.destination(origin, 225.0, radius * 1000.0);
            // NW and SE are a square's worth of mixing, not projections of
            // their own. The result is tangent to the two projected corners,
            // which is accurate enough at these scales.
            from_corners(Point::new(sw.y(), sw.x()), Point::new(ne.y(), ne.x()))
        }
        BoxMode::Planar => from_corners(
            Point::new(center.lat - radius, center.lng - radius),
            Point::new(center.lat + radius, center.lng + radius),
        ),
    }
}

fn from_corners(sw: Point, ne: Point) -> BoundingBox {
    BoundingBox {
        sw,
        nw: Point::new(ne.lat, sw.lng),
        ne,
        se: Point::new(sw.lat, ne.lng),
    }
}
