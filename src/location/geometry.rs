//! Geodesic helpers for walking a route polyline

use super::sample::Coordinate;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360)
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Smallest absolute difference between two headings, in [0, 180]
pub fn heading_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Linear interpolation; accurate enough for the sub-kilometer segments
/// found in route geometry.
fn interpolate(a: Coordinate, b: Coordinate, fraction: f64) -> Coordinate {
    Coordinate::new(
        a.latitude + (b.latitude - a.latitude) * fraction,
        a.longitude + (b.longitude - a.longitude) * fraction,
    )
}

/// Point on a polyline at a given distance from its start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylinePoint {
    pub coordinate: Coordinate,
    /// Bearing of the segment containing the point
    pub course: f64,
    /// Turn angle at the end of that segment (0 for the last segment)
    pub upcoming_turn: f64,
    /// True once the distance runs past the final vertex
    pub at_end: bool,
}

/// Locate the point `along` meters from the start of `line`.
///
/// Returns `None` for an empty line.
pub fn point_along(line: &[Coordinate], along: f64) -> Option<PolylinePoint> {
    let first = *line.first()?;
    if line.len() == 1 {
        return Some(PolylinePoint {
            coordinate: first,
            course: 0.0,
            upcoming_turn: 0.0,
            at_end: true,
        });
    }

    let mut remaining = along.max(0.0);
    for (i, pair) in line.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        let length = distance(a, b);
        let course = bearing(a, b);

        if remaining <= length {
            let fraction = if length > 0.0 { remaining / length } else { 0.0 };
            let upcoming_turn = line
                .get(i + 2)
                .map(|&c| heading_delta(course, bearing(b, c)))
                .unwrap_or(0.0);
            return Some(PolylinePoint {
                coordinate: interpolate(a, b, fraction),
                course,
                upcoming_turn,
                at_end: false,
            });
        }
        remaining -= length;
    }

    let n = line.len();
    Some(PolylinePoint {
        coordinate: line[n - 1],
        course: bearing(line[n - 2], line[n - 1]),
        upcoming_turn: 0.0,
        at_end: true,
    })
}

/// Total length of a polyline in meters
pub fn length(line: &[Coordinate]) -> f64 {
    line.windows(2).map(|w| distance(w[0], w[1])).sum()
}
