// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local metric offsets between capture positions
//!
//! Places panoramas of one track relative to its first waypoint in the scene
//! frame (+y up, +x north, +z east).

use nalgebra::Vector3;

// Series coefficients for meters per degree of latitude/longitude
const M1: f64 = 111_132.92;
const M2: f64 = -559.82;
const M3: f64 = 1.175;
const M4: f64 = -0.0023;
const P1: f64 = 111_412.84;
const P2: f64 = -93.5;
const P3: f64 = 0.118;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Meters spanned by one degree of latitude at `latitude` degrees
pub fn lat_meters_per_degree(latitude: f64) -> f64 {
    let phi = latitude.to_radians();
    M1 + M2 * (2.0 * phi).cos() + M3 * (4.0 * phi).cos() + M4 * (6.0 * phi).cos()
}

/// Meters spanned by one degree of longitude at `latitude` degrees
pub fn lng_meters_per_degree(latitude: f64) -> f64 {
    let phi = latitude.to_radians();
    P1 * phi.cos() + P2 * (3.0 * phi).cos() + P3 * (5.0 * phi).cos()
}

/// Offset of `location` from `origin` as `(north, 0, east)` meters.
///
/// Both scales are evaluated at the origin latitude, which is accurate for the
/// few hundred meters a track spans.
pub fn offset_for_location(origin: LatLng, location: LatLng) -> Vector3<f64> {
    let north = (location.lat - origin.lat) * lat_meters_per_degree(origin.lat);
    let east = (location.lng - origin.lng) * lng_meters_per_degree(origin.lat);
    Vector3::new(north, 0.0, east)
}
