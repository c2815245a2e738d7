//! Sun position for a simulated clock.
//!
//! Simulation time 0 is midnight at longitude 0 on the March equinox.

use std::f64::consts::{PI, TAU};

use glam::DVec3;

pub const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_YEAR: f64 = 365.25;
const OBLIQUITY: f64 = 23.44 * PI / 180.0;

/// Distance used for the scene's sun position.
pub const SUN_DISTANCE: f64 = 200_000.0;

/// Sub-solar point as (longitude, latitude) in radians.
///
/// Longitude is in [-pi, pi), increasing eastward.
pub fn subsolar_point(simulation_time: f64) -> (f64, f64) {
    let day = simulation_time / SECONDS_PER_DAY;
    let longitude = wrap_angle(PI - TAU * day.rem_euclid(1.0));
    let latitude = OBLIQUITY * (TAU * day / DAYS_PER_YEAR).sin();
    (longitude, latitude)
}

/// Unit vector from the globe centre towards (longitude, latitude), +Z north.
pub fn direction(longitude: f64, latitude: f64) -> DVec3 {
    DVec3::new(
        latitude.cos() * longitude.cos(),
        latitude.cos() * longitude.sin(),
        latitude.sin(),
    )
}

pub fn sun_position(simulation_time: f64) -> DVec3 {
    let (longitude, latitude) = subsolar_point(simulation_time);
    direction(longitude, latitude) * SUN_DISTANCE
}

fn wrap_angle(a: f64) -> f64 {
    (a + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn noon_at_greenwich_half_a_day_in() {
        let (lon, lat) = subsolar_point(0.5 * SECONDS_PER_DAY);
        assert!(lon.abs() < EPS);
        assert!(lat.abs() < 0.01);
    }

    #[test]
    fn sun_moves_west() {
        let (a, _) = subsolar_point(0.5 * SECONDS_PER_DAY);
        let (b, _) = subsolar_point(0.5 * SECONDS_PER_DAY + 3600.0);
        assert!((b - a + TAU / 24.0).abs() < EPS);
    }

    #[test]
    fn longitude_stays_wrapped() {
        for hour in 0..48 {
            let (lon, _) = subsolar_point(hour as f64 * 3600.0);
            assert!((-PI..PI).contains(&lon), "{lon}");
        }
    }

    #[test]
    fn june_solstice_is_north() {
        let (_, lat) = subsolar_point(DAYS_PER_YEAR / 4.0 * SECONDS_PER_DAY);
        assert!((lat - OBLIQUITY).abs() < 1e-6);
    }

    #[test]
    fn sun_is_far_along_its_direction() {
        let p = sun_position(0.0);
        assert!((p.length() - SUN_DISTANCE).abs() < 1e-6);
        assert!((p.normalize() - DVec3::NEG_X).length() < EPS);
    }
}
