//! Equirectangular globe textures: loaded from disk or generated.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::path::Path;

use anyhow::{Context, Result};
use glam::DVec3;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::sun;

/// Half-width of the twilight band, as a cosine of the sun's zenith angle.
const TWILIGHT: f64 = 0.1;

/// Loads `path` if given, otherwise calls `generate`.
pub fn load_or_generate(
    path: Option<&Path>,
    generate: impl FnOnce() -> RgbaImage,
) -> Result<DynamicImage> {
    match path {
        Some(path) => {
            log::info!("loading {}", path.display());
            image::open(path).with_context(|| format!("failed to load {}", path.display()))
        }
        None => Ok(DynamicImage::ImageRgba8(generate())),
    }
}

/// Scales `image` down, keeping its aspect, so neither side exceeds `max`.
pub fn fit_within(image: DynamicImage, max: u32) -> DynamicImage {
    if image.width() <= max && image.height() <= max {
        return image;
    }
    log::warn!(
        "{}x{} image exceeds the {max} texel limit; downscaling",
        image.width(),
        image.height()
    );
    image.resize(max, max, FilterType::Triangle)
}

/// (longitude, latitude) in radians at the centre of pixel (x, y).
fn pixel_lon_lat(x: u32, y: u32, width: u32, height: u32) -> (f64, f64) {
    let lon = (x as f64 + 0.5) / width as f64 * TAU - PI;
    let lat = FRAC_PI_2 - (y as f64 + 0.5) / height as f64 * PI;
    (lon, lat)
}

/// Smooth pseudo-continents; positive over land.
fn land(lon: f64, lat: f64) -> f64 {
    (3.0 * lon).sin() * (2.0 * lat).cos() + 0.5 * (5.0 * lon + 1.0).sin() * (4.0 * lat).sin()
        + 0.25 * (11.0 * lon - 2.0).cos() * (7.0 * lat + 0.5).cos()
        - 0.35
}

/// Cheap integer hash in [0, 1).
fn hash01(x: u32, y: u32) -> f64 {
    let mut h = x.wrapping_mul(0x9e37_79b1) ^ y.wrapping_mul(0x85eb_ca77);
    h ^= h >> 15;
    h = h.wrapping_mul(0xc2b2_ae3d);
    h ^= h >> 13;
    (h & 0x00ff_ffff) as f64 / 16_777_216.0
}

pub fn procedural_day(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let (lon, lat) = pixel_lon_lat(x, y, width, height);
        if lat.abs() > 70f64.to_radians() {
            return Rgba([235, 240, 245, 255]);
        }
        let l = land(lon, lat);
        if l > 0.0 {
            let dry = (l * 2.0).min(1.0);
            Rgba([
                (60.0 + 90.0 * dry) as u8,
                (110.0 + 20.0 * dry) as u8,
                (50.0 + 30.0 * dry) as u8,
                255,
            ])
        } else {
            let depth = (-l).min(1.0);
            Rgba([10, (60.0 - 30.0 * depth) as u8, (140.0 - 40.0 * depth) as u8, 255])
        }
    })
}

pub fn procedural_night(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let (lon, lat) = pixel_lon_lat(x, y, width, height);
        let on_land = land(lon, lat) > 0.0 && lat.abs() < 60f64.to_radians();
        if on_land && hash01(x, y) > 0.97 {
            Rgba([255, 210, 120, 255])
        } else {
            Rgba([2, 3, 10, 255])
        }
    })
}

/// Day fraction at each pixel for a sun in `sun_direction`, in the red
/// channel (255 = full day).
pub fn blend(width: u32, height: u32, sun_direction: DVec3) -> RgbaImage {
    let sun = sun_direction.normalize_or_zero();
    RgbaImage::from_fn(width, height, |x, y| {
        let (lon, lat) = pixel_lon_lat(x, y, width, height);
        let cos_zenith = sun::direction(lon, lat).dot(sun);
        let t = ((cos_zenith + TWILIGHT) / (2.0 * TWILIGHT)).clamp(0.0, 1.0);
        let day = t * t * (3.0 - 2.0 * t);
        let v = (day * 255.0).round() as u8;
        Rgba([v, v, v, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_images_are_downscaled_to_the_limit() {
        let big = DynamicImage::ImageRgba8(RgbaImage::new(400, 200));
        let fitted = fit_within(big, 100);
        assert_eq!((fitted.width(), fitted.height()), (100, 50));

        let small = DynamicImage::ImageRgba8(RgbaImage::new(64, 32));
        let kept = fit_within(small, 100);
        assert_eq!((kept.width(), kept.height()), (64, 32));
    }

    #[test]
    fn pixel_centres_span_the_globe() {
        let (lon, lat) = pixel_lon_lat(0, 0, 4, 2);
        assert!((lon + PI * 0.75).abs() < 1e-12);
        assert!((lat - PI * 0.25).abs() < 1e-12);
    }

    #[test]
    fn generated_sizes() {
        assert_eq!(procedural_day(32, 16).dimensions(), (32, 16));
        assert_eq!(procedural_night(32, 16).dimensions(), (32, 16));
    }

    #[test]
    fn blend_is_day_under_the_sun_and_night_opposite() {
        let (w, h) = (64, 32);
        let sun = sun::direction(0.0, 0.0);
        let img = blend(w, h, sun);

        // column nearest lon 0 on the equator, and nearest lon -pi
        let noon = img.get_pixel(w / 2, h / 2)[0];
        let midnight = img.get_pixel(0, h / 2)[0];
        assert_eq!(noon, 255);
        assert_eq!(midnight, 0);
    }

    #[test]
    fn terminator_is_grey() {
        let (w, h) = (64, 32);
        let img = blend(w, h, sun::direction(0.0, 0.0));
        // lon ~ +pi/2 sits on the terminator
        let v = img.get_pixel(w * 3 / 4, h / 2)[0];
        assert!(v > 0 && v < 255, "{v}");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_or_generate(Some(Path::new("/nonexistent/day.png")), || RgbaImage::new(1, 1));
        assert!(err.is_err());
    }

    #[test]
    fn generator_used_without_path() {
        let img = load_or_generate(None, || RgbaImage::new(3, 2)).unwrap();
        assert_eq!(img.width(), 3);
    }
}
