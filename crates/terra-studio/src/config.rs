use std::path::PathBuf;

use clap::Parser;

/// Command-line settings for the studio.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "terra-studio")]
#[command(about = "Day/night globe viewer driven by a simulated sun")]
pub struct StudioConfig {
    /// Day-side texture (equirectangular); generated if omitted.
    #[arg(long)]
    pub day: Option<PathBuf>,

    /// Night-side texture (equirectangular); generated if omitted.
    #[arg(long)]
    pub night: Option<PathBuf>,

    /// Simulated seconds per real second. Negative runs time backwards.
    #[arg(long, default_value_t = 3600.0, allow_negative_numbers = true, value_parser = finite)]
    pub speed: f64,

    /// Width of the generated textures and of the blend texture.
    #[arg(long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
    pub texture_width: u32,

    /// Height of the generated textures and of the blend texture.
    #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..))]
    pub texture_height: u32,
}

impl StudioConfig {
    #[inline]
    pub fn texture_size(&self) -> (u32, u32) {
        (self.texture_width, self.texture_height)
    }
}

fn finite(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("must be finite".to_string())
    }
}
