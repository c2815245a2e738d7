//! Terra studio: renders a globe's day and night sides blended by a moving
//! sun on a viewport-filling quad.
//!
//! Keys: `Space` pause, `+`/`-` double/halve simulation speed, `Esc` exit.

mod config;
mod studio;
mod sun;
mod textures;

use anyhow::Result;
use clap::Parser;

use terra_engine::device::GpuInit;
use terra_engine::logging::{init_logging, LoggingConfig};
use terra_engine::time::ClockConfig;
use terra_engine::window::{Runtime, RuntimeConfig};

use config::StudioConfig;
use studio::Studio;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::parse();
    log::info!("starting terra studio: {config:?}");

    let runtime = RuntimeConfig {
        title: "terra studio".to_string(),
        clock: ClockConfig {
            speed: config.speed,
            // Start at noon over longitude 0.
            start_time: 0.5 * sun::SECONDS_PER_DAY,
            paused: false,
        },
        ..RuntimeConfig::default()
    };

    Runtime::run(runtime, GpuInit::default(), Studio::new(config))
}
