use super::{FrameClock, FrameTime};

/// Simulation clock settings.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Simulated seconds per real second.
    pub speed: f64,
    /// Simulation time at start-up, in seconds.
    pub start_time: f64,
    pub paused: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            start_time: 0.0,
            paused: false,
        }
    }
}

/// Frame clock plus a scaled, pausable simulation time.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    frame: FrameClock,
    time: f64,
    speed: f64,
    paused: bool,
}

impl SimulationClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            frame: FrameClock::new(),
            time: config.start_time,
            speed: config.speed,
            paused: config.paused,
        }
    }

    /// Ticks the frame clock and advances simulation time by the clamped dt.
    pub fn tick(&mut self) -> FrameTime {
        let mut ft = self.frame.tick();
        ft.simulation_dt = self.advance(ft.dt as f64);
        ft.simulation_time = self.time;
        ft
    }

    /// Advances by `real_dt` seconds; returns the simulated seconds added.
    pub fn advance(&mut self, real_dt: f64) -> f64 {
        if self.paused {
            return 0.0;
        }
        let dt = real_dt * self.speed;
        self.time += dt;
        dt
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        log::info!("simulation speed x{speed}");
        self.speed = speed;
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        log::info!("simulation {}", if self.paused { "paused" } else { "resumed" });
        self.paused
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_scales_simulated_time() {
        let mut clock = SimulationClock::new(ClockConfig {
            speed: 60.0,
            start_time: 10.0,
            paused: false,
        });
        assert_eq!(clock.advance(0.5), 30.0);
        assert_eq!(clock.time(), 40.0);
    }

    #[test]
    fn paused_clock_holds_time() {
        let mut clock = SimulationClock::default();
        clock.advance(1.0);
        assert!(clock.toggle_paused());
        assert_eq!(clock.advance(5.0), 0.0);
        assert_eq!(clock.time(), 1.0);

        clock.set_paused(false);
        clock.advance(1.0);
        assert_eq!(clock.time(), 2.0);
    }

    #[test]
    fn tick_reports_simulated_time() {
        let mut clock = SimulationClock::new(ClockConfig {
            speed: 2.0,
            ..ClockConfig::default()
        });
        let ft = clock.tick();
        assert_eq!(ft.simulation_dt, ft.dt as f64 * 2.0);
        assert_eq!(ft.simulation_time, clock.time());
    }
}
