//! Runtime pacing and file locations.

use std::path::PathBuf;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Interval of the render tick that advances unit animations.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Delays the battle script waits on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pacing {
    pub letters_per_second: f32,
    pub short_pause_ms: u64,
    pub action_pause_ms: u64,
    /// Multiplier applied to every delay; 2.0 plays twice as fast.
    pub speed: f32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            letters_per_second: 40.0,
            short_pause_ms: 1000,
            action_pause_ms: 2000,
            speed: 1.0,
        }
    }
}

impl Pacing {
    pub fn with_speed(speed: f32) -> Self {
        Self {
            speed,
            ..Self::default()
        }
    }

    pub fn scaled(&self, duration: Duration) -> Duration {
        if self.speed <= 0.0 || !self.speed.is_finite() || self.speed == 1.0 {
            return duration;
        }
        Duration::from_nanos((duration.as_nanos() as f64 / self.speed as f64).round() as u64)
    }

    pub fn letter_delay(&self) -> Duration {
        let lps = self.letters_per_second.max(1.0) as f64;
        self.scaled(Duration::from_nanos((1e9 / lps).round() as u64))
    }

    pub fn short_pause(&self) -> Duration {
        self.scaled(Duration::from_millis(self.short_pause_ms))
    }

    pub fn action_pause(&self) -> Duration {
        self.scaled(Duration::from_millis(self.action_pause_ms))
    }
}

pub fn default_log_path() -> PathBuf {
    let base = dirs_next::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("pocketbattle").join("pocketbattle.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pacing_matches_battle_timings() {
        let pacing = Pacing::default();
        assert_eq!(pacing.letter_delay(), Duration::from_millis(25));
        assert_eq!(pacing.short_pause(), Duration::from_secs(1));
        assert_eq!(pacing.action_pause(), Duration::from_secs(2));
    }

    #[test]
    fn speed_scales_every_delay() {
        let pacing = Pacing::with_speed(2.0);
        assert_eq!(pacing.short_pause(), Duration::from_millis(500));
        assert_eq!(pacing.action_pause(), Duration::from_secs(1));
        assert_eq!(Pacing::with_speed(0.0).short_pause(), Duration::from_secs(1));
    }
}
