//! # World Mover
//!
//! The player never moves forward; the world scrolls toward them. The mover
//! owns the scroll speed and turns each tick into one displacement that the
//! spawner applies to every chunk.

use serde::{Deserialize, Serialize};
use strider_shared::constants::{DEFAULT_ACCELERATION, DEFAULT_BASE_SPEED, DEFAULT_MAX_SPEED};

/// Scroll tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoverConfig {
    /// Speed at start and after a reset.
    pub base_speed: f32,
    /// Ramp the speed up over time.
    pub use_acceleration: bool,
    /// Speed gained per second.
    pub acceleration: f32,
    /// Acceleration and `set_speed` stop here.
    pub max_speed: f32,
    /// Scales every displacement.
    pub speed_multiplier: f32,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            base_speed: DEFAULT_BASE_SPEED,
            use_acceleration: true,
            acceleration: DEFAULT_ACCELERATION,
            max_speed: DEFAULT_MAX_SPEED,
            speed_multiplier: 1.0,
        }
    }
}

impl MoverConfig {
    /// Clamps values into a usable range.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.max_speed = self.max_speed.max(0.0);
        self.base_speed = self.base_speed.clamp(0.0, self.max_speed);
        self.acceleration = self.acceleration.max(0.0);
        self.speed_multiplier = self.speed_multiplier.max(0.0);
        self
    }
}

/// Scroll speed and distance travelled.
#[derive(Clone, Debug)]
pub struct WorldMover {
    config: MoverConfig,
    current_speed: f32,
    distance: f32,
}

impl WorldMover {
    /// Creates a mover at base speed.
    #[must_use]
    pub fn new(config: MoverConfig) -> Self {
        Self {
            current_speed: config.base_speed,
            config,
            distance: 0.0,
        }
    }

    /// Advances one tick and returns this tick's displacement.
    ///
    /// The displacement uses the speed at the start of the tick;
    /// acceleration applies afterwards.
    pub fn tick(&mut self, dt: f32) -> f32 {
        let displacement = self.current_speed * self.config.speed_multiplier * dt;
        self.distance += displacement;

        if self.config.use_acceleration && self.current_speed > 0.0 {
            self.current_speed =
                (self.current_speed + self.config.acceleration * dt).min(self.config.max_speed);
        }
        displacement
    }

    /// Sets a new base speed (clamped to `[0, max_speed]`) and jumps to it.
    pub fn set_speed(&mut self, speed: f32) {
        self.config.base_speed = speed.clamp(0.0, self.config.max_speed);
        self.current_speed = self.config.base_speed;
    }

    /// Stops scrolling.
    pub fn pause(&mut self) {
        self.current_speed = 0.0;
    }

    /// Restarts at base speed if stopped or reversed.
    pub fn resume(&mut self) {
        if self.current_speed <= 0.0 {
            self.current_speed = self.config.base_speed;
        }
    }

    /// Scrolls backwards at twice the base speed.
    pub fn reverse(&mut self) {
        self.current_speed = -2.0 * self.config.base_speed;
    }

    /// Back to base speed with the distance counter cleared.
    pub fn reset(&mut self) {
        self.current_speed = self.config.base_speed;
        self.distance = 0.0;
    }

    /// Current scroll speed.
    #[inline]
    #[must_use]
    pub const fn current_speed(&self) -> f32 {
        self.current_speed
    }

    /// Base speed.
    #[inline]
    #[must_use]
    pub const fn base_speed(&self) -> f32 {
        self.config.base_speed
    }

    /// Total displacement since the last reset.
    #[inline]
    #[must_use]
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// `true` while not scrolling.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.current_speed == 0.0
    }
}

impl Default for WorldMover {
    fn default() -> Self {
        Self::new(MoverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady() -> WorldMover {
        WorldMover::new(MoverConfig {
            use_acceleration: false,
            ..MoverConfig::default()
        })
    }

    #[test]
    fn test_tick_displacement_and_distance() {
        let mut mover = steady();
        let d = mover.tick(0.5);
        assert!((d - 5.0).abs() < 1e-6);
        mover.tick(0.5);
        assert!((mover.distance() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_acceleration_caps_at_max() {
        let mut mover = WorldMover::new(MoverConfig {
            acceleration: 100.0,
            ..MoverConfig::default()
        });
        mover.tick(1.0);
        assert_eq!(mover.current_speed(), 30.0);
        mover.tick(1.0);
        assert_eq!(mover.current_speed(), 30.0);
    }

    #[test]
    fn test_speed_multiplier_scales_displacement() {
        let mut mover = WorldMover::new(MoverConfig {
            use_acceleration: false,
            speed_multiplier: 2.0,
            ..MoverConfig::default()
        });
        assert!((mover.tick(1.0) - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_speed_clamps() {
        let mut mover = steady();
        mover.set_speed(100.0);
        assert_eq!(mover.current_speed(), 30.0);
        mover.set_speed(-5.0);
        assert_eq!(mover.current_speed(), 0.0);
    }

    #[test]
    fn test_pause_resume() {
        let mut mover = steady();
        mover.pause();
        assert!(mover.is_paused());
        assert_eq!(mover.tick(1.0), 0.0);
        mover.resume();
        assert_eq!(mover.current_speed(), 10.0);
    }

    #[test]
    fn test_reverse_and_reset() {
        let mut mover = steady();
        mover.tick(1.0);
        mover.reverse();
        assert_eq!(mover.current_speed(), -20.0);
        assert!(mover.tick(1.0) < 0.0);

        mover.reset();
        assert_eq!(mover.current_speed(), 10.0);
        assert_eq!(mover.distance(), 0.0);
    }

    #[test]
    fn test_reverse_does_not_accelerate() {
        let mut mover = WorldMover::default();
        mover.reverse();
        mover.tick(1.0);
        assert_eq!(mover.current_speed(), -20.0);
    }

    #[test]
    fn test_sanitized_orders_speeds() {
        let config = MoverConfig {
            base_speed: 50.0,
            max_speed: 20.0,
            acceleration: -1.0,
            ..MoverConfig::default()
        }
        .sanitized();
        assert_eq!(config.base_speed, 20.0);
        assert_eq!(config.acceleration, 0.0);
    }
}
