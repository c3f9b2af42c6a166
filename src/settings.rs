//! Game tuning and quality presets
//!
//! Every gameplay constant that is a judgement call lives in [`GameConfig`].
//! Hosts may override any subset from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Framebuffer resolution relative to the canvas size
    pub fn resolution_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.35,
            QualityPreset::Medium => 0.5,
            QualityPreset::High => 1.0,
        }
    }

    /// Whether the danger vignette scatters flicker pixels
    pub fn flicker_enabled(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }
}

/// Session tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Rendering quality
    pub quality: QualityPreset,

    // === Maze ===
    /// Grid width in cells (odd, >= 5)
    pub maze_width: usize,
    /// Grid height in cells (odd, >= 5)
    pub maze_height: usize,
    /// Fraction of all cells sampled by the loop-injection pass
    pub loop_fraction: f32,
    /// Floor neighbors a wall needs before the loop pass opens it
    pub loop_min_floor_neighbors: u8,

    // === Placement ===
    /// Minimum distance from the player spawn to every key
    pub key_min_distance: f32,
    /// Minimum distance from the player spawn to the exit
    pub exit_min_distance: f32,
    /// Enemy spawn band around the player (min, max)
    pub enemy_spawn_band: (f32, f32),
    /// Resampling budget for keys and exit
    pub placement_attempts: u32,
    /// Resampling budget for the enemy band before falling back
    pub enemy_band_attempts: u32,

    // === Player ===
    /// Horizontal field of view (radians)
    pub fov: f32,
    /// Player speed (cells/sec)
    pub player_speed: f32,
    /// Collision half-extent for player and enemy
    pub collision_radius: f32,
    /// Radians of turn per pixel of look drag
    pub look_sensitivity: f32,
    /// Stick magnitude below which input is ignored
    pub input_deadzone: f32,
    /// Exponent applied to stick magnitude (< 1 boosts small deflections)
    pub input_curve: f32,
    /// Distance walked between footstep blips
    pub stride_length: f32,

    // === Enemy ===
    /// Wandering speed (cells/sec)
    pub enemy_wander_speed: f32,
    /// Chasing speed (cells/sec)
    pub enemy_chase_speed: f32,
    /// Turn rate toward the target angle (radians/sec)
    pub enemy_turn_rate: f32,
    /// Line-of-sight range
    pub sight_range: f32,
    /// Line-of-sight march step
    pub sight_step: f32,
    /// Seconds without sight before a chase is abandoned
    pub chase_cooldown: f32,
    /// Per-frame chance of a random wander turn
    pub wander_turn_chance: f64,
    /// Forward probe length used for wall avoidance
    pub wander_probe: f32,
    /// Distance at which the enemy catches the player
    pub catch_radius: f32,

    // === Rendering ===
    /// Distance at which walls fade fully into fog
    pub fog_distance: f32,
    /// Brightness multiplier for walls hit on a Y step
    pub side_shade: f32,
    /// Sprites further than this fraction of the FOV off-center are culled
    pub sprite_cull_fraction: f32,
    /// Player-enemy distance at which the danger vignette starts
    pub danger_range: f32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            maze_width: 31,
            maze_height: 31,
            loop_fraction: 0.02,
            loop_min_floor_neighbors: 2,

            key_min_distance: 8.0,
            exit_min_distance: 10.0,
            enemy_spawn_band: (6.0, 10.0),
            placement_attempts: 10_000,
            enemy_band_attempts: 2_000,

            fov: std::f32::consts::FRAC_PI_3,
            player_speed: 2.6,
            collision_radius: 0.2,
            look_sensitivity: 0.004,
            input_deadzone: 0.12,
            input_curve: 0.65,
            stride_length: 0.9,

            enemy_wander_speed: 1.1,
            enemy_chase_speed: 2.1,
            enemy_turn_rate: 3.2,
            sight_range: 12.0,
            sight_step: 0.1,
            chase_cooldown: 1.8,
            wander_turn_chance: 0.02,
            wander_probe: 0.6,
            catch_radius: 0.45,

            fog_distance: 14.0,
            side_shade: 0.72,
            sprite_cull_fraction: 0.6,
            danger_range: 9.0,

            master_volume: 0.8,
        }
    }
}

impl GameConfig {
    /// Create a config from a quality preset (other fields default)
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON override. Out-of-range values are
    /// pulled back into range (see [`GameConfig::sanitized`]).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Clamp every field to a playable range. Values that cannot be ordered
    /// (NaN) fall back to the default.
    pub fn sanitized(self) -> Self {
        let c = self;
        let d = Self::default();
        macro_rules! field {
            ($name:ident, $lo:expr, $hi:expr) => {
                bounded(stringify!($name), c.$name, $lo, $hi, d.$name)
            };
        }

        let (near, far) = c.enemy_spawn_band;
        let near = bounded("enemy_spawn_band.0", near, 0.0, 64.0, d.enemy_spawn_band.0);
        let far = bounded("enemy_spawn_band.1", far, near, 64.0, d.enemy_spawn_band.1.max(near));

        Self {
            quality: c.quality,

            maze_width: field!(maze_width, 5, 1001),
            maze_height: field!(maze_height, 5, 1001),
            loop_fraction: field!(loop_fraction, 0.0, 1.0),
            loop_min_floor_neighbors: field!(loop_min_floor_neighbors, 2, 4),

            key_min_distance: field!(key_min_distance, 0.0, 64.0),
            exit_min_distance: field!(exit_min_distance, 0.0, 64.0),
            enemy_spawn_band: (near, far),
            placement_attempts: field!(placement_attempts, 1, 1_000_000),
            enemy_band_attempts: field!(enemy_band_attempts, 1, 1_000_000),

            fov: field!(fov, 0.2, 2.8),
            player_speed: field!(player_speed, 0.0, 20.0),
            collision_radius: field!(collision_radius, 0.05, 0.45),
            look_sensitivity: field!(look_sensitivity, 0.0, 0.1),
            input_deadzone: field!(input_deadzone, 0.0, 0.9),
            input_curve: field!(input_curve, 0.1, 4.0),
            stride_length: field!(stride_length, 0.1, 10.0),

            enemy_wander_speed: field!(enemy_wander_speed, 0.0, 20.0),
            enemy_chase_speed: field!(enemy_chase_speed, 0.0, 20.0),
            enemy_turn_rate: field!(enemy_turn_rate, 0.1, 50.0),
            sight_range: field!(sight_range, 0.0, 128.0),
            sight_step: field!(sight_step, 0.01, 1.0),
            chase_cooldown: field!(chase_cooldown, 0.0, 60.0),
            wander_turn_chance: field!(wander_turn_chance, 0.0, 1.0),
            wander_probe: field!(wander_probe, 0.1, 2.0),
            catch_radius: field!(catch_radius, 0.0, 4.0),

            fog_distance: field!(fog_distance, 0.5, 128.0),
            side_shade: field!(side_shade, 0.0, 1.0),
            sprite_cull_fraction: field!(sprite_cull_fraction, 0.0, 1.0),
            danger_range: field!(danger_range, 0.0, 128.0),

            master_volume: field!(master_volume, 0.0, 1.0),
        }
    }

    /// Maze size clamped to odd dimensions of at least 5
    pub fn maze_size(&self) -> (usize, usize) {
        (
            crate::sim::maze::valid_dimension(self.maze_width),
            crate::sim::maze::valid_dimension(self.maze_height),
        )
    }
}

/// `value` if it lies in `[lo, hi]`, else the nearest bound (or `default`
/// when it does not compare at all)
fn bounded<T>(name: &str, value: T, lo: T, hi: T, default: T) -> T
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    let out = if value < lo {
        lo
    } else if value > hi {
        hi
    } else if value >= lo && value <= hi {
        return value;
    } else {
        default
    };
    log::warn!("Config {} = {} out of range [{}, {}], using {}", name, value, lo, hi, out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = GameConfig::from_json(r#"{ "maze_width": 21, "quality": "High" }"#).unwrap();
        assert_eq!(cfg.maze_width, 21);
        assert_eq!(cfg.quality, QualityPreset::High);
        assert_eq!(cfg.maze_height, GameConfig::default().maze_height);
        assert!((cfg.chase_cooldown - 1.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let cfg = GameConfig::from_json(
            r#"{
                "wander_turn_chance": 1.5,
                "collision_radius": -1.0,
                "maze_width": 2,
                "loop_min_floor_neighbors": 0,
                "enemy_spawn_band": [10.0, 4.0],
                "master_volume": 3.0
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.wander_turn_chance, 1.0);
        assert_eq!(cfg.collision_radius, 0.05);
        assert_eq!(cfg.maze_width, 5);
        assert_eq!(cfg.loop_min_floor_neighbors, 2);
        assert_eq!(cfg.enemy_spawn_band, (10.0, 10.0));
        assert_eq!(cfg.master_volume, 1.0);
    }

    #[test]
    fn test_nan_falls_back_to_default() {
        let cfg = GameConfig {
            fov: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(cfg.fov, GameConfig::default().fov);
    }

    #[test]
    fn test_defaults_survive_sanitizing() {
        assert_eq!(GameConfig::default().sanitized(), GameConfig::default());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(GameConfig::from_json("{ maze_width: }").is_err());
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert_eq!(QualityPreset::from_str(QualityPreset::High.as_str()), Some(QualityPreset::High));
        assert!(!QualityPreset::Low.flicker_enabled());
    }

    #[test]
    fn test_maze_size_is_odd() {
        let cfg = GameConfig {
            maze_width: 20,
            maze_height: 3,
            ..Default::default()
        };
        assert_eq!(cfg.maze_size(), (21, 5));
    }
}
