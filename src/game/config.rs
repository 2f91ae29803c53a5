//! Controller Configuration
//!
//! Every tunable of a bomb controller is supplied from outside; the core
//! carries no defaults. Files store seconds and world units as floats,
//! converted to Q16.16 once at load time.
//!
//! ```json
//! {
//!   "controllers": {
//!     "Player_1": {
//!       "bomb": { "fuse_time": 3.0, "bomb_limit": 1, "blast_radius": 2, ... },
//!       "movement": { "speed": 4.0, "hitbox_half_extent": 0.35 }
//!     },
//!     "Player_2": { ... }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::fixed::Fixed;
use crate::game::state::PlayerId;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File is not valid JSON for this schema.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// No entry for a player that needs one.
    #[error("no controller config for {0}")]
    MissingController(PlayerId),

    /// A duration or extent that must be > 0 is not.
    #[error("{controller}: {field} must be positive")]
    NonPositive {
        /// Controller the field belongs to
        controller: PlayerId,
        /// Field name
        field: &'static str,
    },

    /// A step count is zero.
    #[error("{controller}: {field} must be at least 1")]
    ZeroSteps {
        /// Controller the field belongs to
        controller: PlayerId,
        /// Field name
        field: &'static str,
    },

    /// A magnitude that must be >= 0 is negative.
    #[error("{controller}: {field} must not be negative")]
    Negative {
        /// Controller the field belongs to
        controller: PlayerId,
        /// Field name
        field: &'static str,
    },
}

/// Serde adapter: float in files, Q16.16 in memory.
mod fixed_units {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::core::fixed::{to_fixed, Fixed, FIXED_ONE};

    pub fn serialize<S: Serializer>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*value as f64 / FIXED_ONE as f64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fixed, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(to_fixed(value))
    }
}

/// Bomb, pulse and blast tuning for one controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BombConfig {
    /// Seconds from placement to explosion
    #[serde(with = "fixed_units")]
    pub fuse_time: Fixed,
    /// Max bombs this controller may have ticking at once
    pub bomb_limit: u32,
    /// Blast cells per direction
    pub blast_radius: u32,
    /// Seconds per pulse sub-step
    #[serde(with = "fixed_units")]
    pub pulse_step_time: Fixed,
    /// Sub-steps per grow (and per shrink) half-cycle
    pub pulse_steps: u32,
    /// Extra scale at the top of a pulse
    #[serde(with = "fixed_units")]
    pub pulse_amount: Fixed,
    /// Seconds a blast effect stays alive
    #[serde(with = "fixed_units")]
    pub blast_lifetime: Fixed,
    /// Growth sub-steps over the blast lifetime
    pub blast_steps: u32,
    /// Extra scale a blast reaches at the end of its life
    #[serde(with = "fixed_units")]
    pub blast_growth: Fixed,
}

/// Player movement tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovementConfig {
    /// World units per second
    #[serde(with = "fixed_units")]
    pub speed: Fixed,
    /// Half the side of the player's square hitbox
    #[serde(with = "fixed_units")]
    pub hitbox_half_extent: Fixed,
}

/// Everything one player's controller needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Bomb tuning
    pub bomb: BombConfig,
    /// Movement tuning
    pub movement: MovementConfig,
}

/// Configuration for a whole arena, keyed by player slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArenaConfig {
    /// Per-controller settings
    pub controllers: BTreeMap<PlayerId, ControllerConfig>,
}

impl ArenaConfig {
    /// Same settings for every player.
    pub fn uniform(controller: ControllerConfig) -> Self {
        let controllers = PlayerId::ALL
            .iter()
            .map(|id| (*id, controller.clone()))
            .collect();
        Self { controllers }
    }

    /// Parse and validate JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ArenaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Settings for one player.
    pub fn controller(&self, id: PlayerId) -> Option<&ControllerConfig> {
        self.controllers.get(&id)
    }

    /// Check every player has sane settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for id in PlayerId::ALL {
            let controller = self
                .controllers
                .get(&id)
                .ok_or(ConfigError::MissingController(id))?;
            controller.validate(id)?;
        }
        Ok(())
    }
}

impl ControllerConfig {
    fn validate(&self, controller: PlayerId) -> Result<(), ConfigError> {
        let bomb = &self.bomb;
        let movement = &self.movement;

        let positive = [
            ("fuse_time", bomb.fuse_time),
            ("pulse_step_time", bomb.pulse_step_time),
            ("blast_lifetime", bomb.blast_lifetime),
            ("hitbox_half_extent", movement.hitbox_half_extent),
        ];
        for (field, value) in positive {
            if value <= 0 {
                return Err(ConfigError::NonPositive { controller, field });
            }
        }

        let steps = [("pulse_steps", bomb.pulse_steps), ("blast_steps", bomb.blast_steps)];
        for (field, value) in steps {
            if value == 0 {
                return Err(ConfigError::ZeroSteps { controller, field });
            }
        }

        let non_negative = [
            ("pulse_amount", bomb.pulse_amount),
            ("blast_growth", bomb.blast_growth),
            ("speed", movement.speed),
        ];
        for (field, value) in non_negative {
            if value < 0 {
                return Err(ConfigError::Negative { controller, field });
            }
        }

        Ok(())
    }
}

/// Settings shared by the unit tests of the game modules.
#[cfg(test)]
pub(crate) fn test_controller_config() -> ControllerConfig {
    use crate::core::fixed::to_fixed;

    ControllerConfig {
        bomb: BombConfig {
            fuse_time: to_fixed(3.0),
            bomb_limit: 1,
            blast_radius: 2,
            pulse_step_time: to_fixed(0.05),
            pulse_steps: 10,
            pulse_amount: to_fixed(0.1),
            blast_lifetime: to_fixed(1.5),
            blast_steps: 10,
            blast_growth: to_fixed(0.2),
        },
        movement: MovementConfig {
            speed: to_fixed(4.0),
            hitbox_half_extent: to_fixed(0.35),
        },
    }
}
