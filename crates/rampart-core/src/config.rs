//! Engine-wide tunables.
//!
//! Every constant the systems rely on lives in [`EngineConfig`]. Defaults
//! match the reference behavior; a JSON document may override any subset.
//!
//! ```
//! use rampart_core::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "order_match_weight": 50.0 }"#).unwrap();
//! assert_eq!(config.order_match_weight, 50.0);
//! assert_eq!(config.damage_freshness_ms, 1000);
//! ```

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables shared by the combat, targeting and wave systems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long damage provenance counts as recent.
    pub damage_freshness_ms: u64,
    /// Priority bonus for an attacker that hit within `recent_attacker_window_ms`.
    pub recent_attacker_bonus: f32,
    /// Window for `recent_attacker_bonus`.
    pub recent_attacker_window_ms: u64,
    /// Best-match weight for a hostile matching an active type order.
    pub order_match_weight: f32,
    /// Distance at which a mission destination counts as reached.
    pub arrival_radius: f32,
    /// Distance at which a homing projectile hits.
    pub projectile_hit_radius: f32,
    /// Spawn point used when a wave configures none.
    pub default_spawn_point: Vec2,
    /// Wave loader retry policy.
    pub loader: LoaderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            damage_freshness_ms: 1000,
            recent_attacker_bonus: 15.0,
            recent_attacker_window_ms: 1000,
            order_match_weight: 100.0,
            arrival_radius: 10.0,
            projectile_hit_radius: 5.0,
            default_spawn_point: Vec2::new(-500.0, 0.0),
            loader: LoaderConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid JSON or a
    /// field has the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Retry policy for the asynchronous wave loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_delay_ms: u64,
}

impl LoaderConfig {
    /// Pause between attempts as a `Duration`.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.damage_freshness_ms, 1000);
        assert_eq!(config.recent_attacker_bonus, 15.0);
        assert_eq!(config.order_match_weight, 100.0);
        assert_eq!(config.loader.max_attempts, 3);
        assert_eq!(config.loader.retry_delay(), Duration::from_secs(1));
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "loader": { "max_attempts": 5 } }"#).unwrap();
        assert_eq!(config.loader.max_attempts, 5);
        assert_eq!(config.loader.retry_delay_ms, 1000);
        assert_eq!(config.arrival_radius, 10.0);
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(EngineConfig::from_json_str(r#"{ "arrival_radius": "far" }"#).is_err());
    }

    #[test]
    fn serialization_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }
}
