//! Wave configuration and the built-in fallback schedule.
//!
//! Out-of-range values are clamped, never rejected: every clamp logs a
//! warning naming the field.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::StructureTargetPriority;

/// Wave numbers accepted from configuration.
pub const WAVE_NUMBER_RANGE: (u32, u32) = (1, 999);
/// Spawn counts accepted per entry.
pub const SPAWN_COUNT_RANGE: (u32, u32) = (1, 100);
/// Spawn intervals accepted per entry.
pub const SPAWN_INTERVAL_RANGE_MS: (u64, u64) = (100, 60_000);
/// Spawn delays accepted per entry.
pub const SPAWN_DELAY_RANGE_MS: (u64, u64) = (0, 300_000);
/// Bound on each spawn-point coordinate.
pub const COORDINATE_LIMIT: f32 = 1000.0;
/// Wave number of forced one-off spawns; outside the configurable range.
pub const FORCED_WAVE_NUMBER: u32 = 1000;

fn clamp_logged<T>(field: &'static str, value: T, (min, max): (T, T)) -> T
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if value < min {
        warn!(field, %value, %min, "value below range, clamping");
        min
    } else if value > max {
        warn!(field, %value, %max, "value above range, clamping");
        max
    } else {
        value
    }
}

/// One enemy type inside a wave, with its own spawn timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveEntry {
    /// Lower-case enemy type.
    pub enemy_type: String,
    /// How many to spawn.
    pub count: u32,
    /// Time between two spawns of this type.
    pub spawn_interval_ms: u64,
    /// Time from wave start to the first spawn of this type.
    #[serde(default)]
    pub spawn_delay_ms: u64,
    /// Overrides the type's structure priority.
    #[serde(default)]
    pub structure_target_priority: Option<StructureTargetPriority>,
}

impl WaveEntry {
    /// Entry with no priority override.
    #[must_use]
    pub fn new(enemy_type: impl Into<String>, count: u32, spawn_interval_ms: u64, spawn_delay_ms: u64) -> Self {
        Self {
            enemy_type: enemy_type.into(),
            count,
            spawn_interval_ms,
            spawn_delay_ms,
            structure_target_priority: None,
        }
    }

    /// Sets the structure priority override.
    #[must_use]
    pub fn with_priority(mut self, priority: StructureTargetPriority) -> Self {
        self.structure_target_priority = Some(priority);
        self
    }

    /// Returns a copy with the type normalized and every number in range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            enemy_type: self.enemy_type.trim().to_ascii_lowercase(),
            count: clamp_logged("count", self.count, SPAWN_COUNT_RANGE),
            spawn_interval_ms: clamp_logged(
                "spawn_interval_ms",
                self.spawn_interval_ms,
                SPAWN_INTERVAL_RANGE_MS,
            ),
            spawn_delay_ms: clamp_logged("spawn_delay_ms", self.spawn_delay_ms, SPAWN_DELAY_RANGE_MS),
            structure_target_priority: self.structure_target_priority,
        }
    }
}

/// A configured wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Wave number, 1 to 999.
    pub wave_number: u32,
    /// Enemy types, each with its own timeline.
    pub entries: Vec<WaveEntry>,
    /// Spawn points used round-robin; empty means the engine default.
    #[serde(default)]
    pub spawn_points: Vec<Vec2>,
}

impl WaveConfig {
    /// Wave with no spawn points of its own.
    #[must_use]
    pub fn new(wave_number: u32, entries: Vec<WaveEntry>) -> Self {
        Self {
            wave_number,
            entries,
            spawn_points: Vec::new(),
        }
    }

    /// Sets the spawn points.
    #[must_use]
    pub fn with_spawn_points(mut self, spawn_points: Vec<Vec2>) -> Self {
        self.spawn_points = spawn_points;
        self
    }

    /// Total enemies across all entries.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Returns a copy with every field in range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            wave_number: clamp_logged("wave_number", self.wave_number, WAVE_NUMBER_RANGE),
            entries: self.entries.into_iter().map(WaveEntry::clamped).collect(),
            spawn_points: self.spawn_points.into_iter().map(clamp_point).collect(),
        }
    }
}

fn clamp_point(point: Vec2) -> Vec2 {
    Vec2::new(clamp_coordinate("spawn_x", point.x), clamp_coordinate("spawn_y", point.y))
}

fn clamp_coordinate(field: &'static str, value: f32) -> f32 {
    if value.is_nan() {
        warn!(field, "coordinate is not a number, using 0");
        return 0.0;
    }
    clamp_logged(field, value, (-COORDINATE_LIMIT, COORDINATE_LIMIT))
}

/// The built-in three-wave schedule used when no configuration loads.
#[must_use]
pub fn default_waves() -> Vec<WaveConfig> {
    vec![
        WaveConfig::new(1, vec![WaveEntry::new("basic", 5, 2000, 0)]),
        WaveConfig::new(
            2,
            vec![
                WaveEntry::new("basic", 8, 1500, 0),
                WaveEntry::new("fast", 3, 2500, 5000),
            ],
        ),
        WaveConfig::new(
            3,
            vec![
                WaveEntry::new("basic", 10, 1200, 0),
                WaveEntry::new("fast", 5, 2000, 3000),
                WaveEntry::new("tank", 2, 6000, 10_000)
                    .with_priority(StructureTargetPriority::Gate),
            ],
        ),
    ]
}
