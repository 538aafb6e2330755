//! Wave configuration, loading and spawn pacing.
//!
//! - [`WaveConfig`] / [`WaveEntry`]: what a wave spawns and how fast
//! - [`ArchetypeRegistry`]: per-type stats applied at spawn time
//! - [`WaveLoader`]: asynchronous, retrying configuration loader with a
//!   built-in fallback
//! - [`WaveScheduler`]: runs one wave at a time plus an optional forced spawn
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rampart_core::arena::Arena;
//! use rampart_core::config::EngineConfig;
//! use rampart_core::events::EventLog;
//! use rampart_core::waves::{ArchetypeRegistry, WaveScheduler};
//!
//! let mut arena = Arena::new();
//! let mut scheduler = WaveScheduler::new(
//!     Arc::new(EventLog::new()),
//!     ArchetypeRegistry::builtin(),
//!     &EngineConfig::default(),
//! );
//!
//! scheduler.start_wave(1, 0).unwrap();
//! let tick = scheduler.update(&mut arena, 0);
//!
//! assert_eq!(tick.spawned.len(), 1);
//! assert_eq!(scheduler.get_wave_status().total_enemies_in_wave, 5);
//! ```

mod archetypes;
mod config;
mod loader;
mod scheduler;

pub use archetypes::{ArchetypeRegistry, EnemyArchetype};
pub use config::{
    default_waves, WaveConfig, WaveEntry, COORDINATE_LIMIT, FORCED_WAVE_NUMBER,
    SPAWN_COUNT_RANGE, SPAWN_DELAY_RANGE_MS, SPAWN_INTERVAL_RANGE_MS, WAVE_NUMBER_RANGE,
};
pub use loader::{convert_rows, JsonFileSource, LoadedWaves, WaveLoader, WaveOrigin, WaveRow, WaveSource};
pub use scheduler::{EnemyStats, TypeProgress, TypeTimeline, WaveScheduler, WaveStatus, WaveTick};
