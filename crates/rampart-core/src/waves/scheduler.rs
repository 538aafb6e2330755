//! Wave spawn scheduler.
//!
//! A started wave owns one timeline per enemy-type entry. Timelines advance
//! independently: each spawns at most one entity per [`WaveScheduler::update`]
//! call once `now` reaches its next spawn time, then moves that time forward
//! by its interval. When every timeline is complete the wave goes inactive
//! and the completion is reported in the returned [`WaveTick`], once.
//!
//! Forced spawns run in their own slot next to the regular wave, so they
//! never touch the configured wave list.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::EngineConfig;
use crate::entity::{EntityId, Faction, StructureTargetPriority};
use crate::error::WaveError;
use crate::events::GameStateNotifier;

use super::archetypes::ArchetypeRegistry;
use super::config::{default_waves, WaveConfig, WaveEntry, FORCED_WAVE_NUMBER};
use super::loader::{WaveLoader, WaveOrigin};

// =============================================================================
// Timelines
// =============================================================================

/// Spawn progress of one enemy type inside a running wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeTimeline {
    /// Enemy type.
    pub enemy_type: String,
    /// Spawns required.
    pub count: u32,
    /// Time between spawns.
    pub spawn_interval_ms: u64,
    /// Priority override passed to spawned entities.
    pub structure_target_priority: Option<StructureTargetPriority>,
    /// Spawns so far.
    pub spawned_count: u32,
    /// When the last spawn happened.
    pub last_spawn_time: Option<u64>,
    /// When the next spawn is due.
    pub next_spawn_time: u64,
    /// Set once `spawned_count` reaches `count`.
    pub is_completed: bool,
}

impl TypeTimeline {
    fn start(entry: &WaveEntry, now: u64) -> Self {
        Self {
            enemy_type: entry.enemy_type.clone(),
            count: entry.count,
            spawn_interval_ms: entry.spawn_interval_ms,
            structure_target_priority: entry.structure_target_priority,
            spawned_count: 0,
            last_spawn_time: None,
            next_spawn_time: now.saturating_add(entry.spawn_delay_ms),
            is_completed: entry.count == 0,
        }
    }

    fn is_due(&self, now: u64) -> bool {
        !self.is_completed && now >= self.next_spawn_time
    }

    fn record_spawn(&mut self, now: u64) {
        self.spawned_count += 1;
        self.last_spawn_time = Some(now);
        self.next_spawn_time = self.next_spawn_time.saturating_add(self.spawn_interval_ms);
        if self.spawned_count >= self.count {
            self.is_completed = true;
        }
    }
}

/// A running (or finished) wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RunningWave {
    wave_number: u32,
    start_time: u64,
    is_active: bool,
    spawn_points: Vec<Vec2>,
    cursor: usize,
    timelines: Vec<TypeTimeline>,
}

impl RunningWave {
    fn start(config: &WaveConfig, now: u64) -> Self {
        Self {
            wave_number: config.wave_number,
            start_time: now,
            is_active: true,
            spawn_points: config.spawn_points.clone(),
            cursor: 0,
            timelines: config
                .entries
                .iter()
                .map(|e| TypeTimeline::start(e, now))
                .collect(),
        }
    }

    fn next_spawn_point(&mut self, fallback: Vec2) -> Vec2 {
        if self.spawn_points.is_empty() {
            return fallback;
        }
        let point = self.spawn_points[self.cursor % self.spawn_points.len()];
        self.cursor = (self.cursor + 1) % self.spawn_points.len();
        point
    }

    fn all_completed(&self) -> bool {
        self.timelines.iter().all(|t| t.is_completed)
    }
}

// =============================================================================
// Reports
// =============================================================================

/// What one scheduler update did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveTick {
    /// Entities spawned this update, in spawn order.
    pub spawned: Vec<EntityId>,
    /// Wave that completed during this update.
    pub completed_wave: Option<u32>,
    /// Whether a forced spawn completed during this update.
    pub forced_completed: bool,
}

/// Progress of one enemy type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeProgress {
    /// Enemy type.
    pub enemy_type: String,
    /// Spawned so far.
    pub spawned: u32,
    /// Required.
    pub total: u32,
    /// Whether the timeline is done.
    pub is_completed: bool,
}

/// Snapshot of the current wave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveStatus {
    /// Whether a wave is running.
    pub is_active: bool,
    /// Number of the current or last wave, 0 before any wave started.
    pub wave_number: u32,
    /// Enemies the wave spawns in total.
    pub total_enemies_in_wave: u32,
    /// Enemies spawned so far.
    pub total_spawned_in_wave: u32,
    /// `spawned / total`, 0 for an empty wave.
    pub wave_progress: f32,
    /// Per-type breakdown in configuration order.
    pub per_type_progress: Vec<TypeProgress>,
}

/// Spawn counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Hostiles spawned since the scheduler was created.
    pub total_enemies_spawned: u64,
    /// Living hostiles in the arena.
    pub active_enemies: usize,
}

// =============================================================================
// Scheduler
// =============================================================================

/// Paces hostile spawns across configured waves.
pub struct WaveScheduler {
    waves: BTreeMap<u32, WaveConfig>,
    archetypes: ArchetypeRegistry,
    notifier: Arc<dyn GameStateNotifier>,
    default_spawn_point: Vec2,
    current: Option<RunningWave>,
    forced: Option<RunningWave>,
    total_spawned: u64,
}

impl fmt::Debug for WaveScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveScheduler")
            .field("waves", &self.waves.keys().collect::<Vec<_>>())
            .field("current", &self.current.as_ref().map(|w| w.wave_number))
            .field("forced", &self.forced.is_some())
            .field("total_spawned", &self.total_spawned)
            .finish_non_exhaustive()
    }
}

impl WaveScheduler {
    /// Scheduler with the built-in three-wave schedule.
    #[must_use]
    pub fn new(
        notifier: Arc<dyn GameStateNotifier>,
        archetypes: ArchetypeRegistry,
        config: &EngineConfig,
    ) -> Self {
        let mut scheduler = Self {
            waves: BTreeMap::new(),
            archetypes,
            notifier,
            default_spawn_point: config.default_spawn_point,
            current: None,
            forced: None,
            total_spawned: 0,
        };
        scheduler.install(default_waves());
        scheduler
    }

    /// Scheduler whose waves come from `loader`, falling back to the
    /// built-in schedule on any failure.
    pub async fn from_loader(
        notifier: Arc<dyn GameStateNotifier>,
        archetypes: ArchetypeRegistry,
        config: &EngineConfig,
        loader: &WaveLoader,
        path: &str,
    ) -> Self {
        let loaded = loader.load(path, &archetypes).await;
        let mut scheduler = Self::new(notifier, archetypes, config);
        scheduler.install(loaded.waves);
        scheduler
    }

    fn install(&mut self, waves: Vec<WaveConfig>) {
        let mut table = BTreeMap::new();
        for wave in waves {
            let wave = wave.clamped();
            if table.contains_key(&wave.wave_number) {
                warn!(wave = wave.wave_number, "duplicate wave number, keeping the later one");
            }
            table.insert(wave.wave_number, wave);
        }
        self.waves = table;
    }

    /// Number of configured waves.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Returns true if wave `n` is configured.
    #[must_use]
    pub fn has_wave(&self, n: u32) -> bool {
        self.waves.contains_key(&n)
    }

    /// Configuration of wave `n`.
    #[must_use]
    pub fn wave(&self, n: u32) -> Option<&WaveConfig> {
        self.waves.get(&n)
    }

    /// Returns the archetype registry.
    #[must_use]
    pub const fn archetypes(&self) -> &ArchetypeRegistry {
        &self.archetypes
    }

    /// Returns true while the regular wave is running.
    #[must_use]
    pub fn is_wave_active(&self) -> bool {
        self.current.as_ref().is_some_and(|w| w.is_active)
    }

    /// Returns true while a forced spawn is running.
    #[must_use]
    pub fn is_forced_spawn_active(&self) -> bool {
        self.forced.as_ref().is_some_and(|w| w.is_active)
    }

    /// Swaps in a new wave list.
    ///
    /// # Errors
    ///
    /// [`WaveError::AlreadyActive`] while a wave is running; the old list is kept.
    pub fn replace_waves(&mut self, waves: Vec<WaveConfig>) -> Result<(), WaveError> {
        if let Some(active) = self.current.as_ref().filter(|w| w.is_active) {
            return Err(WaveError::AlreadyActive {
                active: active.wave_number,
            });
        }
        self.install(waves);
        info!(waves = self.waves.len(), "wave configuration replaced");
        Ok(())
    }

    /// Reloads waves through `loader` and swaps them in.
    ///
    /// # Errors
    ///
    /// [`WaveError::AlreadyActive`] while a wave is running.
    pub async fn reload(&mut self, loader: &WaveLoader, path: &str) -> Result<WaveOrigin, WaveError> {
        let loaded = loader.load(path, &self.archetypes).await;
        self.replace_waves(loaded.waves)?;
        Ok(loaded.origin)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts wave `n` at `now`.
    ///
    /// # Errors
    ///
    /// [`WaveError::AlreadyActive`] if a wave is running, or
    /// [`WaveError::UnknownWave`] if `n` is not configured.
    pub fn start_wave(&mut self, n: u32, now: u64) -> Result<(), WaveError> {
        if let Some(active) = self.current.as_ref().filter(|w| w.is_active) {
            return Err(WaveError::AlreadyActive {
                active: active.wave_number,
            });
        }
        let config = self.waves.get(&n).ok_or(WaveError::UnknownWave(n))?;
        self.current = Some(RunningWave::start(config, now));
        info!(wave = n, now, enemies = config.total_enemies(), "wave started");
        Ok(())
    }

    /// Stops the running wave. Returns its number, or `None` if none was running.
    pub fn stop_current_wave(&mut self) -> Option<u32> {
        let wave = self.current.as_mut().filter(|w| w.is_active)?;
        wave.is_active = false;
        info!(wave = wave.wave_number, "wave stopped");
        Some(wave.wave_number)
    }

    /// Spawns `count` enemies of `enemy_type` as a one-off wave.
    ///
    /// Uses `spawn_points` when given, otherwise the current wave's points.
    /// The first spawn happens on the next update.
    ///
    /// # Errors
    ///
    /// [`WaveError::ForcedSpawnActive`] if a forced spawn is still running.
    pub fn force_spawn_enemy_type(
        &mut self,
        enemy_type: &str,
        count: u32,
        spawn_interval_ms: u64,
        spawn_points: Option<Vec<Vec2>>,
        now: u64,
    ) -> Result<(), WaveError> {
        if self.is_forced_spawn_active() {
            return Err(WaveError::ForcedSpawnActive);
        }
        let spawn_points = spawn_points.unwrap_or_else(|| {
            self.current
                .as_ref()
                .map(|w| w.spawn_points.clone())
                .unwrap_or_default()
        });
        let mut config = WaveConfig::new(1, vec![WaveEntry::new(enemy_type, count, spawn_interval_ms, 0)])
            .with_spawn_points(spawn_points)
            .clamped();
        config.wave_number = FORCED_WAVE_NUMBER;

        info!(enemy_type, count = config.total_enemies(), "forced spawn started");
        self.forced = Some(RunningWave::start(&config, now));
        Ok(())
    }

    /// Spawns every due enemy at `now`.
    pub fn update(&mut self, arena: &mut Arena, now: u64) -> WaveTick {
        let mut tick = WaveTick::default();

        if let Some(mut wave) = self.current.take() {
            if wave.is_active && self.advance(&mut wave, arena, now, &mut tick.spawned) {
                info!(wave = wave.wave_number, now, "wave completed");
                tick.completed_wave = Some(wave.wave_number);
            }
            self.current = Some(wave);
        }

        if let Some(mut forced) = self.forced.take() {
            if forced.is_active && self.advance(&mut forced, arena, now, &mut tick.spawned) {
                info!(now, "forced spawn completed");
                tick.forced_completed = true;
            }
            self.forced = Some(forced);
        }
        tick
    }

    /// Advances one running wave; returns true if it completed just now.
    fn advance(
        &mut self,
        wave: &mut RunningWave,
        arena: &mut Arena,
        now: u64,
        spawned: &mut Vec<EntityId>,
    ) -> bool {
        for index in 0..wave.timelines.len() {
            if !wave.timelines[index].is_due(now) {
                continue;
            }
            let point = wave.next_spawn_point(self.default_spawn_point);
            let timeline = &mut wave.timelines[index];
            let template =
                self.archetypes
                    .build(&timeline.enemy_type, timeline.structure_target_priority, point, now);
            let id = arena.spawn(template);
            timeline.record_spawn(now);
            self.total_spawned += 1;
            spawned.push(id);

            debug!(
                wave = wave.wave_number,
                entity = %id,
                enemy_type = %timeline.enemy_type,
                spawned = timeline.spawned_count,
                "enemy spawned"
            );
            self.notifier.on_enemy_spawned(id, now);
        }

        if wave.all_completed() {
            wave.is_active = false;
            return true;
        }
        false
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Status of the current (or last) regular wave.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_wave_status(&self) -> WaveStatus {
        let Some(wave) = &self.current else {
            return WaveStatus::default();
        };
        let per_type_progress: Vec<TypeProgress> = wave
            .timelines
            .iter()
            .map(|t| TypeProgress {
                enemy_type: t.enemy_type.clone(),
                spawned: t.spawned_count,
                total: t.count,
                is_completed: t.is_completed,
            })
            .collect();
        let total: u32 = per_type_progress.iter().map(|p| p.total).sum();
        let spawned: u32 = per_type_progress.iter().map(|p| p.spawned).sum();

        WaveStatus {
            is_active: wave.is_active,
            wave_number: wave.wave_number,
            total_enemies_in_wave: total,
            total_spawned_in_wave: spawned,
            wave_progress: if total > 0 {
                spawned as f32 / total as f32
            } else {
                0.0
            },
            per_type_progress,
        }
    }

    /// Spawn counters; active enemies are the living hostiles in `arena`.
    #[must_use]
    pub fn get_enemy_stats(&self, arena: &Arena) -> EnemyStats {
        EnemyStats {
            total_enemies_spawned: self.total_spawned,
            active_enemies: arena.living(Faction::Hostile).len(),
        }
    }

    /// When the current (or last) wave started.
    #[must_use]
    pub fn wave_start_time(&self) -> Option<u64> {
        self.current.as_ref().map(|w| w.start_time)
    }
}

// =============================================================================
// Tests
// =============================================================================
