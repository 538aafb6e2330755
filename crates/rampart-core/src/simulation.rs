//! Simulation driver with the three-phase tick.
//!
//! The `Simulation` struct bundles the arena with the systems that act on it
//! and runs them in a fixed order every tick:
//!
//! 1. **TARGETING**: apply player orders, arbitrate switches, attack or move
//! 2. **IMPACTS**: land homing projectiles and detonate area shells
//! 3. **WAVES**: spawn every hostile that is due
//!
//! # Determinism
//!
//! Time is never read from a clock. Every phase receives the caller's `now`,
//! and entities are visited in id order (via `BTreeMap`), so the same inputs
//! replay to the same arena.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rampart_core::config::EngineConfig;
//! use rampart_core::events::{EventLog, MoveQueue};
//! use rampart_core::simulation::Simulation;
//!
//! let events = Arc::new(EventLog::new());
//! let moves = Arc::new(MoveQueue::new());
//! let mut sim = Simulation::new(EngineConfig::default(), events.clone(), moves.clone());
//!
//! sim.start_wave(1, 0).unwrap();
//! for now in (0..=8_000).step_by(100) {
//!     sim.step(now, &[]);
//! }
//!
//! assert_eq!(sim.wave_scheduler().get_enemy_stats(sim.arena()).total_enemies_spawned, 5);
//! assert_eq!(sim.last_now(), Some(8_000));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::arena::Arena;
use crate::config::EngineConfig;
use crate::entity::EntityId;
use crate::error::WaveError;
use crate::events::{GameStateNotifier, Movement};
use crate::resolver::{CombatResolver, ImpactReport};
use crate::targeting::{Order, TargetingReport, TargetingSystem};
use crate::waves::{ArchetypeRegistry, WaveLoader, WaveOrigin, WaveScheduler, WaveTick};

/// Everything that happened during one [`Simulation::step`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// The tick's timestamp.
    pub now: u64,
    /// Targeting phase.
    pub targeting: TargetingReport,
    /// Impact phase.
    pub impacts: Vec<ImpactReport>,
    /// Wave phase.
    pub waves: WaveTick,
}

// =============================================================================
// Simulation
// =============================================================================

/// Owns the arena and drives targeting, impacts and waves.
///
/// Collaborators are injected once: the notifier is shared by the combat
/// resolver and the wave scheduler, the movement sink by the targeting
/// system.
pub struct Simulation {
    /// Entity storage.
    arena: Arena,
    /// Targeting, which owns the combat resolver.
    targeting: TargetingSystem,
    /// Wave pacing.
    scheduler: WaveScheduler,
    /// Timestamp of the last step.
    last_now: Option<u64>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &format!("[{} entities]", self.arena.entity_count()))
            .field("targeting", &self.targeting)
            .field("scheduler", &self.scheduler)
            .field("last_now", &self.last_now)
            .finish()
    }
}

impl Simulation {
    /// Creates a simulation with the built-in archetypes and waves.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        notifier: Arc<dyn GameStateNotifier>,
        movement: Arc<dyn Movement>,
    ) -> Self {
        Self::with_archetypes(config, notifier, movement, ArchetypeRegistry::builtin())
    }

    /// Creates a simulation spawning from `archetypes`.
    #[must_use]
    pub fn with_archetypes(
        config: EngineConfig,
        notifier: Arc<dyn GameStateNotifier>,
        movement: Arc<dyn Movement>,
        archetypes: ArchetypeRegistry,
    ) -> Self {
        let combat = CombatResolver::new(Arc::clone(&notifier), &config);
        let scheduler = WaveScheduler::new(notifier, archetypes, &config);
        Self {
            arena: Arena::new(),
            targeting: TargetingSystem::new(config, combat, movement),
            scheduler,
            last_now: None,
        }
    }

    /// Executes one tick at `now`.
    ///
    /// `orders` are applied to friendly entities before targeting runs. A
    /// `now` earlier than the previous step is logged and still processed.
    pub fn step(&mut self, now: u64, orders: &[(EntityId, Order)]) -> TickReport {
        if let Some(last) = self.last_now.filter(|&last| now < last) {
            warn!(now, last, "time went backwards");
        }

        // PHASE 1: TARGETING
        let targeting = self.targeting.update(&mut self.arena, orders, now);

        // PHASE 2: IMPACTS
        let impacts = self.targeting.combat_mut().resolve_impacts(&mut self.arena, now);

        // PHASE 3: WAVES
        let waves = self.scheduler.update(&mut self.arena, now);

        self.last_now = Some(now);
        trace!(
            now,
            attacks = targeting.attacks.len(),
            impacts = impacts.len(),
            spawned = waves.spawned.len(),
            "tick complete"
        );

        TickReport {
            now,
            targeting,
            impacts,
            waves,
        }
    }

    /// Starts wave `n` at `now`.
    ///
    /// # Errors
    ///
    /// See [`WaveScheduler::start_wave`].
    pub fn start_wave(&mut self, n: u32, now: u64) -> Result<(), WaveError> {
        self.scheduler.start_wave(n, now)
    }

    /// Reloads the wave list through `loader`.
    ///
    /// # Errors
    ///
    /// [`WaveError::AlreadyActive`] while a wave is running.
    pub async fn reload_waves(
        &mut self,
        loader: &WaveLoader,
        path: &str,
    ) -> Result<WaveOrigin, WaveError> {
        self.scheduler.reload(loader, path).await
    }

    /// Removes dead entities and returns their ids.
    pub fn reap_dead(&mut self) -> Vec<EntityId> {
        self.arena.reap_dead()
    }

    /// Returns the arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns the arena mutably, for placing structures and units.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Returns the targeting system.
    #[must_use]
    pub const fn targeting(&self) -> &TargetingSystem {
        &self.targeting
    }

    /// Returns the combat resolver.
    #[must_use]
    pub const fn combat(&self) -> &CombatResolver {
        self.targeting.combat()
    }

    /// Returns the wave scheduler.
    #[must_use]
    pub const fn wave_scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    /// Returns the wave scheduler mutably.
    pub fn wave_scheduler_mut(&mut self) -> &mut WaveScheduler {
        &mut self.scheduler
    }

    /// Timestamp of the last step, `None` before the first.
    #[must_use]
    pub const fn last_now(&self) -> Option<u64> {
        self.last_now
    }
}
