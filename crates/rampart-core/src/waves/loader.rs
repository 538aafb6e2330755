//! Asynchronous wave configuration loading.
//!
//! A [`WaveSource`] fetches raw rows; [`WaveLoader`] retries transient
//! failures, normalizes the rows into [`WaveConfig`]s and falls back to
//! [`default_waves`] when nothing usable comes back. [`WaveLoader::load`]
//! never fails.
//!
//! Rows are flat maps. Header names are matched case-insensitively with
//! whitespace, `_` and `-` ignored, and several aliases are accepted:
//!
//! | Field | Accepted headers |
//! |-------|------------------|
//! | wave number | `wave`, `wavenumber`, `w` |
//! | enemy type | `enemytype`, `type`, `enemy` |
//! | count | `count`, `cnt`, `amount` |
//! | spawn interval (ms) | `spawninterval`, `interval`, `int` |
//! | spawn delay (ms) | `spawndelay`, `delay` |
//! | structure priority | `structuretargetpriority`, `targetpriority`, `priority` |
//! | spawn point | `spawnx`/`x` and `spawny`/`y` |

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::entity::StructureTargetPriority;
use crate::error::LoadError;

use super::archetypes::ArchetypeRegistry;
use super::config::{default_waves, WaveConfig, WaveEntry, WAVE_NUMBER_RANGE};

const WAVE_KEYS: &[&str] = &["wave", "wavenumber", "w"];
const TYPE_KEYS: &[&str] = &["enemytype", "type", "enemy"];
const COUNT_KEYS: &[&str] = &["count", "cnt", "amount"];
const INTERVAL_KEYS: &[&str] = &["spawninterval", "interval", "int"];
const DELAY_KEYS: &[&str] = &["spawndelay", "delay"];
const PRIORITY_KEYS: &[&str] = &["structuretargetpriority", "targetpriority", "priority"];
const X_KEYS: &[&str] = &["spawnx", "x"];
const Y_KEYS: &[&str] = &["spawny", "y"];

const DEFAULT_COUNT: u32 = 1;
const DEFAULT_INTERVAL_MS: u64 = 1000;

// =============================================================================
// Rows
// =============================================================================

/// One raw configuration row as read from a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveRow(BTreeMap<String, Value>);

impl WaveRow {
    /// Builds a row from header/value pairs.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// First value whose normalized header is one of `aliases`.
    fn field(&self, aliases: &[&str]) -> Option<&Value> {
        self.0
            .iter()
            .find(|(key, _)| aliases.contains(&normalize_header(key).as_str()))
            .map(|(_, value)| value)
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        let text = match self.field(aliases)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    fn number(&self, aliases: &[&str]) -> Option<f64> {
        let number = match self.field(aliases)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    // `as` saturates, so negatives become 0.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn unsigned(&self, aliases: &[&str]) -> Option<u64> {
        self.number(aliases).map(|n| n.round() as u64)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn spawn_point(&self) -> Option<Vec2> {
        let x = self.number(X_KEYS)?;
        let y = self.number(Y_KEYS)?;
        Some(Vec2::new(x as f32, y as f32))
    }
}

fn normalize_header(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Sources
// =============================================================================

/// Where wave rows come from.
#[async_trait]
pub trait WaveSource: Send + Sync {
    /// Fetches every row stored under `path`.
    async fn fetch(&self, path: &str) -> Result<Vec<WaveRow>, LoadError>;
}

/// Reads a JSON array of row objects from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileSource;

#[async_trait]
impl WaveSource for JsonFileSource {
    async fn fetch(&self, path: &str) -> Result<Vec<WaveRow>, LoadError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_string(),
                source,
            })?;
        Ok(serde_json::from_str(&text)?)
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Whether loaded waves came from the source or the built-in schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveOrigin {
    /// Converted from the source's rows.
    Loaded,
    /// The built-in default schedule.
    Fallback,
}

/// Result of [`WaveLoader::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWaves {
    /// Waves ordered by number.
    pub waves: Vec<WaveConfig>,
    /// Where they came from.
    pub origin: WaveOrigin,
}

/// Fetches, retries and normalizes wave configuration.
pub struct WaveLoader {
    source: Box<dyn WaveSource>,
    config: LoaderConfig,
}

impl fmt::Debug for WaveLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WaveLoader {
    /// Loader over `source` with the given retry policy.
    #[must_use]
    pub fn new(source: Box<dyn WaveSource>, config: LoaderConfig) -> Self {
        Self { source, config }
    }

    /// Loader reading JSON files.
    #[must_use]
    pub fn json_file(config: LoaderConfig) -> Self {
        Self::new(Box::new(JsonFileSource), config)
    }

    /// Loads waves from `path`, falling back to the built-in schedule.
    pub async fn load(&self, path: &str, archetypes: &ArchetypeRegistry) -> LoadedWaves {
        match self.try_load(path, archetypes).await {
            Ok(waves) => {
                info!(path, waves = waves.len(), "wave configuration loaded");
                LoadedWaves {
                    waves,
                    origin: WaveOrigin::Loaded,
                }
            }
            Err(err) => {
                warn!(path, error = %err, "wave configuration unusable, using built-in waves");
                LoadedWaves {
                    waves: default_waves(),
                    origin: WaveOrigin::Fallback,
                }
            }
        }
    }

    /// Loads waves from `path` without falling back.
    ///
    /// # Errors
    ///
    /// The last fetch error once retries are exhausted, or
    /// [`LoadError::NoUsableWaves`] if no row converts into a wave.
    pub async fn try_load(
        &self,
        path: &str,
        archetypes: &ArchetypeRegistry,
    ) -> Result<Vec<WaveConfig>, LoadError> {
        let rows = self.fetch_with_retry(path).await?;
        let waves = convert_rows(&rows, archetypes);
        if waves.is_empty() {
            return Err(LoadError::NoUsableWaves(path.to_string()));
        }
        Ok(waves)
    }

    async fn fetch_with_retry(&self, path: &str) -> Result<Vec<WaveRow>, LoadError> {
        let max_attempts = self.config.max_attempts.max(1);
        let delay = self.config.retry_delay();
        let mut attempt = 1;

        loop {
            match self.source.fetch(path).await {
                Ok(rows) => {
                    debug!(path, attempt, rows = rows.len(), "wave rows fetched");
                    return Ok(rows);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    warn!(
                        "Wave fetch attempt {}/{} for {} failed: {} (retrying in {:?})",
                        attempt, max_attempts, path, err, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// =============================================================================
// Row conversion
// =============================================================================

/// Converts raw rows into clamped waves ordered by number.
///
/// Rows without a wave number or enemy type, and rows naming an unknown
/// type, are dropped. Waves outside the accepted number range or left
/// without entries are skipped.
#[must_use]
pub fn convert_rows(rows: &[WaveRow], archetypes: &ArchetypeRegistry) -> Vec<WaveConfig> {
    let mut grouped: BTreeMap<u64, WaveConfig> = BTreeMap::new();

    for (index, row) in rows.iter().enumerate() {
        let Some(wave_number) = row.unsigned(WAVE_KEYS) else {
            warn!(row = index, "row has no wave number, dropping");
            continue;
        };
        let Some(enemy_type) = row.text(TYPE_KEYS).map(|t| t.to_ascii_lowercase()) else {
            warn!(row = index, wave = wave_number, "row has no enemy type, dropping");
            continue;
        };
        if !archetypes.is_known(&enemy_type) {
            warn!(row = index, wave = wave_number, %enemy_type, "unknown enemy type, dropping row");
            continue;
        }

        let count = row
            .unsigned(COUNT_KEYS)
            .map_or(DEFAULT_COUNT, |c| u32::try_from(c).unwrap_or(u32::MAX));
        let mut entry = WaveEntry::new(
            enemy_type,
            count,
            row.unsigned(INTERVAL_KEYS).unwrap_or(DEFAULT_INTERVAL_MS),
            row.unsigned(DELAY_KEYS).unwrap_or(0),
        );
        if let Some(raw) = row.text(PRIORITY_KEYS) {
            match StructureTargetPriority::parse(&raw) {
                Some(priority) => entry = entry.with_priority(priority),
                None => warn!(row = index, value = %raw, "unknown structure priority, ignoring"),
            }
        }

        let wave = grouped
            .entry(wave_number)
            .or_insert_with(|| WaveConfig::new(0, Vec::new()));
        wave.entries.push(entry);

        if let Some(point) = row.spawn_point() {
            if !wave.spawn_points.contains(&point) {
                wave.spawn_points.push(point);
            }
        }
    }

    grouped
        .into_iter()
        .filter_map(|(number, mut wave)| match validate_wave_number(number) {
            Ok(number) => {
                wave.wave_number = number;
                Some(wave.clamped())
            }
            Err(err) => {
                warn!(error = %err, "skipping wave");
                None
            }
        })
        .collect()
}

fn validate_wave_number(number: u64) -> Result<u32, LoadError> {
    let (min, max) = WAVE_NUMBER_RANGE;
    u32::try_from(number)
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| LoadError::InvalidWave {
            wave: u32::try_from(number).unwrap_or(u32::MAX),
            reason: format!("wave number outside {min}..={max}"),
        })
}
