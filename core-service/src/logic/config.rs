//! Engine Configuration
//!
//! `EngineConfig` gom toàn bộ input cấu hình của engine: default priority,
//! threat vocabulary, audit catalogue, simulated timing và RNG seed.
//! Loaded from JSON; every field falls back to its default when missing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::audit::{default_catalogue, AuditCheckSpec};
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::incident::Priority;
use crate::logic::threat::ThreatVocabulary;

// ============================================================================
// TIMING
// ============================================================================

/// Bounds of the simulated per-stage delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl StageTiming {
    /// No delay at all (tests, headless runs)
    pub fn instant() -> Self {
        Self::fixed(0)
    }

    pub fn fixed(delay_ms: u64) -> Self {
        Self {
            min_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(EngineError::invalid_config(format!(
                "timing: min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Pick a delay inside the bounds
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let ms = if self.max_delay_ms <= self.min_delay_ms {
            self.min_delay_ms
        } else {
            rng.gen_range(self.min_delay_ms..=self.max_delay_ms)
        };
        Duration::from_millis(ms)
    }
}

impl Default for StageTiming {
    fn default() -> Self {
        Self {
            min_delay_ms: constants::DEFAULT_MIN_STAGE_DELAY_MS,
            max_delay_ms: constants::DEFAULT_MAX_STAGE_DELAY_MS,
        }
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Priority used when an incident is created without one
    pub default_priority: Priority,
    pub vocabulary: ThreatVocabulary,
    /// Ordered audit catalogue
    pub audit_checks: Vec<AuditCheckSpec>,
    pub timing: StageTiming,
    /// Seed for simulated scorers/probers. `None` = entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_priority: Priority::Medium,
            vocabulary: ThreatVocabulary::default(),
            audit_checks: default_catalogue(),
            timing: StageTiming::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Defaults with zero delay and a fixed seed
    pub fn for_tests() -> Self {
        Self {
            timing: StageTiming::instant(),
            seed: Some(7),
            ..Self::default()
        }
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;

        log::info!("Engine config loaded from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.vocabulary.validate()?;
        self.timing.validate()?;

        if self.audit_checks.is_empty() {
            return Err(EngineError::invalid_config("audit catalogue is empty"));
        }
        for (i, check) in self.audit_checks.iter().enumerate() {
            if check.name.trim().is_empty() {
                return Err(EngineError::invalid_config(format!(
                    "audit check #{} has an empty name",
                    i + 1
                )));
            }
            if self.audit_checks[..i].iter().any(|c| c.name == check.name) {
                return Err(EngineError::invalid_config(format!(
                    "duplicate audit check '{}'",
                    check.name
                )));
            }
        }
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/secops/engine.json` (or platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::CONFIG_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME)
        })
    }

    /// Resolve config: `SECOPS_CONFIG`, then the user config dir, then defaults.
    ///
    /// An explicitly named file that fails to load is an error; the fallback
    /// file is only used when it exists.
    pub fn from_env() -> EngineResult<Self> {
        let mut config = match constants::get_config_path() {
            Some(path) => Self::load(&path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load(&path)?,
                None => {
                    log::debug!("No engine config file, using defaults");
                    Self::default()
                }
            },
        };

        if let Some(delay) = constants::get_stage_delay_override() {
            log::info!("Stage delay fixed at {}ms by {}", delay, constants::STAGE_DELAY_ENV);
            config.timing = StageTiming::fixed(delay);
        }
        Ok(config)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_priority, Priority::Medium);
        assert_eq!(config.audit_checks.len(), 8);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_priority": "high", "seed": 42}}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.default_priority, Priority::High);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.audit_checks, default_catalogue());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("engine.json");
        let config = EngineConfig::for_tests();
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_empty_catalogue_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"audit_checks": []}}"#).unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_inverted_timing_rejected() {
        let config = EngineConfig {
            timing: StageTiming { min_delay_ms: 500, max_delay_ms: 100 },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_check_rejected() {
        let mut config = EngineConfig::default();
        let first = config.audit_checks[0].clone();
        config.audit_checks.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_json_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(EngineConfig::load(file.path()), Err(EngineError::ConfigParse(_))));

        let missing = Path::new("/definitely/not/here/engine.json");
        assert!(matches!(EngineConfig::load(missing), Err(EngineError::ConfigIo(_))));
    }

    #[test]
    fn test_timing_sample_in_bounds() {
        let timing = StageTiming { min_delay_ms: 10, max_delay_ms: 20 };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let d = timing.sample(&mut rng).as_millis();
            assert!((10..=20).contains(&d));
        }
        assert_eq!(StageTiming::instant().sample(&mut rng), Duration::ZERO);
    }
}
