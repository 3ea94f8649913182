use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Align recognized words against the reference to detect insertions and omissions.
    pub enable_miscue: bool,
    pub weights: ScoreWeights,
    pub delay_thresholds: DelayThresholds,
}

impl ScoringConfig {
    pub const TICKS_PER_SECOND: f64 = 10_000_000.0;

    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::io("read scoring config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| ScoringError::json("parse scoring config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        let weights = [
            ("accuracy", self.weights.accuracy),
            ("prosody", self.weights.prosody),
            ("fluency", self.weights.fluency),
            ("completeness", self.weights.completeness),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::invalid_config(format!(
                    "weight '{name}' must be a finite non-negative number, got {value}"
                )));
            }
        }
        if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(ScoringError::invalid_config(
                "at least one component weight must be positive",
            ));
        }

        let t = &self.delay_thresholds;
        let ascending = t.slight.is_finite()
            && t.medium.is_finite()
            && t.severe.is_finite()
            && t.slight < t.medium
            && t.medium < t.severe;
        if !ascending {
            return Err(ScoringError::invalid_config(format!(
                "delay thresholds must be strictly ascending, got {} / {} / {}",
                t.slight, t.medium, t.severe
            )));
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            enable_miscue: true,
            weights: ScoreWeights::default(),
            delay_thresholds: DelayThresholds::default(),
        }
    }
}

/// Nominal weights of the composite pronunciation score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub accuracy: f64,
    pub prosody: f64,
    pub fluency: f64,
    pub completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.4,
            prosody: 0.2,
            fluency: 0.2,
            completeness: 0.2,
        }
    }
}

/// Lower bounds (inclusive) of the slight, medium and severe delay levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayThresholds {
    pub slight: f64,
    pub medium: f64,
    pub severe: f64,
}

impl Default for DelayThresholds {
    fn default() -> Self {
        Self {
            slight: 0.20,
            medium: 0.35,
            severe: 0.55,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_config_default() {
        let config = ScoringConfig::default();
        assert!(config.enable_miscue);
        assert_eq!(config.weights.accuracy, 0.4);
        assert_eq!(config.weights.prosody, 0.2);
        assert_eq!(config.delay_thresholds.slight, 0.20);
        assert_eq!(config.delay_thresholds.severe, 0.55);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "enable_miscue": false, "weights": { "accuracy": 0.6 } }"#;
        let config: ScoringConfig = serde_json::from_str(json).expect("valid config json");
        assert!(!config.enable_miscue);
        assert_eq!(config.weights.accuracy, 0.6);
        assert_eq!(config.weights.fluency, 0.2);
        assert_eq!(config.delay_thresholds, DelayThresholds::default());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.prosody = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ScoringError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn all_zero_weights_are_rejected() {
        let mut config = ScoringConfig::default();
        config.weights = ScoreWeights {
            accuracy: 0.0,
            prosody: 0.0,
            fluency: 0.0,
            completeness: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let mut config = ScoringConfig::default();
        config.delay_thresholds.medium = 0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let path = std::env::temp_dir().join("pronunciation_scoring_config_load.json");
        std::fs::write(&path, r#"{ "delay_thresholds": { "slight": 0.1 } }"#)
            .expect("write config");
        let config = ScoringConfig::load(&path).expect("config should load");
        assert_eq!(config.delay_thresholds.slight, 0.1);
        assert_eq!(config.delay_thresholds.medium, 0.35);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_fails_on_missing_file() {
        let result = ScoringConfig::load(Path::new("/nonexistent/scoring.json"));
        assert!(matches!(result, Err(ScoringError::Io { .. })));
    }
}
