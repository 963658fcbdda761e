//! Configuration.
//!
//! Loaded from revisor.yml in the working directory or
//! ~/.config/revisor/revisor.yml, with defaults for every section. The
//! verification tolerances are deliberately plain named constants here:
//! behavior-compatible fixtures depend on their exact values.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// LLM backend settings.
    pub llm: LlmConfig,

    /// Verification pipeline settings.
    pub verification: VerificationConfig,

    /// Loop/degeneracy detection settings.
    pub loop_guard: LoopGuardConfig,

    /// Chat-turn engine settings.
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. revisor.yml in current directory
    /// 3. ~/.config/revisor/revisor.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from("revisor.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from revisor.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load revisor.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("revisor").join("revisor.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        let config: Self =
            serde_yaml::from_str(&contents).context("Failed to parse YAML config")?;
        Ok(config)
    }
}

/// LLM backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions endpoint.
    pub api_url: String,

    /// Text model for chat turns.
    pub model: String,

    /// Vision models tried in order for image turns.
    pub vision_models: Vec<String>,

    /// System prompt prepended to every request.
    pub system_prompt: String,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Hours after which exhausted API keys become usable again.
    pub key_reset_hours: i64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            vision_models: vec![
                "llama-3.2-90b-vision-preview".to_string(),
                "llama-3.2-11b-vision-preview".to_string(),
            ],
            system_prompt: "Eres un tutor de matemáticas paciente. Resuelve paso a paso y \
                            termina con la respuesta clara."
                .to_string(),
            timeout_ms: 60_000,
            key_reset_hours: 20,
        }
    }
}

/// Verification pipeline settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Absolute tolerance, in currency units, for recomputed prices.
    pub price_tolerance_eur: f64,

    /// Absolute tolerance, in percentage points, for recomputed percentages.
    pub percent_tolerance_points: f64,

    /// Questions at or below this many chars are never verified.
    pub min_question_chars: usize,

    /// A flagged result only triggers a retry above this confidence.
    pub retry_confidence_threshold: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            price_tolerance_eur: 0.5,
            percent_tolerance_points: 0.5,
            min_question_chars: 40,
            retry_confidence_threshold: 0.7,
        }
    }
}

/// Loop/degeneracy detection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoopGuardConfig {
    /// How many times a sentence must repeat to count as a loop.
    pub min_repetitions: usize,
}

impl Default for LoopGuardConfig {
    fn default() -> Self {
        Self { min_repetitions: 3 }
    }
}

/// Chat-turn engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling temperature for ordinary questions.
    pub base_temperature: f64,

    /// Temperature for advanced questions and corrective round-trips.
    pub low_temperature: f64,

    /// Token budget for ordinary answers.
    pub max_tokens: u32,

    /// Token budget for proofs and number-theory answers.
    pub proof_max_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_temperature: 0.2,
            low_temperature: 0.1,
            max_tokens: 2048,
            proof_max_tokens: 3500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.verification.price_tolerance_eur, 0.5);
        assert_eq!(config.verification.percent_tolerance_points, 0.5);
        assert_eq!(config.verification.min_question_chars, 40);
        assert_eq!(config.verification.retry_confidence_threshold, 0.7);
        assert_eq!(config.loop_guard.min_repetitions, 3);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.engine.max_tokens, 2048);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "verification:\n  price_tolerance_eur: 1.5\nllm:\n  model: test-model"
        )
        .unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.verification.price_tolerance_eur, 1.5);
        assert_eq!(config.llm.model, "test-model");
        // untouched sections keep their defaults
        assert_eq!(config.verification.min_question_chars, 40);
        assert_eq!(config.loop_guard.min_repetitions, 3);
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let path = PathBuf::from("/nonexistent/revisor.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_invalid_yaml_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "verification: [not, a, map]").unwrap();
        assert!(Config::load(Some(&file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_roundtrip_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed.verification.price_tolerance_eur,
            config.verification.price_tolerance_eur
        );
        assert_eq!(parsed.llm.vision_models, config.llm.vision_models);
    }
}
