//! Configuration loading and management.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::graph::{DEFAULT_CONFIDENCE_THRESHOLD, MAX_HOPS};
use crate::score::SirWeights;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classifier admission cutoff τ.
    pub confidence_threshold: f64,
    /// Enable the implicit-pattern lexicon.
    pub include_implicit: bool,
    /// Discard analyzer edges with more hops than this.
    pub max_dependency_hops: u32,
    /// Composite score weights; renormalized to sum 1 on use.
    pub sir_weights: SirWeights,
    /// Additional lexical patterns.
    pub custom_patterns: Vec<String>,
    /// Blocked lexical patterns.
    pub exclude_patterns: Vec<String>,
    /// Excluded file globs.
    pub exclude: Vec<String>,
    /// Max commits inspected by the external commit monitor.
    pub commit_window_size: usize,
    /// Classifier transport tuning.
    pub classifier: ClassifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            include_implicit: true,
            max_dependency_hops: MAX_HOPS,
            sir_weights: SirWeights::default(),
            custom_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            exclude: Vec::new(),
            commit_window_size: 50,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config`
    /// flags. Env vars with `RIPPLE_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("RIPPLE_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from a directory, looking for ripple.toml or
    /// .ripple/ripple.toml.
    ///
    /// Missing files are silently skipped (defaults are used). Env vars with
    /// `RIPPLE_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("ripple.toml")))
            .merge(Toml::file(dir.join(".ripple/ripple.toml")))
            .merge(Env::prefixed("RIPPLE_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Defaults with delays zeroed, for fast deterministic tests and the
    /// scenario harness.
    pub fn for_tests() -> Self {
        Self {
            classifier: ClassifierConfig {
                pacing_ms: 0,
                backoff_base_ms: 0,
                ..ClassifierConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Classifier transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Calls issued concurrently per batch.
    pub batch_size: usize,
    /// Pacing delay between batches, in milliseconds.
    pub pacing_ms: u64,
    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
    /// Retries on rate-limit signals.
    pub max_retries: u32,
    /// First backoff delay in milliseconds; doubled per retry.
    pub backoff_base_ms: u64,
    /// Remote endpoint URL; empty selects the offline keyword classifier.
    pub endpoint: String,
    /// API key for the remote endpoint; falls back to
    /// `RIPPLE_CLASSIFIER_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            pacing_ms: 100,
            request_timeout_secs: 60,
            max_retries: 3,
            backoff_base_ms: 1000,
            endpoint: String::new(),
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.confidence_threshold, 0.7);
        assert!(config.include_implicit);
        assert_eq!(config.max_dependency_hops, 5);
        assert_eq!(config.commit_window_size, 50);
        assert_eq!(config.classifier.batch_size, 10);
        assert_eq!(config.classifier.request_timeout_secs, 60);
        assert_eq!(config.classifier.max_retries, 3);
    }

    #[test]
    fn test_default_sir_weights() {
        let config = Config::default();
        assert!((config.sir_weights.alpha - 0.4).abs() < 1e-9);
        assert!((config.sir_weights.beta - 0.3).abs() < 1e-9);
        assert!((config.sir_weights.gamma - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_config_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ripple.toml",
                "confidence_threshold = 0.8\n[sir_weights]\nalpha = 0.6\n",
            )?;
            let config = Config::from_file("ripple.toml").unwrap();
            assert_eq!(config.confidence_threshold, 0.8);
            assert!((config.sir_weights.alpha - 0.6).abs() < 1e-9);
            // Untouched keys keep their defaults.
            assert_eq!(config.max_dependency_hops, 5);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_ripple_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("ripple.toml", "include_implicit = false")?;
            let config = Config::load_default(".").unwrap();
            assert!(!config.include_implicit);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_dot_ripple() {
        Jail::expect_with(|jail| {
            std::fs::create_dir(jail.directory().join(".ripple")).unwrap();
            jail.create_file(".ripple/ripple.toml", "max_dependency_hops = 3")?;
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.max_dependency_hops, 3);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_no_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.confidence_threshold, 0.7);
            Ok(())
        });
    }

    #[test]
    fn test_from_file_errors_on_missing_file() {
        let result = Config::from_file("/nonexistent/path/ripple.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not found"), "expected 'not found' in: {err}");
    }

    #[test]
    fn test_env_var_overrides_file_value() {
        Jail::expect_with(|jail| {
            jail.create_file("ripple.toml", "confidence_threshold = 0.8")?;
            jail.set_env("RIPPLE_CONFIDENCE_THRESHOLD", "0.9");
            let config = Config::from_file("ripple.toml").unwrap();
            assert_eq!(config.confidence_threshold, 0.9);
            Ok(())
        });
    }

    #[test]
    fn test_env_var_nested_override() {
        Jail::expect_with(|jail| {
            jail.set_env("RIPPLE_CLASSIFIER__BATCH_SIZE", "25");
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.classifier.batch_size, 25);
            Ok(())
        });
    }

    #[test]
    fn test_custom_and_exclude_patterns() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ripple.toml",
                "custom_patterns = [\"NOCOMMIT\"]\nexclude_patterns = [\"NOTE\"]\nexclude = [\"vendor/**\"]\n",
            )?;
            let config = Config::from_file("ripple.toml").unwrap();
            assert_eq!(config.custom_patterns, vec!["NOCOMMIT".to_string()]);
            assert_eq!(config.exclude_patterns, vec!["NOTE".to_string()]);
            assert_eq!(config.exclude, vec!["vendor/**".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_for_tests_zeroes_delays() {
        let config = Config::for_tests();
        assert_eq!(config.classifier.pacing_ms, 0);
        assert_eq!(config.classifier.backoff_base_ms, 0);
        assert_eq!(config.confidence_threshold, 0.7);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("confidence_threshold"));
        assert!(json.contains("sir_weights"));
    }
}
