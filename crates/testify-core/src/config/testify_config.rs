//! Top-level Testify configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AnalysisConfig, ClassPathConfig, MarkerConfig};
use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`TESTIFY_*`)
/// 2. Project config (`testify.toml` in project root)
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TestifyConfig {
    pub markers: MarkerConfig,
    pub class_path: ClassPathConfig,
    pub analysis: AnalysisConfig,
}

impl TestifyConfig {
    /// Load configuration with layered resolution.
    ///
    /// A missing `testify.toml` is not an error; defaults apply.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &TestifyConfig) -> Result<(), ConfigError> {
        for (key, value) in config.markers.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: format!("markers.{}", key.trim_end_matches('_')),
                    message: "annotation name must not be empty".to_string(),
                });
            }
        }
        if config.markers.guidelines.iter().any(|g| g.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed {
                field: "markers.guidelines".to_string(),
                message: "annotation name must not be empty".to_string(),
            });
        }
        if config.analysis.max_bundle_depth == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.max_bundle_depth".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.analysis.cache_capacity == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.cache_capacity".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config
            .class_path
            .platform_packages
            .iter()
            .any(|p| p.trim().is_empty())
        {
            return Err(ConfigError::ValidationFailed {
                field: "class_path.platform_packages".to_string(),
                message: "package prefix must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut TestifyConfig, path: &Path) -> Result<(), ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;

        let file_config: TestifyConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` (or non-empty) value.
    fn merge(base: &mut TestifyConfig, other: &TestifyConfig) {
        // Markers
        let (b, o) = (&mut base.markers, &other.markers);
        for (slot, value) in [
            (&mut b.sut, &o.sut),
            (&mut b.fake, &o.fake),
            (&mut b.virtual_, &o.virtual_),
            (&mut b.real, &o.real),
            (&mut b.name, &o.name),
            (&mut b.config_handler, &o.config_handler),
            (&mut b.collaborator_provider, &o.collaborator_provider),
            (&mut b.bundle, &o.bundle),
            (&mut b.application, &o.application),
            (&mut b.module, &o.module),
            (&mut b.scan, &o.scan),
            (&mut b.local_resource, &o.local_resource),
            (&mut b.virtual_resource, &o.virtual_resource),
            (&mut b.remote_resource, &o.remote_resource),
            (&mut b.constructor, &o.constructor),
        ] {
            if value.is_some() {
                *slot = value.clone();
            }
        }
        if !o.guidelines.is_empty() {
            b.guidelines = o.guidelines.clone();
        }

        // Class path
        if !other.class_path.roots.is_empty() {
            base.class_path.roots = other.class_path.roots.clone();
        }
        if !other.class_path.platform_packages.is_empty() {
            base.class_path.platform_packages = other.class_path.platform_packages.clone();
        }

        // Analysis
        if other.analysis.cache_capacity.is_some() {
            base.analysis.cache_capacity = other.analysis.cache_capacity;
        }
        if other.analysis.max_bundle_depth.is_some() {
            base.analysis.max_bundle_depth = other.analysis.max_bundle_depth;
        }
        if other.analysis.loose_matching.is_some() {
            base.analysis.loose_matching = other.analysis.loose_matching;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `TESTIFY_ANALYSIS_MAX_BUNDLE_DEPTH`, `TESTIFY_CLASS_PATH`, etc.
    fn apply_env_overrides(config: &mut TestifyConfig) {
        if let Ok(val) = std::env::var("TESTIFY_ANALYSIS_CACHE_CAPACITY") {
            if let Ok(v) = val.parse::<u64>() {
                config.analysis.cache_capacity = Some(v);
            }
        }
        if let Ok(val) = std::env::var("TESTIFY_ANALYSIS_MAX_BUNDLE_DEPTH") {
            if let Ok(v) = val.parse::<u32>() {
                config.analysis.max_bundle_depth = Some(v);
            }
        }
        if let Ok(val) = std::env::var("TESTIFY_ANALYSIS_LOOSE_MATCHING") {
            if let Ok(v) = val.parse::<bool>() {
                config.analysis.loose_matching = Some(v);
            }
        }
        if let Some(val) = std::env::var_os("TESTIFY_CLASS_PATH") {
            let roots: Vec<_> = std::env::split_paths(&val)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !roots.is_empty() {
                config.class_path.roots = roots;
            }
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}
