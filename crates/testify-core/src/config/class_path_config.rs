//! Class path configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PLATFORM_PACKAGES;

/// Where compiled classes are read from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClassPathConfig {
    /// Directories holding `.class` files laid out by package.
    pub roots: Vec<PathBuf>,
    /// Package prefixes resolved as opaque platform classes when absent.
    pub platform_packages: Vec<String>,
}

impl ClassPathConfig {
    /// Returns the platform package prefixes, defaulting to the JDK namespaces.
    pub fn effective_platform_packages(&self) -> Vec<String> {
        if self.platform_packages.is_empty() {
            DEFAULT_PLATFORM_PACKAGES.iter().map(|p| p.to_string()).collect()
        } else {
            self.platform_packages.clone()
        }
    }
}
