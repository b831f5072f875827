//! Configuration system for Testify.
//! TOML-based, 3-layer resolution: env > project > defaults.

pub mod analysis_config;
pub mod class_path_config;
pub mod marker_config;
pub mod testify_config;

pub use analysis_config::AnalysisConfig;
pub use class_path_config::ClassPathConfig;
pub use marker_config::MarkerConfig;
pub use testify_config::TestifyConfig;
