//! Shared constants for the Testify analysis engine.

/// Testify version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "testify.toml";

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "TESTIFY_LOG";

/// Default log filter when `TESTIFY_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "testify=info";

/// Default maximum nesting of bundle annotations.
pub const DEFAULT_MAX_BUNDLE_DEPTH: u32 = 8;

/// Default annotation package for the framework markers.
pub const ANNOTATION_PACKAGE: &str = "org.testifyproject.annotation";

/// Packages treated as opaque platform classes when not found on the class path.
pub const DEFAULT_PLATFORM_PACKAGES: &[&str] = &["java.", "javax.", "jdk.", "sun."];

/// Name of the JVM root class.
pub const OBJECT_CLASS: &str = "java.lang.Object";

/// Name of the JVM string class.
pub const STRING_CLASS: &str = "java.lang.String";
