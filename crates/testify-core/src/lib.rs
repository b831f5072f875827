//! testify-core: shared plumbing for the Testify analysis engine.
//!
//! - Errors: one `thiserror` enum per subsystem plus error codes
//! - Config: TOML-based, layered resolution (env > project > defaults)
//! - Events: handler trait with no-op defaults and a synchronous dispatcher
//! - Tracing: `TESTIFY_LOG` driven `EnvFilter` setup
//! - Types: fast collection re-exports

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod types;
