//! Config-handler and collaborator-provider invocation.

use testify_core::errors::AnalysisError;

use crate::classfile::types::GenericType;
use crate::descriptor::TestDescriptor;
use crate::runtime::{ObjectId, Runtime, Value};

/// Pass `config` through the first config handler accepting `config_type`.
///
/// Returns the handler's result, or `config` itself when the handler is
/// `void` or no handler matches.
pub fn apply_config_handler(
    runtime: &mut Runtime,
    test: &TestDescriptor,
    test_instance: ObjectId,
    config_type: &GenericType,
    config: Value,
) -> Result<Value, AnalysisError> {
    let Some(handler) = test.find_config_handler(config_type) else {
        return Ok(config);
    };
    tracing::debug!(handler = %handler.name(), config_type = %config_type, "applying config handler");
    let result = handler.invoke(runtime, Some(test_instance), std::slice::from_ref(&config))?;
    Ok(result.unwrap_or(config))
}

/// Invoke the first collaborator provider returning `return_type` (and
/// named `name`, when given). `None` when no provider matches.
pub fn provide_collaborator(
    runtime: &mut Runtime,
    test: &TestDescriptor,
    test_instance: ObjectId,
    return_type: &GenericType,
    name: Option<&str>,
) -> Result<Option<Value>, AnalysisError> {
    let Some(provider) = test.find_collaborator_provider(return_type, name) else {
        return Ok(None);
    };
    tracing::debug!(provider = %provider.name(), "providing collaborator");
    provider.invoke(runtime, Some(test_instance), &[])
}
