//! Member and aggregate descriptors recovered from class files.

pub mod constructor;
pub mod field;
pub mod index;
pub mod key;
pub mod method;
pub mod parameter;
pub mod sut_descriptor;
pub mod test_descriptor;

use testify_core::errors::{AnalysisError, ClassFileError};

use crate::classfile::annotation::{self, Annotation};
use crate::classfile::descriptor::{parse_method_descriptor, parse_method_signature, MethodType};
use crate::classfile::reader::MethodInfo;
use crate::classfile::types::{GenericType, TypeRef};
use crate::runtime::{Runtime, Value};

pub use constructor::ConstructorDescriptor;
pub use field::FieldDescriptor;
pub use index::{IndexedMember, MemberIndex};
pub use key::DescriptorKey;
pub use method::MethodDescriptor;
pub use parameter::ParameterDescriptor;
pub use sut_descriptor::{SutDescriptor, SutDescriptorBuilder};
pub use test_descriptor::{TestDescriptor, TestDescriptorBuilder};

/// The name-override annotation's `value`, when present and non-empty.
pub(crate) fn name_override(annotations: &[Annotation], name_marker: &str) -> Option<String> {
    annotation::find(annotations, name_marker)
        .and_then(|a| a.string("value"))
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

pub(crate) fn class_file_error(class: &str, source: ClassFileError) -> AnalysisError {
    AnalysisError::ClassFile {
        class: class.to_string(),
        source,
    }
}

/// Erased method type plus generic parameter and return types.
///
/// A signature may list fewer parameters than the descriptor (the implicit
/// outer-instance parameter of inner-class constructors), so generic types
/// are aligned from the end and the leading extras keep their erased form.
pub(crate) fn method_types(
    declaring_class: &str,
    method: &MethodInfo,
) -> Result<(MethodType, Vec<GenericType>, GenericType), AnalysisError> {
    let erased =
        parse_method_descriptor(&method.descriptor).map_err(|e| class_file_error(declaring_class, e))?;
    let mut generic: Vec<GenericType> = erased.parameters.iter().map(GenericType::from).collect();
    let mut generic_return = GenericType::from(&erased.return_type);

    if let Some(sig) = &method.signature {
        let sig = parse_method_signature(sig).map_err(|e| class_file_error(declaring_class, e))?;
        if sig.parameters.len() <= generic.len() {
            let offset = generic.len() - sig.parameters.len();
            for (slot, ty) in generic[offset..].iter_mut().zip(sig.parameters) {
                *slot = ty;
            }
        } else {
            tracing::debug!(
                class = declaring_class,
                method = %method.name,
                "signature lists more parameters than the descriptor; using erased types"
            );
        }
        generic_return = sig.return_type;
    }
    Ok((erased, generic, generic_return))
}

/// Check arity and per-argument compatibility.
pub(crate) fn check_arguments(
    runtime: &Runtime,
    method: &str,
    declaring_class: &str,
    parameters: &[TypeRef],
    args: &[Value],
) -> Result<(), AnalysisError> {
    let fits = parameters.len() == args.len()
        && parameters
            .iter()
            .zip(args)
            .all(|(ty, value)| runtime.value_fits(ty, value));
    if fits {
        return Ok(());
    }
    Err(AnalysisError::ArgumentMismatch {
        method: method.to_string(),
        declaring_class: declaring_class.to_string(),
        expected: join_types(parameters),
        actual: args
            .iter()
            .map(|v| v.type_label(runtime.heap()))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

pub(crate) fn join_types(types: &[TypeRef]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Query matching for handler and provider lookups: a parameterized query
/// must match exactly, a raw query matches on erasure.
pub(crate) fn type_matches(query: &GenericType, candidate: &GenericType) -> bool {
    if query.is_parameterized() {
        query == candidate
    } else {
        query.erasure() == candidate.erasure()
    }
}
