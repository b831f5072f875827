//! ClassVisitor trait: streaming callbacks driven by `ClassReader::accept`.

use super::annotation::Annotation;
use super::reader::{FieldInfo, MethodInfo};

/// Class header passed to `visit_header`.
#[derive(Debug, Clone, Copy)]
pub struct ClassHeader<'a> {
    pub major_version: u16,
    pub access_flags: u16,
    pub name: &'a str,
    pub super_name: Option<&'a str>,
    pub interfaces: &'a [String],
    pub signature: Option<&'a str>,
}

/// Callbacks for one pass over a class file.
///
/// All methods default to doing nothing, so visitors only override the
/// parts of the class they care about. The first `Err` aborts the pass.
pub trait ClassVisitor {
    type Error;

    fn visit_header(&mut self, _header: &ClassHeader<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called once per class-level annotation, in declaration order.
    fn visit_annotation(&mut self, _annotation: &Annotation) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_field(&mut self, _field: &FieldInfo) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every method including `<init>` and `<clinit>`.
    fn visit_method(&mut self, _method: &MethodInfo) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_end(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
