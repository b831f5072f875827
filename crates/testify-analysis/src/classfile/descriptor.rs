//! Descriptor and generic signature parsing (JVMS §4.3, §4.7.9.1).

use testify_core::errors::ClassFileError;

use super::types::{internal_to_binary, GenericType, PrimitiveType, TypeArgument, TypeRef};

/// Parameter and return types of a method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
}

impl MethodType {
    /// Render back to descriptor form, e.g. `(ILjava/lang/String;)V`.
    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for p in &self.parameters {
            p.write_descriptor(&mut out);
        }
        out.push(')');
        self.return_type.write_descriptor(&mut out);
        out
    }
}

/// A parsed method `Signature` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub type_parameters: Vec<String>,
    pub parameters: Vec<GenericType>,
    pub return_type: GenericType,
}

/// Parse a field descriptor such as `Ljava/util/List;`.
pub fn parse_field_descriptor(descriptor: &str) -> Result<TypeRef, ClassFileError> {
    let mut p = DescriptorParser::new(descriptor);
    let ty = p.field_type()?;
    p.expect_end()?;
    Ok(ty)
}

/// Parse a method descriptor such as `(ILjava/lang/String;)V`.
pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodType, ClassFileError> {
    let mut p = DescriptorParser::new(descriptor);
    p.expect(b'(')?;
    let mut parameters = Vec::new();
    while p.peek() != Some(b')') {
        parameters.push(p.field_type()?);
    }
    p.expect(b')')?;
    let return_type = if p.peek() == Some(b'V') {
        p.bump();
        TypeRef::Primitive(PrimitiveType::Void)
    } else {
        p.field_type()?
    };
    p.expect_end()?;
    Ok(MethodType {
        parameters,
        return_type,
    })
}

/// Parse a field `Signature` attribute such as `Ljava/util/List<Lcom/acme/Foo;>;`.
pub fn parse_field_signature(signature: &str) -> Result<GenericType, ClassFileError> {
    let mut p = SignatureParser::new(signature);
    let ty = p.reference_type()?;
    p.expect_end()?;
    Ok(ty)
}

/// Parse a method `Signature` attribute, throws clauses are read and dropped.
pub fn parse_method_signature(signature: &str) -> Result<MethodSignature, ClassFileError> {
    let mut p = SignatureParser::new(signature);
    let type_parameters = if p.peek() == Some(b'<') {
        p.type_parameters()?
    } else {
        Vec::new()
    };
    p.expect(b'(')?;
    let mut parameters = Vec::new();
    while p.peek() != Some(b')') {
        parameters.push(p.java_type()?);
    }
    p.expect(b')')?;
    let return_type = if p.peek() == Some(b'V') {
        p.bump();
        GenericType::Primitive(PrimitiveType::Void)
    } else {
        p.java_type()?
    };
    while p.peek() == Some(b'^') {
        p.bump();
        p.reference_type()?;
    }
    p.expect_end()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
    })
}

/// Parse a class `Signature` attribute, returning the generic superclass and
/// interfaces. Formal type parameters are skipped.
pub fn parse_class_signature(
    signature: &str,
) -> Result<(GenericType, Vec<GenericType>), ClassFileError> {
    let mut p = SignatureParser::new(signature);
    if p.peek() == Some(b'<') {
        p.type_parameters()?;
    }
    let superclass = p.class_type()?;
    let mut interfaces = Vec::new();
    while p.peek().is_some() {
        interfaces.push(p.class_type()?);
    }
    Ok((superclass, interfaces))
}

struct DescriptorParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ClassFileError {
        ClassFileError::InvalidDescriptor {
            descriptor: self.src.to_string(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn expect(&mut self, want: u8) -> Result<(), ClassFileError> {
        match self.bump() {
            Some(b) if b == want => Ok(()),
            Some(b) => Err(self.error(format!(
                "expected '{}' at {}, found '{}'",
                want as char,
                self.pos - 1,
                b as char
            ))),
            None => Err(self.error(format!("expected '{}' at end of input", want as char))),
        }
    }

    fn expect_end(&self) -> Result<(), ClassFileError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error(format!("trailing characters at {}", self.pos)))
        }
    }

    fn field_type(&mut self) -> Result<TypeRef, ClassFileError> {
        match self.bump() {
            Some(b'L') => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b == b';' {
                        break;
                    }
                    self.pos += 1;
                }
                let src = self.src;
                let name = &src[start..self.pos];
                self.expect(b';')?;
                if name.is_empty() {
                    return Err(self.error("empty class name"));
                }
                Ok(TypeRef::Class(internal_to_binary(name)))
            }
            Some(b'[') => Ok(TypeRef::Array(Box::new(self.field_type()?))),
            Some(b'V') => Err(self.error("void is only valid as a return type")),
            Some(c) => PrimitiveType::from_descriptor_char(c)
                .map(TypeRef::Primitive)
                .ok_or_else(|| self.error(format!("unknown type character '{}'", c as char))),
            None => Err(self.error("unexpected end of descriptor")),
        }
    }
}

struct SignatureParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ClassFileError {
        ClassFileError::InvalidSignature {
            signature: self.src.to_string(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn expect(&mut self, want: u8) -> Result<(), ClassFileError> {
        match self.bump() {
            Some(b) if b == want => Ok(()),
            Some(b) => Err(self.error(format!(
                "expected '{}' at {}, found '{}'",
                want as char,
                self.pos - 1,
                b as char
            ))),
            None => Err(self.error(format!("expected '{}' at end of input", want as char))),
        }
    }

    fn expect_end(&self) -> Result<(), ClassFileError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error(format!("trailing characters at {}", self.pos)))
        }
    }

    /// Identifier up to (not including) one of the signature delimiters.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str, ClassFileError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error(format!("empty identifier at {start}")));
        }
        let src = self.src;
        Ok(&src[start..self.pos])
    }

    fn type_parameters(&mut self) -> Result<Vec<String>, ClassFileError> {
        self.expect(b'<')?;
        let mut names = Vec::new();
        while self.peek() != Some(b'>') {
            let name = self.identifier(b":>")?.to_string();
            // Class bound may be empty: `T::Ljava/lang/Comparable<TT;>;`
            self.expect(b':')?;
            if !matches!(self.peek(), Some(b':') | Some(b'>')) {
                self.reference_type()?;
            }
            while self.peek() == Some(b':') {
                self.bump();
                self.reference_type()?;
            }
            names.push(name);
        }
        self.expect(b'>')?;
        if names.is_empty() {
            return Err(self.error("empty type parameter list"));
        }
        Ok(names)
    }

    fn java_type(&mut self) -> Result<GenericType, ClassFileError> {
        match self.peek() {
            Some(b'L') | Some(b'T') | Some(b'[') => self.reference_type(),
            Some(b'V') => Err(self.error("void is only valid as a return type")),
            Some(c) => {
                self.bump();
                PrimitiveType::from_descriptor_char(c)
                    .map(GenericType::Primitive)
                    .ok_or_else(|| self.error(format!("unknown type character '{}'", c as char)))
            }
            None => Err(self.error("unexpected end of signature")),
        }
    }

    fn reference_type(&mut self) -> Result<GenericType, ClassFileError> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.bump();
                let name = self.identifier(b";")?.to_string();
                self.expect(b';')?;
                Ok(GenericType::Variable(name))
            }
            Some(b'[') => {
                self.bump();
                Ok(GenericType::Array(Box::new(self.java_type()?)))
            }
            Some(c) => Err(self.error(format!(
                "expected reference type at {}, found '{}'",
                self.pos, c as char
            ))),
            None => Err(self.error("unexpected end of signature")),
        }
    }

    /// `L pkg/Outer<args>.Inner<args> ;`. Nested segments join with `$`, and
    /// only the innermost segment's arguments are kept.
    fn class_type(&mut self) -> Result<GenericType, ClassFileError> {
        self.expect(b'L')?;
        let mut name = internal_to_binary(self.identifier(b"<.;")?);
        let mut arguments = self.optional_type_arguments()?;
        while self.peek() == Some(b'.') {
            self.bump();
            let inner = self.identifier(b"<.;")?;
            name.push('$');
            name.push_str(inner);
            arguments = self.optional_type_arguments()?;
        }
        self.expect(b';')?;
        Ok(GenericType::Class { name, arguments })
    }

    fn optional_type_arguments(&mut self) -> Result<Vec<TypeArgument>, ClassFileError> {
        if self.peek() != Some(b'<') {
            return Ok(Vec::new());
        }
        self.bump();
        let mut args = Vec::new();
        while self.peek() != Some(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.bump();
                    TypeArgument::Any
                }
                Some(b'+') => {
                    self.bump();
                    TypeArgument::Extends(self.reference_type()?)
                }
                Some(b'-') => {
                    self.bump();
                    TypeArgument::Super(self.reference_type()?)
                }
                _ => TypeArgument::Exact(self.reference_type()?),
            };
            args.push(arg);
        }
        self.expect(b'>')?;
        if args.is_empty() {
            return Err(self.error("empty type argument list"));
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitive_and_array_descriptors() {
        assert_eq!(
            parse_field_descriptor("[[J").unwrap(),
            TypeRef::array_of(TypeRef::array_of(TypeRef::Primitive(PrimitiveType::Long)))
        );
        assert_eq!(
            parse_field_descriptor("Ljava/lang/String;").unwrap(),
            TypeRef::class("java.lang.String")
        );
    }

    #[test]
    fn rejects_void_field_and_trailing_input() {
        assert!(parse_field_descriptor("V").is_err());
        assert!(parse_field_descriptor("II").is_err());
        assert!(parse_field_descriptor("Ljava/lang/String").is_err());
    }

    #[test]
    fn parses_method_descriptor() {
        let m = parse_method_descriptor("(ILcom/acme/Gateway;[Z)V").unwrap();
        assert_eq!(m.parameters.len(), 3);
        assert!(m.return_type.is_void());
        assert_eq!(m.descriptor(), "(ILcom/acme/Gateway;[Z)V");
    }

    #[test]
    fn parses_nested_generic_field_signature() {
        let ty = parse_field_signature(
            "Ljava/util/Map<Ljava/lang/String;Ljava/util/List<+Ljava/lang/Number;>;>;",
        )
        .unwrap();
        assert_eq!(
            ty.to_string(),
            "java.util.Map<java.lang.String, java.util.List<? extends java.lang.Number>>"
        );
    }

    #[test]
    fn parses_inner_class_signature() {
        let ty = parse_field_signature("Lcom/acme/Outer<TT;>.Inner<*>;").unwrap();
        assert_eq!(ty.raw_class_name(), Some("com.acme.Outer$Inner"));
        assert_eq!(ty.arguments(), &[TypeArgument::Any]);
    }

    #[test]
    fn parses_method_signature_with_bounds_and_throws() {
        let sig = parse_method_signature(
            "<T::Ljava/lang/Comparable<TT;>;U:Ljava/lang/Object;>(Ljava/util/List<TT;>;TU;)TT;^Ljava/io/IOException;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters, vec!["T", "U"]);
        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.return_type, GenericType::Variable("T".into()));
    }

    #[test]
    fn parses_class_signature() {
        let (sup, ifaces) =
            parse_class_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/function/Supplier<TT;>;")
                .unwrap();
        assert_eq!(sup, GenericType::class("java.lang.Object"));
        assert_eq!(ifaces.len(), 1);
    }

    #[test]
    fn rejects_empty_argument_list() {
        assert!(parse_field_signature("Ljava/util/List<>;").is_err());
    }
}
