use std::{fmt, iter::Peekable, str::Chars};

use enum_as_inner::EnumAsInner;
use thiserror::Error;

/// JVMS 4.3.2 caps array types at 255 dimensions.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("descriptor is empty")]
    Empty,

    #[error("method descriptor `{descriptor}` did not start with (")]
    MissingParameters { descriptor: String },

    #[error("descriptor `{descriptor}` ended unexpectedly")]
    UnexpectedEnd { descriptor: String },

    #[error("object type in `{descriptor}` is missing its ; terminator")]
    UnterminatedObject { descriptor: String },

    #[error("object type in `{descriptor}` has an empty class name")]
    EmptyClassName { descriptor: String },

    #[error("unknown type {found} in `{descriptor}`")]
    UnknownType { found: char, descriptor: String },

    #[error("void used as a value type in `{descriptor}`")]
    VoidValue { descriptor: String },

    #[error("array type in `{descriptor}` has more than 255 dimensions")]
    TooManyDimensions { descriptor: String },

    #[error("trailing characters `{trailing}` after `{descriptor}`")]
    TrailingCharacters { descriptor: String, trailing: String },
}

/// <BaseType> ::= 'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z'
///
/// `Void` only ever appears as a return type.
#[derive(EnumAsInner, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BaseType {
    Boolean, // Z
    Char,    // C
    Float,   // F
    Double,  // D
    Byte,    // B
    Short,   // S
    Int,     // I
    Long,    // J
    Void,    // V
}

impl BaseType {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'Z' => BaseType::Boolean,
            'C' => BaseType::Char,
            'F' => BaseType::Float,
            'D' => BaseType::Double,
            'B' => BaseType::Byte,
            'S' => BaseType::Short,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'V' => BaseType::Void,
            _ => return None,
        })
    }

    pub fn as_char(&self) -> char {
        match self {
            BaseType::Boolean => 'Z',
            BaseType::Char => 'C',
            BaseType::Float => 'F',
            BaseType::Double => 'D',
            BaseType::Byte => 'B',
            BaseType::Short => 'S',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Void => 'V',
        }
    }

    /// Source-level keyword, the name reflection reports for primitive classes.
    pub fn keyword(&self) -> &'static str {
        match self {
            BaseType::Boolean => "boolean",
            BaseType::Char => "char",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::Byte => "byte",
            BaseType::Short => "short",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Void => "void",
        }
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, BaseType::Long | BaseType::Double)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// <ObjectType> ::= 'L' <ClassName> ';'
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ObjectType {
    pub class_name: String,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{};", self.class_name)
    }
}

/// <ArrayType> ::= '[' <FieldType>
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ArrayType {
    pub field_type: Box<FieldType>,
}

impl ArrayType {
    pub fn dimensions(&self) -> usize {
        match self.field_type.as_ref() {
            FieldType::Array(inner) => inner.dimensions() + 1,
            _ => 1,
        }
    }

    /// The innermost non-array type.
    pub fn element_type(&self) -> &FieldType {
        match self.field_type.as_ref() {
            FieldType::Array(inner) => inner.element_type(),
            other => other,
        }
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.field_type)
    }
}

#[derive(EnumAsInner, Debug, PartialEq, Eq, Hash, Clone)]
pub enum FieldType {
    Base(BaseType),
    Object(ObjectType),
    Array(ArrayType),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => base.fmt(f),
            FieldType::Object(object) => object.fmt(f),
            FieldType::Array(array) => array.fmt(f),
        }
    }
}

impl FieldType {
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let mut parser = Parser::new(descriptor)?;
        let field_type = parser.parse_field_type(false)?;
        parser.expect_end()?;

        Ok(field_type)
    }

    pub fn object(class_name: impl Into<String>) -> Self {
        FieldType::Object(ObjectType {
            class_name: class_name.into(),
        })
    }

    /// The name a class loader keys this type under.
    /// Primitives and arrays keep their descriptor form (`I`, `[I`), objects use
    /// the internal class name (`java/lang/String`).
    pub fn internal_name(&self) -> String {
        match self {
            FieldType::Object(object) => object.class_name.clone(),
            other => other.to_string(),
        }
    }

    /// Local variable slots a value of this type occupies.
    pub fn slot_count(&self) -> usize {
        match self {
            FieldType::Base(base) if base.is_wide() => 2,
            FieldType::Base(BaseType::Void) => 0,
            _ => 1,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, FieldType::Base(BaseType::Void))
    }
}

/// <MethodType> ::= '(' { <FieldType> } ')' <ReturnType>
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MethodType {
    pub parameters: Vec<FieldType>,
    pub return_type: FieldType,
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for parameter in &self.parameters {
            write!(f, "{}", parameter)?;
        }
        write!(f, "){}", self.return_type)
    }
}

impl MethodType {
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let mut parser = Parser::new(descriptor)?;
        let method_type = parser.parse_method_type()?;
        parser.expect_end()?;

        Ok(method_type)
    }

    /// Declared parameters. Arrays and objects count once each.
    pub fn arg_count(&self) -> usize {
        self.parameters.len()
    }

    /// Local variable slots the declared parameters occupy, `long` and `double`
    /// taking two each.
    pub fn arg_slot_count(&self) -> usize {
        self.parameters.iter().map(FieldType::slot_count).sum()
    }

    pub fn is_void_return(&self) -> bool {
        self.return_type.is_void()
    }
}

/// Count the parameters in a method descriptor.
pub fn arg_count(descriptor: &str) -> Result<usize, DescriptorError> {
    Ok(MethodType::parse(descriptor)?.arg_count())
}

pub fn is_void_return(descriptor: &str) -> Result<bool, DescriptorError> {
    Ok(MethodType::parse(descriptor)?.is_void_return())
}

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self, DescriptorError> {
        if source.is_empty() {
            return Err(DescriptorError::Empty);
        }

        Ok(Self {
            source,
            chars: source.chars().peekable(),
        })
    }

    fn parse_method_type(&mut self) -> Result<MethodType, DescriptorError> {
        if self.chars.next() != Some('(') {
            return Err(DescriptorError::MissingParameters {
                descriptor: self.source.to_string(),
            });
        }

        let mut parameters = Vec::new();
        loop {
            match self.chars.peek() {
                Some(')') => break,
                Some(_) => parameters.push(self.parse_field_type(false)?),
                None => return Err(self.unexpected_end()),
            }
        }

        // Skip )
        self.chars.next();

        let return_type = self.parse_field_type(true)?;

        Ok(MethodType {
            parameters,
            return_type,
        })
    }

    fn parse_field_type(&mut self, allow_void: bool) -> Result<FieldType, DescriptorError> {
        let mut dimensions = 0;
        while self.chars.next_if_eq(&'[').is_some() {
            dimensions += 1;
        }

        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(DescriptorError::TooManyDimensions {
                descriptor: self.source.to_string(),
            });
        }

        let first = self.chars.next().ok_or_else(|| self.unexpected_end())?;
        let mut field_type = match first {
            'L' => FieldType::Object(self.parse_object_type()?),
            c => match BaseType::from_char(c) {
                Some(BaseType::Void) if !allow_void || dimensions > 0 => {
                    return Err(DescriptorError::VoidValue {
                        descriptor: self.source.to_string(),
                    })
                }
                Some(base) => FieldType::Base(base),
                None => {
                    return Err(DescriptorError::UnknownType {
                        found: c,
                        descriptor: self.source.to_string(),
                    })
                }
            },
        };

        for _ in 0..dimensions {
            field_type = FieldType::Array(ArrayType {
                field_type: Box::new(field_type),
            });
        }

        Ok(field_type)
    }

    fn parse_object_type(&mut self) -> Result<ObjectType, DescriptorError> {
        let mut class_name = String::new();

        loop {
            match self.chars.next() {
                Some(';') => break,
                Some(c) => class_name.push(c),
                None => {
                    return Err(DescriptorError::UnterminatedObject {
                        descriptor: self.source.to_string(),
                    })
                }
            }
        }

        if class_name.is_empty() {
            return Err(DescriptorError::EmptyClassName {
                descriptor: self.source.to_string(),
            });
        }

        Ok(ObjectType { class_name })
    }

    fn expect_end(&mut self) -> Result<(), DescriptorError> {
        let trailing: String = self.chars.by_ref().collect();
        if !trailing.is_empty() {
            return Err(DescriptorError::TrailingCharacters {
                descriptor: self.source.to_string(),
                trailing,
            });
        }

        Ok(())
    }

    fn unexpected_end(&self) -> DescriptorError {
        DescriptorError::UnexpectedEnd {
            descriptor: self.source.to_string(),
        }
    }
}
