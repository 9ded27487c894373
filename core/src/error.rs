use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NotAnObject(&'static str),
    InvalidType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::NotAnObject(found) => {
                write!(f, "Device document must be an object, got {}", found)
            }
            ValidationError::InvalidType {
                field,
                expected,
                found,
            } => write!(f, "Cast to {} failed for `{}`, got {}", expected, field, found),
        }
    }
}

impl error::Error for ValidationError {}
