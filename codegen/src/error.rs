use std::fmt;

use blockdef::SchemaError;

#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// A template is already bound to this block id.
    DuplicateId(String),
    /// No descriptor or no template exists for this block id.
    UnknownBlock(String),
    /// The field map lacks a field the block declares.
    MissingField { block: String, field: String },
    /// The field map carries a field the block does not declare.
    UnknownField { block: String, field: String },
    /// A schema block was registered without a template.
    MissingTemplate(String),
    Schema(SchemaError),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::DuplicateId(id) => write!(f, "template already registered: {}", id),
            CodegenError::UnknownBlock(id) => write!(f, "unknown block: {}", id),
            CodegenError::MissingField { block, field } => {
                write!(f, "block {}: missing field: {}", block, field)
            }
            CodegenError::UnknownField { block, field } => {
                write!(f, "block {}: unknown field: {}", block, field)
            }
            CodegenError::MissingTemplate(id) => write!(f, "no template for block: {}", id),
            CodegenError::Schema(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<SchemaError> for CodegenError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownBlock(id) => CodegenError::UnknownBlock(id),
            other => CodegenError::Schema(other),
        }
    }
}
