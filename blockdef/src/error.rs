use std::fmt;

/// Violations of the block schema invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A block with this id is already registered.
    DuplicateId(String),
    /// No block with this id is registered.
    UnknownBlock(String),
    /// The display message placeholders do not match the argument list.
    PlaceholderMismatch {
        block: String,
        placeholders: Vec<usize>,
        args: usize,
    },
    /// Two arguments of one block share a name.
    DuplicateArg { block: String, arg: String },
    /// A dropdown argument declares no options.
    EmptyDropdown { block: String, arg: String },
    /// A dropdown argument declares the same option value twice.
    DuplicateOption {
        block: String,
        arg: String,
        value: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DuplicateId(id) => write!(f, "duplicate block id: {}", id),
            SchemaError::UnknownBlock(id) => write!(f, "unknown block: {}", id),
            SchemaError::PlaceholderMismatch {
                block,
                placeholders,
                args,
            } => {
                let found: Vec<String> = placeholders.iter().map(|p| format!("%{}", p)).collect();
                write!(
                    f,
                    "block {}: message placeholders [{}] do not match {} argument(s)",
                    block,
                    found.join(", "),
                    args
                )
            }
            SchemaError::DuplicateArg { block, arg } => {
                write!(f, "block {}: duplicate argument name: {}", block, arg)
            }
            SchemaError::EmptyDropdown { block, arg } => {
                write!(f, "block {}: dropdown {} has no options", block, arg)
            }
            SchemaError::DuplicateOption { block, arg, value } => write!(
                f,
                "block {}: dropdown {} declares value {} more than once",
                block, arg, value
            ),
        }
    }
}

impl std::error::Error for SchemaError {}
