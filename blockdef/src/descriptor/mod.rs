pub mod arg;

use std::collections::HashSet;

use crate::descriptor::arg::{ArgKind, ArgSpec};
use crate::error::SchemaError;
use crate::message;

/// How a block connects to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionShape {
    /// Chained with previous/next blocks; produces an instruction.
    Statement,
    /// Plugs into another block's input; produces a value.
    Expression,
}

impl ConnectionShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionShape::Statement => "statement",
            ConnectionShape::Expression => "expression",
        }
    }
}

/// Presentation metadata. Has no effect on generated code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub colour: String,
    pub tooltip: String,
    pub help_url: String,
}

/// The shape of one block type as the host renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDescriptor {
    /// Unique key, also the key of the block's template.
    pub id: String,
    /// Display message with `%1`, `%2`, ... argument slots.
    pub message: String,
    pub args: Vec<ArgSpec>,
    pub shape: ConnectionShape,
    pub style: Style,
}

impl BlockDescriptor {
    pub fn new(id: impl Into<String>, message: impl Into<String>, shape: ConnectionShape) -> Self {
        BlockDescriptor {
            id: id.into(),
            message: message.into(),
            args: Vec::new(),
            shape,
            style: Style::default(),
        }
    }

    pub fn statement(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, message, ConnectionShape::Statement)
    }

    pub fn expression(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, message, ConnectionShape::Expression)
    }

    pub fn with_arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.style.colour = colour.into();
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.style.tooltip = tooltip.into();
        self
    }

    pub fn with_help_url(mut self, help_url: impl Into<String>) -> Self {
        self.style.help_url = help_url.into();
        self
    }

    pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Check the descriptor's own invariants (independent of any table).
    pub fn validate(&self) -> Result<(), SchemaError> {
        let found = message::placeholders(&self.message);
        if !message::placeholders_match(&found, self.args.len()) {
            return Err(SchemaError::PlaceholderMismatch {
                block: self.id.clone(),
                placeholders: found,
                args: self.args.len(),
            });
        }

        let mut names = HashSet::new();
        for arg in &self.args {
            if !names.insert(arg.name.as_str()) {
                return Err(SchemaError::DuplicateArg {
                    block: self.id.clone(),
                    arg: arg.name.clone(),
                });
            }
            if let ArgKind::Dropdown(options) = &arg.kind {
                if options.is_empty() {
                    return Err(SchemaError::EmptyDropdown {
                        block: self.id.clone(),
                        arg: arg.name.clone(),
                    });
                }
                let mut values = HashSet::new();
                for option in options {
                    if !values.insert(option.value.as_str()) {
                        return Err(SchemaError::DuplicateOption {
                            block: self.id.clone(),
                            arg: arg.name.clone(),
                            value: option.value.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// The message as it reads with the given argument labels filled in,
    /// e.g. `MPU6050 get acceleration y`.
    pub fn render_message(&self, labels: &[&str]) -> String {
        message::render(&self.message, labels)
    }
}
