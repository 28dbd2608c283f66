use std::fmt;

use crate::context::{GenerationContext, Warning};
use crate::error::CodegenError;
use crate::extension::Extension;
use crate::fields::FieldValues;

/// One placed block: its type and the values bound to its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockInstance {
    pub id: String,
    pub fields: FieldValues,
}

impl BlockInstance {
    pub fn new(id: impl Into<String>) -> Self {
        BlockInstance {
            id: id.into(),
            fields: FieldValues::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name, value);
        self
    }
}

/// Output of a finished generation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    pub source: String,
    pub warnings: Vec<Warning>,
}

/// The block at `index` could not be generated.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFailure {
    pub index: usize,
    pub error: CodegenError,
}

impl fmt::Display for BlockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block #{}: {}", self.index, self.error)
    }
}

impl std::error::Error for BlockFailure {}

/// A single top-to-bottom generation pass over a flat sequence of blocks.
///
/// Each block is emitted independently: a failing block adds nothing and
/// leaves the lines of earlier blocks in place.
pub struct Pass<'a> {
    extension: &'a Extension,
    ctx: GenerationContext,
    body: Vec<String>,
}

impl<'a> Pass<'a> {
    pub fn new(extension: &'a Extension) -> Self {
        Pass {
            extension,
            ctx: GenerationContext::new(),
            body: Vec::new(),
        }
    }

    pub fn emit(&mut self, instance: &BlockInstance) -> Result<(), CodegenError> {
        let fragment = self
            .extension
            .generate(&instance.id, &instance.fields, &mut self.ctx)?;
        // Top-level expressions stand alone as naked lines.
        let code = fragment.code().trim_end_matches('\n');
        self.body.extend(code.lines().map(str::to_string));
        Ok(())
    }

    pub fn context(&self) -> &GenerationContext {
        &self.ctx
    }

    /// Definitions first, one per line, then every emitted line.
    pub fn finish(self) -> GeneratedProgram {
        let mut source = String::new();
        for line in self.ctx.definitions.lines() {
            source.push_str(line);
            source.push('\n');
        }
        for line in &self.body {
            source.push_str(line);
            source.push('\n');
        }
        GeneratedProgram {
            source,
            warnings: self.ctx.warnings,
        }
    }
}

/// Generate a whole program, stopping at the first block that fails.
pub fn generate_program(
    extension: &Extension,
    instances: &[BlockInstance],
) -> Result<GeneratedProgram, BlockFailure> {
    let mut pass = Pass::new(extension);
    for (index, instance) in instances.iter().enumerate() {
        pass.emit(instance)
            .map_err(|error| BlockFailure { index, error })?;
    }
    Ok(pass.finish())
}
