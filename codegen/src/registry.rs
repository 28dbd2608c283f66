use std::collections::HashMap;
use std::sync::Arc;

use blockdef::SchemaTable;

use crate::context::{Definitions, GenerationContext};
use crate::error::CodegenError;
use crate::fields::{FieldValues, Fields};
use crate::fragment::CodeFragment;

/// Generates one block's code from its validated fields. The only side channel
/// is the `Definitions` staging area for one-time prerequisite lines.
pub type TemplateFn =
    Arc<dyn Fn(&Fields<'_>, &mut Definitions) -> Result<CodeFragment, CodegenError> + Send + Sync>;

/// Box a closure as a [`TemplateFn`].
pub fn template_fn<F>(template: F) -> TemplateFn
where
    F: Fn(&Fields<'_>, &mut Definitions) -> Result<CodeFragment, CodegenError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(template)
}

/// Block id to template function. Each id can be bound once.
#[derive(Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, TemplateFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        TemplateRegistry::default()
    }

    pub fn register<F>(&mut self, id: impl Into<String>, template: F) -> Result<(), CodegenError>
    where
        F: Fn(&Fields<'_>, &mut Definitions) -> Result<CodeFragment, CodegenError>
            + Send
            + Sync
            + 'static,
    {
        self.register_shared(id, template_fn(template))
    }

    pub fn register_shared(
        &mut self,
        id: impl Into<String>,
        template: TemplateFn,
    ) -> Result<(), CodegenError> {
        let id = id.into();
        if self.templates.contains_key(&id) {
            return Err(CodegenError::DuplicateId(id));
        }
        self.templates.insert(id, template);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Generate the code of one block instance.
    ///
    /// Fails without touching `ctx` when the id is unknown, the field map does
    /// not match the descriptor, or the template itself fails. On success the
    /// template's definitions and any field warnings are merged into `ctx`.
    pub fn generate(
        &self,
        schema: &SchemaTable,
        id: &str,
        values: &FieldValues,
        ctx: &mut GenerationContext,
    ) -> Result<CodeFragment, CodegenError> {
        let descriptor = schema.lookup(id)?;
        let template = self
            .templates
            .get(id)
            .ok_or_else(|| CodegenError::UnknownBlock(id.to_string()))?;

        let (fields, warnings) = Fields::bind(descriptor, values)?;

        let mut staged = Definitions::new();
        let fragment = template(&fields, &mut staged)?;

        tracing::debug!(block = id, code = fragment.code(), "generated block");
        for (key, line) in staged.iter() {
            tracing::trace!(block = id, key, line, "definition provided");
        }
        ctx.definitions.merge(staged);
        for message in warnings {
            ctx.warn(id, message);
        }
        Ok(fragment)
    }
}
