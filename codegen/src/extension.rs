use blockdef::{BlockDescriptor, Manifest, SchemaTable};

use crate::context::{Definitions, GenerationContext};
use crate::error::CodegenError;
use crate::fields::{FieldValues, Fields};
use crate::fragment::CodeFragment;
use crate::registry::{TemplateFn, TemplateRegistry};

/// A complete, immutable block set: presentation metadata, block shapes and
/// the template behind each block.
#[derive(Clone)]
pub struct Extension {
    manifest: Manifest,
    schema: SchemaTable,
    templates: TemplateRegistry,
}

impl Extension {
    pub fn builder(manifest: Manifest) -> ExtensionBuilder {
        ExtensionBuilder {
            manifest,
            schema: SchemaTable::new(),
            templates: TemplateRegistry::new(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn schema(&self) -> &SchemaTable {
        &self.schema
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn lookup(&self, id: &str) -> Result<&BlockDescriptor, CodegenError> {
        Ok(self.schema.lookup(id)?)
    }

    pub fn generate(
        &self,
        id: &str,
        values: &FieldValues,
        ctx: &mut GenerationContext,
    ) -> Result<CodeFragment, CodegenError> {
        self.templates.generate(&self.schema, id, values, ctx)
    }
}

/// Collects blocks and templates. The result is checked once in [`build`](Self::build)
/// and cannot be changed afterwards.
pub struct ExtensionBuilder {
    manifest: Manifest,
    schema: SchemaTable,
    templates: TemplateRegistry,
}

impl ExtensionBuilder {
    /// Register a block together with its template.
    pub fn block<F>(mut self, descriptor: BlockDescriptor, template: F) -> Result<Self, CodegenError>
    where
        F: Fn(&Fields<'_>, &mut Definitions) -> Result<CodeFragment, CodegenError>
            + Send
            + Sync
            + 'static,
    {
        let id = descriptor.id.clone();
        self.schema.register(descriptor)?;
        self.templates.register(id, template)?;
        Ok(self)
    }

    pub fn descriptor(mut self, descriptor: BlockDescriptor) -> Result<Self, CodegenError> {
        self.schema.register(descriptor)?;
        Ok(self)
    }

    pub fn template(mut self, id: impl Into<String>, template: TemplateFn) -> Result<Self, CodegenError> {
        self.templates.register_shared(id, template)?;
        Ok(self)
    }

    /// Check that blocks, templates and toolbox agree with each other.
    pub fn build(self) -> Result<Extension, CodegenError> {
        if let Some(id) = self.schema.ids().find(|id| !self.templates.contains(id)) {
            return Err(CodegenError::MissingTemplate(id.to_string()));
        }
        if let Some(id) = self.templates.ids().find(|id| !self.schema.contains(id)) {
            return Err(CodegenError::UnknownBlock(id.to_string()));
        }
        if let Some(id) = self.manifest.block_ids().find(|id| !self.schema.contains(id)) {
            return Err(CodegenError::UnknownBlock(id.to_string()));
        }
        tracing::debug!(
            extension = %self.manifest.name,
            blocks = self.schema.len(),
            "extension built"
        );
        Ok(Extension {
            manifest: self.manifest,
            schema: self.schema,
            templates: self.templates,
        })
    }
}
