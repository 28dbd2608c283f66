//! Extensions defined in TOML instead of Rust.
//!
//! ```toml
//! [extension]
//! name = "Buzzer"
//! toolbox = [{ label = "Sound" }, "buzzer_beep"]
//!
//! [[block]]
//! id = "buzzer_beep"
//! message = "beep for %1 ms"
//! shape = "statement"
//!
//! [[block.arg]]
//! name = "ms"
//! kind = "number"
//! default = 100
//!
//! [block.template]
//! statement = "buzzer.beep({ms})"
//! definitions = [{ key = "import_buzzer", line = "import buzzer" }]
//! ```

pub mod error;

use std::ops::Range;

use serde::Deserialize;
use toml::Spanned;

use blockdef::{
    ArgSpec, BlockDescriptor, ConnectionShape, DropdownOption, Manifest, SchemaTable, ToolboxEntry,
};

pub use error::LoadError;

use crate::extension::Extension;
use crate::fragment::Order;
use crate::template::{DeclarativeTemplate, TemplateOutput, TemplateString};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtensionFile {
    extension: ManifestDef,
    #[serde(default, rename = "block")]
    blocks: Vec<Spanned<BlockDef>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDef {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    colour: String,
    #[serde(default)]
    toolbox: Vec<Spanned<ToolboxDef>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolboxDef {
    Block(String),
    Label { label: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockDef {
    id: Spanned<String>,
    #[serde(default)]
    message: String,
    shape: ShapeDef,
    #[serde(default)]
    colour: Option<String>,
    #[serde(default)]
    tooltip: String,
    #[serde(default)]
    help_url: String,
    #[serde(default, rename = "arg")]
    args: Vec<Spanned<ArgDef>>,
    template: Spanned<TemplateDef>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ShapeDef {
    Statement,
    Expression,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArgDef {
    name: String,
    kind: ArgKindDef,
    #[serde(default)]
    options: Vec<(String, String)>,
    #[serde(default)]
    default: Option<toml::Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ArgKindDef {
    Dropdown,
    Text,
    Number,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateDef {
    #[serde(default)]
    statement: Option<String>,
    #[serde(default)]
    expression: Option<String>,
    #[serde(default)]
    order: Option<String>,
    #[serde(default)]
    definitions: Vec<DefinitionDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionDef {
    key: String,
    line: String,
}

/// Loader entry point.
pub struct Loader {
    source: String,
    file_id: usize,
}

impl Loader {
    pub fn new(source: String, file_id: usize) -> Self {
        Loader { source, file_id }
    }

    /// Build an extension from the TOML source, reporting every problem found.
    pub fn load(&self) -> Result<Extension, Vec<LoadError>> {
        let file: ExtensionFile = toml::from_str(&self.source).map_err(|e| {
            let span = e.span().unwrap_or(0..0);
            vec![LoadError::new(e.message().to_string(), span, self.file_id)]
        })?;

        let mut errors = Vec::new();
        let mut schema = SchemaTable::new();
        let mut templates = Vec::new();

        let manifest_colour = file.extension.colour.clone();
        for block in file.blocks {
            let span = block.span();
            match self.load_block(block.into_inner(), span.clone(), &manifest_colour, &schema) {
                Ok((descriptor, template)) => {
                    let id = descriptor.id.clone();
                    match schema.register(descriptor) {
                        Ok(()) => templates.push((id, template)),
                        Err(e) => errors.push(LoadError::new(e.to_string(), span, self.file_id)),
                    }
                }
                Err(errs) => errors.extend(errs),
            }
        }

        let manifest = self.load_manifest(file.extension, &schema, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        let whole_file = 0..self.source.len();
        let mut builder = Extension::builder(manifest);
        for descriptor in schema.iter() {
            builder = builder
                .descriptor(descriptor.clone())
                .map_err(|e| vec![LoadError::new(e.to_string(), whole_file.clone(), self.file_id)])?;
        }
        for (id, template) in templates {
            builder = builder
                .template(id, template.into_template_fn())
                .map_err(|e| vec![LoadError::new(e.to_string(), whole_file.clone(), self.file_id)])?;
        }
        let extension = builder
            .build()
            .map_err(|e| vec![LoadError::new(e.to_string(), whole_file, self.file_id)])?;

        tracing::debug!(
            extension = %extension.manifest().name,
            blocks = extension.schema().len(),
            "loaded extension definition"
        );
        Ok(extension)
    }

    fn load_manifest(
        &self,
        def: ManifestDef,
        schema: &SchemaTable,
        errors: &mut Vec<LoadError>,
    ) -> Manifest {
        let mut toolbox = Vec::new();
        for entry in def.toolbox {
            let span = entry.span();
            match entry.into_inner() {
                ToolboxDef::Block(id) => {
                    if !schema.contains(&id) {
                        errors.push(LoadError::new(
                            format!("toolbox names unknown block `{}`", id),
                            span,
                            self.file_id,
                        ));
                    }
                    toolbox.push(ToolboxEntry::Block(id));
                }
                ToolboxDef::Label { label } => toolbox.push(ToolboxEntry::Label(label)),
            }
        }
        Manifest {
            name: def.name,
            description: def.description,
            author: def.author,
            category: def.category,
            version: def.version,
            icon: def.icon,
            colour: def.colour,
            toolbox,
        }
    }

    fn load_block(
        &self,
        def: BlockDef,
        span: Range<usize>,
        manifest_colour: &str,
        schema: &SchemaTable,
    ) -> Result<(BlockDescriptor, DeclarativeTemplate), Vec<LoadError>> {
        let id_span = def.id.span();
        let id = def.id.into_inner();
        let mut errors = Vec::new();

        if schema.contains(&id) {
            return Err(vec![LoadError::new(
                format!("duplicate block id `{}`", id),
                id_span,
                self.file_id,
            )]);
        }

        let shape = match def.shape {
            ShapeDef::Statement => ConnectionShape::Statement,
            ShapeDef::Expression => ConnectionShape::Expression,
        };
        let mut descriptor = BlockDescriptor::new(id.clone(), def.message, shape)
            .with_colour(def.colour.unwrap_or_else(|| manifest_colour.to_string()))
            .with_tooltip(def.tooltip)
            .with_help_url(def.help_url);

        for arg in def.args {
            let arg_span = arg.span();
            match self.load_arg(arg.into_inner(), arg_span) {
                Ok(arg) => descriptor.args.push(arg),
                Err(e) => errors.push(e),
            }
        }
        let args_ok = errors.is_empty();

        if args_ok {
            if let Err(e) = descriptor.validate() {
                errors.push(LoadError::new(e.to_string(), span, self.file_id));
            }
        }

        let template_span = def.template.span();
        let template = match self.load_template(def.template.into_inner(), template_span.clone()) {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if let Some(template) = &template {
            let produces_statement = template.output == TemplateOutput::Statement;
            if produces_statement != (shape == ConnectionShape::Statement) {
                errors.push(
                    LoadError::new(
                        format!("template of {} block `{}` has the wrong form", shape.as_str(), id),
                        template_span.clone(),
                        self.file_id,
                    )
                    .with_note(format!(
                        "{} blocks need a `{}` template",
                        shape.as_str(),
                        shape.as_str()
                    )),
                );
            }
            for field in template.fields().filter(|_| args_ok) {
                if descriptor.arg(field).is_none() {
                    errors.push(LoadError::new(
                        format!("template of `{}` reads undeclared field `{}`", id, field),
                        template_span.clone(),
                        self.file_id,
                    ));
                }
            }
        }

        match template {
            Some(template) if errors.is_empty() => Ok((descriptor, template)),
            _ => Err(errors),
        }
    }

    fn load_arg(&self, def: ArgDef, span: Range<usize>) -> Result<ArgSpec, LoadError> {
        match def.kind {
            ArgKindDef::Dropdown => {
                if def.default.is_some() {
                    return Err(LoadError::new(
                        format!("dropdown `{}` takes options, not a default", def.name),
                        span,
                        self.file_id,
                    )
                    .with_note("the first option is the default"));
                }
                let options = def
                    .options
                    .into_iter()
                    .map(|(label, value)| DropdownOption::new(label, value))
                    .collect();
                Ok(ArgSpec::dropdown_labeled(def.name, options))
            }
            ArgKindDef::Text => match def.default {
                None => Ok(ArgSpec::text(def.name, "")),
                Some(toml::Value::String(s)) => Ok(ArgSpec::text(def.name, s)),
                Some(other) => Err(LoadError::new(
                    format!(
                        "text field `{}` needs a string default, got {}",
                        def.name,
                        other.type_str()
                    ),
                    span,
                    self.file_id,
                )),
            },
            ArgKindDef::Number => match def.default {
                None => Ok(ArgSpec::number(def.name, 0.0)),
                Some(toml::Value::Integer(n)) => Ok(ArgSpec::number(def.name, n as f64)),
                Some(toml::Value::Float(n)) => Ok(ArgSpec::number(def.name, n)),
                Some(other) => Err(LoadError::new(
                    format!(
                        "number field `{}` needs a numeric default, got {}",
                        def.name,
                        other.type_str()
                    ),
                    span,
                    self.file_id,
                )),
            },
        }
    }

    fn load_template(
        &self,
        def: TemplateDef,
        span: Range<usize>,
    ) -> Result<DeclarativeTemplate, LoadError> {
        let parse = |text: &str| {
            TemplateString::parse(text).map_err(|e| {
                LoadError::new(format!("malformed template: {}", e.message), span.clone(), self.file_id)
                    .with_note(format!("at byte {} of `{}`", e.offset, text))
            })
        };

        let (code, output) = match (def.statement, def.expression) {
            (Some(code), None) => {
                if def.order.is_some() {
                    return Err(LoadError::new(
                        "statement templates take no `order`",
                        span.clone(),
                        self.file_id,
                    ));
                }
                (parse(&code)?, TemplateOutput::Statement)
            }
            (None, Some(code)) => {
                let order = match def.order.as_deref() {
                    None => Order::None,
                    Some(name) => name
                        .parse::<Order>()
                        .map_err(|e| LoadError::new(e, span.clone(), self.file_id))?,
                };
                (parse(&code)?, TemplateOutput::Expression(order))
            }
            _ => {
                return Err(LoadError::new(
                    "template needs exactly one of `statement` or `expression`",
                    span.clone(),
                    self.file_id,
                ));
            }
        };

        let mut definitions = Vec::new();
        for def in def.definitions {
            definitions.push((parse(&def.key)?, parse(&def.line)?));
        }

        Ok(DeclarativeTemplate {
            code,
            output,
            definitions,
        })
    }
}

/// Load an extension from TOML source that is not tracked in a file database.
pub fn load_str(source: &str) -> Result<Extension, Vec<LoadError>> {
    Loader::new(source.to_string(), 0).load()
}
