use std::fmt;

use crate::context::Definitions;
use crate::error::CodegenError;
use crate::fields::Fields;
use crate::fragment::{CodeFragment, Order};
use crate::registry::{TemplateFn, template_fn};

/// Code text with `{field}` holes, used by declaratively defined blocks.
/// `{{` and `}}` stand for literal braces.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateString {
    pub parts: Vec<TemplateStringPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateStringPart {
    /// Literal text content.
    Literal(String),
    /// The bound value of the named field.
    Field(String),
}

/// A malformed template string; `offset` is a byte offset into the template text.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSyntaxError {
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for TemplateSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.offset)
    }
}

impl std::error::Error for TemplateSyntaxError {}

impl TemplateString {
    pub fn parse(source: &str) -> Result<Self, TemplateSyntaxError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateSyntaxError {
                            offset: i,
                            message: "unclosed `{` in template".into(),
                        });
                    }
                    let name = name.trim();
                    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                        return Err(TemplateSyntaxError {
                            offset: i,
                            message: format!("invalid field reference `{{{}}}`", name),
                        });
                    }
                    if !literal.is_empty() {
                        parts.push(TemplateStringPart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(TemplateStringPart::Field(name.to_string()));
                }
                '}' => {
                    return Err(TemplateSyntaxError {
                        offset: i,
                        message: "unmatched `}` in template (write `}}` for a literal brace)"
                            .into(),
                    });
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            parts.push(TemplateStringPart::Literal(literal));
        }
        Ok(TemplateString { parts })
    }

    /// Names of the fields this template reads, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            TemplateStringPart::Field(name) => Some(name.as_str()),
            TemplateStringPart::Literal(_) => None,
        })
    }

    pub fn render(&self, fields: &Fields<'_>) -> Result<String, CodegenError> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplateStringPart::Literal(s) => out.push_str(s),
                TemplateStringPart::Field(name) => out.push_str(fields.value(name)?),
            }
        }
        Ok(out)
    }
}

/// What a declarative template produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateOutput {
    Statement,
    Expression(Order),
}

/// A template function described entirely by data.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarativeTemplate {
    pub code: TemplateString,
    pub output: TemplateOutput,
    /// Prerequisite lines, keyed like [`Definitions`]. Keys may interpolate
    /// fields too, giving one definition per distinct value.
    pub definitions: Vec<(TemplateString, TemplateString)>,
}

impl DeclarativeTemplate {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.code
            .fields()
            .chain(
                self.definitions
                    .iter()
                    .flat_map(|(key, line)| key.fields().chain(line.fields())),
            )
    }

    pub fn apply(
        &self,
        fields: &Fields<'_>,
        defs: &mut Definitions,
    ) -> Result<CodeFragment, CodegenError> {
        for (key, line) in &self.definitions {
            defs.provide(key.render(fields)?, line.render(fields)?);
        }
        let code = self.code.render(fields)?;
        Ok(match self.output {
            TemplateOutput::Statement => CodeFragment::statement(code),
            TemplateOutput::Expression(order) => CodeFragment::expression(code, order),
        })
    }

    pub fn into_template_fn(self) -> TemplateFn {
        template_fn(move |fields, defs| self.apply(fields, defs))
    }
}
