use std::collections::BTreeMap;

use blockdef::BlockDescriptor;

use crate::error::CodegenError;

/// Raw field values of one block instance, as the host hands them over:
/// field name to the bound value (a dropdown's option value, not its label).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    values: BTreeMap<String, String>,
}

impl FieldValues {
    pub fn new() -> Self {
        FieldValues::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut fields = FieldValues::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// Field values checked against the block's descriptor: every declared field is
/// present and nothing undeclared is.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    descriptor: &'a BlockDescriptor,
    values: &'a FieldValues,
}

impl<'a> Fields<'a> {
    /// Validate `values` against `descriptor`.
    ///
    /// Values outside a field's options are returned as warning messages rather
    /// than rejected: the generated call name may legitimately depend on the
    /// exact string supplied.
    pub fn bind(
        descriptor: &'a BlockDescriptor,
        values: &'a FieldValues,
    ) -> Result<(Fields<'a>, Vec<String>), CodegenError> {
        for arg in &descriptor.args {
            if values.get(&arg.name).is_none() {
                return Err(CodegenError::MissingField {
                    block: descriptor.id.clone(),
                    field: arg.name.clone(),
                });
            }
        }
        if let Some((name, _)) = values.iter().find(|(name, _)| descriptor.arg(name).is_none()) {
            return Err(CodegenError::UnknownField {
                block: descriptor.id.clone(),
                field: name.to_string(),
            });
        }

        let mut warnings = Vec::new();
        for arg in &descriptor.args {
            let value = values.get(&arg.name).unwrap_or_default();
            if !arg.accepts(value) {
                warnings.push(format!(
                    "field {} has value {:?}, which is not one of its {} options",
                    arg.name,
                    value,
                    arg.kind_name()
                ));
            }
        }

        Ok((Fields { descriptor, values }, warnings))
    }

    /// The bound value of a declared field.
    pub fn value(&self, name: &str) -> Result<&'a str, CodegenError> {
        match self.descriptor.arg(name) {
            Some(_) => self.values.get(name).ok_or_else(|| CodegenError::MissingField {
                block: self.descriptor.id.clone(),
                field: name.to_string(),
            }),
            None => Err(CodegenError::UnknownField {
                block: self.descriptor.id.clone(),
                field: name.to_string(),
            }),
        }
    }
}
