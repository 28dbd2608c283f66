use std::collections::BTreeMap;

use serde::Deserialize;
use toml::Spanned;

use codegen::BlockInstance;

/// A flat workspace: the blocks of one program, top to bottom.
///
/// ```toml
/// [[block]]
/// type = "mpu6050_get_Acc"
/// fields = { axis = "y" }
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceFile {
    #[serde(default, rename = "block")]
    pub blocks: Vec<Spanned<BlockEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockEntry {
    #[serde(rename = "type")]
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, toml::Value>,
}

impl BlockEntry {
    /// Field values are handed to templates as text; numbers and booleans are
    /// written the way TOML spells them.
    pub fn to_instance(&self) -> Result<BlockInstance, String> {
        let mut instance = BlockInstance::new(self.id.clone());
        for (name, value) in &self.fields {
            let text = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(n) => n.to_string(),
                toml::Value::Float(n) => n.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(format!(
                        "field `{}` of `{}` must be a string, number or boolean, got {}",
                        name,
                        self.id,
                        other.type_str()
                    ));
                }
            };
            instance = instance.field(name.clone(), text);
        }
        Ok(instance)
    }
}

pub fn parse_workspace(source: &str) -> Result<WorkspaceFile, toml::de::Error> {
    toml::from_str(source)
}
