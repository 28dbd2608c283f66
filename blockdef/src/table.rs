use std::collections::HashMap;

use crate::descriptor::BlockDescriptor;
use crate::error::SchemaError;

/// Write-once table of block descriptors, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    blocks: Vec<BlockDescriptor>,
    index: HashMap<String, usize>,
}

impl SchemaTable {
    pub fn new() -> Self {
        SchemaTable::default()
    }

    /// Validate and add a descriptor. Ids can be registered only once.
    pub fn register(&mut self, descriptor: BlockDescriptor) -> Result<(), SchemaError> {
        if self.index.contains_key(&descriptor.id) {
            return Err(SchemaError::DuplicateId(descriptor.id));
        }
        descriptor.validate()?;
        self.index.insert(descriptor.id.clone(), self.blocks.len());
        self.blocks.push(descriptor);
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Result<&BlockDescriptor, SchemaError> {
        self.get(id)
            .ok_or_else(|| SchemaError::UnknownBlock(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&BlockDescriptor> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDescriptor> {
        self.blocks.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
