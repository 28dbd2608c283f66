/// An item of the category flyout the host shows for this extension.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolboxEntry {
    /// A block, by id.
    Block(String),
    /// A section heading between blocks.
    Label(String),
}

/// Category metadata a visual-programming shell uses to present an extension.
/// Purely for UI grouping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub author: String,
    pub category: String,
    pub version: String,
    pub icon: String,
    pub colour: String,
    pub toolbox: Vec<ToolboxEntry>,
}

impl Manifest {
    pub fn new(name: impl Into<String>) -> Self {
        Manifest {
            name: name.into(),
            ..Manifest::default()
        }
    }

    pub fn block(mut self, id: impl Into<String>) -> Self {
        self.toolbox.push(ToolboxEntry::Block(id.into()));
        self
    }

    pub fn label(mut self, text: impl Into<String>) -> Self {
        self.toolbox.push(ToolboxEntry::Label(text.into()));
        self
    }

    /// Block ids in toolbox order, labels skipped.
    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.toolbox.iter().filter_map(|e| match e {
            ToolboxEntry::Block(id) => Some(id.as_str()),
            ToolboxEntry::Label(_) => None,
        })
    }
}
