pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod message;
pub mod table;

pub use descriptor::arg::{ArgKind, ArgSpec, DropdownOption};
pub use descriptor::{BlockDescriptor, ConnectionShape, Style};
pub use error::SchemaError;
pub use manifest::{Manifest, ToolboxEntry};
pub use table::SchemaTable;
