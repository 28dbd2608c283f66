pub mod context;
pub mod error;
pub mod extension;
pub mod fields;
pub mod fragment;
pub mod loader;
pub mod mpu6050;
pub mod program;
pub mod registry;
pub mod template;

pub use context::{Definitions, GenerationContext, Warning};
pub use error::CodegenError;
pub use extension::{Extension, ExtensionBuilder};
pub use fields::{FieldValues, Fields};
pub use fragment::{CodeFragment, Order};
pub use program::{BlockFailure, BlockInstance, GeneratedProgram, Pass, generate_program};
pub use registry::{TemplateFn, TemplateRegistry, template_fn};
