/// Prompt compiler
///
/// Turns resolved prompt IR into TypeScript or JavaScript modules that
/// export each prompt together with zod validators for its tools and
/// structured output.

pub mod assembler;
pub mod driver;
pub mod error;
pub mod format;
pub mod identifiers;
pub mod schema;
pub mod variant;
pub mod write;

pub use assembler::{assemble, PromptModule};
pub use driver::{Compiler, CompileOptions, OutputFile};
pub use error::{CompileError, Result};
pub use format::{FormatError, FormatterGate, ScriptFormatter, SourceFormatter};
pub use identifiers::{synthesize, Identifiers};
pub use schema::{generate, SchemaFragment};
pub use variant::{ModuleStyle, VariantProfile, VariantRegistry};
pub use write::write_files;
