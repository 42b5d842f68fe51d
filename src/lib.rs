pub mod api;
pub mod ast;
pub mod builder;
pub mod compiler;
pub mod context;
pub mod deviation;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod utils;
pub mod validate;
pub mod yin;

pub use api::{analyze, AnalysisResult};
pub use ast::{Node, NodeKind, ParsedModule, SchemaFormat};
pub use context::{Context, ContextOptions, Module, ModuleId};
pub use error::{ErrorKind, YangError};
pub use loader::{Located, ParseOptions};
pub use schema::{CompiledModule, CompiledNode, CompiledNodeKind};
pub use source::{MemorySource, ModuleSource, SearchDirs};
