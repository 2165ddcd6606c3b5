// Core library for matchfn: named replace functions for regex search/replace

pub mod builtins;
pub mod case;
pub mod compiler;
pub mod config;
pub mod error;
pub mod function;
pub mod groups;
pub mod host;
pub mod regex_match;
pub mod registry;
pub mod replacer;
pub mod rhai_functions;
pub mod store;

pub use compiler::{Namespace, ScriptCompiler};
pub use error::{CompileError, ReplaceError, StoreError};
pub use function::{CallArgs, Function, FunctionMap, FunctionTable, Session};
pub use groups::{apply_to_match_groups, map_match_groups};
pub use host::{DocumentMetadata, HostServices, StaticHost};
pub use regex_match::RegexMatch;
pub use registry::{FunctionRegistry, SkippedFunction};
pub use replacer::{replace_all, Replaced};
pub use store::{FunctionStore, JsonFunctionStore, MemoryFunctionStore};
