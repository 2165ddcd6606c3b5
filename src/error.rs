use std::path::PathBuf;

use rhai::{EvalAltResult, ParseError};
use thiserror::Error;

/// Failure to turn script source into a callable function.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unknown source encoding '{0}'")]
    UnknownEncoding(String),

    #[error("source is not valid {encoding}")]
    Decode { encoding: &'static str },

    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    #[error("script failed while loading: {0}")]
    Runtime(Box<EvalAltResult>),

    #[error("script does not define a 'replace' function")]
    MissingEntryPoint,

    #[error("'replace' is a {type_name}, not a function")]
    NotCallable { type_name: String },

    #[error("'replace' points at native function '{name}'; use a script function or closure")]
    NativeEntryPoint { name: String },

    #[error("'replace' takes {arity} parameters but at most {max} are supplied")]
    TooManyParameters { arity: usize, max: usize },
}

/// Failure while producing the replacement for a single match.
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("function '{function}' failed: {source}")]
    Script {
        function: String,
        #[source]
        source: Box<EvalAltResult>,
    },

    #[error("function '{function}' returned {type_name} instead of text")]
    BadReturn {
        function: String,
        type_name: String,
    },

    #[error("no function named '{0}'")]
    UnknownFunction(String),

    #[error("function calls nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Failure to load the persisted user function store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read function store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("function store {path} is not a JSON object of name/source pairs: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
