use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use rhai::{Dynamic, Engine, Map};

use crate::builtins;
use crate::compiler::{EntryPoint, Namespace, ScriptCompiler};
use crate::error::{CompileError, ReplaceError};
use crate::host::{Dictionaries, DocumentMetadata, HostServices};
use crate::regex_match::RegexMatch;

/// Snapshot of every function known to a registry, by name.
pub type FunctionMap = Arc<IndexMap<String, Arc<Function>>>;

/// Signature of a native built-in.
pub type NativeTransform = fn(&CallArgs<'_>) -> Result<String, ReplaceError>;

/// Nested `functions.invoke(...)` calls allowed before giving up.
pub const MAX_CALL_DEPTH: usize = 16;

/// Everything a native transform receives for one match.
pub struct CallArgs<'a> {
    pub matched: &'a RegexMatch,
    pub number: u64,
    pub context_name: &'a str,
    pub metadata: &'a DocumentMetadata,
    pub dictionaries: &'a DictionaryHandle,
    pub functions: &'a FunctionTable,
}

/// Shared handle to the dictionary service, as seen by scripts.
#[derive(Clone)]
pub struct DictionaryHandle(pub Arc<dyn Dictionaries>);

impl DictionaryHandle {
    pub fn recognized(&self, word: &str, locale: Option<&str>) -> bool {
        self.0.recognized(word, locale)
    }

    pub fn suggestions(&self, word: &str, locale: Option<&str>) -> Vec<String> {
        self.0.suggestions(word, locale)
    }
}

/// State fixed for the duration of one search/replace session.
pub(crate) struct Environment {
    context_name: String,
    metadata: DocumentMetadata,
    metadata_map: Map,
    dictionaries: DictionaryHandle,
    functions: FunctionMap,
}

/// The function table handed to a call, used to reach other functions by
/// name. Nested calls share the caller's match number and environment.
#[derive(Clone)]
pub struct FunctionTable {
    env: Arc<Environment>,
    number: u64,
    depth: usize,
}

impl FunctionTable {
    pub fn get(&self, name: &str) -> Option<&Arc<Function>> {
        self.env.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.env.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.env.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.env.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.env.functions.is_empty()
    }

    /// Run the function called `name` on `matched`.
    pub fn invoke(&self, name: &str, matched: &RegexMatch) -> Result<String, ReplaceError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(ReplaceError::TooDeep(MAX_CALL_DEPTH));
        }
        let function = self
            .get(name)
            .ok_or_else(|| ReplaceError::UnknownFunction(name.to_string()))?;
        function.invoke(matched, self.number, &self.env, self.depth + 1)
    }
}

struct ScriptedFunction {
    source: String,
    engine: Arc<Engine>,
    namespace: Namespace,
    entry: EntryPoint,
}

enum FunctionKind {
    Builtin(NativeTransform),
    Scripted(ScriptedFunction),
}

/// A named replace function, either native or compiled from a script.
///
/// Identity is the name: two functions with the same name compare equal,
/// hash the same and order together, whichever implementation they carry.
pub struct Function {
    name: String,
    kind: FunctionKind,
}

impl Function {
    pub fn builtin(name: &str, transform: NativeTransform) -> Self {
        Self {
            name: name.to_string(),
            kind: FunctionKind::Builtin(transform),
        }
    }

    /// Compile `source` and bind its `replace` entry point.
    pub fn from_source(
        name: &str,
        source: &str,
        compiler: &ScriptCompiler,
    ) -> Result<Self, CompileError> {
        let namespace = compiler.compile(source)?;
        Self::from_namespace(name, source.to_string(), namespace, compiler)
    }

    /// Like [`Function::from_source`] for raw bytes that may carry a coding
    /// declaration.
    pub fn from_source_bytes(
        name: &str,
        source: &[u8],
        compiler: &ScriptCompiler,
    ) -> Result<Self, CompileError> {
        let text = crate::compiler::decode_source(source)?;
        let namespace = compiler.compile(&text)?;
        Self::from_namespace(name, text, namespace, compiler)
    }

    fn from_namespace(
        name: &str,
        source: String,
        namespace: Namespace,
        compiler: &ScriptCompiler,
    ) -> Result<Self, CompileError> {
        let entry = namespace.entry_point()?;
        Ok(Self {
            name: name.to_string(),
            kind: FunctionKind::Scripted(ScriptedFunction {
                source,
                engine: Arc::clone(compiler.engine()),
                namespace,
                entry,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, FunctionKind::Builtin(_))
    }

    /// Source for display and editing. Built-ins answer from the bundled
    /// catalog; their native code is what actually runs.
    pub fn source(&self) -> Option<&str> {
        match &self.kind {
            FunctionKind::Builtin(_) => builtins::catalog_source(&self.name),
            FunctionKind::Scripted(script) => Some(&script.source),
        }
    }

    /// Start a search/replace session on this function.
    ///
    /// The match counter starts at zero. `functions` is the registry
    /// snapshot the function sees, normally the map it was looked up in.
    pub fn init_env(
        self: &Arc<Self>,
        context_name: &str,
        host: &dyn HostServices,
        functions: FunctionMap,
    ) -> Session {
        let metadata = host.current_metadata();
        let metadata_map = metadata.to_rhai_map();
        Session {
            function: Arc::clone(self),
            env: Arc::new(Environment {
                context_name: context_name.to_string(),
                metadata,
                metadata_map,
                dictionaries: DictionaryHandle(host.dictionaries()),
                functions,
            }),
            match_index: 0,
        }
    }

    pub(crate) fn invoke(
        &self,
        matched: &RegexMatch,
        number: u64,
        env: &Arc<Environment>,
        depth: usize,
    ) -> Result<String, ReplaceError> {
        let table = FunctionTable {
            env: Arc::clone(env),
            number,
            depth,
        };
        match &self.kind {
            FunctionKind::Builtin(transform) => transform(&CallArgs {
                matched,
                number,
                context_name: &env.context_name,
                metadata: &env.metadata,
                dictionaries: &env.dictionaries,
                functions: &table,
            }),
            FunctionKind::Scripted(script) => {
                let args: Vec<Dynamic> = vec![
                    Dynamic::from(matched.clone()),
                    Dynamic::from(number as rhai::INT),
                    Dynamic::from(env.context_name.clone()),
                    Dynamic::from(env.metadata_map.clone()),
                    Dynamic::from(env.dictionaries.clone()),
                    Dynamic::from(table),
                ]
                .into_iter()
                .take(script.entry.arity())
                .collect();

                let result = script.entry.ptr().call::<Dynamic>(
                    &script.engine,
                    script.namespace.ast(),
                    args,
                );

                let value = result.map_err(|source| ReplaceError::Script {
                    function: self.name.clone(),
                    source,
                })?;
                text_result(&self.name, value)
            }
        }
    }
}

/// Turn a script's return value into replacement text.
fn text_result(function: &str, value: Dynamic) -> Result<String, ReplaceError> {
    if value.is_string() || value.is_char() || value.is_int() || value.is_float() || value.is_bool()
    {
        return Ok(value.to_string());
    }
    Err(ReplaceError::BadReturn {
        function: function.to_string(),
        type_name: value.type_name().to_string(),
    })
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("is_builtin", &self.is_builtin())
            .finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Function {}

impl Hash for Function {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Function {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Function {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// One search/replace session on a function.
///
/// Owns the match counter and context, so sessions on the same function
/// never disturb each other.
pub struct Session {
    function: Arc<Function>,
    env: Arc<Environment>,
    match_index: u64,
}

impl Session {
    /// Produce the replacement for the next match. The first call sees
    /// number 1. Errors from the function are returned as-is.
    pub fn call(&mut self, matched: &RegexMatch) -> Result<String, ReplaceError> {
        self.match_index += 1;
        self.function
            .invoke(matched, self.match_index, &self.env, 0)
    }

    pub fn match_index(&self) -> u64 {
        self.match_index
    }

    pub fn context_name(&self) -> &str {
        &self.env.context_name
    }

    pub fn function(&self) -> &Arc<Function> {
        &self.function
    }
}
