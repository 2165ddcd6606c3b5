use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::builtins::BUILTINS;
use crate::compiler::ScriptCompiler;
use crate::function::{Function, FunctionMap, Session};
use crate::host::HostServices;
use crate::store::FunctionStore;

/// A user function left out of the last build because it did not compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFunction {
    pub name: String,
    pub message: String,
}

enum RegistryState {
    Uninitialized,
    Built(FunctionMap),
}

/// Cache of every available function: the built-ins merged with the
/// compiled contents of a user function store.
///
/// Built on first use and reused until a refresh is asked for. A rebuild
/// produces new `Function` objects, so fetch the map once per session
/// rather than holding on to it across a refresh.
pub struct FunctionRegistry {
    compiler: ScriptCompiler,
    store: Box<dyn FunctionStore>,
    state: RegistryState,
    skipped: Vec<SkippedFunction>,
}

impl FunctionRegistry {
    pub fn new(store: Box<dyn FunctionStore>) -> Self {
        Self::with_compiler(store, ScriptCompiler::new())
    }

    pub fn with_compiler(store: Box<dyn FunctionStore>, compiler: ScriptCompiler) -> Self {
        Self {
            compiler,
            store,
            state: RegistryState::Uninitialized,
            skipped: Vec::new(),
        }
    }

    pub fn compiler(&self) -> &ScriptCompiler {
        &self.compiler
    }

    /// The current function map. With `refresh` the store is reloaded and
    /// every function rebuilt; otherwise the cached map is returned as is.
    pub fn get(&mut self, refresh: bool) -> FunctionMap {
        if let (RegistryState::Built(functions), false) = (&self.state, refresh) {
            return Arc::clone(functions);
        }
        let functions = self.build(refresh);
        self.state = RegistryState::Built(Arc::clone(&functions));
        functions
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, RegistryState::Built(_))
    }

    pub fn lookup(&mut self, name: &str) -> Option<Arc<Function>> {
        self.get(false).get(name).cloned()
    }

    /// Names for a selection list.
    pub fn enumerate_names(&mut self) -> BTreeSet<String> {
        self.get(false).keys().cloned().collect()
    }

    /// User functions dropped from the last build.
    pub fn skipped(&self) -> &[SkippedFunction] {
        &self.skipped
    }

    /// Look up `name` and start a session on it against the current map.
    pub fn session(
        &mut self,
        name: &str,
        context_name: &str,
        host: &dyn HostServices,
    ) -> Option<Session> {
        let functions = self.get(false);
        let function = functions.get(name).cloned()?;
        Some(function.init_env(context_name, host, functions))
    }

    fn build(&mut self, refresh: bool) -> FunctionMap {
        let mut functions = IndexMap::new();
        for builtin in BUILTINS {
            functions.insert(
                builtin.name.to_string(),
                Arc::new(Function::builtin(builtin.name, builtin.transform)),
            );
        }

        if refresh {
            if let Err(e) = self.store.refresh() {
                log::warn!("keeping previously loaded user functions: {}", e);
            }
        }

        // A broken script must not take the other functions down with it.
        self.skipped.clear();
        for (name, source) in self.store.entries() {
            match Function::from_source(&name, &source, &self.compiler) {
                Ok(function) => {
                    functions.insert(name, Arc::new(function));
                }
                Err(e) => {
                    log::warn!("skipping user function '{}': {}", name, e);
                    self.skipped.push(SkippedFunction {
                        name,
                        message: e.to_string(),
                    });
                }
            }
        }

        log::debug!(
            "function registry built: {} functions, {} skipped",
            functions.len(),
            self.skipped.len()
        );
        Arc::new(functions)
    }
}
