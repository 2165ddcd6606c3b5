use std::collections::BTreeSet;
use std::sync::Arc;

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use rhai::{Dynamic, Engine, EvalAltResult, EvalContext, FnPtr, OptimizationLevel, Scope, AST};

use crate::error::CompileError;
use crate::rhai_functions;

/// Name of the function every user script must define.
pub const ENTRY_POINT: &str = "replace";

/// Arguments passed to an entry point: match, number, context name,
/// metadata, dictionaries, functions.
pub const MAX_ARGS: usize = 6;

// Coding declarations are only honoured near the top of the file.
const DECLARATION_WINDOW: usize = 200;

static CODING_DECLARATION: Lazy<regex::bytes::Regex> = Lazy::new(|| {
    regex::bytes::Regex::new(r"coding[:=]\s*([-\w.]+)")
        .expect("failed to compile coding declaration regex")
});
static DECLARATION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#|//).*coding[ \t]*[:=][ \t]*[-\w.]+.*$")
        .expect("failed to compile declaration line regex")
});

/// Compiles user script source into namespaces.
///
/// Owns the engine every compiled script runs on. Cloning shares the engine.
#[derive(Clone)]
pub struct ScriptCompiler {
    engine: Arc<Engine>,
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptCompiler {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_optimization_level(OptimizationLevel::Simple);
        engine.set_max_expr_depths(64, 64);

        // Keep stdout for replacement output
        engine.on_print(|text| log::info!(target: "matchfn::script", "{}", text));
        engine.on_debug(|text, source, pos| match source {
            Some(source) => log::debug!(target: "matchfn::script", "{} @ {:?}: {}", source, pos, text),
            None => log::debug!(target: "matchfn::script", "{:?}: {}", pos, text),
        });

        engine.on_var(|name, index, context| resolve_top_level(name, index, &context));

        rhai_functions::register_all_functions(&mut engine);

        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Decode raw script bytes, honouring a coding declaration, then compile.
    pub fn compile_bytes(&self, source: &[u8]) -> Result<Namespace, CompileError> {
        let text = decode_source(source)?;
        self.compile(&text)
    }

    /// Compile already decoded script text and run its top level in a fresh
    /// scope.
    pub fn compile(&self, source: &str) -> Result<Namespace, CompileError> {
        let text = prepare_source(source);
        let ast = self.engine.compile(&text)?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(CompileError::Runtime)?;

        let bound = self.bind_entry_point(&ast, &scope)?;
        Ok(Namespace { ast, scope, bound })
    }

    /// Resolve `replace` to a function pointer whose environment carries
    /// every top-level binding as a global constant, so the entry point and
    /// the helpers it calls can read them (`name` or `global::name`).
    fn bind_entry_point(
        &self,
        ast: &AST,
        scope: &Scope<'static>,
    ) -> Result<Option<FnPtr>, CompileError> {
        let has_function = ast.iter_functions().any(|f| f.name == ENTRY_POINT);
        if !has_function && !scope.contains(ENTRY_POINT) {
            return Ok(None);
        }

        let names: BTreeSet<&str> = scope
            .iter_raw()
            .map(|(name, _, _)| name)
            .filter(|name| *name != ENTRY_POINT && is_plain_identifier(name))
            .collect();
        let mut tail = String::new();
        for name in names {
            tail.push_str(&format!("const {name} = {name};\n"));
        }
        tail.push_str(ENTRY_POINT);

        let tail = self.engine.compile(&tail)?;
        let entry = ast.clone_functions_only().merge(&tail);
        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope.clone(), &entry)
            .map_err(CompileError::Runtime)?;
        Ok(value.try_cast::<FnPtr>())
    }
}

// Bare-name access to top-level bindings from inside script functions.
// Locals and parameters shadow them.
fn resolve_top_level(
    name: &str,
    index: usize,
    context: &EvalContext,
) -> Result<Option<Dynamic>, Box<EvalAltResult>> {
    if index > 0 || context.scope().contains(name) {
        return Ok(None);
    }
    let Some(constants) = &context.global_runtime_state().constants else {
        return Ok(None);
    };
    Ok(constants
        .read()
        .ok()
        .and_then(|constants| constants.get(name).cloned()))
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
}

/// Decode script bytes using the encoding named in a coding declaration
/// within the first 200 bytes, or UTF-8 when there is none.
pub fn decode_source(source: &[u8]) -> Result<String, CompileError> {
    let head = &source[..source.len().min(DECLARATION_WINDOW)];
    let encoding = match CODING_DECLARATION
        .captures(head)
        .and_then(|caps| caps.get(1))
    {
        Some(label) => lookup_encoding(label.as_bytes()).ok_or_else(|| {
            CompileError::UnknownEncoding(String::from_utf8_lossy(label.as_bytes()).into_owned())
        })?,
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(source);
    if had_errors {
        return Err(CompileError::Decode {
            encoding: used.name(),
        });
    }
    Ok(text.into_owned())
}

fn lookup_encoding(label: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_label(label).or_else(|| {
        // "latin-1", "utf_8" and friends
        let squashed: Vec<u8> = label
            .iter()
            .copied()
            .filter(|b| *b != b'-' && *b != b'_')
            .collect();
        Encoding::for_label(&squashed)
    })
}

/// Normalize line endings and blank out coding declaration lines.
fn prepare_source(source: &str) -> String {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    DECLARATION_LINE.replace_all(&text, "//").into_owned()
}

/// The result of running a script: its function definitions plus the
/// variables its top level left behind.
#[derive(Debug, Clone)]
pub struct Namespace {
    ast: AST,
    scope: Scope<'static>,
    bound: Option<FnPtr>,
}

/// How to invoke a script's `replace`.
#[derive(Debug, Clone)]
pub enum EntryPoint {
    /// `fn replace(...)` taking the first `arity` arguments.
    Function { ptr: FnPtr, arity: usize },
    /// `let replace = |...| ...;`
    Closure { ptr: FnPtr, arity: usize },
}

impl EntryPoint {
    pub fn arity(&self) -> usize {
        match self {
            EntryPoint::Function { arity, .. } | EntryPoint::Closure { arity, .. } => *arity,
        }
    }

    pub fn ptr(&self) -> &FnPtr {
        match self {
            EntryPoint::Function { ptr, .. } | EntryPoint::Closure { ptr, .. } => ptr,
        }
    }
}

impl Namespace {
    pub fn ast(&self) -> &AST {
        &self.ast
    }

    /// Every defined function and top-level variable name.
    pub fn names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .ast
            .iter_functions()
            .filter(|f| !f.name.starts_with("anon$"))
            .map(|f| f.name.to_string())
            .collect();
        names.extend(self.scope.iter().map(|(name, _, _)| name.to_string()));
        names
    }

    pub fn variable(&self, name: &str) -> Option<&Dynamic> {
        self.scope.get(name)
    }

    /// Locate `replace`, preferring a script function over a variable.
    ///
    /// With several overloads the widest one that fits in [`MAX_ARGS`] wins.
    pub fn entry_point(&self) -> Result<EntryPoint, CompileError> {
        let arities: Vec<usize> = self
            .ast
            .iter_functions()
            .filter(|f| f.name == ENTRY_POINT)
            .map(|f| f.params.len())
            .collect();
        if let Some(arity) = arities.iter().copied().filter(|a| *a <= MAX_ARGS).max() {
            let ptr = self.bound.clone().ok_or(CompileError::MissingEntryPoint)?;
            return Ok(EntryPoint::Function { ptr, arity });
        }
        if let Some(arity) = arities.into_iter().min() {
            return Err(CompileError::TooManyParameters {
                arity,
                max: MAX_ARGS,
            });
        }

        let value = self
            .scope
            .get(ENTRY_POINT)
            .ok_or(CompileError::MissingEntryPoint)?;
        if !value.is_fnptr() {
            return Err(CompileError::NotCallable {
                type_name: value.type_name().to_string(),
            });
        }

        let ptr = value.clone().cast::<FnPtr>();
        let arity = self
            .closure_arity(&ptr)
            .ok_or_else(|| CompileError::NativeEntryPoint {
                name: ptr.fn_name().to_string(),
            })?;
        if arity > MAX_ARGS {
            return Err(CompileError::TooManyParameters {
                arity,
                max: MAX_ARGS,
            });
        }
        Ok(EntryPoint::Closure { ptr, arity })
    }

    // Captured variables are curried in front of the declared parameters.
    // `None` when the pointer names no script function.
    fn closure_arity(&self, ptr: &FnPtr) -> Option<usize> {
        self.ast
            .iter_functions()
            .filter(|f| f.name == ptr.fn_name())
            .map(|f| f.params.len().saturating_sub(ptr.curry().len()))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_collects_functions_and_variables() {
        let compiler = ScriptCompiler::new();
        let ns = compiler
            .compile("let greeting = \"hi\";\nfn helper(x) { x }\nfn replace(m, number) { greeting }\n")
            .unwrap();

        let names: Vec<String> = ns.names().into_iter().collect();
        assert_eq!(names, vec!["greeting", "helper", "replace"]);
        assert_eq!(ns.variable("greeting").unwrap().to_string(), "hi");
        assert!(matches!(ns.entry_point().unwrap(), EntryPoint::Function { arity: 2, .. }));
    }

    #[test]
    fn test_missing_entry_point() {
        let compiler = ScriptCompiler::new();
        let ns = compiler.compile("fn other(m) { m }").unwrap();
        assert!(matches!(ns.entry_point(), Err(CompileError::MissingEntryPoint)));
    }

    #[test]
    fn test_entry_point_not_callable() {
        let compiler = ScriptCompiler::new();
        let ns = compiler.compile("let replace = 42;").unwrap();
        match ns.entry_point() {
            Err(CompileError::NotCallable { type_name }) => assert_eq!(type_name, "i64"),
            other => panic!("expected NotCallable, got {:?}", other),
        }
    }

    #[test]
    fn test_entry_point_too_many_parameters() {
        let compiler = ScriptCompiler::new();
        let ns = compiler
            .compile("fn replace(a, b, c, d, e, f, g) { a }")
            .unwrap();
        assert!(matches!(
            ns.entry_point(),
            Err(CompileError::TooManyParameters { arity: 7, max: 6 })
        ));
    }

    #[test]
    fn test_closure_entry_point_arity_ignores_captures() {
        let compiler = ScriptCompiler::new();
        let ns = compiler
            .compile("let prefix = \">\";\nlet replace = |m, number| prefix + number;\n")
            .unwrap();
        let entry = ns.entry_point().unwrap();
        assert!(matches!(entry, EntryPoint::Closure { .. }));
        assert_eq!(entry.arity(), 2);
    }

    #[test]
    fn test_native_function_pointer_is_rejected() {
        let compiler = ScriptCompiler::new();
        let ns = compiler.compile("let replace = Fn(\"upper\");").unwrap();
        match ns.entry_point() {
            Err(CompileError::NativeEntryPoint { name }) => assert_eq!(name, "upper"),
            other => panic!("expected NativeEntryPoint, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error() {
        let compiler = ScriptCompiler::new();
        let err = compiler.compile("fn replace(m) { ").unwrap_err();
        assert!(matches!(err, CompileError::Syntax(_)));
    }

    #[test]
    fn test_top_level_runtime_error() {
        let compiler = ScriptCompiler::new();
        let err = compiler
            .compile("throw \"nope\";\nfn replace(m) { m }")
            .unwrap_err();
        assert!(matches!(err, CompileError::Runtime(_)));
    }

    #[test]
    fn test_scripts_do_not_share_scope() {
        let compiler = ScriptCompiler::new();
        compiler.compile("let shared = 1;").unwrap();
        let err = compiler.compile("let x = shared;").unwrap_err();
        assert!(matches!(err, CompileError::Runtime(_)));
    }

    #[test]
    fn test_coding_declaration_is_honoured_and_stripped() {
        let mut latin1 = b"// -*- coding: latin-1 -*-\r\nlet word = \"caf".to_vec();
        latin1.push(0xE9);
        latin1.extend_from_slice(b"\";\r\nfn replace(m) { word }\r\n");

        let compiler = ScriptCompiler::new();
        let from_bytes = compiler.compile_bytes(&latin1).unwrap();
        let from_text = compiler
            .compile("let word = \"café\";\nfn replace(m) { word }\n")
            .unwrap();

        assert_eq!(from_bytes.names(), from_text.names());
        assert_eq!(
            from_bytes.variable("word").unwrap().to_string(),
            from_text.variable("word").unwrap().to_string()
        );
        assert_eq!(from_bytes.variable("word").unwrap().to_string(), "café");
    }

    #[test]
    fn test_decode_defaults_to_utf8() {
        assert_eq!(decode_source("naïve".as_bytes()).unwrap(), "naïve");
        assert!(matches!(
            decode_source(&[0x66, 0xFF, 0x6F]),
            Err(CompileError::Decode { encoding: "UTF-8" })
        ));
    }

    #[test]
    fn test_unknown_encoding() {
        let err = decode_source(b"// coding: klingon-8\nfn replace(m) { m }").unwrap_err();
        match err {
            CompileError::UnknownEncoding(label) => assert_eq!(label, "klingon-8"),
            other => panic!("expected UnknownEncoding, got {:?}", other),
        }
    }

    #[test]
    fn test_hash_style_declaration_is_blanked() {
        let prepared = prepare_source("# vim:fileencoding=utf-8\r\nlet a = 1;\rlet b = 2;");
        assert_eq!(prepared, "//\nlet a = 1;\nlet b = 2;");
    }
}
