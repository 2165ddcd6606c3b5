use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use regex::Regex;

use matchfn::{
    replace_all, Function, FunctionRegistry, MemoryFunctionStore, ScriptCompiler, StaticHost,
};

const FOOTNOTE_SCRIPT: &str = r#"
fn replace(m, number, file_name) {
    `<sup id="fn${number}">${m.text}</sup>`
}
"#;

const NESTED_SCRIPT: &str = r#"
fn replace(m, number, file_name, metadata, dictionaries, functions) {
    functions.invoke("Title-case text", m)
}
"#;

/// A chapter-sized body of prose with a handful of matches per paragraph
fn make_document() -> String {
    let paragraph = "It was the best of times, it was the worst of times [1], it was the age \
                     of wisdom, it was the age of foolishness [2], it was the epoch of belief.\n";
    paragraph.repeat(200)
}

fn make_registry() -> FunctionRegistry {
    let store = MemoryFunctionStore::new()
        .with_function("Footnotes", FOOTNOTE_SCRIPT)
        .with_function("Nested title case", NESTED_SCRIPT);
    FunctionRegistry::new(Box::new(store))
}

// =============================================================================
// One-time costs
// =============================================================================

fn bench_compiler_new(c: &mut Criterion) {
    c.bench_function("compiler_new", |b| {
        b.iter(|| {
            black_box(ScriptCompiler::new());
        });
    });
}

fn bench_compile_function(c: &mut Criterion) {
    let compiler = ScriptCompiler::new();
    c.bench_function("compile_function", |b| {
        b.iter(|| {
            black_box(Function::from_source("Footnotes", black_box(FOOTNOTE_SCRIPT), &compiler).unwrap());
        });
    });
}

fn bench_registry_build(c: &mut Criterion) {
    c.bench_function("registry_build", |b| {
        b.iter(|| {
            let mut registry = make_registry();
            black_box(registry.get(false));
        });
    });
}

// =============================================================================
// Per-document replace
// =============================================================================

fn bench_replace(c: &mut Criterion, id: &str, pattern: &str, function: &str) {
    let mut registry = make_registry();
    let host = StaticHost::default();
    let regex = Regex::new(pattern).unwrap();
    let document = make_document();

    c.bench_function(id, |b| {
        b.iter(|| {
            let mut session = registry.session(function, "chapter1.html", &host).unwrap();
            black_box(replace_all(black_box(&document), &regex, &mut session).unwrap());
        });
    });
}

fn bench_replace_builtin(c: &mut Criterion) {
    bench_replace(c, "replace_builtin_upper", r"worst|best", "Upper-case text");
}

fn bench_replace_builtin_groups(c: &mut Criterion) {
    bench_replace(c, "replace_builtin_groups", r"the (\w+) of (\w+)", "Swap the case of text");
}

fn bench_replace_scripted(c: &mut Criterion) {
    bench_replace(c, "replace_scripted_footnotes", r"\[\d+\]", "Footnotes");
}

fn bench_replace_nested(c: &mut Criterion) {
    bench_replace(c, "replace_scripted_nested", r"age of \w+", "Nested title case");
}

criterion_group!(
    startup,
    bench_compiler_new,
    bench_compile_function,
    bench_registry_build
);

criterion_group!(
    per_document,
    bench_replace_builtin,
    bench_replace_builtin_groups,
    bench_replace_scripted,
    bench_replace_nested
);

criterion_main!(startup, per_document);
