mod common;
use common::*;

#[test]
fn test_builtin_uppercase_whole_match() {
    let store = StoreDir::with_functions(&[]);
    let (stdout, _stderr, exit_code) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", "hello world", "Upper-case text"],
        "say hello world\n",
    );
    assert_eq!(exit_code, 0, "matchfn should exit successfully");
    assert_eq!(stdout, "say HELLO WORLD\n");
}

#[test]
fn test_builtin_uppercase_only_groups() {
    let store = StoreDir::with_functions(&[]);
    let (stdout, _stderr, exit_code) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", "hello (world)", "Upper-case text"],
        "hello world\n",
    );
    assert_eq!(exit_code, 0);
    assert_eq!(stdout, "hello WORLD\n");
}

#[test]
fn test_user_function_numbers_matches_per_file() {
    let store = StoreDir::with_functions(&[(
        "Number footnotes",
        "fn replace(m, number, file_name) { `[${number}]` }",
    )]);
    let first = store.file("one.txt", b"a* b* c*");
    let second = store.file("two.txt", b"d*");

    let (stdout, stderr, exit_code) = run_matchfn_with_input(
        &[
            "--functions",
            store.path_str(),
            "run",
            r"\*",
            "Number footnotes",
            first.to_str().unwrap(),
            second.to_str().unwrap(),
            "--count",
        ],
        "",
    );
    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    assert_eq!(stdout, "a[1] b[2] c[3]d[1]");
    assert!(stderr.contains("3 replacements"));
    assert!(stderr.contains("1 replacements"));
}

#[test]
fn test_context_name_defaults_to_file_path() {
    let store = StoreDir::with_functions(&[(
        "File name",
        "fn replace(m, number, file_name) { file_name }",
    )]);
    let input = store.file("chapter.html", b"NAME");

    let (stdout, _stderr, exit_code) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", "NAME", "File name", input.to_str().unwrap()],
        "",
    );
    assert_eq!(exit_code, 0);
    assert_eq!(stdout, input.to_str().unwrap());

    let (stdout, _stderr, _) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", "NAME", "File name", "--context", "toc.ncx"],
        "NAME",
    );
    assert_eq!(stdout, "toc.ncx");
}

#[test]
fn test_in_place_rewrites_file() {
    let store = StoreDir::with_functions(&[]);
    let input = store.file("book.txt", b"the hobbit\n");

    let (_stdout, _stderr, exit_code) = run_matchfn_with_input(
        &[
            "--functions",
            store.path_str(),
            "run",
            ".+",
            "Title-case text",
            "--in-place",
            input.to_str().unwrap(),
        ],
        "",
    );
    assert_eq!(exit_code, 0);
    assert_eq!(read(&input), "The Hobbit\n");
}

#[test]
fn test_metadata_and_dictionary_reach_script() {
    let store = StoreDir::with_functions(&[(
        "Mark unknown",
        r#"
        fn replace(m, number, file_name, metadata, dictionaries) {
            if dictionaries.recognized(m.text) { m.text } else { `${m.text}<${metadata.language}>` }
        }
        "#,
    )]);
    let metadata = store.file("meta.json", br#"{"title": "Test", "language": "en"}"#);
    let words = store.file("words.txt", b"# english\nthe\ncat\n");

    let (stdout, stderr, exit_code) = run_matchfn_with_input(
        &[
            "--functions",
            store.path_str(),
            "run",
            r"\w+",
            "Mark unknown",
            "--metadata",
            metadata.to_str().unwrap(),
            "--dictionary",
            words.to_str().unwrap(),
        ],
        "the cta sat",
    );
    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    assert_eq!(stdout, "the cta<en> sat<en>");
}

#[test]
fn test_failing_script_aborts_without_output() {
    let store = StoreDir::with_functions(&[(
        "Strict",
        r#"fn replace(m, number) { if m.text == "bad" { throw "refusing bad"; } m.text }"#,
    )]);
    let input = store.file("in.txt", b"good bad good");

    let (stdout, stderr, exit_code) = run_matchfn_with_input(
        &[
            "--functions",
            store.path_str(),
            "run",
            r"\w+",
            "Strict",
            "--in-place",
            input.to_str().unwrap(),
        ],
        "",
    );
    assert_eq!(exit_code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("refusing bad"), "stderr: {}", stderr);
    assert_eq!(read(&input), "good bad good");
}

#[test]
fn test_unknown_function_is_usage_error() {
    let store = StoreDir::with_functions(&[]);
    let (_stdout, stderr, exit_code) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", "x", "No such function"],
        "x",
    );
    assert_eq!(exit_code, 2);
    assert!(stderr.contains("no function named 'No such function'"));
}

#[test]
fn test_invalid_pattern_is_usage_error() {
    let store = StoreDir::with_functions(&[]);
    let (_stdout, stderr, exit_code) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", "(unclosed", "Upper-case text"],
        "x",
    );
    assert_eq!(exit_code, 2);
    assert!(stderr.contains("invalid pattern"));
}

#[test]
fn test_list_marks_builtins_and_skips_broken_scripts() {
    let store = StoreDir::with_functions(&[
        ("Shout", "fn replace(m) { m.text + \"!\" }"),
        ("Broken", "fn replace(m) {"),
    ]);
    let (stdout, stderr, exit_code) =
        run_matchfn_with_input(&["--functions", store.path_str(), "list"], "");
    assert_eq!(exit_code, 0);

    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines.contains(&"Upper-case text  (built-in)"));
    assert!(lines.contains(&"Shout"));
    assert!(!stdout.contains("Broken"));
    assert!(stderr.contains("skipping user function 'Broken'"));
}

#[test]
fn test_user_function_overrides_builtin_in_list() {
    let store = StoreDir::with_functions(&[("Upper-case text", "fn replace(m) { \"mine\" }")]);
    let (stdout, _stderr, _) =
        run_matchfn_with_input(&["--functions", store.path_str(), "list"], "");
    assert!(stdout.lines().any(|l| l == "Upper-case text"));

    let (stdout, _stderr, _) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", "x", "Upper-case text"],
        "x",
    );
    assert_eq!(stdout, "mine");
}

#[test]
fn test_show_builtin_and_user_source() {
    let source = "fn replace(m) { m.text }";
    let store = StoreDir::with_functions(&[("Same", source)]);

    let (stdout, _stderr, exit_code) =
        run_matchfn_with_input(&["--functions", store.path_str(), "show", "Swap the case of text"], "");
    assert_eq!(exit_code, 0);
    assert!(stdout.contains("Fn(\"swapcase\")"));

    let (stdout, _stderr, _) =
        run_matchfn_with_input(&["--functions", store.path_str(), "show", "Same"], "");
    assert_eq!(stdout, format!("{}\n", source));
}

#[test]
fn test_check_reports_compile_errors() {
    let store = StoreDir::with_functions(&[]);
    let good = store.file("good.rhai", b"fn replace(m) { m.text }");
    let missing = store.file("missing.rhai", b"fn other(m) { m.text }");

    let (stdout, _stderr, exit_code) =
        run_matchfn_with_input(&["--functions", store.path_str(), "check", good.to_str().unwrap()], "");
    assert_eq!(exit_code, 0);
    assert!(stdout.ends_with("ok\n"));

    let (_stdout, stderr, exit_code) = run_matchfn_with_input(
        &["--functions", store.path_str(), "check", missing.to_str().unwrap()],
        "",
    );
    assert_eq!(exit_code, 1);
    assert!(stderr.contains("does not define a 'replace' function"));
}

#[test]
fn test_check_honours_coding_declaration() {
    let store = StoreDir::with_functions(&[]);
    let mut script = b"// -*- coding: latin-1 -*-\nfn replace(m) { \"".to_vec();
    script.push(0xE9);
    script.extend_from_slice(b"\" }\n");
    let path = store.file("latin1.rhai", &script);

    let (_stdout, stderr, exit_code) =
        run_matchfn_with_input(&["--functions", store.path_str(), "check", path.to_str().unwrap()], "");
    assert_eq!(exit_code, 0, "stderr: {}", stderr);
}

#[test]
fn test_malformed_store_is_an_error() {
    let store = StoreDir::with_functions(&[]);
    std::fs::write(&store.path, "[]").unwrap();
    let (_stdout, stderr, exit_code) =
        run_matchfn_with_input(&["--functions", store.path_str(), "list"], "");
    assert_eq!(exit_code, 1);
    assert!(stderr.contains("Failed to load user functions"));
}

#[test]
fn test_script_reads_its_top_level_bindings() {
    let store = StoreDir::with_functions(&[(
        "Footnote marks",
        r#"
        const MARKS = ["*", "†", "‡"];
        let opening = "<sup>";
        fn mark(number) { MARKS[(number - 1) % MARKS.len()] }
        fn replace(m, number) { opening + mark(number) + "</sup>" }
        "#,
    )]);
    let (stdout, stderr, exit_code) = run_matchfn_with_input(
        &["--functions", store.path_str(), "run", r"\[\d\]", "Footnote marks"],
        "a[1] b[2] c[3] d[4]",
    );
    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    assert_eq!(
        stdout,
        "a<sup>*</sup> b<sup>†</sup> c<sup>‡</sup> d<sup>*</sup>"
    );
}
