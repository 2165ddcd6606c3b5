// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Helper function to run matchfn with given arguments and input via stdin
pub fn run_matchfn_with_input(args: &[&str], input: &str) -> (String, String, i32) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_matchfn"))
        .args(args)
        .env_remove("MATCHFN_FUNCTIONS")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start matchfn");

    // Write input to stdin
    if let Some(mut stdin) = cmd.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .expect("Failed to write to stdin");
    }

    let output = cmd.wait_with_output().expect("Failed to read output");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// A temporary directory holding a function store file
pub struct StoreDir {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl StoreDir {
    /// Create a store from `(name, source)` pairs
    pub fn with_functions(functions: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("functions.json");
        let store = StoreDir { dir, path };
        store.write(functions);
        store
    }

    pub fn write(&self, functions: &[(&str, &str)]) {
        let mut map = serde_json::Map::new();
        for (name, source) in functions {
            map.insert(name.to_string(), serde_json::Value::String(source.to_string()));
        }
        fs::write(&self.path, serde_json::to_string_pretty(&map).unwrap())
            .expect("Failed to write function store");
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap()
    }

    /// Write a file next to the store and return its path
    pub fn file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("Failed to write temp file");
        path
    }
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}
