use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the user function store.
pub const FUNCTIONS_ENV: &str = "MATCHFN_FUNCTIONS";

/// Project-local store, found by walking up from the working directory.
pub const PROJECT_STORE_NAME: &str = ".matchfn-functions.json";

const STORE_FILE_NAME: &str = "functions.json";

/// Where the user function store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub path: PathBuf,
    pub origin: StoreOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    CommandLine,
    Environment,
    Project,
    User,
}

impl StoreLocation {
    /// Resolve the store path: command line > environment > project file >
    /// user config directory.
    pub fn resolve(cli_path: Option<&Path>) -> Self {
        Self::resolve_from(
            cli_path,
            env::var_os(FUNCTIONS_ENV).map(PathBuf::from),
            env::current_dir().ok().as_deref(),
        )
    }

    fn resolve_from(
        cli_path: Option<&Path>,
        env_path: Option<PathBuf>,
        cwd: Option<&Path>,
    ) -> Self {
        if let Some(path) = cli_path {
            return Self {
                path: path.to_path_buf(),
                origin: StoreOrigin::CommandLine,
            };
        }
        if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
            return Self {
                path,
                origin: StoreOrigin::Environment,
            };
        }
        if let Some(path) = cwd.and_then(find_project_store) {
            return Self {
                path,
                origin: StoreOrigin::Project,
            };
        }
        Self {
            path: user_store_path(),
            origin: StoreOrigin::User,
        }
    }
}

/// Find a project-level store by walking up the directory tree.
pub fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(PROJECT_STORE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            // Reached filesystem root
            return None;
        }
    }
}

/// `<config dir>/matchfn/functions.json`, falling back to `$HOME/.config`.
pub fn user_store_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".config"))
    });
    base.join("matchfn").join(STORE_FILE_NAME)
}
