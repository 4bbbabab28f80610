use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Directories the service reads config from and writes logs to.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// `STEPFLOW_ROOT` or the working directory; data lives under
    /// `STEPFLOW_DATA_DIR` or the project root.
    pub fn new() -> Self {
        let project_root = env::var("STEPFLOW_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let user_data_dir = data_dir(env::var("STEPFLOW_DATA_DIR").ok(), &project_root);
        Self::with_dirs(project_root, user_data_dir)
    }

    /// Paths rooted at explicit directories; creates the data and log dirs.
    pub fn with_dirs(project_root: PathBuf, user_data_dir: PathBuf) -> Self {
        let log_dir = user_data_dir.join("logs");

        for dir in [&user_data_dir, &log_dir] {
            if let Err(err) = fs::create_dir_all(dir) {
                eprintln!("Failed to create {}: {}", dir.display(), err);
            }
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn data_dir(override_dir: Option<String>, project_root: &Path) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => project_root.to_path_buf(),
    }
}
