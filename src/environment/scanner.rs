//! Discovers `env` entries declared in cloud-config files.
use crate::defaults::CONFIG_SCAN_DIRS;
use serde::Deserialize;
use std::fs::{read_dir, read_to_string, FileType};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

#[cfg_attr(test, mockall::automock)]
pub trait ConfigScanner {
    /// Returns the `KEY=VALUE` pairs found, in discovery order.
    fn scan_env(&self) -> Vec<(String, String)>;
}

/// Only the `env` section of a cloud-config is relevant here, anything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct CloudConfigEnv {
    #[serde(default)]
    env: Vec<String>,
}

/// Scans an ordered list of directories. Entries found in later directories take precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryScanner {
    dirs: Vec<PathBuf>,
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        DirectoryScanner::new(CONFIG_SCAN_DIRS.iter().map(PathBuf::from).collect())
    }
}

impl DirectoryScanner {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        DirectoryScanner { dirs }
    }

    fn env_from_file(path: &Path) -> Vec<String> {
        let content = match read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %path.display(), "skipping unreadable config file: {err}");
                return Vec::new();
            }
        };
        match serde_yaml::from_str::<Option<CloudConfigEnv>>(&content) {
            Ok(config) => config.unwrap_or_default().env,
            Err(err) => {
                debug!(path = %path.display(), "skipping config file without a valid env section: {err}");
                Vec::new()
            }
        }
    }
}

impl ConfigScanner for DirectoryScanner {
    fn scan_env(&self) -> Vec<(String, String)> {
        self.dirs
            .iter()
            .flat_map(|dir| config_files(dir))
            .flat_map(|path| DirectoryScanner::env_from_file(&path))
            .filter_map(|entry| match entry.split_once('=') {
                Some((key, value)) => Some((key.to_string(), value.to_string())),
                None => {
                    warn!("ignoring env entry `{entry}`, expected KEY=VALUE");
                    None
                }
            })
            .collect()
    }
}

/// Lists the config files under `dir` recursively, sorted by path. Symlinked directories are not
/// followed.
fn config_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), "skipping config directory: {err}");
            return Vec::new();
        }
    };
    let mut paths: Vec<(PathBuf, FileType)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_type().ok().map(|file_type| (e.path(), file_type)))
        .collect();
    paths.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut files = Vec::new();
    for (path, file_type) in paths {
        if file_type.is_dir() {
            files.extend(config_files(&path));
        } else if file_type.is_symlink() && path.is_dir() {
            debug!(path = %path.display(), "skipping symlinked directory");
        } else if is_config_file(&path) {
            files.push(path);
        }
    }
    files
}

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext))
}
