use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory for files the app writes on its own (results, logs).
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("typerush"))
        } else {
            ProjectDirs::from("", "", "typerush").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn results_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("results.csv"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("typerush.log"))
    }
}
