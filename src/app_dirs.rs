use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "chronomaster";
const LOG_FILE: &str = "chronomaster.log";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/chronomaster`, or the platform data dir without HOME.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(LOG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_lives_in_state_dir() {
        if let (Some(dir), Some(log)) = (AppDirs::state_dir(), AppDirs::log_path()) {
            assert!(dir.ends_with(APP_NAME));
            assert_eq!(log.parent(), Some(dir.as_path()));
            assert!(log.ends_with(LOG_FILE));
        }
    }
}
