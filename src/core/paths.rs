use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base scanflow config directory (~/.config/scanflow/ on all platforms)
pub fn scanflow() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("scanflow"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("scanflow"))
    }
}

/// Global scanflow.json config file path
pub fn scanflow_json() -> Result<PathBuf> {
    Ok(scanflow()?.join("scanflow.json"))
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
