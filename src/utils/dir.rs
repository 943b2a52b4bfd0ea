use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

const APPLICATION_DIR: &str = "checkin";

/// Directory holding the stored document and logs. `$XDG_STATE_HOME/checkin` or
/// `$HOME/.local/state/checkin` on Linux, `%APPDATA%\checkin` on Windows.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = {
        #[cfg(windows)]
        {
            env::var("APPDATA")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("APPDATA should be present on Windows"))?
        }
        #[cfg(not(windows))]
        {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".local/state")))
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?
        }
    };
    path.push(APPLICATION_DIR);

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
