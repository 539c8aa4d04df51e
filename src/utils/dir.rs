use std::{env, path::PathBuf};

use anyhow::{Context, Result};

/// Directory monitored when no `config.txt` has been written yet.
pub fn default_watch_root() -> Result<PathBuf> {
    let mut path = home_dir()?;
    path.push("Documents");
    Ok(path)
}

fn home_dir() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        env::var("USERPROFILE")
            .map(PathBuf::from)
            .context("USERPROFILE should be present on Windows")
    }
    #[cfg(not(windows))]
    {
        env::var("HOME")
            .map(PathBuf::from)
            .context("Couldn't find HOME")
    }
}
