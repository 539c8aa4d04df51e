use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;

use crate::utils::dir::default_watch_root;

pub const CONFIG_FILE_NAME: &str = "config.txt";

/// Persists the monitored root: a single absolute path in `config.txt`.
/// Read at startup and rewritten whenever the viewer changes the root.
pub struct TrackingConfig {
    base_dir: PathBuf,
}

impl TrackingConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn file_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    pub fn load(&self) -> Result<Option<PathBuf>> {
        match std::fs::read_to_string(self.file_path()) {
            Ok(content) => {
                let path = content.trim();
                if path.is_empty() {
                    return Ok(None);
                }
                Ok(Some(PathBuf::from(path)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, watch_root: &Path) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::write(self.file_path(), watch_root.display().to_string())?;
        Ok(())
    }

    /// Configured root, or the default one persisted on first run.
    pub fn load_or_default(&self) -> Result<PathBuf> {
        if let Some(root) = self.load()? {
            return Ok(root);
        }
        let root = default_watch_root()?;
        self.save(&root)?;
        Ok(root)
    }
}
