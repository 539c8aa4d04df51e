use std::{io::ErrorKind, path::PathBuf};

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};

pub const CREDENTIALS_DIR: &str = "credentials";
pub const CREDENTIALS_FILE_NAME: &str = "user_credentials.txt";

/// The single (username, password hash) record of this single-user system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password_hash: String,
}

/// Unsalted SHA-256, hex encoded. Deterministic on purpose: the stored file
/// format predates this implementation and salting would break it.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Persists the credentials record as two lines in
/// `credentials/user_credentials.txt`: username, then the hex password hash.
pub struct CredentialStore {
    base_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn file_path(&self) -> PathBuf {
        self.base_dir.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE_NAME)
    }

    pub fn exists(&self) -> bool {
        self.file_path().is_file()
    }

    /// `None` on first run, before any setup happened.
    pub fn load(&self) -> Result<Option<Credentials>> {
        let data = match std::fs::read_to_string(self.file_path()) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut lines = data.lines();
        let (Some(username), Some(password_hash)) = (lines.next(), lines.next()) else {
            bail!("Credentials file {:?} is malformed", self.file_path());
        };
        Ok(Some(Credentials {
            username: username.trim().to_owned(),
            password_hash: password_hash.trim().to_owned(),
        }))
    }

    /// Hashes and persists, overwriting any previous record.
    pub fn save(&self, username: &str, password: &str) -> Result<()> {
        let dir = self.base_dir.join(CREDENTIALS_DIR);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(
            self.file_path(),
            format!("{username}\n{}", hash_password(password)),
        )?;
        Ok(())
    }

    /// True iff the username matches exactly and the password hashes to the
    /// stored digest.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool> {
        Ok(self
            .load()?
            .is_some_and(|c| c.username == username && c.password_hash == hash_password(password)))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{hash_password, CredentialStore};

    #[test]
    fn test_save_load_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = CredentialStore::new(dir.path());

        assert!(!store.exists());
        assert_eq!(store.load()?, None);

        store.save("nijat", "hunter2")?;
        assert!(store.exists());

        let credentials = store.load()?.unwrap();
        assert_eq!(credentials.username, "nijat");
        assert_eq!(credentials.password_hash, hash_password("hunter2"));
        Ok(())
    }

    #[test]
    fn test_verify_matches_only_the_saved_pair() -> Result<()> {
        let dir = tempdir()?;
        let store = CredentialStore::new(dir.path());
        store.save("nijat", "hunter2")?;

        assert!(store.verify("nijat", "hunter2")?);
        assert!(!store.verify("nijat", "hunter3")?);
        assert!(!store.verify("someone", "hunter2")?);
        Ok(())
    }

    #[test]
    fn test_save_overwrites_previous_record() -> Result<()> {
        let dir = tempdir()?;
        let store = CredentialStore::new(dir.path());
        store.save("nijat", "first")?;
        store.save("nijat", "second")?;

        assert!(!store.verify("nijat", "first")?);
        assert!(store.verify("nijat", "second")?);
        Ok(())
    }

    #[test]
    fn test_hash_is_deterministic_hex_sha256() {
        assert_eq!(hash_password("abc"), hash_password("abc"));
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
