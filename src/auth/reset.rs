use std::{io::ErrorKind, path::PathBuf};

use anyhow::{bail, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use rand::Rng;
use tracing::debug;

use super::AuthError;

pub const RESET_CODE_FILE_NAME: &str = "reset_code.txt";
pub const RESET_CODE_LENGTH: usize = 5;
pub const RESET_CODE_VALIDITY_MINUTES: i64 = 30;

const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The single outstanding recovery token. The on-disk record outlives a
/// successful verification; only `expires_at` invalidates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub username: String,
    pub code: String,
    pub expires_at: NaiveDateTime,
}

impl ResetToken {
    /// Judges a verification attempt: username match, exact code match, and
    /// not past expiry, reported in that order.
    pub fn judge(&self, username: &str, input_code: &str, now: DateTime<Local>) -> Result<(), AuthError> {
        if username != self.username {
            return Err(AuthError::InvalidUsername);
        }
        if input_code != self.code {
            return Err(AuthError::InvalidResetCode);
        }
        if now.naive_local() > self.expires_at {
            return Err(AuthError::ResetCodeExpired);
        }
        Ok(())
    }
}

/// Persists the token as a pipe-delimited line in `reset_code.txt`:
/// `username|code|expiry`. Issuing a new token overwrites the previous one.
pub struct ResetTokenStore {
    base_dir: PathBuf,
}

impl ResetTokenStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn file_path(&self) -> PathBuf {
        self.base_dir.join(RESET_CODE_FILE_NAME)
    }

    pub fn issue(&self, username: &str, now: DateTime<Local>) -> Result<ResetToken> {
        let token = ResetToken {
            username: username.to_owned(),
            code: generate_code(RESET_CODE_LENGTH),
            expires_at: (now + chrono::Duration::minutes(RESET_CODE_VALIDITY_MINUTES))
                .naive_local(),
        };

        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::write(
            self.file_path(),
            format!(
                "{}|{}|{}",
                token.username,
                token.code,
                token.expires_at.format(EXPIRY_FORMAT)
            ),
        )?;
        debug!("Issued reset token expiring at {}", token.expires_at);
        Ok(token)
    }

    pub fn load(&self) -> Result<Option<ResetToken>> {
        let data = match std::fs::read_to_string(self.file_path()) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut parts = data.trim().splitn(3, '|');
        let (Some(username), Some(code), Some(expiry)) =
            (parts.next(), parts.next(), parts.next())
        else {
            bail!("Reset code file {:?} is malformed", self.file_path());
        };
        let expires_at = NaiveDateTime::parse_from_str(expiry, EXPIRY_FORMAT)?;
        Ok(Some(ResetToken {
            username: username.to_owned(),
            code: code.to_owned(),
            expires_at,
        }))
    }
}

fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Best effort: the persisted token stays authoritative when no clipboard is
/// available (e.g. a headless session).
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    arboard::Clipboard::new()?.set_text(text.to_owned())?;
    Ok(())
}
