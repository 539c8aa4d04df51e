//! Credential gate for the log viewer: first-run setup, login with a
//! three-strike lockout, and a time-boxed recovery-code flow. Every failure
//! carries a reason string the viewer renders verbatim.

pub mod credentials;
pub mod reset;

use std::path::Path;

use credentials::CredentialStore;
use reset::{ResetToken, ResetTokenStore};
use thiserror::Error;
use tracing::warn;

use crate::utils::clock::Clock;

pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Reasons a gate transition can refuse. The `Display` strings are the
/// user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Username is required.")]
    UsernameRequired,
    #[error("Password is required.")]
    PasswordRequired,
    #[error("An account already exists.")]
    AlreadyConfigured,
    #[error("No account exists yet. Complete setup first.")]
    NeedsSetup,
    #[error("Invalid credentials. {remaining} attempt(s) remaining.")]
    InvalidCredentials { remaining: u32 },
    #[error("Maximum attempts reached.")]
    LockedOut,
    #[error("Invalid username.")]
    InvalidUsername,
    #[error("Invalid reset code.")]
    InvalidResetCode,
    #[error("Reset code expired.")]
    ResetCodeExpired,
    #[error("Reset code not found. Request a new one.")]
    ResetCodeMissing,
    #[error("No password reset is in progress.")]
    NoResetInProgress,
    #[error("Already logged in.")]
    AlreadyLoggedIn,
    #[error("{0}")]
    Storage(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(e: anyhow::Error) -> Self {
        AuthError::Storage(format!("{e:#}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NeedsSetup,
    LoggedOut,
    LoggedIn,
    ResetRequested,
    ResetVerified,
    /// Terminal for this process run. Only a restart reopens the gate.
    LockedOut,
}

/// The viewer-facing authentication state machine. Owns the attempt counter
/// and the persistence stores; credentials are re-read from disk on every
/// check, never cached, so a setup that just completed is honored only after
/// the mandated process restart.
pub struct AuthGate {
    credentials: CredentialStore,
    tokens: ResetTokenStore,
    clock: Box<dyn Clock>,
    state: AuthState,
    attempts: u32,
}

impl AuthGate {
    pub fn new(base_dir: impl AsRef<Path>, clock: Box<dyn Clock>) -> Self {
        let credentials = CredentialStore::new(base_dir.as_ref());
        let state = if credentials.exists() {
            AuthState::LoggedOut
        } else {
            AuthState::NeedsSetup
        };
        Self {
            credentials,
            tokens: ResetTokenStore::new(base_dir.as_ref()),
            clock,
            state,
            attempts: 0,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// First-run account creation. The caller is expected to restart the
    /// process afterwards; login always goes back to durable storage.
    pub fn setup(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.state != AuthState::NeedsSetup {
            return Err(AuthError::AlreadyConfigured);
        }
        let username = required(username, AuthError::UsernameRequired)?;
        let password = required(password, AuthError::PasswordRequired)?;

        self.credentials.save(username, password)?;
        self.state = AuthState::LoggedOut;
        Ok(())
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        match self.state {
            AuthState::NeedsSetup => return Err(AuthError::NeedsSetup),
            AuthState::LockedOut => return Err(AuthError::LockedOut),
            AuthState::LoggedIn => return Ok(()),
            AuthState::LoggedOut | AuthState::ResetRequested | AuthState::ResetVerified => (),
        }

        if self.credentials.verify(username.trim(), password.trim())? {
            self.state = AuthState::LoggedIn;
            self.attempts = 0;
            return Ok(());
        }

        self.attempts += 1;
        let remaining = MAX_LOGIN_ATTEMPTS.saturating_sub(self.attempts);
        if self.attempts >= MAX_LOGIN_ATTEMPTS {
            // Third consecutive failure closes the gate for the rest of the
            // process run; the refusal itself still reports the zero count.
            self.state = AuthState::LockedOut;
        }
        Err(AuthError::InvalidCredentials { remaining })
    }

    /// Issues a recovery code for the stored account, overwriting any
    /// previous token, and copies it to the clipboard when one is available.
    pub fn forgot_password(&mut self, username: &str) -> Result<ResetToken, AuthError> {
        match self.state {
            AuthState::NeedsSetup => return Err(AuthError::NeedsSetup),
            AuthState::LockedOut => return Err(AuthError::LockedOut),
            // The reset side channel only opens from outside a session;
            // re-entry from the reset sub-states overwrites the token.
            AuthState::LoggedIn => return Err(AuthError::AlreadyLoggedIn),
            AuthState::LoggedOut | AuthState::ResetRequested | AuthState::ResetVerified => (),
        }

        let stored = self.credentials.load()?.ok_or(AuthError::NeedsSetup)?;
        if username.trim() != stored.username {
            return Err(AuthError::InvalidUsername);
        }

        let token = self.tokens.issue(&stored.username, self.clock.time())?;
        if let Err(e) = reset::copy_to_clipboard(&token.code) {
            warn!("Could not copy the reset code to the clipboard: {e:?}");
        }
        self.state = AuthState::ResetRequested;
        Ok(token)
    }

    /// Checks the supplied code against the outstanding token. Any failure
    /// drops back to `LoggedOut` with the specific reason. The token file is
    /// deliberately left in place after success; only expiry invalidates it.
    pub fn verify_reset(&mut self, input_code: &str) -> Result<(), AuthError> {
        if self.state != AuthState::ResetRequested {
            return Err(AuthError::NoResetInProgress);
        }

        let Some(token) = self.tokens.load()? else {
            self.state = AuthState::LoggedOut;
            return Err(AuthError::ResetCodeMissing);
        };
        let stored = self.credentials.load()?.ok_or(AuthError::NeedsSetup)?;

        // The code must match byte for byte; no normalization of the input.
        match token.judge(&stored.username, input_code, self.clock.time()) {
            Ok(()) => {
                self.state = AuthState::ResetVerified;
                Ok(())
            }
            Err(reason) => {
                self.state = AuthState::LoggedOut;
                Err(reason)
            }
        }
    }

    /// Replaces the password after a verified reset. An empty password
    /// aborts back to `LoggedOut` with the credentials unchanged.
    pub fn set_new_password(&mut self, new_password: &str) -> Result<(), AuthError> {
        if self.state != AuthState::ResetVerified {
            return Err(AuthError::NoResetInProgress);
        }

        let new_password = match required(new_password, AuthError::PasswordRequired) {
            Ok(v) => v,
            Err(e) => {
                self.state = AuthState::LoggedOut;
                return Err(e);
            }
        };

        let stored = self.credentials.load()?.ok_or(AuthError::NeedsSetup)?;
        self.credentials.save(&stored.username, new_password)?;
        self.attempts = 0;
        self.state = AuthState::LoggedOut;
        Ok(())
    }
}

fn required(value: &str, error: AuthError) -> Result<&str, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Local};
    use tempfile::tempdir;
    use tokio::time::Instant;

    use super::{AuthError, AuthGate, AuthState};
    use crate::utils::clock::Clock;

    /// Manually advanced clock; the expiry checks need a controllable now.
    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<DateTime<Local>>>,
    }

    impl ManualClock {
        fn starting_now() -> Self {
            Self {
                now: Arc::new(Mutex::new(Local::now())),
            }
        }

        fn advance_minutes(&self, minutes: i64) {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::minutes(minutes);
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn time(&self) -> DateTime<Local> {
            *self.now.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, _duration: Duration) {}

        async fn sleep_until(&self, _instant: Instant) {}
    }

    fn gate_at(dir: &std::path::Path, clock: ManualClock) -> AuthGate {
        AuthGate::new(dir, Box::new(clock))
    }

    #[test]
    fn test_setup_requires_both_fields() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());

        assert_eq!(gate.state(), AuthState::NeedsSetup);
        assert_eq!(gate.setup("", "pw"), Err(AuthError::UsernameRequired));
        assert_eq!(gate.setup("nijat", "  "), Err(AuthError::PasswordRequired));

        gate.setup("nijat", "pw").unwrap();
        assert_eq!(gate.state(), AuthState::LoggedOut);
        assert_eq!(gate.setup("again", "pw"), Err(AuthError::AlreadyConfigured));
        Ok(())
    }

    #[test]
    fn test_fresh_gate_reads_persisted_credentials() -> Result<()> {
        let dir = tempdir()?;
        let clock = ManualClock::starting_now();
        gate_at(dir.path(), clock.clone()).setup("nijat", "pw").unwrap();

        // The restart: a new gate over the same directory can log in.
        let mut gate = gate_at(dir.path(), clock);
        assert_eq!(gate.state(), AuthState::LoggedOut);
        gate.login("nijat", "pw").unwrap();
        assert_eq!(gate.state(), AuthState::LoggedIn);
        Ok(())
    }

    #[test]
    fn test_three_failures_lock_out_a_fourth_attempt() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();

        assert_eq!(
            gate.login("nijat", "wrong"),
            Err(AuthError::InvalidCredentials { remaining: 2 })
        );
        assert_eq!(
            gate.login("nijat", "wrong"),
            Err(AuthError::InvalidCredentials { remaining: 1 })
        );
        assert_eq!(
            gate.login("nijat", "wrong"),
            Err(AuthError::InvalidCredentials { remaining: 0 })
        );

        // Even the correct password is refused now.
        assert_eq!(gate.login("nijat", "pw"), Err(AuthError::LockedOut));
        assert_eq!(gate.state(), AuthState::LockedOut);
        Ok(())
    }

    #[test]
    fn test_successful_login_resets_the_counter() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();

        let _ = gate.login("nijat", "wrong");
        let _ = gate.login("nijat", "wrong");
        gate.login("nijat", "pw").unwrap();
        assert_eq!(gate.state(), AuthState::LoggedIn);
        Ok(())
    }

    #[test]
    fn test_forgot_password_needs_the_stored_username() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();

        assert_eq!(
            gate.forgot_password("impostor"),
            Err(AuthError::InvalidUsername)
        );
        assert_eq!(gate.state(), AuthState::LoggedOut);

        let token = gate.forgot_password("nijat").unwrap();
        assert_eq!(token.username, "nijat");
        assert_eq!(gate.state(), AuthState::ResetRequested);
        Ok(())
    }

    #[test]
    fn test_logged_in_session_cannot_open_the_reset_channel() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();
        gate.login("nijat", "pw").unwrap();

        assert_eq!(
            gate.forgot_password("nijat"),
            Err(AuthError::AlreadyLoggedIn)
        );
        assert_eq!(gate.state(), AuthState::LoggedIn);
        Ok(())
    }

    #[test]
    fn test_code_comparison_is_exact() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();

        let token = gate.forgot_password("nijat").unwrap();
        assert_eq!(
            gate.verify_reset(&format!(" {}", token.code)),
            Err(AuthError::InvalidResetCode)
        );
        assert_eq!(gate.state(), AuthState::LoggedOut);
        Ok(())
    }

    #[test]
    fn test_full_reset_flow_changes_the_password() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "old-password").unwrap();

        let token = gate.forgot_password("nijat").unwrap();
        gate.verify_reset(&token.code).unwrap();
        assert_eq!(gate.state(), AuthState::ResetVerified);

        gate.set_new_password("new-password").unwrap();
        assert_eq!(gate.state(), AuthState::LoggedOut);

        gate.login("nijat", "new-password").unwrap();
        Ok(())
    }

    #[test]
    fn test_wrong_code_drops_back_to_logged_out() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();

        gate.forgot_password("nijat").unwrap();
        assert_eq!(gate.verify_reset("WRONG"), Err(AuthError::InvalidResetCode));
        assert_eq!(gate.state(), AuthState::LoggedOut);

        assert_eq!(
            gate.verify_reset("WRONG"),
            Err(AuthError::NoResetInProgress)
        );
        Ok(())
    }

    #[test]
    fn test_expired_code_is_refused() -> Result<()> {
        let dir = tempdir()?;
        let clock = ManualClock::starting_now();
        let mut gate = gate_at(dir.path(), clock.clone());
        gate.setup("nijat", "pw").unwrap();

        let token = gate.forgot_password("nijat").unwrap();
        clock.advance_minutes(31);
        assert_eq!(
            gate.verify_reset(&token.code),
            Err(AuthError::ResetCodeExpired)
        );
        assert_eq!(gate.state(), AuthState::LoggedOut);
        Ok(())
    }

    #[test]
    fn test_empty_new_password_aborts_unchanged() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();

        let token = gate.forgot_password("nijat").unwrap();
        gate.verify_reset(&token.code).unwrap();
        assert_eq!(
            gate.set_new_password("   "),
            Err(AuthError::PasswordRequired)
        );
        assert_eq!(gate.state(), AuthState::LoggedOut);

        gate.login("nijat", "pw").unwrap();
        Ok(())
    }

    #[test]
    fn test_new_request_overwrites_previous_token() -> Result<()> {
        let dir = tempdir()?;
        let mut gate = gate_at(dir.path(), ManualClock::starting_now());
        gate.setup("nijat", "pw").unwrap();

        let first = gate.forgot_password("nijat").unwrap();
        let second = gate.forgot_password("nijat").unwrap();

        if first.code != second.code {
            assert_eq!(
                gate.verify_reset(&first.code),
                Err(AuthError::InvalidResetCode)
            );
        }
        Ok(())
    }

    #[test]
    fn test_reason_strings_render_for_the_viewer() {
        assert_eq!(
            AuthError::InvalidCredentials { remaining: 1 }.to_string(),
            "Invalid credentials. 1 attempt(s) remaining."
        );
        assert_eq!(AuthError::LockedOut.to_string(), "Maximum attempts reached.");
        assert_eq!(AuthError::ResetCodeExpired.to_string(), "Reset code expired.");
    }
}
