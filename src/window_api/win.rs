use anyhow::Result;
use tracing::error;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

use super::WindowManager;

/// Reads the title of the foreground window. A desktop without focus (login
/// screen, secure desktop) yields `None` rather than an error.
pub fn foreground_title() -> Result<Option<String>> {
    let window = unsafe { GetForegroundWindow() };

    if window.is_invalid() {
        return Ok(None);
    }

    let mut text: [u16; 4096] = [0; 4096];
    let len = unsafe { GetWindowTextW(window, &mut text) };
    Ok(Some(String::from_utf16_lossy(&text[..len as usize])))
}

pub struct WindowsWindowManager {}

impl WindowsWindowManager {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsWindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager for WindowsWindowManager {
    fn active_window_title(&mut self) -> Result<Option<String>> {
        foreground_title().inspect_err(|e| error!("Failed to get active window {e:?}"))
    }
}
