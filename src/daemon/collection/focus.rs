use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{utils::clock::Clock, window_api::WindowManager};

use super::MonitorEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls the foreground window title on a fixed cadence and emits an
/// `Active window: <title>` event only on transitions.
pub struct FocusMonitor {
    next: mpsc::Sender<MonitorEvent>,
    windows: Box<dyn WindowManager>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    clock: Box<dyn Clock>,
    last_title: Option<String>,
}

impl FocusMonitor {
    pub fn new(
        next: mpsc::Sender<MonitorEvent>,
        windows: Box<dyn WindowManager>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            windows,
            shutdown,
            poll_interval,
            clock,
            last_title: None,
        }
    }

    /// One poll. `None` when there is no foreground window or the title
    /// hasn't changed. The comparison is exact string equality; titles
    /// differing only in whitespace count as genuine transitions.
    fn observe(&mut self) -> Result<Option<MonitorEvent>> {
        let Some(title) = self.windows.active_window_title()? else {
            return Ok(None);
        };

        if self.last_title.as_deref() == Some(title.as_str()) {
            return Ok(None);
        }

        let event = MonitorEvent {
            timestamp: self.clock.time(),
            message: format!("Active window: {title}"),
        };
        self.last_title = Some(title);
        Ok(Some(event))
    }

    /// Executes the polling event loop until cancellation.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.clock.instant();
        loop {
            poll_point += self.poll_interval;

            match self.observe() {
                Ok(Some(event)) => {
                    debug!("Sending message {:?}", event);
                    self.next
                        .send(event)
                        .await
                        .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                }
                Ok(None) => (),
                Err(e) => {
                    error!("Encountered an error reading the foreground window {:?}", e)
                }
            }

            tokio::select! {
                // Cancelation means we stop execution of the event loop. Which
                // means we also drop the sender channel and consequently let
                // the writer drain.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(poll_point) => ()
            }
        }
    }
}
