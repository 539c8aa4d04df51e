use std::path::{Path, PathBuf};

use anyhow::Result;
use collection::{
    files::FileMonitor,
    focus::{FocusMonitor, DEFAULT_POLL_INTERVAL},
    MonitorEvent,
};
use config::TrackingConfig;
use processing::EventWriter;
use storage::event_log::EventLog;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowManager, WindowManager},
};

pub mod args;
pub mod collection;
pub mod config;
pub mod processing;
pub mod shutdown;
pub mod storage;

/// Represents the starting point for the daemon. Persisted files (the log
/// store, `config.txt`) live under `base_dir`.
pub async fn start_daemon(base_dir: PathBuf) -> Result<()> {
    let config = TrackingConfig::new(&base_dir);
    let watch_root = config.load_or_default()?;

    let (sender, receiver) = mpsc::channel::<MonitorEvent>(10);
    let manager = GenericWindowManager::new()?;

    let shutdown_token = CancellationToken::new();

    let file_monitor = FileMonitor::start(&watch_root, sender.clone())?;
    let focus_monitor = create_focus_monitor(sender, manager, &shutdown_token, DefaultClock);
    let writer = create_writer(&base_dir, receiver);

    let (_, focus_result, writer_result) = tokio::join!(
        async {
            shutdown::detect_shutdown(shutdown_token.clone()).await;
            // Dropping the file monitor stops the OS observer and releases
            // its channel sender so the writer can drain and exit.
            drop(file_monitor);
        },
        focus_monitor.run(),
        writer.run(),
    );

    if let Err(focus_result) = focus_result {
        error!("Focus monitor got an error {:?}", focus_result);
    }

    if let Err(writer_result) = writer_result {
        error!("Event writer got an error {:?}", writer_result);
    }

    Ok(())
}

fn create_focus_monitor(
    sender: mpsc::Sender<MonitorEvent>,
    manager: impl WindowManager + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> FocusMonitor {
    FocusMonitor::new(
        sender,
        Box::new(manager),
        shutdown_token.clone(),
        DEFAULT_POLL_INTERVAL,
        Box::new(clock),
    )
}

fn create_writer(base_dir: &Path, receiver: mpsc::Receiver<MonitorEvent>) -> EventWriter {
    EventWriter::new(receiver, EventLog::new(base_dir))
}

#[cfg(test)]
mod daemon_tests {
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
    use tempfile::tempdir;
    use tokio::{sync::mpsc, time::Instant};
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::{create_focus_monitor, create_writer, collection::MonitorEvent,
            storage::event_log::EventLog},
        utils::{clock::Clock, logging::TEST_LOGGING},
        window_api::MockWindowManager,
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn test_titles() -> Vec<String> {
        vec!["test".into(), "test".into(), "test b".into()]
    }

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Local>,
        reference: Instant,
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Local> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    /// Very simple smoke test to check if the focus pipeline works properly
    /// end to end: mock titles flow through the channel into a partition
    /// file and only transitions produce lines.
    #[tokio::test]
    async fn smoke_test_focus_pipeline() -> Result<()> {
        *TEST_LOGGING;
        let mut mock_window_manager = MockWindowManager::new();
        let mut titles = test_titles().into_iter().cycle();
        mock_window_manager
            .expect_active_window_title()
            .returning(move || Ok(titles.next()))
            .times(..7);

        let shutdown_token = CancellationToken::new();

        let (sender, receiver) = mpsc::channel::<MonitorEvent>(10);
        let test_clock = TestClock {
            start_time: Local.from_local_datetime(&TEST_START_DATE).unwrap(),
            reference: Instant::now(),
        };
        let focus_monitor = create_focus_monitor(
            sender,
            mock_window_manager,
            &shutdown_token,
            test_clock.clone(),
        );

        let dir = tempdir()?;

        let writer = create_writer(dir.path(), receiver);

        let (_, focus_result, writer_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(3500)).await;
                shutdown_token.cancel()
            },
            focus_monitor.run(),
            writer.run(),
        );

        focus_result?;
        writer_result?;

        // Polls at 0s/1s/2s/3s see test, test, test b, test.
        let entries = EventLog::new(dir.path())
            .read_partition(TEST_START_DATE.date())
            .await?;
        assert_eq!(entries.len(), 3);
        assert!(entries[0].ends_with("Active window: test"));
        assert!(entries[1].ends_with("Active window: test b"));
        assert!(entries[2].ends_with("Active window: test"));

        Ok(())
    }
}
