use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error};

use super::{collection::MonitorEvent, storage::event_log::EventLog};

/// Drains the monitor channel into the event log. Runs until every sender is
/// gone. A failed append is logged and skipped; monitoring must stay alive
/// through disk hiccups.
pub struct EventWriter {
    receiver: Receiver<MonitorEvent>,
    log: EventLog,
}

impl EventWriter {
    pub fn new(receiver: Receiver<MonitorEvent>, log: EventLog) -> Self {
        Self { receiver, log }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            debug!("Writing event {:?}", event);
            if let Err(e) = self.log.append(&event.message, event.timestamp).await {
                error!("Error writing event {:?}: {e:?}", event);
            }
        }

        self.receiver.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Local, NaiveDate, TimeZone};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    use super::EventWriter;
    use crate::daemon::{collection::MonitorEvent, storage::event_log::EventLog};

    #[tokio::test]
    async fn test_writer_drains_channel_into_partition() -> Result<()> {
        let dir = tempdir()?;
        let date = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();
        let (sender, receiver) = mpsc::channel(4);
        let writer = EventWriter::new(receiver, EventLog::new(dir.path()));

        for (second, message) in [(1, "File created: /w/a"), (2, "Active window: editor")] {
            sender
                .send(MonitorEvent {
                    timestamp: Local
                        .from_local_datetime(&date.and_hms_opt(9, 0, second).unwrap())
                        .unwrap(),
                    message: message.to_owned(),
                })
                .await?;
        }
        drop(sender);

        writer.run().await?;

        let entries = EventLog::new(dir.path()).read_partition(date).await?;
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("Active window: editor"));
        assert!(entries[1].ends_with("File created: /w/a"));
        Ok(())
    }
}
