use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. The tray "Quit" action and Ctrl-C
/// both arrive here; cancellation stops every monitor loop.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
