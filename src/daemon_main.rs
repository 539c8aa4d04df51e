use std::env::args;

use anyhow::Result;
use clap::Parser;
use watchpost::{
    daemon::{args::DaemonArgs, start_daemon},
    utils::{
        logging::{enable_logging, DAEMON_PREFIX},
        runtime::single_thread_runtime,
    },
};

fn main() {
    run_service(args().collect::<Vec<_>>()).unwrap();
}

fn run_service(command_args: Vec<String>) -> Result<()> {
    let args = DaemonArgs::parse_from(&command_args);

    if !args.force {
        #[cfg(unix)]
        {
            use daemonize::Daemonize;
            use tracing::error;

            // Keep the working directory: persisted files are resolved
            // against it unless --dir overrides.
            let daemonize = Daemonize::new()
                .working_directory(std::env::current_dir()?)
                .stdout(daemonize::Stdio::devnull())
                .stderr(daemonize::Stdio::devnull())
                .execute();
            match daemonize {
                daemonize::Outcome::Parent(parent) => {
                    parent
                        .inspect_err(|e| error!("Failed to create daemon on parent side {e:?}"))?;
                    println!("Created daemon");
                    return Ok(());
                }
                daemonize::Outcome::Child(_) => (),
            }
        }
    }

    run(args)
}

fn run(args: DaemonArgs) -> Result<()> {
    // All persisted files (logs/, config.txt, credentials/) are resolved
    // against this directory, so the viewer must be pointed at the same one.
    let base_dir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    enable_logging(
        DAEMON_PREFIX,
        &base_dir.join("diagnostics"),
        args.log,
        args.log_console,
    )
    .unwrap();
    single_thread_runtime()?.block_on(async move { start_daemon(base_dir).await })?;
    Ok(())
}
