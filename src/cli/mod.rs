pub mod notify;
pub mod report;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::{
    daemon::{pid_file_path, start_daemon},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, DAEMON_PREFIX},
        runtime::single_thread_runtime,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Afkwatch", version, long_about = None)]
#[command(about = "Tracks which five-minute windows of the day you were active in")]
struct Args {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, help = "Echo logs to the console")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Start the tracking daemon")]
    Track {
        #[arg(long, help = "Stay attached to the console instead of detaching")]
        foreground: bool,
    },
    #[command(about = "Print hours active today and this week")]
    Report,
    #[command(about = "Send one activity notification to the running daemon")]
    Ping,
    #[command(about = "Watch pointer events and forward them to the daemon")]
    Mouse,
}

pub fn run_cli() -> Result<()> {
    // clap exits with 2 on usage errors; the contract here is 1 for an
    // unknown command, so parsing is done by hand.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    match args.command {
        Commands::Track { foreground } => run_track(dir, foreground, args.log),
        command => {
            if args.log {
                enable_logging(CLI_PREFIX, &dir, None, true)?;
            }
            match command {
                Commands::Report => single_thread_runtime()?.block_on(report::run_report(&dir)),
                Commands::Ping => {
                    notify::notify_daemon(None, &pid_file_path(&dir));
                    Ok(())
                }
                Commands::Mouse => {
                    single_thread_runtime()?.block_on(notify::run_mouse(pid_file_path(&dir)))
                }
                Commands::Track { .. } => unreachable!("handled above"),
            }
        }
    }
}

fn run_track(dir: PathBuf, foreground: bool, log_console: bool) -> Result<()> {
    // Checked before detaching so the caller still sees the exit code.
    let pid_path = pid_file_path(&dir);
    if pid_path.exists() {
        bail!("Pid file {pid_path:?} already exists. Maybe the daemon is already running?");
    }

    #[cfg(unix)]
    if !foreground {
        use daemonize::Daemonize;

        // stdin already goes to /dev/null by default.
        let daemonize = Daemonize::new()
            .stdout(daemonize::Stdio::devnull())
            .stderr(daemonize::Stdio::devnull())
            .execute();
        match daemonize {
            daemonize::Outcome::Parent(parent) => {
                parent?;
                println!("Created daemon");
                return Ok(());
            }
            daemonize::Outcome::Child(_) => (),
        }
    }
    #[cfg(not(unix))]
    let _ = foreground;

    enable_logging(DAEMON_PREFIX, &dir, None, log_console)?;
    single_thread_runtime()?.block_on(start_daemon(dir))
}
