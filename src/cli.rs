use std::{path::PathBuf, sync::OnceLock};

use clap::{Parser, Subcommand, ValueEnum};

/// Watches the containers on this host and tells you when one goes down.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the config file.
    #[arg(short, long, default_value = "dockwatch.toml")]
    pub config: PathBuf,

    /// Path of the pid file written by the running daemon.
    #[arg(short, long, default_value = "dockwatch.pid")]
    pub pid_file: PathBuf,

    /// Chat (or user) id that receives notifications. Overrides the config file.
    #[arg(long)]
    pub chat_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the monitor (default).
    Run,
    /// Print a one-shot health report of every container.
    Status,
    /// Send a signal to the running daemon.
    Signal {
        #[arg(value_enum)]
        signal: Signal,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Let the current check finish, then exit.
    Stop,
}

impl From<Signal> for nix::sys::signal::Signal {
    fn from(value: Signal) -> Self {
        match value {
            Signal::Stop => nix::sys::signal::Signal::SIGTERM,
        }
    }
}

static ARGS: OnceLock<Args> = OnceLock::new();

pub fn get_cli_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}
