use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::process::ExitCode;
use tokio::sync::watch;

pub fn send_signal(signal: crate::cli::Signal) -> ExitCode {
    let pid_file = &crate::cli::get_cli_args().pid_file;

    let pid = match std::fs::read_to_string(pid_file) {
        Ok(pid) => pid,
        Err(err) => {
            eprintln!("Unable to read pid file: {err}");
            return ExitCode::FAILURE;
        }
    };

    let pid: i32 = match pid.trim().parse() {
        Ok(pid) => pid,
        Err(err) => {
            eprintln!("Unable to parse pid: {err}");
            return ExitCode::FAILURE;
        }
    };

    let signal: nix::sys::signal::Signal = signal.into();
    if let Err(err) = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), signal) {
        eprintln!("Unable to send signal: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// What should we do when the user stops this program?
///
/// The first SIGINT/SIGTERM asks the monitor to stop after the check in
/// progress. A second one exits right away.
pub fn handle_shutdown(shutdown: watch::Sender<bool>) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    std::thread::spawn(move || {
        for signal in signals.forever() {
            if *shutdown.borrow() {
                log::warn!("Received signal {signal} again, exiting now");
                let _ = std::fs::remove_file(&crate::cli::get_cli_args().pid_file);
                std::process::exit(1);
            }
            log::warn!("Received signal {signal}, stopping after the current check");
            let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
            let _ = shutdown.send(true);
        }
    });

    Ok(())
}

pub fn write_pid_file() {
    let pid_file = &crate::cli::get_cli_args().pid_file;
    if let Err(e) = std::fs::write(pid_file, std::process::id().to_string()) {
        log::warn!("Unable to write pid file {pid_file:?}: {e}");
    }
}

pub fn remove_pid_file() {
    let _ = std::fs::remove_file(&crate::cli::get_cli_args().pid_file);
}
