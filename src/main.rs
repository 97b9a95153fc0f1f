use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use cli::Command;
use config::DockwatchConfig;
use monitor::{
    AlertFormatter, ContainerInspector, HealthMonitor, LogCapture, MonitorSettings,
};
use notify::{NotifierClient, NotifierService};
use runtime::{ContainerRuntime, DockerRuntime};

mod cli;
mod config;
mod monitor;
mod notify;
mod report;
mod runtime;
mod signals;
mod template;
#[cfg(test)]
mod testing;

/// Time queued notifications get to go out after the monitor stopped.
const DRAIN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenv::dotenv();
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::get_cli_args();
    match args.command.clone().unwrap_or(Command::Run) {
        Command::Signal { signal } => signals::send_signal(signal),
        Command::Status => status().await,
        Command::Run => run().await,
    }
}

fn connect_runtime() -> Option<Arc<dyn ContainerRuntime>> {
    match DockerRuntime::connect() {
        Ok(docker) => {
            let runtime: Arc<dyn ContainerRuntime> = Arc::new(docker);
            Some(runtime)
        }
        Err(e) => {
            log::error!("Unable to connect to the Docker daemon: {e}");
            None
        }
    }
}

async fn status() -> ExitCode {
    let config = match DockwatchConfig::try_init() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Unable to read config: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(runtime) = connect_runtime() else {
        return ExitCode::FAILURE;
    };

    let inspector = ContainerInspector::new(runtime, config.inspect_timeout());
    match inspector.try_list_all().await {
        Ok(snapshot) => {
            println!("{}", report::health_report(&snapshot));
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", report::health_report(&Default::default()));
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn load_formatter(config: &DockwatchConfig) -> Result<AlertFormatter, String> {
    let formatter =
        AlertFormatter::new(report::hostname()).with_markup(config.notifier.markup());
    let Some(path) = &config.failure_template_file else {
        return Ok(formatter);
    };
    let template = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Unable to read failure template {path:?}: {e}"))?;
    formatter
        .with_template(template)
        .map_err(|e| format!("Invalid failure template {path:?}: {e:?}"))
}

async fn run() -> ExitCode {
    let config = match DockwatchConfig::try_init() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Unable to read config: {e}");
            return ExitCode::FAILURE;
        }
    };
    let formatter = match load_formatter(&config).await {
        Ok(formatter) => formatter,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(runtime) = connect_runtime() else {
        return ExitCode::FAILURE;
    };

    // Notifications leave the monitor through a queue so a slow transport
    // never holds up a health check.
    let (tx, rx) = tokio::sync::mpsc::channel(config.notifier.queue_size.get());
    let service = NotifierService::new(
        notify::from_config(&config.notifier),
        rx,
        config.notifier.send_timeout(),
    );
    let service = tokio::spawn(service.run());
    let client = NotifierClient::new(tx, config.notifier.recipient());

    let inspector = ContainerInspector::new(Arc::clone(&runtime), config.inspect_timeout());
    if config.announce_startup {
        tokio::spawn(report::announce_startup(
            inspector.clone(),
            client.clone(),
            config.notifier.markup().map(str::to_string),
        ));
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    if let Err(e) = signals::handle_shutdown(shutdown_tx) {
        log::error!("Unable to install signal handlers: {e}");
        return ExitCode::FAILURE;
    }
    signals::write_pid_file();

    let monitor = HealthMonitor::new(
        MonitorSettings {
            interval: config.interval(),
            grace_period: config.grace_period(),
            cooldown: config.cooldown(),
        },
        inspector,
        LogCapture::new(
            runtime,
            &config.log_dir,
            config.log_tail_lines.get(),
            config.capture_timeout(),
        ),
        formatter,
        client,
    );

    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);
    // Consumes the monitor; its notifier client goes with it, closing the
    // queue once the announcement is out as well.
    monitor.run(shutdown_rx).await;

    match tokio::time::timeout(DRAIN_GRACE, service).await {
        Ok(Ok(delivered)) => log::info!("Delivered {delivered} notifications"),
        Ok(Err(e)) => log::error!("Notifier service failed: {e}"),
        Err(_) => log::warn!("Gave up on queued notifications after {DRAIN_GRACE:?}"),
    }

    signals::remove_pid_file();
    ExitCode::SUCCESS
}
