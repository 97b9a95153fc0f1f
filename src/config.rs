use std::{
    collections::HashMap,
    num::{NonZeroU64, NonZeroUsize},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::template::render_template;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Templating error: {0:?}")]
    Template(#[from] minijinja::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockwatchConfig {
    /// Seconds between two health checks (default: 600)
    #[serde(default = "default_interval")]
    pub interval: NonZeroU64,
    /// Seconds to wait after the baseline inspection before the first real
    /// check (default: 600)
    #[serde(default = "default_grace_period")]
    pub grace_period: u64,
    /// Minimum seconds between two alerts for the same container (default: 3600)
    #[serde(default = "default_cooldown")]
    pub cooldown: u64,
    /// Where captured logs are written.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: NonZeroUsize,
    #[serde(default = "default_inspect_timeout")]
    pub inspect_timeout: u64,
    #[serde(default = "default_capture_timeout")]
    pub capture_timeout: u64,
    #[serde(default = "default_true")]
    pub announce_startup: bool,
    /// Optional file holding the failure message template. Relative paths are
    /// resolved against the directory of the config file.
    #[serde(default)]
    pub failure_template_file: Option<PathBuf>,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

fn default_interval() -> NonZeroU64 {
    NonZeroU64::new(600).unwrap_or(NonZeroU64::MIN)
}

fn default_grace_period() -> u64 {
    600
}

fn default_cooldown() -> u64 {
    3600
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_tail_lines() -> NonZeroUsize {
    NonZeroUsize::new(500).unwrap_or(NonZeroUsize::MIN)
}

fn default_inspect_timeout() -> u64 {
    10
}

fn default_capture_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Which transport delivers notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum NotifierKind {
    /// Telegram Bot API.
    #[serde(alias = "telegram", alias = "Telegram")]
    Telegram,
    /// Only write notifications to the daemon log.
    #[serde(alias = "log", alias = "Log")]
    #[default]
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum ChatIdEntry {
    Number(i64),
    Text(String),
}

fn deserialize_chat_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entry = Option::<ChatIdEntry>::deserialize(deserializer)?;
    Ok(entry.map(|entry| match entry {
        ChatIdEntry::Number(n) => n.to_string(),
        ChatIdEntry::Text(s) => s,
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Recipient of every notification.
    #[serde(default, deserialize_with = "deserialize_chat_id")]
    pub chat_id: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default = "default_true")]
    pub attach_logs: bool,
    /// Seconds a single send may take (default: 15)
    #[serde(default = "default_send_timeout")]
    pub send_timeout: u64,
    /// Notifications waiting for delivery before new ones are dropped.
    #[serde(default = "default_queue_size")]
    pub queue_size: NonZeroUsize,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_send_timeout() -> u64 {
    15
}

fn default_queue_size() -> NonZeroUsize {
    NonZeroUsize::new(64).unwrap_or(NonZeroUsize::MIN)
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::default(),
            bot_token: None,
            chat_id: None,
            api_url: default_api_url(),
            parse_mode: None,
            attach_logs: true,
            send_timeout: default_send_timeout(),
            queue_size: default_queue_size(),
        }
    }
}

impl NotifierConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout)
    }

    /// Who receives notifications. Empty when nobody is configured.
    pub fn recipient(&self) -> String {
        self.chat_id.clone().unwrap_or_default()
    }

    /// Markup the transport parses message text with, if any.
    pub fn markup(&self) -> Option<&str> {
        match self.kind {
            NotifierKind::Telegram => self.parse_mode.as_deref(),
            NotifierKind::Log => None,
        }
    }
}

impl DockwatchConfig {
    /// Renders the raw config with `vars` and parses the result.
    fn parse(config: &str, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let rendered = render_template(config, vars)?;
        Ok(toml::from_str(&rendered)?)
    }

    /// Reads the config file named on the command line. `${ VAR }` in the file
    /// is replaced by the environment variable `VAR`.
    pub fn try_init() -> Result<Self, ConfigError> {
        use std::io::Read;
        let args = crate::cli::get_cli_args();
        let mut config = String::new();
        std::fs::File::open(&args.config)?.read_to_string(&mut config)?;

        let vars: HashMap<String, String> = std::env::vars().collect();
        let mut config = Self::parse(&config, &vars)?;

        if let Some(chat_id) = &args.chat_id {
            config.notifier.chat_id = Some(chat_id.clone());
        }
        if let Some(file) = &config.failure_template_file {
            let base = args.config.parent().unwrap_or(Path::new("."));
            config.failure_template_file = Some(base.join(file));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("inspect_timeout", self.inspect_timeout),
            ("capture_timeout", self.capture_timeout),
            ("notifier.send_timeout", self.notifier.send_timeout),
        ];
        if let Some((key, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Invalid(format!("{key} must be greater than 0")));
        }

        if self.notifier.kind == NotifierKind::Telegram {
            if self.notifier.bot_token.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Invalid(
                    "notifier.bot_token is required for the telegram notifier".to_string(),
                ));
            }
            if self.notifier.recipient().is_empty() {
                return Err(ConfigError::Invalid(
                    "notifier.chat_id (or --chat-id) is required for the telegram notifier"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.get())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }

    pub fn inspect_timeout(&self) -> Duration {
        Duration::from_secs(self.inspect_timeout)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout)
    }
}
