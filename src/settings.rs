use std::path::PathBuf;
use std::time::Duration;

use encoding_rs::Encoding;

use crate::matching::TaskIdentity;

pub const CONFIG_FILE_NAME: &str = ".auto_shutdown_config.json";

pub const DEFAULT_WARNING_SECS: u64 = 900;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

const MAX_WARNING_SECS: u64 = 12 * 60 * 60;

pub const ENV_CONFIG_PATH: &str = "AUTO_SHUTDOWN_CONFIG_PATH";
pub const ENV_WARNING_SECS: &str = "AUTO_SHUTDOWN_WARNING_SECS";
pub const ENV_COMMAND_TIMEOUT_SECS: &str = "AUTO_SHUTDOWN_COMMAND_TIMEOUT_SECS";
pub const ENV_DRY_RUN: &str = "AUTO_SHUTDOWN_DRY_RUN";
pub const ENV_OUTPUT_ENCODING: &str = "AUTO_SHUTDOWN_OUTPUT_ENCODING";
pub const ENV_LOG_FILE: &str = "AUTO_SHUTDOWN_LOG_FILE";

pub const LOG_FILE_NAME: &str = "auto_shutdown.log";

#[derive(Debug, Clone)]
pub struct Settings {
    pub task: TaskIdentity,
    pub config_path: PathBuf,
    /// How long before the requested time the task fires and the countdown starts.
    pub warning_lead: Duration,
    pub command_timeout: Duration,
    pub dry_run: bool,
    /// Code page the scheduler tools print in.
    pub output_encoding: &'static Encoding,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            task: TaskIdentity::default(),
            config_path: default_config_path(),
            warning_lead: Duration::from_secs(DEFAULT_WARNING_SECS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            dry_run: false,
            output_encoding: default_output_encoding(),
        }
    }
}

impl Settings {
    /// Defaults, overridden by any `AUTO_SHUTDOWN_*` variables that are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup(ENV_CONFIG_PATH).filter(|value| !value.trim().is_empty()) {
            settings.config_path = PathBuf::from(path);
        }

        if let Some(secs) = parse_secs(&lookup, ENV_WARNING_SECS) {
            if secs <= MAX_WARNING_SECS {
                settings.warning_lead = Duration::from_secs(secs);
            } else {
                log::warn!(
                    "{ENV_WARNING_SECS}={secs} exceeds {MAX_WARNING_SECS}s; keeping default"
                );
            }
        }

        if let Some(secs) = parse_secs(&lookup, ENV_COMMAND_TIMEOUT_SECS).filter(|secs| *secs > 0) {
            settings.command_timeout = Duration::from_secs(secs);
        }

        settings.dry_run = lookup(ENV_DRY_RUN)
            .map(|value| {
                let normalized = value.trim().to_ascii_lowercase();
                !matches!(normalized.as_str(), "" | "0" | "false" | "off")
            })
            .unwrap_or(false);

        if let Some(label) = lookup(ENV_OUTPUT_ENCODING) {
            match encoding_for_label(&label) {
                Some(encoding) => settings.output_encoding = encoding,
                None => log::warn!("ignoring {ENV_OUTPUT_ENCODING}={label:?}: unknown encoding"),
            }
        }

        settings
    }

    /// Text shown by the OS shutdown dialog.
    pub fn shutdown_message(&self, seconds: u64) -> String {
        let minutes = seconds / 60;
        if minutes >= 1 {
            format!("The system will shut down in {minutes} minute(s)")
        } else {
            format!("The system will shut down in {seconds} second(s)")
        }
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: not a whole number of seconds");
            None
        }
    }
}

/// Where the binary appends its log, `None` when file logging is switched off.
///
/// Read separately from `Settings` because logging has to be up before the
/// rest of the environment is parsed.
pub fn log_file_from_env() -> Option<PathBuf> {
    log_file_from_lookup(|key| std::env::var(key).ok())
}

pub fn log_file_from_lookup<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(ENV_LOG_FILE) {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(PathBuf::from(value.trim())),
        None => Some(PathBuf::from(LOG_FILE_NAME)),
    }
}

/// Resolves WHATWG labels plus the Windows `cpNNN` spellings.
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().to_ascii_lowercase();
    let by_code_page = match label.strip_prefix("cp") {
        Some("950") => Some(encoding_rs::BIG5),
        Some("936") => Some(encoding_rs::GBK),
        Some("932") => Some(encoding_rs::SHIFT_JIS),
        Some("949") => Some(encoding_rs::EUC_KR),
        Some("65001") => Some(encoding_rs::UTF_8),
        _ => None,
    };
    by_code_page.or_else(|| Encoding::for_label(label.as_bytes()))
}

#[cfg(windows)]
fn default_output_encoding() -> &'static Encoding {
    encoding_rs::BIG5
}

#[cfg(not(windows))]
fn default_output_encoding() -> &'static Encoding {
    encoding_rs::UTF_8
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}
