// LogPoller - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::ComparisonMode;
use crate::util::constants;
use crate::util::endpoint;
use crate::util::error::{ConfigError, FetchError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogPoller configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logpoller/ or %APPDATA%\LogPoller\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[poll]` section.
    pub poll: PollSection,
    /// `[ui]` section.
    pub ui: UiSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[poll]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PollSection {
    /// Log-stream URL.
    pub endpoint: Option<String>,
    /// Interval between ticks in ms.
    pub interval_ms: Option<u64>,
    /// Per-request timeout in ms.
    pub request_timeout_ms: Option<u64>,
    /// "exact" or "text".
    pub compare: Option<String>,
    /// Maximum concurrently outstanding fetches.
    pub max_in_flight: Option<usize>,
}

/// `[ui]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Theme: "dark" or "light".
    pub theme: Option<String>,
    /// Body font size in points.
    pub font_size: Option<f32>,
    /// Keep the log view scrolled to the newest line.
    pub auto_scroll: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Poll --
    pub endpoint: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub compare: ComparisonMode,
    pub max_in_flight: usize,

    // -- UI --
    /// Dark mode (true) or light mode (false).
    pub dark_mode: bool,
    pub font_size: f32,
    pub auto_scroll: bool,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: constants::DEFAULT_REQUEST_TIMEOUT_MS,
            compare: ComparisonMode::default(),
            max_in_flight: constants::DEFAULT_MAX_IN_FLIGHT,
            dark_mode: true,
            font_size: constants::DEFAULT_FONT_SIZE,
            auto_scroll: true,
            log_level: None,
        }
    }
}

/// Load and validate an explicitly requested config file.
///
/// Unlike `load_config`, a missing or unparseable file is an error: the user
/// named it, so silently falling back to defaults would hide a mistake.
pub fn load_config_file(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let raw = read_raw(path)?;
    tracing::info!(path = %path.display(), "Loaded config file");
    Ok(validate(raw))
}

/// Load and validate `config.toml` at its default location.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unreadable or unparseable, returns defaults with a warning;
/// the application still starts but the user is informed.
pub fn load_config(path: &Path) -> (AppConfig, Vec<String>) {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match read_raw(path) {
        Ok(raw) => {
            tracing::info!(path = %path.display(), "Loaded config.toml");
            validate(raw)
        }
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate each field against named constants, accumulating all problems.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Poll: endpoint --
    if let Some(ref endpoint) = raw.poll.endpoint {
        match endpoint::parse_endpoint(endpoint) {
            Ok(_) => config.endpoint = endpoint.trim().to_string(),
            Err(e) => {
                let reason = match e {
                    FetchError::InvalidEndpoint { reason, .. } => reason,
                    other => other.to_string(),
                };
                warnings.push(out_of_range(
                    "[poll] endpoint",
                    endpoint,
                    &format!("an http or https URL with a host ({reason})"),
                    constants::DEFAULT_ENDPOINT,
                ));
            }
        }
    }

    // -- Poll: interval_ms --
    if let Some(ms) = raw.poll.interval_ms {
        if (constants::MIN_POLL_INTERVAL_MS..=constants::MAX_POLL_INTERVAL_MS).contains(&ms) {
            config.poll_interval_ms = ms;
        } else {
            warnings.push(out_of_range(
                "[poll] interval_ms",
                &ms.to_string(),
                &format!(
                    "{}-{}",
                    constants::MIN_POLL_INTERVAL_MS,
                    constants::MAX_POLL_INTERVAL_MS
                ),
                &constants::DEFAULT_POLL_INTERVAL_MS.to_string(),
            ));
        }
    }

    // -- Poll: request_timeout_ms --
    if let Some(ms) = raw.poll.request_timeout_ms {
        if (constants::MIN_REQUEST_TIMEOUT_MS..=constants::MAX_REQUEST_TIMEOUT_MS).contains(&ms) {
            config.request_timeout_ms = ms;
        } else {
            warnings.push(out_of_range(
                "[poll] request_timeout_ms",
                &ms.to_string(),
                &format!(
                    "{}-{}",
                    constants::MIN_REQUEST_TIMEOUT_MS,
                    constants::MAX_REQUEST_TIMEOUT_MS
                ),
                &constants::DEFAULT_REQUEST_TIMEOUT_MS.to_string(),
            ));
        }
    }

    // -- Poll: compare --
    if let Some(ref compare) = raw.poll.compare {
        match ComparisonMode::from_key(compare) {
            Some(mode) => config.compare = mode,
            None => warnings.push(out_of_range(
                "[poll] compare",
                compare,
                "\"exact\" or \"text\"",
                ComparisonMode::default().key(),
            )),
        }
    }

    // -- Poll: max_in_flight --
    if let Some(n) = raw.poll.max_in_flight {
        if (1..=constants::ABSOLUTE_MAX_IN_FLIGHT).contains(&n) {
            config.max_in_flight = n;
        } else {
            warnings.push(out_of_range(
                "[poll] max_in_flight",
                &n.to_string(),
                &format!("1-{}", constants::ABSOLUTE_MAX_IN_FLIGHT),
                &constants::DEFAULT_MAX_IN_FLIGHT.to_string(),
            ));
        }
    }

    // -- UI: theme --
    if let Some(ref theme) = raw.ui.theme {
        match theme.to_lowercase().as_str() {
            "dark" => config.dark_mode = true,
            "light" => config.dark_mode = false,
            other => warnings.push(out_of_range(
                "[ui] theme",
                other,
                "\"dark\" or \"light\"",
                "dark",
            )),
        }
    }

    // -- UI: font_size --
    if let Some(size) = raw.ui.font_size {
        if (constants::MIN_FONT_SIZE..=constants::MAX_FONT_SIZE).contains(&size) {
            config.font_size = size;
        } else {
            warnings.push(out_of_range(
                "[ui] font_size",
                &size.to_string(),
                &format!("{}-{}", constants::MIN_FONT_SIZE, constants::MAX_FONT_SIZE),
                &constants::DEFAULT_FONT_SIZE.to_string(),
            ));
        }
    }

    if let Some(auto_scroll) = raw.ui.auto_scroll {
        config.auto_scroll = auto_scroll;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(out_of_range(
                "[logging] level",
                level,
                "error, warn, info, debug, trace",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Warning text for a rejected value, phrased as the `ConfigError` it
/// stands for plus the fallback applied.
fn out_of_range(field: &str, value: &str, expected: &str, default: &str) -> String {
    let e = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    };
    format!("{e}. Using default ({default}).")
}
