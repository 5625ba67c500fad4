// LogPoller - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Config file: [logging] level = "debug"
//
// Output goes to stderr so headless mode can keep stdout for log content.

use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .init();

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "Logging initialised"
    );
}

/// Truncate a snapshot for inclusion in debug output.
pub fn preview(text: &str) -> &str {
    let max = super::constants::DEBUG_MAX_SNAPSHOT_PREVIEW;
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_is_unchanged() {
        assert_eq!(preview("<div>log A</div>"), "<div>log A</div>");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "\u{00e9}".repeat(500);
        let p = preview(&long);
        assert_eq!(p.chars().count(), crate::util::constants::DEBUG_MAX_SNAPSHOT_PREVIEW);
    }
}
