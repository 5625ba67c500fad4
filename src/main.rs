// LogPoller - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading (config.toml, then CLI overrides)
// 3. Logging initialisation (debug mode support)
// 4. Headless terminal mode, or eframe GUI launch

mod gui;

// Re-export modules from the library crate so that `gui.rs` can keep using
// `crate::app::...`, `crate::core::...` etc.
pub use logpoller::app;

pub use logpoller::core;
pub use logpoller::platform;
pub use logpoller::ui;
pub use logpoller::util;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::app::fetch::HttpSource;
use crate::app::headless::{self, HeadlessOptions};
use crate::app::poller::PollSettings;
use crate::core::model::ComparisonMode;
use crate::platform::config::{self, AppConfig};
use crate::util::constants;

/// LogPoller - live viewer for a remote log endpoint.
///
/// Fetches the endpoint on a fixed interval and redraws the log only when
/// its content changes. Failures are shown as "log unavailable" and polling
/// continues.
#[derive(Parser, Debug)]
#[command(name = "LogPoller", version, about)]
struct Cli {
    /// Log-stream URL (defaults to the config file, then http://127.0.0.1/log_stream).
    endpoint: Option<String>,

    /// Poll interval in milliseconds.
    #[arg(
        short = 'i',
        long = "interval-ms",
        value_parser = clap::value_parser!(u64).range(
            constants::MIN_POLL_INTERVAL_MS..=constants::MAX_POLL_INTERVAL_MS
        )
    )]
    interval_ms: Option<u64>,

    /// Per-request timeout in milliseconds.
    #[arg(
        short = 't',
        long = "timeout-ms",
        value_parser = clap::value_parser!(u64).range(
            constants::MIN_REQUEST_TIMEOUT_MS..=constants::MAX_REQUEST_TIMEOUT_MS
        )
    )]
    timeout_ms: Option<u64>,

    /// Change detection: "exact" markup or "text" content.
    #[arg(short = 'c', long = "compare", value_parser = parse_compare)]
    compare: Option<ComparisonMode>,

    /// Print changes to stdout instead of opening a window.
    #[arg(long = "headless")]
    headless: bool,

    /// Fetch once, print the log, and exit (implies --headless).
    /// Exits non-zero if the log is unavailable.
    #[arg(long = "once", conflicts_with = "count")]
    once: bool,

    /// Stop after this many poll cycles (implies --headless).
    #[arg(short = 'n', long = "count")]
    count: Option<u64>,

    /// Configuration file (defaults to the platform config directory).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn parse_compare(value: &str) -> Result<ComparisonMode, String> {
    ComparisonMode::from_key(value)
        .ok_or_else(|| format!("'{value}' is not a comparison mode (use exact or text)"))
}

/// Load config.toml: an explicit `--config` must exist and parse, the
/// default location may be absent.
fn load_config(cli: &Cli) -> (AppConfig, Vec<String>) {
    match &cli.config {
        Some(path) => match config::load_config_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(2);
            }
        },
        None => config::load_config(&platform::config::PlatformPaths::resolve().config_file()),
    }
}

/// Apply CLI overrides on top of the file configuration.
fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(ms) = cli.interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(ms) = cli.timeout_ms {
        config.request_timeout_ms = ms;
    }
    if let Some(mode) = cli.compare {
        config.compare = mode;
    }
}

fn main() {
    let cli = Cli::parse();

    let (mut config, warnings) = load_config(&cli);
    apply_overrides(&cli, &mut config);

    // Initialise logging subsystem
    util::logging::init(cli.debug, config.log_level.as_deref());
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        endpoint = %config.endpoint,
        interval_ms = config.poll_interval_ms,
        compare = config.compare.key(),
        "LogPoller starting"
    );

    // Reject a bad endpoint before any window or loop exists.
    let source = match HttpSource::new(
        &config.endpoint,
        Duration::from_millis(config.request_timeout_ms),
    ) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "Invalid endpoint");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if cli.headless || cli.once || cli.count.is_some() {
        let settings = PollSettings {
            interval: Duration::from_millis(config.poll_interval_ms),
            compare: config.compare,
            max_in_flight: config.max_in_flight,
        };
        let options = HeadlessOptions {
            max_cycles: if cli.once { Some(1) } else { cli.count },
            fail_fast: cli.once,
        };
        let stdout = std::io::stdout();
        match headless::run_headless(source, settings, stdout.lock(), options) {
            Ok(summary) => {
                tracing::info!(
                    cycles = summary.cycles,
                    renders = summary.renders,
                    failures = summary.failures,
                    "Headless run finished"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Headless run failed");
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    // The GUI builds its own sources so Options can change the endpoint.
    drop(source);

    let mut state = app::state::AppState::new(&config, cli.debug);
    state.warnings = warnings;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "{} v{} - {}",
                constants::APP_NAME,
                constants::APP_VERSION,
                state.endpoint
            ))
            .with_inner_size(ui::theme::WINDOW_SIZE)
            .with_min_inner_size(ui::theme::MIN_WINDOW_SIZE),
        ..Default::default()
    };

    let result = eframe::run_native(
        constants::APP_NAME,
        native_options,
        Box::new(move |_cc| Ok(Box::new(gui::LogPollerApp::new(state)))),
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to launch GUI");
        eprintln!("Error: Failed to launch LogPoller GUI: {e}");
        std::process::exit(1);
    }
}
