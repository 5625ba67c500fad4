// LogPoller - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogPoller";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogPoller";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Polling
// =============================================================================

/// Endpoint polled when neither the CLI nor config.toml names one.
/// The log-stream server publishes its snapshot at `/log_stream`.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1/log_stream";

/// Default interval between poll ticks (ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Minimum user-configurable poll interval (ms).
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Maximum user-configurable poll interval (ms).
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000; // 60 s

/// Default per-request timeout (ms). A hung request occupies one in-flight
/// slot for at most this long.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Minimum user-configurable request timeout (ms).
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

/// Maximum user-configurable request timeout (ms).
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Default cap on concurrently outstanding fetches in the threaded driver.
/// Ticks that fire while this many requests are still in flight are skipped.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 2;

/// Hard upper bound on the in-flight cap.
pub const ABSOLUTE_MAX_IN_FLIGHT: usize = 8;

/// How often the poll thread checks its cancel flag while waiting (ms).
pub const POLL_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

/// Largest snapshot body accepted from the endpoint. Larger bodies are
/// rejected as a fetch failure rather than buffered.
pub const MAX_SNAPSHOT_BYTES: usize = 8 * 1024 * 1024; // 8 MiB

// =============================================================================
// Per-frame UI message budgets
// =============================================================================

/// Maximum number of poll messages processed by the UI update loop per
/// frame. Remaining messages stay queued for the next frame.
pub const MAX_POLL_MESSAGES_PER_FRAME: usize = 100;

// =============================================================================
// UI defaults
// =============================================================================

/// Default UI body font size in points.
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Minimum user-configurable UI font size (points).
pub const MIN_FONT_SIZE: f32 = 8.0;

/// Maximum user-configurable UI font size (points).
pub const MAX_FONT_SIZE: f32 = 32.0;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum number of characters of a snapshot included in debug output.
pub const DEBUG_MAX_SNAPSHOT_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
