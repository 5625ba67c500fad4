// LogPoller - platform/mod.rs
//
// Platform abstraction layer: config directories and config.toml.
// Must NOT depend on: app, ui.

pub mod config;
