// LogPoller - core/mod.rs
//
// Core logic layer: snapshot model, comparison, sequencing, scheduling.
// Dependencies: standard library, chrono, regex.
// Must NOT depend on: ui, platform, app, or any network crate.

pub mod markup;
pub mod model;
pub mod region;
pub mod schedule;
pub mod sequence;
