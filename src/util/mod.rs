// LogPoller - util/mod.rs
//
// Utility modules: error types, named constants, endpoint validation,
// logging setup.
// No dependencies on core, app, ui, or platform layers.

pub mod constants;
pub mod endpoint;
pub mod error;
pub mod logging;
