// LogPoller - app/mod.rs
//
// Application layer: fetch sources, the poll cycle, its threaded and
// terminal drivers, and GUI state.
// Dependencies: core layer, util.
// Must NOT depend on: ui.

pub mod fetch;
pub mod headless;
pub mod poll;
pub mod poller;
pub mod state;
