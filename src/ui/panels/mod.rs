// LogPoller - ui/panels/mod.rs

pub mod about;
pub mod log_view;
pub mod options;
pub mod status_bar;
