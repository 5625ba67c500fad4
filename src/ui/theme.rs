// LogPoller - ui/theme.rs
//
// Colour scheme, severity and explicit-colour mapping, layout constants.
// No dependencies on app state or business logic.

use crate::core::markup::{LineStyle, Severity};
use egui::Color32;

/// Colour for a given severity level.
pub fn severity_colour(severity: &Severity, dark_mode: bool) -> Color32 {
    match severity {
        Severity::Critical => Color32::from_rgb(220, 38, 38), // Red 600
        Severity::Error => {
            if dark_mode {
                Color32::from_rgb(248, 113, 113) // Red 400
            } else {
                Color32::from_rgb(185, 28, 28) // Red 800
            }
        }
        Severity::Warning => Color32::from_rgb(217, 119, 6), // Amber 600
        Severity::Info => Color32::from_rgb(34, 197, 94),    // Green 500
        Severity::Debug => Color32::from_rgb(107, 114, 128), // Gray 500
        Severity::Unknown => row_text_colour(dark_mode),
    }
}

/// Default foreground for log text.
pub fn row_text_colour(dark_mode: bool) -> Color32 {
    if dark_mode {
        Color32::from_rgb(229, 231, 235) // Gray 200
    } else {
        Color32::from_rgb(17, 24, 39) // Gray 900
    }
}

/// Foreground for a rendered line.
///
/// Explicit markup colours are honoured, except pure black and pure white,
/// which map to the theme's text colour so they stay readable on either
/// background.
pub fn line_colour(style: &LineStyle, dark_mode: bool) -> Color32 {
    match style {
        LineStyle::Explicit([0, 0, 0]) | LineStyle::Explicit([255, 255, 255]) => {
            row_text_colour(dark_mode)
        }
        LineStyle::Explicit([r, g, b]) => Color32::from_rgb(*r, *g, *b),
        LineStyle::Level(severity) => severity_colour(severity, dark_mode),
    }
}

/// LIVE badge.
pub const LIVE_COLOUR: Color32 = Color32::from_rgb(34, 197, 94); // Green 500
pub const LIVE_BG: Color32 = Color32::from_rgba_premultiplied(34, 197, 94, 30);

/// LOG UNAVAILABLE badge.
pub const UNAVAILABLE_COLOUR: Color32 = Color32::from_rgb(220, 38, 38); // Red 600
pub const UNAVAILABLE_BG: Color32 = Color32::from_rgba_premultiplied(220, 38, 38, 30);

/// PAUSED / connecting badge.
pub const IDLE_COLOUR: Color32 = Color32::from_rgb(217, 119, 6); // Amber 600

/// Layout constants.
pub const WINDOW_SIZE: [f32; 2] = [1000.0, 700.0];
pub const MIN_WINDOW_SIZE: [f32; 2] = [600.0, 400.0];
pub const OPTIONS_WIDTH: f32 = 420.0;
