//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

use crate::sim::signal::SignalPhase;

/// Total queue line color.
pub const QUEUE_COLOR: Color = Color::Cyan;
/// Vehicles-in-network line color.
pub const IN_NETWORK_COLOR: Color = Color::DarkGray;
/// North-south green cell.
pub const NS_GREEN: Color = Color::Green;
/// East-west green cell.
pub const EW_GREEN: Color = Color::Blue;
/// Yellow cell.
pub const YELLOW: Color = Color::Yellow;
/// Completion gauge color.
pub const GAUGE: Color = Color::Green;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Error text color.
pub const ERROR_FG: Color = Color::Red;

/// Cell color and glyph for a signal phase.
pub fn phase_style(phase: SignalPhase) -> (Color, &'static str) {
    match phase {
        SignalPhase::NsGreen => (NS_GREEN, "│"),
        SignalPhase::EwGreen => (EW_GREEN, "─"),
        SignalPhase::Yellow => (YELLOW, "•"),
    }
}

/// Computes Y-axis bounds from chart series with 10% headroom, floored at zero.
pub fn auto_bounds_y(a: &[(f64, f64)], b: &[(f64, f64)]) -> [f64; 2] {
    let max = a
        .iter()
        .chain(b.iter())
        .map(|&(_, y)| y)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return [0.0, 1.0];
    }
    [0.0, (max * 1.1).max(1.0)]
}
