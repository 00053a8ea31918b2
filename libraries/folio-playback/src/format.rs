//! Progress and time display helpers
//!
//! Pure functions; nothing here touches engine state.

use crate::types::BarGeometry;

/// Fraction of the track played, always in `[0, 1]`
///
/// Unknown or zero durations yield 0 so the bar stays empty before metadata loads.
pub fn progress_fraction(position: f64, duration: f64) -> f64 {
    if !(duration.is_finite() && duration > 0.0) || position.is_nan() {
        return 0.0;
    }
    (position / duration).clamp(0.0, 1.0)
}

/// Format seconds as `M:SS`
///
/// Minutes are unpadded, seconds always two digits. Non-finite and negative
/// inputs render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Fraction of the bar under a click at `click_x`, clamped to `[0, 1]`
///
/// Returns `None` when the bar has no usable width.
pub fn seek_fraction(click_x: f64, bar: BarGeometry) -> Option<f64> {
    if !(bar.width.is_finite() && bar.width > 0.0) || !click_x.is_finite() {
        return None;
    }
    Some(((click_x - bar.left) / bar.width).clamp(0.0, 1.0))
}
