use super::Geometry;
use crate::models::{DrawRect, PartyResult};

const BACKGROUND: &str = "000000";
const ABOVE_THRESHOLD: &str = "00FF00";
const BELOW_THRESHOLD: &str = "FF0000";

/// Horizontal bars scaled to the leading party, one row band per party.
///
/// Each bar is followed by a one pixel marker: green above `threshold`, red otherwise.
pub fn bar_chart(ranked: &[&PartyResult], threshold: f64, geometry: &Geometry) -> Vec<DrawRect> {
    if ranked.is_empty() {
        return Vec::new();
    }

    // One pixel row per party at the very least
    let shown = &ranked[..ranked.len().min(geometry.height as usize)];
    let bar_height = (geometry.height / shown.len() as u32).max(1);
    // The marker needs a free column
    let max_bar = geometry.chart_width.min(geometry.width.saturating_sub(1));

    let max_percentage = shown
        .iter()
        .map(|p| p.percentage)
        .filter(|p| p.is_finite())
        .fold(0.0_f64, f64::max);

    let mut rects = Vec::with_capacity(1 + shown.len() * 2);
    rects.push(DrawRect::new(0, 0, geometry.chart_width, geometry.height, BACKGROUND));

    for (i, party) in shown.iter().enumerate() {
        let y = i as u32 * bar_height;
        let bar_width = scaled_width(party.percentage, max_percentage, max_bar);
        rects.push(DrawRect::new(0, y, bar_width, bar_height, &party.color));

        let marker = if party.percentage > threshold {
            ABOVE_THRESHOLD
        } else {
            BELOW_THRESHOLD
        };
        rects.push(DrawRect::new(bar_width, y, 1, bar_height, marker));
    }
    debug_assert!(
        rects
            .iter()
            .all(|r| r.x() + r.width() <= geometry.width && r.y() + r.height() <= geometry.height)
    );
    rects
}

fn scaled_width(percentage: f64, max_percentage: f64, max_bar: u32) -> u32 {
    if !percentage.is_finite() || percentage <= 0.0 || max_percentage <= 0.0 {
        return 0;
    }
    let width = (percentage / max_percentage * max_bar as f64).ceil();
    (width as u32).min(max_bar)
}
