use super::domain::{Band, ScoringBands};

/// Classify a clamped score against the configured thresholds.
///
/// Only `min` thresholds carry authority; `max` values exist for display.
/// With strictly ascending minimums this is a simple descending cascade, so
/// a higher score can never land in a lower band.
pub fn classify(score: f64, bands: &ScoringBands) -> Band {
    if score >= bands.high.min {
        Band::High
    } else if score >= bands.medium.min {
        Band::Medium
    } else {
        Band::Low
    }
}
