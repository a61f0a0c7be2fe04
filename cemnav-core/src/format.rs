/// Human-readable distance: whole meters below one kilometre, otherwise
/// kilometres with one decimal.
///
/// The unit is chosen on the exact value, then rounded half away from zero,
/// so `999.6` renders as `"1000 m"`. Negative and non-finite input renders
/// as `"0 m"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() || meters <= 0.0 {
        return "0 m".to_string();
    }
    if meters < 1000.0 {
        format!("{} m", meters.round() as u64)
    } else {
        let tenths = (meters / 100.0).round();
        format!("{:.1} km", tenths / 10.0)
    }
}
