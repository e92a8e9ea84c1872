use typerush::session::WpmSample;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(samples: &[WpmSample], total_secs: u32) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|s| s.wpm).fold(0.0_f64, f64::max);

    let overall_duration = samples
        .last()
        .map(|s| s.t)
        .unwrap_or(f64::from(total_secs))
        .max(1.0);

    // keep a flat zero line visible
    (overall_duration, highest_wpm.round().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
