//! Number formatting utilities.

/// Milliseconds per frame at `fps`; `None` when no frame rate was measured.
pub fn frame_time_ms(fps: u32) -> Option<f64> {
    (fps > 0).then(|| 1000.0 / f64::from(fps))
}

/// Format the frame time for `fps` with millisecond precision.
/// Example: "16.667 ms"
pub fn format_frame_time(fps: u32) -> String {
    match frame_time_ms(fps) {
        Some(ms) => format!("{ms:.3} ms"),
        None => "n/a".to_string(),
    }
}

/// Format a frequency given in kHz.
#[allow(clippy::cast_precision_loss)]
pub fn format_frequency_khz(khz: u64) -> String {
    if khz >= 1_000_000 {
        format!("{:.2} GHz", khz as f64 / 1_000_000.0)
    } else if khz >= 1_000 {
        format!("{:.1} MHz", khz as f64 / 1_000.0)
    } else {
        format!("{khz} kHz")
    }
}

/// Format a derived power value.
pub fn format_power(power: f64) -> String {
    if power >= 100.0 {
        format!("{power:.0}")
    } else {
        format!("{power:.2}")
    }
}

/// Format a pass/fail tally.
/// Example: "12/0"
pub fn format_pass_fail(pass: u64, fail: u64) -> String {
    format!("{pass}/{fail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time() {
        assert_eq!(frame_time_ms(0), None);
        assert_eq!(format_frame_time(60), "16.667 ms");
        assert_eq!(format_frame_time(1000), "1.000 ms");
        assert_eq!(format_frame_time(0), "n/a");
    }

    #[test]
    fn test_format_frequency() {
        assert_eq!(format_frequency_khz(500), "500 kHz");
        assert_eq!(format_frequency_khz(848_000), "848.0 MHz");
        assert_eq!(format_frequency_khz(1_094_000), "1.09 GHz");
    }

    #[test]
    fn test_format_power() {
        assert_eq!(format_power(100.0), "100");
        assert_eq!(format_power(3.456), "3.46");
    }

    #[test]
    fn test_format_pass_fail() {
        assert_eq!(format_pass_fail(12, 0), "12/0");
    }
}
