//! Time display helpers.

/// Render seconds as zero-padded `MM:SS`.
///
/// Fractions are floored and negative or non-finite input renders as
/// `00:00`. Minutes are not capped at two digits.
///
/// ```
/// use core_playback::time::format_mm_ss;
///
/// assert_eq!(format_mm_ss(65.9), "01:05");
/// assert_eq!(format_mm_ss(-3.0), "00:00");
/// ```
pub fn format_mm_ss(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.floor().max(0.0) as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(0.0), "00:00");
        assert_eq!(format_mm_ss(9.99), "00:09");
        assert_eq!(format_mm_ss(600.0), "10:00");
        assert_eq!(format_mm_ss(1199.5), "19:59");
        assert_eq!(format_mm_ss(6000.0), "100:00");
        assert_eq!(format_mm_ss(f64::NAN), "00:00");
    }
}
