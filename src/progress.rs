/// Marker yt-dlp prints in front of each progress line, see
/// [`PROGRESS_TEMPLATE`].
pub const PROGRESS_PREFIX: &str = "uvd-progress:";

/// Value for yt-dlp's `--progress-template`.
pub const PROGRESS_TEMPLATE: &str = "download:uvd-progress:%(progress._percent_str)s";

/// Parses a line like `uvd-progress: 42.5%` into a fraction in `0.0..=1.0`.
pub fn parse_progress_from_line(line: &str) -> Option<f32> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let number = rest.trim().strip_suffix('%')?;
    let v = number.trim().parse::<f32>().ok()?;
    v.is_finite().then(|| (v / 100.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_percentages() {
        assert_eq!(parse_progress_from_line("uvd-progress:  42.0%"), Some(0.42));
        assert_eq!(parse_progress_from_line("uvd-progress:100.0%"), Some(1.0));
        assert_eq!(parse_progress_from_line("uvd-progress:0%\r"), Some(0.0));
    }

    #[test]
    fn ignores_other_output() {
        assert_eq!(parse_progress_from_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress_from_line("uvd-progress: N/A%"), None);
        assert_eq!(parse_progress_from_line("uvd-progress: 12.5"), None);
        assert_eq!(parse_progress_from_line(""), None);
    }
}
