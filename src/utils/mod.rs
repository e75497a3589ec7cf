const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Bytes as mebibytes with two decimals, e.g. `12.34`
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MEGABYTE)
}

/// Escape a literal path for use as a yt-dlp output template.
pub fn escape_output_template(path: &str) -> String {
    path.replace('%', "%%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.mp4"), "test_file.mp4");
        assert_eq!(sanitize_filename("normal-name.mp4"), "normal-name.mp4");
        assert_eq!(sanitize_filename("  a:b  "), "a_b");
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(0), "0.00");
        assert_eq!(format_megabytes(1024 * 1024), "1.00");
        assert_eq!(format_megabytes(1_500_000), "1.43");
    }

    #[test]
    fn test_escape_output_template() {
        assert_eq!(escape_output_template("/tmp/100% real.mp4"), "/tmp/100%% real.mp4");
        assert_eq!(escape_output_template("/tmp/plain.mp4"), "/tmp/plain.mp4");
    }
}
