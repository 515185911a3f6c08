use std::path::PathBuf;

/// Longest file name stem produced from a URL
const MAX_FILENAME_CHARS: usize = 100;

/// Convert a URL to a sanitized filename
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and replace invalid filename characters
    let name = url.replace("http://", "").replace("https://", "");
    let name = name.replace(['/', '\\', ':', '?', '&', '=', '#', '%', '*', '"', '<', '>', '|'], "_");

    name.chars().take(MAX_FILENAME_CHARS).collect()
}

/// Where a crawl of `url` is written when no output path is given
pub fn default_output_path(url: &str) -> PathBuf {
    PathBuf::from("data").join(format!("{}_content.json", sanitize_filename(url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("https://example.com/docs/"), "example.com_docs_");
        assert_eq!(
            sanitize_filename("http://localhost:8000/a?b=c#d"),
            "localhost_8000_a_b_c_d"
        );
    }

    #[test]
    fn test_sanitize_filename_truncates_on_char_boundary() {
        let long = format!("https://example.com/{}", "é".repeat(200));
        let name = sanitize_filename(&long);
        assert_eq!(name.chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path("https://humansignal.com/"),
            PathBuf::from("data/humansignal.com__content.json")
        );
    }
}
