use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use url::Url;

/// Longest base name kept before the extension.
pub const MAX_FILENAME_LENGTH: usize = 50;

/// Common filesystem limit for one path component, in bytes.
const MAX_NAME_BYTES: usize = 255;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9._\-]").expect("static pattern compiles")
});

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_component(component: &str) -> String {
    UNSAFE_CHARS.replace_all(component, "_").into_owned()
}

/// `download_<yyyyMMdd_HHmmss>.bin` in local time
pub fn fallback_file_name() -> String {
    format!("download_{}.bin", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Turn a user supplied URL into a file name safe to create in the download
/// directory.
///
/// Takes the last path segment, splits it at the last `.`, sanitizes both
/// halves and caps the base name. The extension is cut so the whole name
/// fits in 255 bytes. Anything that cannot produce a base name
/// (unparsable input, no path, `.hidden`-style names) yields
/// [`fallback_file_name`]. Never fails.
pub fn derive_file_name(url: &str, max_len: usize) -> String {
    derive_from_path(url, max_len).unwrap_or_else(fallback_file_name)
}

fn derive_from_path(url: &str, max_len: usize) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let raw = parsed.path().rsplit('/').next().unwrap_or_default();

    let (base, extension) = match raw.rsplit_once('.') {
        Some((base, ext)) if !ext.is_empty() => (base, ext),
        _ => (raw, ""),
    };

    let mut base = sanitize_component(base);
    // Every kept character is ASCII, so byte truncation stays on a boundary
    base.truncate(max_len);
    if base.is_empty() {
        return None;
    }

    if extension.is_empty() {
        Some(base)
    } else {
        let mut extension = sanitize_component(extension);
        extension.truncate(MAX_NAME_BYTES.saturating_sub(base.len() + 1));
        if extension.is_empty() {
            Some(base)
        } else {
            Some(format!("{}.{}", base, extension))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_fallback(name: &str) -> bool {
        let re = Regex::new(r"^download_\d{8}_\d{6}\.bin$").unwrap();
        re.is_match(name)
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("normal-name_1.0"), "normal-name_1.0");
        assert_eq!(sanitize_component("a b&c"), "a_b_c");
        assert_eq!(sanitize_component("résumé"), "r_sum_");
    }

    #[test]
    fn test_extension_after_last_dot_and_query_ignored() {
        assert_eq!(
            derive_file_name(
                "https://x.test/reports/2024/summary.v2.csv?ts=1",
                MAX_FILENAME_LENGTH
            ),
            "summary.v2.csv"
        );
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(
            derive_file_name("https://x.test/files/README", MAX_FILENAME_LENGTH),
            "README"
        );
    }

    #[test]
    fn test_no_path_uses_fallback() {
        assert!(is_fallback(&derive_file_name(
            "https://x.test",
            MAX_FILENAME_LENGTH
        )));
        assert!(is_fallback(&derive_file_name(
            "https://x.test/dir/",
            MAX_FILENAME_LENGTH
        )));
    }

    #[test]
    fn test_extension_with_empty_base_uses_fallback() {
        assert!(is_fallback(&derive_file_name(
            "https://x.test/.bashrc",
            MAX_FILENAME_LENGTH
        )));
    }

    #[test]
    fn test_unparsable_input_uses_fallback() {
        assert!(is_fallback(&derive_file_name(
            "not a url",
            MAX_FILENAME_LENGTH
        )));
        assert!(is_fallback(&derive_file_name("", MAX_FILENAME_LENGTH)));
    }

    #[test]
    fn test_long_base_is_truncated_keeping_extension() {
        let url = format!("https://x.test/{}.tar", "a".repeat(80));
        let name = derive_file_name(&url, MAX_FILENAME_LENGTH);
        assert_eq!(name, format!("{}.tar", "a".repeat(50)));
    }

    #[test]
    fn test_oversized_extension_keeps_name_within_limit() {
        let url = format!("https://x.test/a.{}", "x".repeat(300));
        let name = derive_file_name(&url, MAX_FILENAME_LENGTH);
        assert_eq!(name.len(), MAX_NAME_BYTES);
        assert_eq!(name, format!("a.{}", "x".repeat(MAX_NAME_BYTES - 2)));

        let url = format!("https://x.test/{}.{}", "b".repeat(80), "y".repeat(300));
        let name = derive_file_name(&url, MAX_FILENAME_LENGTH);
        assert_eq!(name.len(), MAX_NAME_BYTES);
        assert!(name.starts_with(&format!("{}.", "b".repeat(50))));
    }

    #[test]
    fn test_reserved_and_non_ascii_characters_are_replaced() {
        let name = derive_file_name("https://x.test/my%20file(1)ü.zip", MAX_FILENAME_LENGTH);
        assert!(name.ends_with(".zip"));
        let (base, _) = name.rsplit_once('.').unwrap();
        assert!(base.len() <= MAX_FILENAME_LENGTH);
        assert!(base
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
    }

    #[test]
    fn test_deterministic_for_well_formed_input() {
        let url = "https://x.test/a/b/c.iso";
        assert_eq!(
            derive_file_name(url, MAX_FILENAME_LENGTH),
            derive_file_name(url, MAX_FILENAME_LENGTH)
        );
    }
}
