//! File names for per-request trace files.

use super::types::RecordedRequest;

/// Replace characters that are unsafe in file names with `_`.
pub fn sanitize_path(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '/' | '?' | '&' | '\\' | ':' | '*' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `<yyyyMMdd_HHmmss_nanos>_<METHOD>_<sanitized path>.json`
pub fn request_file_name(request: &RecordedRequest) -> String {
    format!(
        "{}_{}_{}.json",
        request.timestamp.format("%Y%m%d_%H%M%S_%9f"),
        sanitize_path(&request.method),
        sanitize_path(&request.path)
    )
}
