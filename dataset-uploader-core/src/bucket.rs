//! Target bucket resolution.

use tracing::info;

/// Pick the bucket for a dataset.
///
/// An explicit name wins. Otherwise the last `/`-separated segment of the
/// dataset path is lower-cased: `a/b/MyData` becomes `mydata`. Trailing
/// slashes are ignored. No storage naming rules are enforced here.
pub fn resolve_bucket(explicit: &str, dir_path: &str) -> String {
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    let trimmed = dir_path.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let bucket = segment.to_lowercase();
    info!(dir_path, bucket = %bucket, "Derived bucket name from dataset directory");
    bucket
}
