//! Dotted-path traversal over JSON value trees.

use serde_json::Value;

/// Walk `root` along a dotted path such as `retry.max_attempts`.
///
/// Returns `None` when a segment is missing or an intermediate value is not a
/// mapping. An empty path yields the root itself.
pub fn lookup<'a>(root: &'a Value, dotted_path: &str) -> Option<&'a Value> {
    if dotted_path.is_empty() {
        return Some(root);
    }
    dotted_path
        .split('.')
        .try_fold(root, |current, segment| current.as_object()?.get(segment))
}
