//! Shared utility functions

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Reject identifiers that could escape a storage directory. Blob keys and
/// path parameters must be plain `[A-Za-z0-9_-]` tokens.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
